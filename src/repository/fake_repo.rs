// ==========================================
// Inbound Flow Engine - In-memory Repository (tests)
// ==========================================
// Role: HashMap-backed repository that counts lookups, for engine/api tests
// ==========================================

use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::inbound_flow_repo::{FlowDocument, InboundFlowRepository};
use crate::repository::inbound_lookup_repo::{GatePassPoEntry, InboundLookupRepository};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};

#[derive(Default)]
pub struct FakeInboundRepository {
    pub grn_by_label: HashMap<String, String>,
    pub po_by_grn: HashMap<String, String>,
    pub po_by_gate_pass: HashMap<String, String>,
    pub gate_pass_bundles: HashMap<String, Vec<GatePassPoEntry>>,
    pub po_by_lr: HashMap<String, String>,
    pub lr_bundles: HashMap<String, Vec<Vec<GatePassPoEntry>>>,
    pub po_by_invoice: HashMap<String, String>,
    pub known_pos: HashSet<String>,
    pub documents: HashMap<String, FlowDocument>,
    /// every call fails with a transport-style error when set
    pub offline: bool,
    lookups: AtomicUsize,
    flow_reads: AtomicUsize,
}

pub fn bundle(pos: &[&str]) -> Vec<GatePassPoEntry> {
    pos.iter()
        .map(|po| GatePassPoEntry {
            po_no: Some(po.to_string()),
            invoice_no: None,
        })
        .collect()
}

impl FakeInboundRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lookup_count(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }

    pub fn flow_read_count(&self) -> usize {
        self.flow_reads.load(Ordering::SeqCst)
    }

    fn touch(&self) -> RepositoryResult<()> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        if self.offline {
            return Err(RepositoryError::DatabaseConnectionError("store offline".to_string()));
        }
        Ok(())
    }
}

impl InboundLookupRepository for FakeInboundRepository {
    fn lookup_grn_by_label(&self, label_uid: &str) -> RepositoryResult<Option<String>> {
        self.touch()?;
        Ok(self.grn_by_label.get(label_uid).cloned())
    }

    fn lookup_po_by_grn(&self, grn_no: &str) -> RepositoryResult<Option<String>> {
        self.touch()?;
        Ok(self.po_by_grn.get(grn_no).cloned())
    }

    fn lookup_po_by_gate_pass(&self, gate_pass_no: &str) -> RepositoryResult<Option<String>> {
        self.touch()?;
        Ok(self.po_by_gate_pass.get(gate_pass_no).cloned())
    }

    fn get_gate_pass_bundle(&self, gate_pass_no: &str) -> RepositoryResult<Vec<GatePassPoEntry>> {
        self.touch()?;
        Ok(self.gate_pass_bundles.get(gate_pass_no).cloned().unwrap_or_default())
    }

    fn lookup_po_by_lr(&self, lr_no: &str) -> RepositoryResult<Option<String>> {
        self.touch()?;
        Ok(self.po_by_lr.get(lr_no).cloned())
    }

    fn get_gate_pass_bundles_by_lr(&self, lr_no: &str) -> RepositoryResult<Vec<Vec<GatePassPoEntry>>> {
        self.touch()?;
        Ok(self.lr_bundles.get(lr_no).cloned().unwrap_or_default())
    }

    fn lookup_po_by_invoice(&self, invoice_no: &str) -> RepositoryResult<Option<String>> {
        self.touch()?;
        Ok(self.po_by_invoice.get(invoice_no).cloned())
    }

    fn verify_po_exists(&self, po_key: &str) -> RepositoryResult<bool> {
        self.touch()?;
        Ok(self.known_pos.contains(po_key))
    }
}

impl InboundFlowRepository for FakeInboundRepository {
    fn get_inbound_flow(&self, po_key: &str) -> RepositoryResult<Option<FlowDocument>> {
        self.flow_reads.fetch_add(1, Ordering::SeqCst);
        if self.offline {
            return Err(RepositoryError::DatabaseConnectionError("store offline".to_string()));
        }
        Ok(self.documents.get(po_key).cloned())
    }
}

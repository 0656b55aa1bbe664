// ==========================================
// Inbound Flow Engine - Point Lookup Repository Trait
// ==========================================
// Role: the point lookups the token resolver walks through
// Rule: no business rules here; every method is a single read
// Implementors: SqliteInboundRepository (rusqlite), test fakes
// ==========================================

use crate::repository::error::RepositoryResult;
use serde::{Deserialize, Serialize};

/// One entry of a gate pass PO bundle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GatePassPoEntry {
    #[serde(default, alias = "poNo", alias = "po")]
    pub po_no: Option<String>,
    #[serde(default, alias = "invoiceNo")]
    pub invoice_no: Option<String>,
}

impl GatePassPoEntry {
    /// Trimmed PO number, None when missing or blank.
    pub fn po(&self) -> Option<&str> {
        self.po_no
            .as_deref()
            .map(str::trim)
            .filter(|po| !po.is_empty())
    }
}

// ==========================================
// InboundLookupRepository
// ==========================================
pub trait InboundLookupRepository: Send + Sync {
    /// GRN number printed on a pallet label.
    fn lookup_grn_by_label(&self, label_uid: &str) -> RepositoryResult<Option<String>>;

    /// PO number behind a GRN.
    fn lookup_po_by_grn(&self, grn_no: &str) -> RepositoryResult<Option<String>>;

    /// PO number from the gate pass link table, else the PO recorded on the gate pass.
    fn lookup_po_by_gate_pass(&self, gate_pass_no: &str) -> RepositoryResult<Option<String>>;

    /// PO bundle carried on a gate pass, in stored order.
    fn get_gate_pass_bundle(&self, gate_pass_no: &str) -> RepositoryResult<Vec<GatePassPoEntry>>;

    /// PO of the most recent GRN raised against an LR number.
    fn lookup_po_by_lr(&self, lr_no: &str) -> RepositoryResult<Option<String>>;

    /// PO bundles of gate passes carrying an LR number, most recently updated first.
    /// A gate pass's own PO, when recorded, leads its bundle.
    fn get_gate_pass_bundles_by_lr(&self, lr_no: &str) -> RepositoryResult<Vec<Vec<GatePassPoEntry>>>;

    /// PO of the most recent GRN raised against an invoice number.
    fn lookup_po_by_invoice(&self, invoice_no: &str) -> RepositoryResult<Option<String>>;

    /// Whether any GRN references this PO.
    fn verify_po_exists(&self, po_key: &str) -> RepositoryResult<bool>;
}

// ==========================================
// Inbound Flow Engine - Flow Document Repository Trait
// ==========================================
// Role: the single aggregate read behind a flow snapshot
// Rule: idempotent and side-effect free
// ==========================================

use crate::repository::error::{RepositoryError, RepositoryResult};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Raw per-stage document as returned by the store.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StageDocument {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub closed_at: Option<String>,
    #[serde(default)]
    pub done_by: Option<String>,
    #[serde(default)]
    pub rows: Option<Vec<Value>>,
}

/// Raw flow document for one PO.
///
/// ```json
/// { "po_no": "MFI/25/PO/00079",
///   "stages": { "gate_entry": { "status": "In Transit", "rows": [] } },
///   "summary": { "invoices": [], "grns": [], "gate_passes": [] } }
/// ```
/// Stages may be missing or null; they are filled in by the snapshot fetcher.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FlowDocument {
    #[serde(default)]
    pub po_no: Option<String>,
    #[serde(default)]
    pub stages: BTreeMap<String, Option<StageDocument>>,
    #[serde(default)]
    pub summary: Value,
}

impl FlowDocument {
    /// Decode a JSON document returned for `po_key`.
    pub fn from_json(po_key: &str, value: Value) -> RepositoryResult<Self> {
        serde_json::from_value(value).map_err(|e| RepositoryError::MalformedDocument {
            po_key: po_key.to_string(),
            message: e.to_string(),
        })
    }
}

// ==========================================
// InboundFlowRepository
// ==========================================
pub trait InboundFlowRepository: Send + Sync {
    /// Flow document for a canonical PO key; None when the store knows nothing about it.
    fn get_inbound_flow(&self, po_key: &str) -> RepositoryResult<Option<FlowDocument>>;
}

// ==========================================
// Inbound Flow Engine - KPI Summary
// ==========================================

use crate::domain::stage::StageKey;
use serde::{Deserialize, Serialize};

/// Rollups over a derived stage set. Computed fresh, never stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KpiSummary {
    /// 0..=100, round-half-up
    pub progress_percent: u8,
    pub grns_posted: usize,
    pub labels_printed: usize,
    /// distinct pallet identifiers
    pub pallet_count: usize,
    /// pallet rows not yet cleared by QC
    pub qc_pending_count: usize,
    pub completed_stages: usize,
    pub total_stages: usize,
    /// first stage (pipeline order) that is not complete
    pub current_stage: Option<StageKey>,
}

impl KpiSummary {
    pub fn is_fully_complete(&self) -> bool {
        self.total_stages > 0 && self.completed_stages == self.total_stages
    }

    pub fn has_qc_pending(&self) -> bool {
        self.qc_pending_count > 0
    }
}

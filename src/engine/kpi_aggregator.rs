// ==========================================
// Inbound Flow Engine - KPI Aggregation
// ==========================================
// Role: fold a derived stage set into a KpiSummary
// Rule: pure; progress is integer round-half-up and always within 0..=100
// ==========================================

use crate::domain::kpi::KpiSummary;
use crate::domain::snapshot::EffectiveStage;
use crate::domain::stage::StageKey;
use crate::domain::status::{counts_as_complete, is_qc_cleared};
use std::collections::HashSet;

/// Fields identifying a pallet, in lookup order.
pub const PALLET_ID_FIELDS: [&str; 2] = ["pallet_no", "pallet_id"];

/// Field carrying a pallet's QC status.
pub const QC_STATUS_FIELD: &str = "qc_status";

pub struct KpiAggregator;

impl KpiAggregator {
    pub fn aggregate(stages: &[EffectiveStage]) -> KpiSummary {
        let total_stages = stages.len();
        let completed_stages = stages
            .iter()
            .filter(|s| counts_as_complete(&s.effective_status))
            .count();

        let current_stage = stages
            .iter()
            .find(|s| !counts_as_complete(&s.effective_status))
            .map(|s| s.key);

        let progress_percent = Self::progress_percent(completed_stages, total_stages);
        debug_assert!(progress_percent <= 100);

        let grns_posted = Self::rows_of(stages, StageKey::GrnPosting);
        let labels_printed = Self::rows_of(stages, StageKey::LabelPrinting);

        let (pallet_count, qc_pending_count) = stages
            .iter()
            .find(|s| s.key == StageKey::Palletization)
            .map(Self::pallet_counts)
            .unwrap_or((0, 0));

        KpiSummary {
            progress_percent,
            grns_posted,
            labels_printed,
            pallet_count,
            qc_pending_count,
            completed_stages,
            total_stages,
            current_stage,
        }
    }

    /// `round(100 * completed / total)`, halves rounded up; 0 when total is 0.
    pub fn progress_percent(completed: usize, total: usize) -> u8 {
        if total == 0 {
            return 0;
        }
        let completed = completed.min(total);
        let percent = (200 * completed + total) / (2 * total);
        percent.min(100) as u8
    }

    fn rows_of(stages: &[EffectiveStage], key: StageKey) -> usize {
        stages
            .iter()
            .find(|s| s.key == key)
            .map(EffectiveStage::row_count)
            .unwrap_or(0)
    }

    /// (distinct pallet ids, rows whose QC status is not cleared)
    ///
    /// A row without a QC status counts as pending. Rows without an id
    /// still count towards QC pending but not towards the pallet count.
    fn pallet_counts(stage: &EffectiveStage) -> (usize, usize) {
        let mut ids = HashSet::new();
        let mut pending = 0;
        for row in &stage.rows {
            if let Some(id) = row.text(&PALLET_ID_FIELDS) {
                ids.insert(id);
            }
            let cleared = row
                .text(&[QC_STATUS_FIELD])
                .map(|qc| is_qc_cleared(&qc))
                .unwrap_or(false);
            if !cleared {
                pending += 1;
            }
        }
        (ids.len(), pending)
    }
}

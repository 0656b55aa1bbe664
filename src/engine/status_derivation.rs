// ==========================================
// Inbound Flow Engine - Effective Status Derivation
// ==========================================
// Role: map a flow snapshot to one effective status per stage
// Rule: pure, total and deterministic; no I/O
//
// Cross-stage predicates (computed first):
// - palletization_done: palletization has at least one row
// - grn_done: grn_posting has at least one row
//
// Per stage (first match wins):
// - gate_entry:     grn_done || palletization_done -> Closed
// - weight_capture: grn_done || palletization_done || labels printed -> Completed
//                   all headers closed-like -> Completed
//                   some headers closed-like -> In-Process
// - grn_posting:    rows && raw not closed-like -> Posted
// - label_printing,
//   palletization:  rows && raw not closed-like -> Completed
// - inspections:    raw status
// Any stage that no rule touches keeps its raw status.
// ==========================================

use crate::domain::snapshot::{EffectiveStage, EffectiveStatuses, FlowSnapshot, StageRow, StageSnapshot};
use crate::domain::stage::StageKey;
use crate::domain::status::{
    is_closed_like, STATUS_CLOSED, STATUS_COMPLETED, STATUS_IN_PROCESS, STATUS_POSTED,
};

/// Row fields carrying a weight header status, in lookup order.
pub const WEIGHT_HEADER_STATUS_FIELDS: [&str; 2] = ["header_status", "status"];

/// How many weight headers read as closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderProgress {
    All,
    Some,
    None,
}

/// Cross-stage facts shared by the per-stage rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CrossStageFacts {
    pub palletization_done: bool,
    pub grn_done: bool,
    pub labels_printed: bool,
}

impl CrossStageFacts {
    pub fn from_snapshot(snapshot: &FlowSnapshot) -> Self {
        Self {
            palletization_done: snapshot.stage(StageKey::Palletization).has_rows(),
            grn_done: snapshot.stage(StageKey::GrnPosting).has_rows(),
            labels_printed: snapshot.stage(StageKey::LabelPrinting).has_rows(),
        }
    }

    fn downstream_done(&self) -> bool {
        self.grn_done || self.palletization_done
    }
}

// ==========================================
// StatusDeriver
// ==========================================
pub struct StatusDeriver;

impl StatusDeriver {
    /// Effective status of every stage, pipeline order.
    pub fn derive(snapshot: &FlowSnapshot) -> EffectiveStatuses {
        let facts = CrossStageFacts::from_snapshot(snapshot);
        EffectiveStatuses::new(StageKey::ALL.map(|key| {
            Self::effective_status(key, snapshot.stage(key), &facts)
        }))
    }

    /// Snapshot stages paired with their effective status, pipeline order.
    pub fn derive_stages(snapshot: &FlowSnapshot) -> Vec<EffectiveStage> {
        let statuses = Self::derive(snapshot);
        let stages: Vec<EffectiveStage> = snapshot
            .stages()
            .map(|(key, stage)| EffectiveStage::from_snapshot(key, stage, statuses.get(key).to_string()))
            .collect();
        debug_assert_eq!(stages.len(), StageKey::COUNT);
        stages
    }

    /// Effective status of a single stage.
    pub fn effective_status(key: StageKey, stage: &StageSnapshot, facts: &CrossStageFacts) -> String {
        let raw = stage.raw_status.as_str();
        match key {
            StageKey::GateEntry => {
                if facts.downstream_done() {
                    STATUS_CLOSED.to_string()
                } else {
                    raw.to_string()
                }
            }

            StageKey::WeightCapture => {
                if facts.downstream_done() || facts.labels_printed {
                    return STATUS_COMPLETED.to_string();
                }
                match Self::weight_header_progress(&stage.rows) {
                    HeaderProgress::All => STATUS_COMPLETED.to_string(),
                    HeaderProgress::Some => STATUS_IN_PROCESS.to_string(),
                    HeaderProgress::None => raw.to_string(),
                }
            }

            StageKey::GrnPosting => {
                if stage.has_rows() && !is_closed_like(raw) {
                    STATUS_POSTED.to_string()
                } else {
                    raw.to_string()
                }
            }

            StageKey::LabelPrinting | StageKey::Palletization => {
                if stage.has_rows() && !is_closed_like(raw) {
                    STATUS_COMPLETED.to_string()
                } else {
                    raw.to_string()
                }
            }

            StageKey::VehicleInspection | StageKey::MaterialInspection => raw.to_string(),
        }
    }

    /// Share of weight headers whose status reads as closed.
    ///
    /// No rows, or no closed header, is `None`; a header without a status
    /// counts as not closed.
    pub fn weight_header_progress(rows: &[StageRow]) -> HeaderProgress {
        if rows.is_empty() {
            return HeaderProgress::None;
        }
        let closed = rows
            .iter()
            .filter(|row| {
                row.text(&WEIGHT_HEADER_STATUS_FIELDS)
                    .map(|status| is_closed_like(&status))
                    .unwrap_or(false)
            })
            .count();

        if closed == rows.len() {
            HeaderProgress::All
        } else if closed > 0 {
            HeaderProgress::Some
        } else {
            HeaderProgress::None
        }
    }
}

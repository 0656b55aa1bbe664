// ==========================================
// Inbound Flow Engine - Snapshot Fetcher
// ==========================================
// Role: one aggregate read per PO, normalised into the fixed 7-stage shape
// Rule: the returned snapshot always has exactly the 7 stages in pipeline
//       order; missing stages are synthesised as Open with no rows
// ==========================================

use crate::domain::snapshot::{FlowSnapshot, StageRow, StageSnapshot};
use crate::domain::stage::StageKey;
use crate::domain::status::STATUS_OPEN;
use crate::repository::error::RepositoryError;
use crate::repository::inbound_flow_repo::{FlowDocument, InboundFlowRepository, StageDocument};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("no inbound flow for po={po_key}")]
    NotFound { po_key: String },

    #[error("flow read failed: {0}")]
    Transport(#[from] RepositoryError),
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn normalize_stage(doc: Option<StageDocument>) -> StageSnapshot {
    let Some(doc) = doc else {
        return StageSnapshot::open();
    };
    StageSnapshot {
        raw_status: non_blank(doc.status).unwrap_or_else(|| STATUS_OPEN.to_string()),
        rows: doc
            .rows
            .unwrap_or_default()
            .into_iter()
            .map(StageRow::new)
            .collect(),
        closed_at: non_blank(doc.closed_at),
        done_by: non_blank(doc.done_by),
    }
}

/// Normalise a raw document into a FlowSnapshot.
///
/// Unknown stage keys are dropped; absent or null stages become Open.
pub fn normalize_document(po_key: &str, doc: FlowDocument, fetched_at: DateTime<Utc>) -> FlowSnapshot {
    if let Some(doc_po) = doc.po_no.as_deref() {
        if doc_po.trim() != po_key {
            warn!(po_key, doc_po, "flow document po_no differs from requested key");
        }
    }

    let mut stages: [StageSnapshot; StageKey::COUNT] = std::array::from_fn(|_| StageSnapshot::open());
    let mut seen = [false; StageKey::COUNT];
    for (raw_key, stage_doc) in doc.stages {
        match StageKey::parse(&raw_key) {
            Some(key) => {
                if seen[key.index()] {
                    warn!(po_key, stage = %raw_key, "stage appears more than once in flow document, later entry wins");
                }
                seen[key.index()] = true;
                stages[key.index()] = normalize_stage(stage_doc);
            }
            None => warn!(po_key, stage = %raw_key, "unknown stage in flow document, ignored"),
        }
    }

    FlowSnapshot::new(po_key, stages, doc.summary, fetched_at)
}

// ==========================================
// SnapshotFetcher
// ==========================================
pub struct SnapshotFetcher<R: InboundFlowRepository> {
    repo: Arc<R>,
}

impl<R: InboundFlowRepository> SnapshotFetcher<R> {
    pub fn new(repo: Arc<R>) -> Self {
        Self { repo }
    }

    /// Fetch and normalise the flow of one canonical PO key.
    pub fn fetch(&self, po_key: &str) -> Result<FlowSnapshot, FetchError> {
        let doc = self
            .repo
            .get_inbound_flow(po_key)?
            .ok_or_else(|| FetchError::NotFound {
                po_key: po_key.to_string(),
            })?;

        debug!(po_key, stages_in_document = doc.stages.len(), "flow document fetched");
        Ok(normalize_document(po_key, doc, Utc::now()))
    }
}

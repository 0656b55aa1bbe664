// ==========================================
// Inbound Flow Engine - Flow Snapshots
// ==========================================
// Role: point-in-time view of one inbound shipment (one PO key)
// Rule: a FlowSnapshot always holds exactly the 7 pipeline stages,
//       in pipeline order; snapshots are never mutated after a fetch
// ==========================================

use crate::domain::stage::StageKey;
use crate::domain::status::STATUS_OPEN;
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

// ==========================================
// StageRow - opaque stage row
// ==========================================
/// One row of a stage (a gate pass, a weight header, a pallet...).
///
/// The engine only looks at a handful of named fields; everything else is
/// carried through to the presentation layer untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StageRow(Value);

impl StageRow {
    pub fn new(value: Value) -> Self {
        Self(value)
    }

    pub fn value(&self) -> &Value {
        &self.0
    }

    /// Raw field lookup (None when the row is not a JSON object).
    pub fn field(&self, key: &str) -> Option<&Value> {
        self.0.as_object().and_then(|obj| obj.get(key))
    }

    /// First non-blank text value among `keys`, numbers rendered as text.
    pub fn text(&self, keys: &[&str]) -> Option<String> {
        keys.iter().find_map(|key| match self.field(key)? {
            Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        })
    }
}

impl From<Value> for StageRow {
    fn from(value: Value) -> Self {
        Self(value)
    }
}

// ==========================================
// StageSnapshot
// ==========================================
/// Stored state of one stage.
///
/// `rows` may be empty even when `raw_status` is not "Open": a status can be
/// set by hand without any material rows behind it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StageSnapshot {
    pub raw_status: String,
    pub rows: Vec<StageRow>,
    pub closed_at: Option<String>,
    pub done_by: Option<String>,
}

impl StageSnapshot {
    /// Stage with no status record and no rows.
    pub fn open() -> Self {
        Self {
            raw_status: STATUS_OPEN.to_string(),
            rows: Vec::new(),
            closed_at: None,
            done_by: None,
        }
    }

    pub fn with_status(raw_status: impl Into<String>) -> Self {
        Self {
            raw_status: raw_status.into(),
            ..Self::open()
        }
    }

    pub fn with_rows(mut self, rows: Vec<StageRow>) -> Self {
        self.rows = rows;
        self
    }

    pub fn has_rows(&self) -> bool {
        !self.rows.is_empty()
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// `closed_at` parsed as RFC 3339 or `YYYY-MM-DD HH:MM:SS` (taken as UTC).
    pub fn closed_at_utc(&self) -> Option<DateTime<Utc>> {
        let raw = self.closed_at.as_deref()?.trim();
        if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
            return Some(dt.with_timezone(&Utc));
        }
        NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S")
            .ok()
            .map(|naive| naive.and_utc())
    }
}

impl Default for StageSnapshot {
    fn default() -> Self {
        Self::open()
    }
}

// ==========================================
// FlowSnapshot
// ==========================================
/// All 7 stages of one PO plus the pass-through summary blob.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FlowSnapshot {
    po_key: String,
    stages: [StageSnapshot; StageKey::COUNT],
    summary: Value,
    fetched_at: DateTime<Utc>,
}

impl FlowSnapshot {
    pub fn new(
        po_key: impl Into<String>,
        stages: [StageSnapshot; StageKey::COUNT],
        summary: Value,
        fetched_at: DateTime<Utc>,
    ) -> Self {
        Self {
            po_key: po_key.into(),
            stages,
            summary,
            fetched_at,
        }
    }

    /// Snapshot where every stage is open and empty.
    pub fn open(po_key: impl Into<String>) -> Self {
        Self::new(
            po_key,
            std::array::from_fn(|_| StageSnapshot::open()),
            Value::Null,
            Utc::now(),
        )
    }

    /// Copy of this snapshot with one stage replaced.
    pub fn with_stage(mut self, key: StageKey, stage: StageSnapshot) -> Self {
        self.stages[key.index()] = stage;
        self
    }

    pub fn with_summary(mut self, summary: Value) -> Self {
        self.summary = summary;
        self
    }

    pub fn po_key(&self) -> &str {
        &self.po_key
    }

    pub fn stage(&self, key: StageKey) -> &StageSnapshot {
        &self.stages[key.index()]
    }

    /// Stages in pipeline order.
    pub fn stages(&self) -> impl Iterator<Item = (StageKey, &StageSnapshot)> {
        StageKey::ALL.into_iter().zip(self.stages.iter())
    }

    pub fn summary(&self) -> &Value {
        &self.summary
    }

    pub fn fetched_at(&self) -> DateTime<Utc> {
        self.fetched_at
    }
}

// ==========================================
// Derived views
// ==========================================

/// Effective status per stage, in pipeline order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct EffectiveStatuses([String; StageKey::COUNT]);

impl EffectiveStatuses {
    pub fn new(statuses: [String; StageKey::COUNT]) -> Self {
        Self(statuses)
    }

    pub fn get(&self, key: StageKey) -> &str {
        &self.0[key.index()]
    }

    pub fn iter(&self) -> impl Iterator<Item = (StageKey, &str)> {
        StageKey::ALL
            .into_iter()
            .zip(self.0.iter().map(String::as_str))
    }
}

/// A stage snapshot together with its effective status.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EffectiveStage {
    pub key: StageKey,
    pub label: String,
    pub raw_status: String,
    pub effective_status: String,
    /// true when the effective status differs from the stored one
    pub overridden: bool,
    pub closed_at: Option<String>,
    pub done_by: Option<String>,
    pub rows: Vec<StageRow>,
}

impl EffectiveStage {
    pub fn from_snapshot(key: StageKey, snapshot: &StageSnapshot, effective_status: String) -> Self {
        Self {
            key,
            label: key.label().to_string(),
            raw_status: snapshot.raw_status.clone(),
            overridden: effective_status != snapshot.raw_status,
            effective_status,
            closed_at: snapshot.closed_at.clone(),
            done_by: snapshot.done_by.clone(),
            rows: snapshot.rows.clone(),
        }
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }
}

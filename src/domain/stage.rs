// ==========================================
// Inbound Flow Engine - Pipeline Stage Schema
// ==========================================
// Role: the fixed, ordered list of the 7 inbound pipeline stages
// Rule: order is total and never changes; no stage is ever skipped
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ==========================================
// StageKey
// ==========================================
// Serialized as snake_case, matching the flow document keys
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageKey {
    GateEntry,
    VehicleInspection,
    MaterialInspection,
    WeightCapture,
    GrnPosting,
    LabelPrinting,
    Palletization,
}

impl StageKey {
    /// Number of pipeline stages.
    pub const COUNT: usize = 7;

    /// All stages in pipeline order.
    pub const ALL: [StageKey; StageKey::COUNT] = [
        StageKey::GateEntry,
        StageKey::VehicleInspection,
        StageKey::MaterialInspection,
        StageKey::WeightCapture,
        StageKey::GrnPosting,
        StageKey::LabelPrinting,
        StageKey::Palletization,
    ];

    /// Position of the stage in pipeline order (0-based).
    pub fn index(self) -> usize {
        match self {
            StageKey::GateEntry => 0,
            StageKey::VehicleInspection => 1,
            StageKey::MaterialInspection => 2,
            StageKey::WeightCapture => 3,
            StageKey::GrnPosting => 4,
            StageKey::LabelPrinting => 5,
            StageKey::Palletization => 6,
        }
    }

    /// Wire key used in flow documents.
    pub fn as_str(self) -> &'static str {
        match self {
            StageKey::GateEntry => "gate_entry",
            StageKey::VehicleInspection => "vehicle_inspection",
            StageKey::MaterialInspection => "material_inspection",
            StageKey::WeightCapture => "weight_capture",
            StageKey::GrnPosting => "grn_posting",
            StageKey::LabelPrinting => "label_printing",
            StageKey::Palletization => "palletization",
        }
    }

    /// Human-readable label.
    pub fn label(self) -> &'static str {
        match self {
            StageKey::GateEntry => "Gate Entry",
            StageKey::VehicleInspection => "Vehicle Inspection",
            StageKey::MaterialInspection => "Material Inspection",
            StageKey::WeightCapture => "Weight Capture",
            StageKey::GrnPosting => "GRN Posting",
            StageKey::LabelPrinting => "Label Printing",
            StageKey::Palletization => "Palletization",
        }
    }

    /// Parse a wire key (case-insensitive, surrounding whitespace ignored).
    pub fn parse(raw: &str) -> Option<StageKey> {
        let normalized = raw.trim().to_ascii_lowercase();
        StageKey::ALL
            .iter()
            .copied()
            .find(|key| key.as_str() == normalized)
    }
}

impl fmt::Display for StageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for StageKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        StageKey::parse(s).ok_or_else(|| format!("unknown stage key: {}", s))
    }
}

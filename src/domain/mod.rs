// ==========================================
// Inbound Flow Engine - Domain Layer
// ==========================================
// Role: stage schema, snapshots, tokens and KPI types
// Rule: no data access, no rule evaluation
// ==========================================

pub mod kpi;
pub mod snapshot;
pub mod stage;
pub mod status;
pub mod token;

pub use kpi::KpiSummary;
pub use snapshot::{EffectiveStage, EffectiveStatuses, FlowSnapshot, StageRow, StageSnapshot};
pub use stage::StageKey;
pub use token::{Resolution, ResolutionToken, TokenKind};

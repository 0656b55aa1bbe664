// ==========================================
// Inbound Flow Engine - Repository Layer
// ==========================================
// Role: data access behind the resolver and the snapshot fetcher
// Rule: repositories hold no status rules; all SQL is parameterised
// ==========================================

pub mod error;
#[cfg(test)]
pub mod fake_repo;
pub mod inbound_flow_repo;
pub mod inbound_lookup_repo;
pub mod schema;
pub mod sqlite_inbound_repo;

pub use error::{RepositoryError, RepositoryResult};
pub use inbound_flow_repo::{FlowDocument, InboundFlowRepository, StageDocument};
pub use inbound_lookup_repo::{GatePassPoEntry, InboundLookupRepository};
pub use schema::ensure_inbound_schema;
pub use sqlite_inbound_repo::SqliteInboundRepository;

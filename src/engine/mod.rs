// ==========================================
// Inbound Flow Engine - Engine Layer
// ==========================================
// Role: token resolution, snapshot normalisation, status derivation, KPIs
// Rule: engines build no SQL; only the resolver and the fetcher touch a
//       repository, everything downstream is pure
// ==========================================

pub mod kpi_aggregator;
pub mod snapshot_cache;
pub mod snapshot_fetcher;
pub mod status_derivation;
pub mod token_classifier;
pub mod token_resolver;

pub use kpi_aggregator::KpiAggregator;
pub use snapshot_cache::SnapshotCache;
pub use snapshot_fetcher::{normalize_document, FetchError, SnapshotFetcher};
pub use status_derivation::{CrossStageFacts, HeaderProgress, StatusDeriver};
pub use token_classifier::TokenClassifier;
pub use token_resolver::{ResolveError, ResolveStrategy, TokenResolver, MAX_HOPS};

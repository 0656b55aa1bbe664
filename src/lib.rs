// ==========================================
// Inbound Flow Engine - Core Library
// ==========================================
// Stack: Rust + SQLite (rusqlite)
// Scope: read-only status engine for inbound pharma material;
//        any reference (PO, GRN, gate pass, LR, label, invoice) -> one
//        7-stage flow with effective statuses and KPIs
// ==========================================

// ==========================================
// Modules
// ==========================================

// Domain - stages, statuses, snapshots, tokens
pub mod domain;

// Repository - data access
pub mod repository;

// Engine - resolution and derivation rules
pub mod engine;

// Config - config_kv backed settings
pub mod config;

// SQLite connection setup (PRAGMAs in one place)
pub mod db;

pub mod logging;

// API - the single entry point for hosts
pub mod api;

// ==========================================
// Re-exports
// ==========================================

pub use domain::{
    EffectiveStage, FlowSnapshot, KpiSummary, Resolution, ResolutionToken, StageKey,
    StageSnapshot, TokenKind,
};

pub use engine::{KpiAggregator, SnapshotFetcher, StatusDeriver, TokenClassifier, TokenResolver};

pub use api::{FlowError, FlowReport, InboundFlowApi};

pub use config::{ConfigManager, FlowConfig};

pub use repository::SqliteInboundRepository;

// ==========================================
// Constants
// ==========================================

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub const APP_NAME: &str = "inbound-flow";

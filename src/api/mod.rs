// ==========================================
// Inbound Flow Engine - API Layer
// ==========================================
// Role: entry point for hosts (CLI, services) that need a derived flow
// ==========================================

pub mod error;
pub mod inbound_flow_api;

pub use error::{FlowError, FlowResult};
pub use inbound_flow_api::{FlowReport, InboundFlowApi};

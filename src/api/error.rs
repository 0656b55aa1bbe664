// ==========================================
// Inbound Flow Engine - API Error Type
// ==========================================
// Role: single error type handed to callers of the api layer
// Rule: callers must be able to tell "no such shipment" apart from
//       "backend unavailable" without inspecting messages
// ==========================================

use crate::engine::snapshot_fetcher::FetchError;
use crate::engine::token_resolver::ResolveError;
use crate::repository::error::RepositoryError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FlowError {
    #[error("empty token")]
    EmptyToken,

    /// Normal negative result: nothing in the store matches the token.
    #[error("nothing found for '{token}'")]
    Unresolvable { token: String },

    /// The token resolved but the PO has no inbound flow yet.
    #[error("no inbound flow for po={po_key}")]
    NotFound { po_key: String },

    #[error("store unavailable: {0}")]
    TransportError(String),

    #[error("invalid configuration: {0}")]
    Config(String),
}

impl FlowError {
    /// Worth trying again later.
    pub fn is_retryable(&self) -> bool {
        matches!(self, FlowError::TransportError(_))
    }

    /// A well-formed "nothing found" answer rather than a failure.
    pub fn is_negative_result(&self) -> bool {
        matches!(self, FlowError::Unresolvable { .. } | FlowError::NotFound { .. })
    }
}

// ==========================================
// Conversions
// ==========================================

impl From<RepositoryError> for FlowError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::MalformedDocument { po_key, message } => {
                FlowError::TransportError(format!("malformed flow document for po={}: {}", po_key, message))
            }
            other => FlowError::TransportError(other.to_string()),
        }
    }
}

impl From<ResolveError> for FlowError {
    fn from(err: ResolveError) -> Self {
        match err {
            ResolveError::EmptyToken => FlowError::EmptyToken,
            ResolveError::Unresolvable { token } => FlowError::Unresolvable { token },
            ResolveError::Transport(e) => e.into(),
        }
    }
}

impl From<FetchError> for FlowError {
    fn from(err: FetchError) -> Self {
        match err {
            FetchError::NotFound { po_key } => FlowError::NotFound { po_key },
            FetchError::Transport(e) => e.into(),
        }
    }
}

/// Result alias for the api layer.
pub type FlowResult<T> = Result<T, FlowError>;

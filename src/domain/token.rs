// ==========================================
// Inbound Flow Engine - Resolution Tokens
// ==========================================
// Role: operator-supplied identifiers and the result of resolving them
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// TokenKind
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TokenKind {
    Po,       // purchase order
    Grn,      // goods receipt note
    GatePass, // gate pass
    Lr,       // lorry receipt (transport)
    Label,    // pallet label UID
    Invoice,  // supplier invoice
    Unknown,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenKind::Po => write!(f, "PO"),
            TokenKind::Grn => write!(f, "GRN"),
            TokenKind::GatePass => write!(f, "GATE_PASS"),
            TokenKind::Lr => write!(f, "LR"),
            TokenKind::Label => write!(f, "LABEL"),
            TokenKind::Invoice => write!(f, "INVOICE"),
            TokenKind::Unknown => write!(f, "UNKNOWN"),
        }
    }
}

// ==========================================
// ResolutionToken
// ==========================================
/// A trimmed, non-empty token with its classified kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolutionToken {
    raw: String,
    kind: TokenKind,
}

impl ResolutionToken {
    /// Build a token; `raw` is trimmed. Returns None when blank.
    pub fn new(raw: &str, kind: TokenKind) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return None;
        }
        Some(Self {
            raw: trimmed.to_string(),
            kind,
        })
    }

    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn kind(&self) -> TokenKind {
        self.kind
    }
}

impl fmt::Display for ResolutionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.kind, self.raw)
    }
}

// ==========================================
// Resolution
// ==========================================
/// Outcome of a successful token resolution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Resolution {
    pub po_key: String,
    pub token: ResolutionToken,
    /// external lookups performed
    pub hops: usize,
    /// name of the strategy that produced the PO key
    pub strategy: &'static str,
}

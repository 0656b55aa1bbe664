// ==========================================
// Inbound Flow Engine - Token Classifier
// ==========================================
// Role: classify an operator-supplied identifier by its shape
// Rule: pure; first matching pattern wins, PO before everything else
// ==========================================

use crate::domain::token::{ResolutionToken, TokenKind};
use regex::Regex;

/// Shape-based classifier for resolution tokens.
///
/// Patterns (case-insensitive, on the trimmed token):
/// - PO: contains `/PO/`, or starts with `PO-` / `PO/`
/// - Label: starts with the configured label prefix
/// - GRN, gate pass (`GP`), LR, invoice (`INV`): `X-` / `X/` prefix or a `/X/` segment
#[derive(Debug, Clone)]
pub struct TokenClassifier {
    label_prefix: String,
    po: Regex,
    grn: Regex,
    gate_pass: Regex,
    lr: Regex,
    invoice: Regex,
}

fn segment_pattern(code: &str) -> Result<Regex, regex::Error> {
    Regex::new(&format!(r"(?i)^{code}[-/]|/{code}/"))
}

impl TokenClassifier {
    pub fn new(label_prefix: &str) -> Result<Self, regex::Error> {
        Ok(Self {
            label_prefix: label_prefix.trim().to_uppercase(),
            po: segment_pattern("PO")?,
            grn: segment_pattern("GRN")?,
            gate_pass: segment_pattern("GP")?,
            lr: segment_pattern("LR")?,
            invoice: segment_pattern("INV")?,
        })
    }

    /// Kind of an already trimmed token.
    pub fn kind_of(&self, token: &str) -> TokenKind {
        if self.po.is_match(token) {
            TokenKind::Po
        } else if !self.label_prefix.is_empty() && token.to_uppercase().starts_with(&self.label_prefix) {
            TokenKind::Label
        } else if self.grn.is_match(token) {
            TokenKind::Grn
        } else if self.gate_pass.is_match(token) {
            TokenKind::GatePass
        } else if self.lr.is_match(token) {
            TokenKind::Lr
        } else if self.invoice.is_match(token) {
            TokenKind::Invoice
        } else {
            TokenKind::Unknown
        }
    }

    /// Trim and classify; None for a blank token.
    pub fn classify(&self, raw: &str) -> Option<ResolutionToken> {
        let trimmed = raw.trim();
        ResolutionToken::new(trimmed, self.kind_of(trimmed))
    }
}

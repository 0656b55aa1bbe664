// ==========================================
// Inbound Flow Engine - Token Resolver
// ==========================================
// Role: walk an arbitrary identifier to one canonical PO key
// Order: CANONICAL_PO -> LABEL_TO_GRN -> GRN_TO_PO -> GATE_PASS_TO_PO
//        -> LR_TO_PO -> INVOICE_TO_PO -> LITERAL_PO
// Rule: at most MAX_HOPS external reads; every step only moves towards
//       a PO, so the chain cannot cycle
// ==========================================

use crate::domain::token::{Resolution, ResolutionToken, TokenKind};
use crate::engine::token_classifier::TokenClassifier;
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::inbound_lookup_repo::{GatePassPoEntry, InboundLookupRepository};
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

/// Upper bound on external reads for one resolution.
pub const MAX_HOPS: usize = 3;

// ==========================================
// ResolveError
// ==========================================
#[derive(Error, Debug)]
pub enum ResolveError {
    #[error("token is empty")]
    EmptyToken,

    #[error("no purchase order found for '{token}'")]
    Unresolvable { token: String },

    #[error("lookup failed: {0}")]
    Transport(#[from] RepositoryError),
}

// ==========================================
// Strategy chain
// ==========================================

/// Result of running one strategy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutcome {
    Resolved(String),
    /// strategy did not produce a PO; try the next one
    Continue,
    /// stop the chain, the token is unresolvable
    Halt,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolveStrategy {
    CanonicalPo,
    LabelToGrn,
    GrnToPo,
    GatePassToPo,
    LrToPo,
    InvoiceToPo,
    LiteralPo,
}

impl ResolveStrategy {
    /// Strategies in the order they are tried.
    pub const CHAIN: [ResolveStrategy; 7] = [
        ResolveStrategy::CanonicalPo,
        ResolveStrategy::LabelToGrn,
        ResolveStrategy::GrnToPo,
        ResolveStrategy::GatePassToPo,
        ResolveStrategy::LrToPo,
        ResolveStrategy::InvoiceToPo,
        ResolveStrategy::LiteralPo,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ResolveStrategy::CanonicalPo => "canonical_po",
            ResolveStrategy::LabelToGrn => "label_to_grn",
            ResolveStrategy::GrnToPo => "grn_to_po",
            ResolveStrategy::GatePassToPo => "gate_pass_to_po",
            ResolveStrategy::LrToPo => "lr_to_po",
            ResolveStrategy::InvoiceToPo => "invoice_to_po",
            ResolveStrategy::LiteralPo => "literal_po",
        }
    }

    pub fn applies_to(self, kind: TokenKind) -> bool {
        match self {
            ResolveStrategy::CanonicalPo => kind == TokenKind::Po,
            ResolveStrategy::LabelToGrn => kind == TokenKind::Label,
            ResolveStrategy::GrnToPo => kind == TokenKind::Grn,
            ResolveStrategy::GatePassToPo => kind == TokenKind::GatePass,
            ResolveStrategy::LrToPo => kind == TokenKind::Lr,
            ResolveStrategy::InvoiceToPo => matches!(kind, TokenKind::Invoice | TokenKind::Unknown),
            ResolveStrategy::LiteralPo => !matches!(kind, TokenKind::Po | TokenKind::Label),
        }
    }
}

// ==========================================
// HopTracker - counts external reads
// ==========================================
struct HopTracker<'a, L: InboundLookupRepository> {
    lookup: &'a L,
    hops: usize,
}

impl<'a, L: InboundLookupRepository> HopTracker<'a, L> {
    fn new(lookup: &'a L) -> Self {
        Self { lookup, hops: 0 }
    }

    fn read<T>(&mut self, what: &'static str, key: &str, f: impl FnOnce(&L) -> RepositoryResult<T>) -> RepositoryResult<T> {
        self.hops += 1;
        debug_assert!(self.hops <= MAX_HOPS, "resolution exceeded {} hops", MAX_HOPS);
        debug!(lookup = what, key, hop = self.hops, "resolver lookup");
        f(self.lookup)
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn first_bundle_po<'e>(entries: impl IntoIterator<Item = &'e GatePassPoEntry>) -> Option<String> {
    entries
        .into_iter()
        .find_map(|entry| entry.po().map(str::to_string))
}

// ==========================================
// TokenResolver
// ==========================================
pub struct TokenResolver<L: InboundLookupRepository> {
    classifier: TokenClassifier,
    lookup: Arc<L>,
}

impl<L: InboundLookupRepository> TokenResolver<L> {
    pub fn new(classifier: TokenClassifier, lookup: Arc<L>) -> Self {
        Self { classifier, lookup }
    }

    pub fn classifier(&self) -> &TokenClassifier {
        &self.classifier
    }

    /// Resolve a raw token to its canonical PO key.
    pub fn resolve(&self, raw: &str) -> Result<String, ResolveError> {
        self.resolve_traced(raw).map(|r| r.po_key)
    }

    /// Resolve and report which strategy answered and how many reads it took.
    ///
    /// # Errors
    /// - `EmptyToken`: blank input, no lookup performed
    /// - `Unresolvable`: chain exhausted or halted
    /// - `Transport`: a lookup failed; the chain stops there
    pub fn resolve_traced(&self, raw: &str) -> Result<Resolution, ResolveError> {
        let token = self.classifier.classify(raw).ok_or(ResolveError::EmptyToken)?;
        let mut tracker = HopTracker::new(self.lookup.as_ref());

        for strategy in ResolveStrategy::CHAIN {
            if !strategy.applies_to(token.kind()) {
                continue;
            }

            let outcome = Self::run_strategy(strategy, &token, &mut tracker)?;
            debug!(
                strategy = strategy.name(),
                token = %token,
                outcome = ?outcome,
                hops = tracker.hops,
                "resolver step"
            );

            match outcome {
                StepOutcome::Resolved(po_key) => {
                    return Ok(Resolution {
                        po_key,
                        token,
                        hops: tracker.hops,
                        strategy: strategy.name(),
                    });
                }
                StepOutcome::Continue => continue,
                StepOutcome::Halt => break,
            }
        }

        Err(ResolveError::Unresolvable {
            token: token.raw().to_string(),
        })
    }

    fn run_strategy(
        strategy: ResolveStrategy,
        token: &ResolutionToken,
        tracker: &mut HopTracker<'_, L>,
    ) -> RepositoryResult<StepOutcome> {
        let raw = token.raw();
        let outcome = match strategy {
            ResolveStrategy::CanonicalPo => StepOutcome::Resolved(raw.to_string()),

            // label -> GRN -> PO; a miss anywhere ends the chain
            ResolveStrategy::LabelToGrn => {
                let grn = non_blank(tracker.read("grn_by_label", raw, |l| l.lookup_grn_by_label(raw))?);
                match grn {
                    Some(grn) => {
                        let po = non_blank(tracker.read("po_by_grn", &grn, |l| l.lookup_po_by_grn(&grn))?);
                        po.map_or(StepOutcome::Halt, StepOutcome::Resolved)
                    }
                    None => StepOutcome::Halt,
                }
            }

            ResolveStrategy::GrnToPo => {
                let po = non_blank(tracker.read("po_by_grn", raw, |l| l.lookup_po_by_grn(raw))?);
                po.map_or(StepOutcome::Continue, StepOutcome::Resolved)
            }

            // link table first, then the PO bundle stored on the gate pass
            ResolveStrategy::GatePassToPo => {
                if let Some(po) = non_blank(tracker.read("po_by_gate_pass", raw, |l| l.lookup_po_by_gate_pass(raw))?) {
                    StepOutcome::Resolved(po)
                } else {
                    let entries = tracker.read("gate_pass_bundle", raw, |l| l.get_gate_pass_bundle(raw))?;
                    first_bundle_po(&entries).map_or(StepOutcome::Continue, StepOutcome::Resolved)
                }
            }

            // latest GRN by LR, then bundles of gate passes carrying the LR
            ResolveStrategy::LrToPo => {
                if let Some(po) = non_blank(tracker.read("po_by_lr", raw, |l| l.lookup_po_by_lr(raw))?) {
                    StepOutcome::Resolved(po)
                } else {
                    let bundles = tracker.read("gate_pass_bundles_by_lr", raw, |l| l.get_gate_pass_bundles_by_lr(raw))?;
                    first_bundle_po(bundles.iter().flatten()).map_or(StepOutcome::Continue, StepOutcome::Resolved)
                }
            }

            ResolveStrategy::InvoiceToPo => {
                let po = non_blank(tracker.read("po_by_invoice", raw, |l| l.lookup_po_by_invoice(raw))?);
                po.map_or(StepOutcome::Continue, StepOutcome::Resolved)
            }

            ResolveStrategy::LiteralPo => {
                if tracker.read("verify_po", raw, |l| l.verify_po_exists(raw))? {
                    StepOutcome::Resolved(raw.to_string())
                } else {
                    StepOutcome::Continue
                }
            }
        };
        Ok(outcome)
    }
}

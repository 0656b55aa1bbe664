// ==========================================
// Inbound Flow Engine - Inbound Flow API
// ==========================================
// Role: the one operation exposed to callers:
//       raw token -> canonical PO -> snapshot -> effective stages -> KPIs
// Rule: read-only; every call recomputes derivation and KPIs, the optional
//       cache only saves the snapshot read
// ==========================================

use crate::api::error::{FlowError, FlowResult};
use crate::config::FlowConfig;
use crate::domain::kpi::KpiSummary;
use crate::domain::snapshot::{EffectiveStage, FlowSnapshot};
use crate::domain::stage::StageKey;
use crate::domain::token::{Resolution, TokenKind};
use crate::engine::kpi_aggregator::KpiAggregator;
use crate::engine::snapshot_cache::SnapshotCache;
use crate::engine::snapshot_fetcher::SnapshotFetcher;
use crate::engine::status_derivation::StatusDeriver;
use crate::engine::token_classifier::TokenClassifier;
use crate::engine::token_resolver::TokenResolver;
use crate::repository::inbound_flow_repo::InboundFlowRepository;
use crate::repository::inbound_lookup_repo::InboundLookupRepository;
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info, info_span, warn};
use uuid::Uuid;

// ==========================================
// FlowReport
// ==========================================
/// Everything a presentation layer needs to draw one inbound flow.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FlowReport {
    pub po_key: String,
    pub token_kind: TokenKind,
    /// external lookups spent resolving the token
    pub hops: usize,
    /// always 7, pipeline order
    pub stages: Vec<EffectiveStage>,
    pub kpis: KpiSummary,
    /// source-provided summary blob, passed through untouched
    pub summary: Value,
    pub fetched_at: DateTime<Utc>,
}

impl FlowReport {
    pub fn stage(&self, key: StageKey) -> Option<&EffectiveStage> {
        self.stages.iter().find(|s| s.key == key)
    }
}

// ==========================================
// InboundFlowApi
// ==========================================
pub struct InboundFlowApi<R>
where
    R: InboundLookupRepository + InboundFlowRepository,
{
    resolver: TokenResolver<R>,
    fetcher: SnapshotFetcher<R>,
    cache: Option<SnapshotCache>,
}

impl<R> InboundFlowApi<R>
where
    R: InboundLookupRepository + InboundFlowRepository,
{
    /// # Errors
    /// `FlowError::Config` when the configuration is unusable.
    pub fn new(repo: Arc<R>, config: FlowConfig) -> FlowResult<Self> {
        config.validate().map_err(FlowError::Config)?;
        let classifier = TokenClassifier::new(&config.label_prefix)
            .map_err(|e| FlowError::Config(format!("label prefix: {}", e)))?;

        let cache = config
            .snapshot_cache_enabled
            .then(|| SnapshotCache::new(config.snapshot_cache_capacity));

        debug!(
            label_prefix = %config.label_prefix,
            cache_enabled = cache.is_some(),
            "inbound flow api ready"
        );

        Ok(Self {
            resolver: TokenResolver::new(classifier, repo.clone()),
            fetcher: SnapshotFetcher::new(repo),
            cache,
        })
    }

    /// Resolve a raw token and derive the full flow of its PO.
    ///
    /// # Errors
    /// - `EmptyToken`: blank input, nothing is read
    /// - `Unresolvable`: no PO matches the token
    /// - `NotFound`: the PO has no inbound flow
    /// - `TransportError`: the store failed
    pub fn resolve_and_derive_flow(&self, raw_token: &str) -> FlowResult<FlowReport> {
        let request_id = Uuid::new_v4();
        let span = info_span!("resolve_and_derive_flow", %request_id);
        let _enter = span.enter();

        let result = self
            .resolver
            .resolve_traced(raw_token)
            .map_err(FlowError::from)
            .and_then(|resolution| {
                let snapshot = self.snapshot(&resolution.po_key)?;
                Ok(Self::build_report(&resolution, &snapshot))
            });

        match &result {
            Ok(report) => info!(
                token_kind = %report.token_kind,
                po_key = %report.po_key,
                hops = report.hops,
                progress = report.kpis.progress_percent,
                "inbound flow derived"
            ),
            Err(e) if e.is_retryable() => warn!(token = raw_token.trim(), error = %e, "inbound flow failed"),
            Err(e) => info!(token = raw_token.trim(), outcome = %e, "inbound flow not available"),
        }
        result
    }

    /// Drop a PO's cached snapshot. No-op when caching is off.
    pub fn invalidate(&self, po_key: &str) -> bool {
        self.cache
            .as_ref()
            .map(|c| c.invalidate(po_key.trim()))
            .unwrap_or(false)
    }

    pub fn clear_cache(&self) {
        if let Some(cache) = &self.cache {
            cache.clear();
        }
    }

    pub fn cache_enabled(&self) -> bool {
        self.cache.is_some()
    }

    fn snapshot(&self, po_key: &str) -> FlowResult<FlowSnapshot> {
        if let Some(cache) = &self.cache {
            if let Some(hit) = cache.get(po_key) {
                debug!(po_key, "snapshot cache hit");
                return Ok(hit);
            }
        }

        let snapshot = self.fetcher.fetch(po_key)?;
        if let Some(cache) = &self.cache {
            cache.insert(snapshot.clone());
        }
        Ok(snapshot)
    }

    fn build_report(resolution: &Resolution, snapshot: &FlowSnapshot) -> FlowReport {
        let stages = StatusDeriver::derive_stages(snapshot);
        let kpis = KpiAggregator::aggregate(&stages);
        FlowReport {
            po_key: resolution.po_key.clone(),
            token_kind: resolution.token.kind(),
            hops: resolution.hops,
            stages,
            kpis,
            summary: snapshot.summary().clone(),
            fetched_at: snapshot.fetched_at(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::fake_repo::FakeInboundRepository;
    use crate::repository::inbound_flow_repo::FlowDocument;
    use serde_json::json;

    const PO: &str = "MFI/25/PO/00079";
    const LABEL: &str = "LBL-GRN-20250903-7538-001-002";

    fn seeded() -> FakeInboundRepository {
        let mut fake = FakeInboundRepository::new();
        fake.grn_by_label.insert(LABEL.into(), "GRN-7738".into());
        fake.po_by_grn.insert("GRN-7738".into(), PO.into());
        fake.documents.insert(
            PO.into(),
            FlowDocument::from_json(
                PO,
                json!({
                    "po_no": PO,
                    "stages": {
                        "gate_entry": {"status": "In Transit", "rows": [{"gate_pass_no": "GP-1001"}]},
                        "grn_posting": {"status": "Open", "rows": [
                            {"grn_no": "GRN-7738"}, {"grn_no": "GRN-7739"}, {"grn_no": "GRN-7740"}
                        ]}
                    },
                    "summary": {"grns": ["GRN-7738", "GRN-7739", "GRN-7740"]}
                }),
            )
            .unwrap(),
        );
        fake
    }

    fn api(fake: FakeInboundRepository, config: FlowConfig) -> (Arc<FakeInboundRepository>, InboundFlowApi<FakeInboundRepository>) {
        let repo = Arc::new(fake);
        let api = InboundFlowApi::new(repo.clone(), config).unwrap();
        (repo, api)
    }

    #[test]
    fn test_po_token_end_to_end() {
        let (repo, api) = api(seeded(), FlowConfig::default());
        let report = api.resolve_and_derive_flow(PO).unwrap();

        assert_eq!(report.po_key, PO);
        assert_eq!(report.token_kind, TokenKind::Po);
        assert_eq!(report.hops, 0);
        assert_eq!(repo.lookup_count(), 0);
        assert_eq!(report.stages.len(), 7);
        assert_eq!(report.stage(StageKey::GrnPosting).unwrap().effective_status, "Posted");
        assert_eq!(report.stage(StageKey::GateEntry).unwrap().effective_status, "Closed");
        assert_eq!(report.kpis.grns_posted, 3);
        // gate, weight and grn complete
        assert_eq!(report.kpis.completed_stages, 3);
        assert_eq!(report.kpis.progress_percent, 43);
        assert_eq!(report.summary["grns"][0], "GRN-7738");
    }

    #[test]
    fn test_label_token_takes_two_hops() {
        let (repo, api) = api(seeded(), FlowConfig::default());
        let report = api.resolve_and_derive_flow(LABEL).unwrap();
        assert_eq!(report.po_key, PO);
        assert_eq!(report.token_kind, TokenKind::Label);
        assert_eq!(report.hops, 2);
        assert_eq!(repo.lookup_count(), 2);
    }

    #[test]
    fn test_blank_token_reads_nothing() {
        let (repo, api) = api(seeded(), FlowConfig::default());
        let err = api.resolve_and_derive_flow("   ").unwrap_err();
        assert!(matches!(err, FlowError::EmptyToken));
        assert_eq!(repo.lookup_count(), 0);
        assert_eq!(repo.flow_read_count(), 0);
    }

    #[test]
    fn test_negative_results() {
        let (_, api) = api(seeded(), FlowConfig::default());

        let err = api.resolve_and_derive_flow("LBL-UNKNOWN-1").unwrap_err();
        assert!(matches!(err, FlowError::Unresolvable { .. }));
        assert!(err.is_negative_result());

        let err = api.resolve_and_derive_flow("MFI/25/PO/99999").unwrap_err();
        assert!(matches!(err, FlowError::NotFound { ref po_key } if po_key == "MFI/25/PO/99999"));
        assert!(err.is_negative_result());
    }

    #[test]
    fn test_transport_failure_is_retryable() {
        let mut fake = seeded();
        fake.offline = true;
        let (_, api) = api(fake, FlowConfig::default());

        let err = api.resolve_and_derive_flow(LABEL).unwrap_err();
        assert!(err.is_retryable());

        let err = api.resolve_and_derive_flow(PO).unwrap_err();
        assert!(matches!(err, FlowError::TransportError(_)));
    }

    #[test]
    fn test_cache_saves_the_flow_read() {
        let config = FlowConfig {
            snapshot_cache_enabled: true,
            ..FlowConfig::default()
        };
        let (repo, api) = api(seeded(), config);
        assert!(api.cache_enabled());

        let first = api.resolve_and_derive_flow(PO).unwrap();
        let second = api.resolve_and_derive_flow(PO).unwrap();
        assert_eq!(repo.flow_read_count(), 1);
        assert_eq!(first.stages, second.stages);
        assert_eq!(first.kpis, second.kpis);

        assert!(api.invalidate(PO));
        api.resolve_and_derive_flow(PO).unwrap();
        assert_eq!(repo.flow_read_count(), 2);

        api.clear_cache();
        api.resolve_and_derive_flow(PO).unwrap();
        assert_eq!(repo.flow_read_count(), 3);
    }

    #[test]
    fn test_without_cache_every_call_reads() {
        let (repo, api) = api(seeded(), FlowConfig::default());
        api.resolve_and_derive_flow(PO).unwrap();
        api.resolve_and_derive_flow(PO).unwrap();
        assert_eq!(repo.flow_read_count(), 2);
        assert!(!api.invalidate(PO));
    }

    #[test]
    fn test_custom_label_prefix() {
        let mut fake = seeded();
        fake.grn_by_label.insert("PAL-0001".into(), "GRN-7738".into());
        let config = FlowConfig {
            label_prefix: "PAL-".into(),
            ..FlowConfig::default()
        };
        let (_, api) = api(fake, config);
        let report = api.resolve_and_derive_flow(" PAL-0001 ").unwrap();
        assert_eq!(report.token_kind, TokenKind::Label);
        assert_eq!(report.po_key, PO);
    }

    #[test]
    fn test_blank_label_prefix_is_rejected() {
        let config = FlowConfig {
            label_prefix: "  ".into(),
            ..FlowConfig::default()
        };
        let result = InboundFlowApi::new(Arc::new(FakeInboundRepository::new()), config);
        assert!(matches!(result, Err(FlowError::Config(_))));
    }

    #[test]
    fn test_report_serializes_camel_case() {
        let (_, api) = api(seeded(), FlowConfig::default());
        let report = api.resolve_and_derive_flow(PO).unwrap();
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["poKey"], PO);
        assert_eq!(json["tokenKind"], "PO");
        assert_eq!(json["kpis"]["progressPercent"], 43);
        assert_eq!(json["stages"][4]["effectiveStatus"], "Posted");
        assert_eq!(json["stages"][4]["key"], "grn_posting");
    }
}

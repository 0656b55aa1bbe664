// ==========================================
// InboundFlowApi integration tests (SQLite)
// ==========================================
// Token resolution, stage derivation and KPIs end to end against a
// seeded temp database
// ==========================================


use inbound_flow::config::config_keys;
use inbound_flow::logging;
use inbound_flow::{FlowError, StageKey, TokenKind};
use test_helpers::*;

fn effective(report: &inbound_flow::FlowReport, key: StageKey) -> String {
    report
        .stage(key)
        .map(|s| s.effective_status.clone())
        .unwrap_or_default()
}

// ==========================================
// Resolution paths
// ==========================================

#[test]
fn test_po_token_resolves_without_lookups() {
    logging::init_test();
    let (_tmp, db_path) = create_seeded_db().unwrap();
    let api = build_api(&db_path).unwrap();

    let report = api.resolve_and_derive_flow(PO).unwrap();
    assert_eq!(report.po_key, PO);
    assert_eq!(report.token_kind, TokenKind::Po);
    assert_eq!(report.hops, 0);
}

#[test]
fn test_label_token_resolves_through_grn() {
    logging::init_test();
    let (_tmp, db_path) = create_seeded_db().unwrap();
    let api = build_api(&db_path).unwrap();

    let report = api.resolve_and_derive_flow(LABEL).unwrap();
    assert_eq!(report.po_key, PO);
    assert_eq!(report.token_kind, TokenKind::Label);
    assert_eq!(report.hops, 2);

    // label lookup is case-insensitive
    let lower = api.resolve_and_derive_flow(&LABEL.to_lowercase()).unwrap();
    assert_eq!(lower.po_key, PO);
}

#[test]
fn test_document_tokens_resolve_in_one_hop() {
    logging::init_test();
    let (_tmp, db_path) = create_seeded_db().unwrap();
    let api = build_api(&db_path).unwrap();

    let cases = [
        ("GRN-7739", TokenKind::Grn, PO),
        ("INV-89", TokenKind::Invoice, PO),
        ("LR-555", TokenKind::Lr, PO),
        ("GP-2001", TokenKind::GatePass, PO_GATE_ONLY),
    ];
    for (token, kind, po) in cases {
        let report = api
            .resolve_and_derive_flow(token)
            .unwrap_or_else(|e| panic!("{token}: {e}"));
        assert_eq!(report.token_kind, kind, "{token}");
        assert_eq!(report.po_key, po, "{token}");
        assert_eq!(report.hops, 1, "{token}");
    }
}

#[test]
fn test_bundle_fallbacks() {
    logging::init_test();
    let (_tmp, db_path) = create_seeded_db().unwrap();
    let api = build_api(&db_path).unwrap();

    // no link row for GP-1001: PO comes from its bundle
    let report = api.resolve_and_derive_flow("GP-1001").unwrap();
    assert_eq!(report.po_key, PO);
    assert_eq!(report.hops, 2);

    // no GRN carries LR-777: first non-blank PO of the gate pass bundles
    let report = api.resolve_and_derive_flow("LR-777").unwrap();
    assert_eq!(report.po_key, PO_GATE_ONLY);
    assert_eq!(report.hops, 2);
}

#[test]
fn test_gate_pass_recorded_against_po_resolves() {
    logging::init_test();
    let (_tmp, db_path) = create_seeded_db().unwrap();
    open_conn(&db_path)
        .unwrap()
        .execute(
            "INSERT INTO gate_entry (gate_pass_no, po_no, lr_no, status) VALUES ('GP-4001', ?1, 'LR-999', 'Inside')",
            [PO],
        )
        .unwrap();
    let api = build_api(&db_path).unwrap();

    let report = api.resolve_and_derive_flow(PO).unwrap();
    assert!(report.summary["gate_passes"]
        .as_array()
        .unwrap()
        .iter()
        .any(|gp| gp == "GP-4001"));

    let report = api.resolve_and_derive_flow("GP-4001").unwrap();
    assert_eq!(report.po_key, PO);
    assert_eq!(report.hops, 1);

    // no GRN carries LR-999: the gate pass's own PO answers the bundle read
    let report = api.resolve_and_derive_flow("LR-999").unwrap();
    assert_eq!(report.po_key, PO);
    assert_eq!(report.hops, 2);
}

#[test]
fn test_document_tokens_ignore_case() {
    logging::init_test();
    let (_tmp, db_path) = create_seeded_db().unwrap();
    let api = build_api(&db_path).unwrap();

    let cases = [
        ("grn-7739", PO),
        ("inv-89", PO),
        ("lr-555", PO),
        ("gp-2001", PO_GATE_ONLY),
    ];
    for (token, po) in cases {
        let report = api
            .resolve_and_derive_flow(token)
            .unwrap_or_else(|e| panic!("{token}: {e}"));
        assert_eq!(report.po_key, po, "{token}");
        assert_eq!(report.hops, 1, "{token}");
    }
}

#[test]
fn test_literal_po_fallback() {
    logging::init_test();
    let (_tmp, db_path) = create_seeded_db().unwrap();
    let api = build_api(&db_path).unwrap();

    let report = api.resolve_and_derive_flow(&format!("  {}  ", PO_NUMERIC)).unwrap();
    assert_eq!(report.token_kind, TokenKind::Unknown);
    assert_eq!(report.po_key, PO_NUMERIC);
    assert_eq!(report.hops, 2);
    assert_eq!(effective(&report, StageKey::GrnPosting), "Posted");
}

// ==========================================
// Negative results and errors
// ==========================================

#[test]
fn test_blank_token_is_rejected() {
    logging::init_test();
    let (_tmp, db_path) = create_seeded_db().unwrap();
    let api = build_api(&db_path).unwrap();

    for token in ["", "   ", "\t\n"] {
        let err = api.resolve_and_derive_flow(token).unwrap_err();
        assert!(matches!(err, FlowError::EmptyToken), "{token:?}");
        assert!(!err.is_negative_result());
        assert!(!err.is_retryable());
    }
}

#[test]
fn test_unresolvable_tokens() {
    logging::init_test();
    let (_tmp, db_path) = create_seeded_db().unwrap();
    let api = build_api(&db_path).unwrap();

    for token in ["LBL-GRN-00000000-0000-000-000", "GRN-0000", "GP-9999", "XYZ-123"] {
        let err = api.resolve_and_derive_flow(token).unwrap_err();
        match &err {
            FlowError::Unresolvable { token: t } => assert_eq!(t, token),
            other => panic!("{token}: unexpected {other:?}"),
        }
        assert!(err.is_negative_result());
    }
}

#[test]
fn test_po_without_trace_is_not_found() {
    logging::init_test();
    let (_tmp, db_path) = create_seeded_db().unwrap();
    let api = build_api(&db_path).unwrap();

    let err = api.resolve_and_derive_flow("MFI/25/PO/99999").unwrap_err();
    assert!(matches!(err, FlowError::NotFound { ref po_key } if po_key == "MFI/25/PO/99999"));
    assert!(err.is_negative_result());
}

#[test]
fn test_missing_tables_surface_as_transport_error() {
    logging::init_test();
    let tmp = tempfile::NamedTempFile::new().unwrap();
    let db_path = tmp.path().to_str().unwrap().to_string();
    let api = build_api(&db_path).unwrap();

    let err = api.resolve_and_derive_flow("GRN-7738").unwrap_err();
    assert!(err.is_retryable(), "unexpected {err:?}");
}

// ==========================================
// Derived statuses and KPIs
// ==========================================

#[test]
fn test_grn_rows_override_upstream_statuses() {
    logging::init_test();
    let (_tmp, db_path) = create_seeded_db().unwrap();
    let api = build_api(&db_path).unwrap();

    let report = api.resolve_and_derive_flow(PO).unwrap();
    let keys: Vec<StageKey> = report.stages.iter().map(|s| s.key).collect();
    assert_eq!(keys, StageKey::ALL.to_vec());

    let grn = report.stage(StageKey::GrnPosting).unwrap();
    assert_eq!(grn.raw_status, "Open");
    assert_eq!(grn.effective_status, "Posted");
    assert_eq!(grn.row_count(), 3);

    let gate = report.stage(StageKey::GateEntry).unwrap();
    assert_eq!(gate.raw_status, "In Transit");
    assert_eq!(gate.effective_status, "Closed");
    assert!(gate.overridden);

    assert_eq!(effective(&report, StageKey::WeightCapture), "Completed");
    assert_eq!(effective(&report, StageKey::LabelPrinting), "Completed");
    assert_eq!(effective(&report, StageKey::VehicleInspection), "Open");
    assert_eq!(effective(&report, StageKey::Palletization), "Open");

    let kpis = &report.kpis;
    assert_eq!(kpis.completed_stages, 4);
    assert_eq!(kpis.progress_percent, 57);
    assert_eq!(kpis.grns_posted, 3);
    assert_eq!(kpis.labels_printed, 1);
    assert_eq!(kpis.pallet_count, 0);
    assert_eq!(kpis.current_stage, Some(StageKey::VehicleInspection));

    assert_eq!(report.summary["grns"].as_array().map(Vec::len), Some(3));
    assert_eq!(report.summary["invoices"][0], "INV-88");
    assert_eq!(report.summary["gate_passes"][0], "GP-1001");
}

#[test]
fn test_partial_weight_headers_are_in_process() {
    logging::init_test();
    let (_tmp, db_path) = create_seeded_db().unwrap();
    let api = build_api(&db_path).unwrap();

    let report = api.resolve_and_derive_flow(PO_GATE_ONLY).unwrap();
    let gate = report.stage(StageKey::GateEntry).unwrap();
    assert_eq!(gate.effective_status, "Open");
    assert_eq!(gate.done_by.as_deref(), Some("security.desk"));
    // linked gate pass plus the one whose bundle names this PO
    assert_eq!(gate.row_count(), 2);

    assert_eq!(effective(&report, StageKey::WeightCapture), "In-Process");
    assert_eq!(report.kpis.progress_percent, 0);
    assert_eq!(report.kpis.current_stage, Some(StageKey::GateEntry));
}

#[test]
fn test_palletization_closes_gate_and_weight() {
    logging::init_test();
    let (_tmp, db_path) = create_seeded_db().unwrap();
    let api = build_api(&db_path).unwrap();

    let report = api.resolve_and_derive_flow(PO_PALLETIZED).unwrap();
    let gate = report.stage(StageKey::GateEntry).unwrap();
    assert_eq!(gate.raw_status, "Rejected");
    assert_eq!(gate.effective_status, "Closed");

    let weight = report.stage(StageKey::WeightCapture).unwrap();
    assert_eq!(weight.raw_status, "Pending");
    assert_eq!(weight.effective_status, "Completed");

    assert_eq!(effective(&report, StageKey::Palletization), "Completed");
    // no GRN rows, GRN stage untouched
    assert_eq!(effective(&report, StageKey::GrnPosting), "Open");

    let kpis = &report.kpis;
    assert_eq!(kpis.pallet_count, 2);
    assert_eq!(kpis.qc_pending_count, 2);
    assert_eq!(kpis.completed_stages, 3);
    assert_eq!(kpis.progress_percent, 43);
}

#[test]
fn test_untouched_flow_is_all_open() {
    logging::init_test();
    let (_tmp, db_path) = create_seeded_db().unwrap();
    let api = build_api(&db_path).unwrap();

    let report = api.resolve_and_derive_flow(PO_UNTOUCHED).unwrap();
    assert_eq!(report.stages.len(), 7);
    for stage in &report.stages {
        assert_eq!(stage.effective_status, "Open", "{}", stage.key);
        assert!(!stage.overridden);
    }
    assert_eq!(report.kpis.progress_percent, 0);
    assert_eq!(report.kpis.grns_posted, 0);
    assert_eq!(report.kpis.qc_pending_count, 0);
}

#[test]
fn test_repeated_calls_give_identical_stages() {
    logging::init_test();
    let (_tmp, db_path) = create_seeded_db().unwrap();
    let api = build_api(&db_path).unwrap();

    let first = api.resolve_and_derive_flow(PO).unwrap();
    let second = api.resolve_and_derive_flow(LABEL).unwrap();
    assert_eq!(first.stages, second.stages);
    assert_eq!(first.kpis, second.kpis);
}

// ==========================================
// Configuration from config_kv
// ==========================================

#[test]
fn test_label_prefix_from_config() {
    logging::init_test();
    let (_tmp, db_path) = create_seeded_db().unwrap();
    let conn = open_conn(&db_path).unwrap();
    set_config(&conn, config_keys::LABEL_PREFIX, "PAL-").unwrap();
    conn.execute(
        "INSERT INTO label_print (label_uid, grn_no, po_no) VALUES ('PAL-0001', 'GRN-7738', ?1)",
        [PO],
    )
    .unwrap();

    let api = build_api(&db_path).unwrap();
    let report = api.resolve_and_derive_flow("PAL-0001").unwrap();
    assert_eq!(report.token_kind, TokenKind::Label);
    assert_eq!(report.po_key, PO);

    // the default prefix is no longer a label
    let err = api.resolve_and_derive_flow(LABEL).unwrap_err();
    assert!(matches!(err, FlowError::Unresolvable { .. }));
}

#[test]
fn test_cache_serves_stale_until_invalidated() {
    logging::init_test();
    let (_tmp, db_path) = create_seeded_db().unwrap();
    let conn = open_conn(&db_path).unwrap();
    set_config(&conn, config_keys::SNAPSHOT_CACHE_ENABLED, "true").unwrap();
    set_config(&conn, config_keys::SNAPSHOT_CACHE_CAPACITY, "8").unwrap();

    let api = build_api(&db_path).unwrap();
    assert!(api.cache_enabled());
    let before = api.resolve_and_derive_flow(PO_UNTOUCHED).unwrap();
    assert_eq!(before.kpis.grns_posted, 0);

    conn.execute(
        "INSERT INTO grn_header (grn_no, po_no, status) VALUES ('GRN-8001', ?1, 'Posted')",
        [PO_UNTOUCHED],
    )
    .unwrap();

    let cached = api.resolve_and_derive_flow(PO_UNTOUCHED).unwrap();
    assert_eq!(cached.kpis.grns_posted, 0);

    assert!(api.invalidate(PO_UNTOUCHED));
    let fresh = api.resolve_and_derive_flow(PO_UNTOUCHED).unwrap();
    assert_eq!(fresh.kpis.grns_posted, 1);
    assert_eq!(effective(&fresh, StageKey::GateEntry), "Closed");
}

#[test]
fn test_blank_configured_prefix_is_a_config_error() {
    logging::init_test();
    let (_tmp, db_path) = create_seeded_db().unwrap();
    let conn = open_conn(&db_path).unwrap();
    set_config(&conn, config_keys::LABEL_PREFIX, "   ").unwrap();

    let err = build_api(&db_path).err().unwrap();
    assert!(err.to_string().contains(config_keys::LABEL_PREFIX), "{err}");
}

// ==========================================
// Inbound Flow Engine - Warehouse Table Schema
// ==========================================
// Role: idempotent DDL for the tables the SQLite repository reads
// Note: the tables are owned by the warehouse CRUD modules; this is
//       what the reader expects to find, used by the CLI and tests
// ==========================================

use crate::db::CURRENT_SCHEMA_VERSION;
use rusqlite::{params, Connection};

const INBOUND_SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS schema_version (
    version INTEGER PRIMARY KEY,
    applied_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE TABLE IF NOT EXISTS config_kv (
    scope_id TEXT NOT NULL,
    key TEXT NOT NULL,
    value TEXT NOT NULL,
    updated_at TEXT NOT NULL DEFAULT (datetime('now')),
    PRIMARY KEY (scope_id, key)
);

CREATE TABLE IF NOT EXISTS inbound_stage_status (
    po_no TEXT NOT NULL,
    stage_key TEXT NOT NULL,
    status TEXT NOT NULL,
    closed_at TEXT,
    done_by TEXT,
    updated_at TEXT NOT NULL DEFAULT (datetime('now')),
    PRIMARY KEY (po_no, stage_key)
);

CREATE TABLE IF NOT EXISTS gate_entry (
    gate_pass_no TEXT PRIMARY KEY,
    po_no TEXT,
    vehicle_no TEXT,
    lr_no TEXT,
    transporter TEXT,
    status TEXT NOT NULL DEFAULT 'Open',
    po_bundle_json TEXT,
    created_at TEXT NOT NULL DEFAULT (datetime('now')),
    updated_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE TABLE IF NOT EXISTS gate_pass_po_link (
    gate_pass_no TEXT NOT NULL,
    po_no TEXT NOT NULL,
    created_at TEXT NOT NULL DEFAULT (datetime('now')),
    PRIMARY KEY (gate_pass_no, po_no)
);

CREATE TABLE IF NOT EXISTS vehicle_inspection (
    inspection_id INTEGER PRIMARY KEY AUTOINCREMENT,
    gate_pass_no TEXT NOT NULL,
    po_no TEXT,
    result TEXT,
    inspected_by TEXT,
    inspected_at TEXT
);

CREATE TABLE IF NOT EXISTS material_inspection (
    inspection_id INTEGER PRIMARY KEY AUTOINCREMENT,
    po_no TEXT NOT NULL,
    item_code TEXT,
    result TEXT,
    inspected_by TEXT,
    inspected_at TEXT
);

CREATE TABLE IF NOT EXISTS weight_capture_header (
    weight_id INTEGER PRIMARY KEY AUTOINCREMENT,
    po_no TEXT NOT NULL,
    gate_pass_no TEXT,
    header_status TEXT NOT NULL DEFAULT 'Open',
    gross_kg REAL,
    tare_kg REAL,
    net_kg REAL,
    captured_at TEXT
);

CREATE TABLE IF NOT EXISTS grn_header (
    grn_no TEXT PRIMARY KEY,
    po_no TEXT NOT NULL,
    invoice_no TEXT,
    lr_no TEXT,
    gate_pass_no TEXT,
    status TEXT NOT NULL DEFAULT 'Posted',
    posted_by TEXT,
    posted_at TEXT,
    updated_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE TABLE IF NOT EXISTS label_print (
    label_uid TEXT PRIMARY KEY,
    grn_no TEXT NOT NULL,
    po_no TEXT,
    item_code TEXT,
    printed_by TEXT,
    printed_at TEXT
);

CREATE TABLE IF NOT EXISTS pallet (
    pallet_row_id INTEGER PRIMARY KEY AUTOINCREMENT,
    pallet_no TEXT NOT NULL,
    label_uid TEXT,
    po_no TEXT NOT NULL,
    location_code TEXT,
    qc_status TEXT,
    palletized_by TEXT,
    palletized_at TEXT
);

CREATE INDEX IF NOT EXISTS idx_gate_entry_po ON gate_entry(po_no);
CREATE INDEX IF NOT EXISTS idx_gate_entry_lr ON gate_entry(lr_no);
CREATE INDEX IF NOT EXISTS idx_grn_header_po ON grn_header(po_no);
CREATE INDEX IF NOT EXISTS idx_grn_header_invoice ON grn_header(invoice_no);
CREATE INDEX IF NOT EXISTS idx_grn_header_lr ON grn_header(lr_no);
CREATE INDEX IF NOT EXISTS idx_weight_capture_po ON weight_capture_header(po_no);
CREATE INDEX IF NOT EXISTS idx_label_print_po ON label_print(po_no);
CREATE INDEX IF NOT EXISTS idx_pallet_po ON pallet(po_no);
"#;

/// Create the warehouse tables if they are missing and stamp the schema version.
pub fn ensure_inbound_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(INBOUND_SCHEMA_SQL)?;
    conn.execute(
        "INSERT OR IGNORE INTO schema_version (version) VALUES (?1)",
        params![CURRENT_SCHEMA_VERSION],
    )?;
    Ok(())
}

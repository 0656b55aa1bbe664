// ==========================================
// Inbound Flow Engine - SQLite Inbound Repository
// ==========================================
// Role: rusqlite implementation of the point lookups and of the
//       aggregate flow document read
// Rule: parameterised SQL only; no status rules in this file
// ==========================================

use crate::db::open_sqlite_connection;
use crate::domain::stage::StageKey;
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::inbound_flow_repo::{FlowDocument, InboundFlowRepository, StageDocument};
use crate::repository::inbound_lookup_repo::{GatePassPoEntry, InboundLookupRepository};
use rusqlite::types::ValueRef;
use rusqlite::{params, Connection, OptionalExtension};
use serde_json::{json, Value};
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};

/// Gate passes tied to a PO (?1) directly, through the link table, or through the bundle.
const PO_GATE_PASSES_SQL: &str = r#"
    SELECT g.gate_pass_no FROM gate_entry g WHERE g.po_no = ?1
    UNION
    SELECT l.gate_pass_no FROM gate_pass_po_link l WHERE l.po_no = ?1
    UNION
    SELECT g2.gate_pass_no
    FROM gate_entry g2,
         json_each(CASE WHEN json_valid(g2.po_bundle_json) THEN g2.po_bundle_json ELSE '[]' END) j
    WHERE json_extract(j.value, '$.po_no') = ?1
"#;

// ==========================================
// Row helpers
// ==========================================

fn value_ref_to_json(value: ValueRef<'_>) -> Value {
    match value {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(i) => Value::from(i),
        ValueRef::Real(f) => serde_json::Number::from_f64(f)
            .map(Value::Number)
            .unwrap_or(Value::Null),
        ValueRef::Text(t) => Value::String(String::from_utf8_lossy(t).into_owned()),
        ValueRef::Blob(_) => Value::Null,
    }
}

/// Run a query and return each row as a JSON object keyed by column name.
fn query_json_rows(conn: &Connection, sql: &str, po_key: &str) -> RepositoryResult<Vec<Value>> {
    let mut stmt = conn.prepare(sql)?;
    let names: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();
    let rows = stmt.query_map(params![po_key], |row| {
        let mut obj = serde_json::Map::with_capacity(names.len());
        for (i, name) in names.iter().enumerate() {
            obj.insert(name.clone(), value_ref_to_json(row.get_ref(i)?));
        }
        Ok(Value::Object(obj))
    })?;
    Ok(rows.collect::<Result<Vec<_>, _>>()?)
}

/// Single text column lookup; blank values count as absent.
fn query_optional_text(conn: &Connection, sql: &str, key: &str) -> RepositoryResult<Option<String>> {
    let value: Option<Option<String>> = conn
        .query_row(sql, params![key], |row| row.get(0))
        .optional()?;
    Ok(value
        .flatten()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty()))
}

/// Decode a stored gate pass PO bundle; unreadable bundles are treated as empty.
fn parse_bundle(gate_pass_no: &str, raw: Option<String>) -> Vec<GatePassPoEntry> {
    let raw = match raw {
        Some(r) if !r.trim().is_empty() => r,
        _ => return Vec::new(),
    };
    match serde_json::from_str::<Vec<GatePassPoEntry>>(&raw) {
        Ok(entries) => entries,
        Err(e) => {
            tracing::warn!(gate_pass_no, error = %e, "unreadable gate pass PO bundle, ignored");
            Vec::new()
        }
    }
}

fn last_row_text(rows: &[Value], key: &str) -> Option<String> {
    rows.last()
        .and_then(|row| row.get(key))
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn row_texts(rows: &[Value], key: &str) -> Vec<Value> {
    rows.iter()
        .filter_map(|row| row.get(key).and_then(Value::as_str))
        .map(|s| Value::String(s.to_string()))
        .collect()
}

#[derive(Debug)]
struct StageStatusRecord {
    status: String,
    closed_at: Option<String>,
    done_by: Option<String>,
}

// ==========================================
// SqliteInboundRepository
// ==========================================
/// Reads the warehouse tables of one SQLite database.
pub struct SqliteInboundRepository {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteInboundRepository {
    /// Open the database at `db_path`.
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = open_sqlite_connection(db_path)
            .map_err(|e| RepositoryError::DatabaseConnectionError(e.to_string()))?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Share an existing connection.
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    fn load_stage_statuses(
        conn: &Connection,
        po_key: &str,
    ) -> RepositoryResult<HashMap<String, StageStatusRecord>> {
        let mut stmt = conn.prepare(
            "SELECT stage_key, status, closed_at, done_by FROM inbound_stage_status WHERE po_no = ?1",
        )?;
        let rows = stmt.query_map(params![po_key], |row| {
            Ok((
                row.get::<_, String>(0)?,
                StageStatusRecord {
                    status: row.get(1)?,
                    closed_at: row.get(2)?,
                    done_by: row.get(3)?,
                },
            ))
        })?;

        let mut map = HashMap::new();
        for row in rows {
            let (key, record) = row?;
            map.insert(key.trim().to_ascii_lowercase(), record);
        }
        Ok(map)
    }

    fn load_stage_rows(conn: &Connection, stage: StageKey, po_key: &str) -> RepositoryResult<Vec<Value>> {
        let sql = match stage {
            StageKey::GateEntry => format!(
                r#"SELECT gate_pass_no, po_no, vehicle_no, lr_no, transporter, status, created_at, updated_at
                   FROM gate_entry
                   WHERE gate_pass_no IN ({})
                   ORDER BY created_at, gate_pass_no"#,
                PO_GATE_PASSES_SQL
            ),
            StageKey::VehicleInspection => format!(
                r#"SELECT inspection_id, gate_pass_no, result, inspected_by, inspected_at
                   FROM vehicle_inspection
                   WHERE po_no = ?1 OR gate_pass_no IN ({})
                   ORDER BY inspection_id"#,
                PO_GATE_PASSES_SQL
            ),
            StageKey::MaterialInspection => r#"SELECT inspection_id, item_code, result, inspected_by, inspected_at
                   FROM material_inspection
                   WHERE po_no = ?1
                   ORDER BY inspection_id"#
                .to_string(),
            StageKey::WeightCapture => r#"SELECT weight_id, gate_pass_no, header_status, gross_kg, tare_kg, net_kg, captured_at
                   FROM weight_capture_header
                   WHERE po_no = ?1
                   ORDER BY weight_id"#
                .to_string(),
            StageKey::GrnPosting => r#"SELECT grn_no, invoice_no, lr_no, gate_pass_no, status, posted_by, posted_at
                   FROM grn_header
                   WHERE po_no = ?1
                   ORDER BY COALESCE(posted_at, updated_at), grn_no"#
                .to_string(),
            StageKey::LabelPrinting => r#"SELECT label_uid, grn_no, item_code, printed_by, printed_at
                   FROM label_print
                   WHERE po_no = ?1 OR grn_no IN (SELECT grn_no FROM grn_header WHERE po_no = ?1)
                   ORDER BY printed_at, label_uid"#
                .to_string(),
            StageKey::Palletization => r#"SELECT pallet_row_id, pallet_no, label_uid, location_code, qc_status, palletized_by, palletized_at
                   FROM pallet
                   WHERE po_no = ?1
                   ORDER BY pallet_row_id"#
                .to_string(),
        };
        query_json_rows(conn, &sql, po_key)
    }

    fn load_invoices(conn: &Connection, po_key: &str) -> RepositoryResult<Vec<String>> {
        let mut stmt = conn.prepare(
            r#"SELECT DISTINCT invoice_no FROM grn_header
               WHERE po_no = ?1 AND invoice_no IS NOT NULL AND TRIM(invoice_no) <> ''
               ORDER BY invoice_no"#,
        )?;
        let rows = stmt.query_map(params![po_key], |row| row.get::<_, String>(0))?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }
}

// ==========================================
// InboundFlowRepository
// ==========================================
impl InboundFlowRepository for SqliteInboundRepository {
    fn get_inbound_flow(&self, po_key: &str) -> RepositoryResult<Option<FlowDocument>> {
        let guard = self.get_conn()?;
        // All loads share one read transaction so the document reflects a
        // single committed state.
        let conn = guard.unchecked_transaction()?;
        let statuses = Self::load_stage_statuses(&conn, po_key)?;

        let mut stages: BTreeMap<String, Option<StageDocument>> = BTreeMap::new();
        let mut gate_rows = Vec::new();
        let mut grn_rows = Vec::new();

        for stage in StageKey::ALL {
            let rows = Self::load_stage_rows(&conn, stage, po_key)?;
            let record = statuses.get(stage.as_str());

            if record.is_none() && rows.is_empty() {
                continue;
            }

            // Without an explicit stage record, gate entry and GRN fall back
            // to the status of their latest row.
            let status = match record {
                Some(r) => Some(r.status.clone()),
                None => match stage {
                    StageKey::GateEntry | StageKey::GrnPosting => last_row_text(&rows, "status"),
                    _ => None,
                },
            };

            match stage {
                StageKey::GateEntry => gate_rows = rows.clone(),
                StageKey::GrnPosting => grn_rows = rows.clone(),
                _ => {}
            }

            stages.insert(
                stage.as_str().to_string(),
                Some(StageDocument {
                    status,
                    closed_at: record.and_then(|r| r.closed_at.clone()),
                    done_by: record.and_then(|r| r.done_by.clone()),
                    rows: Some(rows),
                }),
            );
        }

        if stages.is_empty() {
            tracing::debug!(po_key, "no inbound trace for po");
            return Ok(None);
        }

        let summary = json!({
            "invoices": Self::load_invoices(&conn, po_key)?,
            "grns": row_texts(&grn_rows, "grn_no"),
            "gate_passes": row_texts(&gate_rows, "gate_pass_no"),
        });
        conn.commit()?;

        tracing::debug!(po_key, stages = stages.len(), "flow document assembled");
        Ok(Some(FlowDocument {
            po_no: Some(po_key.to_string()),
            stages,
            summary,
        }))
    }
}

// ==========================================
// InboundLookupRepository
// ==========================================
impl InboundLookupRepository for SqliteInboundRepository {
    fn lookup_grn_by_label(&self, label_uid: &str) -> RepositoryResult<Option<String>> {
        let conn = self.get_conn()?;
        query_optional_text(
            &conn,
            "SELECT grn_no FROM label_print WHERE label_uid = ?1 COLLATE NOCASE LIMIT 1",
            label_uid,
        )
    }

    fn lookup_po_by_grn(&self, grn_no: &str) -> RepositoryResult<Option<String>> {
        let conn = self.get_conn()?;
        query_optional_text(
            &conn,
            "SELECT po_no FROM grn_header WHERE grn_no = ?1 COLLATE NOCASE LIMIT 1",
            grn_no,
        )
    }

    fn lookup_po_by_gate_pass(&self, gate_pass_no: &str) -> RepositoryResult<Option<String>> {
        let conn = self.get_conn()?;
        query_optional_text(
            &conn,
            r#"SELECT po_no FROM (
                   SELECT l.po_no, 0 AS source, l.created_at FROM gate_pass_po_link l
                   WHERE l.gate_pass_no = ?1 COLLATE NOCASE
                   UNION ALL
                   SELECT g.po_no, 1 AS source, g.created_at FROM gate_entry g
                   WHERE g.gate_pass_no = ?1 COLLATE NOCASE
               )
               WHERE po_no IS NOT NULL AND TRIM(po_no) <> ''
               ORDER BY source, created_at LIMIT 1"#,
            gate_pass_no,
        )
    }

    fn get_gate_pass_bundle(&self, gate_pass_no: &str) -> RepositoryResult<Vec<GatePassPoEntry>> {
        let conn = self.get_conn()?;
        let raw: Option<Option<String>> = conn
            .query_row(
                "SELECT po_bundle_json FROM gate_entry WHERE gate_pass_no = ?1 COLLATE NOCASE LIMIT 1",
                params![gate_pass_no],
                |row| row.get(0),
            )
            .optional()?;
        Ok(parse_bundle(gate_pass_no, raw.flatten()))
    }

    fn lookup_po_by_lr(&self, lr_no: &str) -> RepositoryResult<Option<String>> {
        let conn = self.get_conn()?;
        query_optional_text(
            &conn,
            r#"SELECT po_no FROM grn_header
               WHERE lr_no = ?1 COLLATE NOCASE
               ORDER BY COALESCE(posted_at, updated_at) DESC, grn_no DESC
               LIMIT 1"#,
            lr_no,
        )
    }

    fn get_gate_pass_bundles_by_lr(&self, lr_no: &str) -> RepositoryResult<Vec<Vec<GatePassPoEntry>>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"SELECT gate_pass_no, po_no, po_bundle_json FROM gate_entry
               WHERE lr_no = ?1 COLLATE NOCASE
               ORDER BY updated_at DESC, gate_pass_no DESC"#,
        )?;
        let rows = stmt.query_map(params![lr_no], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, Option<String>>(1)?,
                row.get::<_, Option<String>>(2)?,
            ))
        })?;

        let mut bundles = Vec::new();
        for row in rows {
            let (gate_pass_no, po_no, raw) = row?;
            // the gate pass's own PO ranks ahead of its bundle
            let mut entries: Vec<GatePassPoEntry> = po_no
                .map(|po| GatePassPoEntry {
                    po_no: Some(po),
                    invoice_no: None,
                })
                .into_iter()
                .collect();
            entries.extend(parse_bundle(&gate_pass_no, raw));
            bundles.push(entries);
        }
        Ok(bundles)
    }

    fn lookup_po_by_invoice(&self, invoice_no: &str) -> RepositoryResult<Option<String>> {
        let conn = self.get_conn()?;
        query_optional_text(
            &conn,
            r#"SELECT po_no FROM grn_header
               WHERE invoice_no = ?1 COLLATE NOCASE
               ORDER BY COALESCE(posted_at, updated_at) DESC, grn_no DESC
               LIMIT 1"#,
            invoice_no,
        )
    }

    fn verify_po_exists(&self, po_key: &str) -> RepositoryResult<bool> {
        let conn = self.get_conn()?;
        let found: Option<i64> = conn
            .query_row(
                "SELECT 1 FROM grn_header WHERE po_no = ?1 LIMIT 1",
                params![po_key],
                |row| row.get(0),
            )
            .optional()?;
        Ok(found.is_some())
    }
}

// ==========================================
// Inbound Flow Engine - CLI entry point
// ==========================================
// Usage: inbound-flow [--db PATH] [--json] [--init-schema] TOKEN
// Exit codes: 0 found, 2 nothing found, 1 any other failure
// ==========================================

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use inbound_flow::config::ConfigManager;
use inbound_flow::db::{get_default_db_path, open_sqlite_connection, warn_on_schema_mismatch};
use inbound_flow::repository::{ensure_inbound_schema, SqliteInboundRepository};
use inbound_flow::{logging, FlowError, FlowReport, InboundFlowApi};
use std::process::ExitCode;
use std::sync::{Arc, Mutex};

#[derive(Parser)]
#[command(name = "inbound-flow")]
#[command(about = "Resolve an inbound reference and show its 7-stage material flow", long_about = None)]
#[command(version)]
struct Cli {
    /// Any reference: PO, GRN, gate pass, LR, label UID or invoice number
    token: String,

    /// SQLite database (default: $INBOUND_FLOW_DB_PATH or the user data dir)
    #[arg(long)]
    db: Option<String>,

    /// Print the report as JSON
    #[arg(long)]
    json: bool,

    /// Create missing tables before reading
    #[arg(long)]
    init_schema: bool,

    /// Emit logs as JSON lines
    #[arg(long)]
    log_json: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    if cli.log_json {
        logging::init_json();
    } else {
        logging::init();
    }

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => match err.downcast_ref::<FlowError>() {
            Some(flow_err) if flow_err.is_negative_result() => {
                eprintln!("{}", flow_err);
                ExitCode::from(2)
            }
            _ => {
                eprintln!("error: {:#}", err);
                ExitCode::FAILURE
            }
        },
    }
}

fn run(cli: &Cli) -> Result<()> {
    let db_path = cli.db.clone().unwrap_or_else(get_default_db_path);
    tracing::debug!(db_path = %db_path, version = inbound_flow::VERSION, "opening database");

    let conn = open_sqlite_connection(&db_path)
        .with_context(|| format!("cannot open database {}", db_path))?;
    if cli.init_schema {
        ensure_inbound_schema(&conn).context("schema initialisation failed")?;
    } else {
        warn_on_schema_mismatch(&conn);
    }
    let conn = Arc::new(Mutex::new(conn));

    let config = ConfigManager::from_connection(conn.clone())
        .load_flow_config()
        .context("cannot load configuration")?;
    let repo = Arc::new(SqliteInboundRepository::from_connection(conn));
    let api = InboundFlowApi::new(repo, config)?;

    let report = api.resolve_and_derive_flow(&cli.token)?;
    if cli.json {
        let out = serde_json::to_string_pretty(&report).map_err(|e| anyhow!("serialise report: {}", e))?;
        println!("{}", out);
    } else {
        print_report(&report);
    }
    Ok(())
}

fn print_report(report: &FlowReport) {
    println!("PO {}  ({} token, {} hop(s))", report.po_key, report.token_kind, report.hops);
    println!();
    for stage in &report.stages {
        let marker = if stage.overridden {
            format!("  (recorded: {})", stage.raw_status)
        } else {
            String::new()
        };
        println!(
            "  {:<20} {:<12} rows={:<4}{}",
            stage.label,
            stage.effective_status,
            stage.row_count(),
            marker
        );
    }

    let kpis = &report.kpis;
    println!();
    println!(
        "  progress {}%  ({}/{} stages)",
        kpis.progress_percent, kpis.completed_stages, kpis.total_stages
    );
    if let Some(current) = kpis.current_stage {
        println!("  current stage: {}", current.label());
    }
    println!(
        "  GRNs {}  labels {}  pallets {}  QC pending {}",
        kpis.grns_posted, kpis.labels_printed, kpis.pallet_count, kpis.qc_pending_count
    );
}

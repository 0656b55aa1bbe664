// ==========================================
// Inbound Flow Engine - Status Vocabulary
// ==========================================
// Role: status literals and the synonym whitelists used to read
//       free-text statuses coming from the source system
// Rule: matching is case-insensitive substring matching against the
//       fixed whitelists below, nothing else
// ==========================================

pub const STATUS_OPEN: &str = "Open";
pub const STATUS_CLOSED: &str = "Closed";
pub const STATUS_COMPLETED: &str = "Completed";
pub const STATUS_POSTED: &str = "Posted";
pub const STATUS_IN_PROCESS: &str = "In-Process";

/// Synonyms that mark a stage (or a weight header) as finished.
pub const CLOSED_LIKE: [&str; 6] = ["closed", "done", "posted", "accepted", "approved", "completed"];

/// Synonyms that mark a pallet as cleared by QC.
pub const QC_CLEARED: [&str; 4] = ["accepted", "approved", "cleared", "released"];

/// Case-insensitive substring match against a synonym list.
pub fn matches_any(status: &str, synonyms: &[&str]) -> bool {
    let lowered = status.to_lowercase();
    synonyms.iter().any(|s| lowered.contains(s))
}

/// True when the status reads as closed/completed/posted.
pub fn is_closed_like(status: &str) -> bool {
    matches_any(status, &CLOSED_LIKE)
}

/// True when a QC status reads as cleared.
pub fn is_qc_cleared(status: &str) -> bool {
    matches_any(status, &QC_CLEARED)
}

/// True when an effective status counts towards flow progress.
pub fn counts_as_complete(effective_status: &str) -> bool {
    effective_status == STATUS_POSTED
        || effective_status == STATUS_COMPLETED
        || is_closed_like(effective_status)
}

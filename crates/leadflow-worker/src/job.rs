use leadflow_core::models::{ImportCounters, LeadImportStatus, ParsedRow};

/// Everything a worker needs to process one accepted import
#[derive(Debug, Clone)]
pub struct ImportJob {
    pub import_id: i64,
    pub tenant_id: i64,
    pub account_id: i64,
    pub source_id: i64,
    pub creator_id: i64,
    /// Explicit tag ids from the request, applied to every created lead
    pub tag_ids: Vec<i64>,
    pub rows: Vec<ParsedRow>,
}

/// Outcome reported once a job has been finalized
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImportFinished {
    pub import_id: i64,
    pub tenant_id: i64,
    pub status: LeadImportStatus,
    pub counters: ImportCounters,
}

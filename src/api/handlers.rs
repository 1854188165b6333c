//! HTTP handlers for submission and retrieval endpoints
//!
//! Fetch and completion failures never surface here as HTTP errors: the
//! pipeline stores them as error-status results. Only caller mistakes
//! (malformed timestamps) and premature queries (empty store, staleness
//! gate) produce error responses.

use super::models::*;
use crate::config::Config;
use crate::error::{Error, Result};
use crate::metrics::METRICS;
use crate::pipeline::{CompletionBackend, CompletionClient, DocumentFetcher, FactExtractor};
use crate::store::{diff_facts, FactDiff, ProcessedResult, ResultStatus, ResultStore};
use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Duration, NaiveDateTime, TimeZone, Utc};
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<ResultStore>,
    pub extractor: Arc<FactExtractor>,
    /// Results younger than this are withheld by timestamp lookups
    pub min_result_age: Duration,
}

impl AppState {
    /// Build state from configuration, wiring the real completion client
    pub fn from_config(config: &Config) -> Result<Self> {
        let backend: Arc<dyn CompletionBackend> = Arc::new(
            CompletionClient::new(config.completion.clone())
                .map_err(|e| Error::Internal(e.to_string()))?,
        );
        Self::with_backend(backend, config)
    }

    /// Build state around an arbitrary completion backend
    pub fn with_backend(backend: Arc<dyn CompletionBackend>, config: &Config) -> Result<Self> {
        let fetcher = DocumentFetcher::new(config.fetcher.clone())?;
        Ok(Self {
            store: Arc::new(ResultStore::new()),
            extractor: Arc::new(FactExtractor::new(backend, fetcher)),
            min_result_age: config.retrieval.min_result_age(),
        })
    }
}

type HandlerError = (StatusCode, Json<ApiError>);

fn bad_request(code: &str, message: impl Into<String>) -> HandlerError {
    (StatusCode::BAD_REQUEST, Json(ApiError::new(code, message)))
}

fn no_data(message: impl Into<String>) -> HandlerError {
    (
        StatusCode::NOT_FOUND,
        Json(ApiError::new(error_codes::NO_DATA, message)),
    )
}

/// Map crate errors to client-facing responses: caller mistakes are 4xx,
/// everything else is internal
fn error_response(error: &Error) -> HandlerError {
    match error {
        Error::InvalidTimestamp(_) => bad_request(error_codes::PARSE_ERROR, error.to_string()),
        Error::EmptyStore => no_data("No processed documents available."),
        _ => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ApiError::new(error_codes::INTERNAL_ERROR, error.to_string())),
        ),
    }
}

/// Parse a lookup timestamp: RFC 3339, or a naive UTC
/// `YYYY-MM-DDTHH:MM[:SS]` value.
fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt.with_timezone(&Utc));
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Ok(Utc.from_utc_datetime(&naive));
        }
    }
    Err(Error::InvalidTimestamp(raw.to_string()))
}

/// Staleness gate: facts are only surfaced for results at least
/// `min_age` old. The store itself always answers truthfully; this is
/// handler-layer policy.
fn passes_staleness_gate(entry: &ProcessedResult, now: DateTime<Utc>, min_age: Duration) -> bool {
    now - entry.timestamp >= min_age
}

fn record(endpoint: &str, started: Instant, ok: bool) {
    METRICS.record_request(endpoint, ok);
    METRICS
        .request_duration
        .with_label_values(&[endpoint])
        .observe(started.elapsed().as_secs_f64());
}

fn store_result(state: &AppState, result: &ProcessedResult) {
    state.store.insert(result.timestamp, result.clone());
    let status = match result.status {
        ResultStatus::Done => "done",
        ResultStatus::Error => "error",
        ResultStatus::Processing => "processing",
    };
    METRICS.documents_processed.with_label_values(&[status]).inc();
    METRICS.store_size.set(state.store.len() as f64);
}

/// Submit a question and a list of document URLs
///
/// POST /submit_question_and_documents
///
/// Clears all previously stored results, then processes each URL
/// sequentially; a failed document still occupies a timestamp slot.
pub async fn submit_question_and_documents(
    State(state): State<AppState>,
    Json(request): Json<SubmitQuestionRequest>,
) -> std::result::Result<Json<SubmitQuestionResponse>, HandlerError> {
    let started = Instant::now();
    info!(
        "Submit request: question={}, {} documents",
        request.question,
        request.documents.len()
    );

    if request.question.is_empty() {
        record("submit_question_and_documents", started, false);
        return Err(bad_request(
            error_codes::VALIDATION_ERROR,
            "Question cannot be empty",
        ));
    }

    // Prior history is discarded, not appended
    state.store.clear();
    METRICS.store_size.set(0.0);

    let mut results = Vec::with_capacity(request.documents.len());
    for document_url in &request.documents {
        let processed = state
            .extractor
            .process_document(document_url, &request.question)
            .await;
        store_result(&state, &processed);
        results.push(SubmittedDocument {
            document_url: document_url.clone(),
            processed_document: processed,
        });
    }

    record("submit_question_and_documents", started, true);
    Ok(Json(SubmitQuestionResponse {
        message: "Question and documents submitted successfully.".to_string(),
        status: ResultStatus::Processing,
        results,
    }))
}

/// Submit a single document URL
///
/// POST /add_document
///
/// Clears all previously stored results first.
pub async fn add_document(
    State(state): State<AppState>,
    Json(request): Json<AddDocumentRequest>,
) -> std::result::Result<Json<AddDocumentResponse>, HandlerError> {
    let started = Instant::now();
    info!("Add document request: url={}", request.document_url);

    if request.document_url.is_empty() {
        record("add_document", started, false);
        return Err(bad_request(
            error_codes::VALIDATION_ERROR,
            "document_url cannot be empty",
        ));
    }

    state.store.clear();
    METRICS.store_size.set(0.0);

    let processed = state
        .extractor
        .process_document(&request.document_url, &request.question)
        .await;
    store_result(&state, &processed);

    record("add_document", started, true);
    Ok(Json(AddDocumentResponse {
        message: "Document submitted successfully.".to_string(),
        status: ResultStatus::Processing,
    }))
}

/// Extract facts from raw call-log text
///
/// POST /process_call_logs
///
/// Unlike the submission endpoints this does NOT clear the store, so
/// successive batches accumulate a timestamp history.
pub async fn process_call_logs(
    State(state): State<AppState>,
    Json(request): Json<ProcessCallLogsRequest>,
) -> std::result::Result<Json<ProcessedResult>, HandlerError> {
    let started = Instant::now();
    info!("Process call logs request: {} bytes", request.call_logs.len());

    if request.call_logs.is_empty() {
        record("process_call_logs", started, false);
        return Err(bad_request(
            error_codes::VALIDATION_ERROR,
            "call_logs cannot be empty",
        ));
    }

    let processed = state
        .extractor
        .process_call_logs(&request.call_logs, request.question.as_deref())
        .await;
    store_result(&state, &processed);

    record("process_call_logs", started, true);
    Ok(Json(processed))
}

/// Return the most recently stored result
///
/// GET /get_question_and_facts
pub async fn get_question_and_facts(
    State(state): State<AppState>,
) -> std::result::Result<Json<QuestionAndFactsResponse>, HandlerError> {
    let started = Instant::now();

    let latest = state.store.latest().ok_or(Error::EmptyStore).map_err(|e| {
        record("get_question_and_facts", started, false);
        error_response(&e)
    })?;

    let facts = match latest.status {
        ResultStatus::Processing => None,
        _ => Some(latest.facts),
    };

    record("get_question_and_facts", started, true);
    Ok(Json(QuestionAndFactsResponse {
        question: latest.source_question,
        facts,
        status: latest.status,
        error_message: latest.error_message,
    }))
}

/// Return the stored result nearest a given timestamp
///
/// GET /get_state_at_timestamp?timestamp=YYYY-MM-DDTHH:MM
///
/// Nearest is by absolute distance over all stored timestamps, ties
/// resolved to the earlier candidate. Results younger than the staleness
/// threshold are withheld.
pub async fn get_state_at_timestamp(
    State(state): State<AppState>,
    Query(query): Query<TimestampQuery>,
) -> std::result::Result<Json<StateAtTimestampResponse>, HandlerError> {
    let started = Instant::now();

    let target = parse_timestamp(&query.timestamp).map_err(|e| {
        record("get_state_at_timestamp", started, false);
        error_response(&e)
    })?;

    let entry = state.store.nearest(target).ok_or(Error::EmptyStore).map_err(|e| {
        record("get_state_at_timestamp", started, false);
        error_response(&e)
    })?;

    if !passes_staleness_gate(&entry, Utc::now(), state.min_result_age) {
        warn!(
            "Withholding result at {}: younger than {} hours",
            entry.timestamp,
            state.min_result_age.num_hours()
        );
        record("get_state_at_timestamp", started, false);
        return Err(no_data("No data available."));
    }

    record("get_state_at_timestamp", started, true);
    Ok(Json(StateAtTimestampResponse {
        timestamp: entry.timestamp,
        question: entry.source_question,
        facts: entry.facts,
        status: entry.status,
    }))
}

/// Diff the result nearest a timestamp against its immediate predecessor
///
/// GET /highlight_facts?timestamp=YYYY-MM-DDTHH:MM
///
/// With no predecessor the diff is taken against an empty fact set, so
/// the first result of a batch reports all of its facts as added.
pub async fn highlight_facts(
    State(state): State<AppState>,
    Query(query): Query<TimestampQuery>,
) -> std::result::Result<Json<FactDiff>, HandlerError> {
    let started = Instant::now();

    let target = parse_timestamp(&query.timestamp).map_err(|e| {
        record("highlight_facts", started, false);
        error_response(&e)
    })?;

    let entry = state.store.nearest(target).ok_or(Error::EmptyStore).map_err(|e| {
        record("highlight_facts", started, false);
        error_response(&e)
    })?;

    if !passes_staleness_gate(&entry, Utc::now(), state.min_result_age) {
        record("highlight_facts", started, false);
        return Err(no_data("No data available."));
    }

    let previous = state
        .store
        .previous_before(entry.timestamp)
        .unwrap_or_else(|| ProcessedResult::done(entry.timestamp, Vec::new()));

    record("highlight_facts", started, true);
    Ok(Json(diff_facts(&entry, &previous)))
}

/// Liveness probe
///
/// GET /health
pub async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

/// Prometheus text exposition
///
/// GET /metrics
pub async fn metrics() -> String {
    METRICS.render()
}

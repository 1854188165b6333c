//! Request and response models for the HTTP surface

use crate::store::{ProcessedResult, ResultStatus};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Error codes returned to clients
pub mod error_codes {
    pub const VALIDATION_ERROR: &str = "VALIDATION_ERROR";
    pub const PARSE_ERROR: &str = "PARSE_ERROR";
    pub const NO_DATA: &str = "NO_DATA";
    pub const INTERNAL_ERROR: &str = "INTERNAL_ERROR";
}

/// Structured JSON error payload
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiError {
    pub code: String,
    pub error: String,
    pub status: String,
}

impl ApiError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            error: message.into(),
            status: "error".to_string(),
        }
    }
}

/// POST /submit_question_and_documents
#[derive(Debug, Clone, Deserialize)]
pub struct SubmitQuestionRequest {
    pub question: String,
    #[serde(default)]
    pub documents: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct SubmittedDocument {
    pub document_url: String,
    pub processed_document: ProcessedResult,
}

#[derive(Debug, Serialize)]
pub struct SubmitQuestionResponse {
    pub message: String,
    pub status: ResultStatus,
    pub results: Vec<SubmittedDocument>,
}

/// POST /add_document
#[derive(Debug, Clone, Deserialize)]
pub struct AddDocumentRequest {
    pub document_url: String,
    pub question: String,
}

#[derive(Debug, Serialize)]
pub struct AddDocumentResponse {
    pub message: String,
    pub status: ResultStatus,
}

/// POST /process_call_logs
#[derive(Debug, Clone, Deserialize)]
pub struct ProcessCallLogsRequest {
    pub call_logs: String,
    #[serde(default)]
    pub question: Option<String>,
}

/// GET /get_question_and_facts
#[derive(Debug, Serialize, Deserialize)]
pub struct QuestionAndFactsResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub question: Option<String>,
    /// Null while the latest result is still processing
    pub facts: Option<Vec<String>>,
    pub status: ResultStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

/// Timestamp query parameter for the lookup endpoints
#[derive(Debug, Deserialize)]
pub struct TimestampQuery {
    pub timestamp: String,
}

/// GET /get_state_at_timestamp
#[derive(Debug, Serialize, Deserialize)]
pub struct StateAtTimestampResponse {
    pub timestamp: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub question: Option<String>,
    pub facts: Vec<String>,
    pub status: ResultStatus,
}

//! Data models for the timestamped result store

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Terminal state of a processed document or call-log batch
///
/// Set once at insertion. `Processing` exists for wire compatibility with
/// clients polling the latest-result endpoint; the pipeline itself only
/// inserts `Done` or `Error`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResultStatus {
    Processing,
    Done,
    Error,
}

/// One outcome of processing a document or call-log batch
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessedResult {
    pub timestamp: DateTime<Utc>,
    pub status: ResultStatus,
    /// Extraction order, not sorted; empty if nothing was extracted
    pub facts: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_question: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_document_url: Option<String>,
}

impl ProcessedResult {
    /// Create a successful result
    pub fn done(timestamp: DateTime<Utc>, facts: Vec<String>) -> Self {
        Self {
            timestamp,
            status: ResultStatus::Done,
            facts,
            error_message: None,
            source_question: None,
            source_document_url: None,
        }
    }

    /// Create a failed result that still occupies a timestamp slot
    pub fn failed(timestamp: DateTime<Utc>, message: impl Into<String>) -> Self {
        Self {
            timestamp,
            status: ResultStatus::Error,
            facts: Vec::new(),
            error_message: Some(message.into()),
            source_question: None,
            source_document_url: None,
        }
    }

    pub fn with_question(mut self, question: impl Into<String>) -> Self {
        self.source_question = Some(question.into());
        self
    }

    pub fn with_document_url(mut self, url: impl Into<String>) -> Self {
        self.source_document_url = Some(url.into());
        self
    }
}

/// Facts gained and lost between two stored results
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FactDiff {
    pub added: Vec<String>,
    pub removed: Vec<String>,
}

impl FactDiff {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_serialization() {
        assert_eq!(
            serde_json::to_string(&ResultStatus::Processing).unwrap(),
            "\"processing\""
        );
        assert_eq!(serde_json::to_string(&ResultStatus::Done).unwrap(), "\"done\"");
        assert_eq!(
            serde_json::to_string(&ResultStatus::Error).unwrap(),
            "\"error\""
        );
    }

    #[test]
    fn test_done_result() {
        let result = ProcessedResult::done(Utc::now(), vec!["a".to_string()])
            .with_question("What happened?")
            .with_document_url("http://example.com/doc.txt");

        assert_eq!(result.status, ResultStatus::Done);
        assert_eq!(result.facts, vec!["a"]);
        assert!(result.error_message.is_none());
        assert_eq!(result.source_question.as_deref(), Some("What happened?"));
    }

    #[test]
    fn test_failed_result_carries_message() {
        let result = ProcessedResult::failed(Utc::now(), "upstream unreachable");

        assert_eq!(result.status, ResultStatus::Error);
        assert!(result.facts.is_empty());
        assert_eq!(result.error_message.as_deref(), Some("upstream unreachable"));
    }

    #[test]
    fn test_optional_fields_skipped_in_json() {
        let result = ProcessedResult::done(Utc::now(), vec![]);
        let json = serde_json::to_value(&result).unwrap();

        assert!(json.get("error_message").is_none());
        assert!(json.get("source_question").is_none());
        assert!(json.get("source_document_url").is_none());
    }
}

//! Fact extraction: prompt assembly and response normalization
//!
//! Fetch and completion failures are converted into error-status results
//! here rather than propagated, so a failed document still occupies a
//! timestamp slot in the store. Retry behavior lives entirely in the
//! completion client.

use super::completion::CompletionBackend;
use super::fetcher::DocumentFetcher;
use crate::error::Result;
use crate::store::ProcessedResult;
use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, error};

const DEFAULT_CALL_LOG_QUESTION: &str = "What facts can be extracted from these call logs?";

/// Combines a question with content and turns the model response into an
/// ordered list of fact strings
pub struct FactExtractor {
    backend: Arc<dyn CompletionBackend>,
    fetcher: DocumentFetcher,
}

impl FactExtractor {
    pub fn new(backend: Arc<dyn CompletionBackend>, fetcher: DocumentFetcher) -> Self {
        Self { backend, fetcher }
    }

    fn build_prompt(question: &str, content: &str) -> String {
        format!("Question: {}\nDocument: {}", question, content)
    }

    /// Split policy: one fact per non-empty trimmed line, extraction order
    fn split_facts(text: &str) -> Vec<String> {
        text.lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect()
    }

    /// One completion call; no retries at this layer
    pub async fn extract(&self, content: &str, question: &str) -> Result<Vec<String>> {
        let prompt = Self::build_prompt(question, content);
        let response = self.backend.complete(&prompt).await?;

        let facts = Self::split_facts(&response);
        debug!("Extracted {} facts", facts.len());
        Ok(facts)
    }

    /// Fetch a document and extract facts for it; failures become
    /// error-status results
    pub async fn process_document(&self, document_url: &str, question: &str) -> ProcessedResult {
        let timestamp = Utc::now();

        let content = match self.fetcher.fetch(document_url).await {
            Ok(content) => content,
            Err(e) => {
                error!("Failed to process document from URL: {}", e);
                return ProcessedResult::failed(timestamp, e.to_string())
                    .with_question(question)
                    .with_document_url(document_url);
            }
        };

        match self.extract(&content, question).await {
            Ok(facts) => ProcessedResult::done(timestamp, facts)
                .with_question(question)
                .with_document_url(document_url),
            Err(e) => {
                error!("Failed to extract facts from document: {}", e);
                ProcessedResult::failed(timestamp, e.to_string())
                    .with_question(question)
                    .with_document_url(document_url)
            }
        }
    }

    /// Extract facts from raw call-log text
    pub async fn process_call_logs(
        &self,
        call_logs: &str,
        question: Option<&str>,
    ) -> ProcessedResult {
        let timestamp = Utc::now();
        let question = question.unwrap_or(DEFAULT_CALL_LOG_QUESTION);

        match self.extract(call_logs, question).await {
            Ok(facts) => ProcessedResult::done(timestamp, facts).with_question(question),
            Err(e) => {
                error!("Failed to process call logs: {}", e);
                ProcessedResult::failed(timestamp, e.to_string()).with_question(question)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FetcherConfig;
    use crate::pipeline::completion::CompletionError;
    use crate::store::ResultStatus;
    use async_trait::async_trait;

    struct FixedBackend(String);

    #[async_trait]
    impl CompletionBackend for FixedBackend {
        async fn complete(&self, _prompt: &str) -> std::result::Result<String, CompletionError> {
            Ok(self.0.clone())
        }
    }

    struct FailingBackend;

    #[async_trait]
    impl CompletionBackend for FailingBackend {
        async fn complete(&self, _prompt: &str) -> std::result::Result<String, CompletionError> {
            Err(CompletionError::RateLimited("busy".to_string()))
        }
    }

    fn extractor(backend: Arc<dyn CompletionBackend>) -> FactExtractor {
        FactExtractor::new(backend, DocumentFetcher::new(FetcherConfig::default()).unwrap())
    }

    #[test]
    fn test_build_prompt() {
        let prompt = FactExtractor::build_prompt("Who won?", "The match report.");
        assert_eq!(prompt, "Question: Who won?\nDocument: The match report.");
    }

    #[test]
    fn test_split_facts_trims_and_drops_empty_lines() {
        let facts = FactExtractor::split_facts("  fact one  \n\n fact two\n   \n");
        assert_eq!(facts, vec!["fact one", "fact two"]);
    }

    #[test]
    fn test_split_facts_preserves_extraction_order() {
        let facts = FactExtractor::split_facts("z\na\nm");
        assert_eq!(facts, vec!["z", "a", "m"]);
    }

    #[tokio::test]
    async fn test_extract_splits_response() {
        let ex = extractor(Arc::new(FixedBackend("one\ntwo".to_string())));
        let facts = ex.extract("content", "question").await.unwrap();
        assert_eq!(facts, vec!["one", "two"]);
    }

    #[tokio::test]
    async fn test_call_logs_failure_becomes_error_result() {
        let ex = extractor(Arc::new(FailingBackend));
        let result = ex.process_call_logs("log line", None).await;

        assert_eq!(result.status, ResultStatus::Error);
        assert!(result.facts.is_empty());
        assert!(result.error_message.is_some());
        assert_eq!(
            result.source_question.as_deref(),
            Some(DEFAULT_CALL_LOG_QUESTION)
        );
    }

    #[tokio::test]
    async fn test_unfetchable_document_becomes_error_result() {
        let ex = extractor(Arc::new(FixedBackend("unused".to_string())));
        let result = ex
            .process_document("http://127.0.0.1:1/doc.txt", "q")
            .await;

        assert_eq!(result.status, ResultStatus::Error);
        assert_eq!(
            result.source_document_url.as_deref(),
            Some("http://127.0.0.1:1/doc.txt")
        );
    }

    #[tokio::test]
    async fn test_process_document_success() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/doc.txt")
            .with_status(200)
            .with_body("body")
            .create_async()
            .await;

        let ex = extractor(Arc::new(FixedBackend("a\nb".to_string())));
        let result = ex
            .process_document(&format!("{}/doc.txt", server.url()), "q")
            .await;

        assert_eq!(result.status, ResultStatus::Done);
        assert_eq!(result.facts, vec!["a", "b"]);
        assert_eq!(result.source_question.as_deref(), Some("q"));
    }
}

//! Document processing pipeline: fetch, complete, extract

pub mod completion;
pub mod extractor;
pub mod fetcher;

pub use completion::{CompletionBackend, CompletionClient, CompletionError};
pub use extractor::FactExtractor;
pub use fetcher::DocumentFetcher;

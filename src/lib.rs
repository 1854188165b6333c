//! factline — document fact extraction backend with timestamped history
//!
//! Accepts documents or call-log text over HTTP, forwards them to an
//! OpenAI-compatible completion API, and caches the extracted facts keyed
//! by processing timestamp. Callers can retrieve the latest result, the
//! result nearest a given timestamp, or a diff of facts between two
//! stored results.

pub mod api;
pub mod config;
pub mod error;
pub mod metrics;
pub mod pipeline;
pub mod store;

pub use api::{build_router, AppState};
pub use config::Config;
pub use error::{Error, Result};

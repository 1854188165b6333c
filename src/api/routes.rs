//! Router assembly: routes, CORS, tracing, body limits

use super::handlers::{self, AppState};
use axum::{
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

/// Build the application router
///
/// Every response carries permissive CORS headers; OPTIONS preflight on
/// the mutating routes is answered by the CORS layer.
pub fn build_router(state: AppState, max_body_bytes: usize) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route(
            "/submit_question_and_documents",
            post(handlers::submit_question_and_documents),
        )
        .route("/add_document", post(handlers::add_document))
        .route("/process_call_logs", post(handlers::process_call_logs))
        .route("/get_question_and_facts", get(handlers::get_question_and_facts))
        .route("/get_state_at_timestamp", get(handlers::get_state_at_timestamp))
        .route("/highlight_facts", get(handlers::highlight_facts))
        .route("/health", get(handlers::health))
        .route("/metrics", get(handlers::metrics))
        .layer(RequestBodyLimitLayer::new(max_body_bytes))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(state)
}

//! API routes for the summary server

pub mod session;
pub mod summary;
pub mod upload;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use crate::server::state::AppState;

/// Build all API routes
pub fn api_routes(max_upload_size: usize) -> Router<AppState> {
    Router::new()
        .route("/session", get(session::get_session).delete(session::reset_session))
        // Upload - with larger body limit for PDFs
        .route(
            "/upload",
            post(upload::upload_paper).layer(DefaultBodyLimit::max(max_upload_size)),
        )
        .route("/summary", post(summary::summarize_paper))
        .route("/info", get(info))
}

/// API info endpoint
async fn info() -> axum::Json<serde_json::Value> {
    axum::Json(serde_json::json!({
        "name": "paper-decoded",
        "version": env!("CARGO_PKG_VERSION"),
        "description": "Turns a research paper PDF into a blog-style summary",
        "endpoints": {
            "POST /api/upload": "Upload a PDF (multipart field 'file') and build its index",
            "POST /api/summary": "Write the Problem Statement, Methodology, Key Takeaways and Conclusion",
            "GET /api/session": "Current state, document and summary so far",
            "DELETE /api/session": "Drop the current paper and start over"
        },
        "sections": crate::types::SectionKind::ALL
            .iter()
            .map(|k| k.title())
            .collect::<Vec<_>>()
    }))
}

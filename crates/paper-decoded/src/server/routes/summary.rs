//! Summary generation endpoint

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::{json, Value};

use crate::error::{Error, Result};
use crate::pipeline::{Session, SessionState};
use crate::server::state::AppState;
use crate::types::{BlogSummary, SummarySection};

#[derive(Debug, Serialize)]
pub struct SummaryResponse {
    pub state: SessionState,
    pub sections: Vec<SummarySection>,
    pub markdown: String,
}

/// POST /api/summary - Answer the four section questions.
///
/// On failure the body carries the error and whatever sections were
/// written before it.
pub async fn summarize_paper(State(state): State<AppState>) -> Response {
    // the run owns the lock so a dropped request cannot cut it short
    let mut session = state.lock_session().await;
    let run = tokio::spawn(async move {
        let result = session
            .summarize(|section| tracing::debug!("Section ready: {}", section.title))
            .await;
        render(&session, result)
    });

    match run.await {
        Ok((status, body)) => (status, Json(body)).into_response(),
        Err(e) => Error::internal(format!("summary task failed: {}", e)).into_response(),
    }
}

fn render(session: &Session, result: Result<BlogSummary>) -> (StatusCode, Value) {
    let title = session.document().map(|d| d.filename.as_str());

    match result {
        Ok(summary) => {
            let body = SummaryResponse {
                state: session.state(),
                markdown: summary.to_markdown(title),
                sections: summary.sections,
            };
            (StatusCode::OK, json!(body))
        }
        Err(e @ Error::InvalidState(_)) => (
            e.status_code(),
            json!({ "error": { "type": e.kind(), "message": e.to_string() } }),
        ),
        Err(e) => {
            let partial = session.summary();
            let body = json!({
                "error": {
                    "type": e.kind(),
                    "message": e.to_string(),
                },
                "state": session.state(),
                "sections": partial.sections,
                "markdown": partial.to_markdown(title),
            });
            (e.status_code(), body)
        }
    }
}

//! Session inspection endpoint

use axum::{extract::State, Json};
use serde::Serialize;

use crate::pipeline::{Session, SessionState};
use crate::server::state::AppState;
use crate::types::{BlogSummary, DocumentInfo};

/// Snapshot of the session returned by several endpoints
#[derive(Debug, Serialize)]
pub struct SessionView {
    pub state: SessionState,
    pub document: Option<DocumentInfo>,
    pub can_summarize: bool,
    pub summary: BlogSummary,
    pub last_error: Option<String>,
}

impl From<&Session> for SessionView {
    fn from(session: &Session) -> Self {
        Self {
            state: session.state(),
            document: session.document_info(),
            can_summarize: session.can_summarize(),
            summary: session.summary().clone(),
            last_error: session.last_error().map(str::to_string),
        }
    }
}

/// GET /api/session
pub async fn get_session(State(state): State<AppState>) -> Json<SessionView> {
    let mut session = state.lock_session().await;
    session.recover_interrupted();
    Json(SessionView::from(&*session))
}

/// DELETE /api/session - Drop the current paper
pub async fn reset_session(State(state): State<AppState>) -> Json<SessionView> {
    let mut session = state.lock_session().await;
    session.reset();
    tracing::info!("Session reset");
    Json(SessionView::from(&*session))
}

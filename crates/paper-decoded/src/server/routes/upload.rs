//! PDF upload endpoint

use axum::{
    extract::{Multipart, State},
    Json,
};
use serde::Serialize;

use crate::error::{Error, Result};
use crate::pipeline::SessionState;
use crate::server::state::AppState;
use crate::types::DocumentInfo;

const FILE_FIELD: &str = "file";

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub state: SessionState,
    pub document: DocumentInfo,
}

/// POST /api/upload - Replace the current paper with the uploaded PDF
pub async fn upload_paper(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>> {
    let mut upload = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| Error::ingest("upload", format!("Failed to read multipart field: {}", e)))?
    {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }

        let filename = field
            .file_name()
            .map(|s| s.to_string())
            .unwrap_or_else(|| "paper.pdf".to_string());
        let data = field
            .bytes()
            .await
            .map_err(|e| Error::ingest(&filename, format!("Failed to read upload: {}", e)))?;

        upload = Some((filename, data));
        break;
    }

    let (filename, data) = upload
        .ok_or_else(|| Error::ingest("upload", format!("missing multipart field '{}'", FILE_FIELD)))?;

    tracing::info!("Received {} ({} bytes)", filename, data.len());

    // the run owns the lock so a dropped request cannot cut it short
    let mut session = state.lock_session().await;
    let run = tokio::spawn(async move {
        let document = session
            .ingest_bytes(&filename, data.to_vec(), |step| {
                tracing::debug!("{}", step.message());
            })
            .await?;

        Ok::<_, Error>(UploadResponse {
            state: session.state(),
            document,
        })
    });

    let response = run
        .await
        .map_err(|e| Error::internal(format!("upload task failed: {}", e)))??;

    Ok(Json(response))
}

//! Application state for the summary server

use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::config::RagConfig;
use crate::error::Result;
use crate::pipeline::Session;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// The one paper being worked on; requests queue on the lock
    session: Arc<Mutex<Session>>,
}

impl AppState {
    /// Build state with the providers named in `config`
    pub fn new(config: RagConfig) -> Result<Self> {
        tracing::info!(
            "Initializing session (embeddings: {:?}, llm: {:?})",
            config.embeddings.backend,
            config.llm.backend
        );
        Ok(Self::with_session(Session::from_config(config)?))
    }

    /// Wrap an already constructed session
    pub fn with_session(session: Session) -> Self {
        Self {
            session: Arc::new(Mutex::new(session)),
        }
    }

    /// Lock the session for the lifetime of the returned guard.
    ///
    /// The guard is owned so a run can move into a spawned task and finish
    /// even if the request that started it goes away.
    pub async fn lock_session(&self) -> OwnedMutexGuard<Session> {
        Arc::clone(&self.session).lock_owned().await
    }
}

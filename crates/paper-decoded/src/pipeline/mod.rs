//! Upload → index → summary orchestration

mod session;
mod state;

pub use session::Session;
pub use state::{ProcessingStep, SessionState};

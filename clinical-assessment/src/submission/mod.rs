//! Assessment submission.
//!
//! The TUI hands an owned [`AssessmentSubmission`] to a [`SubmissionBackend`] on a worker thread
//! and waits for a [`ResultSummary`] or a [`SubmissionError`]. Which backend is used comes from
//! `submission.mode` in the application config.

mod http;
mod mock;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

pub use http::HttpSubmitter;
pub use mock::MockSubmitter;

use crate::models::requests::AssessmentSubmission;
use crate::models::results::ResultSummary;
use crate::settings::{SubmissionConfig, SubmissionMode};

#[derive(Debug, Error)]
pub enum SubmissionError {
    #[error("inference service did not respond within {0:?}")]
    Timeout(Duration),
    #[error("could not reach inference service: {0}")]
    Transport(String),
    #[error("inference service rejected the request (HTTP {status})")]
    Rejected { status: u16 },
    #[error("inference service returned an unreadable response: {0}")]
    InvalidResponse(String),
    #[error("inference service reported failure: {message}")]
    Unsuccessful { message: String },
}

impl SubmissionError {
    /// Worth another attempt: network trouble, timeouts and 5xx.
    pub fn is_retryable(&self) -> bool {
        match self {
            SubmissionError::Timeout(_) | SubmissionError::Transport(_) => true,
            SubmissionError::Rejected { status } => *status >= 500,
            SubmissionError::InvalidResponse(_) | SubmissionError::Unsuccessful { .. } => false,
        }
    }
}

#[async_trait]
pub trait SubmissionBackend: Send + Sync {
    /// Short name for logs ("mock", "http").
    fn name(&self) -> &'static str;

    async fn submit(
        &self,
        submission: &AssessmentSubmission,
    ) -> Result<ResultSummary, SubmissionError>;
}

pub fn build_backend(cfg: &SubmissionConfig) -> anyhow::Result<Arc<dyn SubmissionBackend>> {
    Ok(match cfg.mode {
        SubmissionMode::Mock => Arc::new(MockSubmitter::new(Duration::from_millis(
            cfg.mock_delay_ms,
        ))),
        SubmissionMode::Http => Arc::new(HttpSubmitter::from_config(cfg)?),
    })
}

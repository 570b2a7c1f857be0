use std::time::Duration;

use async_trait::async_trait;
use log::info;

use super::{SubmissionBackend, SubmissionError};
use crate::models::requests::AssessmentSubmission;
use crate::models::results::ResultSummary;

/// Stand-in for the inference service: waits, then returns the fixed placeholder summary.
#[derive(Debug, Clone)]
pub struct MockSubmitter {
    delay: Duration,
}

impl MockSubmitter {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }
}

impl Default for MockSubmitter {
    fn default() -> Self {
        Self::new(Duration::from_millis(2000))
    }
}

#[async_trait]
impl SubmissionBackend for MockSubmitter {
    fn name(&self) -> &'static str {
        "mock"
    }

    async fn submit(
        &self,
        submission: &AssessmentSubmission,
    ) -> Result<ResultSummary, SubmissionError> {
        info!(
            "[PHASE: submission] [STEP: mock] Simulating analysis for {} section(s) (correlation_id={})",
            submission.assessment.present_sections().len(),
            submission.correlation_id
        );
        tokio::time::sleep(self.delay).await;
        Ok(ResultSummary::mock())
    }
}

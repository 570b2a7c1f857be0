// Inference request models
// Wire schema for the (external) risk inference endpoint.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::aggregate::AssessmentAggregate;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssessmentSubmission {
    pub correlation_id: String,
    pub submitted_at: DateTime<Utc>,
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    pub assessment: AssessmentAggregate,
}

fn default_schema_version() -> u32 {
    1
}

impl AssessmentSubmission {
    /// Snapshot the aggregate for submission under a fresh correlation id.
    pub fn new(assessment: AssessmentAggregate) -> Self {
        Self {
            correlation_id: Uuid::new_v4().to_string(),
            submitted_at: Utc::now(),
            schema_version: default_schema_version(),
            assessment,
        }
    }
}

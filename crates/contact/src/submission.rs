use chrono::{DateTime, Utc};
use serde::Serialize;

use shopfront_core::{Entity, SubmissionId};

/// Subject used when the sender leaves it blank.
pub const DEFAULT_SUBJECT: &str = "Contact Form Submission";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactSubmission {
    pub id: SubmissionId,
    pub name: String,
    pub email: String,
    pub subject: String,
    pub message: String,
    pub created_at: DateTime<Utc>,
    pub is_read: bool,
}

impl Entity for ContactSubmission {
    type Id = SubmissionId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

use std::sync::Arc;

use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::{info, instrument};

use shopfront_auth::Identity;
use shopfront_core::{DomainError, StoreError, SubmissionId, require_non_blank};

use crate::{ContactStore, ContactSubmission, DEFAULT_SUBJECT};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ContactError {
    #[error("{0}")]
    Validation(String),

    #[error("forbidden")]
    Forbidden,

    #[error("submission not found")]
    NotFound,

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<DomainError> for ContactError {
    fn from(value: DomainError) -> Self {
        match value {
            DomainError::NotFound => ContactError::NotFound,
            DomainError::Validation(msg) | DomainError::InvalidId(msg) => ContactError::Validation(msg),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ContactForm {
    pub name: String,
    pub email: String,
    pub subject: Option<String>,
    pub message: String,
}

pub struct ContactService {
    store: Arc<dyn ContactStore>,
}

impl ContactService {
    pub fn new(store: Arc<dyn ContactStore>) -> Self {
        Self { store }
    }

    /// Public entry point; anyone may submit.
    #[instrument(skip(self, form), fields(email = %form.email))]
    pub async fn submit(&self, form: ContactForm, now: DateTime<Utc>) -> Result<ContactSubmission, ContactError> {
        for (field, value) in [("name", &form.name), ("email", &form.email), ("message", &form.message)] {
            require_non_blank(field, value)?;
        }

        let subject = form
            .subject
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| DEFAULT_SUBJECT.to_string());

        let submission = self
            .store
            .insert(ContactSubmission {
                id: SubmissionId::new(),
                name: form.name.trim().to_string(),
                email: form.email.trim().to_string(),
                subject,
                message: form.message,
                created_at: now,
                is_read: false,
            })
            .await?;

        info!(submission_id = %submission.id, "contact form received");
        Ok(submission)
    }

    pub async fn list(&self, identity: &Identity) -> Result<Vec<ContactSubmission>, ContactError> {
        if !identity.is_admin() {
            return Err(ContactError::Forbidden);
        }
        Ok(self.store.list().await?)
    }

    pub async fn set_read(
        &self,
        identity: &Identity,
        id: SubmissionId,
        is_read: bool,
    ) -> Result<ContactSubmission, ContactError> {
        if !identity.is_admin() {
            return Err(ContactError::Forbidden);
        }
        self.store.set_read(id, is_read).await?.ok_or(ContactError::NotFound)
    }
}

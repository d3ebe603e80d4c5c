use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;

use shopfront_core::{Entity, StoreError, SubmissionId};

use crate::ContactSubmission;

#[async_trait]
pub trait ContactStore: Send + Sync {
    async fn insert(&self, submission: ContactSubmission) -> Result<ContactSubmission, StoreError>;

    /// All submissions, newest first.
    async fn list(&self) -> Result<Vec<ContactSubmission>, StoreError>;

    /// `None` when `id` is unknown.
    async fn set_read(&self, id: SubmissionId, is_read: bool) -> Result<Option<ContactSubmission>, StoreError>;
}

#[derive(Debug, Default)]
pub struct InMemoryContactStore {
    inner: RwLock<HashMap<SubmissionId, ContactSubmission>>,
}

impl InMemoryContactStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn poisoned() -> StoreError {
    StoreError::unavailable("contact store lock poisoned")
}

#[async_trait]
impl ContactStore for InMemoryContactStore {
    async fn insert(&self, submission: ContactSubmission) -> Result<ContactSubmission, StoreError> {
        let mut map = self.inner.write().map_err(|_| poisoned())?;
        map.insert(*submission.id(), submission.clone());
        Ok(submission)
    }

    async fn list(&self) -> Result<Vec<ContactSubmission>, StoreError> {
        let map = self.inner.read().map_err(|_| poisoned())?;
        let mut all: Vec<ContactSubmission> = map.values().cloned().collect();
        all.sort_by(|a, b| (b.created_at, b.id).cmp(&(a.created_at, a.id)));
        Ok(all)
    }

    async fn set_read(&self, id: SubmissionId, is_read: bool) -> Result<Option<ContactSubmission>, StoreError> {
        let mut map = self.inner.write().map_err(|_| poisoned())?;
        Ok(map.get_mut(&id).map(|s| {
            s.is_read = is_read;
            s.clone()
        }))
    }
}

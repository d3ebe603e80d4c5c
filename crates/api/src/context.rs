use shopfront_auth::Identity;
use shopfront_core::UserId;

/// Verified caller for a request.
///
/// Inserted by the access gate once the token has been verified. Present on
/// every authenticated and admin route, and on public routes when the caller
/// happened to send a valid token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallerContext {
    identity: Identity,
}

impl CallerContext {
    pub fn new(identity: Identity) -> Self {
        Self { identity }
    }

    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    pub fn subject_id(&self) -> UserId {
        self.identity.subject_id
    }
}

/// Session cookie settings shared by the gate and the auth routes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionSettings {
    pub secure: bool,
    pub max_age_secs: i64,
}

use serde::{Deserialize, Serialize};

use shopfront_core::UserId;

use crate::{IdentityClaims, Role};

/// A verified caller, attached to the request by the access gate.
///
/// Construction from claims happens only after signature and time-window
/// checks have passed; downstream services trust it without re-verifying.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub subject_id: UserId,
    pub email: String,
    pub name: String,
    pub role: Role,
}

impl Identity {
    pub fn new(subject_id: UserId, email: impl Into<String>, name: impl Into<String>, role: Role) -> Self {
        Self {
            subject_id,
            email: email.into(),
            name: name.into(),
            role,
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role.is_admin()
    }
}

impl From<IdentityClaims> for Identity {
    fn from(claims: IdentityClaims) -> Self {
        Self {
            subject_id: claims.sub,
            email: claims.email,
            name: claims.name,
            role: claims.role,
        }
    }
}

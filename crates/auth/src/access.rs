//! Access tiers: which requests need an identity, and which need an admin.
//!
//! - No IO
//! - No panics
//! - No HTTP types (the API layer passes method and path as strings)

use thiserror::Error;

use crate::Identity;

/// Authorization level required for a request.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum AccessTier {
    /// No token required.
    Public,
    /// A valid token is required.
    Authenticated,
    /// A valid token carrying the admin role is required.
    Admin,
}

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum AccessDenied {
    /// No token, or a token that failed verification.
    #[error("authentication required")]
    Unauthenticated,

    /// A verified identity without the privilege the tier demands.
    #[error("forbidden")]
    Forbidden,
}

const AUTHENTICATED_ROOTS: &[&str] = &["orders", "wishlist", "payments", "notifications", "whoami", "account"];

/// Classify a request by method and path.
///
/// Matching is per path segment, so `/administrator` is not an admin path and
/// `/orders-archive` is not an order path.
pub fn classify(method: &str, path: &str) -> AccessTier {
    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
    let method = method.to_ascii_uppercase();

    match segments.as_slice() {
        ["admin", ..] => AccessTier::Admin,
        ["orders", _id] if method == "PATCH" => AccessTier::Admin,
        ["orders", _id, "tracking"] if method == "PUT" || method == "PATCH" => AccessTier::Admin,
        [root, ..] if AUTHENTICATED_ROOTS.contains(root) => AccessTier::Authenticated,
        _ => AccessTier::Public,
    }
}

/// Decide whether `identity` may pass a request of the given tier.
///
/// A malformed or expired token must be mapped to `None` by the caller;
/// there is no partial trust.
pub fn authorize(tier: AccessTier, identity: Option<&Identity>) -> Result<(), AccessDenied> {
    match (tier, identity) {
        (AccessTier::Public, _) => Ok(()),
        (_, None) => Err(AccessDenied::Unauthenticated),
        (AccessTier::Authenticated, Some(_)) => Ok(()),
        (AccessTier::Admin, Some(who)) if who.is_admin() => Ok(()),
        (AccessTier::Admin, Some(_)) => Err(AccessDenied::Forbidden),
    }
}

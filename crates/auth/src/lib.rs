//! `shopfront-auth`: identity, tokens, and the access-tier policy.
//!
//! This crate is intentionally decoupled from HTTP: the API layer feeds it
//! strings (method, path, bearer token) and gets typed decisions back.

pub mod access;
pub mod account;
pub mod claims;
pub mod identity;
pub mod password;
pub mod roles;
pub mod token;
pub mod user;

pub use access::{AccessDenied, AccessTier, authorize, classify};
pub use account::{AccountError, AccountService, Session, SignUp};
pub use claims::{IdentityClaims, TokenValidationError, validate_claims};
pub use identity::Identity;
pub use roles::Role;
pub use token::{Hs256TokenService, IssuedToken, TokenError, TokenService};
pub use user::{InMemoryUserStore, PublicUser, User, UserStore};

//! Authentication and authorization extractors.
//!
//! - [`auth::AuthUser`] -- Extracts the caller from a JWT Bearer token.
//! - [`rbac::RequireAdmin`] -- Requires the `admin` role.
//! - [`rbac::MaybeAdmin`] -- Widens public reads for admins without requiring a token.

pub mod auth;
pub mod rbac;

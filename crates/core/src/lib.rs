//! Domain rules for the Boganto blog backend.
//!
//! Nothing in here talks to the database or HTTP; the `db` and `api` crates
//! build on these types and helpers.

pub mod banner;
pub mod error;
pub mod image;
pub mod pagination;
pub mod post;
pub mod ranking;
pub mod roles;
pub mod slug;
pub mod types;
pub mod upload;

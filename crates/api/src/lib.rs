//! Boganto blog API server library.
//!
//! Exposes the building blocks (config, state, error handling, request
//! payloads, the publishing service, routes) so integration tests and the
//! binary entrypoint can both access them.

pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod payload;
pub mod publishing;
pub mod query;
pub mod response;
pub mod routes;
pub mod state;

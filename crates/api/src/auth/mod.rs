//! Bearer-token handling for the editorial API.

pub mod jwt;

//! Domain model structs and DTOs.
//!
//! Each submodule contains:
//! - `FromRow` structs matching what queries return
//! - plain insert/update DTOs built by the service layer from validated input
//! - `Serialize` views handed to HTTP clients

pub mod banner;
pub mod category;
pub mod post;
pub mod related_book;

//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async methods. Reads
//! take `&PgPool`; writes that may run inside a caller's transaction take
//! `&mut PgConnection`.

pub mod banner_repo;
pub mod category_repo;
pub mod post_repo;
pub mod related_book_repo;

pub use banner_repo::BannerRepo;
pub use category_repo::CategoryRepo;
pub use post_repo::PostRepo;
pub use related_book_repo::RelatedBookRepo;

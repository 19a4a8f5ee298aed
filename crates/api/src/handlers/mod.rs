pub mod banners;
pub mod categories;
pub mod posts;

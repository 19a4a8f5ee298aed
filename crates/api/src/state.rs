use std::sync::Arc;

use boganto_core::upload::ImageStore;

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// Cheap to clone: the pool is reference-counted and the rest sits behind `Arc`.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: boganto_db::DbPool,
    /// Server configuration.
    pub config: Arc<ServerConfig>,
    /// Writer for the managed upload directory.
    pub images: Arc<ImageStore>,
}

impl AppState {
    pub fn new(pool: boganto_db::DbPool, config: ServerConfig) -> Self {
        let images = ImageStore::new(config.upload_dir.clone(), config.max_upload_bytes);
        Self {
            pool,
            config: Arc::new(config),
            images: Arc::new(images),
        }
    }

    /// Base URL used to expand stored image paths.
    pub fn public_base(&self) -> &str {
        &self.config.public_base_url
    }
}

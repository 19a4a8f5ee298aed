//! Disk-backed store for uploaded images.
//!
//! Files are written under `<root>/<subfolder>/` with a generated name and
//! addressed publicly as `/uploads/<subfolder>/<name>`. Nothing is cleaned
//! up if the surrounding operation later fails.

use std::path::{Path, PathBuf};

use crate::image::UPLOAD_URL_PREFIX;

/// Accepted declared MIME types.
pub const ALLOWED_IMAGE_TYPES: &[&str] = &[
    "image/jpeg",
    "image/jpg",
    "image/png",
    "image/gif",
    "image/webp",
];

/// Default size cap: 5 MiB.
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 5 * 1024 * 1024;

pub const SUBFOLDER_BOOK_COVERS: &str = "book_covers";
pub const SUBFOLDER_BANNERS: &str = "banners";

#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error("Unsupported image type '{0}'. Allowed: jpeg, png, gif, webp")]
    InvalidType(String),

    #[error("Image is {size} bytes; the limit is {max} bytes")]
    TooLarge { size: usize, max: usize },

    #[error("Failed to write image: {0}")]
    Io(#[from] std::io::Error),
}

/// A file received from a client.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl UploadedFile {
    pub fn new(
        file_name: impl Into<String>,
        content_type: impl Into<String>,
        bytes: impl Into<Vec<u8>>,
    ) -> Self {
        Self {
            file_name: file_name.into(),
            content_type: content_type.into(),
            bytes: bytes.into(),
        }
    }

    /// Browsers send an empty part for a file input left blank.
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty() && self.file_name.is_empty()
    }
}

/// Writes accepted images below a root directory.
#[derive(Debug, Clone)]
pub struct ImageStore {
    root: PathBuf,
    max_bytes: usize,
}

impl ImageStore {
    pub fn new(root: impl Into<PathBuf>, max_bytes: usize) -> Self {
        Self {
            root: root.into(),
            max_bytes,
        }
    }

    /// Check type and size without touching the disk.
    pub fn validate(&self, file: &UploadedFile) -> Result<(), UploadError> {
        let declared = file.content_type.trim().to_ascii_lowercase();
        if !ALLOWED_IMAGE_TYPES.contains(&declared.as_str()) {
            return Err(UploadError::InvalidType(file.content_type.clone()));
        }
        if file.bytes.len() > self.max_bytes {
            return Err(UploadError::TooLarge {
                size: file.bytes.len(),
                max: self.max_bytes,
            });
        }
        Ok(())
    }

    /// Validate and write a file, returning its root-relative public path.
    pub async fn store(
        &self,
        file: &UploadedFile,
        subfolder: Option<&str>,
    ) -> Result<String, UploadError> {
        self.validate(file)?;

        let dir = match subfolder {
            Some(sub) => self.root.join(sub),
            None => self.root.clone(),
        };
        tokio::fs::create_dir_all(&dir).await?;

        let filename = unique_filename(file);
        tokio::fs::write(dir.join(&filename), &file.bytes).await?;

        Ok(match subfolder {
            Some(sub) => format!("{UPLOAD_URL_PREFIX}{sub}/{filename}"),
            None => format!("{UPLOAD_URL_PREFIX}{filename}"),
        })
    }
}

/// `<uuid>_<unix-timestamp>.<ext>`, keeping the original extension when it is
/// a plain alphanumeric one and otherwise deriving it from the MIME type.
fn unique_filename(file: &UploadedFile) -> String {
    let ext = Path::new(&file.file_name)
        .extension()
        .and_then(|e| e.to_str())
        .filter(|e| !e.is_empty() && e.len() <= 8 && e.chars().all(|c| c.is_ascii_alphanumeric()))
        .map(str::to_ascii_lowercase)
        .unwrap_or_else(|| extension_for(&file.content_type).to_string());

    format!(
        "{}_{}.{ext}",
        uuid::Uuid::new_v4().simple(),
        chrono::Utc::now().timestamp()
    )
}

fn extension_for(content_type: &str) -> &'static str {
    match content_type.trim().to_ascii_lowercase().as_str() {
        "image/png" => "png",
        "image/gif" => "gif",
        "image/webp" => "webp",
        _ => "jpg",
    }
}

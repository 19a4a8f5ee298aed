//! Request body normalization for post and banner writes.
//!
//! Editors submit posts either as `multipart/form-data` (with image files)
//! or as a JSON document (no files). [`PostPayload`] resolves which one
//! arrived, once, at the boundary; the publishing service only ever sees
//! the normalized [`PostSubmission`].

use std::collections::HashMap;

use axum::extract::{FromRequest, Multipart, Request};
use axum::http::header::CONTENT_TYPE;
use axum::Json;
use boganto_core::post::{non_blank, parse_related_books, PostFieldsInput};
use boganto_core::upload::UploadedFile;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::error::{AppError, AppResult};

/// Multipart field holding the JSON-encoded related books.
pub const FIELD_RELATED_BOOKS: &str = "related_books";
pub const FIELD_FEATURED_IMAGE: &str = "featured_image";
pub const FIELD_FEATURED_IMAGE_2: &str = "featured_image_2";
pub const FIELD_BANNER_IMAGE: &str = "banner_image";
/// Cover files are named `book_cover_<index>`, matching the book's position
/// in `related_books`.
pub const BOOK_COVER_PREFIX: &str = "book_cover_";

// ---------------------------------------------------------------------------
// Multipart form
// ---------------------------------------------------------------------------

/// A fully buffered multipart body: text fields and non-empty file parts.
#[derive(Debug, Default)]
pub struct MultipartForm {
    pub text: HashMap<String, String>,
    pub files: HashMap<String, UploadedFile>,
}

impl MultipartForm {
    pub async fn read(mut multipart: Multipart) -> AppResult<Self> {
        let mut form = MultipartForm::default();

        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| AppError::BadRequest(format!("Invalid multipart body: {e}")))?
        {
            let name = field.name().unwrap_or("").to_string();
            if name.is_empty() {
                continue;
            }

            match field.file_name().map(str::to_string) {
                Some(file_name) => {
                    let content_type = field
                        .content_type()
                        .unwrap_or("application/octet-stream")
                        .to_string();
                    let bytes = field.bytes().await.map_err(|e| {
                        AppError::BadRequest(format!("Failed to read file '{name}': {e}"))
                    })?;
                    let file = UploadedFile::new(file_name, content_type, bytes.to_vec());
                    // Blank file inputs arrive as empty parts.
                    if !file.is_empty() {
                        form.files.insert(name, file);
                    }
                }
                None => {
                    let value = field.text().await.map_err(|e| {
                        AppError::BadRequest(format!("Failed to read field '{name}': {e}"))
                    })?;
                    form.text.insert(name, value);
                }
            }
        }

        Ok(form)
    }

    pub fn take_file(&mut self, name: &str) -> Option<UploadedFile> {
        self.files.remove(name)
    }

    /// Remove every file whose field name is `<prefix><index>`, keyed by index.
    pub fn take_indexed_files(&mut self, prefix: &str) -> HashMap<usize, UploadedFile> {
        let keys: Vec<(String, usize)> = self
            .files
            .keys()
            .filter_map(|k| {
                let index = k.strip_prefix(prefix)?.parse().ok()?;
                Some((k.clone(), index))
            })
            .collect();

        keys.into_iter()
            .filter_map(|(key, index)| self.files.remove(&key).map(|f| (index, f)))
            .collect()
    }

    /// Deserialize the remaining text fields into `T`.
    pub fn fields<T: DeserializeOwned>(&self) -> AppResult<T> {
        let map: Map<String, Value> = self
            .text
            .iter()
            .map(|(k, v)| (k.clone(), Value::String(v.clone())))
            .collect();
        serde_json::from_value(Value::Object(map))
            .map_err(|e| AppError::BadRequest(format!("Invalid form fields: {e}")))
    }
}

// ---------------------------------------------------------------------------
// Post payload
// ---------------------------------------------------------------------------

/// A post write, normalized: typed fields plus any uploaded files.
#[derive(Debug, Default)]
pub struct PostSubmission {
    pub fields: PostFieldsInput,
    pub featured_image: Option<UploadedFile>,
    pub featured_image_2: Option<UploadedFile>,
    /// Cover uploads keyed by related-book index.
    pub book_covers: HashMap<usize, UploadedFile>,
}

impl PostSubmission {
    /// Build a submission from a multipart form.
    ///
    /// `related_books` arrives as a JSON string; unparseable JSON is a
    /// validation error. A blank field counts as absent and leaves stored
    /// books alone; `[]` clears them.
    pub fn from_form(mut form: MultipartForm) -> AppResult<Self> {
        let related_books = form
            .text
            .remove(FIELD_RELATED_BOOKS)
            .and_then(non_blank)
            .map(|raw| parse_related_books(&raw))
            .transpose()?;

        let mut fields: PostFieldsInput = form.fields()?;
        fields.related_books = related_books;

        Ok(Self {
            fields,
            featured_image: form.take_file(FIELD_FEATURED_IMAGE),
            featured_image_2: form.take_file(FIELD_FEATURED_IMAGE_2),
            book_covers: form.take_indexed_files(BOOK_COVER_PREFIX),
        })
    }
}

/// The two accepted shapes of a post write.
#[derive(Debug)]
pub enum PostPayload {
    /// `multipart/form-data`, possibly carrying files.
    FormUpload(MultipartForm),
    /// `application/json`, never carrying files.
    JsonPatch(PostFieldsInput),
}

impl PostPayload {
    pub fn into_submission(self) -> AppResult<PostSubmission> {
        match self {
            PostPayload::FormUpload(form) => PostSubmission::from_form(form),
            PostPayload::JsonPatch(fields) => Ok(PostSubmission {
                fields,
                ..Default::default()
            }),
        }
    }
}

fn is_multipart(req: &Request) -> bool {
    req.headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.trim_start().to_ascii_lowercase().starts_with("multipart/form-data"))
}

impl<S> FromRequest<S> for PostPayload
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        if is_multipart(&req) {
            let multipart = Multipart::from_request(req, state)
                .await
                .map_err(|e| AppError::BadRequest(e.body_text()))?;
            return Ok(PostPayload::FormUpload(MultipartForm::read(multipart).await?));
        }

        let Json(fields) = Json::<PostFieldsInput>::from_request(req, state)
            .await
            .map_err(|e| AppError::BadRequest(e.body_text()))?;
        Ok(PostPayload::JsonPatch(fields))
    }
}

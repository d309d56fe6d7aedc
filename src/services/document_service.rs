use crate::error::{Error, Result};
use crate::models::application::NewDocument;
use bytes::Bytes;
use std::path::Path;
use tokio::fs;
use uuid::Uuid;

const ALLOWED_EXTENSIONS: [&str; 6] = ["pdf", "doc", "docx", "txt", "rtf", "odt"];

/// Writes uploaded CVs under the configured directory as `<uuid>.<ext>`.
/// Only the returned metadata ever reaches storage; clients never see paths.
#[derive(Clone)]
pub struct DocumentService {
    upload_dir: String,
}

impl DocumentService {
    pub fn new(upload_dir: String) -> Self {
        Self { upload_dir }
    }

    pub async fn store_cv(&self, original_name: &str, data: &Bytes) -> Result<NewDocument> {
        if data.is_empty() {
            return Err(Error::Validation("uploaded CV file is empty".into()));
        }

        let ext = Path::new(original_name)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase())
            .unwrap_or_default();
        if !ALLOWED_EXTENSIONS.contains(&ext.as_str()) {
            return Err(Error::Validation(format!(
                "file type .{} is not allowed",
                ext
            )));
        }
        if ext == "pdf" && !data.starts_with(b"%PDF") {
            return Err(Error::Validation("invalid PDF file content".into()));
        }

        fs::create_dir_all(&self.upload_dir).await?;
        let stored_name = format!("{}.{}", Uuid::new_v4(), ext);
        let storage_path = format!("{}/{}", self.upload_dir, stored_name);
        fs::write(&storage_path, data).await?;

        Ok(NewDocument {
            kind: ext,
            storage_path,
            original_name: original_name.to_string(),
        })
    }
}

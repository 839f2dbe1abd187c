use std::path::{Path, PathBuf};

use anyhow::Result;
use axum::body::Bytes;
use axum::extract::Multipart;
use tokio::fs;
use tracing::{info, warn};

use crate::error::ApiError;

pub const PHOTO_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif"];
pub const ASSIGNMENT_EXTENSIONS: &[&str] = &["pdf", "doc", "docx"];

/// Flat directory holding profile photos and assignment files.
///
/// Stored names are generated server side; client filenames only contribute
/// their extension.
pub struct Storage {
    dir: PathBuf,
}

impl Storage {
    pub async fn new(dir: PathBuf) -> Result<Self> {
        fs::create_dir_all(&dir).await?;
        info!("Upload directory: {}", dir.display());
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn file_path(&self, name: &str) -> PathBuf {
        self.dir.join(name)
    }

    pub async fn save(&self, name: &str, data: &[u8]) -> Result<()> {
        fs::write(self.file_path(name), data).await?;
        Ok(())
    }

    /// Remove a file written for a request that later failed.
    pub async fn discard(&self, name: &str) {
        if let Err(e) = fs::remove_file(self.file_path(name)).await {
            warn!("Failed to remove orphaned upload {}: {}", name, e);
        }
    }
}

/// A file part pulled out of a multipart body.
pub struct UploadedFile {
    pub file_name: String,
    pub data: Bytes,
}

/// Lowercased extension of `file_name` if it is in `allowed`.
pub fn allowed_extension(file_name: &str, allowed: &[&str]) -> Option<String> {
    let (_, ext) = file_name.rsplit_once('.')?;
    let ext = ext.to_ascii_lowercase();
    allowed.contains(&ext.as_str()).then_some(ext)
}

/// `{prefix}_{8 hex}.{ext}`
pub fn stored_name(prefix: &str, ext: &str) -> String {
    format!("{}_{:08x}.{}", prefix, rand::random::<u32>(), ext)
}

/// Ids end up inside stored filenames, so only plain id characters are allowed.
pub fn is_safe_id(id: &str) -> bool {
    !id.is_empty()
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

/// Read a multipart body into its text fields and the file part named
/// `file_field`.
pub async fn read_multipart(
    mut multipart: Multipart,
    file_field: &str,
) -> Result<(Vec<(String, String)>, Option<UploadedFile>), ApiError> {
    let mut fields = Vec::new();
    let mut file = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::bad_request(format!("Invalid multipart body: {}", e.body_text())))?
    {
        let name = field.name().unwrap_or_default().to_string();

        if name == file_field {
            let file_name = field.file_name().unwrap_or_default().to_string();
            let data = field
                .bytes()
                .await
                .map_err(|e| ApiError::bad_request(format!("Invalid multipart body: {}", e.body_text())))?;
            file = Some(UploadedFile { file_name, data });
        } else {
            let value = field
                .text()
                .await
                .map_err(|e| ApiError::bad_request(format!("Invalid multipart body: {}", e.body_text())))?;
            fields.push((name, value));
        }
    }

    Ok((fields, file))
}

/// Non-empty text field by name.
pub fn text_field<'a>(fields: &'a [(String, String)], name: &str) -> Option<&'a str> {
    fields
        .iter()
        .find(|(n, _)| n == name)
        .map(|(_, v)| v.trim())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allowed_extension() {
        assert_eq!(allowed_extension("me.PNG", PHOTO_EXTENSIONS), Some("png".into()));
        assert_eq!(allowed_extension("a.b.jpeg", PHOTO_EXTENSIONS), Some("jpeg".into()));
        assert_eq!(allowed_extension("essay.docx", ASSIGNMENT_EXTENSIONS), Some("docx".into()));
        assert_eq!(allowed_extension("script.exe", PHOTO_EXTENSIONS), None);
        assert_eq!(allowed_extension("noext", PHOTO_EXTENSIONS), None);
        assert_eq!(allowed_extension("photo.png", ASSIGNMENT_EXTENSIONS), None);
    }

    #[test]
    fn test_stored_name_shape() {
        let name = stored_name("assignment_s1", "pdf");
        let suffix = name
            .strip_prefix("assignment_s1_")
            .and_then(|rest| rest.strip_suffix(".pdf"))
            .unwrap();
        assert_eq!(suffix.len(), 8);
        assert!(suffix.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_safe_ids() {
        assert!(is_safe_id("3f2b-11aa_x"));
        assert!(!is_safe_id("../etc"));
        assert!(!is_safe_id("a/b"));
        assert!(!is_safe_id(""));
    }

    #[tokio::test]
    async fn test_save_and_discard() {
        let dir = std::env::temp_dir().join(format!("gradebook-uploads-{}", uuid::Uuid::new_v4()));
        let storage = Storage::new(dir.clone()).await.unwrap();

        storage.save("a.txt", b"hello").await.unwrap();
        assert_eq!(fs::read(storage.file_path("a.txt")).await.unwrap(), b"hello");

        storage.discard("a.txt").await;
        assert!(!storage.file_path("a.txt").exists());

        fs::remove_dir_all(dir).await.unwrap();
    }
}

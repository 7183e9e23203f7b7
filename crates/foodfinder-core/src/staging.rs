//! Holds the one image the user picked before it is sent.

use std::path::Path;

use tracing::debug;

use crate::config::DEFAULT_MAX_UPLOAD_BYTES;
use crate::error::StagingError;

const ALLOWED_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif"];

/// An image file selected for upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageFile {
    pub file_name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl ImageFile {
    /// Build from raw bytes. The MIME type comes from the file extension.
    pub fn new(file_name: &str, bytes: Vec<u8>) -> Result<Self, StagingError> {
        let mime_type = mime_type_for(file_name)?;
        if bytes.is_empty() {
            return Err(StagingError::Empty);
        }

        Ok(Self {
            file_name: file_name.to_string(),
            mime_type: mime_type.to_string(),
            bytes,
        })
    }

    /// Read an image from disk. The name and the on-disk size are checked
    /// before any byte is read, so `max_bytes` bounds the read.
    pub async fn from_path(path: &Path, max_bytes: usize) -> Result<Self, StagingError> {
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default()
            .to_string();
        mime_type_for(&file_name)?;

        let size = tokio::fs::metadata(path).await?.len();
        let size = usize::try_from(size).unwrap_or(usize::MAX);
        if size > max_bytes {
            return Err(StagingError::TooLarge {
                size,
                max: max_bytes,
            });
        }

        let bytes = tokio::fs::read(path).await?;
        Self::new(&file_name, bytes)
    }

    pub fn size(&self) -> usize {
        self.bytes.len()
    }
}

fn mime_type_for(file_name: &str) -> Result<&'static str, StagingError> {
    let extension = Path::new(file_name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();

    if !ALLOWED_EXTENSIONS.contains(&extension.as_str()) {
        return Err(StagingError::UnsupportedType(file_name.to_string()));
    }

    Ok(match extension.as_str() {
        "png" => "image/png",
        "gif" => "image/gif",
        _ => "image/jpeg",
    })
}

/// Display handle for a staged image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Preview {
    pub label: String,
}

impl Preview {
    fn of(file: &ImageFile) -> Self {
        let kb = (file.size() as f64 / 1024.0).max(0.1);
        Self {
            label: format!("{} ({:.1} KB)", file.file_name, kb),
        }
    }
}

#[derive(Debug, Clone)]
pub struct StagedImage {
    pub file: ImageFile,
    pub preview: Preview,
}

/// At most one staged image at a time.
#[derive(Debug)]
pub struct UploadStaging {
    staged: Option<StagedImage>,
    max_bytes: usize,
}

impl Default for UploadStaging {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_UPLOAD_BYTES)
    }
}

impl UploadStaging {
    pub fn new(max_bytes: usize) -> Self {
        Self { staged: None, max_bytes }
    }

    /// Stage `file`, replacing anything staged before. On error the previous
    /// image stays staged.
    pub fn stage(&mut self, file: ImageFile) -> Result<&Preview, StagingError> {
        if file.size() > self.max_bytes {
            return Err(StagingError::TooLarge {
                size: file.size(),
                max: self.max_bytes,
            });
        }

        debug!(file = %file.file_name, bytes = file.size(), "staged image");
        let preview = Preview::of(&file);
        let staged = self.staged.insert(StagedImage { file, preview });
        Ok(&staged.preview)
    }

    /// Read and stage the file at `path` under this staging's size limit.
    pub async fn stage_path(&mut self, path: &Path) -> Result<&Preview, StagingError> {
        let file = ImageFile::from_path(path, self.max_bytes).await?;
        self.stage(file)
    }

    pub fn clear(&mut self) {
        self.staged = None;
    }

    pub fn peek(&self) -> Option<&StagedImage> {
        self.staged.as_ref()
    }

    pub fn is_staged(&self) -> bool {
        self.staged.is_some()
    }

    /// Hand the staged image over to an exchange.
    pub(crate) fn take(&mut self) -> Option<StagedImage> {
        self.staged.take()
    }
}

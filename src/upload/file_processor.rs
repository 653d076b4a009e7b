use crate::upload::types::{UploadedFile, FALLBACK_MEDIA_TYPE, MAX_UPLOAD_BYTES};
use crate::utils::file_size::FileSizeUtils;
use image::ImageFormat;
use log::{debug, warn};
use std::fs::File;
use std::io::Read;
use std::path::Path;
use thiserror::Error;

/// Enough leading bytes for every signature `image` recognises.
const SNIFF_LEN: usize = 64;

/// Extensions offered by the file dialog filter.
pub const IMAGE_EXTENSIONS: [&str; 6] = ["jpg", "jpeg", "png", "gif", "webp", "bmp"];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UploadError {
    #[error("unsupported media type {media_type}")]
    InvalidFileType { media_type: String },
    #[error("file is {size} bytes which exceeds the {limit} byte limit")]
    FileTooLarge { size: u64, limit: u64 },
    #[error("failed to read file: {0}")]
    Unreadable(String),
}

impl UploadError {
    pub fn user_message(&self) -> String {
        match self {
            UploadError::InvalidFileType { .. } => {
                "Please upload an image file (JPG, PNG, etc.).".to_string()
            }
            UploadError::FileTooLarge { limit, .. } => format!(
                "File too large. Please upload an image smaller than {}.",
                FileSizeUtils::format_size(*limit)
            ),
            UploadError::Unreadable(_) => {
                "Could not read the selected file. Please try another one.".to_string()
            }
        }
    }
}

/// Turns picked paths and dropped bytes into [`UploadedFile`]s and checks
/// them against the image type and size rules.
#[derive(Debug, Clone)]
pub struct FileProcessor {
    max_bytes: u64,
}

impl Default for FileProcessor {
    fn default() -> Self {
        Self::new(MAX_UPLOAD_BYTES)
    }
}

impl FileProcessor {
    pub fn new(max_bytes: u64) -> Self {
        Self { max_bytes }
    }

    pub fn max_bytes(&self) -> u64 {
        self.max_bytes
    }

    /// Reads a file from disk. The type is sniffed from the first bytes and
    /// checked before the size, and oversized files are rejected from their
    /// metadata before the rest is read.
    pub fn load_path(&self, path: &Path) -> Result<UploadedFile, UploadError> {
        let unreadable = |e: std::io::Error| {
            warn!("Failed to read {}: {}", path.display(), e);
            UploadError::Unreadable(e.to_string())
        };

        let mut file = File::open(path).map_err(unreadable)?;
        let size = file.metadata().map_err(unreadable)?.len();

        let mut header = [0u8; SNIFF_LEN];
        let read = file.read(&mut header).map_err(unreadable)?;
        let media_type = Self::detect_media_type(&header[..read], Some(path));

        if !media_type.starts_with("image/") {
            return Err(UploadError::InvalidFileType { media_type });
        }
        if size > self.max_bytes {
            return Err(UploadError::FileTooLarge {
                size,
                limit: self.max_bytes,
            });
        }

        let mut bytes = Vec::with_capacity(size as usize);
        bytes.extend_from_slice(&header[..read]);
        file.read_to_end(&mut bytes).map_err(unreadable)?;

        let name = path
            .file_name()
            .unwrap_or_default()
            .to_string_lossy()
            .to_string();
        debug!(
            "Loaded {} ({}, {})",
            name,
            media_type,
            FileSizeUtils::format_size(bytes.len() as u64)
        );

        Ok(UploadedFile::new(name, media_type, bytes))
    }

    /// Wraps bytes that arrived without a backing path (e.g. a drop from a
    /// browser window).
    pub fn from_bytes(&self, name: &str, bytes: Vec<u8>) -> UploadedFile {
        let media_type = Self::detect_media_type(&bytes, Some(Path::new(name)));
        UploadedFile::new(name, media_type, bytes)
    }

    pub fn validate(&self, file: &UploadedFile) -> Result<(), UploadError> {
        if !file.is_image() {
            return Err(UploadError::InvalidFileType {
                media_type: file.media_type.clone(),
            });
        }

        if file.size() > self.max_bytes {
            return Err(UploadError::FileTooLarge {
                size: file.size(),
                limit: self.max_bytes,
            });
        }

        Ok(())
    }

    /// Content sniffing first, then the extension, like a browser would.
    pub fn detect_media_type(bytes: &[u8], path: Option<&Path>) -> String {
        image::guess_format(bytes)
            .ok()
            .or_else(|| path.and_then(|p| ImageFormat::from_path(p).ok()))
            .map(|format| format.to_mime_type().to_string())
            .unwrap_or_else(|| FALLBACK_MEDIA_TYPE.to_string())
    }

    /// File extension matching a media type, used to tag preview URIs so
    /// the image loader picks the right decoder.
    pub fn extension_for(media_type: &str) -> Option<&'static str> {
        ImageFormat::from_mime_type(media_type)
            .and_then(|format| format.extensions_str().first().copied())
    }
}

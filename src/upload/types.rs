use std::sync::Arc;

/// Largest image accepted for analysis.
pub const MAX_UPLOAD_BYTES: u64 = 10 * 1024 * 1024;

pub const FALLBACK_MEDIA_TYPE: &str = "application/octet-stream";

/// A picked or dropped file, held only for one upload-analyze cycle.
///
/// The bytes are shared so the preview and the in-flight provider task can
/// both read them without copying.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedFile {
    pub name: String,
    pub media_type: String,
    pub bytes: Arc<[u8]>,
}

impl UploadedFile {
    pub fn new(name: impl Into<String>, media_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            media_type: media_type.into(),
            bytes: Arc::from(bytes),
        }
    }

    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }

    pub fn is_image(&self) -> bool {
        self.media_type.starts_with("image/")
    }
}

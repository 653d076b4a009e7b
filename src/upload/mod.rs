mod file_processor;
mod types;

pub use file_processor::{FileProcessor, UploadError, IMAGE_EXTENSIONS};
pub use types::{UploadedFile, FALLBACK_MEDIA_TYPE, MAX_UPLOAD_BYTES};

//! Transient on-disk staging for generated images
//!
//! The Mastodon media endpoint takes a file, so image bytes are written to a
//! temporary file for the duration of one pipeline iteration. The file is
//! removed when the [`TransientImageFile`] is dropped, which covers every exit
//! path of the iteration including early returns and panics.

use std::io::Write;
use std::path::Path;

use tempfile::NamedTempFile;
use tracing::debug;

use crate::error::Result;
use crate::types::ImageMimeType;

const FILE_PREFIX: &str = "post_image_";

#[derive(Debug)]
pub struct TransientImageFile {
    file: NamedTempFile,
    mime_type: ImageMimeType,
    size: u64,
}

impl TransientImageFile {
    /// Stage `bytes` in the system temp directory
    pub fn create(bytes: &[u8]) -> Result<Self> {
        Self::create_in(std::env::temp_dir(), bytes)
    }

    /// Stage `bytes` in `dir`
    ///
    /// The extension follows the sniffed image format, PNG when unknown.
    ///
    /// # Errors
    ///
    /// Returns `MusecastError::Io` if the file cannot be created or written.
    pub fn create_in(dir: impl AsRef<Path>, bytes: &[u8]) -> Result<Self> {
        let mime_type = ImageMimeType::detect(bytes).unwrap_or(ImageMimeType::Png);
        let suffix = format!(".{}", mime_type.extension());

        let mut file = tempfile::Builder::new()
            .prefix(FILE_PREFIX)
            .suffix(&suffix)
            .tempfile_in(dir)?;
        file.write_all(bytes)?;
        file.flush()?;

        debug!(
            "Staged {} byte {} image at {}",
            bytes.len(),
            mime_type,
            file.path().display()
        );

        Ok(Self {
            file,
            mime_type,
            size: bytes.len() as u64,
        })
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }

    pub fn mime_type(&self) -> ImageMimeType {
        self.mime_type
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    /// Delete the file now, reporting any filesystem error
    ///
    /// Dropping the value also deletes it, silently.
    pub fn remove(self) -> Result<()> {
        let path = self.file.path().to_path_buf();
        self.file.close()?;
        debug!("Removed staged image {}", path.display());
        Ok(())
    }
}

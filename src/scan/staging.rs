use super::schema::UploadedImage;
use crate::error::ScanResult;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use uuid::Uuid;

/// Writes uploads to uniquely named files so path-based consumers can read them.
pub struct ImageStaging {
    base_dir: PathBuf,
}

impl ImageStaging {
    pub fn new(base_dir: &str) -> Self {
        let expanded = shellexpand::tilde(base_dir).to_string();
        Self {
            base_dir: PathBuf::from(expanded),
        }
    }

    /// Persist the upload as `<uuid>.<original ext>` and return its handle.
    pub async fn stage(&self, image: &UploadedImage) -> ScanResult<StagedImage> {
        fs::create_dir_all(&self.base_dir).await?;

        let stored_name = format!("{}.{}", Uuid::new_v4(), image.extension);
        let path = self.base_dir.join(stored_name);
        fs::write(&path, &image.bytes).await?;

        tracing::info!(
            file = %image.filename,
            path = %path.display(),
            bytes = image.bytes.len(),
            "staged uploaded image"
        );
        Ok(StagedImage {
            path,
            original_name: image.filename.clone(),
            consumed: false,
            released: false,
        })
    }
}

/// A staged file on disk. Removed at most once through [`StagedImage::release`].
#[derive(Debug)]
pub struct StagedImage {
    path: PathBuf,
    original_name: String,
    /// Set once an analysis has used the file, even if deleting it failed.
    consumed: bool,
    released: bool,
}

impl StagedImage {
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn original_name(&self) -> &str {
        &self.original_name
    }

    pub fn is_released(&self) -> bool {
        self.released
    }

    pub fn mark_consumed(&mut self) {
        self.consumed = true;
    }

    /// True while the file is on disk and no analysis has consumed it.
    pub async fn exists(&self) -> bool {
        !self.consumed && !self.released && fs::try_exists(&self.path).await.unwrap_or(false)
    }

    /// Delete the staged file. Returns `false` if it was already released.
    ///
    /// A file that is already gone counts as removed.
    pub async fn release(&mut self) -> ScanResult<bool> {
        if self.released {
            return Ok(false);
        }
        match fs::remove_file(&self.path).await {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::debug!(path = %self.path.display(), "staged file already absent");
            }
            Err(e) => return Err(e.into()),
        }
        self.released = true;
        Ok(true)
    }
}

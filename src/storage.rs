use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use image::ImageFormat;
use model::files::{recipe_image_file_path_with, IdGenerator, UuidGenerator};
use tracing::{debug, warn};

use crate::error::ApiError;

/// URL prefix under which the media root is served.
pub const MEDIA_URL: &str = "/media";

/// Largest accepted image upload.
pub const MAX_IMAGE_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

const INVALID_IMAGE: &str =
    "Upload a valid image. The file you uploaded was either not an image or a corrupted image.";

/// Uploaded files on local disk, below `root`.
#[derive(Clone, Debug)]
pub struct MediaStorage {
    root: PathBuf,
    ids: Arc<dyn IdGenerator>,
}

impl MediaStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self::with_id_generator(root, Arc::new(UuidGenerator))
    }

    pub fn with_id_generator(root: impl Into<PathBuf>, ids: Arc<dyn IdGenerator>) -> Self {
        Self {
            root: root.into(),
            ids,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Absolute location of a path relative to the media root.
    pub fn absolute_path(&self, relative: &str) -> PathBuf {
        self.root.join(relative)
    }

    /// Public URL for a path relative to the media root.
    pub fn url_for(&self, relative: &str) -> String {
        format!("{MEDIA_URL}/{relative}")
    }

    /// Check that `bytes` decode as a supported image.
    pub fn validate_image(&self, bytes: &[u8]) -> Result<ImageFormat, ApiError> {
        let format = image::guess_format(bytes).map_err(|e| {
            debug!("Upload is not a recognizable image: {}", e);
            ApiError::field("image", INVALID_IMAGE)
        })?;

        image::load_from_memory_with_format(bytes, format).map_err(|e| {
            debug!("Upload failed to decode as {:?}: {}", format, e);
            ApiError::field("image", INVALID_IMAGE)
        })?;

        Ok(format)
    }

    /// Write a validated recipe image and return its path relative to the
    /// media root. The extension always comes from the decoded `format`,
    /// never from the client's `filename`.
    pub async fn save_recipe_image(
        &self,
        filename: &str,
        format: ImageFormat,
        bytes: &[u8],
    ) -> Result<String, ApiError> {
        let Some(ext) = format.extensions_str().first() else {
            return Err(ApiError::field("image", INVALID_IMAGE));
        };
        debug!("Storing upload {:?} as .{}", filename, ext);

        let filename = format!("image.{ext}");
        let relative = recipe_image_file_path_with(self.ids.as_ref(), &filename);
        let destination = self.absolute_path(&relative);
        if let Some(parent) = destination.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&destination, bytes).await?;

        debug!("Stored {} bytes at {}", bytes.len(), destination.display());
        Ok(relative)
    }

    /// Best-effort removal of a stored file.
    pub async fn remove(&self, relative: &str) {
        let path = self.absolute_path(relative);
        if let Err(e) = tokio::fs::remove_file(&path).await {
            warn!("Failed to remove media file {}: {}", path.display(), e);
        }
    }
}

use std::path::{Path, PathBuf};
use std::sync::Arc;

use futures_util::future::join_all;
use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, ExtendedColorType, ImageEncoder};
use shell_logging::{shell_debug, shell_info, shell_warn};

use crate::persist::{stage_copy, write_unique, PersistError};

const CAPTURE_JPEG_QUALITY: u8 = 85;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureSource {
    Camera,
    PhotoLibrary,
    Files,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionLimit {
    One,
    Unbounded,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ResolutionError {
    #[error("item has no file representation: {0}")]
    Unavailable(String),
    #[error("failed to stage item: {0}")]
    Staging(String),
}

/// One item picked from the media library, resolved lazily.
#[async_trait::async_trait]
pub trait PickedMedia: Send + Sync {
    /// Loads a file representation. The path may be short-lived.
    async fn load_file(&self) -> Result<PathBuf, ResolutionError>;
}

/// Capture sources offered by the host environment.
#[async_trait::async_trait]
pub trait CaptureEnvironment: Send + Sync {
    fn camera_available(&self) -> bool;

    /// Lets the user pick one of `offered`; `None` cancels the operation.
    async fn choose_source(&self, offered: &[CaptureSource]) -> Option<CaptureSource>;

    async fn capture_photo(&self) -> Option<DynamicImage>;

    /// An empty list means the user cancelled.
    async fn pick_media(&self, limit: SelectionLimit) -> Vec<Box<dyn PickedMedia>>;

    /// Returned paths are already locally addressable.
    async fn pick_documents(&self, allow_multiple: bool) -> Option<Vec<PathBuf>>;
}

/// Normalizes every capture source into a list of local files.
#[derive(Clone)]
pub struct FileSelector {
    env: Arc<dyn CaptureEnvironment>,
    staging_dir: PathBuf,
}

impl FileSelector {
    pub fn new(env: Arc<dyn CaptureEnvironment>, staging_dir: PathBuf) -> Self {
        Self { env, staging_dir }
    }

    pub fn offered_sources(&self) -> Vec<CaptureSource> {
        let mut offered = Vec::with_capacity(3);
        if self.env.camera_available() {
            offered.push(CaptureSource::Camera);
        }
        offered.push(CaptureSource::PhotoLibrary);
        offered.push(CaptureSource::Files);
        offered
    }

    /// `None` when the user cancelled. A library selection whose items all
    /// failed to resolve yields `Some` of an empty list.
    pub async fn collect(&self, allow_multiple: bool) -> Option<Vec<PathBuf>> {
        let offered = self.offered_sources();
        let source = self.env.choose_source(&offered).await?;
        if !offered.contains(&source) {
            shell_warn!("Capture source {:?} was not offered", source);
            return None;
        }
        shell_debug!("Collecting files from {:?}", source);

        match source {
            CaptureSource::Camera => self.capture().await,
            CaptureSource::PhotoLibrary => self.resolve_media(allow_multiple).await,
            CaptureSource::Files => self.env.pick_documents(allow_multiple).await,
        }
    }

    async fn capture(&self) -> Option<Vec<PathBuf>> {
        let image = self.env.capture_photo().await?;
        match encode_capture(&image, &self.staging_dir) {
            Ok(path) => Some(vec![path]),
            Err(err) => {
                shell_warn!("Failed to store captured photo: {}", err);
                None
            }
        }
    }

    async fn resolve_media(&self, allow_multiple: bool) -> Option<Vec<PathBuf>> {
        let limit = if allow_multiple {
            SelectionLimit::Unbounded
        } else {
            SelectionLimit::One
        };
        let mut items = self.env.pick_media(limit).await;
        if items.is_empty() {
            return None;
        }
        if !allow_multiple {
            items.truncate(1);
        }

        let staging_dir = self.staging_dir.as_path();
        let settled = join_all(items.iter().map(|item| resolve_item(item.as_ref(), staging_dir))).await;

        let requested = settled.len();
        let files: Vec<PathBuf> = settled
            .into_iter()
            .enumerate()
            .filter_map(|(index, result)| match result {
                Ok(path) => Some(path),
                Err(err) => {
                    shell_warn!("Dropping media item {}: {}", index, err);
                    None
                }
            })
            .collect();
        shell_info!("Resolved {} of {} media items", files.len(), requested);
        Some(files)
    }
}

async fn resolve_item(item: &dyn PickedMedia, staging_dir: &Path) -> Result<PathBuf, ResolutionError> {
    let loaded = item.load_file().await?;
    stage_copy(&loaded, staging_dir).map_err(|err| ResolutionError::Staging(err.to_string()))
}

/// Re-encodes a captured photo as JPEG into a uniquely named staging file.
pub fn encode_capture(image: &DynamicImage, staging_dir: &Path) -> Result<PathBuf, PersistError> {
    let rgb = image.to_rgb8();
    write_unique(staging_dir, "capture-", ".jpg", |file| {
        JpegEncoder::new_with_quality(file, CAPTURE_JPEG_QUALITY)
            .write_image(rgb.as_raw(), rgb.width(), rgb.height(), ExtendedColorType::Rgb8)
            .map_err(|err| PersistError::Encode(err.to_string()))
    })
}

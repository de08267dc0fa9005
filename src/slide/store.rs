use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use bytes::Bytes;
use tracing::{debug, warn};

use crate::error::StoreError;

use super::model::{is_safe_component, Asset, Slide};

/// Metadata file inside each slide directory.
pub const SLIDE_METADATA_FILE: &str = "slide.json";

/// Directory holding a slide's uploaded assets.
pub const ASSET_DIR: &str = "assets";

/// Read access to slides and their asset thumbnails.
///
/// Missing data is `Ok(None)`; `Err` is reserved for storage failures.
#[async_trait]
pub trait SlideStore: Send + Sync {
    async fn load_slide(&self, id: &str) -> Result<Option<Slide>, StoreError>;

    /// Bytes of an asset's thumbnail, or `None` if it has none on disk.
    async fn read_thumbnail(&self, slide: &Slide, asset: &Asset)
        -> Result<Option<Bytes>, StoreError>;
}

/// Slides stored as `<root>/<id>/slide.json` with assets under
/// `<root>/<id>/assets/`.
#[derive(Debug, Clone)]
pub struct FsSlideStore {
    root: PathBuf,
}

impl FsSlideStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn slide_dir(&self, id: &str) -> PathBuf {
        self.root.join(id)
    }
}

#[async_trait]
impl SlideStore for FsSlideStore {
    async fn load_slide(&self, id: &str) -> Result<Option<Slide>, StoreError> {
        if !is_safe_component(id) {
            debug!(slide_id = %id, "Rejecting unsafe slide id");
            return Ok(None);
        }

        let path = self.slide_dir(id).join(SLIDE_METADATA_FILE);
        let Some(data) = read_optional(&path).await? else {
            return Ok(None);
        };

        let slide: Slide = serde_json::from_slice(&data).map_err(|e| StoreError::Corrupt {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;

        if slide.id != id {
            return Err(StoreError::Corrupt {
                path: path.display().to_string(),
                message: format!("metadata names slide '{}'", slide.id),
            });
        }

        Ok(Some(slide))
    }

    async fn read_thumbnail(
        &self,
        slide: &Slide,
        asset: &Asset,
    ) -> Result<Option<Bytes>, StoreError> {
        let Some(thumb) = asset.thumbnail.as_deref().filter(|_| asset.has_thumb()) else {
            return Ok(None);
        };
        if !is_safe_component(&slide.id) {
            return Ok(None);
        }

        let mut path = self.slide_dir(&slide.id).join(ASSET_DIR);
        path.extend(thumb.split('/'));

        let data = read_optional(&path).await?;
        if data.is_none() {
            warn!(
                slide_id = %slide.id,
                asset = %asset.filename,
                "Thumbnail listed in metadata is missing on disk"
            );
        }
        Ok(data)
    }
}

async fn read_optional(path: &Path) -> Result<Option<Bytes>, StoreError> {
    match tokio::fs::read(path).await {
        Ok(data) => Ok(Some(Bytes::from(data))),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(StoreError::io(path.display().to_string(), e)),
    }
}

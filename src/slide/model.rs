use std::path::Path;

use serde::{Deserialize, Serialize};

/// Slide metadata, as stored in `slide.json`.
///
/// Only the fields the asset endpoints read are modelled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Slide {
    pub id: String,

    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub owner: String,

    #[serde(default)]
    pub assets: Vec<Asset>,
}

impl Slide {
    /// Look up an uploaded asset by file name.
    pub fn asset(&self, name: &str) -> Option<&Asset> {
        if !is_safe_component(name) {
            return None;
        }
        self.assets.iter().find(|a| a.filename == name)
    }
}

/// A file uploaded to a slide.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Asset {
    pub filename: String,

    #[serde(default)]
    pub mime: String,

    /// Thumbnail path relative to the slide's asset directory
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,
}

impl Asset {
    pub fn has_thumb(&self) -> bool {
        self.thumbnail.as_deref().is_some_and(is_safe_relative_path)
    }

    /// Content type of the thumbnail, from its file extension.
    pub fn thumb_content_type(&self) -> &'static str {
        self.thumbnail
            .as_deref()
            .map(content_type_for)
            .unwrap_or("application/octet-stream")
    }
}

/// Content type for a file name, from its extension.
pub fn content_type_for(file_name: &str) -> &'static str {
    let ext = Path::new(file_name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());

    match ext.as_deref() {
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("svg") => "image/svg+xml",
        Some("bmp") => "image/bmp",
        _ => "application/octet-stream",
    }
}

/// A single path component that cannot escape its parent directory.
pub fn is_safe_component(name: &str) -> bool {
    !name.is_empty()
        && name.len() <= 255
        && name != "."
        && name != ".."
        && !name.contains(['/', '\\', '\0'])
}

/// A `/`-separated relative path whose components are all safe.
pub fn is_safe_relative_path(path: &str) -> bool {
    !path.is_empty() && path.split('/').all(is_safe_component)
}

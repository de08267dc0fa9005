//! Slides and their uploaded assets.
//!
//! # Layout
//!
//! ```text
//! <slides_dir>/
//! └── S1/
//!     ├── slide.json          {"id": "S1", "name": ..., "owner": ..., "assets": [...]}
//!     └── assets/
//!         ├── logo.png
//!         └── thumbs/
//!             └── logo.png    thumbnail, referenced as "thumbs/logo.png"
//! ```
//!
//! Slide ids and asset names are single path components; anything that could
//! walk out of the slide directory is treated as nonexistent.

mod model;
mod store;

pub use model::{content_type_for, is_safe_component, is_safe_relative_path, Asset, Slide};
pub use store::{FsSlideStore, SlideStore, ASSET_DIR, SLIDE_METADATA_FILE};

//! Thumbstrip UI Library
//!
//! Lazily rendered page thumbnail panel for document viewers.
//!
//! `ThumbnailViewer` keeps one `ThumbnailView` per page, lays them out in a
//! scroll container and renders only what is on screen through a shared
//! rendering queue from `thumbstrip-scheduler`. The document, page
//! rasterizer, scroll container and navigation are supplied by the host
//! through the traits in `document`, `link` and the scheduler crate.

pub mod config;
pub mod document;
pub mod error;
pub mod link;
pub mod page_cache;
pub mod scratch;
pub mod thumbnail;
pub mod viewer;
pub mod viewport;

// Re-export public API
pub use config::{ThumbnailViewerConfig, THUMBNAIL_SCROLL_MARGIN, THUMBNAIL_WIDTH};
pub use document::{PdfDocument, PdfPage};
pub use error::{ConfigError, ThumbnailError, ThumbnailResult};
pub use link::LinkService;
pub use page_cache::PageLoadCache;
pub use scratch::{reduce_image, ScratchSurface};
pub use thumbnail::{ThumbnailImage, ThumbnailView, ThumbnailViewOptions};
pub use viewer::{ThumbnailViewer, ThumbnailViewerOptions};
pub use viewport::{normalize_rotation, PageViewport};

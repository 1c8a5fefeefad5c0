//! Thumbstrip Scheduler Library
//!
//! Decides which view of a scrollable document panel renders next.
//!
//! This crate provides the pieces a viewer needs to render lazily: a
//! visible-region calculator over laid-out views, scroll direction tracking,
//! the rendering queue that picks the highest-priority unrendered view, and
//! cancellation tokens for renders that get superseded. Everything is
//! single-threaded and runs on a `futures` local spawner.
//!
//! # Example
//!
//! ```
//! use thumbstrip_scheduler::{get_visible_elements, ElementBounds, ScrollViewport, VisibleElement};
//!
//! struct Row(u32);
//!
//! impl VisibleElement for Row {
//!     fn id(&self) -> u32 {
//!         self.0
//!     }
//!
//!     fn bounds(&self) -> ElementBounds {
//!         ElementBounds::new(0.0, (self.0 - 1) as f32 * 50.0, 100.0, 50.0)
//!     }
//! }
//!
//! let rows: Vec<Row> = (1..=10).map(Row).collect();
//! let visible = get_visible_elements(&ScrollViewport::new(120.0, 0.0, 100.0, 100.0), &rows, false);
//!
//! assert_eq!(visible.first().unwrap().id, 3);
//! assert_eq!(visible.last().unwrap().id, 5);
//! ```

mod cancel;
mod queue;
mod rendering;
mod scroll;
mod visibility;

// Re-export public API
pub use cancel::CancellationToken;
pub use queue::{RenderStats, RenderingQueue};
pub use rendering::{DrawOutcome, ForceRendering, RenderScheduler, RenderableView, RenderingState};
pub use scroll::{ScrollArea, ScrollContainer, ScrollState, ScrollWatcher};
pub use visibility::{
    get_visible_elements, ElementBounds, ScrollViewport, VisibleElement, VisibleView, VisibleViews,
};

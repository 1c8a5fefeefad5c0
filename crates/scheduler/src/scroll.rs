//! Scroll direction tracking and scroll containers
//!
//! The render queue breaks priority ties using the direction of the last
//! scroll, so every scroll event is folded into a `ScrollState` before the
//! queue is asked to render.

use crate::visibility::ScrollViewport;
use std::cell::Cell;

/// Direction of the most recent scroll on each axis
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScrollState {
    /// Last vertical movement was downwards
    pub down: bool,

    /// Last horizontal movement was to the right
    pub right: bool,

    /// Vertical offset seen at the last update
    pub last_y: f32,

    /// Horizontal offset seen at the last update
    pub last_x: f32,
}

impl Default for ScrollState {
    fn default() -> Self {
        Self {
            down: true,
            right: true,
            last_y: 0.0,
            last_x: 0.0,
        }
    }
}

/// Folds scroll offsets into a `ScrollState`
///
/// An axis keeps its previous direction when its offset did not change, so a
/// purely horizontal scroll does not flip the vertical direction.
#[derive(Debug, Clone, Default)]
pub struct ScrollWatcher {
    state: ScrollState,
}

impl ScrollWatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a new scroll offset and return the updated state
    pub fn update(&mut self, left: f32, top: f32) -> ScrollState {
        if top != self.state.last_y {
            self.state.down = top > self.state.last_y;
            self.state.last_y = top;
        }

        if left != self.state.last_x {
            self.state.right = left > self.state.last_x;
            self.state.last_x = left;
        }

        log::trace!(
            "scroll at ({left}, {top}), down={}, right={}",
            self.state.down,
            self.state.right
        );

        self.state
    }

    /// Current state
    pub fn state(&self) -> ScrollState {
        self.state
    }

    /// Forget all history
    pub fn reset(&mut self) {
        self.state = ScrollState::default();
    }
}

/// A scrollable surface hosting a list of views
///
/// Implemented by the host's panel widget. Methods take `&self`; the host
/// is expected to use interior mutability, matching the single-threaded
/// ownership of the views it displays.
pub trait ScrollContainer {
    /// Currently visible rectangle
    fn viewport(&self) -> ScrollViewport;

    /// Scroll so that `top` is the first visible content row
    fn scroll_to(&self, top: f32);

    /// Total height of the laid-out content
    fn set_content_height(&self, height: f32);
}

/// Plain in-memory scroll container
///
/// Clamps scroll offsets to the content the way a native scroll area does.
/// Useful for headless hosts and tests.
#[derive(Debug, Default)]
pub struct ScrollArea {
    top: Cell<f32>,
    left: Cell<f32>,
    width: Cell<f32>,
    height: Cell<f32>,
    content_height: Cell<f32>,
}

impl ScrollArea {
    /// Create a scroll area with the given visible size
    pub fn new(width: f32, height: f32) -> Self {
        let area = Self::default();
        area.width.set(width);
        area.height.set(height);
        area
    }

    /// Resize the visible area, re-clamping the offset
    pub fn resize(&self, width: f32, height: f32) {
        self.width.set(width);
        self.height.set(height);
        self.scroll_to(self.top.get());
    }

    /// Set the horizontal offset
    pub fn scroll_left_to(&self, left: f32) {
        self.left.set(left.max(0.0));
    }

    /// Largest valid vertical offset
    pub fn max_scroll_top(&self) -> f32 {
        (self.content_height.get() - self.height.get()).max(0.0)
    }

    pub fn content_height(&self) -> f32 {
        self.content_height.get()
    }
}

impl ScrollContainer for ScrollArea {
    fn viewport(&self) -> ScrollViewport {
        ScrollViewport::new(
            self.top.get(),
            self.left.get(),
            self.width.get(),
            self.height.get(),
        )
    }

    fn scroll_to(&self, top: f32) {
        self.top.set(top.clamp(0.0, self.max_scroll_top()));
    }

    fn set_content_height(&self, height: f32) {
        self.content_height.set(height.max(0.0));
        self.scroll_to(self.top.get());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_direction_is_down_right() {
        let watcher = ScrollWatcher::new();
        let state = watcher.state();
        assert!(state.down);
        assert!(state.right);
    }

    #[test]
    fn test_direction_follows_offset() {
        let mut watcher = ScrollWatcher::new();

        assert!(watcher.update(0.0, 120.0).down);
        assert!(!watcher.update(0.0, 40.0).down);

        // Unchanged vertical offset keeps the previous direction
        let state = watcher.update(30.0, 40.0);
        assert!(!state.down);
        assert!(state.right);
        assert_eq!(state.last_y, 40.0);
    }

    #[test]
    fn test_reset() {
        let mut watcher = ScrollWatcher::new();
        watcher.update(0.0, 100.0);
        watcher.update(0.0, 10.0);

        watcher.reset();
        assert_eq!(watcher.state(), ScrollState::default());
    }

    #[test]
    fn test_scroll_area_clamps_to_content() {
        let area = ScrollArea::new(120.0, 300.0);
        area.set_content_height(1000.0);

        area.scroll_to(-19.0);
        assert_eq!(area.viewport().top, 0.0);

        area.scroll_to(5000.0);
        assert_eq!(area.viewport().top, 700.0);

        area.scroll_to(250.0);
        assert_eq!(area.viewport().top, 250.0);
    }

    #[test]
    fn test_scroll_area_shrinking_content_reclamps() {
        let area = ScrollArea::new(120.0, 300.0);
        area.set_content_height(1000.0);
        area.scroll_to(600.0);

        area.set_content_height(500.0);
        assert_eq!(area.viewport().top, 200.0);

        area.set_content_height(0.0);
        assert_eq!(area.viewport().top, 0.0);
    }
}

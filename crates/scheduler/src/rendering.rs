//! Rendering states and the contracts between views, viewers and the queue
//!
//! A viewer (page list or thumbnail panel) owns its views and knows which are
//! visible; the scheduler decides which of them to render next. The cycle
//! between the two is broken with `ForceRendering`, which the queue holds
//! weakly.

use crate::visibility::VisibleViews;
use futures::future::LocalBoxFuture;
use std::fmt;
use std::rc::Rc;

/// Rendering lifecycle of a single view
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum RenderingState {
    /// Nothing rendered, not scheduled
    #[default]
    Initial,

    /// Picked by the scheduler, waiting for its content to load
    Queued,

    /// Drawing in progress
    Running,

    /// Drawn (successfully or not)
    Finished,
}

impl RenderingState {
    /// Whether a view in this state is a candidate for rendering
    pub fn needs_rendering(self) -> bool {
        self == RenderingState::Initial
    }
}

/// How a completed `draw()` ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrawOutcome {
    /// The view reached `Finished`
    Finished,

    /// The render was cancelled while in flight; the view state is untouched
    Cancelled,
}

/// A view the queue can render
pub trait RenderableView {
    type Error: fmt::Display;

    /// Identifier unique across every view sharing the queue,
    /// e.g. `"thumbnail3"` vs `"page3"`
    fn rendering_id(&self) -> String;

    fn rendering_state(&self) -> RenderingState;

    /// Draw the view
    ///
    /// Called only in `Initial` or `Queued` state. Resolves once the view
    /// has left `Running`.
    fn draw(self: Rc<Self>) -> LocalBoxFuture<'static, Result<DrawOutcome, Self::Error>>;

    /// Undo the effects of a `draw` call whose future will never be polled
    fn abandon_draw(&self) {}
}

/// A viewer that can be asked to dispatch its next render
pub trait ForceRendering {
    /// Dispatch the highest priority render, if any
    ///
    /// Returns `true` when a render was dispatched.
    fn force_rendering(&self) -> bool;
}

/// Render prioritization as seen by a viewer
pub trait RenderScheduler<V: RenderableView> {
    /// Ask registered viewers to dispatch their next render
    ///
    /// Fire and forget: the work itself runs on the spawner.
    fn render_highest_priority(&self);

    /// Pick the single view to render next
    ///
    /// `visible` must have been computed over `views`.
    fn get_highest_priority(
        &self,
        visible: &VisibleViews,
        views: &[Rc<V>],
        scrolled_down: bool,
    ) -> Option<Rc<V>>;

    /// Start rendering `view`
    ///
    /// Returns `false` when the view was already finished.
    fn render_view(&self, view: &Rc<V>) -> bool;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_initial_needs_rendering() {
        assert!(RenderingState::Initial.needs_rendering());
        assert!(!RenderingState::Queued.needs_rendering());
        assert!(!RenderingState::Running.needs_rendering());
        assert!(!RenderingState::Finished.needs_rendering());
    }

    #[test]
    fn test_default_state() {
        assert_eq!(RenderingState::default(), RenderingState::Initial);
    }
}

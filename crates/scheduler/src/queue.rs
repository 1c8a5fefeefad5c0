//! Rendering queue
//!
//! Decides which view renders next and drives renders one dispatch at a time.
//! Each finished draw asks the registered viewers for their next render, so a
//! single scroll notification keeps the pipeline busy until every visible
//! view is drawn, after which the idle callback fires.

use crate::rendering::{DrawOutcome, ForceRendering, RenderScheduler, RenderableView, RenderingState};
use crate::visibility::VisibleViews;
use futures::task::{LocalSpawn, LocalSpawnExt};
use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

/// Rendering queue statistics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenderStats {
    /// Draws handed to the spawner
    pub dispatched: u64,

    /// Draws that finished successfully
    pub completed: u64,

    /// Draws that reported an error
    pub failed: u64,

    /// Draws cancelled while in flight
    pub cancelled: u64,
}

impl RenderStats {
    /// Number of dispatched draws that have not resolved yet
    pub fn in_flight(&self) -> u64 {
        self.dispatched - self.completed - self.failed - self.cancelled
    }
}

/// Priority rendering queue shared by the page viewer and the thumbnail panel
///
/// Single-threaded: draws run as local tasks on the spawner given at
/// construction.
///
/// # Example
///
/// ```
/// use futures::executor::LocalPool;
/// use thumbstrip_scheduler::RenderingQueue;
///
/// let pool = LocalPool::new();
/// let queue = RenderingQueue::new(pool.spawner());
///
/// queue.set_thumbnail_view_enabled(true);
/// // Nothing registered yet: the queue goes straight to idle.
/// queue.render_highest_priority();
/// assert_eq!(queue.stats().dispatched, 0);
/// ```
pub struct RenderingQueue {
    this: Weak<RenderingQueue>,
    spawner: Box<dyn LocalSpawn>,
    page_viewer: RefCell<Option<Weak<dyn ForceRendering>>>,
    thumbnail_viewer: RefCell<Option<Weak<dyn ForceRendering>>>,
    thumbnail_view_enabled: Cell<bool>,
    printing: Cell<bool>,
    highest_priority: RefCell<Option<String>>,
    on_idle: RefCell<Option<Rc<dyn Fn()>>>,
    stats: Cell<RenderStats>,
}

impl RenderingQueue {
    /// Create a queue that spawns draws on `spawner`
    pub fn new<S>(spawner: S) -> Rc<Self>
    where
        S: LocalSpawn + 'static,
    {
        Rc::new_cyclic(|this| Self {
            this: this.clone(),
            spawner: Box::new(spawner),
            page_viewer: RefCell::new(None),
            thumbnail_viewer: RefCell::new(None),
            thumbnail_view_enabled: Cell::new(false),
            printing: Cell::new(false),
            highest_priority: RefCell::new(None),
            on_idle: RefCell::new(None),
            stats: Cell::new(RenderStats::default()),
        })
    }

    /// Register the main page viewer; it always takes precedence
    pub fn set_page_viewer(&self, viewer: Weak<dyn ForceRendering>) {
        *self.page_viewer.borrow_mut() = Some(viewer);
    }

    /// Register the thumbnail panel
    pub fn set_thumbnail_viewer(&self, viewer: Weak<dyn ForceRendering>) {
        *self.thumbnail_viewer.borrow_mut() = Some(viewer);
    }

    /// Enable or disable thumbnail rendering (e.g. sidebar shown or hidden)
    pub fn set_thumbnail_view_enabled(&self, enabled: bool) {
        self.thumbnail_view_enabled.set(enabled);
    }

    pub fn is_thumbnail_view_enabled(&self) -> bool {
        self.thumbnail_view_enabled.get()
    }

    /// Suppress the idle callback while a print job owns rendering
    pub fn set_printing(&self, printing: bool) {
        self.printing.set(printing);
    }

    /// Callback invoked when no registered viewer has anything to render
    pub fn set_on_idle<F>(&self, on_idle: F)
    where
        F: Fn() + 'static,
    {
        *self.on_idle.borrow_mut() = Some(Rc::new(on_idle));
    }

    /// Rendering id of the view most recently chosen for rendering
    pub fn highest_priority(&self) -> Option<String> {
        self.highest_priority.borrow().clone()
    }

    /// Check whether `view` is the one most recently chosen for rendering
    pub fn is_highest_priority<V: RenderableView>(&self, view: &V) -> bool {
        self.highest_priority.borrow().as_deref() == Some(view.rendering_id().as_str())
    }

    pub fn stats(&self) -> RenderStats {
        self.stats.get()
    }

    /// Ask the page viewer, then the thumbnail panel, for a render
    pub fn render_highest_priority(&self) {
        let page_viewer = self.page_viewer.borrow().as_ref().and_then(Weak::upgrade);
        if let Some(viewer) = page_viewer {
            if viewer.force_rendering() {
                return;
            }
        }

        if self.thumbnail_view_enabled.get() {
            let thumbnail_viewer = self
                .thumbnail_viewer
                .borrow()
                .as_ref()
                .and_then(Weak::upgrade);
            if let Some(viewer) = thumbnail_viewer {
                if viewer.force_rendering() {
                    return;
                }
            }
        }

        if self.printing.get() {
            return;
        }

        let on_idle = self.on_idle.borrow().clone();
        if let Some(on_idle) = on_idle {
            log::debug!("rendering queue idle");
            on_idle();
        }
    }

    fn record<F>(&self, update: F)
    where
        F: FnOnce(&mut RenderStats),
    {
        let mut stats = self.stats.get();
        update(&mut stats);
        self.stats.set(stats);
    }
}

impl<V> RenderScheduler<V> for RenderingQueue
where
    V: RenderableView + 'static,
{
    fn render_highest_priority(&self) {
        RenderingQueue::render_highest_priority(self);
    }

    fn get_highest_priority(
        &self,
        visible: &VisibleViews,
        views: &[Rc<V>],
        scrolled_down: bool,
    ) -> Option<Rc<V>> {
        let first = visible.first()?;
        let last = visible.last()?;

        let candidate = visible
            .views
            .iter()
            .filter_map(|visible_view| views.get(visible_view.index))
            .find(|view| view.rendering_state().needs_rendering());
        if let Some(view) = candidate {
            return Some(Rc::clone(view));
        }

        // Everything on screen is handled; prefetch one view in the
        // scroll direction.
        let neighbor = if scrolled_down {
            views.get(last.index + 1)
        } else {
            first.index.checked_sub(1).and_then(|index| views.get(index))
        };

        neighbor
            .filter(|view| view.rendering_state().needs_rendering())
            .cloned()
    }

    fn render_view(&self, view: &Rc<V>) -> bool {
        match view.rendering_state() {
            RenderingState::Finished => false,
            RenderingState::Running => {
                *self.highest_priority.borrow_mut() = Some(view.rendering_id());
                true
            }
            RenderingState::Initial | RenderingState::Queued => {
                let rendering_id = view.rendering_id();
                *self.highest_priority.borrow_mut() = Some(rendering_id.clone());

                let queue = self.this.clone();
                let draw = Rc::clone(view).draw();
                let task = async move {
                    let result = draw.await;
                    let Some(queue) = queue.upgrade() else {
                        return;
                    };

                    match result {
                        Ok(DrawOutcome::Finished) => queue.record(|s| s.completed += 1),
                        Ok(DrawOutcome::Cancelled) => {
                            log::debug!("render of {rendering_id} cancelled");
                            queue.record(|s| s.cancelled += 1);
                        }
                        Err(err) => {
                            log::warn!("render of {rendering_id} failed: {err}");
                            queue.record(|s| s.failed += 1);
                        }
                    }

                    queue.render_highest_priority();
                };

                match self.spawner.spawn_local(task) {
                    Ok(()) => {
                        self.record(|s| s.dispatched += 1);
                        true
                    }
                    Err(err) => {
                        log::warn!("failed to spawn render of {}: {err}", view.rendering_id());
                        view.abandon_draw();
                        false
                    }
                }
            }
        }
    }
}

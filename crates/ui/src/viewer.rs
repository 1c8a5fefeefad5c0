//! Thumbnail panel
//!
//! Owns one `ThumbnailView` per page of the current document, lays them out
//! as a vertical strip inside the scroll container, and cooperates with the
//! rendering queue so only what is on screen (plus one thumbnail of prefetch)
//! gets drawn. Pages are fetched lazily and each page is fetched at most once
//! at a time.

use crate::config::ThumbnailViewerConfig;
use crate::document::{PdfDocument, PdfPage};
use crate::error::{ThumbnailError, ThumbnailResult};
use crate::link::LinkService;
use crate::page_cache::PageLoadCache;
use crate::scratch::ScratchSurface;
use crate::thumbnail::{ThumbnailView, ThumbnailViewOptions};
use crate::viewport::normalize_rotation;
use futures::future::{self, FutureExt, LocalBoxFuture, Shared};
use futures::task::{LocalSpawn, LocalSpawnExt};
use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};
use thumbstrip_scheduler::{
    get_visible_elements, ElementBounds, ForceRendering, RenderScheduler, RenderingState,
    ScrollContainer, ScrollWatcher, VisibleElement, VisibleViews,
};

/// Shared handle to an in-flight page load
type PageLoad = Shared<LocalBoxFuture<'static, ThumbnailResult<Rc<dyn PdfPage>>>>;

/// Collaborators and settings for a `ThumbnailViewer`
pub struct ThumbnailViewerOptions {
    /// Scrollable region hosting the strip
    pub container: Rc<dyn ScrollContainer>,

    pub rendering_queue: Rc<dyn RenderScheduler<ThumbnailView>>,

    pub link_service: Rc<dyn LinkService>,

    /// Runs page loads dispatched by `force_rendering`
    pub spawner: Box<dyn LocalSpawn>,

    pub config: ThumbnailViewerConfig,
}

/// Scrollable strip of page thumbnails
pub struct ThumbnailViewer {
    this: Weak<ThumbnailViewer>,
    container: Rc<dyn ScrollContainer>,
    rendering_queue: Rc<dyn RenderScheduler<ThumbnailView>>,
    link_service: Rc<dyn LinkService>,
    spawner: Box<dyn LocalSpawn>,
    config: ThumbnailViewerConfig,
    scratch: Rc<ScratchSurface>,

    document: RefCell<Option<Rc<dyn PdfDocument>>>,
    thumbnails: RefCell<Vec<Rc<ThumbnailView>>>,
    page_labels: RefCell<Option<Vec<String>>>,
    rotation: Cell<u32>,
    page_requests: RefCell<PageLoadCache<PageLoad>>,
    scroll: RefCell<ScrollWatcher>,
    selected_page: Cell<Option<u32>>,
}

impl ThumbnailViewer {
    pub fn new(options: ThumbnailViewerOptions) -> Rc<Self> {
        let ThumbnailViewerOptions {
            container,
            rendering_queue,
            link_service,
            spawner,
            config,
        } = options;

        Rc::new_cyclic(|this| Self {
            this: this.clone(),
            container,
            rendering_queue,
            link_service,
            spawner,
            config,
            scratch: Rc::new(ScratchSurface::new()),
            document: RefCell::new(None),
            thumbnails: RefCell::new(Vec::new()),
            page_labels: RefCell::new(None),
            rotation: Cell::new(0),
            page_requests: RefCell::new(PageLoadCache::new()),
            scroll: RefCell::new(ScrollWatcher::new()),
            selected_page: Cell::new(None),
        })
    }

    pub fn config(&self) -> &ThumbnailViewerConfig {
        &self.config
    }

    pub fn document(&self) -> Option<Rc<dyn PdfDocument>> {
        self.document.borrow().clone()
    }

    /// Number of thumbnails currently shown
    pub fn len(&self) -> usize {
        self.thumbnails.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.thumbnails.borrow().is_empty()
    }

    /// Thumbnail at 0-based `index`
    pub fn thumbnail(&self, index: usize) -> Option<Rc<ThumbnailView>> {
        self.thumbnails.borrow().get(index).cloned()
    }

    /// Snapshot of every thumbnail, in page order
    pub fn thumbnails(&self) -> Vec<Rc<ThumbnailView>> {
        self.thumbnails.borrow().clone()
    }

    fn thumbnail_for_page(&self, page_number: u32) -> Option<Rc<ThumbnailView>> {
        let index = page_number.checked_sub(1)? as usize;
        self.thumbnail(index)
    }

    /// Whether `thumbnail` belongs to the current document's strip
    fn owns(&self, thumbnail: &Rc<ThumbnailView>) -> bool {
        self.thumbnail_for_page(thumbnail.id())
            .is_some_and(|current| Rc::ptr_eq(&current, thumbnail))
    }

    /// Replace the document shown by the panel
    ///
    /// Thumbnails for every page are created once page 1 has loaded, sized
    /// from it. Passing `None` just clears the panel.
    ///
    /// # Errors
    /// Returns the page load error when page 1 cannot be fetched. The document
    /// stays set and the panel stays empty.
    pub async fn set_document(&self, document: Option<Rc<dyn PdfDocument>>) -> ThumbnailResult<()> {
        if self.document.borrow().is_some() {
            self.cancel_rendering();
            self.reset_view();
        }

        *self.document.borrow_mut() = document.clone();
        let Some(document) = document else {
            return Ok(());
        };

        let page_count = document.num_pages();
        if page_count == 0 {
            log::debug!("document has no pages");
            return Ok(());
        }

        let generation = self.page_requests.borrow().generation();
        let result = document.get_page(1).await;
        if !self.page_requests.borrow().is_current(generation) {
            log::debug!("document replaced while loading its first page");
            return Ok(());
        }

        let first_page = match result {
            Ok(page) => page,
            Err(err) => {
                log::error!("unable to initialize thumbnail viewer: {err}");
                return Err(err);
            }
        };

        let default_viewport = first_page.get_viewport(1.0, first_page.rotate());
        let rotation = self.rotation.get();
        let labels = self.page_labels.borrow().clone();

        let thumbnails: Vec<Rc<ThumbnailView>> = (1..=page_count)
            .map(|page_number| {
                let thumbnail = ThumbnailView::new(ThumbnailViewOptions {
                    id: page_number,
                    default_viewport: default_viewport.clone(),
                    link_service: Rc::clone(&self.link_service),
                    scratch: Rc::clone(&self.scratch),
                    config: self.config.clone(),
                });
                if rotation != 0 {
                    thumbnail.update(rotation);
                }
                let label = labels
                    .as_ref()
                    .and_then(|labels| labels.get(page_number as usize - 1))
                    .cloned();
                thumbnail.set_page_label(label);
                Rc::new(thumbnail)
            })
            .collect();

        log::info!("created {page_count} thumbnails");
        *self.thumbnails.borrow_mut() = thumbnails;
        self.layout();
        Ok(())
    }

    fn reset_view(&self) {
        self.thumbnails.borrow_mut().clear();
        self.page_labels.borrow_mut().take();
        self.rotation.set(0);
        let generation = self.page_requests.borrow_mut().reset();
        self.scroll.borrow_mut().reset();
        self.selected_page.set(None);
        self.container.set_content_height(0.0);
        log::debug!("thumbnail view reset, generation {generation}");
    }

    fn cancel_rendering(&self) {
        for thumbnail in self.thumbnails.borrow().iter() {
            thumbnail.cancel_rendering();
        }
    }

    /// Position every thumbnail in a vertical stack
    fn layout(&self) {
        let spacing = self.config.spacing;
        let mut y = spacing;
        let thumbnails = self.thumbnails.borrow();
        for thumbnail in thumbnails.iter() {
            let (width, height) = thumbnail.box_size();
            thumbnail.set_bounds(ElementBounds::new(0.0, y, width, height));
            y += height + spacing;
        }

        let content_height = if thumbnails.is_empty() { 0.0 } else { y };
        drop(thumbnails);
        self.container.set_content_height(content_height);
    }

    /// Thumbnails intersecting the container's viewport, in layout order
    pub fn visible_thumbs(&self) -> VisibleViews {
        let viewport = self.container.viewport();
        let thumbnails = self.thumbnails.borrow();
        get_visible_elements(&viewport, thumbnails.as_slice(), false)
    }

    /// Record the scroll position and let the queue pick the next render
    pub fn handle_scroll(&self) {
        let viewport = self.container.viewport();
        let state = self.scroll.borrow_mut().update(viewport.left, viewport.top);
        log::trace!("thumbnail panel scrolled, down: {}", state.down);
        self.rendering_queue.render_highest_priority();
    }

    /// Page whose thumbnail is highlighted
    pub fn selected_page(&self) -> Option<u32> {
        self.selected_page.get()
    }

    /// Highlight `page_number` and scroll it into view when it sits at or
    /// beyond the edges of the visible range
    ///
    /// Unknown page numbers only clear the highlight.
    pub fn scroll_thumbnail_into_view(&self, page_number: u32) {
        if let Some(previous) = self.selected_page.take() {
            if let Some(thumbnail) = self.thumbnail_for_page(previous) {
                thumbnail.set_selected(false);
            }
        }

        let Some(thumbnail) = self.thumbnail_for_page(page_number) else {
            log::debug!("no thumbnail for page {page_number}");
            return;
        };
        thumbnail.set_selected(true);
        self.selected_page.set(Some(page_number));

        let visible = self.visible_thumbs();
        let (Some(first), Some(last)) = (visible.first(), visible.last()) else {
            return;
        };
        let first = first.id;
        let last = if visible.len() > 1 { last.id } else { first };

        if page_number <= first || page_number >= last {
            let top = thumbnail.bounds().y + self.config.scroll_margin;
            self.container.scroll_to(top);
        }
    }

    pub fn rotation(&self) -> u32 {
        self.rotation.get()
    }

    /// Rotate every thumbnail
    ///
    /// # Errors
    /// Returns `InvalidRotation` for anything but a multiple of 90; nothing
    /// changes in that case.
    pub fn set_rotation(&self, degrees: i32) -> ThumbnailResult<()> {
        let rotation = normalize_rotation(degrees)?;
        self.rotation.set(rotation);

        for thumbnail in self.thumbnails() {
            thumbnail.update(rotation);
        }
        self.layout();
        Ok(())
    }

    /// Labels shown in thumbnail titles, one per page
    pub fn page_labels(&self) -> Option<Vec<String>> {
        self.page_labels.borrow().clone()
    }

    /// Set per-page labels, or clear them with `None`
    ///
    /// Ignored without a document. A list whose length differs from the page
    /// count is rejected and clears the labels.
    pub fn set_page_labels(&self, labels: Option<&[String]>) {
        let Some(document) = self.document() else {
            return;
        };

        let page_count = document.num_pages() as usize;
        let labels = match labels {
            Some(labels) if labels.len() == page_count => Some(labels.to_vec()),
            Some(labels) => {
                log::error!(
                    "thumbnail viewer: invalid page labels, got {} for {page_count} pages",
                    labels.len()
                );
                None
            }
            None => None,
        };

        for (index, thumbnail) in self.thumbnails().iter().enumerate() {
            let label = labels.as_ref().and_then(|labels| labels.get(index)).cloned();
            thumbnail.set_page_label(label);
        }
        *self.page_labels.borrow_mut() = labels;
    }

    /// Resolve the page behind `thumbnail`, fetching it if needed
    ///
    /// Concurrent calls for the same page share one fetch. A successful fetch
    /// attaches the page to the current thumbnail for that page unless the
    /// document was replaced in the meantime. Thumbnails left over from a
    /// previous document are refused.
    pub fn ensure_page_loaded(
        &self,
        thumbnail: &Rc<ThumbnailView>,
    ) -> LocalBoxFuture<'static, ThumbnailResult<Rc<dyn PdfPage>>> {
        if let Some(page) = thumbnail.pdf_page() {
            return future::ready(Ok(page)).boxed_local();
        }

        let page_number = thumbnail.id();
        if !self.owns(thumbnail) {
            log::debug!("thumbnail {page_number} belongs to a replaced document");
            return future::ready(Err(ThumbnailError::page_load(
                page_number,
                "thumbnail belongs to a replaced document",
            )))
            .boxed_local();
        }
        if let Some(pending) = self.page_requests.borrow().get(page_number) {
            return pending.boxed_local();
        }

        let Some(document) = self.document() else {
            return future::ready(Err(ThumbnailError::page_load(page_number, "no document")))
                .boxed_local();
        };

        let generation = self.page_requests.borrow().generation();
        let fetch = document.get_page(page_number);
        let viewer = self.this.clone();
        let load: PageLoad = async move {
            let result = fetch.await;
            if let Some(viewer) = viewer.upgrade() {
                viewer.finish_page_load(generation, page_number, &result);
            }
            result
        }
        .boxed_local()
        .shared();

        self.page_requests.borrow_mut().insert(page_number, load.clone());
        load.boxed_local()
    }

    fn finish_page_load(
        &self,
        generation: u64,
        page_number: u32,
        result: &ThumbnailResult<Rc<dyn PdfPage>>,
    ) {
        if !self.page_requests.borrow_mut().complete(page_number, generation) {
            log::debug!("discarding page {page_number} loaded for a replaced document");
            return;
        }

        let page = match result {
            Ok(page) => Rc::clone(page),
            Err(err) => {
                log::error!("unable to get page {page_number} for thumbnail: {err}");
                return;
            }
        };
        let Some(thumbnail) = self.thumbnail_for_page(page_number) else {
            log::debug!("no thumbnail for loaded page {page_number}");
            return;
        };

        let was_queued = thumbnail.state() == RenderingState::Queued;
        let previous_size = thumbnail.canvas_size();
        thumbnail.set_pdf_page(page);
        if was_queued {
            thumbnail.mark_queued();
        }
        if thumbnail.canvas_size() != previous_size {
            self.layout();
        }
    }

    /// Scratch surface shared by every thumbnail of this panel
    pub fn scratch_surface(&self) -> &ScratchSurface {
        &self.scratch
    }

    /// Drop cached render resources
    pub fn cleanup(&self) {
        if self.scratch.release() {
            log::debug!("released thumbnail scratch surface");
        }
    }
}

impl ForceRendering for ThumbnailViewer {
    fn force_rendering(&self) -> bool {
        let visible = self.visible_thumbs();
        let thumbnails = self.thumbnails();
        let scrolled_down = self.scroll.borrow().state().down;

        let Some(thumbnail) =
            self.rendering_queue
                .get_highest_priority(&visible, &thumbnails, scrolled_down)
        else {
            return false;
        };

        log::debug!("dispatching thumbnail {}", thumbnail.id());
        thumbnail.mark_queued();
        let load = self.ensure_page_loaded(&thumbnail);
        let generation = self.page_requests.borrow().generation();
        let viewer = self.this.clone();
        let queue = Rc::clone(&self.rendering_queue);
        let target = Rc::clone(&thumbnail);

        let task = async move {
            let result = load.await;
            let Some(viewer) = viewer.upgrade() else {
                return;
            };
            if !viewer.page_requests.borrow().is_current(generation) {
                log::debug!("dropping render of thumbnail {} for a replaced document", target.id());
                return;
            }

            match result {
                Ok(_) => {
                    if !queue.render_view(&target) {
                        target.revert_queued();
                    }
                }
                Err(err) => {
                    log::warn!("thumbnail {} not rendered: {err}", target.id());
                    target.revert_queued();
                }
            }
        };

        if let Err(err) = self.spawner.spawn_local(task) {
            log::warn!("failed to spawn thumbnail {} render: {err}", thumbnail.id());
            thumbnail.revert_queued();
            return false;
        }
        true
    }
}

//! A single page thumbnail
//!
//! Thumbnails are created for every page as soon as a document is set, all
//! sized from the first page. The real page is attached lazily when the
//! thumbnail is first about to be rendered, which may change its size.
//! Drawing rasterizes the page at an oversampled scale, reduces it to the
//! canvas size and optionally PNG-encodes the result.

use crate::config::ThumbnailViewerConfig;
use crate::document::PdfPage;
use crate::error::{ThumbnailError, ThumbnailResult};
use crate::link::LinkService;
use crate::scratch::{reduce_image, ScratchSurface};
use crate::viewport::PageViewport;
use futures::future::{self, FutureExt, LocalBoxFuture};
use image::{ImageFormat, RgbaImage};
use std::cell::{Cell, RefCell};
use std::fmt;
use std::io::Cursor;
use std::rc::Rc;
use thumbstrip_scheduler::{
    CancellationToken, DrawOutcome, ElementBounds, RenderableView, RenderingState, VisibleElement,
};

/// Finished thumbnail content
#[derive(Clone, PartialEq)]
pub enum ThumbnailImage {
    /// Raw reduced bitmap, kept when image conversion is disabled
    Canvas(RgbaImage),

    /// PNG-encoded bitmap
    Png { width: u32, height: u32, data: Vec<u8> },
}

impl ThumbnailImage {
    pub fn dimensions(&self) -> (u32, u32) {
        match self {
            ThumbnailImage::Canvas(bitmap) => bitmap.dimensions(),
            ThumbnailImage::Png { width, height, .. } => (*width, *height),
        }
    }

    pub fn is_png(&self) -> bool {
        matches!(self, ThumbnailImage::Png { .. })
    }
}

impl fmt::Debug for ThumbnailImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (width, height) = self.dimensions();
        match self {
            ThumbnailImage::Canvas(_) => write!(f, "Canvas({width}x{height})"),
            ThumbnailImage::Png { data, .. } => {
                write!(f, "Png({width}x{height}, {} bytes)", data.len())
            }
        }
    }
}

/// Construction parameters for a thumbnail
pub struct ThumbnailViewOptions {
    /// 1-based page number
    pub id: u32,

    /// Viewport of the first page, used until the real page is attached
    pub default_viewport: PageViewport,

    pub link_service: Rc<dyn LinkService>,

    pub scratch: Rc<ScratchSurface>,

    pub config: ThumbnailViewerConfig,
}

/// Thumbnail of one page
pub struct ThumbnailView {
    id: u32,
    link_service: Rc<dyn LinkService>,
    scratch: Rc<ScratchSurface>,
    config: ThumbnailViewerConfig,

    pdf_page: RefCell<Option<Rc<dyn PdfPage>>>,
    page_label: RefCell<Option<String>>,

    /// Rotation requested by the viewer
    rotation: Cell<u32>,

    /// Intrinsic rotation of the page
    pdf_page_rotate: Cell<u32>,

    viewport: RefCell<PageViewport>,
    rendering_state: Cell<RenderingState>,
    render_token: RefCell<Option<CancellationToken>>,
    image: RefCell<Option<ThumbnailImage>>,
    selected: Cell<bool>,
    bounds: Cell<ElementBounds>,
}

impl ThumbnailView {
    pub fn new(options: ThumbnailViewOptions) -> Self {
        let ThumbnailViewOptions {
            id,
            default_viewport,
            link_service,
            scratch,
            config,
        } = options;

        Self {
            id,
            link_service,
            scratch,
            config,
            pdf_page: RefCell::new(None),
            page_label: RefCell::new(None),
            rotation: Cell::new(0),
            pdf_page_rotate: Cell::new(default_viewport.rotation),
            viewport: RefCell::new(default_viewport),
            rendering_state: Cell::new(RenderingState::Initial),
            render_token: RefCell::new(None),
            image: RefCell::new(None),
            selected: Cell::new(false),
            bounds: Cell::new(ElementBounds::default()),
        }
    }

    /// 1-based page number
    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn pdf_page(&self) -> Option<Rc<dyn PdfPage>> {
        self.pdf_page.borrow().clone()
    }

    pub fn viewport(&self) -> PageViewport {
        self.viewport.borrow().clone()
    }

    /// Rotation last applied through `update`
    pub fn rotation(&self) -> u32 {
        self.rotation.get()
    }

    pub fn state(&self) -> RenderingState {
        self.rendering_state.get()
    }

    /// Canvas size in pixels: configured width, height from the page ratio
    pub fn canvas_size(&self) -> (u32, u32) {
        let width = self.config.thumbnail_width;
        let ratio = self.viewport.borrow().ratio();
        let height = ((width as f32 / ratio).floor() as u32).max(1);
        (width, height)
    }

    /// Size of the laid out box, canvas plus selection ring
    pub fn box_size(&self) -> (f32, f32) {
        let (width, height) = self.canvas_size();
        let ring = 2.0 * self.config.ring_padding;
        (width as f32 + ring, height as f32 + ring)
    }

    /// Canvas pixels per viewport unit
    pub fn scale(&self) -> f32 {
        let viewport_width = self.viewport.borrow().width;
        if viewport_width > 0.0 {
            self.config.thumbnail_width as f32 / viewport_width
        } else {
            1.0
        }
    }

    fn total_rotation(&self) -> u32 {
        (self.rotation.get() + self.pdf_page_rotate.get()) % 360
    }

    /// Attach the loaded page and reset to its geometry
    pub fn set_pdf_page(&self, page: Rc<dyn PdfPage>) {
        self.pdf_page_rotate.set(page.rotate());
        let viewport = page.get_viewport(1.0, self.total_rotation());
        *self.viewport.borrow_mut() = viewport;
        *self.pdf_page.borrow_mut() = Some(page);
        self.reset();
    }

    /// Apply the viewer rotation (0, 90, 180 or 270) and reset
    pub fn update(&self, rotation: u32) {
        log::trace!("thumbnail {} rotated to {rotation}", self.id);
        self.rotation.set(rotation % 360);
        let viewport = self
            .viewport
            .borrow()
            .clone_with(Some(1.0), Some(self.total_rotation()));
        *self.viewport.borrow_mut() = viewport;
        self.reset();
    }

    /// Discard any drawn content and return to `Initial`
    pub fn reset(&self) {
        self.cancel_rendering();
        self.rendering_state.set(RenderingState::Initial);
        self.image.borrow_mut().take();
    }

    /// Cancel an in-flight draw; its result will be discarded
    pub fn cancel_rendering(&self) {
        if let Some(token) = self.render_token.borrow_mut().take() {
            token.cancel();
        }
    }

    /// Move from `Initial` to `Queued`
    ///
    /// Returns `false` if the thumbnail was in any other state.
    pub fn mark_queued(&self) -> bool {
        if self.rendering_state.get() != RenderingState::Initial {
            return false;
        }
        self.rendering_state.set(RenderingState::Queued);
        true
    }

    /// Undo `mark_queued` after the page failed to load
    pub fn revert_queued(&self) {
        if self.rendering_state.get() == RenderingState::Queued {
            self.rendering_state.set(RenderingState::Initial);
        }
    }

    pub fn page_label(&self) -> Option<String> {
        self.page_label.borrow().clone()
    }

    pub fn set_page_label(&self, label: Option<String>) {
        *self.page_label.borrow_mut() = label;
    }

    /// Accessible title, e.g. `"Page iv"`
    pub fn title(&self) -> String {
        match self.page_label.borrow().as_deref() {
            Some(label) => format!("Page {label}"),
            None => format!("Page {}", self.id),
        }
    }

    /// Anchor link for this page
    pub fn anchor_url(&self) -> String {
        self.link_service.anchor_url(&format!("#page={}", self.id))
    }

    /// Navigate the main view to this page
    pub fn activate(&self) {
        log::debug!("thumbnail {} activated", self.id);
        self.link_service.set_page(self.id);
    }

    pub fn is_selected(&self) -> bool {
        self.selected.get()
    }

    pub fn set_selected(&self, selected: bool) {
        self.selected.set(selected);
    }

    pub fn set_bounds(&self, bounds: ElementBounds) {
        self.bounds.set(bounds);
    }

    pub fn image(&self) -> Option<ThumbnailImage> {
        self.image.borrow().clone()
    }

    pub fn has_image(&self) -> bool {
        self.image.borrow().is_some()
    }

    /// Use an already rendered page bitmap instead of drawing
    ///
    /// Ignored unless the thumbnail is in `Initial` state.
    pub fn set_image(&self, bitmap: &RgbaImage) {
        if self.rendering_state.get() != RenderingState::Initial {
            return;
        }
        self.rendering_state.set(RenderingState::Finished);

        let (width, height) = self.canvas_size();
        let reduced = reduce_image(&self.scratch, bitmap, width, height);
        self.store_image(reduced);
    }

    fn store_image(&self, bitmap: RgbaImage) {
        let image = if self.config.disable_canvas_to_image_conversion {
            ThumbnailImage::Canvas(bitmap)
        } else {
            encode_png(self.id, bitmap)
        };
        *self.image.borrow_mut() = Some(image);
    }

    /// Clear the token of a finished draw unless a newer draw replaced it
    fn finish_token(&self, token: &CancellationToken) {
        let mut current = self.render_token.borrow_mut();
        if current.as_ref().is_some_and(|current| current.same_as(token)) {
            current.take();
        }
    }
}

fn encode_png(id: u32, bitmap: RgbaImage) -> ThumbnailImage {
    let (width, height) = bitmap.dimensions();
    let mut data = Vec::new();
    match bitmap.write_to(&mut Cursor::new(&mut data), ImageFormat::Png) {
        Ok(()) => ThumbnailImage::Png {
            width,
            height,
            data,
        },
        Err(err) => {
            log::warn!("thumbnail {id}: PNG conversion failed, keeping bitmap: {err}");
            ThumbnailImage::Canvas(bitmap)
        }
    }
}

impl RenderableView for ThumbnailView {
    type Error = ThumbnailError;

    fn rendering_id(&self) -> String {
        format!("thumbnail{}", self.id)
    }

    fn rendering_state(&self) -> RenderingState {
        self.rendering_state.get()
    }

    /// Enters `Running` before returning, so a second dispatch of the same
    /// thumbnail sees it as busy.
    fn draw(self: Rc<Self>) -> LocalBoxFuture<'static, ThumbnailResult<DrawOutcome>> {
        match self.rendering_state.get() {
            RenderingState::Initial | RenderingState::Queued => {}
            state => {
                log::error!("thumbnail {} must be in new state before drawing", self.id);
                return future::ready(Err(ThumbnailError::render(
                    self.id,
                    format!("cannot draw from {state:?} state"),
                )))
                .boxed_local();
            }
        }

        let Some(page) = self.pdf_page() else {
            self.revert_queued();
            return future::ready(Err(ThumbnailError::NoPage(self.id))).boxed_local();
        };

        self.rendering_state.set(RenderingState::Running);
        let token = CancellationToken::new();
        *self.render_token.borrow_mut() = Some(token.clone());

        let (width, height) = self.canvas_size();
        let draw_viewport = self
            .viewport
            .borrow()
            .clone_with(Some(self.scale() * self.config.output_scale), None);
        let render = page.render(&draw_viewport);

        async move {
            let rendered = render.await;
            if token.is_cancelled() {
                log::trace!("thumbnail {} render cancelled", self.id);
                return Ok(DrawOutcome::Cancelled);
            }
            self.finish_token(&token);

            // Finished even on failure; the thumbnail stays blank.
            self.rendering_state.set(RenderingState::Finished);
            let bitmap = match rendered {
                Ok(bitmap) => bitmap,
                Err(err) => return Err(err),
            };
            let reduced = reduce_image(&self.scratch, &bitmap, width, height);
            self.store_image(reduced);
            log::trace!("thumbnail {} drawn at {width}x{height}", self.id);
            Ok(DrawOutcome::Finished)
        }
        .boxed_local()
    }

    fn abandon_draw(&self) {
        if self.rendering_state.get() == RenderingState::Running {
            self.reset();
        }
    }
}

impl VisibleElement for ThumbnailView {
    fn id(&self) -> u32 {
        self.id
    }

    fn bounds(&self) -> ElementBounds {
        self.bounds.get()
    }
}

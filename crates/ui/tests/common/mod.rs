//! Shared fixtures for thumbnail viewer integration tests

#![allow(dead_code)]

use futures::channel::oneshot;
use futures::executor::LocalPool;
use futures::future::{self, FutureExt, LocalBoxFuture};
use image::{Rgba, RgbaImage};
use std::cell::{Cell, RefCell};
use std::collections::{HashMap, HashSet};
use std::rc::{Rc, Weak};
use std::sync::Once;
use thumbstrip_scheduler::{ForceRendering, RenderingQueue, ScrollArea};
use thumbstrip_ui::{
    LinkService, PageViewport, PdfDocument, PdfPage, ThumbnailError, ThumbnailResult,
    ThumbnailViewer, ThumbnailViewerConfig, ThumbnailViewerOptions,
};

pub const LETTER: [f32; 4] = [0.0, 0.0, 612.0, 792.0];
pub const LANDSCAPE: [f32; 4] = [0.0, 0.0, 792.0, 612.0];

pub struct MockPage {
    number: u32,
    view_box: [f32; 4],
    renders: Rc<Cell<u32>>,
}

impl PdfPage for MockPage {
    fn page_number(&self) -> u32 {
        self.number
    }

    fn view_box(&self) -> [f32; 4] {
        self.view_box
    }

    fn render(&self, viewport: &PageViewport) -> LocalBoxFuture<'static, ThumbnailResult<RgbaImage>> {
        self.renders.set(self.renders.get() + 1);
        let width = (viewport.width as u32).max(1);
        let height = (viewport.height as u32).max(1);
        let shade = (self.number % 255) as u8;
        future::ready(Ok(RgbaImage::from_pixel(width, height, Rgba([shade, 0, 0, 255])))).boxed_local()
    }
}

/// In-memory document with controllable page fetches
pub struct MockDocument {
    view_boxes: Vec<[f32; 4]>,
    fetches: RefCell<Vec<u32>>,
    failing: RefCell<HashSet<u32>>,
    gates: RefCell<HashMap<u32, oneshot::Receiver<()>>>,
    renders: Rc<Cell<u32>>,
}

impl MockDocument {
    pub fn new(page_count: u32) -> Rc<Self> {
        Self::with_pages(vec![LETTER; page_count as usize])
    }

    pub fn with_pages(view_boxes: Vec<[f32; 4]>) -> Rc<Self> {
        Rc::new(Self {
            view_boxes,
            fetches: RefCell::new(Vec::new()),
            failing: RefCell::new(HashSet::new()),
            gates: RefCell::new(HashMap::new()),
            renders: Rc::new(Cell::new(0)),
        })
    }

    /// Make fetches of `page_number` fail until `recover` is called
    pub fn fail(&self, page_number: u32) {
        self.failing.borrow_mut().insert(page_number);
    }

    pub fn recover(&self, page_number: u32) {
        self.failing.borrow_mut().remove(&page_number);
    }

    /// Hold the next fetch of `page_number` until the returned sender fires
    pub fn gate(&self, page_number: u32) -> oneshot::Sender<()> {
        let (sender, receiver) = oneshot::channel();
        self.gates.borrow_mut().insert(page_number, receiver);
        sender
    }

    pub fn fetch_count(&self, page_number: u32) -> usize {
        self.fetches
            .borrow()
            .iter()
            .filter(|fetched| **fetched == page_number)
            .count()
    }

    pub fn total_fetches(&self) -> usize {
        self.fetches.borrow().len()
    }

    pub fn render_count(&self) -> u32 {
        self.renders.get()
    }
}

impl PdfDocument for MockDocument {
    fn num_pages(&self) -> u32 {
        self.view_boxes.len() as u32
    }

    fn get_page(&self, page_number: u32) -> LocalBoxFuture<'static, ThumbnailResult<Rc<dyn PdfPage>>> {
        self.fetches.borrow_mut().push(page_number);

        if self.failing.borrow().contains(&page_number) {
            return future::ready(Err(ThumbnailError::page_load(page_number, "broken xref")))
                .boxed_local();
        }

        let Some(view_box) = page_number
            .checked_sub(1)
            .and_then(|index| self.view_boxes.get(index as usize))
            .copied()
        else {
            return future::ready(Err(ThumbnailError::page_load(page_number, "out of range")))
                .boxed_local();
        };

        let page: Rc<dyn PdfPage> = Rc::new(MockPage {
            number: page_number,
            view_box,
            renders: Rc::clone(&self.renders),
        });

        match self.gates.borrow_mut().remove(&page_number) {
            Some(gate) => async move {
                match gate.await {
                    Ok(()) => Ok(page),
                    Err(_) => Err(ThumbnailError::page_load(page_number, "gate dropped")),
                }
            }
            .boxed_local(),
            None => future::ready(Ok(page)).boxed_local(),
        }
    }
}

#[derive(Default)]
pub struct RecordingLinks {
    pub pages: RefCell<Vec<u32>>,
}

impl LinkService for RecordingLinks {
    fn page(&self) -> u32 {
        self.pages.borrow().last().copied().unwrap_or(1)
    }

    fn set_page(&self, page_number: u32) {
        self.pages.borrow_mut().push(page_number);
    }
}

/// A viewer wired to a real rendering queue and a local executor
pub struct Harness {
    pub pool: LocalPool,
    pub viewer: Rc<ThumbnailViewer>,
    pub queue: Rc<RenderingQueue>,
    pub container: Rc<ScrollArea>,
    pub links: Rc<RecordingLinks>,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_config(ThumbnailViewerConfig::default())
    }

    pub fn with_config(config: ThumbnailViewerConfig) -> Self {
        let pool = LocalPool::new();
        let queue = RenderingQueue::new(pool.spawner());
        let container = Rc::new(ScrollArea::new(200.0, 300.0));
        let links = Rc::new(RecordingLinks::default());

        let viewer = ThumbnailViewer::new(ThumbnailViewerOptions {
            container: container.clone(),
            rendering_queue: queue.clone(),
            link_service: links.clone(),
            spawner: Box::new(pool.spawner()),
            config,
        });

        let weak = Rc::downgrade(&viewer);
        let weak: Weak<dyn ForceRendering> = weak;
        queue.set_thumbnail_viewer(weak);
        queue.set_thumbnail_view_enabled(true);

        Self {
            pool,
            viewer,
            queue,
            container,
            links,
        }
    }

    /// Bind `document` and wait for the thumbnails to exist
    pub fn load(&mut self, document: &Rc<MockDocument>) {
        let document: Rc<dyn PdfDocument> = document.clone();
        let viewer = Rc::clone(&self.viewer);
        self.pool
            .run_until(async move { viewer.set_document(Some(document)).await })
            .expect("document should load");
    }

    pub fn run(&mut self) {
        self.pool.run_until_stalled();
    }
}

thread_local! {
    static CAPTURED: RefCell<Vec<String>> = const { RefCell::new(Vec::new()) };
}

/// Keeps thumbnail log messages per thread
struct ThreadCapture;

impl log::Log for ThreadCapture {
    fn enabled(&self, _: &log::Metadata) -> bool {
        true
    }

    fn log(&self, record: &log::Record) {
        if record.target() == "thumbstrip_ui::thumbnail" {
            CAPTURED.with(|captured| captured.borrow_mut().push(record.args().to_string()));
        }
    }

    fn flush(&self) {}
}

static CAPTURE: ThreadCapture = ThreadCapture;
static INSTALL: Once = Once::new();

/// Start capturing thumbnail log messages on this thread
pub fn capture_thumbnail_logs() {
    INSTALL.call_once(|| {
        if log::set_logger(&CAPTURE).is_ok() {
            log::set_max_level(log::LevelFilter::Trace);
        }
    });
    CAPTURED.with(|captured| captured.borrow_mut().clear());
}

/// Messages captured on this thread since `capture_thumbnail_logs`
pub fn captured_thumbnail_logs() -> Vec<String> {
    CAPTURED.with(|captured| captured.borrow().clone())
}

//! Document and page collaborators
//!
//! The panel never parses documents itself. Hosts adapt their PDF engine to
//! these traits; every operation that may block is asynchronous and returns a
//! `'static` future, so implementations should clone whatever shared handle
//! they need into the future.

use crate::error::ThumbnailResult;
use crate::viewport::PageViewport;
use futures::future::LocalBoxFuture;
use image::RgbaImage;
use std::rc::Rc;

/// An open document
pub trait PdfDocument {
    /// Number of pages
    fn num_pages(&self) -> u32;

    /// Load page `page_number` (1-based)
    fn get_page(&self, page_number: u32) -> LocalBoxFuture<'static, ThumbnailResult<Rc<dyn PdfPage>>>;
}

/// A loaded page
pub trait PdfPage {
    /// 1-based page number
    fn page_number(&self) -> u32;

    /// Page box as `[x1, y1, x2, y2]` in page units
    fn view_box(&self) -> [f32; 4];

    /// Intrinsic rotation of the page in degrees (0, 90, 180 or 270)
    fn rotate(&self) -> u32 {
        0
    }

    /// Viewport of this page at `scale` and `rotation`
    fn get_viewport(&self, scale: f32, rotation: u32) -> PageViewport {
        PageViewport::new(self.view_box(), scale, rotation)
    }

    /// Rasterize the page as described by `viewport`
    fn render(&self, viewport: &PageViewport) -> LocalBoxFuture<'static, ThumbnailResult<RgbaImage>>;
}

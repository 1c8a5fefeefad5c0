//! Shared scratch surface for thumbnail reduction
//!
//! Downscaling a full-size page bitmap to thumbnail size in one step aliases
//! badly, so reduction halves the image repeatedly on an intermediate surface.
//! That surface is large (eight times the thumbnail in each dimension) and is
//! reused by every thumbnail of a viewer until `release()` drops it.

use image::imageops::{self, FilterType};
use image::{Rgba, RgbaImage};
use std::cell::{RefCell, RefMut};

/// Number of halving steps the scratch surface is sized for
const MAX_NUM_SCALING_STEPS: u32 = 3;

const REDUCTION_FILTER: FilterType = FilterType::Triangle;

/// Single-owner transient bitmap shared by the thumbnails of one viewer
#[derive(Debug, Default)]
pub struct ScratchSurface {
    slot: RefCell<Option<RgbaImage>>,
}

impl ScratchSurface {
    pub fn new() -> Self {
        Self::default()
    }

    /// Borrow the surface at `width` x `height`, cleared to transparent
    ///
    /// Reuses the existing buffer when it already has these dimensions.
    fn acquire(&self, width: u32, height: u32) -> RefMut<'_, RgbaImage> {
        let mut slot = self.slot.borrow_mut();
        match slot.as_mut() {
            Some(surface) if surface.dimensions() == (width, height) => {
                surface.fill(0);
            }
            _ => *slot = Some(RgbaImage::from_pixel(width, height, Rgba([0, 0, 0, 0]))),
        }
        RefMut::map(slot, |slot| {
            slot.get_or_insert_with(|| RgbaImage::new(width, height))
        })
    }

    /// Drop the backing buffer
    ///
    /// Returns `true` if a buffer was allocated.
    pub fn release(&self) -> bool {
        self.slot.borrow_mut().take().is_some()
    }

    pub fn is_allocated(&self) -> bool {
        self.slot.borrow().is_some()
    }

    /// Dimensions of the backing buffer, if allocated
    pub fn dimensions(&self) -> Option<(u32, u32)> {
        self.slot.borrow().as_ref().map(|surface| surface.dimensions())
    }
}

/// Reduce `source` to exactly `width` x `height`
///
/// Sources at most twice the target width are scaled directly. Larger ones
/// are drawn into the scratch surface and halved until within a factor of two
/// of the target, then scaled to the target.
pub fn reduce_image(scratch: &ScratchSurface, source: &RgbaImage, width: u32, height: u32) -> RgbaImage {
    let (source_width, source_height) = source.dimensions();
    if source_width == 0 || source_height == 0 || width == 0 || height == 0 {
        return RgbaImage::new(width, height);
    }

    if source_width <= 2 * width {
        return imageops::resize(source, width, height, REDUCTION_FILTER);
    }

    let mut reduced_width = width << MAX_NUM_SCALING_STEPS;
    let mut reduced_height = height << MAX_NUM_SCALING_STEPS;
    let mut surface = scratch.acquire(reduced_width, reduced_height);

    while (reduced_width > source_width || reduced_height > source_height)
        && reduced_width > 1
        && reduced_height > 1
    {
        reduced_width >>= 1;
        reduced_height >>= 1;
    }

    let first = imageops::resize(source, reduced_width, reduced_height, REDUCTION_FILTER);
    imageops::replace(&mut *surface, &first, 0, 0);

    while reduced_width > 2 * width && reduced_height > 1 {
        let region = imageops::crop_imm(&*surface, 0, 0, reduced_width, reduced_height).to_image();
        let half = imageops::resize(&region, reduced_width >> 1, reduced_height >> 1, REDUCTION_FILTER);
        imageops::replace(&mut *surface, &half, 0, 0);
        reduced_width >>= 1;
        reduced_height >>= 1;
    }

    let region = imageops::crop_imm(&*surface, 0, 0, reduced_width, reduced_height).to_image();
    imageops::resize(&region, width, height, REDUCTION_FILTER)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn solid(width: u32, height: u32, color: [u8; 4]) -> RgbaImage {
        RgbaImage::from_pixel(width, height, Rgba(color))
    }

    #[test]
    fn test_small_source_skips_scratch() {
        let scratch = ScratchSurface::new();
        let source = solid(150, 200, [255, 0, 0, 255]);

        let reduced = reduce_image(&scratch, &source, 98, 126);

        assert_eq!(reduced.dimensions(), (98, 126));
        assert!(!scratch.is_allocated());
    }

    #[test]
    fn test_large_source_uses_scratch() {
        let scratch = ScratchSurface::new();
        let source = solid(1224, 1584, [10, 200, 30, 255]);

        let reduced = reduce_image(&scratch, &source, 98, 126);

        assert_eq!(reduced.dimensions(), (98, 126));
        assert_eq!(scratch.dimensions(), Some((784, 1008)));
        assert_eq!(reduced.get_pixel(50, 60), &Rgba([10, 200, 30, 255]));
    }

    #[test]
    fn test_scratch_is_reused_and_released() {
        let scratch = ScratchSurface::new();
        let source = solid(1000, 1000, [0, 0, 255, 255]);

        reduce_image(&scratch, &source, 98, 98);
        reduce_image(&scratch, &source, 98, 98);
        assert_eq!(scratch.dimensions(), Some((784, 784)));

        assert!(scratch.release());
        assert!(!scratch.is_allocated());
        assert!(!scratch.release());
    }

    #[test]
    fn test_degenerate_inputs() {
        let scratch = ScratchSurface::new();

        let empty = RgbaImage::new(0, 0);
        assert_eq!(reduce_image(&scratch, &empty, 98, 120).dimensions(), (98, 120));

        let source = solid(400, 400, [1, 2, 3, 255]);
        assert_eq!(reduce_image(&scratch, &source, 0, 0).dimensions(), (0, 0));
    }
}

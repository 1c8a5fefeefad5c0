//! Page viewports
//!
//! A viewport describes how a page's view box maps onto pixels at a given
//! scale and rotation. Thumbnails derive their canvas geometry from it.

use crate::error::{ThumbnailError, ThumbnailResult};

/// Normalize a rotation in degrees to 0, 90, 180 or 270
///
/// # Errors
/// Returns `InvalidRotation` when `degrees` is not a multiple of 90.
pub fn normalize_rotation(degrees: i32) -> ThumbnailResult<u32> {
    if degrees % 90 != 0 {
        return Err(ThumbnailError::InvalidRotation(degrees));
    }
    Ok(degrees.rem_euclid(360) as u32)
}

/// Geometry of a page at a scale and rotation
#[derive(Debug, Clone, PartialEq)]
pub struct PageViewport {
    /// Page box as `[x1, y1, x2, y2]` in page units
    pub view_box: [f32; 4],

    /// Page units to pixels
    pub scale: f32,

    /// Clockwise rotation in degrees (0, 90, 180 or 270)
    pub rotation: u32,

    /// Width in pixels after scaling and rotation
    pub width: f32,

    /// Height in pixels after scaling and rotation
    pub height: f32,
}

impl PageViewport {
    /// Create a viewport; `rotation` is reduced modulo 360
    pub fn new(view_box: [f32; 4], scale: f32, rotation: u32) -> Self {
        let rotation = rotation % 360;
        let box_width = (view_box[2] - view_box[0]).abs() * scale;
        let box_height = (view_box[3] - view_box[1]).abs() * scale;

        let (width, height) = if rotation % 180 == 0 {
            (box_width, box_height)
        } else {
            (box_height, box_width)
        };

        Self {
            view_box,
            scale,
            rotation,
            width,
            height,
        }
    }

    /// Copy of this viewport with a new scale and/or rotation
    pub fn clone_with(&self, scale: Option<f32>, rotation: Option<u32>) -> Self {
        Self::new(
            self.view_box,
            scale.unwrap_or(self.scale),
            rotation.unwrap_or(self.rotation),
        )
    }

    /// Width over height; 1.0 for degenerate pages
    pub fn ratio(&self) -> f32 {
        if self.width > 0.0 && self.height > 0.0 {
            self.width / self.height
        } else {
            1.0
        }
    }
}

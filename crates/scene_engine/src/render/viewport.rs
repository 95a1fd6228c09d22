//! Normalized viewport rectangle
//!
//! A viewport covers a sub-rectangle of the render target in normalized
//! coordinates, origin bottom-left. `depth` orders cameras sharing a target:
//! larger values are drawn later, on top.

use crate::error::CameraError;
use crate::foundation::math::Vec2;
use serde::{Deserialize, Serialize};

/// Pixel rectangle handed to the graphics API
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PixelRect {
    /// Left edge in pixels
    pub x: i32,
    /// Bottom edge in pixels
    pub y: i32,
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
}

/// Float slack allowed where a viewport's far edge meets the target's
const EDGE_TOLERANCE: f32 = 1e-6;

/// Viewport of a camera
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    /// Normalized left edge
    pub x: f32,
    /// Normalized bottom edge
    pub y: f32,
    /// Normalized width, in (0, 1]
    pub width: f32,
    /// Normalized height, in (0, 1]
    pub height: f32,
    /// Draw order among viewports sharing a render target
    pub depth: i32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self::full()
    }
}

impl Viewport {
    /// Validated viewport
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Result<Self, CameraError> {
        let viewport = Self { x, y, width, height, depth: 0 };
        viewport.validate()?;
        Ok(viewport)
    }

    /// Whole render target
    pub fn full() -> Self {
        Self { x: 0.0, y: 0.0, width: 1.0, height: 1.0, depth: 0 }
    }

    /// Set the draw order
    pub fn with_depth(mut self, depth: i32) -> Self {
        self.depth = depth;
        self
    }

    /// Check the rectangle is inside the normalized range
    pub fn validate(&self) -> Result<(), CameraError> {
        let in_unit = |v: f32| (0.0..=1.0).contains(&v);
        if !(self.width > 0.0 && self.width <= 1.0 && self.height > 0.0 && self.height <= 1.0) {
            return Err(CameraError::InvalidViewport(format!(
                "size {}x{} must be in (0, 1]",
                self.width, self.height
            )));
        }
        if !in_unit(self.x) || !in_unit(self.y) {
            return Err(CameraError::InvalidViewport(format!(
                "origin ({}, {}) must be in [0, 1]",
                self.x, self.y
            )));
        }
        if self.x + self.width > 1.0 + EDGE_TOLERANCE || self.y + self.height > 1.0 + EDGE_TOLERANCE {
            return Err(CameraError::InvalidViewport(format!(
                "rectangle at ({}, {}) sized {}x{} extends past the render target",
                self.x, self.y, self.width, self.height
            )));
        }
        Ok(())
    }

    /// Pixel rectangle for a render target of the given size
    pub fn gl_viewport(&self, target_width: u32, target_height: u32) -> PixelRect {
        let (w, h) = (target_width as f32, target_height as f32);
        PixelRect {
            x: (self.x * w).round() as i32,
            y: (self.y * h).round() as i32,
            width: (self.width * w).round() as u32,
            height: (self.height * h).round() as u32,
        }
    }

    /// Pixel dimensions of the framebuffer this viewport needs on a target of the given size
    pub fn resize_frame_buffer(&self, target_width: u32, target_height: u32) -> (u32, u32) {
        let rect = self.gl_viewport(target_width, target_height);
        (rect.width.max(1), rect.height.max(1))
    }

    /// Fraction of the render target area covered
    pub fn screen_percentage(&self) -> f32 {
        self.width * self.height
    }

    /// Widget pixel coordinates (origin top-left) to clip-space x/y in [-1, 1]
    pub fn widget_to_clip(&self, widget_point: Vec2, target_width: u32, target_height: u32) -> Vec2 {
        let (w, h) = (target_width as f32, target_height as f32);
        let left = self.x * w;
        let top = h * (1.0 - self.y - self.height);
        Vec2::new(
            2.0 * (widget_point.x - left) / (self.width * w) - 1.0,
            1.0 - 2.0 * (widget_point.y - top) / (self.height * h),
        )
    }

    /// Clip-space x/y to widget pixel coordinates (origin top-left)
    pub fn clip_to_widget(&self, clip: Vec2, target_width: u32, target_height: u32) -> Vec2 {
        let (w, h) = (target_width as f32, target_height as f32);
        let left = self.x * w;
        let top = h * (1.0 - self.y - self.height);
        Vec2::new(
            left + (clip.x + 1.0) * 0.5 * self.width * w,
            top + (1.0 - clip.y) * 0.5 * self.height * h,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_gl_viewport_right_half() {
        let viewport = Viewport::new(0.5, 0.0, 0.5, 1.0).expect("valid");
        assert_eq!(
            viewport.gl_viewport(800, 600),
            PixelRect { x: 400, y: 0, width: 400, height: 600 }
        );
        assert_eq!(viewport.resize_frame_buffer(800, 600), (400, 600));
    }

    #[test]
    fn test_rejects_out_of_range() {
        assert!(Viewport::new(0.0, 0.0, 0.0, 1.0).is_err());
        assert!(Viewport::new(0.0, 0.0, 1.5, 1.0).is_err());
        assert!(Viewport::new(-0.1, 0.0, 1.0, 1.0).is_err());
        assert!(Viewport::new(0.75, 0.0, 0.5, 1.0).is_err());
        assert!(Viewport::new(0.0, 0.6, 1.0, 0.5).is_err());
        assert!(Viewport::new(0.75, 0.75, 0.25, 0.25).is_ok());
        assert!(Viewport::new(0.1, 0.0, 0.9, 1.0).is_ok());
    }

    #[test]
    fn test_widget_to_clip_corners() {
        let viewport = Viewport::full();
        assert_relative_eq!(viewport.widget_to_clip(Vec2::new(0.0, 0.0), 800, 600), Vec2::new(-1.0, 1.0));
        assert_relative_eq!(viewport.widget_to_clip(Vec2::new(400.0, 300.0), 800, 600), Vec2::zeros());
        assert_relative_eq!(viewport.widget_to_clip(Vec2::new(800.0, 600.0), 800, 600), Vec2::new(1.0, -1.0));
    }

    #[test]
    fn test_clip_widget_inverse_on_sub_viewport() {
        let viewport = Viewport::new(0.25, 0.5, 0.5, 0.5).expect("valid");
        let widget = Vec2::new(310.0, 120.0);
        let clip = viewport.widget_to_clip(widget, 800, 600);
        assert_relative_eq!(viewport.clip_to_widget(clip, 800, 600), widget, epsilon = 1e-3);
    }
}

// Core types shared by the lens pipeline.

use glam::Vec2;
use image::RgbImage;

/// Smallest width/height a lens may have (pixels).
pub const MIN_EXTENT: f32 = 1.0;

#[derive(Clone, Debug)]
pub struct FrameBuffer {
    pub width: usize,      // how wide the frame is on screen (pixels)
    pub height: usize,     // how tall the frame is on screen (pixels)
    pub pixels: Vec<u32>,  // each entry is 0x00RRGGBB for minifb
}

impl FrameBuffer {
    /// A black frame of the given size.
    pub fn new(width: usize, height: usize) -> Self {
        Self { width, height, pixels: vec![0u32; width * height] }
    }

    /// Pack an RGB image into window pixels.
    pub fn from_rgb_image(img: &RgbImage) -> Self {
        let (w, h) = img.dimensions();
        let pixels = img.pixels().map(|p| pack_rgb(p[0], p[1], p[2])).collect();
        Self { width: w as usize, height: h as usize, pixels }
    }

    /// Unpack into an RGB image (used for PNG snapshots).
    pub fn to_rgb_image(&self) -> RgbImage {
        RgbImage::from_fn(self.width as u32, self.height as u32, |x, y| {
            let (r, g, b) = unpack_rgb(self.pixels[y as usize * self.width + x as usize]);
            image::Rgb([r, g, b])
        })
    }

    #[inline]
    pub fn same_size(&self, other: &FrameBuffer) -> bool {
        self.width == other.width && self.height == other.height
    }
}

#[inline]
pub fn pack_rgb(r: u8, g: u8, b: u8) -> u32 {
    ((r as u32) << 16) | ((g as u32) << 8) | b as u32
}

#[inline]
pub fn unpack_rgb(px: u32) -> (u8, u8, u8) {
    (((px >> 16) & 0xFF) as u8, ((px >> 8) & 0xFF) as u8, (px & 0xFF) as u8)
}

/// Where the lens sits and how big it is. Screen coordinates, pixels.
///
/// Only built through [`LensGeometry::new`], which clamps bad input, so every
/// value of this type is a valid SDF domain: extents are at least
/// [`MIN_EXTENT`], nothing is NaN, and the corner radius fits the box.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LensGeometry {
    center: Vec2,
    size: Vec2,
    corner_radius: f32,
}

impl LensGeometry {
    pub fn new(center: Vec2, width: f32, height: f32, corner_radius: f32) -> Self {
        let extent = |v: f32| if v.is_finite() { v.max(MIN_EXTENT) } else { MIN_EXTENT };
        let size = Vec2::new(extent(width), extent(height));
        let center = Vec2::new(
            if center.x.is_finite() { center.x } else { 0.0 },
            if center.y.is_finite() { center.y } else { 0.0 },
        );
        let max_radius = size.min_element() * 0.5;
        let corner_radius = if corner_radius.is_finite() {
            corner_radius.clamp(0.0, max_radius)
        } else {
            0.0
        };
        Self { center, size, corner_radius }
    }

    #[inline]
    pub fn center(&self) -> Vec2 {
        self.center
    }

    #[inline]
    pub fn size(&self) -> Vec2 {
        self.size
    }

    #[inline]
    pub fn half_extents(&self) -> Vec2 {
        self.size * 0.5
    }

    #[inline]
    pub fn corner_radius(&self) -> f32 {
        self.corner_radius
    }

    /// Same lens moved to a new center.
    pub fn with_center(&self, center: Vec2) -> Self {
        Self::new(center, self.size.x, self.size.y, self.corner_radius)
    }

    /// Top-left and bottom-right corners of the bounding box.
    pub fn bounds(&self) -> (Vec2, Vec2) {
        let half = self.half_extents();
        (self.center - half, self.center + half)
    }

    /// True when `p` lies inside the bounding box (edges included).
    pub fn bbox_contains(&self, p: Vec2) -> bool {
        let (min, max) = self.bounds();
        p.x >= min.x && p.x <= max.x && p.y >= min.y && p.y <= max.y
    }

    /// Signed distance from a screen point to the lens edge (negative inside).
    pub fn signed_distance(&self, x: f32, y: f32) -> f32 {
        crate::sdf::rounded_rect(
            Vec2::new(x, y) - self.center,
            self.half_extents(),
            self.corner_radius,
        )
    }
}

/// Fixed per-lens shape constants (pixels).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ShapeParams {
    /// Largest sampling offset the field may produce.
    pub max_displacement: f32,
    /// Width of the refraction band inside the edge.
    pub edge_band: f32,
    /// Distance outside the edge where displacement reaches zero.
    pub falloff: f32,
}

impl Default for ShapeParams {
    fn default() -> Self {
        Self { max_displacement: 20.0, edge_band: 24.0, falloff: 0.0 }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn zero_and_negative_sizes_clamp_to_one_pixel() {
        let g = LensGeometry::new(Vec2::new(10.0, 10.0), 0.0, -25.0, 5.0);
        assert_eq!(g.size(), Vec2::splat(MIN_EXTENT));
        assert_relative_eq!(g.corner_radius(), 0.5);
        assert!(g.signed_distance(10.0, 10.0).is_finite());
    }

    #[test]
    fn nan_input_does_not_leak() {
        let g = LensGeometry::new(Vec2::new(f32::NAN, 3.0), f32::NAN, 40.0, f32::INFINITY);
        assert_eq!(g.center(), Vec2::new(0.0, 3.0));
        assert_eq!(g.size().x, MIN_EXTENT);
        assert_eq!(g.corner_radius(), 0.0);
        assert!(!g.signed_distance(0.0, 0.0).is_nan());
    }

    #[test]
    fn excessive_radius_clamps_to_half_smaller_side() {
        let g = LensGeometry::new(Vec2::ZERO, 280.0, 180.0, 500.0);
        assert_relative_eq!(g.corner_radius(), 90.0);
        let g = LensGeometry::new(Vec2::ZERO, 280.0, 180.0, -4.0);
        assert_relative_eq!(g.corner_radius(), 0.0);
    }

    #[test]
    fn bbox_contains_edges() {
        let g = LensGeometry::new(Vec2::new(500.0, 400.0), 280.0, 180.0, 40.0);
        assert!(g.bbox_contains(Vec2::new(360.0, 310.0)));
        assert!(g.bbox_contains(Vec2::new(640.0, 490.0)));
        assert!(!g.bbox_contains(Vec2::new(641.0, 400.0)));
    }

    #[test]
    fn pack_unpack_rgb() {
        let px = pack_rgb(0x12, 0x34, 0x56);
        assert_eq!(px, 0x00_12_34_56);
        assert_eq!(unpack_rgb(px), (0x12, 0x34, 0x56));
    }
}

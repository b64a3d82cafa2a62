// Displacement map rasterizer.
// Samples the refraction field at every pixel of the lens footprint and encodes
// it into an RGBA raster (the same layout an SVG feDisplacementMap would read):
//   R = dx, G = dy   128 = no offset, 1 / 255 = full negative / positive scale
//   B = 128          unused, kept neutral
//   A = coverage     how much of this pixel lies inside the lens outline
// The map is a pure function of (geometry, shape): rebuilt from scratch on any
// change, never patched.

use crate::error::{Error, Result};
use crate::field::Refraction;
use crate::types::{LensGeometry, ShapeParams};
use glam::Vec2;
use image::{Rgba, RgbaImage};
use std::path::Path;
use tracing::debug;

/// Refuse to build maps larger than this per side.
pub const MAX_MAP_SIDE: u32 = 4096;

const ZERO_LEVEL: f32 = 128.0;
const FULL_SCALE: f32 = 127.0;

#[inline]
fn encode(v: f32, scale: f32) -> u8 {
    if scale <= 0.0 {
        return ZERO_LEVEL as u8;
    }
    (ZERO_LEVEL + (v / scale * FULL_SCALE).round()).clamp(1.0, 255.0) as u8
}

#[inline]
fn decode(c: u8, scale: f32) -> f32 {
    (c as f32 - ZERO_LEVEL) / FULL_SCALE * scale
}

pub struct DisplacementMap {
    origin: (i32, i32), // screen pixel of the map's top-left texel
    scale: f32,         // displacement (px) stored at full channel scale
    image: RgbaImage,
}

impl DisplacementMap {
    pub fn origin(&self) -> (i32, i32) {
        self.origin
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn scale(&self) -> f32 {
        self.scale
    }

    /// Decoded offset for the map texel at screen pixel (x, y); zero off-map.
    pub fn vector_at(&self, x: i32, y: i32) -> Vec2 {
        match self.texel(x, y) {
            Some(px) => Vec2::new(decode(px[0], self.scale), decode(px[1], self.scale)),
            None => Vec2::ZERO,
        }
    }

    /// Lens coverage in [0, 1] at screen pixel (x, y); zero off-map.
    pub fn coverage_at(&self, x: i32, y: i32) -> f32 {
        self.texel(x, y).map_or(0.0, |px| px[3] as f32 / 255.0)
    }

    #[inline]
    fn texel(&self, x: i32, y: i32) -> Option<&Rgba<u8>> {
        let mx = x - self.origin.0;
        let my = y - self.origin.1;
        if mx < 0 || my < 0 || mx as u32 >= self.width() || my as u32 >= self.height() {
            return None;
        }
        Some(self.image.get_pixel(mx as u32, my as u32))
    }

    /// Raw RGBA bytes, row-major.
    pub fn as_raw(&self) -> &[u8] {
        self.image.as_raw()
    }

    pub fn save_png(&self, path: &Path) -> Result<()> {
        self.image.save(path)?;
        Ok(())
    }
}

/// Build the map for one lens.
pub fn rasterize(geom: &LensGeometry, shape: &ShapeParams) -> Result<DisplacementMap> {
    let field = Refraction::new(geom, shape);
    let margin = field.falloff().ceil() + 1.0;
    let (min, max) = geom.bounds();
    let x0 = (min.x - margin).floor();
    let y0 = (min.y - margin).floor();
    let x1 = (max.x + margin).ceil();
    let y1 = (max.y + margin).ceil();

    let (w, h) = (x1 - x0, y1 - y0);
    if !(w >= 1.0 && h >= 1.0 && w <= MAX_MAP_SIDE as f32 && h <= MAX_MAP_SIDE as f32) {
        return Err(Error::Unsupported(format!(
            "displacement map {w}x{h} exceeds {MAX_MAP_SIDE}px per side"
        )));
    }
    if x0 < i32::MIN as f32 || y0 < i32::MIN as f32 || x1 > i32::MAX as f32 || y1 > i32::MAX as f32 {
        return Err(Error::Unsupported("lens lies outside addressable screen space".into()));
    }

    let scale = field.max_displacement();
    let center = geom.center();
    let half = geom.half_extents();
    let radius = geom.corner_radius();

    let image = RgbaImage::from_fn(w as u32, h as u32, |mx, my| {
        // pixel center, relative to the lens center
        let p = Vec2::new(x0 + mx as f32 + 0.5, y0 + my as f32 + 0.5) - center;
        let v = field.displacement(p);
        let d = crate::sdf::rounded_rect(p, half, radius);
        let coverage = (0.5 - d).clamp(0.0, 1.0);
        Rgba([
            encode(v.x, scale),
            encode(v.y, scale),
            ZERO_LEVEL as u8,
            (coverage * 255.0).round() as u8,
        ])
    });

    Ok(DisplacementMap { origin: (x0 as i32, y0 as i32), scale, image })
}

/// Keeps the last map and rebuilds it only when its inputs change.
#[derive(Default)]
pub struct Rasterizer {
    cached: Option<(LensGeometry, ShapeParams, DisplacementMap)>,
    builds: u64,
}

impl Rasterizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Map for `geom`/`shape`, regenerated in full if they differ from the cache.
    pub fn update(&mut self, geom: &LensGeometry, shape: &ShapeParams) -> Result<&DisplacementMap> {
        let fresh = matches!(&self.cached, Some((g, s, _)) if g == geom && s == shape);
        if !fresh {
            // drop the stale map before building so a failure leaves nothing behind
            self.cached = None;
            let map = rasterize(geom, shape)?;
            self.builds += 1;
            debug!(
                w = map.width(),
                h = map.height(),
                origin = ?map.origin(),
                builds = self.builds,
                "displacement map rebuilt"
            );
            self.cached = Some((*geom, *shape, map));
        }
        match &self.cached {
            Some((_, _, map)) => Ok(map),
            None => Err(Error::Unsupported("displacement map missing after rebuild".into())),
        }
    }

    /// The current map, if one has been built.
    pub fn current(&self) -> Option<&DisplacementMap> {
        self.cached.as_ref().map(|(_, _, m)| m)
    }

    /// How many times a map was generated (cache misses).
    pub fn builds(&self) -> u64 {
        self.builds
    }

    pub fn clear(&mut self) {
        self.cached = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn lens_at(x: f32, y: f32) -> LensGeometry {
        LensGeometry::new(Vec2::new(x, y), 280.0, 180.0, 40.0)
    }

    #[test]
    fn encoding_is_linear_and_centered() {
        assert_eq!(encode(0.0, 20.0), 128);
        assert_eq!(encode(20.0, 20.0), 255);
        assert_eq!(encode(-20.0, 20.0), 1);
        assert_eq!(encode(99.0, 20.0), 255);
        assert_eq!(encode(5.0, 0.0), 128);
        assert_abs_diff_eq!(decode(128, 20.0), 0.0);
        assert_abs_diff_eq!(decode(255, 20.0), 20.0);
        assert_abs_diff_eq!(decode(encode(-7.3, 20.0), 20.0), -7.3, epsilon = 20.0 / 127.0);
    }

    #[test]
    fn map_covers_bbox_plus_margin() {
        let map = rasterize(&lens_at(500.0, 400.0), &ShapeParams::default()).unwrap();
        // bbox 360..640 x 310..490, margin 1
        assert_eq!(map.origin(), (359, 309));
        assert_eq!((map.width(), map.height()), (282, 182));
        assert_abs_diff_eq!(map.scale(), 20.0);
    }

    #[test]
    fn identical_geometry_is_byte_identical() {
        let g = lens_at(512.3, 377.9);
        let s = ShapeParams { falloff: 6.0, ..ShapeParams::default() };
        let a = rasterize(&g, &s).unwrap();
        let b = rasterize(&g, &s).unwrap();
        assert_eq!(a.origin(), b.origin());
        assert_eq!(a.as_raw(), b.as_raw());
    }

    #[test]
    fn decoded_map_matches_field() {
        let g = lens_at(300.0, 200.0);
        let s = ShapeParams::default();
        let map = rasterize(&g, &s).unwrap();
        let field = Refraction::new(&g, &s);
        let step = map.scale() / FULL_SCALE;
        for (x, y) in [(300, 200), (250, 180), (420, 270), (170, 200), (300, 115)] {
            let p = Vec2::new(x as f32 + 0.5, y as f32 + 0.5) - g.center();
            let want = field.displacement(p);
            let got = map.vector_at(x, y);
            assert_abs_diff_eq!(got.x, want.x, epsilon = step);
            assert_abs_diff_eq!(got.y, want.y, epsilon = step);
        }
    }

    #[test]
    fn coverage_and_outside_texels() {
        let map = rasterize(&lens_at(500.0, 400.0), &ShapeParams::default()).unwrap();
        assert_eq!(map.coverage_at(500, 400), 1.0);
        // bbox corner is outside the rounded outline
        assert_eq!(map.coverage_at(360, 310), 0.0);
        assert_eq!(map.vector_at(360, 310), Vec2::ZERO);
        // off the map entirely
        assert_eq!(map.coverage_at(0, 0), 0.0);
        assert_eq!(map.vector_at(5000, 5000), Vec2::ZERO);
    }

    #[test]
    fn rasterizer_skips_unchanged_geometry() {
        let mut r = Rasterizer::new();
        let s = ShapeParams::default();
        r.update(&lens_at(500.0, 400.0), &s).unwrap();
        r.update(&lens_at(500.0, 400.0), &s).unwrap();
        assert_eq!(r.builds(), 1);
        let moved = r.update(&lens_at(510.0, 400.0), &s).unwrap();
        assert_eq!(moved.origin(), (369, 309));
        assert_eq!(r.builds(), 2);
    }

    #[test]
    fn oversized_lens_is_unsupported() {
        let huge = LensGeometry::new(Vec2::ZERO, 10_000.0, 50.0, 0.0);
        let mut r = Rasterizer::new();
        assert!(matches!(r.update(&huge, &ShapeParams::default()), Err(Error::Unsupported(_))));
        assert!(r.current().is_none());
    }
}

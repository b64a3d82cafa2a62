// Displacement field: for a point under the lens, how far (and which way) the
// backdrop should be sampled from its true position.
//
// Shape of the field along any ray leaving the center:
//   0 .. core          offset ramps up from 0 (ease-out): strongest magnification at the center
//   core .. edge band  constant offset toward the center (flat magnified body)
//   edge band          offset eases back to 0 (content is squeezed: the refraction rim)
//   beyond falloff     exactly 0, the backdrop shows through untouched

use crate::sdf;
use crate::types::{LensGeometry, ShapeParams};
use glam::Vec2;

/// Cubic Hermite smoothstep of `x` between edges `a < b`.
#[inline]
pub fn smoothstep(a: f32, b: f32, x: f32) -> f32 {
    if x <= a {
        return 0.0;
    }
    if x >= b {
        return 1.0;
    }
    let t = (x - a) / (b - a);
    (t * t * (3.0 - 2.0 * t)).clamp(0.0, 1.0)
}

#[inline]
fn ease_out_quad(t: f32) -> f32 {
    t * (2.0 - t)
}

#[inline]
fn finite_or_zero(v: f32) -> f32 {
    if v.is_finite() { v } else { 0.0 }
}

/// Field constants resolved for one lens geometry.
///
/// Shape parameters are clamped so that the field stays well formed for any
/// lens size: the edge band fits inside the lens, the flat body starts
/// before the band, and `core >= 2 * max` so sampling never crosses the center.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Refraction {
    half: Vec2,
    radius: f32,
    max: f32,
    edge_band: f32,
    falloff: f32,
    core: f32,
}

impl Refraction {
    pub fn new(geom: &LensGeometry, shape: &ShapeParams) -> Self {
        let half = geom.half_extents();
        let h = half.min_element();
        let edge_band = finite_or_zero(shape.edge_band).clamp(1.0, h.max(1.0));
        let core = (h - edge_band).max(0.0);
        let max = finite_or_zero(shape.max_displacement).max(0.0).min(core * 0.5);
        let falloff = finite_or_zero(shape.falloff).max(0.0);
        Self { half, radius: geom.corner_radius(), max, edge_band, falloff, core }
    }

    /// Effective maximum offset after clamping (also the map encoding scale).
    pub fn max_displacement(&self) -> f32 {
        self.max
    }

    /// Radius up to which the offset ramps; beyond it the magnitude never grows.
    pub fn core_radius(&self) -> f32 {
        self.core
    }

    pub fn falloff(&self) -> f32 {
        self.falloff
    }

    /// Lens strength for a signed distance: 1 deep inside, 0 past the falloff.
    #[inline]
    pub fn weight(&self, signed_distance: f32) -> f32 {
        1.0 - smoothstep(-self.edge_band, self.falloff, signed_distance)
    }

    /// Offset for a point given relative to the lens center.
    pub fn displacement(&self, p: Vec2) -> Vec2 {
        if self.max <= 0.0 {
            return Vec2::ZERO;
        }
        let r = p.length();
        if r <= 0.0 || !r.is_finite() {
            return Vec2::ZERO;
        }
        let g = self.weight(sdf::rounded_rect(p, self.half, self.radius));
        if g <= 0.0 {
            return Vec2::ZERO;
        }
        let ramp = ease_out_quad((r / self.core).min(1.0));
        let magnitude = (self.max * g * ramp).min(self.max);
        -p * (magnitude / r)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn lens() -> LensGeometry {
        LensGeometry::new(Vec2::ZERO, 280.0, 180.0, 40.0)
    }

    fn shape(falloff: f32) -> ShapeParams {
        ShapeParams { max_displacement: 20.0, edge_band: 24.0, falloff }
    }

    #[test]
    fn smoothstep_edges() {
        assert_eq!(smoothstep(0.0, 1.0, -1.0), 0.0);
        assert_eq!(smoothstep(0.0, 1.0, 2.0), 1.0);
        assert_abs_diff_eq!(smoothstep(0.0, 1.0, 0.5), 0.5, epsilon = 1e-6);
        assert_abs_diff_eq!(smoothstep(-10.0, 10.0, 0.0), 0.5, epsilon = 1e-6);
    }

    #[test]
    fn resolved_constants() {
        let f = Refraction::new(&lens(), &shape(0.0));
        assert_abs_diff_eq!(f.core_radius(), 66.0);
        assert_abs_diff_eq!(f.max_displacement(), 20.0);
        assert!(f.core_radius() >= 2.0 * f.max_displacement());
    }

    #[test]
    fn zero_at_center() {
        let f = Refraction::new(&lens(), &shape(0.0));
        assert_eq!(f.displacement(Vec2::ZERO), Vec2::ZERO);
    }

    #[test]
    fn exactly_zero_past_falloff() {
        let f = Refraction::new(&lens(), &shape(0.0));
        assert_eq!(f.displacement(Vec2::new(141.0, 0.0)), Vec2::ZERO);
        assert_eq!(f.displacement(Vec2::new(0.0, 300.0)), Vec2::ZERO);

        let f = Refraction::new(&lens(), &shape(10.0));
        assert!(f.displacement(Vec2::new(145.0, 0.0)).length() > 0.0);
        assert_eq!(f.displacement(Vec2::new(150.5, 0.0)), Vec2::ZERO);
    }

    #[test]
    fn magnitude_is_bounded() {
        let f = Refraction::new(&lens(), &shape(8.0));
        for y in (-110..=110).step_by(3) {
            for x in (-160..=160).step_by(3) {
                let v = f.displacement(Vec2::new(x as f32, y as f32));
                assert!(v.length() <= f.max_displacement() + 1e-4);
            }
        }
    }

    #[test]
    fn non_increasing_beyond_core() {
        let f = Refraction::new(&lens(), &shape(6.0));
        for i in 0..32 {
            let a = i as f32 / 32.0 * std::f32::consts::TAU;
            let dir = Vec2::new(a.cos(), a.sin());
            let mut prev = f32::INFINITY;
            let mut r = f.core_radius();
            while r < 200.0 {
                let m = f.displacement(dir * r).length();
                assert!(m <= prev + 1e-4, "ray {i} grew at r={r}: {m} > {prev}");
                prev = m;
                r += 0.5;
            }
            assert_eq!(prev, 0.0);
        }
    }

    #[test]
    fn continuous_between_neighbours() {
        let f = Refraction::new(&lens(), &shape(4.0));
        for y in (-100..=100).step_by(7) {
            let mut last = f.displacement(Vec2::new(-160.0, y as f32));
            let mut x = -160.0;
            while x < 160.0 {
                x += 0.25;
                let v = f.displacement(Vec2::new(x, y as f32));
                assert!((v - last).length() < 0.6, "jump at ({x}, {y})");
                last = v;
            }
        }
    }

    #[test]
    fn points_toward_center_without_inversion() {
        let f = Refraction::new(&lens(), &shape(0.0));
        for y in (-90..=90).step_by(5) {
            for x in (-140..=140).step_by(5) {
                let p = Vec2::new(x as f32, y as f32);
                let v = f.displacement(p);
                assert!(v.dot(p) <= 0.0);
                // sampling position stays on the same side of the center
                assert!((p + v).dot(p) >= -1e-3);
            }
        }
    }

    #[test]
    fn center_magnifies_most() {
        let f = Refraction::new(&lens(), &shape(0.0));
        let dir = Vec2::X;
        // local stretch of the sampling radius: < 1 means magnified
        let stretch = |r: f32| {
            let s0 = (dir * r + f.displacement(dir * r)).length();
            let s1 = (dir * (r + 0.5) + f.displacement(dir * (r + 0.5))).length();
            (s1 - s0) / 0.5
        };
        let at_center = stretch(0.5);
        assert!(at_center < 1.0);
        for r in [20.0, 40.0, 60.0, 80.0] {
            assert!(at_center <= stretch(r) + 1e-4);
        }
    }

    #[test]
    fn tiny_lens_has_no_field() {
        let tiny = LensGeometry::new(Vec2::ZERO, 0.0, -3.0, 1.0);
        let f = Refraction::new(&tiny, &shape(0.0));
        assert_eq!(f.max_displacement(), 0.0);
        let v = f.displacement(Vec2::new(0.2, 0.1));
        assert_eq!(v, Vec2::ZERO);
    }
}

// Signed distance to the lens outline.
// Negative inside, positive outside, zero on the edge. All shapes are centered
// on the origin; callers pass points relative to the lens center.

use glam::Vec2;

/// Exact distance to an axis-aligned rounded rectangle.
///
/// `half` is the half-width/half-height of the full box (corners included).
/// The radius is clamped into `[0, min(half)]` first, so any input gives a
/// well-formed shape: `0` is a sharp rectangle, `min(half)` on a square is a
/// circle.
pub fn rounded_rect(p: Vec2, half: Vec2, radius: f32) -> f32 {
    let half = half.max(Vec2::ZERO);
    let r = if radius.is_finite() { radius.clamp(0.0, half.min_element()) } else { 0.0 };

    // Inner (core) rectangle the corner circles are centered on.
    let q = p.abs() - (half - Vec2::splat(r));
    let outside = q.max(Vec2::ZERO).length();
    let inside = q.x.max(q.y).min(0.0);
    outside + inside - r
}

#[inline]
pub fn circle(p: Vec2, radius: f32) -> f32 {
    p.length() - radius
}

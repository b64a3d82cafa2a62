// What the lens looks through.
// The lens only ever *reads* a backdrop frame; it never owns or fetches content.
// - SceneBackdrop: built-in demo page (gradient, dot pattern, headline, cards).
// - ImageBackdrop: any image file, scaled to cover the window.
// - CameraBackdrop (feature "camera"): live webcam, see camera.rs.

use crate::config::{BackdropConfig, BackdropKind};
use crate::draw::{draw_text_scaled, text_width};
use crate::error::{Error, Result};
use crate::sdf;
use crate::types::{pack_rgb, unpack_rgb, FrameBuffer};
use glam::Vec2;
use image::imageops::{self, FilterType};
use std::path::Path;
use tracing::info;

pub trait Backdrop {
    /// Frame size in pixels (the window is opened at this size).
    fn size(&self) -> (usize, usize);

    /// Current frame, and whether it changed since the previous call.
    fn next_frame(&mut self) -> Result<(&FrameBuffer, bool)>;
}

/// Open the backdrop selected in the config.
pub fn open(cfg: &BackdropConfig, width: usize, height: usize) -> Result<Box<dyn Backdrop>> {
    match cfg.kind {
        BackdropKind::Scene => Ok(Box::new(SceneBackdrop::new(width, height))),
        BackdropKind::Image => {
            let path = cfg
                .image
                .as_deref()
                .ok_or_else(|| Error::Backdrop("backdrop kind \"image\" needs backdrop.image".into()))?;
            Ok(Box::new(ImageBackdrop::open(path, width, height)?))
        }
        #[cfg(feature = "camera")]
        BackdropKind::Camera => Ok(Box::new(crate::camera::CameraBackdrop::new(
            cfg.camera_index,
            width as u32,
            height as u32,
        )?)),
        #[cfg(not(feature = "camera"))]
        BackdropKind::Camera => Err(Error::Backdrop(
            "camera backdrop needs a build with `--features camera`".into(),
        )),
    }
}

/* ------------------------------ static frames ------------------------------ */

/// A frame that never changes: reported as changed exactly once.
struct StaticFrame {
    frame: FrameBuffer,
    delivered: bool,
}

impl StaticFrame {
    fn new(frame: FrameBuffer) -> Self {
        Self { frame, delivered: false }
    }

    fn next(&mut self) -> (&FrameBuffer, bool) {
        let changed = !self.delivered;
        self.delivered = true;
        (&self.frame, changed)
    }
}

pub struct SceneBackdrop(StaticFrame);

impl SceneBackdrop {
    pub fn new(width: usize, height: usize) -> Self {
        Self(StaticFrame::new(render_scene(width.max(1), height.max(1))))
    }
}

impl Backdrop for SceneBackdrop {
    fn size(&self) -> (usize, usize) {
        (self.0.frame.width, self.0.frame.height)
    }

    fn next_frame(&mut self) -> Result<(&FrameBuffer, bool)> {
        Ok(self.0.next())
    }
}

pub struct ImageBackdrop(StaticFrame);

impl ImageBackdrop {
    pub fn open(path: &Path, width: usize, height: usize) -> Result<Self> {
        let img = image::open(path)?.to_rgb8();
        info!(path = %path.display(), w = img.width(), h = img.height(), "loaded backdrop image");
        let covered = cover(&img, width.max(1) as u32, height.max(1) as u32);
        Ok(Self(StaticFrame::new(FrameBuffer::from_rgb_image(&covered))))
    }
}

impl Backdrop for ImageBackdrop {
    fn size(&self) -> (usize, usize) {
        (self.0.frame.width, self.0.frame.height)
    }

    fn next_frame(&mut self) -> Result<(&FrameBuffer, bool)> {
        Ok(self.0.next())
    }
}

/// Scale `img` to fill `w x h` (keeping aspect), cropping the overflow
/// evenly on both sides, like CSS `background-size: cover`.
fn cover(img: &image::RgbImage, w: u32, h: u32) -> image::RgbImage {
    let (iw, ih) = (img.width().max(1) as f32, img.height().max(1) as f32);
    let scale = (w as f32 / iw).max(h as f32 / ih);
    let sw = ((iw * scale).ceil() as u32).max(w);
    let sh = ((ih * scale).ceil() as u32).max(h);
    let scaled = imageops::resize(img, sw, sh, FilterType::Triangle);
    imageops::crop_imm(&scaled, (sw - w) / 2, (sh - h) / 2, w, h).to_image()
}

/* ------------------------------ demo scene ------------------------------ */

const GRADIENT_FROM: u32 = 0x00_66_7E_EA;
const GRADIENT_TO: u32 = 0x00_76_4B_A2;
const DOT_SPACING: usize = 24;

const CARDS: [(&str, &str); 3] = [
    ("MAGNIFYING", "CONTENT UNDER THE LENS GROWS"),
    ("REAL-TIME", "MAP REBUILT ON EVERY DRAG"),
    ("SDF + SMOOTHSTEP", "SEAMLESS EDGE FALLOFF"),
];

/// sRGB mix of two packed colors.
fn mix(a: u32, b: u32, t: f32) -> u32 {
    let (ar, ag, ab) = unpack_rgb(a);
    let (br, bg, bb) = unpack_rgb(b);
    let l = |x: u8, y: u8| (x as f32 + (y as f32 - x as f32) * t).round().clamp(0.0, 255.0) as u8;
    pack_rgb(l(ar, br), l(ag, bg), l(ab, bb))
}

/// Paint a rounded rectangle with an anti-aliased edge.
fn fill_rounded(fb: &mut FrameBuffer, center: Vec2, half: Vec2, radius: f32, color: u32, alpha: f32) {
    let x0 = (center.x - half.x).floor().max(0.0) as usize;
    let y0 = (center.y - half.y).floor().max(0.0) as usize;
    let x1 = ((center.x + half.x).ceil().max(0.0) as usize).min(fb.width);
    let y1 = ((center.y + half.y).ceil().max(0.0) as usize).min(fb.height);
    for y in y0..y1 {
        for x in x0..x1 {
            let p = Vec2::new(x as f32 + 0.5, y as f32 + 0.5) - center;
            let a = (0.5 - sdf::rounded_rect(p, half, radius)).clamp(0.0, 1.0) * alpha;
            if a > 0.0 {
                let idx = y * fb.width + x;
                fb.pixels[idx] = mix(fb.pixels[idx], color, a);
            }
        }
    }
}

fn centered_text(fb: &mut FrameBuffer, cx: i32, y: i32, text: &str, color: u32, scale: i32) {
    draw_text_scaled(fb, cx - text_width(text, scale) / 2, y, text, color, scale);
}

/// Render the demo page the lens floats over.
pub fn render_scene(width: usize, height: usize) -> FrameBuffer {
    let mut fb = FrameBuffer::new(width, height);

    // 135deg gradient
    let span = (width + height).max(1) as f32;
    for y in 0..height {
        for x in 0..width {
            fb.pixels[y * width + x] = mix(GRADIENT_FROM, GRADIENT_TO, (x + y) as f32 / span);
        }
    }

    // dot pattern overlay
    let r = 1.6;
    for cy in (DOT_SPACING / 2..height).step_by(DOT_SPACING) {
        for cx in (DOT_SPACING / 2..width).step_by(DOT_SPACING) {
            fill_rounded(&mut fb, Vec2::new(cx as f32, cy as f32), Vec2::splat(r), r, 0x00FFFFFF, 0.22);
        }
    }

    // headline
    let w = width as i32;
    let h = height as i32;
    let title_scale = (w / 220).clamp(1, 5);
    centered_text(&mut fb, w / 2, h / 12, "LIQUID GLASS EFFECT", 0x00FFFFFF, title_scale);
    centered_text(
        &mut fb,
        w / 2,
        h / 12 + 11 * title_scale,
        "DRAG THE GLASS TO SEE THE BACKGROUND BEND",
        0x00E6E0FF,
        (title_scale / 2).max(1),
    );

    // cards
    let gap = (width as f32 * 0.04).max(8.0);
    let card_w = ((width as f32 - 4.0 * gap) / 3.0).max(8.0);
    let card_h = (height as f32 * 0.22).max(16.0);
    let card_y = height as f32 * 0.68;
    let text_scale = if card_w > 260.0 { 2 } else { 1 };
    for (i, (title, caption)) in CARDS.iter().enumerate() {
        let cx = gap + card_w * 0.5 + i as f32 * (card_w + gap);
        let center = Vec2::new(cx, card_y);
        let half = Vec2::new(card_w, card_h) * 0.5;
        fill_rounded(&mut fb, center, half, 16.0, 0x00FFFFFF, 0.16);
        // icon
        fill_rounded(&mut fb, center - Vec2::new(0.0, half.y * 0.45), Vec2::splat(14.0), 6.0, 0x00FFD166, 0.9);
        centered_text(&mut fb, cx as i32, card_y as i32, title, 0x00FFFFFF, text_scale);
        centered_text(&mut fb, cx as i32, card_y as i32 + 12 * text_scale, caption, 0x00EDE7FF, 1);
    }

    fb
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scene_reports_change_once() {
        let mut b = SceneBackdrop::new(320, 200);
        assert_eq!(b.size(), (320, 200));
        let (frame, changed) = b.next_frame().unwrap();
        assert!(changed);
        assert_eq!(frame.pixels.len(), 320 * 200);
        assert!(!b.next_frame().unwrap().1);
    }

    #[test]
    fn scene_is_deterministic_and_not_flat() {
        let a = render_scene(300, 180);
        let b = render_scene(300, 180);
        assert_eq!(a.pixels, b.pixels);
        assert_ne!(a.pixels[0], a.pixels[300 * 180 - 1]);
    }

    #[test]
    fn degenerate_sizes_do_not_panic() {
        let b = SceneBackdrop::new(0, 0);
        assert_eq!(b.size(), (1, 1));
        let tiny = render_scene(3, 2);
        assert_eq!(tiny.pixels.len(), 6);
    }

    #[test]
    fn cover_fills_and_crops() {
        let img = image::RgbImage::from_fn(40, 10, |x, _| image::Rgb([x as u8 * 6, 0, 0]));
        let out = cover(&img, 20, 20);
        assert_eq!(out.dimensions(), (20, 20));
    }

    #[test]
    fn missing_image_path_is_a_backdrop_error() {
        let cfg = BackdropConfig { kind: BackdropKind::Image, image: None, camera_index: 0 };
        assert!(matches!(open(&cfg, 10, 10), Err(Error::Backdrop(_))));
        let cfg = BackdropConfig { image: Some("/definitely/not/here.png".into()), ..cfg };
        assert!(open(&cfg, 10, 10).is_err());
    }

    #[cfg(not(feature = "camera"))]
    #[test]
    fn camera_needs_the_feature() {
        let cfg = BackdropConfig { kind: BackdropKind::Camera, ..BackdropConfig::default() };
        assert!(matches!(open(&cfg, 10, 10), Err(Error::Backdrop(_))));
    }
}

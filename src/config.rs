//! Configuration file handling (liquid-glass.toml).
//!
//! Every section and field is optional; missing values fall back to the
//! defaults below. Command-line flags are applied on top by `main`.

use crate::error::{Error, Result};
use crate::types::ShapeParams;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Top-level configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub window: WindowConfig,
    #[serde(default)]
    pub lens: LensConfig,
    #[serde(default)]
    pub drag: DragConfig,
    #[serde(default)]
    pub backdrop: BackdropConfig,
    #[serde(default)]
    pub hud: HudConfig,
}

impl Config {
    /// Defaults when `path` is `None`, otherwise the parsed file.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(p) => {
                let text = fs::read_to_string(p)?;
                Self::from_toml_str(&text).map_err(|e| Error::Config(format!("{}: {e}", p.display())))
            }
            None => Ok(Self::default()),
        }
    }

    pub fn from_toml_str(text: &str) -> Result<Self> {
        toml::from_str(text).map_err(|e| Error::Config(e.to_string()))
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct WindowConfig {
    #[serde(default = "default_window_width")]
    pub width: usize,
    #[serde(default = "default_window_height")]
    pub height: usize,
    #[serde(default = "default_title")]
    pub title: String,
    #[serde(default = "default_fps")]
    pub target_fps: usize,
}

fn default_window_width() -> usize {
    960
}

fn default_window_height() -> usize {
    640
}

fn default_title() -> String {
    "Liquid Glass".to_string()
}

fn default_fps() -> usize {
    60
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            width: default_window_width(),
            height: default_window_height(),
            title: default_title(),
            target_fps: default_fps(),
        }
    }
}

/// Lens size, placement and look.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LensConfig {
    #[serde(default = "default_lens_width")]
    pub width: f32,
    #[serde(default = "default_lens_height")]
    pub height: f32,
    #[serde(default = "default_corner_radius")]
    pub corner_radius: f32,
    /// Strongest sampling offset (px).
    #[serde(default = "default_max_displacement")]
    pub max_displacement: f32,
    /// Width of the refraction band just inside the edge (px).
    #[serde(default = "default_edge_band")]
    pub edge_band: f32,
    /// How far past the edge the field fades out (px).
    #[serde(default)]
    pub falloff: f32,
    /// Offset of the anchor from the top of the window.
    #[serde(default = "default_top")]
    pub top: Offset,
    /// Offset of the anchor from the left of the window.
    #[serde(default = "default_left")]
    pub left: Offset,
    /// Anchor is the lens center (translate(-50%, -50%)) rather than its top-left.
    #[serde(default = "default_true")]
    pub centered: bool,
    #[serde(default = "default_tint")]
    pub tint: Color,
    #[serde(default = "default_tint_strength")]
    pub tint_strength: f32,
    #[serde(default = "default_rim_strength")]
    pub rim_strength: f32,
    #[serde(default = "default_rim_width")]
    pub rim_width: f32,
    #[serde(default = "default_gloss")]
    pub gloss: f32,
    /// Turn off to draw only the static glass overlay.
    #[serde(default = "default_true")]
    pub distortion: bool,
}

fn default_lens_width() -> f32 {
    280.0
}

fn default_lens_height() -> f32 {
    180.0
}

fn default_corner_radius() -> f32 {
    40.0
}

fn default_max_displacement() -> f32 {
    20.0
}

fn default_edge_band() -> f32 {
    24.0
}

fn default_top() -> Offset {
    Offset::Percent(40.0)
}

fn default_left() -> Offset {
    Offset::Percent(50.0)
}

fn default_true() -> bool {
    true
}

fn default_tint() -> Color {
    Color(0x00_E8_F0_FF)
}

fn default_tint_strength() -> f32 {
    0.06
}

fn default_rim_strength() -> f32 {
    0.35
}

fn default_rim_width() -> f32 {
    3.0
}

fn default_gloss() -> f32 {
    0.08
}

impl Default for LensConfig {
    fn default() -> Self {
        Self {
            width: default_lens_width(),
            height: default_lens_height(),
            corner_radius: default_corner_radius(),
            max_displacement: default_max_displacement(),
            edge_band: default_edge_band(),
            falloff: 0.0,
            top: default_top(),
            left: default_left(),
            centered: true,
            tint: default_tint(),
            tint_strength: default_tint_strength(),
            rim_strength: default_rim_strength(),
            rim_width: default_rim_width(),
            gloss: default_gloss(),
            distortion: true,
        }
    }
}

impl LensConfig {
    pub fn shape(&self) -> ShapeParams {
        ShapeParams {
            max_displacement: self.max_displacement,
            edge_band: self.edge_band,
            falloff: self.falloff,
        }
    }

    /// Initial lens center inside a `viewport_w x viewport_h` window.
    pub fn initial_center(&self, viewport_w: f32, viewport_h: f32) -> (f32, f32) {
        let left = self.left.resolve(viewport_w);
        let top = self.top.resolve(viewport_h);
        if self.centered {
            (left, top)
        } else {
            (left + self.width * 0.5, top + self.height * 0.5)
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DragConfig {
    /// Pixels of the lens box kept on screen while dragging.
    #[serde(default = "default_min_visible")]
    pub min_visible: f32,
}

fn default_min_visible() -> f32 {
    24.0
}

impl Default for DragConfig {
    fn default() -> Self {
        Self { min_visible: default_min_visible() }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BackdropKind {
    /// Built-in gradient + pattern + cards.
    #[default]
    Scene,
    /// An image file, scaled to cover the window.
    Image,
    /// Live webcam (needs the `camera` feature).
    Camera,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct BackdropConfig {
    #[serde(default)]
    pub kind: BackdropKind,
    #[serde(default)]
    pub image: Option<PathBuf>,
    #[serde(default)]
    pub camera_index: u32,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct HudConfig {
    #[serde(default = "default_true")]
    pub show: bool,
}

impl Default for HudConfig {
    fn default() -> Self {
        Self { show: true }
    }
}

/// A CSS-like length: `"40%"`, `"120px"` or a bare number of pixels.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
#[serde(try_from = "OffsetRepr", into = "String")]
pub enum Offset {
    Px(f32),
    Percent(f32),
}

impl Offset {
    pub fn resolve(&self, extent: f32) -> f32 {
        match *self {
            Offset::Px(v) => v,
            Offset::Percent(p) => extent * p / 100.0,
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum OffsetRepr {
    Number(f32),
    Text(String),
}

impl TryFrom<OffsetRepr> for Offset {
    type Error = String;

    fn try_from(repr: OffsetRepr) -> std::result::Result<Self, Self::Error> {
        match repr {
            OffsetRepr::Number(v) => Ok(Offset::Px(v)),
            OffsetRepr::Text(s) => s.parse(),
        }
    }
}

impl std::str::FromStr for Offset {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let t = s.trim();
        let (num, make): (&str, fn(f32) -> Offset) = if let Some(n) = t.strip_suffix('%') {
            (n, Offset::Percent)
        } else if let Some(n) = t.strip_suffix("px") {
            (n, Offset::Px)
        } else {
            (t, Offset::Px)
        };
        num.trim()
            .parse::<f32>()
            .ok()
            .filter(|v| v.is_finite())
            .map(make)
            .ok_or_else(|| format!("invalid offset {s:?} (expected e.g. \"40%\" or \"120px\")"))
    }
}

impl From<Offset> for String {
    fn from(o: Offset) -> Self {
        match o {
            Offset::Px(v) => format!("{v}px"),
            Offset::Percent(p) => format!("{p}%"),
        }
    }
}

/// sRGB color written as `"#rrggbb"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(try_from = "String", into = "String")]
pub struct Color(pub u32);

impl TryFrom<String> for Color {
    type Error = String;

    fn try_from(s: String) -> std::result::Result<Self, Self::Error> {
        let hex = s.trim().trim_start_matches('#');
        if hex.len() != 6 {
            return Err(format!("invalid color {s:?} (expected \"#rrggbb\")"));
        }
        u32::from_str_radix(hex, 16)
            .map(Color)
            .map_err(|_| format!("invalid color {s:?} (expected \"#rrggbb\")"))
    }
}

impl From<Color> for String {
    fn from(c: Color) -> Self {
        format!("#{:06x}", c.0 & 0x00FF_FFFF)
    }
}

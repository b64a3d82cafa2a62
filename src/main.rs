// What you SEE:
// • A backdrop (demo page, an image, or your webcam) fills the window.
// • A rounded glass lens floats on top and bends whatever is beneath it.
// • Hold Left Mouse on the lens and drag: it follows the pointer.
// • R puts the lens back, H toggles the HUD, ESC quits.
//
// Headless: `--snapshot out.png` renders one frame, `--dump-map map.png`
// writes the displacement map the lens is using.

mod backdrop;
#[cfg(feature = "camera")]
mod camera;
mod config;
mod dmap;
mod drag;
mod draw;
mod error;
mod field;
mod filter;
mod gamma;
mod lens;
mod sdf;
mod sheen;
mod types;

use backdrop::Backdrop;
use clap::Parser;
use config::{BackdropKind, Config};
use draw::{draw_text_5x7, Drawer};
use error::Error;
use lens::LiquidGlass;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;
use types::FrameBuffer;

#[derive(Parser)]
#[command(name = "liquid-glass")]
#[command(about = "A draggable glass lens that refracts what lies beneath it", long_about = None)]
#[command(version)]
struct Cli {
    /// TOML config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Window width
    #[arg(long)]
    width: Option<usize>,

    /// Window height
    #[arg(long)]
    height: Option<usize>,

    /// Lens width in pixels
    #[arg(long)]
    lens_width: Option<f32>,

    /// Lens height in pixels
    #[arg(long)]
    lens_height: Option<f32>,

    /// Lens corner radius in pixels
    #[arg(long)]
    corner_radius: Option<f32>,

    /// Strongest sampling offset in pixels
    #[arg(long)]
    max_displacement: Option<f32>,

    /// Use an image file as the backdrop
    #[arg(long, conflicts_with = "camera")]
    image: Option<PathBuf>,

    /// Use the webcam as the backdrop (needs the `camera` feature)
    #[arg(long)]
    camera: bool,

    /// Hide the HUD line
    #[arg(long)]
    no_hud: bool,

    /// Render one frame to this PNG and exit
    #[arg(long)]
    snapshot: Option<PathBuf>,

    /// Write the displacement map to this PNG and exit
    #[arg(long)]
    dump_map: Option<PathBuf>,
}

impl Cli {
    /// Flags win over the config file.
    fn apply(&self, cfg: &mut Config) {
        if let Some(v) = self.width { cfg.window.width = v; }
        if let Some(v) = self.height { cfg.window.height = v; }
        if let Some(v) = self.lens_width { cfg.lens.width = v; }
        if let Some(v) = self.lens_height { cfg.lens.height = v; }
        if let Some(v) = self.corner_radius { cfg.lens.corner_radius = v; }
        if let Some(v) = self.max_displacement { cfg.lens.max_displacement = v; }
        if let Some(p) = &self.image {
            cfg.backdrop.kind = BackdropKind::Image;
            cfg.backdrop.image = Some(p.clone());
        }
        if self.camera { cfg.backdrop.kind = BackdropKind::Camera; }
        if self.no_hud { cfg.hud.show = false; }
    }
}

fn main() -> Result<(), Error> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let mut cfg = Config::load(cli.config.as_deref())?;
    cli.apply(&mut cfg);

    /* --- Backdrop first: its size decides the window size --- */
    let mut backdrop = backdrop::open(&cfg.backdrop, cfg.window.width, cfg.window.height)?;
    let (w, h) = backdrop.size();
    info!(w, h, kind = ?cfg.backdrop.kind, "backdrop ready");

    let mut lens = LiquidGlass::new(&cfg.lens, cfg.drag.min_visible, (w, h));

    if cli.snapshot.is_some() || cli.dump_map.is_some() {
        return headless(backdrop.as_mut(), &mut lens, cli.snapshot.as_deref(), cli.dump_map.as_deref());
    }

    run_window(&cfg, backdrop.as_mut(), &mut lens)
}

/// Render without a window: one composed frame and/or the displacement map.
fn headless(
    backdrop: &mut dyn Backdrop,
    lens: &mut LiquidGlass,
    snapshot: Option<&Path>,
    dump_map: Option<&Path>,
) -> Result<(), Error> {
    if let Some(path) = snapshot {
        let (frame, _) = backdrop.next_frame()?;
        let mut screen = frame.clone();
        lens.render(frame, &mut screen);
        screen.to_rgb_image().save(path)?;
        info!(path = %path.display(), "snapshot written");
    }
    if let Some(path) = dump_map {
        let map = lens.displacement_map()?;
        map.save_png(path)?;
        info!(path = %path.display(), w = map.width(), h = map.height(), scale = map.scale(), "displacement map written");
    }
    Ok(())
}

fn run_window(cfg: &Config, backdrop: &mut dyn Backdrop, lens: &mut LiquidGlass) -> Result<(), Error> {
    let (w, h) = backdrop.size();
    let mut drawer = Drawer::new(&cfg.window.title, w, h, cfg.window.target_fps)?;

    /* --- Reusable screen buffer: backdrop copy + lens on top --- */
    let mut screen = FrameBuffer::new(w, h);
    let mut show_hud = cfg.hud.show;
    let mut dirty = true;
    let mut was_dragging = false;

    /* --- HUD / FPS (counts composed frames, not idle polls) --- */
    let mut last_fps_time = Instant::now();
    let mut frames_this_second: u32 = 0;
    let mut hud_fps_text = String::from("FPS: 0.0");

    /* ------------------------------ Main loop ------------------------------ */
    while drawer.is_open() && !drawer.esc_pressed() {
        /* 1) Inputs: pointer events drive the lens; keys drive the app. */
        for event in drawer.pointer_events() {
            dirty |= lens.handle_pointer(event);
        }
        let dragging = lens.drag_state().is_dragging();
        dirty |= dragging != was_dragging; // HUD tag changes
        was_dragging = dragging;

        if drawer.r_pressed_once() {
            lens.reset();
            dirty = true;
        }
        if drawer.h_pressed_once() {
            show_hud = !show_hud;
            dirty = true;
        }

        /* 2) Backdrop: static ones change once, the camera every frame. */
        let (frame, changed) = backdrop.next_frame()?;

        /* 3) Nothing moved and nothing changed: just pump window events. */
        if !(changed || dirty) {
            drawer.idle();
            continue;
        }

        if !screen.same_size(frame) {
            screen = FrameBuffer::new(frame.width, frame.height);
            lens.set_viewport(frame.width, frame.height);
        }
        screen.pixels.copy_from_slice(&frame.pixels);

        /* 4) The lens samples the untouched backdrop and draws over the screen. */
        lens.render(frame, &mut screen);

        if show_hud {
            let tag = if dragging { "DRAG" } else { "IDLE" };
            let c = lens.geometry().center();
            let glass = if lens.is_degraded() { " | STATIC" } else { "" };
            let hud = format!("{tag} | {:.0},{:.0}{glass} | {hud_fps_text}", c.x, c.y);
            draw_text_5x7(&mut screen, 8, 8, &hud, 0x00_FF_FF_FF);
        }

        /* 5) Present to the window. */
        drawer.present(&screen)?;
        dirty = false;

        /* 6) FPS counter (composed frames per second) */
        frames_this_second += 1;
        let now = Instant::now();
        if now.duration_since(last_fps_time) >= Duration::from_secs(1) {
            let secs = now.duration_since(last_fps_time).as_secs_f32();
            let fps = frames_this_second as f32 / secs;
            debug!(fps, map_builds = lens.map_builds(), "frame stats");
            hud_fps_text = format!("FPS: {:.1}", fps);
            frames_this_second = 0;
            last_fps_time = now;
        }
    }

    info!("window closed");
    Ok(())
}

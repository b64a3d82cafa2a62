// Window + software drawing utilities.
// 1) A window that shows the composed frame (backdrop + glass lens).
// 2) Polled mouse state turned into discrete pointer events for the lens.
// 3) A tiny 5x7 bitmap font for the HUD and the backdrop captions.

use crate::drag::PointerEvent;
use crate::error::Error;
use crate::types::FrameBuffer;
use glam::Vec2;
use minifb::{Key, KeyRepeat, MouseButton, MouseMode, Window, WindowOptions};

pub struct Drawer {
    window: Window,           // the on-screen window you see
    was_down: bool,           // left button state at the previous poll
    last_pos: Option<Vec2>,   // pointer position at the previous poll
}

impl Drawer {
    /// Create a window sized to the backdrop.
    pub fn new(title: &str, width: usize, height: usize, target_fps: usize) -> Result<Self, Error> {
        let mut window = Window::new(title, width, height, WindowOptions::default())
            .map_err(|e| Error::WindowInit(e.to_string()))?;
        window.set_target_fps(target_fps.max(1));
        Ok(Self { window, was_down: false, last_pos: None })
    }

    /// Push the pixels for this frame to the screen.
    pub fn present(&mut self, framebuffer: &FrameBuffer) -> Result<(), Error> {
        self.window
            .update_with_buffer(&framebuffer.pixels, framebuffer.width, framebuffer.height)
            .map_err(|e| Error::WindowUpdate(e.to_string()))?;
        Ok(())
    }

    /// Pump window events without uploading a new frame (nothing changed).
    pub fn idle(&mut self) {
        self.window.update();
    }

    /// Returns false when the user closes the window (so we can stop the loop).
    pub fn is_open(&self) -> bool {
        self.window.is_open()
    }

    pub fn esc_pressed(&self) -> bool {
        self.window.is_key_down(Key::Escape)
    }

    // R: put the lens back where it started.
    pub fn r_pressed_once(&self) -> bool {
        self.window.is_key_pressed(Key::R, KeyRepeat::No)
    }

    // H: show/hide the HUD line.
    pub fn h_pressed_once(&self) -> bool {
        self.window.is_key_pressed(Key::H, KeyRepeat::No)
    }

    /// Translate this poll's mouse state into pointer events.
    /// The pointer may sit outside the window mid-drag (MouseMode::Pass); losing
    /// focus while the button is held becomes a Cancel.
    pub fn pointer_events(&mut self) -> Vec<PointerEvent> {
        let pos = self
            .window
            .get_mouse_pos(MouseMode::Pass)
            .map(|(x, y)| Vec2::new(x, y));
        let down = self.window.get_mouse_down(MouseButton::Left);

        if self.was_down && !self.window.is_active() {
            self.was_down = false;
            self.last_pos = pos;
            return vec![PointerEvent::Cancel];
        }

        let events = translate_pointer(self.was_down, self.last_pos, down, pos);
        self.was_down = down;
        if pos.is_some() {
            self.last_pos = pos;
        }
        events
    }
}

/// Edge-detect one poll of (button, position) against the previous poll.
fn translate_pointer(was_down: bool, last_pos: Option<Vec2>, down: bool, pos: Option<Vec2>) -> Vec<PointerEvent> {
    let mut out = Vec::with_capacity(2);
    if let Some(p) = pos {
        if last_pos != Some(p) {
            out.push(PointerEvent::Move(p));
        }
    }
    match (was_down, down) {
        (false, true) => {
            if let Some(p) = pos {
                out.push(PointerEvent::Down(p));
            }
        }
        (true, false) => {
            // released somewhere we may not see: report the last known spot
            out.push(PointerEvent::Up(pos.or(last_pos).unwrap_or(Vec2::ZERO)));
        }
        _ => {}
    }
    out
}

/* ---------- Software drawing: pixels, rectangles, tiny bitmap font ---------- */

/// Put a pixel on the framebuffer if (x,y) is inside bounds.
#[inline]
fn put_pixel(fb: &mut FrameBuffer, x: i32, y: i32, color: u32) {
    if x < 0 || y < 0 {
        return;
    }
    let (x, y) = (x as usize, y as usize);
    if x >= fb.width || y >= fb.height {
        return;
    }
    let idx = y * fb.width + x;
    fb.pixels[idx] = color;
}

/// Fill an axis-aligned block (clipped).
fn fill_block(fb: &mut FrameBuffer, x: i32, y: i32, size: i32, color: u32) {
    for yy in y..y + size {
        for xx in x..x + size {
            put_pixel(fb, xx, yy, color);
        }
    }
}

/// Return a 5x7 glyph bitmap. Lowercase letters reuse the uppercase shapes.
/// Each u8 is a row; the low 5 bits are the pixels (bit 4 = leftmost).
fn glyph5x7(ch: char) -> Option<[u8; 7]> {
    macro_rules! g { ($a:expr,$b:expr,$c:expr,$d:expr,$e:expr,$f:expr,$g:expr) => {
        Some([$a,$b,$c,$d,$e,$f,$g])
    }; }

    match ch.to_ascii_uppercase() {
        '0' => g!(0b01110,0b10001,0b10011,0b10101,0b11001,0b10001,0b01110),
        '1' => g!(0b00100,0b01100,0b00100,0b00100,0b00100,0b00100,0b01110),
        '2' => g!(0b01110,0b10001,0b00001,0b00010,0b00100,0b01000,0b11111),
        '3' => g!(0b11110,0b00001,0b00001,0b01110,0b00001,0b00001,0b11110),
        '4' => g!(0b00010,0b00110,0b01010,0b10010,0b11111,0b00010,0b00010),
        '5' => g!(0b11111,0b10000,0b11110,0b00001,0b00001,0b10001,0b01110),
        '6' => g!(0b00110,0b01000,0b10000,0b11110,0b10001,0b10001,0b01110),
        '7' => g!(0b11111,0b00001,0b00010,0b00100,0b01000,0b01000,0b01000),
        '8' => g!(0b01110,0b10001,0b10001,0b01110,0b10001,0b10001,0b01110),
        '9' => g!(0b01110,0b10001,0b10001,0b01111,0b00001,0b00010,0b01100),

        'A' => g!(0b01110,0b10001,0b10001,0b11111,0b10001,0b10001,0b10001),
        'B' => g!(0b11110,0b10001,0b10001,0b11110,0b10001,0b10001,0b11110),
        'C' => g!(0b01110,0b10001,0b10000,0b10000,0b10000,0b10001,0b01110),
        'D' => g!(0b11100,0b10010,0b10001,0b10001,0b10001,0b10010,0b11100),
        'E' => g!(0b11111,0b10000,0b10000,0b11110,0b10000,0b10000,0b11111),
        'F' => g!(0b11111,0b10000,0b10000,0b11110,0b10000,0b10000,0b10000),
        'G' => g!(0b01110,0b10001,0b10000,0b10111,0b10001,0b10001,0b01111),
        'H' => g!(0b10001,0b10001,0b10001,0b11111,0b10001,0b10001,0b10001),
        'I' => g!(0b01110,0b00100,0b00100,0b00100,0b00100,0b00100,0b01110),
        'J' => g!(0b00111,0b00010,0b00010,0b00010,0b00010,0b10010,0b01100),
        'K' => g!(0b10001,0b10010,0b10100,0b11000,0b10100,0b10010,0b10001),
        'L' => g!(0b10000,0b10000,0b10000,0b10000,0b10000,0b10000,0b11111),
        'M' => g!(0b10001,0b11011,0b10101,0b10101,0b10001,0b10001,0b10001),
        'N' => g!(0b10001,0b10001,0b11001,0b10101,0b10011,0b10001,0b10001),
        'O' => g!(0b01110,0b10001,0b10001,0b10001,0b10001,0b10001,0b01110),
        'P' => g!(0b11110,0b10001,0b10001,0b11110,0b10000,0b10000,0b10000),
        'Q' => g!(0b01110,0b10001,0b10001,0b10001,0b10101,0b10010,0b01101),
        'R' => g!(0b11110,0b10001,0b10001,0b11110,0b10100,0b10010,0b10001),
        'S' => g!(0b01111,0b10000,0b10000,0b01110,0b00001,0b00001,0b11110),
        'T' => g!(0b11111,0b00100,0b00100,0b00100,0b00100,0b00100,0b00100),
        'U' => g!(0b10001,0b10001,0b10001,0b10001,0b10001,0b10001,0b01110),
        'V' => g!(0b10001,0b10001,0b10001,0b10001,0b10001,0b01010,0b00100),
        'W' => g!(0b10001,0b10001,0b10001,0b10101,0b10101,0b10101,0b01010),
        'X' => g!(0b10001,0b10001,0b01010,0b00100,0b01010,0b10001,0b10001),
        'Y' => g!(0b10001,0b10001,0b01010,0b00100,0b00100,0b00100,0b00100),
        'Z' => g!(0b11111,0b00001,0b00010,0b00100,0b01000,0b10000,0b11111),

        ' ' => g!(0b00000,0b00000,0b00000,0b00000,0b00000,0b00000,0b00000),
        '|' => g!(0b00100,0b00100,0b00100,0b00100,0b00100,0b00100,0b00100),
        ':' => g!(0b00000,0b00100,0b00000,0b00000,0b00100,0b00000,0b00000),
        '.' => g!(0b00000,0b00000,0b00000,0b00000,0b00000,0b00100,0b00000),
        ',' => g!(0b00000,0b00000,0b00000,0b00000,0b00100,0b00100,0b01000),
        '-' => g!(0b00000,0b00000,0b00000,0b11111,0b00000,0b00000,0b00000),
        '+' => g!(0b00000,0b00100,0b00100,0b11111,0b00100,0b00100,0b00000),
        '/' => g!(0b00001,0b00010,0b00010,0b00100,0b01000,0b01000,0b10000),
        '%' => g!(0b11001,0b11010,0b00010,0b00100,0b01000,0b01011,0b10011),

        _ => None,
    }
}

/// Draw one glyph, each font pixel a `scale`x`scale` block, with a 1-block
/// black shadow for contrast.
fn draw_char(fb: &mut FrameBuffer, x: i32, y: i32, ch: char, color: u32, scale: i32) {
    let Some(rows) = glyph5x7(ch) else { return };
    for (shadow, c) in [(scale, 0x00000000), (0, color)] {
        for (ry, rowbits) in rows.iter().enumerate() {
            for rx in 0..5 {
                if (rowbits & (1 << (4 - rx))) != 0 {
                    fill_block(fb, x + rx * scale + shadow, y + ry as i32 * scale + shadow, scale, c);
                }
            }
        }
    }
}

/// Draw a text string using 5x7 glyphs (HUD size).
pub fn draw_text_5x7(fb: &mut FrameBuffer, x: i32, y: i32, text: &str, color: u32) {
    draw_text_scaled(fb, x, y, text, color, 1);
}

/// Draw a text string with every font pixel blown up `scale` times.
pub fn draw_text_scaled(fb: &mut FrameBuffer, mut x: i32, y: i32, text: &str, color: u32, scale: i32) {
    let scale = scale.max(1);
    for ch in text.chars() {
        draw_char(fb, x, y, ch, color, scale);
        x += 6 * scale; // 5 pixels glyph width + 1 pixel spacing
    }
}

/// Width in pixels of `text` drawn at `scale`.
pub fn text_width(text: &str, scale: i32) -> i32 {
    let n = text.chars().count() as i32;
    if n == 0 { 0 } else { (n * 6 - 1) * scale.max(1) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn press_drag_release_sequence() {
        let a = Vec2::new(10.0, 10.0);
        let b = Vec2::new(30.0, 12.0);
        assert_eq!(translate_pointer(false, None, true, Some(a)), vec![PointerEvent::Move(a), PointerEvent::Down(a)]);
        assert_eq!(translate_pointer(true, Some(a), true, Some(b)), vec![PointerEvent::Move(b)]);
        assert_eq!(translate_pointer(true, Some(b), true, Some(b)), vec![]);
        assert_eq!(translate_pointer(true, Some(b), false, Some(b)), vec![PointerEvent::Up(b)]);
    }

    #[test]
    fn release_outside_the_window_uses_last_position() {
        let b = Vec2::new(30.0, 12.0);
        assert_eq!(translate_pointer(true, Some(b), false, None), vec![PointerEvent::Up(b)]);
    }

    #[test]
    fn every_letter_has_a_glyph() {
        for ch in ('A'..='Z').chain('a'..='z').chain('0'..='9') {
            assert!(glyph5x7(ch).is_some(), "missing {ch}");
        }
        assert!(glyph5x7('~').is_none());
    }

    #[test]
    fn text_is_drawn_and_clipped() {
        let mut fb = FrameBuffer::new(40, 12);
        draw_text_scaled(&mut fb, 1, 1, "HI", 0x00FFFFFF, 1);
        assert!(fb.pixels.iter().any(|&p| p == 0x00FFFFFF));
        // way off screen: no panic, nothing drawn
        let mut fb = FrameBuffer::new(10, 10);
        draw_text_scaled(&mut fb, -500, 500, "GLASS", 0x00FFFFFF, 3);
        assert!(fb.pixels.iter().all(|&p| p == 0));
        assert_eq!(text_width("AB", 2), 22);
        assert_eq!(text_width("", 2), 0);
    }
}

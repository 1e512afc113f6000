// Window + input + on-screen overlay.
// The window shows the canvas; mouse button transitions become pointer
// events and key presses become shell commands. The brush cursor and color
// swatch are drawn onto the displayed frame only, never into the drawing.

use crate::app::{Command, FilterChoice};
use crate::canvas::PointerEvent;
use crate::error::Error;
use crate::stroke::MAX_BRUSH_WIDTH;
use crate::types::{Color, FrameBuffer, Point};
use minifb::{Key, KeyRepeat, MouseButton, MouseMode, Window, WindowOptions};

pub struct Drawer {
    window: Window,
    tracker: PointerTracker,
    title: String,
}

impl Drawer {
    pub fn new(title: &str, width: usize, height: usize) -> Result<Self, Error> {
        let mut window = Window::new(title, width, height, WindowOptions::default())
            .map_err(|e| Error::WindowInit(e.to_string()))?;
        window.set_target_fps(60);
        Ok(Self {
            window,
            tracker: PointerTracker::default(),
            title: title.to_owned(),
        })
    }

    /// Push the pixels for this frame to the screen; also pumps window events.
    pub fn present(&mut self, framebuffer: &FrameBuffer) -> Result<(), Error> {
        self.window
            .update_with_buffer(&framebuffer.pixels, framebuffer.width, framebuffer.height)
            .map_err(|e| Error::WindowUpdate(e.to_string()))?;
        Ok(())
    }

    pub fn is_open(&self) -> bool {
        self.window.is_open()
    }

    pub fn esc_pressed(&self) -> bool {
        self.window.is_key_down(Key::Escape)
    }

    pub fn set_title(&mut self, title: &str) {
        if self.title != title {
            self.window.set_title(title);
            self.title = title.to_owned();
        }
    }

    /// Mouse position in window pixels, clamped to the window.
    pub fn mouse_pos(&self) -> Option<(f32, f32)> {
        self.window.get_mouse_pos(MouseMode::Clamp)
    }

    /// Pointer event for this frame, if the mouse did anything that matters.
    pub fn pointer_event(&mut self) -> Option<PointerEvent> {
        let down = self.window.get_mouse_down(MouseButton::Left);
        let pos = self.mouse_pos();
        let focused = self.window.is_active();
        self.tracker.update(down, pos, focused)
    }

    /// Commands for keys pressed since the previous frame.
    pub fn commands(&self) -> Vec<Command> {
        let shift = self.window.is_key_down(Key::LeftShift) || self.window.is_key_down(Key::RightShift);
        self.window
            .get_keys_pressed(KeyRepeat::No)
            .into_iter()
            .filter_map(|key| key_command(key, shift))
            .collect()
    }
}

fn key_command(key: Key, shift: bool) -> Option<Command> {
    let cmd = match key {
        Key::U => Command::Undo,
        Key::R => Command::Redo,
        Key::Key1 => Command::BrushPreset(0),
        Key::Key2 => Command::BrushPreset(1),
        Key::Key3 => Command::BrushPreset(2),
        Key::C => Command::NextColor,
        Key::V => Command::PreviousColor,
        Key::G => Command::ArmFilter(FilterChoice::Grayscale),
        Key::I => Command::ArmFilter(FilterChoice::Invert),
        Key::K => Command::ArmFilter(FilterChoice::Sketch),
        Key::O => Command::ArmFilter(FilterChoice::Oil),
        Key::T if shift => Command::ArmFilter(FilterChoice::TintWithBrush),
        Key::T => Command::ArmFilter(FilterChoice::Tint),
        Key::Enter | Key::NumPadEnter => Command::ConfirmFilter,
        Key::N => Command::CancelFilter,
        Key::S => Command::Save,
        Key::H => Command::Share,
        Key::W => Command::SendToPeer,
        Key::L => Command::ReloadImage,
        Key::P => Command::CameraStill,
        _ => return None,
    };
    Some(cmd)
}

/// Turns sampled mouse state into pointer-down/move/up/cancel transitions.
#[derive(Debug, Default)]
pub struct PointerTracker {
    down: bool,
    last: Option<Point>,
}

impl PointerTracker {
    pub fn update(&mut self, down: bool, pos: Option<(f32, f32)>, focused: bool) -> Option<PointerEvent> {
        let pos = pos.map(|(x, y)| Point::new(x, y));
        let event = match (self.down, down) {
            (true, _) if !focused => Some(PointerEvent::Cancel),
            (false, true) => pos.map(PointerEvent::Down),
            (true, true) => pos.filter(|p| Some(*p) != self.last).map(PointerEvent::Move),
            (true, false) => Some(match pos.or(self.last) {
                Some(p) => PointerEvent::Up(p),
                None => PointerEvent::Cancel,
            }),
            (false, false) => None,
        };

        match event {
            Some(PointerEvent::Cancel) | Some(PointerEvent::Up(_)) => {
                self.down = false;
                self.last = None;
            }
            Some(PointerEvent::Down(p)) | Some(PointerEvent::Move(p)) => {
                self.down = true;
                self.last = Some(p);
            }
            None => {}
        }
        event
    }
}

/* ---------- Overlay drawing ---------- */

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

/// Ring outline of radius `r` (midpoint circle).
fn draw_ring(fb: &mut FrameBuffer, cx: i32, cy: i32, r: i32, color: u32) {
    let (mut x, mut y) = (r, 0);
    let mut err = 1 - r;
    while x >= y {
        for (dx, dy) in [(x, y), (y, x), (-y, x), (-x, y), (-x, -y), (-y, -x), (y, -x), (x, -y)] {
            put_pixel(fb, cx + dx, cy + dy, color);
        }
        y += 1;
        if err < 0 {
            err += 2 * y + 1;
        } else {
            x -= 1;
            err += 2 * (y - x) + 1;
        }
    }
}

fn fill_rect(fb: &mut FrameBuffer, x0: i32, y0: i32, w: i32, h: i32, color: u32) {
    for y in y0..y0 + h {
        for x in x0..x0 + w {
            put_pixel(fb, x, y, color);
        }
    }
}

/// Outline of the brush footprint at the cursor. Drawn twice, dark and
/// light, so it stays visible on any background.
pub fn draw_brush_cursor(fb: &mut FrameBuffer, cx: i32, cy: i32, width: f32) {
    let r = (width.min(MAX_BRUSH_WIDTH) * 0.5).round().max(1.0) as i32;
    draw_ring(fb, cx, cy, r + 1, 0x00_00_00_00);
    draw_ring(fb, cx, cy, r, 0x00_FF_FF_FF);
    put_pixel(fb, cx, cy, 0x00_00_00_00);
}

/// Current brush color in the top-left corner, framed in black.
pub fn draw_swatch(fb: &mut FrameBuffer, color: Color) {
    fill_rect(fb, 6, 6, 20, 20, 0x00_00_00_00);
    fill_rect(fb, 8, 8, 16, 16, color.to_xrgb());
}

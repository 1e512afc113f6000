//! The drawing surface: a background raster, the committed strokes drawn
//! on it, the stroke under the pointer and the undo/redo history.
//!
//! All mutation goes through the named operations below. Replacing the
//! background (loading an image or applying a filter) flattens and drops the
//! whole stroke history; there is no way back from that.

use image::RgbaImage;
use tracing::{debug, info, trace};

use crate::error::Error;
use crate::filter::{FilterGateway, FilterId};
use crate::gamma::GammaLut;
use crate::render;
use crate::stroke::{MAX_BRUSH_WIDTH, Stroke, StrokeStyle};
use crate::types::{Color, FrameBuffer, Point};

/// Pointer input in canvas pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointerEvent {
    Down(Point),
    Move(Point),
    Up(Point),
    Cancel,
}

/// The stroke being drawn between a pointer-down and its pointer-up.
#[derive(Debug, Clone)]
struct InProgress {
    points: Vec<Point>,
    // Style captured at pointer-down; this is what gets committed.
    snapshot: StrokeStyle,
}

impl InProgress {
    fn push(&mut self, p: Point) {
        if self.points.last() != Some(&p) {
            self.points.push(p);
        }
    }
}

#[derive(Debug, Clone)]
enum PointerState {
    Idle,
    Drawing(InProgress),
}

#[derive(Debug)]
pub struct StrokeCanvas {
    width: u32,
    height: u32,
    background: FrameBuffer,
    committed: Vec<Stroke>,
    undone: Vec<Stroke>,
    pointer: PointerState,
    current_style: StrokeStyle,
    // Background + committed strokes, rebuilt lazily after an undo.
    flattened: Option<FrameBuffer>,
    needs_redraw: bool,
    lut: GammaLut,
}

impl StrokeCanvas {
    /// A blank canvas filled with `background`. Both sides must be non-zero.
    pub fn new(width: u32, height: u32, background: Color) -> Result<Self, Error> {
        if width == 0 || height == 0 {
            return Err(Error::InvalidDimension { width, height });
        }
        Ok(Self {
            width,
            height,
            background: FrameBuffer::new(width as usize, height as usize, background),
            committed: Vec::new(),
            undone: Vec::new(),
            pointer: PointerState::Idle,
            current_style: StrokeStyle::default(),
            flattened: None,
            needs_redraw: true,
            lut: GammaLut::new(),
        })
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn committed(&self) -> &[Stroke] {
        &self.committed
    }

    pub fn undone(&self) -> &[Stroke] {
        &self.undone
    }

    pub fn is_drawing(&self) -> bool {
        matches!(self.pointer, PointerState::Drawing(_))
    }

    pub fn current_style(&self) -> &StrokeStyle {
        &self.current_style
    }

    /// Returns whether a redraw was requested since the last call, and
    /// clears the request.
    pub fn take_redraw(&mut self) -> bool {
        std::mem::take(&mut self.needs_redraw)
    }

    /// Feed one pointer event through the state machine. Returns true when
    /// the event changed the canvas; out-of-order events are ignored.
    pub fn handle(&mut self, event: PointerEvent) -> bool {
        trace!(?event, "pointer");
        match event {
            PointerEvent::Down(p) => {
                // A repeated down restarts the stroke; the abandoned one is dropped.
                self.undone.clear();
                self.pointer = PointerState::Drawing(InProgress {
                    points: vec![p],
                    snapshot: self.current_style,
                });
                true
            }
            PointerEvent::Move(p) => {
                let PointerState::Drawing(stroke) = &mut self.pointer else {
                    return false;
                };
                stroke.push(p);
                self.needs_redraw = true;
                true
            }
            PointerEvent::Up(p) => {
                let PointerState::Drawing(mut done) =
                    std::mem::replace(&mut self.pointer, PointerState::Idle)
                else {
                    return false;
                };
                done.push(p);
                self.commit(Stroke::new(done.points, done.snapshot));
                true
            }
            PointerEvent::Cancel => {
                if !self.is_drawing() {
                    return false;
                }
                self.pointer = PointerState::Idle;
                self.needs_redraw = true;
                true
            }
        }
    }

    /// Width for the stroke being drawn (immediately visible) and for every
    /// stroke started from now on. Committed strokes keep their own width.
    /// Must lie in `(0, MAX_BRUSH_WIDTH]`.
    pub fn set_brush_size(&mut self, width: f32) -> Result<(), Error> {
        if !width.is_finite() || width <= 0.0 || width > MAX_BRUSH_WIDTH {
            return Err(Error::InvalidBrushWidth(width));
        }
        self.current_style.width = width;
        if self.is_drawing() {
            self.needs_redraw = true;
        }
        debug!(width, "brush size");
        Ok(())
    }

    /// Counterpart of [`set_brush_size`](Self::set_brush_size) for color.
    pub fn set_brush_color(&mut self, color: Color) {
        self.current_style.color = color;
        if self.is_drawing() {
            self.needs_redraw = true;
        }
        debug!(?color, "brush color");
    }

    /// Move the newest committed stroke onto the redo stack. False (and no
    /// change) when nothing is committed.
    pub fn undo(&mut self) -> bool {
        let Some(stroke) = self.committed.pop() else {
            return false;
        };
        self.undone.push(stroke);
        self.flattened = None;
        self.needs_redraw = true;
        true
    }

    /// Re-commit the most recently undone stroke. False (and no change) when
    /// the redo stack is empty.
    pub fn redo(&mut self) -> bool {
        let Some(stroke) = self.undone.pop() else {
            return false;
        };
        self.commit(stroke);
        true
    }

    /// Scale `image` to the canvas size and make it the background. Drops
    /// every stroke, committed, undone and in progress.
    /// The background is opaque: translucent pixels are composited over white.
    pub fn load_background(&mut self, image: &RgbaImage) -> Result<(), Error> {
        let (w, h) = image.dimensions();
        if w == 0 || h == 0 {
            return Err(Error::InvalidDimension { width: w, height: h });
        }
        let scaled = render::scale_to(image, self.width, self.height);
        self.replace_background(FrameBuffer::from_rgba(&scaled));
        info!(from_width = w, from_height = h, "background loaded");
        Ok(())
    }

    /// Flatten the drawing, run it through `gateway` and make the result the
    /// new background. Irreversible: history is cleared as with
    /// [`load_background`](Self::load_background). On any gateway failure the
    /// canvas is left exactly as it was.
    pub fn apply_filter(&mut self, filter: FilterId, gateway: &dyn FilterGateway) -> Result<(), Error> {
        let input = self.render_snapshot().to_rgba();
        let output = gateway.apply(filter, &input)?;
        if output.dimensions() != input.dimensions() {
            let (w, h) = output.dimensions();
            return Err(Error::Filter {
                filter,
                reason: format!("returned {w}x{h}, expected {}x{}", self.width, self.height),
            });
        }
        self.replace_background(FrameBuffer::from_rgba(&output));
        info!(%filter, "filter applied");
        Ok(())
    }

    /// Background plus committed strokes. The stroke being drawn is left out.
    pub fn render_snapshot(&mut self) -> FrameBuffer {
        self.flattened().clone()
    }

    /// Everything visible right now, including the stroke being drawn, which
    /// is painted with the live brush style.
    pub fn render_into(&mut self, out: &mut FrameBuffer) {
        let style = self.current_style;
        let layer = self.flattened();
        if out.width == layer.width && out.height == layer.height {
            out.pixels.copy_from_slice(&layer.pixels);
        } else {
            *out = layer.clone();
        }
        if let PointerState::Drawing(stroke) = &self.pointer {
            render::paint_path(out, &stroke.points, &style, &self.lut);
        }
    }

    fn flattened(&mut self) -> &FrameBuffer {
        self.flattened
            .get_or_insert_with(|| render::flatten(&self.background, &self.committed, &self.lut))
    }

    fn commit(&mut self, stroke: Stroke) {
        if let Some(layer) = self.flattened.as_mut() {
            render::paint_stroke(layer, &stroke, &self.lut);
        }
        self.committed.push(stroke);
        self.needs_redraw = true;
    }

    fn replace_background(&mut self, background: FrameBuffer) {
        self.background = background;
        self.committed.clear();
        self.undone.clear();
        self.pointer = PointerState::Idle;
        self.flattened = None;
        self.needs_redraw = true;
    }
}

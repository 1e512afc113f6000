// Application shell: turns user commands into canvas operations and gateway
// calls, and keeps a one-line status for the window title.
//
// Filters are two-step: a filter key only arms the filter, the confirm key
// applies it. Gateway failures are reported in the status and never change
// the drawing.

use std::path::PathBuf;

use image::RgbaImage;
use tracing::{error, info, warn};

use crate::camera::CameraCapture;
use crate::canvas::{PointerEvent, StrokeCanvas};
use crate::error::Error;
use crate::filter::{FilterGateway, FilterId};
use crate::palette::Palette;
use crate::persistence::PersistenceGateway;
use crate::remote::RemoteSketchChannel;
use crate::settings::Settings;
use crate::types::{Color, FrameBuffer};

pub const FILTER_WARNING: &str =
    "Filters cannot be undone and will flatten the drawing. Enter = apply, N = cancel";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterChoice {
    Grayscale,
    Invert,
    Sketch,
    Oil,
    /// Tint with the configured tint color.
    Tint,
    /// Tint with the current brush color.
    TintWithBrush,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Undo,
    Redo,
    BrushPreset(usize),
    NextColor,
    PreviousColor,
    ArmFilter(FilterChoice),
    ConfirmFilter,
    CancelFilter,
    Save,
    Share,
    SendToPeer,
    ReloadImage,
    CameraStill,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// The full drawing app.
    Main,
    /// The wearable counterpart: saving sends the sketch to the paired canvas.
    Companion,
}

/// External collaborators the shell talks to.
pub struct Gateways {
    pub filters: Box<dyn FilterGateway>,
    pub store: Box<dyn PersistenceGateway>,
    pub link: Box<dyn RemoteSketchChannel>,
}

pub struct App {
    canvas: StrokeCanvas,
    gateways: Gateways,
    mode: Mode,
    palette: Palette,
    presets: Vec<f32>,
    tint_color: Color,
    armed: Option<FilterId>,
    archive_received: bool,
    open_path: Option<PathBuf>,
    camera_index: u32,
    status: String,
}

impl App {
    pub fn new(settings: &Settings, mode: Mode, gateways: Gateways) -> Result<Self, Error> {
        let (width, height) = match mode {
            Mode::Main => (settings.canvas_width, settings.canvas_height),
            Mode::Companion => (settings.companion_width, settings.companion_height),
        };
        let mut canvas = StrokeCanvas::new(width, height, settings.background_color)?;
        canvas.set_brush_size(settings.brush_width)?;
        canvas.set_brush_color(settings.brush_color);

        let mut palette = Palette::new(settings.palette.clone());
        palette.select_color(settings.brush_color);

        Ok(Self {
            canvas,
            gateways,
            mode,
            palette,
            presets: settings.brush_presets.clone(),
            tint_color: settings.tint_color,
            armed: None,
            archive_received: settings.archive_received,
            open_path: None,
            camera_index: settings.camera_index,
            status: String::new(),
        })
    }

    pub fn canvas(&self) -> &StrokeCanvas {
        &self.canvas
    }

    pub fn armed_filter(&self) -> Option<FilterId> {
        self.armed
    }

    /// Window title text: the last message, or the filter warning while a
    /// filter is armed.
    pub fn title(&self) -> String {
        let base = match self.mode {
            Mode::Main => "Sketchpad",
            Mode::Companion => "Sketchpad companion",
        };
        let style = self.canvas.current_style();
        let head = format!(
            "{base} | {} {}px | {} strokes, {} undone",
            self.palette.selected().name,
            style.width,
            self.canvas.committed().len(),
            self.canvas.undone().len(),
        );
        match (self.armed, self.status.is_empty()) {
            (Some(filter), _) => format!("{head} | {filter}? {FILTER_WARNING}"),
            (None, true) => head,
            (None, false) => format!("{head} | {}", self.status),
        }
    }

    pub fn pointer(&mut self, event: PointerEvent) {
        self.canvas.handle(event);
    }

    /// Load `path` as the background now and remember it for `ReloadImage`.
    pub fn open_image(&mut self, path: PathBuf) -> Result<(), Error> {
        let image = image::open(&path)?.to_rgba8();
        self.canvas.load_background(&image)?;
        info!(path = %path.display(), "image opened");
        self.open_path = Some(path);
        Ok(())
    }

    pub fn command(&mut self, command: Command) {
        match command {
            Command::Undo => {
                if !self.canvas.undo() {
                    self.report("Nothing to undo");
                }
            }
            Command::Redo => {
                if !self.canvas.redo() {
                    self.report("Nothing to redo");
                }
            }
            Command::BrushPreset(i) => match self.presets.get(i).copied() {
                Some(width) => match self.canvas.set_brush_size(width) {
                    Ok(()) => self.status.clear(),
                    Err(e) => self.fail("Brush", e),
                },
                None => self.report(format!("No brush preset {}", i + 1)),
            },
            Command::NextColor => {
                let color = self.palette.next().color;
                self.canvas.set_brush_color(color);
                self.status.clear();
            }
            Command::PreviousColor => {
                let color = self.palette.previous().color;
                self.canvas.set_brush_color(color);
                self.status.clear();
            }
            Command::ArmFilter(choice) => {
                let filter = self.filter_for(choice);
                warn!(%filter, "filter armed, waiting for confirmation");
                self.armed = Some(filter);
            }
            Command::ConfirmFilter => self.confirm_filter(),
            Command::CancelFilter => {
                if self.armed.take().is_some() {
                    self.report("Filter canceled");
                }
            }
            Command::Save if self.mode == Mode::Companion => self.send_to_peer(),
            Command::Save => self.save(),
            Command::Share => self.share(),
            Command::SendToPeer => self.send_to_peer(),
            Command::ReloadImage => self.reload_image(),
            Command::CameraStill => self.camera_still(),
        }
    }

    /// Show a sketch that arrived over the link, if one is waiting.
    pub fn poll_remote(&mut self) {
        let Some(image) = self.gateways.link.take_received() else {
            return;
        };
        if let Err(e) = self.canvas.load_background(&image) {
            self.fail("Received sketch", e);
            return;
        }
        self.armed = None;
        self.report("Received a sketch");
        if self.archive_received {
            match self.gateways.store.save(&image) {
                Ok(path) => info!(path = %path.display(), "received sketch archived"),
                Err(e) => warn!("archive received sketch: {e}"),
            }
        }
    }

    /// Draw the visible canvas into `out` when a redraw was requested.
    /// Returns whether `out` changed.
    pub fn render_into(&mut self, out: &mut FrameBuffer) -> bool {
        if !self.canvas.take_redraw() {
            return false;
        }
        self.canvas.render_into(out);
        true
    }

    fn filter_for(&self, choice: FilterChoice) -> FilterId {
        match choice {
            FilterChoice::Grayscale => FilterId::Grayscale,
            FilterChoice::Invert => FilterId::Invert,
            FilterChoice::Sketch => FilterId::Sketch,
            FilterChoice::Oil => FilterId::Oil,
            FilterChoice::Tint => FilterId::Tint(self.tint_color),
            FilterChoice::TintWithBrush => FilterId::Tint(self.canvas.current_style().color),
        }
    }

    fn confirm_filter(&mut self) {
        let Some(filter) = self.armed.take() else {
            return;
        };
        match self.canvas.apply_filter(filter, self.gateways.filters.as_ref()) {
            Ok(()) => self.report(format!("Applied {filter}")),
            Err(e) => self.fail("Filter", e),
        }
    }

    fn snapshot(&mut self) -> RgbaImage {
        self.canvas.render_snapshot().to_rgba()
    }

    fn save(&mut self) {
        let image = self.snapshot();
        match self.gateways.store.save(&image) {
            Ok(path) => self.report(format!("Saved to {}", path.display())),
            Err(e) => self.fail("Save", e),
        }
    }

    fn share(&mut self) {
        let image = self.snapshot();
        match self.gateways.store.share(&image) {
            Ok(_) => self.report("Shared"),
            Err(e) => self.fail("Share", e),
        }
    }

    fn send_to_peer(&mut self) {
        let image = self.snapshot();
        self.gateways.link.send(&image);
        self.report("Sending to paired device");
    }

    fn reload_image(&mut self) {
        let Some(path) = self.open_path.clone() else {
            self.report("No image given with --open");
            return;
        };
        match self.open_image(path) {
            Ok(()) => self.report("Image reloaded"),
            Err(e) => self.fail("Open", e),
        }
    }

    fn camera_still(&mut self) {
        let still = CameraCapture::open(self.camera_index).and_then(|mut cam| cam.capture_still());
        match still.and_then(|img| self.canvas.load_background(&img)) {
            Ok(()) => self.report("Camera photo loaded"),
            Err(e) => self.fail("Camera", e),
        }
    }

    fn report(&mut self, message: impl Into<String>) {
        self.status = message.into();
        info!("{}", self.status);
    }

    fn fail(&mut self, what: &str, e: Error) {
        error!("{what}: {e}");
        self.status = format!("{what} failed: {e}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Point;
    use image::Rgba;
    use std::cell::RefCell;
    use std::path::Path;
    use std::rc::Rc;

    #[derive(Default)]
    struct Calls {
        filtered: Vec<FilterId>,
        saved: usize,
        shared: usize,
        sent: Vec<(u32, u32)>,
        inbox: Option<RgbaImage>,
    }

    type Shared = Rc<RefCell<Calls>>;

    struct FakeFilters(Shared, bool);

    impl FilterGateway for FakeFilters {
        fn apply(&self, filter: FilterId, image: &RgbaImage) -> Result<RgbaImage, Error> {
            self.0.borrow_mut().filtered.push(filter);
            if self.1 {
                return Err(Error::Filter { filter, reason: "unavailable".into() });
            }
            let mut out = image.clone();
            image::imageops::invert(&mut out);
            Ok(out)
        }
    }

    struct FakeStore(Shared);

    impl PersistenceGateway for FakeStore {
        fn save(&self, _image: &RgbaImage) -> Result<PathBuf, Error> {
            self.0.borrow_mut().saved += 1;
            Ok(Path::new("/pictures/sketch.png").to_path_buf())
        }

        fn share(&self, _image: &RgbaImage) -> Result<PathBuf, Error> {
            self.0.borrow_mut().shared += 1;
            Err(Error::Share("no handler".into()))
        }
    }

    struct FakeLink(Shared);

    impl RemoteSketchChannel for FakeLink {
        fn send(&self, image: &RgbaImage) {
            self.0.borrow_mut().sent.push(image.dimensions());
        }

        fn take_received(&self) -> Option<RgbaImage> {
            self.0.borrow_mut().inbox.take()
        }
    }

    fn app_with(mode: Mode, failing_filter: bool) -> (App, Shared) {
        let calls = Shared::default();
        let settings = Settings {
            canvas_width: 40,
            canvas_height: 30,
            companion_width: 20,
            companion_height: 20,
            ..Settings::default()
        };
        let gateways = Gateways {
            filters: Box::new(FakeFilters(calls.clone(), failing_filter)),
            store: Box::new(FakeStore(calls.clone())),
            link: Box::new(FakeLink(calls.clone())),
        };
        let app = App::new(&settings, mode, gateways).expect("app");
        (app, calls)
    }

    fn scribble(app: &mut App) {
        app.pointer(PointerEvent::Down(Point::new(5.0, 5.0)));
        app.pointer(PointerEvent::Move(Point::new(20.0, 10.0)));
        app.pointer(PointerEvent::Up(Point::new(30.0, 20.0)));
    }

    #[test]
    fn filters_wait_for_confirmation() {
        let (mut app, calls) = app_with(Mode::Main, false);
        scribble(&mut app);

        app.command(Command::ArmFilter(FilterChoice::Invert));
        assert_eq!(app.armed_filter(), Some(FilterId::Invert));
        assert!(app.title().contains(FILTER_WARNING));
        assert!(calls.borrow().filtered.is_empty());
        assert_eq!(app.canvas().committed().len(), 1);

        app.command(Command::ConfirmFilter);
        assert_eq!(calls.borrow().filtered, vec![FilterId::Invert]);
        assert!(app.canvas().committed().is_empty());
        assert_eq!(app.armed_filter(), None);
    }

    #[test]
    fn canceled_filter_is_never_applied() {
        let (mut app, calls) = app_with(Mode::Main, false);
        scribble(&mut app);
        app.command(Command::ArmFilter(FilterChoice::Oil));
        app.command(Command::CancelFilter);
        app.command(Command::ConfirmFilter);
        assert!(calls.borrow().filtered.is_empty());
        assert_eq!(app.canvas().committed().len(), 1);
    }

    #[test]
    fn failed_filter_keeps_the_drawing() {
        let (mut app, _calls) = app_with(Mode::Main, true);
        scribble(&mut app);
        app.command(Command::ArmFilter(FilterChoice::Sketch));
        app.command(Command::ConfirmFilter);
        assert_eq!(app.canvas().committed().len(), 1);
        assert!(app.title().contains("Filter failed"));
    }

    #[test]
    fn tint_uses_configured_or_brush_color() {
        let (mut app, _calls) = app_with(Mode::Main, false);
        app.command(Command::ArmFilter(FilterChoice::Tint));
        assert_eq!(app.armed_filter(), Some(FilterId::Tint(Color::WHITE)));

        app.command(Command::NextColor);
        app.command(Command::ArmFilter(FilterChoice::TintWithBrush));
        assert_eq!(app.armed_filter(), Some(FilterId::Tint(Color::RED)));
    }

    #[test]
    fn presets_and_palette_drive_the_brush() {
        let (mut app, _calls) = app_with(Mode::Main, false);
        app.command(Command::BrushPreset(2));
        assert_eq!(app.canvas().current_style().width, 50.0);
        app.command(Command::BrushPreset(7));
        assert_eq!(app.canvas().current_style().width, 50.0);
        app.command(Command::NextColor);
        assert_eq!(app.canvas().current_style().color, Color::RED);
        app.command(Command::PreviousColor);
        assert_eq!(app.canvas().current_style().color, Color::BLACK);
    }

    #[test]
    fn save_and_share_report_gateway_results() {
        let (mut app, calls) = app_with(Mode::Main, false);
        scribble(&mut app);
        app.command(Command::Save);
        assert!(app.title().contains("Saved to"));
        app.command(Command::Share);
        assert!(app.title().contains("Share failed"));
        assert_eq!(calls.borrow().saved, 1);
        assert_eq!(calls.borrow().shared, 1);
        assert_eq!(app.canvas().committed().len(), 1);
    }

    #[test]
    fn companion_save_sends_to_the_paired_canvas() {
        let (mut app, calls) = app_with(Mode::Companion, false);
        scribble(&mut app);
        app.command(Command::Save);
        assert_eq!(calls.borrow().saved, 0);
        assert_eq!(calls.borrow().sent, vec![(20, 20)]);
    }

    #[test]
    fn received_sketch_becomes_the_background() {
        let (mut app, calls) = app_with(Mode::Main, false);
        scribble(&mut app);
        app.command(Command::ArmFilter(FilterChoice::Grayscale));
        calls.borrow_mut().inbox = Some(RgbaImage::from_pixel(20, 20, Rgba([0, 0, 255, 255])));

        app.poll_remote();
        assert!(app.canvas().committed().is_empty());
        assert_eq!(app.armed_filter(), None);
        assert_eq!(calls.borrow().saved, 1);
        let mut screen = FrameBuffer::new(40, 30, Color::WHITE);
        assert!(app.render_into(&mut screen));
        assert_eq!(screen.pixel(10, 10), 0x000000ff);

        app.poll_remote();
        assert_eq!(calls.borrow().saved, 1);
        assert!(!app.render_into(&mut screen));
    }

    #[test]
    fn reload_without_open_path_is_reported() {
        let (mut app, _calls) = app_with(Mode::Main, false);
        app.command(Command::ReloadImage);
        assert!(app.title().contains("--open"));
    }

    #[test]
    fn opened_image_can_be_reloaded() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("photo.png");
        RgbaImage::from_pixel(8, 6, Rgba([0, 255, 0, 255])).save(&path).expect("write");

        let (mut app, _calls) = app_with(Mode::Main, false);
        app.open_image(path).expect("open");
        scribble(&mut app);
        app.command(Command::ReloadImage);
        assert!(app.canvas().committed().is_empty());
        assert!(app.title().contains("Image reloaded"));
    }
}

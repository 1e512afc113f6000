// What you SEE:
// • A white canvas. Hold Left Mouse to draw; U undoes, R redoes.
// • 1/2/3 pick a brush size, C/V walk the palette.
// • G I K O T arm a filter (Shift+T tints with the brush color); Enter
//   applies it, N cancels. Filters flatten the drawing for good.
// • S saves, H shares, W sends to the paired canvas, P grabs a camera
//   photo as background, L reloads the --open image. ESC quits.
//
// `--companion` opens the small wearable-side canvas, where S sends the
// sketch to the paired main canvas.

mod app;
mod brush;
mod camera;
mod canvas;
mod draw;
mod error;
mod filter;
mod gamma;
mod logging;
mod palette;
mod persistence;
mod remote;
mod render;
mod settings;
mod stroke;
mod types;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn};

use app::{App, Gateways, Mode};
use draw::{Drawer, draw_brush_cursor, draw_swatch};
use filter::ImageFilters;
use persistence::Gallery;
use remote::WearLink;
use settings::Settings;
use types::{Color, FrameBuffer};

/// Finger-painting canvas with undo, filters and a companion sketch link.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Settings file (default: sketchpad.json next to the executable)
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
    /// Open the small wearable-side canvas instead of the main one
    #[arg(long)]
    companion: bool,
    /// Image to load as the background; L reloads it
    #[arg(long, value_name = "IMAGE")]
    open: Option<PathBuf>,
}

fn main() -> Result<()> {
    let args = Args::parse();
    let settings_path = match args.config.clone() {
        Some(path) => path,
        None => settings::default_settings_path()?,
    };
    let settings = Settings::load_or_create(&settings_path)?;
    logging::init(settings.debug_logging);
    info!(path = %settings_path.display(), "settings loaded");

    let mode = if args.companion { Mode::Companion } else { Mode::Main };

    /* --- Gateways ---
       The companion only sends; the main canvas also listens. */
    let mut link = WearLink::new(settings.peer_socket()?);
    if mode == Mode::Main {
        if let Some(addr) = settings.listen_socket()? {
            link = match link.listen(addr) {
                Ok(listening) => {
                    if let Some(local) = listening.local_addr() {
                        info!(%local, "listening for sketches");
                    }
                    listening
                }
                Err(e) => {
                    warn!(%addr, "sketch link disabled: {e}");
                    WearLink::new(settings.peer_socket()?)
                }
            };
        }
    }
    let gateways = Gateways {
        filters: Box::new(ImageFilters::default()),
        store: Box::new(Gallery::new(settings.resolved_save_dir(), settings.resolved_share_dir())),
        link: Box::new(link),
    };

    let mut app = App::new(&settings, mode, gateways).context("create canvas")?;
    if let Some(path) = args.open {
        if let Err(e) = app.open_image(path.clone()) {
            warn!(path = %path.display(), "could not open image: {e}");
        }
    }

    let (w, h) = app.canvas().dimensions();
    let (w, h) = (w as usize, h as usize);
    let mut drawer = Drawer::new(&app.title(), w, h)?;

    // `canvas` holds the drawing as last rendered; `screen` adds the cursor.
    let mut canvas = FrameBuffer::new(w, h, Color::WHITE);
    let mut screen = canvas.clone();

    /* ------------------------------ Main loop ------------------------------ */
    while drawer.is_open() && !drawer.esc_pressed() {
        if let Some(event) = drawer.pointer_event() {
            app.pointer(event);
        }
        for command in drawer.commands() {
            app.command(command);
        }
        app.poll_remote();

        app.render_into(&mut canvas);
        screen.pixels.copy_from_slice(&canvas.pixels);
        let style = *app.canvas().current_style();
        draw_swatch(&mut screen, style.color);
        if let Some((mx, my)) = drawer.mouse_pos() {
            draw_brush_cursor(&mut screen, mx as i32, my as i32, style.width);
        }

        drawer.set_title(&app.title());
        drawer.present(&screen)?;
    }

    info!("bye");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Result<Args, clap::Error> {
        Args::try_parse_from(std::iter::once("sketchpad").chain(list.iter().copied()))
    }

    #[test]
    fn flags_are_recognised() {
        let a = args(&["--companion", "--config", "x.json", "--open", "p.png"]).expect("args");
        assert!(a.companion);
        assert_eq!(a.config, Some(PathBuf::from("x.json")));
        assert_eq!(a.open, Some(PathBuf::from("p.png")));
    }

    #[test]
    fn missing_values_and_unknown_flags_fail() {
        assert!(args(&["--config"]).is_err());
        assert!(args(&["--fast"]).is_err());
        let none = args(&[]).expect("args");
        assert!(!none.companion);
        assert_eq!(none.config, None);
    }

    #[test]
    fn argument_definitions_are_consistent() {
        use clap::CommandFactory;
        Args::command().debug_assert();
    }
}

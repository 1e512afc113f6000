// User settings, stored as JSON next to the executable unless a path is
// given on the command line. Every field has a default so old or partial
// files keep loading.

use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::palette::{NamedColor, default_brush_presets, default_colors};
use crate::types::Color;

pub const SETTINGS_FILE_NAME: &str = "sketchpad.json";
const DEFAULT_LINK_ADDR: &str = "127.0.0.1:47800";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default = "default_canvas_width")]
    pub canvas_width: u32,
    #[serde(default = "default_canvas_height")]
    pub canvas_height: u32,
    #[serde(default = "default_companion_side")]
    pub companion_width: u32,
    #[serde(default = "default_companion_side")]
    pub companion_height: u32,
    #[serde(default = "default_brush_width")]
    pub brush_width: f32,
    #[serde(default = "default_brush_color")]
    pub brush_color: Color,
    #[serde(default = "default_brush_presets")]
    pub brush_presets: Vec<f32>,
    #[serde(default = "default_colors")]
    pub palette: Vec<NamedColor>,
    #[serde(default = "default_background_color")]
    pub background_color: Color,
    #[serde(default = "default_tint_color")]
    pub tint_color: Color,
    #[serde(default)]
    pub save_dir: Option<PathBuf>,
    #[serde(default)]
    pub share_dir: Option<PathBuf>,
    #[serde(default = "default_link_addr")]
    pub listen_addr: Option<String>,
    #[serde(default = "default_link_addr")]
    pub peer_addr: Option<String>,
    #[serde(default = "default_archive_received")]
    pub archive_received: bool,
    #[serde(default)]
    pub camera_index: u32,
    #[serde(default)]
    pub debug_logging: bool,
}

fn default_canvas_width() -> u32 {
    800
}

fn default_canvas_height() -> u32 {
    600
}

fn default_companion_side() -> u32 {
    320
}

fn default_brush_width() -> f32 {
    10.0
}

fn default_brush_color() -> Color {
    Color::BLACK
}

fn default_background_color() -> Color {
    Color::WHITE
}

fn default_tint_color() -> Color {
    Color::WHITE
}

fn default_link_addr() -> Option<String> {
    Some(DEFAULT_LINK_ADDR.to_owned())
}

fn default_archive_received() -> bool {
    true
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            canvas_width: default_canvas_width(),
            canvas_height: default_canvas_height(),
            companion_width: default_companion_side(),
            companion_height: default_companion_side(),
            brush_width: default_brush_width(),
            brush_color: default_brush_color(),
            brush_presets: default_brush_presets(),
            palette: default_colors(),
            background_color: default_background_color(),
            tint_color: default_tint_color(),
            save_dir: None,
            share_dir: None,
            listen_addr: default_link_addr(),
            peer_addr: default_link_addr(),
            archive_received: default_archive_received(),
            camera_index: 0,
            debug_logging: false,
        }
    }
}

impl Settings {
    /// Load from `path`. A missing file is created with defaults; an empty
    /// file yields defaults.
    pub fn load_or_create(path: &Path) -> Result<Self> {
        if !path.exists() {
            let settings = Self::default();
            settings.save(path)?;
            info!(path = %path.display(), "wrote default settings");
            return Ok(settings);
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("read settings file {}", path.display()))?;
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        let settings = serde_json::from_str(&content)
            .with_context(|| format!("deserialize settings file {}", path.display()))?;
        Ok(settings)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("create settings folder {}", parent.display()))?;
        }
        let json = serde_json::to_string_pretty(self).context("serialize settings")?;
        fs::write(path, json).with_context(|| format!("write settings file {}", path.display()))
    }

    /// Where drawings are saved: the configured folder, the user's pictures
    /// folder, or `./drawings`.
    pub fn resolved_save_dir(&self) -> PathBuf {
        self.save_dir
            .clone()
            .or_else(dirs_next::picture_dir)
            .unwrap_or_else(|| PathBuf::from("drawings"))
    }

    pub fn resolved_share_dir(&self) -> PathBuf {
        self.share_dir.clone().unwrap_or_else(std::env::temp_dir)
    }

    pub fn peer_socket(&self) -> Result<Option<SocketAddr>> {
        parse_addr(self.peer_addr.as_deref(), "peer_addr")
    }

    pub fn listen_socket(&self) -> Result<Option<SocketAddr>> {
        parse_addr(self.listen_addr.as_deref(), "listen_addr")
    }
}

fn parse_addr(addr: Option<&str>, field: &str) -> Result<Option<SocketAddr>> {
    match addr.map(str::trim) {
        None | Some("") => Ok(None),
        Some(a) => a
            .parse()
            .map(Some)
            .map_err(|e| anyhow!("{field} {a:?} is not an ip:port address: {e}")),
    }
}

/// `sketchpad.json` next to the running executable.
pub fn default_settings_path() -> Result<PathBuf> {
    let exe = std::env::current_exe().context("resolve current executable")?;
    let parent = exe
        .parent()
        .ok_or_else(|| anyhow!("executable path has no parent: {}", exe.display()))?;
    Ok(parent.join(SETTINGS_FILE_NAME))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_is_created_with_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("nested").join(SETTINGS_FILE_NAME);
        let loaded = Settings::load_or_create(&path).expect("load");
        assert_eq!(loaded, Settings::default());
        assert!(path.exists());
        assert_eq!(Settings::load_or_create(&path).expect("reload"), loaded);
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join(SETTINGS_FILE_NAME);
        fs::write(&path, r#"{ "canvas_width": 1024, "peer_addr": null }"#).expect("write");
        let loaded = Settings::load_or_create(&path).expect("load");
        assert_eq!(loaded.canvas_width, 1024);
        assert_eq!(loaded.canvas_height, 600);
        assert_eq!(loaded.peer_addr, None);
        assert_eq!(loaded.brush_presets, vec![10.0, 25.0, 50.0]);
        assert_eq!(loaded.palette.len(), 11);
    }

    #[test]
    fn empty_file_yields_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join(SETTINGS_FILE_NAME);
        fs::write(&path, "  \n").expect("write");
        assert_eq!(Settings::load_or_create(&path).expect("load"), Settings::default());
    }

    #[test]
    fn malformed_file_is_an_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join(SETTINGS_FILE_NAME);
        fs::write(&path, "{ nope").expect("write");
        let err = Settings::load_or_create(&path).unwrap_err();
        assert!(err.to_string().contains("deserialize settings file"));
    }

    #[test]
    fn link_addresses_parse_or_explain() {
        let mut s = Settings::default();
        assert_eq!(
            s.peer_socket().expect("peer"),
            Some("127.0.0.1:47800".parse().expect("addr"))
        );
        s.listen_addr = Some(String::new());
        assert_eq!(s.listen_socket().expect("listen"), None);
        s.peer_addr = Some("watch.local".into());
        assert!(s.peer_socket().is_err());
    }
}

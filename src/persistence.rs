// Saving and sharing of the flattened drawing.
// Both consume a finished raster only; nothing here sees stroke history.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use image::{ImageFormat, RgbaImage};
use tracing::info;

use crate::error::Error;

/// File name the share flow writes before handing it to the OS.
pub const SHARE_FILE_NAME: &str = "image0.png";

pub trait PersistenceGateway {
    /// Store the image and return where it went.
    fn save(&self, image: &RgbaImage) -> Result<PathBuf, Error>;
    /// Hand the image to the platform's share/open flow.
    fn share(&self, image: &RgbaImage) -> Result<PathBuf, Error>;
}

/// PNG files in a pictures folder; sharing opens the file with the
/// desktop's default handler.
#[derive(Debug, Clone)]
pub struct Gallery {
    save_dir: PathBuf,
    share_dir: PathBuf,
    launch: fn(&Path) -> io::Result<()>,
}

impl Gallery {
    pub fn new(save_dir: impl Into<PathBuf>, share_dir: impl Into<PathBuf>) -> Self {
        Self {
            save_dir: save_dir.into(),
            share_dir: share_dir.into(),
            launch: open_with_default_app,
        }
    }

    /// Replace the OS launcher used by [`share`](PersistenceGateway::share).
    #[cfg(test)]
    pub fn with_launcher(mut self, launch: fn(&Path) -> io::Result<()>) -> Self {
        self.launch = launch;
        self
    }
}

impl PersistenceGateway for Gallery {
    fn save(&self, image: &RgbaImage) -> Result<PathBuf, Error> {
        fs::create_dir_all(&self.save_dir).map_err(|e| {
            Error::Persistence(format!("create {}: {e}", self.save_dir.display()))
        })?;
        let path = unique_path(&self.save_dir, &timestamped_stem(Local::now()));
        write_png(image, &path).map_err(Error::Persistence)?;
        info!(path = %path.display(), "drawing saved");
        Ok(path)
    }

    fn share(&self, image: &RgbaImage) -> Result<PathBuf, Error> {
        fs::create_dir_all(&self.share_dir)
            .map_err(|e| Error::Share(format!("create {}: {e}", self.share_dir.display())))?;
        let path = self.share_dir.join(SHARE_FILE_NAME);
        write_png(image, &path).map_err(Error::Share)?;
        (self.launch)(&path).map_err(|e| Error::Share(format!("open {}: {e}", path.display())))?;
        info!(path = %path.display(), "drawing shared");
        Ok(path)
    }
}

fn open_with_default_app(path: &Path) -> io::Result<()> {
    open::that(path)
}

fn write_png(image: &RgbaImage, path: &Path) -> Result<(), String> {
    image
        .save_with_format(path, ImageFormat::Png)
        .map_err(|e| format!("write {}: {e}", path.display()))
}

pub fn timestamped_stem(now: DateTime<Local>) -> String {
    format!("sketch_{}", now.format("%Y%m%d_%H%M%S"))
}

/// `<dir>/<stem>.png`, or `<dir>/<stem>_N.png` for the first free N.
pub fn unique_path(dir: &Path, stem: &str) -> PathBuf {
    let first = dir.join(format!("{stem}.png"));
    if !first.exists() {
        return first;
    }
    (1..)
        .map(|n| dir.join(format!("{stem}_{n}.png")))
        .find(|p| !p.exists())
        .unwrap_or(first)
}

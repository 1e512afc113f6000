// One error type for the whole app.
// Every variant states *where* things went wrong.
use crate::filter::FilterId;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("window init error: {0}")]
    WindowInit(String), // Creating the window failed
    #[error("window update error: {0}")]
    WindowUpdate(String), // Updating the window buffer failed
    #[error("camera init error: {0}")]
    CameraInit(String), // Opening/starting the camera failed
    #[error("camera frame error: {0}")]
    CameraFrame(String), // Grabbing/decoding a frame failed

    /// A raster or canvas with a zero side was handed to the canvas.
    #[error("invalid dimension {width}x{height}")]
    InvalidDimension { width: u32, height: u32 },
    #[error("invalid brush width {0}")]
    InvalidBrushWidth(f32),

    #[error("filter {filter} failed: {reason}")]
    Filter { filter: FilterId, reason: String },
    #[error("save failed: {0}")]
    Persistence(String),
    #[error("share failed: {0}")]
    Share(String),
    #[error("sketch link: {0}")]
    Link(String),

    #[error(transparent)]
    Image(#[from] image::ImageError),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

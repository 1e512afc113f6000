// Still capture from the webcam, used as a drawing background.
// The camera is opened only for the capture and released right after.

use crate::error::Error;

use image::{Rgba, RgbaImage};
use nokhwa::{
    Camera,
    pixel_format::RgbFormat,
    utils::{CameraIndex, RequestedFormat, RequestedFormatType},
};
use tracing::{debug, info};

// Auto exposure usually needs a few frames to settle.
const WARMUP_FRAMES: usize = 5;

pub struct CameraCapture {
    cam: Camera,
}

impl CameraCapture {
    /// Open camera `index` at its highest resolution.
    pub fn open(index: u32) -> Result<Self, Error> {
        let req = RequestedFormat::new::<RgbFormat>(RequestedFormatType::AbsoluteHighestResolution);
        let mut cam = Camera::new(CameraIndex::Index(index), req)
            .map_err(|e| Error::CameraInit(format!("create camera: {e}")))?;
        cam.open_stream()
            .map_err(|e| Error::CameraInit(format!("open stream: {e}")))?;
        let res = cam.resolution();
        debug!(index, width = res.width(), height = res.height(), "camera stream open");
        Ok(Self { cam })
    }

    /// Grab one frame as an opaque RGBA image.
    pub fn next_frame(&mut self) -> Result<RgbaImage, Error> {
        let frame = self
            .cam
            .frame()
            .map_err(|e| Error::CameraFrame(format!("fetch frame: {e}")))?;
        let rgb = frame
            .decode_image::<RgbFormat>()
            .map_err(|e| Error::CameraFrame(format!("decode RGB: {e}")))?;

        let (w, h) = rgb.dimensions();
        let mut out = RgbaImage::new(w, h);
        for (x, y, pixel) in rgb.enumerate_pixels() {
            out.put_pixel(x, y, Rgba([pixel[0], pixel[1], pixel[2], 255]));
        }
        Ok(out)
    }

    /// Let exposure settle, keep the last frame.
    pub fn capture_still(&mut self) -> Result<RgbaImage, Error> {
        let mut still = self.next_frame()?;
        for _ in 0..WARMUP_FRAMES {
            still = self.next_frame()?;
        }
        info!(width = still.width(), height = still.height(), "camera still captured");
        Ok(still)
    }
}

impl Drop for CameraCapture {
    fn drop(&mut self) {
        if let Err(e) = self.cam.stop_stream() {
            debug!("stop camera stream: {e}");
        }
    }
}

// Sketch link between the companion canvas and the main canvas.
//
// Wire format, one sketch per connection:
//   "SKCH" | version u8 | payload length u32 BE | PNG bytes
//
// Sending is best effort and happens on a worker thread. Received sketches
// land in a single pending slot that the event loop drains; a newer arrival
// replaces one that has not been shown yet.

use std::io::{Cursor, Read, Write};
use std::net::{SocketAddr, TcpListener, TcpStream, ToSocketAddrs};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use image::{ImageFormat, RgbaImage};
use tracing::{debug, info, warn};

use crate::error::Error;

pub const MAGIC: [u8; 4] = *b"SKCH";
pub const VERSION: u8 = 1;
pub const MAX_PAYLOAD: usize = 32 << 20;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(3);
const IO_TIMEOUT: Duration = Duration::from_secs(10);

pub trait RemoteSketchChannel {
    /// Transmit a flattened sketch. No delivery guarantee.
    fn send(&self, image: &RgbaImage);
    /// The newest sketch received since the last call, if any. Called from
    /// the event loop, so the caller can mutate the canvas directly.
    fn take_received(&self) -> Option<RgbaImage>;
}

pub fn write_frame<W: Write>(w: &mut W, payload: &[u8]) -> Result<(), Error> {
    if payload.len() > MAX_PAYLOAD {
        return Err(Error::Link(format!("payload of {} bytes is too large", payload.len())));
    }
    w.write_all(&MAGIC)?;
    w.write_all(&[VERSION])?;
    w.write_all(&(payload.len() as u32).to_be_bytes())?;
    w.write_all(payload)?;
    w.flush()?;
    Ok(())
}

pub fn read_frame<R: Read>(r: &mut R) -> Result<Vec<u8>, Error> {
    let mut header = [0u8; 9];
    r.read_exact(&mut header)?;
    if header[..4] != MAGIC {
        return Err(Error::Link("bad magic".into()));
    }
    if header[4] != VERSION {
        return Err(Error::Link(format!("unsupported version {}", header[4])));
    }
    let len = u32::from_be_bytes([header[5], header[6], header[7], header[8]]) as usize;
    if len > MAX_PAYLOAD {
        return Err(Error::Link(format!("payload of {len} bytes is too large")));
    }
    let mut payload = vec![0u8; len];
    r.read_exact(&mut payload)?;
    Ok(payload)
}

pub fn encode_png(image: &RgbaImage) -> Result<Vec<u8>, Error> {
    let mut out = Cursor::new(Vec::new());
    image.write_to(&mut out, ImageFormat::Png)?;
    Ok(out.into_inner())
}

pub fn decode_png(bytes: &[u8]) -> Result<RgbaImage, Error> {
    Ok(image::load_from_memory_with_format(bytes, ImageFormat::Png)?.to_rgba8())
}

/// Holds at most one received sketch waiting for display.
#[derive(Debug, Clone, Default)]
pub struct PendingSketch {
    slot: Arc<Mutex<Option<RgbaImage>>>,
}

impl PendingSketch {
    /// Store `image`; returns true when it replaced an unconsumed one.
    pub fn offer(&self, image: RgbaImage) -> bool {
        let mut slot = self.slot.lock().unwrap_or_else(|e| e.into_inner());
        slot.replace(image).is_some()
    }

    pub fn take(&self) -> Option<RgbaImage> {
        self.slot.lock().unwrap_or_else(|e| e.into_inner()).take()
    }
}

/// TCP transport standing in for the wearable message API.
#[derive(Debug)]
pub struct WearLink {
    peer: Option<SocketAddr>,
    local_addr: Option<SocketAddr>,
    pending: PendingSketch,
}

impl WearLink {
    /// A link that sends to `peer` (if paired) and receives nothing until
    /// [`listen`](Self::listen) is called.
    pub fn new(peer: Option<SocketAddr>) -> Self {
        Self {
            peer,
            local_addr: None,
            pending: PendingSketch::default(),
        }
    }

    /// Accept sketches on `addr` from a background thread.
    pub fn listen(mut self, addr: impl ToSocketAddrs) -> Result<Self, Error> {
        let listener = TcpListener::bind(addr)?;
        let local = listener.local_addr()?;
        let pending = self.pending.clone();
        thread::Builder::new()
            .name("sketch-link".into())
            .spawn(move || accept_loop(listener, pending))?;
        debug!(%local, "sketch listener thread started");
        self.local_addr = Some(local);
        Ok(self)
    }

    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.local_addr
    }
}

impl RemoteSketchChannel for WearLink {
    fn send(&self, image: &RgbaImage) {
        let Some(peer) = self.peer else {
            warn!("no paired device, sketch not sent");
            return;
        };
        let payload = match encode_png(image) {
            Ok(p) => p,
            Err(e) => {
                warn!("encode sketch: {e}");
                return;
            }
        };
        let spawned = thread::Builder::new()
            .name("sketch-send".into())
            .spawn(move || match transmit(peer, &payload) {
                Ok(()) => info!(%peer, bytes = payload.len(), "sketch sent"),
                Err(e) => warn!(%peer, "sketch not delivered: {e}"),
            });
        if let Err(e) = spawned {
            warn!("spawn sketch sender: {e}");
        }
    }

    fn take_received(&self) -> Option<RgbaImage> {
        self.pending.take()
    }
}

fn transmit(peer: SocketAddr, payload: &[u8]) -> Result<(), Error> {
    let mut stream = TcpStream::connect_timeout(&peer, CONNECT_TIMEOUT)?;
    stream.set_write_timeout(Some(IO_TIMEOUT))?;
    write_frame(&mut stream, payload)
}

fn accept_loop(listener: TcpListener, pending: PendingSketch) {
    for stream in listener.incoming() {
        let result = stream.map_err(Error::from).and_then(|mut s| {
            s.set_read_timeout(Some(IO_TIMEOUT))?;
            let payload = read_frame(&mut s)?;
            decode_png(&payload)
        });
        match result {
            Ok(image) => {
                let (w, h) = image.dimensions();
                if pending.offer(image) {
                    debug!("replaced a sketch that was never shown");
                }
                info!(width = w, height = h, "sketch received");
            }
            Err(e) => warn!("rejected incoming sketch: {e}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;
    use std::time::Instant;

    #[test]
    fn frame_carries_the_payload() {
        let mut wire = Vec::new();
        write_frame(&mut wire, b"hello").expect("write");
        assert_eq!(&wire[..5], b"SKCH\x01");
        assert_eq!(read_frame(&mut wire.as_slice()).expect("read"), b"hello");
    }

    #[test]
    fn bad_header_is_rejected() {
        let mut wire = Vec::new();
        write_frame(&mut wire, b"x").expect("write");

        let mut bad_magic = wire.clone();
        bad_magic[0] = b'Z';
        assert!(matches!(read_frame(&mut bad_magic.as_slice()), Err(Error::Link(_))));

        let mut bad_version = wire.clone();
        bad_version[4] = 9;
        assert!(matches!(read_frame(&mut bad_version.as_slice()), Err(Error::Link(_))));
    }

    #[test]
    fn oversized_length_is_rejected_before_allocating() {
        let mut wire = b"SKCH\x01".to_vec();
        wire.extend_from_slice(&u32::MAX.to_be_bytes());
        assert!(matches!(read_frame(&mut wire.as_slice()), Err(Error::Link(_))));
    }

    #[test]
    fn truncated_payload_is_an_io_error() {
        let mut wire = Vec::new();
        write_frame(&mut wire, b"abcdef").expect("write");
        wire.truncate(wire.len() - 2);
        assert!(matches!(read_frame(&mut wire.as_slice()), Err(Error::Io(_))));
    }

    #[test]
    fn png_payload_decodes_to_the_same_pixels() {
        let img = RgbaImage::from_fn(5, 4, |x, y| Rgba([x as u8 * 40, y as u8 * 60, 3, 255]));
        assert_eq!(decode_png(&encode_png(&img).expect("encode")).expect("decode"), img);
        assert!(decode_png(b"not a png").is_err());
    }

    #[test]
    fn pending_slot_keeps_only_the_newest() {
        let pending = PendingSketch::default();
        assert!(!pending.offer(RgbaImage::new(1, 1)));
        assert!(pending.offer(RgbaImage::new(2, 2)));
        assert_eq!(pending.take().map(|i| i.dimensions()), Some((2, 2)));
        assert!(pending.take().is_none());
    }

    #[test]
    fn send_without_peer_is_a_quiet_no_op() {
        let link = WearLink::new(None);
        link.send(&RgbaImage::new(1, 1));
        assert!(link.take_received().is_none());
    }

    #[test]
    fn sketch_travels_over_loopback() {
        let receiver = WearLink::new(None).listen("127.0.0.1:0").expect("listen");
        let addr = receiver.local_addr().expect("bound");
        let sender = WearLink::new(Some(addr));
        let img = RgbaImage::from_pixel(6, 6, Rgba([1, 2, 3, 255]));
        sender.send(&img);

        let deadline = Instant::now() + Duration::from_secs(10);
        let received = loop {
            if let Some(got) = receiver.take_received() {
                break got;
            }
            assert!(Instant::now() < deadline, "sketch never arrived");
            thread::sleep(Duration::from_millis(20));
        };
        assert_eq!(received, img);
    }
}

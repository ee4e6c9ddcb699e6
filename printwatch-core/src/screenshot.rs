//! Serial screenshot export
//!
//! Streams the current frame to a desktop capture client over the serial
//! port. The protocol state lives in [`ScreenshotSession`]; this module
//! drives it with explicit poll loops bounded by the session timeouts.

use printwatch_hal::{Clock, SerialPort};
use printwatch_protocol::{
    ScreenshotError, ScreenshotHeader, ScreenshotSession, SessionAction, FLUSH_WINDOW_MS,
    PIXELS_PER_BURST,
};

/// Largest pixel burst in bytes (24-bit pixels)
const MAX_BURST_BYTES: usize = PIXELS_PER_BURST as usize * 3;

/// Readable frame buffer
pub trait FrameSource {
    /// Frame width and height in pixels
    fn frame_size(&self) -> (u16, u16);

    /// Read pixels of row `y` starting at column `x`
    ///
    /// Fills `out` with RGB565 pixels, two bytes each, in the byte order
    /// the capture client expects.
    fn read_pixels(&mut self, x: u16, y: u16, out: &mut [u8]);
}

/// Discard incoming bytes for up to one flush window
///
/// Stops early as soon as the receive buffer is empty.
fn flush_input<S: SerialPort, C: Clock>(serial: &mut S, clock: &mut C) {
    let until = clock.now_ms() + FLUSH_WINDOW_MS;
    while clock.now_ms() < until && serial.read_byte().is_some() {}
}

/// Serve one screenshot
///
/// Blocks until the transfer completes, the client aborts or a timeout
/// expires. `filename` is sanitized before it is sent.
pub fn serve_screenshot<S, C, F>(
    serial: &mut S,
    clock: &mut C,
    frame: &mut F,
    filename: &str,
) -> Result<(), ScreenshotError>
where
    S: SerialPort,
    C: Clock,
    F: FrameSource,
{
    flush_input(serial, clock);

    let (width, height) = frame.frame_size();
    let header = ScreenshotHeader::rgb565(width, height).with_filename(filename);
    let bytes_per_pixel = header.bytes_per_pixel();
    let mut session = ScreenshotSession::new(width, height, clock.now_ms());
    let mut buffer = [0u8; MAX_BURST_BYTES];

    info!("Screenshot server waiting for client ({}x{})", width, height);

    loop {
        let byte = serial.read_byte();
        let now = clock.now_ms();

        match session.poll(now, byte) {
            SessionAction::Wait => {}
            SessionAction::SendHeader => {
                flush_input(serial, clock);
                serial
                    .write_all(&header.encode())
                    .map_err(|_| ScreenshotError::Serial)?;
                session.header_sent(clock.now_ms());
            }
            SessionAction::SendBurst { x, y, pixels, last } => {
                let len = (usize::from(pixels) * bytes_per_pixel).min(MAX_BURST_BYTES);
                frame.read_pixels(x, y, &mut buffer[..len]);
                serial
                    .write_all(&buffer[..len])
                    .map_err(|_| ScreenshotError::Serial)?;

                if last {
                    serial.flush().map_err(|_| ScreenshotError::Serial)?;
                    info!("Screenshot sent");
                    return Ok(());
                }
            }
            SessionAction::Finished => return Ok(()),
            SessionAction::Failed(error) => {
                if error == ScreenshotError::Aborted {
                    flush_input(serial, clock);
                }
                warn!("Screenshot failed: {:?}", error);
                return Err(error);
            }
        }
    }
}

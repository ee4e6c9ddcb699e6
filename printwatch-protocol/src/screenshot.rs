//! Serial screenshot export protocol.
//!
//! A desktop client asks the station for the current frame over the debug
//! serial port. The exchange is:
//!
//! 1. Client sends `'S'`. Anything else is ignored while waiting; the
//!    station gives up after [`START_TIMEOUT_MS`] of silence.
//! 2. Station replies with the header:
//!
//! ```text
//! ┌─────┬──────────┬─────┬──────────┬─────┬─────┬─────┬──────────┬─────┬─────┬──────┐
//! │ 'W' │ WIDTH BE │ 'H' │ HEIGHT BE│ 'Y' │ BPP │ '?' │ FILENAME │ '.' │ EXT │ TYPE │
//! │ 1B  │ 2B       │ 1B  │ 2B       │ 1B  │ 1B  │ 1B  │ 0–64B    │ 1B  │ 1B  │ 1B   │
//! └─────┴──────────┴─────┴──────────┴─────┴─────┴─────┴──────────┴─────┴─────┴──────┘
//! ```
//!
//! 3. For every burst of [`PIXELS_PER_BURST`] pixels (row-major) the client
//!    sends one request byte and the station answers with the raw pixels.
//!    `'X'` aborts the transfer. A request must arrive within
//!    [`PIXEL_TIMEOUT_MS`] of the previous one.
//!
//! [`ScreenshotSession`] is the pure state machine for this exchange; the
//! serial I/O loop driving it lives with the station.

use heapless::{String, Vec};

/// Start command byte from the client
pub const CMD_START: u8 = b'S';

/// Abort command byte from the client
pub const CMD_ABORT: u8 = b'X';

/// Maximum wait for the start command
pub const START_TIMEOUT_MS: u64 = 10_000;

/// Maximum gap between pixel burst requests
pub const PIXEL_TIMEOUT_MS: u64 = 100;

/// Receive-buffer flush window around start and abort
pub const FLUSH_WINDOW_MS: u64 = 50;

/// Pixels sent per request byte. Must divide the panel width.
pub const PIXELS_PER_BURST: u16 = 8;

/// Filename used when none is given
pub const DEFAULT_FILENAME: &str = "tft_screenshots/screenshot";

/// Maximum filename length carried in the header
pub const MAX_FILENAME_LEN: usize = 64;

/// Maximum encoded header size
pub const MAX_HEADER_LEN: usize = 3 + 3 + 2 + 1 + MAX_FILENAME_LEN + 1 + 1 + 1;

/// Screenshot transfer failures
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ScreenshotError {
    /// No start command within [`START_TIMEOUT_MS`]
    StartTimeout,
    /// No burst request within [`PIXEL_TIMEOUT_MS`]
    RequestTimeout,
    /// Client sent the abort command
    Aborted,
    /// Serial port write failed
    Serial,
}

/// How the client should decorate the saved filename
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FileExtension {
    /// Append a digit 0-9
    Sequence,
    /// Append a date/time stamp
    Timestamp,
    /// Append the client's millisecond counter
    Millis,
    /// Use the name as-is
    Plain,
}

impl FileExtension {
    /// Wire format byte
    pub fn to_byte(self) -> u8 {
        match self {
            FileExtension::Sequence => b'#',
            FileExtension::Timestamp => b'@',
            FileExtension::Millis => b'%',
            FileExtension::Plain => b'*',
        }
    }
}

/// Image format the client should save
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FileType {
    Jpeg,
    Bmp,
    Png,
    Tiff,
}

impl FileType {
    /// Wire format byte (first letter of the extension)
    pub fn to_byte(self) -> u8 {
        match self {
            FileType::Jpeg => b'j',
            FileType::Bmp => b'b',
            FileType::Png => b'p',
            FileType::Tiff => b't',
        }
    }
}

/// Strip a filename down to what the client accepts
///
/// Keeps ASCII letters, digits, `/` (sub-directories) and `_`. Anything
/// beyond [`MAX_FILENAME_LEN`] is dropped.
pub fn sanitize_filename(name: &str) -> String<MAX_FILENAME_LEN> {
    let mut out = String::new();
    for c in name.chars() {
        if c.is_ascii_alphanumeric() || c == '/' || c == '_' {
            if out.push(c).is_err() {
                break;
            }
        }
    }
    out
}

/// Screenshot header sent after the start command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScreenshotHeader {
    pub width: u16,
    pub height: u16,
    pub bits_per_pixel: u8,
    pub filename: String<MAX_FILENAME_LEN>,
    pub extension: FileExtension,
    pub file_type: FileType,
}

impl ScreenshotHeader {
    /// Create a header for a 16-bit RGB565 frame with the default naming
    pub fn rgb565(width: u16, height: u16) -> Self {
        Self {
            width,
            height,
            bits_per_pixel: 16,
            filename: sanitize_filename(DEFAULT_FILENAME),
            extension: FileExtension::Millis,
            file_type: FileType::Png,
        }
    }

    /// Replace the filename (sanitized)
    pub fn with_filename(mut self, name: &str) -> Self {
        self.filename = sanitize_filename(name);
        self
    }

    /// Bytes per pixel on the wire
    pub fn bytes_per_pixel(&self) -> usize {
        if self.bits_per_pixel >= 24 {
            3
        } else {
            2
        }
    }

    /// Encode the header
    pub fn encode(&self) -> Vec<u8, MAX_HEADER_LEN> {
        let mut out = Vec::new();
        let w = self.width.to_be_bytes();
        let h = self.height.to_be_bytes();

        // Fixed part is 9 bytes, filename is capped, trailer is 3 bytes:
        // everything fits in MAX_HEADER_LEN so pushes cannot fail.
        let _ = out.extend_from_slice(&[b'W', w[0], w[1], b'H', h[0], h[1]]);
        let _ = out.extend_from_slice(&[b'Y', self.bits_per_pixel, b'?']);
        let _ = out.extend_from_slice(self.filename.as_bytes());
        let _ = out.extend_from_slice(&[
            b'.',
            self.extension.to_byte(),
            self.file_type.to_byte(),
        ]);
        out
    }
}

/// What the driver must do after feeding the session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SessionAction {
    /// Nothing to do, keep polling
    Wait,
    /// Start accepted: flush input, then send the header
    SendHeader,
    /// Send `pixels` pixels starting at (`x`, `y`)
    SendBurst {
        x: u16,
        y: u16,
        pixels: u16,
        /// This burst completes the frame
        last: bool,
    },
    /// Transfer finished successfully
    Finished,
    /// Transfer failed; flush input on [`ScreenshotError::Aborted`]
    Failed(ScreenshotError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SessionState {
    /// Waiting for 'S'
    AwaitingStart { since_ms: u64 },
    /// Streaming pixel bursts
    Streaming { x: u16, y: u16, last_request_ms: u64 },
    /// All pixels sent
    Complete,
    /// Gave up
    Failed(ScreenshotError),
}

/// State machine for one screenshot transfer
#[derive(Debug, Clone)]
pub struct ScreenshotSession {
    width: u16,
    height: u16,
    state: SessionState,
}

impl ScreenshotSession {
    /// Start a session at `now_ms`, waiting for the start command
    pub fn new(width: u16, height: u16, now_ms: u64) -> Self {
        Self {
            width,
            height,
            state: SessionState::AwaitingStart { since_ms: now_ms },
        }
    }

    /// True once the session has completed or failed
    pub fn is_done(&self) -> bool {
        matches!(
            self.state,
            SessionState::Complete | SessionState::Failed(_)
        )
    }

    /// Restart the request timer once the header is on the wire
    ///
    /// The first burst request is timed from the end of the header, not
    /// from the start command.
    pub fn header_sent(&mut self, now_ms: u64) {
        if let SessionState::Streaming {
            ref mut last_request_ms,
            ..
        } = self.state
        {
            *last_request_ms = now_ms;
        }
    }

    /// Feed the current time and at most one received byte
    pub fn poll(&mut self, now_ms: u64, byte: Option<u8>) -> SessionAction {
        match self.state {
            SessionState::AwaitingStart { since_ms } => match byte {
                Some(CMD_START) => {
                    self.state = SessionState::Streaming {
                        x: 0,
                        y: 0,
                        last_request_ms: now_ms,
                    };
                    SessionAction::SendHeader
                }
                // Stray bytes before the start command are ignored
                Some(_) => SessionAction::Wait,
                None if now_ms.saturating_sub(since_ms) > START_TIMEOUT_MS => {
                    self.fail(ScreenshotError::StartTimeout)
                }
                None => SessionAction::Wait,
            },
            SessionState::Streaming {
                x,
                y,
                last_request_ms,
            } => match byte {
                Some(CMD_ABORT) => self.fail(ScreenshotError::Aborted),
                Some(_) => self.next_burst(x, y, now_ms),
                None if now_ms.saturating_sub(last_request_ms) > PIXEL_TIMEOUT_MS => {
                    self.fail(ScreenshotError::RequestTimeout)
                }
                None => SessionAction::Wait,
            },
            SessionState::Complete => SessionAction::Finished,
            SessionState::Failed(e) => SessionAction::Failed(e),
        }
    }

    fn fail(&mut self, error: ScreenshotError) -> SessionAction {
        self.state = SessionState::Failed(error);
        SessionAction::Failed(error)
    }

    fn next_burst(&mut self, x: u16, y: u16, now_ms: u64) -> SessionAction {
        let pixels = PIXELS_PER_BURST.min(self.width.saturating_sub(x));

        let mut next_x = x + pixels;
        let mut next_y = y;
        if next_x >= self.width {
            next_x = 0;
            next_y += 1;
        }

        let last = next_y >= self.height;
        self.state = if last {
            SessionState::Complete
        } else {
            SessionState::Streaming {
                x: next_x,
                y: next_y,
                last_request_ms: now_ms,
            }
        };

        SessionAction::SendBurst { x, y, pixels, last }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_layout() {
        let header = ScreenshotHeader::rgb565(240, 320).with_filename("shot_1");
        let bytes = header.encode();

        assert_eq!(
            &bytes[..],
            &[
                b'W', 0x00, 0xF0, b'H', 0x01, 0x40, b'Y', 16, b'?', b's', b'h', b'o', b't', b'_',
                b'1', b'.', b'%', b'p'
            ]
        );
    }

    #[test]
    fn test_default_filename_keeps_subdirectory() {
        let header = ScreenshotHeader::rgb565(1, 1);
        assert_eq!(header.filename.as_str(), "tft_screenshots/screenshot");
    }

    #[test]
    fn test_sanitize_strips_punctuation() {
        assert_eq!(sanitize_filename("my shot-2.png").as_str(), "myshot2png");
        assert_eq!(sanitize_filename("a/b_c").as_str(), "a/b_c");
        assert_eq!(sanitize_filename("héllo").as_str(), "hllo");
    }

    #[test]
    fn test_sanitize_truncates() {
        let long = [b'a'; 100];
        let name = core::str::from_utf8(&long).unwrap();
        assert_eq!(sanitize_filename(name).len(), MAX_FILENAME_LEN);
    }

    #[test]
    fn test_start_timeout() {
        let mut session = ScreenshotSession::new(16, 1, 1_000);
        assert_eq!(session.poll(5_000, None), SessionAction::Wait);
        assert_eq!(session.poll(11_000, None), SessionAction::Wait);
        assert_eq!(
            session.poll(11_001, None),
            SessionAction::Failed(ScreenshotError::StartTimeout)
        );
        assert!(session.is_done());
    }

    #[test]
    fn test_noise_before_start_is_ignored() {
        let mut session = ScreenshotSession::new(16, 1, 0);
        assert_eq!(session.poll(1, Some(b'q')), SessionAction::Wait);
        assert_eq!(session.poll(2, Some(CMD_ABORT)), SessionAction::Wait);
        assert_eq!(session.poll(3, Some(CMD_START)), SessionAction::SendHeader);
    }

    #[test]
    fn test_full_transfer() {
        let mut session = ScreenshotSession::new(16, 2, 0);
        assert_eq!(session.poll(0, Some(CMD_START)), SessionAction::SendHeader);

        let expected = [(0, 0, false), (8, 0, false), (0, 1, false), (8, 1, true)];
        for (i, (x, y, last)) in expected.into_iter().enumerate() {
            let action = session.poll(10 * (i as u64 + 1), Some(b'A'));
            assert_eq!(
                action,
                SessionAction::SendBurst {
                    x,
                    y,
                    pixels: 8,
                    last
                }
            );
        }

        assert!(session.is_done());
        assert_eq!(session.poll(100, None), SessionAction::Finished);
    }

    #[test]
    fn test_abort_during_pixels() {
        let mut session = ScreenshotSession::new(16, 2, 0);
        session.poll(0, Some(CMD_START));
        session.poll(5, Some(b'A'));
        assert_eq!(
            session.poll(6, Some(CMD_ABORT)),
            SessionAction::Failed(ScreenshotError::Aborted)
        );
        // Stays failed
        assert_eq!(
            session.poll(7, Some(b'A')),
            SessionAction::Failed(ScreenshotError::Aborted)
        );
    }

    #[test]
    fn test_request_timeout_measured_from_last_request() {
        let mut session = ScreenshotSession::new(16, 2, 0);
        session.poll(0, Some(CMD_START));
        session.poll(90, Some(b'A'));
        assert_eq!(session.poll(190, None), SessionAction::Wait);
        assert_eq!(
            session.poll(191, None),
            SessionAction::Failed(ScreenshotError::RequestTimeout)
        );
    }

    #[test]
    fn test_header_sent_restarts_request_timer() {
        let mut session = ScreenshotSession::new(16, 1, 0);
        session.poll(0, Some(CMD_START));
        session.header_sent(60);
        assert_eq!(session.poll(160, None), SessionAction::Wait);
        assert_eq!(
            session.poll(161, None),
            SessionAction::Failed(ScreenshotError::RequestTimeout)
        );
    }

    #[test]
    fn test_partial_last_burst() {
        let mut session = ScreenshotSession::new(12, 1, 0);
        session.poll(0, Some(CMD_START));
        assert_eq!(
            session.poll(1, Some(b'A')),
            SessionAction::SendBurst {
                x: 0,
                y: 0,
                pixels: 8,
                last: false
            }
        );
        assert_eq!(
            session.poll(2, Some(b'A')),
            SessionAction::SendBurst {
                x: 8,
                y: 0,
                pixels: 4,
                last: true
            }
        );
    }
}

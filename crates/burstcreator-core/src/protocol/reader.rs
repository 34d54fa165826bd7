//! Background read loop
//!
//! Polls the link for waiting bytes, reads them while holding the link lock,
//! then releases the lock before decoding and delivering text so a `send`
//! never waits longer than one read.

use std::io::{self, ErrorKind};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use tracing::{debug, error, info, warn};

use super::stream::SerialLink;
use super::{POLL_INTERVAL, READ_CHUNK_SIZE};

pub(crate) type SharedLink = Arc<Mutex<Box<dyn SerialLink>>>;

/// Something the read loop has to tell the consumer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadEvent {
    /// Text received from the device, in wire order
    Data(String),
    /// The last chunk held bytes that were not valid UTF-8; they were
    /// replaced with U+FFFD in the preceding `Data` event
    DecodeWarning {
        /// Number of bytes replaced
        invalid_bytes: usize,
    },
    /// A read failed; polling continues
    Error(String),
    /// The link is gone; the reader has stopped
    Disconnected(String),
}

pub(crate) fn read_loop<F>(link: SharedLink, stop: Arc<AtomicBool>, mut on_event: F)
where
    F: FnMut(ReadEvent),
{
    let mut buf = vec![0u8; READ_CHUNK_SIZE];
    info!("Serial reader started");

    while !stop.load(Ordering::Acquire) {
        let polled = match link.lock() {
            Ok(mut guard) => poll_link(&mut **guard, &mut buf),
            Err(_) => {
                error!("Serial link lock poisoned, stopping reader");
                on_event(ReadEvent::Disconnected("serial link lock poisoned".to_string()));
                break;
            }
        };

        match polled {
            Ok(0) => thread::sleep(POLL_INTERVAL),
            Ok(n) => deliver(&buf[..n], &mut on_event),
            Err(e) if is_transient(&e) => thread::sleep(POLL_INTERVAL),
            Err(e) if is_terminal(&e) => {
                error!("Serial link lost: {}", e);
                on_event(ReadEvent::Disconnected(e.to_string()));
                break;
            }
            Err(e) => {
                warn!("Serial read error: {}", e);
                on_event(ReadEvent::Error(e.to_string()));
                thread::sleep(POLL_INTERVAL);
            }
        }
    }

    info!("Serial reader finished");
}

/// Read whatever is waiting, without blocking when nothing is
fn poll_link(link: &mut dyn SerialLink, buf: &mut [u8]) -> io::Result<usize> {
    let available = link.bytes_to_read()? as usize;
    if available == 0 {
        return Ok(0);
    }
    let len = available.min(buf.len());
    match link.read(&mut buf[..len])? {
        0 => Err(io::Error::new(
            ErrorKind::UnexpectedEof,
            "port reported pending data but read returned none",
        )),
        n => Ok(n),
    }
}

fn deliver<F: FnMut(ReadEvent)>(chunk: &[u8], on_event: &mut F) {
    let (text, invalid_bytes) = decode_chunk(chunk);
    debug!("Received {} bytes", chunk.len());
    on_event(ReadEvent::Data(text));
    if invalid_bytes > 0 {
        warn!(
            "Replaced {} invalid UTF-8 bytes in a {} byte chunk",
            invalid_bytes,
            chunk.len()
        );
        on_event(ReadEvent::DecodeWarning { invalid_bytes });
    }
}

/// Decode one chunk as UTF-8, replacing each invalid sequence with U+FFFD
///
/// Chunks are decoded independently: a character split across two reads is
/// replaced, not stitched back together.
pub(crate) fn decode_chunk(mut bytes: &[u8]) -> (String, usize) {
    let mut text = String::with_capacity(bytes.len());
    let mut invalid = 0;

    loop {
        match std::str::from_utf8(bytes) {
            Ok(valid) => {
                text.push_str(valid);
                return (text, invalid);
            }
            Err(e) => {
                let (valid, rest) = bytes.split_at(e.valid_up_to());
                text.push_str(std::str::from_utf8(valid).unwrap_or_default());
                text.push(char::REPLACEMENT_CHARACTER);
                let skip = e.error_len().unwrap_or(rest.len());
                invalid += skip;
                bytes = &rest[skip..];
            }
        }
    }
}

fn is_transient(e: &io::Error) -> bool {
    matches!(
        e.kind(),
        ErrorKind::TimedOut | ErrorKind::WouldBlock | ErrorKind::Interrupted
    )
}

fn is_terminal(e: &io::Error) -> bool {
    matches!(
        e.kind(),
        ErrorKind::BrokenPipe
            | ErrorKind::NotConnected
            | ErrorKind::UnexpectedEof
            | ErrorKind::ConnectionAborted
            | ErrorKind::ConnectionReset
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_valid_text() {
        assert_eq!(
            decode_chunk(b"Batt V is 131 . \n"),
            ("Batt V is 131 . \n".to_string(), 0)
        );
    }

    #[test]
    fn test_decode_replaces_invalid_bytes() {
        let (text, invalid) = decode_chunk(b"ok\xffgo\xfe");
        assert_eq!(text, "ok\u{FFFD}go\u{FFFD}");
        assert_eq!(invalid, 2);
    }

    #[test]
    fn test_decode_truncated_sequence_at_end() {
        // First two bytes of a three byte character
        let (text, invalid) = decode_chunk(b"abc\xe2\x82");
        assert_eq!(text, "abc\u{FFFD}");
        assert_eq!(invalid, 2);
    }

    #[test]
    fn test_decode_matches_lossy() {
        let raw = b"\xf0\x9f\x92\x96 \xc3\x28 end";
        let (text, _) = decode_chunk(raw);
        assert_eq!(text, String::from_utf8_lossy(raw));
    }

    #[test]
    fn test_error_classification() {
        assert!(is_transient(&io::Error::from(ErrorKind::TimedOut)));
        assert!(is_terminal(&io::Error::from(ErrorKind::BrokenPipe)));
        assert!(!is_terminal(&io::Error::from(ErrorKind::Other)));
        assert!(!is_transient(&io::Error::from(ErrorKind::Other)));
    }
}

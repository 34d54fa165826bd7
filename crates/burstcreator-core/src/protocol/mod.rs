//! Serial Protocol Communication
//!
//! The device link is a plain UART: bursts go out as fixed-size packets, and
//! the device answers with free-form UTF-8 status text at arbitrary chunk
//! boundaries.

mod error;
mod reader;
pub mod serial;
mod session;
pub mod settings;
mod stream;

use std::time::Duration;

pub use error::ProtocolError;
pub use reader::ReadEvent;
pub use serial::{list_ports, PortInfo, SystemPortOpener};
pub use session::{SerialSession, SessionState};
pub use settings::{DataBits, FlowControl, Parity, SerialSettings, SettingsProvider, StopBits};
pub use stream::{PortOpener, SerialChannel, SerialLink};

/// Default baud rate for the device UART
pub const DEFAULT_BAUD_RATE: u32 = 115200;

/// How long the reader idles between polls when nothing arrived
pub const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Largest single read delivered as one text chunk
pub const READ_CHUNK_SIZE: usize = 4096;

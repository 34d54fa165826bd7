//! Protocol errors

use thiserror::Error;

/// Errors that can occur while talking to the device
#[derive(Error, Debug)]
pub enum ProtocolError {
    /// The OS could not open the port
    #[error("Serial port unavailable: {0}")]
    PortUnavailable(String),

    /// A setting the serial backend cannot apply
    #[error("Serial configuration rejected: {0}")]
    ConfigRejected(String),

    /// `open` on a session that holds a link
    #[error("Session already open")]
    AlreadyOpen,

    /// Operation needs an open link
    #[error("Not connected to device")]
    NotConnected,

    /// A reader is already delivering events
    #[error("Serial reader already running")]
    AlreadyReading,

    /// The link refused part of a packet
    #[error("Write failed: {0}")]
    WriteFailed(String),

    /// The event consumer panicked on the reader thread
    #[error("Serial reader thread panicked")]
    ReaderPanicked,

    /// Underlying I/O failure
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

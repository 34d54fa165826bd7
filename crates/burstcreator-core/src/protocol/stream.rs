use serialport::SerialPort;
use std::io::{self, Read, Write};

use super::{ProtocolError, SerialSettings};

/// Duplex byte link to the device
///
/// The session only needs to know how many bytes are waiting so the reader
/// never blocks while holding the link.
pub trait SerialLink: Read + Write + Send {
    /// Get number of bytes available to read
    fn bytes_to_read(&mut self) -> io::Result<u32>;

    /// Discard anything received but not yet read
    fn clear_input_buffer(&mut self) -> io::Result<()>;
}

/// Opens links from a settings snapshot
pub trait PortOpener: Send {
    /// Open a link configured with `settings`
    fn open(&self, settings: &SerialSettings) -> Result<Box<dyn SerialLink>, ProtocolError>;
}

/// Serial port wrapper implementing SerialLink
pub struct SerialChannel {
    port: Box<dyn SerialPort>,
}

impl SerialChannel {
    /// Wrap an already configured port
    pub fn new(port: Box<dyn SerialPort>) -> Self {
        Self { port }
    }

    /// Port name as reported by the backend
    pub fn name(&self) -> Option<String> {
        self.port.name()
    }
}

impl Read for SerialChannel {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.port.read(buf)
    }
}

impl Write for SerialChannel {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.port.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.port.flush()
    }
}

impl SerialLink for SerialChannel {
    fn bytes_to_read(&mut self) -> io::Result<u32> {
        self.port.bytes_to_read().map_err(io::Error::from)
    }

    fn clear_input_buffer(&mut self) -> io::Result<()> {
        self.port
            .clear(serialport::ClearBuffer::Input)
            .map_err(io::Error::from)
    }
}

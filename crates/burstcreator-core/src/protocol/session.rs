//! Session management
//!
//! Owns the serial link and the background reader. Lifecycle:
//! `Closed -> Open -> Reading -> Open -> Closed`.

use serde::{Deserialize, Serialize};
use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use tracing::{debug, error, info, warn};

use super::reader::{read_loop, ReadEvent, SharedLink};
use super::serial::SystemPortOpener;
use super::stream::PortOpener;
use super::{ProtocolError, SerialSettings};

/// Session state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionState {
    /// No link open
    Closed,
    /// Link open, nobody listening
    Open,
    /// Link open and the background reader running
    Reading,
}

struct ReaderHandle {
    stop: Arc<AtomicBool>,
    thread: JoinHandle<()>,
}

impl ReaderHandle {
    fn is_running(&self) -> bool {
        !self.thread.is_finished()
    }

    fn stop(self) -> Result<(), ProtocolError> {
        self.stop.store(true, Ordering::Release);
        self.thread
            .join()
            .map_err(|_| ProtocolError::ReaderPanicked)
    }
}

/// One serial connection to the device plus its reader thread
///
/// `send` and the reader share the link through a mutex, so a packet is
/// never interleaved with a read. Dropping the session closes it.
pub struct SerialSession {
    opener: Box<dyn PortOpener>,
    link: Option<SharedLink>,
    port_name: Option<String>,
    reader: Option<ReaderHandle>,
}

impl SerialSession {
    /// Create a closed session backed by the system serial ports
    pub fn new() -> Self {
        Self::with_opener(SystemPortOpener)
    }

    /// Create a closed session that opens links through `opener`
    pub fn with_opener(opener: impl PortOpener + 'static) -> Self {
        Self {
            opener: Box::new(opener),
            link: None,
            port_name: None,
            reader: None,
        }
    }

    /// Current state
    pub fn state(&self) -> SessionState {
        if self.link.is_none() {
            SessionState::Closed
        } else if self.is_reading() {
            SessionState::Reading
        } else {
            SessionState::Open
        }
    }

    /// True while a link is held
    pub fn is_open(&self) -> bool {
        self.link.is_some()
    }

    /// True while the reader thread is alive
    pub fn is_reading(&self) -> bool {
        self.reader.as_ref().is_some_and(ReaderHandle::is_running)
    }

    /// Name of the open port
    pub fn port_name(&self) -> Option<&str> {
        self.port_name.as_deref()
    }

    /// Open the link described by `settings`
    pub fn open(&mut self, settings: &SerialSettings) -> Result<(), ProtocolError> {
        if self.link.is_some() {
            return Err(ProtocolError::AlreadyOpen);
        }

        let link = self.opener.open(settings)?;
        self.link = Some(Arc::new(Mutex::new(link)));
        self.port_name = Some(settings.port_name.clone());
        info!(
            "Serial session opened on {} at {} baud",
            settings.port_name, settings.baud_rate
        );
        Ok(())
    }

    /// Write the whole buffer to the device
    pub fn send(&mut self, bytes: &[u8]) -> Result<(), ProtocolError> {
        let link = self.link.as_ref().ok_or(ProtocolError::NotConnected)?;
        if bytes.is_empty() {
            return Ok(());
        }

        let mut guard = link
            .lock()
            .map_err(|_| ProtocolError::WriteFailed("serial link lock poisoned".to_string()))?;
        guard
            .write_all(bytes)
            .and_then(|_| guard.flush())
            .map_err(|e| ProtocolError::WriteFailed(e.to_string()))?;

        debug!("Sent {} bytes: {:02x?}", bytes.len(), bytes);
        Ok(())
    }

    /// Start the background reader, delivering events to `on_event`
    ///
    /// `on_event` runs on the reader thread, in the order bytes arrived.
    pub fn start_reading<F>(&mut self, on_event: F) -> Result<(), ProtocolError>
    where
        F: FnMut(ReadEvent) + Send + 'static,
    {
        let link = self.link.clone().ok_or(ProtocolError::NotConnected)?;
        if self.is_reading() {
            return Err(ProtocolError::AlreadyReading);
        }
        // A reader that ended on its own still needs joining
        if let Some(finished) = self.reader.take() {
            if let Err(e) = finished.stop() {
                warn!("Previous serial reader ended abnormally: {}", e);
            }
        }

        let stop = Arc::new(AtomicBool::new(false));
        let stop_flag = Arc::clone(&stop);
        let thread = thread::Builder::new()
            .name("serial-reader".to_string())
            .spawn(move || read_loop(link, stop_flag, on_event))?;

        self.reader = Some(ReaderHandle { stop, thread });
        Ok(())
    }

    /// Stop the background reader and wait for it to exit
    ///
    /// Once this returns, no further events are delivered.
    pub fn stop_reading(&mut self) -> Result<(), ProtocolError> {
        match self.reader.take() {
            Some(reader) => {
                debug!("Stopping serial reader");
                reader.stop()
            }
            None => Ok(()),
        }
    }

    /// Stop reading and release the link; closing a closed session does nothing
    pub fn close(&mut self) {
        if let Err(e) = self.stop_reading() {
            error!("Serial reader did not stop cleanly: {}", e);
        }
        if self.link.take().is_some() {
            info!(
                "Serial session closed on {}",
                self.port_name.as_deref().unwrap_or("unknown port")
            );
        }
        self.port_name = None;
    }
}

impl Default for SerialSession {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for SerialSession {
    fn drop(&mut self) {
        self.close();
    }
}

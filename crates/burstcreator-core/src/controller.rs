//! Burst sending workflow
//!
//! What the "Send" action does: encode first so a bad parameter never
//! touches the port, open the port on demand from a fresh settings snapshot,
//! write the packet, and make sure somebody is listening to the device.

use thiserror::Error;
use tracing::{debug, info};

use crate::burst::{encode_with_mode, BurstError, BurstParameters, Packet, RunMode};
use crate::protocol::{ProtocolError, ReadEvent, SerialSession, SettingsProvider};

/// Errors from the send workflow
#[derive(Error, Debug)]
pub enum ControllerError {
    /// The burst could not be encoded; the port was not touched
    #[error(transparent)]
    Encode(#[from] BurstError),

    /// Opening, writing or starting the reader failed
    #[error(transparent)]
    Protocol(#[from] ProtocolError),
}

/// Drives one session from burst parameters
pub struct BurstController<P: SettingsProvider> {
    settings: P,
    session: SerialSession,
    run_mode: RunMode,
}

impl<P: SettingsProvider> BurstController<P> {
    /// Create a controller; the session is opened lazily on the first send
    pub fn new(settings: P, session: SerialSession) -> Self {
        Self {
            settings,
            session,
            run_mode: RunMode::Immediate,
        }
    }

    /// Choose whether sent bursts run immediately or queue on the device
    pub fn set_run_mode(&mut self, mode: RunMode) {
        self.run_mode = mode;
    }

    /// Run mode used for the next burst
    pub fn run_mode(&self) -> RunMode {
        self.run_mode
    }

    /// The underlying session
    pub fn session(&self) -> &SerialSession {
        &self.session
    }

    /// The underlying session, e.g. to close it or open a different port
    pub fn session_mut(&mut self) -> &mut SerialSession {
        &mut self.session
    }

    /// Encode `params`, open the port if needed and transmit the packet
    ///
    /// Returns the packet that was written.
    pub fn send_burst(&mut self, params: &BurstParameters) -> Result<Packet, ControllerError> {
        let packet = encode_with_mode(params, self.run_mode)?;

        if !self.session.is_open() {
            let settings = self.settings.settings();
            debug!("Opening {} for burst", settings.port_name);
            self.session.open(&settings)?;
        }

        self.session.send(packet.as_bytes())?;
        info!("Burst sent ({} bytes)", packet.len());
        Ok(packet)
    }

    /// Start the reader unless it is already running
    ///
    /// Returns `true` when a new reader was started. When one is already
    /// running, `on_event` is dropped and the existing consumer keeps
    /// receiving.
    pub fn listen<F>(&mut self, on_event: F) -> Result<bool, ControllerError>
    where
        F: FnMut(ReadEvent) + Send + 'static,
    {
        if self.session.is_reading() {
            return Ok(false);
        }
        self.session.start_reading(on_event)?;
        Ok(true)
    }

    /// Stop listening and close the port
    pub fn shutdown(&mut self) {
        self.session.close();
    }
}

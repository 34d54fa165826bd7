//! Mock serial link shared by the session and controller tests

#![allow(dead_code)]

use burstcreator_core::protocol::{
    PortOpener, ProtocolError, ReadEvent, SerialLink, SerialSession, SerialSettings,
};
use std::collections::VecDeque;
use std::io::{self, Read, Write};
use std::sync::mpsc::Receiver;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

/// One scripted read result
pub enum MockRead {
    Bytes(Vec<u8>),
    Error(io::ErrorKind),
}

/// Everything the mock link saw, shared with the test body
#[derive(Default)]
pub struct MockState {
    pub written: Vec<u8>,
    pub incoming: VecDeque<MockRead>,
    pub fail_writes: bool,
    pub open_failure: Option<String>,
    pub opens: usize,
    pub drops: usize,
    pub last_settings: Option<SerialSettings>,
}

pub type SharedState = Arc<Mutex<MockState>>;

pub fn push_bytes(state: &SharedState, bytes: &[u8]) {
    state
        .lock()
        .unwrap()
        .incoming
        .push_back(MockRead::Bytes(bytes.to_vec()));
}

pub fn push_error(state: &SharedState, kind: io::ErrorKind) {
    state
        .lock()
        .unwrap()
        .incoming
        .push_back(MockRead::Error(kind));
}

struct MockLink {
    state: SharedState,
}

impl Read for MockLink {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let mut state = self.state.lock().unwrap();
        match state.incoming.pop_front() {
            Some(MockRead::Bytes(mut bytes)) => {
                let n = bytes.len().min(buf.len());
                buf[..n].copy_from_slice(&bytes[..n]);
                if n < bytes.len() {
                    let rest = bytes.split_off(n);
                    state.incoming.push_front(MockRead::Bytes(rest));
                }
                Ok(n)
            }
            Some(MockRead::Error(kind)) => Err(io::Error::from(kind)),
            None => Err(io::Error::from(io::ErrorKind::TimedOut)),
        }
    }
}

impl Write for MockLink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut state = self.state.lock().unwrap();
        if state.fail_writes {
            return Err(io::Error::new(io::ErrorKind::Other, "Serial write failed"));
        }
        state.written.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl SerialLink for MockLink {
    fn bytes_to_read(&mut self) -> io::Result<u32> {
        let mut state = self.state.lock().unwrap();
        match state.incoming.front() {
            Some(MockRead::Bytes(bytes)) => Ok(bytes.len() as u32),
            Some(MockRead::Error(kind)) => {
                let kind = *kind;
                state.incoming.pop_front();
                Err(io::Error::from(kind))
            }
            None => Ok(0),
        }
    }

    fn clear_input_buffer(&mut self) -> io::Result<()> {
        self.state.lock().unwrap().incoming.clear();
        Ok(())
    }
}

impl Drop for MockLink {
    fn drop(&mut self) {
        if let Ok(mut state) = self.state.lock() {
            state.drops += 1;
        }
    }
}

pub struct MockOpener {
    state: SharedState,
}

impl PortOpener for MockOpener {
    fn open(&self, settings: &SerialSettings) -> Result<Box<dyn SerialLink>, ProtocolError> {
        let mut state = self.state.lock().unwrap();
        if let Some(reason) = &state.open_failure {
            return Err(ProtocolError::PortUnavailable(reason.clone()));
        }
        state.opens += 1;
        state.last_settings = Some(settings.clone());
        Ok(Box::new(MockLink {
            state: Arc::clone(&self.state),
        }))
    }
}

/// A closed session wired to a fresh mock
pub fn mock_session() -> (SerialSession, SharedState) {
    let state: SharedState = Arc::new(Mutex::new(MockState::default()));
    let session = SerialSession::with_opener(MockOpener {
        state: Arc::clone(&state),
    });
    (session, state)
}

pub fn test_settings() -> SerialSettings {
    SerialSettings::new("/dev/ttyMOCK0")
}

/// Wait for the next event or fail the test
pub fn next_event(rx: &Receiver<ReadEvent>) -> ReadEvent {
    rx.recv_timeout(Duration::from_secs(2))
        .expect("Should receive a read event")
}

/// Poll `condition` until it holds or two seconds pass
pub fn wait_until(mut condition: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + Duration::from_secs(2);
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        std::thread::sleep(Duration::from_millis(5));
    }
    condition()
}

//! # BurstCreator Core Library
//!
//! Core functionality for programming bursts on the NeoDK stimulation board.

#![warn(missing_docs)]
#![cfg_attr(docsrs, feature(doc_cfg))]

//!
//! This library provides:
//! - Burst parameter encoding into the 27-byte device packet
//! - A serial session with a background reader for device status text
//! - The send workflow tying the two together
//! - JSON burst profiles
//!
//! ## Example
//!
//! ```rust,ignore
//! use burstcreator_core::prelude::*;
//!
//! let settings = SerialSettings::new("/dev/ttyACM0");
//! let mut controller = BurstController::new(settings, SerialSession::new());
//!
//! controller.send_burst(&BurstParameters::default())?;
//! controller.listen(|event| {
//!     if let ReadEvent::Data(text) = event {
//!         print!("{}", text);
//!     }
//! })?;
//! ```

pub mod burst;
pub mod controller;
pub mod profile;
pub mod protocol;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::burst::{encode, BurstParameters, Packet, Polarity, RunMode, Waveform};
    pub use crate::controller::{BurstController, ControllerError};
    pub use crate::profile::BurstProfile;
    pub use crate::protocol::{
        ReadEvent, SerialSession, SerialSettings, SessionState, SettingsProvider,
    };
}

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

//! Burst Packet Encoding
//!
//! Turns a burst configuration into the fixed 27-byte little-endian packet the
//! NeoDK firmware reads from its UART:
//!
//! | bytes | field |
//! |-------|-------|
//! | 0-3   | duration, 10 ms units (u32) |
//! | 4     | pulse width, us |
//! | 5-6   | pulse period, us (u16) |
//! | 7     | voltage, 0.1 V |
//! | 8     | voltage waveform |
//! | 9-10  | voltage modulation period, ms (u16) |
//! | 11    | voltage floor, min 10 |
//! | 12    | pulse width waveform |
//! | 13-14 | pulse width modulation period, ms (u16) |
//! | 15    | pulse width floor, min 60 |
//! | 16    | frequency waveform |
//! | 17-18 | frequency modulation period, ms (u16) |
//! | 19-20 | frequency floor period, us, max 65534 (u16) |
//! | 21    | polarity |
//! | 22-23 | pause, 10 ms units (u16) |
//! | 24-25 | repeat count (u16) |
//! | 26    | run mode (1 = run now) |

mod encoder;
mod error;
mod frame;
mod packet;
mod params;

pub use encoder::{encode, encode_with_mode, period_micros, period_millis};
pub use error::BurstError;
pub use frame::BurstFrame;
pub use packet::Packet;
pub use params::{BurstParameters, Polarity, RunMode, Waveform};

/// Size of an encoded burst packet
pub const PACKET_LEN: usize = 27;

/// Lowest voltage floor sent to the device, in 0.1 V
pub const VOLTAGE_FLOOR_MIN: u8 = 10;

/// Lowest pulse width floor sent to the device, in us
pub const PULSE_WIDTH_FLOOR_MIN: u8 = 60;

/// Largest frequency floor period sent to the device, in us
pub const FREQUENCY_FLOOR_PERIOD_MAX: u16 = 65534;

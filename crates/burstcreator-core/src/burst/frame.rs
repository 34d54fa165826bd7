//! Field view over an encoded burst packet

use byteorder::{ByteOrder, LittleEndian};
use serde::Serialize;

use super::{BurstError, PACKET_LEN};

/// Raw wire values of a burst packet, in transmission order
///
/// Waveform, polarity and run mode are kept as bytes so any packet can be
/// inspected, including ones carrying values this crate would not encode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BurstFrame {
    /// Burst length in 10 ms units
    pub duration: u32,
    /// Pulse width in microseconds
    pub pulse_width: u8,
    /// Pulse period in microseconds
    pub period_us: u16,
    /// Voltage in 0.1 V
    pub voltage: u8,
    /// Raw [`Waveform`](super::Waveform) byte
    pub voltage_waveform: u8,
    /// Voltage modulation period in milliseconds
    pub voltage_mod_period_ms: u16,
    /// Lowest voltage reached by the modulation, in 0.1 V
    pub voltage_floor: u8,
    /// Raw [`Waveform`](super::Waveform) byte
    pub pulse_width_mod_waveform: u8,
    /// Pulse width modulation period in milliseconds
    pub pulse_width_mod_period_ms: u16,
    /// Narrowest pulse reached by the modulation
    pub pulse_width_floor: u8,
    /// Raw [`Waveform`](super::Waveform) byte
    pub frequency_mod_waveform: u8,
    /// Frequency modulation period in milliseconds
    pub frequency_mod_period_ms: u16,
    /// Longest pulse period reached by the modulation, in microseconds
    pub frequency_floor_period_us: u16,
    /// Raw [`Polarity`](super::Polarity) byte
    pub polarity: u8,
    /// Pause after the burst in 10 ms units
    pub pause: u16,
    /// Extra repetitions
    pub repeat_count: u16,
    /// Raw [`RunMode`](super::RunMode) byte
    pub run_mode: u8,
}

impl BurstFrame {
    /// Read the fields back out of an encoded packet
    pub fn parse(data: &[u8]) -> Result<Self, BurstError> {
        if data.len() != PACKET_LEN {
            return Err(BurstError::InvalidLength {
                expected: PACKET_LEN,
                actual: data.len(),
            });
        }

        Ok(Self {
            duration: LittleEndian::read_u32(&data[0..4]),
            pulse_width: data[4],
            period_us: LittleEndian::read_u16(&data[5..7]),
            voltage: data[7],
            voltage_waveform: data[8],
            voltage_mod_period_ms: LittleEndian::read_u16(&data[9..11]),
            voltage_floor: data[11],
            pulse_width_mod_waveform: data[12],
            pulse_width_mod_period_ms: LittleEndian::read_u16(&data[13..15]),
            pulse_width_floor: data[15],
            frequency_mod_waveform: data[16],
            frequency_mod_period_ms: LittleEndian::read_u16(&data[17..19]),
            frequency_floor_period_us: LittleEndian::read_u16(&data[19..21]),
            polarity: data[21],
            pause: LittleEndian::read_u16(&data[22..24]),
            repeat_count: LittleEndian::read_u16(&data[24..26]),
            run_mode: data[26],
        })
    }

    /// Field names and values in wire order, for display
    pub fn fields(&self) -> [(&'static str, u32); 17] {
        [
            ("duration (10 ms)", self.duration),
            ("pulse width (us)", self.pulse_width.into()),
            ("period (us)", self.period_us.into()),
            ("voltage (0.1 V)", self.voltage.into()),
            ("voltage waveform", self.voltage_waveform.into()),
            ("voltage mod period (ms)", self.voltage_mod_period_ms.into()),
            ("voltage floor (0.1 V)", self.voltage_floor.into()),
            ("pw mod waveform", self.pulse_width_mod_waveform.into()),
            ("pw mod period (ms)", self.pulse_width_mod_period_ms.into()),
            ("pw floor (us)", self.pulse_width_floor.into()),
            ("freq mod waveform", self.frequency_mod_waveform.into()),
            ("freq mod period (ms)", self.frequency_mod_period_ms.into()),
            ("freq floor period (us)", self.frequency_floor_period_us.into()),
            ("polarity", self.polarity.into()),
            ("pause (10 ms)", self.pause.into()),
            ("repeats", self.repeat_count.into()),
            ("run mode", self.run_mode.into()),
        ]
    }
}

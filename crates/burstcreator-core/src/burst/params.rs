//! Burst parameter types
//!
//! Values are kept in the units the front end works in (slider units), the
//! encoder does all scaling. Waveform and polarity serialize as their raw
//! protocol integers so a JSON profile reads like the control values.

use serde::{Deserialize, Serialize};

use super::BurstError;

/// Modulator waveform shape understood by the firmware
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum Waveform {
    /// Modulation disabled
    #[default]
    None = 0,
    /// Sine table lookup
    Sine = 1,
    /// Rising ramp
    Sawtooth = 2,
    /// Up/down ramp
    Triangle = 3,
    /// Hard switch between floor and ceiling
    Square = 4,
}

impl TryFrom<u8> for Waveform {
    type Error = BurstError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Waveform::None),
            1 => Ok(Waveform::Sine),
            2 => Ok(Waveform::Sawtooth),
            3 => Ok(Waveform::Triangle),
            4 => Ok(Waveform::Square),
            other => Err(BurstError::invalid(
                "waveform",
                format!("{} is not a waveform (expected 0-4)", other),
            )),
        }
    }
}

impl From<Waveform> for u8 {
    fn from(waveform: Waveform) -> Self {
        waveform as u8
    }
}

/// Polarity of the first pulse in a burst
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum Polarity {
    /// Positive half first
    #[default]
    PositiveFirst = 0,
    /// Negative half first
    NegativeFirst = 1,
}

impl TryFrom<u8> for Polarity {
    type Error = BurstError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Polarity::PositiveFirst),
            1 => Ok(Polarity::NegativeFirst),
            other => Err(BurstError::invalid(
                "polarity",
                format!("{} is not a polarity (expected 0 or 1)", other),
            )),
        }
    }
}

impl From<Polarity> for u8 {
    fn from(polarity: Polarity) -> Self {
        polarity as u8
    }
}

/// What the device does with a received burst (last packet byte)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RunMode {
    /// Append to the device burst FIFO
    Queue = 0,
    /// Run the burst as soon as it arrives
    #[default]
    Immediate = 1,
}

impl From<RunMode> for u8 {
    fn from(mode: RunMode) -> Self {
        mode as u8
    }
}

/// One burst as configured on the front end
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BurstParameters {
    /// Burst length in seconds
    pub duration_seconds: f64,
    /// Pulse width, ten units per transmitted microsecond step
    pub pulse_width_units: f64,
    /// Pulse frequency in 0.1 Hz
    pub frequency_tenths_hz: f64,
    /// Output voltage in 0.1 V (must fit a byte)
    pub voltage_units: u16,
    /// Voltage modulation shape
    pub voltage_waveform: Waveform,
    /// Voltage modulation rate in 0.1 Hz
    pub voltage_mod_freq_tenths_hz: f64,
    /// Voltage modulation depth, 0-1000 per mille
    pub voltage_mod_amount_per_mille: u16,
    /// Pulse width modulation shape
    pub pulse_width_mod_waveform: Waveform,
    /// Pulse width modulation rate in 0.1 Hz
    pub pulse_width_mod_freq_tenths_hz: f64,
    /// Pulse width modulation depth, 0-1000 per mille
    pub pulse_width_mod_amount_per_mille: u16,
    /// Frequency modulation shape
    pub frequency_mod_waveform: Waveform,
    /// Frequency modulation rate in 0.1 Hz
    pub frequency_mod_freq_tenths_hz: f64,
    /// Frequency modulation depth, 0-1000 per mille
    pub frequency_mod_amount_per_mille: u16,
    /// Which half of each pulse comes first
    pub polarity: Polarity,
    /// Pause after the burst in seconds
    pub pause_seconds: f64,
    /// Extra repetitions of burst + pause
    pub repeat_count: u16,
}

impl Default for BurstParameters {
    fn default() -> Self {
        Self {
            duration_seconds: 5.0,
            pulse_width_units: 1500.0,
            frequency_tenths_hz: 500.0,
            voltage_units: 100,
            voltage_waveform: Waveform::None,
            voltage_mod_freq_tenths_hz: 10.0,
            voltage_mod_amount_per_mille: 0,
            pulse_width_mod_waveform: Waveform::None,
            pulse_width_mod_freq_tenths_hz: 10.0,
            pulse_width_mod_amount_per_mille: 0,
            frequency_mod_waveform: Waveform::None,
            frequency_mod_freq_tenths_hz: 10.0,
            frequency_mod_amount_per_mille: 0,
            polarity: Polarity::PositiveFirst,
            pause_seconds: 1.0,
            repeat_count: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_waveform_from_raw() {
        assert_eq!(Waveform::try_from(3).unwrap(), Waveform::Triangle);
        assert!(matches!(
            Waveform::try_from(5),
            Err(BurstError::InvalidParameter { field: "waveform", .. })
        ));
    }

    #[test]
    fn test_polarity_from_raw() {
        assert_eq!(Polarity::try_from(1).unwrap(), Polarity::NegativeFirst);
        assert!(Polarity::try_from(2).is_err());
    }

    #[test]
    fn test_params_json_uses_raw_enums() {
        let params = BurstParameters {
            voltage_waveform: Waveform::Square,
            polarity: Polarity::NegativeFirst,
            ..Default::default()
        };
        let json = serde_json::to_value(&params).unwrap();
        assert_eq!(json["voltage_waveform"], 4);
        assert_eq!(json["polarity"], 1);
    }

    #[test]
    fn test_params_json_partial() {
        let params: BurstParameters =
            serde_json::from_str(r#"{"voltage_units": 80, "repeat_count": 3}"#).unwrap();
        assert_eq!(params.voltage_units, 80);
        assert_eq!(params.repeat_count, 3);
        assert_eq!(params.frequency_tenths_hz, 500.0);
    }

    #[test]
    fn test_params_json_rejects_bad_waveform() {
        let result: Result<BurstParameters, _> =
            serde_json::from_str(r#"{"pulse_width_mod_waveform": 9}"#);
        assert!(result.is_err());
    }
}

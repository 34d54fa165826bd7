//! Serial link settings
//!
//! A plain value handed to the session on each open. Where the settings come
//! from (a dialog, a profile file, command line flags) is up to the caller.

use serde::{Deserialize, Serialize};

use super::{ProtocolError, DEFAULT_BAUD_RATE};

/// Number of data bits per character
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum DataBits {
    /// 5 bits
    Five,
    /// 6 bits
    Six,
    /// 7 bits
    Seven,
    /// 8 bits
    #[default]
    Eight,
}

impl TryFrom<u8> for DataBits {
    type Error = ProtocolError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            5 => Ok(DataBits::Five),
            6 => Ok(DataBits::Six),
            7 => Ok(DataBits::Seven),
            8 => Ok(DataBits::Eight),
            other => Err(ProtocolError::ConfigRejected(format!(
                "{} data bits (expected 5-8)",
                other
            ))),
        }
    }
}

impl From<DataBits> for u8 {
    fn from(bits: DataBits) -> Self {
        match bits {
            DataBits::Five => 5,
            DataBits::Six => 6,
            DataBits::Seven => 7,
            DataBits::Eight => 8,
        }
    }
}

/// Parity checking mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Parity {
    /// No parity bit
    #[default]
    None,
    /// Odd parity
    Odd,
    /// Even parity
    Even,
    /// Parity bit always 1 (not supported by the backend)
    Mark,
    /// Parity bit always 0 (not supported by the backend)
    Space,
}

/// Number of stop bits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum StopBits {
    /// One stop bit
    #[default]
    #[serde(rename = "1")]
    One,
    /// One and a half (not supported by the backend)
    #[serde(rename = "1.5")]
    OnePointFive,
    /// Two stop bits
    #[serde(rename = "2")]
    Two,
}

/// Flow control mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlowControl {
    /// No flow control
    #[default]
    None,
    /// RTS/CTS
    Hardware,
    /// XON/XOFF
    Software,
}

/// Serial link configuration snapshot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SerialSettings {
    /// Port name (e.g., "/dev/ttyACM0" or "COM3")
    pub port_name: String,
    /// Baud rate, must be non-zero
    pub baud_rate: u32,
    /// Data bits per character
    pub data_bits: DataBits,
    /// Parity mode
    pub parity: Parity,
    /// Stop bits per character
    pub stop_bits: StopBits,
    /// Flow control mode
    pub flow_control: FlowControl,
}

impl SerialSettings {
    /// 8N1 settings for the given port at the default baud rate
    pub fn new(port_name: impl Into<String>) -> Self {
        Self {
            port_name: port_name.into(),
            ..Default::default()
        }
    }

    /// Reject settings no port could be opened with
    pub fn validate(&self) -> Result<(), ProtocolError> {
        if self.port_name.trim().is_empty() {
            return Err(ProtocolError::ConfigRejected(
                "no serial port selected".to_string(),
            ));
        }
        if self.baud_rate == 0 {
            return Err(ProtocolError::ConfigRejected(
                "baud rate must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for SerialSettings {
    fn default() -> Self {
        Self {
            port_name: String::new(),
            baud_rate: DEFAULT_BAUD_RATE,
            data_bits: DataBits::default(),
            parity: Parity::default(),
            stop_bits: StopBits::default(),
            flow_control: FlowControl::default(),
        }
    }
}

/// Source of serial settings, asked once per open
pub trait SettingsProvider {
    /// Current settings snapshot
    fn settings(&self) -> SerialSettings;
}

impl SettingsProvider for SerialSettings {
    fn settings(&self) -> SerialSettings {
        self.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_8n1() {
        let settings = SerialSettings::new("/dev/ttyACM0");
        assert_eq!(settings.baud_rate, 115200);
        assert_eq!(settings.data_bits, DataBits::Eight);
        assert_eq!(settings.parity, Parity::None);
        assert_eq!(settings.stop_bits, StopBits::One);
        assert_eq!(settings.flow_control, FlowControl::None);
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_missing_port() {
        let settings = SerialSettings::default();
        assert!(matches!(
            settings.validate(),
            Err(ProtocolError::ConfigRejected(_))
        ));
    }

    #[test]
    fn test_validate_rejects_zero_baud() {
        let settings = SerialSettings {
            baud_rate: 0,
            ..SerialSettings::new("COM3")
        };
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_settings_json() {
        let json = r#"{
            "port_name": "COM4",
            "baud_rate": 9600,
            "data_bits": 7,
            "parity": "even",
            "stop_bits": "1.5",
            "flow_control": "hardware"
        }"#;
        let settings: SerialSettings = serde_json::from_str(json).unwrap();
        assert_eq!(settings.port_name, "COM4");
        assert_eq!(settings.baud_rate, 9600);
        assert_eq!(settings.data_bits, DataBits::Seven);
        assert_eq!(settings.parity, Parity::Even);
        assert_eq!(settings.stop_bits, StopBits::OnePointFive);
        assert_eq!(settings.flow_control, FlowControl::Hardware);
    }

    #[test]
    fn test_settings_json_rejects_data_bits() {
        let result: Result<SerialSettings, _> = serde_json::from_str(r#"{"data_bits": 9}"#);
        assert!(result.is_err());
    }
}

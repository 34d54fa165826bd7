//! Burst profiles
//!
//! A profile bundles the serial settings with one burst so a front end can be
//! driven from a JSON file. Any field left out takes its default.
//!
//! ```json
//! {
//!   "serial": { "port_name": "/dev/ttyACM0", "baud_rate": 115200 },
//!   "burst": { "duration_seconds": 2.5, "frequency_tenths_hz": 800 }
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

use crate::burst::BurstParameters;
use crate::protocol::SerialSettings;

/// Errors loading a profile
#[derive(Error, Debug)]
pub enum ProfileError {
    /// The file could not be read
    #[error("Failed to read profile: {0}")]
    Io(#[from] std::io::Error),

    /// The file is not a valid profile
    #[error("Invalid profile JSON: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Serial settings plus the burst to send
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BurstProfile {
    /// Link to open
    pub serial: SerialSettings,
    /// Burst to send
    pub burst: BurstParameters,
}

impl BurstProfile {
    /// Load a profile from a JSON file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ProfileError> {
        let content = fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Parse a profile from JSON text
    pub fn from_json(json: &str) -> Result<Self, ProfileError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Pretty-printed JSON
    pub fn to_json(&self) -> Result<String, ProfileError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_profile_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{
                "serial": {{ "port_name": "/dev/ttyACM0", "baud_rate": 57600 }},
                "burst": {{ "duration_seconds": 2.5, "repeat_count": 4 }}
            }}"#
        )
        .unwrap();

        let profile = BurstProfile::from_file(file.path()).unwrap();
        assert_eq!(profile.serial.port_name, "/dev/ttyACM0");
        assert_eq!(profile.serial.baud_rate, 57600);
        assert_eq!(profile.burst.duration_seconds, 2.5);
        assert_eq!(profile.burst.repeat_count, 4);
        assert_eq!(profile.burst.voltage_units, 100);
    }

    #[test]
    fn test_empty_profile_is_default() {
        let profile = BurstProfile::from_json("{}").unwrap();
        assert_eq!(profile, BurstProfile::default());
    }

    #[test]
    fn test_profile_json_roundtrip() {
        let profile = BurstProfile {
            serial: SerialSettings::new("COM5"),
            ..Default::default()
        };
        let json = profile.to_json().unwrap();
        assert_eq!(BurstProfile::from_json(&json).unwrap(), profile);
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let result = BurstProfile::from_file(dir.path().join("missing.json"));
        assert!(matches!(result, Err(ProfileError::Io(_))));
    }

    #[test]
    fn test_malformed_json() {
        assert!(matches!(
            BurstProfile::from_json("{ not json"),
            Err(ProfileError::Parse(_))
        ));
    }
}

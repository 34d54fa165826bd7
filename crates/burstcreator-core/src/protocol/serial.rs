//! Serial port handling
//!
//! Port discovery and the `serialport` backed opener used by the session.

use serialport::{SerialPortInfo, SerialPortType};
use std::collections::HashMap;
#[cfg(target_os = "linux")]
use std::fs;
use tracing::{debug, warn};

use super::settings::{DataBits, FlowControl, Parity, StopBits};
use super::stream::{PortOpener, SerialChannel, SerialLink};
use super::{ProtocolError, SerialSettings, POLL_INTERVAL};

/// Information about an available serial port
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortInfo {
    /// Port name (e.g., "/dev/ttyACM0" or "COM3")
    pub name: String,

    /// USB vendor ID (if USB device)
    pub vid: Option<u16>,

    /// USB product ID (if USB device)
    pub pid: Option<u16>,

    /// Manufacturer name (if available)
    pub manufacturer: Option<String>,

    /// Product name (if available)
    pub product: Option<String>,

    /// Serial number (if available)
    pub serial_number: Option<String>,
}

impl PortInfo {
    fn bare(name: String) -> Self {
        Self {
            name,
            vid: None,
            pid: None,
            manufacturer: None,
            product: None,
            serial_number: None,
        }
    }
}

impl From<SerialPortInfo> for PortInfo {
    fn from(info: SerialPortInfo) -> Self {
        match info.port_type {
            SerialPortType::UsbPort(usb_info) => Self {
                name: info.port_name,
                vid: Some(usb_info.vid),
                pid: Some(usb_info.pid),
                manufacturer: usb_info.manufacturer,
                product: usb_info.product,
                serial_number: usb_info.serial_number,
            },
            _ => Self::bare(info.port_name),
        }
    }
}

/// Sort key putting ttyACM* first, then ttyUSB*, then everything else
fn port_sort_key(name: &str) -> (u8, usize, String) {
    let basename = name.rsplit('/').next().unwrap_or(name);
    if let Some(rest) = basename.strip_prefix("ttyACM") {
        let num = rest.parse::<usize>().unwrap_or(usize::MAX);
        return (0, num, basename.to_string());
    }
    if let Some(rest) = basename.strip_prefix("ttyUSB") {
        let num = rest.parse::<usize>().unwrap_or(usize::MAX);
        return (1, num, basename.to_string());
    }
    (2, 0, basename.to_string())
}

/// List all available serial ports, with /dev fallbacks and deterministic ordering
pub fn list_ports() -> Vec<PortInfo> {
    let mut map: HashMap<String, PortInfo> = HashMap::new();
    match serialport::available_ports() {
        Ok(ports) => {
            for info in ports {
                let p = PortInfo::from(info);
                map.entry(p.name.clone()).or_insert(p);
            }
        }
        Err(e) => warn!("Port enumeration failed: {}", e),
    }

    // udev can lag behind freshly plugged CDC devices
    #[cfg(target_os = "linux")]
    if let Ok(entries) = fs::read_dir("/dev") {
        for entry in entries.flatten() {
            if let Some(fname) = entry.file_name().to_str() {
                if fname.starts_with("ttyACM") || fname.starts_with("ttyUSB") {
                    let full = format!("/dev/{}", fname);
                    map.entry(full.clone())
                        .or_insert_with(|| PortInfo::bare(full));
                }
            }
        }
    }

    let mut v: Vec<PortInfo> = map.into_values().collect();
    v.sort_by_key(|p| port_sort_key(&p.name));
    v
}

/// Opens real serial ports through the `serialport` crate
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemPortOpener;

impl PortOpener for SystemPortOpener {
    fn open(&self, settings: &SerialSettings) -> Result<Box<dyn SerialLink>, ProtocolError> {
        settings.validate()?;

        let builder = serialport::new(&settings.port_name, settings.baud_rate)
            .data_bits(data_bits(settings.data_bits))
            .parity(parity(settings.parity)?)
            .stop_bits(stop_bits(settings.stop_bits)?)
            .flow_control(flow_control(settings.flow_control))
            .timeout(POLL_INTERVAL);

        let port = builder.open().map_err(|e| match e.kind() {
            serialport::ErrorKind::InvalidInput => ProtocolError::ConfigRejected(e.to_string()),
            _ => ProtocolError::PortUnavailable(format!("{}: {}", settings.port_name, e)),
        })?;

        let mut channel = SerialChannel::new(port);
        // Stale bytes from before the open are not part of this session
        if let Err(e) = channel.clear_input_buffer() {
            warn!("Failed to clear input buffer on {}: {}", settings.port_name, e);
        }
        debug!(
            "Opened {} at {} baud ({:?})",
            channel.name().unwrap_or_else(|| settings.port_name.clone()),
            settings.baud_rate,
            settings
        );
        Ok(Box::new(channel))
    }
}

fn data_bits(bits: DataBits) -> serialport::DataBits {
    match bits {
        DataBits::Five => serialport::DataBits::Five,
        DataBits::Six => serialport::DataBits::Six,
        DataBits::Seven => serialport::DataBits::Seven,
        DataBits::Eight => serialport::DataBits::Eight,
    }
}

fn parity(parity: Parity) -> Result<serialport::Parity, ProtocolError> {
    match parity {
        Parity::None => Ok(serialport::Parity::None),
        Parity::Odd => Ok(serialport::Parity::Odd),
        Parity::Even => Ok(serialport::Parity::Even),
        Parity::Mark | Parity::Space => Err(ProtocolError::ConfigRejected(format!(
            "{:?} parity is not supported by the serial backend",
            parity
        ))),
    }
}

fn stop_bits(bits: StopBits) -> Result<serialport::StopBits, ProtocolError> {
    match bits {
        StopBits::One => Ok(serialport::StopBits::One),
        StopBits::Two => Ok(serialport::StopBits::Two),
        StopBits::OnePointFive => Err(ProtocolError::ConfigRejected(
            "1.5 stop bits are not supported by the serial backend".to_string(),
        )),
    }
}

fn flow_control(flow: FlowControl) -> serialport::FlowControl {
    match flow {
        FlowControl::None => serialport::FlowControl::None,
        FlowControl::Hardware => serialport::FlowControl::Hardware,
        FlowControl::Software => serialport::FlowControl::Software,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_ports_sorted_and_unique() {
        let ports = list_ports();

        let keys: Vec<_> = ports.iter().map(|p| port_sort_key(&p.name)).collect();
        assert!(keys.windows(2).all(|w| w[0] <= w[1]));

        let mut names: Vec<&str> = ports.iter().map(|p| p.name.as_str()).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), ports.len());
    }

    #[test]
    fn test_port_sorting() {
        let names = vec![
            "/dev/ttyUSB1",
            "/dev/ttyACM1",
            "/dev/ttyUSB0",
            "/dev/ttyACM0",
            "/dev/someport",
            "/dev/ttyACM10",
        ];
        let mut ports: Vec<PortInfo> = names
            .into_iter()
            .map(|n| PortInfo::bare(n.to_string()))
            .collect();

        ports.sort_by_key(|p| port_sort_key(&p.name));
        let ordered: Vec<String> = ports.into_iter().map(|p| p.name).collect();

        assert_eq!(
            ordered,
            vec![
                "/dev/ttyACM0",
                "/dev/ttyACM1",
                "/dev/ttyACM10",
                "/dev/ttyUSB0",
                "/dev/ttyUSB1",
                "/dev/someport",
            ]
        );
    }

    #[test]
    fn test_unsupported_settings_rejected_before_open() {
        let opener = SystemPortOpener;
        let settings = SerialSettings {
            parity: Parity::Mark,
            ..SerialSettings::new("/dev/does-not-exist")
        };
        assert!(matches!(
            opener.open(&settings),
            Err(ProtocolError::ConfigRejected(_))
        ));

        let settings = SerialSettings {
            stop_bits: StopBits::OnePointFive,
            ..SerialSettings::new("/dev/does-not-exist")
        };
        assert!(matches!(
            opener.open(&settings),
            Err(ProtocolError::ConfigRejected(_))
        ));
    }

    #[test]
    fn test_missing_port_is_unavailable() {
        let opener = SystemPortOpener;
        let result = opener.open(&SerialSettings::new("/dev/burstcreator-missing-port"));
        assert!(matches!(
            result,
            Err(ProtocolError::PortUnavailable(_)) | Err(ProtocolError::ConfigRejected(_))
        ));
    }
}

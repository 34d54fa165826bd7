//! Packet container and field writer
//!
//! Every multi-byte field on the wire is little-endian. The device copies the
//! buffer straight into its burst FIFO, so there is no framing, length prefix
//! or checksum.

use byteorder::{ByteOrder, LittleEndian};
use std::fmt;

use super::PACKET_LEN;

/// An encoded burst, ready to be written to the port
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Packet {
    bytes: Vec<u8>,
}

impl Packet {
    /// Raw packet bytes
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Consume the packet, returning the bytes
    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    /// Encoded size in bytes
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// True if the packet holds no bytes
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Space separated hex dump, e.g. `f4 01 00 00`
    pub fn to_hex(&self) -> String {
        self.bytes
            .iter()
            .map(|b| format!("{:02x}", b))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl AsRef<[u8]> for Packet {
    fn as_ref(&self) -> &[u8] {
        &self.bytes
    }
}

impl fmt::Display for Packet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

/// Builder for laying out packet fields in wire order
pub(crate) struct PacketBuilder {
    bytes: Vec<u8>,
}

impl PacketBuilder {
    pub(crate) fn new() -> Self {
        Self {
            bytes: Vec::with_capacity(PACKET_LEN),
        }
    }

    /// Add a single byte
    pub(crate) fn byte(mut self, b: u8) -> Self {
        self.bytes.push(b);
        self
    }

    /// Add a 16-bit value (little-endian)
    pub(crate) fn u16_le(mut self, value: u16) -> Self {
        let mut bytes = [0u8; 2];
        LittleEndian::write_u16(&mut bytes, value);
        self.bytes.extend_from_slice(&bytes);
        self
    }

    /// Add a 32-bit value (little-endian)
    pub(crate) fn u32_le(mut self, value: u32) -> Self {
        let mut bytes = [0u8; 4];
        LittleEndian::write_u32(&mut bytes, value);
        self.bytes.extend_from_slice(&bytes);
        self
    }

    pub(crate) fn build(self) -> Packet {
        Packet { bytes: self.bytes }
    }
}

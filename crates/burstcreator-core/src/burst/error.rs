//! Burst encoding errors

use thiserror::Error;

/// Errors raised while turning burst parameters into a wire packet
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BurstError {
    /// A parameter cannot be encoded; nothing was produced
    #[error("Invalid parameter `{field}`: {reason}")]
    InvalidParameter {
        /// Name of the offending field
        field: &'static str,
        /// What is wrong with it
        reason: String,
    },

    /// A buffer handed to the frame parser is not one packet long
    #[error("Invalid packet length: expected {expected} bytes, got {actual}")]
    InvalidLength {
        /// Packet length
        expected: usize,
        /// Length received
        actual: usize,
    },
}

impl BurstError {
    pub(crate) fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        BurstError::InvalidParameter {
            field,
            reason: reason.into(),
        }
    }
}

//! Burst parameter to wire packet conversion
//!
//! The firmware works with periods, not frequencies, and with absolute
//! modulation floors, not depths, so both conversions happen here. All
//! arithmetic is done in `f64` and truncated toward zero; the evaluation
//! order below is part of the wire contract.

use std::mem::size_of;

use super::{
    packet::PacketBuilder, BurstError, BurstParameters, Packet, RunMode, FREQUENCY_FLOOR_PERIOD_MAX,
    PULSE_WIDTH_FLOOR_MIN, VOLTAGE_FLOOR_MIN,
};

const MICROS_PER_SECOND: f64 = 1_000_000.0;
const MILLIS_PER_SECOND: f64 = 1_000.0;

/// Encode a burst that the device should run immediately
pub fn encode(params: &BurstParameters) -> Result<Packet, BurstError> {
    encode_with_mode(params, RunMode::Immediate)
}

/// Encode a burst with an explicit run mode byte
///
/// Fails with [`BurstError::InvalidParameter`] when a frequency is not
/// positive, a modulation amount exceeds 1000 per mille, or an unclamped
/// field does not fit its wire width. No bytes are produced on failure.
pub fn encode_with_mode(params: &BurstParameters, mode: RunMode) -> Result<Packet, BurstError> {
    let frequency_hz = hertz("frequency_tenths_hz", params.frequency_tenths_hz)?;
    let voltage_mod_hz = hertz(
        "voltage_mod_freq_tenths_hz",
        params.voltage_mod_freq_tenths_hz,
    )?;
    let pulse_width_mod_hz = hertz(
        "pulse_width_mod_freq_tenths_hz",
        params.pulse_width_mod_freq_tenths_hz,
    )?;
    let frequency_mod_hz = hertz(
        "frequency_mod_freq_tenths_hz",
        params.frequency_mod_freq_tenths_hz,
    )?;

    let voltage_depth = per_mille(
        "voltage_mod_amount_per_mille",
        params.voltage_mod_amount_per_mille,
    )?;
    let pulse_width_depth = per_mille(
        "pulse_width_mod_amount_per_mille",
        params.pulse_width_mod_amount_per_mille,
    )?;
    let frequency_depth = per_mille(
        "frequency_mod_amount_per_mille",
        params.frequency_mod_amount_per_mille,
    )?;

    let duration: u32 = truncate("duration_seconds", params.duration_seconds * 100.0)?;

    let pulse_width_base = params.pulse_width_units / 10.0;
    let pulse_width: u8 = truncate("pulse_width_units", pulse_width_base)?;

    let period: u16 = truncate(
        "frequency_tenths_hz",
        (1.0 / frequency_hz) * MICROS_PER_SECOND,
    )?;

    let voltage = u8::try_from(params.voltage_units).map_err(|_| {
        BurstError::invalid(
            "voltage_units",
            format!("{} does not fit in 8 bits", params.voltage_units),
        )
    })?;

    let voltage_mod_period: u16 = truncate(
        "voltage_mod_freq_tenths_hz",
        (1.0 / voltage_mod_hz) * MILLIS_PER_SECOND,
    )?;
    let volts = f64::from(params.voltage_units);
    let voltage_floor: u8 = truncate(
        "voltage_mod_amount_per_mille",
        volts - volts * voltage_depth,
    )?;
    let voltage_floor = voltage_floor.max(VOLTAGE_FLOOR_MIN);

    let pulse_width_mod_period: u16 = truncate(
        "pulse_width_mod_freq_tenths_hz",
        (1.0 / pulse_width_mod_hz) * MILLIS_PER_SECOND,
    )?;
    let pulse_width_floor: u8 = truncate(
        "pulse_width_mod_amount_per_mille",
        pulse_width_base - pulse_width_base * pulse_width_depth,
    )?;
    let pulse_width_floor = pulse_width_floor.max(PULSE_WIDTH_FLOOR_MIN);

    let frequency_mod_period: u16 = truncate(
        "frequency_mod_freq_tenths_hz",
        (1.0 / frequency_mod_hz) * MILLIS_PER_SECOND,
    )?;
    // A full-depth sweep reaches 0 Hz, i.e. an infinite period; it saturates too.
    let floor_hz = frequency_hz - frequency_hz * frequency_depth;
    let floor_period = ((1.0 / floor_hz) * MICROS_PER_SECOND).trunc();
    let frequency_floor_period = if floor_period >= f64::from(FREQUENCY_FLOOR_PERIOD_MAX) + 1.0 {
        FREQUENCY_FLOOR_PERIOD_MAX
    } else {
        truncate("frequency_mod_amount_per_mille", floor_period)?
    };

    let pause: u16 = truncate("pause_seconds", params.pause_seconds * 100.0)?;

    Ok(PacketBuilder::new()
        .u32_le(duration)
        .byte(pulse_width)
        .u16_le(period)
        .byte(voltage)
        .byte(params.voltage_waveform.into())
        .u16_le(voltage_mod_period)
        .byte(voltage_floor)
        .byte(params.pulse_width_mod_waveform.into())
        .u16_le(pulse_width_mod_period)
        .byte(pulse_width_floor)
        .byte(params.frequency_mod_waveform.into())
        .u16_le(frequency_mod_period)
        .u16_le(frequency_floor_period)
        .byte(params.polarity.into())
        .u16_le(pause)
        .u16_le(params.repeat_count)
        .byte(mode.into())
        .build())
}

/// Period in microseconds for a frequency given in 0.1 Hz
///
/// Returns `None` for a frequency that is not strictly positive. The result is
/// not limited to the 16-bit wire field: `period_micros(10.0)` (1 Hz) is
/// `Some(1_000_000)`.
pub fn period_micros(tenths_hz: f64) -> Option<u64> {
    period(tenths_hz, MICROS_PER_SECOND)
}

/// Period in milliseconds for a frequency given in 0.1 Hz
pub fn period_millis(tenths_hz: f64) -> Option<u64> {
    period(tenths_hz, MILLIS_PER_SECOND)
}

fn period(tenths_hz: f64, units_per_second: f64) -> Option<u64> {
    let hz = hertz("frequency", tenths_hz).ok()?;
    let value = ((1.0 / hz) * units_per_second).trunc();
    (value.is_finite() && value <= u64::MAX as f64).then_some(value as u64)
}

fn hertz(field: &'static str, tenths_hz: f64) -> Result<f64, BurstError> {
    if !tenths_hz.is_finite() || tenths_hz <= 0.0 {
        return Err(BurstError::invalid(
            field,
            format!("frequency must be greater than zero, got {}", tenths_hz),
        ));
    }
    Ok(tenths_hz / 10.0)
}

fn per_mille(field: &'static str, amount: u16) -> Result<f64, BurstError> {
    if amount > 1000 {
        return Err(BurstError::invalid(
            field,
            format!("{} is outside 0-1000 per mille", amount),
        ));
    }
    Ok(f64::from(amount) / 1000.0)
}

/// Truncate toward zero and check the result fits the target field
fn truncate<T: TryFrom<u64>>(field: &'static str, value: f64) -> Result<T, BurstError> {
    if !value.is_finite() {
        return Err(BurstError::invalid(
            field,
            format!("{} is not a finite number", value),
        ));
    }
    let truncated = value.trunc();
    if truncated < 0.0 {
        return Err(BurstError::invalid(
            field,
            format!("{} is negative", truncated),
        ));
    }
    T::try_from(truncated as u64).map_err(|_| {
        BurstError::invalid(
            field,
            format!("{} does not fit in {} bits", truncated, size_of::<T>() * 8),
        )
    })
}

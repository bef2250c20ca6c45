//! RF-related registers
//!
//! This module contains registers related to the RF front end:
//! - Carrier frequency
//! - Bit rate
//! - Power amplifier configuration
//!
//! Frequency and bit rate are stored as fixed-point values derived from the
//! 32 MHz crystal, see [`FXOSC`]. The conversion helpers are exact to the
//! datasheet formulas, including their integer rounding.

use core::convert::Infallible;

use regiface::{register, FromByteArray, ReadableRegister, ToByteArray, WritableRegister};

use super::FXOSC;

/// Converts a carrier frequency in Hz to the RegFrf byte encoding.
///
/// `Frf = round(hz * 2^19 / FXOSC)`, stored big-endian over three registers.
/// Frequencies above the 24-bit range (about 1.024 GHz) saturate at
/// `0xFFFFFF`.
pub fn frequency_to_registers(hz: u32) -> [u8; 3] {
    let frf = ((u64::from(hz) << 19) + u64::from(FXOSC / 2)) / u64::from(FXOSC);
    let frf = frf.min(0xFF_FFFF);
    let [_, _, _, _, _, msb, mid, lsb] = frf.to_be_bytes();
    [msb, mid, lsb]
}

/// Converts a RegFrf byte encoding back to a carrier frequency in Hz.
///
/// The result is truncated, so frequencies that are not a multiple of
/// `FXOSC / 2^19` (about 61 Hz) come back slightly low.
pub fn registers_to_frequency(frf: [u8; 3]) -> u32 {
    let raw = u64::from(u32::from_be_bytes([0, frf[0], frf[1], frf[2]]));
    ((raw * u64::from(FXOSC)) >> 19) as u32
}

/// Converts a bit rate in bps to the RegBitrate byte encoding.
///
/// The divider is the nearest integer to `FXOSC / bps`. Rates too slow for a
/// 16-bit divider (including zero) saturate at the slowest encodable rate.
pub fn bitrate_to_registers(bps: u32) -> [u8; 2] {
    let divider = (FXOSC + bps / 2).checked_div(bps).unwrap_or(u32::MAX);
    u16::try_from(divider).unwrap_or(u16::MAX).to_be_bytes()
}

/// Converts a RegBitrate byte encoding back to a bit rate in bps.
///
/// Uses the same nearest-integer division as [`bitrate_to_registers`]. A zero
/// divider is not a valid setting and reads back as 0 bps.
pub fn registers_to_bitrate(br: [u8; 2]) -> u32 {
    let divider = u32::from(u16::from_be_bytes(br));
    (FXOSC + divider / 2).checked_div(divider).unwrap_or(0)
}

/// Bit rate registers (address: 0x02-0x03)
///
/// Sets the FSK/OOK bit rate as an integer division of the crystal frequency.
///
/// # Important Notes
/// - Default after reset: 0x1A0B (4.8 kbps)
/// - The fractional part in RegBitRateFrac (0x5D) is left at zero
#[register(0x02u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, ReadableRegister, WritableRegister)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Bitrate {
    /// Raw big-endian divider bytes
    pub raw: [u8; 2],
}

impl Bitrate {
    /// Builds the register value closest to the given rate in bps.
    pub fn from_bps(bps: u32) -> Self {
        Self {
            raw: bitrate_to_registers(bps),
        }
    }

    /// Returns the bit rate this register value selects, in bps.
    pub fn bps(self) -> u32 {
        registers_to_bitrate(self.raw)
    }
}

impl Default for Bitrate {
    fn default() -> Self {
        Self { raw: [0x1A, 0x0B] }
    }
}

/// RF carrier frequency registers (address: 0x06-0x08)
///
/// 24-bit frequency synthesizer word, MSB first. The step size is
/// `FXOSC / 2^19`, about 61.035 Hz.
///
/// # Important Notes
/// - Default after reset: 0x6C8000 (434 MHz)
/// - A change only takes effect when RegFrfLsb is written, so the three bytes
///   are always written together in one burst
#[register(0x06u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, ReadableRegister, WritableRegister)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Frequency {
    /// Raw big-endian synthesizer word
    pub raw: [u8; 3],
}

impl Frequency {
    /// Builds the register value closest to the given frequency in Hz.
    pub fn from_hz(hz: u32) -> Self {
        Self {
            raw: frequency_to_registers(hz),
        }
    }

    /// Returns the carrier frequency this register value selects, in Hz.
    pub fn hz(self) -> u32 {
        registers_to_frequency(self.raw)
    }
}

impl Default for Frequency {
    fn default() -> Self {
        Self {
            raw: [0x6C, 0x80, 0x00],
        }
    }
}

/// High power PA settings register (address: 0x4D)
///
/// Lives outside the configuration image and is always accessed on its own.
///
/// # Important Notes
/// - `Normal` is the reset default
/// - `Boost20dBm` enables +20 dBm on PA_BOOST and requires the OCP limit
///   to be raised accordingly
#[register(0x4Du8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ReadableRegister, WritableRegister)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PaDac {
    /// Default PA_BOOST output power
    #[default]
    Normal,
    /// +20 dBm on PA_BOOST
    Boost20dBm,
}

/// Error type for PA DAC conversion
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct InvalidPaDac(pub u8);

impl PaDac {
    /// Convert a raw byte value to a PA DAC setting
    pub fn from_byte(value: u8) -> Result<Self, InvalidPaDac> {
        match value & 0x07 {
            0x04 => Ok(Self::Normal),
            0x07 => Ok(Self::Boost20dBm),
            _ => Err(InvalidPaDac(value)),
        }
    }

    /// Convert the PA DAC setting to its raw byte value
    ///
    /// Bits 7:3 are reserved and keep their reset value 0x10.
    pub fn to_byte(self) -> u8 {
        match self {
            Self::Normal => 0x84,
            Self::Boost20dBm => 0x87,
        }
    }
}

impl FromByteArray for Bitrate {
    type Error = Infallible;
    type Array = [u8; 2];

    fn from_bytes(bytes: Self::Array) -> Result<Self, Self::Error> {
        Ok(Self { raw: bytes })
    }
}

impl ToByteArray for Bitrate {
    type Error = Infallible;
    type Array = [u8; 2];

    fn to_bytes(self) -> Result<Self::Array, Self::Error> {
        Ok(self.raw)
    }
}

impl FromByteArray for Frequency {
    type Error = Infallible;
    type Array = [u8; 3];

    fn from_bytes(bytes: Self::Array) -> Result<Self, Self::Error> {
        Ok(Self { raw: bytes })
    }
}

impl ToByteArray for Frequency {
    type Error = Infallible;
    type Array = [u8; 3];

    fn to_bytes(self) -> Result<Self::Array, Self::Error> {
        Ok(self.raw)
    }
}

impl FromByteArray for PaDac {
    type Error = InvalidPaDac;
    type Array = [u8; 1];

    fn from_bytes(bytes: Self::Array) -> Result<Self, Self::Error> {
        Self::from_byte(bytes[0])
    }
}

impl ToByteArray for PaDac {
    type Error = Infallible;
    type Array = [u8; 1];

    fn to_bytes(self) -> Result<Self::Array, Self::Error> {
        Ok([self.to_byte()])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_frequencies_round_trip() {
        let cases = [
            (315_000_000, [0x4E, 0xC0, 0x00]),
            (434_000_000, [0x6C, 0x80, 0x00]),
            (868_000_000, [0xD9, 0x00, 0x00]),
            (915_000_000, [0xE4, 0xC0, 0x00]),
        ];
        for (hz, regs) in cases {
            assert_eq!(frequency_to_registers(hz), regs, "{hz} Hz");
            assert_eq!(registers_to_frequency(regs), hz, "{regs:02X?}");
        }
    }

    #[test]
    fn inexact_frequencies_read_back_low() {
        let cases = [
            (916_300_000, [0xE5, 0x13, 0x33], 916_299_987),
            (916_600_000, [0xE5, 0x26, 0x66], 916_599_975),
        ];
        for (hz, regs, read_back) in cases {
            assert_eq!(frequency_to_registers(hz), regs, "{hz} Hz");
            assert_eq!(registers_to_frequency(regs), read_back, "{regs:02X?}");
        }
    }

    #[test]
    fn step_multiples_are_exact() {
        // FXOSC / 2^19 = 15625 / 256 Hz, so every multiple of 15625 Hz is exact.
        for k in [1u32, 7, 1024, 27_776, 60_000] {
            let hz = k * 15_625;
            assert_eq!(registers_to_frequency(frequency_to_registers(hz)), hz);
        }
    }

    #[test]
    fn frequencies_past_top_step_saturate() {
        assert_eq!(registers_to_frequency([0xFF, 0xFF, 0xFF]), 1_023_999_938);
        assert_eq!(frequency_to_registers(1_023_999_938), [0xFF, 0xFF, 0xFF]);
        assert_eq!(frequency_to_registers(1_024_000_000), [0xFF, 0xFF, 0xFF]);
        assert_eq!(frequency_to_registers(2_000_000_000), [0xFF, 0xFF, 0xFF]);
        assert_eq!(frequency_to_registers(u32::MAX), [0xFF, 0xFF, 0xFF]);
    }

    #[test]
    fn exact_bitrates_round_trip() {
        let cases = [
            (1200, [0x68, 0x2B]),
            (2400, [0x34, 0x15]),
            (25_000, [0x05, 0x00]),
            (50_000, [0x02, 0x80]),
        ];
        for (bps, regs) in cases {
            assert_eq!(bitrate_to_registers(bps), regs, "{bps} bps");
            assert_eq!(registers_to_bitrate(regs), bps, "{regs:02X?}");
        }
    }

    #[test]
    fn inexact_bitrates_use_nearest_divider() {
        let cases = [
            (16_384, [0x07, 0xA1], 16_385),
            (19_200, [0x06, 0x83], 19_196),
            (38_400, [0x03, 0x41], 38_415),
            (150_000, [0x00, 0xD5], 150_235),
        ];
        for (bps, regs, read_back) in cases {
            assert_eq!(bitrate_to_registers(bps), regs, "{bps} bps");
            assert_eq!(registers_to_bitrate(regs), read_back, "{regs:02X?}");
        }
    }

    #[test]
    fn degenerate_bitrates_saturate() {
        assert_eq!(bitrate_to_registers(0), [0xFF, 0xFF]);
        assert_eq!(bitrate_to_registers(100), [0xFF, 0xFF]);
        assert_eq!(registers_to_bitrate([0x00, 0x00]), 0);
    }

    #[test]
    fn pa_dac_keeps_reserved_bits() {
        assert_eq!(PaDac::Boost20dBm.to_byte(), 0x87);
        assert_eq!(PaDac::from_byte(0x84), Ok(PaDac::Normal));
        assert_eq!(PaDac::from_byte(0x85), Err(InvalidPaDac(0x85)));
    }
}

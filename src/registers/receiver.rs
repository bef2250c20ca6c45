//! Receiver registers
//!
//! This module contains registers for the receive chain:
//! - RSSI readout
//! - Channel filter bandwidth
//!
//! The channel filter bandwidth is encoded as a mantissa/exponent pair,
//! `BW = FXOSC / (mantissa * 2^(exponent + 2))`.

use core::convert::Infallible;

use regiface::{register, FromByteArray, ReadableRegister, ToByteArray, WritableRegister};

use super::FXOSC;

const RX_BW_MANT_SHIFT: u8 = 3;
const RX_BW_MANT_MASK: u8 = 0b11 << RX_BW_MANT_SHIFT;
const RX_BW_EXP_MASK: u8 = 0b111;

/// Narrowest channel filter: mantissa 24, exponent 7.
pub const MIN_CHANNEL_BANDWIDTH: u32 = 2604;

/// RSSI value register (address: 0x11)
///
/// Absolute signal strength averaged over the number of samples configured
/// in RegRssiConfig.
///
/// # Important Notes
/// - The register holds `-2 * RSSI[dBm]`
/// - Only meaningful while in Receiver mode
#[register(0x11u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, ReadableRegister)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RssiValue {
    /// Raw register value in -0.5 dBm steps
    pub raw: u8,
}

impl RssiValue {
    /// Signal strength in dBm, truncated toward zero.
    pub fn dbm(self) -> i16 {
        -i16::from(self.raw) / 2
    }
}

/// Channel filter mantissa
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Mantissa {
    /// RxBwMant = 16
    M16 = 0,
    /// RxBwMant = 20
    M20 = 1,
    /// RxBwMant = 24
    M24 = 2,
}

impl Mantissa {
    /// Numeric mantissa value used in the bandwidth formula
    pub fn value(self) -> u32 {
        match self {
            Self::M16 => 16,
            Self::M20 => 20,
            Self::M24 => 24,
        }
    }
}

/// Error type for a channel filter register holding the reserved mantissa
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct UnknownBandwidth(pub u8);

/// Channel filter bandwidth register (address: 0x12)
///
/// Selects the single-side bandwidth of the receive channel filter.
///
/// # Important Notes
/// - Exponent 0 is reserved; valid settings range from 2.6 kHz (24, 7)
///   up to 250 kHz (16, 1)
/// - Mantissa bits `11` are reserved and cannot be decoded
#[register(0x12u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, ReadableRegister, WritableRegister)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ChannelBandwidth {
    /// RxBwMant
    pub mantissa: Mantissa,
    /// RxBwExp, 1 to 7
    pub exponent: u8,
}

impl ChannelBandwidth {
    /// Bandwidth in Hz selected by this mantissa/exponent pair.
    pub fn hz(self) -> u32 {
        FXOSC / (self.mantissa.value() << (self.exponent + 2))
    }

    /// Best achievable setting for the requested bandwidth in Hz.
    ///
    /// Settings are scanned from the narrowest filter upward. At the first
    /// setting at or above the request, whichever of it and the widest
    /// setting below the request is closer wins; ties go to the wider one.
    /// Requests below [`MIN_CHANNEL_BANDWIDTH`] clamp to the narrowest filter
    /// and requests above 250 kHz clamp to the widest.
    pub fn nearest(hz: u32) -> Self {
        let mut below = Self {
            mantissa: Mantissa::M24,
            exponent: 7,
        };
        if hz < MIN_CHANNEL_BANDWIDTH {
            return below;
        }
        for exponent in (1..=7).rev() {
            for mantissa in [Mantissa::M24, Mantissa::M20, Mantissa::M16] {
                let candidate = Self { mantissa, exponent };
                let bw = candidate.hz();
                if bw >= hz {
                    return if bw - hz <= hz - below.hz() {
                        candidate
                    } else {
                        below
                    };
                }
                below = candidate;
            }
        }
        below
    }

    /// Convert a raw byte value to a channel bandwidth setting
    pub fn from_byte(value: u8) -> Result<Self, UnknownBandwidth> {
        let mantissa = match (value & RX_BW_MANT_MASK) >> RX_BW_MANT_SHIFT {
            0 => Mantissa::M16,
            1 => Mantissa::M20,
            2 => Mantissa::M24,
            _ => return Err(UnknownBandwidth(value)),
        };
        Ok(Self {
            mantissa,
            exponent: value & RX_BW_EXP_MASK,
        })
    }

    /// Convert the setting to its raw byte value
    pub fn to_byte(self) -> u8 {
        (self.mantissa as u8) << RX_BW_MANT_SHIFT | (self.exponent & RX_BW_EXP_MASK)
    }
}

/// Converts a bandwidth in Hz to the RegRxBw byte encoding.
pub fn channel_bandwidth_to_register(hz: u32) -> u8 {
    ChannelBandwidth::nearest(hz).to_byte()
}

/// Converts a RegRxBw byte encoding to a bandwidth in Hz.
pub fn register_to_channel_bandwidth(value: u8) -> Result<u32, UnknownBandwidth> {
    ChannelBandwidth::from_byte(value).map(ChannelBandwidth::hz)
}

impl FromByteArray for RssiValue {
    type Error = Infallible;
    type Array = [u8; 1];

    fn from_bytes(bytes: Self::Array) -> Result<Self, Self::Error> {
        Ok(Self { raw: bytes[0] })
    }
}

impl FromByteArray for ChannelBandwidth {
    type Error = UnknownBandwidth;
    type Array = [u8; 1];

    fn from_bytes(bytes: Self::Array) -> Result<Self, Self::Error> {
        Self::from_byte(bytes[0])
    }
}

impl ToByteArray for ChannelBandwidth {
    type Error = Infallible;
    type Array = [u8; 1];

    fn to_bytes(self) -> Result<Self::Array, Self::Error> {
        Ok([self.to_byte()])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reg(mantissa: Mantissa, exponent: u8) -> u8 {
        ChannelBandwidth { mantissa, exponent }.to_byte()
    }

    #[test]
    fn exact_bandwidths_round_trip() {
        let cases = [
            (12_500, reg(Mantissa::M20, 5)),
            (25_000, reg(Mantissa::M20, 4)),
            (166_666, reg(Mantissa::M24, 1)),
            (200_000, reg(Mantissa::M20, 1)),
            (250_000, reg(Mantissa::M16, 1)),
        ];
        for (hz, value) in cases {
            assert_eq!(channel_bandwidth_to_register(hz), value, "{hz} Hz");
            assert_eq!(register_to_channel_bandwidth(value), Ok(hz), "{value:02X}");
        }
    }

    #[test]
    fn inexact_bandwidths_pick_nearest_setting() {
        let cases = [
            (0, reg(Mantissa::M24, 7), 2604),
            (1000, reg(Mantissa::M24, 7), 2604),
            (48_000, reg(Mantissa::M20, 3), 50_000),
            (150_000, reg(Mantissa::M24, 1), 166_666),
            (300_000, reg(Mantissa::M16, 1), 250_000),
        ];
        for (hz, value, achieved) in cases {
            assert_eq!(channel_bandwidth_to_register(hz), value, "{hz} Hz");
            assert_eq!(register_to_channel_bandwidth(value), Ok(achieved), "{value:02X}");
        }
    }

    #[test]
    fn equidistant_request_prefers_wider_filter() {
        // 112.5 kHz sits exactly between 100 kHz (20, 2) and 125 kHz (16, 2).
        assert_eq!(channel_bandwidth_to_register(112_500), reg(Mantissa::M16, 2));
        assert_eq!(channel_bandwidth_to_register(112_499), reg(Mantissa::M20, 2));
    }

    #[test]
    fn reserved_mantissa_is_rejected() {
        assert_eq!(register_to_channel_bandwidth(0x1D), Err(UnknownBandwidth(0x1D)));
        assert_eq!(register_to_channel_bandwidth(0x15), Ok(10_416));
    }

    #[test]
    fn rssi_is_half_negative_register() {
        assert_eq!(RssiValue { raw: 0x50 }.dbm(), -40);
        assert_eq!(RssiValue { raw: 0xFF }.dbm(), -127);
        assert_eq!(RssiValue { raw: 0 }.dbm(), 0);
    }
}

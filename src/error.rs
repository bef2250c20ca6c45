//! Driver error type

use core::convert::Infallible;
use core::fmt;

use crate::registers::UnknownBandwidth;

/// RFM95 driver error
///
/// `Bus`, `Pin` and `Timeout` are latched by [`Radio`](crate::Radio): once one
/// occurs every later operation returns it without touching the hardware,
/// until the next mode transition clears it. `HardwareVersion` is permanent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    /// Register access on the transport failed
    Bus,
    /// Driving the reset line failed
    Pin,
    /// The version register did not hold the expected revision
    HardwareVersion { actual: u16, expected: u16 },
    /// RegRxBw holds the reserved mantissa encoding
    UnknownBandwidth(u8),
    /// A hardware poll exceeded the configured attempt limit
    Timeout,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bus => write!(f, "SPI bus error"),
            Self::Pin => write!(f, "reset pin error"),
            Self::HardwareVersion { actual, expected } => write!(
                f,
                "unexpected hardware version {actual:04X} (should be {expected:04X})"
            ),
            Self::UnknownBandwidth(value) => {
                write!(f, "unknown RX bandwidth mantissa in {value:02X}")
            }
            Self::Timeout => write!(f, "timed out waiting for hardware"),
        }
    }
}

impl core::error::Error for Error {}

impl From<Infallible> for Error {
    fn from(never: Infallible) -> Self {
        match never {}
    }
}

impl From<UnknownBandwidth> for Error {
    fn from(err: UnknownBandwidth) -> Self {
        Self::UnknownBandwidth(err.0)
    }
}

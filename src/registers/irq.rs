//! Interrupt status registers
//!
//! RegIrqFlags1 and RegIrqFlags2 report the chip's internal state: mode
//! readiness, PLL lock, and the FIFO fill state used to pace packet
//! streaming. Most flags are read-only; FifoOverrun (and a few others) are
//! cleared by writing a 1.

use bitflags::bitflags;
use core::convert::Infallible;

use regiface::{register, FromByteArray, ReadableRegister, ToByteArray, WritableRegister};

bitflags! {
    /// Mode and receiver status flags
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct ModeFlags: u8 {
        /// The requested operating mode is ready
        const MODE_READY = 1 << 7;
        const RX_READY = 1 << 6;
        const TX_READY = 1 << 5;
        const PLL_LOCK = 1 << 4;
        const RSSI = 1 << 3;
        const TIMEOUT = 1 << 2;
        const PREAMBLE_DETECT = 1 << 1;
        const SYNC_ADDRESS_MATCH = 1 << 0;
    }
}

bitflags! {
    /// FIFO and packet handler status flags
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct FifoFlags: u8 {
        /// FIFO holds 64 bytes
        const FIFO_FULL = 1 << 7;
        /// FIFO holds no bytes
        const FIFO_EMPTY = 1 << 6;
        /// FIFO holds more bytes than the FifoThreshold
        const FIFO_LEVEL = 1 << 5;
        /// FIFO overrun occurred, cleared by writing 1
        const FIFO_OVERRUN = 1 << 4;
        const PACKET_SENT = 1 << 3;
        const PAYLOAD_READY = 1 << 2;
        const CRC_OK = 1 << 1;
        const LOW_BAT = 1 << 0;
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for ModeFlags {
    fn format(&self, fmt: defmt::Formatter) {
        defmt::write!(fmt, "ModeFlags {{ 0b{0=0..8:08b} }}", self.bits())
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for FifoFlags {
    fn format(&self, fmt: defmt::Formatter) {
        defmt::write!(fmt, "FifoFlags {{ 0b{0=0..8:08b} }}", self.bits())
    }
}

/// Mode status register (address: 0x3E)
///
/// # Important Notes
/// - ModeReady goes high once a mode change has fully settled; it is the
///   only reliable completion signal for mode transitions
#[register(0x3Eu8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, ReadableRegister)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct IrqFlags1 {
    pub flags: ModeFlags,
}

/// FIFO status register (address: 0x3F)
///
/// # Important Notes
/// - FifoEmpty is the idle state when no bytes are queued
/// - Writing FIFO_OVERRUN clears the overrun flag and flushes the FIFO
#[register(0x3Fu8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, ReadableRegister, WritableRegister)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct IrqFlags2 {
    pub flags: FifoFlags,
}

impl IrqFlags2 {
    /// Value that clears the FIFO overrun flag when written.
    pub fn clear_overrun() -> Self {
        Self {
            flags: FifoFlags::FIFO_OVERRUN,
        }
    }
}

impl FromByteArray for IrqFlags1 {
    type Error = Infallible;
    type Array = [u8; 1];

    fn from_bytes(bytes: Self::Array) -> Result<Self, Self::Error> {
        Ok(Self {
            flags: ModeFlags::from_bits_retain(bytes[0]),
        })
    }
}

impl FromByteArray for IrqFlags2 {
    type Error = Infallible;
    type Array = [u8; 1];

    fn from_bytes(bytes: Self::Array) -> Result<Self, Self::Error> {
        Ok(Self {
            flags: FifoFlags::from_bits_retain(bytes[0]),
        })
    }
}

impl ToByteArray for IrqFlags2 {
    type Error = Infallible;
    type Array = [u8; 1];

    fn to_bytes(self) -> Result<Self::Array, Self::Error> {
        Ok([self.flags.bits()])
    }
}

//! System-related registers
//!
//! This module contains registers for system-level control:
//! - Operating mode and modulation selection
//! - Top level sequencer
//! - Silicon version
//!
//! These registers control the chip's state machine and are touched on
//! every transmit and receive.

use bitflags::bitflags;
use core::convert::Infallible;

use regiface::{register, FromByteArray, ReadableRegister, ToByteArray, WritableRegister};

const MODE_MASK: u8 = 0b111;
const MODULATION_SHIFT: u8 = 5;
const MODULATION_MASK: u8 = 0b11 << MODULATION_SHIFT;
const LONG_RANGE_MODE: u8 = 1 << 7;
const LOW_FREQUENCY_MODE: u8 = 1 << 3;

/// Operating mode of the transceiver
///
/// Encoded in bits 2:0 of RegOpMode and ordered by that encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Mode {
    /// Lowest power, configuration retained
    Sleep = 0,
    /// Crystal oscillator running
    Standby = 1,
    /// Frequency synthesizer locked to the TX frequency
    FsTx = 2,
    /// Transmitting
    Transmitter = 3,
    /// Frequency synthesizer locked to the RX frequency
    FsRx = 4,
    /// Receiving
    Receiver = 5,
}

impl Mode {
    /// Decode the 3-bit mode field. Values 6 and 7 are not modes.
    pub fn from_bits(bits: u8) -> Option<Self> {
        match bits & MODE_MASK {
            0 => Some(Self::Sleep),
            1 => Some(Self::Standby),
            2 => Some(Self::FsTx),
            3 => Some(Self::Transmitter),
            4 => Some(Self::FsRx),
            5 => Some(Self::Receiver),
            _ => None,
        }
    }

    /// Human readable state name
    pub fn name(self) -> &'static str {
        match self {
            Self::Sleep => "Sleep",
            Self::Standby => "Standby",
            Self::FsTx => "TX Frequency Synthesizer",
            Self::Transmitter => "Transmitter",
            Self::FsRx => "RX Frequency Synthesizer",
            Self::Receiver => "Receiver",
        }
    }
}

/// Modulation scheme of the FSK/OOK modem
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Modulation {
    Fsk = 0,
    Ook = 1,
}

/// Operating mode register (address: 0x01)
///
/// Selects the modem family, the modulation scheme and the operating mode.
///
/// # Important Notes
/// - The modem family (bit 7) can only be changed in Sleep mode
/// - Held as the raw byte so that a mode change rewrites bits 2:0 and
///   nothing else
#[register(0x01u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, ReadableRegister, WritableRegister)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct OpMode {
    pub raw: u8,
}

impl OpMode {
    /// FSK/OOK family, high frequency bank, with the given modulation and mode.
    pub fn new(modulation: Modulation, mode: Mode) -> Self {
        Self {
            raw: (modulation as u8) << MODULATION_SHIFT | mode as u8,
        }
    }

    /// Decoded operating mode, if the mode field holds one.
    pub fn mode(self) -> Option<Mode> {
        Mode::from_bits(self.raw)
    }

    /// Raw mode field, bits 2:0
    pub fn mode_bits(self) -> u8 {
        self.raw & MODE_MASK
    }

    /// Same register value with only the mode bits replaced.
    pub fn with_mode(self, mode: Mode) -> Self {
        Self {
            raw: self.raw & !MODE_MASK | mode as u8,
        }
    }

    /// Selected modulation, `None` for the reserved encodings.
    pub fn modulation(self) -> Option<Modulation> {
        match (self.raw & MODULATION_MASK) >> MODULATION_SHIFT {
            0 => Some(Modulation::Fsk),
            1 => Some(Modulation::Ook),
            _ => None,
        }
    }

    /// LoRa modem selected instead of FSK/OOK
    pub fn long_range(self) -> bool {
        self.raw & LONG_RANGE_MODE != 0
    }

    /// Low frequency register bank selected
    pub fn low_frequency(self) -> bool {
        self.raw & LOW_FREQUENCY_MODE != 0
    }
}

bitflags! {
    /// Top level sequencer settings (RegSeqConfig1, address: 0x36)
    ///
    /// The sequencer advances the chip through its modes without software
    /// intervention, e.g. from Standby into Transmitter once the FIFO
    /// threshold is reached and back to its idle mode after PacketSent.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct SequencerFlags: u8 {
        /// Start the sequencer (self-clearing)
        const START = 1 << 7;
        /// Stop the sequencer (self-clearing)
        const STOP = 1 << 6;
        /// Idle mode is Sleep instead of Standby
        const IDLE_MODE_SLEEP = 1 << 5;
        /// FromStart: go to Transmitter on a FifoLevel interrupt
        const FROM_START_TO_TX_ON_FIFO_LEVEL = 0b11 << 3;
        /// FromStart: go to Receiver
        const FROM_START_TO_RX = 0b01 << 3;
        /// FromStart: go to Transmitter
        const FROM_START_TO_TX = 0b10 << 3;
        /// LowPowerSelection: Idle instead of SequencerOff
        const LOW_POWER_IDLE = 1 << 2;
        /// FromIdle: go to Receiver instead of Transmitter
        const FROM_IDLE_TO_RX = 1 << 1;
        /// FromTransmit: go to Receiver on PacketSent instead of LowPowerSelection
        const FROM_TRANSMIT_TO_RX = 1 << 0;
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for SequencerFlags {
    fn format(&self, fmt: defmt::Formatter) {
        defmt::write!(fmt, "SequencerFlags {{ 0b{0=0..8:08b} }}", self.bits())
    }
}

/// Sequencer configuration register (address: 0x36)
#[register(0x36u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, ReadableRegister, WritableRegister)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SeqConfig1 {
    pub flags: SequencerFlags,
}

impl SeqConfig1 {
    /// Start the sequencer, entering Transmitter once the FIFO level is
    /// exceeded and returning to Standby after the packet is sent.
    pub fn transmit_on_fifo_level() -> Self {
        Self {
            flags: SequencerFlags::START | SequencerFlags::FROM_START_TO_TX_ON_FIFO_LEVEL,
        }
    }

    /// Stop the sequencer, leaving the mode to software control.
    pub fn stop() -> Self {
        Self {
            flags: SequencerFlags::STOP,
        }
    }
}

/// Silicon version register (address: 0x42)
///
/// Full revision number in bits 7:4 and metal mask revision in bits 3:0.
/// The RFM95W reports 0x12.
#[register(0x42u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, ReadableRegister)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Version {
    pub raw: u8,
}

impl Version {
    /// Revision as `major << 8 | metal`, e.g. 0x0102 for 0x12.
    pub fn revision(self) -> u16 {
        u16::from(self.raw >> 4) << 8 | u16::from(self.raw & 0x0F)
    }
}

impl FromByteArray for OpMode {
    type Error = Infallible;
    type Array = [u8; 1];

    fn from_bytes(bytes: Self::Array) -> Result<Self, Self::Error> {
        Ok(Self { raw: bytes[0] })
    }
}

impl ToByteArray for OpMode {
    type Error = Infallible;
    type Array = [u8; 1];

    fn to_bytes(self) -> Result<Self::Array, Self::Error> {
        Ok([self.raw])
    }
}

impl FromByteArray for SeqConfig1 {
    type Error = Infallible;
    type Array = [u8; 1];

    fn from_bytes(bytes: Self::Array) -> Result<Self, Self::Error> {
        Ok(Self {
            flags: SequencerFlags::from_bits_retain(bytes[0]),
        })
    }
}

impl ToByteArray for SeqConfig1 {
    type Error = Infallible;
    type Array = [u8; 1];

    fn to_bytes(self) -> Result<Self::Array, Self::Error> {
        Ok([self.flags.bits()])
    }
}

impl FromByteArray for Version {
    type Error = Infallible;
    type Array = [u8; 1];

    fn from_bytes(bytes: Self::Array) -> Result<Self, Self::Error> {
        Ok(Self { raw: bytes[0] })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn op_mode_preserves_other_bits() {
        let op = OpMode { raw: 0b1011_1001 };
        assert!(op.long_range());
        assert_eq!(op.modulation(), Some(Modulation::Ook));
        assert!(op.low_frequency());
        assert_eq!(op.mode(), Some(Mode::Standby));
        assert_eq!(op.with_mode(Mode::Receiver).raw, 0b1011_1101);

        let unknown = OpMode { raw: 0xC7 };
        assert_eq!(unknown.mode(), None);
        assert_eq!(unknown.modulation(), None);
        assert_eq!(unknown.with_mode(Mode::Sleep).raw, 0xC0);
    }

    #[test]
    fn ook_sleep_encoding() {
        assert_eq!(OpMode::new(Modulation::Ook, Mode::Sleep).raw, 0x20);
        assert_eq!(OpMode::new(Modulation::Fsk, Mode::Standby).raw, 0x01);
    }

    #[test]
    fn modes_are_ordered_by_encoding() {
        assert!(Mode::Sleep < Mode::Standby);
        assert!(Mode::Transmitter < Mode::Receiver);
        assert_eq!(Mode::from_bits(6), None);
        assert_eq!(Mode::from_bits(3), Some(Mode::Transmitter));
    }

    #[test]
    fn version_revision() {
        assert_eq!(Version { raw: 0x12 }.revision(), 0x0102);
        assert_eq!(Version { raw: 0x22 }.revision(), 0x0202);
    }

    #[test]
    fn sequencer_transmit_encoding() {
        assert_eq!(SeqConfig1::transmit_on_fifo_level().flags.bits(), 0x98);
        assert_eq!(SeqConfig1::stop().flags.bits(), 0x40);
    }
}

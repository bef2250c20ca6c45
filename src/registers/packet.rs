//! Packet handling related registers
//!
//! This module contains registers for configuring the packet engine:
//! - Fixed, variable or unlimited length framing
//! - Payload length
//! - FIFO threshold and transmit start condition
//!
//! Packets exchanged by this driver carry no length byte and no CRC. The
//! transmitter sends a fixed-length packet whose last byte is a zero
//! sentinel, and the receiver runs in unlimited length mode and scans the
//! FIFO for that sentinel.

use core::convert::Infallible;

use regiface::{register, FromByteArray, ReadableRegister, ToByteArray, WritableRegister};

const VARIABLE_LENGTH: u8 = 1 << 7;
const DC_FREE_SHIFT: u8 = 5;
const CRC_ON: u8 = 1 << 4;
const CRC_AUTO_CLEAR_OFF: u8 = 1 << 3;
const ADDRESS_FILTERING_SHIFT: u8 = 1;

const PACKET_MODE: u8 = 1 << 6;
const PAYLOAD_LENGTH_MSB_MASK: u8 = 0b111;

/// RegSyncConfig: sync word generation and detection on. The low three
/// bits hold the sync word size minus one.
pub const SYNC_ON: u8 = 1 << 4;

const TX_START_FIFO_NOT_EMPTY: u8 = 1 << 7;
const FIFO_THRESHOLD_MASK: u8 = 0x3F;

/// Packet length format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PacketFormat {
    /// Length given by RegPayloadLength; a length of 0 selects unlimited mode
    Fixed,
    /// Length carried in the first payload byte
    Variable,
}

/// Packet configuration register 1 (address: 0x30)
///
/// # Important Notes
/// - Reset default is 0x90 (variable length, CRC on)
/// - This driver runs with fixed length framing, CRC and whitening off
#[register(0x30u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, ReadableRegister, WritableRegister)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PacketConfig1 {
    pub format: PacketFormat,
    /// DC-free encoding: 0 none, 1 Manchester, 2 whitening
    pub dc_free: u8,
    pub crc_on: bool,
    pub crc_auto_clear_off: bool,
    /// Address filtering: 0 none, 1 node, 2 node or broadcast
    pub address_filtering: u8,
}

impl PacketConfig1 {
    /// Fixed length framing with every packet engine feature off.
    pub fn fixed_length() -> Self {
        Self {
            format: PacketFormat::Fixed,
            dc_free: 0,
            crc_on: false,
            crc_auto_clear_off: false,
            address_filtering: 0,
        }
    }
}

/// Packet configuration register 2 (address: 0x31)
///
/// Holds the packet/continuous mode switch and the three MSBs of the
/// 11-bit payload length.
#[register(0x31u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, ReadableRegister, WritableRegister)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PacketConfig2 {
    pub packet_mode: bool,
    /// Payload length bits 10:8
    pub payload_length_msb: u8,
}

/// Payload length register (address: 0x32)
///
/// Low byte of the payload length. In fixed length format a total length
/// of zero selects unlimited length mode.
#[register(0x32u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, ReadableRegister, WritableRegister)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PayloadLength {
    pub lsb: u8,
}

/// Splits an 11-bit payload length into (RegPacketConfig2, RegPayloadLength).
pub fn payload_length(len: u16) -> (PacketConfig2, PayloadLength) {
    let [msb, lsb] = len.to_be_bytes();
    (
        PacketConfig2 {
            packet_mode: true,
            payload_length_msb: msb & PAYLOAD_LENGTH_MSB_MASK,
        },
        PayloadLength { lsb },
    )
}

/// Transmit start condition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TxStartCondition {
    /// Start once the FIFO holds more than the threshold
    FifoLevel,
    /// Start as soon as the FIFO is not empty
    FifoNotEmpty,
}

/// FIFO threshold register (address: 0x35)
///
/// Sets the FifoLevel interrupt threshold and the transmit start condition.
#[register(0x35u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, ReadableRegister, WritableRegister)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct FifoThresh {
    pub start: TxStartCondition,
    /// FifoLevel asserts when the FIFO holds more than this many bytes
    pub threshold: u8,
}

impl FromByteArray for PacketConfig1 {
    type Error = Infallible;
    type Array = [u8; 1];

    fn from_bytes(bytes: Self::Array) -> Result<Self, Self::Error> {
        let value = bytes[0];
        Ok(Self {
            format: if value & VARIABLE_LENGTH != 0 {
                PacketFormat::Variable
            } else {
                PacketFormat::Fixed
            },
            dc_free: (value >> DC_FREE_SHIFT) & 0b11,
            crc_on: value & CRC_ON != 0,
            crc_auto_clear_off: value & CRC_AUTO_CLEAR_OFF != 0,
            address_filtering: (value >> ADDRESS_FILTERING_SHIFT) & 0b11,
        })
    }
}

impl ToByteArray for PacketConfig1 {
    type Error = Infallible;
    type Array = [u8; 1];

    fn to_bytes(self) -> Result<Self::Array, Self::Error> {
        let mut value = (self.dc_free & 0b11) << DC_FREE_SHIFT
            | (self.address_filtering & 0b11) << ADDRESS_FILTERING_SHIFT;
        if self.format == PacketFormat::Variable {
            value |= VARIABLE_LENGTH;
        }
        if self.crc_on {
            value |= CRC_ON;
        }
        if self.crc_auto_clear_off {
            value |= CRC_AUTO_CLEAR_OFF;
        }
        Ok([value])
    }
}

impl FromByteArray for PacketConfig2 {
    type Error = Infallible;
    type Array = [u8; 1];

    fn from_bytes(bytes: Self::Array) -> Result<Self, Self::Error> {
        Ok(Self {
            packet_mode: bytes[0] & PACKET_MODE != 0,
            payload_length_msb: bytes[0] & PAYLOAD_LENGTH_MSB_MASK,
        })
    }
}

impl ToByteArray for PacketConfig2 {
    type Error = Infallible;
    type Array = [u8; 1];

    fn to_bytes(self) -> Result<Self::Array, Self::Error> {
        let mode = if self.packet_mode { PACKET_MODE } else { 0 };
        Ok([mode | (self.payload_length_msb & PAYLOAD_LENGTH_MSB_MASK)])
    }
}

impl FromByteArray for PayloadLength {
    type Error = Infallible;
    type Array = [u8; 1];

    fn from_bytes(bytes: Self::Array) -> Result<Self, Self::Error> {
        Ok(Self { lsb: bytes[0] })
    }
}

impl ToByteArray for PayloadLength {
    type Error = Infallible;
    type Array = [u8; 1];

    fn to_bytes(self) -> Result<Self::Array, Self::Error> {
        Ok([self.lsb])
    }
}

impl FromByteArray for FifoThresh {
    type Error = Infallible;
    type Array = [u8; 1];

    fn from_bytes(bytes: Self::Array) -> Result<Self, Self::Error> {
        Ok(Self {
            start: if bytes[0] & TX_START_FIFO_NOT_EMPTY != 0 {
                TxStartCondition::FifoNotEmpty
            } else {
                TxStartCondition::FifoLevel
            },
            threshold: bytes[0] & FIFO_THRESHOLD_MASK,
        })
    }
}

impl ToByteArray for FifoThresh {
    type Error = Infallible;
    type Array = [u8; 1];

    fn to_bytes(self) -> Result<Self::Array, Self::Error> {
        let start = match self.start {
            TxStartCondition::FifoLevel => 0,
            TxStartCondition::FifoNotEmpty => TX_START_FIFO_NOT_EMPTY,
        };
        Ok([start | (self.threshold & FIFO_THRESHOLD_MASK)])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payload_length_splits_eleven_bits() {
        let (config2, length) = payload_length(111);
        assert_eq!(config2.to_bytes(), Ok([0x40]));
        assert_eq!(length.lsb, 111);

        let (config2, length) = payload_length(0x3FF);
        assert_eq!(config2.payload_length_msb, 0x03);
        assert_eq!(length.lsb, 0xFF);
    }

    #[test]
    fn unlimited_length_framing_is_all_zero() {
        assert_eq!(PacketConfig1::fixed_length().to_bytes(), Ok([0x00]));
        assert_eq!(payload_length(0).1.to_bytes(), Ok([0x00]));
    }

    #[test]
    fn packet_config1_decodes_reset_default() {
        let config = PacketConfig1::from_bytes([0x90]);
        assert_eq!(
            config,
            Ok(PacketConfig1 {
                format: PacketFormat::Variable,
                dc_free: 0,
                crc_on: true,
                crc_auto_clear_off: false,
                address_filtering: 0,
            })
        );
    }

    #[test]
    fn fifo_thresh_encoding() {
        let thresh = FifoThresh {
            start: TxStartCondition::FifoLevel,
            threshold: 20,
        };
        assert_eq!(thresh.to_bytes(), Ok([0x14]));
        assert_eq!(
            FifoThresh::from_bytes([0x8F]),
            Ok(FifoThresh {
                start: TxStartCondition::FifoNotEmpty,
                threshold: 0x0F,
            })
        );
    }
}

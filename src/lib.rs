#![no_std]
//! RFM95W Radio Driver
//!
//! This crate drives the HopeRF RFM95W module (Semtech SX1276) in FSK/OOK
//! packet mode, to exchange short packets with a telemetry peer over a
//! 433/868/915 MHz link. LoRa modulation is not covered.
//!
//! # Features
//! - Bit-exact conversions between frequency, bit rate and channel
//!   bandwidth and their register encodings
//! - Operating mode transitions acknowledged by the chip
//! - FIFO streaming of packets terminated by a zero byte, with the
//!   sequencer starting and stopping the transmitter
//! - Latched error handling: the first bus failure makes every later call
//!   a no-op until the next mode change
//!
//! # Architecture
//! The driver is organized into several modules:
//!
//! - [`transport`]: Register access contract the driver is written against
//! - [`device`]: [`Transport`] over an `embedded-hal` SPI device and DIO pin
//!
//! - [`registers`]: Register definitions and unit conversions
//!   - [`registers::rf`]: Frequency, bit rate and PA DAC
//!   - [`registers::receiver`]: Channel filter and RSSI
//!   - [`registers::system`]: Operating mode, sequencer and version
//!   - [`registers::packet`]: Packet engine and FIFO threshold
//!   - [`registers::irq`]: Status flags
//!   - [`registers::configuration`]: The 0x01-0x42 register image
//!
//! - [`radio`]: The [`Radio`] facade with the mode state machine and the
//!   packet protocol
//! - [`profile`]: Board wiring and driver policy
//!
//! # Usage
//! 1. Wrap the SPI device and interrupt pin in a [`Device`]
//! 2. Open a [`Radio`] with the reset pin, a delay and a [`Config`]
//! 3. Check [`Radio::error`] for a hardware version mismatch
//! 4. Call [`Radio::init`] with the carrier frequency
//! 5. Exchange packets with [`Radio::send`], [`Radio::receive`] and
//!    [`Radio::send_and_receive`]
//!
//! # Important Notes
//! - Modulation can only change in Sleep mode
//! - Packets are at most [`MAX_PACKET_SIZE`] bytes and must not contain zero
//!   bytes, since a zero ends the packet on the receiving side
//! - Errors are latched: a failed call makes every later call fail without
//!   touching the bus, so checking once after a sequence of calls is enough
//!
//! # Example
//! ```ignore
//! use core::time::Duration;
//! use rfm95::{Config, Device, Radio};
//!
//! let device = Device::new(spi, dio, delay.clone());
//! let mut radio = Radio::open(device, reset, delay, Config::default());
//! radio.init(916_600_000)?;
//!
//! radio.send(&[0xA7, 0x12, 0x89, 0x86])?;
//! let reply = radio.receive(Duration::from_millis(100))?;
//! ```

pub mod device;
pub mod error;
pub mod profile;
pub mod radio;
pub mod registers;
pub mod transport;

pub use device::{Device, DeviceError};
pub use error::Error;
pub use profile::{Config, Profile};
pub use radio::{Packet, Radio, Reception, MAX_PACKET_SIZE};
pub use registers::*;
pub use transport::Transport;

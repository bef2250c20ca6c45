//! Register definitions for the RFM95W in FSK/OOK mode
//! Generated from the RFM95/96/97/98(W) V2.0 and SX1276/77/78/79 datasheets
//!
//! Registers 0x01 ([`OpMode`]) through 0x42 ([`Version`]) form one contiguous
//! block that can be read and written as a whole through [`Configuration`].
//! [`PaDac`] is the only register above 0x42 the driver uses and is always
//! addressed individually.

pub mod configuration;
pub mod irq;
pub mod packet;
pub mod receiver;
pub mod rf;
pub mod system;

pub use configuration::*;
pub use irq::*;
pub use packet::*;
pub use receiver::*;
pub use rf::*;
pub use system::*;

/// Crystal oscillator frequency in Hz.
pub const FXOSC: u32 = 32_000_000;

/// Address bit selecting a write access on the SPI bus.
pub const SPI_WRITE_MODE: u8 = 1 << 7;

/// FIFO read/write access
pub const REG_FIFO: u8 = 0x00;

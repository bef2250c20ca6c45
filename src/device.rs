//! RFM95 SPI Device Interface
//!
//! This module provides the [`Transport`] implementation for a radio wired
//! to an `embedded-hal` SPI bus, plus the GPIO the radio raises on packet
//! events.
//!
//! The wire protocol is the SX1276 single-access/burst format: the first
//! byte is the 7-bit register address, with bit 7 set for a write, followed
//! by the data bytes. The address auto-increments across a burst except at
//! RegFifo.
//!
//! # Example
//! ```ignore
//! use rfm95::{Device, Transport};
//!
//! // SPI device, interrupt input pin and delay from your HAL
//! let spi = // ...
//! let mut device = Device::new(spi, dio, delay);
//!
//! // Read the silicon revision
//! let version = device.read_register(0x42)?;
//! ```

use core::time::Duration;

use embedded_hal::{delay::DelayNs, digital::InputPin, spi::Operation, spi::SpiDevice};

use crate::registers::SPI_WRITE_MODE;
use crate::transport::Transport;

/// Interval between interrupt line samples while waiting.
const INTERRUPT_POLL_US: u32 = 100;

/// Error raised by [`Device`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DeviceError {
    /// SPI communication failed
    Bus,
    /// Reading the interrupt pin failed
    Pin,
}

/// SPI transport for the RFM95.
///
/// Wraps an SPI device, the DIO pin used as receive interrupt, and a delay
/// provider used to pace interrupt polling.
pub struct Device<SPI, IRQ, D> {
    spi: SPI,
    irq: IRQ,
    delay: D,
}

impl<SPI, IRQ, D> Device<SPI, IRQ, D> {
    /// Creates a new Device instance wrapping the provided SPI interface.
    ///
    /// # Arguments
    /// * `spi` - An SPI device with chip select handled by the bus
    /// * `irq` - The DIO input wired to the host
    /// * `delay` - Delay provider used while waiting on `irq`
    pub fn new(spi: SPI, irq: IRQ, delay: D) -> Self {
        Self { spi, irq, delay }
    }

    /// Releases the underlying SPI device, interrupt pin and delay.
    pub fn release(self) -> (SPI, IRQ, D) {
        (self.spi, self.irq, self.delay)
    }
}

impl<SPI, IRQ, D> Transport for Device<SPI, IRQ, D>
where
    SPI: SpiDevice,
    IRQ: InputPin,
    D: DelayNs,
{
    type Error = DeviceError;

    fn read_register(&mut self, addr: u8) -> Result<u8, Self::Error> {
        let mut value = [0u8];
        self.read_burst(addr, &mut value)?;
        Ok(value[0])
    }

    fn write_register(&mut self, addr: u8, value: u8) -> Result<(), Self::Error> {
        self.write_burst(addr, &[value])
    }

    /// # Errors
    /// * `DeviceError::Bus` - SPI communication failed
    fn read_burst(&mut self, addr: u8, buf: &mut [u8]) -> Result<(), Self::Error> {
        let header = [addr & !SPI_WRITE_MODE];

        self.spi
            .transaction(&mut [Operation::Write(&header), Operation::Read(buf)])
            .map_err(|_| DeviceError::Bus)
    }

    /// # Errors
    /// * `DeviceError::Bus` - SPI communication failed
    fn write_burst(&mut self, addr: u8, bytes: &[u8]) -> Result<(), Self::Error> {
        let header = [addr | SPI_WRITE_MODE];

        self.spi
            .transaction(&mut [Operation::Write(&header), Operation::Write(bytes)])
            .map_err(|_| DeviceError::Bus)
    }

    /// Samples the interrupt pin every 100 µs until it reads high or the
    /// timeout is used up.
    ///
    /// # Errors
    /// * `DeviceError::Pin` - Reading the pin failed
    fn await_interrupt(&mut self, timeout: Duration) -> Result<(), Self::Error> {
        let mut remaining = timeout.as_micros();
        loop {
            if self.irq.is_high().map_err(|_| DeviceError::Pin)? {
                return Ok(());
            }
            if remaining == 0 {
                #[cfg(feature = "defmt")]
                defmt::trace!("interrupt wait timed out after {}us", timeout.as_micros() as u64);
                return Ok(());
            }
            let step = remaining.min(u128::from(INTERRUPT_POLL_US));
            self.delay.delay_us(step as u32);
            remaining -= step;
        }
    }
}

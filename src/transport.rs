//! Hardware transport contract
//!
//! The radio only needs raw register access and a way to block on its
//! interrupt line. [`Device`](crate::Device) implements this over
//! `embedded-hal` SPI; tests and other platforms can provide their own.

use core::time::Duration;

/// Register-level access to the transceiver.
///
/// Addresses are 7 bits wide (0x00-0x7F). Bursts start at `addr` and
/// auto-increment, except at RegFifo (0x00) where every byte goes to or
/// comes from the FIFO.
pub trait Transport {
    type Error;

    /// Reads a single register.
    fn read_register(&mut self, addr: u8) -> Result<u8, Self::Error>;

    /// Writes a single register.
    fn write_register(&mut self, addr: u8, value: u8) -> Result<(), Self::Error>;

    /// Reads `buf.len()` consecutive registers starting at `addr`.
    fn read_burst(&mut self, addr: u8, buf: &mut [u8]) -> Result<(), Self::Error>;

    /// Writes `bytes` to consecutive registers starting at `addr`.
    fn write_burst(&mut self, addr: u8, bytes: &[u8]) -> Result<(), Self::Error>;

    /// Blocks until the interrupt line is asserted or `timeout` elapses.
    ///
    /// Expiry of the timeout is not an error.
    fn await_interrupt(&mut self, timeout: Duration) -> Result<(), Self::Error>;
}

impl<T: Transport + ?Sized> Transport for &mut T {
    type Error = T::Error;

    fn read_register(&mut self, addr: u8) -> Result<u8, Self::Error> {
        T::read_register(self, addr)
    }

    fn write_register(&mut self, addr: u8, value: u8) -> Result<(), Self::Error> {
        T::write_register(self, addr, value)
    }

    fn read_burst(&mut self, addr: u8, buf: &mut [u8]) -> Result<(), Self::Error> {
        T::read_burst(self, addr, buf)
    }

    fn write_burst(&mut self, addr: u8, bytes: &[u8]) -> Result<(), Self::Error> {
        T::write_burst(self, addr, bytes)
    }

    fn await_interrupt(&mut self, timeout: Duration) -> Result<(), Self::Error> {
        T::await_interrupt(self, timeout)
    }
}

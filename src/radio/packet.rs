//! Packet transport over the FIFO
//!
//! Packets carry no length byte and no CRC. Each transmitted packet is
//! followed by a single zero byte, and the receiver reads the FIFO until it
//! sees that zero. Transmission is driven by the sequencer: it leaves
//! Standby once the FIFO fills past the threshold and returns to Standby
//! when the FIFO drains.

use core::fmt;
use core::ops::Deref;
use core::time::Duration;

use embedded_hal::{delay::DelayNs, digital::OutputPin};

use super::Radio;
use crate::error::Error;
use crate::registers::{
    payload_length, FifoFlags, FifoThresh, IrqFlags2, Mode, PacketConfig1, SeqConfig1,
    TxStartCondition, REG_FIFO,
};
use crate::transport::Transport;

/// Largest payload accepted by [`Radio::send`] and returned by [`Radio::receive`].
pub const MAX_PACKET_SIZE: usize = 110;

/// Depth of the chip's FIFO in bytes.
pub const FIFO_SIZE: usize = 64;

/// FifoLevel threshold used while transmitting.
///
/// After the first full burst, each refill waits for the FIFO to drain to
/// this level and then writes `FIFO_SIZE - FIFO_THRESHOLD` bytes, so a
/// maximum-sized frame goes out as bursts of 64, 44 and 3 bytes.
pub const FIFO_THRESHOLD: usize = 20;

const SENTINEL: u8 = 0;

/// A received or outgoing payload of at most [`MAX_PACKET_SIZE`] bytes.
#[derive(Clone, Copy)]
pub struct Packet {
    len: usize,
    bytes: [u8; MAX_PACKET_SIZE],
}

impl Packet {
    /// Copies `data` into a packet, `None` if it is longer than [`MAX_PACKET_SIZE`].
    pub fn new(data: &[u8]) -> Option<Self> {
        if data.len() > MAX_PACKET_SIZE {
            return None;
        }
        let mut bytes = [0u8; MAX_PACKET_SIZE];
        bytes[..data.len()].copy_from_slice(data);
        Some(Self {
            len: data.len(),
            bytes,
        })
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.bytes[..self.len]
    }
}

impl Deref for Packet {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        self.as_slice()
    }
}

impl PartialEq for Packet {
    fn eq(&self, other: &Self) -> bool {
        self.as_slice() == other.as_slice()
    }
}

impl Eq for Packet {}

impl fmt::Debug for Packet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Packet").field(&self.as_slice()).finish()
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for Packet {
    fn format(&self, fmt: defmt::Formatter) {
        defmt::write!(fmt, "Packet({=[u8]:02X})", self.as_slice())
    }
}

/// Outcome of a receive window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Reception {
    /// The received payload, `None` if nothing complete arrived in time
    pub packet: Option<Packet>,
    /// RSSI sampled right after the interrupt wait, in dBm
    pub rssi: i16,
}

impl<T, RST, D> Radio<T, RST, D>
where
    T: Transport,
    RST: OutputPin,
    D: DelayNs,
{
    /// Transmits `data` and waits until it has left the antenna.
    ///
    /// The radio settles into [`Config::idle_mode`](crate::Config::idle_mode)
    /// afterwards, even when the transfer failed.
    ///
    /// # Panics
    /// If `data` is longer than [`MAX_PACKET_SIZE`]. Nothing is sent.
    pub fn send(&mut self, data: &[u8]) -> Result<(), Error> {
        assert!(
            data.len() <= MAX_PACKET_SIZE,
            "attempting to send {}-byte packet",
            data.len()
        );
        self.check()?;

        #[cfg(feature = "defmt")]
        defmt::debug!("sending {=usize}-byte packet", data.len());

        let mut frame = [SENTINEL; MAX_PACKET_SIZE + 1];
        frame[..data.len()].copy_from_slice(data);
        let frame = &frame[..data.len() + 1];

        let sent = self.transmit(frame);
        let settled = self.settle_after_transmit();
        self.restore_latch(sent.and(settled))
    }

    fn transmit(&mut self, frame: &[u8]) -> Result<(), Error> {
        self.set_mode(Mode::Standby)?;
        self.write(IrqFlags2::clear_overrun())?;

        // The sequencer leaves Standby once the FIFO holds more than the
        // threshold, so a short frame needs a lower one.
        let threshold = FIFO_THRESHOLD.min(frame.len() - 1);
        self.write(FifoThresh {
            start: TxStartCondition::FifoLevel,
            threshold: threshold as u8,
        })?;
        self.write(SeqConfig1::transmit_on_fifo_level())?;

        let (config2, length) = payload_length(frame.len() as u16);
        self.write(PacketConfig1::fixed_length())?;
        self.write(config2)?;
        self.write(length)?;

        let mut remaining = frame;
        let mut avail = FIFO_SIZE;
        loop {
            let (burst, rest) = remaining.split_at(avail.min(remaining.len()));
            #[cfg(feature = "defmt")]
            defmt::trace!("writing {=usize} bytes to TX FIFO", burst.len());
            self.write_burst(REG_FIFO, burst)?;
            remaining = rest;
            if remaining.is_empty() {
                break;
            }

            // Wait until at least FIFO_SIZE - FIFO_THRESHOLD bytes are free,
            // erring on the short side to avoid underflow.
            let drain_us = (FIFO_SIZE as u32 / 4).saturating_mul(self.config.byte_duration_us);
            self.delay.delay_us(drain_us);
            self.wait_for(0, |radio| {
                let status = radio.read::<IrqFlags2>()?;
                Ok(!status
                    .flags
                    .intersects(FifoFlags::FIFO_FULL | FifoFlags::FIFO_LEVEL))
            })?;
            avail = FIFO_SIZE - FIFO_THRESHOLD;
        }

        // The sequencer drops back to Standby once the FIFO has drained.
        let byte_us = self.config.byte_duration_us;
        self.wait_for(byte_us, |radio| {
            let mode = radio.mode()?;
            match mode {
                Some(Mode::Standby) => {
                    #[cfg(feature = "defmt")]
                    defmt::trace!("transmit completed");
                    Ok(true)
                }
                Some(Mode::Transmitter) => Ok(false),
                _ => {
                    #[cfg(feature = "defmt")]
                    defmt::warn!(
                        "waiting for TX to finish in {} state",
                        mode.map(Mode::name).unwrap_or("Unknown")
                    );
                    Ok(false)
                }
            }
        })
    }

    fn settle_after_transmit(&mut self) -> Result<(), Error> {
        self.set_mode(Mode::Standby)?;
        self.write(SeqConfig1::stop())?;
        self.set_mode(self.config.idle_mode)
    }

    /// Listens for one packet.
    ///
    /// Waits up to `timeout` for the receive interrupt, then drains the FIFO
    /// until the zero terminator arrives or the FIFO stays empty for the
    /// rest of the timeout. RSSI is sampled right after the interrupt wait
    /// whether or not a packet arrived.
    pub fn receive(&mut self, timeout: Duration) -> Result<Reception, Error> {
        self.check()?;
        let received = self.listen(timeout);
        let finished = self
            .set_mode(self.config.idle_mode)
            .and_then(|()| self.write(IrqFlags2::clear_overrun()));
        self.restore_latch(received.and_then(|reception| finished.map(|()| reception)))
    }

    fn listen(&mut self, timeout: Duration) -> Result<Reception, Error> {
        // Unlimited length packet format, see datasheet section 4.2.13.2.
        let (config2, length) = payload_length(0);
        self.write(PacketConfig1::fixed_length())?;
        self.write(length)?;
        self.write(config2)?;
        self.set_mode(Mode::Receiver)?;

        #[cfg(feature = "defmt")]
        defmt::trace!("waiting for interrupt");
        self.await_interrupt(timeout)?;
        let rssi = self.read_rssi()?;

        let byte_us = u128::from(self.config.byte_duration_us.max(1));
        let mut budget = timeout.as_micros();
        let mut buf = [0u8; MAX_PACKET_SIZE + 1];
        let mut len = 0;
        let mut overflow = false;
        loop {
            let status = self.read::<IrqFlags2>()?;
            if status.flags.contains(FifoFlags::FIFO_EMPTY) {
                if budget == 0 {
                    return Ok(Reception { packet: None, rssi });
                }
                self.delay.delay_us(self.config.byte_duration_us);
                budget = budget.saturating_sub(byte_us);
                continue;
            }

            let byte = self.read_register(REG_FIFO)?;
            if byte == SENTINEL {
                if overflow {
                    #[cfg(feature = "defmt")]
                    defmt::warn!("discarding packet longer than {=usize} bytes", MAX_PACKET_SIZE);
                    return Ok(Reception { packet: None, rssi });
                }
                let packet = strip_glitch(&buf[..len], rssi);
                #[cfg(feature = "defmt")]
                defmt::debug!(
                    "received {=usize}-byte packet",
                    packet.as_ref().map_or(0, |p| p.len())
                );
                return Ok(Reception { packet, rssi });
            }
            if len < buf.len() {
                buf[len] = byte;
                len += 1;
            } else {
                overflow = true;
            }
        }
    }

    /// Sends `data`, then listens for a reply.
    ///
    /// Nothing is received if the send failed; its error is returned instead.
    pub fn send_and_receive(&mut self, data: &[u8], timeout: Duration) -> Result<Reception, Error> {
        self.send(data)?;
        self.receive(timeout)
    }

    /// Latches `result`'s error again after a cleanup mode change cleared it.
    fn restore_latch<R>(&mut self, result: Result<R, Error>) -> Result<R, Error> {
        result.map_err(|err| self.latch(err))
    }
}

/// Builds the received packet, dropping a spurious final byte made of just
/// one or two high bits.
#[cfg_attr(not(feature = "defmt"), allow(unused_variables))]
fn strip_glitch(bytes: &[u8], rssi: i16) -> Option<Packet> {
    let bytes = match bytes.split_last() {
        None => return None,
        Some((&last @ (0x80 | 0xC0), rest)) => {
            #[cfg(feature = "defmt")]
            defmt::warn!("end-of-packet glitch {=u8:X} with RSSI {=i16}", last, rssi);
            rest
        }
        Some(_) => bytes,
    };
    if bytes.is_empty() {
        return None;
    }
    // At most MAX_PACKET_SIZE + 1 bytes arrive here; one more than the
    // bound is only accepted when it was a glitch.
    Packet::new(bytes)
}

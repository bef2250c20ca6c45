//! Radio facade
//!
//! [`Radio`] owns the transport, the reset line and a delay provider, and
//! layers the mode state machine and the packet protocol on top of typed
//! register access.
//!
//! # Error latching
//! Every register access goes through the typed `read`/`write` helpers (or
//! the raw helpers below them). The first transport failure is stored in a
//! single error slot; from then on every operation returns that error
//! without touching the hardware. The slot is cleared at the start of every
//! mode transition. A hardware version mismatch found by [`Radio::open`]
//! is kept in a separate slot that nothing clears.

mod mode;
mod packet;

pub use packet::{Packet, Reception, FIFO_SIZE, FIFO_THRESHOLD, MAX_PACKET_SIZE};

use core::time::Duration;

use embedded_hal::{delay::DelayNs, digital::OutputPin};
use regiface::{ByteArray, FromByteArray, ReadableRegister, ToByteArray, WritableRegister};

use crate::error::Error;
use crate::profile::{Config, Profile};
use crate::registers::{
    Bitrate, ChannelBandwidth, Configuration, Frequency, Mode, Modulation, OpMode, PaDac,
    RssiValue, SeqConfig1, Version, SYNC_ON,
};
use crate::transport::Transport;

/// Silicon revision reported by the RFM95W, as decoded by [`Version::revision`].
pub const HW_VERSION: u16 = 0x0102;

/// Bit rate used by [`Radio::init`], in bps.
pub const BITRATE: u32 = 16_384;

/// Channel filter bandwidth used by [`Radio::init`], in Hz.
pub const CHANNEL_BANDWIDTH: u32 = 100_000;

/// Reset pulse width required by the datasheet (section 7.2.2).
const RESET_PULSE_US: u32 = 100;

/// Time after releasing reset before the chip accepts commands.
const RESET_SETTLE_MS: u32 = 5;

/// An open RFM95 radio.
///
/// The radio is not safe for concurrent use; every operation takes
/// `&mut self` and blocks until the hardware has finished.
pub struct Radio<T, RST, D> {
    hw: T,
    reset: RST,
    delay: D,
    config: Config,
    err: Option<Error>,
    fatal: Option<Error>,
}

impl<T, RST, D> Radio<T, RST, D>
where
    T: Transport,
    RST: OutputPin,
    D: DelayNs,
{
    /// Opens the radio and verifies its silicon revision.
    ///
    /// The reset line must be wired so that driving it high releases NRESET
    /// (e.g. an open-drain output); the chip wants the pin floating except
    /// while being reset.
    ///
    /// A revision other than [`HW_VERSION`] leaves the radio permanently
    /// inert: every later call returns [`Error::HardwareVersion`]. Check
    /// [`Radio::error`] after opening.
    pub fn open(hw: T, reset: RST, delay: D, config: Config) -> Self {
        let mut radio = Self {
            hw,
            reset,
            delay,
            config,
            err: None,
            fatal: None,
        };
        match radio.version() {
            Ok(actual) if actual != HW_VERSION => {
                #[cfg(feature = "defmt")]
                defmt::error!(
                    "unexpected hardware version {=u16:04X} (should be {=u16:04X})",
                    actual,
                    HW_VERSION
                );
                radio.fatal = Some(Error::HardwareVersion {
                    actual,
                    expected: HW_VERSION,
                });
            }
            _ => {}
        }
        radio
    }

    /// Puts the radio to sleep and releases the hardware it owns.
    pub fn close(mut self) -> (T, RST, D) {
        if self.fatal.is_none() {
            // The hardware goes back to the caller either way.
            let _ = self.set_mode(Mode::Sleep);
        }
        (self.hw, self.reset, self.delay)
    }

    /// Resets the radio. See section 7.2.2 of the datasheet.
    ///
    /// Stops the sequencer and enters Sleep before pulsing NRESET low for
    /// 100 µs, then waits 5 ms for the chip to come back up.
    pub fn reset(&mut self) -> Result<(), Error> {
        self.check()?;
        self.write(SeqConfig1::stop())?;
        self.set_mode(Mode::Sleep)?;

        #[cfg(feature = "defmt")]
        defmt::debug!("pulsing reset line");
        if self.reset.set_low().is_err() {
            return Err(self.latch(Error::Pin));
        }
        self.delay.delay_us(RESET_PULSE_US);
        if self.reset.set_high().is_err() {
            return Err(self.latch(Error::Pin));
        }
        self.delay.delay_ms(RESET_SETTLE_MS);
        Ok(())
    }

    /// Resets the radio and configures it for OOK packets on `frequency` Hz.
    ///
    /// Leaves the radio in Sleep.
    pub fn init(&mut self, frequency: u32) -> Result<(), Error> {
        self.reset()?;
        self.init_rf(frequency)?;
        self.set_mode(Mode::Sleep)
    }

    fn init_rf(&mut self, frequency: u32) -> Result<(), Error> {
        let op_mode = OpMode::new(Modulation::Ook, Mode::Sleep);
        let config = Configuration {
            op_mode: op_mode.raw,
            // 2^(5+1) = 64 samples per RSSI reading.
            rssi_config: 5,
            // Long enough for the peer to lock on.
            preamble_msb: 0x00,
            preamble_lsb: 0x18,
            // Four sync bytes.
            sync_config: SYNC_ON | 3,
            sync_value_1: 0xFF,
            sync_value_2: 0x00,
            sync_value_3: 0xFF,
            sync_value_4: 0x00,
            ..Configuration::DEFAULT
        };

        // Modulation can only change while in Sleep.
        self.write(op_mode)?;
        self.write_configuration(&config)?;
        self.write(PaDac::Normal)?;

        self.set_frequency(frequency)?;
        self.set_bitrate(BITRATE)?;
        self.set_channel_bandwidth(CHANNEL_BANDWIDTH)
    }

    /// Reads registers 0x01 through 0x42 in one burst.
    pub fn read_configuration(&mut self) -> Result<Configuration, Error> {
        self.read()
    }

    /// Writes registers 0x01 through 0x42 in one burst.
    pub fn write_configuration(&mut self, config: &Configuration) -> Result<(), Error> {
        self.write(*config)
    }

    /// Carrier frequency in Hz.
    pub fn frequency(&mut self) -> Result<u32, Error> {
        Ok(self.read::<Frequency>()?.hz())
    }

    /// Sets the carrier frequency, rounded to the nearest 61 Hz step.
    pub fn set_frequency(&mut self, hz: u32) -> Result<(), Error> {
        self.write(Frequency::from_hz(hz))
    }

    /// Bit rate in bps.
    pub fn bitrate(&mut self) -> Result<u32, Error> {
        Ok(self.read::<Bitrate>()?.bps())
    }

    /// Sets the bit rate to the closest achievable value.
    pub fn set_bitrate(&mut self, bps: u32) -> Result<(), Error> {
        self.write(Bitrate::from_bps(bps))
    }

    /// Channel filter bandwidth in Hz.
    ///
    /// # Errors
    /// * `Error::UnknownBandwidth` - RegRxBw holds the reserved mantissa. This
    ///   is not latched.
    pub fn channel_bandwidth(&mut self) -> Result<u32, Error> {
        Ok(self.read::<ChannelBandwidth>()?.hz())
    }

    /// Sets the channel filter to the closest achievable bandwidth.
    pub fn set_channel_bandwidth(&mut self, hz: u32) -> Result<(), Error> {
        self.write(ChannelBandwidth::nearest(hz))
    }

    /// Current RSSI in dBm.
    pub fn read_rssi(&mut self) -> Result<i16, Error> {
        Ok(self.read::<RssiValue>()?.dbm())
    }

    /// Modulation selected in RegOpMode, `None` for the reserved encodings.
    pub fn modulation(&mut self) -> Result<Option<Modulation>, Error> {
        Ok(self.read::<OpMode>()?.modulation())
    }

    /// Silicon revision, e.g. 0x0102.
    pub fn version(&mut self) -> Result<u16, Error> {
        Ok(self.read::<Version>()?.revision())
    }

    /// The latched error, if any.
    pub fn error(&self) -> Option<Error> {
        self.fatal.or(self.err)
    }

    /// Module name from the board profile.
    pub fn name(&self) -> &'static str {
        self.config.profile.name
    }

    /// SPI device node from the board profile.
    pub fn device(&self) -> &'static str {
        self.config.profile.spi_device
    }

    pub fn profile(&self) -> &Profile {
        &self.config.profile
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    fn check(&self) -> Result<(), Error> {
        match self.error() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    /// Stores `err` in the error slot and hands it back for propagation.
    fn latch(&mut self, err: Error) -> Error {
        if self.fatal.is_none() {
            self.err = Some(err);
        }
        self.fatal.unwrap_or(err)
    }

    /// Reads a typed register.
    ///
    /// # Errors
    /// * The latched error, without any bus access
    /// * `Error::Bus` - Transport failed; latched
    /// * Any decoding error of `R`; not latched
    pub(crate) fn read<R>(&mut self) -> Result<R, Error>
    where
        R: ReadableRegister<IdType = u8>,
        Error: From<<R as FromByteArray>::Error>,
    {
        let mut raw_value = R::Array::new();
        if let [value] = raw_value.as_mut() {
            *value = self.read_register(R::id())?;
        } else {
            self.read_burst(R::id(), raw_value.as_mut())?;
        }
        Ok(R::from_bytes(raw_value)?)
    }

    /// Writes a typed register.
    ///
    /// # Errors
    /// * The latched error, without any bus access
    /// * `Error::Bus` - Transport failed; latched
    pub(crate) fn write<R>(&mut self, register: R) -> Result<(), Error>
    where
        R: WritableRegister<IdType = u8>,
        Error: From<<R as ToByteArray>::Error>,
    {
        let raw_value = register.to_bytes()?;
        match raw_value.as_ref() {
            [value] => self.write_register(R::id(), *value),
            bytes => self.write_burst(R::id(), bytes),
        }
    }

    fn read_register(&mut self, addr: u8) -> Result<u8, Error> {
        self.check()?;
        self.hw
            .read_register(addr)
            .map_err(|_| self.latch(Error::Bus))
    }

    fn write_register(&mut self, addr: u8, value: u8) -> Result<(), Error> {
        self.check()?;
        self.hw
            .write_register(addr, value)
            .map_err(|_| self.latch(Error::Bus))
    }

    fn read_burst(&mut self, addr: u8, buf: &mut [u8]) -> Result<(), Error> {
        self.check()?;
        self.hw
            .read_burst(addr, buf)
            .map_err(|_| self.latch(Error::Bus))
    }

    fn write_burst(&mut self, addr: u8, bytes: &[u8]) -> Result<(), Error> {
        self.check()?;
        self.hw
            .write_burst(addr, bytes)
            .map_err(|_| self.latch(Error::Bus))
    }

    fn await_interrupt(&mut self, timeout: Duration) -> Result<(), Error> {
        self.check()?;
        self.hw
            .await_interrupt(timeout)
            .map_err(|_| self.latch(Error::Bus))
    }

    /// Polls `ready` until it reports true, sleeping `pause_us` between polls.
    ///
    /// Unbounded unless [`Config::poll_limit`] is set; a failing register
    /// access inside `ready` ends the wait with that error.
    fn wait_for<F>(&mut self, pause_us: u32, mut ready: F) -> Result<(), Error>
    where
        F: FnMut(&mut Self) -> Result<bool, Error>,
    {
        let mut attempts: u32 = 0;
        loop {
            if ready(self)? {
                return Ok(());
            }
            attempts = attempts.saturating_add(1);
            if self.config.poll_limit.is_some_and(|limit| attempts >= limit) {
                #[cfg(feature = "defmt")]
                defmt::warn!("gave up waiting for hardware after {} polls", attempts);
                return Err(self.latch(Error::Timeout));
            }
            if pause_us > 0 {
                self.delay.delay_us(pause_us);
            }
        }
    }
}

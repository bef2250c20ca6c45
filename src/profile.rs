//! Board wiring and driver policy
//!
//! Everything that differs between boards is carried in a [`Profile`]
//! value handed to [`Radio::open`](crate::Radio::open) through [`Config`],
//! rather than being compiled in.

use crate::registers::Mode;

/// Hardware wiring of one board.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Profile {
    /// Board or module name
    pub name: &'static str,
    /// SPI device node the radio is attached to
    pub spi_device: &'static str,
    /// SPI clock in Hz
    pub spi_speed_hz: u32,
    /// GPIO carrying the receive interrupt
    pub interrupt_pin: u8,
    /// GPIO wired to the radio's NRESET
    pub reset_pin: u8,
}

impl Profile {
    /// Adafruit RFM95W bonnet on a 32-bit Raspberry Pi Zero W.
    pub const RPI_BONNET: Self = Self {
        name: "RFM95W",
        spi_device: "/dev/spidev0.1",
        spi_speed_hz: 6_000_000,
        interrupt_pin: 22,
        reset_pin: 25,
    };

    /// Adafruit RFM95W bonnet on a 64-bit Raspberry Pi, interrupt on DIO2.
    pub const RPI_BONNET_DIO2: Self = Self {
        interrupt_pin: 24,
        ..Self::RPI_BONNET
    };
}

impl Default for Profile {
    fn default() -> Self {
        Self::RPI_BONNET
    }
}

/// Driver configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Config {
    pub profile: Profile,
    /// Mode the radio settles in after every send and receive
    pub idle_mode: Mode,
    /// Approximate on-air time of one byte at the configured bit rate, in µs
    pub byte_duration_us: u32,
    /// Upper bound on hardware status polls per wait.
    ///
    /// `None` waits as long as the hardware keeps answering, which is how
    /// the chip is specified to behave. Setting a limit turns a radio that
    /// never reports readiness into [`Error::Timeout`](crate::Error::Timeout).
    pub poll_limit: Option<u32>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            profile: Profile::default(),
            idle_mode: Mode::Sleep,
            byte_duration_us: 1000,
            poll_limit: None,
        }
    }
}

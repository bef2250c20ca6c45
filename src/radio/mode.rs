//! Operating mode control
//!
//! Mode changes are read-modify-write on RegOpMode followed by polling until
//! the chip reports the new mode in both the mode field and the ModeReady
//! flag. There is no retry beyond that poll.

use embedded_hal::{delay::DelayNs, digital::OutputPin};

use super::Radio;
use crate::error::Error;
use crate::registers::{IrqFlags1, Mode, ModeFlags, OpMode};
use crate::transport::Transport;

impl<T, RST, D> Radio<T, RST, D>
where
    T: Transport,
    RST: OutputPin,
    D: DelayNs,
{
    /// Switches the radio to `mode` and waits until the chip reports it ready.
    ///
    /// Clears any latched transport error first. If the radio is already in
    /// `mode`, nothing is written.
    pub fn set_mode(&mut self, mode: Mode) -> Result<(), Error> {
        self.err = None;
        let current = self.read::<OpMode>()?;
        if current.mode_bits() == mode as u8 {
            return Ok(());
        }

        #[cfg(feature = "defmt")]
        defmt::trace!(
            "change from {} to {}",
            current.mode().map(Mode::name).unwrap_or("Unknown"),
            mode.name()
        );
        self.write(current.with_mode(mode))?;

        self.wait_for(0, |radio| {
            let op_mode = radio.read::<OpMode>()?;
            if op_mode.mode_bits() != mode as u8 {
                #[cfg(feature = "defmt")]
                defmt::trace!("  {=u8}", op_mode.mode_bits());
                return Ok(false);
            }
            let status = radio.read::<IrqFlags1>()?;
            Ok(status.flags.contains(ModeFlags::MODE_READY))
        })
    }

    /// Current operating mode, `None` if the mode field holds 6 or 7.
    pub fn mode(&mut self) -> Result<Option<Mode>, Error> {
        Ok(self.read::<OpMode>()?.mode())
    }

    /// Name of the current operating mode.
    pub fn state(&mut self) -> Result<&'static str, Error> {
        Ok(self.mode()?.map(Mode::name).unwrap_or("Unknown"))
    }

    /// Puts the radio into Sleep mode.
    pub fn sleep(&mut self) -> Result<(), Error> {
        self.set_mode(Mode::Sleep)
    }

    /// Puts the radio into Standby mode.
    pub fn standby(&mut self) -> Result<(), Error> {
        self.set_mode(Mode::Standby)
    }
}

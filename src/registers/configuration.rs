//! Configuration image
//!
//! Registers 0x01 (RegOpMode) through 0x42 (RegVersion) are contiguous and
//! can be transferred in a single burst. [`Configuration`] names every byte
//! of that block in address order; encoding and decoding walk the same
//! field list, so the byte layout never depends on the struct layout.
//!
//! RegFifo (0x00) is deliberately left out: a burst touching it would push
//! or pop FIFO data.

use core::convert::Infallible;

use regiface::{register, FromByteArray, ReadableRegister, ToByteArray, WritableRegister};

macro_rules! configuration {
    ($($(#[$doc:meta])* $field:ident,)+) => {
        /// Configuration image (address: 0x01-0x42)
        ///
        /// One field per register, in address order.
        ///
        /// # Important Notes
        /// - Status registers (RSSI value, IRQ flags, version) are part of the
        ///   block; writing them back is harmless but has no effect
        /// - Auxiliary registers above 0x42 are not included
        #[register(0x01u8)]
        #[derive(Debug, Clone, Copy, PartialEq, Eq, ReadableRegister, WritableRegister)]
        #[cfg_attr(feature = "defmt", derive(defmt::Format))]
        pub struct Configuration {
            $($(#[$doc])* pub $field: u8,)+
        }

        impl Configuration {
            /// Number of registers in the image.
            pub const LEN: usize = [$(stringify!($field)),+].len();

            /// Builds an image from register bytes in address order.
            pub const fn from_image(bytes: [u8; CONFIGURATION_LEN]) -> Self {
                let mut index = 0;
                $(
                    let $field = bytes[index];
                    index += 1;
                )+
                let _ = index;
                Self { $($field,)+ }
            }

            /// Register bytes in address order.
            pub const fn to_image(&self) -> [u8; CONFIGURATION_LEN] {
                let mut bytes = [0u8; CONFIGURATION_LEN];
                let mut index = 0;
                $(
                    bytes[index] = self.$field;
                    index += 1;
                )+
                let _ = index;
                bytes
            }
        }
    };
}

/// Number of registers from RegOpMode through RegVersion.
pub const CONFIGURATION_LEN: usize = 0x42 - 0x01 + 1;

configuration! {
    /// Operating mode and modulation
    op_mode,
    /// Bit rate divider, MSB
    bitrate_msb,
    /// Bit rate divider, LSB
    bitrate_lsb,
    /// Frequency deviation, MSB
    fdev_msb,
    /// Frequency deviation, LSB
    fdev_lsb,
    /// Carrier frequency, MSB
    frf_msb,
    /// Carrier frequency, middle byte
    frf_mid,
    /// Carrier frequency, LSB
    frf_lsb,
    /// PA selection and output power
    pa_config,
    /// PA ramp time, low phase noise PLL
    pa_ramp,
    /// Over current protection
    ocp,
    /// LNA settings
    lna,
    /// AFC, AGC and receiver trigger
    rx_config,
    /// RSSI offset and smoothing
    rssi_config,
    /// RSSI collision detector
    rssi_collision,
    /// RSSI threshold
    rssi_thresh,
    /// RSSI value, read-only
    rssi_value,
    /// Channel filter bandwidth
    rx_bw,
    /// AFC channel filter bandwidth
    afc_bw,
    /// OOK demodulator peak mode
    ook_peak,
    /// OOK fixed threshold
    ook_fix,
    /// OOK average threshold
    ook_avg,
    reserved_17,
    reserved_18,
    reserved_19,
    /// AFC and FEI control
    afc_fei,
    afc_msb,
    afc_lsb,
    fei_msb,
    fei_lsb,
    /// Preamble detector
    preamble_detect,
    rx_timeout_1,
    rx_timeout_2,
    rx_timeout_3,
    rx_delay,
    /// RC oscillator and CLKOUT
    osc,
    /// Preamble length, MSB
    preamble_msb,
    /// Preamble length, LSB
    preamble_lsb,
    /// Sync word recognition
    sync_config,
    sync_value_1,
    sync_value_2,
    sync_value_3,
    sync_value_4,
    sync_value_5,
    sync_value_6,
    sync_value_7,
    sync_value_8,
    /// Packet format, DC-free, CRC, address filtering
    packet_config_1,
    /// Data mode and payload length MSBs
    packet_config_2,
    /// Payload length LSB
    payload_length,
    node_adrs,
    broadcast_adrs,
    /// FIFO threshold and TX start condition
    fifo_thresh,
    seq_config_1,
    seq_config_2,
    timer_resol,
    timer_1_coef,
    timer_2_coef,
    /// Image calibration
    image_cal,
    /// Temperature, read-only
    temp,
    low_bat,
    /// Mode status flags
    irq_flags_1,
    /// FIFO status flags
    irq_flags_2,
    /// DIO0 to DIO3 mapping
    dio_mapping_1,
    /// DIO4, DIO5 mapping and CLKOUT
    dio_mapping_2,
    /// Silicon revision, read-only
    version,
}

const _: () = assert!(Configuration::LEN == CONFIGURATION_LEN);

impl Configuration {
    /// Register values after a power-on reset (datasheet section 6).
    pub const RESET: Self = Self::from_image([
        0x01, 0x1A, 0x0B, 0x00, 0x52, 0x6C, 0x80, 0x00, // 0x01
        0x4F, 0x09, 0x2B, 0x20, 0x0E, 0x02, 0x0A, 0xFF, // 0x09
        0x00, 0x15, 0x0B, 0x28, 0x0C, 0x12, 0x47, 0x32, // 0x11
        0x3E, 0x00, 0x00, 0x00, 0x00, 0x00, 0x40, 0x00, // 0x19
        0x00, 0x00, 0x00, 0x07, 0x00, 0x03, 0x93, 0x55, // 0x21
        0x55, 0x55, 0x55, 0x55, 0x55, 0x55, 0x55, 0x90, // 0x29
        0x40, 0x40, 0x00, 0x00, 0x0F, 0x00, 0x00, 0x00, // 0x31
        0xF5, 0x20, 0x82, 0x00, 0x02, 0x80, 0x40, 0x00, // 0x39
        0x00, 0x12, // 0x41
    ]);

    /// Recommended FSK defaults (datasheet section 6), where they differ
    /// from the reset values.
    pub const DEFAULT: Self = Self {
        rx_config: 0x08,
        osc: 0x05,
        sync_value_1: 0x01,
        sync_value_2: 0x01,
        sync_value_3: 0x01,
        sync_value_4: 0x01,
        sync_value_5: 0x01,
        sync_value_6: 0x01,
        sync_value_7: 0x01,
        sync_value_8: 0x01,
        fifo_thresh: 0x1F,
        timer_1_coef: 0x12,
        image_cal: 0x02,
        ..Self::RESET
    };
}

impl Default for Configuration {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl FromByteArray for Configuration {
    type Error = Infallible;
    type Array = [u8; CONFIGURATION_LEN];

    fn from_bytes(bytes: Self::Array) -> Result<Self, Self::Error> {
        Ok(Self::from_image(bytes))
    }
}

impl ToByteArray for Configuration {
    type Error = Infallible;
    type Array = [u8; CONFIGURATION_LEN];

    fn to_bytes(self) -> Result<Self::Array, Self::Error> {
        Ok(self.to_image())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn image_spans_op_mode_through_version() {
        assert_eq!(CONFIGURATION_LEN, 66);
        let image = Configuration::RESET.to_image();
        assert_eq!(image.len(), 66);
        assert_eq!(image[0], 0x01);
        assert_eq!(image[0x12 - 0x01], 0x15);
        assert_eq!(image[0x42 - 0x01], 0x12);
    }

    #[test]
    fn fields_follow_address_order() {
        let mut bytes = [0u8; CONFIGURATION_LEN];
        for (i, b) in bytes.iter_mut().enumerate() {
            *b = i as u8 + 1;
        }
        let config = Configuration::from_image(bytes);
        assert_eq!(config.op_mode, 0x01);
        assert_eq!(config.frf_msb, 0x06);
        assert_eq!(config.rssi_value, 0x11);
        assert_eq!(config.sync_config, 0x27);
        assert_eq!(config.fifo_thresh, 0x35);
        assert_eq!(config.irq_flags_2, 0x3F);
        assert_eq!(config.version, 0x42);
        assert_eq!(config.to_image(), bytes);
    }

    #[test]
    fn defaults_differ_from_reset_only_where_documented() {
        let reset = Configuration::RESET.to_image();
        let default = Configuration::DEFAULT.to_image();
        let changed = reset.iter().zip(default.iter()).filter(|(r, d)| r != d).count();
        assert_eq!(changed, 13);
        assert_eq!(Configuration::default().fifo_thresh, 0x1F);
    }
}

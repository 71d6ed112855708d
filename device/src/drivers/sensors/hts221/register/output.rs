use super::{read_burst, Register};
use crate::traits::i2c::I2cAddress;
use embedded_hal_async::i2c::I2c;

/// Raw ADC codes from H_OUT (0x28..=0x29) and T_OUT (0x2A..=0x2B).
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Output {
    pub humidity: i16,
    pub temperature: i16,
}

impl Output {
    /// Reads all four output bytes in one burst. Reading both channels releases the DRDY line.
    pub async fn read<I: I2c>(address: I2cAddress, i2c: &mut I) -> Result<Output, I::Error> {
        let mut buf = [0; 4];
        read_burst(address, i2c, Register::HumidityOutL, &mut buf).await?;
        Ok(buf.into())
    }
}

impl From<[u8; 4]> for Output {
    fn from(buf: [u8; 4]) -> Self {
        Self {
            humidity: i16::from_le_bytes([buf[0], buf[1]]),
            temperature: i16::from_le_bytes([buf[2], buf[3]]),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn little_endian_signed() {
        let out = Output::from([0x34, 0x12, 0x56, 0xFF]);
        assert_eq!(0x1234, out.humidity);
        assert_eq!(-170, out.temperature);
    }
}

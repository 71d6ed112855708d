use super::{read_burst, Register};
use crate::traits::i2c::I2cAddress;
use embedded_hal_async::i2c::I2c;

pub const CALIBRATION_LEN: usize = 16;

/// The factory calibration block at 0x30..=0x3F.
pub struct CalibrationBlock;

impl CalibrationBlock {
    pub async fn read<I: I2c>(
        address: I2cAddress,
        i2c: &mut I,
    ) -> Result<[u8; CALIBRATION_LEN], I::Error> {
        let mut buf = [0; CALIBRATION_LEN];
        read_burst(address, i2c, Register::Calibration, &mut buf).await?;
        Ok(buf)
    }
}

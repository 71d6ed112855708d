use super::{read_register, Register};
use crate::traits::i2c::I2cAddress;
use embedded_hal_async::i2c::I2c;

/// Fixed content of the identity register.
pub const DEVICE_ID: u8 = 0xBC;

pub struct WhoAmI;

impl WhoAmI {
    pub async fn read<I: I2c>(address: I2cAddress, i2c: &mut I) -> Result<u8, I::Error> {
        read_register(address, i2c, Register::WhoAmI).await
    }
}

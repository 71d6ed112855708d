use super::{read_register, Register, H_DA, T_DA};
use crate::traits::i2c::I2cAddress;
use embedded_hal_async::i2c::I2c;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Status {
    temperature_available: bool,
    humidity_available: bool,
}

impl Status {
    pub async fn read<I: I2c>(address: I2cAddress, i2c: &mut I) -> Result<Status, I::Error> {
        Ok(read_register(address, i2c, Register::Status).await?.into())
    }

    pub fn temperature_available(&self) -> bool {
        self.temperature_available
    }

    pub fn humidity_available(&self) -> bool {
        self.humidity_available
    }

    pub fn any_available(&self) -> bool {
        self.temperature_available || self.humidity_available
    }
}

impl From<u8> for Status {
    fn from(bits: u8) -> Status {
        Status {
            temperature_available: T_DA.is_set(bits),
            humidity_available: H_DA.is_set(bits),
        }
    }
}

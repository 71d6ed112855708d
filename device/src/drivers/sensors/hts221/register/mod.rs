//! Register map and bus access for the HTS221.
//!
//! Every named register is an 8-bit location addressed over I2C. Multi-byte reads set
//! [`AUTO_INCREMENT`] on the sub-address so the device walks consecutive registers.
//! Bit fields are described by the [`Field`] table and updated read-modify-write so that
//! unrelated and reserved bits survive.

pub mod av_conf;
pub mod calibration;
pub mod ctrl1;
pub mod ctrl2;
pub mod ctrl3;
pub mod output;
pub mod status;
pub mod who_am_i;

use crate::traits::i2c::I2cAddress;
use embedded_hal_async::i2c::I2c;

/// Sub-address bit requesting auto-increment on multi-byte transfers.
pub const AUTO_INCREMENT: u8 = 0b1000_0000;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum Register {
    WhoAmI = 0x0F,
    AvConf = 0x10,
    CtrlReg1 = 0x20,
    CtrlReg2 = 0x21,
    CtrlReg3 = 0x22,
    Status = 0x27,
    HumidityOutL = 0x28,
    HumidityOutH = 0x29,
    TempOutL = 0x2A,
    TempOutH = 0x2B,
    Calibration = 0x30,
}

impl Register {
    pub const fn addr(self) -> u8 {
        self as u8
    }

    /// Sub-address for a multi-byte read starting at this register.
    pub const fn burst(self) -> u8 {
        self.addr() | AUTO_INCREMENT
    }
}

/// A contiguous bit field inside a register.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Field {
    pub register: Register,
    pub offset: u8,
    pub width: u8,
}

impl Field {
    pub const fn new(register: Register, offset: u8, width: u8) -> Self {
        Self {
            register,
            offset,
            width,
        }
    }

    pub const fn mask(&self) -> u8 {
        (((1u16 << self.width) - 1) as u8) << self.offset
    }

    /// Extract the field from a register value.
    pub const fn get(&self, bits: u8) -> u8 {
        (bits & self.mask()) >> self.offset
    }

    /// Replace the field in `bits` with `value`, leaving every other bit untouched.
    pub const fn set(&self, bits: u8, value: u8) -> u8 {
        (bits & !self.mask()) | ((value << self.offset) & self.mask())
    }

    pub const fn is_set(&self, bits: u8) -> bool {
        bits & self.mask() != 0
    }

    pub const fn with(&self, bits: u8, on: bool) -> u8 {
        self.set(bits, on as u8)
    }
}

/// Temperature averaging, AV_CONF[5:3].
pub const AVGT: Field = Field::new(Register::AvConf, 3, 3);
/// Humidity averaging, AV_CONF[2:0].
pub const AVGH: Field = Field::new(Register::AvConf, 0, 3);
/// Power-down control, CTRL_REG1[7]. Set means active.
pub const PD: Field = Field::new(Register::CtrlReg1, 7, 1);
/// Block data update, CTRL_REG1[2].
pub const BDU: Field = Field::new(Register::CtrlReg1, 2, 1);
/// Output data rate, CTRL_REG1[1:0].
pub const ODR: Field = Field::new(Register::CtrlReg1, 0, 2);
/// Reboot memory content, CTRL_REG2[7].
pub const BOOT: Field = Field::new(Register::CtrlReg2, 7, 1);
/// Heater, CTRL_REG2[1].
pub const HEATER: Field = Field::new(Register::CtrlReg2, 1, 1);
/// One-shot conversion start, CTRL_REG2[0]. Self-clearing.
pub const ONE_SHOT: Field = Field::new(Register::CtrlReg2, 0, 1);
/// Data-ready output level, CTRL_REG3[7]. Set means active low.
pub const DRDY_H_L: Field = Field::new(Register::CtrlReg3, 7, 1);
/// Data-ready output stage, CTRL_REG3[6]. Set means open drain.
pub const PP_OD: Field = Field::new(Register::CtrlReg3, 6, 1);
/// Data-ready enable, CTRL_REG3[2].
pub const DRDY_EN: Field = Field::new(Register::CtrlReg3, 2, 1);
/// Humidity data available, STATUS_REG[1].
pub const H_DA: Field = Field::new(Register::Status, 1, 1);
/// Temperature data available, STATUS_REG[0].
pub const T_DA: Field = Field::new(Register::Status, 0, 1);

pub async fn read_register<I: I2c>(
    address: I2cAddress,
    i2c: &mut I,
    register: Register,
) -> Result<u8, I::Error> {
    let mut buf = [0; 1];
    i2c.write_read(address.into(), &[register.addr()], &mut buf)
        .await?;
    Ok(buf[0])
}

pub async fn write_register<I: I2c>(
    address: I2cAddress,
    i2c: &mut I,
    register: Register,
    value: u8,
) -> Result<(), I::Error> {
    i2c.write(address.into(), &[register.addr(), value]).await
}

/// Fill `buf` from consecutive registers starting at `start`, low address first.
pub async fn read_burst<I: I2c>(
    address: I2cAddress,
    i2c: &mut I,
    start: Register,
    buf: &mut [u8],
) -> Result<(), I::Error> {
    i2c.write_read(address.into(), &[start.burst()], buf).await
}

/// Read-modify-write a single field. A failed read aborts before anything is written.
pub async fn modify_field<I: I2c>(
    address: I2cAddress,
    i2c: &mut I,
    field: Field,
    value: u8,
) -> Result<u8, I::Error> {
    let bits = read_register(address, i2c, field.register).await?;
    let bits = field.set(bits, value);
    write_register(address, i2c, field.register, bits).await?;
    Ok(bits)
}

/// A writable register with a typed view over its raw bits.
///
/// The typed value keeps every bit it was read with, so `modify` only changes what the
/// closure touches.
pub trait ControlRegister: Copy + From<u8> + Into<u8> {
    const REGISTER: Register;

    async fn read<I: I2c>(address: I2cAddress, i2c: &mut I) -> Result<Self, I::Error> {
        Ok(read_register(address, i2c, Self::REGISTER).await?.into())
    }

    async fn write<I: I2c>(address: I2cAddress, i2c: &mut I, reg: Self) -> Result<(), I::Error> {
        write_register(address, i2c, Self::REGISTER, reg.into()).await
    }

    async fn modify<I: I2c, F: FnOnce(&mut Self)>(
        address: I2cAddress,
        i2c: &mut I,
        modify: F,
    ) -> Result<Self, I::Error> {
        let mut reg = Self::read(address, i2c).await?;
        modify(&mut reg);
        Self::write(address, i2c, reg).await?;
        Ok(reg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn masks_match_register_layout() {
        assert_eq!(0b0011_1000, AVGT.mask());
        assert_eq!(0b0000_0111, AVGH.mask());
        assert_eq!(0b0000_0011, ODR.mask());
        assert_eq!(0b0000_0100, BDU.mask());
        assert_eq!(0b1000_0000, PD.mask());
        assert_eq!(0b0000_0010, HEATER.mask());
        assert_eq!(0b0000_0001, ONE_SHOT.mask());
        assert_eq!(0b1000_0000, DRDY_H_L.mask());
        assert_eq!(0b0000_0100, DRDY_EN.mask());
        assert_eq!(0b0000_0010, H_DA.mask());
        assert_eq!(0b0000_0001, T_DA.mask());
    }

    #[test]
    fn set_preserves_unrelated_bits() {
        assert_eq!(0b1111_1110, ODR.set(0b1111_1111, 0b10));
        assert_eq!(0b1101_0111, AVGT.set(0b1110_1111, 0b010));
        assert_eq!(0b0111_1011, BDU.with(0b0111_1111, false));
        assert_eq!(0b1000_0101, PD.with(0b0000_0101, true));
    }

    #[test]
    fn set_ignores_overflowing_values() {
        assert_eq!(0b0000_0011, ODR.set(0, 0xFF));
    }

    #[test]
    fn get_extracts_field() {
        assert_eq!(0b101, AVGT.get(0b0010_1011));
        assert_eq!(0b011, AVGH.get(0b0010_1011));
        assert!(H_DA.is_set(0b10));
        assert!(!T_DA.is_set(0b10));
    }

    #[test]
    fn burst_sets_auto_increment() {
        assert_eq!(0xA8, Register::HumidityOutL.burst());
        assert_eq!(0xB0, Register::Calibration.burst());
    }
}

use super::{ControlRegister, Register, BDU, ODR, PD};

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Power {
    PowerDown,
    Active,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BlockDataUpdate {
    /// Output registers update continuously.
    Continuous,
    /// Output registers are not updated until both MSB and LSB have been read.
    MsbLsbReading,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum OutputDataRate {
    OneShot,
    Hz1,
    Hz7,
    Hz12p5,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Ctrl1(u8);

impl Ctrl1 {
    pub fn power(&self) -> Power {
        if PD.is_set(self.0) {
            Power::Active
        } else {
            Power::PowerDown
        }
    }

    pub fn block_data_update(&self) -> BlockDataUpdate {
        if BDU.is_set(self.0) {
            BlockDataUpdate::MsbLsbReading
        } else {
            BlockDataUpdate::Continuous
        }
    }

    pub fn output_data_rate(&self) -> OutputDataRate {
        ODR.get(self.0).into()
    }

    pub fn power_down(&mut self) -> &mut Self {
        self.0 = PD.with(self.0, false);
        self
    }

    pub fn power_active(&mut self) -> &mut Self {
        self.0 = PD.with(self.0, true);
        self
    }

    pub fn set_output_data_rate(&mut self, odr: OutputDataRate) -> &mut Self {
        self.0 = ODR.set(self.0, odr.into());
        self
    }

    pub fn set_block_data_update(&mut self, bdu: BlockDataUpdate) -> &mut Self {
        self.0 = BDU.with(self.0, bdu == BlockDataUpdate::MsbLsbReading);
        self
    }
}

impl ControlRegister for Ctrl1 {
    const REGISTER: Register = Register::CtrlReg1;
}

impl From<u8> for OutputDataRate {
    fn from(v: u8) -> Self {
        match v & 0b11 {
            0b01 => OutputDataRate::Hz1,
            0b10 => OutputDataRate::Hz7,
            0b11 => OutputDataRate::Hz12p5,
            _ => OutputDataRate::OneShot,
        }
    }
}

impl From<OutputDataRate> for u8 {
    fn from(odr: OutputDataRate) -> Self {
        match odr {
            OutputDataRate::OneShot => 0b00,
            OutputDataRate::Hz1 => 0b01,
            OutputDataRate::Hz7 => 0b10,
            OutputDataRate::Hz12p5 => 0b11,
        }
    }
}

impl From<u8> for Ctrl1 {
    fn from(bits: u8) -> Self {
        Self(bits)
    }
}

impl From<Ctrl1> for u8 {
    fn from(reg: Ctrl1) -> u8 {
        reg.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_fields() {
        let reg = Ctrl1::from(0b1000_0110);
        assert_eq!(Power::Active, reg.power());
        assert_eq!(BlockDataUpdate::MsbLsbReading, reg.block_data_update());
        assert_eq!(OutputDataRate::Hz7, reg.output_data_rate());
    }

    #[test]
    fn setters_keep_reserved_bits() {
        let mut reg = Ctrl1::from(0b0111_1000);
        reg.power_active()
            .set_output_data_rate(OutputDataRate::Hz12p5)
            .set_block_data_update(BlockDataUpdate::Continuous);
        assert_eq!(0b1111_1011, u8::from(reg));

        reg.power_down();
        assert_eq!(0b0111_1011, u8::from(reg));
    }
}

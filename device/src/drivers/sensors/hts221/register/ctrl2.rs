use super::{ControlRegister, Register, BOOT, HEATER, ONE_SHOT};

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Ctrl2(u8);

impl Ctrl2 {
    pub fn heater(&self) -> bool {
        HEATER.is_set(self.0)
    }

    pub fn one_shot(&self) -> bool {
        ONE_SHOT.is_set(self.0)
    }

    pub fn set_heater(&mut self, enable: bool) -> &mut Self {
        self.0 = HEATER.with(self.0, enable);
        self
    }

    pub fn start_one_shot(&mut self) -> &mut Self {
        self.0 = ONE_SHOT.with(self.0, true);
        self
    }

    /// The same register with the self-clearing bits (boot, one-shot) cleared.
    pub fn settled(&self) -> Self {
        Self(BOOT.with(ONE_SHOT.with(self.0, false), false))
    }
}

impl ControlRegister for Ctrl2 {
    const REGISTER: Register = Register::CtrlReg2;
}

impl From<u8> for Ctrl2 {
    fn from(bits: u8) -> Self {
        Self(bits)
    }
}

impl From<Ctrl2> for u8 {
    fn from(reg: Ctrl2) -> u8 {
        reg.0
    }
}

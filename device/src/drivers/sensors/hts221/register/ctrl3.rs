use super::{ControlRegister, Register, DRDY_EN, DRDY_H_L, PP_OD};

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ReadyMode {
    PushPull,
    OpenDrain,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ActiveState {
    High,
    Low,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Ctrl3(u8);

impl Ctrl3 {
    pub fn active_state(&self) -> ActiveState {
        if DRDY_H_L.is_set(self.0) {
            ActiveState::Low
        } else {
            ActiveState::High
        }
    }

    pub fn ready_mode(&self) -> ReadyMode {
        if PP_OD.is_set(self.0) {
            ReadyMode::OpenDrain
        } else {
            ReadyMode::PushPull
        }
    }

    pub fn enabled(&self) -> bool {
        DRDY_EN.is_set(self.0)
    }

    pub fn set_active_state(&mut self, active_state: ActiveState) -> &mut Self {
        self.0 = DRDY_H_L.with(self.0, active_state == ActiveState::Low);
        self
    }

    pub fn set_ready_mode(&mut self, ready_mode: ReadyMode) -> &mut Self {
        self.0 = PP_OD.with(self.0, ready_mode == ReadyMode::OpenDrain);
        self
    }

    pub fn enable(&mut self, enable: bool) -> &mut Self {
        self.0 = DRDY_EN.with(self.0, enable);
        self
    }
}

impl ControlRegister for Ctrl3 {
    const REGISTER: Register = Register::CtrlReg3;
}

impl From<u8> for Ctrl3 {
    fn from(bits: u8) -> Self {
        Self(bits)
    }
}

impl From<Ctrl3> for u8 {
    fn from(reg: Ctrl3) -> u8 {
        reg.0
    }
}

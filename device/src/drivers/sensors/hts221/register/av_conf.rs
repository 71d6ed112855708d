use super::{ControlRegister, Register, AVGH, AVGT};

/// Internal averaging depth, shared ordinal for both channels.
///
/// | ordinal | temperature samples | humidity samples |
/// |---------|---------------------|------------------|
/// | 0       | 2                   | 4                |
/// | 1       | 4                   | 8                |
/// | ...     | ...                 | ...              |
/// | 7       | 256                 | 512              |
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Averaging {
    Avg0,
    Avg1,
    Avg2,
    Avg3,
    Avg4,
    Avg5,
    Avg6,
    Avg7,
}

impl Averaging {
    pub const fn ordinal(self) -> u8 {
        self as u8
    }

    pub const fn temperature_samples(self) -> u16 {
        2 << self.ordinal()
    }

    pub const fn humidity_samples(self) -> u16 {
        4 << self.ordinal()
    }
}

impl From<u8> for Averaging {
    fn from(v: u8) -> Self {
        match v & 0b111 {
            0 => Averaging::Avg0,
            1 => Averaging::Avg1,
            2 => Averaging::Avg2,
            3 => Averaging::Avg3,
            4 => Averaging::Avg4,
            5 => Averaging::Avg5,
            6 => Averaging::Avg6,
            _ => Averaging::Avg7,
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct AvConf(u8);

impl AvConf {
    pub fn temperature(&self) -> Averaging {
        AVGT.get(self.0).into()
    }

    pub fn humidity(&self) -> Averaging {
        AVGH.get(self.0).into()
    }

    pub fn set_temperature(&mut self, avg: Averaging) -> &mut Self {
        self.0 = AVGT.set(self.0, avg.ordinal());
        self
    }

    pub fn set_humidity(&mut self, avg: Averaging) -> &mut Self {
        self.0 = AVGH.set(self.0, avg.ordinal());
        self
    }
}

impl ControlRegister for AvConf {
    const REGISTER: Register = Register::AvConf;
}

impl From<u8> for AvConf {
    fn from(bits: u8) -> Self {
        Self(bits)
    }
}

impl From<AvConf> for u8 {
    fn from(reg: AvConf) -> u8 {
        reg.0
    }
}

pub mod calibration;
mod config;
pub mod register;

pub use config::Config;

use crate::domain::Reading;
use crate::traits::i2c::I2cAddress;
use calibration::{Calibration, InvalidCalibration};
use embedded_hal_async::i2c::I2c;
use register::av_conf::{AvConf, Averaging};
use register::calibration::CalibrationBlock;
use register::ctrl1::{BlockDataUpdate, Ctrl1, OutputDataRate, Power};
use register::ctrl2::Ctrl2;
use register::ctrl3::{ActiveState, Ctrl3, ReadyMode};
use register::output::Output;
use register::status::Status;
use register::who_am_i::{WhoAmI, DEVICE_ID};
use register::{read_register, ControlRegister, Register};

pub const ADDR: u8 = 0x5F;

#[derive(Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Hts221Error<E> {
    I2c(E),
    /// The calibration block cannot produce a conversion model.
    InvalidCalibration(InvalidCalibration),
    /// No valid calibration is loaded; the session must be initialized again.
    NotCalibrated,
    /// The identity register did not hold the HTS221 device id.
    UnknownDevice(u8),
}

impl<E> Hts221Error<E> {
    pub fn as_str(&self) -> &'static str {
        match self {
            Hts221Error::I2c(_) => "bus transaction failed",
            Hts221Error::InvalidCalibration(InvalidCalibration::Temperature) => {
                "invalid temperature calibration"
            }
            Hts221Error::InvalidCalibration(InvalidCalibration::Humidity) => {
                "invalid humidity calibration"
            }
            Hts221Error::NotCalibrated => "not calibrated",
            Hts221Error::UnknownDevice(_) => "unknown device",
        }
    }
}

impl<E> From<E> for Hts221Error<E> {
    fn from(e: E) -> Hts221Error<E> {
        Hts221Error::I2c(e)
    }
}

/// What the driver knows about the device between calls.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SessionState {
    pub power: Power,
    pub block_data_update: BlockDataUpdate,
    pub data_ready: bool,
    pub data_ready_active: ActiveState,
    /// A one-shot conversion was started and its output has not been read yet.
    pub conversion_pending: bool,
}

impl Default for SessionState {
    fn default() -> Self {
        Self {
            power: Power::PowerDown,
            block_data_update: BlockDataUpdate::Continuous,
            data_ready: false,
            data_ready_active: ActiveState::High,
            conversion_pending: false,
        }
    }
}

/// Raw content of the configuration and status registers.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RegisterDump {
    pub av_conf: u8,
    pub ctrl_reg1: u8,
    pub ctrl_reg2: u8,
    pub ctrl_reg3: u8,
    pub status: u8,
}

pub struct Hts221 {
    address: I2cAddress,
    calibration: Option<Calibration>,
    session: SessionState,
    /// Last known CTRL_REG2 with the self-clearing bits dropped.
    ctrl2: Option<Ctrl2>,
}

impl Default for Hts221 {
    fn default() -> Self {
        Self::new()
    }
}

impl Hts221 {
    pub fn new() -> Self {
        Self::with_address(ADDR)
    }

    pub fn with_address(address: u8) -> Self {
        Self {
            address: I2cAddress::new(address),
            calibration: None,
            session: SessionState::default(),
            ctrl2: None,
        }
    }

    pub fn address(&self) -> I2cAddress {
        self.address
    }

    pub fn calibration(&self) -> Option<&Calibration> {
        self.calibration.as_ref()
    }

    pub fn session(&self) -> SessionState {
        self.session
    }

    /// Verify the device, apply `config`, load the calibration and power the sensor on.
    ///
    /// Any previous calibration is dropped first, so a failure leaves the session unable to
    /// produce readings until `initialize` succeeds.
    pub async fn initialize<I: I2c>(
        &mut self,
        i2c: &mut I,
        config: &Config,
    ) -> Result<(), Hts221Error<I::Error>> {
        let addr = u8::from(self.address);
        self.calibration = None;
        self.ctrl2 = None;

        let id = self.who_am_i(i2c).await?;
        if id != DEVICE_ID {
            error!("HTS221 (I2C@{:x}) unexpected device id {:x}", addr, id);
            return Err(Hts221Error::UnknownDevice(id));
        }

        self.set_averaging(i2c, config.temperature_averaging, config.humidity_averaging)
            .await?;
        self.set_output_data_rate(i2c, config.output_data_rate)
            .await?;
        self.set_block_data_update(i2c, config.block_data_update)
            .await?;
        self.configure_data_ready(i2c, config.data_ready_active, config.data_ready_mode)
            .await?;
        self.enable_data_ready(i2c, config.data_ready).await?;
        self.set_heater(i2c, config.heater).await?;

        self.read_calibration(i2c).await?;
        info!("HTS221 (I2C@{:x}) conversion coefficients read correctly", addr);

        self.enable(i2c).await?;

        let dump = self.dump_registers(i2c).await?;
        debug!(
            "HTS221 (I2C@{:x}) av_conf = {:x}, ctrl_reg1 = {:x}, ctrl_reg2 = {:x}, ctrl_reg3 = {:x}, status = {:x}",
            addr,
            dump.av_conf,
            dump.ctrl_reg1,
            dump.ctrl_reg2,
            dump.ctrl_reg3,
            dump.status
        );
        Ok(())
    }

    pub async fn who_am_i<I: I2c>(&mut self, i2c: &mut I) -> Result<u8, Hts221Error<I::Error>> {
        Ok(WhoAmI::read(self.address, i2c).await?)
    }

    /// Averaging depth as `(temperature, humidity)`.
    pub async fn averaging<I: I2c>(
        &mut self,
        i2c: &mut I,
    ) -> Result<(Averaging, Averaging), Hts221Error<I::Error>> {
        let reg = AvConf::read(self.address, i2c).await?;
        Ok((reg.temperature(), reg.humidity()))
    }

    pub async fn set_averaging<I: I2c>(
        &mut self,
        i2c: &mut I,
        temperature: Averaging,
        humidity: Averaging,
    ) -> Result<(), Hts221Error<I::Error>> {
        AvConf::modify(self.address, i2c, |reg| {
            reg.set_temperature(temperature).set_humidity(humidity);
        })
        .await?;
        Ok(())
    }

    pub async fn output_data_rate<I: I2c>(
        &mut self,
        i2c: &mut I,
    ) -> Result<OutputDataRate, Hts221Error<I::Error>> {
        Ok(Ctrl1::read(self.address, i2c).await?.output_data_rate())
    }

    pub async fn set_output_data_rate<I: I2c>(
        &mut self,
        i2c: &mut I,
        odr: OutputDataRate,
    ) -> Result<(), Hts221Error<I::Error>> {
        Ctrl1::modify(self.address, i2c, |reg| {
            reg.set_output_data_rate(odr);
        })
        .await?;
        Ok(())
    }

    pub async fn block_data_update<I: I2c>(
        &mut self,
        i2c: &mut I,
    ) -> Result<BlockDataUpdate, Hts221Error<I::Error>> {
        Ok(Ctrl1::read(self.address, i2c).await?.block_data_update())
    }

    pub async fn set_block_data_update<I: I2c>(
        &mut self,
        i2c: &mut I,
        bdu: BlockDataUpdate,
    ) -> Result<(), Hts221Error<I::Error>> {
        Ctrl1::modify(self.address, i2c, |reg| {
            reg.set_block_data_update(bdu);
        })
        .await?;
        self.session.block_data_update = bdu;
        Ok(())
    }

    pub async fn enable<I: I2c>(&mut self, i2c: &mut I) -> Result<(), Hts221Error<I::Error>> {
        Ctrl1::modify(self.address, i2c, |reg| {
            reg.power_active();
        })
        .await?;
        self.session.power = Power::Active;
        Ok(())
    }

    /// Power the sensor down. Any conversion in flight is forgotten.
    pub async fn disable<I: I2c>(&mut self, i2c: &mut I) -> Result<(), Hts221Error<I::Error>> {
        Ctrl1::modify(self.address, i2c, |reg| {
            reg.power_down();
        })
        .await?;
        self.session.power = Power::PowerDown;
        self.session.conversion_pending = false;
        Ok(())
    }

    pub async fn is_enabled<I: I2c>(&mut self, i2c: &mut I) -> Result<bool, Hts221Error<I::Error>> {
        Ok(Ctrl1::read(self.address, i2c).await?.power() == Power::Active)
    }

    pub async fn heater<I: I2c>(&mut self, i2c: &mut I) -> Result<bool, Hts221Error<I::Error>> {
        let reg = Ctrl2::read(self.address, i2c).await?;
        self.ctrl2.replace(reg.settled());
        Ok(reg.heater())
    }

    pub async fn set_heater<I: I2c>(
        &mut self,
        i2c: &mut I,
        enable: bool,
    ) -> Result<(), Hts221Error<I::Error>> {
        let reg = Ctrl2::modify(self.address, i2c, |reg| {
            reg.set_heater(enable);
        })
        .await?;
        self.ctrl2.replace(reg.settled());
        Ok(())
    }

    /// Start a single conversion.
    ///
    /// Once CTRL_REG2 is known (after `initialize`, `heater` or `set_heater`) this is a single
    /// register write; otherwise the register is read first.
    pub async fn trigger_one_shot<I: I2c>(
        &mut self,
        i2c: &mut I,
    ) -> Result<(), Hts221Error<I::Error>> {
        let mut reg = match self.ctrl2 {
            Some(reg) => reg,
            None => Ctrl2::read(self.address, i2c).await?.settled(),
        };
        self.ctrl2.replace(reg);
        reg.start_one_shot();
        Ctrl2::write(self.address, i2c, reg).await?;
        self.session.conversion_pending = true;
        Ok(())
    }

    pub async fn configure_data_ready<I: I2c>(
        &mut self,
        i2c: &mut I,
        active: ActiveState,
        mode: ReadyMode,
    ) -> Result<(), Hts221Error<I::Error>> {
        Ctrl3::modify(self.address, i2c, |reg| {
            reg.set_active_state(active).set_ready_mode(mode);
        })
        .await?;
        self.session.data_ready_active = active;
        Ok(())
    }

    pub async fn enable_data_ready<I: I2c>(
        &mut self,
        i2c: &mut I,
        enable: bool,
    ) -> Result<(), Hts221Error<I::Error>> {
        Ctrl3::modify(self.address, i2c, |reg| {
            reg.enable(enable);
        })
        .await?;
        self.session.data_ready = enable;
        Ok(())
    }

    pub async fn data_ready_config<I: I2c>(
        &mut self,
        i2c: &mut I,
    ) -> Result<Ctrl3, Hts221Error<I::Error>> {
        Ok(Ctrl3::read(self.address, i2c).await?)
    }

    pub async fn status<I: I2c>(&mut self, i2c: &mut I) -> Result<Status, Hts221Error<I::Error>> {
        Ok(Status::read(self.address, i2c).await?)
    }

    pub async fn dump_registers<I: I2c>(
        &mut self,
        i2c: &mut I,
    ) -> Result<RegisterDump, Hts221Error<I::Error>> {
        Ok(RegisterDump {
            av_conf: read_register(self.address, i2c, Register::AvConf).await?,
            ctrl_reg1: read_register(self.address, i2c, Register::CtrlReg1).await?,
            ctrl_reg2: read_register(self.address, i2c, Register::CtrlReg2).await?,
            ctrl_reg3: read_register(self.address, i2c, Register::CtrlReg3).await?,
            status: read_register(self.address, i2c, Register::Status).await?,
        })
    }

    /// Read the calibration block and rebuild the conversion models.
    pub async fn read_calibration<I: I2c>(
        &mut self,
        i2c: &mut I,
    ) -> Result<&Calibration, Hts221Error<I::Error>> {
        self.calibration = None;
        let block = CalibrationBlock::read(self.address, i2c).await?;
        match Calibration::compute(&block) {
            Ok(calibration) => Ok(&*self.calibration.insert(calibration)),
            Err(e) => {
                error!(
                    "HTS221 (I2C@{:x}) calibration rejected: {:?}",
                    u8::from(self.address),
                    e
                );
                Err(Hts221Error::InvalidCalibration(e))
            }
        }
    }

    /// Burst-read both output channels.
    pub async fn read_raw<I: I2c>(&mut self, i2c: &mut I) -> Result<Output, Hts221Error<I::Error>> {
        let output = Output::read(self.address, i2c).await?;
        self.session.conversion_pending = false;
        Ok(output)
    }

    /// Read and convert both channels. Refused without touching the bus when uncalibrated.
    pub async fn read<I: I2c>(&mut self, i2c: &mut I) -> Result<Reading, Hts221Error<I::Error>> {
        let calibration = self.calibration.ok_or(Hts221Error::NotCalibrated)?;
        let output = self.read_raw(i2c).await?;
        Ok(Reading {
            temperature: calibration.temperature(output.temperature),
            relative_humidity: calibration.humidity(output.humidity),
        })
    }
}

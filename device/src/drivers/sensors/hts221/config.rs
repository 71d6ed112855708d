use super::register::av_conf::Averaging;
use super::register::ctrl1::{BlockDataUpdate, OutputDataRate};
use super::register::ctrl3::{ActiveState, ReadyMode};

/// Sensor configuration applied by [`Hts221::initialize`](super::Hts221::initialize).
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Config {
    pub temperature_averaging: Averaging,
    pub humidity_averaging: Averaging,
    pub output_data_rate: OutputDataRate,
    pub block_data_update: BlockDataUpdate,
    /// Route data-ready to the DRDY pin.
    pub data_ready: bool,
    pub data_ready_active: ActiveState,
    pub data_ready_mode: ReadyMode,
    pub heater: bool,
}

impl Default for Config {
    /// One-shot conversions with 8 temperature / 16 humidity samples averaged, locked output
    /// registers and an active-high push-pull DRDY line.
    fn default() -> Self {
        Self {
            temperature_averaging: Averaging::Avg2,
            humidity_averaging: Averaging::Avg2,
            output_data_rate: OutputDataRate::OneShot,
            block_data_update: BlockDataUpdate::MsbLsbReading,
            data_ready: true,
            data_ready_active: ActiveState::High,
            data_ready_mode: ReadyMode::PushPull,
            heater: false,
        }
    }
}

pub mod button;
pub mod i2c;
pub mod led;

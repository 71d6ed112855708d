pub mod button;
pub mod led;
pub mod sensors;

pub trait ActiveLevel {
    /// Whether the asserted state of the line is the high level.
    const ACTIVE_HIGH: bool;
}

/// Discriminator for inputs/outputs that are active on high state.
pub struct ActiveHigh;
impl ActiveLevel for ActiveHigh {
    const ACTIVE_HIGH: bool = true;
}

/// Discriminator for inputs/outputs that are active on low state.
pub struct ActiveLow;
impl ActiveLevel for ActiveLow {
    const ACTIVE_HIGH: bool = false;
}

#[macro_use]
mod macros;

mod cost;
mod energy;
mod percent;
mod power;
mod rate;

pub use self::{cost::Cost, energy::WattHours, percent::Percent, power::Watts, rate::RatePerWh};

/// Marker for quantities that have a natural zero, so accumulation code can
/// be generic over `Cost`, `WattHours`, etc.
pub trait Zero {
    const ZERO: Self;
}

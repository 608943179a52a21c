mod appliance;
mod battery;
mod inverter;

pub use self::{
    appliance::{Appliance, ApplianceParameters, UNSCHEDULED_START_HOUR},
    battery::{Battery, BatteryParameters},
    inverter::{HourTrace, Inverter, InverterParameters},
};

/// Distinguishes a stationary home battery from an electric-vehicle battery.
///
/// Per `SPEC_FULL.md` §9, this replaces runtime type introspection: the only
/// thing that changes behaviour between the two kinds is whether an
/// end-of-horizon state-of-charge target applies and whether discharge is
/// permitted by default.
#[derive(Copy, Clone, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
pub enum DeviceKind {
    Stationary,
    Ev,
}

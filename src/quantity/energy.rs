use std::ops::Mul;

use super::{Percent, RatePerWh, Zero, cost::Cost, power::Watts};

quantity!(WattHours, "Wh");

impl Zero for WattHours {
    const ZERO: Self = Self::ZERO;
}

impl WattHours {
    /// Energy delivered per hour at a constant power.
    #[must_use]
    pub fn per_hour(power: Watts) -> Self {
        Self(power.0)
    }
}

impl Mul<Percent> for WattHours {
    type Output = Self;

    fn mul(self, rhs: Percent) -> Self::Output {
        self * rhs.as_fraction()
    }
}

impl Mul<RatePerWh> for WattHours {
    type Output = Cost;

    fn mul(self, rhs: RatePerWh) -> Self::Output {
        Cost(self.0 * rhs.0)
    }
}

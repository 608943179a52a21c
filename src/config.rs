use serde::{Deserialize, Serialize};

use crate::{
    device::{ApplianceParameters, BatteryParameters, InverterParameters},
    error::Result,
    fitness::PenaltyWeights,
    forecast::ForecastSet,
    ga::GaConfig,
};

/// The full set of parameters one `optimize` call needs: device models, the
/// forecast horizon, and the genetic optimizer's tuning knobs.
///
/// Grounded on `ZilverZtream-OEC-Open_Energy_Controller/src/config.rs`'s
/// nested `AppConfig` (validate-after-deserialize, one flat top-level
/// struct bundling sub-configs) and on `fennec-cli/src/cli.rs`'s flattened
/// args-grouping style for which fields live together.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct OptimizationParameters {
    pub battery: BatteryParameters,
    pub inverter: InverterParameters,
    #[serde(default)]
    pub appliances: Vec<ApplianceParameters>,
    pub forecast: ForecastSet,
    #[serde(default)]
    pub ga: GaConfig,
    #[serde(default)]
    pub penalty_weights: PenaltyWeightsConfig,
}

/// Serde-friendly mirror of [`PenaltyWeights`]; the quantity newtype itself
/// deserializes from a bare number, kept here so the on-disk shape reads as
/// plain floats rather than `{"0": 1000.0}`. `appliance_not_scheduled` and
/// `clip_violation` are $/Wh rates, `soc_target_per_pct` is a dimensionless
/// coefficient, and `break_even_violation` is a dimensionless multiplier on
/// the break-even shortfall — see `src/fitness.rs` for the formulas each
/// feeds into.
#[derive(Clone, Copy, Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct PenaltyWeightsConfig {
    pub appliance_not_scheduled: f64,
    pub soc_target_per_pct: f64,
    pub break_even_violation: f64,
    pub clip_violation: f64,
}

impl Default for PenaltyWeightsConfig {
    fn default() -> Self {
        let defaults = PenaltyWeights::default();
        Self {
            appliance_not_scheduled: defaults.appliance_not_scheduled.0,
            soc_target_per_pct: defaults.soc_target_per_pct.0,
            break_even_violation: defaults.break_even_violation.0,
            clip_violation: defaults.clip_violation.0,
        }
    }
}

impl From<PenaltyWeightsConfig> for PenaltyWeights {
    fn from(config: PenaltyWeightsConfig) -> Self {
        Self {
            appliance_not_scheduled: crate::quantity::Cost(config.appliance_not_scheduled),
            soc_target_per_pct: crate::quantity::Cost(config.soc_target_per_pct),
            break_even_violation: crate::quantity::Cost(config.break_even_violation),
            clip_violation: crate::quantity::Cost(config.clip_violation),
        }
    }
}

impl OptimizationParameters {
    /// Validates every sub-config, raising the first violation found.
    ///
    /// Grounded on the `figment`+`validator` "nested validation" pattern
    /// from the same teacher reference, simplified to hand-rolled checks
    /// since this crate doesn't carry a validation derive macro.
    pub fn validate(&self) -> Result<()> {
        self.battery
            .validate()
            .map_err(crate::error::PlannerError::InvalidInput)?;
        self.inverter
            .validate()
            .map_err(crate::error::PlannerError::InvalidInput)?;
        self.forecast.validate()?;

        let horizon = self.forecast.len() as u32;
        for appliance in &self.appliances {
            appliance
                .validate(horizon)
                .map_err(crate::error::PlannerError::InvalidInput)?;
        }

        self.ga.validate()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{device::DeviceKind, quantity::{Percent, RatePerWh, WattHours}};

    fn sample() -> OptimizationParameters {
        OptimizationParameters {
            battery: BatteryParameters {
                device_id: "battery-1".to_owned(),
                capacity_wh: WattHours(10_000.0),
                soc_min_pct: Percent(10.0),
                soc_max_pct: Percent(90.0),
                soc_initial_pct: Percent(50.0),
                charge_efficiency: 0.95,
                discharge_efficiency: 0.95,
                max_charge_power_w: WattHours(3_000.0),
                max_discharge_power_w: WattHours(3_000.0),
                allowed_charge_rates: vec![0.0, 0.5, 1.0],
                kind: DeviceKind::Stationary,
                soc_target_pct: None,
                allow_discharge: true,
            },
            inverter: InverterParameters {
                max_ac_power_w: WattHours(3_000.0),
                max_ac_charge_power_w: WattHours(3_000.0),
                ac_to_dc_efficiency: 0.95,
                dc_to_ac_efficiency: 0.95,
            },
            appliances: Vec::new(),
            forecast: ForecastSet {
                pv_wh: vec![WattHours(1_000.0); 24],
                load_wh: vec![WattHours(500.0); 24],
                price_buy_per_wh: vec![RatePerWh(0.0003); 24],
                price_sell_per_wh: vec![RatePerWh(0.0001); 24],
            },
            ga: GaConfig::default(),
            penalty_weights: PenaltyWeightsConfig::default(),
        }
    }

    #[test]
    fn valid_parameters_pass() {
        assert!(sample().validate().is_ok());
    }

    #[test]
    fn mismatched_forecast_lengths_fail() {
        let mut params = sample();
        params.forecast.load_wh.pop();
        assert!(params.validate().is_err());
    }
}

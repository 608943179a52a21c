use crate::{
    device::{ApplianceParameters, BatteryParameters, InverterParameters, UNSCHEDULED_START_HOUR},
    forecast::ForecastSet,
    quantity::{Cost, Percent, RatePerWh, WattHours},
    simulator::{Plan, Simulator},
};

/// Interpolates the fraction of a feed-in surplus a household would have
/// self-consumed anyway, absent the battery. `SPEC_FULL.md` §4.3/§9 leaves
/// this pluggable; the default is the identity interpolator below.
///
/// Grounded on `fennec-cli/src/core/solution/losses.rs`'s additive penalty
/// accumulation style, generalised with a trait seam so a future
/// data-driven curve can replace [`NoopInterpolator`] without touching the
/// hard energy balance in [`crate::device::inverter::Inverter::process`].
pub trait Interpolator {
    fn self_consumption_fraction(&self, surplus_wh: WattHours) -> f64;
}

/// The shipped default: no self-consumption credit is assumed for surplus
/// PV, i.e. every unit of curtailed or exported surplus is treated as fully
/// attributable to the battery's scheduling decision.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopInterpolator;

impl Interpolator for NoopInterpolator {
    fn self_consumption_fraction(&self, _surplus_wh: WattHours) -> f64 {
        0.0
    }
}

/// Configurable penalty weights, applied on top of the monetary cost.
///
/// Grounded on `fennec-cli/src/core/solution/losses.rs`'s `Losses` struct,
/// generalised to the four penalty terms `SPEC_FULL.md` §4.3 names. Despite
/// the shared `Cost` type, these are not all flat dollar amounts: each
/// weight is the multiplicative factor its own penalty formula names, see
/// the methods below for the unit each one actually carries.
#[derive(Clone, Copy, Debug)]
pub struct PenaltyWeights {
    /// Cost per Wh of consumption left unscheduled (§4.3: penalty is
    /// "proportional to its `consumption_wh`", not a flat per-appliance cost).
    pub appliance_not_scheduled: Cost,
    /// Dimensionless `k` in `k * shortfall_pct * capacity_wh * max(price_buy)`.
    pub soc_target_per_pct: Cost,
    /// Dimensionless multiplier on the break-even formula's own
    /// `e_in_wh * (price_buy[h] - R * p*)` dollar value.
    pub break_even_violation: Cost,
    /// Cost per Wh of charge/discharge energy the battery refused.
    pub clip_violation: Cost,
}

impl Default for PenaltyWeights {
    fn default() -> Self {
        Self {
            appliance_not_scheduled: Cost(0.5),
            soc_target_per_pct: Cost(10.0),
            break_even_violation: Cost(1.0),
            clip_violation: Cost(0.5),
        }
    }
}

/// The four named penalty terms plus the monetary term, kept separate so
/// callers and tests can inspect why a chromosome scored the way it did.
#[derive(Clone, Copy, Debug, Default, serde::Serialize, serde::Deserialize)]
pub struct FitnessBreakdown {
    pub monetary_cost: Cost,
    pub appliance_penalty: Cost,
    pub soc_target_penalty: Cost,
    pub break_even_penalty: Cost,
    pub clip_penalty: Cost,
}

impl FitnessBreakdown {
    /// The scalar loss the genetic optimizer minimises: lower is better.
    #[must_use]
    pub fn total(&self) -> Cost {
        self.monetary_cost
            + self.appliance_penalty
            + self.soc_target_penalty
            + self.break_even_penalty
            + self.clip_penalty
    }
}

/// Evaluates one decoded [`Plan`] end to end: runs the simulator, then scores
/// the resulting trace against the four penalty terms of `SPEC_FULL.md` §4.3.
///
/// Grounded on `fennec-cli/src/core/solution/metrics.rs` for the
/// run-the-simulation-then-score shape; the break-even formula itself is
/// grounded on `original_source/.../class_optimize.py`'s economic test
/// fixtures (`tests/test_class_optimize.py`), carried over as the round-trip
/// factor `R = charge_eff * ac_to_dc * discharge_eff * dc_to_ac`.
pub struct FitnessEvaluator<'a, I: Interpolator = NoopInterpolator> {
    simulator: Simulator<'a>,
    battery_params: &'a BatteryParameters,
    inverter_params: &'a InverterParameters,
    appliance_params: &'a [ApplianceParameters],
    forecast: &'a ForecastSet,
    weights: PenaltyWeights,
    interpolator: I,
}

impl<'a> FitnessEvaluator<'a, NoopInterpolator> {
    #[must_use]
    pub fn new(
        battery_params: &'a BatteryParameters,
        inverter_params: &'a InverterParameters,
        appliance_params: &'a [ApplianceParameters],
        forecast: &'a ForecastSet,
        weights: PenaltyWeights,
    ) -> Self {
        let simulator = Simulator::new(battery_params, inverter_params, appliance_params, forecast);
        Self {
            simulator,
            battery_params,
            inverter_params,
            appliance_params,
            forecast,
            weights,
            interpolator: NoopInterpolator,
        }
    }
}

impl<'a, I: Interpolator> FitnessEvaluator<'a, I> {
    /// Builds an evaluator with a custom self-consumption interpolator,
    /// instead of the default [`NoopInterpolator`].
    #[must_use]
    pub fn with_interpolator(
        battery_params: &'a BatteryParameters,
        inverter_params: &'a InverterParameters,
        appliance_params: &'a [ApplianceParameters],
        forecast: &'a ForecastSet,
        weights: PenaltyWeights,
        interpolator: I,
    ) -> Self {
        let simulator = Simulator::new(battery_params, inverter_params, appliance_params, forecast);
        Self { simulator, battery_params, inverter_params, appliance_params, forecast, weights, interpolator }
    }

    #[must_use]
    pub fn evaluate(&self, plan: &Plan) -> FitnessBreakdown {
        self.evaluate_with_trace(plan).0
    }

    /// Same as [`Self::evaluate`], but also returns the simulated trace so
    /// callers (the genetic optimizer's tie-break logic) can inspect totals
    /// beyond the fitness breakdown without re-simulating.
    #[must_use]
    pub fn evaluate_with_trace(&self, plan: &Plan) -> (FitnessBreakdown, crate::trace::ScheduleTrace) {
        let trace = self.simulator.simulate(plan);

        let monetary_cost = trace.totals.net_cost;
        let appliance_penalty = self.appliance_penalty(plan);
        let soc_target_penalty = self.soc_target_penalty(plan);
        let break_even_penalty = self.break_even_penalty(&trace);
        let clip_penalty = self.clip_penalty(&trace);

        let breakdown = FitnessBreakdown {
            monetary_cost,
            appliance_penalty,
            soc_target_penalty,
            break_even_penalty,
            clip_penalty,
        };
        (breakdown, trace)
    }

    /// Penalises each appliance left at the unscheduled sentinel start hour,
    /// proportional to the energy it would have consumed (§3/§4.4 "the
    /// unscheduled sentinel"; §4.3 "proportional to its `consumption_wh`").
    fn appliance_penalty(&self, plan: &Plan) -> Cost {
        let mut penalty = Cost::ZERO;
        for (params, &start_hour) in self.appliance_params.iter().zip(&plan.appliance_start_hours) {
            if start_hour == UNSCHEDULED_START_HOUR {
                penalty += Cost(self.weights.appliance_not_scheduled.0 * params.consumption_wh.0);
            }
        }
        penalty
    }

    /// Penalises the distance in percentage points between the battery's
    /// final state of charge and its configured end-of-horizon target, when
    /// one is set (§4.3 "end-of-horizon SOC target"; typically only set for
    /// EV batteries that must leave the horizon charged for departure).
    /// `k * max(0, target - final) * capacity_wh * max(price_buy_wh)`: the
    /// shortfall is scaled by both the battery's size and the most expensive
    /// forecast price, so the penalty reflects what it would actually cost
    /// to buy the missing energy back.
    fn soc_target_penalty(&self, plan: &Plan) -> Cost {
        let Some(target_pct) = self.battery_params.soc_target_pct else {
            return Cost::ZERO;
        };
        let final_pct = self.simulator.final_soc_pct(plan);
        let shortfall_pct = (target_pct - final_pct).max(Percent::ZERO_PCT);
        let max_price_buy_per_wh = self
            .forecast
            .price_buy_per_wh
            .iter()
            .copied()
            .fold(RatePerWh::ZERO, RatePerWh::max);
        Cost(
            self.weights.soc_target_per_pct.0
                * shortfall_pct.0
                * self.battery_params.capacity_wh.0
                * max_price_buy_per_wh.0,
        )
    }

    /// Penalises charging from the grid in an hour whose buy price still
    /// exceeds every future hour's best obtainable price once scaled down by
    /// the inverter+battery round-trip factor `R` (§4.3 "economic
    /// break-even"). For each hour `h` with AC-grid-charged energy
    /// `e_in_wh`, `p*` is the highest sell or buy price over future hours
    /// where load exceeds PV (the only hours that energy could usefully be
    /// discharged into); if no such hour exists, `p*` is treated as zero, so
    /// a grid charge with nothing to discharge against is never break-even.
    /// When `price_buy[h] > R * p*`, the charge could not have paid for
    /// itself even in the best case, and `e_in_wh * (price_buy[h] - R * p*)`
    /// is added. Only AC-grid-sourced charge is tested — PV-originated
    /// charge was free and is excluded.
    fn break_even_penalty(&self, trace: &crate::trace::ScheduleTrace) -> Cost {
        let round_trip_factor = self
            .inverter_params
            .round_trip_factor(self.battery_params.charge_efficiency, self.battery_params.discharge_efficiency);
        let horizon = trace.hours.len();

        let mut penalty = Cost::ZERO;
        for (hour, trace_hour) in trace.hours.iter().enumerate() {
            let grid_charge_wh = trace_hour.grid_charge_dc_wh;
            if grid_charge_wh <= WattHours::ZERO {
                continue;
            }
            let self_consumed_fraction = self.interpolator.self_consumption_fraction(trace_hour.curtailed_wh);
            if self_consumed_fraction >= 1.0 {
                continue;
            }

            let mut best_future_price = RatePerWh::ZERO;
            for future_hour in (hour + 1)..horizon {
                if self.forecast.load_wh[future_hour] > self.forecast.pv_wh[future_hour] {
                    let candidate =
                        self.forecast.price_sell_per_wh[future_hour].max(self.forecast.price_buy_per_wh[future_hour]);
                    best_future_price = best_future_price.max(candidate);
                }
            }

            let break_even_threshold = best_future_price * round_trip_factor;
            let price_buy_now = self.forecast.price_buy_per_wh[hour];
            if price_buy_now > break_even_threshold {
                let shortfall_per_wh = price_buy_now - break_even_threshold;
                penalty += Cost(self.weights.break_even_violation.0 * (grid_charge_wh * shortfall_per_wh).0);
            }
        }
        penalty
    }

    /// Penalises the energy the battery refused during charge or discharge
    /// clamping (§4.3 "soft-bound/clip violations"), proportional to how
    /// much was refused rather than a flat per-hour cost.
    fn clip_penalty(&self, trace: &crate::trace::ScheduleTrace) -> Cost {
        let mut penalty = Cost::ZERO;
        for hour in &trace.hours {
            penalty += Cost(self.weights.clip_violation.0 * hour.clipped_wh.0);
        }
        penalty
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::DeviceKind;

    fn battery_params(soc_target_pct: Option<Percent>) -> BatteryParameters {
        BatteryParameters {
            device_id: "battery-1".to_owned(),
            capacity_wh: WattHours(10_000.0),
            soc_min_pct: Percent(10.0),
            soc_max_pct: Percent(90.0),
            soc_initial_pct: Percent(50.0),
            charge_efficiency: 0.95,
            discharge_efficiency: 0.95,
            max_charge_power_w: WattHours(5_000.0),
            max_discharge_power_w: WattHours(5_000.0),
            allowed_charge_rates: vec![0.0, 0.5, 1.0],
            kind: DeviceKind::Ev,
            soc_target_pct,
            allow_discharge: false,
        }
    }

    fn inverter_params() -> InverterParameters {
        InverterParameters {
            max_ac_power_w: WattHours(3_000.0),
            max_ac_charge_power_w: WattHours(3_000.0),
            ac_to_dc_efficiency: 0.95,
            dc_to_ac_efficiency: 0.95,
        }
    }

    fn forecast(horizon: usize) -> ForecastSet {
        ForecastSet {
            pv_wh: vec![WattHours(0.0); horizon],
            load_wh: vec![WattHours(500.0); horizon],
            price_buy_per_wh: vec![RatePerWh(0.0003); horizon],
            price_sell_per_wh: vec![RatePerWh(0.0001); horizon],
        }
    }

    #[test]
    fn unmet_soc_target_is_penalised() {
        let battery_params = battery_params(Some(Percent(80.0)));
        let inverter_params = inverter_params();
        let appliances: Vec<ApplianceParameters> = Vec::new();
        let forecast = forecast(4);
        let evaluator = FitnessEvaluator::new(
            &battery_params,
            &inverter_params,
            &appliances,
            &forecast,
            PenaltyWeights::default(),
        );

        let plan = Plan {
            ac_charge_wh: vec![WattHours::ZERO; 4],
            discharge_allowed: vec![false; 4],
            appliance_start_hours: Vec::new(),
        };

        let breakdown = evaluator.evaluate(&plan);
        // 10.0 (k) * 30 (shortfall pct) * 10_000 (capacity_wh) * 0.0003 (max buy price) = 900.0
        assert!((breakdown.soc_target_penalty.0 - 900.0).abs() < 1e-6);
    }

    #[test]
    fn appliance_left_at_unscheduled_sentinel_is_penalised_by_consumption() {
        let battery_params = battery_params(None);
        let inverter_params = inverter_params();
        let appliances = vec![ApplianceParameters {
            device_id: "dishwasher".to_owned(),
            consumption_wh: WattHours(1_000.0),
            duration_h: 1,
            earliest_start_hour: 0,
            latest_start_hour: 2,
        }];
        let forecast = forecast(4);
        let evaluator = FitnessEvaluator::new(
            &battery_params,
            &inverter_params,
            &appliances,
            &forecast,
            PenaltyWeights::default(),
        );

        let plan = Plan {
            ac_charge_wh: vec![WattHours::ZERO; 4],
            discharge_allowed: vec![false; 4],
            appliance_start_hours: vec![UNSCHEDULED_START_HOUR],
        };

        let breakdown = evaluator.evaluate(&plan);
        let expected = PenaltyWeights::default().appliance_not_scheduled.0 * 1_000.0;
        assert!((breakdown.appliance_penalty.0 - expected).abs() < 1e-6);
    }

    #[test]
    fn appliance_scheduled_in_window_is_not_penalised() {
        let battery_params = battery_params(None);
        let inverter_params = inverter_params();
        let appliances = vec![ApplianceParameters {
            device_id: "dishwasher".to_owned(),
            consumption_wh: WattHours(1_000.0),
            duration_h: 1,
            earliest_start_hour: 0,
            latest_start_hour: 2,
        }];
        let forecast = forecast(4);
        let evaluator = FitnessEvaluator::new(
            &battery_params,
            &inverter_params,
            &appliances,
            &forecast,
            PenaltyWeights::default(),
        );

        let plan = Plan {
            ac_charge_wh: vec![WattHours::ZERO; 4],
            discharge_allowed: vec![false; 4],
            appliance_start_hours: vec![1],
        };

        let breakdown = evaluator.evaluate(&plan);
        assert_eq!(breakdown.appliance_penalty.0, 0.0);
    }

    #[test]
    fn grid_charge_that_cannot_break_even_is_penalised() {
        let battery_params = battery_params(None);
        let inverter_params = inverter_params();
        let appliances: Vec<ApplianceParameters> = Vec::new();
        // Future hours all have PV covering load, so there is no hour where
        // the stored energy could usefully be discharged: charging now can
        // never pay for itself.
        let forecast = ForecastSet {
            pv_wh: vec![WattHours(0.0), WattHours(2_000.0), WattHours(2_000.0)],
            load_wh: vec![WattHours(500.0), WattHours(200.0), WattHours(200.0)],
            price_buy_per_wh: vec![RatePerWh(0.001), RatePerWh(0.0001), RatePerWh(0.0001)],
            price_sell_per_wh: vec![RatePerWh(0.0001), RatePerWh(0.0001), RatePerWh(0.0001)],
        };
        let evaluator = FitnessEvaluator::new(
            &battery_params,
            &inverter_params,
            &appliances,
            &forecast,
            PenaltyWeights::default(),
        );

        let plan = Plan {
            ac_charge_wh: vec![WattHours(2_000.0), WattHours::ZERO, WattHours::ZERO],
            discharge_allowed: vec![false; 3],
            appliance_start_hours: Vec::new(),
        };

        let breakdown = evaluator.evaluate(&plan);
        assert!(breakdown.break_even_penalty.0 > 0.0);
    }

    #[test]
    fn grid_charge_that_can_break_even_is_not_penalised() {
        let battery_params = battery_params(None);
        let inverter_params = inverter_params();
        let appliances: Vec<ApplianceParameters> = Vec::new();
        // Cheap now, and a future hour needs grid power badly enough that
        // even after round-trip losses the charge pays for itself.
        let forecast = ForecastSet {
            pv_wh: vec![WattHours(2_000.0), WattHours(0.0)],
            load_wh: vec![WattHours(500.0), WattHours(2_000.0)],
            price_buy_per_wh: vec![RatePerWh(0.0001), RatePerWh(0.001)],
            price_sell_per_wh: vec![RatePerWh(0.0001), RatePerWh(0.001)],
        };
        let evaluator = FitnessEvaluator::new(
            &battery_params,
            &inverter_params,
            &appliances,
            &forecast,
            PenaltyWeights::default(),
        );

        let plan = Plan {
            ac_charge_wh: vec![WattHours(1_000.0), WattHours::ZERO],
            discharge_allowed: vec![false; 2],
            appliance_start_hours: Vec::new(),
        };

        let breakdown = evaluator.evaluate(&plan);
        assert_eq!(breakdown.break_even_penalty.0, 0.0);
    }

    #[test]
    fn clip_penalty_scales_with_refused_energy() {
        let mut battery_params = battery_params(None);
        battery_params.max_charge_power_w = WattHours(10_000.0);
        battery_params.capacity_wh = WattHours(1_000.0);
        battery_params.soc_initial_pct = Percent(89.0);
        let inverter_params = inverter_params();
        let appliances: Vec<ApplianceParameters> = Vec::new();
        let forecast = forecast(1);
        let evaluator = FitnessEvaluator::new(
            &battery_params,
            &inverter_params,
            &appliances,
            &forecast,
            PenaltyWeights::default(),
        );

        // Near-full battery: most of the requested grid charge is refused.
        let plan = Plan {
            ac_charge_wh: vec![WattHours(5_000.0)],
            discharge_allowed: vec![false],
            appliance_start_hours: Vec::new(),
        };

        let breakdown = evaluator.evaluate(&plan);
        assert!(breakdown.clip_penalty.0 > 0.0);
    }
}

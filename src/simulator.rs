use crate::{
    device::{Appliance, ApplianceParameters, Battery, BatteryParameters, Inverter, InverterParameters},
    forecast::ForecastSet,
    quantity::WattHours,
    trace::ScheduleTrace,
};

/// A decoded chromosome: concrete, per-hour decisions ready to be replayed
/// against the simulator. The genetic optimizer's chromosome encoding (§4.4)
/// decodes into this shape; the simulator never sees gene bits directly.
#[derive(Clone, Debug)]
pub struct Plan {
    /// AC-side energy requested to charge the battery from the grid, per hour.
    pub ac_charge_wh: Vec<WattHours>,
    /// Whether the battery is permitted to discharge, per hour.
    pub discharge_allowed: Vec<bool>,
    /// Chosen start hour for each appliance, same order as the appliance
    /// parameter list the simulator was built with.
    pub appliance_start_hours: Vec<u32>,
}

/// Walks the forecast horizon hour by hour, decoding a [`Plan`] into battery
/// and inverter actions and accumulating a [`ScheduleTrace`].
///
/// Grounded on `fennec-cli/src/core/solver.rs`'s `simulate_step`: the
/// teacher's dynamic-programming solver evaluates one step at a time against
/// a cloned battery state; this module keeps that per-evaluation battery
/// clone discipline but walks forward across a whole horizon driven by a
/// decoded chromosome instead of backward across a DP lattice.
pub struct Simulator<'a> {
    battery_params: &'a BatteryParameters,
    inverter_params: &'a InverterParameters,
    appliance_params: &'a [ApplianceParameters],
    forecast: &'a ForecastSet,
}

impl<'a> Simulator<'a> {
    #[must_use]
    pub fn new(
        battery_params: &'a BatteryParameters,
        inverter_params: &'a InverterParameters,
        appliance_params: &'a [ApplianceParameters],
        forecast: &'a ForecastSet,
    ) -> Self {
        Self { battery_params, inverter_params, appliance_params, forecast }
    }

    #[must_use]
    pub fn horizon_hours(&self) -> usize {
        self.forecast.len()
    }

    /// Runs the whole horizon for `plan`, starting the battery at its
    /// configured initial state of charge every time (§5: fitness evaluation
    /// must be reproducible across repeated calls on a fresh clone).
    #[must_use]
    pub fn simulate(&self, plan: &Plan) -> ScheduleTrace {
        let horizon = self.horizon_hours();
        let mut battery = Battery::new(self.battery_params);
        let inverter = Inverter::new(self.inverter_params);

        let appliance_load_wh = self.appliance_load_curve(plan, horizon);

        let mut hours = Vec::with_capacity(horizon);
        let mut net_cost_per_hour = Vec::with_capacity(horizon);

        for hour in 0..horizon {
            let pv_wh = self.forecast.pv_wh[hour];
            let load_wh = self.forecast.load_wh[hour] + appliance_load_wh[hour];
            let ac_charge_wh = plan.ac_charge_wh.get(hour).copied().unwrap_or(WattHours::ZERO);
            let discharge_allowed = plan.discharge_allowed.get(hour).copied().unwrap_or(false)
                && self.battery_params.has_discharge_gene();

            let trace =
                inverter.process(&mut battery, pv_wh, load_wh, ac_charge_wh, discharge_allowed, hour);

            let import_cost = trace.grid_import_wh * self.forecast.price_buy_per_wh[hour];
            let export_revenue = trace.grid_export_wh * self.forecast.price_sell_per_wh[hour];
            net_cost_per_hour.push(import_cost - export_revenue);

            hours.push(trace);
        }

        ScheduleTrace::from_hours(hours, &net_cost_per_hour)
    }

    /// Final state of charge the battery reaches after replaying `plan`,
    /// used by the fitness evaluator's end-of-horizon SOC target penalty.
    #[must_use]
    pub fn final_soc_pct(&self, plan: &Plan) -> crate::quantity::Percent {
        let mut battery = Battery::new(self.battery_params);
        let inverter = Inverter::new(self.inverter_params);
        let horizon = self.horizon_hours();
        let appliance_load_wh = self.appliance_load_curve(plan, horizon);

        for hour in 0..horizon {
            let pv_wh = self.forecast.pv_wh[hour];
            let load_wh = self.forecast.load_wh[hour] + appliance_load_wh[hour];
            let ac_charge_wh = plan.ac_charge_wh.get(hour).copied().unwrap_or(WattHours::ZERO);
            let discharge_allowed = plan.discharge_allowed.get(hour).copied().unwrap_or(false)
                && self.battery_params.has_discharge_gene();
            inverter.process(&mut battery, pv_wh, load_wh, ac_charge_wh, discharge_allowed, hour);
        }
        battery.soc_pct()
    }

    fn appliance_load_curve(&self, plan: &Plan, horizon: usize) -> Vec<WattHours> {
        let mut total = vec![WattHours::ZERO; horizon];
        for (params, &start_hour) in self.appliance_params.iter().zip(&plan.appliance_start_hours) {
            let appliance = Appliance::new(params);
            for (slot, wh) in total.iter_mut().zip(appliance.load_curve(start_hour, horizon as u32)) {
                *slot += wh;
            }
        }
        total
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::DeviceKind;

    fn battery_params() -> BatteryParameters {
        BatteryParameters {
            device_id: "battery-1".to_owned(),
            capacity_wh: WattHours(10_000.0),
            soc_min_pct: crate::quantity::Percent(10.0),
            soc_max_pct: crate::quantity::Percent(90.0),
            soc_initial_pct: crate::quantity::Percent(50.0),
            charge_efficiency: 0.95,
            discharge_efficiency: 0.95,
            max_charge_power_w: WattHours(5_000.0),
            max_discharge_power_w: WattHours(5_000.0),
            allowed_charge_rates: vec![0.0, 0.5, 1.0],
            kind: DeviceKind::Stationary,
            soc_target_pct: None,
            allow_discharge: true,
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
            pv_wh: vec![WattHours(1_500.0); horizon],
            load_wh: vec![WattHours(500.0); horizon],
            price_buy_per_wh: vec![crate::quantity::RatePerWh(0.0003); horizon],
            price_sell_per_wh: vec![crate::quantity::RatePerWh(0.0001); horizon],
        }
    }

    #[test]
    fn simulate_produces_one_trace_entry_per_hour() {
        let battery_params = battery_params();
        let inverter_params = inverter_params();
        let appliances: Vec<ApplianceParameters> = Vec::new();
        let forecast = forecast(6);
        let simulator = Simulator::new(&battery_params, &inverter_params, &appliances, &forecast);

        let plan = Plan {
            ac_charge_wh: vec![WattHours::ZERO; 6],
            discharge_allowed: vec![true; 6],
            appliance_start_hours: Vec::new(),
        };

        let trace = simulator.simulate(&plan);
        assert_eq!(trace.hours.len(), 6);
    }

    #[test]
    fn surplus_pv_horizon_exports_and_never_imports() {
        let battery_params = battery_params();
        let inverter_params = inverter_params();
        let appliances: Vec<ApplianceParameters> = Vec::new();
        let forecast = forecast(4);
        let simulator = Simulator::new(&battery_params, &inverter_params, &appliances, &forecast);

        let plan = Plan {
            ac_charge_wh: vec![WattHours::ZERO; 4],
            discharge_allowed: vec![false; 4],
            appliance_start_hours: Vec::new(),
        };

        let trace = simulator.simulate(&plan);
        assert_eq!(trace.totals.grid_import_wh, WattHours::ZERO);
    }
}

use serde::{Deserialize, Serialize};

use crate::{
    device::battery::Battery,
    quantity::{Percent, WattHours},
};

/// Static, immutable parameters of the hybrid inverter shared by every
/// battery behind it.
///
/// Mirrors `SPEC_FULL.md` §3 "Inverter parameters".
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct InverterParameters {
    /// AC-side throughput cap, shared by export and by AC-side discharge.
    pub max_ac_power_w: WattHours,
    /// AC-side cap specific to charging the battery from the grid.
    pub max_ac_charge_power_w: WattHours,
    pub ac_to_dc_efficiency: f64,
    pub dc_to_ac_efficiency: f64,
}

impl InverterParameters {
    pub fn validate(&self) -> Result<(), String> {
        if self.max_ac_power_w.0 <= 0.0 {
            return Err("inverter: max_ac_power_w must be > 0".to_owned());
        }
        if self.max_ac_charge_power_w.0 < 0.0 {
            return Err("inverter: max_ac_charge_power_w must be >= 0".to_owned());
        }
        if !(0.0..=1.0).contains(&self.ac_to_dc_efficiency) || self.ac_to_dc_efficiency <= 0.0 {
            return Err("inverter: ac_to_dc_efficiency must lie in (0, 1]".to_owned());
        }
        if !(0.0..=1.0).contains(&self.dc_to_ac_efficiency) || self.dc_to_ac_efficiency <= 0.0 {
            return Err("inverter: dc_to_ac_efficiency must lie in (0, 1]".to_owned());
        }
        Ok(())
    }

    /// The end-to-end round-trip factor `R` used by the economic break-even
    /// penalty (`SPEC_FULL.md` §4.3): `R = charge_eff * ac_to_dc * discharge_eff * dc_to_ac`.
    #[must_use]
    pub fn round_trip_factor(&self, charge_efficiency: f64, discharge_efficiency: f64) -> f64 {
        charge_efficiency * self.ac_to_dc_efficiency * discharge_efficiency * self.dc_to_ac_efficiency
    }
}

/// One hour's worth of energy flows through the inverter, kept for reporting
/// and for fitness evaluation.
///
/// Grounded on `fennec-cli/src/core/solution/summary.rs`'s per-hour ledger.
#[derive(Clone, Copy, Debug, Default, Deserialize, Serialize)]
pub struct HourTrace {
    pub pv_wh: WattHours,
    pub load_wh: WattHours,
    pub grid_import_wh: WattHours,
    pub grid_export_wh: WattHours,
    /// Total DC energy accepted into the battery this hour, PV-sourced and
    /// grid-sourced combined.
    pub battery_charge_dc_wh: WattHours,
    /// The portion of `battery_charge_dc_wh` sourced from AC grid charging
    /// rather than PV surplus. Kept separate because the economic break-even
    /// penalty (`SPEC_FULL.md` §4.3) only ever tests grid-bought energy
    /// against future prices — PV-originated charge was free to begin with.
    pub grid_charge_dc_wh: WattHours,
    pub battery_discharge_dc_wh: WattHours,
    pub conversion_loss_wh: WattHours,
    /// PV surplus that could neither charge the battery nor be exported,
    /// because the AC export cap was reached (§4.1).
    pub curtailed_wh: WattHours,
    /// Energy the battery refused during charge or discharge clamping this
    /// hour — the gap between what the chromosome's decision (or PV surplus)
    /// asked for and what the battery's power/capacity limits allowed
    /// through. This is the "soft-bound" signal §4.3's clip penalty scores,
    /// distinct from export curtailment above.
    pub clipped_wh: WattHours,
    pub soc_after_pct: Percent,
}

/// The inverter has no state of its own: it is a pure per-hour power-flow
/// decision, grounded on `fennec-cli/src/core/flow/energy_balance.rs`'s
/// `EnergyBalance::new`/`with_working_mode` grid/battery split, generalised
/// to the PV+battery+grid topology `SPEC_FULL.md` §4.1 describes.
#[derive(Clone, Copy, Debug)]
pub struct Inverter<'a> {
    params: &'a InverterParameters,
}

impl<'a> Inverter<'a> {
    #[must_use]
    pub fn new(params: &'a InverterParameters) -> Self {
        Self { params }
    }

    /// Runs one hour of energy flow against `battery`, given the forecast PV
    /// and load, the chromosome's requested AC charge-from-grid power, and
    /// whether discharge is permitted this hour.
    ///
    /// AC-charge and discharge are mutually exclusive within the hour: if
    /// `ac_charge_request_wh` is positive, `discharge_allowed` is ignored and
    /// no discharge happens, matching `SPEC_FULL.md` §4.1.
    pub fn process(
        &self,
        battery: &mut Battery<'_>,
        pv_wh: WattHours,
        load_wh: WattHours,
        ac_charge_request_wh: WattHours,
        discharge_allowed: bool,
        hour: usize,
    ) -> HourTrace {
        let mut trace = HourTrace { pv_wh, load_wh, ..HourTrace::default() };
        let charging_from_grid = ac_charge_request_wh > WattHours::ZERO;

        if pv_wh >= load_wh {
            let surplus_dc_wh = pv_wh - load_wh;
            let (accepted_wh, charge_loss_wh) = battery.charge(surplus_dc_wh, hour);
            trace.battery_charge_dc_wh = accepted_wh;
            trace.conversion_loss_wh += charge_loss_wh;
            trace.clipped_wh += (surplus_dc_wh - accepted_wh).max(WattHours::ZERO);

            let remaining_dc_wh = surplus_dc_wh - accepted_wh;
            let exportable_ac_wh = (remaining_dc_wh * self.params.dc_to_ac_efficiency)
                .min(self.params.max_ac_power_w);
            trace.grid_export_wh = exportable_ac_wh;

            let would_be_export_ac_wh = remaining_dc_wh * self.params.dc_to_ac_efficiency;
            trace.curtailed_wh = (would_be_export_ac_wh - exportable_ac_wh).max(WattHours::ZERO);
            trace.conversion_loss_wh +=
                remaining_dc_wh - remaining_dc_wh * self.params.dc_to_ac_efficiency;
        } else {
            let deficit_ac_wh = load_wh - pv_wh;
            trace.conversion_loss_wh += WattHours::ZERO;

            if discharge_allowed && !charging_from_grid {
                let max_ac_draw_wh = deficit_ac_wh.min(self.params.max_ac_power_w);
                let requested_dc_wh = max_ac_draw_wh / self.params.dc_to_ac_efficiency;
                let (delivered_dc_wh, discharge_loss_wh) = battery.discharge(requested_dc_wh, hour);
                trace.battery_discharge_dc_wh = delivered_dc_wh;
                trace.conversion_loss_wh += discharge_loss_wh;
                trace.clipped_wh += (requested_dc_wh - delivered_dc_wh).max(WattHours::ZERO);

                let delivered_ac_wh = delivered_dc_wh * self.params.dc_to_ac_efficiency;
                trace.conversion_loss_wh += delivered_dc_wh - delivered_ac_wh;
                trace.grid_import_wh = (deficit_ac_wh - delivered_ac_wh).max(WattHours::ZERO);
            } else {
                trace.grid_import_wh = deficit_ac_wh;
            }
        }

        if charging_from_grid {
            let capped_ac_wh = ac_charge_request_wh.min(self.params.max_ac_charge_power_w);
            let requested_dc_wh = capped_ac_wh * self.params.ac_to_dc_efficiency;
            let (accepted_dc_wh, charge_loss_wh) = battery.charge(requested_dc_wh, hour);
            trace.battery_charge_dc_wh += accepted_dc_wh;
            trace.grid_charge_dc_wh = accepted_dc_wh;
            trace.conversion_loss_wh += charge_loss_wh;
            trace.clipped_wh += (requested_dc_wh - accepted_dc_wh).max(WattHours::ZERO);

            let actual_ac_draw_wh = if self.params.ac_to_dc_efficiency > 0.0 {
                accepted_dc_wh / self.params.ac_to_dc_efficiency
            } else {
                WattHours::ZERO
            };
            trace.conversion_loss_wh += actual_ac_draw_wh - accepted_dc_wh;
            trace.grid_import_wh += actual_ac_draw_wh;
        }

        trace.soc_after_pct = battery.soc_pct();
        trace
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;
    use crate::device::{DeviceKind, battery::BatteryParameters};

    fn battery_params() -> BatteryParameters {
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

    #[test]
    fn surplus_pv_charges_battery_then_exports() {
        let battery_params = battery_params();
        let inverter_params = inverter_params();
        let mut battery = Battery::new(&battery_params);
        let inverter = Inverter::new(&inverter_params);

        let trace = inverter.process(
            &mut battery,
            WattHours(6_000.0),
            WattHours(1_000.0),
            WattHours::ZERO,
            false,
            0,
        );

        assert!(trace.battery_charge_dc_wh.0 > 0.0);
        assert!(trace.grid_export_wh.0 > 0.0);
        assert_eq!(trace.grid_import_wh, WattHours::ZERO);
    }

    #[test]
    fn deficit_draws_from_battery_before_grid() {
        let battery_params = battery_params();
        let inverter_params = inverter_params();
        let mut battery = Battery::new(&battery_params);
        let inverter = Inverter::new(&inverter_params);

        let trace = inverter.process(
            &mut battery,
            WattHours(0.0),
            WattHours(2_000.0),
            WattHours::ZERO,
            true,
            0,
        );

        assert!(trace.battery_discharge_dc_wh.0 > 0.0);
        assert!(trace.grid_import_wh.0 >= 0.0);
    }

    #[test]
    fn discharge_disallowed_forces_full_grid_import() {
        let battery_params = battery_params();
        let inverter_params = inverter_params();
        let mut battery = Battery::new(&battery_params);
        let inverter = Inverter::new(&inverter_params);

        let trace = inverter.process(
            &mut battery,
            WattHours(0.0),
            WattHours(2_000.0),
            WattHours::ZERO,
            false,
            0,
        );

        assert_relative_eq!(trace.grid_import_wh.0, 2_000.0, epsilon = 1e-9);
        assert_eq!(trace.battery_discharge_dc_wh, WattHours::ZERO);
    }

    #[test]
    fn ac_charge_request_is_mutually_exclusive_with_discharge() {
        let battery_params = battery_params();
        let inverter_params = inverter_params();
        let mut battery = Battery::new(&battery_params);
        let inverter = Inverter::new(&inverter_params);

        let trace = inverter.process(
            &mut battery,
            WattHours(0.0),
            WattHours(1_000.0),
            WattHours(2_000.0),
            true,
            0,
        );

        assert_eq!(trace.battery_discharge_dc_wh, WattHours::ZERO);
        assert!(trace.battery_charge_dc_wh.0 > 0.0);
        assert_eq!(trace.battery_charge_dc_wh, trace.grid_charge_dc_wh);
    }

    #[test]
    fn pv_charge_is_not_counted_as_grid_charge() {
        let battery_params = battery_params();
        let inverter_params = inverter_params();
        let mut battery = Battery::new(&battery_params);
        let inverter = Inverter::new(&inverter_params);

        let trace = inverter.process(
            &mut battery,
            WattHours(6_000.0),
            WattHours(1_000.0),
            WattHours::ZERO,
            false,
            0,
        );

        assert!(trace.battery_charge_dc_wh.0 > 0.0);
        assert_eq!(trace.grid_charge_dc_wh, WattHours::ZERO);
    }

    #[test]
    fn charge_request_beyond_headroom_is_recorded_as_clipped() {
        let battery_params = battery_params();
        let inverter_params = inverter_params();
        let mut battery = Battery::new(&battery_params);
        // Push the battery to near-full first so the next grid charge request
        // has almost no headroom left.
        battery.charge(WattHours(1_000_000.0), 0);
        let inverter = Inverter::new(&inverter_params);

        let trace = inverter.process(
            &mut battery,
            WattHours::ZERO,
            WattHours(500.0),
            WattHours(3_000.0),
            false,
            0,
        );

        assert!(trace.clipped_wh.0 > 0.0);
    }
}

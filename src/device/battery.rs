use serde::{Deserialize, Serialize};

use crate::{
    device::DeviceKind,
    quantity::{Percent, WattHours},
};

/// Static, immutable parameters of one battery (stationary or EV).
///
/// Mirrors `SPEC_FULL.md` §3 "Battery parameters" field for field.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct BatteryParameters {
    pub device_id: String,
    pub capacity_wh: WattHours,
    pub soc_min_pct: Percent,
    pub soc_max_pct: Percent,
    pub soc_initial_pct: Percent,
    pub charge_efficiency: f64,
    pub discharge_efficiency: f64,
    pub max_charge_power_w: WattHours,
    pub max_discharge_power_w: WattHours,
    pub allowed_charge_rates: Vec<f64>,
    pub kind: DeviceKind,
    /// End-of-horizon state-of-charge target, only meaningful for EV
    /// batteries (§4.3 "End-of-horizon state-of-charge penalty").
    pub soc_target_pct: Option<Percent>,
    /// Whether this battery is allowed to discharge at all. Defaults to
    /// `false` for EVs and `true` otherwise (`SPEC_FULL.md` §9).
    #[serde(default = "default_allow_discharge")]
    pub allow_discharge: bool,
}

fn default_allow_discharge() -> bool {
    true
}

impl BatteryParameters {
    #[must_use]
    pub fn is_ev(&self) -> bool {
        matches!(self.kind, DeviceKind::Ev)
    }

    /// Whether the per-hour discharge-permission gene exists for this
    /// battery (§3 "always present for non-EV, absent for EV unless
    /// configured").
    #[must_use]
    pub fn has_discharge_gene(&self) -> bool {
        !self.is_ev() && self.allow_discharge
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.capacity_wh.0 <= 0.0 {
            return Err(format!("battery {}: capacity must be > 0", self.device_id));
        }
        if !(0.0..=100.0).contains(&self.soc_min_pct.0) || !(0.0..=100.0).contains(&self.soc_max_pct.0)
        {
            return Err(format!("battery {}: soc bounds must lie in [0, 100]", self.device_id));
        }
        if self.soc_min_pct > self.soc_max_pct {
            return Err(format!("battery {}: soc_min_pct must be <= soc_max_pct", self.device_id));
        }
        if !(self.soc_min_pct.0..=self.soc_max_pct.0).contains(&self.soc_initial_pct.0) {
            return Err(format!(
                "battery {}: soc_initial_pct must lie within [soc_min_pct, soc_max_pct]",
                self.device_id
            ));
        }
        if !(0.0..=1.0).contains(&self.charge_efficiency) || self.charge_efficiency <= 0.0 {
            return Err(format!("battery {}: charge_efficiency must lie in (0, 1]", self.device_id));
        }
        if !(0.0..=1.0).contains(&self.discharge_efficiency) || self.discharge_efficiency <= 0.0 {
            return Err(format!(
                "battery {}: discharge_efficiency must lie in (0, 1]",
                self.device_id
            ));
        }
        if self.allowed_charge_rates.is_empty() {
            return Err(format!("battery {}: allowed_charge_rates must be non-empty", self.device_id));
        }
        if self.allowed_charge_rates.iter().any(|rate| !(0.0..=1.0).contains(rate)) {
            return Err(format!(
                "battery {}: allowed_charge_rates must lie in [0, 1]",
                self.device_id
            ));
        }
        Ok(())
    }
}

/// Mutable battery state, simulated hour by hour.
///
/// Grounded on `fennec-cli/src/core/battery/simulator.rs`'s `Simulator`:
/// power is requested, clamped against capacity/headroom, and the
/// state-of-charge is updated immediately, with no failure mode — excess
/// requests are silently clipped, exactly as `SPEC_FULL.md` §4.1 specifies.
#[derive(Clone, Debug)]
pub struct Battery<'a> {
    params: &'a BatteryParameters,
    residual_wh: WattHours,
}

impl<'a> Battery<'a> {
    #[must_use]
    pub fn new(params: &'a BatteryParameters) -> Self {
        let mut battery = Self { params, residual_wh: WattHours::ZERO };
        battery.reset();
        battery
    }

    pub fn reset(&mut self) {
        self.residual_wh = self.params.capacity_wh * self.params.soc_initial_pct;
    }

    #[must_use]
    pub fn soc_pct(&self) -> Percent {
        Percent::from_fraction(self.residual_wh / self.params.capacity_wh)
    }

    #[must_use]
    pub fn residual_wh(&self) -> WattHours {
        self.residual_wh
    }

    fn min_residual_wh(&self) -> WattHours {
        self.params.capacity_wh * self.params.soc_min_pct
    }

    fn max_residual_wh(&self) -> WattHours {
        self.params.capacity_wh * self.params.soc_max_pct
    }

    /// Accept up to `requested_wh` of energy. Returns `(accepted_wh, loss_wh)`
    /// where `accepted_wh` is what the *requester* (grid or PV surplus) must
    /// supply, and `loss_wh = accepted_wh * (1 - charge_efficiency)`.
    pub fn charge(&mut self, requested_wh: WattHours, _hour: usize) -> (WattHours, WattHours) {
        let requested_wh = requested_wh.max(WattHours::ZERO).min(self.params.max_charge_power_w);
        let headroom_wh = (self.max_residual_wh() - self.residual_wh).max(WattHours::ZERO);
        // `stored = accepted * efficiency <= headroom`, so cap accepted accordingly.
        let max_acceptable_wh = headroom_wh / self.params.charge_efficiency;
        let accepted_wh = requested_wh.min(max_acceptable_wh);
        let stored_wh = accepted_wh * self.params.charge_efficiency;
        let loss_wh = accepted_wh - stored_wh;
        self.residual_wh = self.residual_wh + stored_wh;
        (accepted_wh, loss_wh)
    }

    /// Deliver up to `requested_wh` of energy from the battery side. Returns
    /// `(delivered_wh, loss_wh)` where `delivered_wh` is what reaches the
    /// requester, `delivered_wh = drawn_wh * discharge_efficiency`, and
    /// `loss_wh = drawn_wh - delivered_wh`.
    pub fn discharge(&mut self, requested_wh: WattHours, _hour: usize) -> (WattHours, WattHours) {
        let requested_wh =
            requested_wh.max(WattHours::ZERO).min(self.params.max_discharge_power_w);
        let available_wh = (self.residual_wh - self.min_residual_wh()).max(WattHours::ZERO);
        // `delivered = drawn * efficiency <= delivered`, so drawn is capped by
        // what's available and by what the request implies in drawn terms.
        let max_drawn_wh = requested_wh / self.params.discharge_efficiency;
        let drawn_wh = available_wh.min(max_drawn_wh);
        let delivered_wh = drawn_wh * self.params.discharge_efficiency;
        let loss_wh = drawn_wh - delivered_wh;
        self.residual_wh = self.residual_wh - drawn_wh;
        (delivered_wh, loss_wh)
    }
}

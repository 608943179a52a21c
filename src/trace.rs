use serde::{Deserialize, Serialize};

use crate::{device::HourTrace, quantity::Cost};

/// Horizon-wide totals rolled up from a [`ScheduleTrace`]'s hourly entries.
#[derive(Clone, Copy, Debug, Default, Deserialize, Serialize)]
pub struct Totals {
    pub grid_import_wh: crate::quantity::WattHours,
    pub grid_export_wh: crate::quantity::WattHours,
    pub conversion_loss_wh: crate::quantity::WattHours,
    pub curtailed_wh: crate::quantity::WattHours,
    /// Horizon total of AC-grid-sourced battery charge, used by the genetic
    /// optimizer's best-selection tie-break (`SPEC_FULL.md` §4.4).
    pub grid_charge_dc_wh: crate::quantity::WattHours,
    pub clipped_wh: crate::quantity::WattHours,
    pub net_cost: Cost,
}

/// The full simulated outcome of running one chromosome's decoded plan
/// through the simulator: one [`HourTrace`] per hour, plus horizon totals.
///
/// Grounded on `fennec-cli/src/core/solution/summary.rs`'s per-run ledger.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct ScheduleTrace {
    pub hours: Vec<HourTrace>,
    pub totals: Totals,
}

impl ScheduleTrace {
    #[must_use]
    pub fn from_hours(hours: Vec<HourTrace>, net_cost_per_hour: &[Cost]) -> Self {
        let mut totals = Totals::default();
        for hour in &hours {
            totals.grid_import_wh += hour.grid_import_wh;
            totals.grid_export_wh += hour.grid_export_wh;
            totals.conversion_loss_wh += hour.conversion_loss_wh;
            totals.curtailed_wh += hour.curtailed_wh;
            totals.grid_charge_dc_wh += hour.grid_charge_dc_wh;
            totals.clipped_wh += hour.clipped_wh;
        }
        totals.net_cost = net_cost_per_hour.iter().copied().fold(Cost::ZERO, |a, b| a + b);
        Self { hours, totals }
    }
}

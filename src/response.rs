use serde::{Deserialize, Serialize};

use crate::{fitness::FitnessBreakdown, ga::StopReason, quantity::Cost, simulator::Plan, trace::ScheduleTrace};

/// How an optimization run concluded (`SPEC_FULL.md` §6's
/// `status ∈ {Ok, Cancelled, Error}`).
///
/// `Cancelled` is a successful outcome carrying whatever best plan had been
/// found up to the generation boundary where cancellation (or a deadline)
/// was observed: callers should not treat it as an error. `Error` is never
/// constructed by this crate today — a run that fails validation returns
/// `Err(PlannerError)` before any `OptimizeResponse` exists — but the
/// variant is kept so the status contract matches the interface exactly,
/// for a future caller that wants to surface a mid-run fault without losing
/// the best-so-far plan.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    Ok,
    Cancelled,
    Error,
}

impl From<StopReason> for Status {
    fn from(reason: StopReason) -> Self {
        match reason {
            StopReason::GenerationsExhausted => Self::Ok,
            StopReason::Cancelled | StopReason::DeadlineExceeded => Self::Cancelled,
        }
    }
}

/// The full result of one `optimize` call: the best schedule found, its
/// simulated trace, its fitness breakdown, and how the run ended.
///
/// Grounded on `fennec-cli/src/core/solution.rs`'s `Solution` bundling a
/// chromosome-equivalent result with its simulated trace and metrics.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct OptimizeResponse {
    pub status: Status,
    pub generations_run: u32,
    pub ac_charge_wh: Vec<crate::quantity::WattHours>,
    pub discharge_allowed: Vec<bool>,
    pub appliance_start_hours: Vec<u32>,
    pub trace: ScheduleTrace,
    pub fitness: FitnessBreakdown,
    pub total_cost: Cost,
}

impl OptimizeResponse {
    #[must_use]
    pub fn new(plan: Plan, trace: ScheduleTrace, fitness: FitnessBreakdown, status: Status, generations_run: u32) -> Self {
        let total_cost = fitness.total();
        Self {
            status,
            generations_run,
            ac_charge_wh: plan.ac_charge_wh,
            discharge_allowed: plan.discharge_allowed,
            appliance_start_hours: plan.appliance_start_hours,
            trace,
            fitness,
            total_cost,
        }
    }
}

use serde::{Deserialize, Serialize};

use crate::quantity::WattHours;

/// Sentinel chromosome value meaning "this appliance run was not scheduled
/// at all" (`SPEC_FULL.md` §3/§4.4). `u32::MAX` can never fall inside a real
/// `[earliest_start_hour, latest_start_hour]` window, so it is distinguished
/// unambiguously from a legal hour.
pub const UNSCHEDULED_START_HOUR: u32 = u32::MAX;

/// Static, immutable parameters of one deferrable appliance.
///
/// Supplemented from `original_source/modules/class_optimizable_load.py`,
/// which has no Rust counterpart in the example pack: an appliance is a
/// single rectangular load of total energy `consumption_wh` spread evenly
/// across `duration_h` consecutive hours, schedulable anywhere inside
/// `[earliest_start_hour, latest_start_hour]`.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct ApplianceParameters {
    pub device_id: String,
    pub consumption_wh: WattHours,
    pub duration_h: u32,
    pub earliest_start_hour: u32,
    pub latest_start_hour: u32,
}

impl ApplianceParameters {
    pub fn validate(&self, horizon_hours: u32) -> Result<(), String> {
        if self.consumption_wh.0 <= 0.0 {
            return Err(format!("appliance {}: consumption_wh must be > 0", self.device_id));
        }
        if self.duration_h == 0 {
            return Err(format!("appliance {}: duration_h must be > 0", self.device_id));
        }
        if self.earliest_start_hour > self.latest_start_hour {
            return Err(format!(
                "appliance {}: earliest_start_hour must be <= latest_start_hour",
                self.device_id
            ));
        }
        if self.latest_start_hour + self.duration_h > horizon_hours {
            return Err(format!(
                "appliance {}: latest_start_hour + duration_h exceeds the horizon",
                self.device_id
            ));
        }
        Ok(())
    }

    /// Number of valid start hours, used to size the chromosome's gene range
    /// for this appliance and to detect the degenerate single-choice case.
    #[must_use]
    pub fn start_window_len(&self) -> u32 {
        self.latest_start_hour - self.earliest_start_hour + 1
    }
}

/// A scheduled (or not-yet-scheduled) appliance run.
///
/// Grounded in shape on `SPEC_FULL.md` §4.1's device-model trio
/// (battery/inverter/appliance); unlike the battery and inverter, an
/// appliance carries no continuous internal state across hours, only a
/// chosen start hour decoded from its chromosome gene.
#[derive(Clone, Copy, Debug)]
pub struct Appliance<'a> {
    params: &'a ApplianceParameters,
}

impl<'a> Appliance<'a> {
    #[must_use]
    pub fn new(params: &'a ApplianceParameters) -> Self {
        Self { params }
    }

    /// Per-hour power draw of this appliance for a run starting at
    /// `start_hour`, as a vector spanning the whole `horizon_hours` so it can
    /// be added directly into the forecasted load.
    ///
    /// `start_hour` is absolute (offset from the start of the horizon), and
    /// must either lie within `[earliest_start_hour, latest_start_hour]` or be
    /// [`UNSCHEDULED_START_HOUR`], which draws no load at all; callers are
    /// expected to have clamped any other chromosome genes into the legal
    /// window before calling this.
    #[must_use]
    pub fn load_curve(&self, start_hour: u32, horizon_hours: u32) -> Vec<WattHours> {
        let mut curve = vec![WattHours::ZERO; horizon_hours as usize];
        if start_hour == UNSCHEDULED_START_HOUR {
            return curve;
        }
        let per_hour_wh = self.params.consumption_wh.0 / f64::from(self.params.duration_h);
        for offset in 0..self.params.duration_h {
            let hour = start_hour + offset;
            if let Some(slot) = curve.get_mut(hour as usize) {
                *slot = WattHours(per_hour_wh);
            }
        }
        curve
    }
}

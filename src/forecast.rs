use serde::{Deserialize, Serialize};

use crate::{
    error::{PlannerError, Result},
    quantity::{RatePerWh, WattHours},
};

/// The exogenous forecast vectors the optimizer schedules against.
///
/// Grounded on `fennec-cli/src/core/provider.rs`'s typed per-hour vector
/// style, with field names carried over from
/// `original_source/src/akkudoktoreos/prediction/*abc.py`.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct ForecastSet {
    pub pv_wh: Vec<WattHours>,
    pub load_wh: Vec<WattHours>,
    pub price_buy_per_wh: Vec<RatePerWh>,
    pub price_sell_per_wh: Vec<RatePerWh>,
}

impl ForecastSet {
    /// Number of hours covered, i.e. the planning horizon length.
    #[must_use]
    pub fn len(&self) -> usize {
        self.pv_wh.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pv_wh.is_empty()
    }

    /// All four vectors must be present and of equal, non-zero length.
    pub fn validate(&self) -> Result<()> {
        if self.pv_wh.is_empty() {
            return Err(PlannerError::InvalidInput("forecast horizon must be non-empty".to_owned()));
        }
        let horizon = self.pv_wh.len();
        for (name, len) in [
            ("load_wh", self.load_wh.len()),
            ("price_buy_per_wh", self.price_buy_per_wh.len()),
            ("price_sell_per_wh", self.price_sell_per_wh.len()),
        ] {
            if len != horizon {
                return Err(PlannerError::InvalidInput(format!(
                    "forecast vector {name} has length {len}, expected {horizon}"
                )));
            }
        }
        Ok(())
    }
}

use serde::{Deserialize, Serialize};

use crate::error::{PlannerError, Result};

/// Knobs controlling the genetic optimizer's search, independent of the
/// household/device model being optimized.
///
/// Grounded on `fennec-cli/src/core/solver.rs`'s `Solver` for the "tunable
/// numeric knobs as a flat config struct" shape; the individual fields are
/// `SPEC_FULL.md` §4.4's GA parameters.
#[derive(Clone, Copy, Debug, Deserialize, Serialize)]
pub struct GaConfig {
    pub population_size: usize,
    pub generations: u32,
    pub crossover_rate: f64,
    pub mutation_rate: f64,
    pub tournament_size: usize,
    pub elitism_count: usize,
    pub seed: u64,
    /// Probability that a newly drawn appliance start-hour gene (at
    /// initialisation or on mutation) is the unscheduled sentinel instead of
    /// a uniform in-window hour (§3/§4.4).
    #[serde(default = "default_appliance_unscheduled_rate")]
    pub appliance_unscheduled_rate: f64,
}

fn default_appliance_unscheduled_rate() -> f64 {
    0.1
}

impl Default for GaConfig {
    fn default() -> Self {
        Self {
            population_size: 100,
            generations: 200,
            crossover_rate: 0.8,
            mutation_rate: 0.05,
            tournament_size: 3,
            elitism_count: 2,
            seed: 0,
            appliance_unscheduled_rate: default_appliance_unscheduled_rate(),
        }
    }
}

impl GaConfig {
    pub fn validate(&self) -> Result<()> {
        if self.population_size < 2 {
            return Err(PlannerError::InvalidParameters(
                "population_size must be at least 2".to_owned(),
            ));
        }
        if self.generations == 0 {
            return Err(PlannerError::InvalidParameters("generations must be at least 1".to_owned()));
        }
        if !(0.0..=1.0).contains(&self.crossover_rate) {
            return Err(PlannerError::InvalidParameters("crossover_rate must lie in [0, 1]".to_owned()));
        }
        if !(0.0..=1.0).contains(&self.mutation_rate) {
            return Err(PlannerError::InvalidParameters("mutation_rate must lie in [0, 1]".to_owned()));
        }
        if self.tournament_size < 2 || self.tournament_size > self.population_size {
            return Err(PlannerError::InvalidParameters(
                "tournament_size must lie in [2, population_size]".to_owned(),
            ));
        }
        if self.elitism_count >= self.population_size {
            return Err(PlannerError::InvalidParameters(
                "elitism_count must be smaller than population_size".to_owned(),
            ));
        }
        if !(0.0..=1.0).contains(&self.appliance_unscheduled_rate) {
            return Err(PlannerError::InvalidParameters(
                "appliance_unscheduled_rate must lie in [0, 1]".to_owned(),
            ));
        }
        Ok(())
    }
}

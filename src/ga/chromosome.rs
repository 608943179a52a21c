use crate::{
    device::{ApplianceParameters, BatteryParameters, UNSCHEDULED_START_HOUR},
    quantity::WattHours,
    simulator::Plan,
};

/// The genetic representation of one candidate schedule: a per-hour charge
/// rate choice, a per-hour discharge permission, and a per-appliance start
/// hour. Decodes into a [`Plan`] for the simulator to replay.
///
/// Grounded on `fennec-cli/src/core/genetic.rs`'s `Dna` trait (`mutate`,
/// `crossover_with`); this crate keeps that naming but gives chromosomes the
/// richer internal structure `SPEC_FULL.md` §3/§4.4 specify instead of the
/// teacher's single opaque `D` type parameter.
#[derive(Clone, Debug)]
pub struct Chromosome {
    /// Index into the battery's `allowed_charge_rates`, one per hour.
    pub charge_rate_idx: Vec<u8>,
    /// Whether discharge is requested, one per hour. Ignored for hours where
    /// the battery has no discharge gene at all (`SPEC_FULL.md` §3).
    pub discharge_allowed: Vec<bool>,
    /// Chosen start hour per appliance, same order as the appliance list, or
    /// [`UNSCHEDULED_START_HOUR`] if this appliance run is not scheduled at
    /// all (§3/§4.4).
    pub appliance_start_hours: Vec<u32>,
}

impl Chromosome {
    /// A chromosome that never charges from the grid, never discharges, and
    /// starts every appliance at its earliest allowed hour. Used to seed a
    /// deterministic baseline individual into generation zero.
    #[must_use]
    pub fn baseline(horizon: usize, appliance_params: &[ApplianceParameters]) -> Self {
        Self {
            charge_rate_idx: vec![0; horizon],
            discharge_allowed: vec![false; horizon],
            appliance_start_hours: appliance_params.iter().map(|a| a.earliest_start_hour).collect(),
        }
    }

    /// Decodes this chromosome into a [`Plan`] the simulator can replay.
    #[must_use]
    pub fn decode(&self, battery_params: &BatteryParameters) -> Plan {
        let ac_charge_wh = self
            .charge_rate_idx
            .iter()
            .map(|&idx| {
                let rate = battery_params
                    .allowed_charge_rates
                    .get(idx as usize)
                    .copied()
                    .unwrap_or(0.0);
                battery_params.max_charge_power_w * rate
            })
            .collect();

        Plan {
            ac_charge_wh,
            discharge_allowed: self.discharge_allowed.clone(),
            appliance_start_hours: self.appliance_start_hours.clone(),
        }
    }

    /// Per-gene mutation: every gene independently has probability
    /// `mutation_rate` of being resampled (§4.4 "per-gene mutation"). A
    /// resampled appliance gene is drawn as the unscheduled sentinel with
    /// probability `unscheduled_rate`, and as a uniform in-window hour
    /// otherwise (§3/§4.4).
    pub fn mutate(
        &mut self,
        mutation_rate: f64,
        rng: &mut fastrand::Rng,
        battery_params: &BatteryParameters,
        appliance_params: &[ApplianceParameters],
        unscheduled_rate: f64,
    ) {
        let rate_count = battery_params.allowed_charge_rates.len().max(1) as u8;
        for gene in &mut self.charge_rate_idx {
            if rng.f64() < mutation_rate {
                *gene = rng.u8(0..rate_count);
            }
        }
        if battery_params.has_discharge_gene() {
            for gene in &mut self.discharge_allowed {
                if rng.f64() < mutation_rate {
                    *gene = rng.bool();
                }
            }
        }
        for (gene, params) in self.appliance_start_hours.iter_mut().zip(appliance_params) {
            if rng.f64() < mutation_rate {
                *gene = if rng.f64() < unscheduled_rate {
                    UNSCHEDULED_START_HOUR
                } else {
                    rng.u32(params.earliest_start_hour..=params.latest_start_hour)
                };
            }
        }
    }

    /// Uniform crossover: each charge-rate and discharge gene is
    /// independently taken from `self` or `other` with equal probability
    /// (§4.4 "uniform crossover"). Appliance start-hour genes are the
    /// exception: when both parents schedule the appliance, the child's
    /// start hour is the arithmetic midpoint of the two, rounded to the
    /// nearest hour, rather than a coin-flip swap (§4.4). If either parent
    /// leaves the appliance unscheduled, the gene still falls back to a
    /// coin-flip swap, since there is no hour to average against.
    #[must_use]
    pub fn crossover_with(&self, other: &Self, rng: &mut fastrand::Rng) -> Self {
        let charge_rate_idx = self
            .charge_rate_idx
            .iter()
            .zip(&other.charge_rate_idx)
            .map(|(&a, &b)| if rng.bool() { a } else { b })
            .collect();
        let discharge_allowed = self
            .discharge_allowed
            .iter()
            .zip(&other.discharge_allowed)
            .map(|(&a, &b)| if rng.bool() { a } else { b })
            .collect();
        let appliance_start_hours = self
            .appliance_start_hours
            .iter()
            .zip(&other.appliance_start_hours)
            .map(|(&a, &b)| {
                if a == UNSCHEDULED_START_HOUR || b == UNSCHEDULED_START_HOUR {
                    if rng.bool() { a } else { b }
                } else {
                    ((f64::from(a) + f64::from(b)) / 2.0).round() as u32
                }
            })
            .collect();

        Self { charge_rate_idx, discharge_allowed, appliance_start_hours }
    }
}

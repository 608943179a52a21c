use crate::{
    device::{ApplianceParameters, BatteryParameters, UNSCHEDULED_START_HOUR},
    forecast::ForecastSet,
    ga::chromosome::Chromosome,
    quantity::WattHours,
};

/// Builds generation zero.
///
/// Grounded on `fennec-cli/src/core/genetic.rs`'s `Optimizer::new` (initial
/// population supplied as DNA plus evaluated loss), generalised with the
/// random + PV-biased seeding `SPEC_FULL.md` §4.4 "initialisation" calls for.
pub fn initialise(
    population_size: usize,
    horizon: usize,
    battery_params: &BatteryParameters,
    appliance_params: &[ApplianceParameters],
    forecast: &ForecastSet,
    unscheduled_rate: f64,
    rng: &mut fastrand::Rng,
) -> Vec<Chromosome> {
    let rate_count = battery_params.allowed_charge_rates.len().max(1) as u8;
    let pv_biased_count = ((population_size as f64) * 0.05).round() as usize;

    (0..population_size)
        .map(|index| {
            if index == 0 {
                return Chromosome::baseline(horizon, appliance_params);
            }
            if index <= pv_biased_count {
                return pv_biased_chromosome(
                    horizon,
                    battery_params,
                    appliance_params,
                    forecast,
                    unscheduled_rate,
                    rng,
                );
            }
            random_chromosome(horizon, rate_count, battery_params, appliance_params, unscheduled_rate, rng)
        })
        .collect()
}

fn draw_appliance_start_hour(params: &ApplianceParameters, unscheduled_rate: f64, rng: &mut fastrand::Rng) -> u32 {
    if rng.f64() < unscheduled_rate {
        UNSCHEDULED_START_HOUR
    } else {
        rng.u32(params.earliest_start_hour..=params.latest_start_hour)
    }
}

fn random_chromosome(
    horizon: usize,
    rate_count: u8,
    battery_params: &BatteryParameters,
    appliance_params: &[ApplianceParameters],
    unscheduled_rate: f64,
    rng: &mut fastrand::Rng,
) -> Chromosome {
    let charge_rate_idx = (0..horizon).map(|_| rng.u8(0..rate_count)).collect();
    let discharge_allowed = (0..horizon)
        .map(|_| battery_params.has_discharge_gene() && rng.bool())
        .collect();
    let appliance_start_hours = appliance_params
        .iter()
        .map(|params| draw_appliance_start_hour(params, unscheduled_rate, rng))
        .collect();

    Chromosome { charge_rate_idx, discharge_allowed, appliance_start_hours }
}

/// An individual biased to charge during forecasted PV-surplus hours and
/// discharge otherwise — a reasonable hand-crafted prior, not a guaranteed
/// improvement, so only a small fraction of generation zero uses it.
fn pv_biased_chromosome(
    horizon: usize,
    battery_params: &BatteryParameters,
    appliance_params: &[ApplianceParameters],
    forecast: &ForecastSet,
    unscheduled_rate: f64,
    rng: &mut fastrand::Rng,
) -> Chromosome {
    let top_rate_idx = (battery_params.allowed_charge_rates.len().max(1) - 1) as u8;
    let charge_rate_idx = (0..horizon)
        .map(|hour| {
            let pv_surplus = forecast.pv_wh.get(hour).copied().unwrap_or(WattHours::ZERO)
                > forecast.load_wh.get(hour).copied().unwrap_or(WattHours::ZERO);
            if pv_surplus { top_rate_idx } else { 0 }
        })
        .collect();
    let discharge_allowed = (0..horizon)
        .map(|hour| {
            battery_params.has_discharge_gene()
                && forecast.pv_wh.get(hour).copied().unwrap_or(WattHours::ZERO)
                    <= forecast.load_wh.get(hour).copied().unwrap_or(WattHours::ZERO)
        })
        .collect();
    let appliance_start_hours = appliance_params
        .iter()
        .map(|params| draw_appliance_start_hour(params, unscheduled_rate, rng))
        .collect();

    Chromosome { charge_rate_idx, discharge_allowed, appliance_start_hours }
}

/// Selects one parent index via tournament selection: `k` contestants are
/// drawn uniformly at random (with replacement) and the one with the lowest
/// loss wins (§4.4 "tournament selection"). Ties keep the first contestant
/// drawn, giving a stable, reproducible result for a fixed RNG stream.
#[must_use]
pub fn tournament_select(losses: &[f64], tournament_size: usize, rng: &mut fastrand::Rng) -> usize {
    let mut best_index = rng.usize(0..losses.len());
    let mut best_loss = losses[best_index];
    for _ in 1..tournament_size {
        let candidate_index = rng.usize(0..losses.len());
        if losses[candidate_index] < best_loss {
            best_index = candidate_index;
            best_loss = losses[candidate_index];
        }
    }
    best_index
}

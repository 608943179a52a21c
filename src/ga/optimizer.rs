use std::time::Instant;

use rayon::prelude::*;
use tracing::{debug, instrument};

use crate::{
    device::{ApplianceParameters, BatteryParameters, InverterParameters},
    fitness::{FitnessBreakdown, FitnessEvaluator, Interpolator, NoopInterpolator, PenaltyWeights},
    forecast::ForecastSet,
    ga::{
        chromosome::Chromosome,
        params::GaConfig,
        population::{initialise, tournament_select},
    },
    trace::Totals,
};

/// Orders two candidates by the tie-break chain `SPEC_FULL.md` §4.4 names for
/// best-selection: lower fitness first, then lower total grid draw, then
/// lower total AC-charge energy, then lexicographically smaller chromosome
/// (comparing charge-rate genes, then discharge genes, then appliance start
/// hours in turn).
fn candidate_cmp(
    fitness_a: &FitnessBreakdown,
    totals_a: &Totals,
    chromosome_a: &Chromosome,
    fitness_b: &FitnessBreakdown,
    totals_b: &Totals,
    chromosome_b: &Chromosome,
) -> std::cmp::Ordering {
    fitness_a
        .total()
        .0
        .total_cmp(&fitness_b.total().0)
        .then_with(|| totals_a.grid_import_wh.0.total_cmp(&totals_b.grid_import_wh.0))
        .then_with(|| totals_a.grid_charge_dc_wh.0.total_cmp(&totals_b.grid_charge_dc_wh.0))
        .then_with(|| chromosome_a.charge_rate_idx.cmp(&chromosome_b.charge_rate_idx))
        .then_with(|| chromosome_a.discharge_allowed.cmp(&chromosome_b.discharge_allowed))
        .then_with(|| chromosome_a.appliance_start_hours.cmp(&chromosome_b.appliance_start_hours))
}

/// Why a run stopped: either it exhausted its generation budget, or it was
/// cancelled at a generation boundary (§5 "cancellation is checked only at
/// generation boundaries, never mid-generation").
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum StopReason {
    GenerationsExhausted,
    Cancelled,
    DeadlineExceeded,
}

/// The best chromosome found, its fitness breakdown, and how the run ended.
pub struct RunOutcome {
    pub best_chromosome: Chromosome,
    pub best_breakdown: FitnessBreakdown,
    pub generations_run: u32,
    pub stop_reason: StopReason,
}

/// Drives the generational loop: initialise, evaluate the whole population in
/// parallel, select parents via tournament, recombine and mutate, replace
/// with elitism, repeat until the generation budget or a cancellation signal
/// stops it (`SPEC_FULL.md` §4.4 and §5).
///
/// Grounded on `fennec-cli/src/core/genetic.rs`'s `Optimizer::step` for the
/// "RNG lives on the driver, a bounded population is carried across steps"
/// discipline, generalised from its mutate-only hill-climb into a full
/// tournament-selection + uniform-crossover + elitist-replacement GA, with
/// per-generation fitness evaluation parallelised across `rayon` workers the
/// way `monistowl-gat`'s engine fans work out across its population.
pub struct GeneticOptimizer<'a, I: Interpolator + Sync = NoopInterpolator> {
    battery_params: &'a BatteryParameters,
    inverter_params: &'a InverterParameters,
    appliance_params: &'a [ApplianceParameters],
    forecast: &'a ForecastSet,
    config: GaConfig,
    weights: PenaltyWeights,
    interpolator: I,
}

impl<'a> GeneticOptimizer<'a, NoopInterpolator> {
    #[must_use]
    pub fn new(
        battery_params: &'a BatteryParameters,
        inverter_params: &'a InverterParameters,
        appliance_params: &'a [ApplianceParameters],
        forecast: &'a ForecastSet,
        config: GaConfig,
        weights: PenaltyWeights,
    ) -> Self {
        Self {
            battery_params,
            inverter_params,
            appliance_params,
            forecast,
            config,
            weights,
            interpolator: NoopInterpolator,
        }
    }
}

impl<'a, I: Interpolator + Sync + Clone> GeneticOptimizer<'a, I> {
    fn evaluator(&self) -> FitnessEvaluator<'a, I> {
        FitnessEvaluator::with_interpolator(
            self.battery_params,
            self.inverter_params,
            self.appliance_params,
            self.forecast,
            self.weights,
            self.interpolator.clone(),
        )
    }

    /// Runs the full generational loop.
    ///
    /// `is_cancelled` is polled once per generation boundary; `deadline`, if
    /// set, is also only checked at a boundary, never mid-generation, so a
    /// generation already in flight always finishes evaluating (§5).
    #[instrument(skip_all, fields(population_size = self.config.population_size, generations = self.config.generations))]
    pub fn run(&self, is_cancelled: &dyn Fn() -> bool, deadline: Option<Instant>) -> RunOutcome {
        let horizon = self.forecast.len();
        let mut rng = fastrand::Rng::with_seed(self.config.seed);
        let evaluator = self.evaluator();

        let mut population = initialise(
            self.config.population_size,
            horizon,
            self.battery_params,
            self.appliance_params,
            self.forecast,
            self.config.appliance_unscheduled_rate,
            &mut rng,
        );

        let mut evaluations: Vec<(FitnessBreakdown, Totals)> = population
            .par_iter()
            .map(|chromosome| {
                let (breakdown, trace) = evaluator.evaluate_with_trace(&chromosome.decode(self.battery_params));
                (breakdown, trace.totals)
            })
            .collect();

        let mut stop_reason = StopReason::GenerationsExhausted;
        let mut generations_run = 0;

        for generation in 0..self.config.generations {
            generations_run = generation;

            if is_cancelled() {
                stop_reason = StopReason::Cancelled;
                break;
            }
            if deadline.is_some_and(|deadline| Instant::now() >= deadline) {
                stop_reason = StopReason::DeadlineExceeded;
                break;
            }

            let losses: Vec<f64> = evaluations.iter().map(|(breakdown, _)| breakdown.total().0).collect();

            let mut ranked: Vec<usize> = (0..population.len()).collect();
            ranked.sort_by(|&a, &b| losses[a].total_cmp(&losses[b]));

            let mut next_population = Vec::with_capacity(population.len());
            for &elite_index in ranked.iter().take(self.config.elitism_count) {
                next_population.push(population[elite_index].clone());
            }

            while next_population.len() < population.len() {
                let parent_1 = &population[tournament_select(&losses, self.config.tournament_size, &mut rng)];
                let parent_2 = &population[tournament_select(&losses, self.config.tournament_size, &mut rng)];

                let mut child = if rng.f64() < self.config.crossover_rate {
                    parent_1.crossover_with(parent_2, &mut rng)
                } else {
                    parent_1.clone()
                };
                child.mutate(
                    self.config.mutation_rate,
                    &mut rng,
                    self.battery_params,
                    self.appliance_params,
                    self.config.appliance_unscheduled_rate,
                );
                next_population.push(child);
            }

            evaluations = next_population
                .par_iter()
                .map(|chromosome| {
                    let (breakdown, trace) = evaluator.evaluate_with_trace(&chromosome.decode(self.battery_params));
                    (breakdown, trace.totals)
                })
                .collect();
            population = next_population;

            debug!(generation, best_loss = %evaluations.iter().map(|(b, _)| b.total().0).fold(f64::INFINITY, f64::min), "generation complete");
            generations_run = generation + 1;
        }

        let best_index = (0..population.len())
            .min_by(|&a, &b| {
                let (fitness_a, totals_a) = &evaluations[a];
                let (fitness_b, totals_b) = &evaluations[b];
                candidate_cmp(fitness_a, totals_a, &population[a], fitness_b, totals_b, &population[b])
            })
            .expect("population is never empty");
        let best_breakdown = evaluations[best_index].0;

        RunOutcome {
            best_chromosome: population[best_index].clone(),
            best_breakdown,
            generations_run,
            stop_reason,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{device::DeviceKind, quantity::{Percent, RatePerWh, WattHours}};

    fn battery_params() -> BatteryParameters {
        BatteryParameters {
            device_id: "battery-1".to_owned(),
            capacity_wh: WattHours(10_000.0),
            soc_min_pct: Percent(10.0),
            soc_max_pct: Percent(90.0),
            soc_initial_pct: Percent(50.0),
            charge_efficiency: 0.95,
            discharge_efficiency: 0.95,
            max_charge_power_w: WattHours(3_000.0),
            max_discharge_power_w: WattHours(3_000.0),
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
            price_buy_per_wh: vec![RatePerWh(0.0003); horizon],
            price_sell_per_wh: vec![RatePerWh(0.0001); horizon],
        }
    }

    #[test]
    fn run_completes_within_generation_budget_when_never_cancelled() {
        let battery_params = battery_params();
        let inverter_params = inverter_params();
        let appliances: Vec<ApplianceParameters> = Vec::new();
        let forecast = forecast(12);
        let config = GaConfig {
            population_size: 8,
            generations: 5,
            crossover_rate: 0.8,
            mutation_rate: 0.1,
            tournament_size: 3,
            elitism_count: 1,
            seed: 42,
            appliance_unscheduled_rate: 0.1,
        };
        let optimizer = GeneticOptimizer::new(
            &battery_params,
            &inverter_params,
            &appliances,
            &forecast,
            config,
            PenaltyWeights::default(),
        );

        let outcome = optimizer.run(&|| false, None);
        assert_eq!(outcome.stop_reason, StopReason::GenerationsExhausted);
        assert_eq!(outcome.generations_run, 5);
    }

    #[test]
    fn run_stops_immediately_when_cancelled_before_first_generation() {
        let battery_params = battery_params();
        let inverter_params = inverter_params();
        let appliances: Vec<ApplianceParameters> = Vec::new();
        let forecast = forecast(12);
        let config = GaConfig { population_size: 6, generations: 10, ..GaConfig::default() };
        let optimizer = GeneticOptimizer::new(
            &battery_params,
            &inverter_params,
            &appliances,
            &forecast,
            config,
            PenaltyWeights::default(),
        );

        let outcome = optimizer.run(&|| true, None);
        assert_eq!(outcome.stop_reason, StopReason::Cancelled);
        assert_eq!(outcome.generations_run, 0);
    }

    #[test]
    fn same_seed_reproduces_the_same_best_loss() {
        let battery_params = battery_params();
        let inverter_params = inverter_params();
        let appliances: Vec<ApplianceParameters> = Vec::new();
        let forecast = forecast(12);
        let config = GaConfig { population_size: 10, generations: 6, seed: 99, ..GaConfig::default() };

        let run = || {
            GeneticOptimizer::new(
                &battery_params,
                &inverter_params,
                &appliances,
                &forecast,
                config,
                PenaltyWeights::default(),
            )
            .run(&|| false, None)
            .best_breakdown
            .total()
            .0
        };

        assert_eq!(run(), run());
    }
}

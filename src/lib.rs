//! Genetic-algorithm scheduler for PV, battery and appliance dispatch under
//! forecast price and load.
//!
//! The public entry point is [`optimize`]. Everything else is exposed so the
//! CLI binary (and tests) can assemble parameters, but the crate's contract
//! is that single function.

pub mod config;
pub mod device;
pub mod error;
pub mod fitness;
pub mod forecast;
pub mod ga;
pub mod quantity;
pub mod response;
pub mod simulator;
pub mod trace;

use std::time::Instant;

use tracing::instrument;

use crate::{
    config::OptimizationParameters,
    error::Result,
    fitness::PenaltyWeights,
    ga::GeneticOptimizer,
    response::{OptimizeResponse, Status},
    simulator::Simulator,
};

/// Runs the genetic optimizer to completion (or until cancelled) and returns
/// the best schedule found.
///
/// `start_hour` is the absolute hour-of-day the forecast horizon begins at;
/// it is accepted for interface symmetry with the on-disk forecast format
/// (`SPEC_FULL.md` §6) but the core never consults a calendar (§9).
/// `generations` and `seed`, if given, override the corresponding fields of
/// `params.ga`. `is_cancelled` is polled at each generation boundary;
/// passing `|| false` runs the optimizer to completion unconditionally.
#[instrument(skip(params, is_cancelled), fields(start_hour, generations = generations.unwrap_or(params.ga.generations)))]
pub fn optimize(
    params: &OptimizationParameters,
    start_hour: u32,
    generations: Option<u32>,
    seed: Option<u64>,
    is_cancelled: &dyn Fn() -> bool,
) -> Result<OptimizeResponse> {
    run(params, start_hour, generations, seed, is_cancelled, None)
}

/// Same as [`optimize`], but with a wall-clock deadline checked alongside
/// cancellation at each generation boundary (§5).
pub fn optimize_with_deadline(
    params: &OptimizationParameters,
    start_hour: u32,
    generations: Option<u32>,
    seed: Option<u64>,
    is_cancelled: &dyn Fn() -> bool,
    deadline: Instant,
) -> Result<OptimizeResponse> {
    run(params, start_hour, generations, seed, is_cancelled, Some(deadline))
}

fn run(
    params: &OptimizationParameters,
    start_hour: u32,
    generations: Option<u32>,
    seed: Option<u64>,
    is_cancelled: &dyn Fn() -> bool,
    deadline: Option<Instant>,
) -> Result<OptimizeResponse> {
    let _ = start_hour;
    params.validate()?;

    let mut ga_config = params.ga;
    if let Some(generations) = generations {
        ga_config.generations = generations;
    }
    if let Some(seed) = seed {
        ga_config.seed = seed;
    }
    ga_config.validate()?;

    let weights = PenaltyWeights::from(params.penalty_weights);
    let optimizer = GeneticOptimizer::new(
        &params.battery,
        &params.inverter,
        &params.appliances,
        &params.forecast,
        ga_config,
        weights,
    );

    let outcome = optimizer.run(is_cancelled, deadline);

    let simulator = Simulator::new(&params.battery, &params.inverter, &params.appliances, &params.forecast);
    let plan = outcome.best_chromosome.decode(&params.battery);
    let trace = simulator.simulate(&plan);

    Ok(OptimizeResponse::new(
        plan,
        trace,
        outcome.best_breakdown,
        Status::from(outcome.stop_reason),
        outcome.generations_run,
    ))
}

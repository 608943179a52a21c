mod chromosome;
mod optimizer;
mod params;
mod population;

pub use self::{
    chromosome::Chromosome,
    optimizer::{GeneticOptimizer, RunOutcome, StopReason},
    params::GaConfig,
};

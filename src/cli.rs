use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Genetic-algorithm scheduler for PV, battery and appliance dispatch.
///
/// Grounded on `fennec-cli/src/cli.rs`'s clap-derive flattened subcommand
/// style, trimmed to the one subcommand this crate's core needs.
#[derive(Parser, Debug)]
#[command(name = "wattplan", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Runs the genetic optimizer once and prints the resulting schedule.
    Plan(PlanArgs),
}

#[derive(Parser, Debug)]
pub struct PlanArgs {
    /// Path to a TOML file with device parameters, the forecast and GA config.
    #[arg(long)]
    pub params: PathBuf,

    /// Absolute hour-of-day the forecast horizon starts at.
    #[arg(long, default_value_t = 0)]
    pub start_hour: u32,

    /// Overrides `ga.generations` from the parameters file.
    #[arg(long)]
    pub generations: Option<u32>,

    /// Overrides `ga.seed` from the parameters file.
    #[arg(long)]
    pub seed: Option<u64>,

    /// Writes the full JSON response to this path instead of only printing
    /// the rendered table.
    #[arg(long)]
    pub out: Option<PathBuf>,
}

mod cli;
mod render;

use std::fs;

use anyhow::{Context, Result};
use clap::{Parser, crate_version};
use tracing::{info, metadata::LevelFilter};
use tracing_subscriber::{EnvFilter, Layer, layer::SubscriberExt, util::SubscriberInitExt};
use wattplan::config::OptimizationParameters;

use crate::cli::{Cli, Command, PlanArgs};

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().without_time().compact().with_filter(
            EnvFilter::builder().with_default_directive(LevelFilter::INFO.into()).from_env()?,
        ))
        .init();

    info!(version = crate_version!(), "starting…");
    let cli = Cli::parse();
    match cli.command {
        Command::Plan(args) => plan(args),
    }
}

fn plan(args: PlanArgs) -> Result<()> {
    let raw = fs::read_to_string(&args.params)
        .with_context(|| format!("reading parameters file {}", args.params.display()))?;
    let params: OptimizationParameters =
        toml::from_str(&raw).with_context(|| format!("parsing {}", args.params.display()))?;

    let response = wattplan::optimize(&params, args.start_hour, args.generations, args.seed, &|| false)
        .context("optimization failed")?;

    if let Some(out_path) = &args.out {
        let json = serde_json::to_string_pretty(&response).context("serialising response")?;
        fs::write(out_path, json)
            .with_context(|| format!("writing response to {}", out_path.display()))?;
    }

    println!("{}", render::render_schedule(&response));
    Ok(())
}

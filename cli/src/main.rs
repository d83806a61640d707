//! Mobility Simulator CLI
//!
//! Runs trials or one-parameter sweeps from a JSON config plus
//! command-line overrides, and writes the aggregate as JSON or a table.

mod logging;
mod output;

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use mobility_simulator_core_rs::{
    InstabilityPolicy, NeighborhoodPolicy, Orchestrator, SimConfig, SkillFormation,
};

/// Intergenerational mobility simulator
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(name = "mobility-sim")]
pub struct MobilityCli {
    /// JSON config file (keys are parameter names, e.g. "TAX_RATE")
    #[arg(short, long, global = true, env = "MOBILITY_CONFIG")]
    pub config: Option<PathBuf>,

    /// Override a parameter, e.g. --set TAX_RATE=0.3 (repeatable)
    #[arg(long = "set", value_name = "NAME=VALUE", value_parser = parse_assignment, global = true)]
    pub overrides: Vec<(String, f64)>,

    /// Neighborhood policy (static, sorted-pairs, full-sort)
    #[arg(long, global = true)]
    pub policy: Option<String>,

    /// Skill formation form (product, cobb-douglas)
    #[arg(long, global = true)]
    pub skill_formation: Option<String>,

    /// Reaction to non-finite values (continue, abort-trial, abort-run)
    #[arg(long, global = true)]
    pub on_instability: Option<String>,

    /// RNG seed
    #[arg(long, global = true)]
    pub seed: Option<u64>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "table", global = true)]
    pub format: OutputFormat,

    /// Write output to a file instead of stdout
    #[arg(short, long, global = true)]
    pub output: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: MobilityCommand,
}

#[derive(Subcommand, Debug, Clone)]
pub enum MobilityCommand {
    /// Run trials with the configured parameters
    Run(RunArgs),

    /// Run trials at each value of one parameter
    Sweep(SweepArgs),
}

#[derive(Args, Debug, Clone)]
pub struct RunArgs {
    /// Number of trials
    #[arg(short = 'n', long, default_value_t = 10)]
    pub trials: usize,

    /// Include every trial's full series in JSON output
    #[arg(long)]
    pub keep_trials: bool,
}

#[derive(Args, Debug, Clone)]
pub struct SweepArgs {
    /// Parameter to sweep, e.g. TAX_RATE
    pub param: String,

    /// Comma-separated values, e.g. 0.1,0.2,0.3
    #[arg(value_delimiter = ',', num_args = 1.., required = true)]
    pub values: Vec<f64>,

    /// Trials per value
    #[arg(short = 'n', long, default_value_t = 10)]
    pub trials: usize,

    /// Include every trial's full series in JSON output
    #[arg(long)]
    pub keep_trials: bool,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Json,
    Table,
}

fn parse_assignment(s: &str) -> std::result::Result<(String, f64), String> {
    let (name, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected NAME=VALUE, got '{}'", s))?;
    let value: f64 = value
        .trim()
        .parse()
        .map_err(|e| format!("invalid value for {}: {}", name, e))?;
    Ok((name.trim().to_string(), value))
}

fn build_config(cli: &MobilityCli) -> Result<SimConfig> {
    let mut config = match &cli.config {
        Some(path) => {
            let json = fs::read_to_string(path)
                .with_context(|| format!("failed to read config {}", path.display()))?;
            SimConfig::from_json_str(&json)
                .with_context(|| format!("invalid config {}", path.display()))?
        }
        None => SimConfig::default(),
    };

    if let Some(seed) = cli.seed {
        config.rng_seed = seed;
    }
    if let Some(policy) = &cli.policy {
        config.set_neighborhood_policy(policy.parse::<NeighborhoodPolicy>()?);
    }
    if let Some(form) = &cli.skill_formation {
        config.set_skill_formation(form.parse::<SkillFormation>()?);
    }
    if let Some(policy) = &cli.on_instability {
        config.set_instability_policy(policy.parse::<InstabilityPolicy>()?);
    }
    for (name, value) in &cli.overrides {
        config
            .set(name, *value)
            .with_context(|| format!("--set {}={}", name, value))?;
    }
    Ok(config)
}

fn emit(cli: &MobilityCli, text: String) -> Result<()> {
    match &cli.output {
        Some(path) => fs::write(path, text)
            .with_context(|| format!("failed to write {}", path.display()))?,
        None => println!("{}", text),
    }
    Ok(())
}

fn main() -> Result<()> {
    let cli = MobilityCli::parse();
    logging::init_tracing(cli.verbose);

    let config = build_config(&cli)?;
    let mut orchestrator = Orchestrator::new(config)?;
    tracing::debug!(fingerprint = orchestrator.fingerprint(), "config loaded");

    let text = match &cli.command {
        MobilityCommand::Run(args) => {
            let result = orchestrator.run(args.trials, args.keep_trials)?;
            match cli.format {
                OutputFormat::Json => serde_json::to_string_pretty(&result)?,
                OutputFormat::Table => output::aggregate_table(&result),
            }
        }
        MobilityCommand::Sweep(args) => {
            let sweep =
                orchestrator.run_sweep(&args.param, &args.values, args.trials, args.keep_trials)?;
            match cli.format {
                OutputFormat::Json => serde_json::to_string_pretty(&sweep)?,
                OutputFormat::Table => output::sweep_table(&sweep),
            }
        }
    };

    emit(&cli, text)
}

use anyhow::{Context, Result};
use bigroad_predictor::{EngineConfig, MajorityStrictness, PredictorEngine, Profile};
use bigroad_types::{format_history, parse_history_lenient};
use clap::{Args as ClapArgs, Parser, Subcommand};
use std::io;
use tracing::info;

mod session;

use session::{render, Session};

fn init_tracing(verbose: bool) -> Result<()> {
    let level = if verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(io::stderr)
        .try_init()
        .map_err(|err| anyhow::anyhow!("failed to install tracing subscriber: {err}"))
}

#[derive(Parser, Debug)]
#[command(name = "bigroad", author, version, about = "Baccarat next-outcome predictor", long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,

    #[command(flatten)]
    engine: EngineArgs,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Predict the hand after HISTORY (e.g. "BPBBT"; anything other than B/P/T is ignored).
    Predict { history: String },
    /// Read hands from stdin, one or more per line, and predict after each line.
    ///
    /// `reset` clears the shoe, `stats` prints accuracy, `quit` exits.
    Session,
}

#[derive(ClapArgs, Debug)]
struct EngineArgs {
    /// Detector set: cascade or consensus.
    #[arg(long, global = true, default_value = "cascade")]
    profile: String,

    /// Seed for the random fallbacks (drawn from entropy when omitted).
    #[arg(long, global = true)]
    seed: Option<u64>,

    /// Print JSON instead of text.
    #[arg(long, global = true, default_value_t = false)]
    json: bool,

    #[arg(long, global = true)]
    prediction_capacity: Option<usize>,

    #[arg(long, global = true)]
    correctness_capacity: Option<usize>,

    /// Accept 4 of 7 (or 3 of 5) when confirming a majority bias.
    #[arg(long, global = true, default_value_t = false)]
    loose_majority: bool,

    /// Log every decision to stderr.
    #[arg(short, long, global = true, default_value_t = false)]
    verbose: bool,
}

fn build_config(args: &Args) -> Result<EngineConfig> {
    let defaults = EngineConfig::default();
    let engine = &args.engine;
    let profile: Profile = engine.profile.parse().context("invalid --profile")?;
    let config = EngineConfig {
        profile,
        prediction_capacity: engine
            .prediction_capacity
            .unwrap_or(defaults.prediction_capacity),
        correctness_capacity: engine
            .correctness_capacity
            .unwrap_or(defaults.correctness_capacity),
        majority: if engine.loose_majority {
            MajorityStrictness::Loose
        } else {
            MajorityStrictness::Strict
        },
        seed: engine.seed.or(defaults.seed),
        ..defaults
    };
    config.validate().context("invalid engine configuration")?;
    Ok(config)
}

fn main() -> Result<()> {
    // Parse args
    let args = Args::parse();

    // Create logger
    init_tracing(args.engine.verbose)?;

    let config = build_config(&args)?;
    let mut engine: PredictorEngine =
        PredictorEngine::with_config(config).context("failed to create predictor")?;
    info!(
        profile = %engine.config().profile,
        seed = engine.seed(),
        "predictor ready"
    );

    match &args.command {
        Command::Predict { history } => {
            let history = parse_history_lenient(history);
            info!(hands = history.len(), history = %format_history(&history), "predicting");
            let prediction = engine.predict(&history, None);
            if args.engine.json {
                println!(
                    "{}",
                    serde_json::to_string(&prediction).context("failed to encode prediction")?
                );
            } else {
                println!("{}", render(&prediction));
            }
        }
        Command::Session => {
            let stdin = io::stdin();
            let mut stdout = io::stdout();
            Session::new(engine, args.engine.json).run(stdin.lock(), &mut stdout)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_engine_flags() {
        let args = Args::parse_from([
            "bigroad",
            "predict",
            "BPBBT",
            "--profile",
            "consensus",
            "--seed",
            "7",
            "--loose-majority",
            "--prediction-capacity",
            "10",
        ]);
        let config = build_config(&args).expect("config should parse");
        assert_eq!(config.profile, Profile::Consensus);
        assert_eq!(config.seed, Some(7));
        assert_eq!(config.majority, MajorityStrictness::Loose);
        assert_eq!(config.prediction_capacity, 10);
        assert_eq!(config.correctness_capacity, 20);
        assert!(matches!(args.command, Command::Predict { ref history } if history == "BPBBT"));
    }

    #[test]
    fn defaults_match_engine_defaults() {
        let args = Args::parse_from(["bigroad", "session"]);
        let config = build_config(&args).expect("config should parse");
        assert_eq!(config, EngineConfig::default());
        assert!(!args.engine.json);
    }

    #[test]
    fn rejects_unknown_profile() {
        let args = Args::parse_from(["bigroad", "session", "--profile", "ensemble"]);
        let err = build_config(&args).unwrap_err();
        assert!(format!("{err:#}").contains("ensemble"), "unexpected error: {err:#}");
    }

    #[test]
    fn rejects_zero_capacity() {
        let args = Args::parse_from(["bigroad", "predict", "B", "--correctness-capacity", "0"]);
        let err = build_config(&args).unwrap_err();
        assert!(
            format!("{err:#}").contains("correctness_capacity"),
            "unexpected error: {err:#}"
        );
    }
}

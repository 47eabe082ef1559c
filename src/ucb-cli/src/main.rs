//! ucb: drive a UCB1 bandit policy kept in a JSON state file.
//!
//! Each invocation loads the state, performs one operation, and writes the
//! state back when it changed.

mod store;

use std::path::PathBuf;

use anyhow::bail;
use clap::{Parser, Subcommand};
use serde_json::{json, Value};
use tracing::{info, warn};
use ucb_core::config::AppConfig;
use ucb_policy::{BanditPolicy, Simulation};

#[derive(Parser, Debug)]
#[command(name = "ucb")]
#[command(about = "UCB1 multi-armed bandit: select arms, record rewards, persist state")]
#[command(version)]
struct Cli {
    /// State file path (overrides config)
    #[arg(long, global = true)]
    state: Option<PathBuf>,

    /// Emit logs as JSON (overrides config)
    #[arg(long, global = true, default_value_t = false)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Create a fresh state file
    Init {
        /// Number of arms (default from config)
        #[arg(short, long)]
        arms: Option<usize>,

        /// Overwrite an existing state file
        #[arg(long, default_value_t = false)]
        force: bool,
    },

    /// Print the index of the arm to play next
    Select,

    /// Record an observed reward for an arm
    Reward {
        /// Arm index
        #[arg(short, long, allow_hyphen_values = true)]
        arm: String,

        /// Observed reward
        #[arg(short, long, allow_hyphen_values = true)]
        value: String,
    },

    /// Print the stored state and current UCB scores
    Show,

    /// Simulate Bernoulli arms with the given reward probabilities
    Simulate {
        /// Comma-separated reward probabilities, one per arm
        #[arg(short, long, value_delimiter = ',', required = true)]
        probs: Vec<f64>,

        /// Number of rounds (default from config)
        #[arg(short, long)]
        rounds: Option<u64>,

        /// RNG seed (default from config, else random)
        #[arg(long)]
        seed: Option<u64>,

        /// Write the final policy state to the state file
        #[arg(long, default_value_t = false)]
        save: bool,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let (config, config_error) = match AppConfig::load() {
        Ok(config) => (config, None),
        Err(e) => (AppConfig::default(), Some(e)),
    };

    init_tracing(cli.json_logs || config.log.json);

    if let Some(e) = config_error {
        warn!(error = %e, "Failed to load config, using defaults");
    }

    run(cli, config)
}

fn init_tracing(json: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "ucb=info,ucb_policy=info".into());
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn run(cli: Cli, config: AppConfig) -> anyhow::Result<()> {
    let state_path = cli
        .state
        .unwrap_or_else(|| PathBuf::from(&config.state.path));

    match cli.command {
        Commands::Init { arms, force } => {
            if state_path.exists() && !force {
                bail!(
                    "state file {} already exists (use --force to overwrite)",
                    state_path.display()
                );
            }
            let arms = arms.unwrap_or(config.policy.default_arm_count);
            let policy = BanditPolicy::new(arms)?;
            store::save(&state_path, &policy.serialize())?;
            print_json(&serde_json::to_value(policy.serialize())?)?;
        }

        Commands::Select => {
            let policy = store::load(&state_path)?;
            let arm = policy.select();
            info!(arm, "Selected arm");
            println!("{arm}");
        }

        Commands::Reward { arm, value } => {
            let mut policy = store::load(&state_path)?;
            policy.reward_value(Some(&parse_arg(&arm)), Some(&parse_arg(&value)))?;
            store::save(&state_path, &policy.serialize())?;
            print_json(&serde_json::to_value(policy.serialize())?)?;
        }

        Commands::Show => {
            let policy = store::load(&state_path)?;
            print_json(&json!({
                "state": policy.serialize(),
                "scores": policy.scores(),
            }))?;
        }

        Commands::Simulate {
            probs,
            rounds,
            seed,
            save,
        } => {
            let mut simulation = Simulation::new(probs)?
                .rounds(rounds.unwrap_or(config.simulation.rounds));
            if let Some(seed) = seed.or(config.simulation.seed) {
                simulation = simulation.seed(seed);
            }
            let report = simulation.run()?;
            if save {
                store::save(&state_path, &report.state)?;
            }
            print_json(&serde_json::to_value(&report)?)?;
        }
    }

    Ok(())
}

/// Interpret a raw argument as JSON where possible, so `3`, `0.5`, and `null`
/// keep their types and anything else is passed through as a string.
fn parse_arg(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}

fn print_json(value: &Value) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ucb_core::UcbError;

    #[test]
    fn test_parse_arg_keeps_json_types() {
        assert_eq!(parse_arg("2"), json!(2));
        assert_eq!(parse_arg("0.75"), json!(0.75));
        assert_eq!(parse_arg("null"), Value::Null);
        assert_eq!(parse_arg("two"), json!("two"));
        assert_eq!(parse_arg(""), json!(""));
    }

    #[test]
    fn test_raw_args_surface_reward_errors() {
        let mut policy = BanditPolicy::new(2).unwrap();
        let err = policy
            .reward_value(Some(&parse_arg("-1")), Some(&parse_arg("1")))
            .unwrap_err();
        assert!(matches!(err, UcbError::ArmOutOfRange { arm: -1, .. }));

        let err = policy
            .reward_value(Some(&parse_arg("x")), Some(&parse_arg("1")))
            .unwrap_err();
        assert!(matches!(err, UcbError::InvalidArm(_)));
    }

    #[test]
    fn test_cli_parses_subcommands() {
        let cli = Cli::try_parse_from(["ucb", "--state", "s.json", "reward", "--arm", "-1", "--value", "0.5"])
            .unwrap();
        assert_eq!(cli.state, Some(PathBuf::from("s.json")));
        assert!(matches!(cli.command, Commands::Reward { ref arm, .. } if arm == "-1"));

        let cli = Cli::try_parse_from(["ucb", "simulate", "--probs", "0.1,0.9", "--seed", "4"]).unwrap();
        match cli.command {
            Commands::Simulate { probs, seed, .. } => {
                assert_eq!(probs, vec![0.1, 0.9]);
                assert_eq!(seed, Some(4));
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_init_and_reward_flow() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("state.json");
        let state = path.to_str().unwrap();

        let cli = Cli::try_parse_from(["ucb", "--state", state, "init", "--arms", "3"]).unwrap();
        run(cli, AppConfig::default()).unwrap();

        let cli = Cli::try_parse_from(["ucb", "--state", state, "init"]).unwrap();
        assert!(run(cli, AppConfig::default()).is_err());

        let cli = Cli::try_parse_from(["ucb", "--state", state, "reward", "-a", "2", "-v", "0.5"]).unwrap();
        run(cli, AppConfig::default()).unwrap();

        let policy = store::load(&path).unwrap();
        assert_eq!(policy.counts(), &[0, 0, 1]);
        assert_eq!(policy.values()[2], 0.5);
    }
}

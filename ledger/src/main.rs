use clap::Parser;
use colored::*;
use eyre::{Context, Result};
use log::{LevelFilter, debug};

use swarmledger::cli::{Cli, Command};
use swarmledger::config::Config;
use swarmledger::{Ledger, LedgerError, LedgerStore};

fn setup_logging(level: Option<&str>) -> Result<()> {
    let filter = match level {
        Some(s) => s.parse::<LevelFilter>().unwrap_or_else(|_| {
            eprintln!("Warning: Unknown log-level '{}', defaulting to WARN", s);
            LevelFilter::Warn
        }),
        None => LevelFilter::Warn,
    };

    // RUST_LOG wins over the level chosen here
    env_logger::Builder::new()
        .filter_level(filter)
        .parse_default_env()
        .try_init()?;
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;

    setup_logging(cli.log_level.as_deref().or(config.log_level.as_deref())).context("Failed to setup logging")?;

    let state_path = cli.state.unwrap_or(config.state_path);
    debug!("ledger starting, state={}", state_path.display());
    let ledger = Ledger::new(LedgerStore::open(&state_path).with_locking(config.lock));

    match cli.command {
        Command::Add { desc, skill } => {
            let task = ledger.add(&desc, &skill).context("Failed to add task")?;
            println!("Created {}: {}", task.id, task.description);
        }
        Command::Update { id, status, artifact } => match ledger.update(&id, status, artifact.as_deref()) {
            Ok(task) => println!("Updated {} to {}", task.id, task.status),
            Err(err @ LedgerError::NotFound { .. }) => {
                eprintln!("{} {}", "error:".red(), err);
                std::process::exit(1);
            }
            Err(err) => return Err(err).context("Failed to update task"),
        },
    }

    Ok(())
}

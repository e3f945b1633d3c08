//! CLI argument parsing for the ledger

use clap::builder::NonEmptyStringValueParser;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::state::TaskStatus;

#[derive(Parser, Debug)]
#[command(name = "ledger")]
#[command(author, version, about = "Side hustle task ledger", long_about = None)]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Ledger file (overrides the configured state_path)
    #[arg(short, long, global = true)]
    pub state: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Create a new task
    Add {
        /// What needs doing
        #[arg(long, value_parser = NonEmptyStringValueParser::new())]
        desc: String,

        /// Skill tag of the agent that should pick it up
        #[arg(long, value_parser = NonEmptyStringValueParser::new())]
        skill: String,
    },

    /// Change a task's status
    Update {
        /// Task ID (e.g. TKT-100)
        #[arg(long)]
        id: String,

        /// New status
        #[arg(long, value_enum)]
        status: TaskStatus,

        /// Path to output file
        #[arg(long)]
        artifact: Option<String>,
    },
}

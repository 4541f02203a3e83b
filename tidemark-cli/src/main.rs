//! Tidemark CLI Tool
//!
//! Command-line interface for inspecting migration sources: what versions a
//! source holds, what a single step contains, and the run-status summary.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::io;
use std::path::PathBuf;
use std::process;
use tidemark::source::{self, Direction, Version};
use tidemark::SourceConfig;
use tidemark_cli::commands::{handle_list, handle_show, handle_summary};

#[derive(Parser)]
#[command(name = "tidemark")]
#[command(about = "Inspect versioned migration sources")]
#[command(version)]
struct Cli {
    /// Source locator, e.g. file://migrations (defaults to the configured url)
    #[arg(long)]
    source: Option<String>,

    /// Configuration file path
    #[arg(long, default_value = "config/tidemark.toml")]
    config: PathBuf,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Quiet output (errors only)
    #[arg(short, long)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum DirectionArg {
    Up,
    Down,
}

impl From<DirectionArg> for Direction {
    fn from(arg: DirectionArg) -> Self {
        match arg {
            DirectionArg::Up => Direction::Up,
            DirectionArg::Down => Direction::Down,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// List every indexed version with its up and down locations
    List,

    /// Print the run-status summary table
    Summary {
        /// Direction to report (default: configured summary direction)
        #[arg(long, value_enum)]
        direction: Option<DirectionArg>,

        /// Mark steps through this version as skipped first, as a resumed run would
        #[arg(long)]
        skip_through: Option<Version>,
    },

    /// Show a single migration step
    Show {
        version: Version,

        #[arg(long, value_enum, default_value = "up")]
        direction: DirectionArg,
    },
}

fn main() {
    let cli = Cli::parse();

    let level = if cli.quiet {
        "error"
    } else if cli.verbose {
        "debug"
    } else {
        "info"
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    if let Err(e) = run(cli) {
        eprintln!("{} {e:#}", "error:".red().bold());
        process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let config = SourceConfig::load_from(&cli.config).context("loading configuration")?;
    let locator = cli.source.unwrap_or(config.url);

    let mut driver =
        source::open(&locator).with_context(|| format!("opening source {locator}"))?;

    let stdout = io::stdout();
    let mut out = stdout.lock();
    let result = match cli.command {
        Commands::List => handle_list(driver.as_ref(), &mut out),
        Commands::Summary {
            direction,
            skip_through,
        } => {
            let direction = direction.map_or(config.summary_direction, Direction::from);
            handle_summary(driver.as_mut(), direction, skip_through, &mut out)
        }
        Commands::Show { version, direction } => {
            handle_show(driver.as_ref(), version, direction.into(), &mut out)
        }
    };

    driver.close().context("closing source")?;
    result
}

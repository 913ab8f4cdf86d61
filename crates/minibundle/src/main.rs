use std::{
    io::Write,
    path::{Path, PathBuf},
    process::ExitCode,
};

use anyhow::{Context, Result, anyhow};
use clap::Parser;
use log::{LevelFilter, debug};
use minibundle::{BundleOrchestrator, config::Config};

/// Bundle an ES module entry point and everything it imports into one script
#[derive(Parser, Debug)]
#[command(name = "minibundle", author, version, about, long_about = None)]
struct Cli {
    /// Entry module; overrides `entry` from the config file
    #[arg(short, long)]
    entry: Option<PathBuf>,

    /// Output file; the bundle is printed to stdout when omitted
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Configuration file (defaults to ./minibundle.toml when present)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Re-evaluate a module on every require instead of caching it
    #[arg(long)]
    no_module_cache: bool,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn init_logging(verbose: u8) {
    let mut builder = match verbose {
        0 => env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")),
        level => {
            let mut builder = env_logger::Builder::new();
            builder.filter_level(if level == 1 {
                LevelFilter::Debug
            } else {
                LevelFilter::Trace
            });
            builder
        }
    };
    builder.format_timestamp(None).init();
}

fn resolve_config(cli: &Cli, cwd: &Path) -> Result<Config> {
    let mut config = Config::load(cli.config.as_deref(), cwd)?;

    if let Some(entry) = &cli.entry {
        config.entry = Some(entry.clone());
    }
    if let Some(output) = &cli.output {
        config.output = Some(output.clone());
    }
    if cli.no_module_cache {
        config.module_cache = false;
    }

    Ok(config)
}

fn run(cli: Cli) -> Result<()> {
    let cwd = std::env::current_dir().context("failed to determine working directory")?;
    let config = resolve_config(&cli, &cwd)?;
    debug!("Effective configuration: {config:?}");

    let entry = config
        .entry
        .clone()
        .ok_or_else(|| anyhow!("no entry module given; pass --entry or set `entry` in the config"))?;
    let output = config.output.clone();
    let orchestrator = BundleOrchestrator::new(config);

    match output {
        Some(output) => {
            orchestrator.bundle_to_file(&entry, &output)?;
        }
        None => {
            let result = orchestrator.bundle(&entry)?;
            let mut stdout = std::io::stdout().lock();
            stdout
                .write_all(result.code.as_bytes())
                .context("failed to write bundle to stdout")?;
            stdout.flush().context("failed to flush stdout")?;
        }
    }

    Ok(())
}

#[allow(clippy::print_stderr)]
fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err:?}");
            ExitCode::FAILURE
        }
    }
}

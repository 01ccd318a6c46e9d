//! e2e-reporter - companion CLI for the e2e test reporter
//!
//! ## Usage
//!
//! ```bash
//! # Dump the events a failing test would print
//! e2e-reporter events --namespace encryption-e2e
//!
//! # Check which mode tests will run in
//! e2e-reporter env
//!
//! # Write an example configuration
//! e2e-reporter config init
//! ```

use anyhow::Result;
use clap::Parser;
use std::path::Path;
use tracing::info;

use e2e_reporter::config::{print_env_help, ConfigFile, EnvConfig, CI_MARKER};
use e2e_reporter::events::{dump_events, KubeEventSource};
use e2e_reporter::utils::{init_logger, LogLevel};
use e2e_reporter::{RecordingHandle, Reporter, ReporterConfig, Termination};

mod cli;

use cli::{Args, ConfigFormat, EventsFormat};

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let env = EnvConfig::load();
    let level = if args.verbose {
        LogLevel::Debug
    } else {
        env.log_level_or(LogLevel::Warn)
    };
    init_logger(level);

    match args.command {
        cli::Command::Events(events_args) => {
            show_events(events_args).await?;
        }
        cli::Command::Env(env_args) => {
            if env_args.vars {
                print_env_help();
            } else {
                env.print_summary();
            }
        }
        cli::Command::Config(config_args) => {
            manage_config(config_args)?;
        }
    }

    Ok(())
}

async fn show_events(args: cli::EventsArgs) -> Result<()> {
    let mut source = KubeEventSource::new();
    if let Some(context) = &args.context {
        source = source.with_context(context);
    }

    info!("Listing events in namespace {}", args.namespace);

    if args.format == EventsFormat::Json {
        let events = source.list(&args.namespace).await?;
        println!("{}", serde_json::to_string_pretty(&events)?);
        return Ok(());
    }

    let config = ReporterConfig::local().with_termination(Termination::Propagate);
    let mut reporter = Reporter::new(RecordingHandle::new("events"), config);
    let namespace = args.namespace.clone();

    // The source blocks on its own runtime thread
    tokio::task::block_in_place(|| dump_events(&mut reporter, &source, &namespace));
    Ok(())
}

fn manage_config(args: cli::ConfigArgs) -> Result<()> {
    match args.action {
        cli::ConfigAction::Init { output, force } => {
            let path = Path::new(&output);
            if path.exists() && !force {
                anyhow::bail!(
                    "Configuration file already exists: {output}. Use --force to overwrite."
                );
            }

            ConfigFile::example().save(path)?;
            println!("✓ Configuration file created: {output}");
        }

        cli::ConfigAction::Show { file, format } => {
            let env = EnvConfig::load();
            let mut config = match file {
                Some(path) => ConfigFile::load(path)?,
                None => ConfigFile::load_for(&env)?,
            };
            config.reporter = env.apply(config.reporter);

            // The mode is never part of the file
            match format {
                ConfigFormat::Json => println!("{}", serde_json::to_string_pretty(&config)?),
                ConfigFormat::Yaml => {
                    println!("# mode: {} (from the {CI_MARKER} marker)", config.reporter.mode);
                    println!("{}", serde_yaml::to_string(&config)?);
                }
            }
        }

        cli::ConfigAction::Validate { file } => {
            let path = file.or(EnvConfig::load().config_file).unwrap_or_else(|| {
                ConfigFile::find()
                    .map(|p| p.to_string_lossy().to_string())
                    .unwrap_or_else(|| "./e2e-reporter.yaml".to_string())
            });

            match ConfigFile::load(&path) {
                Ok(_) => {
                    println!("✓ Configuration file is valid: {path}");
                }
                Err(e) => {
                    println!("✗ Configuration file is invalid: {path}");
                    println!("  Error: {e}");
                    return Err(e);
                }
            }
        }
    }

    Ok(())
}

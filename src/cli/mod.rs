//! CLI argument parsing
//!
//! Defines command-line interface using clap.

use clap::{Parser, Subcommand, ValueEnum};

/// Timestamping e2e test reporter utilities
#[derive(Parser, Debug)]
#[command(name = "e2e-reporter")]
#[command(version)]
#[command(about = "Inspect reporter configuration and dump namespace events")]
#[command(long_about = None)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Dump the events of a namespace, as the failure hook does
    Events(EventsArgs),

    /// Show the environment-derived reporter configuration
    Env(EnvArgs),

    /// Manage configuration files
    Config(ConfigArgs),
}

/// Arguments for events command
#[derive(Parser, Debug)]
pub struct EventsArgs {
    /// Namespace to read events from
    #[arg(short, long)]
    pub namespace: String,

    /// Kubeconfig context (defaults to the current context)
    #[arg(long)]
    pub context: Option<String>,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = EventsFormat::Text)]
    pub format: EventsFormat,
}

/// Output formats for the events command
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum EventsFormat {
    /// One line per event, as the failure hook logs them
    Text,
    Json,
}

/// Output formats for config show
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ConfigFormat {
    Yaml,
    Json,
}

/// Arguments for env command
#[derive(Parser, Debug)]
pub struct EnvArgs {
    /// List the recognized environment variables instead
    #[arg(long)]
    pub vars: bool,
}

/// Arguments for config command
#[derive(Parser, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Write an example configuration file
    Init {
        /// Output path
        #[arg(default_value = "./e2e-reporter.yaml")]
        output: String,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Show the effective configuration
    Show {
        /// Config file (defaults to the standard locations)
        #[arg(short, long)]
        file: Option<String>,

        /// Output format
        #[arg(long, value_enum, default_value_t = ConfigFormat::Yaml)]
        format: ConfigFormat,
    },

    /// Validate a configuration file
    Validate {
        /// Config file (defaults to the standard locations)
        file: Option<String>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_events() {
        let args = Args::parse_from(["e2e-reporter", "events", "-n", "encryption-e2e"]);
        match args.command {
            Command::Events(events) => {
                assert_eq!(events.namespace, "encryption-e2e");
                assert_eq!(events.format, EventsFormat::Text);
                assert!(events.context.is_none());
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_parse_config_init() {
        let args = Args::parse_from(["e2e-reporter", "-v", "config", "init", "--force"]);
        assert!(args.verbose);
        match args.command {
            Command::Config(ConfigArgs {
                action: ConfigAction::Init { output, force },
            }) => {
                assert_eq!(output, "./e2e-reporter.yaml");
                assert!(force);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_parse_formats() {
        let args = Args::parse_from(["e2e-reporter", "events", "-n", "ns", "--format", "json"]);
        match args.command {
            Command::Events(events) => assert_eq!(events.format, EventsFormat::Json),
            other => panic!("unexpected command: {other:?}"),
        }

        let args = Args::parse_from(["e2e-reporter", "config", "show"]);
        match args.command {
            Command::Config(ConfigArgs {
                action: ConfigAction::Show { file, format },
            }) => {
                assert!(file.is_none());
                assert_eq!(format, ConfigFormat::Yaml);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_unknown_format_rejected() {
        assert!(Args::try_parse_from(["e2e-reporter", "events", "-n", "ns", "-f", "xml"]).is_err());
        assert!(Args::try_parse_from(["e2e-reporter", "config", "show", "--format", "toml"]).is_err());
    }

    #[test]
    fn test_events_requires_namespace() {
        assert!(Args::try_parse_from(["e2e-reporter", "events"]).is_err());
    }
}

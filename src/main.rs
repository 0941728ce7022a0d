//! devlane-config CLI
//!
//! Composes the effective run configuration and prints or validates it.
//! Flags not given on the command line fall back to `DEVLANE_*` environment
//! variables.

use clap::{Parser, Subcommand};
use devlane_config::compose::{compose_config, ComposeParams};
use devlane_config::{ChainArgSource, EnvArgSource, MapArgSource};
use std::path::PathBuf;
use std::process;

#[derive(Parser)]
#[command(name = "devlane-config")]
#[command(about = "Resolve the effective devlane run configuration", version)]
struct Cli {
    /// Explicit path to a configuration file (JSON or TOML)
    #[arg(long)]
    config_path: Option<PathBuf>,

    /// Name of the device configuration to select
    #[arg(long)]
    configuration: Option<String>,

    /// Override the selected configuration's device with this name
    #[arg(long)]
    device_name: Option<String>,

    /// Artifacts root directory
    #[arg(long)]
    artifacts_location: Option<String>,

    /// Log plugin preset: disabled, failing, or all
    #[arg(long)]
    record_logs: Option<String>,

    /// Screenshot plugin preset: disabled, failing, or all
    #[arg(long)]
    take_screenshots: Option<String>,

    /// Video plugin preset: disabled, failing, or all
    #[arg(long)]
    record_videos: Option<String>,

    /// Reuse the installed app instead of reinstalling it
    #[arg(long)]
    reuse: bool,

    /// Shut the device down after the run
    #[arg(long)]
    cleanup: bool,

    /// Working directory for configuration discovery
    #[arg(long)]
    cwd: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compose and print the effective configuration as JSON
    Show {
        /// Pretty-print the output
        #[arg(long)]
        pretty: bool,
    },

    /// Compose and report whether the configuration is valid
    Check,
}

impl Cli {
    /// Flags as an argument source; only flags actually given are defined,
    /// so the environment layer underneath stays reachable.
    fn arg_source(&self) -> ChainArgSource {
        let mut flags = MapArgSource::new();
        if let Some(path) = &self.config_path {
            flags.set("config-path", path.to_string_lossy().to_string());
        }
        if let Some(name) = &self.configuration {
            flags.set("configuration", name.clone());
        }
        if let Some(name) = &self.device_name {
            flags.set("device-name", name.clone());
        }
        if let Some(dir) = &self.artifacts_location {
            flags.set("artifacts-location", dir.clone());
        }
        if let Some(preset) = &self.record_logs {
            flags.set("record-logs", preset.clone());
        }
        if let Some(preset) = &self.take_screenshots {
            flags.set("take-screenshots", preset.clone());
        }
        if let Some(preset) = &self.record_videos {
            flags.set("record-videos", preset.clone());
        }
        if self.reuse {
            flags.set("reuse", true);
        }
        if self.cleanup {
            flags.set("cleanup", true);
        }

        ChainArgSource::new(vec![Box::new(flags), Box::new(EnvArgSource::default())])
    }
}

fn main() {
    let cli = Cli::parse();

    let params = ComposeParams {
        cwd: cli.cwd.clone(),
        ..Default::default()
    };
    let args = cli.arg_source();

    match compose_config(&params, &args) {
        Ok(composed) => match cli.command {
            Commands::Show { pretty } => {
                let value = composed.to_value();
                let rendered = if pretty {
                    serde_json::to_string_pretty(&value)
                } else {
                    serde_json::to_string(&value)
                };
                match rendered {
                    Ok(json) => println!("{json}"),
                    Err(e) => {
                        eprintln!("error: failed to render configuration: {e}");
                        process::exit(1);
                    }
                }
            }
            Commands::Check => {
                println!("configuration \"{}\" OK", composed.configuration_name);
            }
        },
        Err(e) => {
            eprintln!("error: {e}");
            process::exit(1);
        }
    }
}

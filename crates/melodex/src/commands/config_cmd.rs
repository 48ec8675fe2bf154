//! Config subcommand handlers.

use melodex_config::Config;

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts, OutputFormat};
use crate::config;
use crate::error::CliError;
use crate::output;

pub fn handle(args: ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        ConfigCommand::Path => {
            output::print_output(&config::active_config_path(global).display().to_string());
            Ok(())
        }

        // Effective values: file, environment and flags merged
        ConfigCommand::Show => {
            let cfg = config::resolve(global)?;
            let out = match global.output {
                OutputFormat::Json => serde_json::to_string_pretty(&cfg)?,
                OutputFormat::Plain => toml::to_string_pretty(&cfg)
                    .map_err(|e| CliError::Config(e.into()))?,
            };
            output::print_output(out.trim_end());
            Ok(())
        }

        ConfigCommand::Init { force } => {
            let path = config::active_config_path(global);
            if path.exists() && !force {
                return Err(CliError::ConfigExists {
                    path: path.display().to_string(),
                });
            }
            melodex_config::save_config_to(&Config::default(), &path)?;
            eprintln!("Wrote {}", path.display());
            Ok(())
        }
    }
}

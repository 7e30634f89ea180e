//! Config subcommand handlers.

use std::io::{self, BufRead, IsTerminal};

use secsmart_config::{Config, DeviceEntry};

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts, OutputFormat};
use crate::error::CliError;
use crate::output;

pub fn handle(args: ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let path = global
        .config
        .clone()
        .unwrap_or_else(secsmart_config::config_path);

    match args.command {
        ConfigCommand::Init { devices, force } => {
            if path.exists() && !force {
                return Err(CliError::Validation {
                    field: "config".into(),
                    reason: format!(
                        "{} already exists (use --force to overwrite)",
                        path.display()
                    ),
                });
            }

            let mut cfg = Config {
                devices: devices
                    .into_iter()
                    .map(|id| DeviceEntry {
                        id,
                        poll_interval: None,
                    })
                    .collect(),
                ..Config::default()
            };
            if let Some(ref base_url) = global.base_url {
                cfg.base_url.clone_from(base_url);
            }
            cfg.validate()?;

            secsmart_config::save_config(&cfg, &path)?;
            if !global.quiet {
                eprintln!("Wrote {}", path.display());
            }
            Ok(())
        }

        ConfigCommand::Path => {
            output::print_output(&path.display().to_string(), global.quiet);
            Ok(())
        }

        ConfigCommand::Show => {
            let mut cfg = secsmart_config::load_config(global.config.as_deref())?;
            if let Some(ref base_url) = global.base_url {
                cfg.base_url.clone_from(base_url);
            }
            let cfg = cfg.redacted();

            let out = match global.output {
                OutputFormat::Json => serde_json::to_string_pretty(&cfg)?,
                OutputFormat::JsonCompact => serde_json::to_string(&cfg)?,
                OutputFormat::Yaml => serde_yaml::to_string(&cfg)?,
                OutputFormat::Table | OutputFormat::Plain => {
                    toml::to_string_pretty(&cfg).map_err(|e| CliError::Validation {
                        field: "config".into(),
                        reason: format!("failed to serialize config: {e}"),
                    })?
                }
            };
            output::print_output(out.trim_end(), global.quiet);
            Ok(())
        }

        ConfigCommand::SetToken { token } => {
            let token = match token {
                Some(t) => t,
                None => read_token()?,
            };
            let token = token.trim();
            if token.is_empty() {
                return Err(CliError::Validation {
                    field: "token".into(),
                    reason: "token cannot be empty".into(),
                });
            }

            secsmart_config::store_token(token)?;
            if !global.quiet {
                eprintln!("Token stored in system keyring");
            }
            Ok(())
        }
    }
}

/// Read a single line from stdin.
fn read_token() -> Result<String, CliError> {
    let stdin = io::stdin();
    if stdin.is_terminal() {
        eprint!("API token: ");
    }
    let mut line = String::new();
    stdin.lock().read_line(&mut line)?;
    Ok(line)
}

mod cli;
mod commands;
mod error;
mod output;

use clap::Parser;
use secrecy::SecretString;
use tracing_subscriber::EnvFilter;

use secsmart_core::Hub;

use crate::cli::{Cli, Command, GlobalOpts};
use crate::error::CliError;

#[tokio::main]
async fn main() {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Setup tracing based on verbosity
    init_tracing(cli.global.verbose);

    // Dispatch and handle errors with proper exit codes
    if let Err(err) = run(cli).await {
        let code = err.exit_code();
        eprintln!("{:?}", miette::Report::new(err));
        std::process::exit(code);
    }
}

fn init_tracing(verbosity: u8) {
    let filter = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(cli: Cli) -> Result<(), CliError> {
    match cli.command {
        // Config commands don't need the API
        Command::Config(args) => commands::config_cmd::handle(args, &cli.global),

        Command::Completions(args) => {
            use clap::CommandFactory;
            use clap_complete::generate;

            let mut cmd = Cli::command();
            generate(args.shell, &mut cmd, "secsmart", &mut std::io::stdout());
            Ok(())
        }

        cmd => {
            let hub = build_hub(&cli.global)?;

            tracing::debug!(
                command = ?cmd,
                devices = hub.coordinators().len(),
                "dispatching command"
            );
            commands::dispatch(cmd, &hub, &cli.global).await
        }
    }
}

/// Build a `Hub` from the config file, environment, and CLI overrides.
fn build_hub(global: &GlobalOpts) -> Result<Hub, CliError> {
    let mut cfg = secsmart_config::load_config(global.config.as_deref())?;
    if let Some(ref base_url) = global.base_url {
        cfg.base_url.clone_from(base_url);
    }

    let token = match global.token.as_deref().map(str::trim) {
        Some(token) if !token.is_empty() => SecretString::from(token.to_owned()),
        _ => secsmart_config::resolve_token(&cfg)?,
    };

    let hub_config = cfg.to_hub_config(token)?;
    Ok(Hub::new(&hub_config)?)
}

//! meetups CLI entry point.

use std::process::ExitCode;

use clap::Parser;
use tracing::debug;

use meetups_client::cli::{Cli, Command, ConfigAction};
use meetups_client::commands::{self, meetups::RenderOptions};
use meetups_client::config::ClientConfig;
use meetups_client::error::ClientResult;
use meetups_core::tracing::{init_tracing, TracingConfig};

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli) {
        Ok(output) => {
            println!("{}", output);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> ClientResult<String> {
    let config = match cli.config {
        Some(ref path) => ClientConfig::load_from(path)?,
        None => ClientConfig::load()?,
    }
    .merge_cli(&cli);

    let tracing_config = if config.debug {
        TracingConfig::cli_debug()
    } else {
        TracingConfig::cli()
    };
    if let Err(e) = init_tracing(tracing_config) {
        eprintln!("warning: {}", e);
    }

    let command = cli.command.unwrap_or(Command::List { favorites: false });

    if let Command::Config { ref action } = command {
        return match action {
            ConfigAction::Dump => commands::config::dump(&config),
            ConfigAction::Path => Ok(commands::config::path()),
        };
    }

    let store = commands::meetups::seed_store(config.data.file.as_deref())?;
    let _changes = store.subscribe(|meetups| {
        debug!(count = meetups.len(), "Meetups changed");
    });

    commands::meetups::apply(&store, &command)?;

    let options = RenderOptions {
        format: config.output_format(),
        format_options: config.format_options(),
        no_meetups_text: config.display.no_meetups_text.clone(),
        favorites_only: matches!(command, Command::List { favorites: true }),
    };
    commands::meetups::render(&store.meetups(), &options)
}

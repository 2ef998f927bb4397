//! Meeting Minutes CLI entry point

use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use meeting_minutes::cli::{
    app::{run_oneshot, EXIT_ERROR, EXIT_USAGE_ERROR},
    args::{Cli, Commands},
    config_cmd::handle_config_command,
    presenter::Presenter,
};
use meeting_minutes::domain::error::ConfigError;
use meeting_minutes::infrastructure::XdgConfigStore;

/// Log to stderr; `RUST_LOG` wins over `-v`
fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("meeting_minutes={}", default_level)));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[tokio::main(flavor = "multi_thread", worker_threads = 2)]
async fn main() -> ExitCode {
    let mut cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command.take() {
        Some(Commands::Config { action }) => {
            let presenter = Presenter::new();
            let store = XdgConfigStore::new();
            if let Err(e) = handle_config_command(action, &store, &presenter).await {
                presenter.error(&e.to_string());
                let code = match e {
                    ConfigError::ValidationError { .. } => EXIT_USAGE_ERROR,
                    _ => EXIT_ERROR,
                };
                return ExitCode::from(code);
            }
            ExitCode::SUCCESS
        }
        None => run_oneshot(cli).await,
    }
}

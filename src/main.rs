//! NivelVer admin CLI entry point

use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use nivelver_admin::cli::{
    app::{load_merged_config, run_audio, EXIT_ERROR},
    args::{AudioAction, Cli, Commands},
    config_cmd::handle_config_command,
    presenter::Presenter,
};
use nivelver_admin::domain::config::AppConfig;
use nivelver_admin::infrastructure::XdgConfigStore;

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Commands::Config { action } => {
            let presenter = Presenter::new();
            let store = XdgConfigStore::new();
            if let Err(e) = handle_config_command(action, &store, &presenter).await {
                presenter.error(&e.to_string());
                return ExitCode::from(EXIT_ERROR);
            }
            ExitCode::SUCCESS
        }
        Commands::Audio { action } => {
            let item = match &action {
                AudioAction::New(item) | AudioAction::Edit { item, .. } => item,
            };
            let cli_config = AppConfig {
                storage: item.storage.map(|backend| backend.to_string()),
                ..Default::default()
            };

            let config = load_merged_config(cli_config).await;
            run_audio(action, config).await
        }
    }
}

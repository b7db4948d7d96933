use clap::Parser;
use eyre::Result;
use fake_nft::{
    app::{application::Application, config::ConfigLoader},
    cli::{run_command, Cli},
};
use nft_core::core::logging::log_init;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = ConfigLoader::new().load_config(cli.config_path.as_deref(), Some(&cli.overrides()))?;

    log_init(
        config.logging.level.clone(),
        config.logging.file_path.as_deref(),
        config.logging.disable_terminal,
    );

    tracing::info!(base_url = %config.api.base_url, "Starting");

    let mut app = Application::new(&config)?;
    app.start()?;

    let result = run_command(&mut app, cli.command).await;

    if let Err(err) = app.stop().await {
        tracing::warn!("Failed to stop cleanly: {:?}", err);
    }

    result
}

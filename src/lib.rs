pub mod actuation;
pub mod cli;
pub mod commands;
pub mod config;
pub mod device;
pub mod direction;
pub mod error;
pub mod irc;
pub mod mirror;
pub mod platform;
pub mod state;
pub mod vxbox;
pub mod xinput;

use cli::Cli;
use config::AppConfig;
use error::Result;
use state::AppState;
use std::sync::Arc;
use std::time::Duration;

const QUIT_GRACE: Duration = Duration::from_millis(500);

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default)).init();
}

pub async fn run(cli: Cli) -> Result<()> {
    init_logging(cli.verbose);

    let path = match cli.config {
        Some(path) => path,
        None => AppConfig::default_path()?,
    };
    let config = AppConfig::load(&path)?;
    log::debug!("Loaded config from {}", path.display());

    if cli.print_config {
        println!("{}", serde_json::to_string_pretty(&config)?);
        return Ok(());
    }

    let state = Arc::new(AppState::new(config));
    let result = tokio::select! {
        result = irc::client::run(state.clone()) => result,
        signal = tokio::signal::ctrl_c() => {
            log::info!("Interrupted, shutting down");
            if state.quit("Shutting down") {
                // Let the connection writer flush the QUIT.
                tokio::time::sleep(QUIT_GRACE).await;
            }
            signal.map_err(Into::into)
        }
    };
    state.shutdown();
    result
}

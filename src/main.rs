use clap::Parser;
use ctrlbot_lib::cli::Cli;

#[tokio::main]
async fn main() {
    if let Err(e) = ctrlbot_lib::run(Cli::parse()).await {
        log::error!("{}", e);
        eprintln!("ctrlbot: {}", e);
        std::process::exit(1);
    }
}

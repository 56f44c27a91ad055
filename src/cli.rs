use clap::Parser;
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "ctrlbot", version, about = "Drive a virtual Xbox controller from IRC chat")]
pub struct Cli {
    /// Config file (default: <config dir>/ctrlbot/config.json)
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Log at debug level unless RUST_LOG says otherwise
    #[arg(short, long)]
    pub verbose: bool,

    /// Print the effective configuration as JSON and exit
    #[arg(long)]
    pub print_config: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_flags() {
        let cli = Cli::parse_from(["ctrlbot", "-v", "--config", "bot.json", "--print-config"]);
        assert!(cli.verbose);
        assert!(cli.print_config);
        assert_eq!(cli.config, Some(PathBuf::from("bot.json")));
    }

    #[test]
    fn defaults_are_off() {
        let cli = Cli::parse_from(["ctrlbot"]);
        assert!(!cli.verbose);
        assert!(cli.config.is_none());
    }
}

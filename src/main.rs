use clap::Parser;
use log::{debug, LevelFilter};

mod engine;

use engine::{use_command, Cli};

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { LevelFilter::Debug } else { LevelFilter::Info };
    env_logger::Builder::new()
        .filter_level(default_level)
        .parse_default_env() // RUST_LOG still wins
        .init();
    debug!("Parsed arguments: {:?}", cli);

    use_command(cli)
}

//! CLI entry point for the photomosaic generator

use clap::Parser;
use photomosaic::io::cli::{Cli, CommandRunner};

fn main() -> photomosaic::Result<()> {
    let cli = Cli::parse();
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(cli.default_log_level()),
    )
    .init();

    let runner = CommandRunner::new(cli);
    runner.run()
}

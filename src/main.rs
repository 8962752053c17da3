mod cli;
mod config;
mod core;
mod error;
mod models;
mod sources;

use clap::Parser;

fn main() {
    let cli = cli::Cli::parse();

    let filter = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(filter)).init();

    if let Err(e) = cli::run(cli) {
        eprintln!("오류: {:#}", e);
        std::process::exit(1);
    }
}

use clap::Parser;
use log::error;
use three_prime_trim::cli::{run_cli, Cli};

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    if let Err(e) = run_cli(cli) {
        error!("{:#}", e);
        std::process::exit(1);
    }
}

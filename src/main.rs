//! webprobe - a scenario-driven browser probe runner
//!
//! Executes declarative probe scenarios against a running web
//! application through a WebDriver-compatible browser session.

use clap::Parser;
use webprobe::commands::Commands;
use webprobe::{cli, common};

#[derive(Parser)]
#[command(name = "webprobe", about = "Scenario-driven browser probe runner")]
#[command(version, long_about = None)]
struct Cli {
    /// Verbose logging
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    common::logging::init_cli(cli.verbose);

    match cli::dispatch(cli.command).await {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(2);
        }
    }
}

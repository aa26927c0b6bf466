//! MT CLI - Command line tool for exploring Spotify monthly chart data.

use clap::Parser;

#[derive(Parser)]
#[command(
    name = "mt-cli",
    version,
    about = "Music Trends chart data toolkit"
)]
struct Cli {
    #[command(subcommand)]
    command: mt_cmd::Command,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    log::debug!("Starting mt-cli");
    mt_cmd::run(cli.command).await
}

//! GEP CLI - API server and tools for energy-access planning scenarios.

use clap::Parser;

#[derive(Parser)]
#[command(
    name = "gep-cli",
    version,
    about = "Global Electrification Platform scenario API and tools"
)]
struct Cli {
    #[command(subcommand)]
    command: gep_cmd::Command,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    gep_cmd::run(cli.command).await
}

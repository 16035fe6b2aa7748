use anyhow::Result;
use clap::Parser;

mod chain;
mod cli;
mod config;
mod engine;
mod keys;
mod monitoring;
mod rpc;
#[cfg(test)]
mod testing;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = cli::args::Cli::parse();
    cli::run(cli).await
}

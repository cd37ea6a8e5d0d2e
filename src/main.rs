use std::env;
use std::process::ExitCode;

use anyhow::Error;
use args::{Args, StartSubCommand, SubCommands};
use clap::Parser;

mod args;
mod clients;
mod commands;
mod config;
mod errors;
mod handler;
mod models;
mod utils;

#[tokio::main]
async fn main() -> Result<ExitCode, Error> {
    tracing_subscriber::fmt()
        .with_target(false)
        .with_env_filter(
            env::var("RUST_LOG").unwrap_or_else(|_| "notebooklm2api=info".to_string()),
        )
        .init();
    let args = Args::parse();
    match args.subcmd {
        Some(SubCommands::Start(start)) => {
            commands::start::run(&start).await?;
        }
        Some(SubCommands::Config(config_subcmd)) => {
            commands::config::run(&config_subcmd)?;
        }
        Some(SubCommands::Smoke(smoke)) => {
            if !commands::smoke::run(&smoke).await? {
                return Ok(ExitCode::FAILURE);
            }
        }
        None => {
            commands::start::run(&StartSubCommand::default()).await?;
        }
    };
    Ok(ExitCode::SUCCESS)
}

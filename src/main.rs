//! pagepush - publish a single generated file to a git remote.

mod cli;
mod config;
mod deploy;
mod logger;
mod utils;

use anyhow::Result;
use clap::{ColorChoice, Parser};
use cli::{
    Cli,
    deploy::{deploy_site, exit_code},
};
use config::Config;

fn main() {
    let result = run();
    if let Err(e) = &result {
        logger::error(&format!("{e:#}"));
    }
    std::process::exit(exit_code(&result));
}

fn run() -> Result<()> {
    // Setup global Ctrl+C handler (before any blocking operations)
    ctrlc::set_handler(|| {
        log!("deploy"; "interrupted");
        std::process::exit(130);
    })?;

    let cli = Cli::parse();

    // Set global color override based on CLI option
    match cli.color {
        ColorChoice::Always => owo_colors::set_override(true),
        ColorChoice::Never => owo_colors::set_override(false),
        ColorChoice::Auto => {} // owo-colors auto-detects TTY
    }

    let config = Config::load(&cli)?;
    logger::set_verbosity(config.log.level);

    if cli.print_config {
        print!("{}", config.to_toml()?);
        return Ok(());
    }

    deploy_site(&config, cli.message.as_deref())?;
    Ok(())
}

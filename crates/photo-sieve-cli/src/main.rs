//! Photo Sieve CLI - Watch a photo library and flag images with an on-device classifier.

use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod commands;
mod config;
mod output;

use commands::{Cli, Commands, ExitCode};
use config::AppConfig;

fn main() -> std::process::ExitCode {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    let config = AppConfig::load();

    let result = match cli.command {
        Commands::Albums(ref args) => {
            commands::albums::run(args, &config).map(|()| ExitCode::Success)
        }
        Commands::Scan(args) => commands::scan::run(&args.with_config(&config), &config),
        Commands::Watch(args) => commands::watch::run(&args.with_config(&config), &config),
        Commands::Export(ref args) => commands::export::run(args),
        Commands::Dest(ref args) => commands::dest::run(args).map(|()| ExitCode::Success),
        Commands::Models(ref args) => commands::models::run(args).map(|()| ExitCode::Success),
    };

    let exit_code = match result {
        Ok(code) => code,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::Error
        }
    };

    exit_code.into()
}

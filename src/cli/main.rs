//! CLI support for non-command bits

use crate::cli;
use crate::cli::common::Command;
use clap::AppSettings;
use std::io;
use std::str::FromStr;

pub fn main() -> io::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .init();

    let mut app = app_from_crate!().setting(AppSettings::SubcommandRequiredElseHelp);

    for cmd in Command::enumerate().iter() {
        app = app.subcommand(cmd.into_clap_subcommand());
    }

    let matches = app.get_matches();
    let (command, submatches) = matches.subcommand();

    match (Command::from_str(command), submatches) {
        (Ok(Command::Build), Some(argv)) => cli::build(argv),
        (Ok(Command::Rebase), Some(argv)) => cli::rebase(argv),
        (Ok(Command::Info), Some(argv)) => cli::info(argv),
        _ => Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("Unknown command {}", command),
        )),
    }
}

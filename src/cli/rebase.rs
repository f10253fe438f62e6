//! CLI command: rebase

use crate::cli::common::{addr_arg, path_arg};
use crate::ctrack::relocate_track;
use crate::dnft::Module;
use clap::ArgMatches;
use std::fs;
use std::io;
use tracing::info;

/// Relocate a single file without touching any ROM image.
pub fn rebase(argv: &ArgMatches<'_>) -> io::Result<()> {
    let input = path_arg(argv, "input")?;
    let output = path_arg(argv, "output")?;
    let from = addr_arg(argv, "from")?;
    let to = addr_arg(argv, "to")?;

    let data = fs::read(input)?;
    let relocated = match argv.value_of("kind") {
        Some("track") => relocate_track(&data, from, to)?,
        Some("module") => {
            let dpcm = addr_arg(argv, "dpcm")?;
            let mut module = Module::parse(data, from)?;

            module.rebase(to, dpcm)?;
            module.into_binary()
        }
        _ => {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "Must specify if the input is a module or a track",
            ))
        }
    };

    fs::write(output, &relocated)?;

    info!(
        "Rebased {} from ${:04X} to ${:04X} into {}",
        input, from, to, output
    );

    Ok(())
}

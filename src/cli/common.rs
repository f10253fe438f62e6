//! Common utilities for command implementations

use crate::input::parse_addr;
use clap::{App, Arg, ArgMatches, SubCommand};
use std::io;
use std::str::FromStr;

/// Enumeration of all CLI commands
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Command {
    Build,
    Rebase,
    Info,
}

impl Command {
    /// Enumerate all commands that ftrom recognizes.
    pub fn enumerate() -> Vec<Self> {
        use Command::*;

        vec![Build, Rebase, Info]
    }

    /// Construct the subcommand object for this particular `Command`.
    pub fn into_clap_subcommand<'a, 'b>(self) -> App<'a, 'b> {
        match self {
            Command::Build => SubCommand::with_name("build")
                .about("Build a ROM image from a project file")
                .arg(
                    Arg::with_name("project")
                        .value_name("ftrom.json")
                        .index(1)
                        .default_value("ftrom.json")
                        .help("The project file to build"),
                ),
            Command::Rebase => SubCommand::with_name("rebase")
                .about("Relocate a single module or native track")
                .arg(
                    Arg::with_name("kind")
                        .value_name("KIND")
                        .index(1)
                        .required(true)
                        .possible_values(&["module", "track"])
                        .help("Whether the input is a Dn-FamiTracker module or a native track"),
                )
                .arg(
                    Arg::with_name("input")
                        .value_name("music.bin")
                        .index(2)
                        .required(true)
                        .help("The file to relocate"),
                )
                .arg(
                    Arg::with_name("from")
                        .value_name("8000")
                        .index(3)
                        .required(true)
                        .help("The address the input was built for"),
                )
                .arg(
                    Arg::with_name("to")
                        .value_name("A000")
                        .index(4)
                        .required(true)
                        .help("The address to relocate to"),
                )
                .arg(
                    Arg::with_name("dpcm")
                        .long("dpcm")
                        .value_name("C000")
                        .takes_value(true)
                        .default_value("C000")
                        .help("Where a module's DPCM samples will be, on multiples of $40"),
                )
                .arg(
                    Arg::with_name("output")
                        .short("o")
                        .long("output")
                        .value_name("out.bin")
                        .takes_value(true)
                        .required(true)
                        .help("Where to write the relocated file"),
                ),
            Command::Info => SubCommand::with_name("info")
                .about("Describe the contents of a module")
                .arg(
                    Arg::with_name("input")
                        .value_name("music.bin")
                        .index(1)
                        .required(true)
                        .help("The module to describe"),
                )
                .arg(
                    Arg::with_name("base")
                        .long("base")
                        .value_name("0")
                        .takes_value(true)
                        .default_value("0")
                        .help("The address the module was exported for"),
                ),
        }
    }
}

impl FromStr for Command {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_ref() {
            "build" => Ok(Command::Build),
            "rebase" => Ok(Command::Rebase),
            "relocate" => Ok(Command::Rebase),
            "info" => Ok(Command::Info),
            _ => Err(()),
        }
    }
}

/// Retrieve an address argument.
///
/// This function yields an error if the argument is missing or is not an
/// address.
pub fn addr_arg(argv: &ArgMatches<'_>, name: &str) -> io::Result<u16> {
    let text = argv.value_of(name).ok_or_else(|| {
        io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("Must specify {}", name),
        )
    })?;

    parse_addr(text).ok_or_else(|| {
        io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("{} is not a valid address for {}", text, name),
        )
    })
}

/// Retrieve a path argument.
pub fn path_arg<'a>(argv: &'a ArgMatches<'_>, name: &str) -> io::Result<&'a str> {
    argv.value_of(name).ok_or_else(|| {
        io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("Must specify {}", name),
        )
    })
}

//! CLI command: info

use crate::cli::common::{addr_arg, path_arg};
use crate::dnft::Module;
use clap::ArgMatches;
use std::fs;
use std::io;

/// Print a summary of everything in a module.
pub fn info(argv: &ArgMatches<'_>) -> io::Result<()> {
    let input = path_arg(argv, "input")?;
    let base = addr_arg(argv, "base")?;
    let module = Module::parse(fs::read(input)?, base)?;
    let header = module.header();

    println!(
        "{}: {} bytes at ${:04X}",
        input,
        module.binary().len(),
        module.base_addr()
    );
    println!(
        "Song list ${:04X}, instrument list ${:04X}, sample list ${:04X}, samples ${:04X}, grooves ${:04X}",
        header.song_list, header.instrument_list, header.sample_list, header.samples, header.groove_list
    );
    println!("Flags: {}", header.flags());
    println!(
        "Engine speed: {} (NTSC), {} (PAL)",
        header.ntsc_speed, header.pal_speed
    );

    println!("{} songs", module.songs().len());
    for (i, song) in module.songs().iter().enumerate() {
        let info = song.info();

        println!(
            "  {:>3}: {} frames of {} channels, {} rows, speed {}, tempo {}",
            i,
            info.frame_count,
            song.channel_count(),
            info.pattern_length,
            info.speed,
            info.tempo
        );
    }

    println!("{} instruments", module.instruments().len());
    for (i, instr) in module.instruments().iter().enumerate() {
        let kind = match instr.header().instrument_type() {
            Some(kind) => kind.friendly_name().to_string(),
            None => format!("unknown type {}", instr.header().kind),
        };

        println!(
            "  {:>3}: {}, {} sequences",
            i,
            kind,
            instr.header().sequence_count()
        );
    }

    println!(
        "{} DPCM instruments, {} samples",
        module.dpcm_instruments().len(),
        module.samples().len()
    );

    if !module.samples().is_empty() {
        println!(
            "DPCM region: ${:04X}, {} bytes",
            module.dpcm_base_addr(),
            module.dpcm_size()
        );
    }

    Ok(())
}

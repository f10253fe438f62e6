//! CLI command: build

use crate::cli::common::path_arg;
use crate::ctrack::relocate_track;
use crate::dnft::Module;
use crate::project::{Catalog, Project, Source};
use crate::rom::{
    BankPool, BankStore, FreeSpaceList, MasterEntry, Placement, RomImage, BANK_SIZE,
    DPCM_ADDR, MAX_DPCM_SIZE, MUSIC_BANK_ADDR,
};
use clap::ArgMatches;
use std::collections::BTreeMap;
use std::convert::TryFrom;
use std::{fmt, fs, io};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

/// Where a module ended up, and how many songs it has.
#[derive(Copy, Clone, Debug)]
struct PlacedModule {
    bank: u8,
    song_count: usize,
}

/// An error, along with the file or track being processed when it happened.
#[derive(Debug, Error)]
#[error("{context}: {source}")]
struct ContextError {
    context: String,
    source: io::Error,
}

fn with_context(context: impl fmt::Display, err: impl Into<io::Error>) -> io::Error {
    let source = err.into();

    io::Error::new(
        source.kind(),
        ContextError {
            context: context.to_string(),
            source,
        },
    )
}

/// Attach the name of the file being processed to an error.
fn in_file(path: &Path, err: impl Into<io::Error>) -> io::Error {
    with_context(path.display(), err)
}

fn read_file(path: &Path) -> io::Result<Vec<u8>> {
    fs::read(path).map_err(|e| in_file(path, e))
}

/// Place every module in use into its own bank.
///
/// Modules are relocated to run from the music bank window, with their
/// samples in the game's DPCM area.
fn place_modules(
    image: &mut RomImage,
    catalog: &Catalog,
    banks: Vec<u8>,
) -> io::Result<(BTreeMap<PathBuf, PlacedModule>, FreeSpaceList)> {
    let mut pool = BankPool::new(banks, BANK_SIZE, MUSIC_BANK_ADDR);
    let mut placed = BTreeMap::new();

    for path in catalog.module_paths() {
        let mut module = Module::parse(read_file(path)?, 0).map_err(|e| in_file(path, e))?;

        if module.dpcm_size() > MAX_DPCM_SIZE as u32 {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!(
                    "{}: DPCM samples take {} bytes, at most {} are available",
                    path.display(),
                    module.dpcm_size(),
                    MAX_DPCM_SIZE
                ),
            ));
        }

        module
            .rebase(MUSIC_BANK_ADDR, DPCM_ADDR)
            .map_err(|e| in_file(path, e))?;

        let placement = pool
            .place_whole(image, module.binary())
            .map_err(|e| in_file(path, e))?;

        info!(
            "Placed {} in bank ${:02X} ({} bytes, {} songs)",
            path.display(),
            placement.bank,
            module.binary().len(),
            module.songs().len()
        );

        placed.insert(
            path.clone(),
            PlacedModule {
                bank: placement.bank,
                song_count: module.songs().len(),
            },
        );
    }

    Ok((placed, pool.into_free_space()))
}

/// Pack every native track in use into the remaining free space.
fn place_native_tracks<'a>(
    image: &mut RomImage,
    catalog: &'a Catalog,
    free: &mut FreeSpaceList,
) -> io::Result<BTreeMap<&'a str, Placement>> {
    let mut placed = BTreeMap::new();

    for (name, source) in catalog.sources() {
        let (base_addr, data) = match source {
            Source::Native { base_addr, data } => (*base_addr, data),
            _ => continue,
        };

        let placement = free.reserve_fitted(data.len())?;
        let relocated = relocate_track(data, base_addr, placement.addr)
            .map_err(|e| with_context(format!("native track {}", name), e))?;

        image.write_bank(placement.bank, placement.offset, &relocated)?;

        info!(
            "Placed native track {} in bank ${:02X} at ${:04X} ({} bytes)",
            name,
            placement.bank,
            placement.addr,
            relocated.len()
        );

        placed.insert(name, placement);
    }

    Ok(placed)
}

/// Point every assigned slot at its new data.
///
/// `vanilla` holds the track tables as they were in the input image, so
/// slots can keep playing the game's own tracks even after their table
/// entries were overwritten.
fn update_track_tables(
    image: &mut RomImage,
    catalog: &Catalog,
    vanilla: &[(u16, MasterEntry)],
    modules: &BTreeMap<PathBuf, PlacedModule>,
    natives: &BTreeMap<&str, Placement>,
) -> io::Result<()> {
    for (target, assigned) in catalog.assignments() {
        let (name, source) = match assigned {
            Some(assigned) => assigned,
            None => {
                debug!("Slot {} plays nothing", target);
                image.set_master_entry(target, MasterEntry::UNASSIGNED);
                continue;
            }
        };

        let entry = match source {
            Source::Silent => MasterEntry::UNASSIGNED,
            Source::Module { path, song } => {
                let module = modules.get(path).ok_or_else(|| {
                    io::Error::new(
                        io::ErrorKind::Other,
                        format!("{} was never placed", path.display()),
                    )
                })?;
                let song_idx = u8::try_from(*song)
                    .ok()
                    .filter(|_| *song < module.song_count)
                    .ok_or_else(|| {
                        io::Error::new(
                            io::ErrorKind::InvalidInput,
                            format!(
                                "track {} is song {} of {}, which only has {} songs",
                                name,
                                song,
                                path.display(),
                                module.song_count
                            ),
                        )
                    })?;

                MasterEntry::module(module.bank, song_idx)
            }
            Source::Native { .. } => {
                let placement = natives.get(name).ok_or_else(|| {
                    io::Error::new(
                        io::ErrorKind::Other,
                        format!("native track {} was never placed", name),
                    )
                })?;

                image.set_native_track_addr(target, placement.addr);
                MasterEntry::native(placement.bank, target)
            }
            Source::Vanilla { slot } => {
                let (addr, entry) = vanilla[slot.index()];

                if entry.is_module() {
                    return Err(io::Error::new(
                        io::ErrorKind::InvalidData,
                        format!(
                            "slot {} of the input image does not hold a native track",
                            slot
                        ),
                    ));
                }

                image.set_native_track_addr(target, addr);
                MasterEntry::native(entry.bank, target)
            }
        };

        debug!(
            "Slot {} plays {} (bank ${:02X}, track ${:02X})",
            target, name, entry.bank, entry.track
        );

        image.set_master_entry(target, entry);
    }

    Ok(())
}

/// Build the output image of a project.
pub fn build_project(project: &Project) -> io::Result<()> {
    let catalog = Catalog::resolve(project)?;
    let input_path = project.input_rom()?;
    let output_path = project.output_rom()?;

    let mut image = RomImage::new(read_file(&input_path)?).map_err(|e| in_file(&input_path, e))?;
    let vanilla = image.track_tables();

    if let Some(dpcm_path) = project.dpcm_samples() {
        let samples = read_file(&dpcm_path)?;

        image
            .import_dpcm(&samples)
            .map_err(|e| in_file(&dpcm_path, e))?;

        info!("Imported {} bytes of DPCM samples", samples.len());
    }

    let (modules, mut free) = place_modules(&mut image, &catalog, project.free_banks()?)?;
    let natives = place_native_tracks(&mut image, &catalog, &mut free)?;

    update_track_tables(&mut image, &catalog, &vanilla, &modules, &natives)?;

    info!(
        "{} bytes left in {} free areas",
        free.total_size(),
        free.len()
    );

    fs::write(&output_path, image.into_bytes()).map_err(|e| in_file(&output_path, e))?;

    info!("Wrote {}", output_path.display());

    Ok(())
}

/// Build a ROM image from a project file.
pub fn build(argv: &ArgMatches<'_>) -> io::Result<()> {
    let project_path = path_arg(argv, "project")?;
    let project = Project::read(Path::new(project_path))?;

    build_project(&project)
}

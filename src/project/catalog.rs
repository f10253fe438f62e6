//! Resolution of track names to the data they play

use crate::input::parse_hex_bytes;
use crate::project::error::{Error, Result};
use crate::project::repr::{NativeTrack, Project};
use crate::rom::TrackName;
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::PathBuf;
use tracing::debug;

/// Where a track's data comes from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Source {
    /// Song `song` of the Dn-FamiTracker export at `path`.
    Module { path: PathBuf, song: usize },

    /// A native track assembled to run at `base_addr`.
    Native { base_addr: u16, data: Vec<u8> },

    /// Whatever the input image plays in `slot`.
    Vanilla { slot: TrackName },

    /// Nothing at all.
    Silent,
}

/// A track as declared in the project, before any file is read.
enum Declaration<'a> {
    Module { path: PathBuf, song: usize },
    Native(&'a NativeTrack),
    Vanilla { slot: TrackName },
}

/// Every track the project's slots play, resolved to its source.
///
/// Tracks that no slot plays are left out, and so are exports none of whose
/// songs are played.
#[derive(Clone, Debug, Default)]
pub struct Catalog {
    sources: BTreeMap<String, Source>,
    assignments: BTreeMap<TrackName, Option<String>>,
}

impl Catalog {
    pub fn resolve(project: &Project) -> Result<Self> {
        let declared = declare(project)?;
        let mut assignments = BTreeMap::new();

        for (target, name) in project.tracks() {
            if let Some(name) = name {
                if !declared.contains_key(name) {
                    return Err(Error::UnknownTrack {
                        target,
                        name: name.to_string(),
                    });
                }
            }

            assignments.insert(target, name.map(str::to_string));
        }

        let used: BTreeSet<&str> = assignments.values().flatten().map(String::as_str).collect();
        let mut sources = BTreeMap::new();

        for (name, decl) in declared.into_iter() {
            if !used.contains(name.as_str()) {
                debug!("Skipping unused track {}", name);
                continue;
            }

            let source = match decl {
                Declaration::Module { path, song } => Source::Module { path, song },
                Declaration::Native(native) => load_native(project, &name, native)?,
                Declaration::Vanilla { slot } => Source::Vanilla { slot },
            };

            sources.insert(name, source);
        }

        Ok(Catalog {
            sources,
            assignments,
        })
    }

    pub fn source(&self, name: &str) -> Option<&Source> {
        self.sources.get(name)
    }

    pub fn sources(&self) -> impl Iterator<Item = (&str, &Source)> {
        self.sources.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Every export with at least one song in use, each listed once.
    pub fn module_paths(&self) -> Vec<&PathBuf> {
        let paths: BTreeSet<&PathBuf> = self
            .sources
            .values()
            .filter_map(|source| match source {
                Source::Module { path, .. } => Some(path),
                _ => None,
            })
            .collect();

        paths.into_iter().collect()
    }

    /// Every slot the project assigns, with the source it should play.
    ///
    /// Slots assigned no track at all yield `None`.
    pub fn assignments(&self) -> impl Iterator<Item = (TrackName, Option<(&str, &Source)>)> {
        self.assignments.iter().map(move |(target, name)| {
            let source = name.as_ref().and_then(|name| {
                self.sources
                    .get_key_value(name)
                    .map(|(k, v)| (k.as_str(), v))
            });

            (*target, source)
        })
    }
}

/// List every track the project declares.
///
/// Native tracks take precedence over exports; the game's own tracks are
/// available under their slot names unless the project reuses the name.
fn declare(project: &Project) -> Result<BTreeMap<String, Declaration<'_>>> {
    let mut declared = BTreeMap::new();

    for (name, native) in project.c2_files() {
        declared.insert(name.to_string(), Declaration::Native(native));
    }

    for (file, songs) in project.ft_files() {
        let path = project.track_path(file);

        for (song, name) in songs.iter().enumerate() {
            let name = name.trim();
            if name.is_empty() {
                continue;
            }

            if declared.contains_key(name) {
                return Err(Error::DuplicateTrack(name.to_string()));
            }

            declared.insert(
                name.to_string(),
                Declaration::Module {
                    path: path.clone(),
                    song,
                },
            );
        }
    }

    for slot in TrackName::iter() {
        declared
            .entry(slot.friendly_name().to_string())
            .or_insert(Declaration::Vanilla { slot });
    }

    Ok(declared)
}

/// Load a native track's data, from its file or from inline hexadecimal.
///
/// Track files may hold raw bytes, or the same bytes written out as
/// hexadecimal text.
fn load_native(project: &Project, name: &str, native: &NativeTrack) -> Result<Source> {
    if native.is_silent() {
        return Ok(Source::Silent);
    }

    let base_addr = native.base_addr(name)?;
    let data = match (&native.file, &native.data) {
        (Some(_), Some(_)) => return Err(Error::ConflictingData(name.to_string())),
        (None, Some(hex)) => {
            parse_hex_bytes(hex).ok_or_else(|| Error::InvalidHexData(name.to_string()))?
        }
        (Some(file), None) => {
            let path = project.track_path(file);
            let raw = fs::read(&path).map_err(|err| Error::Io { path, err })?;
            let decoded = std::str::from_utf8(&raw).ok().and_then(parse_hex_bytes);

            match decoded {
                Some(data) => data,
                None => raw,
            }
        }
        (None, None) => Vec::new(),
    };

    Ok(Source::Native { base_addr, data })
}

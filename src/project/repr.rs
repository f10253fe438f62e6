//! Project configuration file representation

use crate::input::{parse_addr, parse_num};
use crate::project::error::{Error, Result};
use crate::rom::{TrackName, FREE_BANKS};
use relative_path::{RelativePath, RelativePathBuf};
use serde::de::{self, Deserializer, MapAccess, Visitor};
use serde::Deserialize;
use std::collections::{BTreeMap, BTreeSet};
use std::convert::TryFrom;
use std::path::{Path, PathBuf};
use std::{fmt, fs, result};

/// A number that may be written in JSON either as a number or as a string
/// such as `"$2A"`.
#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(untagged)]
pub enum NumberSpec {
    Number(u16),
    Text(String),
}

impl NumberSpec {
    fn text(&self) -> String {
        match self {
            NumberSpec::Number(n) => n.to_string(),
            NumberSpec::Text(s) => s.clone(),
        }
    }
}

/// A native track, either stored in its own file or written inline as
/// hexadecimal.
///
/// An entry with neither a file nor data names a track that plays nothing.
#[derive(Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct NativeTrack {
    /// Address the track was assembled for.
    #[serde(default)]
    pub base_addr: Option<NumberSpec>,

    #[serde(default)]
    pub file: Option<RelativePathBuf>,

    #[serde(default)]
    pub data: Option<String>,
}

impl NativeTrack {
    /// Decode the base address of the track named `name`.
    pub fn base_addr(&self, name: &str) -> Result<u16> {
        match &self.base_addr {
            Some(NumberSpec::Number(n)) => Ok(*n),
            Some(NumberSpec::Text(s)) => parse_addr(s).ok_or_else(|| Error::InvalidAddress {
                name: name.to_string(),
                value: s.clone(),
            }),
            None => Err(Error::MissingBaseAddr(name.to_string())),
        }
    }

    /// Determine if the entry names a track that plays nothing.
    pub fn is_silent(&self) -> bool {
        self.file.is_none() && self.data.is_none()
    }
}

struct TracksVisitor;

impl<'de> Visitor<'de> for TracksVisitor {
    type Value = BTreeMap<TrackName, Option<String>>;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "a map of track slots to track names")
    }

    fn visit_map<A>(self, mut access: A) -> result::Result<Self::Value, A::Error>
    where
        A: MapAccess<'de>,
    {
        let mut tracks = BTreeMap::new();

        while let Some((slot, name)) = access.next_entry::<TrackName, Option<String>>()? {
            if tracks.insert(slot, name).is_some() {
                return Err(de::Error::custom(format!(
                    "track slot {} is assigned more than once",
                    slot
                )));
            }
        }

        Ok(tracks)
    }
}

/// Slot names are case-insensitive, so two keys may name the same slot.
fn deserialize_tracks<'de, D>(
    deserializer: D,
) -> result::Result<BTreeMap<TrackName, Option<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    deserializer.deserialize_map(TracksVisitor)
}

fn default_track_dir() -> RelativePathBuf {
    RelativePathBuf::from(".")
}

/// In-memory representation of the current project configuration.
///
/// This file is typically read from a file named `ftrom.json`. All paths in
/// it are relative to the directory the file is in, and track files are
/// further relative to `track_dir`.
#[derive(Deserialize, Debug)]
pub struct Project {
    #[serde(default = "default_track_dir")]
    track_dir: RelativePathBuf,

    #[serde(default)]
    input_rom: Option<RelativePathBuf>,

    #[serde(default)]
    output_rom: Option<RelativePathBuf>,

    #[serde(default)]
    dpcm_samples: Option<RelativePathBuf>,

    #[serde(default)]
    exclude_banks: Vec<NumberSpec>,

    /// Dn-FamiTracker exports, each with the name of every song in it.
    ///
    /// Songs given an empty name are left out.
    #[serde(default)]
    ft_files: BTreeMap<String, Vec<String>>,

    #[serde(default)]
    c2_files: BTreeMap<String, NativeTrack>,

    /// What every slot of the game should play, by track name.
    ///
    /// A null track silences the slot. Slots left out keep what the input
    /// image has in them.
    #[serde(deserialize_with = "deserialize_tracks")]
    tracks: BTreeMap<TrackName, Option<String>>,

    #[serde(skip)]
    root: PathBuf,
}

impl Project {
    pub fn read(filename: &Path) -> Result<Self> {
        let project_file = fs::File::open(filename).map_err(|err| Error::Io {
            path: filename.to_path_buf(),
            err,
        })?;
        let mut project: Self = serde_json::from_reader(project_file)?;

        project.root = filename
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();

        Ok(project)
    }

    /// Parse a project from a string, as if it were read from a file in
    /// `root`.
    pub fn from_json(json: &str, root: &Path) -> Result<Self> {
        let mut project: Self = serde_json::from_str(json)?;

        project.root = root.to_path_buf();

        Ok(project)
    }

    /// The directory the project file lives in.
    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn track_dir(&self) -> PathBuf {
        self.track_dir.to_path(&self.root)
    }

    /// Resolve a path to a track file.
    pub fn track_path(&self, file: &RelativePath) -> PathBuf {
        file.to_path(self.track_dir())
    }

    pub fn input_rom(&self) -> Result<PathBuf> {
        self.input_rom
            .as_ref()
            .map(|p| p.to_path(&self.root))
            .ok_or(Error::MissingKey("input_rom"))
    }

    pub fn output_rom(&self) -> Result<PathBuf> {
        self.output_rom
            .as_ref()
            .map(|p| p.to_path(&self.root))
            .ok_or(Error::MissingKey("output_rom"))
    }

    pub fn dpcm_samples(&self) -> Option<PathBuf> {
        self.dpcm_samples.as_ref().map(|p| p.to_path(&self.root))
    }

    /// Banks the user asked us not to touch.
    pub fn excluded_banks(&self) -> Result<BTreeSet<u8>> {
        self.exclude_banks
            .iter()
            .map(|spec| {
                let bank = match spec {
                    NumberSpec::Number(n) => u8::try_from(*n).ok(),
                    NumberSpec::Text(s) => parse_num::<u8>(s),
                };

                bank.ok_or_else(|| Error::InvalidBank(spec.text()))
            })
            .collect()
    }

    /// Banks new music may be placed in.
    pub fn free_banks(&self) -> Result<Vec<u8>> {
        let excluded = self.excluded_banks()?;

        Ok(FREE_BANKS.filter(|bank| !excluded.contains(bank)).collect())
    }

    pub fn ft_files(&self) -> impl Iterator<Item = (&RelativePath, &[String])> {
        self.ft_files
            .iter()
            .map(|(k, v)| (RelativePath::new(k), v.as_slice()))
    }

    pub fn c2_files(&self) -> impl Iterator<Item = (&str, &NativeTrack)> {
        self.c2_files.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn tracks(&self) -> impl Iterator<Item = (TrackName, Option<&str>)> {
        self.tracks.iter().map(|(k, v)| (*k, v.as_deref()))
    }
}

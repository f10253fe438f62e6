//! Error type for project files

use crate::rom::TrackName;
use std::path::PathBuf;
use std::{io, result};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("cannot read {}: {err}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        err: io::Error,
    },

    #[error("project file is invalid: {0}")]
    Json(#[from] serde_json::Error),

    #[error("project file does not specify {0}")]
    MissingKey(&'static str),

    #[error("{0:?} is not a valid bank number")]
    InvalidBank(String),

    #[error("{value:?} is not a valid address for track {name}")]
    InvalidAddress { name: String, value: String },

    #[error("track {0} is defined more than once")]
    DuplicateTrack(String),

    #[error("native track {0} needs a base address")]
    MissingBaseAddr(String),

    #[error("native track {0} specifies both a file and inline data")]
    ConflictingData(String),

    #[error("native track {0} has invalid hexadecimal data")]
    InvalidHexData(String),

    #[error("track slot {target} is assigned unknown track {name}")]
    UnknownTrack { target: TrackName, name: String },
}

impl From<Error> for io::Error {
    fn from(err: Error) -> io::Error {
        let kind = match &err {
            Error::Io { err, .. } => err.kind(),
            Error::Json(_) => io::ErrorKind::InvalidData,
            _ => io::ErrorKind::InvalidInput,
        };

        io::Error::new(kind, err)
    }
}

pub type Result<T> = result::Result<T, Error>;

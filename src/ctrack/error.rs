//! Error type for native track relocation

use std::{io, result};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("track is too short to hold its pointer table ({len} bytes)")]
    TruncatedHeader { len: usize },

    /// The instrument table pointer lies outside the track, or the table is
    /// not a whole number of entries.
    #[error("invalid instrument table at ${addr:04X}")]
    InvalidInstrumentTable { addr: u16 },

    /// A pointer reachable from `channel` leads outside the track. `addr` is
    /// the address of the pointer slot or instruction holding it.
    #[error("invalid address in channel {channel} at ${addr:04X}")]
    InvalidAddress { channel: usize, addr: u16 },
}

impl From<Error> for io::Error {
    fn from(err: Error) -> io::Error {
        io::Error::new(io::ErrorKind::InvalidData, err)
    }
}

pub type Result<T> = result::Result<T, Error>;

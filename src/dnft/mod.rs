//! Dn-FamiTracker BIN export parsing and relocation.
//!
//! A BIN export is the music data of a tracker module compiled for the
//! FamiTracker sound driver, assembled for a fixed load address. Every
//! section of the export is reached through absolute pointers, and the DPCM
//! samples it plays are referenced by their own coarse addressing scheme, so
//! moving the export anywhere else means rewriting both.

mod error;
mod module;
mod types;

pub use error::{Error, ErrorKind, Result};
pub use module::{Frame, Instrument, Module, Song, ADDRESS_SPACE_END, DPCM_BASE_MAX, DPCM_BASE_MIN};
pub use types::{
    DpcmInstrument, Header, HeaderFlags, InstrumentHeader, InstrumentType, Sample, SongInfo,
};

#[cfg(test)]
mod tests;

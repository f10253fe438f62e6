//! Native Mega Man 2 music tracks.
//!
//! A native track starts with a single byte followed by five little-endian
//! pointers: one entry point per sound channel, then the instrument table.
//! Channel data is a bytecode stream whose only embedded addresses are the
//! targets of loop instructions, so relocating a track means finding every
//! reachable loop instruction.

mod error;
mod relocate;

pub use error::{Error, Result};
pub use relocate::{
    opcode_size, relocate_track, CHANNEL_COUNT, INSTRUMENT_ENTRY_SIZE, NO_CHANNEL, OP_END,
    OP_LOOP, POINTERS_OFFSET, POINTER_COUNT,
};

//! Mega Man 2 ROM images and the banks within them.
//!
//! The game keeps its music in 8KiB PRG banks. Two tables in the sound bank
//! decide which data each of the game's track slots plays: the master track
//! table names a bank and track index for every slot, and the native track
//! address table holds the address of every slot's native track data.

mod allocator;
mod error;
mod image;
mod track;
mod traits;

pub use allocator::{BankPool, FreeSpace, FreeSpaceList, Placement};
pub use error::{Error, Result};
pub use image::{
    file_offset, MasterEntry, RomImage, BANK_COUNT, BANK_SIZE, DPCM_ADDR, DPCM_BANK,
    DPCM_BANK_ADDR, FREE_BANKS, HEADER_SIZE, IMAGE_SIZE, MASTER_TABLE_OFFSET, MAX_DPCM_SIZE,
    MUSIC_BANK_ADDR, NATIVE_TABLE_OFFSET, TABLE_BANK,
};
pub use track::{TrackName, TRACK_COUNT};
pub use traits::BankStore;

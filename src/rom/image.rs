//! The cartridge image and its fixed tables

use crate::rom::error::{Error, Result};
use crate::rom::track::TrackName;
use crate::rom::traits::BankStore;
use std::ops::Range;

/// Size of the iNES header preceding the PRG data.
pub const HEADER_SIZE: usize = 0x10;

pub const BANK_SIZE: usize = 0x2000;

pub const BANK_COUNT: usize = 64;

/// Exact size of an expanded Mega Man 2 image: 512KiB of PRG and the header.
pub const IMAGE_SIZE: usize = 512 * 1024 + HEADER_SIZE;

/// The sound bank, which holds both track tables.
pub const TABLE_BANK: u8 = 0x18;

/// Offset within the sound bank of the native track address table.
pub const NATIVE_TABLE_OFFSET: usize = 0xA50;

/// Offset within the sound bank of the master track table.
pub const MASTER_TABLE_OFFSET: usize = 0xAD6;

/// Banks the game leaves unused, and which may hold new music.
pub const FREE_BANKS: Range<u8> = 0x20..0x3E;

/// Where music banks are mapped while they play.
pub const MUSIC_BANK_ADDR: u16 = 0xA000;

pub const DPCM_BANK: u8 = 0x3F;

/// Where the DPCM bank is mapped.
pub const DPCM_BANK_ADDR: u16 = 0xE000;

/// Start of the area of the DPCM bank set aside for samples.
pub const DPCM_ADDR: u16 = 0xF300;

pub const MAX_DPCM_SIZE: usize = 0x600;

/// Translate a position within a bank into an offset in the image file.
pub fn file_offset(bank: u8, offset: usize) -> usize {
    usize::from(bank) * BANK_SIZE + offset + HEADER_SIZE
}

/// Entry of the master track table.
///
/// Native tracks name the bank their data lives in and their own slot. Banks
/// with the top bit set are stored inverted and hold a Dn-FamiTracker module,
/// in which case `track` is the song number within the module.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct MasterEntry {
    pub bank: u8,
    pub track: u8,
}

impl MasterEntry {
    pub const SIZE: usize = 2;

    /// The entry for a slot that plays nothing.
    pub const UNASSIGNED: MasterEntry = MasterEntry {
        bank: TABLE_BANK,
        track: 0xFF,
    };

    pub fn native(bank: u8, slot: TrackName) -> Self {
        MasterEntry {
            bank,
            track: slot.index() as u8,
        }
    }

    pub fn module(bank: u8, song: u8) -> Self {
        MasterEntry {
            bank: bank ^ 0xFF,
            track: song,
        }
    }

    pub fn is_module(self) -> bool {
        self.bank >= 0x80
    }

    /// The bank holding the slot's data, whatever kind it is.
    pub fn data_bank(self) -> u8 {
        if self.is_module() {
            self.bank ^ 0xFF
        } else {
            self.bank
        }
    }
}

/// A Mega Man 2 ROM image.
#[derive(Clone, Debug)]
pub struct RomImage {
    data: Vec<u8>,
}

impl RomImage {
    pub fn new(data: Vec<u8>) -> Result<Self> {
        if data.len() != IMAGE_SIZE {
            return Err(Error::ImageSize {
                len: data.len(),
                expected: IMAGE_SIZE,
            });
        }

        Ok(RomImage { data })
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.data
    }

    /// Retrieve the contents of a bank.
    pub fn bank(&self, bank: u8) -> Result<&[u8]> {
        if usize::from(bank) >= BANK_COUNT {
            return Err(Error::InvalidBank { bank });
        }

        let start = file_offset(bank, 0);

        Ok(&self.data[start..start + BANK_SIZE])
    }

    /// Copy `data` into `bank` as mapped at `bank_addr`, so that it starts at
    /// `addr`.
    pub fn write(&mut self, bank: u8, bank_addr: u16, addr: u16, data: &[u8]) -> Result<()> {
        let offset = addr
            .checked_sub(bank_addr)
            .map(usize::from)
            .filter(|offset| *offset < BANK_SIZE)
            .ok_or(Error::AddressOutOfBank { bank, addr })?;

        self.write_bank(bank, offset, data)
    }

    /// Store the game's DPCM samples in their fixed area.
    pub fn import_dpcm(&mut self, samples: &[u8]) -> Result<()> {
        if samples.len() > MAX_DPCM_SIZE {
            return Err(Error::DpcmTooLarge {
                len: samples.len(),
                max: MAX_DPCM_SIZE,
            });
        }

        self.write(DPCM_BANK, DPCM_BANK_ADDR, DPCM_ADDR, samples)
    }

    fn native_slot_offset(slot: TrackName) -> usize {
        file_offset(TABLE_BANK, NATIVE_TABLE_OFFSET + slot.index() * 2)
    }

    fn master_slot_offset(slot: TrackName) -> usize {
        file_offset(TABLE_BANK, MASTER_TABLE_OFFSET + slot.index() * MasterEntry::SIZE)
    }

    /// Address of a slot's native track data.
    pub fn native_track_addr(&self, slot: TrackName) -> u16 {
        let offset = Self::native_slot_offset(slot);

        u16::from_le_bytes([self.data[offset], self.data[offset + 1]])
    }

    pub fn set_native_track_addr(&mut self, slot: TrackName, addr: u16) {
        let offset = Self::native_slot_offset(slot);

        self.data[offset..offset + 2].copy_from_slice(&addr.to_le_bytes());
    }

    pub fn master_entry(&self, slot: TrackName) -> MasterEntry {
        let offset = Self::master_slot_offset(slot);

        MasterEntry {
            bank: self.data[offset],
            track: self.data[offset + 1],
        }
    }

    pub fn set_master_entry(&mut self, slot: TrackName, entry: MasterEntry) {
        let offset = Self::master_slot_offset(slot);

        self.data[offset] = entry.bank;
        self.data[offset + 1] = entry.track;
    }

    /// Copy out both track tables, in slot order.
    pub fn track_tables(&self) -> Vec<(u16, MasterEntry)> {
        TrackName::iter()
            .map(|slot| (self.native_track_addr(slot), self.master_entry(slot)))
            .collect()
    }
}

impl BankStore for RomImage {
    fn write_bank(&mut self, bank: u8, offset: usize, data: &[u8]) -> Result<()> {
        if usize::from(bank) >= BANK_COUNT {
            return Err(Error::InvalidBank { bank });
        }

        if offset + data.len() > BANK_SIZE {
            return Err(Error::BankOverflow {
                bank,
                offset,
                len: data.len(),
            });
        }

        let start = file_offset(bank, offset);
        self.data[start..start + data.len()].copy_from_slice(data);

        Ok(())
    }
}

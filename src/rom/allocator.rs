//! Bank allocation for modules and native tracks
//!
//! Modules are large and must start at the top of a bank, so each one gets a
//! whole bank from a `BankPool`. Once every module is placed the pool turns
//! into a `FreeSpaceList` of bank leftovers and untouched banks, and native
//! tracks are packed into those by best fit.

use crate::rom::error::{Error, Result};
use crate::rom::traits::BankStore;
use std::collections::{BTreeSet, VecDeque};
use tracing::debug;

/// Where a blob ended up.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Placement {
    pub bank: u8,

    /// Offset of the blob within its bank.
    pub offset: usize,

    /// Address the blob is mapped to at runtime.
    pub addr: u16,
}

/// An unused run of bytes within a bank.
///
/// Field order matters: entries sort by size first, so that the first entry
/// at or above a given size is the best fit for it.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct FreeSpace {
    pub size: usize,
    pub bank: u8,
    pub offset: usize,
}

/// A FIFO pool of whole banks.
#[derive(Clone, Debug)]
pub struct BankPool {
    banks: VecDeque<u8>,
    bank_size: usize,
    base_addr: u16,
    leftovers: Vec<FreeSpace>,
}

impl BankPool {
    /// Smallest bank leftover worth keeping as free space.
    pub const MIN_LEFTOVER: usize = 0x80;

    /// Create a pool of `banks`, each `bank_size` bytes and mapped at
    /// `base_addr`. Banks are handed out lowest first.
    pub fn new<I>(banks: I, bank_size: usize, base_addr: u16) -> Self
    where
        I: IntoIterator<Item = u8>,
    {
        let mut banks: Vec<u8> = banks.into_iter().collect();

        banks.sort_unstable();
        banks.dedup();

        BankPool {
            banks: banks.into(),
            bank_size,
            base_addr,
            leftovers: Vec::new(),
        }
    }

    /// Number of banks not yet handed out.
    pub fn remaining(&self) -> usize {
        self.banks.len()
    }

    /// Copy `blob` to the start of the next free bank.
    pub fn place_whole<S>(&mut self, store: &mut S, blob: &[u8]) -> Result<Placement>
    where
        S: BankStore,
    {
        if blob.len() > self.bank_size {
            return Err(Error::BlobTooLarge {
                len: blob.len(),
                capacity: self.bank_size,
            });
        }

        let bank = self
            .banks
            .front()
            .copied()
            .ok_or(Error::PoolExhausted { len: blob.len() })?;

        store.write_bank(bank, 0, blob)?;
        self.banks.pop_front();

        let leftover = self.bank_size - blob.len();
        if leftover >= Self::MIN_LEFTOVER {
            self.leftovers.push(FreeSpace {
                size: leftover,
                bank,
                offset: blob.len(),
            });
        }

        debug!(
            "Placed {} bytes in bank ${:02X}, {} bytes left",
            blob.len(),
            bank,
            leftover
        );

        Ok(Placement {
            bank,
            offset: 0,
            addr: self.base_addr,
        })
    }

    /// Retire the pool, turning every bank leftover and every bank that was
    /// never handed out into free space.
    pub fn into_free_space(self) -> FreeSpaceList {
        let bank_size = self.bank_size;
        let unused = self.banks.into_iter().map(|bank| FreeSpace {
            size: bank_size,
            bank,
            offset: 0,
        });

        FreeSpaceList {
            entries: self.leftovers.into_iter().chain(unused).collect(),
            base_addr: self.base_addr,
        }
    }
}

/// Free space for best-fit placement, ordered by size.
#[derive(Clone, Debug)]
pub struct FreeSpaceList {
    entries: BTreeSet<FreeSpace>,
    base_addr: u16,
}

impl FreeSpaceList {
    /// Smallest remainder of an entry worth keeping after a placement.
    pub const MIN_FRAGMENT: usize = 32;

    pub fn new<I>(entries: I, base_addr: u16) -> Self
    where
        I: IntoIterator<Item = FreeSpace>,
    {
        FreeSpaceList {
            entries: entries.into_iter().collect(),
            base_addr,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate free space from smallest to largest.
    pub fn iter(&self) -> impl Iterator<Item = &FreeSpace> {
        self.entries.iter()
    }

    pub fn total_size(&self) -> usize {
        self.entries.iter().map(|entry| entry.size).sum()
    }

    fn best_fit(&self, size: usize) -> Option<FreeSpace> {
        let key = FreeSpace {
            size,
            bank: 0,
            offset: 0,
        };

        self.entries.range(key..).next().copied()
    }

    fn placement(&self, entry: &FreeSpace) -> Placement {
        Placement {
            bank: entry.bank,
            offset: entry.offset,
            addr: self.base_addr.wrapping_add(entry.offset as u16),
        }
    }

    /// Determine where `size` bytes would go, without claiming the space.
    pub fn find_fit(&self, size: usize) -> Option<Placement> {
        self.best_fit(size).map(|entry| self.placement(&entry))
    }

    /// Claim the smallest entry with room for `size` bytes.
    ///
    /// The caller is responsible for writing to the claimed space; this is
    /// for data which has to know its address before it can be written.
    pub fn reserve_fitted(&mut self, size: usize) -> Result<Placement> {
        let entry = self.best_fit(size).ok_or(Error::NoFit { len: size })?;

        self.entries.remove(&entry);

        let remainder = entry.size - size;
        if remainder >= Self::MIN_FRAGMENT {
            self.entries.insert(FreeSpace {
                size: remainder,
                bank: entry.bank,
                offset: entry.offset + size,
            });
        }

        debug!(
            "Reserved {} bytes at bank ${:02X} offset {:#X}, {} bytes left",
            size, entry.bank, entry.offset, remainder
        );

        Ok(self.placement(&entry))
    }

    /// Copy `blob` into the smallest entry with room for it.
    pub fn place_fitted<S>(&mut self, store: &mut S, blob: &[u8]) -> Result<Placement>
    where
        S: BankStore,
    {
        let placement = self.reserve_fitted(blob.len())?;

        store.write_bank(placement.bank, placement.offset, blob)?;

        Ok(placement)
    }
}

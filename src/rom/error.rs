//! Error type for ROM image access and bank allocation

use std::{io, result};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("ROM image should be {expected} bytes, got {len}")]
    ImageSize { len: usize, expected: usize },

    #[error("bank ${bank:02X} does not exist")]
    InvalidBank { bank: u8 },

    #[error("{len} bytes at offset {offset:#X} do not fit in bank ${bank:02X}")]
    BankOverflow { bank: u8, offset: usize, len: usize },

    #[error("address ${addr:04X} is not in bank ${bank:02X}")]
    AddressOutOfBank { bank: u8, addr: u16 },

    #[error("no free banks left for a {len} byte module")]
    PoolExhausted { len: usize },

    #[error("{len} bytes will never fit in a {capacity} byte bank")]
    BlobTooLarge { len: usize, capacity: usize },

    #[error("no free space left for a {len} byte track")]
    NoFit { len: usize },

    #[error("DPCM samples are {len} bytes, at most {max} fit")]
    DpcmTooLarge { len: usize, max: usize },
}

impl From<Error> for io::Error {
    fn from(err: Error) -> io::Error {
        let kind = match err {
            Error::ImageSize { .. } | Error::DpcmTooLarge { .. } => io::ErrorKind::InvalidData,
            _ => io::ErrorKind::Other,
        };

        io::Error::new(kind, err)
    }
}

pub type Result<T> = result::Result<T, Error>;

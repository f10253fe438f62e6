//! Error type for module parsing and relocation

use std::{io, result};
use thiserror::Error;

/// Broad classification of an `Error`.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    /// The module is structurally malformed.
    Format,

    /// The module is well-formed but uses a feature that cannot be relocated.
    Unsupported,

    /// The caller asked for an impossible relocation.
    Parameter,
}

/// Error type for module parsing and relocation.
///
/// Errors found in module data carry the name of the offending record and
/// field, the byte offset of that field within the module, and the value that
/// was found there.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("module is too short to hold a header ({len} bytes)")]
    TruncatedHeader { len: usize },

    #[error("invalid address ${value:04X} in {structure}.{field} at offset {offset:#X}")]
    InvalidAddress {
        structure: &'static str,
        field: &'static str,
        offset: usize,
        value: u16,
    },

    #[error("unsupported section ordering: {field} (${value:04X}) precedes the previous section")]
    SectionOrdering {
        field: &'static str,
        offset: usize,
        value: u16,
    },

    #[error("unsupported flag bits {value:#04X} at offset {offset:#X}")]
    UnsupportedFlag { offset: usize, value: u8 },

    #[error("DPCM sample {index} overflows address space (size {value:#04X} at offset {offset:#X})")]
    SampleOverflow { index: usize, offset: usize, value: u8 },

    #[error("bank-switched modules are not supported")]
    BankSwitched { offset: usize, value: u8 },

    #[error("grooves are not supported (groove list starts with {value:#04X} at offset {offset:#X})")]
    Grooves { offset: usize, value: u8 },

    #[error("invalid relocation: {0}")]
    InvalidParameter(&'static str),
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::BankSwitched { .. } | Error::Grooves { .. } => ErrorKind::Unsupported,
            Error::InvalidParameter(_) => ErrorKind::Parameter,
            _ => ErrorKind::Format,
        }
    }

    /// The byte offset within the module the error was found at, if any.
    pub fn offset(&self) -> Option<usize> {
        match self {
            Error::TruncatedHeader { .. } | Error::InvalidParameter(_) => None,
            Error::InvalidAddress { offset, .. }
            | Error::SectionOrdering { offset, .. }
            | Error::UnsupportedFlag { offset, .. }
            | Error::SampleOverflow { offset, .. }
            | Error::BankSwitched { offset, .. }
            | Error::Grooves { offset, .. } => Some(*offset),
        }
    }
}

impl From<Error> for io::Error {
    fn from(err: Error) -> io::Error {
        let kind = match err.kind() {
            ErrorKind::Parameter => io::ErrorKind::InvalidInput,
            _ => io::ErrorKind::InvalidData,
        };

        io::Error::new(kind, err)
    }
}

pub type Result<T> = result::Result<T, Error>;

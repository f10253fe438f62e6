//! Traits for bank-addressed storage

use crate::rom::error::Result;

/// Storage made of equally sized, independently addressed banks.
///
/// The bank allocator places data through this trait, so it knows nothing
/// about how banks map onto the underlying image.
pub trait BankStore {
    /// Copy `data` into `bank`, starting `offset` bytes into the bank.
    ///
    /// Fails if the bank does not exist or `data` would not fit in it.
    fn write_bank(&mut self, bank: u8, offset: usize, data: &[u8]) -> Result<()>;
}

//! Input utility functions

use num_traits::Num;

/// Split a hexadecimal prefix (`$` or `0x`) off of a number.
fn strip_hex_prefix(text: &str) -> Option<&str> {
    text.strip_prefix('$')
        .or_else(|| text.strip_prefix("0x"))
        .or_else(|| text.strip_prefix("0X"))
}

/// Parse any number entered in by a user.
///
/// Numbers prefixed with `$` or `0x` are hexadecimal, all others decimal.
pub fn parse_num<T>(text: &str) -> Option<T>
where
    T: Num,
{
    let text = text.trim();

    match strip_hex_prefix(text) {
        Some(hex) => T::from_str_radix(hex, 16).ok(),
        None => T::from_str_radix(text, 10).ok(),
    }
}

/// Parse an address entered in by a user.
///
/// Addresses are always hexadecimal, so the prefix is optional.
pub fn parse_addr(text: &str) -> Option<u16> {
    let text = text.trim();
    let hex = strip_hex_prefix(text).unwrap_or(text);

    u16::from_str_radix(hex, 16).ok()
}

/// Decode a string of hexadecimal byte pairs.
///
/// Whitespace between pairs is ignored. Yields `None` if anything else is
/// found, or if a pair is left incomplete.
pub fn parse_hex_bytes(text: &str) -> Option<Vec<u8>> {
    let digits: String = text.chars().filter(|c| !c.is_whitespace()).collect();

    hex::decode(digits).ok()
}

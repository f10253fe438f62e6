//! Types which model how a relocatable blob appears in the 16-bit address
//! space it is loaded into.

mod window;

pub use window::{write_u16, Window};

#[cfg(test)]
mod tests;

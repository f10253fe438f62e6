//! Project files, which describe what music goes where.
//!
//! A project names the input and output images, the music files to build
//! from, and which of the game's track slots play which track.

mod catalog;
mod error;
mod repr;

pub use catalog::{Catalog, Source};
pub use error::{Error, Result};
pub use repr::{NativeTrack, NumberSpec, Project};

#[cfg(test)]
mod tests;

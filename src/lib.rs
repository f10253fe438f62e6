//! Relocation and packing of Dn-FamiTracker music into Mega Man 2 ROM images.

#[macro_use]
extern crate clap;

#[macro_use]
extern crate lazy_static;

#[macro_use]
extern crate serde_plain;

pub mod cli;
pub mod ctrack;
pub mod dnft;
pub mod input;
pub mod memory;
pub mod project;
pub mod rom;

//! CLI commands

mod build;
mod common;
mod info;
mod main;
mod rebase;

pub use build::{build, build_project};
pub use common::Command;
pub use info::info;
pub use main::main;
pub use rebase::rebase;

//! Command implementations for the rbinstall CLI

pub mod completions;
pub mod detect;
pub mod install;
pub mod version;

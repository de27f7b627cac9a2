//! CLI command implementations.

pub mod bases;
pub mod common;
pub mod generate;
pub mod verify;
pub mod version;

//! CLI command implementations.

pub mod add;
pub mod common;
pub mod config;
pub mod find;
pub mod parse;

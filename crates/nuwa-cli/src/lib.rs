//! CyberNuwa CLI library
//!
//! Argument parsing, command implementations and output rendering for the
//! `nuwa` binary.

pub mod cli;
pub mod commands;
pub mod error;
pub mod output;

pub use error::CliError;

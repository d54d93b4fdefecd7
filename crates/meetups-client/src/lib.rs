//! CLI driver for the meetup store
//!
//! This crate provides the `meetups` command-line interface.

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;

pub use cli::Cli;
pub use error::{ClientError, ClientResult};

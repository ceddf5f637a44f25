//! Internal modules for the tourney terminal front end.
//!
//! This library provides command parsing, configuration, logging setup and
//! the command executor used by the `tourney` binary.

pub mod app;
pub mod commands;
pub mod config;
pub mod logging;

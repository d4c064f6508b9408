//! Command implementations.

pub mod catalog;
pub mod config_cmd;
pub mod lines;
pub mod run;

//! ruleacquire - tabletop rulebook discovery and archiving.
//!
//! Walks a publisher's resources catalog and each product line's selection
//! pages, and stores every document as a PDF under a per-day directory.

pub mod acquire;
pub mod browser;
pub mod cli;
pub mod config;
pub mod error;
pub mod http_client;
pub mod models;
pub mod storage;

pub use error::{AcquireError, AcquireResult};

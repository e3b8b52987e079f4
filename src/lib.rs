//! # CodePrep
//!
//! Remote code execution for interview practice, built with Rust.
//!
//! ## Features
//!
//! - **Judge Integration:** Submits programs to a Judge0-compatible service and polls for results
//! - **Local Fallback:** Runs host toolchains in throwaway workspaces when the judge is down
//! - **Solution Harnesses:** Wraps bare LeetCode-style functions in a stdin/stdout driver
//! - **Grading:** Compares output against stored test cases

pub mod api;
pub mod config;
pub mod error;
pub mod grading;
pub mod sandbox;

pub use config::Config;
pub use error::{Error, Result};

/// Application version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name
pub const NAME: &str = env!("CARGO_PKG_NAME");

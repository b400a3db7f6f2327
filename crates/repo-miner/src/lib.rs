#![doc = include_str!("../README.md")]
//!
//! # Module Structure
//!
//! - [`error`]: Domain error types (`RepoMinerError`)
//! - [`config`]: Miner configuration (`RepoMinerConfig`, builder)
//! - [`exec`]: git command runner with memoization (`GitRunner`)
//! - [`diff`]: Unified-diff hunk parsing (`parse_hunks`)
//! - [`tags`]: Version-to-tag resolution (`resolve_interval`, `TagVersion`)
//! - [`repository`]: Repository handle (`Repository`, `MiningReport`)

pub mod config;
pub mod diff;
pub mod error;
pub mod exec;
pub mod repository;
pub mod tags;

// --- Public API Re-exports ---

// Configuration
pub use config::{RepoMinerConfig, RepoMinerConfigBuilder};

// Error
pub use error::RepoMinerError;

// Execution cache
pub use exec::GitRunner;

// Diff parsing
pub use diff::{is_binary_only, parse_hunks};

// Version-to-tag resolution
pub use tags::{
    ResolvedInterval, TagVersion, compare_components, compare_version_strings, extract_version,
    resolve_interval,
};

// Repository mining
pub use repository::{MiningReport, Repository};

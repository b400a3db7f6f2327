#![doc = include_str!("../README.md")]
//!
//! # Module Structure
//!
//! - [`error`]: Domain error types (`MatchEngineError`)
//! - [`config`]: Engine configuration (`MatchEngineConfig`, builder)
//! - [`advisory`]: Advisory intake enrichment (`enrich`)
//! - [`candidate`]: Preprocessed candidates (`Candidate`, `Annotation`)
//! - [`twins`]: MinHash/LSH near-duplicate detection (`TwinIndex`)
//! - [`rules`]: Scoring rules (`Rule`, `RulePredicate`, `Phase`)
//! - [`engine`]: Phased rule engine (`RuleEngine`)
//! - [`rank`]: Stable relevance ranking
//! - [`report`]: Output records (`MatchReport`, `RankedCandidate`)
//! - [`event`]: Match result events (`MatchEvent`)
//! - [`matcher`]: Main orchestrator (`FixMatcher`, builder, `Pipeline` impl)

pub mod advisory;
pub mod candidate;
pub mod config;
pub mod engine;
pub mod error;
pub mod event;
pub mod matcher;
pub mod rank;
pub mod report;
pub mod rules;
pub mod twins;

// --- Public API Re-exports ---

// Orchestrator (main entry point)
pub use matcher::{FixMatcher, FixMatcherBuilder};

// Configuration
pub use config::{MatchEngineConfig, MatchEngineConfigBuilder};

// Error
pub use error::MatchEngineError;

// Events
pub use event::MatchEvent;

// Candidates and reports
pub use candidate::{Annotation, Candidate};
pub use report::{MatchReport, RankedCandidate};

// Rule engine
pub use engine::{EngineState, RuleEngine};
pub use rules::{Phase, PhaseContext, PhaseSetup, Rule, RulePredicate, default_phases};

// Twin detection
pub use twins::{MinHashSignature, TwinIndex, content_tokens};

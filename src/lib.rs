//! automerge - merge pull requests once they are approved and checks pass
//!
//! The library holds the eligibility evaluator, approval aggregation, label
//! classification, and the retry scheduler. The `automerge` binary wires them
//! to the GitHub Actions environment.

pub mod config;
pub mod context;
pub mod error;
pub mod labels;
pub mod merge;
pub mod platform;
pub mod review;
pub mod trigger;
pub mod types;

//! Concurrent build orchestration for the SDK libraries.
//!
//! A fixed [`job::JobCatalog`] is run by an [`orchestrator::Orchestrator`]
//! under a concurrency cap. The first failing build stops any build that has
//! not started yet, and a [`progress::ProgressRenderer`] keeps one status line
//! per build up to date while they run.

pub mod cli;
pub mod config;
pub mod error;
pub mod job;
pub mod orchestrator;
pub mod progress;
pub mod repo;
pub mod report;
pub mod runner;
pub mod summary;
pub mod targets;

//! Runtime crate for the ALS recommendation job.
//!
//! This crate owns the session (worker pool and memory budgets), the job
//! configuration, and the job that runs every stage from model load to
//! report.

pub mod config;
pub mod job;
pub mod session;

pub use config::JobConfig;
pub use job::{JobOutcome, RecommendationJob, RunReport, Stage};
pub use session::{Master, MemorySize, Session, SessionBuilder, SessionError};

mod catalog;
mod outcome;

pub use catalog::{BuildUnit, Job, JobCatalog};
pub use outcome::{JobFailure, JobOutcome, OrchestrationResult};

//! Workflow composition and execution over intermediate files.

mod runner;

pub use runner::{StepReport, Workflow, WorkflowConfig, WorkflowStep};

//! Workflow runner chaining transpose, merge and core steps through files.

use crate::data::MAX_DEPTH;
use crate::error::{Result, TableError};
use crate::filter::{filter_core_file, CoreOptions, PresenceRule};
use crate::merge::{merge_files, ConflictPolicy, MergeOptions};
use crate::transpose::{transpose_file, TransposeOptions};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// A step in a workflow. Each step reads and writes files.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "step", rename_all = "snake_case")]
pub enum WorkflowStep {
    /// Pivot a long-format table into a wide one.
    Transpose {
        input: PathBuf,
        output: PathBuf,
        #[serde(default = "default_depth")]
        depth: usize,
    },
    /// Merge wide tables on their key columns.
    Merge {
        inputs: Vec<PathBuf>,
        output: PathBuf,
        #[serde(default = "default_key_columns")]
        key_columns: usize,
        #[serde(default)]
        conflict: ConflictPolicy,
    },
    /// Extract rows present in enough samples.
    Core {
        input: PathBuf,
        output: PathBuf,
        /// 1-based column of the first sample.
        sample_start_column: usize,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        min_samples: Option<usize>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        min_fraction: Option<f64>,
        #[serde(default)]
        presence: PresenceRule,
    },
}

fn default_depth() -> usize {
    MAX_DEPTH
}

fn default_key_columns() -> usize {
    MergeOptions::default().key_columns
}

impl WorkflowStep {
    /// Short name used in reports.
    pub fn name(&self) -> &'static str {
        match self {
            WorkflowStep::Transpose { .. } => "transpose",
            WorkflowStep::Merge { .. } => "merge",
            WorkflowStep::Core { .. } => "core",
        }
    }
}

/// Workflow configuration for serialization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowConfig {
    /// Name of the workflow.
    pub name: String,
    /// Description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Steps to execute, in order.
    pub steps: Vec<WorkflowStep>,
}

impl WorkflowConfig {
    /// Load from YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml).map_err(TableError::from)
    }

    /// Save to YAML string.
    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self).map_err(TableError::from)
    }

    /// Load from a YAML file.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let yaml = std::fs::read_to_string(path)?;
        Self::from_yaml(&yaml)
    }

    /// A three-stage example: transpose two downloads, merge, take the core.
    pub fn example() -> Self {
        Self {
            name: "subsystems-core".to_string(),
            description: Some(
                "Transpose two subsystem abundance lists, merge them and keep the core"
                    .to_string(),
            ),
            steps: vec![
                WorkflowStep::Transpose {
                    input: PathBuf::from("project_a_subsystems.tsv"),
                    output: PathBuf::from("project_a_wide.tsv"),
                    depth: 3,
                },
                WorkflowStep::Transpose {
                    input: PathBuf::from("project_b_subsystems.tsv"),
                    output: PathBuf::from("project_b_wide.tsv"),
                    depth: 3,
                },
                WorkflowStep::Merge {
                    inputs: vec![
                        PathBuf::from("project_a_wide.tsv"),
                        PathBuf::from("project_b_wide.tsv"),
                    ],
                    output: PathBuf::from("merged_table.tsv"),
                    key_columns: 3,
                    conflict: ConflictPolicy::LastWins,
                },
                WorkflowStep::Core {
                    input: PathBuf::from("merged_table.tsv"),
                    output: PathBuf::from("core_subsystems.tsv"),
                    sample_start_column: 4,
                    min_samples: None,
                    min_fraction: Some(0.8),
                    presence: PresenceRule::Literal,
                },
            ],
        }
    }
}

/// Outcome of one executed step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepReport {
    pub step: String,
    pub output: PathBuf,
    /// Data rows written.
    pub n_rows: usize,
}

impl fmt::Display for StepReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {} rows -> {:?}", self.step, self.n_rows, self.output)
    }
}

/// Builder for constructing and running workflows.
#[derive(Debug, Clone)]
pub struct Workflow {
    steps: Vec<WorkflowStep>,
    name: String,
    base_dir: Option<PathBuf>,
}

impl Default for Workflow {
    fn default() -> Self {
        Self::new()
    }
}

impl Workflow {
    /// Create a new empty workflow.
    pub fn new() -> Self {
        Self {
            steps: Vec::new(),
            name: "unnamed".to_string(),
            base_dir: None,
        }
    }

    /// Create from a config.
    pub fn from_config(config: &WorkflowConfig) -> Self {
        Self {
            steps: config.steps.clone(),
            name: config.name.clone(),
            base_dir: None,
        }
    }

    /// Set the workflow name.
    pub fn name(mut self, name: &str) -> Self {
        self.name = name.to_string();
        self
    }

    /// Resolve relative paths against this directory.
    pub fn base_dir<P: Into<PathBuf>>(mut self, dir: P) -> Self {
        self.base_dir = Some(dir.into());
        self
    }

    /// Add a transpose step.
    pub fn transpose<P: Into<PathBuf>, Q: Into<PathBuf>>(
        mut self,
        input: P,
        output: Q,
        depth: usize,
    ) -> Self {
        self.steps.push(WorkflowStep::Transpose {
            input: input.into(),
            output: output.into(),
            depth,
        });
        self
    }

    /// Add a merge step.
    pub fn merge<Q: Into<PathBuf>>(
        mut self,
        inputs: Vec<PathBuf>,
        output: Q,
        options: MergeOptions,
    ) -> Self {
        self.steps.push(WorkflowStep::Merge {
            inputs,
            output: output.into(),
            key_columns: options.key_columns,
            conflict: options.conflict,
        });
        self
    }

    /// Add a core step with a fractional threshold.
    pub fn core<P: Into<PathBuf>, Q: Into<PathBuf>>(
        mut self,
        input: P,
        output: Q,
        sample_start_column: usize,
        min_fraction: f64,
    ) -> Self {
        self.steps.push(WorkflowStep::Core {
            input: input.into(),
            output: output.into(),
            sample_start_column,
            min_samples: None,
            min_fraction: Some(min_fraction),
            presence: PresenceRule::default(),
        });
        self
    }

    /// Execute every step in order, stopping at the first failure.
    pub fn run(&self) -> Result<Vec<StepReport>> {
        if self.steps.is_empty() {
            return Err(TableError::InvalidParameter(format!(
                "Workflow '{}' has no steps",
                self.name
            )));
        }

        log::info!("Running workflow '{}' ({} steps)", self.name, self.steps.len());
        let mut reports = Vec::with_capacity(self.steps.len());

        for (idx, step) in self.steps.iter().enumerate() {
            log::debug!("Step {}: {}", idx + 1, step.name());
            let report = self.execute_step(step)?;
            log::info!("{}", report);
            reports.push(report);
        }

        Ok(reports)
    }

    fn execute_step(&self, step: &WorkflowStep) -> Result<StepReport> {
        match step {
            WorkflowStep::Transpose {
                input,
                output,
                depth,
            } => {
                let output = self.resolve(output);
                let matrix = transpose_file(
                    self.resolve(input),
                    &output,
                    &TransposeOptions { depth: *depth },
                )?;
                Ok(StepReport {
                    step: step.name().to_string(),
                    output,
                    n_rows: matrix.n_keys(),
                })
            }
            WorkflowStep::Merge {
                inputs,
                output,
                key_columns,
                conflict,
            } => {
                let inputs: Vec<PathBuf> = inputs.iter().map(|p| self.resolve(p)).collect();
                let output = self.resolve(output);
                let merged = merge_files(
                    &inputs,
                    &output,
                    &MergeOptions {
                        key_columns: *key_columns,
                        conflict: *conflict,
                    },
                )?;
                Ok(StepReport {
                    step: step.name().to_string(),
                    output,
                    n_rows: merged.n_rows(),
                })
            }
            WorkflowStep::Core {
                input,
                output,
                sample_start_column,
                min_samples,
                min_fraction,
                presence,
            } => {
                let options = CoreOptions::from_column_number(
                    *sample_start_column,
                    *min_samples,
                    *min_fraction,
                    *presence,
                )?;
                let output = self.resolve(output);
                let summary = filter_core_file(self.resolve(input), &output, &options)?;
                Ok(StepReport {
                    step: step.name().to_string(),
                    output,
                    n_rows: summary.n_core,
                })
            }
        }
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        match &self.base_dir {
            Some(base) if path.is_relative() => base.join(path),
            _ => path.to_path_buf(),
        }
    }
}

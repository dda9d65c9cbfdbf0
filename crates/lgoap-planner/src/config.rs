//! Planner configuration.

use std::path::Path;

use anyhow::{ensure, Context, Result};
use serde::{Deserialize, Serialize};

/// Where planning passes run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlanningMode {
    /// On the caller's thread, inside `tick`.
    #[default]
    Synchronous,
    /// On a worker thread; the result is published on a later tick.
    Job,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlannerConfig {
    pub mode: PlanningMode,

    /// Heuristic returned while a target is not achieved. Must be positive.
    #[serde(default = "default_unachieved_heuristic")]
    pub unachieved_heuristic: f32,

    /// Outer IDA* iterations per layer before the fallback plan is used.
    #[serde(default = "default_max_ida_iterations")]
    pub max_ida_iterations: usize,

    /// Trace events kept per planning pass; 0 disables recording.
    #[serde(default = "default_trace_capacity")]
    pub trace_capacity: usize,
}

fn default_unachieved_heuristic() -> f32 {
    1.0
}

fn default_max_ida_iterations() -> usize {
    64
}

fn default_trace_capacity() -> usize {
    256
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            mode: PlanningMode::default(),
            unachieved_heuristic: default_unachieved_heuristic(),
            max_ida_iterations: default_max_ida_iterations(),
            trace_capacity: default_trace_capacity(),
        }
    }
}

impl PlannerConfig {
    pub fn with_mode(mut self, mode: PlanningMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn validate(&self) -> Result<()> {
        ensure!(
            self.unachieved_heuristic.is_finite() && self.unachieved_heuristic > 0.0,
            "unachieved_heuristic must be a positive finite number, got {}",
            self.unachieved_heuristic
        );
        ensure!(
            self.max_ida_iterations > 0,
            "max_ida_iterations must be at least 1"
        );
        Ok(())
    }

    pub fn from_yaml_str(content: &str) -> Result<Self> {
        let config: Self =
            serde_yaml::from_str(content).context("Failed to parse planner config")?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a YAML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read planner config from {}", path.display()))?;
        Self::from_yaml_str(&content)
            .with_context(|| format!("Invalid planner config in {}", path.display()))
    }
}

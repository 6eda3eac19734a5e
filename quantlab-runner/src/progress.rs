//! Optimization progress reporting.
//!
//! The optimizer hands a snapshot to an optional callback between evaluation
//! batches; nothing in the core pushes notifications anywhere. Callers poll
//! or forward as they see fit.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OptimizationStatus {
    Running,
    Completed,
    Cancelled,
    TimedOut,
}

/// Point-in-time snapshot of a running optimization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizationProgress {
    pub status: OptimizationStatus,
    /// 0.0–100.0.
    pub progress_percentage: f64,
    pub current_iteration: usize,
    pub total_iterations: usize,
    pub best_score_so_far: Option<f64>,
    /// Linear extrapolation from throughput so far; `None` before the first
    /// batch completes.
    pub estimated_completion_secs: Option<f64>,
}

impl OptimizationProgress {
    pub fn new(total_iterations: usize) -> Self {
        Self {
            status: OptimizationStatus::Running,
            progress_percentage: 0.0,
            current_iteration: 0,
            total_iterations,
            best_score_so_far: None,
            estimated_completion_secs: None,
        }
    }

    /// Update counters after a batch of `completed` evaluations.
    pub fn advance(&mut self, completed: usize, best: Option<f64>, elapsed_secs: f64) {
        self.current_iteration += completed;
        if self.total_iterations > 0 {
            self.progress_percentage =
                (self.current_iteration as f64 / self.total_iterations as f64 * 100.0).min(100.0);
        }
        self.best_score_so_far = best;
        if self.current_iteration > 0 && self.current_iteration < self.total_iterations {
            let per_eval = elapsed_secs / self.current_iteration as f64;
            let remaining = (self.total_iterations - self.current_iteration) as f64;
            self.estimated_completion_secs = Some(per_eval * remaining);
        } else {
            self.estimated_completion_secs = None;
        }
    }
}

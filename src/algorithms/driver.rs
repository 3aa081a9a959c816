//! Search driver: configures the CP solver and runs the
//! `Built -> Solving -> {Optimal, Feasible, Infeasible, Timeout}` state machine
//! (§4.4). The diagnostic retry on a proven-infeasible result (§7, error kind 3)
//! needs to rebuild the whole model with zeroed objective weights, so it is owned
//! by the top-level orchestrator in [`crate::run`], not by this module: this
//! module only knows how to run one already-built model and classify what came
//! back.

use std::time::Instant;

use cp_sat::builder::CpModelBuilder;
use cp_sat::proto::{CpSolverStatus, SatParameters};
use log::info;
use serde::{Deserialize, Serialize};

use crate::error::{SolverError, SolverResult};

/// Search driver configuration (§4.4): wall-clock time limit, worker count and
/// seed. Constructible the same three ways as [`super::objective::ObjectiveWeights`]:
/// `Default`, setters, or a TOML document via [`SearchConfig::from_toml_str`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SearchConfig {
    #[serde(default = "default_time_limit_secs")]
    pub time_limit_secs: f64,
    /// Requested worker count; the resolved count is `min(this, CPUs)`, see
    /// [`SearchConfig::resolved_worker_count`].
    #[serde(default = "default_worker_count")]
    pub worker_count: u32,
    #[serde(default = "default_seed")]
    pub seed: i64,
}

fn default_time_limit_secs() -> f64 {
    300.0
}
fn default_worker_count() -> u32 {
    12
}
fn default_seed() -> i64 {
    42
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            time_limit_secs: default_time_limit_secs(),
            worker_count: default_worker_count(),
            seed: default_seed(),
        }
    }
}

impl SearchConfig {
    /// Parses a search configuration from a TOML document; unknown keys are
    /// rejected with their exact path, mirroring [`super::objective::ObjectiveWeights::from_toml_str`].
    pub fn from_toml_str(document: &str) -> SolverResult<Self> {
        let de = toml::Deserializer::new(document);
        serde_path_to_error::deserialize(de)
            .map_err(|e| SolverError::InputInvalid(format!("search config: {e}")))
    }

    pub fn with_time_limit_secs(mut self, value: f64) -> Self {
        self.time_limit_secs = value;
        self
    }
    pub fn with_worker_count(mut self, value: u32) -> Self {
        self.worker_count = value;
        self
    }
    pub fn with_seed(mut self, value: i64) -> Self {
        self.seed = value;
        self
    }

    /// `min(CPUs, worker_count)` (§4.4's default worker policy, generalized to a
    /// configurable request rather than the hard-coded 12).
    pub fn resolved_worker_count(&self) -> u32 {
        let cpus = std::thread::available_parallelism()
            .map(|n| n.get() as u32)
            .unwrap_or(1);
        self.worker_count.min(cpus.max(1)).max(1)
    }

    fn to_sat_parameters(&self) -> SatParameters {
        let mut params = SatParameters::default();
        params.max_time_in_seconds = Some(self.time_limit_secs);
        params.num_search_workers = Some(self.resolved_worker_count() as i32);
        params.random_seed = Some(self.seed as i32);
        // FIXED_SEARCH: more systematic than the default portfolio, matching the
        // spec's preference for a deterministic group-first branching order.
        params.search_branching = Some(2);
        params.interleave_search = Some(true);
        params
    }
}

/// The search driver's terminal classification (§4.4's state machine, folding
/// `Built`/`Solving` away since they aren't observable once `solve` returns).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolveStatus {
    /// The objective is proven minimal.
    Optimal,
    /// A feasible solution was found but optimality was not proven (ran out of
    /// time or search budget before closing the gap).
    Feasible,
    /// The solver proved no solution satisfies the hard constraints.
    Infeasible,
    /// The wall-clock limit was reached without ever finding a feasible solution.
    Timeout,
}

/// What one `solve` call produced: the classification plus the raw solver
/// response the caller (the solution extractor) reads assigned values from.
pub struct SolveOutcome {
    pub status: SolveStatus,
    pub objective_value: f64,
    pub wall_seconds: f64,
    pub response: cp_sat::proto::CpSolverResponse,
}

/// Runs the configured CP-SAT solver against a fully-built model.
pub struct SearchDriver {
    config: SearchConfig,
}

impl SearchDriver {
    pub fn new(config: SearchConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    /// Blocks for up to `config.time_limit_secs`, then classifies the result.
    /// Never retries on its own; a proven-infeasible or no-feasible-timeout
    /// result is returned as `Ok` with the matching [`SolveStatus`] so the
    /// caller can decide whether a diagnostic retry applies (§7 policy: only the
    /// orchestrator knows whether this was already the retry pass).
    pub fn solve(&self, model: &mut CpModelBuilder) -> SolveOutcome {
        let params = self.config.to_sat_parameters();
        info!(
            "search driver starting: time_limit={}s workers={} seed={}",
            self.config.time_limit_secs,
            self.config.resolved_worker_count(),
            self.config.seed
        );
        let start = Instant::now();
        let response = model.solve_with_parameters(&params);
        let wall_seconds = start.elapsed().as_secs_f64();

        let status = match response.status() {
            CpSolverStatus::Optimal => SolveStatus::Optimal,
            CpSolverStatus::Feasible => SolveStatus::Feasible,
            CpSolverStatus::Infeasible => SolveStatus::Infeasible,
            // UNKNOWN/MODEL_INVALID: the solver stopped (most often the wall
            // clock) without ever certifying feasibility or infeasibility.
            _ => SolveStatus::Timeout,
        };
        info!(
            "search driver finished: status={status:?} wall={wall_seconds:.1}s objective={}",
            response.objective_value
        );

        SolveOutcome {
            status,
            objective_value: response.objective_value,
            wall_seconds,
            response,
        }
    }
}

/// Converts a terminal [`SolveOutcome`] into the crate's public `Result`,
/// applying §7's policy: `Infeasible` and feasible-less `Timeout` are fatal,
/// everything else carries a calendar forward. `is_diagnostic_retry` only
/// affects logging — the error variant returned is the same either way, since
/// the retry's purpose is confirming the hard system rejected the input, not
/// changing the outcome.
pub fn classify(outcome: &SolveOutcome, is_diagnostic_retry: bool) -> SolverResult<()> {
    match outcome.status {
        SolveStatus::Optimal | SolveStatus::Feasible => Ok(()),
        SolveStatus::Infeasible => {
            if is_diagnostic_retry {
                log::warn!(
                    "diagnostic retry (soft weights zeroed) still infeasible after {:.1}s: hard constraints reject this input",
                    outcome.wall_seconds
                );
            }
            Err(SolverError::SolverInfeasible)
        }
        SolveStatus::Timeout => Err(SolverError::SolverTimeoutNoFeasible {
            wall_seconds: outcome.wall_seconds,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_matches_the_published_defaults() {
        let c = SearchConfig::default();
        assert_eq!(c.time_limit_secs, 300.0);
        assert_eq!(c.worker_count, 12);
        assert_eq!(c.seed, 42);
    }

    #[test]
    fn resolved_worker_count_never_exceeds_request_or_cpus() {
        let c = SearchConfig::default().with_worker_count(1);
        assert_eq!(c.resolved_worker_count(), 1);
    }

    #[test]
    fn unknown_key_in_toml_is_rejected_with_its_path() {
        let err = SearchConfig::from_toml_str("time_limit = 5\n").unwrap_err();
        assert!(err.to_string().contains("search config"));
    }

    fn outcome(status: SolveStatus) -> SolveOutcome {
        SolveOutcome {
            status,
            objective_value: 0.0,
            wall_seconds: 1.0,
            response: cp_sat::proto::CpSolverResponse::default(),
        }
    }

    #[test]
    fn feasible_and_optimal_classify_as_ok() {
        assert!(classify(&outcome(SolveStatus::Optimal), false).is_ok());
        assert!(classify(&outcome(SolveStatus::Feasible), false).is_ok());
    }

    #[test]
    fn infeasible_classifies_as_solver_infeasible() {
        let err = classify(&outcome(SolveStatus::Infeasible), false).unwrap_err();
        assert!(matches!(err, SolverError::SolverInfeasible));
    }

    #[test]
    fn timeout_without_feasible_classifies_as_timeout_error() {
        let err = classify(&outcome(SolveStatus::Timeout), false).unwrap_err();
        assert!(matches!(err, SolverError::SolverTimeoutNoFeasible { .. }));
    }
}

//! Error types surfaced across the crate boundary.
//!
//! One `thiserror`-derived enum per §7 of the spec: each variant carries the
//! offending identifiers so a caller can point an operator at the source row,
//! mirroring the donor crate's `RepositoryError` convention of one enum with one
//! `#[error("...")]` message per failure kind.

use thiserror::Error;

use crate::core::{ClassId, TrainerId, WorkshopId};

pub type SolverResult<T> = Result<T, SolverError>;

#[derive(Debug, Error)]
pub enum SolverError {
    /// A raw input record failed referential-integrity or shape validation
    /// (missing cross-reference, malformed enrollment). Fatal to the run.
    #[error("invalid input: {0}")]
    InputInvalid(String),

    /// An enrollment's admissible slot set became empty after domain reduction.
    #[error("no admissible slots remain for class {class_id} in workshop {workshop_id}: {reason}")]
    DomainEmpty {
        class_id: ClassId,
        workshop_id: WorkshopId,
        reason: String,
    },

    /// Two pins for the same class collide on the same week.
    #[error("class {class_id} has conflicting pins in week {week}")]
    PinConflict { class_id: ClassId, week: u32 },

    /// A trainer's required hours exceed their budget even under perfect grouping.
    #[error("trainer {trainer_id} needs {needed}h but only has {budget}h budgeted")]
    BudgetOver {
        trainer_id: TrainerId,
        needed: u32,
        budget: u32,
    },

    /// The solver proved the model infeasible. The diagnostic retry (soft weights
    /// zeroed) still failed, confirming a hard-constraint contradiction.
    #[error("no feasible schedule exists under the hard constraints")]
    SolverInfeasible,

    /// The solver exhausted its time budget without ever finding a feasible solution.
    #[error("solver timed out after {wall_seconds:.1}s without finding a feasible solution")]
    SolverTimeoutNoFeasible { wall_seconds: f64 },
}

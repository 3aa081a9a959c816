//! Model construction: variables, candidate grouping, constraints, objective,
//! search driver and solution extraction. Everything downstream of the
//! preprocessor's [`crate::preprocessing::PreprocessedModel`].
//!
//! # Components
//!
//! - [`variables`]: one `cp_sat` decision-variable set per meeting instance
//! - [`grouping`]: candidate co-teaching pairs and their boolean variables
//! - [`constraints`]: the hard-constraint catalogue
//! - [`objective`]: the weighted soft objective and its configuration surface
//! - [`driver`]: the search driver's state machine and diagnostic retry
//! - [`extractor`]: reads a solved model back into calendar records

pub mod constraints;
pub mod driver;
pub mod extractor;
pub mod grouping;
pub mod objective;
pub(crate) mod reify;
pub mod variables;

pub use constraints::compile_constraints;
pub use driver::{SearchConfig, SearchDriver, SolveOutcome};
pub use extractor::{CalendarRecord, SolutionExtractor, SolverReport};
pub use objective::{build_objective, ObjectiveWeights};
pub use variables::{build_meeting_vars, GroupCandidate, MeetingVars, VariableSet};

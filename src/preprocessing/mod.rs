//! Domain reduction: raw input records to per-meeting admissible domains.
//!
//! Runs in four stages, each grounded in its own file: referential validation
//! ([`validator`]), per-class slot admissibility ([`admissible`]), per-trainer slot
//! admissibility ([`trainer_mask`]), and pin/external-occupation binding ([`pins`]).
//! [`pipeline`] orchestrates all four into a [`pipeline::PreprocessedModel`].
//! [`budget`] is a separate pre-solve check run by the top-level orchestrator
//! after the pipeline and candidate-pair construction, since it needs both.

pub mod admissible;
pub mod budget;
pub mod pins;
pub mod pipeline;
pub mod trainer_mask;
pub mod validator;

pub use admissible::{build_admissible_slots, Slot};
pub use budget::check_budget_feasibility;
pub use pins::{bind_pins, check_pin_conflicts_across_enrollments, reserve_external};
pub use pipeline::{MeetingDomain, Preprocessor, PreprocessedModel};
pub use trainer_mask::{trainer_allowed_slots, TrainerSlotMask};
pub use validator::{InputValidator, RawInput, ValidationResult};

//! Core domain model for laboratory meeting scheduling.
//!
//! Defines the entities (school, class, trainer, workshop, enrollment), the
//! calendar (horizon, weekdays, half-day bands) and the identifiers that tie them
//! together. Pure data; no solver behavior.

pub mod calendar;
pub mod domain;
pub mod ids;

pub use calendar::{Band, Horizon, WeekSpec, Weekday};
pub use domain::*;
pub use ids::{ClassId, MeetingId, SchoolId, TrainerId, WorkshopId};

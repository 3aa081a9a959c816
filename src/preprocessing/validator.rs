//! Input validation: referential integrity and shape checks on raw records.
//!
//! Runs before domain reduction. Errors here make the run `Input-invalid` (§7,
//! error kind 1) and are always fatal; warnings are informational and do not stop
//! the pipeline, matching the donor crate's `ValidationResult` split between
//! `errors` and `warnings`.

use std::collections::HashSet;

use crate::core::domain::{
    Class, ClassBlackout, ClassTimeSlotPolicy, Enrollment, EnrollmentDetail, School, Trainer,
    TrainerClassPreference, Workshop,
};
use crate::core::ids::{ClassId, SchoolId, TrainerId, WorkshopId};

/// Raw, not-yet-validated input records for one scheduling run.
pub struct RawInput<'a> {
    pub schools: &'a [School],
    pub classes: &'a [Class],
    pub trainers: &'a [Trainer],
    pub workshops: &'a [Workshop],
    pub enrollments: &'a [Enrollment],
    pub policies: &'a [ClassTimeSlotPolicy],
    pub blackouts: &'a [ClassBlackout],
    pub preferences: &'a [TrainerClassPreference],
}

/// Validation outcome: errors make the input invalid, warnings are advisory.
#[derive(Debug, Clone, Default)]
pub struct ValidationResult {
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl ValidationResult {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn add_error(&mut self, error: impl Into<String>) {
        self.errors.push(error.into());
    }

    pub fn add_warning(&mut self, warning: impl Into<String>) {
        self.warnings.push(warning.into());
    }
}

/// Validates referential integrity of raw input records.
pub struct InputValidator;

impl InputValidator {
    /// Checks that every cross-reference in the input resolves to a live entity,
    /// and flags data-quality warnings (zero-availability trainers, zero-count
    /// workshops) that do not by themselves invalidate the input.
    pub fn validate(input: &RawInput) -> ValidationResult {
        let mut result = ValidationResult::new();

        let school_ids: HashSet<SchoolId> = input.schools.iter().map(|s| s.id).collect();
        let class_ids: HashSet<ClassId> = input.classes.iter().map(|c| c.id).collect();
        let trainer_ids: HashSet<TrainerId> = input.trainers.iter().map(|t| t.id).collect();
        let workshop_ids: HashSet<WorkshopId> = input.workshops.iter().map(|w| w.id).collect();

        for class in input.classes {
            if !school_ids.contains(&class.school_id) {
                result.add_error(format!(
                    "class {} references unknown school {}",
                    class.id, class.school_id
                ));
            }
            if let Some(partner) = class.preferred_group_partner_id {
                if !class_ids.contains(&partner) {
                    result.add_error(format!(
                        "class {} references unknown preferred partner {}",
                        class.id, partner
                    ));
                }
            }
        }

        for enrollment in input.enrollments {
            if !class_ids.contains(&enrollment.class_id) {
                result.add_error(format!(
                    "enrollment references unknown class {}",
                    enrollment.class_id
                ));
            }
            if !workshop_ids.contains(&enrollment.workshop_id) {
                result.add_error(format!(
                    "enrollment references unknown workshop {}",
                    enrollment.workshop_id
                ));
            }
            if enrollment.required_meeting_count == 0 {
                result.add_error(format!(
                    "enrollment (class {}, workshop {}) has zero required meetings",
                    enrollment.class_id, enrollment.workshop_id
                ));
            }
            if let Some(trainer_id) = enrollment.fixed_trainer {
                if !trainer_ids.contains(&trainer_id) {
                    result.add_error(format!(
                        "enrollment (class {}, workshop {}) pins unknown trainer {}",
                        enrollment.class_id, enrollment.workshop_id, trainer_id
                    ));
                }
            }
            for pin in &enrollment.pinned_meetings {
                if let Some(trainer_id) = pin.trainer_id {
                    if !trainer_ids.contains(&trainer_id) {
                        result.add_error(format!(
                            "enrollment (class {}, workshop {}) has a pin referencing unknown trainer {}",
                            enrollment.class_id, enrollment.workshop_id, trainer_id
                        ));
                    }
                }
            }
            // `OnlyN` is the parsed detail-note reason an enrollment's override
            // exists in the first place; the external layer is responsible for
            // having already folded it into `required_meeting_count`, so a
            // mismatch here means the two disagree about the true count.
            if let EnrollmentDetail::OnlyN(n) = enrollment.detail {
                if n != enrollment.required_meeting_count {
                    result.add_error(format!(
                        "enrollment (class {}, workshop {}) detail OnlyN({n}) disagrees with required_meeting_count={}",
                        enrollment.class_id, enrollment.workshop_id, enrollment.required_meeting_count
                    ));
                }
            }
            if let EnrollmentDetail::AfternoonCount { count, .. } = enrollment.detail {
                if count > enrollment.required_meeting_count {
                    result.add_error(format!(
                        "enrollment (class {}, workshop {}) requires {count} afternoon meetings but only has {} total",
                        enrollment.class_id, enrollment.workshop_id, enrollment.required_meeting_count
                    ));
                }
            }
        }

        for policy in input.policies {
            if !class_ids.contains(&policy.class_id) {
                result.add_error(format!(
                    "time-slot policy references unknown class {}",
                    policy.class_id
                ));
            }
            if policy.allowed_bands.is_empty() || policy.allowed_weekdays.is_empty() {
                result.add_warning(format!(
                    "class {} time-slot policy allows no bands or no weekdays",
                    policy.class_id
                ));
            }
        }

        for blackout in input.blackouts {
            if !class_ids.contains(&blackout.class_id) {
                result.add_error(format!(
                    "blackout references unknown class {}",
                    blackout.class_id
                ));
            }
        }

        for preference in input.preferences {
            if !trainer_ids.contains(&preference.trainer_id) {
                result.add_error(format!(
                    "trainer preference references unknown trainer {}",
                    preference.trainer_id
                ));
            }
            if !class_ids.contains(&preference.class_id) {
                result.add_error(format!(
                    "trainer preference references unknown class {}",
                    preference.class_id
                ));
            }
        }

        for trainer in input.trainers {
            let has_availability = !trainer.morning_availability.is_empty()
                || !trainer.afternoon_availability.is_empty()
                || trainer.specific_slot_whitelist.as_ref().is_some_and(|w| !w.is_empty());
            if !has_availability {
                result.add_warning(format!(
                    "trainer {} has no morning or afternoon availability and no whitelist",
                    trainer.id
                ));
            }
            if trainer.total_hour_budget == 0 {
                result.add_warning(format!("trainer {} has a zero-hour budget", trainer.id));
            }
        }

        for workshop in input.workshops {
            if workshop.default_meeting_count == 0 && !workshop.external {
                result.add_warning(format!(
                    "workshop {} has a zero default meeting count",
                    workshop.id
                ));
            }
        }

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::domain::{HalfDayPreference, Priority, Year};

    fn school() -> School {
        School { id: SchoolId(1), name: "Acme Primary".into(), may_work_saturday: false }
    }

    fn class() -> Class {
        Class {
            id: ClassId(1),
            name: "3A".into(),
            school_id: SchoolId(1),
            year: Year::Y3,
            priority: Priority::Normal,
            preferred_group_partner_id: None,
        }
    }

    #[test]
    fn flags_unknown_school_reference() {
        let mut bad_class = class();
        bad_class.school_id = SchoolId(999);
        let classes = vec![bad_class];
        let schools = vec![school()];
        let trainers = vec![];
        let workshops = vec![];
        let enrollments = vec![];
        let policies = vec![];
        let blackouts = vec![];
        let preferences = vec![];

        let input = RawInput {
            schools: &schools,
            classes: &classes,
            trainers: &trainers,
            workshops: &workshops,
            enrollments: &enrollments,
            policies: &policies,
            blackouts: &blackouts,
            preferences: &preferences,
        };
        let result = InputValidator::validate(&input);
        assert!(!result.is_valid());
        assert_eq!(result.errors.len(), 1);
    }

    #[test]
    fn clean_input_is_valid_with_no_warnings() {
        let schools = vec![school()];
        let classes = vec![class()];
        let trainers = vec![Trainer {
            id: TrainerId(1),
            name: "T1".into(),
            total_hour_budget: 16,
            average_weekly_hours: 4.0,
            morning_availability: [crate::core::Weekday::Mon].into_iter().collect(),
            afternoon_availability: Default::default(),
            specific_slot_whitelist: None,
            specific_slot_blacklist: Default::default(),
            saturday_allowed: false,
            half_day_preference: HalfDayPreference::Either,
        }];
        let workshops = vec![];
        let enrollments = vec![];
        let policies = vec![];
        let blackouts = vec![];
        let preferences = vec![];

        let input = RawInput {
            schools: &schools,
            classes: &classes,
            trainers: &trainers,
            workshops: &workshops,
            enrollments: &enrollments,
            policies: &policies,
            blackouts: &blackouts,
            preferences: &preferences,
        };
        let result = InputValidator::validate(&input);
        assert!(result.is_valid());
        assert!(result.warnings.is_empty());
    }
}

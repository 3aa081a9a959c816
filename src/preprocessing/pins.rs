//! `bind_pins` and `reserve_external`: folding externally-fixed commitments into
//! an enrollment's domain before the solver ever sees it.

use std::collections::{HashMap, HashSet};

use crate::core::domain::{Enrollment, ExternalOccupation, Pin};
use crate::core::ids::ClassId;
use crate::error::{SolverError, SolverResult};

/// Validates and returns an enrollment's pinned meetings.
///
/// Two pins for the same enrollment may not share a week: a class cannot be in
/// two pinned meetings of the same workshop in the same week (H-PIN, H-COUNT
/// overlap). Anything else is left to the constraint compiler to bind as
/// equalities on the corresponding meeting's week/weekday/band[/trainer] variables.
pub fn bind_pins(enrollment: &Enrollment) -> SolverResult<Vec<Pin>> {
    let mut seen_weeks = HashSet::new();
    for pin in &enrollment.pinned_meetings {
        if !seen_weeks.insert(pin.week) {
            return Err(SolverError::PinConflict {
                class_id: enrollment.class_id,
                week: pin.week,
            });
        }
    }
    Ok(enrollment.pinned_meetings.clone())
}

/// Checks that no two pins for the same class collide on the same week, across
/// *all* of the class's enrollments — not just within one. A class pinned to
/// workshop X in week 5 and to workshop Y in week 5 is exactly as much a
/// conflict as two pins inside the same enrollment: either way the class would
/// need to attend two meetings in one week, which H-CLASS-UNIQ forbids.
pub fn check_pin_conflicts_across_enrollments(enrollments: &[Enrollment]) -> SolverResult<()> {
    let mut weeks_by_class: HashMap<ClassId, HashSet<u32>> = HashMap::new();
    for enrollment in enrollments {
        let seen_weeks = weeks_by_class.entry(enrollment.class_id).or_default();
        for pin in &enrollment.pinned_meetings {
            if !seen_weeks.insert(pin.week) {
                return Err(SolverError::PinConflict {
                    class_id: enrollment.class_id,
                    week: pin.week,
                });
            }
        }
    }
    Ok(())
}

/// Weeks pre-consumed by external (non-covered) workshops for a class.
///
/// These weeks are removed from the class's admissible domain wholesale
/// (H-EXTERNAL-BLOCK): no covered meeting of any workshop may land there.
pub fn reserve_external(class_id: ClassId, occupations: &[ExternalOccupation]) -> HashSet<u32> {
    occupations
        .iter()
        .filter(|o| o.class_id == class_id)
        .map(|o| o.week)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::calendar::{Band, Weekday};
    use crate::core::domain::EnrollmentDetail;
    use crate::core::ids::WorkshopId;

    fn enrollment_with_pins(pins: Vec<Pin>) -> Enrollment {
        Enrollment {
            class_id: ClassId(1),
            workshop_id: WorkshopId(1),
            required_meeting_count: 2,
            detail: EnrollmentDetail::None,
            pinned_meetings: pins,
            fixed_trainer: None,
        }
    }

    #[test]
    fn distinct_weeks_bind_cleanly() {
        let pins = vec![
            Pin { week: 1, weekday: Weekday::Mon, band: Band::M1, trainer_id: None },
            Pin { week: 3, weekday: Weekday::Tue, band: Band::P, trainer_id: None },
        ];
        let bound = bind_pins(&enrollment_with_pins(pins.clone())).unwrap();
        assert_eq!(bound, pins);
    }

    #[test]
    fn same_week_pins_conflict() {
        let pins = vec![
            Pin { week: 1, weekday: Weekday::Mon, band: Band::M1, trainer_id: None },
            Pin { week: 1, weekday: Weekday::Tue, band: Band::P, trainer_id: None },
        ];
        let err = bind_pins(&enrollment_with_pins(pins)).unwrap_err();
        assert!(matches!(err, SolverError::PinConflict { week: 1, .. }));
    }

    #[test]
    fn reserve_external_filters_by_class() {
        let occupations = vec![
            ExternalOccupation { class_id: ClassId(1), week: 2 },
            ExternalOccupation { class_id: ClassId(2), week: 4 },
        ];
        let reserved = reserve_external(ClassId(1), &occupations);
        assert_eq!(reserved, [2].into_iter().collect());
    }

    #[test]
    fn same_week_pins_conflict_across_different_workshops() {
        let class_id = ClassId(1);
        let first = Enrollment {
            class_id,
            workshop_id: WorkshopId(1),
            required_meeting_count: 1,
            detail: EnrollmentDetail::None,
            pinned_meetings: vec![Pin {
                week: 5,
                weekday: Weekday::Mon,
                band: Band::M1,
                trainer_id: None,
            }],
            fixed_trainer: None,
        };
        let second = Enrollment {
            class_id,
            workshop_id: WorkshopId(2),
            required_meeting_count: 1,
            detail: EnrollmentDetail::None,
            pinned_meetings: vec![Pin {
                week: 5,
                weekday: Weekday::Tue,
                band: Band::M1,
                trainer_id: None,
            }],
            fixed_trainer: None,
        };

        let err = check_pin_conflicts_across_enrollments(&[first, second]).unwrap_err();
        assert!(matches!(err, SolverError::PinConflict { week: 5, .. }));
    }

    #[test]
    fn distinct_weeks_across_workshops_do_not_conflict() {
        let class_id = ClassId(1);
        let first = Enrollment {
            class_id,
            workshop_id: WorkshopId(1),
            required_meeting_count: 1,
            detail: EnrollmentDetail::None,
            pinned_meetings: vec![Pin {
                week: 5,
                weekday: Weekday::Mon,
                band: Band::M1,
                trainer_id: None,
            }],
            fixed_trainer: None,
        };
        let second = Enrollment {
            class_id,
            workshop_id: WorkshopId(2),
            required_meeting_count: 1,
            detail: EnrollmentDetail::None,
            pinned_meetings: vec![Pin {
                week: 6,
                weekday: Weekday::Tue,
                band: Band::M1,
                trainer_id: None,
            }],
            fixed_trainer: None,
        };

        assert!(check_pin_conflicts_across_enrollments(&[first, second]).is_ok());
    }
}

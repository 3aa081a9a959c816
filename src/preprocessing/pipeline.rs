//! `Preprocessor`: orchestrates validation and domain reduction into `Dom(m)` for
//! every meeting instance, per the data-flow diagram (Domain → Preprocessor →
//! Variable builder → ...).

use std::collections::{HashMap, HashSet};

use crate::core::calendar::{Band, Horizon, Weekday};
use crate::core::domain::{
    Class, ClassBlackout, ClassTimeSlotPolicy, Enrollment, ExternalOccupation, Pin, PolicyMode,
    School, Trainer, TrainerClassPreference, Workshop,
};
use crate::core::ids::{ClassId, MeetingId, TrainerId};
use crate::error::{SolverError, SolverResult};

use super::admissible::{build_admissible_slots, Slot};
use super::pins::{bind_pins, check_pin_conflicts_across_enrollments, reserve_external};
use super::trainer_mask::trainer_allowed_slots;
use super::validator::{InputValidator, RawInput};

/// The admissible domain for one meeting instance, before any solver variable
/// exists for it. `slots` is empty iff `pin` is `Some` (a pinned meeting has no
/// free (week, weekday, band) choice left).
#[derive(Debug, Clone)]
pub struct MeetingDomain {
    pub meeting_id: MeetingId,
    pub slots: HashSet<Slot>,
    pub trainers: Vec<TrainerId>,
    pub pin: Option<Pin>,
}

/// The full set of per-meeting domains produced by the preprocessor, plus any
/// advisory warnings collected along the way (never fatal).
#[derive(Debug, Clone, Default)]
pub struct PreprocessedModel {
    pub meetings: Vec<MeetingDomain>,
    pub warnings: Vec<String>,
}

fn unrestricted_policy(class_id: ClassId) -> ClassTimeSlotPolicy {
    ClassTimeSlotPolicy {
        class_id,
        allowed_bands: Band::ALL.into_iter().collect(),
        allowed_weekdays: Weekday::ALL.into_iter().collect(),
        mode: PolicyMode::Hard,
        forbidden_weekday_band_pairs: HashSet::new(),
    }
}

pub struct Preprocessor;

impl Preprocessor {
    /// Runs validation then domain reduction over the full raw input, producing
    /// one [`MeetingDomain`] per emitted meeting instance (H-COUNT).
    #[allow(clippy::too_many_arguments)]
    pub fn run(
        horizon: &Horizon,
        schools: &[School],
        classes: &[Class],
        trainers: &[Trainer],
        workshops: &[Workshop],
        enrollments: &[Enrollment],
        policies: &[ClassTimeSlotPolicy],
        blackouts: &[ClassBlackout],
        preferences: &[TrainerClassPreference],
        external: &[ExternalOccupation],
    ) -> SolverResult<PreprocessedModel> {
        let raw = RawInput {
            schools,
            classes,
            trainers,
            workshops,
            enrollments,
            policies,
            blackouts,
            preferences,
        };
        let validation = InputValidator::validate(&raw);
        if !validation.is_valid() {
            return Err(SolverError::InputInvalid(validation.errors.join("; ")));
        }

        // Pin conflicts are checked across every enrollment of a class up front:
        // two pins landing on the same week are a conflict whether they belong to
        // the same workshop or two different ones (H-CLASS-UNIQ binds the whole
        // class, not one enrollment at a time).
        check_pin_conflicts_across_enrollments(enrollments)?;

        let class_by_id: HashMap<ClassId, &Class> = classes.iter().map(|c| (c.id, c)).collect();
        let policy_by_class: HashMap<ClassId, &ClassTimeSlotPolicy> =
            policies.iter().map(|p| (p.class_id, p)).collect();
        let blackout_by_class: HashMap<ClassId, &ClassBlackout> =
            blackouts.iter().map(|b| (b.class_id, b)).collect();

        let mut meetings = Vec::new();
        let mut warnings = validation.warnings;

        for enrollment in enrollments {
            let class = class_by_id
                .get(&enrollment.class_id)
                .copied()
                .expect("validated above");

            let fallback_policy = unrestricted_policy(enrollment.class_id);
            let policy = policy_by_class
                .get(&enrollment.class_id)
                .copied()
                .unwrap_or(&fallback_policy);
            let blackout = blackout_by_class.get(&enrollment.class_id).copied();

            let mut free_slots = build_admissible_slots(class, horizon, policy, blackout);

            let reserved_weeks = reserve_external(enrollment.class_id, external);
            free_slots.retain(|(week, _, _)| !reserved_weeks.contains(week));

            if let Some(req) = enrollment.half_day_requirement() {
                free_slots.retain(|(_, _, band)| req.allows(*band));
            }

            let eligible_trainers: Vec<TrainerId> = match enrollment.fixed_trainer {
                Some(fixed) => vec![fixed],
                None => trainers
                    .iter()
                    .filter(|t| {
                        let allowed = trainer_allowed_slots(horizon, t);
                        free_slots.iter().any(|(week, wday, band)| allowed.contains(&(*week, *wday, *band)))
                    })
                    .map(|t| t.id)
                    .collect(),
            };

            if enrollment.fixed_trainer.is_none() && eligible_trainers.is_empty() {
                return Err(SolverError::DomainEmpty {
                    class_id: enrollment.class_id,
                    workshop_id: enrollment.workshop_id,
                    reason: "no trainer has any slot overlap with this enrollment's domain".into(),
                });
            }

            let mut pins = bind_pins(enrollment)?;
            pins.sort_by_key(|p| p.week);

            let pinned_count = pins.len() as u32;
            if pinned_count > enrollment.required_meeting_count {
                return Err(SolverError::InputInvalid(format!(
                    "enrollment (class {}, workshop {}) has more pins than required meetings",
                    enrollment.class_id, enrollment.workshop_id
                )));
            }

            let mut pins = pins.into_iter();
            for ordinal in 0..enrollment.required_meeting_count {
                let meeting_id = MeetingId {
                    class_id: enrollment.class_id,
                    workshop_id: enrollment.workshop_id,
                    ordinal,
                };

                if ordinal < pinned_count {
                    let pin = pins.next().expect("pinned_count bounds this");
                    meetings.push(MeetingDomain {
                        meeting_id,
                        slots: HashSet::new(),
                        trainers: match pin.trainer_id {
                            Some(t) => vec![t],
                            None => eligible_trainers.clone(),
                        },
                        pin: Some(pin),
                    });
                    continue;
                }

                if free_slots.is_empty() {
                    return Err(SolverError::DomainEmpty {
                        class_id: enrollment.class_id,
                        workshop_id: enrollment.workshop_id,
                        reason: "no admissible (week, weekday, band) remains after reduction"
                            .into(),
                    });
                }

                meetings.push(MeetingDomain {
                    meeting_id,
                    slots: free_slots.clone(),
                    trainers: eligible_trainers.clone(),
                    pin: None,
                });
            }
        }

        if meetings.is_empty() {
            warnings.push("preprocessor produced zero meeting instances".into());
        }

        Ok(PreprocessedModel { meetings, warnings })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::domain::{EnrollmentDetail, HalfDayPreference, Priority, Year};
    use crate::core::ids::{SchoolId, WorkshopId};
    use chrono::NaiveDate;

    fn horizon() -> Horizon {
        Horizon::default_16_week(NaiveDate::from_ymd_opt(2026, 9, 7).unwrap())
    }

    fn school() -> School {
        School { id: SchoolId(1), name: "Acme".into(), may_work_saturday: false }
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

    fn trainer() -> Trainer {
        Trainer {
            id: TrainerId(1),
            name: "T1".into(),
            total_hour_budget: 100,
            average_weekly_hours: 5.0,
            morning_availability: Weekday::ALL.into_iter().collect(),
            afternoon_availability: Weekday::ALL.into_iter().collect(),
            specific_slot_whitelist: None,
            specific_slot_blacklist: HashSet::new(),
            saturday_allowed: false,
            half_day_preference: HalfDayPreference::Either,
        }
    }

    fn workshop() -> Workshop {
        Workshop {
            id: WorkshopId(1),
            name: "Lab safety".into(),
            default_meeting_count: 2,
            hours_per_meeting: 2,
            default_ordering_rank: 0,
            external: false,
            must_be_last: false,
        }
    }

    #[test]
    fn emits_one_domain_per_required_meeting() {
        let enrollment = Enrollment {
            class_id: ClassId(1),
            workshop_id: WorkshopId(1),
            required_meeting_count: 2,
            detail: EnrollmentDetail::None,
            pinned_meetings: vec![],
            fixed_trainer: None,
        };

        let model = Preprocessor::run(
            &horizon(),
            &[school()],
            &[class()],
            &[trainer()],
            &[workshop()],
            &[enrollment],
            &[],
            &[],
            &[],
            &[],
        )
        .unwrap();

        assert_eq!(model.meetings.len(), 2);
        assert!(model.meetings.iter().all(|m| m.pin.is_none() && !m.slots.is_empty()));
    }

    #[test]
    fn pinned_meeting_has_no_free_slots() {
        let pin = Pin { week: 2, weekday: Weekday::Mon, band: Band::M1, trainer_id: Some(TrainerId(1)) };
        let enrollment = Enrollment {
            class_id: ClassId(1),
            workshop_id: WorkshopId(1),
            required_meeting_count: 2,
            detail: EnrollmentDetail::None,
            pinned_meetings: vec![pin],
            fixed_trainer: None,
        };

        let model = Preprocessor::run(
            &horizon(),
            &[school()],
            &[class()],
            &[trainer()],
            &[workshop()],
            &[enrollment],
            &[],
            &[],
            &[],
            &[],
        )
        .unwrap();

        let pinned = model.meetings.iter().find(|m| m.pin.is_some()).unwrap();
        assert!(pinned.slots.is_empty());
        assert_eq!(pinned.trainers, vec![TrainerId(1)]);
    }

    #[test]
    fn external_occupation_removes_week_from_domain() {
        let enrollment = Enrollment {
            class_id: ClassId(1),
            workshop_id: WorkshopId(1),
            required_meeting_count: 1,
            detail: EnrollmentDetail::None,
            pinned_meetings: vec![],
            fixed_trainer: None,
        };
        let external = vec![];
        let model_unreserved = Preprocessor::run(
            &horizon(), &[school()], &[class()], &[trainer()], &[workshop()],
            &[enrollment.clone()], &[], &[], &[], &external,
        ).unwrap();
        let has_week_2 = model_unreserved.meetings[0].slots.iter().any(|(w, _, _)| *w == 2);
        assert!(has_week_2);

        let reserved = vec![ExternalOccupation { class_id: ClassId(1), week: 2 }];
        let model_reserved = Preprocessor::run(
            &horizon(), &[school()], &[class()], &[trainer()], &[workshop()],
            &[enrollment], &[], &[], &[], &reserved,
        ).unwrap();
        assert!(!model_reserved.meetings[0].slots.iter().any(|(w, _, _)| *w == 2));
    }

    #[test]
    fn empty_domain_raises_domain_empty() {
        let mut policy = unrestricted_policy(ClassId(1));
        policy.allowed_bands = HashSet::new();
        let enrollment = Enrollment {
            class_id: ClassId(1),
            workshop_id: WorkshopId(1),
            required_meeting_count: 1,
            detail: EnrollmentDetail::None,
            pinned_meetings: vec![],
            fixed_trainer: None,
        };

        let err = Preprocessor::run(
            &horizon(), &[school()], &[class()], &[trainer()], &[workshop()],
            &[enrollment], &[policy], &[], &[], &[],
        )
        .unwrap_err();
        assert!(matches!(err, SolverError::DomainEmpty { .. }));
    }
}

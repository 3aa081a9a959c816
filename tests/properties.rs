//! Property tests for the universal invariants (P1-P13) over small randomly
//! generated instances. Kept deliberately tiny (few classes, one workshop, an
//! always-sufficient trainer budget) so every generated instance is feasible
//! and the solver's own wall-clock budget is never a factor.

use std::collections::HashSet;

use chrono::NaiveDate;
use proptest::prelude::*;

use lab_scheduler_core::core::calendar::{Horizon, Weekday};
use lab_scheduler_core::core::domain::{
    Class, Enrollment, EnrollmentDetail, HalfDayPreference, Priority, School, Trainer, Workshop,
    Year,
};
use lab_scheduler_core::core::ids::{ClassId, SchoolId, TrainerId, WorkshopId};
use lab_scheduler_core::{run, ObjectiveWeights, SchedulingInput, SearchConfig};

fn horizon() -> Horizon {
    Horizon::default_16_week(NaiveDate::from_ymd_opt(2026, 9, 7).unwrap())
}

fn build_instance(class_count: u32, meeting_count: u32) -> (
    Horizon,
    Vec<School>,
    Vec<Class>,
    Vec<Trainer>,
    Vec<Workshop>,
    Vec<Enrollment>,
) {
    let h = horizon();
    let schools = vec![School { id: SchoolId(1), name: "S".into(), may_work_saturday: false }];
    let classes: Vec<Class> = (1..=class_count)
        .map(|i| Class {
            id: ClassId(i as i64),
            name: format!("C{i}"),
            school_id: SchoolId(1),
            year: Year::Y3,
            priority: Priority::Normal,
            preferred_group_partner_id: None,
        })
        .collect();
    let trainers = vec![Trainer {
        id: TrainerId(1),
        name: "T".into(),
        // Ample budget: even with no grouping at all, `class_count * meeting_count * 2`
        // hours never exceeds this for the bounded ranges proptest generates below.
        total_hour_budget: 10_000,
        average_weekly_hours: 20.0,
        morning_availability: Weekday::ALL.into_iter().collect(),
        afternoon_availability: Weekday::ALL.into_iter().collect(),
        specific_slot_whitelist: None,
        specific_slot_blacklist: HashSet::new(),
        saturday_allowed: false,
        half_day_preference: HalfDayPreference::Either,
    }];
    let workshops = vec![Workshop {
        id: WorkshopId(1),
        name: "W".into(),
        default_meeting_count: meeting_count,
        hours_per_meeting: 2,
        default_ordering_rank: 0,
        external: false,
        must_be_last: false,
    }];
    let enrollments: Vec<Enrollment> = classes
        .iter()
        .map(|c| Enrollment {
            class_id: c.id,
            workshop_id: WorkshopId(1),
            required_meeting_count: meeting_count,
            detail: EnrollmentDetail::None,
            pinned_meetings: vec![],
            fixed_trainer: None,
        })
        .collect();

    (h, schools, classes, trainers, workshops, enrollments)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(12))]

    /// P1: every enrollment gets exactly its required number of meeting records.
    /// P2: a class never has two meetings in the same week.
    #[test]
    fn p1_and_p2_hold_for_small_instances(class_count in 1u32..4, meeting_count in 1u32..4) {
        let (h, schools, classes, trainers, workshops, enrollments) =
            build_instance(class_count, meeting_count);

        let input = SchedulingInput {
            horizon: &h,
            schools: &schools,
            classes: &classes,
            trainers: &trainers,
            workshops: &workshops,
            enrollments: &enrollments,
            policies: &[],
            blackouts: &[],
            trainer_preferences: &[],
            grouping_preferences: &[],
            external_occupations: &[],
            ordering_rules: &[],
            autonomous_gap_rules: &[],
            preferred_sequence: &[],
        };

        let output = run(&input, &ObjectiveWeights::default(), &SearchConfig::default())
            .expect("small ample-budget instance must be feasible");

        for class in &classes {
            let records: Vec<_> = output.calendar.iter().filter(|r| r.class_id == class.id).collect();
            prop_assert_eq!(records.len() as u32, meeting_count);

            let weeks: HashSet<u32> = records.iter().map(|r| r.week).collect();
            prop_assert_eq!(weeks.len(), records.len());
        }
    }

    /// P4: a trainer's billed hours (co-taught meetings counted once) never
    /// exceed their budget.
    #[test]
    fn p4_trainer_hours_never_exceed_budget(class_count in 1u32..4, meeting_count in 1u32..3) {
        let (h, schools, classes, trainers, workshops, enrollments) =
            build_instance(class_count, meeting_count);

        let input = SchedulingInput {
            horizon: &h,
            schools: &schools,
            classes: &classes,
            trainers: &trainers,
            workshops: &workshops,
            enrollments: &enrollments,
            policies: &[],
            blackouts: &[],
            trainer_preferences: &[],
            grouping_preferences: &[],
            external_occupations: &[],
            ordering_rules: &[],
            autonomous_gap_rules: &[],
            preferred_sequence: &[],
        };

        let output = run(&input, &ObjectiveWeights::default(), &SearchConfig::default())
            .expect("small ample-budget instance must be feasible");

        for hours in &output.report.per_trainer_hours {
            prop_assert!(hours.used <= hours.budget);
        }
    }

    /// P11: a realized grouping's two meetings always share week/weekday/band/
    /// trainer, and `co_taught_with` never lists more than one partner
    /// (H-GROUP-CAP).
    #[test]
    fn p11_realized_groupings_coincide_on_every_axis(class_count in 2u32..4, meeting_count in 1u32..3) {
        let (h, schools, classes, trainers, workshops, enrollments) =
            build_instance(class_count, meeting_count);

        let input = SchedulingInput {
            horizon: &h,
            schools: &schools,
            classes: &classes,
            trainers: &trainers,
            workshops: &workshops,
            enrollments: &enrollments,
            policies: &[],
            blackouts: &[],
            trainer_preferences: &[],
            grouping_preferences: &[],
            external_occupations: &[],
            ordering_rules: &[],
            autonomous_gap_rules: &[],
            preferred_sequence: &[],
        };

        let output = run(&input, &ObjectiveWeights::default(), &SearchConfig::default())
            .expect("small ample-budget instance must be feasible");

        for record in &output.calendar {
            prop_assert!(record.co_taught_with.len() <= 1);
            for partner_class in &record.co_taught_with {
                let partner_record = output
                    .calendar
                    .iter()
                    .find(|r| r.class_id == *partner_class && r.workshop_id == record.workshop_id && r.ordinal == record.ordinal);
                if let Some(partner) = partner_record {
                    prop_assert_eq!(partner.week, record.week);
                    prop_assert_eq!(partner.weekday, record.weekday);
                    prop_assert_eq!(partner.band, record.band);
                    prop_assert_eq!(partner.trainer_id, record.trainer_id);
                }
            }
        }
    }
}

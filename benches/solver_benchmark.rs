use std::collections::HashSet;

use chrono::NaiveDate;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use lab_scheduler_core::core::calendar::{Horizon, Weekday};
use lab_scheduler_core::core::domain::{
    Class, Enrollment, EnrollmentDetail, HalfDayPreference, Priority, School, Trainer, Workshop,
    Year,
};
use lab_scheduler_core::core::ids::{ClassId, SchoolId, TrainerId, WorkshopId};
use lab_scheduler_core::{run, ObjectiveWeights, SchedulingInput, SearchConfig};

fn scale_instance(class_count: u32) -> (
    Horizon,
    Vec<School>,
    Vec<Class>,
    Vec<Trainer>,
    Vec<Workshop>,
    Vec<Enrollment>,
) {
    let horizon = Horizon::default_16_week(NaiveDate::from_ymd_opt(2026, 9, 7).unwrap());
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
        total_hour_budget: 100_000,
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
        default_meeting_count: 3,
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
            required_meeting_count: 3,
            detail: EnrollmentDetail::None,
            pinned_meetings: vec![],
            fixed_trainer: None,
        })
        .collect();

    (horizon, schools, classes, trainers, workshops, enrollments)
}

fn bench_run_by_class_count(c: &mut Criterion) {
    let mut group = c.benchmark_group("solve_full_pipeline");
    group.sample_size(10);

    for class_count in [2u32, 4, 8] {
        let (horizon, schools, classes, trainers, workshops, enrollments) =
            scale_instance(class_count);
        let weights = ObjectiveWeights::default();
        let search = SearchConfig::default();

        group.bench_with_input(
            BenchmarkId::new("classes", class_count),
            &class_count,
            |b, _| {
                b.iter(|| {
                    let input = SchedulingInput {
                        horizon: &horizon,
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
                    black_box(run(black_box(&input), &weights, &search).expect("feasible"));
                });
            },
        );
    }

    group.finish();
}

criterion_group!(benches, bench_run_by_class_count);
criterion_main!(benches);

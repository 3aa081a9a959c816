//! `build_admissible_slots`: the set of (week, weekday, band) a class may meet in.

use std::collections::HashSet;

use crate::core::calendar::{Band, Horizon, Weekday};
use crate::core::domain::{Class, ClassBlackout, ClassTimeSlotPolicy};

/// One admissible (week, weekday, band) triple for a class.
pub type Slot = (u32, Weekday, Band);

/// Computes the admissible slot set for a class: starts from the full horizon,
/// removes boundary-week weekdays outside the truncated set, removes blacked-out
/// dates, and restricts to the class's permitted bands/weekdays (hard mode).
pub fn build_admissible_slots(
    _class: &Class,
    horizon: &Horizon,
    policy: &ClassTimeSlotPolicy,
    blackout: Option<&ClassBlackout>,
) -> HashSet<Slot> {
    let mut slots = HashSet::new();

    for week in &horizon.weeks {
        for &wday in &week.active_weekdays {
            for band in Band::ALL {
                if !policy.permits(wday, band) {
                    continue;
                }
                if let Some(blackout) = blackout {
                    if let Some(date) = week.absolute_date(wday) {
                        if blackout.blocks(date, band) {
                            continue;
                        }
                    }
                }
                slots.insert((week.index, wday, band));
            }
        }
    }

    slots
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::domain::{BlackoutEntry, PolicyMode};
    use crate::core::ids::ClassId;
    use chrono::NaiveDate;

    fn full_policy(class_id: ClassId) -> ClassTimeSlotPolicy {
        ClassTimeSlotPolicy {
            class_id,
            allowed_bands: Band::ALL.into_iter().collect(),
            allowed_weekdays: Weekday::ALL.into_iter().collect(),
            mode: PolicyMode::Hard,
            forbidden_weekday_band_pairs: HashSet::new(),
        }
    }

    #[test]
    fn excludes_dates_blacked_out_whole_day() {
        let horizon = Horizon::default_16_week(NaiveDate::from_ymd_opt(2026, 9, 7).unwrap());
        let policy = full_policy(ClassId(1));
        let week1 = horizon.week(1).unwrap();
        let date = week1.absolute_date(Weekday::Mon).unwrap();
        let blackout = ClassBlackout {
            class_id: ClassId(1),
            entries: vec![BlackoutEntry { date, band: None }],
        };

        let slots = build_admissible_slots(
            &Class {
                id: ClassId(1),
                name: "3A".into(),
                school_id: crate::core::ids::SchoolId(1),
                year: crate::core::domain::Year::Y3,
                priority: crate::core::domain::Priority::Normal,
                preferred_group_partner_id: None,
            },
            &horizon,
            &policy,
            Some(&blackout),
        );

        assert!(!slots.contains(&(1, Weekday::Mon, Band::M1)));
        assert!(slots.contains(&(1, Weekday::Tue, Band::M1)));
    }

    #[test]
    fn excludes_weekdays_outside_boundary_truncation() {
        let horizon = Horizon::default_16_week(NaiveDate::from_ymd_opt(2026, 9, 7).unwrap());
        let policy = full_policy(ClassId(1));
        let slots = build_admissible_slots(
            &Class {
                id: ClassId(1),
                name: "3A".into(),
                school_id: crate::core::ids::SchoolId(1),
                year: crate::core::domain::Year::Y3,
                priority: crate::core::domain::Priority::Normal,
                preferred_group_partner_id: None,
            },
            &horizon,
            &policy,
            None,
        );
        // Week 0 is truncated to Thu/Fri/Sat.
        assert!(!slots.iter().any(|(w, wd, _)| *w == 0 && *wd == Weekday::Mon));
        assert!(slots.iter().any(|(w, wd, _)| *w == 0 && *wd == Weekday::Thu));
    }
}

//! `build_trainer_slot_mask`: the predicate deciding which slots a trainer covers.

use std::collections::HashSet;

use crate::core::calendar::{Band, Horizon, Weekday};
use crate::core::domain::Trainer;

/// A trainer's admissibility predicate over (week, weekday, band).
///
/// If the trainer has a specific-slot whitelist, only those (weekday, band) pairs
/// are allowed, superseding the morning/afternoon weekday availability. Saturdays
/// are excluded unless `saturday_allowed`. Absolute dates on the blacklist remove
/// the whole (week, weekday) regardless of band.
pub struct TrainerSlotMask<'a> {
    trainer: &'a Trainer,
    horizon: &'a Horizon,
}

impl<'a> TrainerSlotMask<'a> {
    pub fn new(trainer: &'a Trainer, horizon: &'a Horizon) -> Self {
        Self { trainer, horizon }
    }

    pub fn allows(&self, week: u32, wday: Weekday, band: Band) -> bool {
        if wday.is_saturday() && !self.trainer.saturday_allowed {
            return false;
        }

        let week_spec = match self.horizon.week(week) {
            Some(w) => w,
            None => return false,
        };
        if let Some(date) = week_spec.absolute_date(wday) {
            if self.trainer.specific_slot_blacklist.contains(&date) {
                return false;
            }
        }

        if let Some(whitelist) = &self.trainer.specific_slot_whitelist {
            return whitelist.contains(&(wday, band));
        }

        match band {
            Band::M1 | Band::M2 => self.trainer.morning_availability.contains(&wday),
            Band::P => self.trainer.afternoon_availability.contains(&wday),
        }
    }
}

/// Precomputes, for one trainer, the full set of `(week, wday, band)` triples
/// their slot mask admits across the horizon. Used by the preprocessor to drop
/// trainers with no overlap at all from an enrollment's eligible set; the
/// constraint compiler still enforces H-TRAINER-AVAIL itself for the trainers
/// that remain, since "has some overlap" does not imply "admits every slot
/// the enrollment could land on".
pub fn trainer_allowed_slots(horizon: &Horizon, trainer: &Trainer) -> HashSet<(u32, Weekday, Band)> {
    let mask = TrainerSlotMask::new(trainer, horizon);
    let mut allowed = HashSet::new();
    for week in &horizon.weeks {
        for &wday in &week.active_weekdays {
            for band in Band::ALL {
                if mask.allows(week.index, wday, band) {
                    allowed.insert((week.index, wday, band));
                }
            }
        }
    }
    allowed
}

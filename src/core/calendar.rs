//! Horizon, weekdays and half-day bands.
//!
//! The horizon is modeled as `W` contiguous week indices. Boundary weeks (the first
//! week of each window, the week before the holiday gap, the last week) carry a
//! truncated weekday set rather than a separate "is this meeting active" decision
//! variable — see Design Notes, "Two-window horizon with a gap".

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Monday through Saturday. Sunday is never a candidate weekday in this domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Weekday {
    Mon,
    Tue,
    Wed,
    Thu,
    Fri,
    Sat,
}

impl Weekday {
    pub const ALL: [Weekday; 6] = [
        Weekday::Mon,
        Weekday::Tue,
        Weekday::Wed,
        Weekday::Thu,
        Weekday::Fri,
        Weekday::Sat,
    ];

    /// Index 0..5 used to encode `date(m) = week * 6 + wday`.
    pub fn index(&self) -> u32 {
        *self as u32
    }

    pub fn from_index(i: u32) -> Option<Weekday> {
        Self::ALL.get(i as usize).copied()
    }

    pub fn is_saturday(&self) -> bool {
        matches!(self, Weekday::Sat)
    }
}

/// A half-day time band. Exactly three generic bands are used internally; mapping
/// to absolute clock times per school is left to the output layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Band {
    M1,
    M2,
    P,
}

impl Band {
    pub const ALL: [Band; 3] = [Band::M1, Band::M2, Band::P];

    pub fn index(&self) -> u32 {
        *self as u32
    }

    pub fn is_morning(&self) -> bool {
        matches!(self, Band::M1 | Band::M2)
    }

    pub fn is_afternoon(&self) -> bool {
        matches!(self, Band::P)
    }
}

/// One week of the horizon: its index and the weekdays actually schedulable in it.
///
/// Boundary weeks (window edges, the week bracketing the holiday gap) restrict
/// `active_weekdays` to a subset of [`Weekday::ALL`]; an interior week keeps all six.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WeekSpec {
    pub index: u32,
    pub active_weekdays: Vec<Weekday>,
    /// The calendar date of `active_weekdays[0]`, used to resolve absolute dates
    /// for blackout/blacklist lookups and output rendering.
    pub anchor_date: NaiveDate,
}

impl WeekSpec {
    pub fn is_active(&self, wday: Weekday) -> bool {
        self.active_weekdays.contains(&wday)
    }

    /// Absolute calendar date of `wday` within this week, or `None` if the weekday
    /// is not part of this week's active set (dead boundary cell).
    pub fn absolute_date(&self, wday: Weekday) -> Option<NaiveDate> {
        let anchor_wday = self.active_weekdays.first().copied()?;
        if !self.is_active(wday) {
            return None;
        }
        let offset = wday.index() as i64 - anchor_wday.index() as i64;
        Some(self.anchor_date + chrono::Duration::days(offset))
    }
}

/// The fixed, immutable W-week calendar a run schedules against.
///
/// Two contiguous windows separated by a holiday gap; `weeks` spans both windows
/// using 0..W-1 indices, with weeks inside the gap simply absent (their index is
/// skipped) rather than represented as dead weeks, since no meeting could ever be
/// admissible there.
#[derive(Debug, Clone)]
pub struct Horizon {
    pub weeks: Vec<WeekSpec>,
}

impl Horizon {
    pub fn week_count(&self) -> u32 {
        self.weeks.len() as u32
    }

    pub fn week(&self, index: u32) -> Option<&WeekSpec> {
        self.weeks.get(index as usize)
    }

    /// `date(m) = week(m) * 6 + wday(m)`, the integer ordering key for H-SEQUENCE,
    /// H-LAST and H-PRECEDE.
    pub fn date_key(week: u32, wday: Weekday) -> i64 {
        week as i64 * 6 + wday.index() as i64
    }

    /// Builds a standard 16-week, two-window horizon with a holiday gap, starting
    /// `first_monday` (the Monday of week 0 — the first active weekday of week 0 may
    /// be later than Monday if that week is truncated).
    ///
    /// Window A: weeks 0..=8 (9 weeks), week 0 starts Thursday.
    /// Window B: weeks 9..=15 (7 weeks), week 9 starts Monday, the week before it
    /// (week 8, end of window A) ends Wednesday, the final week ends Thursday.
    pub fn default_16_week(first_monday: NaiveDate) -> Horizon {
        let mut weeks = Vec::with_capacity(16);
        for w in 0..16u32 {
            let week_monday = first_monday + chrono::Duration::weeks(w as i64);
            let active_weekdays = if w == 0 {
                vec![Weekday::Thu, Weekday::Fri, Weekday::Sat]
            } else if w == 8 {
                vec![Weekday::Mon, Weekday::Tue, Weekday::Wed]
            } else if w == 15 {
                vec![Weekday::Mon, Weekday::Tue, Weekday::Wed, Weekday::Thu]
            } else {
                Weekday::ALL.to_vec()
            };
            let anchor_date = week_monday
                + chrono::Duration::days(active_weekdays[0].index() as i64);
            weeks.push(WeekSpec {
                index: w,
                active_weekdays,
                anchor_date,
            });
        }
        Horizon { weeks }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn date_key_orders_weeks_before_weekdays() {
        assert!(Horizon::date_key(0, Weekday::Sat) < Horizon::date_key(1, Weekday::Mon));
    }

    #[test]
    fn boundary_weeks_are_truncated() {
        let h = Horizon::default_16_week(NaiveDate::from_ymd_opt(2026, 9, 7).unwrap());
        assert_eq!(h.week(0).unwrap().active_weekdays, vec![Weekday::Thu, Weekday::Fri, Weekday::Sat]);
        assert_eq!(h.week(8).unwrap().active_weekdays, vec![Weekday::Mon, Weekday::Tue, Weekday::Wed]);
        assert_eq!(
            h.week(15).unwrap().active_weekdays,
            vec![Weekday::Mon, Weekday::Tue, Weekday::Wed, Weekday::Thu]
        );
        assert!(h.week(4).unwrap().is_active(Weekday::Sat));
    }

    #[test]
    fn absolute_date_is_none_outside_active_weekdays() {
        let h = Horizon::default_16_week(NaiveDate::from_ymd_opt(2026, 9, 7).unwrap());
        let week0 = h.week(0).unwrap();
        assert!(week0.absolute_date(Weekday::Mon).is_none());
        assert!(week0.absolute_date(Weekday::Thu).is_some());
    }
}

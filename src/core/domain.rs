//! Domain entities for laboratory meeting scheduling.
//!
//! Pure data: schools, classes, trainers, workshops, enrollments and the
//! constraints attached to them. No solver behavior lives here — see
//! [`crate::preprocessing`] for domain reduction and [`crate::algorithms`] for the
//! constraint model built from these entities.

use std::collections::HashSet;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::core::calendar::{Band, Weekday};
use crate::core::ids::{ClassId, SchoolId, TrainerId, WorkshopId};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct School {
    pub id: SchoolId,
    pub name: String,
    pub may_work_saturday: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Year {
    Y3,
    Y4,
    Y5,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Priority {
    Normal,
    High,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Class {
    pub id: ClassId,
    pub name: String,
    pub school_id: SchoolId,
    pub year: Year,
    pub priority: Priority,
    pub preferred_group_partner_id: Option<ClassId>,
}

/// A trainer's half-day preference, used only by the soft O-TIME-PREF term.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HalfDayPreference {
    Morning,
    Afternoon,
    Either,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trainer {
    pub id: TrainerId,
    pub name: String,
    /// Total hour budget for the whole horizon (I3/H-BUDGET). Hours, not seconds.
    pub total_hour_budget: u32,
    /// Advisory weekly target used by O-WKLY-HRS; not enforced as a hard cap.
    pub average_weekly_hours: f64,
    pub morning_availability: HashSet<Weekday>,
    pub afternoon_availability: HashSet<Weekday>,
    /// If present, supersedes `morning_availability`/`afternoon_availability`: only
    /// these exact (weekday, band) pairs are admissible for this trainer.
    pub specific_slot_whitelist: Option<HashSet<(Weekday, Band)>>,
    pub specific_slot_blacklist: HashSet<NaiveDate>,
    pub saturday_allowed: bool,
    pub half_day_preference: HalfDayPreference,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Workshop {
    pub id: WorkshopId,
    pub name: String,
    pub default_meeting_count: u32,
    pub hours_per_meeting: u32,
    pub default_ordering_rank: u32,
    pub external: bool,
    /// "Presentation"-style workshop: H-LAST requires its meeting to be scheduled
    /// strictly after every other covered workshop of the same class.
    pub must_be_last: bool,
}

/// The typed detail-note variant consumed by the core (Design Notes,
/// "Heterogeneous detail-note parsing"). Free-text parsing is an external concern;
/// by the time an [`Enrollment`] reaches this crate, the detail is already this enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EnrollmentDetail {
    None,
    HalfDay(HalfDayRequirement),
    AfternoonCount { count: u32, non_consecutive: bool },
    OnlyN(u32),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HalfDayRequirement {
    Morning,
    Afternoon,
    Either,
}

impl HalfDayRequirement {
    pub fn allows(&self, band: Band) -> bool {
        match self {
            HalfDayRequirement::Morning => band.is_morning(),
            HalfDayRequirement::Afternoon => band.is_afternoon(),
            HalfDayRequirement::Either => true,
        }
    }
}

/// A fixed, externally-pre-assigned meeting. H-PIN binds the corresponding meeting
/// instance's (week, weekday, band[, trainer]) to exactly these values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pin {
    pub week: u32,
    pub weekday: Weekday,
    pub band: Band,
    pub trainer_id: Option<TrainerId>,
}

/// A (class, workshop) pair with its required meeting count and any overrides.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Enrollment {
    pub class_id: ClassId,
    pub workshop_id: WorkshopId,
    pub required_meeting_count: u32,
    pub detail: EnrollmentDetail,
    pub pinned_meetings: Vec<Pin>,
    /// `Some` hard-assigns the trainer (the meeting's trainer domain becomes a
    /// singleton); `None` leaves the trainer free among all eligible trainers.
    pub fixed_trainer: Option<TrainerId>,
}

impl Enrollment {
    /// Resolves the half-day requirement for meetings of this enrollment, if any.
    pub fn half_day_requirement(&self) -> Option<HalfDayRequirement> {
        match self.detail {
            EnrollmentDetail::HalfDay(req) => Some(req),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolicyMode {
    Hard,
    /// Recognized but treated identically to `Hard` in this version (see Open
    /// Questions: production data marks all policies hard; soft mode is future work).
    Soft,
}

/// Controls which (band, weekday) combinations are admissible for a class.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassTimeSlotPolicy {
    pub class_id: ClassId,
    pub allowed_bands: HashSet<Band>,
    pub allowed_weekdays: HashSet<Weekday>,
    pub mode: PolicyMode,
    /// Weekday-specific band restrictions, e.g. "Wednesday afternoon only" becomes
    /// a forbidden-pair entry for every other (weekday, band) combination on
    /// Wednesday (Design Notes).
    pub forbidden_weekday_band_pairs: HashSet<(Weekday, Band)>,
}

impl ClassTimeSlotPolicy {
    pub fn permits(&self, wday: Weekday, band: Band) -> bool {
        self.allowed_bands.contains(&band)
            && self.allowed_weekdays.contains(&wday)
            && !self.forbidden_weekday_band_pairs.contains(&(wday, band))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BlackoutEntry {
    pub date: NaiveDate,
    /// `None` blacks out the whole day; `Some(band)` blacks out only that band.
    pub band: Option<Band>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassBlackout {
    pub class_id: ClassId,
    pub entries: Vec<BlackoutEntry>,
}

impl ClassBlackout {
    pub fn blocks(&self, date: NaiveDate, band: Band) -> bool {
        self.entries
            .iter()
            .any(|e| e.date == date && (e.band.is_none() || e.band == Some(band)))
    }
}

/// A soft continuity bonus: scheduling `class_id`'s meetings with `trainer_id`
/// reduces O-CONTINUITY's penalty for that class.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrainerClassPreference {
    pub trainer_id: TrainerId,
    pub class_id: ClassId,
    pub weight: u32,
}

/// A symmetric preference that two classes of the same school be grouped together
/// when they share a workshop and ordinal (O-PREF-GROUP).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GroupingPreference {
    pub class_a: ClassId,
    pub class_b: ClassId,
}

impl GroupingPreference {
    /// Preferences are symmetric; this matches either ordering of the pair.
    pub fn matches(&self, a: ClassId, b: ClassId) -> bool {
        (self.class_a == a && self.class_b == b) || (self.class_a == b && self.class_b == a)
    }
}

/// One week pre-consumed by an external (non-covered) workshop for a class;
/// folded into the domain by the preprocessor (H-EXTERNAL-BLOCK).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExternalOccupation {
    pub class_id: ClassId,
    pub week: u32,
}

/// Workshop ordering pairs that must hold for every class enrolled in both
/// (H-PRECEDE). Kept as data rather than hard-coded so the compiler stays generic;
/// the spec's flagged pair (workshop 9 before workshop 5) is one entry of this set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderingRule {
    pub before: WorkshopId,
    pub after: WorkshopId,
}

/// Schools/workshop combinations that take the autonomous-gap treatment
/// (H-GAP-AUTONOMOUS): one fewer meeting is emitted and a two-week gap is enforced
/// between the second and third meeting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AutonomousGapRule {
    pub workshop_id: WorkshopId,
    pub school_id: SchoolId,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn half_day_requirement_filters_bands() {
        assert!(HalfDayRequirement::Morning.allows(Band::M1));
        assert!(!HalfDayRequirement::Morning.allows(Band::P));
        assert!(HalfDayRequirement::Either.allows(Band::P));
    }

    #[test]
    fn policy_respects_forbidden_pairs() {
        let mut allowed_bands = HashSet::new();
        allowed_bands.extend(Band::ALL);
        let mut allowed_weekdays = HashSet::new();
        allowed_weekdays.extend(Weekday::ALL);
        let mut forbidden = HashSet::new();
        forbidden.insert((Weekday::Wed, Band::M1));

        let policy = ClassTimeSlotPolicy {
            class_id: ClassId(1),
            allowed_bands,
            allowed_weekdays,
            mode: PolicyMode::Hard,
            forbidden_weekday_band_pairs: forbidden,
        };

        assert!(!policy.permits(Weekday::Wed, Band::M1));
        assert!(policy.permits(Weekday::Wed, Band::P));
    }

    #[test]
    fn blackout_matches_whole_day_or_specific_band() {
        let date = NaiveDate::from_ymd_opt(2026, 10, 1).unwrap();
        let blackout = ClassBlackout {
            class_id: ClassId(1),
            entries: vec![BlackoutEntry { date, band: None }],
        };
        assert!(blackout.blocks(date, Band::M1));
        assert!(blackout.blocks(date, Band::P));
    }

    #[test]
    fn grouping_preference_is_symmetric() {
        let pref = GroupingPreference { class_a: ClassId(1), class_b: ClassId(2) };
        assert!(pref.matches(ClassId(1), ClassId(2)));
        assert!(pref.matches(ClassId(2), ClassId(1)));
        assert!(!pref.matches(ClassId(1), ClassId(3)));
    }
}

//! Solution extractor (§4.5): reads a solved model's variable assignments back
//! into a normalized calendar record per meeting, resolves realized grouping
//! pairs into each meeting's `co_taught_with` set, and summarizes per-trainer
//! hours and grouping counts for the solver report.

use std::collections::HashMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::core::calendar::{Band, Horizon, Weekday};
use crate::core::ids::{ClassId, MeetingId, SchoolId, TrainerId, WorkshopId};

use super::driver::SolveStatus;
use super::variables::VariableSet;

/// One scheduled meeting, as returned to the caller (§6, "Output").
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalendarRecord {
    pub class_id: ClassId,
    pub school_id: SchoolId,
    pub workshop_id: WorkshopId,
    pub ordinal: u32,
    pub trainer_id: TrainerId,
    pub week: u32,
    pub weekday: Weekday,
    pub band: Band,
    pub absolute_date: Option<NaiveDate>,
    /// The other class(es) this meeting is co-taught with, if any realized
    /// grouping touches it. Always binary in this version (H-GROUP-CAP), kept as
    /// a `Vec` since the extractor reports an equivalence closure, not a single
    /// partner field.
    pub co_taught_with: Vec<ClassId>,
}

/// Per-trainer hour usage, counting a co-taught meeting once (I3/H-BUDGET).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrainerHours {
    pub trainer_id: TrainerId,
    pub used: u32,
    pub budget: u32,
}

/// The solver's outcome summary (§6, "Plus a solver report").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SolverReport {
    pub status: ReportStatus,
    pub objective_value: f64,
    pub wall_seconds: f64,
    pub per_trainer_hours: Vec<TrainerHours>,
    pub realized_groupings: u32,
}

/// [`SolveStatus`] without the solver's internal response payload, suitable for
/// `serde` round-tripping in the report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReportStatus {
    Optimal,
    Feasible,
}

impl From<SolveStatus> for ReportStatus {
    fn from(status: SolveStatus) -> Self {
        match status {
            SolveStatus::Optimal => ReportStatus::Optimal,
            // Infeasible/Timeout never reach the extractor: the orchestrator
            // returns an error before a report is built for those statuses.
            _ => ReportStatus::Feasible,
        }
    }
}

pub struct SolutionExtractor;

impl SolutionExtractor {
    /// Reads every meeting's assigned `(week, wday, band, trainer)` from the
    /// solved response, resolves realized grouping pairs into `co_taught_with`,
    /// and returns the calendar alongside the report.
    pub fn extract(
        response: &cp_sat::proto::CpSolverResponse,
        status: SolveStatus,
        wall_seconds: f64,
        vars: &VariableSet,
        horizon: &Horizon,
        class_school: &HashMap<ClassId, SchoolId>,
        hours_per_workshop: &HashMap<WorkshopId, u32>,
        trainer_budgets: &HashMap<TrainerId, u32>,
        trainer_by_code: &HashMap<i64, TrainerId>,
    ) -> (Vec<CalendarRecord>, SolverReport) {
        let mut partners: HashMap<MeetingId, Vec<ClassId>> = HashMap::new();
        let mut realized_groupings = 0u32;
        for candidate in &vars.candidates {
            if candidate.group.solution_value(response) {
                realized_groupings += 1;
                partners
                    .entry(candidate.first)
                    .or_default()
                    .push(candidate.second.class_id);
                partners
                    .entry(candidate.second)
                    .or_default()
                    .push(candidate.first.class_id);
            }
        }

        let mut records = Vec::with_capacity(vars.meetings.len());
        let mut billed_once: HashMap<TrainerId, std::collections::HashSet<MeetingId>> =
            HashMap::new();
        let mut hours_used: HashMap<TrainerId, u32> = HashMap::new();

        for m in &vars.meetings {
            let week = m.week.solution_value(response) as u32;
            let wday = Weekday::from_index(m.wday.solution_value(response) as u32)
                .expect("solver only assigns valid weekday codes");
            let band = band_from_index(m.band.solution_value(response));
            let trainer_code = m.trainer.solution_value(response);
            let trainer_id = trainer_by_code
                .get(&trainer_code)
                .copied()
                .expect("solver only assigns known trainer codes");

            let absolute_date = horizon.week(week).and_then(|w| w.absolute_date(wday));
            let school_id = class_school
                .get(&m.meeting_id.class_id)
                .copied()
                .expect("every meeting's class is known to the extractor");

            records.push(CalendarRecord {
                class_id: m.meeting_id.class_id,
                school_id,
                workshop_id: m.meeting_id.workshop_id,
                ordinal: m.meeting_id.ordinal,
                trainer_id,
                week,
                weekday: wday,
                band,
                absolute_date,
                co_taught_with: partners.get(&m.meeting_id).cloned().unwrap_or_default(),
            });

            // Bill hours once per physical meeting: a grouped pair shares one
            // `billed_once` entry keyed by whichever meeting id sorts first, so
            // the second participant's identical slot does not double-charge.
            let billing_key = group_key(m.meeting_id, &partners);
            let seen = billed_once.entry(trainer_id).or_default();
            if seen.insert(billing_key) {
                let hours = hours_per_workshop
                    .get(&m.meeting_id.workshop_id)
                    .copied()
                    .unwrap_or(0);
                *hours_used.entry(trainer_id).or_insert(0) += hours;
            }
        }

        let per_trainer_hours = trainer_budgets
            .iter()
            .map(|(&trainer_id, &budget)| TrainerHours {
                trainer_id,
                used: hours_used.get(&trainer_id).copied().unwrap_or(0),
                budget,
            })
            .collect();

        let report = SolverReport {
            status: status.into(),
            objective_value: response.objective_value,
            wall_seconds,
            per_trainer_hours,
            // Each realized pair touches two partner entries above; report the
            // pair count, not the entry count.
            realized_groupings,
        };

        (records, report)
    }
}

/// The smaller of a meeting and its realized partner (if any), used only to
/// dedupe hour-billing between the two sides of a realized group.
fn group_key(id: MeetingId, partners: &HashMap<MeetingId, Vec<ClassId>>) -> MeetingId {
    match partners.get(&id) {
        Some(partner_classes) if !partner_classes.is_empty() => {
            let partner_class = *partner_classes.iter().min().expect("non-empty");
            if partner_class < id.class_id {
                MeetingId { class_id: partner_class, workshop_id: id.workshop_id, ordinal: id.ordinal }
            } else {
                id
            }
        }
        _ => id,
    }
}

fn band_from_index(index: i64) -> Band {
    Band::ALL
        .into_iter()
        .find(|b| b.index() as i64 == index)
        .expect("solver only assigns valid band codes")
}

//! Objective builder: the weighted soft objective (§4.3, "Soft constraints") and
//! its three-way configuration surface, mirroring how this codebase treats
//! configuration elsewhere — a `Default` impl, programmatic setters, and a
//! `toml` document parsed with `serde_path_to_error` so a bad key names its exact
//! location.

use std::collections::{HashMap, HashSet};

use cp_sat::builder::{BoolVar, CpModelBuilder, LinearExpr};
use serde::{Deserialize, Serialize};

use crate::core::calendar::{Band, Horizon};
use crate::core::domain::{
    Class, Enrollment, GroupingPreference, Trainer, TrainerClassPreference, Workshop, Year,
};
use crate::core::ids::{ClassId, MeetingId, TrainerId, WorkshopId};
use crate::error::{SolverError, SolverResult};

use super::reify::{reify_and, reify_eq, reify_or};
use super::variables::{MeetingVars, VariableSet};

/// The ten recognized weight names and their defaults (§4.3 table). Unknown keys
/// in a parsed TOML document are rejected rather than silently ignored.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ObjectiveWeights {
    #[serde(default = "default_group")]
    pub group: i64,
    #[serde(default = "default_continuity")]
    pub continuity: i64,
    #[serde(default = "default_pref_group")]
    pub pref_group: i64,
    #[serde(default = "default_year5_early")]
    pub year5_early: i64,
    #[serde(default = "default_seq_pref")]
    pub seq_pref: i64,
    #[serde(default = "default_band_var")]
    pub band_var: i64,
    #[serde(default = "default_load_bal")]
    pub load_bal: i64,
    #[serde(default = "default_wkly_hrs")]
    pub wkly_hrs: i64,
    #[serde(default = "default_time_pref")]
    pub time_pref: i64,
    #[serde(default = "default_late_may")]
    pub late_may: i64,
}

fn default_group() -> i64 { 20 }
fn default_continuity() -> i64 { 10 }
fn default_pref_group() -> i64 { 5 }
fn default_year5_early() -> i64 { 3 }
fn default_seq_pref() -> i64 { 2 }
fn default_band_var() -> i64 { 2 }
fn default_load_bal() -> i64 { 2 }
fn default_wkly_hrs() -> i64 { 3 }
fn default_time_pref() -> i64 { 1 }
fn default_late_may() -> i64 { 1 }

impl Default for ObjectiveWeights {
    fn default() -> Self {
        Self {
            group: default_group(),
            continuity: default_continuity(),
            pref_group: default_pref_group(),
            year5_early: default_year5_early(),
            seq_pref: default_seq_pref(),
            band_var: default_band_var(),
            load_bal: default_load_bal(),
            wkly_hrs: default_wkly_hrs(),
            time_pref: default_time_pref(),
            late_may: default_late_may(),
        }
    }
}

impl ObjectiveWeights {
    /// Parses weights from a TOML document. Unknown keys are reported with the
    /// exact path they occurred at, not just "invalid input".
    pub fn from_toml_str(document: &str) -> SolverResult<Self> {
        let de = toml::Deserializer::new(document);
        serde_path_to_error::deserialize(de)
            .map_err(|e| SolverError::InputInvalid(format!("objective weights: {e}")))
    }

    pub fn with_group(mut self, value: i64) -> Self { self.group = value; self }
    pub fn with_continuity(mut self, value: i64) -> Self { self.continuity = value; self }
    pub fn with_pref_group(mut self, value: i64) -> Self { self.pref_group = value; self }
    pub fn with_year5_early(mut self, value: i64) -> Self { self.year5_early = value; self }
    pub fn with_seq_pref(mut self, value: i64) -> Self { self.seq_pref = value; self }
    pub fn with_band_var(mut self, value: i64) -> Self { self.band_var = value; self }
    pub fn with_load_bal(mut self, value: i64) -> Self { self.load_bal = value; self }
    pub fn with_wkly_hrs(mut self, value: i64) -> Self { self.wkly_hrs = value; self }
    pub fn with_time_pref(mut self, value: i64) -> Self { self.time_pref = value; self }
    pub fn with_late_may(mut self, value: i64) -> Self { self.late_may = value; self }

    /// Zeroes every weight, keeping hard constraints intact. Used by the search
    /// driver's diagnostic retry after a proven-infeasible result.
    pub fn all_zero() -> Self {
        Self {
            group: 0, continuity: 0, pref_group: 0, year5_early: 0,
            seq_pref: 0, band_var: 0, load_bal: 0, wkly_hrs: 0, time_pref: 0, late_may: 0,
        }
    }
}

/// Everything the objective builder needs beyond the variable set.
pub struct ObjectiveInputs<'a> {
    pub horizon: &'a Horizon,
    pub classes: &'a [Class],
    pub trainers: &'a [Trainer],
    pub workshops: &'a [Workshop],
    pub enrollments: &'a [Enrollment],
    pub trainer_preferences: &'a [TrainerClassPreference],
    pub grouping_preferences: &'a [GroupingPreference],
    pub trainer_index: &'a HashMap<TrainerId, i64>,
    /// The "preferred ordering" of workshops (Design Notes: `{7, 9, 4, 5}`) that
    /// O-SEQ-PREF rewards a class for following.
    pub preferred_sequence: &'a [WorkshopId],
}

fn meetings_by_class(vars: &VariableSet) -> HashMap<ClassId, Vec<&MeetingVars>> {
    let mut by_class: HashMap<ClassId, Vec<&MeetingVars>> = HashMap::new();
    for m in &vars.meetings {
        by_class.entry(m.meeting_id.class_id).or_default().push(m);
    }
    by_class
}

/// Builds `obj = Σ wᵢ · termᵢ` and calls `model.minimize(obj)`.
///
/// Terms that would need auxiliary variables the model doesn't already have
/// (O-CONTINUITY, O-LOAD-BAL, O-SEQ-PREF) allocate their own; all others are
/// plain linear combinations of existing decision variables.
pub fn build_objective(
    model: &mut CpModelBuilder,
    vars: &VariableSet,
    weights: &ObjectiveWeights,
    inputs: &ObjectiveInputs,
) {
    let mut obj = LinearExpr::from(0);

    // O-GROUP: bonus per realized group.
    if weights.group != 0 && !vars.candidates.is_empty() {
        let term: LinearExpr = vars.candidates.iter().map(|c| (1_i64, c.group.clone())).collect();
        obj = obj - term * weights.group;
    }

    // O-PREF-GROUP: extra bonus for groups matching an explicit preference.
    if weights.pref_group != 0 {
        let preferred: Vec<_> = vars
            .candidates
            .iter()
            .filter(|c| {
                inputs
                    .grouping_preferences
                    .iter()
                    .any(|p| p.matches(c.first.class_id, c.second.class_id))
            })
            .collect();
        if !preferred.is_empty() {
            let term: LinearExpr = preferred.into_iter().map(|c| (1_i64, c.group.clone())).collect();
            obj = obj - term * weights.pref_group;
        }
    }

    // O-CONTINUITY: number of distinct trainers used per class, minus 1.
    if weights.continuity != 0 {
        let mut class_terms: Vec<LinearExpr> = Vec::new();
        for meetings in meetings_by_class(vars).values() {
            if meetings.len() < 2 {
                // A single-meeting class always has exactly one trainer; the
                // penalty is a constant zero, not worth spending variables on.
                continue;
            }
            let mut used_terms: Vec<(i64, BoolVar)> = Vec::new();
            for trainer in inputs.trainers {
                let code = inputs.trainer_index[&trainer.id];
                let eq_bools: Vec<BoolVar> = meetings
                    .iter()
                    .map(|m| reify_eq(model, m.trainer.clone(), LinearExpr::from(code)))
                    .collect();
                let used = reify_or(model, eq_bools);
                used_terms.push((1, used));
            }
            let distinct_count: LinearExpr = used_terms.into_iter().collect();
            class_terms.push(distinct_count - 1);
        }
        if !class_terms.is_empty() {
            let term = class_terms.into_iter().fold(LinearExpr::from(0), |acc, e| acc + e);
            obj = obj + term * weights.continuity;
        }
    }

    // O-SEQ-PREF: bonus per class whose representative (ordinal-0) meetings for
    // the preferred workshop sequence land in non-decreasing week order.
    if weights.seq_pref != 0 && inputs.preferred_sequence.len() >= 2 {
        let class_ids: HashSet<ClassId> = inputs.enrollments.iter().map(|e| e.class_id).collect();
        let mut match_bools: Vec<BoolVar> = Vec::new();
        for class_id in class_ids {
            let seq_weeks: Vec<_> = inputs
                .preferred_sequence
                .iter()
                .filter_map(|wid| {
                    let candidate = MeetingId { class_id, workshop_id: *wid, ordinal: 0 };
                    vars.by_id.get(&candidate).map(|&idx| vars.meetings[idx].week.clone())
                })
                .collect();
            if seq_weeks.len() < 2 {
                continue;
            }
            let mut in_order: Option<BoolVar> = None;
            for pair in seq_weeks.windows(2) {
                let b = model.new_bool_var();
                model.add_le(pair[0].clone(), LinearExpr::from(pair[1].clone())).only_enforce_if(b.clone());
                model.add_gt(pair[0].clone(), LinearExpr::from(pair[1].clone())).only_enforce_if(b.clone().not());
                in_order = Some(match in_order {
                    None => b,
                    Some(acc) => reify_and(model, acc, b),
                });
            }
            if let Some(matches) = in_order {
                match_bools.push(matches);
            }
        }
        if !match_bools.is_empty() {
            let term: LinearExpr = match_bools.into_iter().map(|b| (1_i64, b)).collect();
            obj = obj - term * weights.seq_pref;
        }
    }

    // O-BAND-VAR: penalize pairs of a class's meetings that land on adjacent
    // weeks and share the same band.
    if weights.band_var != 0 {
        let mut penalty_terms: Vec<BoolVar> = Vec::new();
        for meetings in meetings_by_class(vars).values() {
            for i in 0..meetings.len() {
                for j in (i + 1)..meetings.len() {
                    let (m1, m2) = (meetings[i], meetings[j]);
                    let diff = model.new_int_var(vec![(-1_000, 1_000)]);
                    model.add_eq(
                        diff.clone(),
                        LinearExpr::from(m1.week.clone()) - LinearExpr::from(m2.week.clone()),
                    );
                    let plus_one = reify_eq(model, diff.clone(), LinearExpr::from(1));
                    let minus_one = reify_eq(model, diff, LinearExpr::from(-1));
                    let consecutive = reify_or(model, vec![plus_one, minus_one]);
                    let same_band = reify_eq(model, m1.band.clone(), LinearExpr::from(m2.band.clone()));
                    penalty_terms.push(reify_and(model, consecutive, same_band));
                }
            }
        }
        if !penalty_terms.is_empty() {
            let term: LinearExpr = penalty_terms.into_iter().map(|b| (1_i64, b)).collect();
            obj = obj + term * weights.band_var;
        }
    }

    // O-LOAD-BAL: variance proxy for per-trainer weekly meeting load, the sum of
    // pairwise absolute differences between a trainer's per-week meeting counts.
    // Quadratic in week count (16 weeks -> 120 pairs per trainer), bounded by the
    // fixed horizon length rather than by the input size.
    if weights.load_bal != 0 {
        let week_count = inputs.horizon.week_count() as i64;
        let mut abs_dev_ints: Vec<cp_sat::builder::IntVar> = Vec::new();
        for trainer in inputs.trainers {
            let code = inputs.trainer_index[&trainer.id];
            let mut week_loads: Vec<LinearExpr> = Vec::new();
            for week in 0..week_count {
                let mut bools: Vec<BoolVar> = Vec::new();
                for m in &vars.meetings {
                    let assigned = reify_eq(model, m.trainer.clone(), LinearExpr::from(code));
                    let this_week = reify_eq(model, m.week.clone(), LinearExpr::from(week));
                    bools.push(reify_and(model, assigned, this_week));
                }
                if bools.is_empty() {
                    continue;
                }
                week_loads.push(bools.into_iter().map(|b| (1_i64, b)).collect());
            }
            for i in 0..week_loads.len() {
                for j in (i + 1)..week_loads.len() {
                    let diff = model.new_int_var(vec![(-1_000, 1_000)]);
                    model.add_eq(diff.clone(), week_loads[i].clone() - week_loads[j].clone());
                    let abs_dev = model.new_int_var(vec![(0, 1_000)]);
                    model.add_ge(abs_dev.clone(), LinearExpr::from(diff.clone()));
                    model.add_ge(abs_dev.clone(), LinearExpr::from(0) - LinearExpr::from(diff));
                    abs_dev_ints.push(abs_dev);
                }
            }
        }
        if !abs_dev_ints.is_empty() {
            let term: LinearExpr = abs_dev_ints.into_iter().map(|v| (1_i64, v)).collect();
            obj = obj + term * weights.load_bal;
        }
    }

    // O-YEAR5-EARLY: penalize later weeks for year-5 classes.
    if weights.year5_early != 0 {
        let year5: HashSet<ClassId> = inputs
            .classes
            .iter()
            .filter(|c| c.year == Year::Y5)
            .map(|c| c.id)
            .collect();
        let term: LinearExpr = vars
            .meetings
            .iter()
            .filter(|m| year5.contains(&m.meeting_id.class_id))
            .map(|m| (1_i64, m.week.clone()))
            .collect();
        obj = obj + term * weights.year5_early;
    }

    // O-LATE-MAY: penalize `week(m)` only for meetings that land in one of the
    // last two horizon weeks, via a reified indicator per candidate week — a
    // meeting's `week` var takes exactly one value, so at most one indicator
    // fires and the weighted sum reconstructs `Σ week(m)` restricted to W-2/W-1.
    if weights.late_may != 0 {
        let week_count = inputs.horizon.week_count() as i64;
        let late_weeks = [week_count - 2, week_count - 1];
        let mut terms: Vec<(i64, BoolVar)> = Vec::new();
        for m in &vars.meetings {
            for &week in &late_weeks {
                if week < 0 {
                    continue;
                }
                let is_week = reify_eq(model, m.week.clone(), LinearExpr::from(week));
                terms.push((week, is_week));
            }
        }
        let term: LinearExpr = terms.into_iter().map(|(week, b)| (week, b)).collect();
        obj = obj + term * weights.late_may;
    }

    // O-TIME-PREF: penalize a band that disagrees with the trainer's half-day
    // preference. `assigned` and `band_is_afternoon` are fully channeled so the
    // solver can't dodge the penalty by just leaving the indicator false.
    if weights.time_pref != 0 {
        let mut penalty_terms: Vec<BoolVar> = Vec::new();
        for m in &vars.meetings {
            for trainer in inputs.trainers {
                let pref = trainer.half_day_preference;
                let cares = matches!(
                    pref,
                    crate::core::domain::HalfDayPreference::Morning
                        | crate::core::domain::HalfDayPreference::Afternoon
                );
                if !cares {
                    continue;
                }
                let code = inputs.trainer_index[&trainer.id];
                let assigned = reify_eq(model, m.trainer.clone(), LinearExpr::from(code));
                let band_is_afternoon =
                    reify_eq(model, m.band.clone(), LinearExpr::from(Band::P.index() as i64));
                let disagrees = match pref {
                    crate::core::domain::HalfDayPreference::Morning => band_is_afternoon,
                    crate::core::domain::HalfDayPreference::Afternoon => band_is_afternoon.not(),
                    crate::core::domain::HalfDayPreference::Either => unreachable!("filtered above"),
                };
                penalty_terms.push(reify_and(model, assigned, disagrees));
            }
        }
        if !penalty_terms.is_empty() {
            let term: LinearExpr = penalty_terms.into_iter().map(|b| (1_i64, b)).collect();
            obj = obj + term * weights.time_pref;
        }
    }

    // O-WKLY-HRS: per-trainer |total assigned hours over the horizon - (weekly
    // target * week count)|, weighted by each meeting's actual hour cost rather
    // than a bare meeting count.
    if weights.wkly_hrs != 0 {
        let hours_by_workshop: HashMap<WorkshopId, i64> =
            inputs.workshops.iter().map(|w| (w.id, w.hours_per_meeting as i64)).collect();
        let week_count = inputs.horizon.week_count() as i64;
        let mut deviation_terms: Vec<cp_sat::builder::IntVar> = Vec::new();
        for trainer in inputs.trainers {
            let code = inputs.trainer_index[&trainer.id];
            let mut hour_terms: Vec<(i64, BoolVar)> = Vec::new();
            for m in &vars.meetings {
                let hours = *hours_by_workshop.get(&m.meeting_id.workshop_id).unwrap_or(&0);
                if hours == 0 {
                    continue;
                }
                let assigned = reify_eq(model, m.trainer.clone(), LinearExpr::from(code));
                hour_terms.push((hours, assigned));
            }
            if hour_terms.is_empty() {
                continue;
            }
            let hours_expr: LinearExpr = hour_terms.into_iter().collect();
            let target_total = (trainer.average_weekly_hours * week_count as f64).round() as i64;
            let deviation = model.new_int_var(vec![(0, 100_000)]);
            let above = model.new_int_var(vec![(-100_000, 100_000)]);
            model.add_eq(above.clone(), hours_expr - target_total);
            model.add_ge(deviation.clone(), LinearExpr::from(above.clone()));
            model.add_ge(deviation.clone(), LinearExpr::from(0) - LinearExpr::from(above));
            deviation_terms.push(deviation);
        }
        if !deviation_terms.is_empty() {
            let term: LinearExpr = deviation_terms.into_iter().map(|v| (1_i64, v)).collect();
            obj = obj + term * weights.wkly_hrs;
        }
    }

    model.minimize(obj);
}

/// Resolves each trainer's stable integer code used by reified "trainer == t"
/// constraints throughout the constraint and objective builders.
pub fn build_trainer_index(trainers: &[Trainer]) -> HashMap<TrainerId, i64> {
    trainers.iter().enumerate().map(|(i, t)| (t.id, i as i64)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_weights_match_the_published_table() {
        let w = ObjectiveWeights::default();
        assert_eq!(w.group, 20);
        assert_eq!(w.continuity, 10);
        assert_eq!(w.late_may, 1);
    }

    #[test]
    fn unknown_key_is_rejected_with_its_path() {
        let err = ObjectiveWeights::from_toml_str("grou = 5\n").unwrap_err();
        assert!(err.to_string().contains("objective weights"));
    }

    #[test]
    fn all_zero_keeps_every_field_at_zero() {
        let w = ObjectiveWeights::all_zero();
        assert_eq!(w.group, 0);
        assert_eq!(w.late_may, 0);
    }
}

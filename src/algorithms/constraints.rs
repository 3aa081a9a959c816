//! Constraint compiler: emits the hard-constraint catalogue over a built
//! [`VariableSet`] (§4.3, "Hard constraints").
//!
//! Emission order is not semantically significant — the solver treats
//! constraints commutatively — so each function here corresponds to exactly one
//! catalogue entry and can be read independently of the others.

use std::collections::HashMap;

use cp_sat::builder::{CpModelBuilder, LinearExpr};

use crate::core::calendar::{Band, Horizon, Weekday};
use crate::core::domain::{
    AutonomousGapRule, Class, ClassBlackout, Enrollment, EnrollmentDetail, OrderingRule, School,
    Trainer, Workshop,
};
use crate::core::ids::{ClassId, MeetingId, TrainerId, WorkshopId};
use crate::preprocessing::pipeline::MeetingDomain;
use crate::preprocessing::trainer_mask::TrainerSlotMask;

use super::reify::{reify_and, reify_eq, slot_key, SLOT_BANDS, SLOT_WEEKDAYS};
use super::variables::VariableSet;

/// Everything the constraint compiler needs beyond the variable set itself.
pub struct ConstraintInputs<'a> {
    pub horizon: &'a Horizon,
    pub schools: &'a [School],
    pub classes: &'a [Class],
    pub trainers: &'a [Trainer],
    pub workshops: &'a [Workshop],
    pub enrollments: &'a [Enrollment],
    pub blackouts: &'a [ClassBlackout],
    pub ordering_rules: &'a [OrderingRule],
    pub autonomous_gap_rules: &'a [AutonomousGapRule],
    pub trainer_index: &'a HashMap<TrainerId, i64>,
    /// Per-meeting admissible domains from the preprocessor, keyed by id.
    /// Needed here (not just by the variable builder) to know exactly which
    /// candidate slots of a meeting a given trainer cannot legally cover
    /// (H-TRAINER-AVAIL) without re-deriving the full admissible set.
    pub domains: &'a HashMap<MeetingId, MeetingDomain>,
}

/// Compiles the full hard-constraint catalogue into `model`, given the decision
/// variables `vars` and the domain inputs the constraints are stated over.
///
/// H-WINDOW, H-BAND-ALLOWED, H-WEEKDAY-ALLOWED, H-BLACKOUT and H-PIN are
/// enforced jointly by `slot`'s domain (restricted to the admissible
/// `slot_key` set, see [`super::variables::build_meeting_vars`]) together with
/// `channel_date_and_slot` below, which forces `week`/`wday`/`band` to decode
/// back to one of those admissible triples; `week`/`wday`/`band`'s own domains
/// are only independent projections and do not by themselves rule out invalid
/// combinations. This function adds the constraints that relate one variable
/// to another, plus H-TRAINER-AVAIL, which needs the pairing of the `trainer`
/// and `slot` variables to state.
pub fn compile_constraints(
    model: &mut CpModelBuilder,
    vars: &VariableSet,
    inputs: &ConstraintInputs,
) {
    channel_date_and_slot(model, vars, inputs.horizon);
    enforce_class_uniqueness(model, vars, inputs.enrollments);
    enforce_trainer_availability(model, vars, inputs);
    enforce_no_overlap(model, vars, inputs);
    enforce_group_cap_and_coupling(model, vars);
    enforce_saturday(model, vars, inputs);
    enforce_budget(model, vars, inputs);
    enforce_sequence(model, vars, inputs.enrollments);
    enforce_afternoon_count(model, vars, inputs.enrollments);
    enforce_last(model, vars, inputs);
    enforce_precede(model, vars, inputs);
    enforce_autonomous_gap(model, vars, inputs);
}


/// `date(m) = week(m) * 6 + wday(m)`; `slot(m) = week(m) * 18 + wday(m) * 3 + band(m)`.
fn channel_date_and_slot(model: &mut CpModelBuilder, vars: &VariableSet, _horizon: &Horizon) {
    for m in &vars.meetings {
        let date_expr = LinearExpr::from(m.week.clone()) * SLOT_WEEKDAYS + LinearExpr::from(m.wday.clone());
        model.add_eq(m.date.clone(), date_expr);

        let slot_expr = LinearExpr::from(m.week.clone()) * (SLOT_WEEKDAYS * SLOT_BANDS)
            + LinearExpr::from(m.wday.clone()) * SLOT_BANDS
            + LinearExpr::from(m.band.clone());
        model.add_eq(m.slot.clone(), slot_expr);
    }
}

/// H-CLASS-UNIQ: at most one meeting per (class, week), a grouped pair counting
/// once for each of its two classes. Realized as all-different-per-class on
/// `week(m)`, with the grouping coupling constraint (below) guaranteeing a
/// grouped pair shares a week rather than needing a separate exception here.
fn enforce_class_uniqueness(model: &mut CpModelBuilder, vars: &VariableSet, enrollments: &[Enrollment]) {
    let mut weeks_by_class: HashMap<ClassId, Vec<cp_sat::builder::IntVar>> = HashMap::new();
    for enrollment in enrollments {
        for ordinal in 0..enrollment.required_meeting_count {
            let id = MeetingId { class_id: enrollment.class_id, workshop_id: enrollment.workshop_id, ordinal };
            weeks_by_class
                .entry(enrollment.class_id)
                .or_default()
                .push(vars.meeting(id).week.clone());
        }
    }
    for weeks in weeks_by_class.values() {
        if weeks.len() > 1 {
            model.add_all_different(weeks.clone());
        }
    }
}

/// H-TRAINER-AVAIL: `(wday(m), band(m), date(m), trainer(m))` must satisfy the
/// trainer slot mask. The variable builder already restricts each meeting's
/// `trainer` domain to the enrollment's eligible trainers irrespective of which
/// concrete slot is chosen, so a trainer ineligible for *some* of a meeting's
/// candidate slots but not all of them is not excluded by domain construction
/// alone; this stage forbids those specific (trainer, slot) combinations using
/// the same `slot` encoding H-NO-OVERLAP keys off of.
fn enforce_trainer_availability(model: &mut CpModelBuilder, vars: &VariableSet, inputs: &ConstraintInputs) {
    for trainer in inputs.trainers {
        let code = inputs.trainer_index[&trainer.id];
        let mask = TrainerSlotMask::new(trainer, inputs.horizon);

        for m in &vars.meetings {
            if m.pin_trainer.is_some() {
                // Pins are externally fixed; trusted as given (H-PIN).
                continue;
            }
            let Some(domain) = inputs.domains.get(&m.meeting_id) else { continue };
            if domain.slots.is_empty() || !domain.trainers.contains(&trainer.id) {
                continue;
            }

            let forbidden_slots: Vec<i64> = domain
                .slots
                .iter()
                .filter(|(week, wday, band)| !mask.allows(*week, *wday, *band))
                .map(|(week, wday, band)| slot_key(*week as i64, wday.index() as i64, band.index() as i64))
                .collect();
            if forbidden_slots.is_empty() {
                continue;
            }

            let this_trainer = reify_eq(model, m.trainer.clone(), LinearExpr::from(code));
            for forbidden in forbidden_slots {
                model
                    .add_ne(m.slot.clone(), LinearExpr::from(forbidden))
                    .only_enforce_if(this_trainer.clone());
            }
        }
    }
}

/// H-NO-OVERLAP: for each trainer, at most one meeting occupies a given slot,
/// unless the two meetings are a realized group (which collapses them to one
/// physical occurrence). Stated as: for every candidate pair sharing a trainer
/// domain value, `slot(m1) != slot(m2) OR trainer(m1) != t OR trainer(m2) != t OR group(m1,m2)`.
/// Symmetrically restated per-meeting-pair rather than per-trainer bucket because
/// `trainer(m)` is itself a variable, not a fixed label.
fn enforce_no_overlap(model: &mut CpModelBuilder, vars: &VariableSet, inputs: &ConstraintInputs) {
    let group_of: HashMap<(MeetingId, MeetingId), &cp_sat::builder::BoolVar> = vars
        .candidates
        .iter()
        .map(|c| ((c.first, c.second), &c.group))
        .collect();

    for i in 0..vars.meetings.len() {
        for j in (i + 1)..vars.meetings.len() {
            let a = &vars.meetings[i];
            let b = &vars.meetings[j];
            if a.meeting_id.class_id == b.meeting_id.class_id {
                continue;
            }
            let grouped = group_of
                .get(&(a.meeting_id, b.meeting_id))
                .or_else(|| group_of.get(&(b.meeting_id, a.meeting_id)));

            let same_trainer = reify_eq(model, a.trainer.clone(), LinearExpr::from(b.trainer.clone()));
            let same_slot = reify_eq(model, a.slot.clone(), LinearExpr::from(b.slot.clone()));

            match grouped {
                Some(group_var) => {
                    // Collision is fine exactly when the pair is realized as a group.
                    model.add_bool_or(vec![
                        same_trainer.not(),
                        same_slot.not(),
                        group_var.clone(),
                    ]);
                }
                None => {
                    model.add_bool_or(vec![same_trainer.not(), same_slot.not()]);
                }
            }
            let _ = inputs;
        }
    }
}

/// H-GROUP-CAP + H-GROUP-COUPLING.
fn enforce_group_cap_and_coupling(model: &mut CpModelBuilder, vars: &VariableSet) {
    let mut per_meeting: HashMap<MeetingId, Vec<cp_sat::builder::BoolVar>> = HashMap::new();
    for candidate in &vars.candidates {
        per_meeting.entry(candidate.first).or_default().push(candidate.group.clone());
        per_meeting.entry(candidate.second).or_default().push(candidate.group.clone());

        let m1 = vars.meeting(candidate.first);
        let m2 = vars.meeting(candidate.second);
        model.add_eq(m1.week.clone(), LinearExpr::from(m2.week.clone())).only_enforce_if(candidate.group.clone());
        model.add_eq(m1.wday.clone(), LinearExpr::from(m2.wday.clone())).only_enforce_if(candidate.group.clone());
        model.add_eq(m1.band.clone(), LinearExpr::from(m2.band.clone())).only_enforce_if(candidate.group.clone());
        model.add_eq(m1.trainer.clone(), LinearExpr::from(m2.trainer.clone())).only_enforce_if(candidate.group.clone());
    }

    for (_meeting, groups) in per_meeting {
        if groups.len() > 1 {
            let expr: LinearExpr = groups.into_iter().map(|g| (1_i64, g)).collect();
            model.add_le(expr, 1);
        }
    }
}

/// H-SATURDAY: a Saturday meeting's trainer must have `saturday_allowed`; the
/// domain already restricts `trainer(m)` for Saturday-bound meetings to such
/// trainers (channeled through the trainer slot mask at variable-build time), so
/// this stage only asserts the invariant still holds for meetings whose weekday
/// is free to range onto Saturday.
fn enforce_saturday(model: &mut CpModelBuilder, vars: &VariableSet, inputs: &ConstraintInputs) {
    let saturday_index = Weekday::Sat.index() as i64;
    let forbidden_trainers: Vec<i64> = inputs
        .trainers
        .iter()
        .filter(|t| !t.saturday_allowed)
        .map(|t| inputs.trainer_index[&t.id])
        .collect();
    if forbidden_trainers.is_empty() {
        return;
    }

    for m in &vars.meetings {
        let on_saturday = reify_eq(model, m.wday.clone(), LinearExpr::from(saturday_index));
        for &trainer_code in &forbidden_trainers {
            model
                .add_ne(m.trainer.clone(), LinearExpr::from(trainer_code))
                .only_enforce_if(on_saturday.clone());
        }
    }
}

/// H-BUDGET: per-trainer total hours, minus one meeting's hours per realized
/// group pair involving that trainer (co-teaching bills once, not twice), must
/// not exceed the trainer's total-hour-budget.
fn enforce_budget(model: &mut CpModelBuilder, vars: &VariableSet, inputs: &ConstraintInputs) {
    let hours_by_workshop: HashMap<WorkshopId, i64> = inputs
        .workshops
        .iter()
        .map(|w| (w.id, w.hours_per_meeting as i64))
        .collect();

    for trainer in inputs.trainers {
        let code = inputs.trainer_index[&trainer.id];
        let mut terms: Vec<(i64, cp_sat::builder::BoolVar)> = Vec::new();

        for m in &vars.meetings {
            let hours = hours_by_workshop.get(&m.meeting_id.workshop_id).copied().unwrap_or(0);
            if hours == 0 {
                continue;
            }
            let assigned = reify_eq(model, m.trainer.clone(), LinearExpr::from(code));
            terms.push((hours, assigned));
        }

        for candidate in &vars.candidates {
            let hours = hours_by_workshop
                .get(&candidate.first.workshop_id)
                .copied()
                .unwrap_or(0);
            if hours == 0 {
                continue;
            }
            let m1 = vars.meeting(candidate.first);
            let trainer_is_code = reify_eq(model, m1.trainer.clone(), LinearExpr::from(code));
            // Only the groups that actually collapse onto *this* trainer's
            // schedule bill once instead of twice; a realized group between two
            // other trainers must not touch this trainer's subtraction term.
            let realized_with_trainer = reify_and(model, candidate.group.clone(), trainer_is_code);
            terms.push((-hours, realized_with_trainer));
        }

        if terms.is_empty() {
            continue;
        }
        let expr: LinearExpr = terms.into_iter().collect();
        model.add_le(expr, trainer.total_hour_budget as i64);
    }
}

/// H-SEQUENCE: within an enrollment, successive meeting ordinals occupy
/// strictly increasing `date`.
fn enforce_sequence(model: &mut CpModelBuilder, vars: &VariableSet, enrollments: &[Enrollment]) {
    for enrollment in enrollments {
        for ordinal in 1..enrollment.required_meeting_count {
            let prev = MeetingId { class_id: enrollment.class_id, workshop_id: enrollment.workshop_id, ordinal: ordinal - 1 };
            let next = MeetingId { class_id: enrollment.class_id, workshop_id: enrollment.workshop_id, ordinal };
            let prev_date = &vars.meeting(prev).date;
            let next_date = &vars.meeting(next).date;
            model.add_lt(prev_date.clone(), LinearExpr::from(next_date.clone()));
        }
    }
}

/// Enforces an enrollment's `EnrollmentDetail::AfternoonCount` requirement:
/// exactly `count` of its meetings land in the `p` band, and, when
/// `non_consecutive` is set, no two adjacent-ordinal meetings are both
/// afternoon (so the afternoon meetings end up spread across the enrollment
/// rather than bunched back-to-back).
fn enforce_afternoon_count(model: &mut CpModelBuilder, vars: &VariableSet, enrollments: &[Enrollment]) {
    let afternoon_index = Band::P.index() as i64;
    for enrollment in enrollments {
        let EnrollmentDetail::AfternoonCount { count, non_consecutive } = enrollment.detail else {
            continue;
        };

        let is_afternoon: Vec<_> = (0..enrollment.required_meeting_count)
            .map(|ordinal| {
                let id = MeetingId { class_id: enrollment.class_id, workshop_id: enrollment.workshop_id, ordinal };
                reify_eq(model, vars.meeting(id).band.clone(), LinearExpr::from(afternoon_index))
            })
            .collect();

        let sum_expr: LinearExpr = is_afternoon.iter().cloned().map(|b| (1_i64, b)).collect();
        model.add_eq(sum_expr, count as i64);

        if non_consecutive {
            for pair in is_afternoon.windows(2) {
                model.add_bool_or(vec![pair[0].clone().not(), pair[1].clone().not()]);
            }
        }
    }
}

/// H-LAST: a `must_be_last` workshop's final meeting is strictly after every
/// other covered workshop's final meeting, for the same class.
fn enforce_last(model: &mut CpModelBuilder, vars: &VariableSet, inputs: &ConstraintInputs) {
    let must_be_last: Vec<WorkshopId> = inputs.workshops.iter().filter(|w| w.must_be_last).map(|w| w.id).collect();
    if must_be_last.is_empty() {
        return;
    }

    let last_meeting_by_enrollment: HashMap<(ClassId, WorkshopId), MeetingId> = inputs
        .enrollments
        .iter()
        .filter(|e| e.required_meeting_count > 0)
        .map(|e| {
            (
                (e.class_id, e.workshop_id),
                MeetingId { class_id: e.class_id, workshop_id: e.workshop_id, ordinal: e.required_meeting_count - 1 },
            )
        })
        .collect();

    for enrollment in inputs.enrollments {
        if !must_be_last.contains(&enrollment.workshop_id) {
            continue;
        }
        let Some(&last_id) = last_meeting_by_enrollment.get(&(enrollment.class_id, enrollment.workshop_id)) else {
            continue;
        };
        let last_week = vars.meeting(last_id).week.clone();

        for other in inputs.enrollments {
            if other.class_id != enrollment.class_id || other.workshop_id == enrollment.workshop_id {
                continue;
            }
            let Some(&other_last) = last_meeting_by_enrollment.get(&(other.class_id, other.workshop_id)) else {
                continue;
            };
            let other_week = &vars.meeting(other_last).week;
            model.add_gt(last_week.clone(), LinearExpr::from(other_week.clone()));
        }
    }
}

/// H-PRECEDE: for every ordering rule (workshop A before workshop B), and every
/// class enrolled in both, A's last meeting precedes B's first meeting.
fn enforce_precede(model: &mut CpModelBuilder, vars: &VariableSet, inputs: &ConstraintInputs) {
    for rule in inputs.ordering_rules {
        let before_enrollments: HashMap<ClassId, &Enrollment> = inputs
            .enrollments
            .iter()
            .filter(|e| e.workshop_id == rule.before)
            .map(|e| (e.class_id, e))
            .collect();
        let after_enrollments: HashMap<ClassId, &Enrollment> = inputs
            .enrollments
            .iter()
            .filter(|e| e.workshop_id == rule.after)
            .map(|e| (e.class_id, e))
            .collect();

        for (class_id, before) in &before_enrollments {
            let Some(after) = after_enrollments.get(class_id) else { continue };
            if before.required_meeting_count == 0 || after.required_meeting_count == 0 {
                continue;
            }
            let before_last = MeetingId {
                class_id: *class_id,
                workshop_id: rule.before,
                ordinal: before.required_meeting_count - 1,
            };
            let after_first = MeetingId { class_id: *class_id, workshop_id: rule.after, ordinal: 0 };
            let before_week = vars.meeting(before_last).week.clone();
            let after_week = &vars.meeting(after_first).week;
            model.add_lt(before_week, LinearExpr::from(after_week.clone()));
        }
    }
}

/// H-GAP-AUTONOMOUS: the flagged workshop, for classes in the flagged schools,
/// skips a week between its second and third meeting (the preprocessor already
/// emits one fewer meeting instance for these enrollments).
fn enforce_autonomous_gap(model: &mut CpModelBuilder, vars: &VariableSet, inputs: &ConstraintInputs) {
    if inputs.autonomous_gap_rules.is_empty() {
        return;
    }
    let flagged_schools: HashMap<WorkshopId, Vec<crate::core::ids::SchoolId>> = {
        let mut map: HashMap<WorkshopId, Vec<crate::core::ids::SchoolId>> = HashMap::new();
        for rule in inputs.autonomous_gap_rules {
            map.entry(rule.workshop_id).or_default().push(rule.school_id);
        }
        map
    };
    let class_school: HashMap<ClassId, crate::core::ids::SchoolId> =
        inputs.classes.iter().map(|c| (c.id, c.school_id)).collect();

    for enrollment in inputs.enrollments {
        let Some(schools) = flagged_schools.get(&enrollment.workshop_id) else { continue };
        let Some(school) = class_school.get(&enrollment.class_id) else { continue };
        if !schools.contains(school) {
            continue;
        }
        if enrollment.required_meeting_count < 3 {
            continue;
        }
        let second = MeetingId { class_id: enrollment.class_id, workshop_id: enrollment.workshop_id, ordinal: 1 };
        let third = MeetingId { class_id: enrollment.class_id, workshop_id: enrollment.workshop_id, ordinal: 2 };
        let second_week = vars.meeting(second).week.clone();
        let third_week = vars.meeting(third).week.clone();
        let gap_expr = LinearExpr::from(third_week) - LinearExpr::from(second_week);
        model.add_ge(gap_expr, 2);
    }
}

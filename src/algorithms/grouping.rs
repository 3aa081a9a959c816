//! Candidate grouping pairs: which meeting instances could plausibly be
//! co-taught in one physical meeting (§4.2, "Candidate grouping variables").

use std::collections::HashMap;

use cp_sat::builder::CpModelBuilder;

use crate::algorithms::variables::GroupCandidate;
use crate::core::domain::{Class, Enrollment};
use crate::core::ids::{ClassId, MeetingId, WorkshopId};
use crate::preprocessing::pipeline::MeetingDomain;

/// One pair of meeting instances eligible to be realized as a single co-taught
/// meeting, with the ordinal each instance occupies within its own enrollment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CandidatePair {
    pub first: MeetingId,
    pub second: MeetingId,
}

/// Finds every candidate grouping pair across all enrollments.
///
/// Two enrollments are pairable when their classes share a school and the
/// workshop matches; within a pairable enrollment pair, meeting ordinals up to
/// `min(count(e1), count(e2))` are matched one-to-one. A candidate survives only
/// if the two meetings' admissible domains still intersect (same restriction the
/// solver would discover anyway, but pruning here keeps the model small) and, when
/// either enrollment pins a trainer, the trainers agree.
pub fn build_candidate_pairs(
    classes: &[Class],
    enrollments: &[Enrollment],
    domains: &HashMap<MeetingId, &MeetingDomain>,
) -> Vec<CandidatePair> {
    let class_by_id: HashMap<ClassId, &Class> = classes.iter().map(|c| (c.id, c)).collect();
    let mut by_workshop: HashMap<WorkshopId, Vec<&Enrollment>> = HashMap::new();
    for e in enrollments {
        by_workshop.entry(e.workshop_id).or_default().push(e);
    }

    let mut pairs = Vec::new();
    for (_workshop, group) in &by_workshop {
        for i in 0..group.len() {
            for j in (i + 1)..group.len() {
                let e1 = group[i];
                let e2 = group[j];
                if e1.class_id == e2.class_id {
                    continue;
                }
                let (Some(c1), Some(c2)) =
                    (class_by_id.get(&e1.class_id), class_by_id.get(&e2.class_id))
                else {
                    continue;
                };
                if c1.school_id != c2.school_id {
                    continue;
                }
                if let (Some(t1), Some(t2)) = (e1.fixed_trainer, e2.fixed_trainer) {
                    if t1 != t2 {
                        continue;
                    }
                }

                let shared_ordinals = e1.required_meeting_count.min(e2.required_meeting_count);
                for ordinal in 0..shared_ordinals {
                    let m1 = MeetingId { class_id: e1.class_id, workshop_id: e1.workshop_id, ordinal };
                    let m2 = MeetingId { class_id: e2.class_id, workshop_id: e2.workshop_id, ordinal };
                    let (Some(d1), Some(d2)) = (domains.get(&m1), domains.get(&m2)) else {
                        continue;
                    };
                    if domains_compatible(d1, d2) {
                        pairs.push(CandidatePair { first: m1, second: m2 });
                    }
                }
            }
        }
    }
    // Deterministic order, smaller (class, class) tuple first: the driver's
    // symmetry-breaking branches on this ordering among equal-cost pairs.
    pairs.sort_by_key(|p| (p.first.class_id, p.second.class_id, p.first.ordinal));
    pairs
}

/// Creates the boolean `group` variable for each candidate pair.
pub fn create_group_vars(model: &mut CpModelBuilder, pairs: &[CandidatePair]) -> Vec<GroupCandidate> {
    pairs
        .iter()
        .map(|pair| GroupCandidate {
            first: pair.first,
            second: pair.second,
            group: model.new_bool_var(),
        })
        .collect()
}

fn domains_compatible(d1: &MeetingDomain, d2: &MeetingDomain) -> bool {
    match (&d1.pin, &d2.pin) {
        (Some(p1), Some(p2)) => p1.week == p2.week && p1.weekday == p2.weekday && p1.band == p2.band,
        (Some(p), None) => d2.slots.contains(&(p.week, p.weekday, p.band)),
        (None, Some(p)) => d1.slots.contains(&(p.week, p.weekday, p.band)),
        (None, None) => d1.slots.intersection(&d2.slots).next().is_some(),
    }
}

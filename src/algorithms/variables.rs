//! Variable builder: allocates one `cp_sat` decision variable set per meeting
//! instance and the candidate grouping variables between compatible pairs.

use std::collections::HashMap;

use cp_sat::builder::{BoolVar, CpModelBuilder, IntVar};

use super::reify::slot_key;
use crate::core::calendar::Horizon;
use crate::core::ids::{MeetingId, TrainerId};
use crate::preprocessing::pipeline::MeetingDomain;

/// The decision variables attached to a single meeting instance.
///
/// `date` and `slot` are functionally dependent on `week`/`wday`/`band`; they
/// exist as separate variables only because downstream constraints (H-SEQUENCE,
/// H-NO-OVERLAP) are far cheaper to state as linear/all-different constraints over
/// a single integer than as conjunctions over three.
#[derive(Debug, Clone)]
pub struct MeetingVars {
    pub meeting_id: MeetingId,
    pub week: IntVar,
    pub wday: IntVar,
    pub band: IntVar,
    pub trainer: IntVar,
    /// `week * 6 + wday`, channeled to `week`/`wday` (see [`Horizon::date_key`]).
    pub date: IntVar,
    /// `week * 18 + wday * 3 + band`, channeled to `week`/`wday`/`band`.
    pub slot: IntVar,
    /// `Some` when the meeting is pinned; callers should also add equality
    /// constraints binding these variables to the pin's exact values.
    pub pin_trainer: Option<TrainerId>,
}

/// An unordered candidate pair of meetings eligible for co-teaching, with the
/// boolean `group` variable asserting they are realized as one physical meeting.
#[derive(Debug, Clone)]
pub struct GroupCandidate {
    pub first: MeetingId,
    pub second: MeetingId,
    pub group: BoolVar,
}

/// All variables created for one model, keyed for later lookup by the
/// constraint compiler, objective builder and solution extractor.
#[derive(Debug, Clone, Default)]
pub struct VariableSet {
    pub meetings: Vec<MeetingVars>,
    pub by_id: HashMap<MeetingId, usize>,
    pub candidates: Vec<GroupCandidate>,
}

impl VariableSet {
    pub fn meeting(&self, id: MeetingId) -> &MeetingVars {
        &self.meetings[self.by_id[&id]]
    }
}

const SLOT_WEEKDAYS: i64 = 6;

/// Creates week/wday/band/trainer/date/slot variables for every meeting domain.
///
/// `week`/`wday`/`band` are each restricted to their independent projections of
/// the admissible `(week, weekday, band)` set — supersets of what any single
/// admissible triple needs, not the joint restriction itself. The joint
/// restriction lives entirely on `slot`: its domain is built from the actual
/// `slot_key` of every triple in `domain.slots` (non-contiguous in general,
/// since boundary weeks and blackouts carve individual cells out of the
/// cube), and [`super::constraints::channel_date_and_slot`]'s equality
/// `slot = week * 18 + wday * 3 + band` then forces whatever `week`/`wday`/
/// `band` the solver picks to decode back to one of those admissible keys.
pub fn build_meeting_vars(
    model: &mut CpModelBuilder,
    horizon: &Horizon,
    domains: &[MeetingDomain],
    trainer_index: &HashMap<TrainerId, i64>,
) -> VariableSet {
    let week_count = horizon.week_count() as i64;
    let mut meetings = Vec::with_capacity(domains.len());
    let mut by_id = HashMap::with_capacity(domains.len());

    for domain in domains {
        let (week_domain, wday_domain, band_domain, slot_domain) = if let Some(pin) = &domain.pin {
            let w = pin.week as i64;
            let d = pin.weekday.index() as i64;
            let b = pin.band.index() as i64;
            let key = slot_key(w, d, b);
            (vec![(w, w)], vec![(d, d)], vec![(b, b)], vec![(key, key)])
        } else {
            let weeks: Vec<i64> = domain.slots.iter().map(|(w, _, _)| *w as i64).collect();
            let wdays: Vec<i64> = domain.slots.iter().map(|(_, d, _)| d.index() as i64).collect();
            let bands: Vec<i64> = domain.slots.iter().map(|(_, _, b)| b.index() as i64).collect();
            let keys: Vec<i64> = domain
                .slots
                .iter()
                .map(|(w, d, b)| slot_key(*w as i64, d.index() as i64, b.index() as i64))
                .collect();
            (to_domain(weeks), to_domain(wdays), to_domain(bands), to_domain(keys))
        };

        let trainer_domain: Vec<(i64, i64)> = to_domain(
            domain
                .trainers
                .iter()
                .map(|t| trainer_index[t])
                .collect::<Vec<_>>(),
        );

        let week = model.new_int_var(week_domain.clone());
        let wday = model.new_int_var(wday_domain.clone());
        let band = model.new_int_var(band_domain.clone());
        let trainer = model.new_int_var(trainer_domain);

        let date = model.new_int_var(vec![(0, week_count * SLOT_WEEKDAYS - 1)]);
        let slot = model.new_int_var(slot_domain);

        meetings.push(MeetingVars {
            meeting_id: domain.meeting_id,
            week,
            wday,
            band,
            trainer,
            date,
            slot,
            pin_trainer: domain.pin.as_ref().and_then(|p| p.trainer_id),
        });
        by_id.insert(domain.meeting_id, meetings.len() - 1);
    }

    VariableSet { meetings, by_id, candidates: Vec::new() }
}

fn to_domain(mut values: Vec<i64>) -> Vec<(i64, i64)> {
    values.sort_unstable();
    values.dedup();
    if values.is_empty() {
        // An empty admissible set is caught as `DomainEmpty` before this point;
        // this branch only guards against a degenerate caller.
        return vec![(-1, -1)];
    }
    values.into_iter().map(|v| (v, v)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn to_domain_dedupes_and_sorts() {
        let domain = to_domain(vec![3, 1, 1, 2]);
        assert_eq!(domain, vec![(1, 1), (2, 2), (3, 3)]);
    }
}

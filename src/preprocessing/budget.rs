//! Pre-solve budget feasibility (§7, error kind 2: "budget-impossible-even-with-grouping").
//!
//! Only meetings whose domain has collapsed to a single eligible trainer (either
//! because the enrollment hard-assigns one, or because only one trainer overlaps
//! the enrollment's admissible slots at all) are forced onto that trainer
//! regardless of what the solver later decides; for those, the best the solver
//! could ever do is realize every compatible grouping pair between them. If even
//! that best case still exceeds the trainer's budget, the model can never be
//! feasible and there is no reason to spend solver time discovering that.
//! Meetings with a genuinely free trainer choice are left to the solver's own
//! `H-BUDGET` constraint and its `Infeasible` result.

use std::collections::{HashMap, HashSet};

use crate::core::domain::Trainer;
use crate::core::ids::{MeetingId, TrainerId, WorkshopId};
use crate::error::{SolverError, SolverResult};

use super::pipeline::MeetingDomain;

/// Checks every trainer's forced-meeting hour load against their budget,
/// crediting the maximum grouping savings achievable among those meetings.
///
/// `candidate_pairs` is the full candidate-grouping pair list (§4.2); only pairs
/// where both sides are forced onto the same trainer count toward savings here.
pub fn check_budget_feasibility(
    trainers: &[Trainer],
    domains: &[MeetingDomain],
    hours_per_workshop: &HashMap<WorkshopId, u32>,
    candidate_pairs: &[(MeetingId, MeetingId)],
) -> SolverResult<()> {
    let mut forced: HashMap<TrainerId, HashSet<MeetingId>> = HashMap::new();
    for domain in domains {
        if let [only] = domain.trainers.as_slice() {
            forced.entry(*only).or_default().insert(domain.meeting_id);
        }
    }

    for trainer in trainers {
        let Some(meetings) = forced.get(&trainer.id) else { continue };
        if meetings.is_empty() {
            continue;
        }

        let gross_hours: u32 = meetings
            .iter()
            .map(|m| hours_per_workshop.get(&m.workshop_id).copied().unwrap_or(0))
            .sum();

        // Savings: at most one grouping credit per meeting (H-GROUP-CAP caps a
        // meeting at one partner), so the true upper bound on savings is a
        // maximum (not merely maximal) matching over candidate pairs restricted
        // to this trainer's forced meetings. A greedy matching can strand edges
        // a maximum matching wouldn't (path m1-m2-m3-m4: greedy may take only
        // (m2,m3), maximum takes {(m1,m2),(m3,m4)}), so we solve it exactly.
        // Candidate pairs only ever link meetings of the same workshop, so the
        // subgraph splits into one independent, uniformly-weighted component
        // per workshop; maximizing total hours saved per component reduces to
        // maximizing matching cardinality within it.
        let mut by_workshop: HashMap<WorkshopId, (Vec<MeetingId>, Vec<(MeetingId, MeetingId)>)> =
            HashMap::new();
        for &m in meetings {
            by_workshop.entry(m.workshop_id).or_default().0.push(m);
        }
        for (a, b) in candidate_pairs {
            if meetings.contains(a) && meetings.contains(b) {
                by_workshop.entry(a.workshop_id).or_default().1.push((*a, *b));
            }
        }

        let mut savings = 0u32;
        for (workshop_id, (nodes, edges)) in &by_workshop {
            if edges.is_empty() {
                continue;
            }
            let hours = hours_per_workshop.get(workshop_id).copied().unwrap_or(0);
            savings += max_matching_size(nodes, edges) as u32 * hours;
        }

        let needed = gross_hours.saturating_sub(savings);
        if needed > trainer.total_hour_budget {
            return Err(SolverError::BudgetOver {
                trainer_id: trainer.id,
                needed,
                budget: trainer.total_hour_budget,
            });
        }
    }

    Ok(())
}

/// Maximum-cardinality matching over a general (non-bipartite) graph, found by
/// exhaustive backtracking. The forced-meeting subgraph per trainer per
/// workshop is small — bounded by how many meetings collapse onto a single
/// eligible trainer — so this stays cheap in practice; a full blossom
/// implementation buys nothing at this scale.
fn max_matching_size(nodes: &[MeetingId], edges: &[(MeetingId, MeetingId)]) -> usize {
    let index: HashMap<MeetingId, usize> =
        nodes.iter().enumerate().map(|(i, n)| (*n, i)).collect();
    let mut adjacency: Vec<Vec<usize>> = vec![Vec::new(); nodes.len()];
    for (a, b) in edges {
        let (ia, ib) = (index[a], index[b]);
        adjacency[ia].push(ib);
        adjacency[ib].push(ia);
    }

    let mut matched = vec![false; nodes.len()];
    best_matching(&adjacency, &mut matched, 0)
}

fn best_matching(adjacency: &[Vec<usize>], matched: &mut [bool], node: usize) -> usize {
    if node >= matched.len() {
        return 0;
    }
    if matched[node] {
        return best_matching(adjacency, matched, node + 1);
    }

    let mut best = best_matching(adjacency, matched, node + 1);
    for &partner in &adjacency[node] {
        if matched[partner] {
            continue;
        }
        matched[node] = true;
        matched[partner] = true;
        let candidate = 1 + best_matching(adjacency, matched, node + 1);
        matched[node] = false;
        matched[partner] = false;
        best = best.max(candidate);
    }
    best
}

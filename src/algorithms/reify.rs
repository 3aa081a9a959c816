//! Small Boolean-reification helpers shared by the constraint compiler and the
//! objective builder. Kept in one place because getting the channeling
//! direction wrong here silently breaks whatever is built on top of it.

use cp_sat::builder::{BoolVar, CpModelBuilder, IntVar, LinearExpr};

pub(crate) const SLOT_WEEKDAYS: i64 = 6;
pub(crate) const SLOT_BANDS: i64 = 3;

/// Mirrors [`super::variables::build_meeting_vars`]'s `slot(m)` encoding.
pub(crate) fn slot_key(week: i64, wday: i64, band: i64) -> i64 {
    week * SLOT_WEEKDAYS * SLOT_BANDS + wday * SLOT_BANDS + band
}

/// Reifies `bool <-> (var == value)` with full channeling in both directions:
/// `bool` true forces the equality, `bool` false forces the inequality. Plain
/// `only_enforce_if` on the forward direction alone (the easy mistake) leaves
/// the solver free to hold `bool` false even when the equality actually holds,
/// which silently defeats any clause built on top of it.
pub(crate) fn reify_eq(model: &mut CpModelBuilder, var: IntVar, value: LinearExpr) -> BoolVar {
    let bool_var = model.new_bool_var();
    model.add_eq(var.clone(), value.clone()).only_enforce_if(bool_var.clone());
    model.add_ne(var, value).only_enforce_if(bool_var.clone().not());
    bool_var
}

/// Reifies `bool <-> (a AND b)` with full channeling, via the standard
/// three-clause Tseitin encoding (`r => a`, `r => b`, `a && b => r`).
pub(crate) fn reify_and(model: &mut CpModelBuilder, a: BoolVar, b: BoolVar) -> BoolVar {
    let r = model.new_bool_var();
    model.add_implication(r.clone(), a.clone());
    model.add_implication(r.clone(), b.clone());
    model.add_bool_or(vec![r.clone(), a.not(), b.not()]);
    r
}

/// Reifies `bool <-> OR(terms)` with full channeling: each `terms[i] => r`
/// individually, and `r => OR(terms)` via one disjunction. `terms` must be
/// non-empty; callers always have at least one disjunct here (trainer count,
/// candidate-trainer lists are never empty once the domain-emptiness check
/// upstream has passed).
pub(crate) fn reify_or(model: &mut CpModelBuilder, terms: Vec<BoolVar>) -> BoolVar {
    let r = model.new_bool_var();
    for t in &terms {
        model.add_implication(t.clone(), r.clone());
    }
    let mut clause: Vec<BoolVar> = terms.into_iter().map(|t| t.not()).collect();
    clause.push(r.clone());
    model.add_bool_or(clause);
    r
}

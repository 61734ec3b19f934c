use crate::types::result::RawResult;
use crate::types::scoring::{ScoreSummary, WeightTable};

/// Weighted sum of the breakdown minus one point per error, floored at zero.
///
/// Saturating arithmetic keeps contest-scale counts from overflowing, and the
/// saturating subtraction is the clamp itself.
pub fn compute_score(result: &RawResult, weights: &WeightTable) -> ScoreSummary {
    let addition = result
        .breakdown()
        .iter()
        .fold(0u64, |sum, (tag, count)| {
            let weight = weights.weight(*tag);
            if weight == 0 {
                tracing::debug!(tag = %tag, count, "tag has no weight; contributes zero");
            }
            sum.saturating_add(count.saturating_mul(u64::from(weight)))
        });
    let deduction = result.errors().len() as u64;

    ScoreSummary {
        addition,
        deduction,
        score: addition.saturating_sub(deduction),
    }
}

use std::fmt::{Display, Formatter};

use log::{debug, trace};
#[cfg(feature = "parallel")]
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::pattern::Pattern;
use crate::phase::{Check, Combination};
use crate::week::{Observations, PriceBound, FIRST_SALE_SLOT, SLOTS};

/// Largest price tolerance tried by strict pinning before giving up.
const MAX_TOLERANCE: u32 = 5;

/// How observed prices are reconciled with each combination.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Pinning {
    /// An observed price replaces the slot's bound in every combination,
    /// even where the combination could never have produced it.
    #[default]
    Permissive,
    /// A combination survives only if every observed price fits its bounds.
    /// Tolerances of 0 up to 5 bells are tried in turn, and the first one
    /// that leaves any combination standing is used.
    Strict,
}

/// The union of every surviving combination's bounds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Prediction {
    pub bounds: [PriceBound; SLOTS],
    /// The pattern with the most surviving combinations, or `Unknown` if none survived.
    pub pattern: Pattern,
    /// Surviving combinations for each candidate pattern, in the game's order.
    pub pattern_counts: Vec<(Pattern, usize)>,
    /// Tolerance strict pinning needed. Always zero when permissive.
    pub tolerance: u32,
}

impl Prediction {
    fn fallback(purchase_price: u32, candidates: &[Pattern]) -> Self {
        Prediction {
            bounds: [PriceBound::exact(purchase_price); SLOTS],
            pattern: Pattern::Unknown,
            pattern_counts: candidates.iter().map(|p| (*p, 0)).collect(),
            tolerance: 0,
        }
    }

    /// Total number of surviving combinations.
    pub fn combinations(&self) -> usize {
        self.pattern_counts.iter().map(|(_, count)| count).sum()
    }

    /// Lowest and highest price possible across the sale slots.
    pub fn sale_range(&self) -> PriceBound {
        self.bounds[FIRST_SALE_SLOT..].iter()
            .copied()
            .reduce(PriceBound::union)
            .unwrap_or(self.bounds[0])
    }
}

impl Display for Prediction {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:", self.pattern)?;
        for bound in self.bounds.iter() {
            write!(f, " {}", bound)?;
        }
        Ok(())
    }
}

/// Running min/max union and per-pattern counts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct Tally {
    bounds: Option<[PriceBound; SLOTS]>,
    counts: [usize; 4],
}

impl Tally {
    fn add(mut self, pattern: Pattern, bounds: [PriceBound; SLOTS]) -> Self {
        if let Some(index) = pattern.index() {
            self.counts[index] += 1;
        }
        self.bounds = Some(match self.bounds {
            Some(current) => merge(current, bounds),
            None => bounds,
        });
        self
    }

    fn merge(self, other: Tally) -> Self {
        let bounds = match (self.bounds, other.bounds) {
            (Some(a), Some(b)) => Some(merge(a, b)),
            (a, b) => a.or(b),
        };
        let mut counts = self.counts;
        for (count, other) in counts.iter_mut().zip(other.counts) {
            *count += other;
        }
        Tally { bounds, counts }
    }

    fn count(&self, pattern: Pattern) -> usize {
        pattern.index().map_or(0, |i| self.counts[i])
    }

    /// Ties go to the pattern the game numbers first.
    fn dominant(&self) -> Pattern {
        let mut best = (Pattern::Unknown, 0);
        for (pattern, count) in Pattern::ALL.into_iter().zip(self.counts) {
            if count > best.1 {
                best = (pattern, count);
            }
        }
        best.0
    }
}

fn merge(a: [PriceBound; SLOTS], b: [PriceBound; SLOTS]) -> [PriceBound; SLOTS] {
    let mut merged = a;
    for (bound, other) in merged.iter_mut().zip(b) {
        *bound = bound.union(other);
    }
    merged
}

/// Bounds for every slot under one combination, or `None` if `check` rejects it.
fn evaluate(combination: &Combination, purchase_price: u32, observations: &Observations,
            check: Check) -> Option<[PriceBound; SLOTS]> {
    // Sunday is always the purchase price, whatever was observed there.
    let mut bounds = [PriceBound::exact(purchase_price); SLOTS];
    let mut start = FIRST_SALE_SLOT;
    for phase in combination.phases() {
        let end = start + phase.len();
        phase.bound(purchase_price, &observations[start..end], check, &mut bounds[start..end])?;
        start = end;
    }
    trace!("{:?}: {:?}", combination, bounds);
    Some(bounds)
}

fn surviving(combination: &Combination, purchase_price: u32, observations: &Observations,
             check: Check) -> Option<(Pattern, [PriceBound; SLOTS])> {
    evaluate(combination, purchase_price, observations, check).map(|b| (combination.pattern(), b))
}

#[cfg_attr(feature = "parallel", allow(dead_code))]
fn tally_sequential(combinations: &[Combination], purchase_price: u32,
                    observations: &Observations, check: Check) -> Tally {
    combinations.iter()
        .filter_map(|c| surviving(c, purchase_price, observations, check))
        .fold(Tally::default(), |tally, (pattern, bounds)| tally.add(pattern, bounds))
}

#[cfg(feature = "parallel")]
fn tally_parallel(combinations: &[Combination], purchase_price: u32,
                  observations: &Observations, check: Check) -> Tally {
    combinations.par_iter()
        .filter_map(|c| surviving(c, purchase_price, observations, check))
        .fold(Tally::default, |tally, (pattern, bounds)| tally.add(pattern, bounds))
        .reduce(Tally::default, Tally::merge)
}

fn tally(combinations: &[Combination], purchase_price: u32, observations: &Observations,
         check: Check) -> Tally {
    #[cfg(feature = "parallel")]
    return tally_parallel(combinations, purchase_price, observations, check);

    #[cfg(not(feature = "parallel"))]
    tally_sequential(combinations, purchase_price, observations, check)
}

/// Configurable price predictor.
///
/// ```
/// use turnip_predict_lib::{Pattern, Pinning, Predictor, SLOTS};
///
/// let mut observations = [None; SLOTS];
/// observations[2] = Some(90);
/// let prediction = Predictor::new()
///     .hint(Some(Pattern::Decreasing))
///     .pinning(Pinning::Strict)
///     .predict(100, &observations);
/// assert_eq!(prediction.pattern, Pattern::Decreasing);
/// ```
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct Predictor {
    hint: Option<Pattern>,
    pinning: Pinning,
    first_buy: bool,
}

impl Predictor {
    pub fn new() -> Self {
        Predictor::default()
    }

    /// Only consider this pattern. `None` or `Unknown` considers all four.
    pub fn hint(mut self, hint: Option<Pattern>) -> Self {
        self.hint = hint;
        self
    }

    pub fn pinning(mut self, pinning: Pinning) -> Self {
        self.pinning = pinning;
        self
    }

    /// The first week a player buys turnips is always a small spike.
    pub fn first_buy(mut self, first_buy: bool) -> Self {
        self.first_buy = first_buy;
        self
    }

    /// Patterns that will be enumerated.
    pub fn candidates(&self) -> Vec<Pattern> {
        if self.first_buy {
            return vec![Pattern::SmallSpike];
        }
        match self.hint.filter(|p| p.is_known()) {
            Some(pattern) => vec![pattern],
            None => Pattern::ALL.to_vec(),
        }
    }

    pub fn predict(&self, purchase_price: u32, observations: &Observations) -> Prediction {
        let candidates = self.candidates();
        let combinations: Vec<Combination> = candidates.iter()
            .flat_map(|p| Combination::enumerate(*p))
            .collect();
        debug!("predicting from {} bells with {} observed prices: {} combinations over {:?}",
               purchase_price, observations.iter().flatten().count(), combinations.len(), candidates);

        let checks: Vec<Check> = match self.pinning {
            Pinning::Permissive => vec![Check::Permissive],
            Pinning::Strict => (0..=MAX_TOLERANCE).map(|fudge| Check::Strict { fudge }).collect(),
        };
        for check in checks {
            let tally = tally(&combinations, purchase_price, observations, check);
            let bounds = match tally.bounds {
                Some(bounds) => bounds,
                None => {
                    debug!("no combination survived {:?}", check);
                    continue;
                }
            };
            let prediction = Prediction {
                bounds,
                pattern: tally.dominant(),
                pattern_counts: candidates.iter().map(|p| (*p, tally.count(*p))).collect(),
                tolerance: match check {
                    Check::Strict { fudge } => fudge,
                    Check::Permissive => 0,
                },
            };
            debug!("prediction: {}", prediction);
            return prediction;
        }

        debug!("nothing matched; falling back to the purchase price");
        Prediction::fallback(purchase_price, &candidates)
    }
}

/// Predict with permissive pinning.
pub fn predict(purchase_price: u32, observations: &Observations, hint: Option<Pattern>) -> Prediction {
    Predictor::new().hint(hint).predict(purchase_price, observations)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tally_dominant_prefers_earlier_on_tie() {
        let week = [PriceBound::exact(1); SLOTS];
        let tally = Tally::default()
            .add(Pattern::SmallSpike, week)
            .add(Pattern::LargeSpike, week);
        assert_eq!(tally.dominant(), Pattern::LargeSpike);
        assert_eq!(Tally::default().dominant(), Pattern::Unknown);
    }

    #[test]
    fn test_tally_merge_is_union() {
        let low = [PriceBound::new(10, 20); SLOTS];
        let high = [PriceBound::new(15, 40); SLOTS];
        let merged = Tally::default().add(Pattern::Decreasing, low)
            .merge(Tally::default().add(Pattern::Fluctuating, high));
        assert_eq!(merged.bounds, Some([PriceBound::new(10, 40); SLOTS]));
        assert_eq!(merged.count(Pattern::Decreasing), 1);
        assert_eq!(merged.count(Pattern::Fluctuating), 1);
        assert_eq!(merged.count(Pattern::Unknown), 0);
    }

    #[test]
    #[cfg(feature = "parallel")]
    fn test_parallel_tally_matches_sequential() {
        let combinations: Vec<Combination> = Pattern::ALL.into_iter()
            .flat_map(Combination::enumerate)
            .collect();
        let mut observations = [None; SLOTS];
        observations[2] = Some(90);
        observations[3] = Some(86);
        for check in [Check::Permissive, Check::Strict { fudge: 0 }, Check::Strict { fudge: 5 }] {
            let sequential = tally_sequential(&combinations, 104, &observations, check);
            let parallel = tally_parallel(&combinations, 104, &observations, check);
            assert_eq!(parallel, sequential, "{:?}", check);
        }
    }

    #[test]
    fn test_tally_sequential_counts() {
        let combinations: Vec<Combination> = Pattern::ALL.into_iter()
            .flat_map(Combination::enumerate)
            .collect();
        let sequential = tally_sequential(&combinations, 100, &[None; SLOTS], Check::Permissive);
        assert_eq!(sequential.counts, [56, 7, 1, 8]);
        assert_eq!(sequential, tally(&combinations, 100, &[None; SLOTS], Check::Permissive));
    }

    #[test]
    fn test_candidates() {
        assert_eq!(Predictor::new().candidates(), Pattern::ALL.to_vec());
        assert_eq!(Predictor::new().hint(Some(Pattern::Unknown)).candidates(), Pattern::ALL.to_vec());
        assert_eq!(Predictor::new().hint(Some(Pattern::Decreasing)).candidates(),
                   vec![Pattern::Decreasing]);
        assert_eq!(Predictor::new().hint(Some(Pattern::Decreasing)).first_buy(true).candidates(),
                   vec![Pattern::SmallSpike]);
    }
}

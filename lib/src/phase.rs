mod combination;

use crate::random::Xorshift;
use crate::rate::{implied_rates, int_ceil, to_f32, RateRange};
use crate::week::PriceBound;

pub use combination::{Combination, Combinations};

/// A run of consecutive slots whose rates follow one generation rule.
///
/// The same description drives both directions: `simulate` draws concrete
/// prices exactly as the game does, and `bound` derives the range of prices
/// the rule can produce.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Phase {
    /// Every slot draws its own rate from `rates`.
    Independent { len: usize, rates: RateRange },
    /// One starting rate, reduced after every slot by `step` plus a jitter
    /// drawn from `[0, jitter)`.
    Decline { len: usize, start: Start, step: i64, jitter: i64 },
    /// The small spike's three-slot peak. A peak rate is drawn from `rates`;
    /// the middle slot uses it directly and each side draws below it and
    /// loses one bell.
    Peak { rates: RateRange },
}

/// How a declining phase picks its first rate.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Start {
    /// Drawn from the range.
    Within(RateRange),
    /// A fixed ceiling less a draw from `[0, jitter)`.
    Below { ceiling: i64, jitter: i64 },
}

impl Start {
    /// Every starting rate this rule can produce.
    pub fn range(self) -> RateRange {
        match self {
            Start::Within(range) => range,
            Start::Below { ceiling, jitter } => RateRange::new(ceiling - jitter, ceiling),
        }
    }

    fn draw(self, rng: &mut Xorshift) -> f32 {
        match self {
            Start::Within(range) => draw_rate(rng, range),
            Start::Below { ceiling, jitter } => to_f32(ceiling) - rng.next_float(0.0, to_f32(jitter)),
        }
    }
}

/// How observed prices are reconciled with a phase's computed bounds.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub(crate) enum Check {
    /// Observations overwrite the computed bound, whatever it was.
    Permissive,
    /// Observations must fall within the computed bound, give or take
    /// `fudge`, and narrow declining rates for later slots.
    Strict { fudge: u32 },
}

impl Check {
    fn is_strict(self) -> bool {
        matches!(self, Check::Strict { .. })
    }

    fn admits(self, (min, max): (u32, u32), price: u32) -> bool {
        match self {
            Check::Permissive => true,
            Check::Strict { fudge } => {
                price >= min.saturating_sub(fudge) && price <= max.saturating_add(fudge)
            }
        }
    }
}

fn draw_rate(rng: &mut Xorshift, range: RateRange) -> f32 {
    rng.next_float(to_f32(range.min), to_f32(range.max))
}

/// Rates consistent with an observed price, after pulling it into the
/// computed price range.
fn observed_rates(price: u32, (min, max): (u32, u32), base_price: u32) -> Option<RateRange> {
    implied_rates(price.max(min).min(max), base_price)
}

impl Phase {
    /// Number of slots covered.
    pub fn len(&self) -> usize {
        match self {
            Phase::Independent { len, .. } | Phase::Decline { len, .. } => *len,
            Phase::Peak { .. } => 3,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Draw this phase's prices into `out`, which must be exactly `len()` long.
    /// A declining phase draws its starting rate even when it has no slots.
    pub fn simulate(&self, rng: &mut Xorshift, base_price: u32, out: &mut [u32]) {
        debug_assert_eq!(out.len(), self.len());
        let base = base_price as f32;
        match *self {
            Phase::Independent { rates, .. } => {
                for slot in out.iter_mut() {
                    *slot = int_ceil(draw_rate(rng, rates) * base);
                }
            }
            Phase::Decline { start, step, jitter, .. } => {
                let step = to_f32(step);
                let jitter = to_f32(jitter);
                let mut rate = start.draw(rng);
                for slot in out.iter_mut() {
                    *slot = int_ceil(rate * base);
                    rate -= step;
                    rate -= rng.next_float(0.0, jitter);
                }
            }
            Phase::Peak { rates } => {
                let [left, centre, right] = out else {
                    return;
                };
                let floor = to_f32(rates.min);
                let peak = draw_rate(rng, rates);
                *left = int_ceil(rng.next_float(floor, peak) * base).saturating_sub(1);
                *centre = int_ceil(peak * base);
                *right = int_ceil(rng.next_float(floor, peak) * base).saturating_sub(1);
            }
        }
    }

    /// Write the possible price range of each slot into `out`, pinning
    /// observed slots. Returns `None` if `check` rules the phase out.
    pub(crate) fn bound(&self, base_price: u32, observed: &[Option<u32>], check: Check,
                        out: &mut [PriceBound]) -> Option<()> {
        debug_assert_eq!(out.len(), self.len());
        debug_assert_eq!(observed.len(), self.len());
        match *self {
            Phase::Independent { rates, .. } => {
                let prices = rates.prices(base_price);
                for (slot, seen) in out.iter_mut().zip(observed) {
                    *slot = match *seen {
                        None => PriceBound::new(prices.0, prices.1),
                        Some(price) => {
                            if check.is_strict() {
                                if !check.admits(prices, price) {
                                    return None;
                                }
                                observed_rates(price, prices, base_price)?.intersect(rates)?;
                            }
                            PriceBound::exact(price)
                        }
                    };
                }
            }
            Phase::Decline { start, step, jitter, .. } => {
                let mut rates = start.range();
                for (slot, seen) in out.iter_mut().zip(observed) {
                    let prices = rates.prices(base_price);
                    *slot = match *seen {
                        None => PriceBound::new(prices.0, prices.1),
                        Some(price) => {
                            if check.is_strict() {
                                if !check.admits(prices, price) {
                                    return None;
                                }
                                rates = observed_rates(price, prices, base_price)?
                                    .intersect(rates)
                                    .filter(|narrowed| narrowed.min < narrowed.max)?;
                            }
                            PriceBound::exact(price)
                        }
                    };
                    rates = rates.decayed(step, step + jitter);
                }
            }
            Phase::Peak { rates } => {
                let (low, high) = rates.prices(base_price);
                let side = (low.saturating_sub(1), high.saturating_sub(1));
                for ((slot, seen), prices) in out.iter_mut().zip(observed).zip([side, (low, high), side]) {
                    *slot = match *seen {
                        None => PriceBound::new(prices.0, prices.1),
                        Some(price) if check.admits(prices, price) => PriceBound::exact(price),
                        Some(_) => return None,
                    };
                }
            }
        }
        Some(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bounds(phase: &Phase, base_price: u32, observed: &[Option<u32>], check: Check)
              -> Option<Vec<PriceBound>> {
        let mut out = vec![PriceBound::exact(0); phase.len()];
        phase.bound(base_price, observed, check, &mut out)?;
        Some(out)
    }

    #[test]
    fn test_decline_bounds_widen_each_slot() {
        let phase = Phase::Decline {
            len: 3,
            start: Start::Within(RateRange::new(6_000, 8_000)),
            step: 400,
            jitter: 600,
        };
        let result = bounds(&phase, 100, &[None; 3], Check::Permissive).unwrap();
        assert_eq!(result, vec![PriceBound::new(60, 80), PriceBound::new(50, 76),
                                PriceBound::new(40, 72)]);
    }

    #[test]
    fn test_below_start_range() {
        let start = Start::Below { ceiling: 9_000, jitter: 500 };
        assert_eq!(start.range(), RateRange::new(8_500, 9_000));
    }

    #[test]
    fn test_peak_bounds() {
        let phase = Phase::Peak { rates: RateRange::new(14_000, 20_000) };
        let result = bounds(&phase, 100, &[None; 3], Check::Permissive).unwrap();
        assert_eq!(result, vec![PriceBound::new(139, 199), PriceBound::new(140, 200),
                                PriceBound::new(139, 199)]);
        // The centre can never sit below the floor.
        assert!(bounds(&phase, 100, &[None, Some(139), None], Check::Strict { fudge: 0 }).is_none());
        assert!(bounds(&phase, 100, &[None, Some(139), None], Check::Strict { fudge: 1 }).is_some());
    }

    #[test]
    fn test_permissive_pins_anything() {
        let phase = Phase::Independent { len: 2, rates: RateRange::new(9_000, 14_000) };
        let result = bounds(&phase, 100, &[Some(500), None], Check::Permissive).unwrap();
        assert_eq!(result, vec![PriceBound::exact(500), PriceBound::new(90, 140)]);
        assert!(bounds(&phase, 100, &[Some(500), None], Check::Strict { fudge: 5 }).is_none());
    }

    #[test]
    fn test_strict_narrows_decline() {
        let phase = Phase::Decline {
            len: 2,
            start: Start::Within(RateRange::new(8_500, 9_000)),
            step: 300,
            jitter: 200,
        };
        // 90 at base 100 means the starting rate was at least 0.89.
        let result = bounds(&phase, 100, &[Some(90), None], Check::Strict { fudge: 0 }).unwrap();
        assert_eq!(result, vec![PriceBound::exact(90), PriceBound::new(84, 87)]);
        let loose = bounds(&phase, 100, &[Some(90), None], Check::Permissive).unwrap();
        assert_eq!(loose[1], PriceBound::new(80, 87));
    }

    #[test]
    fn test_simulate_peak_shape() {
        let phase = Phase::Peak { rates: RateRange::new(14_000, 20_000) };
        for seed in 0..200 {
            let mut rng = Xorshift::new(seed);
            let mut out = [0; 3];
            phase.simulate(&mut rng, 100, &mut out);
            assert!(out[0] < out[1] && out[2] < out[1], "{:?}", out);
            assert!((140..=200).contains(&out[1]));
        }
    }

    #[test]
    fn test_empty_decline_still_draws() {
        let phase = Phase::Decline {
            len: 0,
            start: Start::Within(RateRange::new(4_000, 9_000)),
            step: 300,
            jitter: 200,
        };
        let mut rng = Xorshift::new(3);
        phase.simulate(&mut rng, 100, &mut []);
        assert_ne!(rng, Xorshift::new(3));
    }
}

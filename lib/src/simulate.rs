use log::{debug, trace};
use serde::Serialize;

use crate::pattern::Pattern;
use crate::phase::Combination;
use crate::random::Xorshift;
use crate::week::{WeekSlots, FIRST_SALE_SLOT, SLOTS};

const MIN_PURCHASE_PRICE: i32 = 90;
const MAX_PURCHASE_PRICE: i32 = 110;

/// One generated week.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SimulatedWeek {
    pub purchase_price: u32,
    pub slots: WeekSlots,
    pub pattern: Pattern,
    pub combination: Combination,
}

impl SimulatedWeek {
    /// The week as a full set of observations.
    pub fn observations(&self) -> crate::week::Observations {
        self.slots.map(Some)
    }
}

/// Generates weeks exactly as the game does, drawing from a borrowed generator.
pub struct Simulator<'a> {
    rng: &'a mut Xorshift,
}

impl<'a> Simulator<'a> {
    pub fn new(rng: &'a mut Xorshift) -> Self {
        Simulator { rng }
    }

    /// Generate a week. If last week's pattern is known it biases this
    /// week's pattern through the game's transition table; otherwise the
    /// pattern is drawn uniformly.
    pub fn generate(&mut self, previous: Option<Pattern>) -> SimulatedWeek {
        let purchase_price = self.rng.next_int(MIN_PURCHASE_PRICE, MAX_PURCHASE_PRICE) as u32;
        let pattern = self.next_pattern(previous);
        self.generate_pattern(purchase_price, pattern)
    }

    /// Generate a week for a fixed pattern and purchase price, skipping the
    /// price and pattern draws. An `Unknown` pattern is replaced by a uniform draw.
    pub fn generate_pattern(&mut self, purchase_price: u32, pattern: Pattern) -> SimulatedWeek {
        let (pattern, combination) = match Combination::draw(pattern, self.rng) {
            Some(combination) => (pattern, combination),
            None => {
                let pattern = self.uniform_pattern();
                let combination = Combination::draw(pattern, self.rng)
                    .unwrap_or(Combination::Decreasing);
                (pattern, combination)
            }
        };

        let mut slots = [purchase_price; SLOTS];
        let mut remaining = &mut slots[FIRST_SALE_SLOT..];
        for phase in combination.phases() {
            let (current, rest) = std::mem::take(&mut remaining).split_at_mut(phase.len());
            phase.simulate(self.rng, purchase_price, current);
            remaining = rest;
        }
        debug_assert!(remaining.is_empty());

        debug!("simulated {} week at {} bells: {:?}", pattern, purchase_price, combination);
        trace!("prices: {:?}", slots);
        SimulatedWeek { purchase_price, slots, pattern, combination }
    }

    fn next_pattern(&mut self, previous: Option<Pattern>) -> Pattern {
        match previous.filter(|p| p.is_known()) {
            Some(previous) => {
                let chance = self.rng.next_int(0, 99);
                Pattern::following(previous, chance).unwrap_or(Pattern::SmallSpike)
            }
            None => self.uniform_pattern(),
        }
    }

    fn uniform_pattern(&mut self) -> Pattern {
        let index = self.rng.next_int(0, Pattern::ALL.len() as i32 - 1) as usize;
        Pattern::from_index(index).unwrap_or(Pattern::Fluctuating)
    }
}

/// Generate one week from a fresh generator seeded with `seed`.
pub fn simulate(seed: u32, previous: Option<Pattern>) -> SimulatedWeek {
    let mut rng = Xorshift::new(seed);
    Simulator::new(&mut rng).generate(previous)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recorded_weeks() {
        let week = simulate(4, None);
        assert_eq!(week.pattern, Pattern::Decreasing);
        assert_eq!(week.slots, [107, 107, 94, 89, 85, 82, 78, 75, 70, 65, 62, 58, 54, 50]);

        let week = simulate(2, None);
        assert_eq!(week.pattern, Pattern::LargeSpike);
        assert_eq!(week.combination, Combination::LargeSpike { peak_start: 5 });
        assert_eq!(week.slots, [110, 110, 96, 93, 89, 125, 184, 444, 174, 142, 60, 47, 90, 63]);

        let week = simulate(10, None);
        assert_eq!(week.pattern, Pattern::SmallSpike);
        assert_eq!(week.slots, [91, 91, 66, 62, 57, 53, 49, 96, 112, 132, 136, 131, 69, 65]);

        let week = simulate(0, None);
        assert_eq!(week.pattern, Pattern::Fluctuating);
        assert_eq!(week.slots, [95, 95, 133, 117, 62, 58, 119, 89, 133, 94, 68, 59, 54, 98]);
    }

    #[test]
    fn test_previous_pattern_changes_draws() {
        let week = simulate(42069, Some(Pattern::Decreasing));
        assert_eq!(week.pattern, Pattern::LargeSpike);
        assert_eq!(week.slots, [93, 93, 80, 120, 134, 457, 132, 94, 74, 77, 75, 80, 67, 75]);

        let week = simulate(42069, Some(Pattern::Unknown));
        assert_eq!(week, simulate(42069, None));
    }

    #[test]
    fn test_shared_generator_continues() {
        let mut rng = Xorshift::default();
        let mut simulator = Simulator::new(&mut rng);
        let weeks: Vec<(u32, Pattern)> = (0..3)
            .map(|_| simulator.generate(None))
            .map(|week| (week.purchase_price, week.pattern))
            .collect();
        assert_eq!(weeks, vec![(93, Pattern::Decreasing), (106, Pattern::LargeSpike),
                               (92, Pattern::SmallSpike)]);
    }

    #[test]
    fn test_fixed_pattern() {
        let mut rng = Xorshift::new(99);
        let week = Simulator::new(&mut rng).generate_pattern(100, Pattern::Decreasing);
        assert_eq!(week.pattern, Pattern::Decreasing);
        assert_eq!(week.slots[..2], [100, 100]);
        assert!((85..=90).contains(&week.slots[2]));
    }
}

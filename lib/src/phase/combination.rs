use serde::Serialize;

use super::{Phase, Start};
use crate::pattern::Pattern;
use crate::random::Xorshift;
use crate::rate::RateRange;
use crate::week::{FIRST_SALE_SLOT, SLOTS};

// Rate tables, in `RATE_SCALE` units.
const HIGH: RateRange = RateRange::new(9_000, 14_000);
const FLUCTUATING_DECLINE: RateRange = RateRange::new(6_000, 8_000);
const FLUCTUATING_STEP: i64 = 400;
const FLUCTUATING_JITTER: i64 = 600;
const SPIKE_DECLINE: RateRange = RateRange::new(8_500, 9_000);
const LOW: RateRange = RateRange::new(4_000, 9_000);
const DECLINE_STEP: i64 = 300;
const DECLINE_JITTER: i64 = 200;
const DECREASING_CEILING: i64 = 9_000;
const DECREASING_START_JITTER: i64 = 500;
const LARGE_SPIKE: [RateRange; 5] = [
    HIGH,
    RateRange::new(14_000, 20_000),
    RateRange::new(20_000, 60_000),
    RateRange::new(14_000, 20_000),
    HIGH,
];
const SMALL_SPIKE_PEAK: RateRange = RateRange::new(14_000, 20_000);

// Structural parameters.
const FLUCTUATING_HIGH_SLOTS: usize = 7;
const FLUCTUATING_DECLINE_SLOTS: usize = 5;
const LARGE_SPIKE_EARLIEST: usize = 3;
const SMALL_SPIKE_EARLIEST: usize = 2;
const LATEST_PEAK_START: usize = 9;
const SMALL_SPIKE_LEN: usize = 5;

/// A lazily enumerated set of combinations.
pub type Combinations = Box<dyn Iterator<Item = Combination>>;

/// One structurally valid way to lay out a week: every phase length and peak
/// position is fixed, while the rates inside each phase remain free.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize)]
pub enum Combination {
    /// High, decline, high, decline, high. `high_2` and `decline_2` take
    /// whatever `high_1`, `high_3` and `decline_1` leave over.
    Fluctuating { high_1: usize, decline_1: usize, high_3: usize },
    LargeSpike { peak_start: usize },
    Decreasing,
    SmallSpike { peak_start: usize },
}

impl Combination {
    /// Every combination the game can generate for `pattern`.
    pub fn enumerate(pattern: Pattern) -> Combinations {
        match pattern {
            Pattern::Fluctuating => Box::new((2..=3).flat_map(|decline_1| {
                (0..FLUCTUATING_HIGH_SLOTS).flat_map(move |high_1| {
                    (0..FLUCTUATING_HIGH_SLOTS - high_1).map(move |high_3| {
                        Combination::Fluctuating { high_1, decline_1, high_3 }
                    })
                })
            })),
            Pattern::LargeSpike => Box::new((LARGE_SPIKE_EARLIEST..=LATEST_PEAK_START)
                .map(|peak_start| Combination::LargeSpike { peak_start })),
            Pattern::Decreasing => Box::new(std::iter::once(Combination::Decreasing)),
            Pattern::SmallSpike => Box::new((SMALL_SPIKE_EARLIEST..=LATEST_PEAK_START)
                .map(|peak_start| Combination::SmallSpike { peak_start })),
            Pattern::Unknown => Box::new(std::iter::empty()),
        }
    }

    /// Draw a combination the way the game does, consuming `rng`.
    /// `Unknown` has no layout and draws nothing.
    pub fn draw(pattern: Pattern, rng: &mut Xorshift) -> Option<Combination> {
        let combination = match pattern {
            Pattern::Fluctuating => {
                let decline_1 = if rng.next_bool() { 3 } else { 2 };
                let high_1 = rng.next_int(0, FLUCTUATING_HIGH_SLOTS as i32 - 1) as usize;
                let high_3 = rng.next_int(0, (FLUCTUATING_HIGH_SLOTS - high_1) as i32 - 1) as usize;
                Combination::Fluctuating { high_1, decline_1, high_3 }
            }
            Pattern::LargeSpike => Combination::LargeSpike {
                peak_start: rng.next_int(LARGE_SPIKE_EARLIEST as i32, LATEST_PEAK_START as i32) as usize,
            },
            Pattern::Decreasing => Combination::Decreasing,
            Pattern::SmallSpike => Combination::SmallSpike {
                peak_start: rng.next_int(SMALL_SPIKE_EARLIEST as i32, LATEST_PEAK_START as i32) as usize,
            },
            Pattern::Unknown => return None,
        };
        Some(combination)
    }

    pub fn pattern(&self) -> Pattern {
        match self {
            Combination::Fluctuating { .. } => Pattern::Fluctuating,
            Combination::LargeSpike { .. } => Pattern::LargeSpike,
            Combination::Decreasing => Pattern::Decreasing,
            Combination::SmallSpike { .. } => Pattern::SmallSpike,
        }
    }

    /// Whether the layout fits in a week. Everything `enumerate` and `draw`
    /// produce is valid.
    pub fn is_valid(&self) -> bool {
        match *self {
            Combination::Fluctuating { high_1, decline_1, high_3 } => {
                high_1 + high_3 < FLUCTUATING_HIGH_SLOTS
                    && (2..=3).contains(&decline_1)
            }
            Combination::LargeSpike { peak_start } => {
                (LARGE_SPIKE_EARLIEST..=LATEST_PEAK_START).contains(&peak_start)
            }
            Combination::Decreasing => true,
            Combination::SmallSpike { peak_start } => {
                (SMALL_SPIKE_EARLIEST..=LATEST_PEAK_START).contains(&peak_start)
            }
        }
    }

    /// The phases covering Monday AM to Saturday PM, in order.
    ///
    /// Panics in debug builds if the layout is not `is_valid`.
    pub fn phases(&self) -> Vec<Phase> {
        debug_assert!(self.is_valid(), "{:?} does not fit in a week", self);
        match *self {
            Combination::Fluctuating { high_1, decline_1, high_3 } => {
                let high_2 = FLUCTUATING_HIGH_SLOTS - high_1 - high_3;
                let decline_2 = FLUCTUATING_DECLINE_SLOTS - decline_1;
                vec![
                    independent(high_1, HIGH),
                    fluctuating_decline(decline_1),
                    independent(high_2, HIGH),
                    fluctuating_decline(decline_2),
                    independent(high_3, HIGH),
                ]
            }
            Combination::LargeSpike { peak_start } => {
                let mut phases = vec![decline(peak_start - FIRST_SALE_SLOT, Start::Within(SPIKE_DECLINE))];
                phases.extend(LARGE_SPIKE.iter().map(|rates| independent(1, *rates)));
                phases.push(independent(SLOTS - peak_start - LARGE_SPIKE.len(), LOW));
                phases
            }
            Combination::Decreasing => vec![decline(SLOTS - FIRST_SALE_SLOT, Start::Below {
                ceiling: DECREASING_CEILING,
                jitter: DECREASING_START_JITTER,
            })],
            Combination::SmallSpike { peak_start } => {
                let mut phases = vec![
                    decline(peak_start - FIRST_SALE_SLOT, Start::Within(LOW)),
                    independent(2, HIGH),
                    Phase::Peak { rates: SMALL_SPIKE_PEAK },
                ];
                // The game only draws a closing decline if there are slots left for it.
                let remaining = SLOTS - peak_start - SMALL_SPIKE_LEN;
                if remaining > 0 {
                    phases.push(decline(remaining, Start::Within(LOW)));
                }
                phases
            }
        }
    }
}

fn independent(len: usize, rates: RateRange) -> Phase {
    Phase::Independent { len, rates }
}

fn decline(len: usize, start: Start) -> Phase {
    Phase::Decline { len, start, step: DECLINE_STEP, jitter: DECLINE_JITTER }
}

fn fluctuating_decline(len: usize) -> Phase {
    Phase::Decline {
        len,
        start: Start::Within(FLUCTUATING_DECLINE),
        step: FLUCTUATING_STEP,
        jitter: FLUCTUATING_JITTER,
    }
}

use std::fmt::{Debug, Formatter};

/// Rates are fixed point: this many units make up the whole purchase price.
pub const RATE_SCALE: i64 = 10_000;

/// The game rounds up by adding just under one and truncating.
const CEIL_NUDGE_F32: f32 = 0.99999;
const CEIL_NUDGE_F64: f64 = 0.99999;

/// An inclusive range of rates in `RATE_SCALE` units.
#[derive(Copy, Clone, PartialEq, Eq)]
pub struct RateRange {
    pub min: i64,
    pub max: i64,
}

impl Debug for RateRange {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "({:.4}, {:.4})", to_f64(self.min), to_f64(self.max))
    }
}

impl RateRange {
    pub const fn new(min: i64, max: i64) -> Self {
        RateRange { min, max }
    }

    /// Intersection with another range, if non-empty.
    pub fn intersect(self, other: RateRange) -> Option<RateRange> {
        if self.min > other.max || self.max < other.min {
            return None;
        }
        Some(RateRange::new(self.min.max(other.min), self.max.min(other.max)))
    }

    /// The range after one decay step of between `step_min` and `step_max`.
    pub fn decayed(self, step_min: i64, step_max: i64) -> Self {
        RateRange::new(self.min - step_max, self.max - step_min)
    }

    /// Lowest and highest price these rates can produce.
    pub fn prices(self, base_price: u32) -> (u32, u32) {
        (price_for_rate(self.min, base_price), price_for_rate(self.max, base_price))
    }
}

/// Convert a fixed-point rate to the single-precision value the game uses.
/// Integer division by the scale rounds to the nearest `f32`, which is the
/// same value the game's decimal literals compile to.
pub fn to_f32(rate: i64) -> f32 {
    rate as f32 / RATE_SCALE as f32
}

fn to_f64(rate: i64) -> f64 {
    rate as f64 / RATE_SCALE as f64
}

/// The game's rounding of a single-precision price.
pub fn int_ceil(value: f32) -> u32 {
    (value + CEIL_NUDGE_F32).floor() as u32
}

/// Price produced by a fixed-point rate. Negative rates price at zero.
pub fn price_for_rate(rate: i64, base_price: u32) -> u32 {
    let value = rate.max(0) as f64 * base_price as f64 / RATE_SCALE as f64;
    (value + CEIL_NUDGE_F64).floor() as u32
}

/// The rates that could have produced `price`, rounding aside.
/// `None` if the base price is zero.
pub fn implied_rates(price: u32, base_price: u32) -> Option<RateRange> {
    let base = base_price as i64;
    let price = price as i64;
    let min = (RATE_SCALE * (price - 1)).checked_div(base)?;
    let max = (RATE_SCALE * price).checked_div(base)?;
    Some(RateRange::new(min, max))
}

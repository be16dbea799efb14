use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Number of price slots in a week: Sunday AM/PM plus six days of sales.
pub const SLOTS: usize = 14;

/// Index of the first sale slot (Monday AM).
pub const FIRST_SALE_SLOT: usize = 2;

/// Number of sale slots (Monday AM to Saturday PM).
pub const SALE_SLOTS: usize = SLOTS - FIRST_SALE_SLOT;

/// One optional measured price per slot.
pub type Observations = [Option<u32>; SLOTS];

/// A complete week of prices.
pub type WeekSlots = [u32; SLOTS];

/// A day on which turnips can be sold.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Day {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
}

impl Day {
    pub const ALL: [Day; 6] = [
        Day::Monday,
        Day::Tuesday,
        Day::Wednesday,
        Day::Thursday,
        Day::Friday,
        Day::Saturday,
    ];

    fn short_name(self) -> &'static str {
        match self {
            Day::Monday => "Mon",
            Day::Tuesday => "Tue",
            Day::Wednesday => "Wed",
            Day::Thursday => "Thu",
            Day::Friday => "Fri",
            Day::Saturday => "Sat",
        }
    }
}

/// Half of a day; prices change at noon.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Period {
    Am,
    Pm,
}

/// Slot index of a sale period.
pub fn slot_index(day: Day, period: Period) -> usize {
    let offset = match period {
        Period::Am => 0,
        Period::Pm => 1,
    };
    FIRST_SALE_SLOT + 2 * day as usize + offset
}

/// Inverse of `slot_index`. Sunday slots and out-of-range indices have no sale period.
pub fn slot_period(slot: usize) -> Option<(Day, Period)> {
    if !(FIRST_SALE_SLOT..SLOTS).contains(&slot) {
        return None;
    }
    let offset = slot - FIRST_SALE_SLOT;
    let period = if offset % 2 == 0 { Period::Am } else { Period::Pm };
    Some((Day::ALL[offset / 2], period))
}

/// Short human-readable name of a slot, e.g. "Wed PM".
pub fn slot_label(slot: usize) -> String {
    match slot_period(slot) {
        Some((day, Period::Am)) => format!("{} AM", day.short_name()),
        Some((day, Period::Pm)) => format!("{} PM", day.short_name()),
        None if slot == 0 => "Sun AM".to_string(),
        None if slot == 1 => "Sun PM".to_string(),
        None => format!("Slot {}", slot),
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ObservationError {
    #[error("at most {max} sale prices can be given, got {given}")]
    TooManyPrices { given: usize, max: usize },
}

/// Place sale prices, in order from Monday AM, into a full week of observations.
pub fn observations_from_sales(prices: &[Option<u32>]) -> Result<Observations, ObservationError> {
    if prices.len() > SALE_SLOTS {
        return Err(ObservationError::TooManyPrices { given: prices.len(), max: SALE_SLOTS });
    }
    let mut observations = [None; SLOTS];
    observations[FIRST_SALE_SLOT..FIRST_SALE_SLOT + prices.len()].copy_from_slice(prices);
    Ok(observations)
}

/// Inclusive lower and upper bound on one slot's price.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PriceBound {
    pub min: u32,
    pub max: u32,
}

impl PriceBound {
    pub fn new(min: u32, max: u32) -> Self {
        debug_assert!(min <= max, "inverted bound {}..{}", min, max);
        PriceBound { min, max }
    }

    /// A bound pinned to exactly one price.
    pub fn exact(price: u32) -> Self {
        PriceBound { min: price, max: price }
    }

    /// The smallest bound containing both.
    pub fn union(self, other: PriceBound) -> Self {
        PriceBound {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }

    pub fn contains(&self, price: u32) -> bool {
        self.min <= price && price <= self.max
    }
}

impl From<(u32, u32)> for PriceBound {
    fn from((min, max): (u32, u32)) -> Self {
        PriceBound::new(min, max)
    }
}

impl Display for PriceBound {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        if self.min == self.max {
            write!(f, "{}", self.min)
        } else {
            write!(f, "{}-{}", self.min, self.max)
        }
    }
}

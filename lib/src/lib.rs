//! Turnip price simulation and prediction for Animal Crossing: New Horizons.
//!
//! The game generates each week's prices from a seeded Xorshift generator and
//! one of four patterns. [`Simulator`] replays that generation exactly, and
//! [`predict`] works backwards from a purchase price and any observed prices
//! to the range every slot of the week can still take.

mod pattern;
mod phase;
mod predict;
mod random;
mod rate;
mod simulate;
mod week;


pub use pattern::{ParsePatternError, Pattern};
pub use phase::{Combination, Combinations, Phase, Start};
pub use predict::{predict, Pinning, Prediction, Predictor};
pub use random::{Xorshift, DEFAULT_SEED};
pub use rate::{RateRange, RATE_SCALE};
pub use simulate::{simulate, SimulatedWeek, Simulator};
pub use week::{observations_from_sales, slot_index, slot_label, slot_period, Day,
               ObservationError, Observations, Period, PriceBound, WeekSlots,
               FIRST_SALE_SLOT, SALE_SLOTS, SLOTS};

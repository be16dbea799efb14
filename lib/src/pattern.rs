use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Possible patterns for the week.
///
/// The four concrete patterns are listed in the order the game numbers them
/// (0 to 3); `Unknown` is only ever used as a "no information" marker.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Pattern {
    Fluctuating,
    LargeSpike,
    Decreasing,
    SmallSpike,
    Unknown,
}

/// Cumulative `chance < threshold` cut-offs for the next pattern, indexed by
/// the previous pattern. Anything at or above the last threshold is a small spike.
const TRANSITIONS: [[i32; 3]; 4] = [
    [20, 50, 65], // Fluctuating
    [50, 55, 75], // LargeSpike
    [25, 70, 75], // Decreasing
    [45, 70, 85], // SmallSpike
];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unrecognised pattern name '{0}'")]
pub struct ParsePatternError(pub String);

impl Pattern {
    /// The concrete patterns, in the game's numbering order.
    pub const ALL: [Pattern; 4] = [
        Pattern::Fluctuating,
        Pattern::LargeSpike,
        Pattern::Decreasing,
        Pattern::SmallSpike,
    ];

    /// The game's numeric id for this pattern, or `None` for `Unknown`.
    pub fn index(self) -> Option<usize> {
        Pattern::ALL.iter().position(|p| *p == self)
    }

    /// Look up a concrete pattern from the game's numeric id.
    pub fn from_index(index: usize) -> Option<Pattern> {
        Pattern::ALL.get(index).copied()
    }

    /// Whether this is one of the four generated patterns.
    pub fn is_known(self) -> bool {
        self != Pattern::Unknown
    }

    /// Map a percentage roll in `[0, 99]` to the pattern that follows `previous`.
    /// Returns `None` when `previous` is `Unknown`, since the game then picks
    /// uniformly instead.
    pub fn following(previous: Pattern, chance: i32) -> Option<Pattern> {
        let thresholds = TRANSITIONS[previous.index()?];
        let next = thresholds.iter()
            .position(|threshold| chance < *threshold)
            .unwrap_or(3);
        Pattern::from_index(next)
    }

    /// Prior probability of this pattern occurring, given last week's pattern.
    pub fn transition_chance(self, previous: Option<Pattern>) -> f64 {
        let index = match self.index() {
            Some(i) => i,
            None => return 0.0,
        };
        let thresholds = match previous.and_then(Pattern::index) {
            Some(prev) => TRANSITIONS[prev],
            // Unknown last week: the game draws uniformly.
            None => return 0.25,
        };
        let low = if index == 0 { 0 } else { thresholds[index - 1] };
        let high = if index == 3 { 100 } else { thresholds[index] };
        (high - low) as f64 / 100.0
    }
}

impl Display for Pattern {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Pattern::Fluctuating => "Fluctuating",
            Pattern::LargeSpike => "Large Spike",
            Pattern::Decreasing => "Decreasing",
            Pattern::SmallSpike => "Small Spike",
            Pattern::Unknown => "Unknown",
        };
        f.write_str(name)
    }
}

impl FromStr for Pattern {
    type Err = ParsePatternError;

    /// Accepts the display names case-insensitively, ignoring spaces, dashes
    /// and underscores. "random" is accepted as an alias for fluctuating.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalised: String = s.chars()
            .filter(|c| !matches!(c, ' ' | '-' | '_'))
            .collect::<String>()
            .to_ascii_lowercase();
        match normalised.as_str() {
            "fluctuating" | "random" => Ok(Pattern::Fluctuating),
            "largespike" => Ok(Pattern::LargeSpike),
            "decreasing" => Ok(Pattern::Decreasing),
            "smallspike" => Ok(Pattern::SmallSpike),
            "unknown" => Ok(Pattern::Unknown),
            _ => Err(ParsePatternError(s.to_string())),
        }
    }
}

use std::panic::catch_unwind;

use turnip_predict_lib::{observations_from_sales, Pinning, Predictor, PriceBound, SALE_SLOTS,
                         SLOTS};

/// Bit in `flags` requesting strict pinning.
pub const FLAG_STRICT: u8 = 1 << 0;
/// Bit in `flags` marking the player's first week of buying turnips.
pub const FLAG_FIRST_BUY: u8 = 1 << 1;

/// C-compatible pattern representation.
#[repr(u8)]
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Pattern {
    Unknown = 0,
    Fluctuating = 1,
    LargeSpike = 2,
    Decreasing = 3,
    SmallSpike = 4,
}

impl TryFrom<u8> for Pattern {
    type Error = ();

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Pattern::Unknown),
            1 => Ok(Pattern::Fluctuating),
            2 => Ok(Pattern::LargeSpike),
            3 => Ok(Pattern::Decreasing),
            4 => Ok(Pattern::SmallSpike),
            _ => Err(()),
        }
    }
}

impl From<turnip_predict_lib::Pattern> for Pattern {
    fn from(p: turnip_predict_lib::Pattern) -> Self {
        match p {
            turnip_predict_lib::Pattern::Fluctuating => Pattern::Fluctuating,
            turnip_predict_lib::Pattern::LargeSpike => Pattern::LargeSpike,
            turnip_predict_lib::Pattern::Decreasing => Pattern::Decreasing,
            turnip_predict_lib::Pattern::SmallSpike => Pattern::SmallSpike,
            turnip_predict_lib::Pattern::Unknown => Pattern::Unknown,
        }
    }
}

impl From<Pattern> for turnip_predict_lib::Pattern {
    fn from(p: Pattern) -> Self {
        match p {
            Pattern::Fluctuating => turnip_predict_lib::Pattern::Fluctuating,
            Pattern::LargeSpike => turnip_predict_lib::Pattern::LargeSpike,
            Pattern::Decreasing => turnip_predict_lib::Pattern::Decreasing,
            Pattern::SmallSpike => turnip_predict_lib::Pattern::SmallSpike,
            Pattern::Unknown => turnip_predict_lib::Pattern::Unknown,
        }
    }
}

/// Decode a pattern code, treating anything invalid as unknown.
fn decode_pattern(code: u8) -> Option<turnip_predict_lib::Pattern> {
    Pattern::try_from(code).ok()
        .map(Into::into)
        .filter(|p: &turnip_predict_lib::Pattern| p.is_known())
}

/// C-compatible representation of a prediction.
///
/// `counts` holds the surviving combinations for each pattern, indexed by
/// pattern code minus one.
#[repr(C)]
#[derive(Debug)]
pub struct PredictResult {
    pub success: bool,
    pub pattern: Pattern,
    pub min: [u32; SLOTS],
    pub max: [u32; SLOTS],
    pub counts: [u32; 4],
}

impl PredictResult {
    fn failure() -> Self {
        PredictResult {
            success: false,
            pattern: Pattern::Unknown,
            min: [0; SLOTS],
            max: [0; SLOTS],
            counts: [0; 4],
        }
    }
}

/// C-compatible representation of a simulated week.
#[repr(C)]
#[derive(Debug)]
pub struct SimulatedResult {
    pub pattern: Pattern,
    pub purchase_price: u32,
    pub prices: [u32; SLOTS],
}

fn predict(hint: Option<turnip_predict_lib::Pattern>, base_price: u32, prices: &[u32],
           flags: u8) -> PredictResult {
    let sales: Vec<Option<u32>> = prices.iter()
        .map(|&price| if price == 0 { None } else { Some(price) })
        .collect();
    let observations = match observations_from_sales(&sales) {
        Ok(observations) => observations,
        Err(_) => return PredictResult::failure(),
    };
    let pinning = if flags & FLAG_STRICT != 0 { Pinning::Strict } else { Pinning::Permissive };

    let prediction = Predictor::new()
        .hint(hint)
        .pinning(pinning)
        .first_buy(flags & FLAG_FIRST_BUY != 0)
        .predict(base_price, &observations);

    let mut result = PredictResult::failure();
    result.success = prediction.combinations() > 0;
    result.pattern = prediction.pattern.into();
    for (slot, PriceBound { min, max }) in prediction.bounds.iter().enumerate() {
        result.min[slot] = *min;
        result.max[slot] = *max;
    }
    for (pattern, count) in prediction.pattern_counts {
        if let Some(index) = pattern.index() {
            result.counts[index] = count as u32;
        }
    }
    result
}

/// Predict the rest of a week.
///
/// `prices` points to `num_prices` sell prices starting on Monday morning, at
/// most 12. A price of zero is treated as missing. If `prev_hint` is not a
/// valid pattern code, or is unknown, every pattern is considered. `flags` is
/// a combination of `FLAG_STRICT` and `FLAG_FIRST_BUY`.
///
/// `success` is false if the input is invalid or no pattern matched.
///
/// # Safety
/// `prices` must be valid for reading `num_prices` values, or null when
/// `num_prices` is zero.
#[no_mangle]
pub unsafe extern "C" fn turnip_predict(prev_hint: u8, base_price: u32, prices: *const u32,
                                        num_prices: usize, flags: u8) -> PredictResult {
    if num_prices > SALE_SLOTS || (prices.is_null() && num_prices > 0) {
        return PredictResult::failure();
    }
    let prices = if num_prices == 0 {
        Vec::new()
    } else {
        std::slice::from_raw_parts(prices, num_prices).to_vec()
    };
    let hint = decode_pattern(prev_hint);

    // Run the predictor, catching any naughty panics.
    catch_unwind(move || predict(hint, base_price, &prices, flags))
        .unwrap_or_else(|_| PredictResult::failure())
}

/// Generate a week from a freshly seeded generator, as the game does.
/// An invalid `prev_pattern` is treated as unknown.
#[no_mangle]
pub extern "C" fn turnip_simulate(seed: u32, prev_pattern: u8) -> SimulatedResult {
    let week = turnip_predict_lib::simulate(seed, decode_pattern(prev_pattern));
    SimulatedResult {
        pattern: week.pattern.into(),
        purchase_price: week.purchase_price,
        prices: week.slots,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pattern_codes() {
        for code in 0..=4u8 {
            let pattern = Pattern::try_from(code).unwrap();
            assert_eq!(pattern as u8, code);
            let lib: turnip_predict_lib::Pattern = pattern.into();
            assert_eq!(Pattern::from(lib), pattern);
        }
        assert!(Pattern::try_from(5).is_err());
        assert_eq!(decode_pattern(0), None);
        assert_eq!(decode_pattern(200), None);
        assert_eq!(decode_pattern(3), Some(turnip_predict_lib::Pattern::Decreasing));
    }

    #[test]
    fn test_predict_decreasing() {
        let result = unsafe { turnip_predict(3, 100, std::ptr::null(), 0, 0) };
        assert!(result.success);
        assert_eq!(result.pattern, Pattern::Decreasing);
        assert_eq!((result.min[2], result.max[2]), (85, 90));
        assert_eq!(result.counts, [0, 0, 1, 0]);
    }

    #[test]
    fn test_predict_zero_is_missing() {
        let prices = [0, 0, 48, 43];
        let result = unsafe { turnip_predict(0, 90, prices.as_ptr(), prices.len(), FLAG_STRICT) };
        assert!(result.success);
        assert_eq!(result.pattern, Pattern::Fluctuating);
        assert_eq!(result.counts, [6, 0, 0, 4]);
        assert_eq!((result.min[4], result.max[4]), (48, 48));
        assert_eq!((result.min[2], result.max[2]), (36, 126));
    }

    #[test]
    fn test_predict_first_buy() {
        let prices = [66, 62];
        let result = unsafe {
            turnip_predict(1, 91, prices.as_ptr(), prices.len(), FLAG_STRICT | FLAG_FIRST_BUY)
        };
        assert!(result.success);
        assert_eq!(result.pattern, Pattern::SmallSpike);
    }

    #[test]
    fn test_predict_failures() {
        let prices = [90; 13];
        let result = unsafe { turnip_predict(0, 100, prices.as_ptr(), prices.len(), 0) };
        assert!(!result.success);

        let result = unsafe { turnip_predict(0, 100, std::ptr::null(), 2, 0) };
        assert!(!result.success);

        let prices = [200];
        let result = unsafe { turnip_predict(0, 100, prices.as_ptr(), prices.len(), FLAG_STRICT) };
        assert!(!result.success);
        assert_eq!(result.pattern, Pattern::Unknown);
        assert_eq!(result.min, [100; SLOTS]);
    }

    #[test]
    fn test_simulate() {
        let result = turnip_simulate(4, 0);
        assert_eq!(result.pattern, Pattern::Decreasing);
        assert_eq!(result.purchase_price, 107);
        assert_eq!(result.prices[..4], [107, 107, 94, 89]);
        let week = turnip_predict_lib::simulate(42069, Some(turnip_predict_lib::Pattern::Decreasing));
        assert_eq!(turnip_simulate(42069, 3).prices, week.slots);
    }
}

/// Seed used by a default-constructed generator.
pub const DEFAULT_SEED: u32 = 42069;

const SEED_MULTIPLIER: u32 = 0x6C07_8965;

/// Substituted for an all-zero state, which Xorshift can never leave.
const FALLBACK_STATE: [u32; 4] = [1, 0x6C07_8967, 0x714A_CB41, 0x4807_7044];

/// The game's Xorshift-128 generator, reproduced bit for bit.
///
/// Every draw advances the state, so a single instance must not be shared
/// between callers that expect independent sequences.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Xorshift {
    state: [u32; 4],
}

impl Default for Xorshift {
    fn default() -> Self {
        Xorshift::new(DEFAULT_SEED)
    }
}

impl Xorshift {
    /// Construct a generator from a single 32-bit seed.
    pub fn new(seed: u32) -> Self {
        let mut rng = Xorshift { state: [0; 4] };
        rng.seed(seed);
        rng
    }

    /// Construct a generator with an explicit state.
    pub fn from_state(words: [u32; 4]) -> Self {
        let mut rng = Xorshift { state: [0; 4] };
        rng.seed_state(words);
        rng
    }

    /// Re-derive all four state words from one seed.
    pub fn seed(&mut self, seed: u32) {
        let mut prev = seed;
        for (i, word) in self.state.iter_mut().enumerate() {
            prev = SEED_MULTIPLIER
                .wrapping_mul(prev ^ (prev >> 30))
                .wrapping_add(i as u32 + 1);
            *word = prev;
        }
    }

    /// Set the state directly.
    pub fn seed_state(&mut self, words: [u32; 4]) {
        self.state = if words == [0; 4] { FALLBACK_STATE } else { words };
    }

    pub fn state(&self) -> [u32; 4] {
        self.state
    }

    pub fn next_u32(&mut self) -> u32 {
        let [w0, w1, w2, w3] = self.state;
        let n = w0 ^ (w0 << 11);
        let next = n ^ (n >> 8) ^ w3 ^ (w3 >> 19);
        self.state = [w1, w2, w3, next];
        next
    }

    pub fn next_bool(&mut self) -> bool {
        self.next_u32() & 0x8000_0000 != 0
    }

    /// Uniform integer in `[min, max]`. The caller must ensure `max >= min`.
    pub fn next_int(&mut self, min: i32, max: i32) -> i32 {
        debug_assert!(max >= min, "empty range [{}, {}]", min, max);
        let range = (max as i64 - min as i64 + 1) as u64;
        let offset = (range.wrapping_mul(self.next_u32() as u64) >> 32) as i64;
        (offset + min as i64) as i32
    }

    /// Float in `[min, max)`, built from the top 23 bits of a draw.
    pub fn next_float(&mut self, min: f32, max: f32) -> f32 {
        let unit = f32::from_bits(0x3F80_0000 | (self.next_u32() >> 9));
        min + (unit - 1.0) * (max - min)
    }
}

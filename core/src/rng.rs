//! Deterministic random number generation.
//!
//! RULE: Prompt resolution never calls any platform RNG or reads the clock.
//! All randomness flows through a DailyRng seeded from the string key
//! `"{user_id}-{YYYY-MM-DD}"`. This means:
//!   - Re-rendering the same day yields the same draws.
//!   - A past day can be reconstructed from its date string alone.
//!
//! The generator is chosen per deployment and must not change afterwards:
//! switching it changes every historical resolution.

use crate::date::JournalDate;
use rand::{RngCore, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

/// Hash a seed key down to 32 bits.
///
/// Four 32-bit accumulators absorb each UTF-16 code unit, then a final
/// avalanche folds them together. Close keys ("...-01-01" / "...-01-02")
/// land far apart.
pub fn seed_hash(key: &str) -> u32 {
    let mut h1: u32 = 1_779_033_703;
    let mut h2: u32 = 3_144_134_277;
    let mut h3: u32 = 1_013_904_242;
    let mut h4: u32 = 2_773_480_762;
    for unit in key.encode_utf16() {
        let k = unit as u32;
        h1 = h2 ^ (h1 ^ k).wrapping_mul(597_399_067);
        h2 = h3 ^ (h2 ^ k).wrapping_mul(2_869_860_281);
        h3 = h4 ^ (h3 ^ k).wrapping_mul(951_274_213);
        h4 = h1 ^ (h4 ^ k).wrapping_mul(2_716_044_179);
    }
    h1 = (h3 ^ (h1 >> 18)).wrapping_mul(597_399_067);
    h2 = (h4 ^ (h2 >> 22)).wrapping_mul(2_869_860_281);
    h3 = (h1 ^ (h3 >> 17)).wrapping_mul(951_274_213);
    h4 = (h2 ^ (h4 >> 19)).wrapping_mul(2_716_044_179);
    h1 ^ h2 ^ h3 ^ h4
}

/// Small additive generator with two xor-shift-multiply rounds.
/// Reproduces the draws of journals created before the PCG option existed.
#[derive(Debug, Clone)]
pub struct Mulberry32 {
    state: u32,
}

impl Mulberry32 {
    pub fn new(seed: u32) -> Self {
        Self { state: seed }
    }
}

impl RngCore for Mulberry32 {
    fn next_u32(&mut self) -> u32 {
        self.state = self.state.wrapping_add(0x6D2B_79F5);
        let mut t = self.state;
        t = (t ^ (t >> 15)).wrapping_mul(t | 1);
        t ^= t.wrapping_add((t ^ (t >> 7)).wrapping_mul(t | 61));
        t ^ (t >> 14)
    }

    fn next_u64(&mut self) -> u64 {
        let lo = self.next_u32() as u64;
        let hi = self.next_u32() as u64;
        (hi << 32) | lo
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        for chunk in dest.chunks_mut(4) {
            let bytes = self.next_u32().to_le_bytes();
            chunk.copy_from_slice(&bytes[..chunk.len()]);
        }
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand::Error> {
        self.fill_bytes(dest);
        Ok(())
    }
}

impl SeedableRng for Mulberry32 {
    type Seed = [u8; 4];

    fn from_seed(seed: Self::Seed) -> Self {
        Self::new(u32::from_le_bytes(seed))
    }
}

/// Which generator backs a deployment's DailyRng.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RngAlgorithm {
    #[default]
    Mulberry32,
    Pcg32,
}

#[derive(Debug, Clone)]
enum Generator {
    Mulberry32(Mulberry32),
    Pcg32(Pcg32),
}

/// A named, deterministic RNG for a single resolution.
#[derive(Debug, Clone)]
pub struct DailyRng {
    pub seed_key: String,
    pub seed: u32,
    inner: Generator,
}

impl DailyRng {
    pub fn new(seed_key: impl Into<String>, algorithm: RngAlgorithm) -> Self {
        let seed_key = seed_key.into();
        let seed = seed_hash(&seed_key);
        let inner = match algorithm {
            RngAlgorithm::Mulberry32 => Generator::Mulberry32(Mulberry32::new(seed)),
            RngAlgorithm::Pcg32 => Generator::Pcg32(Pcg32::seed_from_u64(seed as u64)),
        };
        Self { seed_key, seed, inner }
    }

    /// The stream a user sees on a calendar day.
    pub fn for_user_day(user_id: &str, date: &JournalDate, algorithm: RngAlgorithm) -> Self {
        Self::new(format!("{user_id}-{date}"), algorithm)
    }

    /// Draw a raw u32 (full range).
    pub fn next_u32(&mut self) -> u32 {
        match &mut self.inner {
            Generator::Mulberry32(g) => g.next_u32(),
            Generator::Pcg32(g) => g.next_u32(),
        }
    }

    /// Roll a float in [0.0, 1.0).
    pub fn next_f64(&mut self) -> f64 {
        self.next_u32() as f64 / 4_294_967_296.0
    }

    /// Draw a count in the inclusive range [min, max]. One draw.
    ///
    /// An inverted range is not rejected here; the result can then be
    /// zero or negative and callers treat that as "nothing to pick".
    /// The arithmetic is widened so stored extremes cannot overflow.
    pub fn draw_count(&mut self, min: i64, max: i64) -> i64 {
        let range = i128::from(max) - i128::from(min) + 1;
        let drawn = (self.next_f64() * range as f64).floor() as i128 + i128::from(min);
        drawn.clamp(i128::from(i64::MIN), i128::from(i64::MAX)) as i64
    }

    /// In-place Fisher-Yates, walking from the back. Draws `len - 1` values.
    pub fn shuffle<T>(&mut self, items: &mut [T]) {
        for i in (1..items.len()).rev() {
            let j = (self.next_f64() * (i + 1) as f64).floor() as usize;
            items.swap(i, j);
        }
    }
}

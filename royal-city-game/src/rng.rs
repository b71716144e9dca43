//! Deterministic 32-bit generator shared by every stochastic decision.
//!
//! Each consumer derives its own stream from the campaign seed plus a fixed
//! offset, so replaying the same inputs always reproduces the same draws.

use rand::{RngCore, SeedableRng};

use crate::constants::ROUND_SEED_STRIDE;

const GOLDEN_INCREMENT: u32 = 0x6D2B_79F5;
const TWO_POW_32: f64 = 4_294_967_296.0;

/// Mulberry32 generator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mulberry32 {
    state: u32,
}

impl Mulberry32 {
    #[must_use]
    pub const fn new(seed: u32) -> Self {
        Self { state: seed }
    }

    /// Stream used by a round's resolution (reward tie-breaks, boom roll).
    #[must_use]
    pub const fn for_round(seed: u32, round: u32) -> Self {
        Self::new(round_stream_seed(seed, round))
    }

    /// Uniform float in `[0, 1)`.
    pub fn next_f64(&mut self) -> f64 {
        f64::from(self.next_u32()) / TWO_POW_32
    }
}

impl RngCore for Mulberry32 {
    fn next_u32(&mut self) -> u32 {
        self.state = self.state.wrapping_add(GOLDEN_INCREMENT);
        let mut r = self.state;
        r = (r ^ (r >> 15)).wrapping_mul(r | 1);
        r ^= r.wrapping_add((r ^ (r >> 7)).wrapping_mul(r | 61));
        r ^ (r >> 14)
    }

    fn next_u64(&mut self) -> u64 {
        let hi = u64::from(self.next_u32());
        let lo = u64::from(self.next_u32());
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

    fn seed_from_u64(state: u64) -> Self {
        Self::new(truncate_seed(state))
    }
}

/// Reduce a wide seed to the 32-bit space the generator works in.
#[must_use]
pub const fn truncate_seed(seed: u64) -> u32 {
    (seed & 0xFFFF_FFFF) as u32
}

/// `seed + round * 997`, wrapping.
#[must_use]
pub const fn round_stream_seed(seed: u32, round: u32) -> u32 {
    seed.wrapping_add(round.wrapping_mul(ROUND_SEED_STRIDE))
}

/// `seed + round + salt`, wrapping; used by the mission drafter.
#[must_use]
pub const fn mission_stream_seed(seed: u32, round: u32, salt: u32) -> u32 {
    seed.wrapping_add(round).wrapping_add(salt)
}

/// `seed + round`, wrapping; used by the census jitter.
#[must_use]
pub const fn census_stream_seed(seed: u32, round: u32) -> u32 {
    seed.wrapping_add(round)
}

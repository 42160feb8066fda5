//! Fixed PRNG used for day schedules.
//!
//! Schedules must be bit-reproducible across builds and platforms, so the
//! generator is a self-contained PCG-XSH-RR 64/32 rather than a library RNG
//! whose algorithm may change between releases.

use rand::RngCore;

const PCG_MULTIPLIER: u64 = 6_364_136_223_846_793_005;
const PCG_INCREMENT: u64 = 0xda3e_39cb_94b9_5bdb;

/// PCG-XSH-RR generator with 64-bit state and 32-bit output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pcg32 {
    state: u64,
}

impl Pcg32 {
    /// Seed the generator from a 32-bit day seed.
    #[must_use]
    #[allow(clippy::cast_sign_loss)]
    pub const fn from_day_seed(seed: i32) -> Self {
        let mut rng = Self { state: 0 };
        rng.step();
        rng.state = rng.state.wrapping_add(seed as u32 as u64);
        rng.step();
        rng
    }

    const fn step(&mut self) {
        self.state = self
            .state
            .wrapping_mul(PCG_MULTIPLIER)
            .wrapping_add(PCG_INCREMENT);
    }

    /// Next raw 32-bit output.
    #[allow(clippy::cast_possible_truncation)]
    pub const fn next_word(&mut self) -> u32 {
        let old = self.state;
        self.step();
        let xorshifted = (((old >> 18) ^ old) >> 27) as u32;
        let rot = (old >> 59) as u32;
        xorshifted.rotate_right(rot)
    }

    /// Uniform integer in `[min, max)`.
    ///
    /// Always consumes at least one draw. An empty range (`max <= min`)
    /// discards that draw and yields `min`.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn uniform_int(&mut self, min: u32, max: u32) -> u32 {
        let range = max.saturating_sub(min);
        if range == 0 {
            self.next_word();
            return min;
        }
        let threshold = range.wrapping_neg() % range;
        loop {
            let draw = self.next_word();
            if draw >= threshold {
                return min + draw % range;
            }
        }
    }
}

impl RngCore for Pcg32 {
    fn next_u32(&mut self) -> u32 {
        self.next_word()
    }

    fn next_u64(&mut self) -> u64 {
        let low = u64::from(self.next_word());
        let high = u64::from(self.next_word());
        (high << 32) | low
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        for chunk in dest.chunks_mut(4) {
            let bytes = self.next_word().to_le_bytes();
            chunk.copy_from_slice(&bytes[..chunk.len()]);
        }
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand::Error> {
        self.fill_bytes(dest);
        Ok(())
    }
}

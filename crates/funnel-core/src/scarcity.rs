//! "Spots left" decay.
//!
//! A self-terminating chain: each step either decrements and asks for the
//! next step after a random gap, or reports exhaustion and asks for nothing.

use rand::Rng;
use serde::{Deserialize, Serialize};

/// Uniform gap in `[min_ms, min_ms + spread_ms)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Jitter {
    pub min_ms: u64,
    pub spread_ms: u64,
}

impl Jitter {
    pub fn new(min_ms: u64, spread_ms: u64) -> Self {
        Self { min_ms, spread_ms }
    }

    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> u64 {
        if self.spread_ms == 0 {
            return self.min_ms;
        }
        self.min_ms + rng.gen_range(0..self.spread_ms)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScarcityStep {
    /// Count dropped by one; run the next step after `next_in_ms`.
    Decremented { spots_left: u32, next_in_ms: u64 },
    /// At or below the floor. Terminal.
    Exhausted { spots_left: u32 },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScarcityCounter {
    spots_left: u32,
    floor: u32,
    gap: Jitter,
    exhausted: bool,
}

impl ScarcityCounter {
    pub fn new(initial_spots: u32, floor: u32, gap: Jitter) -> Self {
        Self {
            spots_left: initial_spots,
            floor,
            gap,
            exhausted: false,
        }
    }

    pub fn spots_left(&self) -> u32 {
        self.spots_left
    }

    pub fn floor(&self) -> u32 {
        self.floor
    }

    pub fn is_exhausted(&self) -> bool {
        self.exhausted
    }

    pub fn step<R: Rng + ?Sized>(&mut self, rng: &mut R) -> ScarcityStep {
        if self.exhausted || self.spots_left <= self.floor {
            self.exhausted = true;
            return ScarcityStep::Exhausted {
                spots_left: self.spots_left,
            };
        }
        self.spots_left -= 1;
        ScarcityStep::Decremented {
            spots_left: self.spots_left,
            next_in_ms: self.gap.sample(rng),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rand::SeedableRng;
    use rand_pcg::Mcg128Xsl64;

    fn run_to_end(counter: &mut ScarcityCounter, rng: &mut Mcg128Xsl64) -> Vec<u32> {
        let mut published = Vec::new();
        loop {
            match counter.step(rng) {
                ScarcityStep::Decremented { spots_left, .. } => published.push(spots_left),
                ScarcityStep::Exhausted { .. } => return published,
            }
        }
    }

    #[test]
    fn ten_down_to_two() {
        let mut rng = Mcg128Xsl64::seed_from_u64(7);
        let mut counter = ScarcityCounter::new(10, 2, Jitter::new(5_000, 10_000));
        assert_eq!(run_to_end(&mut counter, &mut rng), vec![9, 8, 7, 6, 5, 4, 3, 2]);
        assert!(counter.is_exhausted());
        assert!(matches!(
            counter.step(&mut rng),
            ScarcityStep::Exhausted { spots_left: 2 }
        ));
    }

    #[test]
    fn starting_at_floor_publishes_nothing() {
        let mut rng = Mcg128Xsl64::seed_from_u64(1);
        let mut counter = ScarcityCounter::new(2, 2, Jitter::new(5_000, 10_000));
        assert!(run_to_end(&mut counter, &mut rng).is_empty());
    }

    #[test]
    fn zero_spread_is_fixed_gap() {
        let mut rng = Mcg128Xsl64::seed_from_u64(1);
        assert_eq!(Jitter::new(5_000, 0).sample(&mut rng), 5_000);
    }

    proptest! {
        #[test]
        fn gaps_stay_in_range(seed in any::<u64>(), min in 0u64..20_000, spread in 1u64..20_000) {
            let mut rng = Mcg128Xsl64::seed_from_u64(seed);
            let gap = Jitter::new(min, spread).sample(&mut rng);
            prop_assert!(gap >= min && gap < min + spread);
        }

        #[test]
        fn never_below_floor(seed in any::<u64>(), initial in 0u32..50, floor in 0u32..10) {
            let mut rng = Mcg128Xsl64::seed_from_u64(seed);
            let mut counter = ScarcityCounter::new(initial, floor, Jitter::new(5_000, 10_000));
            let published = run_to_end(&mut counter, &mut rng);
            prop_assert!(published.windows(2).all(|w| w[0] == w[1] + 1));
            prop_assert!(published.iter().all(|&n| n >= floor));
            prop_assert_eq!(counter.spots_left(), initial.min(floor));
        }
    }
}

//! Skip lists use a probabilistic distribution of nodes over the internal
//! levels, whereby the lowest level (level 0) contains all the nodes, and
//! each level `n > 0` will contain a random subset of the nodes on level
//! `n - 1`.
//!
//! Here the distribution is geometric with `p = 1/2`: a freshly created
//! block occupies level `n + 1` half as often as level `n`. Rather than
//! sampling a float and walking the CDF, the draw counts the trailing zero
//! bits of a random word, which produces exactly that distribution for
//! free. The default should suffice, but if need be custom level
//! generators can be implemented through [`LevelGenerator`].

use thiserror::Error;

use crate::bits;
use crate::rng::XorShift64;

/// The number of levels a descent path can record, and therefore the hard
/// ceiling on container height.
pub const MAX_LEVELS: usize = 32;

// ////////////////////////////////////////////////////////////////////////////
// Level Generator
// ////////////////////////////////////////////////////////////////////////////

/// Upon the insertion of a new block in the list, the block is replicated
/// to high levels with a certain probability as determined by a
/// `LevelGenerator`.
pub trait LevelGenerator {
    /// The total number of levels that are assumed to exist for this level
    /// generator.
    fn total(&self) -> usize;

    /// Generate a random level for a new block in the range `[0, total)`.
    ///
    /// This must never return a level that is `>= self.total()`.
    fn random(&mut self) -> usize;
}

/// Errors that can occur when creating a [`TrailingZeros`] level generator.
#[derive(Error, Debug, PartialEq, Eq)]
#[non_exhaustive]
pub enum TrailingZerosError {
    /// The total number of levels must be non-zero.
    #[error("total must be non-zero.")]
    ZeroTotal,
    /// The total number of levels must be at most 64.
    #[error("total must be at most 64.")]
    TotalTooLarge,
    /// The total number of levels must be a power of two.
    #[error("total must be a power of two.")]
    TotalNotPowerOfTwo,
}

/// A level generator which produces geometrically distributed levels with
/// `p = 1/2`.
///
/// The level is the number of trailing zero bits of a 64-bit random word,
/// masked to `[0, total)`. Each additional trailing zero halves the
/// probability, so level `n + 1` is drawn half as often as level `n`; the
/// mask folds the (astronomically rare) overflowing counts back into the
/// permitted range, which keeps the draw branch-free.
#[derive(Clone, Debug)]
pub struct TrailingZeros {
    /// The total number of levels that are assumed to exist.
    total: usize,
    /// The random number generator.
    rng: XorShift64,
}

impl TrailingZeros {
    /// Create a new trailing-zeros level generator with `total` number of
    /// levels, drawing randomness from a generator seeded with `seed`.
    ///
    /// # Errors
    ///
    /// `total` must be a power of two in `1..=64` so that it can be used as
    /// a bit mask over the trailing-zero count of a 64-bit word.
    pub fn new(total: usize, seed: u64) -> Result<Self, TrailingZerosError> {
        if total == 0 {
            return Err(TrailingZerosError::ZeroTotal);
        }
        if total > 64 {
            return Err(TrailingZerosError::TotalTooLarge);
        }
        if !total.is_power_of_two() {
            return Err(TrailingZerosError::TotalNotPowerOfTwo);
        }
        Ok(TrailingZeros {
            total,
            rng: XorShift64::new(seed),
        })
    }

    /// Create a generator with [`MAX_LEVELS`] levels, the configuration the
    /// container uses.
    pub(crate) fn with_seed(seed: u64) -> Self {
        TrailingZeros {
            total: MAX_LEVELS,
            rng: XorShift64::new(seed),
        }
    }

    /// A fair coin flip, used for promotion decisions during container
    /// growth. Shares the generator state with the level draws.
    pub(crate) fn coin(&mut self) -> bool {
        self.rng.coin()
    }
}

impl LevelGenerator for TrailingZeros {
    fn total(&self) -> usize {
        self.total
    }

    fn random(&mut self) -> usize {
        bits::ctz64(self.rng.next_u64()) as usize & (self.total - 1)
    }
}

#[cfg(test)]
mod tests {
    use anyhow::{bail, Result};
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use super::{LevelGenerator, TrailingZeros, TrailingZerosError, MAX_LEVELS};

    #[test]
    fn invalid_total() {
        assert_eq!(
            TrailingZeros::new(0, 1).err(),
            Some(TrailingZerosError::ZeroTotal)
        );
        assert_eq!(
            TrailingZeros::new(128, 1).err(),
            Some(TrailingZerosError::TotalTooLarge)
        );
        assert_eq!(
            TrailingZeros::new(24, 1).err(),
            Some(TrailingZerosError::TotalNotPowerOfTwo)
        );
    }

    #[rstest]
    fn new(#[values(1, 2, 8, 32, 64)] total: usize) -> Result<()> {
        let mut generator = TrailingZeros::new(total, 0xA5A5_A5A5)?;
        assert_eq!(generator.total(), total);
        for _ in 0..100_000 {
            let level = generator.random();
            assert!((0..total).contains(&level));
        }

        // Level 0 has probability at least 1/2, so it must show up quickly.
        let mut found = false;
        for _ in 0..1_000_000 {
            if generator.random() == 0 {
                found = true;
                break;
            }
        }
        if !found {
            bail!("Failed to generate a level-0 draw.");
        }

        if total > 1 {
            found = false;
            for _ in 0..1_000_000 {
                if generator.random() > 0 {
                    found = true;
                    break;
                }
            }
            if !found {
                bail!("Failed to generate a draw above level 0.");
            }
        }

        Ok(())
    }

    #[test]
    fn halving_distribution() {
        let mut generator = TrailingZeros::with_seed(0x1234_ABCD);
        let draws = 100_000;
        let mut counts = [0usize; MAX_LEVELS];
        for _ in 0..draws {
            counts[generator.random()] += 1;
        }
        // Roughly half of all draws land on level 0, a quarter on level 1.
        assert!(counts[0] > draws / 3, "level 0: {}", counts[0]);
        assert!(counts[1] > draws / 8, "level 1: {}", counts[1]);
        assert!(counts[0] > counts[1]);
    }

    #[test]
    fn deterministic_for_seed() {
        let mut a = TrailingZeros::with_seed(99);
        let mut b = TrailingZeros::with_seed(99);
        for _ in 0..1000 {
            assert_eq!(a.random(), b.random());
        }
    }
}

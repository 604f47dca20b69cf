//! Splittable random source
//!
//! Every generator in this crate draws its randomness from a [`RandomSource`].
//! A source is an immutable value: instead of being advanced in place it is
//! *split* into two independent children, which is what lets generators be
//! pure functions of `(size, source)`.
//!
//! Conceptually a source is a node in an infinite binary tree of independent
//! sub-streams. Splitting walks one level down the tree; drawing a value
//! consumes the node. Applying two operations to the same node without an
//! intervening split correlates the results.
//!
//! The implementation keys a ChaCha8 stream cipher with 256 bits of state.
//! Each operation keys a fresh cipher from the node and reads from a
//! dedicated stream of that key:
//!
//! - stream 0: derives the two child keys of [`RandomSource::split`]
//! - stream 1: value draws ([`RandomSource::range`])
//! - stream `v + 2`: the perturbation selected by [`RandomSource::variant`]

use once_cell::sync::Lazy;
use rand::{Rng, RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::fmt;
use std::sync::{Mutex, PoisonError};

const SPLIT_STREAM: u64 = 0;
const DRAW_STREAM: u64 = 1;
const VARIANT_STREAM_BASE: u64 = 2;

/// Process-scoped default source, seeded from OS entropy on first use.
static DEFAULT_SOURCE: Lazy<Mutex<RandomSource>> = Lazy::new(|| {
    let source = RandomSource::from_entropy();
    log::debug!("initialised default random source {:?}", source);
    Mutex::new(source)
});

/// Opaque splittable pseudorandom state.
///
/// Identical state plus identical operation always yields identical output,
/// so a run can be reproduced from the seed it started with.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct RandomSource {
    key: [u8; 32],
}

impl RandomSource {
    /// Create a source deterministically from a 64-bit seed.
    pub fn from_seed(seed: u64) -> Self {
        Self::from_rng(ChaCha8Rng::seed_from_u64(seed))
    }

    /// Create a source from operating system entropy.
    pub fn from_entropy() -> Self {
        Self::from_rng(ChaCha8Rng::from_entropy())
    }

    fn from_rng(mut rng: ChaCha8Rng) -> Self {
        let mut key = [0u8; 32];
        rng.fill_bytes(&mut key);
        Self { key }
    }

    fn stream(&self, stream: u64) -> ChaCha8Rng {
        let mut rng = ChaCha8Rng::from_seed(self.key);
        rng.set_stream(stream);
        rng
    }

    /// Split into two sources that are independent of each other and of any
    /// other split of a sibling node.
    pub fn split(&self) -> (RandomSource, RandomSource) {
        let mut rng = self.stream(SPLIT_STREAM);
        let mut left = [0u8; 32];
        let mut right = [0u8; 32];
        rng.fill_bytes(&mut left);
        rng.fill_bytes(&mut right);
        (RandomSource { key: left }, RandomSource { key: right })
    }

    /// Draw an integer uniformly from `[lo, hi]`, inclusive of both bounds.
    ///
    /// Returns the value together with the successor source.
    ///
    /// # Panics
    ///
    /// Panics if `lo > hi`.
    pub fn range(&self, lo: i64, hi: i64) -> (i64, RandomSource) {
        assert!(lo <= hi, "empty range [{}, {}]", lo, hi);
        let mut rng = self.stream(DRAW_STREAM);
        let value = rng.gen_range(lo..=hi);
        (value, Self::from_rng(rng))
    }

    /// Deterministically perturb this source by the discriminator `v`.
    ///
    /// Equal discriminators always give equal sources and distinct ones give
    /// independent sources. This is the primitive co-generators are built on.
    pub fn variant(&self, v: u64) -> RandomSource {
        Self::from_rng(self.stream(VARIANT_STREAM_BASE.wrapping_add(v)))
    }
}

impl fmt::Debug for RandomSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RandomSource(")?;
        for byte in &self.key[..8] {
            write!(f, "{:02x}", byte)?;
        }
        write!(f, "..)")
    }
}

/// Hand out a fresh source split off the process-scoped default.
///
/// The default source is created once per process. Each call splits it,
/// returns one half and keeps the other, so consecutive runs in one process
/// see different samples.
pub fn default_source() -> RandomSource {
    let mut guard = DEFAULT_SOURCE
        .lock()
        .unwrap_or_else(PoisonError::into_inner);
    let (handed_out, kept) = guard.split();
    *guard = kept;
    handed_out
}

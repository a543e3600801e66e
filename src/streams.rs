//! Independent random sources for channel generation
//!
//! Normal draws, uniform draws and ray shuffling each get their own
//! ChaCha8 stream so one category never perturbs another's sequence.

use rand::distributions::Open01;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rand_distr::StandardNormal;

/// Number of stream numbers consumed by `RandomStreams::assign`
pub const STREAMS_USED: u64 = 3;

/// The three random number generators owned by a channel model
#[derive(Debug, Clone)]
pub struct RandomStreams {
    seed: u64,
    normal: ChaCha8Rng,
    uniform: ChaCha8Rng,
    shuffle: ChaCha8Rng,
}

impl RandomStreams {
    /// Streams 0, 1 and 2 of `seed`
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            normal: Self::stream(seed, 0),
            uniform: Self::stream(seed, 1),
            shuffle: Self::stream(seed, 2),
        }
    }

    fn stream(seed: u64, stream: u64) -> ChaCha8Rng {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        rng.set_stream(stream);
        rng
    }

    /// Restart the generators on `stream`, `stream + 1` and `stream + 2`.
    ///
    /// # Returns
    /// Number of stream numbers consumed
    pub fn assign(&mut self, stream: u64) -> u64 {
        self.normal = Self::stream(self.seed, stream);
        self.uniform = Self::stream(self.seed, stream.wrapping_add(1));
        self.shuffle = Self::stream(self.seed, stream.wrapping_add(2));
        STREAMS_USED
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Standard normal variate
    pub fn normal(&mut self) -> f64 {
        self.normal.sample(StandardNormal)
    }

    /// Uniform on the open interval (0, 1), safe to take the log of
    pub fn unit(&mut self) -> f64 {
        self.uniform.sample(Open01)
    }

    /// Uniform on [low, high)
    pub fn uniform(&mut self, low: f64, high: f64) -> f64 {
        self.uniform.gen_range(low..high)
    }

    /// Random permutation drawn from the shuffle stream
    pub fn shuffle(&mut self, values: &mut [f64]) {
        values.shuffle(&mut self.shuffle);
    }
}

//! Input data generation
//!
//! Fills the A and B arrays with uniformly distributed values.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::Arc;

use crate::models::Shape;

/// Read-only inputs shared by every trial of one shape
#[derive(Clone, Debug)]
pub struct Workload {
    pub shape: Shape,
    pub a: Arc<[i32]>,
    pub b: Arc<[i32]>,
}

impl Workload {
    pub fn new(shape: Shape, a: Vec<i32>, b: Vec<i32>) -> Self {
        Self {
            shape,
            a: a.into(),
            b: b.into(),
        }
    }

    pub fn len(&self) -> usize {
        self.shape.len()
    }
}

/// Random input generator over an inclusive value range
pub struct DataGenerator {
    rng: StdRng,
    min: i32,
    max: i32,
}

impl DataGenerator {
    /// Create a generator; a fixed `seed` makes the data reproducible
    pub fn new(min: i32, max: i32, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        Self { rng, min, max }
    }

    /// Generate `len` values in `[min, max]`
    pub fn fill(&mut self, len: usize) -> Vec<i32> {
        let (min, max) = (self.min, self.max);
        (0..len).map(|_| self.rng.random_range(min..=max)).collect()
    }

    /// Generate both inputs for `shape`
    pub fn workload(&mut self, shape: Shape) -> Workload {
        let a = self.fill(shape.len());
        let b = self.fill(shape.len());
        Workload::new(shape, a, b)
    }
}

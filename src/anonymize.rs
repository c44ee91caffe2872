use rand::Rng;
use rand::distributions::{Distribution, Uniform};

use crate::foundation::core::Coordinate;
use crate::foundation::error::{CoverlapError, CoverlapResult};

/// Adds independent uniform jitter in `[-max_offset, max_offset]` degrees to latitude and
/// longitude. The result is lossy: exact viewer positions cannot be recovered.
#[derive(Clone, Debug)]
pub struct CoordinateAnonymizer {
    max_offset: f64,
    offset: Uniform<f64>,
}

impl CoordinateAnonymizer {
    pub fn new(max_offset: f64) -> CoverlapResult<Self> {
        if !max_offset.is_finite() || max_offset < 0.0 {
            return Err(CoverlapError::config(format!(
                "jitter must be finite and non-negative, got {max_offset}"
            )));
        }
        Ok(Self {
            max_offset,
            offset: Uniform::new_inclusive(-max_offset, max_offset),
        })
    }

    pub fn max_offset(&self) -> f64 {
        self.max_offset
    }

    /// Jitters with the thread-local RNG, which is seeded from the OS per process.
    pub fn anonymize(&self, coords: &[Coordinate]) -> Vec<Coordinate> {
        self.anonymize_with(&mut rand::thread_rng(), coords)
    }

    pub fn anonymize_with<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        coords: &[Coordinate],
    ) -> Vec<Coordinate> {
        coords.iter().map(|c| self.jitter(rng, *c)).collect()
    }

    pub fn jitter<R: Rng + ?Sized>(&self, rng: &mut R, c: Coordinate) -> Coordinate {
        let dlat = self.offset.sample(rng);
        let dlon = self.offset.sample(rng);
        Coordinate::new(c.latitude + dlat, c.longitude + dlon)
    }
}

//! Injectable randomness for the estimated figures (swap volume multiplier,
//! delegator offset). Seeded sources make snapshots reproducible.

use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rust_decimal::Decimal;

pub struct Jitter {
    rng: Mutex<StdRng>,
}

impl Jitter {
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }

    pub fn from_entropy() -> Self {
        Self {
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    /// Seeded when a seed is configured, entropy-backed otherwise
    pub fn from_seed(seed: Option<u64>) -> Self {
        match seed {
            Some(seed) => Self::seeded(seed),
            None => Self::from_entropy(),
        }
    }

    /// Uniform integer in `[low, high)`; returns `low` for an empty range
    pub fn range_u64(&self, low: u64, high: u64) -> u64 {
        if high <= low {
            return low;
        }
        self.rng.lock().gen_range(low..high)
    }

    /// Uniform decimal in `[low, high)` with millesimal resolution
    pub fn range_decimal(&self, low: u64, high: u64) -> Decimal {
        let millis = self.range_u64(low * 1000, high * 1000);
        Decimal::new(millis as i64, 3)
    }
}

impl Default for Jitter {
    fn default() -> Self {
        Self::from_entropy()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_seeded_is_reproducible() {
        let a = Jitter::seeded(7);
        let b = Jitter::seeded(7);
        let xs: Vec<u64> = (0..5).map(|_| a.range_u64(0, 200)).collect();
        let ys: Vec<u64> = (0..5).map(|_| b.range_u64(0, 200)).collect();
        assert_eq!(xs, ys);
    }

    #[test]
    fn test_ranges() {
        let jitter = Jitter::seeded(1);
        for _ in 0..100 {
            let v = jitter.range_decimal(100, 1000);
            assert!(v >= dec!(100) && v < dec!(1000));
            assert!(jitter.range_u64(0, 200) < 200);
        }
        assert_eq!(jitter.range_u64(5, 5), 5);
    }
}

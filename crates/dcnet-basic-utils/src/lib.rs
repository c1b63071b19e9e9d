#![cfg_attr(docsrs, feature(doc_auto_cfg, doc_cfg))]
#![doc = include_str!("../README.md")]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

pub mod test_rng;

use rand::Rng;

/// Extension trait providing `.gen_range_checked()`, a non-panicking
/// version of [`Rng::gen_range`].
///
/// Several of the codecs in this workspace sample a bit, chunk or slot
/// index out of a range whose size is only known at runtime (a cell's
/// chunk count, a Bloom filter's number of buckets); this lets them report
/// an internal error instead of panicking when that range is unexpectedly
/// empty.
pub trait RngExt: Rng {
    /// Generate a random value in the given range.
    ///
    /// Returns `None` if the range is empty, rather than panicking.
    fn gen_range_checked<T, R>(&mut self, range: R) -> Option<T>
    where
        T: rand::distr::uniform::SampleUniform,
        R: rand::distr::uniform::SampleRange<T>,
    {
        if range.is_empty() {
            None
        } else {
            Some(Rng::random_range(self, range))
        }
    }
}
impl<T: Rng> RngExt for T {}

#[cfg(test)]
mod test {
    use super::*;
    use rand::SeedableRng;

    #[test]
    fn checked_range_rejects_empty() {
        let mut rng = rand_chacha::ChaCha12Rng::seed_from_u64(0);
        assert_eq!(rng.gen_range_checked::<u32, _>(5..5), None);
        assert!(rng.gen_range_checked(0..5u32).is_some());
    }
}

//! Random key generation.
//!
//! Batch drivers draw keys by rejection sampling against the keys already
//! stored, so a batch never trips the engines' duplicate rejection. The
//! retry budget is bounded; a request the key space cannot satisfy fails
//! with a typed error rather than spinning.

use arbor_common::{ArborError, Result};
use rand::Rng;
use std::collections::HashSet;

/// Retry budget per requested key before the draw is declared exhausted.
const ATTEMPTS_PER_KEY: usize = 50;

/// Draws `count` distinct integers in `[min, max]`, none of which appear in
/// `exclude`. Fails with [`ArborError::RangeExhausted`] when the range
/// cannot supply the request.
pub fn unique_random_ints<R: Rng + ?Sized>(
    rng: &mut R,
    count: usize,
    min: i64,
    max: i64,
    exclude: &HashSet<i64>,
) -> Result<Vec<i64>> {
    let exhausted = ArborError::RangeExhausted {
        min,
        max,
        requested: count,
    };
    if min > max {
        return Err(exhausted);
    }
    let span = max as i128 - min as i128 + 1;
    let excluded_in_range = exclude.iter().filter(|k| (min..=max).contains(k)).count();
    if count as i128 > span - excluded_in_range as i128 {
        return Err(exhausted);
    }

    let mut out = Vec::with_capacity(count);
    let mut drawn: HashSet<i64> = HashSet::with_capacity(count);
    let mut attempts = 0;
    while out.len() < count && attempts < count * ATTEMPTS_PER_KEY {
        attempts += 1;
        let candidate = rng.gen_range(min..=max);
        if exclude.contains(&candidate) || !drawn.insert(candidate) {
            continue;
        }
        out.push(candidate);
    }
    if out.len() < count {
        return Err(exhausted);
    }
    Ok(out)
}

/// Draws `count` distinct uppercase ASCII strings of `length` characters,
/// none of which appear in `exclude`.
pub fn random_uppercase_strings<R: Rng + ?Sized>(
    rng: &mut R,
    count: usize,
    length: usize,
    exclude: &HashSet<String>,
) -> Result<Vec<String>> {
    let mut out = Vec::with_capacity(count);
    let mut drawn: HashSet<String> = HashSet::with_capacity(count);
    let mut attempts = 0;
    while out.len() < count && attempts < count.saturating_mul(ATTEMPTS_PER_KEY) {
        attempts += 1;
        let candidate: String = (0..length)
            .map(|_| char::from(b'A' + rng.gen_range(0..26)))
            .collect();
        if exclude.contains(&candidate) || !drawn.insert(candidate.clone()) {
            continue;
        }
        out.push(candidate);
    }
    if out.len() < count {
        return Err(ArborError::StringSpaceExhausted {
            length,
            requested: count,
        });
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_ints_are_unique_in_range_and_not_excluded() {
        let mut rng = StdRng::seed_from_u64(7);
        let exclude: HashSet<i64> = [5, 10, 15].into_iter().collect();
        let keys = unique_random_ints(&mut rng, 20, 1, 100, &exclude).unwrap();

        assert_eq!(keys.len(), 20);
        let distinct: HashSet<_> = keys.iter().copied().collect();
        assert_eq!(distinct.len(), 20);
        for k in &keys {
            assert!((1..=100).contains(k));
            assert!(!exclude.contains(k));
        }
    }

    #[test]
    fn test_ints_exact_span_yields_permutation() {
        let mut rng = StdRng::seed_from_u64(11);
        let mut keys = unique_random_ints(&mut rng, 5, 1, 5, &HashSet::new()).unwrap();
        keys.sort_unstable();
        assert_eq!(keys, vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_ints_range_too_small_fails() {
        let mut rng = StdRng::seed_from_u64(3);
        let err = unique_random_ints(&mut rng, 10, 1, 5, &HashSet::new()).unwrap_err();
        assert!(matches!(
            err,
            ArborError::RangeExhausted {
                min: 1,
                max: 5,
                requested: 10
            }
        ));
    }

    #[test]
    fn test_ints_exclusions_count_against_span() {
        let mut rng = StdRng::seed_from_u64(3);
        let exclude: HashSet<i64> = [1, 2, 3].into_iter().collect();
        let err = unique_random_ints(&mut rng, 3, 1, 5, &exclude).unwrap_err();
        assert!(matches!(err, ArborError::RangeExhausted { .. }));
    }

    #[test]
    fn test_inverted_range_fails() {
        let mut rng = StdRng::seed_from_u64(3);
        assert!(unique_random_ints(&mut rng, 1, 10, 5, &HashSet::new()).is_err());
    }

    #[test]
    fn test_zero_count_is_empty() {
        let mut rng = StdRng::seed_from_u64(3);
        let keys = unique_random_ints(&mut rng, 0, 1, 5, &HashSet::new()).unwrap();
        assert!(keys.is_empty());
    }

    #[test]
    fn test_strings_unique_uppercase_fixed_length() {
        let mut rng = StdRng::seed_from_u64(42);
        let words = random_uppercase_strings(&mut rng, 25, 3, &HashSet::new()).unwrap();

        assert_eq!(words.len(), 25);
        let distinct: HashSet<_> = words.iter().cloned().collect();
        assert_eq!(distinct.len(), 25);
        for w in &words {
            assert_eq!(w.len(), 3);
            assert!(w.chars().all(|c| c.is_ascii_uppercase()));
        }
    }

    #[test]
    fn test_strings_respect_exclusions() {
        let mut rng = StdRng::seed_from_u64(1);
        // Length 1 leaves 26 candidates; excluding half still succeeds.
        let exclude: HashSet<String> = ('A'..='M').map(String::from).collect();
        let words = random_uppercase_strings(&mut rng, 10, 1, &exclude).unwrap();
        for w in &words {
            assert!(!exclude.contains(w));
        }
    }

    #[test]
    fn test_strings_space_too_small_fails() {
        let mut rng = StdRng::seed_from_u64(1);
        let err = random_uppercase_strings(&mut rng, 27, 1, &HashSet::new()).unwrap_err();
        assert!(matches!(
            err,
            ArborError::StringSpaceExhausted {
                length: 1,
                requested: 27
            }
        ));
    }
}

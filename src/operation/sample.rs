//! Sampled text profiling: how many cells carry untrimmed or non-trivial
//! whitespace.
//!
//! Storages larger than the sample size are sampled at random rows from a
//! fixed seed, so repeated runs over the same storage agree. The sampled
//! count is scaled up to the storage size and rounded up.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::context::Context;
use crate::error::StoreError;
use crate::operation::iterators::for_each_row;
use crate::storage::Storage;
use crate::types::Value;

pub const RANDOM_SEED: u64 = 677_280_131;
pub const DEFAULT_SAMPLE_SIZE: usize = 10_000;

/// Text with leading or trailing whitespace.
pub fn is_untrimmed(text: &str) -> bool {
    text.starts_with(char::is_whitespace) || text.ends_with(char::is_whitespace)
}

/// Text with whitespace other than single spaces: tabs, line breaks and
/// other whitespace characters, or two whitespace characters in a row.
pub fn has_non_trivial_whitespace(text: &str) -> bool {
    let mut previous_whitespace = false;
    for c in text.chars() {
        let whitespace = c.is_whitespace();
        if (whitespace && c != ' ') || (whitespace && previous_whitespace) {
            return true;
        }
        previous_whitespace = whitespace;
    }
    false
}

/// Estimated number of text cells with leading or trailing whitespace.
pub fn count_untrimmed(
    storage: &Storage,
    sample_size: usize,
    ctx: &Context,
) -> Result<usize, StoreError> {
    sampled_count(storage, sample_size, ctx, is_untrimmed)
}

/// Estimated number of text cells with non-trivial whitespace.
pub fn count_non_trivial_whitespace(
    storage: &Storage,
    sample_size: usize,
    ctx: &Context,
) -> Result<usize, StoreError> {
    sampled_count(storage, sample_size, ctx, has_non_trivial_whitespace)
}

fn sampled_count<P>(
    storage: &Storage,
    sample_size: usize,
    ctx: &Context,
    predicate: P,
) -> Result<usize, StoreError>
where
    P: Fn(&str) -> bool,
{
    let size = storage.size();
    let hit = |index: usize| matches!(storage.item_at(index), Value::Text(t) if predicate(t.as_str()));
    let mut count = 0usize;

    if sample_size >= size {
        for_each_row(size, ctx, |i| {
            count += usize::from(hit(i));
            Ok(())
        })?;
        return Ok(count);
    }
    if sample_size == 0 {
        return Ok(0);
    }

    let mut rng = StdRng::seed_from_u64(RANDOM_SEED);
    for_each_row(sample_size, ctx, |_| {
        count += usize::from(hit(rng.random_range(0..size)));
        Ok(())
    })?;
    let estimate = (count as f64 / sample_size as f64 * size as f64).ceil() as usize;
    log_metric!(
        "event" = "sampled_count",
        "rows" = size,
        "sample" = sample_size,
        "hits" = count,
        "estimate" = estimate
    );
    Ok(estimate.min(size))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::CancellationToken;
    use crate::storage::{LongStorage, ObjectStorage, TextStorage};
    use crate::types::{IntegerType, TextType};

    fn texts(values: &[Option<&str>]) -> Storage {
        Storage::Text(TextStorage::from_strs(values, TextType::VARIABLE_LENGTH))
    }

    #[test]
    fn test_whitespace_classification() {
        assert!(is_untrimmed(" a"));
        assert!(is_untrimmed("a\n"));
        assert!(!is_untrimmed("a b"));
        assert!(!is_untrimmed(""));

        assert!(has_non_trivial_whitespace("a\tb"));
        assert!(has_non_trivial_whitespace("a  b"));
        assert!(has_non_trivial_whitespace("line\r\nbreak"));
        assert!(!has_non_trivial_whitespace("a b c"));
        assert!(!has_non_trivial_whitespace(""));
    }

    #[test]
    fn test_full_count_below_sample_size() {
        let ctx = Context::default();
        let storage = texts(&[Some(" lead"), Some("trail "), Some("ok"), None, Some("a\tb")]);
        assert_eq!(count_untrimmed(&storage, DEFAULT_SAMPLE_SIZE, &ctx).unwrap(), 2);
        assert_eq!(count_non_trivial_whitespace(&storage, DEFAULT_SAMPLE_SIZE, &ctx).unwrap(), 1);
    }

    #[test]
    fn test_only_text_cells_are_counted() {
        let ctx = Context::default();
        let mixed = Storage::Mixed(ObjectStorage::new(vec![
            Some(Value::from(" x")),
            Some(Value::Long(1)),
            None,
        ]));
        assert_eq!(count_untrimmed(&mixed, 10, &ctx).unwrap(), 1);
        let longs = Storage::Long(LongStorage::from_options(vec![Some(1)], IntegerType::INT_64));
        assert_eq!(count_untrimmed(&longs, 10, &ctx).unwrap(), 0);
    }

    #[test]
    fn test_sampled_estimate_is_scaled_and_stable() {
        let ctx = Context::default();
        let all: Vec<Option<&str>> = vec![Some("  padded  "); 1_000];
        let storage = texts(&all);
        assert_eq!(count_untrimmed(&storage, 50, &ctx).unwrap(), 1_000);

        let half: Vec<Option<&str>> = (0..1_000)
            .map(|i| Some(if i % 2 == 0 { " x" } else { "x" }))
            .collect();
        let storage = texts(&half);
        let first = count_untrimmed(&storage, 200, &ctx).unwrap();
        let second = count_untrimmed(&storage, 200, &ctx).unwrap();
        assert_eq!(first, second);
        assert!(first > 0 && first < 1_000);

        assert_eq!(count_untrimmed(&storage, 0, &ctx).unwrap(), 0);
    }

    #[test]
    fn test_sampling_is_cancellable() {
        let token = CancellationToken::new();
        token.cancel();
        let ctx = Context::with_token(token);
        let values: Vec<Option<&str>> = vec![Some("x"); 5_000];
        let err = count_non_trivial_whitespace(&texts(&values), 4_000, &ctx).unwrap_err();
        assert!(matches!(err, StoreError::Cancelled));
    }
}

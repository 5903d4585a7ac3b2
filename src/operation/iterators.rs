//! Row loops shared by operations and converters.
//!
//! Each helper drives a source storage and an output builder through a
//! per-row callback and polls the cancellation safepoint once per row, so
//! callers never write the loop (or forget the safepoint) themselves.

use crate::builder::{Builder, TypedItem};
use crate::context::Context;
use crate::error::StoreError;
use crate::storage::{BoolStorage, DoubleStorage, LongStorage, ObjectStorage, Storage, TextStorage};
use crate::types::Value;

/// Calls `f` for every row index below `len`.
pub fn for_each_row<F>(len: usize, ctx: &Context, mut f: F) -> Result<(), StoreError>
where
    F: FnMut(usize) -> Result<(), StoreError>,
{
    for i in 0..len {
        f(i)?;
        ctx.safepoint()?;
    }
    Ok(())
}

/// Boxed traversal. With `preserve_nothing`, null rows are appended as nulls
/// without calling `f`; otherwise `f` also sees them as `Value::Null`.
pub fn build_over_storage<B, F>(
    source: &Storage,
    preserve_nothing: bool,
    mut builder: B,
    ctx: &Context,
    mut f: F,
) -> Result<Storage, StoreError>
where
    B: Builder,
    F: FnMut(&mut B, usize, Value) -> Result<(), StoreError>,
{
    for_each_row(source.size(), ctx, |i| {
        let item = source.item_at(i);
        if preserve_nothing && item.is_nothing() {
            builder.append_nulls(1);
            Ok(())
        } else {
            f(&mut builder, i, item)
        }
    })?;
    Ok(Box::new(builder).seal())
}

macro_rules! typed_traversal {
    ($(#[$doc:meta])* $name:ident, $storage:ty, $item:ty, |$s:ident, $i:ident| $get:expr) => {
        $(#[$doc])*
        pub fn $name<B, F>(
            source: &$storage,
            mut builder: B,
            ctx: &Context,
            mut f: F,
        ) -> Result<Storage, StoreError>
        where
            B: Builder,
            F: FnMut(&mut B, usize, $item) -> Result<(), StoreError>,
        {
            let $s = source;
            for_each_row(crate::storage::StorageVariant::size(source), ctx, |$i| match $get {
                Some(value) => f(&mut builder, $i, value),
                None => {
                    builder.append_nulls(1);
                    Ok(())
                }
            })?;
            Ok(Box::new(builder).seal())
        }
    };
}

typed_traversal!(
    /// Unboxed traversal of an integer storage; null rows stay null.
    build_over_longs, LongStorage, i64, |s, i| s.get(i)
);
typed_traversal!(
    /// Unboxed traversal of a float storage; null rows stay null.
    build_over_doubles, DoubleStorage, f64, |s, i| s.get(i)
);
typed_traversal!(
    /// Unboxed traversal of a boolean storage; null rows stay null.
    build_over_booleans, BoolStorage, bool, |s, i| s.get(i)
);

/// Traversal of a text storage; null rows stay null.
pub fn build_over_texts<B, F>(
    source: &TextStorage,
    mut builder: B,
    ctx: &Context,
    mut f: F,
) -> Result<Storage, StoreError>
where
    B: Builder,
    F: FnMut(&mut B, usize, &str) -> Result<(), StoreError>,
{
    let len = crate::storage::StorageVariant::size(source);
    for_each_row(len, ctx, |i| match source.get(i) {
        Some(text) => f(&mut builder, i, text),
        None => {
            builder.append_nulls(1);
            Ok(())
        }
    })?;
    Ok(Box::new(builder).seal())
}

/// Traversal of a boxed storage by reference; null rows stay null.
pub fn build_over_items<T, B, F>(
    source: &ObjectStorage<T>,
    mut builder: B,
    ctx: &Context,
    mut f: F,
) -> Result<Storage, StoreError>
where
    T: TypedItem,
    B: Builder,
    F: FnMut(&mut B, usize, &T) -> Result<(), StoreError>,
{
    let len = crate::storage::StorageVariant::size(source);
    for_each_row(len, ctx, |i| match source.get(i) {
        Some(item) => f(&mut builder, i, item),
        None => {
            builder.append_nulls(1);
            Ok(())
        }
    })?;
    Ok(Box::new(builder).seal())
}

/// The operands of one row of a binary operation.
#[derive(Debug, Clone, PartialEq)]
pub enum Pair<T> {
    Both(T, T),
    /// Exactly one side has a value.
    Single(T),
    Nothing,
}

impl<T> Pair<T> {
    pub fn of(left: Option<T>, right: Option<T>) -> Self {
        match (left, right) {
            (Some(a), Some(b)) => Pair::Both(a, b),
            (Some(v), None) | (None, Some(v)) => Pair::Single(v),
            (None, None) => Pair::Nothing,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::LongBuilder;
    use crate::context::CancellationToken;
    use crate::types::IntegerType;

    #[test]
    fn test_long_traversal_preserves_nulls() {
        let source = LongStorage::from_options(vec![Some(1), None, Some(3)], IntegerType::INT_64);
        let ctx = Context::default();
        let out = build_over_longs(
            &source,
            LongBuilder::new(IntegerType::INT_64, 3),
            &ctx,
            |b, _, v| {
                b.append_long(v * 10);
                Ok(())
            },
        )
        .unwrap();
        assert_eq!(
            out.to_values(),
            vec![Value::Long(10), Value::Null, Value::Long(30)]
        );
    }

    #[test]
    fn test_cancellation_stops_the_loop() {
        let token = CancellationToken::new();
        token.cancel();
        let ctx = Context::with_token(token);
        let mut visited = 0;
        let result = for_each_row(5_000, &ctx, |_| {
            visited += 1;
            Ok(())
        });
        assert!(matches!(result, Err(StoreError::Cancelled)));
        assert!(visited < 5_000);
    }

    #[test]
    fn test_pair_classification() {
        assert_eq!(Pair::of(Some(1), Some(2)), Pair::Both(1, 2));
        assert_eq!(Pair::of(None, Some(2)), Pair::Single(2));
        assert_eq!(Pair::<i32>::of(None, None), Pair::Nothing);
    }
}

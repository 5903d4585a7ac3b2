//! Comparison and coalescing over date, date-time and time-of-day storages.
//!
//! Temporal values only order against values of the same kind, so every
//! operation here runs over boxed values.

use std::sync::OnceLock;

use crate::context::Context;
use crate::error::StoreError;
use crate::operation::map::{
    names, run_boxed_coalescing, run_boxed_comparison, Comparison, MapOperation, Operand,
    OperationRegistry,
};
use crate::problems::ProblemAggregator;
use crate::storage::Storage;

pub(crate) fn registry() -> &'static OperationRegistry {
    static REGISTRY: OnceLock<OperationRegistry> = OnceLock::new();
    REGISTRY.get_or_init(|| {
        let mut registry = OperationRegistry::new("datetime")
            .add(TemporalCoalescing { pick_greater: false })
            .add(TemporalCoalescing { pick_greater: true });
        for comparison in Comparison::ALL {
            registry = registry.add(TemporalComparison(comparison));
        }
        registry.built()
    })
}

pub struct TemporalComparison(pub Comparison);

impl MapOperation for TemporalComparison {
    fn name(&self) -> &'static str {
        self.0.name()
    }

    fn run(
        &self,
        storage: &Storage,
        arg: Operand<'_>,
        ctx: &Context,
        problems: &ProblemAggregator,
    ) -> Result<Storage, StoreError> {
        run_boxed_comparison(self.0, storage, arg, ctx, problems)
    }
}

pub struct TemporalCoalescing {
    pick_greater: bool,
}

impl MapOperation for TemporalCoalescing {
    fn name(&self) -> &'static str {
        if self.pick_greater {
            names::MAX
        } else {
            names::MIN
        }
    }

    fn run(
        &self,
        storage: &Storage,
        arg: Operand<'_>,
        ctx: &Context,
        problems: &ProblemAggregator,
    ) -> Result<Storage, StoreError> {
        run_boxed_coalescing(self.pick_greater, storage, arg, ctx, problems)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operation::map::{run_binary_map, run_zip};
    use crate::storage::ObjectStorage;
    use crate::types::{StorageType, Value};
    use chrono::NaiveDate;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_date_comparison_with_scalar() {
        let ctx = Context::default();
        let problems = ProblemAggregator::new();
        let dates = Storage::Date(ObjectStorage::new(vec![
            Some(date(2020, 1, 1)),
            None,
            Some(date(2024, 6, 30)),
        ]));
        let out = run_binary_map(
            &dates,
            names::GT,
            &Value::Date(date(2022, 1, 1)),
            &ctx,
            &problems,
        )
        .unwrap();
        assert_eq!(
            out.to_values(),
            vec![Value::Boolean(false), Value::Null, Value::Boolean(true)]
        );
    }

    #[test]
    fn test_date_max_keeps_type() {
        let ctx = Context::default();
        let problems = ProblemAggregator::new();
        let left = Storage::Date(ObjectStorage::new(vec![Some(date(2020, 1, 1)), None]));
        let right = Storage::Date(ObjectStorage::new(vec![Some(date(2021, 1, 1)), Some(date(1999, 1, 1))]));
        let out = run_zip(&left, names::MAX, &right, &ctx, &problems).unwrap();
        assert_eq!(out.storage_type(), StorageType::Date);
        assert_eq!(
            out.to_values(),
            vec![Value::Date(date(2021, 1, 1)), Value::Date(date(1999, 1, 1))]
        );
    }

    #[test]
    fn test_date_against_text_ordering_fails() {
        let ctx = Context::default();
        let problems = ProblemAggregator::new();
        let dates = Storage::Date(ObjectStorage::new(vec![Some(date(2020, 1, 1))]));
        let err = run_binary_map(&dates, names::LT, &Value::from("x"), &ctx, &problems).unwrap_err();
        assert!(matches!(err, StoreError::Incomparable { .. }));
    }
}

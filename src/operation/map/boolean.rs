//! Logic, comparison and coalescing over boolean storages.
//!
//! `&&` and `||` follow three-valued (Kleene) logic: a null operand only makes
//! the result null when the other operand does not already decide it.

use std::sync::OnceLock;

use crate::builder::{BoolBuilder, Builder};
use crate::context::Context;
use crate::error::StoreError;
use crate::operation::iterators::{for_each_row, Pair};
use crate::operation::map::{
    names, run_boxed_coalescing, run_boxed_comparison, Comparison, MapOperation, Operand,
    OperationRegistry,
};
use crate::problems::ProblemAggregator;
use crate::storage::{BoolStorage, Storage};
use crate::types::Value;

pub(crate) fn registry() -> &'static OperationRegistry {
    static REGISTRY: OnceLock<OperationRegistry> = OnceLock::new();
    REGISTRY.get_or_init(|| {
        let mut registry = OperationRegistry::new("boolean")
            .add(Logic::And)
            .add(Logic::Or)
            .add(BooleanCoalescing { pick_greater: false })
            .add(BooleanCoalescing { pick_greater: true });
        for comparison in Comparison::ALL {
            registry = registry.add(BooleanComparison(comparison));
        }
        registry.built()
    })
}

/// Whether every row of `arg` is a boolean or null.
fn is_boolean_operand(arg: &Operand<'_>) -> bool {
    match arg {
        Operand::Scalar(v) => matches!(v, Value::Boolean(_) | Value::Null),
        Operand::Column(s) => matches!(s, Storage::Bool(_) | Storage::Null(_)),
    }
}

//==================================================================================
// 1. Kleene Logic
//==================================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Logic {
    And,
    Or,
}

impl Logic {
    /// The value that decides the result on its own: `false` for AND, `true`
    /// for OR.
    fn dominant(self) -> bool {
        self == Logic::Or
    }

    pub fn apply(self, left: Option<bool>, right: Option<bool>) -> Option<bool> {
        let dominant = self.dominant();
        match (left, right) {
            (Some(a), _) if a == dominant => Some(dominant),
            (_, Some(b)) if b == dominant => Some(dominant),
            (Some(_), Some(_)) => Some(!dominant),
            _ => None,
        }
    }
}

impl MapOperation for Logic {
    fn name(&self) -> &'static str {
        match self {
            Logic::And => names::AND,
            Logic::Or => names::OR,
        }
    }

    fn run(
        &self,
        storage: &Storage,
        arg: Operand<'_>,
        ctx: &Context,
        _problems: &ProblemAggregator,
    ) -> Result<Storage, StoreError> {
        let left = Operand::column(storage);
        let len = storage.size();

        // A constant that decides every row needs no loop.
        if let Operand::Scalar(Value::Boolean(b)) = arg {
            if *b == self.dominant() {
                return Ok(Storage::Bool(BoolStorage::repeated(*b, len)));
            }
        }

        let mut builder = BoolBuilder::new(len);
        for_each_row(len, ctx, |i| {
            let result = self.apply(left.bool_at(i)?, arg.bool_at(i)?);
            builder.append_option(result);
            Ok(())
        })?;
        Ok(Storage::Bool(builder.finish()))
    }
}

//==================================================================================
// 2. Comparison & Coalescing
//==================================================================================

/// Orders booleans with `false < true`. Non-boolean arguments go through the
/// boxed comparison.
pub struct BooleanComparison(pub Comparison);

impl MapOperation for BooleanComparison {
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
        let len = storage.size();
        if arg.is_all_nothing() {
            return Ok(Storage::Bool(BoolStorage::make_empty(len)));
        }
        if !is_boolean_operand(&arg) {
            return run_boxed_comparison(self.0, storage, arg, ctx, problems);
        }
        let left = Operand::column(storage);
        let mut builder = BoolBuilder::new(len);
        for_each_row(len, ctx, |i| {
            let result = left
                .bool_at(i)?
                .zip(arg.bool_at(i)?)
                .map(|(a, b)| self.0.test(a.cmp(&b)));
            builder.append_option(result);
            Ok(())
        })?;
        Ok(Storage::Bool(builder.finish()))
    }
}

/// `min` is AND and `max` is OR once nulls are skipped.
pub struct BooleanCoalescing {
    pick_greater: bool,
}

impl MapOperation for BooleanCoalescing {
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
        if !is_boolean_operand(&arg) {
            return run_boxed_coalescing(self.pick_greater, storage, arg, ctx, problems);
        }
        let left = Operand::column(storage);
        let len = storage.size();
        let mut builder = BoolBuilder::new(len);
        for_each_row(len, ctx, |i| {
            let result = match Pair::of(left.bool_at(i)?, arg.bool_at(i)?) {
                Pair::Both(a, b) if self.pick_greater => Some(a || b),
                Pair::Both(a, b) => Some(a && b),
                Pair::Single(v) => Some(v),
                Pair::Nothing => None,
            };
            builder.append_option(result);
            Ok(())
        })?;
        Ok(Storage::Bool(builder.finish()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operation::map::{run_binary_map, run_zip};

    fn bools(values: &[Option<bool>]) -> Storage {
        Storage::Bool(BoolStorage::from_options(values.to_vec()))
    }

    fn as_options(storage: &Storage) -> Vec<Option<bool>> {
        storage
            .to_values()
            .into_iter()
            .map(|v| match v {
                Value::Boolean(b) => Some(b),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_kleene_truth_table() {
        let t = Some(true);
        let f = Some(false);
        assert_eq!(Logic::And.apply(f, None), f);
        assert_eq!(Logic::And.apply(t, None), None);
        assert_eq!(Logic::And.apply(t, t), t);
        assert_eq!(Logic::Or.apply(None, t), t);
        assert_eq!(Logic::Or.apply(None, f), None);
        assert_eq!(Logic::Or.apply(f, f), f);
    }

    #[test]
    fn test_zip_and_or() {
        let ctx = Context::default();
        let problems = ProblemAggregator::new();
        let left = bools(&[Some(true), Some(false), None, None]);
        let right = bools(&[Some(true), None, Some(false), Some(true)]);

        let and = run_zip(&left, names::AND, &right, &ctx, &problems).unwrap();
        assert_eq!(as_options(&and), vec![Some(true), Some(false), Some(false), None]);

        let or = run_zip(&left, names::OR, &right, &ctx, &problems).unwrap();
        assert_eq!(as_options(&or), vec![Some(true), None, None, Some(true)]);
    }

    #[test]
    fn test_short_circuit_constant() {
        let ctx = Context::default();
        let problems = ProblemAggregator::new();
        let left = bools(&[None, Some(true)]);
        let out = run_binary_map(&left, names::OR, &Value::Boolean(true), &ctx, &problems).unwrap();
        assert_eq!(as_options(&out), vec![Some(true), Some(true)]);
    }

    #[test]
    fn test_non_boolean_argument_is_an_error() {
        let ctx = Context::default();
        let problems = ProblemAggregator::new();
        let left = bools(&[Some(true)]);
        let err = run_binary_map(&left, names::AND, &Value::Long(1), &ctx, &problems).unwrap_err();
        assert!(matches!(err, StoreError::UnexpectedType(_)));
    }

    #[test]
    fn test_ordering_and_coalescing() {
        let ctx = Context::default();
        let problems = ProblemAggregator::new();
        let left = bools(&[Some(false), Some(true), None]);
        let lt = run_binary_map(&left, names::LT, &Value::Boolean(true), &ctx, &problems).unwrap();
        assert_eq!(as_options(&lt), vec![Some(true), Some(false), None]);

        let right = bools(&[Some(true), None, Some(false)]);
        let max = run_zip(&left, names::MAX, &right, &ctx, &problems).unwrap();
        assert_eq!(as_options(&max), vec![Some(true), Some(true), Some(false)]);
    }
}

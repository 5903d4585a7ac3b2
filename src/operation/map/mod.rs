//! Binary operations dispatched by symbolic name.
//!
//! Every storage family owns an [`OperationRegistry`], built once on first use
//! and shared afterwards. An operation receives its right-hand side as an
//! [`Operand`]: either a scalar or another storage. The two entry points
//! [`run_binary_map`] and [`run_zip`] resolve the registry, look the operation
//! up and run it. Results always have the left storage's length; a shorter
//! right storage reads as null past its end.

pub mod boolean;
pub mod datetime;
pub mod mixed;
pub mod null;
pub mod numeric;
pub mod text;

use std::cmp::Ordering;

use bigdecimal::BigDecimal;
use hashbrown::HashMap;
use num_bigint::BigInt;

use crate::builder::{BoolBuilder, Builder, InferredBuilder};
use crate::context::Context;
use crate::error::StoreError;
use crate::operation::iterators::{for_each_row, Pair};
use crate::problems::ProblemAggregator;
use crate::storage::{BoolStorage, Storage};
use crate::types::{NumericKind, StorageType, Value};

/// Operation names understood by the registries.
pub mod names {
    pub const EQ: &str = "==";
    pub const LT: &str = "<";
    pub const LTE: &str = "<=";
    pub const GT: &str = ">";
    pub const GTE: &str = ">=";
    pub const ADD: &str = "+";
    pub const SUB: &str = "-";
    pub const MUL: &str = "*";
    pub const DIV: &str = "/";
    pub const MOD: &str = "%";
    pub const POWER: &str = "^";
    pub const MIN: &str = "min";
    pub const MAX: &str = "max";
    pub const AND: &str = "&&";
    pub const OR: &str = "||";
    pub const STARTS_WITH: &str = "starts_with";
    pub const ENDS_WITH: &str = "ends_with";
    pub const CONTAINS: &str = "contains";
    pub const LIKE: &str = "LIKE";
    pub const TEXT_LEFT: &str = "text_left";
    pub const TEXT_RIGHT: &str = "text_right";
    pub const ROUND: &str = "round";
}

//==================================================================================
// 1. Operands
//==================================================================================

/// The right-hand side of a binary operation.
#[derive(Debug, Clone, Copy)]
pub enum Operand<'a> {
    Scalar(&'a Value),
    Column(&'a Storage),
}

impl<'a> Operand<'a> {
    /// Wraps a storage, looking through a mixed facade.
    pub fn column(storage: &'a Storage) -> Self {
        match storage {
            Storage::Facade(f) => Operand::Column(f.inner()),
            other => Operand::Column(other),
        }
    }

    /// True for a null scalar or a null-typed storage.
    pub fn is_all_nothing(&self) -> bool {
        match self {
            Operand::Scalar(v) => v.is_nothing(),
            Operand::Column(s) => matches!(s, Storage::Null(_)),
        }
    }

    /// The numeric kind every row of this operand has, if there is one.
    pub fn numeric_kind(&self) -> Option<NumericKind> {
        match self {
            Operand::Scalar(v) => NumericKind::of_value(v),
            Operand::Column(s) => NumericKind::of_type(&s.storage_type()),
        }
    }

    /// Whether rows have to be inspected one by one to learn their type.
    pub fn is_boxed(&self) -> bool {
        matches!(self, Operand::Column(Storage::Mixed(_)))
    }

    /// The value at `index`; null past the end of a storage.
    pub fn value_at(&self, index: usize) -> Value {
        match self {
            Operand::Scalar(v) => (*v).clone(),
            Operand::Column(s) if index < s.size() => s.item_at(index),
            Operand::Column(_) => Value::Null,
        }
    }

    #[inline]
    pub fn long_at(&self, index: usize) -> Option<i64> {
        match self {
            Operand::Column(Storage::Long(s)) => s.get(index),
            Operand::Scalar(Value::Long(v)) => Some(*v),
            _ => self.value_at(index).coerce_to_long(),
        }
    }

    #[inline]
    pub fn double_at(&self, index: usize) -> Option<f64> {
        match self {
            Operand::Column(Storage::Double(s)) => s.get(index),
            Operand::Column(Storage::Long(s)) => s.get(index).map(|v| v as f64),
            Operand::Scalar(v) => v.coerce_to_double(),
            _ => self.value_at(index).coerce_to_double(),
        }
    }

    pub fn big_integer_at(&self, index: usize) -> Option<BigInt> {
        match self {
            Operand::Column(Storage::BigInteger(s)) => s.get(index).cloned(),
            Operand::Column(Storage::Long(s)) => s.get(index).map(BigInt::from),
            _ => self.value_at(index).coerce_to_big_integer(),
        }
    }

    pub fn big_decimal_at(&self, index: usize) -> Option<BigDecimal> {
        match self {
            Operand::Column(Storage::BigDecimal(s)) => s.get(index).cloned(),
            _ => self.value_at(index).coerce_to_big_decimal(),
        }
    }

    /// The boolean at `index`. A non-null, non-boolean row is an error.
    pub fn bool_at(&self, index: usize) -> Result<Option<bool>, StoreError> {
        match self {
            Operand::Column(Storage::Bool(s)) => Ok(s.get(index)),
            _ => match self.value_at(index) {
                Value::Null => Ok(None),
                Value::Boolean(b) => Ok(Some(b)),
                _ => Err(StoreError::UnexpectedType("a Boolean".into())),
            },
        }
    }

    /// The text at `index`. A non-null, non-text row is an error.
    pub fn text_at(&self, index: usize) -> Result<Option<String>, StoreError> {
        match self {
            Operand::Column(Storage::Text(s)) => Ok(s.get(index).map(str::to_string)),
            _ => match self.value_at(index) {
                Value::Null => Ok(None),
                Value::Text(t) => Ok(Some(t)),
                _ => Err(StoreError::UnexpectedType("a Text".into())),
            },
        }
    }
}

//==================================================================================
// 2. Registry
//==================================================================================

pub trait MapOperation: Send + Sync {
    fn name(&self) -> &'static str;

    /// Runs the operation over every row of `storage`.
    fn run(
        &self,
        storage: &Storage,
        arg: Operand<'_>,
        ctx: &Context,
        problems: &ProblemAggregator,
    ) -> Result<Storage, StoreError>;
}

/// An immutable name-to-operation table for one storage family.
pub struct OperationRegistry {
    family: &'static str,
    ops: HashMap<&'static str, Box<dyn MapOperation>>,
}

impl OperationRegistry {
    pub(crate) fn new(family: &'static str) -> Self {
        Self {
            family,
            ops: HashMap::new(),
        }
    }

    pub(crate) fn add(mut self, op: impl MapOperation + 'static) -> Self {
        self.ops.insert(op.name(), Box::new(op));
        self
    }

    /// Logs the finished table; called once per family.
    pub(crate) fn built(self) -> Self {
        log::debug!(
            "Built '{}' operation registry with {} operations",
            self.family,
            self.ops.len()
        );
        self
    }

    pub fn family(&self) -> &'static str {
        self.family
    }

    pub fn is_supported(&self, name: &str) -> bool {
        self.ops.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<&dyn MapOperation> {
        self.ops.get(name).map(|op| op.as_ref())
    }

    /// Supported names, sorted.
    pub fn names(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.ops.keys().copied().collect();
        names.sort_unstable();
        names
    }
}

/// The registry of the family `storage` belongs to. A facade resolves to its
/// inner storage's registry.
pub fn registry_for(storage: &Storage) -> Option<&'static OperationRegistry> {
    Some(match storage {
        Storage::Long(_) | Storage::Double(_) | Storage::BigInteger(_) | Storage::BigDecimal(_) => {
            numeric::registry()
        }
        Storage::Bool(_) => boolean::registry(),
        Storage::Text(_) => text::registry(),
        Storage::Date(_) | Storage::DateTime(_) | Storage::TimeOfDay(_) => datetime::registry(),
        Storage::Null(_) => null::registry(),
        Storage::Mixed(_) => mixed::registry(),
        Storage::Facade(f) => return registry_for(f.inner()),
    })
}

pub(crate) fn dispatch(
    storage: &Storage,
    name: &str,
    arg: Operand<'_>,
    ctx: &Context,
    problems: &ProblemAggregator,
) -> Result<Storage, StoreError> {
    if let Storage::Facade(f) = storage {
        return dispatch(f.inner(), name, arg, ctx, problems);
    }
    let op = registry_for(storage)
        .and_then(|r| r.get(name))
        .ok_or_else(|| StoreError::unsupported_op(name, storage.storage_type()))?;
    log_metric!(
        "event" = "binary_op",
        "op" = name,
        "storage" = storage.storage_type(),
        "rows" = storage.size()
    );
    op.run(storage, arg, ctx, problems)
}

/// Applies operation `name` with a scalar right-hand side.
pub fn run_binary_map(
    storage: &Storage,
    name: &str,
    arg: &Value,
    ctx: &Context,
    problems: &ProblemAggregator,
) -> Result<Storage, StoreError> {
    dispatch(storage, name, Operand::Scalar(arg), ctx, problems)
}

/// Applies operation `name` row by row against `other`.
pub fn run_zip(
    storage: &Storage,
    name: &str,
    other: &Storage,
    ctx: &Context,
    problems: &ProblemAggregator,
) -> Result<Storage, StoreError> {
    dispatch(storage, name, Operand::column(other), ctx, problems)
}

/// Whether ternary operation `name` runs on `storage`. `round` is the only
/// ternary operation.
pub fn is_ternary_supported(storage: &Storage, name: &str) -> bool {
    name == names::ROUND && numeric::round::supports(storage)
}

/// Applies ternary operation `name` with two scalar arguments.
pub fn run_ternary_map(
    storage: &Storage,
    name: &str,
    arg0: &Value,
    arg1: &Value,
    ctx: &Context,
    problems: &ProblemAggregator,
) -> Result<Storage, StoreError> {
    if name != names::ROUND {
        return Err(StoreError::unsupported_op(name, storage.storage_type()));
    }
    numeric::round::round(storage, arg0, arg1, ctx, problems)
}

//==================================================================================
// 3. Shared Comparison & Coalescing Helpers
//==================================================================================

/// An ordering predicate: `==`, `<`, `<=`, `>` or `>=`.
#[derive(Debug, Clone, Copy)]
pub struct Comparison {
    name: &'static str,
    test: fn(Ordering) -> bool,
}

impl Comparison {
    pub const ALL: [Comparison; 5] = [
        Comparison { name: names::EQ, test: Ordering::is_eq },
        Comparison { name: names::LT, test: Ordering::is_lt },
        Comparison { name: names::LTE, test: Ordering::is_le },
        Comparison { name: names::GT, test: Ordering::is_gt },
        Comparison { name: names::GTE, test: Ordering::is_ge },
    ];

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn is_equality(&self) -> bool {
        self.name == names::EQ
    }

    #[inline]
    pub fn test(&self, ordering: Ordering) -> bool {
        (self.test)(ordering)
    }

    /// The result for two non-null values of unrelated kinds: `false` for
    /// equality, an error for ordering.
    pub fn on_incomparable(&self, left: &Value, right: &Value) -> Result<bool, StoreError> {
        if self.is_equality() {
            Ok(false)
        } else {
            Err(StoreError::Incomparable {
                left: left.type_name().to_string(),
                right: right.type_name().to_string(),
            })
        }
    }
}

/// Row-by-row comparison over boxed values with numeric promotion.
///
/// Equality is reported once per invocation when both sides are statically
/// numeric and promote to float, or else when any row pair promotes to float.
pub(crate) fn run_boxed_comparison(
    comparison: Comparison,
    storage: &Storage,
    arg: Operand<'_>,
    ctx: &Context,
    problems: &ProblemAggregator,
) -> Result<Storage, StoreError> {
    let len = storage.size();
    if arg.is_all_nothing() {
        return Ok(Storage::Bool(BoolStorage::make_empty(len)));
    }
    let static_kind = NumericKind::of_type(&storage.storage_type())
        .zip(arg.numeric_kind().filter(|_| !arg.is_boxed()))
        .map(|(l, r)| l.promote(r));
    let mut float_equality =
        comparison.is_equality() && static_kind == Some(NumericKind::Double);
    let mut builder = BoolBuilder::new(len);
    for_each_row(len, ctx, |i| {
        let (left, right) = (storage.item_at(i), arg.value_at(i));
        if left.is_nothing() || right.is_nothing() {
            builder.append_nulls(1);
            return Ok(());
        }
        if comparison.is_equality() && promotes_to_double(&left, &right) {
            float_equality = true;
        }
        let result = match left.compare(&right) {
            Some(ordering) => comparison.test(ordering),
            None => comparison.on_incomparable(&left, &right)?,
        };
        builder.append_boolean(result);
        Ok(())
    })?;
    if float_equality {
        problems.report_floating_point_equality(None);
    }
    Ok(Storage::Bool(builder.finish()))
}

fn promotes_to_double(left: &Value, right: &Value) -> bool {
    match (NumericKind::of_value(left), NumericKind::of_value(right)) {
        (Some(l), Some(r)) => l.promote(r) == NumericKind::Double,
        _ => false,
    }
}

/// Row-by-row coalescing `min` (`pick_greater == false`) or `max` over boxed
/// values. Incomparable pairs are an error.
pub(crate) fn run_boxed_coalescing(
    pick_greater: bool,
    storage: &Storage,
    arg: Operand<'_>,
    ctx: &Context,
    problems: &ProblemAggregator,
) -> Result<Storage, StoreError> {
    let mut builder = InferredBuilder::new(storage.size(), problems);
    for_each_row(storage.size(), ctx, |i| {
        let to_option = |v: Value| (!v.is_nothing()).then_some(v);
        let chosen = match Pair::of(to_option(storage.item_at(i)), to_option(arg.value_at(i))) {
            Pair::Both(a, b) => {
                let ordering = a.compare(&b).ok_or_else(|| StoreError::Incomparable {
                    left: a.type_name().to_string(),
                    right: b.type_name().to_string(),
                })?;
                if (ordering == Ordering::Less) == pick_greater {
                    b
                } else {
                    a
                }
            }
            Pair::Single(v) => v,
            Pair::Nothing => Value::Null,
        };
        builder.append(&chosen)
    })?;
    Ok(builder.finish())
}

/// Re-runs an operation on a mixed storage after specializing it to the
/// single type its values share, when there is one and that type's family
/// supports the operation.
pub(crate) fn specialize_mixed(
    storage: &Storage,
    name: &str,
    problems: &ProblemAggregator,
) -> Result<Option<Storage>, StoreError> {
    let inferred = storage.infer_precise_type();
    if matches!(inferred, StorageType::AnyObject | StorageType::Null) {
        return Ok(None);
    }
    let specialized_family = registry_for(&Storage::make_empty(inferred, 0));
    if !specialized_family.map_or(false, |r| r.is_supported(name)) {
        return Ok(None);
    }
    let mut builder = crate::builder::for_type(inferred, storage.size(), problems);
    builder.append_bulk_storage(storage)?;
    log_metric!("event" = "mixed_specialized", "op" = name, "to" = inferred);
    Ok(Some(builder.seal()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{LongStorage, ObjectStorage};
    use crate::types::IntegerType;

    #[test]
    fn test_registries_cover_their_names() {
        let longs = Storage::Long(LongStorage::from_options(vec![Some(1)], IntegerType::INT_64));
        let registry = registry_for(&longs).unwrap();
        assert_eq!(registry.family(), "numeric");
        for name in ["+", "-", "*", "/", "%", "^", "==", "<", "<=", ">", ">=", "min", "max"] {
            assert!(registry.is_supported(name), "{name}");
        }
        assert!(!registry.is_supported("LIKE"));
    }

    #[test]
    fn test_unknown_operation_is_structural_error() {
        let ctx = Context::default();
        let problems = ProblemAggregator::new();
        let longs = Storage::Long(LongStorage::from_options(vec![Some(1)], IntegerType::INT_64));
        let err = run_binary_map(&longs, "LIKE", &Value::from("a"), &ctx, &problems).unwrap_err();
        assert!(matches!(err, StoreError::UnsupportedOperation { .. }));
    }

    #[test]
    fn test_operand_reads_null_past_end() {
        let longs = Storage::Long(LongStorage::from_options(vec![Some(1)], IntegerType::INT_64));
        let op = Operand::column(&longs);
        assert_eq!(op.long_at(0), Some(1));
        assert_eq!(op.long_at(5), None);
        assert_eq!(op.value_at(5), Value::Null);
    }

    #[test]
    fn test_boxed_coalescing_min() {
        let ctx = Context::default();
        let problems = ProblemAggregator::new();
        let left = Storage::Mixed(ObjectStorage::new(vec![
            Some(Value::Long(3)),
            None,
            Some(Value::Long(1)),
            None,
        ]));
        let right = Storage::Mixed(ObjectStorage::new(vec![
            Some(Value::Long(2)),
            Some(Value::Long(5)),
            None,
            None,
        ]));
        let out = run_boxed_coalescing(false, &left, Operand::column(&right), &ctx, &problems).unwrap();
        assert_eq!(
            out.to_values(),
            vec![Value::Long(2), Value::Long(5), Value::Long(1), Value::Null]
        );
    }
}

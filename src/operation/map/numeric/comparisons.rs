//! Ordering predicates over numeric storages.

use std::cmp::Ordering;

use crate::builder::{BoolBuilder, Builder};
use crate::context::Context;
use crate::error::StoreError;
use crate::operation::iterators::for_each_row;
use crate::operation::map::{run_boxed_comparison, Comparison, MapOperation, Operand};
use crate::problems::ProblemAggregator;
use crate::storage::{BoolStorage, Storage};
use crate::types::NumericKind;

/// Compares at the promoted kind of both sides. NaN compares false to
/// everything, itself included.
pub struct NumericComparison(pub Comparison);

impl MapOperation for NumericComparison {
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
        let left = Operand::column(storage);
        let (Some(left_kind), Some(right_kind), false) =
            (left.numeric_kind(), arg.numeric_kind(), arg.is_boxed())
        else {
            return run_boxed_comparison(self.0, storage, arg, ctx, problems);
        };

        let kind = left_kind.promote(right_kind);
        let comparison = self.0;
        if kind == NumericKind::Double && comparison.is_equality() {
            problems.report_floating_point_equality(None);
        }
        let mut builder = BoolBuilder::new(len);
        for_each_row(len, ctx, |i| {
            let ordering: Option<Option<Ordering>> = match kind {
                NumericKind::Long => left
                    .long_at(i)
                    .zip(arg.long_at(i))
                    .map(|(a, b)| Some(a.cmp(&b))),
                NumericKind::BigInteger => left
                    .big_integer_at(i)
                    .zip(arg.big_integer_at(i))
                    .map(|(a, b)| Some(a.cmp(&b))),
                NumericKind::BigDecimal => left
                    .big_decimal_at(i)
                    .zip(arg.big_decimal_at(i))
                    .map(|(a, b)| Some(a.cmp(&b))),
                NumericKind::Double => left
                    .double_at(i)
                    .zip(arg.double_at(i))
                    .map(|(a, b)| a.partial_cmp(&b)),
            };
            match ordering {
                None => builder.append_nulls(1),
                Some(ordering) => {
                    builder.append_boolean(ordering.map_or(false, |o| comparison.test(o)));
                }
            }
            Ok(())
        })?;
        Ok(Storage::Bool(builder.finish()))
    }
}

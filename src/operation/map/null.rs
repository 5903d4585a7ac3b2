//! Operations on a storage holding only nulls.

use std::sync::OnceLock;

use crate::builder::BoolBuilder;
use crate::context::Context;
use crate::error::StoreError;
use crate::operation::iterators::for_each_row;
use crate::operation::map::boolean::Logic;
use crate::operation::map::{names, MapOperation, Operand, OperationRegistry};
use crate::problems::ProblemAggregator;
use crate::storage::{NullStorage, Storage};

/// Names whose result is null whatever the argument.
const NULL_PROPAGATING: [&str; 17] = [
    names::EQ,
    names::LT,
    names::LTE,
    names::GT,
    names::GTE,
    names::ADD,
    names::SUB,
    names::MUL,
    names::DIV,
    names::MOD,
    names::POWER,
    names::STARTS_WITH,
    names::ENDS_WITH,
    names::CONTAINS,
    names::LIKE,
    names::TEXT_LEFT,
    names::TEXT_RIGHT,
];

pub(crate) fn registry() -> &'static OperationRegistry {
    static REGISTRY: OnceLock<OperationRegistry> = OnceLock::new();
    REGISTRY.get_or_init(|| {
        let mut registry = OperationRegistry::new("null")
            .add(NullLogic(Logic::And))
            .add(NullLogic(Logic::Or))
            .add(NullCoalescing(names::MIN))
            .add(NullCoalescing(names::MAX));
        for name in NULL_PROPAGATING {
            registry = registry.add(AllNothing(name));
        }
        registry.built()
    })
}

pub struct AllNothing(&'static str);

impl MapOperation for AllNothing {
    fn name(&self) -> &'static str {
        self.0
    }

    fn run(
        &self,
        storage: &Storage,
        _arg: Operand<'_>,
        _ctx: &Context,
        _problems: &ProblemAggregator,
    ) -> Result<Storage, StoreError> {
        Ok(Storage::Null(NullStorage::new(storage.size())))
    }
}

/// `&&` / `||` with an all-null left side: the right side alone can still
/// decide a row.
pub struct NullLogic(Logic);

impl MapOperation for NullLogic {
    fn name(&self) -> &'static str {
        self.0.name()
    }

    fn run(
        &self,
        storage: &Storage,
        arg: Operand<'_>,
        ctx: &Context,
        _problems: &ProblemAggregator,
    ) -> Result<Storage, StoreError> {
        let len = storage.size();
        let mut builder = BoolBuilder::new(len);
        for_each_row(len, ctx, |i| {
            builder.append_option(self.0.apply(None, arg.bool_at(i)?));
            Ok(())
        })?;
        Ok(Storage::Bool(builder.finish()))
    }
}

/// `min` / `max`: the other side, resized to this storage's length.
pub struct NullCoalescing(&'static str);

impl MapOperation for NullCoalescing {
    fn name(&self) -> &'static str {
        self.0
    }

    fn run(
        &self,
        storage: &Storage,
        arg: Operand<'_>,
        ctx: &Context,
        problems: &ProblemAggregator,
    ) -> Result<Storage, StoreError> {
        let len = storage.size();
        match arg {
            Operand::Scalar(value) => Storage::from_repeated_item(value, len, ctx, problems),
            Operand::Column(other) if other.size() >= len => Ok(other.slice(0, len)),
            Operand::Column(other) => Ok(other.append_nulls(len - other.size())),
        }
    }
}

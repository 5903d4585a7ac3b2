//! Operations on mixed (boxed, type-erased) storages.
//!
//! A mixed storage whose values all share one type is first specialized to
//! that type and the operation is re-dispatched to its family. Otherwise the
//! operation runs row by row over boxed values, promoting numbers per row.

use std::sync::OnceLock;

use crate::builder::BoolBuilder;
use crate::context::Context;
use crate::error::StoreError;
use crate::operation::iterators::for_each_row;
use crate::operation::map::boolean::Logic;
use crate::operation::map::numeric::arithmetic::{
    run_boxed_arithmetic, Add, ArithmeticDefinition, Divide, Modulo, Multiply, Power, Subtract,
};
use crate::operation::map::{
    dispatch, names, run_boxed_coalescing, run_boxed_comparison, specialize_mixed, Comparison,
    MapOperation, Operand, OperationRegistry,
};
use crate::problems::ProblemAggregator;
use crate::storage::Storage;

pub(crate) fn registry() -> &'static OperationRegistry {
    static REGISTRY: OnceLock<OperationRegistry> = OnceLock::new();
    REGISTRY.get_or_init(|| {
        let arithmetic: [&'static dyn ArithmeticDefinition; 6] =
            [&Add, &Subtract, &Multiply, &Divide, &Modulo, &Power];
        let mut registry = OperationRegistry::new("mixed")
            .add(MixedOperation::new(names::MIN, Fallback::Coalesce { pick_greater: false }))
            .add(MixedOperation::new(names::MAX, Fallback::Coalesce { pick_greater: true }))
            .add(MixedOperation::new(names::AND, Fallback::Logic(Logic::And)))
            .add(MixedOperation::new(names::OR, Fallback::Logic(Logic::Or)));
        for comparison in Comparison::ALL {
            registry = registry.add(MixedOperation::new(
                comparison.name(),
                Fallback::Compare(comparison),
            ));
        }
        for def in arithmetic {
            registry = registry.add(MixedOperation::new(def.name(), Fallback::Arithmetic(def)));
        }
        for name in [
            names::STARTS_WITH,
            names::ENDS_WITH,
            names::CONTAINS,
            names::LIKE,
            names::TEXT_LEFT,
            names::TEXT_RIGHT,
        ] {
            registry = registry.add(MixedOperation::new(name, Fallback::SpecializedOnly));
        }
        registry.built()
    })
}

/// What to do when the storage cannot be specialized.
enum Fallback {
    Compare(Comparison),
    Coalesce { pick_greater: bool },
    Arithmetic(&'static dyn ArithmeticDefinition),
    Logic(Logic),
    /// No boxed form; only a storage specialized to a supporting type works.
    SpecializedOnly,
}

pub struct MixedOperation {
    name: &'static str,
    fallback: Fallback,
}

impl MixedOperation {
    fn new(name: &'static str, fallback: Fallback) -> Self {
        Self { name, fallback }
    }
}

impl MapOperation for MixedOperation {
    fn name(&self) -> &'static str {
        self.name
    }

    fn run(
        &self,
        storage: &Storage,
        arg: Operand<'_>,
        ctx: &Context,
        problems: &ProblemAggregator,
    ) -> Result<Storage, StoreError> {
        if let Some(specialized) = specialize_mixed(storage, self.name, problems)? {
            return dispatch(&specialized, self.name, arg, ctx, problems);
        }
        let len = storage.size();
        match &self.fallback {
            Fallback::Compare(comparison) => {
                run_boxed_comparison(*comparison, storage, arg, ctx, problems)
            }
            Fallback::Coalesce { pick_greater } => {
                run_boxed_coalescing(*pick_greater, storage, arg, ctx, problems)
            }
            Fallback::Arithmetic(def) => {
                run_boxed_arithmetic(*def, Operand::column(storage), arg, len, ctx, problems)
            }
            Fallback::Logic(logic) => {
                let left = Operand::column(storage);
                let mut builder = BoolBuilder::new(len);
                for_each_row(len, ctx, |i| {
                    builder.append_option(logic.apply(left.bool_at(i)?, arg.bool_at(i)?));
                    Ok(())
                })?;
                Ok(Storage::Bool(builder.finish()))
            }
            Fallback::SpecializedOnly => Err(StoreError::unsupported_op(
                self.name,
                storage.storage_type(),
            )),
        }
    }
}

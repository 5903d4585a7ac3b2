//! Arithmetic and coalescing numeric operations.

use bigdecimal::BigDecimal;
use num_bigint::BigInt;
use num_integer::Integer;
use num_traits::{One, Signed, ToPrimitive, Zero};

use crate::builder::{Builder, InferredBuilder};
use crate::context::Context;
use crate::error::StoreError;
use crate::operation::iterators::{for_each_row, Pair};
use crate::operation::map::numeric::{Computed, NumericSink};
use crate::operation::map::{names, MapOperation, Operand};
use crate::problems::ProblemAggregator;
use crate::storage::Storage;
use crate::types::{NumericKind, Value};

//==================================================================================
// 1. Definition Contract
//==================================================================================

/// The per-kind bodies of one arithmetic operation. Each body sees two
/// non-null operands already promoted to its kind.
pub trait ArithmeticDefinition: Send + Sync {
    fn name(&self) -> &'static str;

    fn do_long(&self, a: i64, b: i64, row: usize, problems: &ProblemAggregator) -> Computed;

    fn do_big_integer(
        &self,
        a: &BigInt,
        b: &BigInt,
        row: usize,
        problems: &ProblemAggregator,
    ) -> Computed;

    fn do_double(&self, a: f64, b: f64, row: usize, problems: &ProblemAggregator) -> Computed;

    fn do_big_decimal(
        &self,
        a: &BigDecimal,
        b: &BigDecimal,
        row: usize,
        problems: &ProblemAggregator,
    ) -> Computed;

    /// The kind results are collected in when the operands execute at `kind`
    /// and the right-hand side has kind `right`.
    fn result_kind(&self, kind: NumericKind, _right: Option<NumericKind>) -> NumericKind {
        kind
    }

    /// Coalescing operations return the non-null side when only one side is
    /// null, instead of null.
    fn is_coalescing(&self) -> bool {
        false
    }
}

//==================================================================================
// 2. Definitions
//==================================================================================

/// Integer `+`, `-` and `*` that overflow 64 bits produce a big integer.
macro_rules! exact_arithmetic {
    ($name:ident, $op_name:expr, $checked:ident, $op:tt) => {
        pub struct $name;

        impl ArithmeticDefinition for $name {
            fn name(&self) -> &'static str {
                $op_name
            }

            fn do_long(&self, a: i64, b: i64, _: usize, _: &ProblemAggregator) -> Computed {
                match a.$checked(b) {
                    Some(v) => Computed::Long(v),
                    None => Computed::BigInteger(BigInt::from(a) $op BigInt::from(b)),
                }
            }

            fn do_big_integer(&self, a: &BigInt, b: &BigInt, _: usize, _: &ProblemAggregator) -> Computed {
                Computed::BigInteger(a $op b)
            }

            fn do_double(&self, a: f64, b: f64, _: usize, _: &ProblemAggregator) -> Computed {
                Computed::Double(a $op b)
            }

            fn do_big_decimal(&self, a: &BigDecimal, b: &BigDecimal, _: usize, _: &ProblemAggregator) -> Computed {
                Computed::BigDecimal(a $op b)
            }
        }
    };
}

exact_arithmetic!(Add, names::ADD, checked_add, +);
exact_arithmetic!(Subtract, names::SUB, checked_sub, -);
exact_arithmetic!(Multiply, names::MUL, checked_mul, *);

/// `/`. Integral operands divide as floats; a zero integral divisor is
/// reported and yields null. Float division follows IEEE rules silently.
/// Decimal division is exact, or reported when the quotient does not
/// terminate.
pub struct Divide;

impl ArithmeticDefinition for Divide {
    fn name(&self) -> &'static str {
        names::DIV
    }

    fn do_long(&self, a: i64, b: i64, row: usize, problems: &ProblemAggregator) -> Computed {
        if b == 0 {
            problems.report_division_by_zero(row);
            return Computed::Nothing;
        }
        Computed::Double(a as f64 / b as f64)
    }

    fn do_big_integer(
        &self,
        a: &BigInt,
        b: &BigInt,
        row: usize,
        problems: &ProblemAggregator,
    ) -> Computed {
        if b.is_zero() {
            problems.report_division_by_zero(row);
            return Computed::Nothing;
        }
        match exact_divide(&BigDecimal::new(a.clone(), 0), &BigDecimal::new(b.clone(), 0)) {
            Some(q) => Computed::Double(q.to_f64().unwrap_or(f64::NAN)),
            None => Computed::Double(
                a.to_f64().unwrap_or(f64::NAN) / b.to_f64().unwrap_or(f64::NAN),
            ),
        }
    }

    fn do_double(&self, a: f64, b: f64, _: usize, _: &ProblemAggregator) -> Computed {
        Computed::Double(a / b)
    }

    fn do_big_decimal(
        &self,
        a: &BigDecimal,
        b: &BigDecimal,
        row: usize,
        problems: &ProblemAggregator,
    ) -> Computed {
        if b.is_zero() {
            problems.report_division_by_zero(row);
            return Computed::Nothing;
        }
        match exact_divide(a, b) {
            Some(q) => Computed::BigDecimal(q),
            None => {
                problems.report_arithmetic_error(
                    "Non-terminating decimal expansion; no exact representable decimal result. \
                     Divide with an explicit precision instead.",
                    row,
                );
                Computed::Nothing
            }
        }
    }

    fn result_kind(&self, kind: NumericKind, _right: Option<NumericKind>) -> NumericKind {
        if kind.is_integral() {
            NumericKind::Double
        } else {
            kind
        }
    }
}

/// `%`, truncating toward zero like the quotient. Zero divisors are reported
/// for every kind except float, which yields NaN.
pub struct Modulo;

impl ArithmeticDefinition for Modulo {
    fn name(&self) -> &'static str {
        names::MOD
    }

    fn do_long(&self, a: i64, b: i64, row: usize, problems: &ProblemAggregator) -> Computed {
        if b == 0 {
            problems.report_division_by_zero(row);
            return Computed::Nothing;
        }
        Computed::Long(a.wrapping_rem(b))
    }

    fn do_big_integer(
        &self,
        a: &BigInt,
        b: &BigInt,
        row: usize,
        problems: &ProblemAggregator,
    ) -> Computed {
        if b.is_zero() {
            problems.report_division_by_zero(row);
            return Computed::Nothing;
        }
        Computed::BigInteger(a % b)
    }

    fn do_double(&self, a: f64, b: f64, _: usize, _: &ProblemAggregator) -> Computed {
        Computed::Double(a % b)
    }

    fn do_big_decimal(
        &self,
        a: &BigDecimal,
        b: &BigDecimal,
        row: usize,
        problems: &ProblemAggregator,
    ) -> Computed {
        if b.is_zero() {
            problems.report_division_by_zero(row);
            return Computed::Nothing;
        }
        Computed::BigDecimal(a % b)
    }
}

/// `^`. Floating point, except that a decimal base raised to an integral
/// exponent stays exact.
pub struct Power;

/// Exponents above this are computed in floating point.
const MAX_EXACT_EXPONENT: u32 = 999_999_999;

impl ArithmeticDefinition for Power {
    fn name(&self) -> &'static str {
        names::POWER
    }

    fn do_long(&self, a: i64, b: i64, _: usize, _: &ProblemAggregator) -> Computed {
        Computed::Double((a as f64).powf(b as f64))
    }

    fn do_big_integer(&self, a: &BigInt, b: &BigInt, _: usize, _: &ProblemAggregator) -> Computed {
        let base = a.to_f64().unwrap_or(f64::NAN);
        Computed::Double(base.powf(b.to_f64().unwrap_or(f64::NAN)))
    }

    fn do_double(&self, a: f64, b: f64, _: usize, _: &ProblemAggregator) -> Computed {
        Computed::Double(a.powf(b))
    }

    fn do_big_decimal(
        &self,
        a: &BigDecimal,
        b: &BigDecimal,
        _: usize,
        _: &ProblemAggregator,
    ) -> Computed {
        let exponent = b.is_integer().then(|| b.to_u32()).flatten();
        match exponent {
            Some(n) if n <= MAX_EXACT_EXPONENT => Computed::BigDecimal(decimal_pow(a, n)),
            _ => {
                let base = a.to_f64().unwrap_or(f64::NAN);
                Computed::Double(base.powf(b.to_f64().unwrap_or(f64::NAN)))
            }
        }
    }

    fn result_kind(&self, kind: NumericKind, right: Option<NumericKind>) -> NumericKind {
        match (kind, right) {
            (NumericKind::BigDecimal, Some(r)) if r.is_integral() => NumericKind::BigDecimal,
            _ => NumericKind::Double,
        }
    }
}

macro_rules! coalescing {
    ($name:ident, $op_name:expr, $pick:ident) => {
        pub struct $name;

        impl ArithmeticDefinition for $name {
            fn name(&self) -> &'static str {
                $op_name
            }

            fn do_long(&self, a: i64, b: i64, _: usize, _: &ProblemAggregator) -> Computed {
                Computed::Long(a.$pick(b))
            }

            fn do_big_integer(&self, a: &BigInt, b: &BigInt, _: usize, _: &ProblemAggregator) -> Computed {
                Computed::BigInteger(a.$pick(b).clone())
            }

            fn do_double(&self, a: f64, b: f64, _: usize, _: &ProblemAggregator) -> Computed {
                Computed::Double(a.$pick(b))
            }

            fn do_big_decimal(&self, a: &BigDecimal, b: &BigDecimal, _: usize, _: &ProblemAggregator) -> Computed {
                Computed::BigDecimal(a.$pick(b).clone())
            }

            fn is_coalescing(&self) -> bool {
                true
            }
        }
    };
}

coalescing!(Min, names::MIN, min);
coalescing!(Max, names::MAX, max);

//==================================================================================
// 3. Decimal Helpers
//==================================================================================

/// `a / b` when the quotient has a finite decimal expansion, `None` otherwise.
/// `b` must be non-zero.
pub(crate) fn exact_divide(a: &BigDecimal, b: &BigDecimal) -> Option<BigDecimal> {
    let (a_digits, a_scale) = a.as_bigint_and_exponent();
    let (b_digits, b_scale) = b.as_bigint_and_exponent();
    if b_digits.is_zero() {
        return None;
    }
    let gcd = a_digits.gcd(&b_digits);
    let (mut numerator, mut denominator) = (a_digits / &gcd, b_digits / &gcd);
    if denominator.is_negative() {
        numerator = -numerator;
        denominator = -denominator;
    }

    // The quotient terminates iff the reduced denominator is 2^x * 5^y.
    let two = BigInt::from(2u8);
    let five = BigInt::from(5u8);
    let mut twos = 0u32;
    while denominator.is_multiple_of(&two) {
        denominator /= &two;
        twos += 1;
    }
    let mut fives = 0u32;
    while denominator.is_multiple_of(&five) {
        denominator /= &five;
        fives += 1;
    }
    if !denominator.is_one() {
        return None;
    }

    let k = twos.max(fives);
    let scaled = numerator * two.pow(k - twos) * five.pow(k - fives);
    Some(BigDecimal::new(scaled, a_scale - b_scale + i64::from(k)))
}

fn decimal_pow(base: &BigDecimal, exponent: u32) -> BigDecimal {
    let mut result = BigDecimal::one();
    let mut square = base.clone();
    let mut n = exponent;
    while n > 0 {
        if n & 1 == 1 {
            result = &result * &square;
        }
        n >>= 1;
        if n > 0 {
            square = &square * &square;
        }
    }
    result
}

//==================================================================================
// 4. Runners
//==================================================================================

/// A registry entry running an [`ArithmeticDefinition`] over numeric storages.
pub struct NumericArithmetic<D>(pub D);

impl<D: ArithmeticDefinition> MapOperation for NumericArithmetic<D> {
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
        let left = Operand::column(storage);
        if arg.is_boxed() {
            return run_boxed_arithmetic(&self.0, left, arg, storage.size(), ctx, problems);
        }
        let left_kind = left
            .numeric_kind()
            .ok_or_else(|| StoreError::unsupported_op(self.0.name(), storage.storage_type()))?;
        run_typed_arithmetic(&self.0, left_kind, left, arg, storage.size(), ctx, problems)
    }
}

fn combine<T>(
    left: Option<T>,
    right: Option<T>,
    coalescing: bool,
    single: impl FnOnce(T) -> Computed,
    both: impl FnOnce(T, T) -> Computed,
) -> Computed {
    match Pair::of(left, right) {
        Pair::Both(a, b) => both(a, b),
        Pair::Single(v) if coalescing => single(v),
        _ => Computed::Nothing,
    }
}

/// The unboxed path: both sides have a statically known numeric kind.
fn run_typed_arithmetic<D: ArithmeticDefinition + ?Sized>(
    def: &D,
    left_kind: NumericKind,
    left: Operand<'_>,
    right: Operand<'_>,
    len: usize,
    ctx: &Context,
    problems: &ProblemAggregator,
) -> Result<Storage, StoreError> {
    let right_kind = match right.numeric_kind() {
        Some(kind) => Some(kind),
        None if right.is_all_nothing() => None,
        None => return Err(StoreError::UnexpectedType("a Number".into())),
    };
    if right_kind.is_none() && !def.is_coalescing() {
        let kind = def.result_kind(left_kind, None);
        return Ok(Storage::make_empty(kind.storage_type(), len));
    }

    let kind = right_kind.map_or(left_kind, |r| left_kind.promote(r));
    let mut sink = NumericSink::for_kind(def.result_kind(kind, right_kind), len);
    let coalescing = def.is_coalescing();
    for_each_row(len, ctx, |i| {
        let computed = match kind {
            NumericKind::Long => combine(
                left.long_at(i),
                right.long_at(i),
                coalescing,
                Computed::Long,
                |a, b| def.do_long(a, b, i, problems),
            ),
            NumericKind::Double => combine(
                left.double_at(i),
                right.double_at(i),
                coalescing,
                Computed::Double,
                |a, b| def.do_double(a, b, i, problems),
            ),
            NumericKind::BigInteger => combine(
                left.big_integer_at(i),
                right.big_integer_at(i),
                coalescing,
                Computed::BigInteger,
                |a, b| def.do_big_integer(&a, &b, i, problems),
            ),
            NumericKind::BigDecimal => combine(
                left.big_decimal_at(i),
                right.big_decimal_at(i),
                coalescing,
                Computed::BigDecimal,
                |a, b| def.do_big_decimal(&a, &b, i, problems),
            ),
        };
        sink.push(computed)
    })?;
    Ok(sink.finish())
}

/// The boxed fallback: every row is promoted on its own and the result type
/// is inferred from the produced values.
pub(crate) fn run_boxed_arithmetic<D: ArithmeticDefinition + ?Sized>(
    def: &D,
    left: Operand<'_>,
    right: Operand<'_>,
    len: usize,
    ctx: &Context,
    problems: &ProblemAggregator,
) -> Result<Storage, StoreError> {
    let mut builder = InferredBuilder::new(len, problems);
    for_each_row(len, ctx, |i| {
        let to_option = |v: Value| (!v.is_nothing()).then_some(v);
        let result = match Pair::of(to_option(left.value_at(i)), to_option(right.value_at(i))) {
            Pair::Both(a, b) => compute_boxed(def, &a, &b, i, problems)?.into_value(),
            Pair::Single(v) if def.is_coalescing() => v,
            _ => Value::Null,
        };
        builder.append(&result)
    })?;
    Ok(builder.finish())
}

fn compute_boxed<D: ArithmeticDefinition + ?Sized>(
    def: &D,
    a: &Value,
    b: &Value,
    row: usize,
    problems: &ProblemAggregator,
) -> Result<Computed, StoreError> {
    let not_a_number = || StoreError::UnexpectedType("a Number".into());
    let kind = match (NumericKind::of_value(a), NumericKind::of_value(b)) {
        (Some(l), Some(r)) => l.promote(r),
        _ => return Err(not_a_number()),
    };
    Ok(match kind {
        NumericKind::Long => def.do_long(
            a.coerce_to_long().ok_or_else(not_a_number)?,
            b.coerce_to_long().ok_or_else(not_a_number)?,
            row,
            problems,
        ),
        NumericKind::Double => def.do_double(
            a.coerce_to_double().ok_or_else(not_a_number)?,
            b.coerce_to_double().ok_or_else(not_a_number)?,
            row,
            problems,
        ),
        NumericKind::BigInteger => def.do_big_integer(
            &a.coerce_to_big_integer().ok_or_else(not_a_number)?,
            &b.coerce_to_big_integer().ok_or_else(not_a_number)?,
            row,
            problems,
        ),
        NumericKind::BigDecimal => def.do_big_decimal(
            &a.coerce_to_big_decimal().ok_or_else(not_a_number)?,
            &b.coerce_to_big_decimal().ok_or_else(not_a_number)?,
            row,
            problems,
        ),
    })
}

//==================================================================================
// 5. Unit Tests
//==================================================================================

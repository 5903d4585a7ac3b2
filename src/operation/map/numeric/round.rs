//! `round(decimal_places, use_bankers)` over integer, float and decimal
//! storages.
//!
//! A tie rounds away from zero, or to the even neighbour when `use_bankers`
//! is set. Negative decimal places round to tens, hundreds and so on.

use std::cmp::Ordering;

use bigdecimal::BigDecimal;
use num_bigint::BigInt;
use num_integer::Integer;
use num_traits::{Signed, Zero};

use crate::builder::{DoubleBuilder, LongBuilder, ObjectBuilder};
use crate::context::Context;
use crate::error::StoreError;
use crate::operation::iterators::{build_over_doubles, build_over_items, build_over_longs};
use crate::operation::map::names;
use crate::problems::ProblemAggregator;
use crate::storage::{DoubleStorage, LongStorage, Storage};
use crate::types::{IntegerType, Value};

pub const MIN_DECIMAL_PLACES: i64 = -15;
pub const MAX_DECIMAL_PLACES: i64 = 15;

/// Integers beyond this magnitude are not rounded.
pub const LONG_ROUNDING_BOUND: i64 = 99_999_999_999_999;

pub fn supports(storage: &Storage) -> bool {
    match storage {
        Storage::Long(_) | Storage::Double(_) | Storage::BigDecimal(_) | Storage::Null(_) => true,
        Storage::Facade(f) => supports(f.inner()),
        _ => false,
    }
}

/// Rounds every row of `storage`. The arguments must be a `Long` number of
/// decimal places within [`MIN_DECIMAL_PLACES`, `MAX_DECIMAL_PLACES`] and a
/// `Boolean`.
pub fn round(
    storage: &Storage,
    decimal_places: &Value,
    use_bankers: &Value,
    ctx: &Context,
    problems: &ProblemAggregator,
) -> Result<Storage, StoreError> {
    let places = match decimal_places {
        Value::Long(p) if (MIN_DECIMAL_PLACES..=MAX_DECIMAL_PLACES).contains(p) => *p,
        Value::Long(p) => {
            return Err(StoreError::UnexpectedType(format!(
                "decimal places between {MIN_DECIMAL_PLACES} and {MAX_DECIMAL_PLACES}, got {p}"
            )))
        }
        _ => return Err(StoreError::UnexpectedType("a Long for the decimal places".into())),
    };
    let &Value::Boolean(bankers) = use_bankers else {
        return Err(StoreError::UnexpectedType("a Boolean for `use_bankers`".into()));
    };
    log_metric!(
        "event" = "ternary_op",
        "op" = names::ROUND,
        "storage" = storage.storage_type(),
        "decimal_places" = places
    );
    match storage {
        Storage::Facade(f) => round(f.inner(), decimal_places, use_bankers, ctx, problems),
        Storage::Null(_) => Ok(storage.clone()),
        Storage::Long(s) => round_longs(s, places, bankers, ctx, problems),
        Storage::Double(s) => round_doubles(s, places, bankers, ctx, problems),
        Storage::BigDecimal(s) => {
            let builder = ObjectBuilder::<BigDecimal>::new(storage.size());
            build_over_items(s, builder, ctx, |b, _, v| {
                b.append_item(round_decimal(v, places, bankers));
                Ok(())
            })
        }
        other => Err(StoreError::unsupported_op(names::ROUND, other.storage_type())),
    }
}

//==================================================================================
// 1. Integers
//==================================================================================

fn round_longs(
    storage: &LongStorage,
    places: i64,
    bankers: bool,
    ctx: &Context,
    problems: &ProblemAggregator,
) -> Result<Storage, StoreError> {
    if places >= 0 {
        return Ok(Storage::Long(storage.clone()));
    }
    let len = storage.raw_values().len();
    build_over_longs(storage, LongBuilder::new(IntegerType::INT_64, len), ctx, |b, i, v| {
        if (-LONG_ROUNDING_BOUND..=LONG_ROUNDING_BOUND).contains(&v) {
            b.append_long(round_long(v, places, bankers));
        } else {
            problems.report_illegal_argument(
                format!(
                    "`round` can only accept values between {} and {} (inclusive), but was {v}",
                    -LONG_ROUNDING_BOUND, LONG_ROUNDING_BOUND
                ),
                i,
            );
            b.append_option(None);
        }
        Ok(())
    })
}

/// Whether a truncated quotient moves one step away from zero, given twice
/// the remainder's magnitude compared to the divisor.
fn rounds_away(twice_remainder: Ordering, quotient_is_odd: bool, bankers: bool) -> bool {
    match twice_remainder {
        Ordering::Greater => true,
        Ordering::Equal => !bankers || quotient_is_odd,
        Ordering::Less => false,
    }
}

/// `places` is negative and `value` within [`LONG_ROUNDING_BOUND`].
fn round_long(value: i64, places: i64, bankers: bool) -> i64 {
    let scale = 10i64.pow(places.unsigned_abs() as u32);
    let (quotient, remainder) = (value / scale, value % scale);
    let away = rounds_away((remainder.abs() * 2).cmp(&scale), quotient % 2 != 0, bankers);
    let quotient = if away { quotient + value.signum() } else { quotient };
    quotient * scale
}

//==================================================================================
// 2. Floats
//==================================================================================

fn round_doubles(
    storage: &DoubleStorage,
    places: i64,
    bankers: bool,
    ctx: &Context,
    problems: &ProblemAggregator,
) -> Result<Storage, StoreError> {
    let len = storage.raw_values().len();
    let special = |v: f64, i: usize| {
        problems.report_arithmetic_error(format!("Value is {v}"), i);
    };
    if places > 0 {
        return build_over_doubles(storage, DoubleBuilder::new(len), ctx, |b, i, v| {
            if v.is_finite() {
                b.append_double(round_double(v, places, bankers));
            } else {
                special(v, i);
                b.append_option(None);
            }
            Ok(())
        });
    }
    build_over_doubles(storage, LongBuilder::new(IntegerType::INT_64, len), ctx, |b, i, v| {
        if !v.is_finite() {
            special(v, i);
            b.append_option(None);
            return Ok(());
        }
        let rounded = round_double(v, places, bankers);
        if IntegerType::INT_64.fits_double(rounded) {
            b.append_long(rounded as i64);
        } else {
            problems.report_number_out_of_range(&Value::Double(rounded));
            b.append_option(None);
        }
        Ok(())
    })
}

/// Rounds in the scaled domain, deciding ties against the unscaled midpoint.
fn round_double(value: f64, places: i64, bankers: bool) -> f64 {
    let scale = 10f64.powi(places as i32);
    let base = (value * scale).floor();
    let midpoint = (base + 0.5) / scale;
    let half_goes_up = if bankers {
        base.rem_euclid(2.0) != 0.0
    } else {
        value >= 0.0
    };
    let round_up = if half_goes_up {
        value >= midpoint
    } else {
        value > midpoint
    };
    let rounded = if round_up { (base + 1.0) / scale } else { base / scale };
    // -0.0 becomes 0.0
    rounded + 0.0
}

//==================================================================================
// 3. Decimals
//==================================================================================

fn round_decimal(value: &BigDecimal, places: i64, bankers: bool) -> BigDecimal {
    let (digits, scale) = value.as_bigint_and_exponent();
    if scale <= places {
        return value.clone();
    }
    let Ok(shift) = u32::try_from(scale - places) else {
        return BigDecimal::zero();
    };
    let divisor = BigInt::from(10u32).pow(shift);
    let (quotient, remainder) = digits.div_rem(&divisor);
    let twice: BigInt = remainder.abs() * 2u32;
    let quotient = if rounds_away(twice.cmp(&divisor), quotient.is_odd(), bankers) {
        quotient + digits.signum()
    } else {
        quotient
    };
    BigDecimal::new(quotient, places)
}

//! Comparison, concatenation, matching and slicing over text storages.
//!
//! Text compares by code point and is matched literally; lengths and offsets
//! count characters, not bytes.

use std::sync::OnceLock;

use num_traits::Signed;
use regex::{Regex, RegexBuilder};

use crate::builder::{BoolBuilder, Builder, TextBuilder};
use crate::context::Context;
use crate::error::StoreError;
use crate::operation::iterators::{for_each_row, Pair};
use crate::operation::map::{
    names, run_boxed_coalescing, run_boxed_comparison, Comparison, MapOperation, Operand,
    OperationRegistry,
};
use crate::problems::ProblemAggregator;
use crate::storage::{BoolStorage, Storage};
use crate::types::{StorageType, TextType, Value};

pub(crate) fn registry() -> &'static OperationRegistry {
    static REGISTRY: OnceLock<OperationRegistry> = OnceLock::new();
    REGISTRY.get_or_init(|| {
        let mut registry = OperationRegistry::new("text")
            .add(Concat)
            .add(TextCoalescing { pick_greater: false })
            .add(TextCoalescing { pick_greater: true })
            .add(TextPredicate::StartsWith)
            .add(TextPredicate::EndsWith)
            .add(TextPredicate::Contains)
            .add(Like)
            .add(TextSlice { from_right: false })
            .add(TextSlice { from_right: true });
        for comparison in Comparison::ALL {
            registry = registry.add(TextComparison(comparison));
        }
        registry.built()
    })
}

fn text_type_of(storage: &Storage) -> TextType {
    match storage.storage_type() {
        StorageType::Text(t) => t,
        _ => TextType::VARIABLE_LENGTH,
    }
}

/// The text type every row of `arg` has, or `None` if `arg` is not text.
fn operand_text_type(arg: &Operand<'_>) -> Option<TextType> {
    match arg {
        Operand::Scalar(Value::Text(t)) => Some(TextType::fixed_length(t.chars().count())),
        Operand::Column(Storage::Text(s)) => Some(s.text_type()),
        _ => None,
    }
}

//==================================================================================
// 1. Comparison & Coalescing
//==================================================================================

pub struct TextComparison(pub Comparison);

impl MapOperation for TextComparison {
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
        if operand_text_type(&arg).is_none() {
            return run_boxed_comparison(self.0, storage, arg, ctx, problems);
        }
        let left = Operand::column(storage);
        let mut builder = BoolBuilder::new(len);
        for_each_row(len, ctx, |i| {
            let result = left
                .text_at(i)?
                .zip(arg.text_at(i)?)
                .map(|(a, b)| self.0.test(a.cmp(&b)));
            builder.append_option(result);
            Ok(())
        })?;
        Ok(Storage::Bool(builder.finish()))
    }
}

pub struct TextCoalescing {
    pick_greater: bool,
}

impl MapOperation for TextCoalescing {
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
        let left_type = text_type_of(storage);
        let result_type = match operand_text_type(&arg) {
            Some(right_type) => TextType::max_type(&left_type, &right_type),
            None if arg.is_all_nothing() => left_type,
            None => return run_boxed_coalescing(self.pick_greater, storage, arg, ctx, problems),
        };
        let left = Operand::column(storage);
        let len = storage.size();
        let mut builder = TextBuilder::new(result_type, len);
        for_each_row(len, ctx, |i| {
            match Pair::of(left.text_at(i)?, arg.text_at(i)?) {
                Pair::Both(a, b) => {
                    let greater = b > a;
                    builder.append_string(if greater == self.pick_greater { b } else { a })
                }
                Pair::Single(v) => builder.append_string(v),
                Pair::Nothing => builder.append_nulls(1),
            }
            Ok(())
        })?;
        Ok(Storage::Text(builder.finish()))
    }
}

//==================================================================================
// 2. Concatenation
//==================================================================================

/// `+`: appends the right-hand text. A null on either side gives null.
pub struct Concat;

impl MapOperation for Concat {
    fn name(&self) -> &'static str {
        names::ADD
    }

    fn run(
        &self,
        storage: &Storage,
        arg: Operand<'_>,
        ctx: &Context,
        _problems: &ProblemAggregator,
    ) -> Result<Storage, StoreError> {
        let left_type = text_type_of(storage);
        let len = storage.size();
        let right_type = match operand_text_type(&arg) {
            Some(t) => t,
            None if arg.is_all_nothing() => {
                return Ok(Storage::make_empty(StorageType::Text(left_type), len))
            }
            None if arg.is_boxed() => TextType::VARIABLE_LENGTH,
            None => return Err(StoreError::UnexpectedType("a Text".into())),
        };
        let left = Operand::column(storage);
        let mut builder = TextBuilder::new(TextType::concat_types(&left_type, &right_type), len);
        for_each_row(len, ctx, |i| {
            match left.text_at(i)?.zip(arg.text_at(i)?) {
                Some((mut a, b)) => {
                    a.push_str(&b);
                    builder.append_string(a);
                }
                None => builder.append_nulls(1),
            }
            Ok(())
        })?;
        Ok(Storage::Text(builder.finish()))
    }
}

//==================================================================================
// 3. Matching
//==================================================================================

#[derive(Debug, Clone, Copy)]
pub enum TextPredicate {
    StartsWith,
    EndsWith,
    Contains,
}

impl TextPredicate {
    fn test(self, text: &str, needle: &str) -> bool {
        match self {
            TextPredicate::StartsWith => text.starts_with(needle),
            TextPredicate::EndsWith => text.ends_with(needle),
            TextPredicate::Contains => text.contains(needle),
        }
    }
}

impl MapOperation for TextPredicate {
    fn name(&self) -> &'static str {
        match self {
            TextPredicate::StartsWith => names::STARTS_WITH,
            TextPredicate::EndsWith => names::ENDS_WITH,
            TextPredicate::Contains => names::CONTAINS,
        }
    }

    fn run(
        &self,
        storage: &Storage,
        arg: Operand<'_>,
        ctx: &Context,
        _problems: &ProblemAggregator,
    ) -> Result<Storage, StoreError> {
        let len = storage.size();
        if arg.is_all_nothing() {
            return Ok(Storage::Bool(BoolStorage::make_empty(len)));
        }
        let left = Operand::column(storage);
        let mut builder = BoolBuilder::new(len);
        for_each_row(len, ctx, |i| {
            let result = left
                .text_at(i)?
                .zip(arg.text_at(i)?)
                .map(|(text, needle)| self.test(&text, &needle));
            builder.append_option(result);
            Ok(())
        })?;
        Ok(Storage::Bool(builder.finish()))
    }
}

/// Translates a SQL LIKE pattern into an anchored regular expression: `%`
/// matches any run of characters, `_` exactly one, everything else itself.
pub fn like_regex(pattern: &str) -> Result<Regex, StoreError> {
    let mut expression = String::with_capacity(pattern.len() + 8);
    expression.push('^');
    let mut literal = [0u8; 4];
    for c in pattern.chars() {
        match c {
            '%' => expression.push_str(".*"),
            '_' => expression.push('.'),
            other => expression.push_str(&regex::escape(other.encode_utf8(&mut literal))),
        }
    }
    expression.push('$');
    Ok(RegexBuilder::new(&expression)
        .dot_matches_new_line(true)
        .build()?)
}

pub struct Like;

impl MapOperation for Like {
    fn name(&self) -> &'static str {
        names::LIKE
    }

    fn run(
        &self,
        storage: &Storage,
        arg: Operand<'_>,
        ctx: &Context,
        _problems: &ProblemAggregator,
    ) -> Result<Storage, StoreError> {
        let len = storage.size();
        if arg.is_all_nothing() {
            return Ok(Storage::Bool(BoolStorage::make_empty(len)));
        }
        let left = Operand::column(storage);
        let mut builder = BoolBuilder::new(len);

        // Consecutive rows usually share a pattern; recompile only on change.
        let mut compiled: Option<(String, Regex)> = None;
        for_each_row(len, ctx, |i| {
            let (Some(text), Some(pattern)) = (left.text_at(i)?, arg.text_at(i)?) else {
                builder.append_nulls(1);
                return Ok(());
            };
            let regex = match compiled.take() {
                Some((p, regex)) if p == pattern => regex,
                _ => like_regex(&pattern)?,
            };
            builder.append_boolean(regex.is_match(&text));
            compiled = Some((pattern, regex));
            Ok(())
        })?;
        Ok(Storage::Bool(builder.finish()))
    }
}

//==================================================================================
// 4. Slicing
//==================================================================================

/// `text_left` / `text_right`: the first or last `n` characters. A negative
/// count gives the empty text.
pub struct TextSlice {
    from_right: bool,
}

/// Reads a character count; counts beyond the 64-bit range saturate.
fn count_at(arg: &Operand<'_>, index: usize) -> Result<Option<i64>, StoreError> {
    match arg.value_at(index) {
        Value::Null => Ok(None),
        Value::Long(n) => Ok(Some(n)),
        Value::BigInteger(n) if n.is_negative() => Ok(Some(i64::MIN)),
        Value::BigInteger(_) => Ok(Some(i64::MAX)),
        _ => Err(StoreError::UnexpectedType("an Integer".into())),
    }
}

impl TextSlice {
    fn take(&self, text: &str, n: i64) -> String {
        let Ok(n) = usize::try_from(n) else {
            return String::new();
        };
        if self.from_right {
            let skip = text.chars().count().saturating_sub(n);
            text.chars().skip(skip).collect()
        } else {
            text.chars().take(n).collect()
        }
    }

    fn result_type(&self, source: TextType, arg: &Operand<'_>) -> TextType {
        let requested = match arg {
            Operand::Scalar(Value::Long(n)) => Some(usize::try_from(*n).unwrap_or(0)),
            _ => None,
        };
        match (source.max_length(), requested) {
            (Some(limit), Some(n)) => TextType::variable_length_with_limit(limit.min(n)),
            (Some(limit), None) => TextType::variable_length_with_limit(limit),
            (None, Some(n)) => TextType::variable_length_with_limit(n),
            (None, None) => TextType::VARIABLE_LENGTH,
        }
    }
}

impl MapOperation for TextSlice {
    fn name(&self) -> &'static str {
        if self.from_right {
            names::TEXT_RIGHT
        } else {
            names::TEXT_LEFT
        }
    }

    fn run(
        &self,
        storage: &Storage,
        arg: Operand<'_>,
        ctx: &Context,
        _problems: &ProblemAggregator,
    ) -> Result<Storage, StoreError> {
        let len = storage.size();
        let result_type = self.result_type(text_type_of(storage), &arg);
        if arg.is_all_nothing() {
            return Ok(Storage::make_empty(StorageType::Text(result_type), len));
        }
        let left = Operand::column(storage);
        let mut builder = TextBuilder::new(result_type, len);
        for_each_row(len, ctx, |i| {
            match left.text_at(i)?.zip(count_at(&arg, i)?) {
                Some((text, n)) => builder.append_string(self.take(&text, n)),
                None => builder.append_nulls(1),
            }
            Ok(())
        })?;
        Ok(Storage::Text(builder.finish()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operation::map::{run_binary_map, run_zip};
    use crate::storage::TextStorage;

    fn texts(values: &[Option<&str>]) -> Storage {
        Storage::Text(TextStorage::from_strs(values, TextType::VARIABLE_LENGTH))
    }

    fn run(storage: &Storage, name: &str, arg: Value) -> Storage {
        let ctx = Context::default();
        let problems = ProblemAggregator::new();
        let out = run_binary_map(storage, name, &arg, &ctx, &problems).unwrap();
        assert!(problems.is_empty());
        out
    }

    #[test]
    fn test_like_wildcards_and_literals() {
        let regex = like_regex("a%b_").unwrap();
        assert!(regex.is_match("ab!"));
        assert!(regex.is_match("a\nxyzbc"));
        assert!(!regex.is_match("ab"));
        assert!(like_regex("1.5").unwrap().is_match("1.5"));
        assert!(!like_regex("1.5").unwrap().is_match("105"));
        assert!(like_regex("(x)%").unwrap().is_match("(x)abc"));
        let star = like_regex("(x)*").unwrap();
        assert!(star.is_match("(x)*"));
        assert!(!star.is_match("(x)abc"));
        assert!(!star.is_match("(x)"));
    }

    #[test]
    fn test_like_over_column() {
        let storage = texts(&[Some("apple"), Some("banana"), None]);
        let out = run(&storage, names::LIKE, Value::from("%an%"));
        assert_eq!(
            out.to_values(),
            vec![Value::Boolean(false), Value::Boolean(true), Value::Null]
        );
    }

    #[test]
    fn test_concat_types_and_nulls() {
        let storage = Storage::Text(TextStorage::from_strs(
            &[Some("ab"), None],
            TextType::fixed_length(2),
        ));
        let out = run(&storage, names::ADD, Value::from("xyz"));
        assert_eq!(
            out.storage_type(),
            StorageType::Text(TextType::fixed_length(5))
        );
        assert_eq!(out.to_values(), vec![Value::from("abxyz"), Value::Null]);
    }

    #[test]
    fn test_predicates_against_column() {
        let ctx = Context::default();
        let problems = ProblemAggregator::new();
        let left = texts(&[Some("hello"), Some("world"), Some("x")]);
        let right = texts(&[Some("he"), Some("ld"), None]);
        let starts = run_zip(&left, names::STARTS_WITH, &right, &ctx, &problems).unwrap();
        assert_eq!(
            starts.to_values(),
            vec![Value::Boolean(true), Value::Boolean(false), Value::Null]
        );
        let ends = run_zip(&left, names::ENDS_WITH, &right, &ctx, &problems).unwrap();
        assert_eq!(ends.get_item_boxed(1).unwrap(), Value::Boolean(true));
    }

    #[test]
    fn test_left_and_right_count_characters() {
        let storage = texts(&[Some("héllo"), Some("ab"), None]);
        let left = run(&storage, names::TEXT_LEFT, Value::Long(2));
        assert_eq!(
            left.to_values(),
            vec![Value::from("hé"), Value::from("ab"), Value::Null]
        );
        let right = run(&storage, names::TEXT_RIGHT, Value::Long(3));
        assert_eq!(right.get_item_boxed(0).unwrap(), Value::from("llo"));
        let negative = run(&storage, names::TEXT_LEFT, Value::Long(-1));
        assert_eq!(negative.get_item_boxed(0).unwrap(), Value::from(""));
    }

    #[test]
    fn test_min_max_coalesce() {
        let ctx = Context::default();
        let problems = ProblemAggregator::new();
        let left = texts(&[Some("b"), None, Some("a")]);
        let right = texts(&[Some("a"), Some("c"), None]);
        let min = run_zip(&left, names::MIN, &right, &ctx, &problems).unwrap();
        assert_eq!(
            min.to_values(),
            vec![Value::from("a"), Value::from("c"), Value::from("a")]
        );
    }

    #[test]
    fn test_ordering_against_number_is_an_error() {
        let ctx = Context::default();
        let problems = ProblemAggregator::new();
        let storage = texts(&[Some("a")]);
        let err = run_binary_map(&storage, names::LT, &Value::Long(1), &ctx, &problems).unwrap_err();
        assert!(matches!(err, StoreError::Incomparable { .. }));
    }
}

use crate::builder::TextBuilder;
use crate::context::Context;
use crate::error::StoreError;
use crate::operation::cast::{convert_boxed, log_retype, StorageConverter};
use crate::operation::iterators::build_over_texts;
use crate::problems::{CastProblemAggregator, ProblemAggregator};
use crate::storage::{Storage, TextStorage};
use crate::types::{StorageType, TextType};

/// Converts any value to its display form, then fits it to the target
/// length. Truncation is reported; padding a fixed-length value is not.
pub struct ToTextConverter {
    target: TextType,
}

impl ToTextConverter {
    pub fn new(target: TextType) -> Self {
        Self { target }
    }

    /// Whether every value of `source` already satisfies the target type.
    fn values_fit(&self, source: &TextStorage) -> bool {
        if self.target.fits_exactly(&source.text_type()) {
            return true;
        }
        let Some(limit) = self.target.max_length() else {
            return true;
        };
        match source.length_range() {
            None => true,
            Some((lo, hi)) if self.target.is_fixed_length() => lo == limit && hi == limit,
            Some((_, hi)) => hi <= limit,
        }
    }

    fn append_adapted(&self, builder: &mut TextBuilder, value: &str, problems: &ProblemAggregator) {
        if let Some(limit) = self.target.max_length() {
            if value.chars().nth(limit).is_some() {
                problems.report_text_too_long(value);
            }
        }
        builder.append_string(self.target.adapt(value));
    }
}

impl StorageConverter for ToTextConverter {
    fn target(&self) -> StorageType {
        StorageType::Text(self.target)
    }

    fn can_apply(&self, _source: &StorageType) -> bool {
        true
    }

    fn convert(
        &self,
        storage: &Storage,
        ctx: &Context,
        problems: &CastProblemAggregator,
    ) -> Result<Storage, StoreError> {
        let builder = TextBuilder::new(self.target, storage.size());
        let sink = problems.aggregator();
        match storage {
            Storage::Text(s) if self.values_fit(s) => {
                log_retype(storage.storage_type(), self.target());
                Ok(Storage::Text(s.retype(self.target)))
            }
            Storage::Text(s) => build_over_texts(s, builder, ctx, |b, _, text| {
                self.append_adapted(b, text, sink);
                Ok(())
            }),
            _ => convert_boxed(storage, builder, ctx, problems, |b, v| {
                self.append_adapted(b, &v.to_string(), sink);
                Some(())
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operation::cast::cast;
    use crate::storage::{BoolStorage, Column, DoubleStorage, LongStorage, ObjectStorage};
    use crate::types::{IntegerType, Value};

    fn to_text(storage: Storage, target: TextType, problems: &ProblemAggregator) -> Storage {
        let column = Column::new("t", storage);
        cast(&column, StorageType::Text(target), &Context::default(), problems)
            .unwrap()
            .into_storage()
    }

    #[test]
    fn test_truncation_is_reported() {
        let problems = ProblemAggregator::new();
        let texts = Storage::Text(TextStorage::from_strs(&[Some("hello")], TextType::VARIABLE_LENGTH));
        let out = to_text(texts, TextType::fixed_length(3), &problems);
        assert_eq!(out.to_values(), vec![Value::from("hel")]);
        assert_eq!(out.storage_type(), StorageType::Text(TextType::fixed_length(3)));
        assert_eq!(problems.count("text_too_long"), 1);
    }

    #[test]
    fn test_padding_is_silent() {
        let problems = ProblemAggregator::new();
        let texts = Storage::Text(TextStorage::from_strs(&[Some("ab"), None], TextType::VARIABLE_LENGTH));
        let out = to_text(texts, TextType::fixed_length(4), &problems);
        assert_eq!(out.to_values(), vec![Value::from("ab  "), Value::Null]);
        assert!(problems.is_empty());
    }

    #[test]
    fn test_short_values_are_retyped() {
        let problems = ProblemAggregator::new();
        let texts = Storage::Text(TextStorage::from_strs(&[Some("ab"), Some("abcd")], TextType::VARIABLE_LENGTH));
        let target = TextType::variable_length_with_limit(10);
        let out = to_text(texts, target, &problems);
        assert_eq!(out.storage_type(), StorageType::Text(target));
        assert_eq!(out.to_values(), vec![Value::from("ab"), Value::from("abcd")]);
        assert!(problems.is_empty());
    }

    #[test]
    fn test_display_forms_of_other_types() {
        let problems = ProblemAggregator::new();
        let target = TextType::VARIABLE_LENGTH;
        let longs = Storage::Long(LongStorage::from_options(vec![Some(-12), None], IntegerType::INT_64));
        assert_eq!(
            to_text(longs, target, &problems).to_values(),
            vec![Value::from("-12"), Value::Null]
        );
        let doubles = Storage::Double(DoubleStorage::from_options(vec![Some(3.0), Some(0.5)]));
        assert_eq!(
            to_text(doubles, target, &problems).to_values(),
            vec![Value::from("3.0"), Value::from("0.5")]
        );
        let bools = Storage::Bool(BoolStorage::from_options(vec![Some(true), Some(false)]));
        assert_eq!(
            to_text(bools, target, &problems).to_values(),
            vec![Value::from("True"), Value::from("False")]
        );
        let mixed = Storage::Mixed(ObjectStorage::new(vec![Some(Value::Long(1)), Some(Value::from("x"))]));
        assert_eq!(
            to_text(mixed, target, &problems).to_values(),
            vec![Value::from("1"), Value::from("x")]
        );
        assert!(problems.is_empty());
    }
}

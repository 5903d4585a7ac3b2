//! Non-fatal, per-row data-quality findings.
//!
//! A `ProblemAggregator` is created by the caller for one top-level operation
//! and handed down by reference. It is a cheap handle: builders that need to
//! report (the bound-checked integer builder, for example) keep a clone, and
//! every clone feeds the same sink.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::types::{StorageType, Value};

//==================================================================================
// 1. Problem Records
//==================================================================================

#[derive(Debug, Clone, PartialEq)]
pub enum Problem {
    DivisionByZero { row: usize },
    NumberOutOfRange { value: String },
    TextTooLong { value: String },
    /// `row` is `None` when the finding covers the whole invocation.
    FloatingPointEquality { row: Option<usize> },
    ConversionFailure { value: String },
    ArithmeticError { message: String, row: usize },
    IllegalArgument { message: String, row: usize },
}

impl Problem {
    pub fn kind(&self) -> &'static str {
        match self {
            Problem::DivisionByZero { .. } => "division_by_zero",
            Problem::NumberOutOfRange { .. } => "number_out_of_range",
            Problem::TextTooLong { .. } => "text_too_long",
            Problem::FloatingPointEquality { .. } => "floating_point_equality",
            Problem::ConversionFailure { .. } => "conversion_failure",
            Problem::ArithmeticError { .. } => "arithmetic_error",
            Problem::IllegalArgument { .. } => "illegal_argument",
        }
    }
}

impl fmt::Display for Problem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Problem::DivisionByZero { row } => write!(f, "Division by zero at row {row}"),
            Problem::NumberOutOfRange { value } => {
                write!(f, "Number {value} is out of the range of the target type")
            }
            Problem::TextTooLong { value } => write!(f, "Text `{value}` was truncated"),
            Problem::FloatingPointEquality { .. } => {
                write!(f, "Floating point values were compared for equality")
            }
            Problem::ConversionFailure { value } => write!(f, "Could not convert {value}"),
            Problem::ArithmeticError { message, row } => {
                write!(f, "Arithmetic error at row {row}: {message}")
            }
            Problem::IllegalArgument { message, row } => {
                write!(f, "Illegal argument at row {row}: {message}")
            }
        }
    }
}

/// Identifies the cast that produced a finding.
#[derive(Debug, Clone, PartialEq)]
pub struct CastOrigin {
    pub column_name: String,
    pub target_type: StorageType,
}

/// A finding together with the cast it came from, if any.
#[derive(Debug, Clone, PartialEq)]
pub struct ProblemRecord {
    pub problem: Problem,
    pub origin: Option<Rc<CastOrigin>>,
}

impl fmt::Display for ProblemRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.origin {
            Some(origin) => write!(
                f,
                "{} (casting column `{}` to {})",
                self.problem, origin.column_name, origin.target_type
            ),
            None => write!(f, "{}", self.problem),
        }
    }
}

//==================================================================================
// 2. Aggregators
//==================================================================================

#[derive(Debug, Clone, Default)]
pub struct ProblemAggregator {
    sink: Rc<RefCell<Vec<ProblemRecord>>>,
    origin: Option<Rc<CastOrigin>>,
}

impl ProblemAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn report(&self, problem: Problem) {
        self.sink.borrow_mut().push(ProblemRecord {
            problem,
            origin: self.origin.clone(),
        });
    }

    pub fn report_division_by_zero(&self, row: usize) {
        self.report(Problem::DivisionByZero { row });
    }

    pub fn report_number_out_of_range(&self, value: &Value) {
        self.report(Problem::NumberOutOfRange {
            value: value.to_string(),
        });
    }

    pub fn report_text_too_long(&self, value: &str) {
        self.report(Problem::TextTooLong {
            value: value.to_string(),
        });
    }

    pub fn report_floating_point_equality(&self, row: Option<usize>) {
        self.report(Problem::FloatingPointEquality { row });
    }

    pub fn report_conversion_failure(&self, value: &Value) {
        self.report(Problem::ConversionFailure {
            value: value.to_string(),
        });
    }

    pub fn report_arithmetic_error(&self, message: impl Into<String>, row: usize) {
        self.report(Problem::ArithmeticError {
            message: message.into(),
            row,
        });
    }

    pub fn report_illegal_argument(&self, message: impl Into<String>, row: usize) {
        self.report(Problem::IllegalArgument {
            message: message.into(),
            row,
        });
    }

    /// A snapshot of everything reported so far.
    pub fn problems(&self) -> Vec<ProblemRecord> {
        self.sink.borrow().clone()
    }

    pub fn len(&self) -> usize {
        self.sink.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.sink.borrow().is_empty()
    }

    /// Number of findings of the given kind (see [`Problem::kind`]).
    pub fn count(&self, kind: &str) -> usize {
        self.sink
            .borrow()
            .iter()
            .filter(|r| r.problem.kind() == kind)
            .count()
    }

    /// Logs one summary line per problem kind.
    pub fn log_summary(&self) {
        let sink = self.sink.borrow();
        if sink.is_empty() {
            return;
        }
        let mut kinds: Vec<&'static str> = sink.iter().map(|r| r.problem.kind()).collect();
        kinds.sort_unstable();
        kinds.dedup();
        for kind in kinds {
            let n = sink.iter().filter(|r| r.problem.kind() == kind).count();
            log_metric!("event" = "problems", "kind" = kind, "count" = n);
        }
    }
}

/// A `ProblemAggregator` scoped to a single cast, so that every finding
/// carries the column name and target type.
#[derive(Debug, Clone)]
pub struct CastProblemAggregator {
    inner: ProblemAggregator,
}

impl CastProblemAggregator {
    pub fn new(parent: &ProblemAggregator, column_name: &str, target_type: StorageType) -> Self {
        Self {
            inner: ProblemAggregator {
                sink: Rc::clone(&parent.sink),
                origin: Some(Rc::new(CastOrigin {
                    column_name: column_name.to_string(),
                    target_type,
                })),
            },
        }
    }

    pub fn column_name(&self) -> &str {
        self.inner
            .origin
            .as_ref()
            .map_or("", |o| o.column_name.as_str())
    }

    pub fn target_type(&self) -> Option<StorageType> {
        self.inner.origin.as_ref().map(|o| o.target_type)
    }

    pub fn aggregator(&self) -> &ProblemAggregator {
        &self.inner
    }
}

impl std::ops::Deref for CastProblemAggregator {
    type Target = ProblemAggregator;

    fn deref(&self) -> &ProblemAggregator {
        &self.inner
    }
}

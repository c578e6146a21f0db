pub mod builder;

use std::{
    collections::LinkedList,
    fmt::{Debug, Display},
};

pub use builder::DiagnosticBuilder;

#[derive(Clone, Copy, Default, PartialEq, Eq)]
pub struct Span {
    start: usize,
    length: usize,
}

impl From<std::ops::Range<usize>> for Span {
    fn from(value: std::ops::Range<usize>) -> Self {
        Self {
            start: value.start,
            length: value.len(),
        }
    }
}

impl From<Span> for std::ops::Range<usize> {
    fn from(val: Span) -> Self {
        val.start..val.excl_end()
    }
}

impl Debug for Span {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}..{}", self.start, self.excl_end())
    }
}

impl Span {
    pub fn start(&self) -> usize {
        self.start
    }

    pub fn excl_end(&self) -> usize {
        self.start + self.length
    }

    pub fn len(&self) -> usize {
        self.length
    }

    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    /// The smallest span covering both `self` and `other`.
    pub fn merge(self, other: Span) -> Span {
        let start = self.start.min(other.start);
        let end = self.excl_end().max(other.excl_end());
        (start..end).into()
    }
}

/// The compilation phase a diagnostic originates from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Syntactic,
    Semantic,
    Optimization,
    Generation,
}

impl Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Stage::Syntactic => "SYNTACTIC",
            Stage::Semantic => "SEMANTIC",
            Stage::Optimization => "OPTIMIZATION",
            Stage::Generation => "GENERATION",
        };
        write!(f, "{name}")
    }
}

// WARNING: Don't change the order of these (Error codes will change)
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Code {
    /// This is an internal code that should never be used for actual diagnostics.
    Unspecified = 0,
    SyntaxError,
    DuplicatedImport,
    DuplicatedField,
    DuplicatedMethod,
    DuplicatedParameter,
    DuplicatedLocal,
    ThisInStaticMethod,
    FieldInStaticMethod,
    InvalidMainMethod,
    StaticNonMainMethod,
    MissingReturn,
    MultipleReturns,
    ReturnNotLast,
    ReturnInVoidMethod,
    UndeclaredVariable,
    UndefinedMethod,
    ArrayInBinaryExpr,
    IncompatibleOperands,
    IncompatibleAssign,
    IncompatibleCondition,
    IncompatibleReturn,
    IncompatibleArgument,
    WrongArgumentCount,
    InvalidArrayAccess,
    InvalidArrayElement,
    VarargsField,
    VarargsLocal,
    VarargsReturn,
    VarargsNotLast,
    MultipleVarargs,
    NotEnoughRegisters,
    InternalError,
    InvalidMemberAccess,
}

impl Code {
    /// Get a unique numeric code for this `Code`
    fn as_code(&self) -> u32 {
        *self as u32
    }
}

impl Display for Code {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{:0>4x}", self.as_code())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostic {
    code: Code,
    stage: Stage,
    message: String,
    main_span: (Span, Option<String>),
    additional_spans: Vec<(Span, Option<String>)>,
}

impl Diagnostic {
    pub fn code(&self) -> &Code {
        &self.code
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn message(&self) -> &String {
        &self.message
    }

    pub fn main_span(&self) -> &Span {
        &self.main_span.0
    }

    pub fn main_span_message(&self) -> Option<&String> {
        self.main_span.1.as_ref()
    }

    pub fn additional_spans(&self) -> impl Iterator<Item = (&Span, Option<&String>)> {
        self.additional_spans.iter().map(|(s, m)| (s, m.as_ref()))
    }

    pub fn additional_spans_len(&self) -> usize {
        self.additional_spans.len()
    }
}

/// Specifies the possibles types of diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagnosticKind {
    /// For recoverable diagnostics. (cfr. warnings)
    Rec,
    /// For non-recoverable diagnostics. (cfr. errors)
    Err,
}

/// A result combining a value with aggregated diagnostics.
///
/// Can be in one of three states:
/// - _ok_: The result contains a value and has no diagnostics.
/// - _rec_: recoverable: The result contains a (recovered) value and has only diagnostics of the
///   kind [`DiagnosticKind::Rec`].
/// - _err_: non-recoverable: The result does not contain a value and has at least one diagnostic
///   of the kind [`DiagnosticKind::Err`].
#[derive(Debug, Clone, PartialEq)]
pub struct AggregateResult<T> {
    value: Option<T>,
    diagnostics: LinkedList<(DiagnosticKind, Diagnostic)>,
}

impl<T: Default> Default for AggregateResult<T> {
    fn default() -> Self {
        Self {
            value: Some(T::default()),
            diagnostics: LinkedList::default(),
        }
    }
}

impl<T> AggregateResult<T> {
    /// Creates an `AggregateResult` in an _ok_ state containing the specified value.
    pub fn new_ok(value: T) -> Self {
        Self {
            value: Some(value),
            diagnostics: LinkedList::new(),
        }
    }

    /// Creates an `AggregateResult` in a _rec_ state containing the specified value and
    /// diagnostic.
    pub fn new_rec(value: T, diagnostic: Diagnostic) -> Self {
        Self {
            value: Some(value),
            diagnostics: LinkedList::from([(DiagnosticKind::Rec, diagnostic)]),
        }
    }

    /// Creates an `AggregateResult` in an _err_ state containing the specified diagnostic.
    pub fn new_err(diagnostic: Diagnostic) -> Self {
        Self {
            value: None,
            diagnostics: LinkedList::from([(DiagnosticKind::Err, diagnostic)]),
        }
    }

    /// Returns `true` if the result is in an _ok_ state.
    pub fn is_ok(&self) -> bool {
        self.value.is_some() && self.diagnostics.is_empty()
    }

    /// Returns `true` if the result is in a _rec_ state.
    pub fn is_rec(&self) -> bool {
        self.value.is_some() && !self.diagnostics.is_empty()
    }

    /// Returns `true` if the result is in an _err_ state.
    pub fn is_err(&self) -> bool {
        self.value.is_none()
    }

    /// Returns the contained value for _ok_ and _rec_ results.
    pub fn value(&self) -> Option<&T> {
        self.value.as_ref()
    }

    /// Converts from `&mut AggregateResult<T>` to `Option<&mut T>`.
    pub fn value_mut(&mut self) -> Option<&mut T> {
        self.value.as_mut()
    }

    /// Converts from `AggregateResult<T>` to `Option<T>`, consuming `self`.
    pub fn into_value(self) -> Option<T> {
        self.value
    }

    /// Returns an iterator over the diagnostics for _rec_ and _err_ results.
    pub fn diagnostics(&self) -> impl Iterator<Item = (DiagnosticKind, &Diagnostic)> {
        self.diagnostics.iter().map(|(dt, d)| (*dt, d))
    }

    /// Returns a consuming iterator over the diagnostics.
    pub fn into_diagnostics(self) -> impl Iterator<Item = (DiagnosticKind, Diagnostic)> {
        self.diagnostics.into_iter()
    }

    /// Adds a recoverable diagnostic to the result.
    ///
    /// An _ok_ result will become a _rec_ result.
    pub fn add_rec_diagnostic(&mut self, diagnostic: Diagnostic) {
        self.diagnostics
            .push_back((DiagnosticKind::Rec, diagnostic));
    }

    /// Adds a non-recoverable diagnostic to the result.
    ///
    /// The result will become an _err_ result, dropping a contained value.
    pub fn add_err(&mut self, diagnostic: Diagnostic) {
        self.value = None;
        self.diagnostics
            .push_back((DiagnosticKind::Err, diagnostic));
    }

    /// Maps an `AggregateResult<T>` to `AggregateResult<U>` by applying a function to a contained
    /// value, leaving diagnostics untouched.
    #[must_use]
    pub fn map<U, F>(self, op: F) -> AggregateResult<U>
    where
        F: FnOnce(T) -> U,
    {
        AggregateResult {
            value: self.value.map(op),
            diagnostics: self.diagnostics,
        }
    }

    /// Combines the values of `self` and `other` using `f`, aggregating their diagnostics.
    ///
    /// If either `self` or `other` is in an _err_ state, the returned result will be in an _err_
    /// state as well.
    #[must_use]
    pub fn combine<U, F, R>(mut self, mut other: AggregateResult<U>, f: F) -> AggregateResult<R>
    where
        F: FnOnce(T, U) -> R,
    {
        AggregateResult {
            value: self.value.and_then(|t| other.value.map(|u| f(t, u))),
            diagnostics: {
                self.diagnostics.append(&mut other.diagnostics);
                self.diagnostics
            },
        }
    }

    /// Aggregates the diagnostics of `other` with `self`, discarding the value of self.
    #[must_use]
    pub fn aggregate<U>(mut self, mut other: AggregateResult<U>) -> AggregateResult<U> {
        self.diagnostics.append(&mut other.diagnostics);
        other.diagnostics = self.diagnostics;
        other
    }

    /// Calls `op` if the result has a value, aggregating the diagnostics of `self` with the
    /// result returned by `op`.
    #[must_use]
    pub fn and_then<U, F>(mut self, op: F) -> AggregateResult<U>
    where
        F: FnOnce(T) -> AggregateResult<U>,
    {
        match self.value {
            Some(t) => {
                let mut other = op(t);
                self.diagnostics.append(&mut other.diagnostics);
                other.diagnostics = self.diagnostics;
                other
            }
            None => AggregateResult {
                value: None,
                diagnostics: self.diagnostics,
            },
        }
    }

    /// Zips the values of `self` and `other`, aggregating their diagnostics.
    pub fn zip<U>(mut self, mut other: AggregateResult<U>) -> AggregateResult<(T, U)> {
        AggregateResult {
            value: self.value.zip(other.value),
            diagnostics: {
                self.diagnostics.append(&mut other.diagnostics);
                self.diagnostics
            },
        }
    }
}

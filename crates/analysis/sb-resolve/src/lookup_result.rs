//! Lookup result accumulator and its merge rules
//!
//! A result holds the candidates found at the best classification seen so
//! far. Kinds are ordered by priority; `Viable` and `Ambiguous` share the
//! top ("found") tier. Merging keeps the higher-priority side and, on equal
//! priority, accumulates candidates. Accumulating found candidates that do
//! not form a method group makes the result ambiguous.

use crate::error::{Diagnostic, KindMismatch};
use crate::symbol::Symbol;
use sb_intern::Name;
use sb_span::FileSpan;
use smallvec::SmallVec;

/// Classification of a lookup outcome
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Default)]
pub enum LookupResultKind {
    /// Nothing found
    #[default]
    Empty,
    /// Found something that is not a namespace or type (or is a namespace where none is allowed)
    NotTypeOrNamespace,
    /// Found something with a different generic arity
    WrongArity,
    /// Found something inaccessible
    Inaccessible,
    /// Found a member that cannot be invoked
    NotInvocable,
    /// Found something that is not a label
    NotLabel,
    /// Found an instance member where a static one was required, or vice versa
    StaticInstanceMismatch,
    /// Found one or more acceptable, mutually compatible entities
    Viable,
    /// Found several acceptable entities that conflict
    Ambiguous,
}

impl LookupResultKind {
    /// Merge priority; higher wins
    #[must_use]
    pub const fn priority(self) -> u8 {
        match self {
            Self::Empty => 0,
            Self::NotTypeOrNamespace => 1,
            Self::WrongArity => 2,
            Self::Inaccessible => 3,
            Self::NotInvocable => 4,
            Self::NotLabel => 5,
            Self::StaticInstanceMismatch => 6,
            Self::Viable | Self::Ambiguous => 7,
        }
    }

    /// Whether this is the found tier
    #[must_use]
    pub const fn is_found(self) -> bool {
        matches!(self, Self::Viable | Self::Ambiguous)
    }
}

/// Verdict of the viability check on one candidate
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SingleLookupResult {
    /// Classification
    pub kind: LookupResultKind,
    /// The candidate; absent only for `Empty`
    pub symbol: Option<Symbol>,
    /// Whether the candidate is a method (methods overload instead of conflicting)
    pub is_method: bool,
}

impl SingleLookupResult {
    /// Nothing found
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            kind: LookupResultKind::Empty,
            symbol: None,
            is_method: false,
        }
    }

    /// A candidate with the given classification
    #[must_use]
    pub const fn new(kind: LookupResultKind, symbol: Symbol, is_method: bool) -> Self {
        Self {
            kind,
            symbol: Some(symbol),
            is_method,
        }
    }

    /// An acceptable candidate that is not a method
    #[must_use]
    pub const fn good(symbol: Symbol) -> Self {
        Self::new(LookupResultKind::Viable, symbol, false)
    }
}

/// Accumulated outcome of a lookup
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LookupResult {
    kind: LookupResultKind,
    symbols: SmallVec<[Symbol; 1]>,
    all_methods: bool,
}

impl LookupResult {
    /// An empty result
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Classification
    #[must_use]
    pub const fn kind(&self) -> LookupResultKind {
        self.kind
    }

    /// Candidates at the current classification, in the order they were found
    #[must_use]
    pub fn symbols(&self) -> &[Symbol] {
        &self.symbols
    }

    /// Whether nothing has been found
    #[must_use]
    pub fn is_clear(&self) -> bool {
        self.kind == LookupResultKind::Empty
    }

    /// Whether the candidates are all viable and compatible
    #[must_use]
    pub fn is_multi_viable(&self) -> bool {
        self.kind == LookupResultKind::Viable
    }

    /// Whether exactly one viable candidate was found
    #[must_use]
    pub fn is_single_viable(&self) -> bool {
        self.is_multi_viable() && self.symbols.len() == 1
    }

    /// Whether the result reached the found tier (viable or ambiguous)
    #[must_use]
    pub const fn is_found(&self) -> bool {
        self.kind.is_found()
    }

    /// Whether every candidate is a method
    #[must_use]
    pub fn is_method_group(&self) -> bool {
        self.all_methods && !self.symbols.is_empty()
    }

    /// The only viable candidate
    #[must_use]
    pub fn single_symbol(&self) -> Option<&Symbol> {
        if self.is_single_viable() {
            self.symbols.first()
        } else {
            None
        }
    }

    /// Resets to empty
    pub fn clear(&mut self) {
        self.kind = LookupResultKind::Empty;
        self.symbols.clear();
        self.all_methods = false;
    }

    /// Replaces the contents with one verdict
    pub fn set_from(&mut self, single: SingleLookupResult) {
        self.clear();
        self.kind = single.kind;
        self.all_methods = single.is_method;
        self.symbols.extend(single.symbol);
    }

    /// Merges one verdict: higher priority replaces, equal priority accumulates
    pub fn merge_equal(&mut self, single: SingleLookupResult) {
        let mut other = Self::empty();
        other.set_from(single);
        self.merge_equal_result(other);
    }

    /// Merges another result: higher priority replaces, equal priority accumulates
    pub fn merge_equal_result(&mut self, other: Self) {
        let ours = self.kind.priority();
        let theirs = other.kind.priority();
        if theirs > ours {
            *self = other;
        } else if theirs == ours && theirs > 0 {
            self.accumulate(other);
        }
    }

    /// Merges another result, replacing only on strictly higher priority
    pub fn merge_prioritized(&mut self, other: Self) {
        if other.kind.priority() > self.kind.priority() {
            *self = other;
        }
    }

    fn accumulate(&mut self, other: Self) {
        let was_ambiguous =
            self.kind == LookupResultKind::Ambiguous || other.kind == LookupResultKind::Ambiguous;
        self.all_methods = self.all_methods && other.all_methods;
        for symbol in other.symbols {
            if !self.symbols.contains(&symbol) {
                self.symbols.push(symbol);
            }
        }

        if self.kind.is_found() {
            let conflicting = self.symbols.len() > 1 && !self.all_methods;
            self.kind = if was_ambiguous || conflicting {
                LookupResultKind::Ambiguous
            } else {
                LookupResultKind::Viable
            };
        }
    }

    /// The diagnostic a caller reports when it needs exactly one entity
    ///
    /// Returns `None` for a viable result unless the single candidate is an
    /// error placeholder, in which case its carried diagnostic is returned.
    #[must_use]
    pub fn to_diagnostic(&self, name: Name, arity: usize, span: FileSpan) -> Option<Diagnostic> {
        let mismatch = |reason| Diagnostic::WrongKind { name, reason, span };
        match self.kind {
            LookupResultKind::Empty => Some(Diagnostic::UndefinedName { name, span }),
            LookupResultKind::Ambiguous => Some(Diagnostic::AmbiguousName {
                name,
                candidates: self.symbols.len(),
                span,
            }),
            LookupResultKind::WrongArity => Some(Diagnostic::WrongArity { name, arity, span }),
            LookupResultKind::Inaccessible => Some(Diagnostic::Inaccessible { name, span }),
            LookupResultKind::NotTypeOrNamespace => Some(mismatch(KindMismatch::NotTypeOrNamespace)),
            LookupResultKind::NotInvocable => Some(mismatch(KindMismatch::NotInvocable)),
            LookupResultKind::NotLabel => Some(mismatch(KindMismatch::NotLabel)),
            LookupResultKind::StaticInstanceMismatch => Some(mismatch(KindMismatch::StaticInstance)),
            LookupResultKind::Viable => match self.symbols.as_slice() {
                [Symbol::Error(error)] => Some(error.diagnostic.clone()),
                _ => None,
            },
        }
    }
}

/// Merges two results with the equal-merge rule without mutating either
#[must_use]
pub fn merge(first: &LookupResult, second: &LookupResult) -> LookupResult {
    let mut merged = first.clone();
    merged.merge_equal_result(second.clone());
    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symbol::{LocalDeclarationKind, LocalKind, LocalSymbol};
    use sb_intern::Interner;
    use sb_span::{FileId, Span};
    use sb_syntax::{Location, SyntaxId};

    fn local(interner: &Interner, name: &str) -> Symbol {
        let location = Location::new(SyntaxId(0), FileSpan::new(FileId(0), Span::new(0, 1)));
        Symbol::from(LocalSymbol::new(
            interner.intern(name),
            LocalKind::Variable(LocalDeclarationKind::Regular),
            location,
        ))
    }

    fn single(kind: LookupResultKind, symbol: Symbol, is_method: bool) -> LookupResult {
        let mut result = LookupResult::empty();
        result.set_from(SingleLookupResult::new(kind, symbol, is_method));
        result
    }

    #[test]
    fn test_higher_priority_replaces() {
        let interner = Interner::new();
        let wrong = single(LookupResultKind::WrongArity, local(&interner, "x"), false);
        let good = single(LookupResultKind::Viable, local(&interner, "x"), false);

        let merged = merge(&wrong, &good);
        assert!(merged.is_single_viable());
        assert_eq!(merged.symbols(), good.symbols());

        let merged = merge(&good, &wrong);
        assert_eq!(merged, good);
    }

    #[test]
    fn test_two_viable_non_methods_are_ambiguous() {
        let interner = Interner::new();
        let first = single(LookupResultKind::Viable, local(&interner, "x"), false);
        let second = single(LookupResultKind::Viable, local(&interner, "x"), false);

        let merged = merge(&first, &second);
        assert_eq!(merged.kind(), LookupResultKind::Ambiguous);
        assert_eq!(merged.symbols().len(), 2);
        assert!(!merged.is_multi_viable());
    }

    #[test]
    fn test_methods_accumulate_into_a_group() {
        let interner = Interner::new();
        let first = single(LookupResultKind::Viable, local(&interner, "M"), true);
        let second = single(LookupResultKind::Viable, local(&interner, "M"), true);

        let merged = merge(&first, &second);
        assert!(merged.is_multi_viable());
        assert!(merged.is_method_group());
        assert_eq!(merged.symbols().len(), 2);
    }

    #[test]
    fn test_same_symbol_is_not_ambiguous_with_itself() {
        let interner = Interner::new();
        let symbol = local(&interner, "x");
        let first = single(LookupResultKind::Viable, symbol.clone(), false);
        let second = single(LookupResultKind::Viable, symbol, false);

        assert!(merge(&first, &second).is_single_viable());
    }

    #[test]
    fn test_prioritized_keeps_first_on_tie() {
        let interner = Interner::new();
        let mut result = single(LookupResultKind::Inaccessible, local(&interner, "a"), false);
        let other = single(LookupResultKind::Inaccessible, local(&interner, "b"), false);
        let before = result.clone();

        result.merge_prioritized(other);
        assert_eq!(result, before);
    }

    #[test]
    fn test_empty_result_reports_undefined_name() {
        let name = Interner::new().intern("missing");
        let span = FileSpan::new(FileId(0), Span::new(1, 8));
        assert_eq!(
            LookupResult::empty().to_diagnostic(name, 0, span),
            Some(Diagnostic::UndefinedName { name, span })
        );
    }
}

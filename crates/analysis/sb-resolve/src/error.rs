//! Diagnostics produced by name binding
//!
//! Every diagnostic carries only a location and argument values; message text
//! is informational and not a stable contract.

use sb_intern::Name;
use sb_span::FileSpan;
use thiserror::Error;

/// How severe a diagnostic is
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Severity {
    /// Compilation fails
    Error,
    /// Compilation succeeds
    Warning,
}

/// Why a found entity does not fit the requested kind
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum KindMismatch {
    /// A namespace or type was required
    NotTypeOrNamespace,
    /// A member used as a call target cannot be invoked
    NotInvocable,
    /// A label was required
    NotLabel,
    /// An instance member was found where a static one was required, or vice versa
    StaticInstance,
}

/// The executable unit an `await` appeared in when it cannot suspend
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum AsyncContextError {
    /// Outside any method or lambda
    NotInMethod,
    /// A non-async method returning `void`
    NonAsyncVoidMethod,
    /// A non-async method returning a value
    NonAsyncMethod,
    /// A non-async lambda synthesized for a query clause
    NonAsyncQueryLambda,
    /// A non-async lambda written by the user
    NonAsyncLambda,
}

/// Lexical regions where `await` is never allowed
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ForbiddenAwaitContext {
    /// Inside a `lock` body
    Lock,
    /// Inside a `catch` filter expression
    CatchFilter,
    /// Inside an unsafe region
    Unsafe,
}

/// A binding diagnostic
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Diagnostic {
    /// Nothing with the name is in scope
    #[error("the name {name:?} does not exist in the current context")]
    UndefinedName {
        /// Looked-up name
        name: Name,
        /// Reference location
        span: FileSpan,
    },

    /// Several equally good entities match
    #[error("{name:?} is ambiguous between {candidates} entities")]
    AmbiguousName {
        /// Looked-up name
        name: Name,
        /// Number of candidates
        candidates: usize,
        /// Reference location
        span: FileSpan,
    },

    /// The entity found is of the wrong kind
    #[error("{name:?} is the wrong kind of entity here ({reason:?})")]
    WrongKind {
        /// Looked-up name
        name: Name,
        /// Which kind rule failed
        reason: KindMismatch,
        /// Reference location
        span: FileSpan,
    },

    /// The entity found is not accessible from here
    #[error("{name:?} is inaccessible due to its protection level")]
    Inaccessible {
        /// Looked-up name
        name: Name,
        /// Reference location
        span: FileSpan,
    },

    /// The entity found has a different number of type parameters
    #[error("{name:?} cannot be used with {arity} type arguments")]
    WrongArity {
        /// Looked-up name
        name: Name,
        /// Type argument count supplied
        arity: usize,
        /// Reference location
        span: FileSpan,
    },

    /// A using-alias name is already declared in the same directive list
    #[error("the using alias {name:?} appeared previously in this namespace")]
    DuplicateAlias {
        /// Alias name
        name: Name,
        /// The later declaration
        span: FileSpan,
    },

    /// An extern alias is declared twice in the same directive list
    #[error("the extern alias {name:?} was specified more than once")]
    DuplicateExternAlias {
        /// Alias name
        name: Name,
        /// The later declaration
        span: FileSpan,
    },

    /// An extern alias names no known reference
    #[error("the extern alias {name:?} was not specified in a reference")]
    ExternAliasNotFound {
        /// Alias name
        name: Name,
        /// Declaration location
        span: FileSpan,
    },

    /// A plain using names something that is not a namespace
    #[error("a using namespace directive can only be applied to namespaces; {name:?} is a type")]
    UsingTypeAsNamespace {
        /// Last segment of the target
        name: Name,
        /// Directive target location
        span: FileSpan,
    },

    /// A using names a type that is not static
    #[error("a using directive can only be applied to static types; {name:?} is not static")]
    UsingNonStaticType {
        /// Last segment of the target
        name: Name,
        /// Directive target location
        span: FileSpan,
    },

    /// The namespace of a plain using does not exist
    #[error("the type or namespace name {name:?} could not be found")]
    NamespaceNotFound {
        /// Last resolved-or-failed segment
        name: Name,
        /// Directive target location
        span: FileSpan,
    },

    /// The same target is imported twice
    #[error("the using directive for {name:?} appeared previously in this namespace")]
    DuplicateUsing {
        /// Last segment of the target
        name: Name,
        /// The later directive
        span: FileSpan,
    },

    /// The target of an alias could not be resolved
    #[error("the alias target {name:?} could not be found")]
    AliasTargetNotFound {
        /// Segment that failed to resolve
        name: Name,
        /// Alias target location
        span: FileSpan,
    },

    /// An aliased generic type has the wrong number of type arguments
    #[error("the aliased type {name:?} requires {expected} type arguments, {found} given")]
    AliasTargetWrongArity {
        /// Target type name
        name: Name,
        /// Declared arity
        expected: usize,
        /// Supplied type arguments
        found: usize,
        /// Alias target location
        span: FileSpan,
    },

    /// A type argument violates a `class` or `struct` constraint
    #[error("the type argument for {parameter:?} does not satisfy its constraint")]
    ConstraintViolation {
        /// Type parameter whose constraint failed
        parameter: Name,
        /// Type argument location
        span: FileSpan,
    },

    /// A using alias shares its name with a member of the enclosing namespace
    #[error("the using alias {name:?} conflicts with a member of the same name")]
    AliasConflictsWithMember {
        /// Alias name
        name: Name,
        /// Alias declaration location
        span: FileSpan,
    },

    /// A member has the same name as a primary-constructor parameter
    #[error("member {name:?} conflicts with the primary constructor parameter of the same name")]
    PrimaryConstructorParameterConflict {
        /// Shared name
        name: Name,
        /// Member declaration location
        span: FileSpan,
    },

    /// A local or label is declared twice in one scope
    #[error("a local or label named {name:?} is already defined in this scope")]
    LocalDuplicate {
        /// Shared name
        name: Name,
        /// The later declaration
        span: FileSpan,
    },

    /// `await` outside an async method or lambda
    #[error("await can only be used in an async context ({context:?})")]
    AwaitWithoutAsyncContext {
        /// What the executable unit is
        context: AsyncContextError,
        /// `await` location
        span: FileSpan,
    },

    /// `await` in a region where suspension is never allowed
    #[error("await cannot be used here ({context:?})")]
    AwaitInForbiddenContext {
        /// Which region
        context: ForbiddenAwaitContext,
        /// `await` location
        span: FileSpan,
    },

    /// The awaited operand has no usable `GetAwaiter`
    #[error("the awaited expression has no suitable GetAwaiter method")]
    NoGetAwaiter {
        /// Operand location
        span: FileSpan,
    },

    /// The awaiter does not follow the awaiter pattern
    #[error("the awaiter does not implement the awaiter pattern")]
    BadAwaiterPattern {
        /// Operand location
        span: FileSpan,
    },

    /// The awaiter does not convert to the completion-notification interface
    #[error("the awaiter does not implement the completion-notification interface")]
    AwaiterNotNotifyCompletion {
        /// Operand location
        span: FileSpan,
    },

    /// The awaiter has no `GetResult`
    #[error("the awaiter has no GetResult method")]
    NoGetResult {
        /// Operand location
        span: FileSpan,
    },

    /// A transparent identifier path walked through a non-anonymous type
    #[error("range variable {name:?} cannot be reached through a non-anonymous type")]
    UnsupportedTransparentIdentifierAccess {
        /// Field being navigated to
        name: Name,
        /// Reference location
        span: FileSpan,
    },

    /// A constant depends on its own value
    #[error("the evaluation of the constant value for {name:?} involves a circular definition")]
    CircularConstantValue {
        /// Constant name
        name: Name,
        /// Constant declaration location
        span: FileSpan,
    },

    /// A constant initializer is not a constant expression
    #[error("the expression being assigned to {name:?} must be constant")]
    NotConstant {
        /// Constant name
        name: Name,
        /// Offending expression location
        span: FileSpan,
    },

    /// Constant arithmetic overflowed
    #[error("the operation overflows at compile time")]
    ConstantOverflow {
        /// Operation location
        span: FileSpan,
    },

    /// A name with no segments reached binding
    #[error("identifier expected")]
    MissingName {
        /// Where the name was expected
        span: FileSpan,
    },
}

impl Diagnostic {
    /// Where the diagnostic points
    #[must_use]
    pub const fn span(&self) -> FileSpan {
        match self {
            Self::UndefinedName { span, .. }
            | Self::AmbiguousName { span, .. }
            | Self::WrongKind { span, .. }
            | Self::Inaccessible { span, .. }
            | Self::WrongArity { span, .. }
            | Self::DuplicateAlias { span, .. }
            | Self::DuplicateExternAlias { span, .. }
            | Self::ExternAliasNotFound { span, .. }
            | Self::UsingTypeAsNamespace { span, .. }
            | Self::UsingNonStaticType { span, .. }
            | Self::NamespaceNotFound { span, .. }
            | Self::DuplicateUsing { span, .. }
            | Self::AliasTargetNotFound { span, .. }
            | Self::AliasTargetWrongArity { span, .. }
            | Self::ConstraintViolation { span, .. }
            | Self::AliasConflictsWithMember { span, .. }
            | Self::PrimaryConstructorParameterConflict { span, .. }
            | Self::LocalDuplicate { span, .. }
            | Self::AwaitWithoutAsyncContext { span, .. }
            | Self::AwaitInForbiddenContext { span, .. }
            | Self::NoGetAwaiter { span }
            | Self::BadAwaiterPattern { span }
            | Self::AwaiterNotNotifyCompletion { span }
            | Self::NoGetResult { span }
            | Self::ConstantOverflow { span }
            | Self::MissingName { span }
            | Self::UnsupportedTransparentIdentifierAccess { span, .. }
            | Self::CircularConstantValue { span, .. }
            | Self::NotConstant { span, .. } => *span,
        }
    }

    /// Severity of the diagnostic
    #[must_use]
    pub const fn severity(&self) -> Severity {
        match self {
            Self::DuplicateUsing { .. } => Severity::Warning,
            _ => Severity::Error,
        }
    }
}

/// Accumulator the caller owns and binding reports into
///
/// Speculative binding passes a fresh sink and drops it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Diagnostics {
    items: Vec<Diagnostic>,
}

impl Diagnostics {
    /// Creates an empty sink
    #[must_use]
    pub const fn new() -> Self {
        Self { items: Vec::new() }
    }

    /// Records a diagnostic
    pub fn push(&mut self, diagnostic: Diagnostic) {
        self.items.push(diagnostic);
    }

    /// Records several diagnostics in order
    pub fn extend(&mut self, diagnostics: impl IntoIterator<Item = Diagnostic>) {
        self.items.extend(diagnostics);
    }

    /// Recorded diagnostics in report order
    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.items.iter()
    }

    /// Number of diagnostics
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether nothing was reported
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Whether any error-severity diagnostic was reported
    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.items
            .iter()
            .any(|diagnostic| diagnostic.severity() == Severity::Error)
    }

    /// Takes the diagnostics out of the sink
    #[must_use]
    pub fn into_vec(self) -> Vec<Diagnostic> {
        self.items
    }
}

/// An operation observed a cancellation request and stopped early
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("the operation was cancelled")]
pub struct Cancelled;

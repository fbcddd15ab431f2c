//! Scope-chain name resolution
//!
//! The analyzer pushes a [`Scope`] for every lexical construct it enters and
//! asks the innermost one to [`lookup`](Scope::lookup) each name it meets.
//! Lookup walks outward, merging candidates with shadowing and ambiguity
//! rules, and falls back to a container's [`ImportTable`] when the
//! container's own members are not viable.
//!
//! Derived data (scope declarations, import tables, alias targets,
//! constant values) is computed lazily and published once, so scopes and
//! the [`DeclarationCache`] can be shared between analysis threads.
//!
//! Besides lookup the crate binds `await` operands structurally
//! ([`await_pattern`]), rewrites query range variables
//! ([`transparent`]) and evaluates `const` fields with cycle detection
//! ([`constants`]).

pub mod await_pattern;
pub mod cancel;
pub mod cons_list;
pub mod constants;
pub mod context;
pub mod error;
pub mod imports;
pub mod lazy;
pub mod lookup_result;
pub mod names;
pub mod options;
pub mod scope;
pub mod symbol;
pub mod transparent;
pub mod viability;

pub use await_pattern::{AwaitOperand, AwaiterMembers, BoundAwait, bind_await, is_awaitable};
pub use cancel::CancellationToken;
pub use cons_list::ConsList;
pub use constants::{ConstValue, ConstantEvaluator, EvaluatedConstant};
pub use context::{BindContext, BinderPolicy, DeclarationCache, PolicyError};
pub use error::{
    AsyncContextError, Cancelled, Diagnostic, Diagnostics, ForbiddenAwaitContext, KindMismatch,
    Severity,
};
pub use imports::{
    AliasKind, AliasSymbol, AliasTarget, CompletionPhase, CompletionState, ImportTable, UsingTarget,
};
pub use lazy::PublishCell;
pub use lookup_result::{LookupResult, LookupResultKind, SingleLookupResult, merge};
pub use names::{bind_namespace_or_type, bind_type};
pub use options::{LookupOptions, ScopeFlags};
pub use scope::{
    ForLoopLocals, ImportsSource, LambdaInfo, LocalTable, LookupRequest, LoopHeader,
    PrimaryConstructorMap, Scope, ScopeKind, TypeParameterLevel, lookup_members_in_type,
};
pub use symbol::{ErrorSymbol, LocalDeclarationKind, LocalKind, LocalSymbol, Symbol};
pub use transparent::{BoundExpr, BoundExprKind, RangeVariableMap, rewrite_range_variable};
pub use viability::{DefaultViability, ViabilityChecker};

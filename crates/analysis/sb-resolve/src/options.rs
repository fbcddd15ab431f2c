//! Lookup option and scope flag bitsets

use bitflags::bitflags;

bitflags! {
    /// Restrictions a lookup places on acceptable entities
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct LookupOptions: u16 {
        /// Only extern aliases and using aliases (the `alias::` qualifier)
        const NAMESPACE_ALIASES_ONLY = 1 << 0;
        /// Only namespaces, types and type parameters
        const NAMESPACES_OR_TYPES_ONLY = 1 << 1;
        /// Members must be invocable (the name is a call target)
        const MUST_BE_INVOCABLE_IF_MEMBER = 1 << 2;
        /// Namespaces are not acceptable
        const MUST_NOT_BE_NAMESPACE = 1 << 3;
        /// Only labels (the target of a `goto`)
        const LABELS_ONLY = 1 << 4;
        /// Members must be instance members
        const MUST_BE_INSTANCE = 1 << 5;
        /// Members must be static
        const MUST_NOT_BE_INSTANCE = 1 << 6;
        /// Methods match regardless of their arity when no type arguments are given
        const ALL_METHODS_ON_ARITY_ZERO = 1 << 7;
        /// Types match regardless of their arity when no type arguments are given
        const ALL_NAMED_TYPES_ON_ARITY_ZERO = 1 << 8;
    }
}

bitflags! {
    /// Lexical context a scope (and every scope nested in it) sits in
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct ScopeFlags: u8 {
        /// Inside the filter expression of a `catch` clause
        const IN_CATCH_FILTER = 1 << 0;
        /// Inside the body of a `lock` statement
        const IN_LOCK_BODY = 1 << 1;
        /// Inside an unsafe region
        const UNSAFE_CONTEXT = 1 << 2;
    }
}

impl ScopeFlags {
    /// Flags that do not extend into a nested method or lambda body
    pub const STATEMENT_LOCAL: Self = Self::IN_CATCH_FILTER.union(Self::IN_LOCK_BODY);
}

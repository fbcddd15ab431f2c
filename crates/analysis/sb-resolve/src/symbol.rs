//! Entity handles produced by lookup

use crate::error::Diagnostic;
use crate::imports::AliasSymbol;
use sb_intern::Name;
use sb_symbols::{SymbolGraph, SymbolId, Ty};
use sb_syntax::Location;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// How a local variable was declared
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum LocalDeclarationKind {
    /// A local declaration statement
    Regular,
    /// The declaration part of a `for` initializer
    ForInitializer,
    /// A `fixed` statement declarator; the variable pins its referent
    Fixed,
    /// The exception variable of a `catch` clause
    Catch,
    /// A pattern designation
    PatternVariable,
    /// An `out var` argument
    OutVariable,
    /// A deconstruction declaration
    Deconstruction,
}

/// Kinds of scope-local entities
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LocalKind {
    /// A local variable
    Variable(LocalDeclarationKind),
    /// A lambda parameter
    LambdaParameter {
        /// Position in the parameter list
        ordinal: usize,
        /// Parameter type as inferred by the caller
        ty: Ty,
    },
    /// A query range variable
    RangeVariable,
    /// A statement label
    Label,
}

/// An entity declared by a scope rather than by the symbol graph
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalSymbol {
    /// Declared name
    pub name: Name,
    /// What kind of local it is
    pub kind: LocalKind,
    /// Declaring syntax
    pub location: Location,
}

impl LocalSymbol {
    /// Creates a local
    #[must_use]
    pub const fn new(name: Name, kind: LocalKind, location: Location) -> Self {
        Self {
            name,
            kind,
            location,
        }
    }

    /// Whether this is a label
    #[must_use]
    pub const fn is_label(&self) -> bool {
        matches!(self.kind, LocalKind::Label)
    }

    /// Declaration kind, if this is a local variable
    #[must_use]
    pub const fn declaration_kind(&self) -> Option<LocalDeclarationKind> {
        match self.kind {
            LocalKind::Variable(kind) => Some(kind),
            _ => None,
        }
    }
}

/// Placeholder entity that carries an error and stops the scope walk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorSymbol {
    /// The name that was looked up
    pub name: Name,
    /// The reason lookup produced an error
    pub diagnostic: Diagnostic,
}

/// An entity lookup can return
#[derive(Debug, Clone)]
pub enum Symbol {
    /// An entity of the symbol graph
    Global(SymbolId),
    /// A local, lambda parameter, range variable or label
    Local(Arc<LocalSymbol>),
    /// A using alias or extern alias
    Alias(Arc<AliasSymbol>),
    /// An error placeholder
    Error(Arc<ErrorSymbol>),
}

impl Symbol {
    /// Declared name
    #[must_use]
    pub fn name(&self, graph: &SymbolGraph) -> Name {
        match self {
            Self::Global(id) => graph.name(*id),
            Self::Local(local) => local.name,
            Self::Alias(alias) => alias.name(),
            Self::Error(error) => error.name,
        }
    }

    /// Graph entity, if this is one
    #[must_use]
    pub const fn as_global(&self) -> Option<SymbolId> {
        match self {
            Self::Global(id) => Some(*id),
            _ => None,
        }
    }

    /// Local entity, if this is one
    #[must_use]
    pub fn as_local(&self) -> Option<&LocalSymbol> {
        match self {
            Self::Local(local) => Some(local),
            _ => None,
        }
    }

    /// The graph entity this symbol stands for, looking through aliases
    ///
    /// An alias whose target has not been resolved yet, or failed to
    /// resolve, has no target.
    #[must_use]
    pub fn target(&self) -> Option<SymbolId> {
        match self {
            Self::Global(id) => Some(*id),
            Self::Alias(alias) => alias.resolved_target(),
            Self::Local(_) | Self::Error(_) => None,
        }
    }

    /// Whether two handles denote the same entity
    #[must_use]
    pub fn same_entity(&self, other: &Self) -> bool {
        self == other
    }

    fn identity(&self) -> usize {
        match self {
            Self::Global(id) => u32::from(id.into_raw()) as usize,
            Self::Local(local) => Arc::as_ptr(local) as usize,
            Self::Alias(alias) => Arc::as_ptr(alias) as usize,
            Self::Error(error) => Arc::as_ptr(error) as usize,
        }
    }

    const fn discriminant(&self) -> u8 {
        match self {
            Self::Global(_) => 0,
            Self::Local(_) => 1,
            Self::Alias(_) => 2,
            Self::Error(_) => 3,
        }
    }
}

impl PartialEq for Symbol {
    fn eq(&self, other: &Self) -> bool {
        self.discriminant() == other.discriminant() && self.identity() == other.identity()
    }
}

impl Eq for Symbol {}

impl Hash for Symbol {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.discriminant().hash(state);
        self.identity().hash(state);
    }
}

impl From<SymbolId> for Symbol {
    fn from(id: SymbolId) -> Self {
        Self::Global(id)
    }
}

impl From<LocalSymbol> for Symbol {
    fn from(local: LocalSymbol) -> Self {
        Self::Local(Arc::new(local))
    }
}

//! Range variables of query expressions
//!
//! Query translation carries several range variables through one lambda
//! parameter by nesting them in anonymous "transparent" records. A
//! [`RangeVariableMap`] records, for each variable, the field names leading
//! to it from that parameter (innermost first); [`rewrite_range_variable`]
//! turns a reference into the matching parameter or field-access chain.

use crate::error::{Diagnostic, Diagnostics};
use crate::scope::{Scope, ScopeKind};
use indexmap::IndexMap;
use sb_intern::Name;
use sb_span::FileSpan;
use sb_symbols::Ty;
use sb_syntax::Identifier;
use smallvec::SmallVec;
use tracing::trace;

/// Field path of a range variable, innermost field first
pub type FieldPath = SmallVec<[Name; 2]>;

/// Range variables in scope for one query lambda and their field paths
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RangeVariableMap {
    paths: IndexMap<Name, FieldPath>,
}

impl RangeVariableMap {
    /// The map of a clause whose lambda parameter is the variable itself
    #[must_use]
    pub fn single(variable: Name) -> Self {
        let mut paths = IndexMap::new();
        paths.insert(variable, FieldPath::new());
        Self { paths }
    }

    /// The map after a clause wraps the current variables into a transparent record
    ///
    /// `left_field` is the record field holding the previous lambda parameter;
    /// `variable` is the newly introduced range variable, stored next to it.
    #[must_use]
    pub fn wrap(&self, left_field: Name, variable: Name) -> Self {
        let mut paths: IndexMap<Name, FieldPath> = self
            .paths
            .iter()
            .map(|(name, path)| {
                let mut path = path.clone();
                path.push(left_field);
                (*name, path)
            })
            .collect();
        paths.insert(variable, std::iter::once(variable).collect());
        Self { paths }
    }

    /// Path of `variable`, if it is a range variable here
    #[must_use]
    pub fn path(&self, variable: Name) -> Option<&[Name]> {
        self.paths.get(&variable).map(SmallVec::as_slice)
    }

    /// Range variables in introduction order
    pub fn variables(&self) -> impl Iterator<Item = Name> + '_ {
        self.paths.keys().copied()
    }

    /// Number of range variables
    #[must_use]
    pub fn len(&self) -> usize {
        self.paths.len()
    }

    /// Whether no range variable is mapped
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }
}

/// Bound expression shapes the rewriter produces
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BoundExprKind {
    /// A lambda parameter
    Parameter {
        /// Parameter name
        name: Name,
        /// Position in the parameter list
        ordinal: usize,
    },
    /// `receiver.field` on an anonymous record
    FieldAccess {
        /// Record being read
        receiver: Box<BoundExpr>,
        /// Field name
        field: Name,
    },
    /// A navigation that could not be bound
    Bad {
        /// The partial expression before the failing step
        receiver: Box<BoundExpr>,
    },
}

/// A bound expression
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoundExpr {
    /// Shape
    pub kind: BoundExprKind,
    /// Static type
    pub ty: Ty,
    /// Reference location
    pub span: FileSpan,
    /// Synthesized rather than written; not used as a diagnostic location
    pub compiler_generated: bool,
}

impl BoundExpr {
    /// Whether this or any receiver is a bad expression
    #[must_use]
    pub fn has_errors(&self) -> bool {
        match &self.kind {
            BoundExprKind::Parameter { .. } => false,
            BoundExprKind::FieldAccess { receiver, .. } => receiver.has_errors(),
            BoundExprKind::Bad { .. } => true,
        }
    }
}

/// Rewrites a reference to a range variable of the enclosing query lambda
///
/// Returns `None` when `variable` is not in `map`. An empty path denotes the
/// lambda parameter of the same name; otherwise the first lambda parameter is
/// navigated through the path back to front.
///
/// # Panics
///
/// Panics if `scope` is not inside a query lambda, if an empty path has no
/// parameter of that name, or if a non-empty path has no parameter to start
/// from. The query translator guarantees all three.
#[allow(clippy::panic, reason = "violations are translator defects, not user errors")]
pub fn rewrite_range_variable(
    scope: &Scope<'_>,
    map: &RangeVariableMap,
    variable: Identifier,
    diagnostics: &mut Diagnostics,
) -> Option<BoundExpr> {
    let path = map.path(variable.name)?;
    let span = variable.location.span;

    let Some(ScopeKind::Lambda(lambda)) = scope.executable_unit().map(Scope::kind) else {
        panic!("range variable referenced outside a query lambda");
    };

    let parameter = |ordinal: usize, name: Name, ty: Ty| BoundExpr {
        kind: BoundExprKind::Parameter { name, ordinal },
        ty,
        span,
        compiler_generated: false,
    };

    if path.is_empty() {
        let matching: SmallVec<[(usize, &(Identifier, Ty)); 1]> = lambda
            .parameters
            .iter()
            .enumerate()
            .filter(|(_, (identifier, _))| identifier.name == variable.name)
            .collect();
        let [(ordinal, (identifier, ty))] = matching.as_slice() else {
            panic!("range variable must match exactly one lambda parameter");
        };
        return Some(parameter(*ordinal, identifier.name, ty.clone()));
    }

    let Some((transparent, ty)) = lambda.parameters.first() else {
        panic!("query lambda has no transparent parameter");
    };
    let mut current = BoundExpr {
        compiler_generated: true,
        ..parameter(0, transparent.name, ty.clone())
    };

    for field in path.iter().rev().copied() {
        let field_ty = match &current.ty {
            Ty::Anonymous(record) => record.field(field).map(|found| found.ty.clone()),
            _ => None,
        };
        let Some(field_ty) = field_ty else {
            trace!(?field, "transparent identifier does not navigate to a record field");
            diagnostics.push(Diagnostic::UnsupportedTransparentIdentifierAccess { name: field, span });
            return Some(BoundExpr {
                kind: BoundExprKind::Bad {
                    receiver: Box::new(current),
                },
                ty: Ty::Error,
                span,
                compiler_generated: true,
            });
        };
        current = BoundExpr {
            kind: BoundExprKind::FieldAccess {
                receiver: Box::new(current),
                field,
            },
            ty: field_ty,
            span,
            compiler_generated: true,
        };
    }

    Some(current)
}

//! Binding of namespace and type names written in source

use crate::context::BindContext;
use crate::error::{Diagnostic, Diagnostics, KindMismatch};
use crate::lookup_result::LookupResultKind;
use crate::options::LookupOptions;
use crate::scope::Scope;
use sb_intern::Name;
use sb_span::FileSpan;
use sb_symbols::{SymbolId, Ty};
use sb_syntax::{NameSegment, NameSyntax, TypeSyntax};

/// Why a dotted name failed to bind
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum NameError {
    /// No namespace or type with this name exists at this step
    NotFound {
        /// Segment that failed
        name: Name,
        /// Segment location
        span: FileSpan,
    },
    /// A type with this name exists but with a different arity
    WrongArity {
        /// Segment that failed
        name: Name,
        /// Declared arity
        expected: usize,
        /// Supplied type arguments
        found: usize,
        /// Segment location
        span: FileSpan,
    },
    /// Lookup of the first segment (or alias qualifier) failed for another reason
    Lookup(Diagnostic),
}

impl NameError {
    /// The diagnostic an ordinary name reference reports
    pub(crate) fn into_diagnostic(self) -> Diagnostic {
        match self {
            Self::NotFound { name, span } => Diagnostic::UndefinedName { name, span },
            Self::WrongArity {
                name, found, span, ..
            } => Diagnostic::WrongArity {
                name,
                arity: found,
                span,
            },
            Self::Lookup(diagnostic) => diagnostic,
        }
    }
}

/// Resolves a possibly qualified namespace or type name
///
/// The first segment (or the `alias::` qualifier) is looked up through the
/// scope chain; later segments are members of the previous one.
pub(crate) fn resolve_name(
    ctx: &BindContext<'_>,
    scope: &Scope<'_>,
    name: &NameSyntax,
) -> Result<SymbolId, NameError> {
    let graph = ctx.graph();
    let mut segments = name.segments.iter();

    let mut current = if let Some(qualifier) = name.alias_qualifier {
        let result = scope.lookup(ctx, qualifier.name, 0, LookupOptions::NAMESPACE_ALIASES_ONLY);
        let target = result.single_symbol().and_then(|symbol| symbol.target());
        match target {
            Some(target) => target,
            None => {
                return Err(result
                    .to_diagnostic(qualifier.name, 0, qualifier.location.span)
                    .map_or(
                        NameError::NotFound {
                            name: qualifier.name,
                            span: qualifier.location.span,
                        },
                        NameError::Lookup,
                    ));
            }
        }
    } else {
        let Some(first) = segments.next() else {
            return Err(NameError::Lookup(Diagnostic::MissingName {
                span: name.location.span,
            }));
        };
        lookup_first_segment(ctx, scope, first)?
    };

    for segment in segments {
        current = member_segment(ctx, current, segment)?;
    }

    if !graph.get(current).is_namespace_or_type() {
        let last = name.last().map_or(name.location.span, |segment| {
            segment.identifier.location.span
        });
        return Err(NameError::NotFound {
            name: graph.name(current),
            span: last,
        });
    }
    Ok(current)
}

fn lookup_first_segment(
    ctx: &BindContext<'_>,
    scope: &Scope<'_>,
    segment: &NameSegment,
) -> Result<SymbolId, NameError> {
    let identifier = segment.identifier;
    let result = scope.lookup(
        ctx,
        identifier.name,
        segment.arity(),
        LookupOptions::NAMESPACES_OR_TYPES_ONLY,
    );

    if let Some(symbol) = result.single_symbol() {
        if let Some(target) = symbol.target() {
            return Ok(target);
        }
        return Err(result
            .to_diagnostic(identifier.name, segment.arity(), identifier.location.span)
            .map_or(
                NameError::NotFound {
                    name: identifier.name,
                    span: identifier.location.span,
                },
                NameError::Lookup,
            ));
    }

    match result.kind() {
        LookupResultKind::Empty => Err(NameError::NotFound {
            name: identifier.name,
            span: identifier.location.span,
        }),
        LookupResultKind::WrongArity => {
            let expected = result
                .symbols()
                .first()
                .and_then(|symbol| symbol.target())
                .map_or(0, |id| ctx.graph().get(id).arity());
            Err(NameError::WrongArity {
                name: identifier.name,
                expected,
                found: segment.arity(),
                span: identifier.location.span,
            })
        }
        _ => Err(result
            .to_diagnostic(identifier.name, segment.arity(), identifier.location.span)
            .map_or(
                NameError::NotFound {
                    name: identifier.name,
                    span: identifier.location.span,
                },
                NameError::Lookup,
            )),
    }
}

fn member_segment(
    ctx: &BindContext<'_>,
    container: SymbolId,
    segment: &NameSegment,
) -> Result<SymbolId, NameError> {
    let graph = ctx.graph();
    let identifier = segment.identifier;
    let candidates: Vec<SymbolId> = graph
        .members(container, identifier.name)
        .iter()
        .copied()
        .filter(|id| graph.get(*id).is_namespace_or_type())
        .collect();

    if let Some(exact) = candidates
        .iter()
        .copied()
        .find(|id| graph.get(*id).arity() == segment.arity())
    {
        return Ok(exact);
    }
    match candidates.first() {
        Some(other) => Err(NameError::WrongArity {
            name: identifier.name,
            expected: graph.get(*other).arity(),
            found: segment.arity(),
            span: identifier.location.span,
        }),
        None => Err(NameError::NotFound {
            name: identifier.name,
            span: identifier.location.span,
        }),
    }
}

/// Binds a namespace or type name, reporting failures into `diagnostics`
pub fn bind_namespace_or_type(
    ctx: &BindContext<'_>,
    scope: &Scope<'_>,
    name: &NameSyntax,
    diagnostics: &mut Diagnostics,
) -> Option<SymbolId> {
    match resolve_name(ctx, scope, name) {
        Ok(symbol) => Some(symbol),
        Err(error) => {
            diagnostics.push(error.into_diagnostic());
            None
        }
    }
}

/// Binds a type reference
///
/// Predefined keywords map to their core-library types. An implicitly typed
/// (`var`) reference and every failure bind to [`Ty::Error`]; a name that
/// denotes a namespace is reported as the wrong kind.
pub fn bind_type(
    ctx: &BindContext<'_>,
    scope: &Scope<'_>,
    syntax: &TypeSyntax,
    diagnostics: &mut Diagnostics,
) -> Ty {
    match syntax {
        TypeSyntax::Predefined { keyword, .. } => ctx.graph().predefined_type(*keyword),
        TypeSyntax::Implicit(_) => Ty::Error,
        TypeSyntax::Name(name) => {
            let Some(symbol) = bind_namespace_or_type(ctx, scope, name, diagnostics) else {
                return Ty::Error;
            };
            if ctx.graph().get(symbol).is_namespace() {
                diagnostics.push(Diagnostic::WrongKind {
                    name: ctx.graph().name(symbol),
                    reason: KindMismatch::NotTypeOrNamespace,
                    span: name.location.span,
                });
                return Ty::Error;
            }
            Ty::Named(symbol)
        }
    }
}

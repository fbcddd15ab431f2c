//! Per-candidate viability checks

use crate::context::BindContext;
use crate::lookup_result::{LookupResultKind, SingleLookupResult};
use crate::options::LookupOptions;
use crate::symbol::Symbol;
use sb_symbols::{SymbolId, SymbolKind, Ty, TypeKind};

/// Decides whether one candidate is an acceptable answer for a lookup
///
/// `within` is the type (or namespace) the referencing code sits in and is
/// used for accessibility.
pub trait ViabilityChecker {
    /// Classifies `symbol` for a lookup of `arity` type arguments under `options`
    fn check(
        &self,
        ctx: &BindContext<'_>,
        symbol: &Symbol,
        arity: usize,
        options: LookupOptions,
        within: Option<SymbolId>,
    ) -> SingleLookupResult;
}

/// The standard viability rules
///
/// Checks run in a fixed order and the first failure decides the verdict:
/// arity, namespace-or-type, invocability, accessibility, static/instance,
/// namespace exclusion, labels. Aliases are checked through their target but
/// the verdict refers to the alias itself.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultViability;

impl ViabilityChecker for DefaultViability {
    fn check(
        &self,
        ctx: &BindContext<'_>,
        symbol: &Symbol,
        arity: usize,
        options: LookupOptions,
        within: Option<SymbolId>,
    ) -> SingleLookupResult {
        let graph = ctx.graph();
        let target = symbol.target();
        let is_method = target.is_some_and(|id| graph.get(id).as_method().is_some());
        let verdict = |kind| SingleLookupResult::new(kind, symbol.clone(), is_method);

        if let Symbol::Error(_) = symbol {
            return verdict(LookupResultKind::Viable);
        }

        if wrong_arity(ctx, symbol, arity, options) {
            return verdict(LookupResultKind::WrongArity);
        }

        let is_label = symbol.as_local().is_some_and(|local| local.is_label());
        let is_namespace = target.is_some_and(|id| graph.get(id).is_namespace());
        let is_namespace_or_type = match symbol {
            Symbol::Global(id) => graph.get(*id).is_namespace_or_type(),
            Symbol::Alias(_) => target.is_none_or(|id| graph.get(id).is_namespace_or_type()),
            Symbol::Local(_) | Symbol::Error(_) => false,
        };

        if options.contains(LookupOptions::NAMESPACES_OR_TYPES_ONLY) && !is_namespace_or_type {
            return verdict(LookupResultKind::NotTypeOrNamespace);
        }

        if options.contains(LookupOptions::MUST_BE_INVOCABLE_IF_MEMBER)
            && let Symbol::Global(id) = symbol
            && is_non_invocable_member(ctx, *id)
        {
            return verdict(LookupResultKind::NotInvocable);
        }

        if let Symbol::Global(id) = symbol
            && !graph.is_accessible(*id, within)
        {
            return verdict(LookupResultKind::Inaccessible);
        }

        if let Symbol::Global(id) = symbol
            && is_member(ctx, *id)
        {
            let is_static = graph.get(*id).is_static();
            if (options.contains(LookupOptions::MUST_BE_INSTANCE) && is_static)
                || (options.contains(LookupOptions::MUST_NOT_BE_INSTANCE) && !is_static)
            {
                return verdict(LookupResultKind::StaticInstanceMismatch);
            }
        }

        if options.contains(LookupOptions::MUST_NOT_BE_NAMESPACE) && is_namespace {
            return verdict(LookupResultKind::NotTypeOrNamespace);
        }

        if options.contains(LookupOptions::LABELS_ONLY) != is_label {
            return verdict(LookupResultKind::NotLabel);
        }

        verdict(LookupResultKind::Viable)
    }
}

fn wrong_arity(
    ctx: &BindContext<'_>,
    symbol: &Symbol,
    arity: usize,
    options: LookupOptions,
) -> bool {
    let graph = ctx.graph();
    match symbol {
        Symbol::Global(id) => {
            let data = graph.get(*id);
            if arity == 0 {
                let relaxed = (options.contains(LookupOptions::ALL_METHODS_ON_ARITY_ZERO)
                    && data.as_method().is_some())
                    || (options.contains(LookupOptions::ALL_NAMED_TYPES_ON_ARITY_ZERO)
                        && data.is_type());
                if relaxed {
                    return false;
                }
            }
            match &data.kind {
                SymbolKind::Type(_) | SymbolKind::Method(_) => data.arity() != arity,
                _ => arity != 0,
            }
        }
        Symbol::Alias(_) | Symbol::Local(_) | Symbol::Error(_) => arity != 0,
    }
}

fn is_member(ctx: &BindContext<'_>, id: SymbolId) -> bool {
    matches!(
        ctx.graph().get(id).kind,
        SymbolKind::Method(_) | SymbolKind::Property(_) | SymbolKind::Field(_)
    )
}

fn is_non_invocable_member(ctx: &BindContext<'_>, id: SymbolId) -> bool {
    let graph = ctx.graph();
    match &graph.get(id).kind {
        SymbolKind::Method(_) => false,
        SymbolKind::Property(_) | SymbolKind::Field(_) => !is_delegate(ctx, &graph.value_type(id)),
        _ => false,
    }
}

fn is_delegate(ctx: &BindContext<'_>, ty: &Ty) -> bool {
    match ty {
        Ty::Dynamic => true,
        Ty::Named(id) => ctx
            .graph()
            .get(*id)
            .as_type()
            .is_some_and(|data| data.type_kind == TypeKind::Delegate),
        Ty::Void | Ty::Error | Ty::Anonymous(_) => false,
    }
}

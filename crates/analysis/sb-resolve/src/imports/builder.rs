//! Building an import table from directive syntax

use super::{AliasSymbol, AliasTarget, ImportTable, UsingTarget};
use crate::context::BindContext;
use crate::error::Diagnostic;
use crate::names::{NameError, resolve_name};
use crate::scope::Scope;
use indexmap::map::Entry;
use rustc_hash::FxHashSet;
use sb_intern::Name;
use sb_symbols::{SymbolId, TypeKind};
use sb_syntax::{ExternAliasDirective, UsingDirective};
use std::sync::Arc;
use tracing::debug;

#[allow(clippy::multiple_inherent_impl, reason = "Table construction lives beside the directive walk")]
impl ImportTable {
    /// Builds the table for directives declared in `container`
    ///
    /// Extern aliases are processed first; using targets are then resolved in
    /// a scope that sees the container's members and the extern aliases but
    /// none of the usings. Alias targets are left for first use.
    pub(crate) fn build(
        ctx: &BindContext<'_>,
        next: Option<&Scope<'_>>,
        container: SymbolId,
        externs: &[ExternAliasDirective],
        usings: &[UsingDirective],
    ) -> Self {
        let mut table = Self::empty();
        table.declare_externs(ctx, externs);

        if !table.externs.is_empty() {
            table.externs_only = Some(Arc::new(Self {
                externs: table.externs.clone(),
                ..Self::empty()
            }));
        }

        let resolution = table.resolution_scope(next, container);
        let mut imported = FxHashSet::default();
        for directive in usings {
            table.directives.push(directive.location);
            match directive.alias {
                Some(alias) => table.declare_alias(alias.name, directive),
                None => table.declare_using(ctx, &resolution, directive, &mut imported),
            }
        }

        table.trace_summary();
        table
    }

    fn declare_externs(&mut self, ctx: &BindContext<'_>, externs: &[ExternAliasDirective]) {
        let mut seen = FxHashSet::default();
        for directive in externs {
            let name = directive.alias.name;
            let span = directive.alias.location.span;
            if !seen.insert(name) {
                self.diagnostics.push(Diagnostic::DuplicateExternAlias { name, span });
                continue;
            }

            let root = ctx.extern_root(name);
            if root.is_none() {
                debug!(alias = ctx.interner().resolve(name), "extern alias has no root");
                self.diagnostics.push(Diagnostic::ExternAliasNotFound { name, span });
            }
            self.directives.push(directive.location);
            self.externs.push(Arc::new(AliasSymbol::extern_alias(
                name,
                directive.location,
                AliasTarget {
                    symbol: root,
                    ..AliasTarget::default()
                },
            )));
        }
    }

    fn declare_alias(&mut self, name: Name, directive: &UsingDirective) {
        let span = directive
            .alias
            .map_or(directive.location.span, |alias| alias.location.span);
        if self.externs.iter().any(|alias| alias.name() == name) {
            self.diagnostics.push(Diagnostic::DuplicateAlias { name, span });
            return;
        }

        match self.aliases.entry(name) {
            Entry::Occupied(_) => self.diagnostics.push(Diagnostic::DuplicateAlias { name, span }),
            Entry::Vacant(slot) => {
                slot.insert(Arc::new(AliasSymbol::using(
                    name,
                    directive.location,
                    directive.target.clone(),
                )));
            }
        }
    }

    fn declare_using(
        &mut self,
        ctx: &BindContext<'_>,
        resolution: &Scope<'_>,
        directive: &UsingDirective,
        imported: &mut FxHashSet<SymbolId>,
    ) {
        let span = directive.target.location.span;
        let Some(name) = directive.target.last().map(|segment| segment.identifier.name) else {
            return;
        };

        let target = match resolve_name(ctx, resolution, &directive.target) {
            Ok(target) => target,
            Err(NameError::NotFound { name, span }) => {
                self.diagnostics.push(Diagnostic::NamespaceNotFound { name, span });
                return;
            }
            Err(error) => {
                self.diagnostics.push(error.into_diagnostic());
                return;
            }
        };

        let graph = ctx.graph();
        let data = graph.get(target);
        if let Some(ty) = data.as_type() {
            let policy = ctx.policy();
            if !policy.allow_static_class_usings {
                self.diagnostics.push(Diagnostic::UsingTypeAsNamespace { name, span });
                return;
            }
            if !(ty.is_static && ty.type_kind == TypeKind::Class) {
                self.diagnostics.push(Diagnostic::UsingNonStaticType { name, span });
                return;
            }
        } else if !data.is_namespace() {
            self.diagnostics.push(Diagnostic::NamespaceNotFound { name, span });
            return;
        }

        if !imported.insert(target) {
            if ctx.policy().report_duplicate_usings {
                self.diagnostics.push(Diagnostic::DuplicateUsing { name, span });
            }
            return;
        }
        self.usings.push(UsingTarget {
            target,
            directive: directive.location,
        });
    }
}

//! Import tables: aliases, usings, extern aliases and their validation

use resolve_integration_tests::World;
use sb_resolve::{
    BinderPolicy, CancellationToken, Diagnostic, LookupOptions, LookupResultKind, Scope, Severity,
    Symbol,
};
use sb_symbols::{MethodSpec, SymbolGraphBuilder, SymbolId, Ty, TypeParameterConstraint, TypeSpec};
use sb_syntax::PredefinedType;

/// `Lib.Collections.List`, `Other.List`, `Lib.Math` (static) and `Lib.Widget` (not static)
struct Library {
    collections: SymbolId,
    list: SymbolId,
    other_list: SymbolId,
    math: SymbolId,
}

fn declare_library(builder: &mut SymbolGraphBuilder) -> Library {
    let global = builder.global_namespace();
    let collections = builder.namespace(global, "Lib.Collections");
    let list = builder.add_type(collections, TypeSpec::class("List"));
    let other = builder.namespace(global, "Other");
    let other_list = builder.add_type(other, TypeSpec::class("List"));
    let lib = builder.namespace(global, "Lib");
    let math = builder.add_type(lib, TypeSpec::class("Math").static_type());
    builder.add_method(math, MethodSpec::new("Abs").static_method());
    builder.add_type(lib, TypeSpec::class("Widget"));
    Library {
        collections,
        list,
        other_list,
        math,
    }
}

fn type_lookup(world: &World, scope: &Scope<'_>, name: &str) -> Option<SymbolId> {
    let ctx = world.context();
    let result = scope.lookup(&ctx, world.name(name), 0, LookupOptions::NAMESPACES_OR_TYPES_ONLY);
    result.single_symbol().and_then(Symbol::target)
}

#[test]
fn test_alias_beats_imported_namespace() {
    let (world, lib) = World::build(|builder, _| declare_library(builder));
    let syntax = &world.syntax;
    let unit = syntax.compilation_unit(
        Vec::new(),
        vec![
            syntax.using_namespace("Lib.Collections"),
            syntax.using_alias("List", syntax.name("Other.List")),
        ],
        Vec::new(),
    );
    let ctx = world.context();
    let scope = Scope::compilation_unit(&ctx, &unit);

    let result = scope.lookup(&ctx, world.name("List"), 0, LookupOptions::NAMESPACES_OR_TYPES_ONLY);
    assert!(result.is_single_viable());
    assert!(matches!(result.symbols()[0], Symbol::Alias(_)));
    assert_eq!(result.single_symbol().and_then(Symbol::target), Some(lib.other_list));
    assert_ne!(Some(lib.list), result.single_symbol().and_then(Symbol::target));
}

#[test]
fn test_using_namespace_imports_only_types() {
    let (world, lib) = World::build(|builder, _| declare_library(builder));
    let syntax = &world.syntax;
    let unit = syntax.compilation_unit(Vec::new(), vec![syntax.using_namespace("Lib")], Vec::new());
    let ctx = world.context();
    let scope = Scope::compilation_unit(&ctx, &unit);

    assert_eq!(type_lookup(&world, &scope, "Math"), Some(lib.math));
    assert_eq!(type_lookup(&world, &scope, "Collections"), None);
    assert_eq!(
        scope.import_table(&ctx).map(|table| table.usings().len()),
        Some(1)
    );
    assert!(world.graph.is_enclosed_by(lib.list, lib.collections));
}

#[test]
fn test_duplicate_alias_reports_once_at_second_declaration() {
    let (world, _) = World::build(|builder, _| declare_library(builder));
    let syntax = &world.syntax;
    let second = syntax.using_alias("L", syntax.name("Other.List"));
    let second_span = second.alias.map(|alias| alias.location.span);
    let unit = syntax.compilation_unit(
        Vec::new(),
        vec![syntax.using_alias("L", syntax.name("Lib.Collections.List")), second],
        Vec::new(),
    );
    let ctx = world.context();
    let scope = Scope::compilation_unit(&ctx, &unit);

    let diagnostics = scope.validate_imports(&ctx).unwrap_or_default();
    let duplicates: Vec<_> = diagnostics
        .iter()
        .filter(|diagnostic| matches!(diagnostic, Diagnostic::DuplicateAlias { .. }))
        .collect();
    assert_eq!(duplicates.len(), 1);
    assert_eq!(Some(duplicates[0].span()), second_span);
}

#[test]
fn test_extern_alias_resolves_against_its_root() {
    let (world, (legacy, old_list)) = World::build(|builder, _| {
        let global = builder.global_namespace();
        let legacy = builder.namespace(global, "LegacyRoot");
        let old = builder.namespace(legacy, "Old");
        let old_list = builder.add_type(old, TypeSpec::class("List"));
        (legacy, old_list)
    });
    let syntax = &world.syntax;
    let unit = syntax.compilation_unit(
        vec![syntax.extern_alias("Legacy")],
        vec![syntax.using_alias("OldList", syntax.alias_qualified_name("Legacy", "Old.List"))],
        Vec::new(),
    );
    let ctx = world.context().with_extern_root("Legacy", legacy);
    let scope = Scope::compilation_unit(&ctx, &unit);

    let result = scope.lookup(&ctx, world.name("OldList"), 0, LookupOptions::NAMESPACES_OR_TYPES_ONLY);
    assert_eq!(result.single_symbol().and_then(Symbol::target), Some(old_list));
    assert_eq!(scope.validate_imports(&ctx).map(|diagnostics| diagnostics.len()), Ok(0));
}

#[test]
fn test_unknown_extern_alias_is_reported_at_build() {
    let (world, _) = World::build(|_, _| ());
    let syntax = &world.syntax;
    let unit = syntax.compilation_unit(
        vec![syntax.extern_alias("Missing"), syntax.extern_alias("Missing")],
        Vec::new(),
        Vec::new(),
    );
    let ctx = world.context();
    let scope = Scope::compilation_unit(&ctx, &unit);

    let table = scope.import_table(&ctx);
    let diagnostics = table.as_ref().map_or(&[][..], |table| table.build_diagnostics());
    assert!(matches!(diagnostics[0], Diagnostic::ExternAliasNotFound { .. }));
    assert!(matches!(diagnostics[1], Diagnostic::DuplicateExternAlias { .. }));
    assert_eq!(table.map(|table| table.externs().len()), Some(1));
}

#[test]
fn test_using_a_type_follows_policy() {
    let (world, lib) = World::build(|builder, _| declare_library(builder));
    let syntax = &world.syntax;
    let unit = syntax.compilation_unit(
        Vec::new(),
        vec![syntax.using_namespace("Lib.Math"), syntax.using_namespace("Lib.Widget")],
        Vec::new(),
    );

    let ctx = world.context();
    let scope = Scope::compilation_unit(&ctx, &unit);
    let diagnostics = scope.validate_imports(&ctx).unwrap_or_default();
    assert_eq!(diagnostics.len(), 1);
    assert!(matches!(diagnostics[0], Diagnostic::UsingNonStaticType { name, .. } if name == world.name("Widget")));

    let abs = scope.lookup(&ctx, world.name("Abs"), 0, LookupOptions::empty());
    assert!(abs.is_method_group());
    assert_eq!(
        abs.single_symbol().and_then(Symbol::as_global).map(|id| world.graph.get(id).container),
        Some(Some(lib.math))
    );

    let (strict_world, _) = World::build(|builder, _| declare_library(builder));
    let strict_unit = strict_world.syntax.compilation_unit(
        Vec::new(),
        vec![strict_world.syntax.using_namespace("Lib.Math")],
        Vec::new(),
    );
    let policy = BinderPolicy {
        allow_static_class_usings: false,
        ..BinderPolicy::default()
    };
    let strict = strict_world.context().with_policy(policy);
    let strict_scope = Scope::compilation_unit(&strict, &strict_unit);
    let strict_diagnostics = strict_scope.validate_imports(&strict).unwrap_or_default();
    assert!(matches!(strict_diagnostics[..], [Diagnostic::UsingTypeAsNamespace { .. }]));
}

#[test]
fn test_duplicate_using_is_a_warning_and_deduplicated() {
    let (world, _) = World::build(|builder, _| declare_library(builder));
    let syntax = &world.syntax;
    let unit = syntax.compilation_unit(
        Vec::new(),
        vec![syntax.using_namespace("Lib.Collections"), syntax.using_namespace("Lib.Collections")],
        Vec::new(),
    );
    let ctx = world.context();
    let scope = Scope::compilation_unit(&ctx, &unit);

    let diagnostics = scope.validate_imports(&ctx).unwrap_or_default();
    assert_eq!(diagnostics.len(), 1);
    assert!(matches!(diagnostics[0], Diagnostic::DuplicateUsing { .. }));
    assert_eq!(diagnostics[0].severity(), Severity::Warning);
    assert_eq!(scope.import_table(&ctx).map(|table| table.usings().len()), Some(1));

    let quiet_ctx = world.context().with_policy(BinderPolicy {
        report_duplicate_usings: false,
        ..BinderPolicy::default()
    });
    let quiet_unit = syntax.compilation_unit(
        Vec::new(),
        vec![syntax.using_namespace("Lib.Collections"), syntax.using_namespace("Lib.Collections")],
        Vec::new(),
    );
    let quiet = Scope::compilation_unit(&quiet_ctx, &quiet_unit);
    assert_eq!(quiet.validate_imports(&quiet_ctx), Ok(Vec::new()));
}

#[test]
fn test_unresolvable_using_and_alias_targets() {
    let (world, _) = World::build(|builder, _| {
        let global = builder.global_namespace();
        builder.add_type(global, TypeSpec::class("Pair").generic(&["A", "B"]));
    });
    let syntax = &world.syntax;
    let unit = syntax.compilation_unit(
        Vec::new(),
        vec![
            syntax.using_namespace("Nowhere"),
            syntax.using_alias("Lost", syntax.name("Nowhere.Thing")),
            syntax.using_alias(
                "Half",
                syntax.generic_name("Pair", vec![syntax.predefined(PredefinedType::Int)]),
            ),
        ],
        Vec::new(),
    );
    let ctx = world.context();
    let scope = Scope::compilation_unit(&ctx, &unit);

    let diagnostics = scope.validate_imports(&ctx).unwrap_or_default();
    assert_eq!(diagnostics.len(), 3);
    assert!(matches!(diagnostics[0], Diagnostic::NamespaceNotFound { .. }));
    assert!(matches!(diagnostics[1], Diagnostic::AliasTargetNotFound { .. }));
    assert!(matches!(
        diagnostics[2],
        Diagnostic::AliasTargetWrongArity {
            expected: 2,
            found: 1,
            ..
        }
    ));
}

#[test]
fn test_using_target_does_not_see_sibling_alias() {
    let (world, _) = World::build(|builder, _| declare_library(builder));
    let syntax = &world.syntax;
    let dependent = syntax.using_namespace("L.Collections");
    let unit = syntax.compilation_unit(
        Vec::new(),
        vec![syntax.using_alias("L", syntax.name("Lib")), dependent],
        Vec::new(),
    );
    let ctx = world.context();
    let scope = Scope::compilation_unit(&ctx, &unit);

    let diagnostics = scope.validate_imports(&ctx).unwrap_or_default();
    let not_found: Vec<_> = diagnostics
        .iter()
        .filter_map(|diagnostic| match diagnostic {
            Diagnostic::NamespaceNotFound { name, .. } => Some(*name),
            _ => None,
        })
        .collect();
    assert_eq!(not_found, vec![world.name("L")]);

    assert_eq!(type_lookup(&world, &scope, "List"), None);
    assert!(type_lookup(&world, &scope, "L").is_some());
}

#[test]
fn test_alias_type_argument_must_satisfy_constraint() {
    let (world, _) = World::build(|builder, _| {
        let global = builder.global_namespace();
        builder.add_type(
            global,
            TypeSpec::class("Holder")
                .generic(&["T"])
                .constrained("T", TypeParameterConstraint::ReferenceType),
        );
    });
    let syntax = &world.syntax;
    let unit = syntax.compilation_unit(
        Vec::new(),
        vec![
            syntax.using_alias(
                "Ints",
                syntax.generic_name("Holder", vec![syntax.predefined(PredefinedType::Int)]),
            ),
            syntax.using_alias(
                "Strings",
                syntax.generic_name("Holder", vec![syntax.predefined(PredefinedType::String)]),
            ),
        ],
        Vec::new(),
    );
    let ctx = world.context();
    let scope = Scope::compilation_unit(&ctx, &unit);

    let diagnostics = scope.validate_imports(&ctx).unwrap_or_default();
    assert_eq!(diagnostics.len(), 1);
    assert!(matches!(diagnostics[0], Diagnostic::ConstraintViolation { parameter, .. } if parameter == world.name("T")));
}

#[test]
fn test_alias_conflicting_with_member() {
    let (world, list) = World::build(|builder, _| {
        let global = builder.global_namespace();
        let list = builder.add_type(global, TypeSpec::class("List"));
        let elsewhere = builder.namespace(global, "Elsewhere");
        builder.add_type(elsewhere, TypeSpec::class("Other"));
        list
    });
    let syntax = &world.syntax;
    let unit = syntax.compilation_unit(
        Vec::new(),
        vec![syntax.using_alias("List", syntax.name("Elsewhere.Other"))],
        Vec::new(),
    );
    let ctx = world.context();
    let scope = Scope::compilation_unit(&ctx, &unit);

    let result = scope.lookup(&ctx, world.name("List"), 0, LookupOptions::NAMESPACES_OR_TYPES_ONLY);
    let Some(Symbol::Error(error)) = result.single_symbol() else {
        panic!("expected an error placeholder, got {result:?}");
    };
    assert!(matches!(error.diagnostic, Diagnostic::AliasConflictsWithMember { .. }));
    assert_ne!(result.single_symbol().and_then(Symbol::target), Some(list));

    let diagnostics = scope.validate_imports(&ctx).unwrap_or_default();
    assert!(
        diagnostics
            .iter()
            .any(|diagnostic| matches!(diagnostic, Diagnostic::AliasConflictsWithMember { .. }))
    );
}

#[test]
fn test_cancelled_validation_can_be_retried() {
    let (world, _) = World::build(|builder, _| declare_library(builder));
    let syntax = &world.syntax;
    let unit = syntax.compilation_unit(
        Vec::new(),
        vec![syntax.using_alias("L", syntax.name("Nowhere.List"))],
        Vec::new(),
    );

    let token = CancellationToken::new();
    token.cancel();
    let cancelled_ctx = world.context().with_cancellation(token);
    let cancelled_scope = Scope::compilation_unit(&cancelled_ctx, &unit);
    assert!(cancelled_scope.validate_imports(&cancelled_ctx).is_err());
    let table = cancelled_scope.import_table(&cancelled_ctx);
    assert_eq!(table.as_ref().map(|table| table.is_validated()), Some(false));

    let ctx = world.context();
    let scope = Scope::compilation_unit(&ctx, &unit);
    let diagnostics = scope.validate_imports(&ctx).unwrap_or_default();
    assert!(matches!(diagnostics[..], [Diagnostic::AliasTargetNotFound { .. }]));
    assert_eq!(table.map(|table| table.is_validated()), Some(true));
    assert_eq!(scope.validate_imports(&ctx), Ok(diagnostics));
}

#[test]
fn test_unused_directives_are_tracked() {
    let (world, _) = World::build(|builder, _| declare_library(builder));
    let syntax = &world.syntax;
    let used = syntax.using_namespace("Lib.Collections");
    let unused = syntax.using_namespace("Other");
    let unused_location = unused.location;
    let unit = syntax.compilation_unit(Vec::new(), vec![used, unused], Vec::new());
    let ctx = world.context();
    let scope = Scope::compilation_unit(&ctx, &unit);

    let result = scope.lookup(&ctx, world.name("List"), 0, LookupOptions::NAMESPACES_OR_TYPES_ONLY);
    assert_eq!(result.kind(), LookupResultKind::Ambiguous);

    let fresh_unit = syntax.compilation_unit(
        Vec::new(),
        vec![syntax.using_namespace("Lib.Collections"), syntax.using_namespace("Lib")],
        Vec::new(),
    );
    let fresh = Scope::compilation_unit(&ctx, &fresh_unit);
    let lib_location = fresh_unit.usings[1].location;
    assert!(fresh.lookup(&ctx, world.name("List"), 0, LookupOptions::empty()).is_single_viable());
    let unused_now = fresh.import_table(&ctx).map(|table| table.unused_directives());
    assert_eq!(unused_now, Some(vec![lib_location]));

    let all_used = scope.import_table(&ctx).map(|table| table.unused_directives());
    assert!(all_used.is_some_and(|unused| !unused.contains(&unused_location)));
}

#[test]
fn test_extension_methods_come_from_imported_namespaces() {
    let (world, extension) = World::build(|builder, core| {
        let global = builder.global_namespace();
        let linq = builder.namespace(global, "Linq");
        let enumerable = builder.add_type(linq, TypeSpec::class("Enumerable").static_type());
        builder.add_method(
            enumerable,
            MethodSpec::new("Count")
                .static_method()
                .extension()
                .param("source", Ty::Named(core.object))
                .returns(Ty::Named(core.int32)),
        )
    });
    let syntax = &world.syntax;
    let with_using = syntax.compilation_unit(Vec::new(), vec![syntax.using_namespace("Linq")], Vec::new());
    let ctx = world.context();
    let scope = Scope::compilation_unit(&ctx, &with_using);
    let count = world.name("Count");

    assert_eq!(scope.lookup_extension_methods(&ctx, count), vec![extension]);
    assert!(scope.lookup(&ctx, count, 0, LookupOptions::empty()).is_clear());
    assert_eq!(scope.import_table(&ctx).map(|table| table.unused_directives().len()), Some(0));

    let without = syntax.compilation_unit(Vec::new(), Vec::new(), Vec::new());
    let bare = Scope::compilation_unit(&ctx, &without);
    assert!(bare.lookup_extension_methods(&ctx, count).is_empty());
}

#[test]
fn test_policy_reads_kebab_case_toml() {
    let policy = BinderPolicy::from_toml_str("allow-static-class-usings = false\n");
    assert_eq!(
        policy.ok(),
        Some(BinderPolicy {
            allow_static_class_usings: false,
            report_duplicate_usings: true,
        })
    );
    assert!(BinderPolicy::from_toml_str("report-duplicate-usings = \"yes\"").is_err());
}

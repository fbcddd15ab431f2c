//! Scope-chain lookup: shadowing, ambiguity and per-construct declarations

use resolve_integration_tests::World;
use sb_resolve::{
    Diagnostic, Diagnostics, ForLoopLocals, LocalDeclarationKind, LocalKind, LocalSymbol, LookupOptions,
    LookupResultKind, Scope, ScopeFlags, Symbol, TypeParameterLevel, bind_namespace_or_type,
    lookup_members_in_type, merge,
};
use sb_symbols::{Accessibility, FieldSpec, MethodSpec, SymbolId, Ty, TypeSpec};
use sb_syntax::{ForInitializer, NameSyntax, PredefinedType};
use std::sync::Arc;

struct Shapes {
    class: SymbolId,
    field: SymbolId,
    method: SymbolId,
}

fn class_with_field_and_method() -> (World, Shapes) {
    World::build(|builder, core| {
        let global = builder.global_namespace();
        let namespace = builder.namespace(global, "App");
        let class = builder.add_type(namespace, TypeSpec::class("Shape"));
        let field = builder.add_field(class, FieldSpec::new("x", Ty::Named(core.int32)));
        let method = builder.add_method(class, MethodSpec::new("Draw"));
        Shapes {
            class,
            field,
            method,
        }
    })
}

fn local_kind(symbol: &Symbol) -> Option<LocalDeclarationKind> {
    symbol.as_local().and_then(|local| local.declaration_kind())
}

#[test]
fn test_local_shadows_member() {
    let (world, ids) = class_with_field_and_method();
    let ctx = world.context();
    let syntax = &world.syntax;
    let int = syntax.predefined(PredefinedType::Int);
    let block = syntax.block(vec![syntax.local_declaration(int, vec![("x", None)])]);

    let namespace = world.graph.get(ids.class).container.unwrap_or(world.graph.global_namespace());
    let global = Scope::global(&ctx);
    let in_namespace = global.enter_container(namespace);
    let in_class = in_namespace.enter_container(ids.class);
    let in_method = in_class.enter_method(ids.method);
    let in_block = in_method.enter_block(&block);

    let shadowed = world.name("x");
    let inner = in_block.lookup(&ctx, shadowed, 0, LookupOptions::empty());
    assert_eq!(inner.kind(), LookupResultKind::Viable);
    assert_eq!(inner.symbols().len(), 1);
    assert_eq!(local_kind(&inner.symbols()[0]), Some(LocalDeclarationKind::Regular));

    let outer = in_method.lookup(&ctx, shadowed, 0, LookupOptions::empty());
    assert_eq!(outer.single_symbol().and_then(Symbol::as_global), Some(ids.field));
}

#[test]
fn test_inner_block_shadows_outer_block() {
    let (world, ids) = class_with_field_and_method();
    let ctx = world.context();
    let syntax = &world.syntax;
    let outer_block = syntax.block(vec![
        syntax.local_declaration(syntax.predefined(PredefinedType::Int), vec![("x", None)]),
    ]);
    let inner_block = syntax.block(vec![
        syntax.local_declaration(syntax.predefined(PredefinedType::String), vec![("x", None)]),
    ]);

    let global = Scope::global(&ctx);
    let in_class = global.enter_container(ids.class);
    let in_method = in_class.enter_method(ids.method);
    let outer = in_method.enter_block(&outer_block);
    let inner = outer.enter_block(&inner_block);

    let result = inner.lookup(&ctx, world.name("x"), 0, LookupOptions::empty());
    let [found] = result.symbols() else {
        panic!("expected exactly one candidate, got {:?}", result.symbols());
    };
    let inner_local = inner.local_table(&ctx).locals(world.name("x"));
    assert!(found.same_entity(&inner_local[0]));
}

#[test]
fn test_same_scope_duplicates_are_ambiguous() {
    let (world, ids) = class_with_field_and_method();
    let ctx = world.context();
    let syntax = &world.syntax;
    let block = syntax.block(vec![
        syntax.local_declaration(syntax.predefined(PredefinedType::Int), vec![("x", None)]),
        syntax.local_declaration(syntax.predefined(PredefinedType::Bool), vec![("x", None)]),
    ]);

    let global = Scope::global(&ctx);
    let in_class = global.enter_container(ids.class);
    let in_method = in_class.enter_method(ids.method);
    let in_block = in_method.enter_block(&block);

    let result = in_block.lookup(&ctx, world.name("x"), 0, LookupOptions::empty());
    assert_eq!(result.kind(), LookupResultKind::Ambiguous);
    assert_eq!(result.symbols().len(), 2);

    let diagnostics = in_block.declaration_diagnostics(&ctx);
    assert_eq!(diagnostics.len(), 1);
    let Diagnostic::LocalDuplicate { span, .. } = &diagnostics[0] else {
        panic!("expected a duplicate local, got {diagnostics:?}");
    };
    let second = result.symbols()[1].as_local().map(|local| local.location.span);
    assert_eq!(Some(*span), second);
}

#[test]
fn test_two_types_of_one_name_are_ambiguous() {
    let (world, namespace) = World::build(|builder, _| {
        let global = builder.global_namespace();
        let namespace = builder.namespace(global, "Twins");
        builder.add_type(namespace, TypeSpec::class("Pair"));
        builder.add_type(namespace, TypeSpec::structure("Pair"));
        namespace
    });
    let ctx = world.context();
    let global = Scope::global(&ctx);
    let scope = global.enter_container(namespace);

    let result = scope.lookup(&ctx, world.name("Pair"), 0, LookupOptions::NAMESPACES_OR_TYPES_ONLY);
    assert_eq!(result.kind(), LookupResultKind::Ambiguous);
    assert!(matches!(
        result.to_diagnostic(world.name("Pair"), 0, world.syntax.location().span),
        Some(Diagnostic::AmbiguousName { candidates: 2, .. })
    ));
}

#[test]
fn test_labels_only_visible_to_label_lookups() {
    let (world, ids) = class_with_field_and_method();
    let ctx = world.context();
    let syntax = &world.syntax;
    let block = syntax.block(vec![
        syntax.labeled("done", syntax.expression_statement(syntax.identifier("x"))),
    ]);

    let global = Scope::global(&ctx);
    let in_class = global.enter_container(ids.class);
    let in_method = in_class.enter_method(ids.method);
    let in_block = in_method.enter_block(&block);
    let done = world.name("done");

    let as_label = in_block.lookup(&ctx, done, 0, LookupOptions::LABELS_ONLY);
    assert!(as_label.is_single_viable());
    assert!(as_label.symbols()[0].as_local().is_some_and(|local| local.is_label()));

    let as_value = in_block.lookup(&ctx, done, 0, LookupOptions::empty());
    assert!(as_value.is_clear());

    let field_as_label = in_block.lookup(&ctx, world.name("x"), 0, LookupOptions::LABELS_ONLY);
    assert!(!field_as_label.is_found());
}

#[test]
fn test_generic_type_reports_wrong_arity() {
    let (world, namespace) = World::build(|builder, _| {
        let global = builder.global_namespace();
        let namespace = builder.namespace(global, "Collections");
        builder.add_type(namespace, TypeSpec::class("List").generic(&["T"]));
        namespace
    });
    let ctx = world.context();
    let global = Scope::global(&ctx);
    let scope = global.enter_container(namespace);
    let list = world.name("List");

    let bare = scope.lookup(&ctx, list, 0, LookupOptions::NAMESPACES_OR_TYPES_ONLY);
    assert_eq!(bare.kind(), LookupResultKind::WrongArity);

    let applied = scope.lookup(&ctx, list, 1, LookupOptions::NAMESPACES_OR_TYPES_ONLY);
    assert!(applied.is_single_viable());
}

#[test]
fn test_private_member_is_inaccessible_elsewhere() {
    let (world, (owner, stranger)) = World::build(|builder, core| {
        let global = builder.global_namespace();
        let owner = builder.add_type(global, TypeSpec::class("Vault"));
        builder.add_field(
            owner,
            FieldSpec::new("secret", Ty::Named(core.int32)).with_accessibility(Accessibility::Private),
        );
        let stranger = builder.add_type(global, TypeSpec::class("Thief"));
        (owner, stranger)
    });
    let ctx = world.context();
    let secret = world.name("secret");

    let outside = lookup_members_in_type(&ctx, owner, secret, 0, LookupOptions::empty(), Some(stranger));
    assert_eq!(outside.kind(), LookupResultKind::Inaccessible);

    let inside = lookup_members_in_type(&ctx, owner, secret, 0, LookupOptions::empty(), Some(owner));
    assert!(inside.is_single_viable());
}

#[test]
fn test_derived_member_hides_base_but_methods_accumulate() {
    let (world, (base, derived, size)) = World::build(|builder, core| {
        let global = builder.global_namespace();
        let base = builder.add_type(global, TypeSpec::class("Base"));
        builder.add_field(base, FieldSpec::new("Size", Ty::Named(core.int32)));
        builder.add_method(base, MethodSpec::new("Run"));
        let derived = builder.add_type(global, TypeSpec::class("Derived").with_base(base));
        let size = builder.add_field(derived, FieldSpec::new("Size", Ty::Named(core.string)));
        builder.add_method(derived, MethodSpec::new("Run").param("times", Ty::Named(core.int32)));
        (base, derived, size)
    });
    let ctx = world.context();
    let global = Scope::global(&ctx);
    let in_derived = global.enter_container(derived);

    let fields = in_derived.lookup(&ctx, world.name("Size"), 0, LookupOptions::empty());
    assert_eq!(fields.single_symbol().and_then(Symbol::as_global), Some(size));

    let methods = in_derived.lookup(&ctx, world.name("Run"), 0, LookupOptions::empty());
    assert_eq!(methods.kind(), LookupResultKind::Viable);
    assert!(methods.is_method_group());
    assert_eq!(methods.symbols().len(), 2);
    assert!(world.graph.is_derived_from(derived, base));
}

#[test]
fn test_expression_variables_get_their_declaration_kinds() {
    let (world, ids) = class_with_field_and_method();
    let ctx = world.context();
    let syntax = &world.syntax;
    let block = syntax.block(vec![
        syntax.expression_statement(
            syntax.invocation(syntax.identifier("Parse"), vec![syntax.out_var("parsed")]),
        ),
        syntax.expression_statement(syntax.is_type_pattern(
            syntax.identifier("value"),
            syntax.predefined(PredefinedType::Int),
            "number",
        )),
        syntax.expression_statement(
            syntax.deconstruction(&["left", "_", "right"], syntax.identifier("triple")),
        ),
    ]);

    let global = Scope::global(&ctx);
    let in_class = global.enter_container(ids.class);
    let in_method = in_class.enter_method(ids.method);
    let in_block = in_method.enter_block(&block);
    let kind_of = |text: &str| {
        let result = in_block.lookup(&ctx, world.name(text), 0, LookupOptions::empty());
        result.single_symbol().and_then(local_kind)
    };

    assert_eq!(kind_of("parsed"), Some(LocalDeclarationKind::OutVariable));
    assert_eq!(kind_of("number"), Some(LocalDeclarationKind::PatternVariable));
    assert_eq!(kind_of("left"), Some(LocalDeclarationKind::Deconstruction));
    assert_eq!(kind_of("right"), Some(LocalDeclarationKind::Deconstruction));
    assert_eq!(in_block.local_table(&ctx).len(), 4);
}

#[test]
fn test_catch_declares_only_named_exception_variable() {
    let (world, ids) = class_with_field_and_method();
    let ctx = world.context();
    let syntax = &world.syntax;
    let filter = syntax.identifier("error");
    let named = syntax.catch_clause(
        Some((syntax.named_type("Exception"), Some("error"))),
        Some(filter.clone()),
        syntax.block(Vec::new()),
    );
    let anonymous = syntax.catch_clause(Some((syntax.named_type("Exception"), None)), None, syntax.block(Vec::new()));

    let global = Scope::global(&ctx);
    let in_class = global.enter_container(ids.class);
    let in_method = in_class.enter_method(ids.method);

    let in_named = in_method.enter_catch(&named);
    let error = in_named.lookup(&ctx, world.name("error"), 0, LookupOptions::empty());
    assert_eq!(error.single_symbol().and_then(local_kind), Some(LocalDeclarationKind::Catch));

    let in_filter = in_named.enter_catch_filter(&filter);
    assert!(in_filter.flags().contains(ScopeFlags::IN_CATCH_FILTER));
    assert!(!in_named.flags().contains(ScopeFlags::IN_CATCH_FILTER));

    let in_anonymous = in_method.enter_catch(&anonymous);
    assert!(in_anonymous.local_table(&ctx).is_empty());
}

#[test]
fn test_for_loop_layers_initializer_outside_header() {
    let (world, ids) = class_with_field_and_method();
    let ctx = world.context();
    let syntax = &world.syntax;
    let declaration = syntax.variable_declaration(
        syntax.predefined(PredefinedType::Int),
        vec![("i", Some(syntax.int(0)))],
    );
    let statement = syntax.for_statement(
        ForInitializer::Declaration(declaration),
        Some(syntax.is_var_pattern(syntax.identifier("next"), "item")),
        vec![syntax.identifier("i")],
        syntax.expression_statement(syntax.identifier("item")),
    );

    let global = Scope::global(&ctx);
    let in_class = global.enter_container(ids.class);
    let in_method = in_class.enter_method(ids.method);
    let initializer = in_method.enter_for_initializer(&statement);
    let header = initializer.enter_for_header(&statement);

    let counter = header.lookup(&ctx, world.name("i"), 0, LookupOptions::empty());
    assert_eq!(counter.single_symbol().and_then(local_kind), Some(LocalDeclarationKind::ForInitializer));
    let item = header.lookup(&ctx, world.name("item"), 0, LookupOptions::empty());
    assert_eq!(item.single_symbol().and_then(local_kind), Some(LocalDeclarationKind::PatternVariable));
    assert!(initializer.lookup(&ctx, world.name("item"), 0, LookupOptions::empty()).is_clear());

    let locals = ForLoopLocals::collect(&ctx, &initializer, &header);
    let names = |locals: &[Arc<LocalSymbol>]| {
        locals.iter().map(|local| local.name).collect::<Vec<_>>()
    };
    assert_eq!(names(&locals.outer), vec![world.name("i")]);
    assert_eq!(names(&locals.inner), vec![world.name("item")]);
}

#[test]
fn test_for_header_condition_and_incrementors_share_one_table() {
    let (world, ids) = class_with_field_and_method();
    let ctx = world.context();
    let syntax = &world.syntax;
    let statement = syntax.for_statement(
        ForInitializer::Empty,
        Some(syntax.is_var_pattern(syntax.identifier("next"), "item")),
        vec![
            syntax.invocation(syntax.identifier("Advance"), vec![syntax.out_var("cursor")]),
            syntax.identifier("item"),
        ],
        syntax.expression_statement(syntax.identifier("cursor")),
    );

    let global = Scope::global(&ctx);
    let in_class = global.enter_container(ids.class);
    let in_method = in_class.enter_method(ids.method);
    let initializer = in_method.enter_for_initializer(&statement);
    let header = initializer.enter_for_header(&statement);

    let table = header.local_table(&ctx);
    assert_eq!(table.len(), 2);
    assert!(table.diagnostics().is_empty());
    let cursor = header.lookup(&ctx, world.name("cursor"), 0, LookupOptions::empty());
    assert_eq!(cursor.single_symbol().and_then(local_kind), Some(LocalDeclarationKind::OutVariable));
    let item = header.lookup(&ctx, world.name("item"), 0, LookupOptions::empty());
    assert_eq!(item.single_symbol().and_then(local_kind), Some(LocalDeclarationKind::PatternVariable));
}

#[test]
fn test_fixed_statement_declares_every_declarator() {
    let (world, ids) = class_with_field_and_method();
    let ctx = world.context();
    let syntax = &world.syntax;
    let statement = syntax.fixed_statement(
        syntax.predefined(PredefinedType::Int),
        vec![("first", None), ("second", None)],
        syntax.expression_statement(syntax.identifier("first")),
    );

    let global = Scope::global(&ctx);
    let in_class = global.enter_container(ids.class);
    let in_method = in_class.enter_method(ids.method);
    let in_fixed = in_method.enter_fixed(&statement);

    let table = in_fixed.local_table(&ctx);
    assert_eq!(table.len(), 2);
    assert!(
        table
            .local_symbols()
            .all(|local| local.declaration_kind() == Some(LocalDeclarationKind::Fixed))
    );
}

#[test]
fn test_primary_constructor_parameters_and_conflicts() {
    let (world, (ty, parameters)) = World::build(|builder, core| {
        let global = builder.global_namespace();
        let ty = builder.add_type(global, TypeSpec::class("Point"));
        let parameters = builder.set_primary_constructor(
            ty,
            &[("x", Ty::Named(core.int32)), ("y", Ty::Named(core.int32))],
        );
        (ty, parameters)
    });
    let ctx = world.context();
    let syntax = &world.syntax;
    let decl = syntax.type_decl(
        "Point",
        &[],
        Some(vec![syntax.parameter("x", None), syntax.parameter("y", None)]),
        vec![syntax.constant("y", syntax.int(1))],
    );

    let global = Scope::global(&ctx);
    let in_type = global.enter_container(ty);
    let in_primary = in_type.enter_primary_constructor(ty, &decl);

    let parameter = in_primary.lookup(&ctx, world.name("x"), 0, LookupOptions::empty());
    assert_eq!(parameter.single_symbol().and_then(Symbol::as_global), Some(parameters[0]));

    let diagnostics = in_primary.declaration_diagnostics(&ctx);
    assert_eq!(diagnostics.len(), 1);
    assert!(matches!(
        diagnostics[0],
        Diagnostic::PrimaryConstructorParameterConflict { name, .. } if name == world.name("y")
    ));
}

#[test]
fn test_type_parameters_resolve_in_their_scope() {
    let (world, generic) = World::build(|builder, _| {
        let global = builder.global_namespace();
        builder.add_type(global, TypeSpec::class("Box").generic(&["T"]))
    });
    let ctx = world.context();
    let global = Scope::global(&ctx);
    let in_type = global.enter_container(generic);
    let in_parameters = in_type.enter_type_parameters(generic, TypeParameterLevel::DeclaringType);

    let result = in_parameters.lookup(&ctx, world.name("T"), 0, LookupOptions::NAMESPACES_OR_TYPES_ONLY);
    let declared = world.graph.get(generic).as_type().map(|data| data.type_parameters[0]);
    assert_eq!(result.single_symbol().and_then(Symbol::as_global), declared);
    assert_eq!(in_parameters.containing_type(&ctx), Some(generic));
}

#[test]
fn test_lambda_parameters_shadow_outer_locals() {
    let (world, ids) = class_with_field_and_method();
    let ctx = world.context();
    let syntax = &world.syntax;
    let lambda = syntax.lambda(false, &["x"], syntax.identifier("x"));

    let global = Scope::global(&ctx);
    let in_class = global.enter_container(ids.class);
    let in_method = in_class.enter_method(ids.method);
    let in_lambda = in_method.enter_lambda(&lambda, &[Ty::Named(world.core.string)]);

    let result = in_lambda.lookup(&ctx, world.name("x"), 0, LookupOptions::empty());
    let local = result.single_symbol().and_then(Symbol::as_local);
    assert!(matches!(
        local.map(|local| &local.kind),
        Some(LocalKind::LambdaParameter { ordinal: 0, ty }) if *ty == Ty::Named(world.core.string)
    ));
}

#[test]
fn test_lock_and_unsafe_flags_reset_at_method_boundary() {
    let (world, ids) = class_with_field_and_method();
    let ctx = world.context();
    let global = Scope::global(&ctx);
    let in_class = global.enter_container(ids.class);
    let unsafe_region = in_class.enter_unsafe();
    let lock_body = unsafe_region.enter_lock_body();
    assert!(lock_body.flags().contains(ScopeFlags::IN_LOCK_BODY | ScopeFlags::UNSAFE_CONTEXT));

    let nested_method = lock_body.enter_method(ids.method);
    assert!(!nested_method.flags().contains(ScopeFlags::IN_LOCK_BODY));
    assert!(nested_method.flags().contains(ScopeFlags::UNSAFE_CONTEXT));
}

#[test]
fn test_merge_keeps_higher_priority_and_accumulates_ties() {
    let (world, ids) = class_with_field_and_method();
    let ctx = world.context();
    let global = Scope::global(&ctx);
    let in_class = global.enter_container(ids.class);

    let found = in_class.lookup(&ctx, world.name("x"), 0, LookupOptions::empty());
    let wrong_kind = in_class.lookup(&ctx, world.name("x"), 0, LookupOptions::NAMESPACES_OR_TYPES_ONLY);
    assert_eq!(wrong_kind.kind(), LookupResultKind::NotTypeOrNamespace);

    let merged = merge(&wrong_kind, &found);
    assert_eq!(merged.kind(), LookupResultKind::Viable);
    assert_eq!(merged.symbols(), found.symbols());

    let repeated = merge(&found, &found);
    assert_eq!(repeated.kind(), LookupResultKind::Viable);
    assert_eq!(repeated.symbols().len(), 1);

    let method = in_class.lookup(&ctx, world.name("Draw"), 0, LookupOptions::empty());
    let conflicting = merge(&found, &method);
    assert_eq!(conflicting.kind(), LookupResultKind::Ambiguous);
    assert_eq!(conflicting.symbols().len(), 2);
}

#[test]
fn test_name_without_segments_reports_missing_name() {
    let (world, ()) = World::build(|_, _| ());
    let ctx = world.context();
    let location = world.syntax.location();
    let empty = NameSyntax {
        location,
        alias_qualifier: None,
        segments: Vec::new(),
    };

    let mut diagnostics = Diagnostics::new();
    let global = Scope::global(&ctx);
    assert_eq!(bind_namespace_or_type(&ctx, &global, &empty, &mut diagnostics), None);
    assert_eq!(
        diagnostics.into_vec(),
        vec![Diagnostic::MissingName { span: location.span }]
    );
}

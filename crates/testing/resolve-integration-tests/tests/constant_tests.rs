//! Constant evaluation and circular definitions

use resolve_integration_tests::World;
use sb_resolve::{ConstValue, ConstantEvaluator, Diagnostic, Diagnostics};
use sb_intern::Name;
use sb_symbols::{FieldSpec, SymbolGraphBuilder, SymbolId, Ty, TypeSpec};
use sb_syntax::{BinaryOp, Expr, SyntaxFactory};
use std::sync::Arc;

fn add_constant(
    builder: &mut SymbolGraphBuilder,
    syntax: &SyntaxFactory,
    owner: SymbolId,
    name: &str,
    ty: Ty,
    initializer: Expr,
) -> SymbolId {
    builder.add_field(
        owner,
        FieldSpec::new(name, ty)
            .static_field()
            .constant(Arc::new(initializer))
            .declared_at(syntax.location()),
    )
}

fn circular_names(diagnostics: &Diagnostics) -> Vec<Name> {
    diagnostics
        .iter()
        .filter_map(|diagnostic| match diagnostic {
            Diagnostic::CircularConstantValue { name, .. } => Some(*name),
            _ => None,
        })
        .collect()
}

struct Cycle {
    first: SymbolId,
    second: SymbolId,
    dependent: SymbolId,
}

fn declare_cycle(builder: &mut SymbolGraphBuilder, int: Ty, syntax: &SyntaxFactory) -> Cycle {
    let global = builder.global_namespace();
    let app = builder.namespace(global, "App");
    let config = builder.add_type(app, TypeSpec::class("Config"));
    let first = add_constant(builder, syntax, config, "x", int.clone(), syntax.identifier("y"));
    let second = add_constant(builder, syntax, config, "y", int.clone(), syntax.identifier("x"));
    let dependent = add_constant(
        builder,
        syntax,
        config,
        "z",
        int,
        syntax.binary(BinaryOp::Add, syntax.identifier("x"), syntax.int(1)),
    );
    Cycle { first, second, dependent }
}

#[test]
fn test_each_constant_on_a_cycle_is_reported_once() {
    let (world, ids) =
        World::build_with_syntax(|builder, core, syntax| declare_cycle(builder, Ty::Named(core.int32), syntax));
    let ctx = world.context();
    let evaluator = ConstantEvaluator::new(&ctx);

    let mut diagnostics = Diagnostics::new();
    assert_eq!(evaluator.evaluate(ids.first, &mut diagnostics), ConstValue::Bad);
    assert_eq!(diagnostics.len(), 2);
    let mut names = circular_names(&diagnostics);
    names.sort();
    let mut expected = vec![world.name("x"), world.name("y")];
    expected.sort();
    assert_eq!(names, expected);

    let mut again = Diagnostics::new();
    assert_eq!(evaluator.evaluate(ids.second, &mut again), ConstValue::Bad);
    assert_eq!(evaluator.evaluate(ids.first, &mut again), ConstValue::Bad);
    assert!(again.is_empty());
}

#[test]
fn test_dependent_of_a_cycle_is_bad_without_its_own_diagnostic() {
    let (world, ids) =
        World::build_with_syntax(|builder, core, syntax| declare_cycle(builder, Ty::Named(core.int32), syntax));
    let ctx = world.context();
    let evaluator = ConstantEvaluator::new(&ctx);

    let mut diagnostics = Diagnostics::new();
    assert!(evaluator.evaluate(ids.dependent, &mut diagnostics).is_bad());
    let names = circular_names(&diagnostics);
    assert_eq!(names.len(), 2);
    assert!(!names.contains(&world.name("z")));
    assert_eq!(
        ctx.cache().constant(ids.dependent).map(|done| done.diagnostics.len()),
        Some(0)
    );
}

struct Fork {
    sum: SymbolId,
    left: SymbolId,
    right: SymbolId,
}

/// `Sum = Left + Right; Left = Sum; Right = Sum`
fn declare_fork(builder: &mut SymbolGraphBuilder, int: Ty, syntax: &SyntaxFactory) -> Fork {
    let global = builder.global_namespace();
    let totals = builder.add_type(global, TypeSpec::class("Totals"));
    let sum = add_constant(
        builder,
        syntax,
        totals,
        "Sum",
        int.clone(),
        syntax.binary(BinaryOp::Add, syntax.identifier("Left"), syntax.identifier("Right")),
    );
    let left = add_constant(builder, syntax, totals, "Left", int.clone(), syntax.identifier("Sum"));
    let right = add_constant(builder, syntax, totals, "Right", int, syntax.identifier("Sum"));
    Fork { sum, left, right }
}

fn assert_fork_reported_once(world: &World, fork: &Fork, start: fn(&Fork) -> SymbolId) {
    let ctx = world.context();
    let evaluator = ConstantEvaluator::new(&ctx);

    let mut diagnostics = Diagnostics::new();
    assert!(evaluator.evaluate(start(fork), &mut diagnostics).is_bad());
    let mut names = circular_names(&diagnostics);
    names.sort();
    let mut expected = vec![world.name("Sum"), world.name("Left"), world.name("Right")];
    expected.sort();
    assert_eq!(names, expected);

    let mut again = Diagnostics::new();
    for field in [fork.sum, fork.left, fork.right] {
        assert!(evaluator.evaluate(field, &mut again).is_bad());
        assert_eq!(ctx.cache().constant(field).map(|done| done.diagnostics.len()), Some(1));
    }
    assert!(again.is_empty(), "{again:?}");
}

#[test]
fn test_both_operands_of_a_cycle_are_reported_from_the_sum() {
    let (world, fork) =
        World::build_with_syntax(|builder, core, syntax| declare_fork(builder, Ty::Named(core.int32), syntax));
    assert_fork_reported_once(&world, &fork, |fork| fork.sum);
}

#[test]
fn test_both_operands_of_a_cycle_are_reported_from_an_operand() {
    let (world, fork) =
        World::build_with_syntax(|builder, core, syntax| declare_fork(builder, Ty::Named(core.int32), syntax));
    assert_fork_reported_once(&world, &fork, |fork| fork.right);
}

#[test]
fn test_both_operands_of_a_cycle_are_reported_from_the_first_operand() {
    let (world, fork) =
        World::build_with_syntax(|builder, core, syntax| declare_fork(builder, Ty::Named(core.int32), syntax));
    assert_fork_reported_once(&world, &fork, |fork| fork.left);
}

#[test]
fn test_self_reference_is_a_cycle() {
    let (world, field) = World::build_with_syntax(|builder, core, syntax| {
        let global = builder.global_namespace();
        let holder = builder.add_type(global, TypeSpec::class("Holder"));
        add_constant(builder, syntax, holder, "Me", Ty::Named(core.int32), syntax.identifier("Me"))
    });
    let ctx = world.context();
    let mut diagnostics = Diagnostics::new();
    assert!(ConstantEvaluator::new(&ctx).evaluate(field, &mut diagnostics).is_bad());
    assert_eq!(circular_names(&diagnostics), vec![world.name("Me")]);
}

#[test]
fn test_arithmetic_and_member_access() {
    let (world, (area, limit, label)) = World::build_with_syntax(|builder, core, syntax| {
        let int = Ty::Named(core.int32);
        let global = builder.global_namespace();
        let app = builder.namespace(global, "App");
        let limits = builder.add_type(app, TypeSpec::class("Limits"));
        add_constant(builder, syntax, limits, "Max", int.clone(), syntax.int(100));

        let shape = builder.add_type(app, TypeSpec::class("Shape"));
        let area = add_constant(
            builder,
            syntax,
            shape,
            "Area",
            int.clone(),
            syntax.binary(BinaryOp::Mul, syntax.identifier("Width"), syntax.identifier("Height")),
        );
        add_constant(builder, syntax, shape, "Width", int.clone(), syntax.int(4));
        add_constant(builder, syntax, shape, "Height", int.clone(), syntax.int(5));
        let limit = add_constant(
            builder,
            syntax,
            shape,
            "Limit",
            int,
            syntax.binary(
                BinaryOp::Add,
                syntax.member_access(syntax.identifier("Limits"), "Max"),
                syntax.member_access(
                    syntax.member_access(syntax.identifier("App"), "Limits"),
                    "Max",
                ),
            ),
        );
        let label = add_constant(
            builder,
            syntax,
            shape,
            "Label",
            Ty::Named(core.string),
            syntax.binary(BinaryOp::Add, syntax.string_literal("4x"), syntax.string_literal("5")),
        );
        (area, limit, label)
    });
    let ctx = world.context();
    let evaluator = ConstantEvaluator::new(&ctx);
    let mut diagnostics = Diagnostics::new();

    assert_eq!(evaluator.evaluate(area, &mut diagnostics).as_int(), Some(20));
    assert_eq!(evaluator.evaluate(limit, &mut diagnostics).as_int(), Some(200));
    assert_eq!(
        evaluator.evaluate(label, &mut diagnostics),
        ConstValue::String("4x5".to_owned())
    );
    assert!(diagnostics.is_empty(), "{diagnostics:?}");
}

#[test]
fn test_overflow_and_non_constant_operands() {
    let (world, (overflowing, reads_field, undefined)) = World::build_with_syntax(|builder, core, syntax| {
        let int = Ty::Named(core.int32);
        let global = builder.global_namespace();
        let numbers = builder.add_type(global, TypeSpec::class("Numbers"));
        builder.add_field(numbers, FieldSpec::new("Counter", int.clone()).static_field());
        let overflowing = add_constant(
            builder,
            syntax,
            numbers,
            "Big",
            int.clone(),
            syntax.binary(BinaryOp::Add, syntax.int(i64::MAX), syntax.int(1)),
        );
        let reads_field = add_constant(builder, syntax, numbers, "Copy", int.clone(), syntax.identifier("Counter"));
        let undefined = add_constant(builder, syntax, numbers, "Ghost", int, syntax.identifier("Nowhere"));
        (overflowing, reads_field, undefined)
    });
    let ctx = world.context();
    let evaluator = ConstantEvaluator::new(&ctx);

    let mut diagnostics = Diagnostics::new();
    assert!(evaluator.evaluate(overflowing, &mut diagnostics).is_bad());
    assert!(matches!(diagnostics.into_vec()[..], [Diagnostic::ConstantOverflow { .. }]));

    let mut diagnostics = Diagnostics::new();
    assert!(evaluator.evaluate(reads_field, &mut diagnostics).is_bad());
    assert!(matches!(diagnostics.into_vec()[..], [Diagnostic::NotConstant { .. }]));

    let mut diagnostics = Diagnostics::new();
    assert!(evaluator.evaluate(undefined, &mut diagnostics).is_bad());
    assert!(matches!(diagnostics.into_vec()[..], [Diagnostic::UndefinedName { .. }]));
}

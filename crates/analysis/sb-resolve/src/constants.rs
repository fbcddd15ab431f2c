//! Constant values of `const` fields
//!
//! Initializers are evaluated on demand through the scope chain of the
//! field's container. Fields currently being evaluated form a [`ConsList`]
//! on the call stack; reaching one of them again is a cycle. Every field on
//! the cycle gets one `CircularConstantValue` diagnostic, while fields that
//! merely depend on the cycle get a bad value silently.
//!
//! A published constant remembers the constants its initializer referenced.
//! Reading a published value while some frame of the current stack is
//! reachable through those references closes a cycle at that frame, so a
//! constant evaluated late in a cycle still gets its diagnostic.

use crate::cons_list::ConsList;
use crate::context::BindContext;
use crate::error::{Diagnostic, Diagnostics};
use crate::lookup_result::LookupResult;
use crate::options::LookupOptions;
use crate::scope::{LookupRequest, Scope, lookup_members_in_type};
use crate::symbol::Symbol;
use rustc_hash::FxHashSet;
use sb_intern::Name;
use sb_span::FileSpan;
use sb_symbols::SymbolId;
use sb_syntax::{BinaryOp, Expr, Literal};
use tracing::debug;

/// A compile-time constant value
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConstValue {
    /// Integer constant
    Int(i64),
    /// Boolean constant
    Bool(bool),
    /// String constant
    String(String),
    /// `null`
    Null,
    /// Evaluation failed; the failure was reported where it happened
    Bad,
}

impl ConstValue {
    /// Returns the integer value if this is an integer
    #[must_use]
    pub const fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(value) => Some(*value),
            _ => None,
        }
    }

    /// Returns the boolean value if this is a boolean
    #[must_use]
    pub const fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(value) => Some(*value),
            _ => None,
        }
    }

    /// Whether evaluation failed
    #[must_use]
    pub const fn is_bad(&self) -> bool {
        matches!(self, Self::Bad)
    }
}

/// The published value of one constant together with its own diagnostics
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvaluatedConstant {
    /// The value
    pub value: ConstValue,
    /// Problems in this constant's initializer
    pub diagnostics: Vec<Diagnostic>,
    /// Constants the initializer referenced, in first-reference order
    pub depends_on: Vec<SymbolId>,
}

/// A cycle closing at `root`, a frame at or below the current one
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Cycle {
    root: SymbolId,
}

impl Cycle {
    /// Of two cycles through the current frame, the one reaching further down the stack
    fn outermost(self, other: Self, in_progress: &ConsList<'_, SymbolId>) -> Self {
        let depth = |cycle: Self| in_progress.iter().position(|frame| *frame == cycle.root);
        if depth(other) > depth(self) { other } else { self }
    }
}

type Eval = Result<ConstValue, Cycle>;

/// State of the constant whose initializer is being evaluated
#[derive(Debug)]
struct Frame {
    field: SymbolId,
    diagnostics: Diagnostics,
    depends_on: Vec<SymbolId>,
}

/// Evaluates `const` field initializers
#[derive(Debug, Clone, Copy)]
pub struct ConstantEvaluator<'ctx, 'graph> {
    ctx: &'ctx BindContext<'graph>,
    root: Option<&'ctx Scope<'ctx>>,
}

impl<'ctx, 'graph> ConstantEvaluator<'ctx, 'graph> {
    /// An evaluator resolving names from the global namespace inward
    #[must_use]
    pub const fn new(ctx: &'ctx BindContext<'graph>) -> Self {
        Self { ctx, root: None }
    }

    /// An evaluator whose global scope is `root`, typically a compilation unit
    #[must_use]
    pub const fn with_root(ctx: &'ctx BindContext<'graph>, root: &'ctx Scope<'ctx>) -> Self {
        Self {
            ctx,
            root: Some(root),
        }
    }

    /// Value of a `const` field
    ///
    /// Each constant is evaluated once across all threads. The diagnostics of
    /// every constant this call published are reported to `diagnostics`;
    /// constants published earlier or by another thread report nothing.
    pub fn evaluate(&self, field: SymbolId, diagnostics: &mut Diagnostics) -> ConstValue {
        self.field_value(field, &ConsList::Empty, diagnostics)
            .unwrap_or(ConstValue::Bad)
    }

    fn field_value(
        &self,
        field: SymbolId,
        in_progress: &ConsList<'_, SymbolId>,
        report: &mut Diagnostics,
    ) -> Eval {
        if let Some(done) = self.ctx.cache().constant(field) {
            return match self.reentered_frame(field, in_progress, report) {
                Some(root) => {
                    debug!("published constant reaches a constant still in progress");
                    Err(Cycle { root })
                }
                None => Ok(done.value.clone()),
            };
        }
        if in_progress.contains(&field) {
            debug!(depth = in_progress.len(), "constant depends on itself");
            return Err(Cycle { root: field });
        }

        let graph = self.ctx.graph();
        let data = graph.get(field);
        let Some(initializer) = data.as_field().and_then(|field| field.constant.clone()) else {
            return Ok(ConstValue::Bad);
        };

        let in_progress = in_progress.prepend(field);
        let mut frame = Frame {
            field,
            diagnostics: Diagnostics::new(),
            depends_on: Vec::new(),
        };
        let mut outcome = Ok(ConstValue::Bad);
        if let Some(container) = data.container {
            self.in_container_scope(container, &mut |scope: &Scope<'_>| {
                outcome = self.eval_expr(scope, &mut frame, &initializer, &in_progress, report);
            });
        }

        let mut escaping = None;
        let value = match outcome {
            Ok(value) => value,
            Err(cycle) => {
                let span = data
                    .declaration
                    .map_or(initializer.location().span, |declaration| declaration.span);
                frame.diagnostics.push(Diagnostic::CircularConstantValue {
                    name: data.name,
                    span,
                });
                if cycle.root != field {
                    escaping = Some(cycle);
                }
                ConstValue::Bad
            }
        };

        let (published, won) = self.ctx.cache().publish_constant(
            field,
            EvaluatedConstant {
                value,
                diagnostics: frame.diagnostics.into_vec(),
                depends_on: frame.depends_on,
            },
        );
        if won {
            report.extend(published.diagnostics.iter().cloned());
        }
        escaping.map_or_else(|| Ok(published.value.clone()), Err)
    }

    /// The outermost in-progress frame reachable from the published `field`
    ///
    /// Walks the recorded references of published constants. A referenced
    /// constant that is not published yet is being evaluated by another
    /// thread; it is evaluated here as well so the walk can continue.
    fn reentered_frame(
        &self,
        field: SymbolId,
        in_progress: &ConsList<'_, SymbolId>,
        report: &mut Diagnostics,
    ) -> Option<SymbolId> {
        if in_progress.head().is_none() {
            return None;
        }

        let mut deepest: Option<(usize, SymbolId)> = None;
        let mut reach = |frame: SymbolId, depth: usize| {
            if deepest.is_none_or(|(current, _)| depth > current) {
                deepest = Some((depth, frame));
            }
        };
        let depth_of = |constant: SymbolId| in_progress.iter().position(|frame| *frame == constant);

        let mut seen = FxHashSet::default();
        let mut pending = vec![field];
        while let Some(next) = pending.pop() {
            if !seen.insert(next) {
                continue;
            }
            if let Some(depth) = depth_of(next) {
                reach(next, depth);
                continue;
            }
            let forced = self
                .ctx
                .cache()
                .constant(next)
                .is_none()
                .then(|| self.field_value(next, in_progress, report).err())
                .flatten();
            if let Some((root, depth)) = forced.and_then(|cycle| depth_of(cycle.root).map(|depth| (cycle.root, depth))) {
                reach(root, depth);
            }
            if let Some(done) = self.ctx.cache().constant(next) {
                pending.extend(done.depends_on.iter().copied());
            }
        }
        deepest.map(|(_, frame)| frame)
    }

    /// Runs `body` in the member scope of `container`, nested in its own containers
    fn in_container_scope(&self, container: SymbolId, body: &mut dyn FnMut(&Scope<'_>)) {
        match self.ctx.graph().get(container).container {
            Some(parent) => self.in_container_scope(parent, &mut |outer: &Scope<'_>| {
                body(&outer.enter_container(container));
            }),
            None => match self.root {
                Some(root) => body(root),
                None => body(&Scope::global(self.ctx)),
            },
        }
    }

    fn eval_expr(
        &self,
        scope: &Scope<'_>,
        frame: &mut Frame,
        expr: &Expr,
        in_progress: &ConsList<'_, SymbolId>,
        report: &mut Diagnostics,
    ) -> Eval {
        match expr {
            Expr::Literal { value, .. } => Ok(match value {
                Literal::Int(value) => ConstValue::Int(*value),
                Literal::Bool(value) => ConstValue::Bool(*value),
                Literal::String(value) => ConstValue::String(value.clone()),
                Literal::Null => ConstValue::Null,
            }),
            Expr::Binary {
                location,
                op,
                left,
                right,
            } => {
                let left = self.eval_expr(scope, frame, left, in_progress, report);
                let right = self.eval_expr(scope, frame, right, in_progress, report);
                match (left, right) {
                    (Ok(left), Ok(right)) => Ok(self.binary(frame, *op, left, right, location.span)),
                    (Err(left), Err(right)) => Err(left.outermost(right, in_progress)),
                    (Err(cycle), Ok(_)) | (Ok(_), Err(cycle)) => Err(cycle),
                }
            }
            Expr::Identifier(identifier) => {
                let span = identifier.location.span;
                let result = scope.lookup(self.ctx, identifier.name, 0, LookupOptions::MUST_NOT_BE_NAMESPACE);
                self.referenced_value(frame, &result, identifier.name, span, in_progress, report)
            }
            Expr::MemberAccess {
                location,
                receiver,
                name,
            } => {
                let Some(container) = self.container_of(scope, receiver) else {
                    return Ok(self.not_constant(frame, location.span));
                };
                let graph = self.ctx.graph();
                let result = if graph.get(container).is_type() {
                    lookup_members_in_type(
                        self.ctx,
                        container,
                        name.name,
                        0,
                        LookupOptions::empty(),
                        scope.containing_type(self.ctx),
                    )
                } else {
                    let request = LookupRequest::new(name.name, 0, LookupOptions::empty());
                    let mut result = LookupResult::empty();
                    for member in graph.members(container, name.name) {
                        result.merge_equal(request.check(self.ctx, Symbol::Global(*member)));
                    }
                    result
                };
                self.referenced_value(frame, &result, name.name, name.location.span, in_progress, report)
            }
            other => Ok(self.not_constant(frame, other.location().span)),
        }
    }

    fn referenced_value(
        &self,
        frame: &mut Frame,
        result: &LookupResult,
        name: Name,
        span: FileSpan,
        in_progress: &ConsList<'_, SymbolId>,
        report: &mut Diagnostics,
    ) -> Eval {
        if let Some(diagnostic) = result.to_diagnostic(name, 0, span) {
            frame.diagnostics.push(diagnostic);
            return Ok(ConstValue::Bad);
        }

        let graph = self.ctx.graph();
        let referenced = result
            .single_symbol()
            .and_then(Symbol::as_global)
            .filter(|id| graph.get(*id).as_field().is_some_and(|data| data.constant.is_some()));
        match referenced {
            Some(constant) => {
                if !frame.depends_on.contains(&constant) {
                    frame.depends_on.push(constant);
                }
                self.field_value(constant, in_progress, report)
            }
            None => Ok(self.not_constant(frame, span)),
        }
    }

    fn container_of(&self, scope: &Scope<'_>, receiver: &Expr) -> Option<SymbolId> {
        let graph = self.ctx.graph();
        match receiver {
            Expr::Identifier(identifier) => scope
                .lookup(self.ctx, identifier.name, 0, LookupOptions::NAMESPACES_OR_TYPES_ONLY)
                .single_symbol()
                .and_then(Symbol::target),
            Expr::MemberAccess { receiver, name, .. } => {
                let outer = self.container_of(scope, receiver)?;
                graph.members(outer, name.name).iter().copied().find(|member| {
                    let data = graph.get(*member);
                    data.is_namespace_or_type() && data.arity() == 0
                })
            }
            _ => None,
        }
    }

    fn not_constant(&self, frame: &mut Frame, span: FileSpan) -> ConstValue {
        frame.diagnostics.push(Diagnostic::NotConstant {
            name: self.ctx.graph().name(frame.field),
            span,
        });
        ConstValue::Bad
    }

    fn binary(&self, frame: &mut Frame, op: BinaryOp, left: ConstValue, right: ConstValue, span: FileSpan) -> ConstValue {
        use ConstValue::{Bad, Bool, Int, Null, String};

        let overflow = |frame: &mut Frame| {
            frame.diagnostics.push(Diagnostic::ConstantOverflow { span });
            Bad
        };

        match (op, left, right) {
            (_, Bad, _) | (_, _, Bad) => Bad,
            (BinaryOp::Add, Int(left), Int(right)) => left.checked_add(right).map_or_else(|| overflow(frame), Int),
            (BinaryOp::Sub, Int(left), Int(right)) => left.checked_sub(right).map_or_else(|| overflow(frame), Int),
            (BinaryOp::Mul, Int(left), Int(right)) => left.checked_mul(right).map_or_else(|| overflow(frame), Int),
            (BinaryOp::Add, String(left), String(right)) => String(left + &right),
            (BinaryOp::Less, Int(left), Int(right)) => Bool(left < right),
            (BinaryOp::Equal, Int(left), Int(right)) => Bool(left == right),
            (BinaryOp::Equal, Bool(left), Bool(right)) => Bool(left == right),
            (BinaryOp::Equal, String(left), String(right)) => Bool(left == right),
            (BinaryOp::Equal, Null, Null) => Bool(true),
            (BinaryOp::And, Bool(left), Bool(right)) => Bool(left && right),
            (BinaryOp::Or, Bool(left), Bool(right)) => Bool(left || right),
            _ => self.not_constant(frame, span),
        }
    }
}

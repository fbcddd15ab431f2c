//! Structural matching of `await` operands
//!
//! An operand is awaitable when it has a parameterless `GetAwaiter` method
//! (instance or extension) whose result has a readable boolean `IsCompleted`,
//! converts to the completion-notification interface, and has a
//! parameterless `GetResult`. No nominal awaitable interface is involved.
//!
//! Matching runs as a fixed sequence of steps; the first failing step
//! decides the diagnostic.

use crate::context::BindContext;
use crate::error::{AsyncContextError, Diagnostic, Diagnostics, ForbiddenAwaitContext};
use crate::options::{LookupOptions, ScopeFlags};
use crate::scope::{Scope, ScopeKind, lookup_members_in_type};
use crate::symbol::Symbol;
use sb_span::FileSpan;
use sb_symbols::{MethodData, SpecialType, SymbolId, Ty};
use tracing::debug;

const GET_AWAITER: &str = "GetAwaiter";
const IS_COMPLETED: &str = "IsCompleted";
const GET_RESULT: &str = "GetResult";

/// The awaited expression, already bound by the caller
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AwaitOperand {
    /// Static type of the operand
    pub ty: Ty,
    /// Location of the operand
    pub span: FileSpan,
}

/// Members that satisfied the awaiter pattern
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AwaiterMembers {
    /// `GetAwaiter`, instance or extension
    pub get_awaiter: Option<SymbolId>,
    /// `IsCompleted`
    pub is_completed: Option<SymbolId>,
    /// `GetResult`
    pub get_result: Option<SymbolId>,
}

/// Outcome of binding an `await`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoundAwait {
    /// Type of the `await` expression
    pub result_type: Ty,
    /// The pattern members used
    pub members: AwaiterMembers,
    /// Whether any step failed
    pub has_errors: bool,
}

impl BoundAwait {
    fn failed() -> Self {
        Self {
            result_type: Ty::Error,
            members: AwaiterMembers::default(),
            has_errors: true,
        }
    }
}

/// Binds `await operand` in `scope`, reporting failures to `diagnostics`
pub fn bind_await(
    ctx: &BindContext<'_>,
    scope: &Scope<'_>,
    operand: &AwaitOperand,
    diagnostics: &mut Diagnostics,
) -> BoundAwait {
    let outcome = check_async_context(ctx, scope, operand.span)
        .and_then(|()| check_forbidden_region(scope, operand.span))
        .and_then(|()| match_awaiter_pattern(ctx, scope, operand));

    match outcome {
        Ok(Some(bound)) => bound,
        Ok(None) => BoundAwait::failed(),
        Err(diagnostic) => {
            debug!(?diagnostic, "await pattern rejected");
            diagnostics.push(diagnostic);
            BoundAwait::failed()
        }
    }
}

/// Whether `await operand` would bind without errors; reports nothing
#[must_use]
pub fn is_awaitable(ctx: &BindContext<'_>, scope: &Scope<'_>, operand: &AwaitOperand) -> bool {
    let mut discarded = Diagnostics::new();
    !bind_await(ctx, scope, operand, &mut discarded).has_errors
}

fn check_async_context(ctx: &BindContext<'_>, scope: &Scope<'_>, span: FileSpan) -> Result<(), Diagnostic> {
    let context = match scope.executable_unit().map(Scope::kind) {
        Some(ScopeKind::Method(method)) => match ctx.graph().get(*method).as_method() {
            Some(data) if data.is_async => return Ok(()),
            Some(data) if data.returns() == Ty::Void => AsyncContextError::NonAsyncVoidMethod,
            Some(_) => AsyncContextError::NonAsyncMethod,
            None => AsyncContextError::NotInMethod,
        },
        Some(ScopeKind::Lambda(lambda)) if lambda.is_query => AsyncContextError::NonAsyncQueryLambda,
        Some(ScopeKind::Lambda(lambda)) if lambda.is_async => return Ok(()),
        Some(ScopeKind::Lambda(_)) => AsyncContextError::NonAsyncLambda,
        _ => AsyncContextError::NotInMethod,
    };
    Err(Diagnostic::AwaitWithoutAsyncContext { context, span })
}

fn check_forbidden_region(scope: &Scope<'_>, span: FileSpan) -> Result<(), Diagnostic> {
    let flags = scope.flags();
    let context = if flags.contains(ScopeFlags::IN_LOCK_BODY) {
        ForbiddenAwaitContext::Lock
    } else if flags.contains(ScopeFlags::IN_CATCH_FILTER) {
        ForbiddenAwaitContext::CatchFilter
    } else if flags.contains(ScopeFlags::UNSAFE_CONTEXT) {
        ForbiddenAwaitContext::Unsafe
    } else {
        return Ok(());
    };
    Err(Diagnostic::AwaitInForbiddenContext { context, span })
}

/// `Ok(None)` means the operand was already erroneous and nothing is reported
fn match_awaiter_pattern(
    ctx: &BindContext<'_>,
    scope: &Scope<'_>,
    operand: &AwaitOperand,
) -> Result<Option<BoundAwait>, Diagnostic> {
    let span = operand.span;
    match operand.ty {
        Ty::Dynamic => {
            return Ok(Some(BoundAwait {
                result_type: Ty::Dynamic,
                members: AwaiterMembers::default(),
                has_errors: false,
            }));
        }
        Ty::Error => return Ok(None),
        Ty::Void => return Err(Diagnostic::NoGetAwaiter { span }),
        Ty::Named(_) | Ty::Anonymous(_) => {}
    }

    let graph = ctx.graph();
    let within = scope.containing_type(ctx);

    let get_awaiter = find_get_awaiter(ctx, scope, &operand.ty, within)
        .ok_or(Diagnostic::NoGetAwaiter { span })?;
    let awaiter_ty = method_data(ctx, get_awaiter).map_or(Ty::Error, MethodData::returns);
    let Ty::Named(awaiter) = awaiter_ty else {
        return Err(Diagnostic::NoGetAwaiter { span });
    };

    let is_completed = find_is_completed(ctx, awaiter, within).ok_or(Diagnostic::BadAwaiterPattern { span })?;

    let notifies = graph
        .special_type(SpecialType::NotifyCompletion)
        .is_some_and(|notify| graph.has_implicit_reference_conversion(&awaiter_ty, notify));
    if !notifies {
        return Err(Diagnostic::AwaiterNotNotifyCompletion { span });
    }

    let get_result = find_get_result(ctx, awaiter, within, span)?;
    let result_type = method_data(ctx, get_result).map_or(Ty::Void, MethodData::returns);

    Ok(Some(BoundAwait {
        result_type,
        members: AwaiterMembers {
            get_awaiter: Some(get_awaiter),
            is_completed: Some(is_completed),
            get_result: Some(get_result),
        },
        has_errors: false,
    }))
}

fn method_data<'graph>(ctx: &BindContext<'graph>, method: SymbolId) -> Option<&'graph MethodData> {
    ctx.graph().get(method).as_method()
}

fn instance_members(ctx: &BindContext<'_>, ty: SymbolId, text: &str, within: Option<SymbolId>) -> Vec<SymbolId> {
    let Some(name) = ctx.interner().get(text) else {
        return Vec::new();
    };
    let result = lookup_members_in_type(ctx, ty, name, 0, LookupOptions::MUST_BE_INSTANCE, within);
    if !result.is_found() {
        return Vec::new();
    }
    result.symbols().iter().filter_map(Symbol::as_global).collect()
}

fn is_parameterless(data: &MethodData) -> bool {
    data.parameters.is_empty() && data.type_parameters.is_empty()
}

fn find_get_awaiter(
    ctx: &BindContext<'_>,
    scope: &Scope<'_>,
    operand: &Ty,
    within: Option<SymbolId>,
) -> Option<SymbolId> {
    let graph = ctx.graph();
    if let Ty::Named(ty) = operand
        && graph.get(*ty).is_type()
    {
        let members = instance_members(ctx, *ty, GET_AWAITER, within);
        if !members.is_empty() {
            return members
                .into_iter()
                .find(|member| method_data(ctx, *member).is_some_and(is_parameterless));
        }
    }

    let name = ctx.interner().get(GET_AWAITER)?;
    let mut applicable = scope
        .lookup_extension_methods(ctx, name)
        .into_iter()
        .filter(|method| {
            method_data(ctx, *method).is_some_and(|data| {
                data.type_parameters.is_empty()
                    && data.parameters.len() == 1
                    && accepts(ctx, data.parameters[0], operand)
            })
        });
    let first = applicable.next()?;
    applicable.next().is_none().then_some(first)
}

fn accepts(ctx: &BindContext<'_>, parameter: SymbolId, operand: &Ty) -> bool {
    let graph = ctx.graph();
    match graph.value_type(parameter) {
        Ty::Named(target) => graph.has_implicit_reference_conversion(operand, target),
        Ty::Dynamic => true,
        _ => false,
    }
}

fn find_is_completed(ctx: &BindContext<'_>, awaiter: SymbolId, within: Option<SymbolId>) -> Option<SymbolId> {
    let graph = ctx.graph();
    let members = instance_members(ctx, awaiter, IS_COMPLETED, within);
    let [property] = members.as_slice() else {
        return None;
    };
    let data = graph.get(*property).as_property()?;
    let readable_bool = data.has_getter && !data.is_static && graph.is_special(&data.ty, SpecialType::Boolean);
    readable_bool.then_some(*property)
}

fn find_get_result(
    ctx: &BindContext<'_>,
    awaiter: SymbolId,
    within: Option<SymbolId>,
    span: FileSpan,
) -> Result<SymbolId, Diagnostic> {
    let members = instance_members(ctx, awaiter, GET_RESULT, within);
    if members.is_empty() {
        return Err(Diagnostic::NoGetResult { span });
    }
    members
        .into_iter()
        .find(|member| {
            method_data(ctx, *member).is_some_and(|data| {
                is_parameterless(data) && !data.is_static && !data.is_extension && !data.is_conditional
            })
        })
        .ok_or(Diagnostic::BadAwaiterPattern { span })
}

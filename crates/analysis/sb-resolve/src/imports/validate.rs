//! One-time validation of import tables
//!
//! Validation forces every alias target, checks type-argument constraints
//! and alias/member conflicts, and publishes the resulting diagnostics. One
//! thread validates while the others wait; a cancelled validation leaves the
//! table as if it had never started.

use super::ImportTable;
use crate::error::Cancelled;
use crate::context::BindContext;
use crate::error::Diagnostic;
use crate::scope::Scope;
use sb_span::FileSpan;
use sb_symbols::{SymbolGraph, SymbolId, SymbolKind, Ty, TypeParameterConstraint};
use std::sync::atomic::{AtomicU8, Ordering};
use tracing::{debug, trace};

const NOT_STARTED: u8 = 0;
const IN_PROGRESS: u8 = 1;
const DONE: u8 = 2;

/// Where a once-only piece of work stands
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum CompletionPhase {
    /// Nobody has claimed the work
    NotStarted,
    /// One thread is doing it
    InProgress,
    /// Finished and published
    Done,
}

/// Atomic three-state progress marker
#[derive(Debug, Default)]
pub struct CompletionState {
    state: AtomicU8,
}

impl CompletionState {
    /// A marker in [`CompletionPhase::NotStarted`]
    #[must_use]
    pub const fn new() -> Self {
        Self {
            state: AtomicU8::new(NOT_STARTED),
        }
    }

    /// Current phase
    #[must_use]
    pub fn phase(&self) -> CompletionPhase {
        match self.state.load(Ordering::Acquire) {
            NOT_STARTED => CompletionPhase::NotStarted,
            IN_PROGRESS => CompletionPhase::InProgress,
            _ => CompletionPhase::Done,
        }
    }

    /// Claims the work; true for exactly one caller until reset
    pub fn try_start(&self) -> bool {
        self.state
            .compare_exchange(NOT_STARTED, IN_PROGRESS, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    /// Marks claimed work as done
    pub fn finish(&self) {
        self.state.store(DONE, Ordering::Release);
    }

    /// Gives claimed work back
    pub fn reset(&self) {
        self.state.store(NOT_STARTED, Ordering::Release);
    }
}

#[allow(clippy::multiple_inherent_impl, reason = "Validation runs after the table is published")]
impl ImportTable {
    /// Validates the table once and returns its diagnostics
    ///
    /// Every caller gets the same slice. Build diagnostics come first,
    /// followed by alias-target problems in alias declaration order.
    ///
    /// # Errors
    ///
    /// Returns [`Cancelled`] when the context's token fires while this thread
    /// is validating or waiting. The table is then left unvalidated and a
    /// later call starts over.
    pub fn validate(
        &self,
        ctx: &BindContext<'_>,
        next: Option<&Scope<'_>>,
        container: SymbolId,
    ) -> Result<&[Diagnostic], Cancelled> {
        loop {
            if let Some(diagnostics) = self.validation.get() {
                return Ok(diagnostics);
            }
            ctx.cancellation().check()?;

            if self.state.try_start() {
                match self.run_validation(ctx, next, container) {
                    Ok(diagnostics) => {
                        let published = self.validation.get_or_publish(|| diagnostics);
                        self.state.finish();
                        debug!(diagnostics = published.len(), "validated import table");
                        return Ok(published);
                    }
                    Err(cancelled) => {
                        self.state.reset();
                        debug!("import validation cancelled");
                        return Err(cancelled);
                    }
                }
            }

            std::hint::spin_loop();
            std::thread::yield_now();
        }
    }

    /// Whether validation has completed
    #[must_use]
    pub fn is_validated(&self) -> bool {
        self.state.phase() == CompletionPhase::Done
    }

    fn run_validation(
        &self,
        ctx: &BindContext<'_>,
        next: Option<&Scope<'_>>,
        container: SymbolId,
    ) -> Result<Vec<Diagnostic>, Cancelled> {
        let graph = ctx.graph();
        let resolution = self.resolution_scope(next, container);
        let mut diagnostics = self.diagnostics.clone();

        for alias in self.aliases.values() {
            ctx.cancellation().check()?;
            trace!(alias = ctx.interner().resolve(alias.name()), "validating alias");

            let target = alias.force_target(ctx, &resolution);
            diagnostics.extend(target.diagnostics.iter().cloned());
            if let Some(symbol) = target.symbol {
                check_constraints(graph, symbol, &target.type_arguments, &mut diagnostics);
            }

            if !graph.members(container, alias.name()).is_empty() {
                diagnostics.push(Diagnostic::AliasConflictsWithMember {
                    name: alias.name(),
                    span: alias.location().span,
                });
            }
        }

        Ok(diagnostics)
    }
}

fn check_constraints(
    graph: &SymbolGraph,
    generic: SymbolId,
    arguments: &[(Ty, FileSpan)],
    diagnostics: &mut Vec<Diagnostic>,
) {
    let Some(ty) = graph.get(generic).as_type() else {
        return;
    };

    for (parameter, (argument, span)) in ty.type_parameters.iter().zip(arguments) {
        let data = graph.get(*parameter);
        let SymbolKind::TypeParameter(param) = &data.kind else {
            continue;
        };
        let satisfied = match param.constraint {
            None => true,
            Some(constraint) => satisfies(graph, argument, constraint),
        };
        if !satisfied {
            diagnostics.push(Diagnostic::ConstraintViolation {
                parameter: data.name,
                span: *span,
            });
        }
    }
}

fn satisfies(graph: &SymbolGraph, argument: &Ty, constraint: TypeParameterConstraint) -> bool {
    let reference = match argument {
        Ty::Error => return true,
        Ty::Void => return false,
        Ty::Dynamic | Ty::Anonymous(_) => true,
        Ty::Named(id) => match &graph.get(*id).kind {
            SymbolKind::Type(ty) => ty.type_kind.is_reference_type(),
            SymbolKind::TypeParameter(param) => match param.constraint {
                Some(own) => own == TypeParameterConstraint::ReferenceType,
                None => return false,
            },
            _ => return true,
        },
    };
    match constraint {
        TypeParameterConstraint::ReferenceType => reference,
        TypeParameterConstraint::ValueType => !reference,
    }
}

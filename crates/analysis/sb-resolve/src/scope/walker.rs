//! Declaration walker shared by the statement-level scopes
//!
//! The walker visits only what belongs to the scope being built: the
//! direct statements of a block and the expressions they contain. It never
//! descends into nested blocks, embedded statements, lambdas or queries,
//! which get scopes of their own.

use super::locals::LocalTable;
use crate::error::Diagnostic;
use crate::symbol::{LocalDeclarationKind, LocalKind, LocalSymbol, Symbol};
use sb_intern::Name;
use sb_symbols::{NameMap, SymbolId};
use sb_syntax::{
    ArgumentKind, Designation, Expr, Identifier, Pattern, Stmt, VariableDeclaration,
};
use std::sync::Arc;

#[derive(Default)]
pub(super) struct TableBuilder {
    locals: NameMap<Symbol>,
    labels: NameMap<Symbol>,
    diagnostics: Vec<Diagnostic>,
}

impl TableBuilder {
    pub(super) fn finish(self) -> LocalTable {
        LocalTable {
            locals: self.locals,
            labels: self.labels,
            diagnostics: self.diagnostics,
        }
    }

    pub(super) fn add_global(&mut self, name: Name, symbol: SymbolId) {
        self.locals.insert(name, Symbol::Global(symbol));
    }

    pub(super) fn add_local(&mut self, identifier: Identifier, kind: LocalKind) {
        if self.locals.contains(identifier.name) {
            self.diagnostics.push(Diagnostic::LocalDuplicate {
                name: identifier.name,
                span: identifier.location.span,
            });
        }
        let local = LocalSymbol::new(identifier.name, kind, identifier.location);
        self.locals
            .insert(identifier.name, Symbol::Local(Arc::new(local)));
    }

    fn add_label(&mut self, identifier: Identifier) {
        if self.labels.contains(identifier.name) {
            self.diagnostics.push(Diagnostic::LocalDuplicate {
                name: identifier.name,
                span: identifier.location.span,
            });
        }
        let label = LocalSymbol::new(identifier.name, LocalKind::Label, identifier.location);
        self.labels
            .insert(identifier.name, Symbol::Local(Arc::new(label)));
    }

    pub(super) fn declare_statements(&mut self, statements: &[Stmt]) {
        for statement in statements {
            self.declare_statement(statement);
        }
    }

    pub(super) fn declare_statement(&mut self, statement: &Stmt) {
        match statement {
            Stmt::LocalDeclaration(declaration) => {
                self.declare_variables(declaration, LocalDeclarationKind::Regular);
            }
            Stmt::Expression { expr, .. } => self.find_expression_variables(expr),
            Stmt::Labeled {
                label, statement, ..
            } => {
                self.add_label(*label);
                self.declare_statement(statement);
            }
            Stmt::If { condition, .. } => self.find_expression_variables(condition),
            Stmt::Lock { expr, .. } => self.find_expression_variables(expr),
            Stmt::Return {
                expr: Some(expr), ..
            } => self.find_expression_variables(expr),
            Stmt::Return { expr: None, .. }
            | Stmt::Block(_)
            | Stmt::While(_)
            | Stmt::For(_)
            | Stmt::Fixed(_)
            | Stmt::Try(_)
            | Stmt::Unsafe { .. } => {}
        }
    }

    pub(super) fn declare_variables(
        &mut self,
        declaration: &VariableDeclaration,
        kind: LocalDeclarationKind,
    ) {
        for declarator in &declaration.declarators {
            self.add_local(declarator.name, LocalKind::Variable(kind));
            if let Some(initializer) = &declarator.initializer {
                self.find_expression_variables(initializer);
            }
        }
    }

    pub(super) fn find_expression_variables(&mut self, expr: &Expr) {
        match expr {
            Expr::Identifier(_) | Expr::Literal { .. } | Expr::Lambda(_) | Expr::Query(_) => {}
            Expr::Binary { left, right, .. } => {
                self.find_expression_variables(left);
                self.find_expression_variables(right);
            }
            Expr::MemberAccess { receiver, .. } => {
                self.find_expression_variables(receiver);
            }
            Expr::Invocation {
                callee, arguments, ..
            } => {
                self.find_expression_variables(callee);
                for argument in arguments {
                    match (&argument.kind, &argument.expr) {
                        (ArgumentKind::Out, Expr::Declaration { designation, .. }) => {
                            self.declare_designation(designation, LocalDeclarationKind::OutVariable);
                        }
                        (_, expr) => self.find_expression_variables(expr),
                    }
                }
            }
            Expr::IsPattern {
                operand, pattern, ..
            } => {
                self.find_expression_variables(operand);
                self.declare_pattern(pattern);
            }
            Expr::Declaration { designation, .. } => {
                self.declare_designation(designation, LocalDeclarationKind::Deconstruction);
            }
            Expr::Assignment { target, value, .. } => {
                self.find_expression_variables(target);
                self.find_expression_variables(value);
            }
            Expr::Await { operand, .. } => self.find_expression_variables(operand),
        }
    }

    fn declare_pattern(&mut self, pattern: &Pattern) {
        match pattern {
            Pattern::Declaration { designation, .. } | Pattern::Var { designation, .. } => {
                self.declare_designation(designation, LocalDeclarationKind::PatternVariable);
            }
            Pattern::Constant(expr) => self.find_expression_variables(expr),
            Pattern::Recursive {
                subpatterns,
                designation,
                ..
            } => {
                for subpattern in subpatterns {
                    self.declare_pattern(subpattern);
                }
                if let Some(designation) = designation {
                    self.declare_designation(designation, LocalDeclarationKind::PatternVariable);
                }
            }
            Pattern::Discard(_) => {}
        }
    }

    fn declare_designation(&mut self, designation: &Designation, kind: LocalDeclarationKind) {
        for identifier in designation.identifiers() {
            self.add_local(identifier, LocalKind::Variable(kind));
        }
    }
}

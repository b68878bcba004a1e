//! Static scope resolution.
//!
//! Walks the AST once, before evaluation, to compute how many environment
//! frames separate each variable reference from the frame that declares it.
//! The interpreter then looks bindings up by that fixed distance instead of
//! walking the frame chain and hoping the name it finds first is the right
//! one — the thing that makes closures over shadowed names resolve to the
//! binding that was in scope when the closure was written, not whatever
//! happens to be bound by the time it runs.

use ahash::AHashMap;

use crate::ast::expr::ExprKind;
use crate::ast::stmt::{FunctionDecl, StmtKind};
use crate::ast::{Expr, NodeId, Stmt};
use crate::diagnostics::DiagnosticSink;
use crate::token::Token;

/// Resolved variable distances, keyed by the referencing expression's
/// [`NodeId`]. A reference absent from this map is either a global or an
/// undeclared name, both of which the interpreter resolves dynamically
/// against the global environment at runtime.
pub type Locals = AHashMap<NodeId, usize>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FunctionType {
    None,
    Function,
}

pub struct Resolver<'a> {
    sink: &'a dyn DiagnosticSink,
    scopes: Vec<AHashMap<String, bool>>,
    locals: Locals,
    current_function: FunctionType,
}

/// Resolves `statements`, reporting scope errors to `sink`.
///
/// Returns the `locals` table the interpreter needs even when errors were
/// reported, so callers can decide for themselves (as the REPL does) whether
/// a resolve error should prevent execution.
#[must_use]
pub fn resolve(statements: &[Stmt], sink: &dyn DiagnosticSink) -> Locals {
    let mut resolver = Resolver::new(sink);
    resolver.resolve_statements(statements);
    resolver.locals
}

impl<'a> Resolver<'a> {
    fn new(sink: &'a dyn DiagnosticSink) -> Self {
        Self {
            sink,
            scopes: Vec::new(),
            locals: Locals::default(),
            current_function: FunctionType::None,
        }
    }

    fn resolve_statements(&mut self, statements: &[Stmt]) {
        for stmt in statements {
            self.resolve_stmt(stmt);
        }
    }

    fn begin_scope(&mut self) {
        self.scopes.push(AHashMap::new());
    }

    fn end_scope(&mut self) {
        self.scopes.pop();
    }

    /// Adds `name` to the innermost scope as not-yet-initialized.
    ///
    /// Declaring and defining are split into two steps specifically so a
    /// variable's own initializer can be checked against the name it is
    /// about to shadow: `var a = a;` should resolve the right-hand `a` to an
    /// enclosing scope (or error, if there is none), never to the
    /// not-yet-initialized local being declared.
    fn declare(&mut self, name: &Token) {
        let Some(scope) = self.scopes.last_mut() else { return };
        if scope.contains_key(&name.lexeme) {
            self.sink.token_error(name, "Already a variable with this name in this scope.");
        }
        scope.insert(name.lexeme.clone(), false);
    }

    fn define(&mut self, name: &Token) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(name.lexeme.clone(), true);
        }
    }

    fn resolve_local(&mut self, expr_id: NodeId, name: &Token) {
        for (depth, scope) in self.scopes.iter().rev().enumerate() {
            if scope.contains_key(&name.lexeme) {
                self.locals.insert(expr_id, depth);
                return;
            }
        }
        // Not found in any local scope: treated as a global at runtime.
    }

    fn resolve_function(&mut self, decl: &FunctionDecl, kind: FunctionType) {
        let enclosing_function = self.current_function;
        self.current_function = kind;

        self.begin_scope();
        for param in &decl.params {
            self.declare(param);
            self.define(param);
        }
        self.resolve_statements(&decl.body);
        self.end_scope();

        self.current_function = enclosing_function;
    }

    fn resolve_stmt(&mut self, stmt: &Stmt) {
        match &stmt.kind {
            StmtKind::Block { statements } => {
                self.begin_scope();
                self.resolve_statements(statements);
                self.end_scope();
            }
            StmtKind::Class { name, superclass, methods } => {
                self.declare(name);
                self.define(name);
                if let Some(superclass) = superclass {
                    self.resolve_expr(superclass);
                }
                for method in methods {
                    self.resolve_function(method, FunctionType::Function);
                }
            }
            StmtKind::ExpressionStmt { expression } => self.resolve_expr(expression),
            StmtKind::Function { declaration } => {
                self.declare(&declaration.name);
                self.define(&declaration.name);
                self.resolve_function(declaration, FunctionType::Function);
            }
            StmtKind::If { condition, then_branch, else_branch } => {
                self.resolve_expr(condition);
                self.resolve_stmt(then_branch);
                if let Some(else_branch) = else_branch {
                    self.resolve_stmt(else_branch);
                }
            }
            StmtKind::Print { expression } => self.resolve_expr(expression),
            StmtKind::Return { keyword, value } => {
                if self.current_function == FunctionType::None {
                    self.sink.token_error(keyword, "Can't return from top-level code.");
                }
                if let Some(value) = value {
                    self.resolve_expr(value);
                }
            }
            StmtKind::Var { name, initializer } => {
                self.declare(name);
                if let Some(initializer) = initializer {
                    self.resolve_expr(initializer);
                }
                self.define(name);
            }
            StmtKind::While { condition, body } => {
                self.resolve_expr(condition);
                self.resolve_stmt(body);
            }
        }
    }

    fn resolve_expr(&mut self, expr: &Expr) {
        match &expr.kind {
            ExprKind::Assign { name, value } => {
                self.resolve_expr(value);
                self.resolve_local(expr.id, name);
            }
            ExprKind::Binary { left, right, .. } | ExprKind::Logical { left, right, .. } => {
                self.resolve_expr(left);
                self.resolve_expr(right);
            }
            ExprKind::Call { callee, arguments, .. } => {
                self.resolve_expr(callee);
                for argument in arguments {
                    self.resolve_expr(argument);
                }
            }
            ExprKind::Get { object, .. } => self.resolve_expr(object),
            ExprKind::Grouping { expression } => self.resolve_expr(expression),
            ExprKind::Literal { .. } => {}
            ExprKind::Set { object, value, .. } => {
                self.resolve_expr(value);
                self.resolve_expr(object);
            }
            ExprKind::Super { keyword, .. } => self.resolve_local(expr.id, keyword),
            ExprKind::This { keyword } => self.resolve_local(expr.id, keyword),
            ExprKind::Unary { right, .. } => self.resolve_expr(right),
            ExprKind::Variable { name } => {
                if let Some(scope) = self.scopes.last() {
                    if scope.get(&name.lexeme) == Some(&false) {
                        self.sink.token_error(name, "Can't read local variable in its own initializer.");
                    }
                }
                self.resolve_local(expr.id, name);
            }
        }
    }
}

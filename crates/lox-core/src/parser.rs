//! Recursive-descent parser: turns a token stream into a list of statements.

use std::rc::Rc;

use crate::ast::{Expr, ExprKind, NodeId, NodeIdGen, Stmt, StmtKind};
use crate::ast::stmt::FunctionDecl;
use crate::diagnostics::DiagnosticSink;
use crate::token::{Literal, Token, TokenKind};

/// A parse error. The parser has already reported it to the sink by the
/// time this is returned; callers use it only to decide whether to keep the
/// partially-built statement list or discard it, never to format a message
/// themselves.
#[derive(Debug, Clone)]
pub struct ParseError;

type ParseResult<T> = Result<T, ParseError>;

/// Parses `tokens` into a program: a list of top-level statements.
///
/// Parsing never stops at the first error. Each failing declaration is
/// reported to `sink` and the parser synchronizes to the next statement
/// boundary, so a single typo doesn't hide every other error in the file.
#[must_use]
pub fn parse(tokens: Vec<Token>, sink: &dyn DiagnosticSink) -> Vec<Stmt> {
    let mut parser = Parser::new(tokens);
    let mut statements = Vec::new();
    while !parser.is_at_end() {
        match parser.declaration(sink) {
            Ok(stmt) => statements.push(stmt),
            Err(ParseError) => parser.synchronize(),
        }
    }
    statements
}

struct Parser {
    tokens: Vec<Token>,
    current: usize,
    ids: NodeIdGen,
}

impl Parser {
    fn new(tokens: Vec<Token>) -> Self {
        Self {
            tokens,
            current: 0,
            ids: NodeIdGen::new(),
        }
    }

    fn next_id(&mut self) -> NodeId {
        self.ids.next()
    }

    fn expr(&mut self, kind: ExprKind) -> Expr {
        let id = self.next_id();
        Expr::new(id, kind)
    }

    // --- token stream primitives -------------------------------------------------

    fn is_at_end(&self) -> bool {
        self.peek().kind == TokenKind::Endof
    }

    fn peek(&self) -> &Token {
        &self.tokens[self.current]
    }

    fn previous(&self) -> &Token {
        &self.tokens[self.current - 1]
    }

    fn advance(&mut self) -> Token {
        if !self.is_at_end() {
            self.current += 1;
        }
        self.previous().clone()
    }

    fn check(&self, kind: TokenKind) -> bool {
        !self.is_at_end() && self.peek().kind == kind
    }

    fn matches(&mut self, kinds: &[TokenKind]) -> bool {
        for kind in kinds {
            if self.check(*kind) {
                self.advance();
                return true;
            }
        }
        false
    }

    fn consume(&mut self, kind: TokenKind, message: &str, sink: &dyn DiagnosticSink) -> ParseResult<Token> {
        if self.check(kind) {
            return Ok(self.advance());
        }
        Err(self.error(&self.peek().clone(), message, sink))
    }

    fn error(&self, token: &Token, message: &str, sink: &dyn DiagnosticSink) -> ParseError {
        sink.token_error(token, message);
        ParseError
    }

    /// Discards tokens until the start of what looks like the next
    /// statement, so one bad declaration doesn't cascade into spurious
    /// errors for everything that follows it.
    fn synchronize(&mut self) {
        self.advance();
        while !self.is_at_end() {
            if self.previous().kind == TokenKind::Semicolon {
                return;
            }
            match self.peek().kind {
                TokenKind::Class
                | TokenKind::Fun
                | TokenKind::Var
                | TokenKind::For
                | TokenKind::If
                | TokenKind::While
                | TokenKind::Print
                | TokenKind::Return => return,
                _ => {
                    self.advance();
                }
            }
        }
    }

    // --- declarations -------------------------------------------------------------

    fn declaration(&mut self, sink: &dyn DiagnosticSink) -> ParseResult<Stmt> {
        if self.matches(&[TokenKind::Class]) {
            return self.class_declaration(sink);
        }
        if self.matches(&[TokenKind::Fun]) {
            return self.function_declaration("function", sink).map(|decl| Stmt::new(StmtKind::Function { declaration: decl }));
        }
        if self.matches(&[TokenKind::Var]) {
            return self.var_declaration(sink);
        }
        self.statement(sink)
    }

    fn class_declaration(&mut self, sink: &dyn DiagnosticSink) -> ParseResult<Stmt> {
        let name = self.consume(TokenKind::Identifier, "Expect class name.", sink)?;

        let superclass = if self.matches(&[TokenKind::Less]) {
            let super_name = self.consume(TokenKind::Identifier, "Expect superclass name.", sink)?;
            Some(self.expr(ExprKind::Variable { name: super_name }))
        } else {
            None
        };

        self.consume(TokenKind::LeftBrace, "Expect '{' before class body.", sink)?;
        let mut methods = Vec::new();
        while !self.check(TokenKind::RightBrace) && !self.is_at_end() {
            methods.push(self.function_declaration("method", sink)?);
        }
        self.consume(TokenKind::RightBrace, "Expect '}' after class body.", sink)?;

        Ok(Stmt::new(StmtKind::Class { name, superclass, methods }))
    }

    fn function_declaration(&mut self, kind: &str, sink: &dyn DiagnosticSink) -> ParseResult<Rc<FunctionDecl>> {
        let name = self.consume(TokenKind::Identifier, &format!("Expect {kind} name."), sink)?;
        self.consume(TokenKind::LeftParen, &format!("Expect '(' after {kind} name."), sink)?;
        let mut params = Vec::new();
        if !self.check(TokenKind::RightParen) {
            loop {
                if params.len() >= 255 {
                    self.error(&self.peek().clone(), "Can't have more than 255 parameters.", sink);
                }
                params.push(self.consume(TokenKind::Identifier, "Expect parameter name.", sink)?);
                if !self.matches(&[TokenKind::Comma]) {
                    break;
                }
            }
        }
        self.consume(TokenKind::RightParen, "Expect ')' after parameters.", sink)?;
        self.consume(TokenKind::LeftBrace, &format!("Expect '{{' before {kind} body."), sink)?;
        let body = self.block(sink)?;
        Ok(Rc::new(FunctionDecl { name, params, body }))
    }

    fn var_declaration(&mut self, sink: &dyn DiagnosticSink) -> ParseResult<Stmt> {
        let name = self.consume(TokenKind::Identifier, "Expect variable name.", sink)?;
        let initializer = if self.matches(&[TokenKind::Equal]) {
            Some(self.expression(sink)?)
        } else {
            None
        };
        self.consume(TokenKind::Semicolon, "Expect ';' after variable declaration.", sink)?;
        Ok(Stmt::new(StmtKind::Var { name, initializer }))
    }

    // --- statements -----------------------------------------------------------------

    fn statement(&mut self, sink: &dyn DiagnosticSink) -> ParseResult<Stmt> {
        if self.matches(&[TokenKind::For]) {
            return self.for_statement(sink);
        }
        if self.matches(&[TokenKind::If]) {
            return self.if_statement(sink);
        }
        if self.matches(&[TokenKind::Print]) {
            return self.print_statement(sink);
        }
        if self.matches(&[TokenKind::Return]) {
            return self.return_statement(sink);
        }
        if self.matches(&[TokenKind::While]) {
            return self.while_statement(sink);
        }
        if self.matches(&[TokenKind::LeftBrace]) {
            return Ok(Stmt::new(StmtKind::Block { statements: self.block(sink)? }));
        }
        self.expression_statement(sink)
    }

    /// Desugars `for (init; cond; incr) body` into the equivalent `while`
    /// loop wrapped in a block, rather than giving the AST and interpreter
    /// a dedicated `for` shape to handle.
    fn for_statement(&mut self, sink: &dyn DiagnosticSink) -> ParseResult<Stmt> {
        self.consume(TokenKind::LeftParen, "Expect '(' after 'for'.", sink)?;

        let initializer = if self.matches(&[TokenKind::Semicolon]) {
            None
        } else if self.check(TokenKind::Var) {
            self.advance();
            Some(self.var_declaration(sink)?)
        } else {
            Some(self.expression_statement(sink)?)
        };

        let condition = if self.check(TokenKind::Semicolon) {
            None
        } else {
            Some(self.expression(sink)?)
        };
        self.consume(TokenKind::Semicolon, "Expect ';' after loop condition.", sink)?;

        let increment = if self.check(TokenKind::RightParen) {
            None
        } else {
            Some(self.expression(sink)?)
        };
        self.consume(TokenKind::RightParen, "Expect ')' after for clauses.", sink)?;

        let mut body = self.statement(sink)?;

        if let Some(increment) = increment {
            body = Stmt::new(StmtKind::Block {
                statements: vec![body, Stmt::new(StmtKind::ExpressionStmt { expression: increment })],
            });
        }

        let condition = condition.unwrap_or_else(|| self.expr(ExprKind::Literal { value: Literal::Boolean(true) }));
        body = Stmt::new(StmtKind::While { condition, body: Box::new(body) });

        if let Some(initializer) = initializer {
            body = Stmt::new(StmtKind::Block { statements: vec![initializer, body] });
        }

        Ok(body)
    }

    fn if_statement(&mut self, sink: &dyn DiagnosticSink) -> ParseResult<Stmt> {
        self.consume(TokenKind::LeftParen, "Expect '(' after 'if'.", sink)?;
        let condition = self.expression(sink)?;
        self.consume(TokenKind::RightParen, "Expect ')' after if condition.", sink)?;

        let then_branch = Box::new(self.statement(sink)?);
        let else_branch = if self.matches(&[TokenKind::Else]) {
            Some(Box::new(self.statement(sink)?))
        } else {
            None
        };

        Ok(Stmt::new(StmtKind::If { condition, then_branch, else_branch }))
    }

    fn print_statement(&mut self, sink: &dyn DiagnosticSink) -> ParseResult<Stmt> {
        let expression = self.expression(sink)?;
        self.consume(TokenKind::Semicolon, "Expect ';' after value.", sink)?;
        Ok(Stmt::new(StmtKind::Print { expression }))
    }

    fn return_statement(&mut self, sink: &dyn DiagnosticSink) -> ParseResult<Stmt> {
        let keyword = self.previous().clone();
        let value = if self.check(TokenKind::Semicolon) {
            None
        } else {
            Some(self.expression(sink)?)
        };
        self.consume(TokenKind::Semicolon, "Expect ';' after return value.", sink)?;
        Ok(Stmt::new(StmtKind::Return { keyword, value }))
    }

    fn while_statement(&mut self, sink: &dyn DiagnosticSink) -> ParseResult<Stmt> {
        self.consume(TokenKind::LeftParen, "Expect '(' after 'while'.", sink)?;
        let condition = self.expression(sink)?;
        self.consume(TokenKind::RightParen, "Expect ')' after condition.", sink)?;
        let body = Box::new(self.statement(sink)?);
        Ok(Stmt::new(StmtKind::While { condition, body }))
    }

    fn block(&mut self, sink: &dyn DiagnosticSink) -> ParseResult<Vec<Stmt>> {
        let mut statements = Vec::new();
        while !self.check(TokenKind::RightBrace) && !self.is_at_end() {
            statements.push(self.declaration(sink)?);
        }
        self.consume(TokenKind::RightBrace, "Expect '}' after block.", sink)?;
        Ok(statements)
    }

    fn expression_statement(&mut self, sink: &dyn DiagnosticSink) -> ParseResult<Stmt> {
        let expression = self.expression(sink)?;
        self.consume(TokenKind::Semicolon, "Expect ';' after expression.", sink)?;
        Ok(Stmt::new(StmtKind::ExpressionStmt { expression }))
    }

    // --- expressions ------------------------------------------------------------------

    fn expression(&mut self, sink: &dyn DiagnosticSink) -> ParseResult<Expr> {
        self.assignment(sink)
    }

    fn assignment(&mut self, sink: &dyn DiagnosticSink) -> ParseResult<Expr> {
        let expr = self.or(sink)?;

        if self.matches(&[TokenKind::Equal]) {
            let equals = self.previous().clone();
            let value = self.assignment(sink)?;

            return match expr.kind {
                ExprKind::Variable { name } => Ok(self.expr(ExprKind::Assign { name, value: Box::new(value) })),
                ExprKind::Get { object, name } => Ok(self.expr(ExprKind::Set { object, name, value: Box::new(value) })),
                _ => {
                    self.error(&equals, "Invalid assignment target.", sink);
                    Ok(expr)
                }
            };
        }

        Ok(expr)
    }

    fn or(&mut self, sink: &dyn DiagnosticSink) -> ParseResult<Expr> {
        let mut expr = self.and(sink)?;
        while self.matches(&[TokenKind::Or]) {
            let operator = self.previous().clone();
            let right = self.and(sink)?;
            expr = self.expr(ExprKind::Logical { left: Box::new(expr), operator, right: Box::new(right) });
        }
        Ok(expr)
    }

    fn and(&mut self, sink: &dyn DiagnosticSink) -> ParseResult<Expr> {
        let mut expr = self.equality(sink)?;
        while self.matches(&[TokenKind::And]) {
            let operator = self.previous().clone();
            let right = self.equality(sink)?;
            expr = self.expr(ExprKind::Logical { left: Box::new(expr), operator, right: Box::new(right) });
        }
        Ok(expr)
    }

    fn equality(&mut self, sink: &dyn DiagnosticSink) -> ParseResult<Expr> {
        let mut expr = self.comparison(sink)?;
        while self.matches(&[TokenKind::BangEqual, TokenKind::EqualEqual]) {
            let operator = self.previous().clone();
            let right = self.comparison(sink)?;
            expr = self.expr(ExprKind::Binary { left: Box::new(expr), operator, right: Box::new(right) });
        }
        Ok(expr)
    }

    fn comparison(&mut self, sink: &dyn DiagnosticSink) -> ParseResult<Expr> {
        let mut expr = self.term(sink)?;
        while self.matches(&[TokenKind::Greater, TokenKind::GreaterEqual, TokenKind::Less, TokenKind::LessEqual]) {
            let operator = self.previous().clone();
            let right = self.term(sink)?;
            expr = self.expr(ExprKind::Binary { left: Box::new(expr), operator, right: Box::new(right) });
        }
        Ok(expr)
    }

    fn term(&mut self, sink: &dyn DiagnosticSink) -> ParseResult<Expr> {
        let mut expr = self.factor(sink)?;
        while self.matches(&[TokenKind::Minus, TokenKind::Plus]) {
            let operator = self.previous().clone();
            let right = self.factor(sink)?;
            expr = self.expr(ExprKind::Binary { left: Box::new(expr), operator, right: Box::new(right) });
        }
        Ok(expr)
    }

    fn factor(&mut self, sink: &dyn DiagnosticSink) -> ParseResult<Expr> {
        let mut expr = self.unary(sink)?;
        while self.matches(&[TokenKind::Slash, TokenKind::Star]) {
            let operator = self.previous().clone();
            let right = self.unary(sink)?;
            expr = self.expr(ExprKind::Binary { left: Box::new(expr), operator, right: Box::new(right) });
        }
        Ok(expr)
    }

    fn unary(&mut self, sink: &dyn DiagnosticSink) -> ParseResult<Expr> {
        if self.matches(&[TokenKind::Bang, TokenKind::Minus]) {
            let operator = self.previous().clone();
            let right = self.unary(sink)?;
            return Ok(self.expr(ExprKind::Unary { operator, right: Box::new(right) }));
        }
        self.call(sink)
    }

    fn call(&mut self, sink: &dyn DiagnosticSink) -> ParseResult<Expr> {
        let mut expr = self.primary(sink)?;

        loop {
            if self.matches(&[TokenKind::LeftParen]) {
                expr = self.finish_call(expr, sink)?;
            } else if self.matches(&[TokenKind::Dot]) {
                let name = self.consume(TokenKind::Identifier, "Expect property name after '.'.", sink)?;
                expr = self.expr(ExprKind::Get { object: Box::new(expr), name });
            } else {
                break;
            }
        }

        Ok(expr)
    }

    fn finish_call(&mut self, callee: Expr, sink: &dyn DiagnosticSink) -> ParseResult<Expr> {
        let mut arguments = Vec::new();
        if !self.check(TokenKind::RightParen) {
            loop {
                if arguments.len() >= 255 {
                    self.error(&self.peek().clone(), "Can't have more than 255 arguments.", sink);
                }
                arguments.push(self.expression(sink)?);
                if !self.matches(&[TokenKind::Comma]) {
                    break;
                }
            }
        }
        let paren = self.consume(TokenKind::RightParen, "Expect ')' after arguments.", sink)?;
        Ok(self.expr(ExprKind::Call { callee: Box::new(callee), paren, arguments }))
    }

    fn primary(&mut self, sink: &dyn DiagnosticSink) -> ParseResult<Expr> {
        if self.matches(&[TokenKind::Boolean]) {
            let value = self.previous().literal.clone();
            debug_assert!(matches!(value, Literal::Boolean(_)));
            return Ok(self.expr(ExprKind::Literal { value }));
        }
        if self.matches(&[TokenKind::Nil]) {
            return Ok(self.expr(ExprKind::Literal { value: Literal::None }));
        }
        if self.matches(&[TokenKind::Number, TokenKind::String]) {
            let value = self.previous().literal.clone();
            return Ok(self.expr(ExprKind::Literal { value }));
        }
        if self.matches(&[TokenKind::Super]) {
            let keyword = self.previous().clone();
            self.consume(TokenKind::Dot, "Expect '.' after 'super'.", sink)?;
            let method = self.consume(TokenKind::Identifier, "Expect superclass method name.", sink)?;
            return Ok(self.expr(ExprKind::Super { keyword, method }));
        }
        if self.matches(&[TokenKind::This]) {
            let keyword = self.previous().clone();
            return Ok(self.expr(ExprKind::This { keyword }));
        }
        if self.matches(&[TokenKind::Identifier]) {
            let name = self.previous().clone();
            return Ok(self.expr(ExprKind::Variable { name }));
        }
        if self.matches(&[TokenKind::LeftParen]) {
            let expression = self.expression(sink)?;
            self.consume(TokenKind::RightParen, "Expect ')' after expression.", sink)?;
            return Ok(self.expr(ExprKind::Grouping { expression: Box::new(expression) }));
        }

        Err(self.error(&self.peek().clone(), "Expect expression.", sink))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::CollectingSink;
    use crate::scanner;

    fn parse_source(source: &str) -> (Vec<Stmt>, Vec<String>) {
        let sink = CollectingSink::new();
        let tokens = scanner::scan_tokens(source, &sink);
        let statements = parse(tokens, &sink);
        (statements, sink.messages())
    }

    #[test]
    fn parses_expression_statement() {
        let (statements, errors) = parse_source("1 + 2;");
        assert!(errors.is_empty());
        assert_eq!(statements.len(), 1);
        assert!(matches!(statements[0].kind, StmtKind::ExpressionStmt { .. }));
    }

    #[test]
    fn parses_var_declaration_without_initializer() {
        let (statements, errors) = parse_source("var x;");
        assert!(errors.is_empty());
        assert!(matches!(
            &statements[0].kind,
            StmtKind::Var { initializer: None, .. }
        ));
    }

    #[test]
    fn desugars_for_loop_into_while() {
        let (statements, errors) = parse_source("for (var i = 0; i < 3; i = i + 1) print i;");
        assert!(errors.is_empty());
        assert!(matches!(&statements[0].kind, StmtKind::Block { .. }));
    }

    #[test]
    fn reports_missing_semicolon() {
        let (_statements, errors) = parse_source("var x = 1");
        assert!(errors.iter().any(|m| m.contains("Expect ';'")));
    }

    #[test]
    fn reports_invalid_assignment_target() {
        let (_statements, errors) = parse_source("1 = 2;");
        assert!(errors.iter().any(|m| m.contains("Invalid assignment target.")));
    }

    #[test]
    fn recovers_after_error_and_keeps_parsing_next_statement() {
        let (statements, errors) = parse_source("var x = ; print 1;");
        assert!(!errors.is_empty());
        assert!(statements.iter().any(|s| matches!(s.kind, StmtKind::Print { .. })));
    }

    #[test]
    fn parses_function_declaration_with_parameters() {
        let (statements, errors) = parse_source("fun add(a, b) { return a + b; }");
        assert!(errors.is_empty());
        match &statements[0].kind {
            StmtKind::Function { declaration } => assert_eq!(declaration.params.len(), 2),
            other => panic!("expected function declaration, got {other:?}"),
        }
    }

    #[test]
    fn call_arguments_parse_left_to_right() {
        let (statements, errors) = parse_source("f(1, 2, 3);");
        assert!(errors.is_empty());
        let StmtKind::ExpressionStmt { expression } = &statements[0].kind else {
            panic!("expected expression statement");
        };
        let ExprKind::Call { arguments, .. } = &expression.kind else {
            panic!("expected call expression");
        };
        assert_eq!(arguments.len(), 3);
    }
}

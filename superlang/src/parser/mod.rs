//! Recursive-descent parser with slot resolution
//!
//! Builds the AST and, in the same pass, assigns every variable a
//! frame-relative stack slot and infers the type context that selects the
//! grammar for each expression.

mod context;
mod symbols;

#[cfg(test)]
mod tests;

pub use context::scan_context;
pub use symbols::{Symbol, SymbolTable};

use crate::ast::{BinOp, FunctionDef, Literal, Node, Scope, Span, Spanned, TypeContext};
use crate::error::{CompileError, Result};
use crate::lexer::Token;
use crate::util::{find_similar_name, format_suggestion_hint};
use std::rc::Rc;

/// Parse a complete program into its top-level scope
pub fn parse(tokens: Vec<(Token, Span)>) -> Result<Scope> {
    Parser::new().parse(tokens)
}

/// Parser state.
///
/// The symbol table outlives a single `parse` call, so further token streams
/// can extend the same top-level scope (incremental mode).
pub struct Parser {
    tokens: Vec<(Token, Span)>,
    pos: usize,
    symbols: SymbolTable,
}

impl Parser {
    pub fn new() -> Self {
        Self {
            tokens: Vec::new(),
            pos: 0,
            symbols: SymbolTable::new(),
        }
    }

    /// Parse `tokens` as top-level statements.
    ///
    /// The returned scope starts at the first free top-level slot. On error
    /// the top-level symbols are rolled back to their state before the call.
    pub fn parse(&mut self, tokens: Vec<(Token, Span)>) -> Result<Scope> {
        self.tokens = tokens;
        self.pos = 0;
        let snapshot = self.symbols.snapshot();
        let base = self.symbols.next_slot();

        match self.program() {
            Ok(statements) => {
                let count = self.symbols.next_slot() - base;
                Ok(Scope::new(statements, base, count))
            }
            Err(err) => {
                self.symbols.restore(snapshot);
                Err(err)
            }
        }
    }

    pub fn symbols(&self) -> &SymbolTable {
        &self.symbols
    }

    fn program(&mut self) -> Result<Vec<Spanned<Node>>> {
        let statements = self.statement_list()?;
        if let Some((token, span)) = self.peek_spanned() {
            return Err(CompileError::parser(
                format!("unexpected `{token}` at top level"),
                span,
            ));
        }
        Ok(statements)
    }

    // ------------------------------------------------------------------
    // Token helpers
    // ------------------------------------------------------------------

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos).map(|(t, _)| t)
    }

    fn peek_spanned(&self) -> Option<(Token, Span)> {
        self.tokens.get(self.pos).cloned()
    }

    fn check(&self, expected: &Token) -> bool {
        self.peek() == Some(expected)
    }

    /// Span of the current token, or a zero-width span at end of input
    fn current_span(&self) -> Span {
        match self.tokens.get(self.pos) {
            Some((_, span)) => *span,
            None => self
                .tokens
                .last()
                .map(|(_, span)| span.end_point())
                .unwrap_or_else(|| Span::new(0, 0)),
        }
    }

    fn prev_span(&self) -> Span {
        match self.pos.checked_sub(1).and_then(|i| self.tokens.get(i)) {
            Some((_, span)) => *span,
            None => self.current_span(),
        }
    }

    fn found(&self) -> String {
        match self.peek() {
            Some(token) => format!("`{token}`"),
            None => "end of input".to_string(),
        }
    }

    fn eat(&mut self, expected: Token) -> Result<Span> {
        if self.check(&expected) {
            let span = self.current_span();
            self.pos += 1;
            Ok(span)
        } else {
            Err(CompileError::parser(
                format!("expected `{expected}`, found {}", self.found()),
                self.current_span(),
            ))
        }
    }

    fn expect_ident(&mut self) -> Result<(String, Span)> {
        match self.peek_spanned() {
            Some((Token::Ident(name), span)) => {
                self.pos += 1;
                Ok((name, span))
            }
            _ => Err(CompileError::parser(
                format!("expected identifier, found {}", self.found()),
                self.current_span(),
            )),
        }
    }

    fn scan(&self) -> TypeContext {
        scan_context(&self.tokens[self.pos..], &self.symbols)
    }

    fn unresolved(&self, name: &str, span: Span) -> CompileError {
        let candidates = self.symbols.visible_names();
        let suggestion = find_similar_name(name, &candidates, 2);
        CompileError::resolve(
            format!(
                "unresolved identifier `{name}`{}",
                format_suggestion_hint(suggestion)
            ),
            span,
        )
    }

    // ------------------------------------------------------------------
    // Statements
    // ------------------------------------------------------------------

    /// Statements up to `}` or end of input. Blocks, `if`, `while` and
    /// function bodies end with their own `}` and need no `;`.
    fn statement_list(&mut self) -> Result<Vec<Spanned<Node>>> {
        let mut nodes = Vec::new();
        loop {
            match self.peek() {
                None | Some(Token::RBrace) => break,
                Some(Token::Semi) => self.pos += 1,
                Some(_) => {
                    let (node, terminated) = self.statement()?;
                    if !terminated {
                        self.eat(Token::Semi)?;
                    }
                    nodes.push(node);
                }
            }
        }
        Ok(nodes)
    }

    /// One statement; the flag tells whether it already consumed its end.
    fn statement(&mut self) -> Result<(Spanned<Node>, bool)> {
        match self.peek() {
            Some(Token::Let) => self.let_statement(),
            Some(Token::Ident(_)) => self.assignment_or_call(),
            Some(Token::LBrace) => {
                let start = self.current_span();
                let scope = self.block()?;
                let span = start.merge(self.prev_span());
                Ok((Spanned::new(Node::Scope(scope), span), true))
            }
            Some(Token::Fn) => self.fn_statement(),
            Some(Token::Return) => self.return_statement(),
            Some(Token::If) => self.if_statement(),
            Some(Token::While) => self.while_statement(),
            _ => Err(CompileError::parser(
                format!("expected statement, found {}", self.found()),
                self.current_span(),
            )),
        }
    }

    fn let_statement(&mut self) -> Result<(Spanned<Node>, bool)> {
        let start = self.eat(Token::Let)?;
        let (name, _) = self.expect_ident()?;
        self.eat(Token::Eq)?;
        let (value, context, terminated) = self.binding_value()?;
        // declared after the initializer, so `let x = x + 1` reads the outer x
        let slot = self.symbols.declare(&name, context);
        let node = Node::Assign {
            name,
            slot,
            declaration: true,
            value: Box::new(value),
        };
        Ok((Spanned::new(node, start.merge(self.prev_span())), terminated))
    }

    /// Right-hand side of `let`/`=`/`return`: a function literal or an
    /// expression, with the context recorded for the binding.
    fn binding_value(&mut self) -> Result<(Spanned<Node>, TypeContext, bool)> {
        if self.check(&Token::Fn) {
            let node = self.function_literal()?;
            return Ok((node, TypeContext::Any, true));
        }
        let context = self.scan();
        let node = self.expression_in(context)?;
        Ok((node, context, false))
    }

    fn assignment_or_call(&mut self) -> Result<(Spanned<Node>, bool)> {
        let (name, span) = self.expect_ident()?;
        match self.peek() {
            Some(Token::LParen) => Ok((self.call(name, span)?, false)),
            Some(Token::Eq) => {
                let symbol = self
                    .symbols
                    .lookup(&name)
                    .ok_or_else(|| self.unresolved(&name, span))?;
                self.pos += 1;
                let (value, _, terminated) = self.binding_value()?;
                let node = Node::Assign {
                    name,
                    slot: symbol.slot,
                    declaration: false,
                    value: Box::new(value),
                };
                Ok((Spanned::new(node, span.merge(self.prev_span())), terminated))
            }
            _ => Err(CompileError::parser(
                format!("expected `=` or `(` after `{name}`, found {}", self.found()),
                self.current_span(),
            )),
        }
    }

    fn block(&mut self) -> Result<Scope> {
        self.eat(Token::LBrace)?;
        let mark = self.symbols.enter_block();
        let statements = self.statement_list()?;
        self.eat(Token::RBrace)?;
        let (base, count) = self.symbols.exit_block(mark);
        Ok(Scope::new(statements, base, count))
    }

    fn fn_statement(&mut self) -> Result<(Spanned<Node>, bool)> {
        if !matches!(self.tokens.get(self.pos + 1), Some((Token::Ident(_), _))) {
            // anonymous literal used as a statement; its value is discarded
            return Ok((self.function_literal()?, true));
        }
        let start = self.eat(Token::Fn)?;
        let (name, _) = self.expect_ident()?;
        let def = self.function_def(Some(name))?;
        let span = start.merge(self.prev_span());
        Ok((Spanned::new(Node::Function(def), span), true))
    }

    /// `( params ) { body }` in a fresh frame
    fn function_def(&mut self, name: Option<String>) -> Result<Rc<FunctionDef>> {
        self.eat(Token::LParen)?;
        let mut params: Vec<String> = Vec::new();
        if !self.check(&Token::RParen) {
            loop {
                let (param, span) = self.expect_ident()?;
                if params.contains(&param) {
                    return Err(CompileError::parser(
                        format!("duplicate parameter `{param}`"),
                        span,
                    ));
                }
                params.push(param);
                if !self.check(&Token::Comma) {
                    break;
                }
                self.pos += 1;
            }
        }
        self.eat(Token::RParen)?;

        let frame_name = name.as_deref().unwrap_or("<anonymous>");
        let mark = self.symbols.enter_function(frame_name, &params);
        let body = self.block();
        self.symbols.exit_function(mark);

        Ok(Rc::new(FunctionDef {
            name,
            params,
            body: body?,
        }))
    }

    fn function_literal(&mut self) -> Result<Spanned<Node>> {
        let start = self.eat(Token::Fn)?;
        let name = match self.peek() {
            Some(Token::Ident(_)) => Some(self.expect_ident()?.0),
            _ => None,
        };
        let def = self.function_def(name)?;
        Ok(Spanned::new(
            Node::FunctionLiteral(def),
            start.merge(self.prev_span()),
        ))
    }

    fn return_statement(&mut self) -> Result<(Spanned<Node>, bool)> {
        let start = self.eat(Token::Return)?;
        let (value, terminated) = match self.peek() {
            None | Some(Token::Semi) | Some(Token::RBrace) => (None, false),
            Some(_) => {
                let (value, _, terminated) = self.binding_value()?;
                (Some(Box::new(value)), terminated)
            }
        };
        let span = start.merge(self.prev_span());
        Ok((Spanned::new(Node::Return(value), span), terminated))
    }

    fn condition(&mut self) -> Result<Spanned<Node>> {
        self.eat(Token::LParen)?;
        let condition = self.expression()?;
        self.eat(Token::RParen)?;
        Ok(condition)
    }

    fn if_statement(&mut self) -> Result<(Spanned<Node>, bool)> {
        let start = self.eat(Token::If)?;
        let condition = self.condition()?;
        let then_scope = self.block()?;
        let else_scope = if self.check(&Token::Else) {
            self.pos += 1;
            if self.check(&Token::If) {
                // `else if` is an else block holding a single branch
                let base = self.symbols.next_slot();
                let (nested, _) = self.if_statement()?;
                Some(Scope::new(vec![nested], base, 0))
            } else {
                Some(self.block()?)
            }
        } else {
            None
        };
        let node = Node::Branch {
            condition: Box::new(condition),
            then_scope,
            else_scope,
        };
        Ok((Spanned::new(node, start.merge(self.prev_span())), true))
    }

    fn while_statement(&mut self) -> Result<(Spanned<Node>, bool)> {
        let start = self.eat(Token::While)?;
        let condition = self.condition()?;
        let body = self.block()?;
        let node = Node::Loop {
            condition: Box::new(condition),
            body,
        };
        Ok((Spanned::new(node, start.merge(self.prev_span())), true))
    }

    // ------------------------------------------------------------------
    // Expressions
    // ------------------------------------------------------------------

    fn expression(&mut self) -> Result<Spanned<Node>> {
        let context = self.scan();
        self.expression_in(context)
    }

    fn expression_in(&mut self, context: TypeContext) -> Result<Spanned<Node>> {
        match context {
            TypeContext::Bool => self.bool_expression(),
            TypeContext::Number | TypeContext::String | TypeContext::Any => {
                self.additive_expression()
            }
        }
    }

    /// additive (cmp additive)*
    fn bool_expression(&mut self) -> Result<Spanned<Node>> {
        let mut node = self.additive_expression()?;
        while let Some(op) = self.peek().and_then(comparison_op) {
            self.pos += 1;
            let right = self.additive_expression()?;
            node = binary(op, node, right);
        }
        Ok(node)
    }

    /// term (('+' | '-') term)*
    ///
    /// Number and string expressions share this production. Whether `+`
    /// adds or concatenates, and whether the operand kinds fit at all, is
    /// decided on the values at run time.
    fn additive_expression(&mut self) -> Result<Spanned<Node>> {
        let mut node = self.term()?;
        loop {
            let op = match self.peek() {
                Some(Token::Plus) => BinOp::Add,
                Some(Token::Minus) => BinOp::Sub,
                _ => break,
            };
            self.pos += 1;
            let right = self.term()?;
            node = binary(op, node, right);
        }
        Ok(node)
    }

    /// factor (('*' | '/') factor)*
    fn term(&mut self) -> Result<Spanned<Node>> {
        let mut node = self.factor()?;
        loop {
            let op = match self.peek() {
                Some(Token::Star) => BinOp::Mul,
                Some(Token::Slash) => BinOp::Div,
                _ => break,
            };
            self.pos += 1;
            let right = self.factor()?;
            node = binary(op, node, right);
        }
        Ok(node)
    }

    fn factor(&mut self) -> Result<Spanned<Node>> {
        let Some((token, span)) = self.peek_spanned() else {
            return Err(CompileError::parser(
                "expected expression, found end of input",
                self.current_span(),
            ));
        };

        match token {
            Token::Minus => {
                self.pos += 1;
                let operand = self.factor()?;
                // -x is 0 - x, so int/float promotion applies unchanged
                let zero = Spanned::new(Node::Literal(Literal::Int(0)), span);
                Ok(binary(BinOp::Sub, zero, operand))
            }
            Token::IntLit(n) => Ok(self.literal(Literal::Int(n), span)),
            Token::FloatLit(n) => Ok(self.literal(Literal::Float(n), span)),
            Token::StringLit(s) => Ok(self.literal(Literal::Str(s), span)),
            Token::True => Ok(self.literal(Literal::Bool(true), span)),
            Token::False => Ok(self.literal(Literal::Bool(false), span)),
            Token::Ident(name) => {
                self.pos += 1;
                self.variable_or_call(name, span)
            }
            Token::LParen => {
                self.pos += 1;
                let inner = self.expression()?;
                self.eat(Token::RParen)?;
                Ok(Spanned::new(inner.node, span.merge(self.prev_span())))
            }
            Token::LBracket => self.array_literal(),
            Token::Fn => self.function_literal(),
            other => Err(CompileError::parser(
                format!("expected expression, found `{other}`"),
                span,
            )),
        }
    }

    fn literal(&mut self, literal: Literal, span: Span) -> Spanned<Node> {
        self.pos += 1;
        Spanned::new(Node::Literal(literal), span)
    }

    fn variable_or_call(&mut self, name: String, span: Span) -> Result<Spanned<Node>> {
        if self.check(&Token::LParen) {
            return self.call(name, span);
        }
        match self.symbols.lookup(&name) {
            Some(symbol) => Ok(Spanned::new(
                Node::Variable {
                    name,
                    slot: symbol.slot,
                },
                span,
            )),
            None => Err(self.unresolved(&name, span)),
        }
    }

    /// `name(args)`. A local of the same name supplies the fallback slot
    /// used when no function is registered under `name`.
    fn call(&mut self, name: String, span: Span) -> Result<Spanned<Node>> {
        let slot = self.symbols.lookup(&name).map(|symbol| symbol.slot);
        self.eat(Token::LParen)?;
        let args = self.comma_separated(Token::RParen)?;
        Ok(Spanned::new(
            Node::Call { name, slot, args },
            span.merge(self.prev_span()),
        ))
    }

    fn array_literal(&mut self) -> Result<Spanned<Node>> {
        let start = self.eat(Token::LBracket)?;
        let elements = self.comma_separated(Token::RBracket)?;
        Ok(Spanned::new(
            Node::ArrayLiteral(elements),
            start.merge(self.prev_span()),
        ))
    }

    /// Expressions separated by `,` up to and including `close`
    fn comma_separated(&mut self, close: Token) -> Result<Vec<Spanned<Node>>> {
        let mut items = Vec::new();
        if !self.check(&close) {
            loop {
                items.push(self.expression()?);
                if !self.check(&Token::Comma) {
                    break;
                }
                self.pos += 1;
            }
        }
        self.eat(close)?;
        Ok(items)
    }
}

impl Default for Parser {
    fn default() -> Self {
        Self::new()
    }
}

fn comparison_op(token: &Token) -> Option<BinOp> {
    match token {
        Token::EqEq => Some(BinOp::Eq),
        Token::Lt => Some(BinOp::Lt),
        Token::Gt => Some(BinOp::Gt),
        Token::LtEq => Some(BinOp::Le),
        Token::GtEq => Some(BinOp::Ge),
        _ => None,
    }
}

fn binary(op: BinOp, left: Spanned<Node>, right: Spanned<Node>) -> Spanned<Node> {
    let span = left.span.merge(right.span);
    Spanned::new(
        Node::BinaryOperation {
            op,
            left: Box::new(left),
            right: Box::new(right),
        },
        span,
    )
}

//! Recursive-descent parser for the expression language
//!
//! Precedence, lowest first: assignment, `?:`, `??`, `||`, `&&`, equality,
//! relational, additive, multiplicative, `**` (right-assoc), unary, postfix
//! (calls, member access, `++`/`--`), primary. Semicolons between statements
//! are optional.
//!
//! Nesting is capped at [`MAX_NESTING`] levels. Parentheses, blocks, unary
//! prefixes and every operator folded into a chain each count as a level, so
//! the tree handed to the machine is never deeper than the cap allows.

use super::ast::{BinaryOp, Expr, FunctionBody, FunctionDef, LogicalOp, Stmt, UnaryOp};
use super::lexer::{tokenize, Spanned, Token};
use crate::error::{EvalError, EvalResult};
use std::rc::Rc;

/// Deepest nesting the parser accepts before reporting a syntax error.
pub const MAX_NESTING: usize = 100;

/// Parse source that must be exactly one expression.
pub fn parse_expression(source: &str) -> EvalResult<Expr> {
    let mut parser = Parser::new(tokenize(source)?);
    let expr = parser.expression()?;
    parser.expect_end()?;
    Ok(expr)
}

/// Parse source as a sequence of statements.
pub fn parse_program(source: &str) -> EvalResult<Vec<Stmt>> {
    let mut parser = Parser::new(tokenize(source)?);
    let mut statements = Vec::new();
    while !parser.at_end() {
        statements.push(parser.statement()?);
    }
    Ok(statements)
}

struct Parser {
    tokens: Vec<Spanned>,
    pos: usize,
    depth: usize,
}

impl Parser {
    fn new(tokens: Vec<Spanned>) -> Self {
        Self {
            tokens,
            pos: 0,
            depth: 0,
        }
    }

    fn descend(&mut self) -> EvalResult<()> {
        self.depth += 1;
        if self.depth > MAX_NESTING {
            return Err(self.error(&format!("nesting deeper than {MAX_NESTING} levels")));
        }
        Ok(())
    }

    /// Run `parse` one level deeper, restoring the depth afterwards.
    fn nested<T>(&mut self, parse: impl FnOnce(&mut Self) -> EvalResult<T>) -> EvalResult<T> {
        let depth = self.depth;
        self.descend()?;
        let result = parse(self);
        self.depth = depth;
        result
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos).map(|(token, _)| token)
    }

    fn peek_at(&self, offset: usize) -> Option<&Token> {
        self.tokens.get(self.pos + offset).map(|(token, _)| token)
    }

    fn at_end(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).map(|(token, _)| token.clone());
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn eat(&mut self, expected: &Token) -> bool {
        if self.peek() == Some(expected) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, expected: Token) -> EvalResult<()> {
        if self.eat(&expected) {
            Ok(())
        } else {
            Err(self.error(&format!("expected {expected:?}")))
        }
    }

    fn expect_end(&self) -> EvalResult<()> {
        if self.at_end() {
            Ok(())
        } else {
            Err(self.error("expected end of input"))
        }
    }

    fn error(&self, message: &str) -> EvalError {
        match self.tokens.get(self.pos) {
            Some((token, span)) => {
                EvalError::Syntax(format!("{message}, found {token:?} at {}", span.start))
            }
            None => EvalError::Syntax(format!("{message}, found end of input")),
        }
    }

    fn identifier(&mut self) -> EvalResult<String> {
        match self.peek() {
            Some(Token::Ident(name)) => {
                let name = name.clone();
                self.pos += 1;
                Ok(name)
            }
            _ => Err(self.error("expected identifier")),
        }
    }

    // Statements

    fn statement(&mut self) -> EvalResult<Stmt> {
        self.nested(Self::statement_inner)
    }

    fn statement_inner(&mut self) -> EvalResult<Stmt> {
        let stmt = match self.peek() {
            Some(Token::LBrace) => {
                self.pos += 1;
                Stmt::Block(self.block_rest()?)
            }
            Some(Token::Let | Token::Var | Token::Const) => {
                self.pos += 1;
                self.declaration()?
            }
            Some(Token::If) => {
                self.pos += 1;
                self.if_statement()?
            }
            Some(Token::While) => {
                self.pos += 1;
                self.expect(Token::LParen)?;
                let test = self.expression()?;
                self.expect(Token::RParen)?;
                let body = Box::new(self.statement()?);
                Stmt::While { test, body }
            }
            Some(Token::Return) => {
                self.pos += 1;
                let value = match self.peek() {
                    None | Some(Token::Semicolon | Token::RBrace) => None,
                    _ => Some(self.expression()?),
                };
                Stmt::Return(value)
            }
            Some(Token::Semicolon) => Stmt::Empty,
            Some(Token::Function) if matches!(self.peek_at(1), Some(Token::Ident(_))) => {
                self.pos += 1;
                let name = self.identifier()?;
                let def = self.function_rest()?;
                Stmt::Declare(vec![(name, Some(Expr::Function(def)))])
            }
            _ => Stmt::Expr(self.expression()?),
        };
        self.eat(&Token::Semicolon);
        Ok(stmt)
    }

    /// Statements up to and including the closing brace.
    fn block_rest(&mut self) -> EvalResult<Vec<Stmt>> {
        let mut statements = Vec::new();
        loop {
            match self.peek() {
                Some(Token::RBrace) => {
                    self.pos += 1;
                    return Ok(statements);
                }
                None => return Err(self.error("unclosed block")),
                _ => statements.push(self.statement()?),
            }
        }
    }

    fn declaration(&mut self) -> EvalResult<Stmt> {
        let mut bindings = Vec::new();
        loop {
            let name = self.identifier()?;
            let init = if self.eat(&Token::Assign) {
                Some(self.assignment()?)
            } else {
                None
            };
            bindings.push((name, init));
            if !self.eat(&Token::Comma) {
                return Ok(Stmt::Declare(bindings));
            }
        }
    }

    fn if_statement(&mut self) -> EvalResult<Stmt> {
        self.expect(Token::LParen)?;
        let test = self.expression()?;
        self.expect(Token::RParen)?;
        let then = Box::new(self.statement()?);
        let otherwise = if self.eat(&Token::Else) {
            Some(Box::new(self.statement()?))
        } else {
            None
        };
        Ok(Stmt::If {
            test,
            then,
            otherwise,
        })
    }

    // Expressions

    fn expression(&mut self) -> EvalResult<Expr> {
        self.assignment()
    }

    fn assignment(&mut self) -> EvalResult<Expr> {
        self.nested(Self::assignment_inner)
    }

    fn assignment_inner(&mut self) -> EvalResult<Expr> {
        if let Some(def) = self.arrow_function()? {
            return Ok(Expr::Function(def));
        }

        let target = self.conditional()?;
        let op = match self.peek() {
            Some(Token::Assign) => None,
            Some(Token::PlusAssign) => Some(BinaryOp::Add),
            Some(Token::MinusAssign) => Some(BinaryOp::Sub),
            Some(Token::StarAssign) => Some(BinaryOp::Mul),
            Some(Token::SlashAssign) => Some(BinaryOp::Div),
            _ => return Ok(target),
        };
        let Expr::Ident(name) = target else {
            return Err(self.error("invalid assignment target"));
        };
        self.pos += 1;
        let value = Box::new(self.assignment()?);
        Ok(Expr::Assign { name, op, value })
    }

    /// `a => ..` or `(a, b) => ..`, recognised by scanning to the arrow.
    fn arrow_function(&mut self) -> EvalResult<Option<Rc<FunctionDef>>> {
        let params = match (self.peek(), self.peek_at(1)) {
            (Some(Token::Ident(name)), Some(Token::Arrow)) => {
                let params = vec![name.clone()];
                self.pos += 2;
                params
            }
            (Some(Token::LParen), _) => {
                let Some(close) = self.matching_paren(self.pos) else {
                    return Ok(None);
                };
                if !matches!(self.tokens.get(close + 1), Some((Token::Arrow, _))) {
                    return Ok(None);
                }
                self.pos += 1;
                let params = self.parameter_list()?;
                self.expect(Token::Arrow)?;
                params
            }
            _ => return Ok(None),
        };

        let body = if self.eat(&Token::LBrace) {
            FunctionBody::Block(self.block_rest()?)
        } else {
            FunctionBody::Expr(self.assignment()?)
        };
        Ok(Some(Rc::new(FunctionDef { params, body })))
    }

    fn matching_paren(&self, open: usize) -> Option<usize> {
        let mut depth = 0usize;
        for (offset, (token, _)) in self.tokens[open..].iter().enumerate() {
            match token {
                Token::LParen => depth += 1,
                Token::RParen => {
                    depth -= 1;
                    if depth == 0 {
                        return Some(open + offset);
                    }
                }
                _ => {}
            }
        }
        None
    }

    /// Identifiers up to and including `)`.
    fn parameter_list(&mut self) -> EvalResult<Vec<String>> {
        let mut params = Vec::new();
        if self.eat(&Token::RParen) {
            return Ok(params);
        }
        loop {
            params.push(self.identifier()?);
            if self.eat(&Token::RParen) {
                return Ok(params);
            }
            self.expect(Token::Comma)?;
        }
    }

    /// `(params) { body }` after the `function` keyword and optional name.
    fn function_rest(&mut self) -> EvalResult<Rc<FunctionDef>> {
        self.expect(Token::LParen)?;
        let params = self.parameter_list()?;
        self.expect(Token::LBrace)?;
        let body = FunctionBody::Block(self.block_rest()?);
        Ok(Rc::new(FunctionDef { params, body }))
    }

    fn conditional(&mut self) -> EvalResult<Expr> {
        let test = self.logical(0)?;
        if !self.eat(&Token::Question) {
            return Ok(test);
        }
        let then = self.assignment()?;
        self.expect(Token::Colon)?;
        let otherwise = self.assignment()?;
        Ok(Expr::Conditional {
            test: Box::new(test),
            then: Box::new(then),
            otherwise: Box::new(otherwise),
        })
    }

    /// `??`, `||` and `&&` in increasing precedence.
    fn logical(&mut self, level: usize) -> EvalResult<Expr> {
        static LEVELS: [(Token, LogicalOp); 3] = [
            (Token::Nullish, LogicalOp::Nullish),
            (Token::Or, LogicalOp::Or),
            (Token::And, LogicalOp::And),
        ];
        let Some((token, op)) = LEVELS.get(level) else {
            return self.binary(0);
        };
        let mut left = self.logical(level + 1)?;
        while self.eat(token) {
            self.descend()?;
            let right = self.logical(level + 1)?;
            left = Expr::Logical(*op, Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    /// Left-associative binary levels from equality down to multiplication.
    fn binary(&mut self, level: usize) -> EvalResult<Expr> {
        if level >= BINARY_LEVELS.len() {
            return self.exponent();
        }
        let mut left = self.binary(level + 1)?;
        loop {
            let op = self
                .peek()
                .and_then(|token| BINARY_LEVELS[level].iter().find(|(t, _)| t == token))
                .map(|(_, op)| *op);
            let Some(op) = op else {
                return Ok(left);
            };
            self.pos += 1;
            self.descend()?;
            let right = self.binary(level + 1)?;
            left = Expr::Binary(op, Box::new(left), Box::new(right));
        }
    }

    fn exponent(&mut self) -> EvalResult<Expr> {
        let base = self.unary()?;
        if self.eat(&Token::Power) {
            let power = self.nested(Self::exponent)?;
            return Ok(Expr::Binary(BinaryOp::Pow, Box::new(base), Box::new(power)));
        }
        Ok(base)
    }

    fn unary(&mut self) -> EvalResult<Expr> {
        let op = match self.peek() {
            Some(Token::Minus) => UnaryOp::Neg,
            Some(Token::Plus) => UnaryOp::Plus,
            Some(Token::Not) => UnaryOp::Not,
            Some(Token::Typeof) => UnaryOp::Typeof,
            Some(Token::Increment | Token::Decrement) => {
                let delta = if self.peek() == Some(&Token::Increment) {
                    1.0
                } else {
                    -1.0
                };
                self.pos += 1;
                let name = self.identifier()?;
                return Ok(Expr::Update {
                    name,
                    delta,
                    prefix: true,
                });
            }
            _ => return self.postfix(),
        };
        self.pos += 1;
        Ok(Expr::Unary(op, Box::new(self.nested(Self::unary)?)))
    }

    fn postfix(&mut self) -> EvalResult<Expr> {
        let mut expr = self.primary()?;
        loop {
            if matches!(
                self.peek(),
                Some(Token::LParen | Token::Dot | Token::Increment | Token::Decrement)
            ) {
                self.descend()?;
            }
            match self.peek() {
                Some(Token::LParen) => {
                    self.pos += 1;
                    let args = self.arguments()?;
                    expr = Expr::Call(Box::new(expr), args);
                }
                Some(Token::Dot) => {
                    self.pos += 1;
                    let name = self.identifier()?;
                    expr = Expr::Member(Box::new(expr), name);
                }
                Some(Token::Increment | Token::Decrement) => {
                    let Expr::Ident(name) = expr else {
                        return Err(self.error("invalid update target"));
                    };
                    let delta = if self.peek() == Some(&Token::Increment) {
                        1.0
                    } else {
                        -1.0
                    };
                    self.pos += 1;
                    expr = Expr::Update {
                        name,
                        delta,
                        prefix: false,
                    };
                }
                _ => return Ok(expr),
            }
        }
    }

    fn arguments(&mut self) -> EvalResult<Vec<Expr>> {
        let mut args = Vec::new();
        if self.eat(&Token::RParen) {
            return Ok(args);
        }
        loop {
            args.push(self.assignment()?);
            if self.eat(&Token::RParen) {
                return Ok(args);
            }
            self.expect(Token::Comma)?;
        }
    }

    fn primary(&mut self) -> EvalResult<Expr> {
        let Some(token) = self.advance() else {
            return Err(self.error("expected expression"));
        };
        let expr = match token {
            Token::Number(n) => Expr::Number(n),
            Token::Str(s) => Expr::Str(s),
            Token::True => Expr::Bool(true),
            Token::False => Expr::Bool(false),
            Token::Null => Expr::Null,
            Token::Undefined => Expr::Undefined,
            Token::Ident(name) => Expr::Ident(name),
            Token::LParen => {
                let inner = self.expression()?;
                self.expect(Token::RParen)?;
                inner
            }
            Token::Function => {
                // the name of a function expression is not bound
                if matches!(self.peek(), Some(Token::Ident(_))) {
                    self.pos += 1;
                }
                Expr::Function(self.function_rest()?)
            }
            _ => {
                self.pos -= 1;
                return Err(self.error("expected expression"));
            }
        };
        Ok(expr)
    }
}

static BINARY_LEVELS: [&[(Token, BinaryOp)]; 4] = [
    &[
        (Token::Eq, BinaryOp::Eq),
        (Token::NotEq, BinaryOp::NotEq),
        (Token::StrictEq, BinaryOp::StrictEq),
        (Token::StrictNotEq, BinaryOp::StrictNotEq),
    ],
    &[
        (Token::Lt, BinaryOp::Lt),
        (Token::LtEq, BinaryOp::LtEq),
        (Token::Gt, BinaryOp::Gt),
        (Token::GtEq, BinaryOp::GtEq),
    ],
    &[(Token::Plus, BinaryOp::Add), (Token::Minus, BinaryOp::Sub)],
    &[
        (Token::Star, BinaryOp::Mul),
        (Token::Slash, BinaryOp::Div),
        (Token::Percent, BinaryOp::Rem),
    ],
];

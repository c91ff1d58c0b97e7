//! Recursive-descent parser: `params => body`.
//!
//! Parameter lists are `$a, $b` or `($a, $b)`; parentheses must appear on
//! both sides or not at all. The body is a `{ ... }` block, a statement list
//! ending in `;`, or a bare expression that becomes the return value.

use crate::ast::{BinaryOp, Expr, Lambda, Literal, Stmt, UnaryOp};
use crate::error::ParseError;
use crate::lexer::{tokenize, Tok, Token};

/// Byte offset of the first `=>` that is not inside a string literal.
pub fn find_arrow(src: &str) -> Option<usize> {
    let bytes = src.as_bytes();
    let mut quote: Option<u8> = None;
    let mut i = 0;
    while i < bytes.len() {
        let b = bytes[i];
        match quote {
            Some(q) => {
                if b == b'\\' {
                    i += 1;
                } else if b == q {
                    quote = None;
                }
            }
            None => {
                if b == b'\'' || b == b'"' {
                    quote = Some(b);
                } else if b == b'=' && bytes.get(i + 1) == Some(&b'>') {
                    return Some(i);
                }
            }
        }
        i += 1;
    }
    None
}

pub fn looks_like_lambda(src: &str) -> bool {
    find_arrow(src).is_some()
}

pub fn parse_lambda(src: &str) -> Result<Lambda, ParseError> {
    let arrow = find_arrow(src).ok_or(ParseError::NotLambda)?;
    let params = parse_params(src[..arrow].trim())?;
    let body = parse_body(src[arrow + 2..].trim())?;
    Ok(Lambda {
        params,
        body,
        source: src.trim().to_string(),
    })
}

fn is_ident(name: &str) -> bool {
    let mut chars = name.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn parse_params(text: &str) -> Result<Vec<String>, ParseError> {
    let opens = text.starts_with('(');
    let closes = text.ends_with(')');
    if opens != closes {
        return Err(ParseError::UnbalancedParams);
    }
    let inner = if opens {
        text[1..text.len() - 1].trim()
    } else {
        text
    };
    if inner.is_empty() {
        return Ok(Vec::new());
    }

    let mut params: Vec<String> = Vec::new();
    for raw in inner.split(',') {
        let p = raw.trim();
        let name = p
            .strip_prefix('$')
            .filter(|n| is_ident(n))
            .ok_or_else(|| ParseError::InvalidParam(p.to_string()))?;
        if params.iter().any(|existing| existing == name) {
            return Err(ParseError::DuplicateParam(name.to_string()));
        }
        params.push(name.to_string());
    }
    Ok(params)
}

fn parse_body(body: &str) -> Result<Vec<Stmt>, ParseError> {
    if body.is_empty() {
        return Ok(Vec::new());
    }
    let toks = tokenize(body)?;
    let mut p = Parser::new(toks, body.len());

    let braced = p.toks.first().map(|t| &t.tok) == Some(&Tok::LBrace)
        && p.toks.last().map(|t| &t.tok) == Some(&Tok::RBrace);
    if braced {
        p.pos = 1;
        let stmts = p.statements(true)?;
        p.expect(&Tok::RBrace, "`}`")?;
        p.finish()?;
        return Ok(stmts);
    }

    if p.toks.last().map(|t| &t.tok) == Some(&Tok::Semi) {
        let stmts = p.statements(false)?;
        p.finish()?;
        return Ok(stmts);
    }

    let expr = p.expr()?;
    p.finish()?;
    Ok(vec![Stmt::Return(Some(expr))])
}

pub(crate) struct Parser {
    toks: Vec<Token>,
    pos: usize,
    len: usize,
}

impl Parser {
    fn new(toks: Vec<Token>, len: usize) -> Self {
        Self { toks, pos: 0, len }
    }

    fn peek(&self) -> Option<&Tok> {
        self.toks.get(self.pos).map(|t| &t.tok)
    }

    fn peek_at(&self, ahead: usize) -> Option<&Tok> {
        self.toks.get(self.pos + ahead).map(|t| &t.tok)
    }

    fn peek_keyword(&self, kw: &str) -> bool {
        matches!(self.peek(), Some(Tok::Ident(s)) if s.eq_ignore_ascii_case(kw))
    }

    fn eat(&mut self, tok: &Tok) -> bool {
        if self.peek() == Some(tok) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn error(&self, expected: &str) -> ParseError {
        match self.toks.get(self.pos) {
            Some(t) => ParseError::Unexpected {
                found: t.tok.describe(),
                expected: expected.to_string(),
                pos: t.pos,
            },
            None => ParseError::UnexpectedEnd(expected.to_string()),
        }
    }

    fn expect(&mut self, tok: &Tok, what: &str) -> Result<(), ParseError> {
        if self.eat(tok) {
            Ok(())
        } else {
            Err(self.error(what))
        }
    }

    fn finish(&self) -> Result<(), ParseError> {
        if self.pos < self.toks.len() {
            return Err(self.error("end of lambda"));
        }
        debug_assert!(self.toks.last().map_or(true, |t| t.pos < self.len));
        Ok(())
    }

    fn ident(&mut self, what: &str) -> Result<String, ParseError> {
        match self.peek() {
            Some(Tok::Ident(name)) => {
                let name = name.clone();
                self.pos += 1;
                Ok(name)
            }
            _ => Err(self.error(what)),
        }
    }

    // statements

    fn statements(&mut self, in_block: bool) -> Result<Vec<Stmt>, ParseError> {
        let mut out = Vec::new();
        while let Some(tok) = self.peek() {
            if in_block && *tok == Tok::RBrace {
                break;
            }
            if self.eat(&Tok::Semi) {
                continue;
            }
            out.push(self.statement()?);
        }
        Ok(out)
    }

    fn end_statement(&mut self) -> Result<(), ParseError> {
        if self.eat(&Tok::Semi) || matches!(self.peek(), None | Some(Tok::RBrace)) {
            Ok(())
        } else {
            Err(self.error("`;`"))
        }
    }

    fn block(&mut self) -> Result<Vec<Stmt>, ParseError> {
        if self.eat(&Tok::LBrace) {
            let stmts = self.statements(true)?;
            self.expect(&Tok::RBrace, "`}`")?;
            Ok(stmts)
        } else {
            Ok(vec![self.statement()?])
        }
    }

    fn statement(&mut self) -> Result<Stmt, ParseError> {
        if self.peek_keyword("return") {
            self.pos += 1;
            let value = match self.peek() {
                None | Some(Tok::Semi) | Some(Tok::RBrace) => None,
                _ => Some(self.expr()?),
            };
            self.end_statement()?;
            return Ok(Stmt::Return(value));
        }

        if self.peek_keyword("if") {
            self.pos += 1;
            return self.if_tail();
        }

        if let (Some(Tok::Var(name)), Some(Tok::Assign)) = (self.peek(), self.peek_at(1)) {
            let target = name.clone();
            self.pos += 2;
            let value = self.expr()?;
            self.end_statement()?;
            return Ok(Stmt::Assign { target, value });
        }

        let e = self.expr()?;
        self.end_statement()?;
        Ok(Stmt::Expr(e))
    }

    fn if_tail(&mut self) -> Result<Stmt, ParseError> {
        self.expect(&Tok::LParen, "`(`")?;
        let cond = self.expr()?;
        self.expect(&Tok::RParen, "`)`")?;
        let then = self.block()?;
        let otherwise = if self.peek_keyword("elseif") {
            self.pos += 1;
            vec![self.if_tail()?]
        } else if self.peek_keyword("else") {
            self.pos += 1;
            if self.peek_keyword("if") {
                self.pos += 1;
                vec![self.if_tail()?]
            } else {
                self.block()?
            }
        } else {
            Vec::new()
        };
        Ok(Stmt::If {
            cond,
            then,
            otherwise,
        })
    }

    // expressions, loosest first

    pub(crate) fn expr(&mut self) -> Result<Expr, ParseError> {
        self.ternary()
    }

    fn ternary(&mut self) -> Result<Expr, ParseError> {
        let cond = self.coalesce()?;
        if !self.eat(&Tok::Question) {
            return Ok(cond);
        }
        if self.eat(&Tok::Colon) {
            let otherwise = self.ternary()?;
            return Ok(Expr::Ternary {
                cond: Box::new(cond),
                then: None,
                otherwise: Box::new(otherwise),
            });
        }
        let then = self.ternary()?;
        self.expect(&Tok::Colon, "`:`")?;
        let otherwise = self.ternary()?;
        Ok(Expr::Ternary {
            cond: Box::new(cond),
            then: Some(Box::new(then)),
            otherwise: Box::new(otherwise),
        })
    }

    fn coalesce(&mut self) -> Result<Expr, ParseError> {
        let lhs = self.binary(0)?;
        if self.eat(&Tok::Coalesce) {
            let rhs = self.coalesce()?;
            return Ok(Expr::Coalesce {
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            });
        }
        Ok(lhs)
    }

    fn binary_op(&self, level: usize) -> Option<BinaryOp> {
        let tok = self.peek()?;
        let op = match (level, tok) {
            (0, Tok::OrOr) => BinaryOp::Or,
            (0, Tok::Ident(s)) if s.eq_ignore_ascii_case("or") => BinaryOp::Or,
            (1, Tok::AndAnd) => BinaryOp::And,
            (1, Tok::Ident(s)) if s.eq_ignore_ascii_case("and") => BinaryOp::And,
            (2, Tok::Eq) => BinaryOp::Eq,
            (2, Tok::NotEq) => BinaryOp::NotEq,
            (2, Tok::Identical) => BinaryOp::Identical,
            (2, Tok::NotIdentical) => BinaryOp::NotIdentical,
            (3, Tok::Lt) => BinaryOp::Lt,
            (3, Tok::Le) => BinaryOp::Le,
            (3, Tok::Gt) => BinaryOp::Gt,
            (3, Tok::Ge) => BinaryOp::Ge,
            (4, Tok::Dot) => BinaryOp::Concat,
            (5, Tok::Plus) => BinaryOp::Add,
            (5, Tok::Minus) => BinaryOp::Sub,
            (6, Tok::Star) => BinaryOp::Mul,
            (6, Tok::Slash) => BinaryOp::Div,
            (6, Tok::Percent) => BinaryOp::Mod,
            _ => return None,
        };
        Some(op)
    }

    fn binary(&mut self, level: usize) -> Result<Expr, ParseError> {
        if level > 6 {
            return self.unary();
        }
        let mut lhs = self.binary(level + 1)?;
        while let Some(op) = self.binary_op(level) {
            self.pos += 1;
            let rhs = self.binary(level + 1)?;
            lhs = Expr::Binary {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            };
        }
        Ok(lhs)
    }

    fn unary(&mut self) -> Result<Expr, ParseError> {
        let op = match self.peek() {
            Some(Tok::Bang) => UnaryOp::Not,
            Some(Tok::Minus) => UnaryOp::Neg,
            Some(Tok::Plus) => UnaryOp::Plus,
            _ => return self.postfix(),
        };
        self.pos += 1;
        let expr = self.unary()?;
        Ok(Expr::Unary {
            op,
            expr: Box::new(expr),
        })
    }

    fn args(&mut self) -> Result<Vec<Expr>, ParseError> {
        self.expect(&Tok::LParen, "`(`")?;
        let mut args = Vec::new();
        while !self.eat(&Tok::RParen) {
            args.push(self.expr()?);
            if !self.eat(&Tok::Comma) {
                self.expect(&Tok::RParen, "`,` or `)`")?;
                break;
            }
        }
        Ok(args)
    }

    fn postfix(&mut self) -> Result<Expr, ParseError> {
        let mut e = self.primary()?;
        loop {
            match self.peek() {
                Some(Tok::LBracket) => {
                    self.pos += 1;
                    let index = self.expr()?;
                    self.expect(&Tok::RBracket, "`]`")?;
                    e = Expr::Index {
                        target: Box::new(e),
                        index: Box::new(index),
                    };
                }
                Some(Tok::Arrow) => {
                    self.pos += 1;
                    let name = self.ident("member name")?;
                    if self.peek() == Some(&Tok::LParen) {
                        let args = self.args()?;
                        e = Expr::MethodCall {
                            target: Box::new(e),
                            method: name,
                            args,
                        };
                    } else {
                        e = Expr::Property {
                            target: Box::new(e),
                            name,
                        };
                    }
                }
                Some(Tok::LParen) => {
                    let args = self.args()?;
                    e = Expr::Invoke {
                        callee: Box::new(e),
                        args,
                    };
                }
                _ => return Ok(e),
            }
        }
    }

    fn array_items(&mut self, close: Tok) -> Result<Expr, ParseError> {
        let mut items = Vec::new();
        while !self.eat(&close) {
            let first = self.expr()?;
            let item = if self.eat(&Tok::FatArrow) {
                (Some(first), self.expr()?)
            } else {
                (None, first)
            };
            items.push(item);
            if !self.eat(&Tok::Comma) {
                self.expect(&close, "`,` or end of array")?;
                break;
            }
        }
        Ok(Expr::Array(items))
    }

    fn primary(&mut self) -> Result<Expr, ParseError> {
        let tok = match self.peek() {
            Some(t) => t.clone(),
            None => return Err(self.error("expression")),
        };
        match tok {
            Tok::Int(i) => {
                self.pos += 1;
                Ok(Expr::Literal(Literal::Int(i)))
            }
            Tok::Float(f) => {
                self.pos += 1;
                Ok(Expr::Literal(Literal::Float(f)))
            }
            Tok::Str(s) => {
                self.pos += 1;
                Ok(Expr::Literal(Literal::Str(s)))
            }
            Tok::Var(name) => {
                self.pos += 1;
                Ok(Expr::Var(name))
            }
            Tok::LParen => {
                self.pos += 1;
                let e = self.expr()?;
                self.expect(&Tok::RParen, "`)`")?;
                Ok(e)
            }
            Tok::LBracket => {
                self.pos += 1;
                self.array_items(Tok::RBracket)
            }
            Tok::Ident(name) => {
                self.pos += 1;
                match name.to_ascii_lowercase().as_str() {
                    "true" => return Ok(Expr::Literal(Literal::Bool(true))),
                    "false" => return Ok(Expr::Literal(Literal::Bool(false))),
                    "null" => return Ok(Expr::Literal(Literal::Null)),
                    "array" if self.peek() == Some(&Tok::LParen) => {
                        self.pos += 1;
                        return self.array_items(Tok::RParen);
                    }
                    _ => {}
                }
                if self.eat(&Tok::DoubleColon) {
                    let method = self.ident("static method name")?;
                    let args = self.args()?;
                    return Ok(Expr::StaticCall {
                        class: name,
                        method,
                        args,
                    });
                }
                if self.peek() == Some(&Tok::LParen) {
                    let args = self.args()?;
                    return Ok(Expr::Call { name, args });
                }
                self.pos -= 1;
                Err(self.error("expression"))
            }
            _ => Err(self.error("expression")),
        }
    }
}

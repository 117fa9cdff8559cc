//! Recursive-descent parser for example source.
//!
//! Blocks follow indentation: a `:` at the end of a line opens a suite whose
//! lines are indented deeper than the statement that owns it.

use std::sync::Arc;

use crate::ast::{BinaryOp, CompareOp, Expr, FunctionDef, Stmt, Target, UnaryOp};
use crate::errors::{syntax_error, EvalResult};
use crate::lexer::{tokenize, Spanned, Token};

/// Deepest expression or block nesting accepted. Evaluation recurses once
/// per level, so deeper source is refused while parsing.
const MAX_NESTING: usize = 200;

/// Parse a whole example source into statements.
#[tracing::instrument(level = "trace", skip_all)]
pub(crate) fn parse_program(source: &str) -> EvalResult<Vec<Stmt>> {
    let tokens = tokenize(source)?;
    Parser {
        tokens,
        pos: 0,
        line_indent: 0,
        nesting: 0,
    }
    .program()
}

struct Parser {
    tokens: Vec<Spanned>,
    pos: usize,
    /// Indentation of the line the cursor is on.
    line_indent: usize,
    /// Nesting level of the construct being parsed.
    nesting: usize,
}

impl Parser {
    // === Cursor ===

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos).map(|(token, _)| token)
    }

    fn peek_at(&self, offset: usize) -> Option<&Token> {
        self.tokens.get(self.pos + offset).map(|(token, _)| token)
    }

    fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).map(|(token, _)| token.clone());
        self.pos += 1;
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

    fn consume(&mut self, expected: &Token, what: &str) -> EvalResult<()> {
        if self.eat(expected) {
            Ok(())
        } else {
            Err(self.unexpected(what))
        }
    }

    fn unexpected(&self, what: &str) -> numdoc_ir::ExecError {
        match self.peek() {
            Some(token) => syntax_error(format!("invalid syntax: expected {what}, found {token:?}")),
            None => syntax_error(format!("unexpected EOF while parsing: expected {what}")),
        }
    }

    fn ident(&mut self, what: &str) -> EvalResult<String> {
        match self.peek() {
            Some(Token::Ident(name)) => {
                let name = name.clone();
                self.pos += 1;
                Ok(name)
            }
            _ => Err(self.unexpected(what)),
        }
    }

    /// Go one nesting level deeper. Callers restore the level they
    /// started at before returning.
    fn descend(&mut self) -> EvalResult<()> {
        self.nesting += 1;
        if self.nesting > MAX_NESTING {
            return Err(syntax_error("too many nested expressions"));
        }
        Ok(())
    }

    fn skip_newlines(&mut self) {
        while let Some(Token::Newline(indent)) = self.peek() {
            self.line_indent = *indent;
            self.pos += 1;
        }
    }

    fn at_line_end(&self) -> bool {
        matches!(self.peek(), None | Some(Token::Newline(_)))
    }

    fn starts_expression(&self) -> bool {
        matches!(
            self.peek(),
            Some(
                Token::Int(_)
                    | Token::Float(_)
                    | Token::Str(_)
                    | Token::Ident(_)
                    | Token::True
                    | Token::False
                    | Token::None
                    | Token::LParen
                    | Token::LBracket
                    | Token::LBrace
                    | Token::Minus
                    | Token::Plus
                    | Token::Not
            )
        )
    }

    // === Statements ===

    fn program(mut self) -> EvalResult<Vec<Stmt>> {
        self.skip_newlines();
        let base = self.line_indent;
        let mut body = Vec::new();
        while self.peek().is_some() {
            if self.line_indent != base {
                return Err(syntax_error("unexpected indent"));
            }
            body.extend(self.line(base)?);
            self.skip_newlines();
        }
        Ok(body)
    }

    /// One logical line: a compound statement or `;`-separated simple ones.
    fn line(&mut self, indent: usize) -> EvalResult<Vec<Stmt>> {
        let stmt = match self.peek() {
            Some(Token::For) => self.for_stmt(indent)?,
            Some(Token::While) => self.while_stmt(indent)?,
            Some(Token::If) => self.if_stmt(indent)?,
            Some(Token::Def) => self.def_stmt(indent)?,
            _ => return self.simple_line(),
        };
        Ok(vec![stmt])
    }

    fn simple_line(&mut self) -> EvalResult<Vec<Stmt>> {
        let mut stmts = vec![self.simple_stmt()?];
        while self.eat(&Token::Semicolon) {
            if self.at_line_end() {
                break;
            }
            stmts.push(self.simple_stmt()?);
        }
        if !self.at_line_end() {
            return Err(self.unexpected("end of line"));
        }
        Ok(stmts)
    }

    fn suite(&mut self, indent: usize) -> EvalResult<Vec<Stmt>> {
        let base = self.nesting;
        self.descend()?;
        let body = self.block(indent)?;
        self.nesting = base;
        Ok(body)
    }

    fn block(&mut self, indent: usize) -> EvalResult<Vec<Stmt>> {
        self.consume(&Token::Colon, "`:`")?;
        if !self.at_line_end() {
            return self.simple_line();
        }
        self.skip_newlines();
        let inner = self.line_indent;
        if self.peek().is_none() || inner <= indent {
            return Err(syntax_error("expected an indented block"));
        }
        let mut body = Vec::new();
        loop {
            body.extend(self.line(inner)?);
            self.skip_newlines();
            if self.peek().is_none() || self.line_indent < inner {
                break;
            }
            if self.line_indent > inner {
                return Err(syntax_error("unexpected indent"));
            }
        }
        Ok(body)
    }

    fn for_stmt(&mut self, indent: usize) -> EvalResult<Stmt> {
        self.advance();
        let target = self.target_list()?;
        self.consume(&Token::In, "`in`")?;
        let iter = self.expr_list()?;
        let body = self.suite(indent)?;
        Ok(Stmt::For { target, iter, body })
    }

    fn while_stmt(&mut self, indent: usize) -> EvalResult<Stmt> {
        self.advance();
        let condition = self.expr()?;
        let body = self.suite(indent)?;
        Ok(Stmt::While { condition, body })
    }

    fn if_stmt(&mut self, indent: usize) -> EvalResult<Stmt> {
        self.advance();
        let condition = self.expr()?;
        let mut branches = vec![(condition, self.suite(indent)?)];
        let mut otherwise = Vec::new();
        loop {
            let (saved_pos, saved_indent) = (self.pos, self.line_indent);
            self.skip_newlines();
            if self.line_indent == indent && self.eat(&Token::Elif) {
                let condition = self.expr()?;
                branches.push((condition, self.suite(indent)?));
                continue;
            }
            if self.line_indent == indent && self.eat(&Token::Else) {
                otherwise = self.suite(indent)?;
            } else {
                self.pos = saved_pos;
                self.line_indent = saved_indent;
            }
            break;
        }
        Ok(Stmt::If {
            branches,
            otherwise,
        })
    }

    fn def_stmt(&mut self, indent: usize) -> EvalResult<Stmt> {
        self.advance();
        let name = self.ident("a function name")?;
        self.consume(&Token::LParen, "`(`")?;
        let mut params = Vec::new();
        let mut defaults = Vec::new();
        while !self.eat(&Token::RParen) {
            params.push(self.ident("a parameter name")?);
            defaults.push(if self.eat(&Token::Eq) {
                Some(self.expr()?)
            } else {
                None
            });
            if !self.eat(&Token::Comma) {
                self.consume(&Token::RParen, "`)`")?;
                break;
            }
        }
        let body = self.suite(indent)?;
        Ok(Stmt::Def(Arc::new(FunctionDef {
            name,
            params,
            defaults,
            body,
        })))
    }

    fn simple_stmt(&mut self) -> EvalResult<Stmt> {
        match self.peek() {
            Some(Token::Pass) => {
                self.advance();
                Ok(Stmt::Pass)
            }
            Some(Token::Break) => {
                self.advance();
                Ok(Stmt::Break)
            }
            Some(Token::Continue) => {
                self.advance();
                Ok(Stmt::Continue)
            }
            Some(Token::Return) => {
                self.advance();
                let value = self.optional_expr_list()?;
                Ok(Stmt::Return(value))
            }
            Some(Token::Raise) => {
                self.advance();
                let value = self.optional_expr_list()?;
                Ok(Stmt::Raise(value))
            }
            Some(Token::Assert) => {
                self.advance();
                let condition = self.expr()?;
                let message = if self.eat(&Token::Comma) {
                    Some(self.expr()?)
                } else {
                    None
                };
                Ok(Stmt::Assert(condition, message))
            }
            Some(Token::Del) => {
                self.advance();
                let target = to_target(self.expr()?)?;
                Ok(Stmt::Del(target))
            }
            Some(Token::Import) => {
                self.advance();
                let module = self.dotted_name()?;
                let alias = if self.eat(&Token::As) {
                    Some(self.ident("an alias")?)
                } else {
                    None
                };
                Ok(Stmt::Import { module, alias })
            }
            Some(Token::From) => {
                self.advance();
                let module = self.dotted_name()?;
                self.consume(&Token::Import, "`import`")?;
                let mut names = Vec::new();
                loop {
                    let name = self.ident("a name to import")?;
                    let alias = if self.eat(&Token::As) {
                        Some(self.ident("an alias")?)
                    } else {
                        None
                    };
                    names.push((name, alias));
                    if !self.eat(&Token::Comma) {
                        break;
                    }
                }
                Ok(Stmt::FromImport { module, names })
            }
            _ => self.expr_stmt(),
        }
    }

    fn expr_stmt(&mut self) -> EvalResult<Stmt> {
        let first = self.expr_list()?;
        let aug = match self.peek() {
            Some(Token::PlusEq) => Some(BinaryOp::Add),
            Some(Token::MinusEq) => Some(BinaryOp::Sub),
            Some(Token::StarEq) => Some(BinaryOp::Mul),
            Some(Token::SlashEq) => Some(BinaryOp::Div),
            _ => None,
        };
        if let Some(op) = aug {
            self.advance();
            let value = self.expr_list()?;
            return Ok(Stmt::AugAssign(to_target(first)?, op, value));
        }
        if !self.eat(&Token::Eq) {
            return Ok(Stmt::Expr(first));
        }
        let mut targets = vec![to_target(first)?];
        let mut value = self.expr_list()?;
        while self.eat(&Token::Eq) {
            targets.push(to_target(value)?);
            value = self.expr_list()?;
        }
        Ok(Stmt::Assign(targets, value))
    }

    fn optional_expr_list(&mut self) -> EvalResult<Option<Expr>> {
        if self.at_line_end() || self.peek() == Some(&Token::Semicolon) {
            Ok(None)
        } else {
            Ok(Some(self.expr_list()?))
        }
    }

    fn dotted_name(&mut self) -> EvalResult<String> {
        let mut name = self.ident("a module name")?;
        while self.eat(&Token::Dot) {
            name.push('.');
            name.push_str(&self.ident("a module name")?);
        }
        Ok(name)
    }

    /// Loop targets: names, optionally parenthesized and comma-separated.
    fn target_list(&mut self) -> EvalResult<Target> {
        let first = self.target_atom()?;
        if self.peek() != Some(&Token::Comma) {
            return Ok(first);
        }
        let mut items = vec![first];
        while self.eat(&Token::Comma) {
            if self.peek() == Some(&Token::In) {
                break;
            }
            items.push(self.target_atom()?);
        }
        Ok(Target::Unpack(items))
    }

    fn target_atom(&mut self) -> EvalResult<Target> {
        if self.eat(&Token::LParen) {
            let base = self.nesting;
            self.descend()?;
            let inner = self.target_list()?;
            self.consume(&Token::RParen, "`)`")?;
            self.nesting = base;
            return Ok(inner);
        }
        Ok(Target::Name(self.ident("a loop variable")?))
    }

    // === Expressions ===

    /// Comma-separated expressions; more than one makes a tuple.
    fn expr_list(&mut self) -> EvalResult<Expr> {
        let first = self.expr()?;
        if self.peek() != Some(&Token::Comma) {
            return Ok(first);
        }
        let mut items = vec![first];
        while self.eat(&Token::Comma) {
            if !self.starts_expression() {
                break;
            }
            items.push(self.expr()?);
        }
        Ok(Expr::Tuple(items))
    }

    fn expr(&mut self) -> EvalResult<Expr> {
        let base = self.nesting;
        self.descend()?;
        let expr = self.conditional()?;
        self.nesting = base;
        Ok(expr)
    }

    fn conditional(&mut self) -> EvalResult<Expr> {
        let then = self.or_test()?;
        if !self.eat(&Token::If) {
            return Ok(then);
        }
        let condition = self.or_test()?;
        self.consume(&Token::Else, "`else`")?;
        let otherwise = self.expr()?;
        Ok(Expr::IfElse {
            condition: Box::new(condition),
            then: Box::new(then),
            otherwise: Box::new(otherwise),
        })
    }

    fn or_test(&mut self) -> EvalResult<Expr> {
        let base = self.nesting;
        let mut left = self.and_test()?;
        while self.eat(&Token::Or) {
            self.descend()?;
            let right = self.and_test()?;
            left = Expr::Or(Box::new(left), Box::new(right));
        }
        self.nesting = base;
        Ok(left)
    }

    fn and_test(&mut self) -> EvalResult<Expr> {
        let base = self.nesting;
        let mut left = self.not_test()?;
        while self.eat(&Token::And) {
            self.descend()?;
            let right = self.not_test()?;
            left = Expr::And(Box::new(left), Box::new(right));
        }
        self.nesting = base;
        Ok(left)
    }

    fn not_test(&mut self) -> EvalResult<Expr> {
        if self.eat(&Token::Not) {
            let base = self.nesting;
            self.descend()?;
            let operand = self.not_test()?;
            self.nesting = base;
            return Ok(Expr::Unary(UnaryOp::Not, Box::new(operand)));
        }
        self.comparison()
    }

    /// Chained comparisons `a < b < c` become `a < b and b < c`.
    fn comparison(&mut self) -> EvalResult<Expr> {
        let base = self.nesting;
        let mut left = self.arith()?;
        let mut result: Option<Expr> = None;
        while let Some(op) = self.compare_op() {
            self.descend()?;
            let right = self.arith()?;
            let compare = Expr::Compare(op, Box::new(left), Box::new(right.clone()));
            result = Some(match result {
                Some(previous) => Expr::And(Box::new(previous), Box::new(compare)),
                None => compare,
            });
            left = right;
        }
        self.nesting = base;
        Ok(result.unwrap_or(left))
    }

    fn compare_op(&mut self) -> Option<CompareOp> {
        let op = match self.peek()? {
            Token::EqEq => CompareOp::Eq,
            Token::NotEq => CompareOp::NotEq,
            Token::Lt => CompareOp::Lt,
            Token::LtEq => CompareOp::LtEq,
            Token::Gt => CompareOp::Gt,
            Token::GtEq => CompareOp::GtEq,
            Token::In => CompareOp::In,
            Token::Not if self.peek_at(1) == Some(&Token::In) => {
                self.pos += 2;
                return Some(CompareOp::NotIn);
            }
            Token::Is if self.peek_at(1) == Some(&Token::Not) => {
                self.pos += 2;
                return Some(CompareOp::IsNot);
            }
            Token::Is => CompareOp::Is,
            _ => return None,
        };
        self.pos += 1;
        Some(op)
    }

    fn arith(&mut self) -> EvalResult<Expr> {
        let base = self.nesting;
        let mut left = self.term()?;
        loop {
            let op = match self.peek() {
                Some(Token::Plus) => BinaryOp::Add,
                Some(Token::Minus) => BinaryOp::Sub,
                _ => break,
            };
            self.advance();
            self.descend()?;
            let right = self.term()?;
            left = Expr::Binary(op, Box::new(left), Box::new(right));
        }
        self.nesting = base;
        Ok(left)
    }

    fn term(&mut self) -> EvalResult<Expr> {
        let base = self.nesting;
        let mut left = self.factor()?;
        loop {
            let op = match self.peek() {
                Some(Token::Star) => BinaryOp::Mul,
                Some(Token::Slash) => BinaryOp::Div,
                Some(Token::SlashSlash) => BinaryOp::FloorDiv,
                Some(Token::Percent) => BinaryOp::Mod,
                Some(Token::At) => BinaryOp::MatMul,
                _ => break,
            };
            self.advance();
            self.descend()?;
            let right = self.factor()?;
            left = Expr::Binary(op, Box::new(left), Box::new(right));
        }
        self.nesting = base;
        Ok(left)
    }

    fn factor(&mut self) -> EvalResult<Expr> {
        let op = match self.peek() {
            Some(Token::Minus) => UnaryOp::Neg,
            Some(Token::Plus) => UnaryOp::Pos,
            _ => return self.power(),
        };
        self.advance();
        let base = self.nesting;
        self.descend()?;
        let operand = self.factor()?;
        self.nesting = base;
        Ok(Expr::Unary(op, Box::new(operand)))
    }

    fn power(&mut self) -> EvalResult<Expr> {
        let base = self.postfix()?;
        if self.eat(&Token::StarStar) {
            let level = self.nesting;
            self.descend()?;
            let exponent = self.factor()?;
            self.nesting = level;
            return Ok(Expr::Binary(BinaryOp::Pow, Box::new(base), Box::new(exponent)));
        }
        Ok(base)
    }

    fn postfix(&mut self) -> EvalResult<Expr> {
        let base = self.nesting;
        let mut expr = self.atom()?;
        loop {
            if matches!(self.peek(), Some(Token::LParen | Token::LBracket | Token::Dot)) {
                self.descend()?;
            }
            if self.eat(&Token::LParen) {
                let (args, kwargs) = self.call_args()?;
                expr = Expr::Call {
                    callee: Box::new(expr),
                    args,
                    kwargs,
                };
            } else if self.eat(&Token::LBracket) {
                let index = self.subscript()?;
                self.consume(&Token::RBracket, "`]`")?;
                expr = Expr::Index(Box::new(expr), Box::new(index));
            } else if self.eat(&Token::Dot) {
                let name = self.ident("an attribute name")?;
                expr = Expr::Attr(Box::new(expr), name);
            } else {
                self.nesting = base;
                return Ok(expr);
            }
        }
    }

    fn call_args(&mut self) -> EvalResult<(Vec<Expr>, Vec<(String, Expr)>)> {
        let mut args = Vec::new();
        let mut kwargs = Vec::new();
        while !self.eat(&Token::RParen) {
            if let (Some(Token::Ident(name)), Some(Token::Eq)) = (self.peek(), self.peek_at(1)) {
                let name = name.clone();
                self.pos += 2;
                kwargs.push((name, self.expr()?));
            } else if kwargs.is_empty() {
                args.push(self.expr()?);
            } else {
                return Err(syntax_error(
                    "positional argument follows keyword argument",
                ));
            }
            if !self.eat(&Token::Comma) {
                self.consume(&Token::RParen, "`)`")?;
                break;
            }
        }
        Ok((args, kwargs))
    }

    fn subscript(&mut self) -> EvalResult<Expr> {
        let first = self.slice_item()?;
        if self.peek() != Some(&Token::Comma) {
            return Ok(first);
        }
        let mut items = vec![first];
        while self.eat(&Token::Comma) {
            if self.peek() == Some(&Token::RBracket) {
                break;
            }
            items.push(self.slice_item()?);
        }
        Ok(Expr::Tuple(items))
    }

    fn slice_item(&mut self) -> EvalResult<Expr> {
        let start = if self.peek() == Some(&Token::Colon) {
            None
        } else {
            let expr = self.expr()?;
            if self.peek() != Some(&Token::Colon) {
                return Ok(expr);
            }
            Some(Box::new(expr))
        };
        self.consume(&Token::Colon, "`:`")?;
        let stop = self.slice_bound()?;
        let step = if self.eat(&Token::Colon) {
            self.slice_bound()?
        } else {
            None
        };
        Ok(Expr::Slice { start, stop, step })
    }

    fn slice_bound(&mut self) -> EvalResult<Option<Box<Expr>>> {
        if matches!(
            self.peek(),
            Some(Token::Colon | Token::Comma | Token::RBracket)
        ) {
            Ok(None)
        } else {
            Ok(Some(Box::new(self.expr()?)))
        }
    }

    fn atom(&mut self) -> EvalResult<Expr> {
        let Some(token) = self.advance() else {
            return Err(syntax_error("unexpected EOF while parsing"));
        };
        match token {
            Token::Int(value) => Ok(Expr::Int(value)),
            Token::Float(value) => Ok(Expr::Float(value)),
            Token::Str(mut text) => {
                // Adjacent literals concatenate.
                while let Some(Token::Str(more)) = self.peek() {
                    text.push_str(more);
                    self.pos += 1;
                }
                Ok(Expr::Str(text))
            }
            Token::True => Ok(Expr::Bool(true)),
            Token::False => Ok(Expr::Bool(false)),
            Token::None => Ok(Expr::None),
            Token::Ident(name) => Ok(Expr::Name(name)),
            Token::LParen => {
                if self.eat(&Token::RParen) {
                    return Ok(Expr::Tuple(Vec::new()));
                }
                let inner = self.expr_list()?;
                self.consume(&Token::RParen, "`)`")?;
                Ok(inner)
            }
            Token::LBracket => self.list_display(),
            Token::LBrace => self.dict_display(),
            other => {
                self.pos -= 1;
                Err(syntax_error(format!("invalid syntax at {other:?}")))
            }
        }
    }

    fn list_display(&mut self) -> EvalResult<Expr> {
        if self.eat(&Token::RBracket) {
            return Ok(Expr::List(Vec::new()));
        }
        let first = self.expr()?;
        if self.eat(&Token::For) {
            let target = self.target_list()?;
            self.consume(&Token::In, "`in`")?;
            let iter = self.or_test()?;
            let condition = if self.eat(&Token::If) {
                Some(Box::new(self.or_test()?))
            } else {
                None
            };
            self.consume(&Token::RBracket, "`]`")?;
            return Ok(Expr::ListComp {
                element: Box::new(first),
                target: Box::new(target),
                iter: Box::new(iter),
                condition,
            });
        }
        let mut items = vec![first];
        while self.eat(&Token::Comma) {
            if self.peek() == Some(&Token::RBracket) {
                break;
            }
            items.push(self.expr()?);
        }
        self.consume(&Token::RBracket, "`]`")?;
        Ok(Expr::List(items))
    }

    fn dict_display(&mut self) -> EvalResult<Expr> {
        let mut entries = Vec::new();
        while !self.eat(&Token::RBrace) {
            let key = self.expr()?;
            self.consume(&Token::Colon, "`:`")?;
            let value = self.expr()?;
            entries.push((key, value));
            if !self.eat(&Token::Comma) {
                self.consume(&Token::RBrace, "`}`")?;
                break;
            }
        }
        Ok(Expr::Dict(entries))
    }
}

fn to_target(expr: Expr) -> EvalResult<Target> {
    match expr {
        Expr::Name(name) => Ok(Target::Name(name)),
        Expr::Index(container, index) => Ok(Target::Index(*container, *index)),
        Expr::Tuple(items) | Expr::List(items) => Ok(Target::Unpack(
            items.into_iter().map(to_target).collect::<EvalResult<_>>()?,
        )),
        _ => Err(syntax_error("cannot assign to expression")),
    }
}

#[cfg(test)]
#[expect(clippy::unwrap_used, reason = "Tests use unwrap for brevity")]
mod tests;

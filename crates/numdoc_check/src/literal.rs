//! Literal transcripts: reading printed output back into data.
//!
//! Recognised forms:
//! - scalars: `1`, `-2.5e-3`, `nan`, `-inf`, `True`, `None`, `'text'`
//! - numeric wrappers carrying a kind: `float64(1.5)`, `np.int32(7)`
//! - containers: `[..]`, `(..)`, `{k: v}`, and a bare top-level `a, b`
//! - array reprs: `array([[1., 2.], [3., 4.]], dtype=float32)`,
//!   abbreviated with `...` and annotated with `shape=(n,)`
//! - masked arrays: `masked_array(data=[1, --, 3], mask=[...])`
//! - printed arrays without commas: `[0.5 1.  1.5]`
//! - named tuples: `Result(statistic=1.0, pvalue=0.5)`, read as `(1.0, 0.5)`
//!
//! Anything else is not a literal, and the caller falls back to strict text
//! comparison.

use logos::Logos;

/// Deepest container nesting read back; deeper output is not a literal.
const MAX_DEPTH: usize = 256;

/// Numeric kind, compared only under `strict_types`.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum NumKind {
    Int,
    Float,
    /// A wrapper such as `float64(..)`, by its unqualified name.
    Named(String),
}

#[derive(Clone, Debug, PartialEq)]
pub struct Number {
    pub value: f64,
    pub kind: NumKind,
}

/// How an array was printed. Reprs and bare prints never compare equal.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ArrayStyle {
    Repr,
    Printed,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ArrayLiteral {
    pub style: ArrayStyle,
    /// Elements in row-major order, abbreviation markers removed.
    pub leaves: Vec<Literal>,
    /// Shape read from the nesting; `None` when abbreviated.
    pub shape: Option<Vec<usize>>,
    /// Shape from a `shape=` annotation.
    pub declared_shape: Option<Vec<usize>>,
    pub dtype: Option<String>,
    pub abbreviated: bool,
}

/// A value read from a transcript.
#[derive(Clone, Debug, PartialEq)]
pub enum Literal {
    Number(Number),
    Str(String),
    Bool(bool),
    None,
    /// A masked array entry, printed as `--`.
    Masked,
    Ellipsis,
    List(Vec<Literal>),
    Tuple(Vec<Literal>),
    Dict(Vec<(Literal, Literal)>),
    Array(ArrayLiteral),
}

#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
#[logos(skip r"[ \t\r\n]+")]
enum Tok {
    #[token("[")]
    LBracket,
    #[token("]")]
    RBracket,
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token("{")]
    LBrace,
    #[token("}")]
    RBrace,
    #[token(",")]
    Comma,
    #[token(":")]
    Colon,
    #[token("=")]
    Eq,
    #[token("...")]
    Ellipsis,
    #[token("--")]
    Masked,
    #[token("-")]
    Minus,
    #[token("+")]
    Plus,
    #[regex(r"([0-9]+\.[0-9]*|\.[0-9]+)([eE][+-]?[0-9]+)?")]
    #[regex(r"[0-9]+[eE][+-]?[0-9]+")]
    Float,
    #[regex(r"[0-9]+")]
    Int,
    #[regex(r#""([^"\\\n]|\\.)*""#)]
    #[regex(r"'([^'\\\n]|\\.)*'")]
    Str,
    #[regex(r"[A-Za-z_][A-Za-z0-9_]*(\.[A-Za-z_][A-Za-z0-9_]*)*")]
    Ident,
}

/// Read `text` as a literal value.
///
/// `named_tuples` enables reading `Name(a=1, b=2)` as the tuple `(1, 2)`.
pub fn parse_literal(text: &str, named_tuples: bool) -> Option<Literal> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    let tokens = tokenize(text)?;
    let strict = LiteralParser::new(&tokens, named_tuples).document();
    if strict.is_some() {
        return strict;
    }
    if text.starts_with('[') && text.ends_with(']') {
        return LiteralParser::new(&tokens, named_tuples).printed_array();
    }
    None
}

fn tokenize(text: &str) -> Option<Vec<(Tok, &str)>> {
    let mut lexer = Tok::lexer(text);
    let mut tokens = Vec::new();
    while let Some(token) = lexer.next() {
        tokens.push((token.ok()?, lexer.slice()));
    }
    Some(tokens)
}

struct LiteralParser<'t, 's> {
    tokens: &'t [(Tok, &'s str)],
    pos: usize,
    named_tuples: bool,
    depth: usize,
}

/// Arguments of a call-shaped literal.
#[derive(Default)]
struct CallArgs<'s> {
    positional: Vec<Literal>,
    keyword: Vec<(&'s str, Literal)>,
}

impl<'s> CallArgs<'s> {
    fn keyword(&self, name: &str) -> Option<&Literal> {
        self.keyword
            .iter()
            .find(|(key, _)| *key == name)
            .map(|(_, value)| value)
    }
}

impl<'t, 's> LiteralParser<'t, 's> {
    fn new(tokens: &'t [(Tok, &'s str)], named_tuples: bool) -> Self {
        LiteralParser {
            tokens,
            pos: 0,
            named_tuples,
            depth: 0,
        }
    }

    fn peek(&self) -> Option<Tok> {
        self.tokens.get(self.pos).map(|(tok, _)| *tok)
    }

    fn peek_at(&self, offset: usize) -> Option<Tok> {
        self.tokens.get(self.pos + offset).map(|(tok, _)| *tok)
    }

    fn bump(&mut self) -> Option<(Tok, &'s str)> {
        let token = self.tokens.get(self.pos).copied();
        self.pos += 1;
        token
    }

    fn eat(&mut self, expected: Tok) -> bool {
        if self.peek() == Some(expected) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn consume(&mut self, expected: Tok) -> Option<()> {
        self.eat(expected).then_some(())
    }

    fn at_end(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    /// A whole transcript: one value, or a bare comma-separated tuple.
    fn document(mut self) -> Option<Literal> {
        let first = self.value()?;
        if self.at_end() {
            return Some(first);
        }
        let mut items = vec![first];
        while self.eat(Tok::Comma) {
            if self.at_end() {
                break;
            }
            items.push(self.value()?);
        }
        self.at_end().then_some(Literal::Tuple(items))
    }

    fn value(&mut self) -> Option<Literal> {
        self.nested(Self::item)
    }

    /// Run `parse` one container level deeper, failing past [`MAX_DEPTH`].
    fn nested(&mut self, parse: fn(&mut Self) -> Option<Literal>) -> Option<Literal> {
        if self.depth >= MAX_DEPTH {
            return None;
        }
        self.depth += 1;
        let literal = parse(self);
        self.depth -= 1;
        literal
    }

    fn item(&mut self) -> Option<Literal> {
        match self.peek()? {
            Tok::LBracket => {
                self.bump();
                Some(Literal::List(self.sequence(Tok::RBracket)?))
            }
            Tok::LParen => self.parenthesized(),
            Tok::LBrace => self.dict(),
            Tok::Ellipsis => {
                self.bump();
                Some(Literal::Ellipsis)
            }
            Tok::Masked => {
                self.bump();
                Some(Literal::Masked)
            }
            Tok::Str => {
                let (_, slice) = self.bump()?;
                Some(Literal::Str(unquote(slice)))
            }
            Tok::Ident if self.peek_at(1) == Some(Tok::LParen) => self.call(),
            Tok::Minus | Tok::Plus | Tok::Float | Tok::Int | Tok::Ident => self.scalar(),
            _ => None,
        }
    }

    /// Comma-separated values up to `close`, which is consumed.
    fn sequence(&mut self, close: Tok) -> Option<Vec<Literal>> {
        let mut items = Vec::new();
        loop {
            if self.eat(close) {
                return Some(items);
            }
            items.push(self.value()?);
            if !self.eat(Tok::Comma) {
                self.consume(close)?;
                return Some(items);
            }
        }
    }

    fn parenthesized(&mut self) -> Option<Literal> {
        self.consume(Tok::LParen)?;
        if self.eat(Tok::RParen) {
            return Some(Literal::Tuple(Vec::new()));
        }
        let first = self.value()?;
        if self.eat(Tok::RParen) {
            // `(x)` is grouping, not a tuple.
            return Some(first);
        }
        self.consume(Tok::Comma)?;
        let mut items = vec![first];
        items.extend(self.sequence(Tok::RParen)?);
        Some(Literal::Tuple(items))
    }

    fn dict(&mut self) -> Option<Literal> {
        self.consume(Tok::LBrace)?;
        let mut entries = Vec::new();
        loop {
            if self.eat(Tok::RBrace) {
                return Some(Literal::Dict(entries));
            }
            let key = self.value()?;
            self.consume(Tok::Colon)?;
            let value = self.value()?;
            entries.push((key, value));
            if !self.eat(Tok::Comma) {
                self.consume(Tok::RBrace)?;
                return Some(Literal::Dict(entries));
            }
        }
    }

    /// Signed numbers and the named constants.
    fn scalar(&mut self) -> Option<Literal> {
        let negative = match self.peek()? {
            Tok::Minus => {
                self.bump();
                true
            }
            Tok::Plus => {
                self.bump();
                false
            }
            _ => false,
        };
        let (tok, slice) = self.bump()?;
        let number = match tok {
            Tok::Int => Number {
                value: int_value(slice)?,
                kind: NumKind::Int,
            },
            Tok::Float => Number {
                value: slice.parse().ok()?,
                kind: NumKind::Float,
            },
            Tok::Ident => match last_segment(slice) {
                "nan" | "NaN" => Number {
                    value: f64::NAN,
                    kind: NumKind::Float,
                },
                "inf" | "Inf" => Number {
                    value: f64::INFINITY,
                    kind: NumKind::Float,
                },
                "True" if !negative => return Some(Literal::Bool(true)),
                "False" if !negative => return Some(Literal::Bool(false)),
                "None" if !negative => return Some(Literal::None),
                _ => return None,
            },
            _ => return None,
        };
        Some(Literal::Number(Number {
            value: if negative { -number.value } else { number.value },
            kind: number.kind,
        }))
    }

    fn call(&mut self) -> Option<Literal> {
        let (_, name) = self.bump()?;
        self.consume(Tok::LParen)?;
        let args = self.call_args()?;
        let name = last_segment(name);

        match name {
            "array" => {
                let data = args.positional.first().or_else(|| args.keyword("data"))?;
                array_literal(data, &args, ArrayStyle::Repr)
            }
            "masked_array" => {
                let data = args.keyword("data").or_else(|| args.positional.first())?;
                array_literal(data, &args, ArrayStyle::Repr)
            }
            _ if args.positional.is_empty() && !args.keyword.is_empty() => self
                .named_tuples
                .then(|| Literal::Tuple(args.keyword.into_iter().map(|(_, v)| v).collect())),
            _ if args.keyword.is_empty() && args.positional.len() == 1 => {
                match args.positional.into_iter().next()? {
                    Literal::Number(number) => Some(Literal::Number(Number {
                        value: number.value,
                        kind: NumKind::Named(name.to_string()),
                    })),
                    _ => None,
                }
            }
            _ => None,
        }
    }

    fn call_args(&mut self) -> Option<CallArgs<'s>> {
        let mut args = CallArgs::default();
        loop {
            if self.eat(Tok::RParen) {
                return Some(args);
            }
            if self.peek() == Some(Tok::Ident) && self.peek_at(1) == Some(Tok::Eq) {
                let (_, key) = self.bump()?;
                self.bump();
                let value = self.keyword_value()?;
                args.keyword.push((key, value));
            } else {
                if !args.keyword.is_empty() {
                    return None;
                }
                args.positional.push(self.value()?);
            }
            if !self.eat(Tok::Comma) {
                self.consume(Tok::RParen)?;
                return Some(args);
            }
        }
    }

    /// Keyword values may be bare type names such as `dtype=float32`.
    fn keyword_value(&mut self) -> Option<Literal> {
        if self.peek() == Some(Tok::Ident) && self.peek_at(1) != Some(Tok::LParen) {
            let (_, slice) = self.tokens.get(self.pos).copied()?;
            if !is_constant(slice) {
                self.pos += 1;
                return Some(Literal::Str(slice.to_string()));
            }
        }
        self.value()
    }

    /// A numpy `print` of an array: brackets, no commas.
    fn printed_array(mut self) -> Option<Literal> {
        let nested = self.printed_sequence()?;
        if !self.at_end() {
            return None;
        }
        array_literal(&nested, &CallArgs::default(), ArrayStyle::Printed)
    }

    fn printed_sequence(&mut self) -> Option<Literal> {
        self.consume(Tok::LBracket)?;
        let mut items = Vec::new();
        loop {
            match self.peek()? {
                Tok::RBracket => {
                    self.bump();
                    return Some(Literal::List(items));
                }
                Tok::Comma => {
                    self.bump();
                }
                Tok::LBracket => items.push(self.nested(Self::printed_sequence)?),
                _ => items.push(self.value()?),
            }
        }
    }
}

fn is_constant(name: &str) -> bool {
    matches!(
        last_segment(name),
        "nan" | "NaN" | "inf" | "Inf" | "True" | "False" | "None"
    )
}

#[expect(clippy::cast_precision_loss, reason = "integers are compared with tolerance")]
fn int_value(slice: &str) -> Option<f64> {
    match slice.parse::<i64>() {
        Ok(value) => Some(value as f64),
        Err(_) => slice.parse().ok(),
    }
}

fn last_segment(name: &str) -> &str {
    name.rsplit('.').next().unwrap_or(name)
}

fn unquote(slice: &str) -> String {
    let inner = &slice[1..slice.len() - 1];
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    out
}

/// Build an array from nested list data and the call's keyword arguments.
fn array_literal(data: &Literal, args: &CallArgs<'_>, style: ArrayStyle) -> Option<Literal> {
    let mut leaves = Vec::new();
    let mut abbreviated = false;
    flatten(data, &mut leaves, &mut abbreviated)?;
    let shape = if abbreviated {
        None
    } else {
        Some(infer_shape(data)?)
    };
    let declared_shape = match args.keyword("shape") {
        Some(Literal::Tuple(dims)) => Some(dims.iter().map(dimension).collect::<Option<Vec<_>>>()?),
        Some(single) => Some(vec![dimension(single)?]),
        None => None,
    };
    let dtype = match args.keyword("dtype") {
        Some(Literal::Str(name)) => Some(last_segment(name).to_string()),
        Some(_) => return None,
        None => None,
    };
    Some(Literal::Array(ArrayLiteral {
        style,
        leaves,
        shape,
        declared_shape,
        dtype,
        abbreviated,
    }))
}

fn dimension(literal: &Literal) -> Option<usize> {
    match literal {
        Literal::Number(Number {
            value,
            kind: NumKind::Int,
        }) if *value >= 0.0 => to_dimension(*value),
        _ => None,
    }
}

#[expect(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    reason = "non-negative integer literal"
)]
fn to_dimension(value: f64) -> Option<usize> {
    (value.fract() == 0.0).then_some(value as usize)
}

fn flatten(data: &Literal, leaves: &mut Vec<Literal>, abbreviated: &mut bool) -> Option<()> {
    match data {
        Literal::List(items) => {
            for item in items {
                flatten(item, leaves, abbreviated)?;
            }
        }
        Literal::Ellipsis => *abbreviated = true,
        Literal::Number(_) | Literal::Bool(_) | Literal::Str(_) | Literal::Masked | Literal::None => {
            leaves.push(data.clone());
        }
        Literal::Tuple(_) | Literal::Dict(_) | Literal::Array(_) => return None,
    }
    Some(())
}

/// Shape of rectangular nested list data; `None` when ragged.
fn infer_shape(data: &Literal) -> Option<Vec<usize>> {
    let Literal::List(items) = data else {
        return Some(Vec::new());
    };
    let mut inner: Option<Vec<usize>> = None;
    for item in items {
        let shape = infer_shape(item)?;
        match &inner {
            Some(existing) if *existing != shape => return None,
            Some(_) => {}
            None => inner = Some(shape),
        }
    }
    let mut shape = vec![items.len()];
    shape.extend(inner.unwrap_or_default());
    Some(shape)
}

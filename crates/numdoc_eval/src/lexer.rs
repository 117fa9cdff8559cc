//! Source tokenizer.
//!
//! Newlines carry the indentation of the line they start. Newlines inside
//! brackets are dropped, so bracketed expressions may span lines.

use std::ops::Range;

use logos::Logos;
use numdoc_ir::ExecError;

use crate::errors::syntax_error;

#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"[ \t\r]+")]
#[logos(skip r"#[^\n]*")]
#[logos(skip r"\\\r?\n")]
pub(crate) enum Token {
    #[regex(r"\n[ \t]*", |lex| indent_width(lex.slice()))]
    Newline(usize),

    #[token("for")]
    For,
    #[token("in")]
    In,
    #[token("while")]
    While,
    #[token("if")]
    If,
    #[token("elif")]
    Elif,
    #[token("else")]
    Else,
    #[token("def")]
    Def,
    #[token("return")]
    Return,
    #[token("raise")]
    Raise,
    #[token("assert")]
    Assert,
    #[token("import")]
    Import,
    #[token("from")]
    From,
    #[token("as")]
    As,
    #[token("del")]
    Del,
    #[token("pass")]
    Pass,
    #[token("break")]
    Break,
    #[token("continue")]
    Continue,
    #[token("not")]
    Not,
    #[token("and")]
    And,
    #[token("or")]
    Or,
    #[token("is")]
    Is,
    #[token("True")]
    True,
    #[token("False")]
    False,
    #[token("None")]
    None,

    #[regex(r"([0-9]+\.[0-9]*|\.[0-9]+)([eE][+-]?[0-9]+)?", |lex| lex.slice().parse::<f64>().ok())]
    #[regex(r"[0-9]+[eE][+-]?[0-9]+", |lex| lex.slice().parse::<f64>().ok())]
    Float(f64),
    #[regex(r"[0-9]+", |lex| lex.slice().parse::<i64>().ok())]
    Int(i64),
    #[regex(r#""([^"\\\n]|\\.)*""#, |lex| unescape(lex.slice()))]
    #[regex(r"'([^'\\\n]|\\.)*'", |lex| unescape(lex.slice()))]
    Str(String),
    #[regex(r"[A-Za-z_][A-Za-z0-9_]*", |lex| lex.slice().to_string())]
    Ident(String),

    #[token("+")]
    Plus,
    #[token("-")]
    Minus,
    #[token("*")]
    Star,
    #[token("**")]
    StarStar,
    #[token("/")]
    Slash,
    #[token("//")]
    SlashSlash,
    #[token("%")]
    Percent,
    #[token("@")]
    At,
    #[token("==")]
    EqEq,
    #[token("!=")]
    NotEq,
    #[token("<")]
    Lt,
    #[token("<=")]
    LtEq,
    #[token(">")]
    Gt,
    #[token(">=")]
    GtEq,
    #[token("=")]
    Eq,
    #[token("+=")]
    PlusEq,
    #[token("-=")]
    MinusEq,
    #[token("*=")]
    StarEq,
    #[token("/=")]
    SlashEq,
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token("[")]
    LBracket,
    #[token("]")]
    RBracket,
    #[token("{")]
    LBrace,
    #[token("}")]
    RBrace,
    #[token(",")]
    Comma,
    #[token(":")]
    Colon,
    #[token(";")]
    Semicolon,
    #[token(".")]
    Dot,
}

fn indent_width(slice: &str) -> usize {
    slice[1..]
        .chars()
        .map(|c| if c == '\t' { 8 } else { 1 })
        .sum()
}

fn unescape(slice: &str) -> String {
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
            Some('0') => out.push('\0'),
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    out
}

/// A token with its byte range in the source.
pub(crate) type Spanned = (Token, Range<usize>);

/// Tokenize `source`, dropping newlines nested inside brackets.
pub(crate) fn tokenize(source: &str) -> Result<Vec<Spanned>, ExecError> {
    let mut lexer = Token::lexer(source);
    let mut tokens = Vec::new();
    let mut depth = 0usize;
    while let Some(token) = lexer.next() {
        let span = lexer.span();
        let Ok(token) = token else {
            return Err(syntax_error(format!(
                "invalid syntax at `{}`",
                &source[span.clone()]
            )));
        };
        match token {
            Token::LParen | Token::LBracket | Token::LBrace => depth += 1,
            Token::RParen | Token::RBracket | Token::RBrace => {
                depth = depth
                    .checked_sub(1)
                    .ok_or_else(|| syntax_error("unmatched closing bracket"))?;
            }
            Token::Newline(_) if depth > 0 => continue,
            _ => {}
        }
        tokens.push((token, span));
    }
    if depth > 0 {
        return Err(syntax_error("unexpected EOF while parsing"));
    }
    Ok(tokens)
}

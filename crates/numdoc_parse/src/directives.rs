//! Inline comment scanning: option directives and marker tokens.

use numdoc_ir::{ExampleOptions, OptionFlags};

use crate::ParseError;

const DIRECTIVE_PREFIX: &str = "doctest:";

/// Locate a `# doctest: ...` comment and return (comment start, directive body).
///
/// The `#` must not sit inside a string literal on the same line.
pub(crate) fn find_directive(line: &str) -> Option<(usize, &str)> {
    let hash = comment_start(line)?;
    let comment = line[hash + 1..].trim_start();
    let body = comment.strip_prefix(DIRECTIVE_PREFIX)?;
    Some((hash, body.trim()))
}

/// Byte offset of the first `#` outside a quoted string.
fn comment_start(line: &str) -> Option<usize> {
    let mut quote: Option<char> = None;
    let mut escaped = false;
    for (offset, c) in line.char_indices() {
        match quote {
            Some(q) => {
                if escaped {
                    escaped = false;
                } else if c == '\\' {
                    escaped = true;
                } else if c == q {
                    quote = None;
                }
            }
            None => match c {
                '\'' | '"' => quote = Some(c),
                '#' => return Some(offset),
                _ => {}
            },
        }
    }
    None
}

/// Parse a directive body such as `+SKIP, -ELLIPSIS` into `options`.
pub(crate) fn apply_directive(
    body: &str,
    line: usize,
    options: &mut ExampleOptions,
) -> Result<(), ParseError> {
    for token in body
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|t| !t.is_empty())
    {
        let (enable, name) = if let Some(name) = token.strip_prefix('+') {
            (true, name)
        } else if let Some(name) = token.strip_prefix('-') {
            (false, name)
        } else {
            return Err(ParseError::UnknownDirective {
                line,
                directive: token.to_string(),
            });
        };
        let Some(flag) = OptionFlags::from_name(name) else {
            return Err(ParseError::UnknownDirective {
                line,
                directive: token.to_string(),
            });
        };
        if enable {
            options.enable |= flag;
        } else {
            options.disable |= flag;
        }
    }
    Ok(())
}

/// Whether any of `tokens` occurs in `text`.
pub(crate) fn contains_any<'a, I>(text: &str, tokens: I) -> bool
where
    I: IntoIterator<Item = &'a String>,
{
    tokens.into_iter().any(|token| text.contains(token.as_str()))
}

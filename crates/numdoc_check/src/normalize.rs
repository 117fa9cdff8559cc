//! Text-level matching: blank-line markers, whitespace runs and ellipses.

use numdoc_ir::OptionFlags;

/// Stands for an empty line of expected output.
pub const BLANKLINE_MARKER: &str = "<BLANKLINE>";

/// Wildcard in expected output under `ELLIPSIS`.
pub const ELLIPSIS_MARKER: &str = "...";

/// Whether `got` matches `want` as text under `flags`.
pub fn text_matches(want: &str, got: &str, flags: OptionFlags) -> bool {
    if want == got {
        return true;
    }

    let (want, got) = if flags.contains(OptionFlags::DONT_ACCEPT_BLANKLINE) {
        (want.to_string(), got.to_string())
    } else {
        (
            replace_lines(want, |line| line.trim_end() == BLANKLINE_MARKER),
            replace_lines(got, |line| line.trim().is_empty()),
        )
    };
    if want == got {
        return true;
    }

    let (want, got) = if flags.contains(OptionFlags::NORMALIZE_WHITESPACE) {
        (collapse_whitespace(&want), collapse_whitespace(&got))
    } else {
        (want, got)
    };
    if want == got {
        return true;
    }

    flags.contains(OptionFlags::ELLIPSIS) && ellipsis_match(&want, &got)
}

/// Compare two error reports (`Kind: message`).
///
/// Under `IGNORE_EXCEPTION_DETAIL` only the kinds are compared, with any
/// dotted module prefix dropped.
pub fn exception_matches(want: &str, got: &str, flags: OptionFlags) -> bool {
    if flags.contains(OptionFlags::IGNORE_EXCEPTION_DETAIL) {
        return exception_kind(want) == exception_kind(got);
    }
    text_matches(want, got, flags)
}

fn exception_kind(report: &str) -> &str {
    let first = report.lines().next().unwrap_or_default();
    let kind = first.split(':').next().unwrap_or_default().trim();
    kind.rsplit('.').next().unwrap_or(kind)
}

/// `...` in `want` matches any (possibly empty) substring of `got`.
pub fn ellipsis_match(want: &str, got: &str) -> bool {
    if !want.contains(ELLIPSIS_MARKER) {
        return want == got;
    }
    let pieces: Vec<&str> = want.split(ELLIPSIS_MARKER).collect();
    let Some((first, rest)) = pieces.split_first() else {
        return false;
    };
    let Some((last, middle)) = rest.split_last() else {
        return false;
    };

    if !got.starts_with(first) || !got.ends_with(last) {
        return false;
    }
    let mut start = first.len();
    let end = got.len() - last.len();
    if start > end {
        return false;
    }
    for piece in middle {
        match got[start..end].find(piece) {
            Some(at) => start += at + piece.len(),
            None => return false,
        }
    }
    true
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Empty every line for which `blank` holds, keeping line endings.
fn replace_lines(text: &str, blank: impl Fn(&str) -> bool) -> String {
    let mut out = String::with_capacity(text.len());
    for line in text.split_inclusive('\n') {
        let (content, newline) = match line.strip_suffix('\n') {
            Some(content) => (content, "\n"),
            None => (line, ""),
        };
        if !blank(content) {
            out.push_str(content);
        }
        out.push_str(newline);
    }
    out
}

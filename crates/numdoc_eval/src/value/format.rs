//! Printed forms of scalars and arrays.

use super::{Array, DType};

/// One-dimensional arrays longer than this print abbreviated.
const SUMMARY_THRESHOLD: usize = 1000;
/// Elements shown on each side of an abbreviated array.
const EDGE_ITEMS: usize = 3;
/// Significant fraction digits shown for array elements.
const ELEMENT_PRECISION: usize = 8;

/// Shortest round-tripping form of a float, as Python's `repr`.
pub fn float_repr(value: f64) -> String {
    if value.is_nan() {
        return "nan".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "inf" } else { "-inf" }.to_string();
    }
    let magnitude = value.abs();
    if magnitude != 0.0 && !(1e-4..1e16).contains(&magnitude) {
        return scientific(&format!("{value:e}"));
    }
    let text = value.to_string();
    if text.contains('.') {
        text
    } else {
        format!("{text}.0")
    }
}

/// Rewrite Rust's `1.5e-7` as `1.5e-07`.
fn scientific(rust_form: &str) -> String {
    let Some((mantissa, exponent)) = rust_form.split_once('e') else {
        return rust_form.to_string();
    };
    let (sign, digits) = match exponent.strip_prefix('-') {
        Some(digits) => ('-', digits),
        None => ('+', exponent),
    };
    format!("{mantissa}e{sign}{digits:0>2}")
}

/// Quote a string the way Python's `repr` does.
pub fn str_repr(text: &str) -> String {
    let quote = if text.contains('\'') && !text.contains('"') {
        '"'
    } else {
        '\''
    };
    let mut out = String::with_capacity(text.len() + 2);
    out.push(quote);
    for c in text.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            c if c == quote => {
                out.push('\\');
                out.push(c);
            }
            c => out.push(c),
        }
    }
    out.push(quote);
    out
}

pub fn shape_repr(shape: &[usize]) -> String {
    match shape {
        [single] => format!("({single},)"),
        _ => format!(
            "({})",
            shape
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(", ")
        ),
    }
}

/// `array([1., 2.])`
pub fn array_repr(array: &Array) -> String {
    if array.size() == 0 {
        return format!("array([], dtype={})", array.dtype.name());
    }
    let abbreviated = is_abbreviated(array);
    let body = nest(&elements(array), &array.shape, ",", "array(".len());
    if abbreviated {
        format!("array({body}, shape={})", shape_repr(&array.shape))
    } else {
        format!("array({body})")
    }
}

/// `[1. 2.]`, as `print` shows an array.
pub fn array_str(array: &Array) -> String {
    if array.size() == 0 {
        return "[]".to_string();
    }
    nest(&elements(array), &array.shape, "", 0)
}

fn is_abbreviated(array: &Array) -> bool {
    array.ndim() == 1 && array.size() > SUMMARY_THRESHOLD
}

/// Padded element strings, with `...` standing in for the elided middle.
fn elements(array: &Array) -> Vec<String> {
    let shown: Vec<f64> = if is_abbreviated(array) {
        let tail = array.size() - EDGE_ITEMS;
        array.data[..EDGE_ITEMS]
            .iter()
            .chain(&array.data[tail..])
            .copied()
            .collect()
    } else {
        array.data.clone()
    };
    let mut items = match array.dtype {
        DType::Bool => pad_right_aligned(
            shown
                .iter()
                .map(|&v| if v == 0.0 { "False" } else { "True" }.to_string())
                .collect(),
        ),
        DType::Int => pad_right_aligned(shown.iter().map(|&v| int_element(v)).collect()),
        DType::Float => float_elements(&shown),
    };
    if is_abbreviated(array) {
        items.insert(EDGE_ITEMS, "...".to_string());
    }
    items
}

#[expect(
    clippy::cast_possible_truncation,
    reason = "integer arrays only hold integral values"
)]
fn int_element(value: f64) -> String {
    (value as i64).to_string()
}

fn pad_right_aligned(items: Vec<String>) -> Vec<String> {
    let width = items.iter().map(String::len).max().unwrap_or(0);
    items.into_iter().map(|s| format!("{s:>width$}")).collect()
}

fn float_elements(values: &[f64]) -> Vec<String> {
    let finite = values.iter().copied().filter(|v| v.is_finite() && *v != 0.0);
    let use_scientific = finite
        .map(f64::abs)
        .any(|m| !(1e-4..1e8).contains(&m));
    if use_scientific {
        return pad_right_aligned(values.iter().map(|&v| scientific_element(v)).collect());
    }
    let parts: Vec<(String, String)> = values
        .iter()
        .map(|&v| {
            let text = fixed_element(v);
            match text.split_once('.') {
                Some((int, frac)) => (int.to_string(), format!(".{frac}")),
                None => (text, String::new()),
            }
        })
        .collect();
    let int_width = parts.iter().map(|(i, _)| i.len()).max().unwrap_or(0);
    let frac_width = parts.iter().map(|(_, f)| f.len()).max().unwrap_or(0);
    parts
        .into_iter()
        .map(|(int, frac)| format!("{int:>int_width$}{frac:<frac_width$}"))
        .collect()
}

fn special(value: f64) -> Option<String> {
    if value.is_nan() {
        Some("nan".to_string())
    } else if value.is_infinite() {
        Some(if value > 0.0 { "inf" } else { "-inf" }.to_string())
    } else {
        None
    }
}

/// `0.33333333`, `2.`, `-1.5`
fn fixed_element(value: f64) -> String {
    if let Some(text) = special(value) {
        return text;
    }
    let text = format!("{value:.ELEMENT_PRECISION$}");
    let trimmed = text.trim_end_matches('0');
    if trimmed == "-." || trimmed == "." {
        // Values that round to zero at this precision.
        return if value.is_sign_negative() { "-0." } else { "0." }.to_string();
    }
    trimmed.to_string()
}

/// `1.e+10`, `1.5e-05`
fn scientific_element(value: f64) -> String {
    if let Some(text) = special(value) {
        return text;
    }
    let text = format!("{value:.ELEMENT_PRECISION$e}");
    let Some((mantissa, exponent)) = text.split_once('e') else {
        return text;
    };
    let mantissa = mantissa.trim_end_matches('0');
    let (sign, digits) = match exponent.strip_prefix('-') {
        Some(digits) => ('-', digits),
        None => ('+', exponent),
    };
    format!("{mantissa}e{sign}{digits:0>2}")
}

/// Bracket `items` according to `shape`. Rows of a matrix go on their own
/// lines, aligned under the opening bracket.
fn nest(items: &[String], shape: &[usize], separator: &str, indent: usize) -> String {
    match shape {
        [] => items.first().cloned().unwrap_or_default(),
        [_] => format!("[{}]", items.join(&format!("{separator} "))),
        [_, rest @ ..] => {
            let stride = rest.iter().product::<usize>().max(1);
            let row_separator = format!(
                "{separator}{}{}",
                "\n".repeat(rest.len()),
                " ".repeat(indent + 1)
            );
            let rows: Vec<String> = items
                .chunks(stride)
                .map(|row| nest(row, rest, separator, indent + 1))
                .collect();
            format!("[{}]", rows.join(&row_separator))
        }
    }
}

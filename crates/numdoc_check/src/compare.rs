//! Structural comparison of parsed literals under numeric tolerance.

use numdoc_ir::Config;

use crate::literal::{ArrayLiteral, Literal, Number};

/// Deepest container nesting compared structurally. Arrays count as leaves.
const MAX_NESTING: usize = 1;

/// Whether `got` equals `want` structurally.
///
/// Returns `false` when either side nests deeper than supported, so the
/// caller's strict fallback decides.
pub fn structurally_equal(want: &Literal, got: &Literal, config: &Config) -> bool {
    if nesting(want) > MAX_NESTING || nesting(got) > MAX_NESTING {
        tracing::trace!("literal nests too deeply for structural comparison");
        return false;
    }
    values_equal(want, got, config)
}

fn values_equal(want: &Literal, got: &Literal, config: &Config) -> bool {
    match (want, got) {
        (Literal::Number(w), Literal::Number(g)) => numbers_close(w, g, config),
        (Literal::List(w), Literal::List(g)) | (Literal::Tuple(w), Literal::Tuple(g)) => {
            w.len() == g.len() && w.iter().zip(g).all(|(w, g)| values_equal(w, g, config))
        }
        (Literal::Dict(w), Literal::Dict(g)) => {
            w.len() == g.len()
                && w.iter().all(|(key, value)| {
                    g.iter()
                        .find(|(other, _)| other == key)
                        .is_some_and(|(_, other)| values_equal(value, other, config))
                })
        }
        (Literal::Array(w), Literal::Array(g)) => arrays_equal(w, g, config),
        // Remaining leaves compare literally; differing variants never match.
        _ => want == got,
    }
}

/// `|want - got| <= atol + rtol * |want|`, with NaN equal to NaN and
/// infinities matched exactly.
pub fn numbers_close(want: &Number, got: &Number, config: &Config) -> bool {
    if config.strict_types && want.kind != got.kind {
        return false;
    }
    if want.value.is_nan() || got.value.is_nan() {
        return want.value.is_nan() && got.value.is_nan();
    }
    if want.value.is_infinite() || got.value.is_infinite() {
        return want.value == got.value;
    }
    (want.value - got.value).abs() <= config.tolerance_for(want.value)
}

fn arrays_equal(want: &ArrayLiteral, got: &ArrayLiteral, config: &Config) -> bool {
    if want.style != got.style {
        return false;
    }
    if config.strict_types && want.dtype != got.dtype {
        return false;
    }
    if let (Some(w), Some(g)) = (&want.declared_shape, &got.declared_shape) {
        if w != g {
            return false;
        }
    }
    if let (Some(w), Some(g)) = (&want.shape, &got.shape) {
        if w != g {
            return false;
        }
    }
    want.leaves.len() == got.leaves.len()
        && want
            .leaves
            .iter()
            .zip(&got.leaves)
            .all(|(w, g)| values_equal(w, g, config))
}

fn nesting(literal: &Literal) -> usize {
    match literal {
        Literal::List(items) | Literal::Tuple(items) => {
            1 + items.iter().map(element_nesting).max().unwrap_or(0)
        }
        Literal::Dict(entries) => {
            1 + entries
                .iter()
                .map(|(key, value)| element_nesting(key).max(element_nesting(value)))
                .max()
                .unwrap_or(0)
        }
        _ => 0,
    }
}

fn element_nesting(literal: &Literal) -> usize {
    match literal {
        Literal::Array(_) => 0,
        other => nesting(other),
    }
}

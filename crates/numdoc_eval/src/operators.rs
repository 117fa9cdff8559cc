//! Operator semantics for the evaluator.
//!
//! Dispatch is a direct match on operand variants. Arrays broadcast against
//! scalars, lists and each other following numpy's rules.

use std::cmp::Ordering;

use crate::ast::{BinaryOp, CompareOp, UnaryOp};
use crate::errors::{
    division_by_zero, float_division_by_zero, integer_overflow, modulo_by_zero, not_orderable,
    out_of_memory, shape_mismatch, type_error, unsupported_operands, value_error, EvalResult,
};
use crate::value::{checked_size, Array, DType, Value, MAX_SEQUENCE_LEN};

#[inline]
fn checked_arith(result: Option<i64>, op_name: &'static str) -> EvalResult<Value> {
    result.map(Value::Int).ok_or_else(|| integer_overflow(op_name))
}

/// Int, float or bool, but not a one-element array.
fn number(value: &Value) -> Option<f64> {
    match value {
        Value::Int(_) | Value::Float(_) | Value::Bool(_) => value.as_f64(),
        _ => None,
    }
}

// === Binary ===

/// Evaluate `left op right`.
pub(crate) fn evaluate_binary(left: &Value, right: &Value, op: BinaryOp) -> EvalResult<Value> {
    if matches!(left, Value::Array(_)) || matches!(right, Value::Array(_)) {
        return eval_array_binary(left, right, op);
    }
    if let (Some(a), Some(b)) = (left.as_int(), right.as_int()) {
        return eval_int_binary(a, b, op);
    }
    if let (Some(a), Some(b)) = (number(left), number(right)) {
        return eval_float_binary(a, b, op);
    }
    match (left, right, op) {
        (Value::Str(a), Value::Str(b), BinaryOp::Add) => {
            bounded_len(a.len(), b.len(), "str")?;
            Ok(Value::Str(format!("{a}{b}")))
        }
        (Value::List(a), Value::List(b), BinaryOp::Add) => {
            bounded_len(a.len(), b.len(), "list")?;
            Ok(Value::List(a.iter().chain(b).cloned().collect()))
        }
        (Value::Tuple(a), Value::Tuple(b), BinaryOp::Add) => {
            bounded_len(a.len(), b.len(), "tuple")?;
            Ok(Value::Tuple(a.iter().chain(b).cloned().collect()))
        }
        (Value::Str(_) | Value::List(_) | Value::Tuple(_), count, BinaryOp::Mul)
            if count.as_int().is_some() =>
        {
            repeat(left, count.as_int().unwrap_or(0))
        }
        (count, Value::Str(_) | Value::List(_) | Value::Tuple(_), BinaryOp::Mul)
            if count.as_int().is_some() =>
        {
            repeat(right, count.as_int().unwrap_or(0))
        }
        _ => Err(unsupported_operands(
            op.symbol(),
            left.type_name(),
            right.type_name(),
        )),
    }
}

/// Length of a concatenation, refused past [`MAX_SEQUENCE_LEN`].
fn bounded_len(left: usize, right: usize, what: &str) -> EvalResult<usize> {
    left.checked_add(right)
        .filter(|&len| len <= MAX_SEQUENCE_LEN)
        .ok_or_else(|| out_of_memory(what))
}

/// Length of `len` repeated `count` times, refused past [`MAX_SEQUENCE_LEN`].
fn repeated_len(len: usize, count: usize, what: &str) -> EvalResult<usize> {
    len.checked_mul(count)
        .filter(|&total| total <= MAX_SEQUENCE_LEN)
        .ok_or_else(|| out_of_memory(what))
}

fn repeat(sequence: &Value, count: i64) -> EvalResult<Value> {
    // Negative counts give an empty sequence.
    let count = usize::try_from(count).unwrap_or(0);
    Ok(match sequence {
        Value::Str(s) => {
            repeated_len(s.len(), count, "str")?;
            Value::Str(s.repeat(count))
        }
        Value::List(items) => Value::List(repeat_items(items, count, "list")?),
        Value::Tuple(items) => Value::Tuple(repeat_items(items, count, "tuple")?),
        other => return Err(type_error(format!("can't multiply sequence of type '{}'", other.type_name()))),
    })
}

fn repeat_items(items: &[Value], count: usize, what: &str) -> EvalResult<Vec<Value>> {
    let mut out = Vec::with_capacity(repeated_len(items.len(), count, what)?);
    if items.is_empty() {
        return Ok(out);
    }
    for _ in 0..count {
        out.extend_from_slice(items);
    }
    Ok(out)
}

#[expect(clippy::cast_precision_loss, reason = "true division promotes to float")]
fn eval_int_binary(a: i64, b: i64, op: BinaryOp) -> EvalResult<Value> {
    match op {
        BinaryOp::Add => checked_arith(a.checked_add(b), "addition"),
        BinaryOp::Sub => checked_arith(a.checked_sub(b), "subtraction"),
        BinaryOp::Mul => checked_arith(a.checked_mul(b), "multiplication"),
        BinaryOp::Div => {
            if b == 0 {
                Err(division_by_zero())
            } else {
                Ok(Value::Float(a as f64 / b as f64))
            }
        }
        BinaryOp::FloorDiv => {
            if b == 0 {
                return Err(modulo_by_zero());
            }
            let quotient = a.checked_div(b).ok_or_else(|| integer_overflow("floor division"))?;
            let adjust = a % b != 0 && ((a < 0) != (b < 0));
            Ok(Value::Int(if adjust { quotient - 1 } else { quotient }))
        }
        BinaryOp::Mod => {
            if b == 0 {
                return Err(modulo_by_zero());
            }
            let remainder = a.checked_rem(b).ok_or_else(|| integer_overflow("remainder"))?;
            let adjust = remainder != 0 && ((remainder < 0) != (b < 0));
            Ok(Value::Int(if adjust { remainder + b } else { remainder }))
        }
        BinaryOp::Pow => match u32::try_from(b) {
            Ok(exponent) => checked_arith(a.checked_pow(exponent), "exponentiation"),
            Err(_) if b < 0 => eval_float_binary(a as f64, b as f64, op),
            Err(_) => Err(integer_overflow("exponentiation")),
        },
        BinaryOp::MatMul => Err(unsupported_operands(op.symbol(), "int", "int")),
    }
}

fn eval_float_binary(a: f64, b: f64, op: BinaryOp) -> EvalResult<Value> {
    let result = match op {
        BinaryOp::Add => a + b,
        BinaryOp::Sub => a - b,
        BinaryOp::Mul => a * b,
        BinaryOp::Div => {
            if b == 0.0 {
                return Err(float_division_by_zero("division"));
            }
            a / b
        }
        BinaryOp::FloorDiv => {
            if b == 0.0 {
                return Err(float_division_by_zero("floor division"));
            }
            (a / b).floor()
        }
        BinaryOp::Mod => {
            if b == 0.0 {
                return Err(float_division_by_zero("modulo"));
            }
            python_mod(a, b)
        }
        BinaryOp::Pow => a.powf(b),
        BinaryOp::MatMul => {
            return Err(unsupported_operands(op.symbol(), "float", "float"));
        }
    };
    Ok(Value::Float(result))
}

/// Remainder taking the sign of the divisor.
fn python_mod(a: f64, b: f64) -> f64 {
    let remainder = a % b;
    if remainder != 0.0 && ((remainder < 0.0) != (b < 0.0)) {
        remainder + b
    } else {
        remainder
    }
}

// === Arrays ===

fn eval_array_binary(left: &Value, right: &Value, op: BinaryOp) -> EvalResult<Value> {
    let a = Array::from_value(left)?;
    let b = Array::from_value(right)?;
    let joined = a.dtype.join(b.dtype);
    if op == BinaryOp::Pow && joined == DType::Int && b.data.iter().any(|&e| e < 0.0) {
        return Err(value_error(
            "Integers to negative integer powers are not allowed.",
        ));
    }
    let dtype = if op == BinaryOp::Div { DType::Float } else { joined };
    let apply: fn(f64, f64) -> f64 = match op {
        BinaryOp::MatMul => return matmul(&a, &b),
        BinaryOp::Add => |x, y| x + y,
        BinaryOp::Sub => |x, y| x - y,
        BinaryOp::Mul => |x, y| x * y,
        BinaryOp::Div => |x, y| x / y,
        BinaryOp::FloorDiv => |x, y| (x / y).floor(),
        BinaryOp::Mod => |x, y| x - y * (x / y).floor(),
        BinaryOp::Pow => f64::powf,
    };
    let mut result = broadcast(&a, &b, dtype, apply)?;
    if dtype == DType::Int {
        // Integer division by zero yields zero.
        for value in &mut result.data {
            if !value.is_finite() {
                *value = 0.0;
            }
        }
    }
    Ok(Value::Array(result))
}

/// Combine two arrays elementwise after broadcasting their shapes.
pub(crate) fn broadcast(
    a: &Array,
    b: &Array,
    dtype: DType,
    apply: impl Fn(f64, f64) -> f64,
) -> EvalResult<Array> {
    let ndim = a.ndim().max(b.ndim());
    let pad = |shape: &[usize]| {
        let mut padded = vec![1; ndim - shape.len()];
        padded.extend_from_slice(shape);
        padded
    };
    let (shape_a, shape_b) = (pad(&a.shape), pad(&b.shape));
    let mut shape = Vec::with_capacity(ndim);
    for (&x, &y) in shape_a.iter().zip(&shape_b) {
        if x == y || y == 1 {
            shape.push(x);
        } else if x == 1 {
            shape.push(y);
        } else {
            return Err(shape_mismatch(&a.shape, &b.shape));
        }
    }
    let strides_a = broadcast_strides(&shape_a, &shape);
    let strides_b = broadcast_strides(&shape_b, &shape);
    let size = checked_size(&shape)?;
    let data = (0..size)
        .map(|flat| {
            let mut rest = flat;
            let (mut ia, mut ib) = (0, 0);
            for axis in (0..ndim).rev() {
                let i = rest % shape[axis];
                rest /= shape[axis];
                ia += i * strides_a[axis];
                ib += i * strides_b[axis];
            }
            apply(a.data[ia], b.data[ib])
        })
        .collect();
    Ok(Array { data, shape, dtype })
}

/// Row-major strides of `shape`, zero along broadcast axes.
fn broadcast_strides(shape: &[usize], out: &[usize]) -> Vec<usize> {
    let mut strides = vec![0; shape.len()];
    let mut step = 1;
    for axis in (0..shape.len()).rev() {
        strides[axis] = if shape[axis] == 1 && out[axis] != 1 { 0 } else { step };
        step *= shape[axis];
    }
    strides
}

fn matmul(a: &Array, b: &Array) -> EvalResult<Value> {
    if a.ndim() == 0 || b.ndim() == 0 {
        return Err(value_error(
            "matmul: Input operand does not have enough dimensions",
        ));
    }
    if a.ndim() > 2 || b.ndim() > 2 {
        return Err(value_error(
            "matmul of arrays with more than two dimensions is not supported",
        ));
    }
    let (rows, inner) = if a.ndim() == 1 { (1, a.shape[0]) } else { (a.shape[0], a.shape[1]) };
    let (b_rows, cols) = if b.ndim() == 1 { (b.shape[0], 1) } else { (b.shape[0], b.shape[1]) };
    if inner != b_rows {
        return Err(value_error(format!(
            "matmul: Input operand 1 has a mismatch in its core dimension 0, with gufunc signature (n?,k),(k,m?)->(n?,m?) (size {b_rows} is different from {inner})"
        )));
    }
    let mut data = vec![0.0; checked_size(&[rows, cols])?];
    for r in 0..rows {
        for c in 0..cols {
            data[r * cols + c] = (0..inner)
                .map(|k| a.data[r * inner + k] * b.data[k * cols + c])
                .sum();
        }
    }
    let mut shape = Vec::new();
    if a.ndim() == 2 {
        shape.push(rows);
    }
    if b.ndim() == 2 {
        shape.push(cols);
    }
    let result = Array {
        data,
        shape,
        dtype: a.dtype.join(b.dtype),
    };
    if result.shape.is_empty() {
        return Ok(result.element(0));
    }
    Ok(Value::Array(result))
}

// === Unary ===

pub(crate) fn evaluate_unary(operand: &Value, op: UnaryOp) -> EvalResult<Value> {
    match (op, operand) {
        (UnaryOp::Not, value) => Ok(Value::Bool(!value.is_truthy()?)),
        (UnaryOp::Neg, Value::Int(v)) => v
            .checked_neg()
            .map(Value::Int)
            .ok_or_else(|| integer_overflow("negation")),
        (UnaryOp::Neg, Value::Bool(b)) => Ok(Value::Int(-i64::from(*b))),
        (UnaryOp::Neg, Value::Float(v)) => Ok(Value::Float(-v)),
        (UnaryOp::Neg, Value::Array(array)) => {
            let dtype = array.dtype.join(DType::Int);
            Ok(Value::Array(array.map(dtype, |v| -v)))
        }
        (UnaryOp::Pos, Value::Bool(b)) => Ok(Value::Int(i64::from(*b))),
        (UnaryOp::Pos, Value::Int(_) | Value::Float(_) | Value::Array(_)) => Ok(operand.clone()),
        (UnaryOp::Neg | UnaryOp::Pos, other) => Err(type_error(format!(
            "bad operand type for unary {}: '{}'",
            if op == UnaryOp::Neg { "-" } else { "+" },
            other.type_name()
        ))),
    }
}

// === Comparison ===

fn compare_symbol(op: CompareOp) -> &'static str {
    match op {
        CompareOp::Eq => "==",
        CompareOp::NotEq => "!=",
        CompareOp::Lt => "<",
        CompareOp::LtEq => "<=",
        CompareOp::Gt => ">",
        CompareOp::GtEq => ">=",
        CompareOp::In => "in",
        CompareOp::NotIn => "not in",
        CompareOp::Is => "is",
        CompareOp::IsNot => "is not",
    }
}

pub(crate) fn evaluate_compare(left: &Value, right: &Value, op: CompareOp) -> EvalResult<Value> {
    match op {
        CompareOp::In => return Ok(Value::Bool(contains(right, left)?)),
        CompareOp::NotIn => return Ok(Value::Bool(!contains(right, left)?)),
        CompareOp::Is => return Ok(Value::Bool(identical(left, right))),
        CompareOp::IsNot => return Ok(Value::Bool(!identical(left, right))),
        _ => {}
    }
    if matches!(left, Value::Array(_)) || matches!(right, Value::Array(_)) {
        return compare_arrays(left, right, op);
    }
    let result = match op {
        CompareOp::Eq => left.equals(right),
        CompareOp::NotEq => !left.equals(right),
        _ => match ordering(left, right, op)? {
            Some(ordering) => match op {
                CompareOp::Lt => ordering == Ordering::Less,
                CompareOp::LtEq => ordering != Ordering::Greater,
                CompareOp::Gt => ordering == Ordering::Greater,
                _ => ordering != Ordering::Less,
            },
            // NaN compares false against everything.
            None => false,
        },
    };
    Ok(Value::Bool(result))
}

/// Order used by `sorted`, `min` and `max`. Unordered pairs (NaN) tie.
pub(crate) fn sort_order(left: &Value, right: &Value) -> EvalResult<Ordering> {
    Ok(ordering(left, right, CompareOp::Lt)?.unwrap_or(Ordering::Equal))
}

fn ordering(left: &Value, right: &Value, op: CompareOp) -> EvalResult<Option<Ordering>> {
    if let (Some(a), Some(b)) = (left.as_int(), right.as_int()) {
        return Ok(Some(a.cmp(&b)));
    }
    if let (Some(a), Some(b)) = (number(left), number(right)) {
        return Ok(a.partial_cmp(&b));
    }
    match (left, right) {
        (Value::Str(a), Value::Str(b)) => Ok(Some(a.cmp(b))),
        (Value::List(a), Value::List(b)) | (Value::Tuple(a), Value::Tuple(b)) => {
            for (x, y) in a.iter().zip(b) {
                if !x.equals(y) {
                    return ordering(x, y, op);
                }
            }
            Ok(Some(a.len().cmp(&b.len())))
        }
        _ => Err(not_orderable(
            compare_symbol(op),
            left.type_name(),
            right.type_name(),
        )),
    }
}

fn compare_arrays(left: &Value, right: &Value, op: CompareOp) -> EvalResult<Value> {
    let a = Array::from_value(left)?;
    let b = Array::from_value(right)?;
    let test: fn(f64, f64) -> bool = match op {
        CompareOp::Eq => |x, y| x == y,
        CompareOp::NotEq => |x, y| x != y,
        CompareOp::Lt => |x, y| x < y,
        CompareOp::LtEq => |x, y| x <= y,
        CompareOp::Gt => |x, y| x > y,
        _ => |x, y| x >= y,
    };
    let result = broadcast(&a, &b, DType::Bool, |x, y| f64::from(u8::from(test(x, y))))?;
    Ok(Value::Array(result))
}

fn contains(container: &Value, item: &Value) -> EvalResult<bool> {
    match container {
        Value::List(items) | Value::Tuple(items) => Ok(items.iter().any(|x| x.equals(item))),
        Value::Dict(entries) => Ok(entries.iter().any(|(k, _)| k.equals(item))),
        Value::Str(text) => match item {
            Value::Str(needle) => Ok(text.contains(needle.as_str())),
            other => Err(type_error(format!(
                "'in <string>' requires string as left operand, not {}",
                other.type_name()
            ))),
        },
        Value::Array(array) => Ok(number(item)
            .is_some_and(|needle| array.data.iter().any(|&v| v == needle))),
        other => Err(type_error(format!(
            "argument of type '{}' is not iterable",
            other.type_name()
        ))),
    }
}

/// Object identity, approximated for values without addresses.
fn identical(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::None, Value::None) => true,
        (Value::Bool(a), Value::Bool(b)) => a == b,
        (Value::Int(a), Value::Int(b)) => a == b,
        (Value::Module(a), Value::Module(b))
        | (Value::ExceptionType(a), Value::ExceptionType(b)) => a == b,
        (Value::Builtin(a), Value::Builtin(b)) => a == b,
        (Value::Function(a), Value::Function(b)) => std::sync::Arc::ptr_eq(a, b),
        _ => false,
    }
}

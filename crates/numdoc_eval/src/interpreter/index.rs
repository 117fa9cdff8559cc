//! Subscripting: `x[i]`, `x[a:b:c]`, `m[i, j]`, boolean masks.

use crate::errors::{index_out_of_range, key_not_found, raised, type_error, value_error, EvalResult};
use crate::value::{Array, DType, Value};

/// An evaluated subscript.
#[derive(Clone, Debug)]
pub(super) enum Subscript {
    Item(Value),
    Slice(Option<i64>, Option<i64>, Option<i64>),
    Multi(Vec<Subscript>),
}

impl Subscript {
    /// The subscript as a plain value, for dict keys.
    fn into_key(self) -> EvalResult<Value> {
        match self {
            Subscript::Item(value) => Ok(value),
            Subscript::Multi(items) => Ok(Value::Tuple(
                items
                    .into_iter()
                    .map(Subscript::into_key)
                    .collect::<EvalResult<_>>()?,
            )),
            Subscript::Slice(..) => Err(type_error("unhashable type: 'slice'")),
        }
    }
}

fn len_i64(len: usize) -> i64 {
    i64::try_from(len).unwrap_or(i64::MAX)
}

fn to_usize(i: i64) -> usize {
    usize::try_from(i).unwrap_or(0)
}

/// Resolve a possibly negative index against `len`.
fn resolve(index: i64, len: usize) -> Option<usize> {
    let resolved = if index < 0 { index + len_i64(len) } else { index };
    usize::try_from(resolved).ok().filter(|&i| i < len)
}

/// Positions selected by a slice over a sequence of `len`.
pub(super) fn slice_positions(
    len: usize,
    start: Option<i64>,
    stop: Option<i64>,
    step: Option<i64>,
) -> EvalResult<Vec<usize>> {
    let step = step.unwrap_or(1);
    if step == 0 {
        return Err(value_error("slice step cannot be zero"));
    }
    let n = len_i64(len);
    let norm = |v: i64| if v < 0 { v + n } else { v };
    let mut positions = Vec::new();
    if step > 0 {
        let mut i = start.map_or(0, |v| norm(v).clamp(0, n));
        let end = stop.map_or(n, |v| norm(v).clamp(0, n));
        while i < end {
            positions.push(to_usize(i));
            i += step;
        }
    } else {
        let mut i = start.map_or(n - 1, |v| norm(v).clamp(-1, n - 1));
        let end = stop.map_or(-1, |v| norm(v).clamp(-1, n - 1));
        while i > end {
            positions.push(to_usize(i));
            i += step;
        }
    }
    Ok(positions)
}

fn int_index(value: &Value, what: &str) -> EvalResult<i64> {
    value.as_int().ok_or_else(|| {
        type_error(format!(
            "{what} indices must be integers or slices, not {}",
            value.type_name()
        ))
    })
}

/// `container[subscript]`
pub(super) fn get_item(container: &Value, subscript: Subscript) -> EvalResult<Value> {
    match container {
        Value::List(items) | Value::Tuple(items) => {
            let what = if matches!(container, Value::List(_)) { "list" } else { "tuple" };
            match subscript {
                Subscript::Item(index) => {
                    let index = int_index(&index, what)?;
                    resolve(index, items.len())
                        .map(|i| items[i].clone())
                        .ok_or_else(|| index_out_of_range(what))
                }
                Subscript::Slice(start, stop, step) => {
                    let picked = slice_positions(items.len(), start, stop, step)?
                        .into_iter()
                        .map(|i| items[i].clone())
                        .collect();
                    Ok(if what == "list" {
                        Value::List(picked)
                    } else {
                        Value::Tuple(picked)
                    })
                }
                Subscript::Multi(_) => Err(type_error(format!(
                    "{what} indices must be integers or slices, not tuple"
                ))),
            }
        }
        Value::Str(text) => {
            let chars: Vec<char> = text.chars().collect();
            match subscript {
                Subscript::Item(index) => {
                    let index = int_index(&index, "string")?;
                    resolve(index, chars.len())
                        .map(|i| Value::Str(chars[i].to_string()))
                        .ok_or_else(|| index_out_of_range("string"))
                }
                Subscript::Slice(start, stop, step) => Ok(Value::Str(
                    slice_positions(chars.len(), start, stop, step)?
                        .into_iter()
                        .map(|i| chars[i])
                        .collect(),
                )),
                Subscript::Multi(_) => Err(type_error("string indices must be integers")),
            }
        }
        Value::Dict(entries) => {
            let key = subscript.into_key()?;
            entries
                .iter()
                .find(|(k, _)| k.equals(&key))
                .map(|(_, v)| v.clone())
                .ok_or_else(|| key_not_found(&key.repr()))
        }
        Value::Array(array) => {
            let (positions, shape) = select(array, subscript)?;
            let data: Vec<f64> = positions.iter().map(|&p| array.data[p]).collect();
            let picked = Array {
                data,
                shape,
                dtype: array.dtype,
            };
            Ok(if picked.shape.is_empty() {
                picked.element(0)
            } else {
                Value::Array(picked)
            })
        }
        other => Err(type_error(format!(
            "'{}' object is not subscriptable",
            other.type_name()
        ))),
    }
}

/// `container[subscript] = value`, in place.
pub(super) fn set_item(container: &mut Value, subscript: Subscript, value: Value) -> EvalResult<()> {
    match container {
        Value::List(items) => match subscript {
            Subscript::Item(index) => {
                let index = int_index(&index, "list")?;
                let slot = resolve(index, items.len())
                    .ok_or_else(|| raised("IndexError", "list assignment index out of range"))?;
                items[slot] = value;
                Ok(())
            }
            _ => Err(type_error("list indices must be integers")),
        },
        Value::Dict(entries) => {
            let key = subscript.into_key()?;
            let slot = entries.iter().position(|(k, _)| k.equals(&key));
            match slot {
                Some(slot) => entries[slot].1 = value,
                None => entries.push((key, value)),
            }
            Ok(())
        }
        Value::Array(array) => {
            let (positions, _) = select(array, subscript)?;
            let source = Array::from_value(&value)?;
            if source.size() == 1 {
                for p in positions {
                    array.data[p] = source.data[0];
                }
            } else if source.size() == positions.len() {
                for (p, v) in positions.into_iter().zip(source.data) {
                    array.data[p] = v;
                }
            } else {
                return Err(value_error(format!(
                    "could not broadcast input array of size {} into {} positions",
                    source.size(),
                    positions.len()
                )));
            }
            if array.dtype == DType::Int {
                for v in &mut array.data {
                    *v = v.trunc();
                }
            }
            Ok(())
        }
        other => Err(type_error(format!(
            "'{}' object does not support item assignment",
            other.type_name()
        ))),
    }
}

/// `del container[subscript]`
pub(super) fn delete_item(container: &mut Value, subscript: Subscript) -> EvalResult<()> {
    match container {
        Value::List(items) => {
            let Subscript::Item(index) = subscript else {
                return Err(type_error("list indices must be integers"));
            };
            let slot = resolve(int_index(&index, "list")?, items.len())
                .ok_or_else(|| raised("IndexError", "list assignment index out of range"))?;
            items.remove(slot);
            Ok(())
        }
        Value::Dict(entries) => {
            let key = subscript.into_key()?;
            let slot = entries
                .iter()
                .position(|(k, _)| k.equals(&key))
                .ok_or_else(|| key_not_found(&key.repr()))?;
            entries.remove(slot);
            Ok(())
        }
        other => Err(type_error(format!(
            "'{}' object doesn't support item deletion",
            other.type_name()
        ))),
    }
}

/// Flat positions and result shape selected from `array`.
fn select(array: &Array, subscript: Subscript) -> EvalResult<(Vec<usize>, Vec<usize>)> {
    // A boolean mask of the array's own shape picks elements directly.
    if let Subscript::Item(Value::Array(mask)) = &subscript {
        if mask.dtype == DType::Bool {
            if mask.shape != array.shape {
                return Err(raised(
                    "IndexError",
                    "boolean index did not match indexed array",
                ));
            }
            let positions: Vec<usize> = mask
                .data
                .iter()
                .enumerate()
                .filter(|(_, m)| **m != 0.0)
                .map(|(i, _)| i)
                .collect();
            let count = positions.len();
            return Ok((positions, vec![count]));
        }
    }
    let subscripts = match subscript {
        Subscript::Multi(items) => items,
        single => vec![single],
    };
    if subscripts.len() > array.ndim() {
        return Err(raised(
            "IndexError",
            format!(
                "too many indices for array: array is {}-dimensional, but {} were indexed",
                array.ndim(),
                subscripts.len()
            ),
        ));
    }
    let mut axes: Vec<(Vec<usize>, bool)> = Vec::with_capacity(array.ndim());
    let mut subscripts = subscripts.into_iter();
    for (axis, &size) in array.shape.iter().enumerate() {
        let picked = match subscripts.next() {
            None => ((0..size).collect(), true),
            Some(Subscript::Slice(start, stop, step)) => {
                (slice_positions(size, start, stop, step)?, true)
            }
            Some(Subscript::Item(value @ (Value::List(_) | Value::Array(_)))) => {
                let indices = fancy_indices(&value, axis, size)?;
                (indices, true)
            }
            Some(Subscript::Item(value)) => {
                let index = int_index(&value, "array")?;
                let resolved = resolve(index, size).ok_or_else(|| {
                    raised(
                        "IndexError",
                        format!("index {index} is out of bounds for axis {axis} with size {size}"),
                    )
                })?;
                (vec![resolved], false)
            }
            Some(Subscript::Multi(_)) => {
                return Err(raised("IndexError", "only integers, slices and integer arrays are valid indices"))
            }
        };
        axes.push(picked);
    }
    let mut strides = vec![1; array.ndim()];
    for axis in (0..array.ndim().saturating_sub(1)).rev() {
        strides[axis] = strides[axis + 1] * array.shape[axis + 1];
    }
    let mut positions = vec![0usize];
    for ((indices, _), &stride) in axes.iter().zip(&strides) {
        positions = positions
            .iter()
            .flat_map(|&base| indices.iter().map(move |&i| base + i * stride))
            .collect();
    }
    let shape = axes
        .iter()
        .filter(|(_, kept)| *kept)
        .map(|(indices, _)| indices.len())
        .collect();
    Ok((positions, shape))
}

fn fancy_indices(value: &Value, axis: usize, size: usize) -> EvalResult<Vec<usize>> {
    let items = match value {
        Value::Array(array) => (0..array.size()).map(|i| array.element(i)).collect(),
        other => other.iterate()?,
    };
    items
        .iter()
        .map(|item| {
            let index = int_index(item, "array")?;
            resolve(index, size).ok_or_else(|| {
                raised(
                    "IndexError",
                    format!("index {index} is out of bounds for axis {axis} with size {size}"),
                )
            })
        })
        .collect()
}

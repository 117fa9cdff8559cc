//! Runtime values.
//!
//! The printed forms follow the conventions documentation transcripts are
//! written in: Python-style reprs for scalars and containers, and numpy-style
//! reprs for arrays (see [`format`]).

mod format;

use std::fmt;
use std::sync::Arc;

use crate::ast::FunctionDef;
use crate::builtins::Builtin;
use crate::errors::{out_of_memory, type_error, value_error, EvalResult};

pub use format::float_repr;

/// Sequences and arrays longer than this are refused rather than built.
pub(crate) const MAX_SEQUENCE_LEN: usize = 10_000_000;

/// Most dimensions an array may have.
pub const MAX_NDIM: usize = 32;

/// Deepest container nesting a bound value may have. Printing, comparing,
/// cloning and dropping recurse once per level.
pub const MAX_NESTING: usize = 200;

/// Element type of an [`Array`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DType {
    Bool,
    Int,
    Float,
}

impl DType {
    pub fn name(self) -> &'static str {
        match self {
            DType::Bool => "bool",
            DType::Int => "int64",
            DType::Float => "float64",
        }
    }

    /// The wider of two element types. Arithmetic never yields `Bool`.
    #[must_use]
    pub fn join(self, other: DType) -> DType {
        if self == DType::Float || other == DType::Float {
            DType::Float
        } else {
            DType::Int
        }
    }
}

/// A dense n-dimensional numeric array, stored row-major.
#[derive(Clone, Debug, PartialEq)]
pub struct Array {
    pub data: Vec<f64>,
    pub shape: Vec<usize>,
    pub dtype: DType,
}

impl Array {
    pub fn vector(data: Vec<f64>, dtype: DType) -> Array {
        let shape = vec![data.len()];
        Array { data, shape, dtype }
    }

    pub fn scalar(value: f64, dtype: DType) -> Array {
        Array {
            data: vec![value],
            shape: Vec::new(),
            dtype,
        }
    }

    /// Build an array from (possibly nested) lists or tuples of numbers.
    pub fn from_value(value: &Value) -> EvalResult<Array> {
        if let Value::Array(array) = value {
            return Ok(array.clone());
        }
        let mut data = Vec::new();
        let mut dtype = DType::Int;
        let shape = collect_nested(value, &mut data, &mut dtype)?;
        checked_size(&shape)?;
        Ok(Array { data, shape, dtype })
    }

    pub fn size(&self) -> usize {
        self.data.len()
    }

    pub fn ndim(&self) -> usize {
        self.shape.len()
    }

    /// The element at flat position `index` as a scalar value.
    pub fn element(&self, index: usize) -> Value {
        scalar_value(self.data[index], self.dtype)
    }

    /// Apply `f` to every element.
    #[must_use]
    pub fn map(&self, dtype: DType, f: impl Fn(f64) -> f64) -> Array {
        Array {
            data: self.data.iter().map(|&v| f(v)).collect(),
            shape: self.shape.clone(),
            dtype,
        }
    }

    /// Sub-array `index` along the first axis.
    pub fn row(&self, index: usize) -> Value {
        let stride: usize = self.shape[1..].iter().product();
        let start = index * stride;
        let data = self.data[start..start + stride].to_vec();
        if self.shape.len() == 1 {
            scalar_value(data[0], self.dtype)
        } else {
            Value::Array(Array {
                data,
                shape: self.shape[1..].to_vec(),
                dtype: self.dtype,
            })
        }
    }

    pub fn reshape(&self, shape: Vec<usize>) -> EvalResult<Array> {
        let size = checked_size(&shape)?;
        if size != self.size() {
            return Err(value_error(format!(
                "cannot reshape array of size {} into shape {}",
                self.size(),
                format::shape_repr(&shape)
            )));
        }
        Ok(Array {
            data: self.data.clone(),
            shape,
            dtype: self.dtype,
        })
    }

    #[must_use]
    pub fn transpose(&self) -> Array {
        if self.shape.len() != 2 {
            return self.clone();
        }
        let (rows, cols) = (self.shape[0], self.shape[1]);
        let mut data = Vec::with_capacity(self.size());
        for c in 0..cols {
            for r in 0..rows {
                data.push(self.data[r * cols + c]);
            }
        }
        Array {
            data,
            shape: vec![cols, rows],
            dtype: self.dtype,
        }
    }

    /// Nested lists, as `tolist()` returns.
    pub fn to_list(&self) -> Value {
        if self.shape.is_empty() {
            return self.element(0);
        }
        Value::List((0..self.shape[0]).map(|i| match self.row(i) {
            Value::Array(inner) => inner.to_list(),
            scalar => scalar,
        }).collect())
    }
}

#[expect(
    clippy::cast_possible_truncation,
    reason = "integer arrays only hold integral values"
)]
fn scalar_value(value: f64, dtype: DType) -> Value {
    match dtype {
        DType::Bool => Value::Bool(value != 0.0),
        DType::Int => Value::Int(value as i64),
        DType::Float => Value::Float(value),
    }
}

#[expect(clippy::cast_precision_loss, reason = "array elements are f64")]
/// Element count of `shape`, refused past [`MAX_NDIM`] dimensions or
/// [`MAX_SEQUENCE_LEN`] elements.
pub(crate) fn checked_size(shape: &[usize]) -> EvalResult<usize> {
    if shape.len() > MAX_NDIM {
        return Err(value_error(format!(
            "maximum supported dimension for an ndarray is {MAX_NDIM}, found {}",
            shape.len()
        )));
    }
    shape
        .iter()
        .try_fold(1usize, |size, &dim| size.checked_mul(dim))
        .filter(|&size| size <= MAX_SEQUENCE_LEN)
        .ok_or_else(|| out_of_memory("array"))
}

fn collect_nested(value: &Value, data: &mut Vec<f64>, dtype: &mut DType) -> EvalResult<Vec<usize>> {
    match value {
        Value::Int(v) => {
            data.push(*v as f64);
            Ok(Vec::new())
        }
        Value::Bool(b) => {
            data.push(f64::from(u8::from(*b)));
            Ok(Vec::new())
        }
        Value::Float(v) => {
            *dtype = DType::Float;
            data.push(*v);
            Ok(Vec::new())
        }
        Value::Array(array) => {
            *dtype = dtype.join(array.dtype);
            data.extend_from_slice(&array.data);
            Ok(array.shape.clone())
        }
        Value::List(items) | Value::Tuple(items) => {
            let mut inner: Option<Vec<usize>> = None;
            for item in items {
                let shape = collect_nested(item, data, dtype)?;
                match &inner {
                    Some(existing) if *existing != shape => {
                        return Err(value_error(
                            "setting an array element with a sequence. The requested array has an inhomogeneous shape",
                        ));
                    }
                    Some(_) => {}
                    None => inner = Some(shape),
                }
            }
            let mut shape = vec![items.len()];
            shape.extend(inner.unwrap_or_default());
            Ok(shape)
        }
        other => Err(type_error(format!(
            "could not convert '{}' to a numeric array",
            other.type_name()
        ))),
    }
}

/// A user-defined function with its evaluated defaults.
#[derive(Debug)]
pub struct Function {
    pub(crate) def: Arc<FunctionDef>,
    pub(crate) defaults: Vec<Option<Value>>,
}

impl Function {
    pub fn name(&self) -> &str {
        &self.def.name
    }
}

#[derive(Clone, Debug)]
pub enum Value {
    None,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    List(Vec<Value>),
    Tuple(Vec<Value>),
    Dict(Vec<(Value, Value)>),
    Array(Array),
    Function(Arc<Function>),
    Builtin(Builtin),
    /// A method looked up on a value, e.g. `arr.sum`.
    Method(Box<Value>, String),
    Module(String),
    ExceptionType(String),
    Exception { kind: String, message: String },
}

impl Value {
    pub fn type_name(&self) -> &str {
        match self {
            Value::None => "NoneType",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Str(_) => "str",
            Value::List(_) => "list",
            Value::Tuple(_) => "tuple",
            Value::Dict(_) => "dict",
            Value::Array(_) => "numpy.ndarray",
            Value::Function(_) => "function",
            Value::Builtin(_) | Value::Method(..) => "builtin_function_or_method",
            Value::Module(_) => "module",
            Value::ExceptionType(_) => "type",
            Value::Exception { kind, .. } => kind,
        }
    }

    pub fn is_none(&self) -> bool {
        matches!(self, Value::None)
    }

    /// Truth value as `if` sees it.
    pub fn is_truthy(&self) -> EvalResult<bool> {
        Ok(match self {
            Value::None => false,
            Value::Bool(b) => *b,
            Value::Int(v) => *v != 0,
            Value::Float(v) => *v != 0.0,
            Value::Str(s) => !s.is_empty(),
            Value::List(items) | Value::Tuple(items) => !items.is_empty(),
            Value::Dict(entries) => !entries.is_empty(),
            Value::Array(array) => match array.data.as_slice() {
                [single] => *single != 0.0,
                _ => {
                    return Err(value_error(
                        "The truth value of an array with more than one element is ambiguous. Use a.any() or a.all()",
                    ))
                }
            },
            _ => true,
        })
    }

    /// Numeric view of a scalar, if it is one.
    #[expect(clippy::cast_precision_loss, reason = "mixed arithmetic promotes to float")]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(v) => Some(*v as f64),
            Value::Float(v) => Some(*v),
            Value::Bool(b) => Some(f64::from(u8::from(*b))),
            Value::Array(array) if array.size() == 1 => array.data.first().copied(),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(v) => Some(*v),
            Value::Bool(b) => Some(i64::from(*b)),
            _ => None,
        }
    }

    /// Elements of an iterable value.
    pub fn iterate(&self) -> EvalResult<Vec<Value>> {
        match self {
            Value::List(items) | Value::Tuple(items) => Ok(items.clone()),
            Value::Str(s) => Ok(s.chars().map(|c| Value::Str(c.to_string())).collect()),
            Value::Dict(entries) => Ok(entries.iter().map(|(k, _)| k.clone()).collect()),
            Value::Array(array) if !array.shape.is_empty() => {
                Ok((0..array.shape[0]).map(|i| array.row(i)).collect())
            }
            other => Err(type_error(format!(
                "'{}' object is not iterable",
                other.type_name()
            ))),
        }
    }

    /// Whether containers nest more than `limit` levels deep. Scalars have
    /// depth zero; `[]` and `[1]` have depth one.
    pub fn nests_deeper_than(&self, limit: usize) -> bool {
        match self {
            Value::List(items) | Value::Tuple(items) => {
                limit == 0 || items.iter().any(|item| item.nests_deeper_than(limit - 1))
            }
            Value::Dict(entries) => {
                limit == 0
                    || entries.iter().any(|(key, value)| {
                        key.nests_deeper_than(limit - 1) || value.nests_deeper_than(limit - 1)
                    })
            }
            Value::Method(receiver, _) => limit == 0 || receiver.nests_deeper_than(limit - 1),
            _ => false,
        }
    }

    /// Structural equality, as `==` on scalars and containers.
    pub fn equals(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::None, Value::None) => true,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::List(a), Value::List(b)) | (Value::Tuple(a), Value::Tuple(b)) => {
                a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.equals(y))
            }
            (Value::Dict(a), Value::Dict(b)) => {
                a.len() == b.len()
                    && a.iter().all(|(k, v)| {
                        b.iter()
                            .find(|(other, _)| other.equals(k))
                            .is_some_and(|(_, w)| w.equals(v))
                    })
            }
            (Value::Array(a), Value::Array(b)) => a.shape == b.shape && a.data == b.data,
            (Value::Module(a), Value::Module(b)) | (Value::ExceptionType(a), Value::ExceptionType(b)) => a == b,
            (Value::Builtin(a), Value::Builtin(b)) => a == b,
            (Value::Function(a), Value::Function(b)) => Arc::ptr_eq(a, b),
            (Value::Int(a), Value::Int(b)) => a == b,
            _ => match (self.scalar_number(), other.scalar_number()) {
                (Some(a), Some(b)) => a == b,
                _ => false,
            },
        }
    }

    fn scalar_number(&self) -> Option<f64> {
        match self {
            Value::Int(_) | Value::Float(_) | Value::Bool(_) => self.as_f64(),
            _ => None,
        }
    }

    /// The form `repr()` and the interactive echo print.
    pub fn repr(&self) -> String {
        match self {
            Value::None => "None".to_string(),
            Value::Bool(true) => "True".to_string(),
            Value::Bool(false) => "False".to_string(),
            Value::Int(v) => v.to_string(),
            Value::Float(v) => float_repr(*v),
            Value::Str(s) => format::str_repr(s),
            Value::List(items) => format!("[{}]", join_reprs(items)),
            Value::Tuple(items) if items.len() == 1 => format!("({},)", items[0].repr()),
            Value::Tuple(items) => format!("({})", join_reprs(items)),
            Value::Dict(entries) => {
                let parts: Vec<String> = entries
                    .iter()
                    .map(|(k, v)| format!("{}: {}", k.repr(), v.repr()))
                    .collect();
                format!("{{{}}}", parts.join(", "))
            }
            Value::Array(array) => format::array_repr(array),
            Value::Function(function) => format!(
                "<function {} at {:#x}>",
                function.name(),
                Arc::as_ptr(function).cast::<()>() as usize
            ),
            Value::Builtin(builtin) => format!("<built-in function {}>", builtin.name()),
            Value::Method(receiver, name) => format!(
                "<built-in method {name} of {} object>",
                receiver.type_name()
            ),
            Value::Module(name) => format!("<module '{name}'>"),
            Value::ExceptionType(kind) => format!("<class '{kind}'>"),
            Value::Exception { kind, message } => format!("{kind}({})", format::str_repr(message)),
        }
    }

    /// The form `print()` and `str()` produce.
    pub fn to_str(&self) -> String {
        match self {
            Value::Str(s) => s.clone(),
            Value::Array(array) => format::array_str(array),
            Value::Exception { message, .. } => message.clone(),
            other => other.repr(),
        }
    }
}

fn join_reprs(items: &[Value]) -> String {
    items.iter().map(Value::repr).collect::<Vec<_>>().join(", ")
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_str())
    }
}

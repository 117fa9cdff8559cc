//! Built-in functions, module attributes and methods.
//!
//! Importable modules: `math`, `random`, `numpy` (with its `numpy.random`
//! submodule) and `matplotlib.pyplot`. Their attributes resolve to the same
//! [`Builtin`] set the global builtins use. Plotting draws nothing: every
//! `pyplot` function accepts any arguments and returns `None`.

use std::cmp::Ordering;
use std::path::{Component, Path};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::ast::BinaryOp;
use crate::errors::{
    file_not_found, index_out_of_range, integer_overflow, no_attribute, out_of_memory,
    permission_denied, raised, type_error, value_error, wrong_arg_count, EvalResult,
};
use crate::operators::{broadcast, evaluate_binary, sort_order};
use crate::print_handler::BufferPrintHandler;
use crate::value::{checked_size, Array, DType, Value, MAX_SEQUENCE_LEN};

/// What a builtin may touch while running.
pub(crate) struct CallContext<'a> {
    pub output: &'a BufferPrintHandler,
    pub rng: &'a mut StdRng,
    pub workdir: &'a Path,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Builtin {
    Print,
    Len,
    Sum,
    Abs,
    Round,
    Min,
    Max,
    Range,
    Sorted,
    Repr,
    Str,
    Int,
    Float,
    Bool,
    List,
    Tuple,
    Enumerate,
    Zip,
    Any,
    All,
    Array,
    Zeros,
    Ones,
    Arange,
    Linspace,
    Sqrt,
    Exp,
    Log,
    Sin,
    Cos,
    Floor,
    Ceil,
    Mean,
    Dot,
    Allclose,
    Random,
    Rand,
    Seed,
    ReadText,
    /// Any `matplotlib.pyplot` function.
    Plot,
}

impl Builtin {
    pub fn name(self) -> &'static str {
        match self {
            Builtin::Print => "print",
            Builtin::Len => "len",
            Builtin::Sum => "sum",
            Builtin::Abs => "abs",
            Builtin::Round => "round",
            Builtin::Min => "min",
            Builtin::Max => "max",
            Builtin::Range => "range",
            Builtin::Sorted => "sorted",
            Builtin::Repr => "repr",
            Builtin::Str => "str",
            Builtin::Int => "int",
            Builtin::Float => "float",
            Builtin::Bool => "bool",
            Builtin::List => "list",
            Builtin::Tuple => "tuple",
            Builtin::Enumerate => "enumerate",
            Builtin::Zip => "zip",
            Builtin::Any => "any",
            Builtin::All => "all",
            Builtin::Array => "array",
            Builtin::Zeros => "zeros",
            Builtin::Ones => "ones",
            Builtin::Arange => "arange",
            Builtin::Linspace => "linspace",
            Builtin::Sqrt => "sqrt",
            Builtin::Exp => "exp",
            Builtin::Log => "log",
            Builtin::Sin => "sin",
            Builtin::Cos => "cos",
            Builtin::Floor => "floor",
            Builtin::Ceil => "ceil",
            Builtin::Mean => "mean",
            Builtin::Dot => "dot",
            Builtin::Allclose => "allclose",
            Builtin::Random => "random",
            Builtin::Rand => "rand",
            Builtin::Seed => "seed",
            Builtin::ReadText => "read_text",
            Builtin::Plot => "pyplot",
        }
    }

    /// A builtin reachable without an import.
    pub fn global(name: &str) -> Option<Builtin> {
        Some(match name {
            "print" => Builtin::Print,
            "len" => Builtin::Len,
            "sum" => Builtin::Sum,
            "abs" => Builtin::Abs,
            "round" => Builtin::Round,
            "min" => Builtin::Min,
            "max" => Builtin::Max,
            "range" => Builtin::Range,
            "sorted" => Builtin::Sorted,
            "repr" => Builtin::Repr,
            "str" => Builtin::Str,
            "int" => Builtin::Int,
            "float" => Builtin::Float,
            "bool" => Builtin::Bool,
            "list" => Builtin::List,
            "tuple" => Builtin::Tuple,
            "enumerate" => Builtin::Enumerate,
            "zip" => Builtin::Zip,
            "any" => Builtin::Any,
            "all" => Builtin::All,
            "read_text" => Builtin::ReadText,
            _ => return None,
        })
    }

    pub(crate) fn call(
        self,
        args: Vec<Value>,
        kwargs: &[(String, Value)],
        ctx: &mut CallContext<'_>,
    ) -> EvalResult<Value> {
        let name = self.name();
        match self {
            Builtin::Print => {
                check_kwargs(name, kwargs, &["sep", "end"])?;
                let sep = str_kwarg(kwargs, "sep")?.unwrap_or(" ");
                let end = str_kwarg(kwargs, "end")?.unwrap_or("\n");
                let line: Vec<String> = args.iter().map(Value::to_str).collect();
                ctx.output.print(&line.join(sep));
                ctx.output.print(end);
                Ok(Value::None)
            }
            Builtin::Len => length(&one_arg(name, args, kwargs)?),
            Builtin::Sum => {
                check_kwargs(name, kwargs, &["axis"])?;
                let value = one_of(name, args)?;
                match kwarg(kwargs, "axis") {
                    Some(axis) if !axis.is_none() => reduce_axis(&value, axis, Builtin::Sum),
                    _ => sum(&value),
                }
            }
            Builtin::Abs => absolute(&one_arg(name, args, kwargs)?),
            Builtin::Round => {
                check_kwargs(name, kwargs, &["decimals", "ndigits"])?;
                let digits = match (args.get(1), kwarg(kwargs, "decimals").or(kwarg(kwargs, "ndigits"))) {
                    (Some(d), _) | (None, Some(d)) if !d.is_none() => Some(int_arg(d)?),
                    _ => None,
                };
                let value = args
                    .into_iter()
                    .next()
                    .ok_or_else(|| wrong_arg_count(name, 1, 0))?;
                round(&value, digits)
            }
            Builtin::Min | Builtin::Max => {
                check_kwargs(name, kwargs, &[])?;
                extremum(self, args)
            }
            Builtin::Range => {
                check_kwargs(name, kwargs, &[])?;
                range(&args)
            }
            Builtin::Sorted => {
                check_kwargs(name, kwargs, &["reverse"])?;
                let mut items = one_of(name, args)?.iterate()?;
                sort_values(&mut items)?;
                if kwarg(kwargs, "reverse").map(Value::is_truthy).transpose()? == Some(true) {
                    items.reverse();
                }
                Ok(Value::List(items))
            }
            Builtin::Repr => Ok(Value::Str(one_arg(name, args, kwargs)?.repr())),
            Builtin::Str => Ok(Value::Str(
                optional_arg(name, args, kwargs)?.map_or_else(String::new, |v| v.to_str()),
            )),
            Builtin::Int => optional_arg(name, args, kwargs)?.map_or(Ok(Value::Int(0)), |v| to_int(&v)),
            Builtin::Float => {
                optional_arg(name, args, kwargs)?.map_or(Ok(Value::Float(0.0)), |v| to_float(&v))
            }
            Builtin::Bool => Ok(Value::Bool(match optional_arg(name, args, kwargs)? {
                Some(v) => v.is_truthy()?,
                None => false,
            })),
            Builtin::List => Ok(Value::List(match optional_arg(name, args, kwargs)? {
                Some(Value::Array(array)) => match array.to_list() {
                    Value::List(items) => items,
                    _ => Vec::new(),
                },
                Some(v) => v.iterate()?,
                None => Vec::new(),
            })),
            Builtin::Tuple => Ok(Value::Tuple(match optional_arg(name, args, kwargs)? {
                Some(v) => v.iterate()?,
                None => Vec::new(),
            })),
            Builtin::Enumerate => {
                check_kwargs(name, kwargs, &["start"])?;
                let start = kwarg(kwargs, "start").map(int_arg).transpose()?.unwrap_or(0);
                let items = one_of(name, args)?.iterate()?;
                let mut out = Vec::with_capacity(items.len());
                for (index, item) in (start..).zip(items) {
                    out.push(Value::Tuple(vec![Value::Int(index), item]));
                }
                Ok(Value::List(out))
            }
            Builtin::Zip => {
                check_kwargs(name, kwargs, &[])?;
                let columns = args
                    .iter()
                    .map(Value::iterate)
                    .collect::<EvalResult<Vec<_>>>()?;
                let rows = columns.iter().map(Vec::len).min().unwrap_or(0);
                Ok(Value::List(
                    (0..rows)
                        .map(|i| Value::Tuple(columns.iter().map(|c| c[i].clone()).collect()))
                        .collect(),
                ))
            }
            Builtin::Any | Builtin::All => {
                let items = elements(&one_arg(name, args, kwargs)?)?;
                let mut truth = Vec::with_capacity(items.len());
                for item in &items {
                    truth.push(item.is_truthy()?);
                }
                Ok(Value::Bool(if self == Builtin::Any {
                    truth.into_iter().any(|t| t)
                } else {
                    truth.into_iter().all(|t| t)
                }))
            }
            Builtin::Array => {
                check_kwargs(name, kwargs, &["dtype"])?;
                let array = Array::from_value(&one_of(name, args)?)?;
                Ok(Value::Array(match kwarg(kwargs, "dtype") {
                    Some(dtype) => cast(&array, dtype_arg(dtype)?),
                    None => array,
                }))
            }
            Builtin::Zeros | Builtin::Ones => {
                check_kwargs(name, kwargs, &["dtype"])?;
                let shape = shape_arg(&one_of(name, args)?)?;
                let dtype = kwarg(kwargs, "dtype").map(dtype_arg).transpose()?.unwrap_or(DType::Float);
                let fill = if self == Builtin::Ones { 1.0 } else { 0.0 };
                let size = checked_size(&shape)?;
                Ok(Value::Array(Array {
                    data: vec![fill; size],
                    shape,
                    dtype,
                }))
            }
            Builtin::Arange => {
                check_kwargs(name, kwargs, &[])?;
                arange(&args)
            }
            Builtin::Linspace => {
                check_kwargs(name, kwargs, &["num", "endpoint"])?;
                linspace(&args, kwargs)
            }
            Builtin::Sqrt => elementwise(&one_arg(name, args, kwargs)?, f64::sqrt),
            Builtin::Exp => elementwise(&one_arg(name, args, kwargs)?, f64::exp),
            Builtin::Log => elementwise(&one_arg(name, args, kwargs)?, f64::ln),
            Builtin::Sin => elementwise(&one_arg(name, args, kwargs)?, f64::sin),
            Builtin::Cos => elementwise(&one_arg(name, args, kwargs)?, f64::cos),
            Builtin::Floor => rounding(&one_arg(name, args, kwargs)?, f64::floor),
            Builtin::Ceil => rounding(&one_arg(name, args, kwargs)?, f64::ceil),
            Builtin::Mean => mean(&one_arg(name, args, kwargs)?),
            Builtin::Dot => {
                check_kwargs(name, kwargs, &[])?;
                let [a, b] = two_args(name, args)?;
                if matches!(a, Value::Array(_) | Value::List(_)) && matches!(b, Value::Array(_) | Value::List(_)) {
                    evaluate_binary(&a, &b, BinaryOp::MatMul)
                } else {
                    evaluate_binary(&a, &b, BinaryOp::Mul)
                }
            }
            Builtin::Allclose => {
                check_kwargs(name, kwargs, &["rtol", "atol"])?;
                let rtol = kwarg(kwargs, "rtol").map(float_arg).transpose()?.unwrap_or(1e-5);
                let atol = kwarg(kwargs, "atol").map(float_arg).transpose()?.unwrap_or(1e-8);
                let [a, b] = two_args(name, args)?;
                let close = broadcast(
                    &Array::from_value(&a)?,
                    &Array::from_value(&b)?,
                    DType::Bool,
                    |x, y| f64::from(u8::from((x - y).abs() <= atol + rtol * y.abs())),
                )?;
                Ok(Value::Bool(close.data.iter().all(|&v| v != 0.0)))
            }
            Builtin::Random => {
                check_kwargs(name, kwargs, &[])?;
                if !args.is_empty() {
                    return Err(wrong_arg_count(name, 0, args.len()));
                }
                Ok(Value::Float(ctx.rng.gen::<f64>()))
            }
            Builtin::Rand => {
                check_kwargs(name, kwargs, &[])?;
                if args.is_empty() {
                    return Ok(Value::Float(ctx.rng.gen::<f64>()));
                }
                let shape = args.iter().map(dimension).collect::<EvalResult<Vec<_>>>()?;
                let size = checked_size(&shape)?;
                let data = (0..size).map(|_| ctx.rng.gen::<f64>()).collect();
                Ok(Value::Array(Array {
                    data,
                    shape,
                    dtype: DType::Float,
                }))
            }
            Builtin::Plot => Ok(Value::None),
            Builtin::Seed => {
                let seed = int_arg(&one_arg(name, args, kwargs)?)?;
                *ctx.rng = StdRng::seed_from_u64(seed.unsigned_abs());
                Ok(Value::None)
            }
            Builtin::ReadText => {
                let path = one_arg(name, args, kwargs)?;
                let Value::Str(path) = path else {
                    return Err(type_error(format!(
                        "expected str path, not {}",
                        path.type_name()
                    )));
                };
                read_text(ctx.workdir, &path).map(Value::Str)
            }
        }
    }
}

// === Modules ===

pub(crate) fn is_module(name: &str) -> bool {
    matches!(
        name,
        "math" | "random" | "numpy" | "numpy.random" | "matplotlib" | "matplotlib.pyplot"
    )
}

/// `module.attr`, or `None` when the module has no such attribute.
pub(crate) fn module_attr(module: &str, attr: &str) -> Option<Value> {
    let constant = match attr {
        "pi" => Some(std::f64::consts::PI),
        "e" => Some(std::f64::consts::E),
        "nan" => Some(f64::NAN),
        "inf" => Some(f64::INFINITY),
        _ => None,
    };
    if matches!(module, "math" | "numpy") {
        if let Some(value) = constant {
            return Some(Value::Float(value));
        }
    }
    let builtin = match (module, attr) {
        ("matplotlib", "pyplot") => return Some(Value::Module("matplotlib.pyplot".to_string())),
        ("matplotlib.pyplot", _) => Builtin::Plot,
        ("math" | "numpy", "sqrt") => Builtin::Sqrt,
        ("math" | "numpy", "exp") => Builtin::Exp,
        ("math" | "numpy", "log") => Builtin::Log,
        ("math" | "numpy", "sin") => Builtin::Sin,
        ("math" | "numpy", "cos") => Builtin::Cos,
        ("math" | "numpy", "floor") => Builtin::Floor,
        ("math" | "numpy", "ceil") => Builtin::Ceil,
        ("numpy", "random") => return Some(Value::Module("numpy.random".to_string())),
        ("numpy", "array") => Builtin::Array,
        ("numpy", "zeros") => Builtin::Zeros,
        ("numpy", "ones") => Builtin::Ones,
        ("numpy", "arange") => Builtin::Arange,
        ("numpy", "linspace") => Builtin::Linspace,
        ("numpy", "mean") => Builtin::Mean,
        ("numpy", "sum") => Builtin::Sum,
        ("numpy", "abs") => Builtin::Abs,
        ("numpy", "round") => Builtin::Round,
        ("numpy", "max") => Builtin::Max,
        ("numpy", "min") => Builtin::Min,
        ("numpy", "dot") => Builtin::Dot,
        ("numpy", "allclose") => Builtin::Allclose,
        ("numpy", "float64") => Builtin::Float,
        ("numpy", "int64") => Builtin::Int,
        ("numpy.random" | "random", "seed") => Builtin::Seed,
        ("numpy.random" | "random", "random") => Builtin::Random,
        ("numpy.random", "rand") => Builtin::Rand,
        _ => return None,
    };
    Some(Value::Builtin(builtin))
}

// === Attributes and methods ===

const ARRAY_METHODS: &[&str] = &[
    "sum", "mean", "max", "min", "reshape", "tolist", "round", "copy", "flatten",
];
const LIST_METHODS: &[&str] = &[
    "append", "extend", "pop", "insert", "reverse", "index", "count", "copy",
];
const STR_METHODS: &[&str] = &[
    "upper", "lower", "strip", "split", "join", "replace", "startswith", "endswith",
];
const DICT_METHODS: &[&str] = &["keys", "values", "items", "get"];

/// `value.name`
pub(crate) fn attribute(value: &Value, name: &str) -> EvalResult<Value> {
    let method = || Ok(Value::Method(Box::new(value.clone()), name.to_string()));
    match value {
        Value::Module(module) => module_attr(module, name).ok_or_else(|| {
            raised(
                "AttributeError",
                format!("module '{module}' has no attribute '{name}'"),
            )
        }),
        Value::Array(array) => match name {
            "shape" => Ok(Value::Tuple(array.shape.iter().map(|&d| usize_value(d)).collect())),
            "ndim" => Ok(usize_value(array.ndim())),
            "size" => Ok(usize_value(array.size())),
            "dtype" => Ok(Value::Str(array.dtype.name().to_string())),
            "T" => Ok(Value::Array(array.transpose())),
            _ if ARRAY_METHODS.contains(&name) => method(),
            _ => Err(no_attribute("numpy.ndarray", name)),
        },
        Value::List(_) if LIST_METHODS.contains(&name) => method(),
        Value::Str(_) if STR_METHODS.contains(&name) => method(),
        Value::Dict(_) if DICT_METHODS.contains(&name) => method(),
        Value::Exception { message, .. } if name == "args" => {
            Ok(Value::Tuple(vec![Value::Str(message.clone())]))
        }
        other => Err(no_attribute(other.type_name(), name)),
    }
}

const LIST_MUTATORS: &[&str] = &["append", "extend", "pop", "insert", "reverse"];

pub(crate) fn mutates_list(name: &str) -> bool {
    LIST_MUTATORS.contains(&name)
}

/// Methods that mutate a list in place. `None` when `name` is not one.
pub(crate) fn mutate_list(
    items: &mut Vec<Value>,
    name: &str,
    args: Vec<Value>,
) -> Option<EvalResult<Value>> {
    let result = match name {
        "append" => one_of(name, args).map(|v| {
            items.push(v);
            Value::None
        }),
        "extend" => one_of(name, args).and_then(|v| {
            items.extend(elements(&v)?);
            Ok(Value::None)
        }),
        "insert" => two_args(name, args).and_then(|[index, v]| {
            let at = normalize_index(int_arg(&index)?, items.len()).min(items.len());
            items.insert(at, v);
            Ok(Value::None)
        }),
        "reverse" => {
            items.reverse();
            Ok(Value::None)
        }
        "pop" => pop(items, args.first()),
        _ => return None,
    };
    Some(result)
}

fn pop(items: &mut Vec<Value>, index: Option<&Value>) -> EvalResult<Value> {
    if items.is_empty() {
        return Err(raised("IndexError", "pop from empty list"));
    }
    let index = index.map(int_arg).transpose()?.unwrap_or(-1);
    let at = normalize_index(index, items.len());
    if at >= items.len() {
        return Err(index_out_of_range("pop"));
    }
    Ok(items.remove(at))
}

/// Non-mutating method call on `receiver`.
pub(crate) fn call_method(
    receiver: &Value,
    name: &str,
    args: Vec<Value>,
    kwargs: &[(String, Value)],
    ctx: &mut CallContext<'_>,
) -> EvalResult<Value> {
    match receiver {
        Value::Array(array) => array_method(array, name, args, kwargs, ctx),
        Value::List(items) => match name {
            "index" => {
                let needle = one_of(name, args)?;
                items
                    .iter()
                    .position(|v| v.equals(&needle))
                    .map(usize_value)
                    .ok_or_else(|| value_error(format!("{} is not in list", needle.repr())))
            }
            "count" => {
                let needle = one_of(name, args)?;
                Ok(usize_value(items.iter().filter(|v| v.equals(&needle)).count()))
            }
            "copy" => Ok(receiver.clone()),
            _ => {
                // Mutating methods on a temporary: run them on a copy.
                let mut copy = items.clone();
                mutate_list(&mut copy, name, args)
                    .unwrap_or_else(|| Err(no_attribute("list", name)))
            }
        },
        Value::Str(text) => str_method(text, name, args),
        Value::Dict(entries) => match name {
            "keys" => Ok(Value::List(entries.iter().map(|(k, _)| k.clone()).collect())),
            "values" => Ok(Value::List(entries.iter().map(|(_, v)| v.clone()).collect())),
            "items" => Ok(Value::List(
                entries
                    .iter()
                    .map(|(k, v)| Value::Tuple(vec![k.clone(), v.clone()]))
                    .collect(),
            )),
            "get" => {
                let mut args = args.into_iter();
                let key = args.next().ok_or_else(|| wrong_arg_count(name, 1, 0))?;
                let default = args.next().unwrap_or(Value::None);
                Ok(entries
                    .iter()
                    .find(|(k, _)| k.equals(&key))
                    .map_or(default, |(_, v)| v.clone()))
            }
            _ => Err(no_attribute("dict", name)),
        },
        other => Err(no_attribute(other.type_name(), name)),
    }
}

fn array_method(
    array: &Array,
    name: &str,
    args: Vec<Value>,
    kwargs: &[(String, Value)],
    ctx: &mut CallContext<'_>,
) -> EvalResult<Value> {
    let receiver = Value::Array(array.clone());
    let with_receiver = |args: Vec<Value>| {
        let mut all = vec![receiver.clone()];
        all.extend(args);
        all
    };
    match name {
        "sum" => Builtin::Sum.call(with_receiver(args), kwargs, ctx),
        "mean" => Builtin::Mean.call(with_receiver(args), kwargs, ctx),
        "max" => Builtin::Max.call(with_receiver(args), kwargs, ctx),
        "min" => Builtin::Min.call(with_receiver(args), kwargs, ctx),
        "round" => Builtin::Round.call(with_receiver(args), kwargs, ctx),
        "tolist" => Ok(array.to_list()),
        "copy" => Ok(receiver),
        "flatten" => Ok(Value::Array(array.reshape(vec![array.size()])?)),
        "reshape" => {
            let dims = match args.as_slice() {
                [single @ (Value::Tuple(_) | Value::List(_))] => shape_arg(single)?,
                _ => args.iter().map(dimension).collect::<EvalResult<_>>()?,
            };
            Ok(Value::Array(array.reshape(dims)?))
        }
        _ => Err(no_attribute("numpy.ndarray", name)),
    }
}

fn str_method(text: &str, name: &str, args: Vec<Value>) -> EvalResult<Value> {
    let string_arg = |value: &Value| match value {
        Value::Str(s) => Ok(s.clone()),
        other => Err(type_error(format!(
            "must be str, not {}",
            other.type_name()
        ))),
    };
    match name {
        "upper" => Ok(Value::Str(text.to_uppercase())),
        "lower" => Ok(Value::Str(text.to_lowercase())),
        "strip" => Ok(Value::Str(text.trim().to_string())),
        "split" => {
            let parts: Vec<Value> = match args.first() {
                Some(sep) => {
                    let sep = string_arg(sep)?;
                    text.split(sep.as_str()).map(|p| Value::Str(p.to_string())).collect()
                }
                None => text.split_whitespace().map(|p| Value::Str(p.to_string())).collect(),
            };
            Ok(Value::List(parts))
        }
        "join" => {
            let items = one_of(name, args)?.iterate()?;
            let parts = items.iter().map(string_arg).collect::<EvalResult<Vec<_>>>()?;
            Ok(Value::Str(parts.join(text)))
        }
        "replace" => {
            let [from, to] = two_args(name, args)?;
            Ok(Value::Str(text.replace(&string_arg(&from)?, &string_arg(&to)?)))
        }
        "startswith" => Ok(Value::Bool(text.starts_with(&string_arg(&one_of(name, args)?)?))),
        "endswith" => Ok(Value::Bool(text.ends_with(&string_arg(&one_of(name, args)?)?))),
        _ => Err(no_attribute("str", name)),
    }
}

// === Argument helpers ===

fn kwarg<'a>(kwargs: &'a [(String, Value)], name: &str) -> Option<&'a Value> {
    kwargs.iter().find(|(k, _)| k == name).map(|(_, v)| v)
}

fn check_kwargs(function: &str, kwargs: &[(String, Value)], allowed: &[&str]) -> EvalResult<()> {
    match kwargs.iter().find(|(k, _)| !allowed.contains(&k.as_str())) {
        Some((k, _)) => Err(type_error(format!(
            "'{k}' is an invalid keyword argument for {function}()"
        ))),
        None => Ok(()),
    }
}

fn str_kwarg<'a>(kwargs: &'a [(String, Value)], name: &str) -> EvalResult<Option<&'a str>> {
    match kwarg(kwargs, name) {
        None | Some(Value::None) => Ok(None),
        Some(Value::Str(s)) => Ok(Some(s)),
        Some(other) => Err(type_error(format!(
            "{name} must be None or a string, not {}",
            other.type_name()
        ))),
    }
}

fn one_of(function: &str, args: Vec<Value>) -> EvalResult<Value> {
    let count = args.len();
    let mut args = args.into_iter();
    match (args.next(), args.next()) {
        (Some(value), None) => Ok(value),
        _ => Err(wrong_arg_count(function, 1, count)),
    }
}

fn one_arg(function: &str, args: Vec<Value>, kwargs: &[(String, Value)]) -> EvalResult<Value> {
    check_kwargs(function, kwargs, &[])?;
    one_of(function, args)
}

fn optional_arg(
    function: &str,
    args: Vec<Value>,
    kwargs: &[(String, Value)],
) -> EvalResult<Option<Value>> {
    check_kwargs(function, kwargs, &[])?;
    if args.len() > 1 {
        return Err(wrong_arg_count(function, 1, args.len()));
    }
    Ok(args.into_iter().next())
}

fn two_args(function: &str, args: Vec<Value>) -> EvalResult<[Value; 2]> {
    let count = args.len();
    <[Value; 2]>::try_from(args).map_err(|_| wrong_arg_count(function, 2, count))
}

fn int_arg(value: &Value) -> EvalResult<i64> {
    value.as_int().ok_or_else(|| {
        type_error(format!(
            "'{}' object cannot be interpreted as an integer",
            value.type_name()
        ))
    })
}

fn float_arg(value: &Value) -> EvalResult<f64> {
    value.as_f64().ok_or_else(|| {
        type_error(format!(
            "must be real number, not {}",
            value.type_name()
        ))
    })
}

fn dimension(value: &Value) -> EvalResult<usize> {
    let n = int_arg(value)?;
    usize::try_from(n).map_err(|_| value_error("negative dimensions are not allowed"))
}

fn shape_arg(value: &Value) -> EvalResult<Vec<usize>> {
    match value {
        Value::Tuple(items) | Value::List(items) => items.iter().map(dimension).collect(),
        other => Ok(vec![dimension(other)?]),
    }
}

fn dtype_arg(value: &Value) -> EvalResult<DType> {
    match value {
        Value::Builtin(Builtin::Float) => Ok(DType::Float),
        Value::Builtin(Builtin::Int) => Ok(DType::Int),
        Value::Builtin(Builtin::Bool) => Ok(DType::Bool),
        Value::Str(name) => match name.as_str() {
            "float" | "float64" => Ok(DType::Float),
            "int" | "int64" => Ok(DType::Int),
            "bool" => Ok(DType::Bool),
            other => Err(type_error(format!("data type '{other}' not understood"))),
        },
        other => Err(type_error(format!(
            "data type '{}' not understood",
            other.repr()
        ))),
    }
}

/// Python-style negative indexing; out-of-range results are `>= len`.
fn normalize_index(index: i64, len: usize) -> usize {
    if index >= 0 {
        usize::try_from(index).unwrap_or(usize::MAX)
    } else {
        len.checked_sub(usize::try_from(index.unsigned_abs()).unwrap_or(usize::MAX))
            .unwrap_or(usize::MAX)
    }
}

fn usize_value(n: usize) -> Value {
    Value::Int(i64::try_from(n).unwrap_or(i64::MAX))
}

// === Implementations ===

fn length(value: &Value) -> EvalResult<Value> {
    let len = match value {
        Value::Str(s) => s.chars().count(),
        Value::List(items) | Value::Tuple(items) => items.len(),
        Value::Dict(entries) => entries.len(),
        Value::Array(array) => match array.shape.first() {
            Some(&len) => len,
            None => return Err(type_error("len() of unsized object")),
        },
        other => {
            return Err(type_error(format!(
                "object of type '{}' has no len()",
                other.type_name()
            )))
        }
    };
    Ok(usize_value(len))
}

/// Scalars of an iterable, flattening arrays.
fn elements(value: &Value) -> EvalResult<Vec<Value>> {
    match value {
        Value::Array(array) => Ok((0..array.size()).map(|i| array.element(i)).collect()),
        other => other.iterate(),
    }
}

fn sum(value: &Value) -> EvalResult<Value> {
    if let Value::Array(array) = value {
        return Ok(reduce_all(array, Builtin::Sum));
    }
    value
        .iterate()?
        .iter()
        .try_fold(Value::Int(0), |total, item| {
            evaluate_binary(&total, item, BinaryOp::Add)
        })
}

fn mean(value: &Value) -> EvalResult<Value> {
    let array = Array::from_value(value)?;
    #[expect(clippy::cast_precision_loss, reason = "element counts are small")]
    let count = array.size() as f64;
    Ok(Value::Float(array.data.iter().sum::<f64>() / count))
}

/// Sum, min or max over every element of `array`.
fn reduce_all(array: &Array, op: Builtin) -> Value {
    let data = array.data.iter().copied();
    let result = match op {
        Builtin::Sum => data.sum(),
        // NaN propagates.
        Builtin::Min => data.fold(f64::INFINITY, |a, b| if !a.is_nan() && (b.is_nan() || b < a) { b } else { a }),
        _ => data.fold(f64::NEG_INFINITY, |a, b| if !a.is_nan() && (b.is_nan() || b > a) { b } else { a }),
    };
    let dtype = if array.dtype == DType::Bool { DType::Int } else { array.dtype };
    Array::scalar(result, dtype).element(0)
}

/// Reduce along one axis of a 2-D array.
fn reduce_axis(value: &Value, axis: &Value, op: Builtin) -> EvalResult<Value> {
    let array = Array::from_value(value)?;
    let axis = int_arg(axis)?;
    let reduced = match (array.shape.as_slice(), axis) {
        ([_], 0 | -1) => return Ok(reduce_all(&array, op)),
        ([rows, cols], 0 | -2) => (0..*cols)
            .map(|c| (0..*rows).map(|r| array.data[r * cols + c]).sum::<f64>())
            .collect::<Vec<f64>>(),
        ([_, cols], 1 | -1) => array.data.chunks(*cols).map(|row| row.iter().sum::<f64>()).collect(),
        _ => {
            return Err(raised(
                "AxisError",
                format!("axis {axis} is out of bounds for array of dimension {}", array.ndim()),
            ))
        }
    };
    let dtype = if array.dtype == DType::Bool { DType::Int } else { array.dtype };
    Ok(Value::Array(Array::vector(reduced, dtype)))
}

fn extremum(which: Builtin, args: Vec<Value>) -> EvalResult<Value> {
    if let [Value::Array(array)] = args.as_slice() {
        if array.size() == 0 {
            return Err(value_error(format!(
                "zero-size array to reduction operation {} which has no identity",
                if which == Builtin::Max { "maximum" } else { "minimum" }
            )));
        }
        return Ok(reduce_all(array, which));
    }
    let items = if args.len() == 1 { args[0].iterate()? } else { args };
    let mut best: Option<Value> = None;
    for item in items {
        best = Some(match best {
            None => item,
            Some(current) => {
                let order = sort_order(&item, &current)?;
                let better = if which == Builtin::Max {
                    order == Ordering::Greater
                } else {
                    order == Ordering::Less
                };
                if better {
                    item
                } else {
                    current
                }
            }
        });
    }
    best.ok_or_else(|| value_error(format!("{}() arg is an empty sequence", which.name())))
}

fn sort_values(items: &mut [Value]) -> EvalResult<()> {
    let mut failure = None;
    items.sort_by(|a, b| match sort_order(a, b) {
        Ok(order) => order,
        Err(err) => {
            failure.get_or_insert(err);
            Ordering::Equal
        }
    });
    failure.map_or(Ok(()), Err)
}

fn absolute(value: &Value) -> EvalResult<Value> {
    match value {
        Value::Int(v) => v
            .checked_abs()
            .map(Value::Int)
            .ok_or_else(|| integer_overflow("abs")),
        Value::Bool(b) => Ok(Value::Int(i64::from(*b))),
        Value::Float(v) => Ok(Value::Float(v.abs())),
        Value::Array(array) => Ok(Value::Array(array.map(array.dtype, f64::abs))),
        other => Err(type_error(format!(
            "bad operand type for abs(): '{}'",
            other.type_name()
        ))),
    }
}

fn round_to(value: f64, digits: i64) -> f64 {
    let exponent = i32::try_from(digits.clamp(-300, 300)).unwrap_or(0);
    let scale = 10f64.powi(exponent);
    (value * scale).round_ties_even() / scale
}

fn round(value: &Value, digits: Option<i64>) -> EvalResult<Value> {
    match (value, digits) {
        (Value::Int(_) | Value::Bool(_), _) => Ok(Value::Int(int_arg(value)?)),
        (Value::Float(v), None) => {
            if !v.is_finite() {
                return Err(raised(
                    if v.is_nan() { "ValueError" } else { "OverflowError" },
                    format!("cannot convert float {} to integer", crate::value::float_repr(*v)),
                ));
            }
            to_int(&Value::Float(v.round_ties_even()))
        }
        (Value::Float(v), Some(d)) => Ok(Value::Float(round_to(*v, d))),
        (Value::Array(array), d) => {
            let d = d.unwrap_or(0);
            Ok(Value::Array(array.map(array.dtype, |v| round_to(v, d))))
        }
        (other, _) => Err(type_error(format!(
            "type {} doesn't define __round__ method",
            other.type_name()
        ))),
    }
}

fn to_int(value: &Value) -> EvalResult<Value> {
    match value {
        Value::Int(_) | Value::Bool(_) => Ok(Value::Int(int_arg(value)?)),
        Value::Float(v) => {
            if v.is_nan() {
                return Err(value_error("cannot convert float NaN to integer"));
            }
            if v.is_infinite() {
                return Err(raised(
                    "OverflowError",
                    "cannot convert float infinity to integer",
                ));
            }
            #[expect(clippy::cast_possible_truncation, reason = "truncation toward zero is int()")]
            let truncated = v.trunc() as i64;
            Ok(Value::Int(truncated))
        }
        Value::Str(text) => text.trim().parse::<i64>().map(Value::Int).map_err(|_| {
            value_error(format!(
                "invalid literal for int() with base 10: {}",
                value.repr()
            ))
        }),
        Value::Array(array) if array.size() == 1 => to_int(&array.element(0)),
        other => Err(type_error(format!(
            "int() argument must be a string, a bytes-like object or a real number, not '{}'",
            other.type_name()
        ))),
    }
}

fn to_float(value: &Value) -> EvalResult<Value> {
    if let Value::Str(text) = value {
        let trimmed = text.trim();
        let parsed = match trimmed.to_ascii_lowercase().as_str() {
            "nan" | "+nan" | "-nan" => Some(f64::NAN),
            "inf" | "+inf" | "infinity" => Some(f64::INFINITY),
            "-inf" | "-infinity" => Some(f64::NEG_INFINITY),
            _ => trimmed.parse::<f64>().ok(),
        };
        return parsed.map(Value::Float).ok_or_else(|| {
            value_error(format!(
                "could not convert string to float: {}",
                value.repr()
            ))
        });
    }
    value.as_f64().map(Value::Float).ok_or_else(|| {
        type_error(format!(
            "float() argument must be a string or a real number, not '{}'",
            value.type_name()
        ))
    })
}

fn cast(array: &Array, dtype: DType) -> Array {
    match dtype {
        DType::Float => array.map(DType::Float, |v| v),
        DType::Int => array.map(DType::Int, f64::trunc),
        DType::Bool => array.map(DType::Bool, |v| f64::from(u8::from(v != 0.0))),
    }
}

fn elementwise(value: &Value, f: fn(f64) -> f64) -> EvalResult<Value> {
    match value {
        Value::Array(_) | Value::List(_) | Value::Tuple(_) => {
            Ok(Value::Array(Array::from_value(value)?.map(DType::Float, f)))
        }
        other => Ok(Value::Float(f(float_arg(other)?))),
    }
}

/// `floor`/`ceil`: integers for scalars, floats for arrays.
fn rounding(value: &Value, f: fn(f64) -> f64) -> EvalResult<Value> {
    match value {
        Value::Array(_) | Value::List(_) | Value::Tuple(_) => elementwise(value, f),
        other => to_int(&Value::Float(f(float_arg(other)?))),
    }
}

fn range(args: &[Value]) -> EvalResult<Value> {
    let ints = args.iter().map(int_arg).collect::<EvalResult<Vec<_>>>()?;
    let (start, stop, step) = match ints.as_slice() {
        [stop] => (0, *stop, 1),
        [start, stop] => (*start, *stop, 1),
        [start, stop, step] => (*start, *stop, *step),
        _ => {
            return Err(type_error(format!(
                "range expected at most 3 arguments, got {}",
                args.len()
            )))
        }
    };
    if step == 0 {
        return Err(value_error("range() arg 3 must not be zero"));
    }
    let mut items = Vec::new();
    let mut current = start;
    while (step > 0 && current < stop) || (step < 0 && current > stop) {
        if items.len() >= MAX_SEQUENCE_LEN {
            return Err(out_of_memory("range"));
        }
        items.push(Value::Int(current));
        current = match current.checked_add(step) {
            Some(next) => next,
            None => break,
        };
    }
    Ok(Value::List(items))
}

#[expect(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss,
    reason = "element counts are checked non-negative and bounded before conversion"
)]
fn arange(args: &[Value]) -> EvalResult<Value> {
    let numbers = args.iter().map(float_arg).collect::<EvalResult<Vec<_>>>()?;
    let (start, stop, step) = match numbers.as_slice() {
        [stop] => (0.0, *stop, 1.0),
        [start, stop] => (*start, *stop, 1.0),
        [start, stop, step] => (*start, *stop, *step),
        _ => return Err(wrong_arg_count("arange", 3, args.len())),
    };
    if step == 0.0 || !step.is_finite() {
        return Err(value_error("arange: step must be finite and non-zero"));
    }
    let count = ((stop - start) / step).ceil().max(0.0);
    if !count.is_finite() || count > MAX_SEQUENCE_LEN as f64 {
        return Err(out_of_memory("arange"));
    }
    let dtype = if args.iter().all(|a| a.as_int().is_some()) {
        DType::Int
    } else {
        DType::Float
    };
    let data = (0..count as usize).map(|i| start + i as f64 * step).collect();
    Ok(Value::Array(Array::vector(data, dtype)))
}

#[expect(clippy::cast_precision_loss, reason = "sample counts are small")]
fn linspace(args: &[Value], kwargs: &[(String, Value)]) -> EvalResult<Value> {
    let (start, stop, num) = match args {
        [start, stop] => (float_arg(start)?, float_arg(stop)?, None),
        [start, stop, num] => (float_arg(start)?, float_arg(stop)?, Some(num)),
        _ => return Err(wrong_arg_count("linspace", 3, args.len())),
    };
    let num = match num.or(kwarg(kwargs, "num")) {
        Some(n) => dimension(n)?,
        None => 50,
    };
    if num > MAX_SEQUENCE_LEN {
        return Err(out_of_memory("linspace"));
    }
    let endpoint = match kwarg(kwargs, "endpoint") {
        Some(v) => v.is_truthy()?,
        None => true,
    };
    let divisions = if endpoint { num.saturating_sub(1) } else { num };
    let step = if divisions == 0 {
        0.0
    } else {
        (stop - start) / divisions as f64
    };
    let mut data: Vec<f64> = (0..num).map(|i| start + i as f64 * step).collect();
    if endpoint && num > 1 {
        if let Some(last) = data.last_mut() {
            *last = stop;
        }
    }
    Ok(Value::Array(Array::vector(data, DType::Float)))
}

fn read_text(workdir: &Path, path: &str) -> EvalResult<String> {
    let relative = Path::new(path);
    let escapes = relative.components().any(|c| {
        matches!(
            c,
            Component::ParentDir | Component::RootDir | Component::Prefix(_)
        )
    });
    if escapes {
        return Err(permission_denied(path));
    }
    std::fs::read_to_string(workdir.join(relative)).map_err(|err| {
        if err.kind() == std::io::ErrorKind::NotFound {
            file_not_found(path)
        } else {
            raised("OSError", err.to_string())
        }
    })
}

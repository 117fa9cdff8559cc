//! The embedded evaluator.
//!
//! [`Evaluator`] implements the [`Interpreter`] seam: each doctest gets a
//! [`Namespace`] whose module-level bindings persist across its examples.
//! Expression statements outside function bodies echo their `repr`, as an
//! interactive session does.

mod index;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use numdoc_ir::{ExecError, ExecOutcome, Interpreter};
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::ast::{Expr, Stmt, Target};
use crate::builtins::{self, Builtin, CallContext};
use crate::environment::Environment;
use crate::errors::{
    assertion_failed, nesting_too_deep, no_attribute, not_callable, raised, recursion_limit,
    syntax_error, type_error, undefined_variable, value_error, wrong_arg_count, EvalResult,
};
use crate::operators::{evaluate_binary, evaluate_compare, evaluate_unary};
use crate::parser::parse_program;
use crate::print_handler::BufferPrintHandler;
use crate::value::{Function, Value, MAX_NESTING};

use index::{delete_item, get_item, set_item, Subscript};

/// Call depth at which `RecursionError` is raised.
pub const DEFAULT_RECURSION_LIMIT: usize = 200;

/// The shipped host runtime.
#[derive(Clone, Debug)]
pub struct Evaluator {
    recursion_limit: usize,
}

impl Default for Evaluator {
    fn default() -> Self {
        Evaluator {
            recursion_limit: DEFAULT_RECURSION_LIMIT,
        }
    }
}

impl Evaluator {
    pub fn new() -> Self {
        Evaluator::default()
    }

    #[must_use]
    pub fn with_recursion_limit(mut self, limit: usize) -> Self {
        self.recursion_limit = limit;
        self
    }
}

/// Bindings and captured state of one doctest run.
#[derive(Debug)]
pub struct Namespace {
    env: Environment,
    output: BufferPrintHandler,
    rng: StdRng,
    workdir: PathBuf,
}

impl Namespace {
    fn new(workdir: &Path) -> Self {
        Namespace {
            env: Environment::new(),
            output: BufferPrintHandler::new(),
            rng: StdRng::from_entropy(),
            workdir: workdir.to_path_buf(),
        }
    }

    /// A module-level binding.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.env.lookup(name)
    }

    pub fn names(&self) -> Vec<&str> {
        self.env.global_names()
    }

    pub fn workdir(&self) -> &Path {
        &self.workdir
    }
}

impl Interpreter for Evaluator {
    type Namespace = Namespace;

    #[tracing::instrument(level = "debug", skip_all, fields(globs = globs.len()))]
    fn new_namespace(&self, globs: &[(String, String)], workdir: &Path) -> Result<Namespace, ExecError> {
        let mut namespace = Namespace::new(workdir);
        for (name, source) in globs {
            let value = if builtins::is_module(source) {
                Value::Module(source.clone())
            } else {
                let program = parse_program(source)?;
                let [Stmt::Expr(expr)] = program.as_slice() else {
                    return Err(syntax_error(format!(
                        "initial binding for '{name}' must be an expression"
                    )));
                };
                Machine::new(&mut namespace, self.recursion_limit).eval(expr)?
            };
            namespace.env.define(name.clone(), value);
        }
        Ok(namespace)
    }

    fn check_syntax(&self, source: &str) -> Result<(), ExecError> {
        parse_program(source).map(|_| ())
    }

    #[tracing::instrument(level = "trace", skip_all)]
    fn execute(&self, source: &str, namespace: &mut Namespace) -> ExecOutcome {
        let result = parse_program(source)
            .and_then(|program| Machine::new(namespace, self.recursion_limit).run(&program));
        let output = namespace.output.take_output();
        match result {
            Ok(()) => ExecOutcome::ok(output),
            Err(error) => {
                tracing::trace!(%error, "example raised");
                ExecOutcome::raised(output, error)
            }
        }
    }
}

/// Control flow out of a statement.
enum Flow {
    Normal,
    Return(Value),
    Break,
    Continue,
}

/// Executes statements against one namespace.
struct Machine<'a> {
    ns: &'a mut Namespace,
    recursion_limit: usize,
    depth: usize,
    /// Whether expression statements print their value.
    echo: bool,
}

impl<'a> Machine<'a> {
    fn new(ns: &'a mut Namespace, recursion_limit: usize) -> Self {
        Machine {
            ns,
            recursion_limit,
            depth: 0,
            echo: true,
        }
    }

    fn context(&mut self) -> CallContext<'_> {
        CallContext {
            output: &self.ns.output,
            rng: &mut self.ns.rng,
            workdir: &self.ns.workdir,
        }
    }

    fn run(&mut self, program: &[Stmt]) -> EvalResult<()> {
        match self.exec_block(program)? {
            Flow::Normal | Flow::Return(_) => Ok(()),
            Flow::Break => Err(syntax_error("'break' outside loop")),
            Flow::Continue => Err(syntax_error("'continue' not properly in loop")),
        }
    }

    // === Statements ===

    fn exec_block(&mut self, body: &[Stmt]) -> EvalResult<Flow> {
        for stmt in body {
            let flow = self.exec(stmt)?;
            if !matches!(flow, Flow::Normal) {
                return Ok(flow);
            }
        }
        Ok(Flow::Normal)
    }

    fn exec(&mut self, stmt: &Stmt) -> EvalResult<Flow> {
        match stmt {
            Stmt::Expr(expr) => {
                let value = self.eval(expr)?;
                if self.echo && !value.is_none() {
                    self.ns.output.println(&value.repr());
                }
            }
            Stmt::Assign(targets, value) => {
                let value = self.eval(value)?;
                for target in targets {
                    self.assign(target, value.clone())?;
                }
            }
            Stmt::AugAssign(target, op, value) => {
                let current = self.eval(&target_expr(target)?)?;
                let rhs = self.eval(value)?;
                let updated = evaluate_binary(&current, &rhs, *op)?;
                self.assign(target, updated)?;
            }
            Stmt::For { target, iter, body } => {
                for item in self.eval(iter)?.iterate()? {
                    self.assign(target, item)?;
                    match self.exec_block(body)? {
                        Flow::Break => break,
                        Flow::Return(value) => return Ok(Flow::Return(value)),
                        Flow::Normal | Flow::Continue => {}
                    }
                }
            }
            Stmt::While { condition, body } => {
                while self.eval(condition)?.is_truthy()? {
                    match self.exec_block(body)? {
                        Flow::Break => break,
                        Flow::Return(value) => return Ok(Flow::Return(value)),
                        Flow::Normal | Flow::Continue => {}
                    }
                }
            }
            Stmt::If {
                branches,
                otherwise,
            } => {
                for (condition, body) in branches {
                    if self.eval(condition)?.is_truthy()? {
                        return self.exec_block(body);
                    }
                }
                return self.exec_block(otherwise);
            }
            Stmt::Def(def) => {
                let defaults = def
                    .defaults
                    .iter()
                    .map(|d| d.as_ref().map(|e| self.eval(e)).transpose())
                    .collect::<EvalResult<Vec<_>>>()?;
                let function = Function {
                    def: Arc::clone(def),
                    defaults,
                };
                self.ns
                    .env
                    .define(def.name.clone(), Value::Function(Arc::new(function)));
            }
            Stmt::Return(value) => {
                if self.depth == 0 {
                    return Err(syntax_error("'return' outside function"));
                }
                let value = match value {
                    Some(expr) => self.eval(expr)?,
                    None => Value::None,
                };
                return Ok(Flow::Return(value));
            }
            Stmt::Raise(value) => {
                let Some(expr) = value else {
                    return Err(raised("RuntimeError", "No active exception to reraise"));
                };
                return Err(match self.eval(expr)? {
                    Value::ExceptionType(kind) => raised(&kind, ""),
                    Value::Exception { kind, message } => raised(&kind, message),
                    _ => type_error("exceptions must derive from BaseException"),
                });
            }
            Stmt::Assert(condition, message) => {
                if !self.eval(condition)?.is_truthy()? {
                    let message = match message {
                        Some(expr) => self.eval(expr)?.to_str(),
                        None => String::new(),
                    };
                    return Err(assertion_failed(message));
                }
            }
            Stmt::Import { module, alias } => {
                if !builtins::is_module(module) {
                    return Err(raised(
                        "ModuleNotFoundError",
                        format!("No module named '{module}'"),
                    ));
                }
                match alias {
                    Some(alias) => self.ns.env.define(alias.clone(), Value::Module(module.clone())),
                    None => {
                        let top = module.split('.').next().unwrap_or(module);
                        self.ns.env.define(top, Value::Module(top.to_string()));
                    }
                }
            }
            Stmt::FromImport { module, names } => {
                if !builtins::is_module(module) {
                    return Err(raised(
                        "ModuleNotFoundError",
                        format!("No module named '{module}'"),
                    ));
                }
                for (name, alias) in names {
                    let value = builtins::module_attr(module, name).ok_or_else(|| {
                        raised(
                            "ImportError",
                            format!("cannot import name '{name}' from '{module}'"),
                        )
                    })?;
                    self.ns.env.define(alias.as_ref().unwrap_or(name).clone(), value);
                }
            }
            Stmt::Del(target) => self.delete(target)?,
            Stmt::Pass => {}
            Stmt::Break => return Ok(Flow::Break),
            Stmt::Continue => return Ok(Flow::Continue),
        }
        Ok(Flow::Normal)
    }

    fn assign(&mut self, target: &Target, value: Value) -> EvalResult<()> {
        match target {
            Target::Name(name) => {
                within_nesting(&value, MAX_NESTING)?;
                self.ns.env.define(name.clone(), value);
                Ok(())
            }
            Target::Index(container, index) => {
                let subscript = self.subscript(index)?;
                self.store_item(container, subscript, ItemOp::Set(value))
            }
            Target::Unpack(targets) => {
                let items = self.unpack_items(&value)?;
                if items.len() != targets.len() {
                    return Err(if items.len() < targets.len() {
                        value_error(format!(
                            "not enough values to unpack (expected {}, got {})",
                            targets.len(),
                            items.len()
                        ))
                    } else {
                        value_error(format!(
                            "too many values to unpack (expected {})",
                            targets.len()
                        ))
                    });
                }
                for (target, item) in targets.iter().zip(items) {
                    self.assign(target, item)?;
                }
                Ok(())
            }
        }
    }

    fn unpack_items(&self, value: &Value) -> EvalResult<Vec<Value>> {
        value.iterate().map_err(|_| {
            type_error(format!(
                "cannot unpack non-iterable {} object",
                value.type_name()
            ))
        })
    }

    /// Apply `op` to `container[subscript]`, writing every enclosing
    /// container back so nested updates land in the bound variable.
    fn store_item(&mut self, container: &Expr, subscript: Subscript, op: ItemOp) -> EvalResult<()> {
        match container {
            Expr::Name(name) => {
                let slot = self
                    .ns
                    .env
                    .lookup_mut(name)
                    .ok_or_else(|| undefined_variable(name))?;
                op.apply(slot, subscript)
            }
            Expr::Index(outer, outer_index) => {
                let outer_subscript = self.subscript(outer_index)?;
                let mut inner = get_item(&self.eval(outer)?, outer_subscript.clone())?;
                op.apply(&mut inner, subscript)?;
                self.store_item(outer, outer_subscript, ItemOp::Set(inner))
            }
            // A temporary: the update is applied and discarded.
            other => op.apply(&mut self.eval(other)?, subscript),
        }
    }

    fn delete(&mut self, target: &Target) -> EvalResult<()> {
        match target {
            Target::Name(name) => self
                .ns
                .env
                .remove(name)
                .map(|_| ())
                .ok_or_else(|| undefined_variable(name)),
            Target::Index(container, index) => {
                let subscript = self.subscript(index)?;
                self.store_item(container, subscript, ItemOp::Delete)
            }
            Target::Unpack(targets) => targets.iter().try_for_each(|t| self.delete(t)),
        }
    }

    // === Expressions ===

    fn eval(&mut self, expr: &Expr) -> EvalResult<Value> {
        match expr {
            Expr::Int(v) => Ok(Value::Int(*v)),
            Expr::Float(v) => Ok(Value::Float(*v)),
            Expr::Str(s) => Ok(Value::Str(s.clone())),
            Expr::Bool(b) => Ok(Value::Bool(*b)),
            Expr::None => Ok(Value::None),
            Expr::Name(name) => self.lookup(name),
            Expr::List(items) => Ok(Value::List(self.eval_all(items)?)),
            Expr::Tuple(items) => Ok(Value::Tuple(self.eval_all(items)?)),
            Expr::Dict(entries) => {
                let mut dict: Vec<(Value, Value)> = Vec::with_capacity(entries.len());
                for (key, value) in entries {
                    let key = self.eval(key)?;
                    let value = self.eval(value)?;
                    match dict.iter().position(|(k, _)| k.equals(&key)) {
                        Some(slot) => dict[slot].1 = value,
                        None => dict.push((key, value)),
                    }
                }
                Ok(Value::Dict(dict))
            }
            Expr::ListComp {
                element,
                target,
                iter,
                condition,
            } => self.list_comprehension(element, target, iter, condition.as_deref()),
            Expr::Unary(op, operand) => evaluate_unary(&self.eval(operand)?, *op),
            Expr::Binary(op, left, right) => {
                let left = self.eval(left)?;
                let right = self.eval(right)?;
                evaluate_binary(&left, &right, *op)
            }
            Expr::Compare(op, left, right) => {
                let left = self.eval(left)?;
                let right = self.eval(right)?;
                evaluate_compare(&left, &right, *op)
            }
            Expr::And(left, right) => {
                let left = self.eval(left)?;
                if left.is_truthy()? {
                    self.eval(right)
                } else {
                    Ok(left)
                }
            }
            Expr::Or(left, right) => {
                let left = self.eval(left)?;
                if left.is_truthy()? {
                    Ok(left)
                } else {
                    self.eval(right)
                }
            }
            Expr::IfElse {
                condition,
                then,
                otherwise,
            } => {
                if self.eval(condition)?.is_truthy()? {
                    self.eval(then)
                } else {
                    self.eval(otherwise)
                }
            }
            Expr::Call {
                callee,
                args,
                kwargs,
            } => self.eval_call(callee, args, kwargs),
            Expr::Attr(object, name) => builtins::attribute(&self.eval(object)?, name),
            Expr::Index(container, index) => {
                let container = self.eval(container)?;
                let subscript = self.subscript(index)?;
                get_item(&container, subscript)
            }
            Expr::Slice { .. } => Err(syntax_error("invalid syntax")),
        }
    }

    fn eval_all(&mut self, exprs: &[Expr]) -> EvalResult<Vec<Value>> {
        exprs.iter().map(|e| self.eval(e)).collect()
    }

    fn lookup(&self, name: &str) -> EvalResult<Value> {
        if let Some(value) = self.ns.env.lookup(name) {
            return Ok(value.clone());
        }
        if let Some(builtin) = Builtin::global(name) {
            return Ok(Value::Builtin(builtin));
        }
        if is_exception_name(name) {
            return Ok(Value::ExceptionType(name.to_string()));
        }
        Err(undefined_variable(name))
    }

    fn subscript(&mut self, index: &Expr) -> EvalResult<Subscript> {
        match index {
            Expr::Slice { start, stop, step } => {
                let mut bound = |b: &Option<Box<Expr>>| -> EvalResult<Option<i64>> {
                    match b {
                        None => Ok(None),
                        Some(expr) => match self.eval(expr)? {
                            Value::None => Ok(None),
                            value => value.as_int().map(Some).ok_or_else(|| {
                                type_error(
                                    "slice indices must be integers or None or have an __index__ method",
                                )
                            }),
                        },
                    }
                };
                Ok(Subscript::Slice(bound(start)?, bound(stop)?, bound(step)?))
            }
            Expr::Tuple(items) => Ok(Subscript::Multi(
                items
                    .iter()
                    .map(|item| self.subscript(item))
                    .collect::<EvalResult<_>>()?,
            )),
            other => Ok(Subscript::Item(self.eval(other)?)),
        }
    }

    fn list_comprehension(
        &mut self,
        element: &Expr,
        target: &Target,
        iter: &Expr,
        condition: Option<&Expr>,
    ) -> EvalResult<Value> {
        let items = self.eval(iter)?.iterate()?;
        // The loop variable does not leak out of the comprehension.
        let mut names = Vec::new();
        target_names(target, &mut names);
        let saved: Vec<(String, Option<Value>)> = names
            .into_iter()
            .map(|name| {
                let previous = self.ns.env.lookup(&name).cloned();
                (name, previous)
            })
            .collect();
        let result = self.comprehend(element, target, items, condition);
        for (name, previous) in saved {
            match previous {
                Some(value) => self.ns.env.define(name, value),
                None => {
                    self.ns.env.remove(&name);
                }
            }
        }
        result
    }

    fn comprehend(
        &mut self,
        element: &Expr,
        target: &Target,
        items: Vec<Value>,
        condition: Option<&Expr>,
    ) -> EvalResult<Value> {
        let mut out = Vec::with_capacity(items.len());
        for item in items {
            self.assign(target, item)?;
            if let Some(condition) = condition {
                if !self.eval(condition)?.is_truthy()? {
                    continue;
                }
            }
            out.push(self.eval(element)?);
        }
        Ok(Value::List(out))
    }

    // === Calls ===

    fn eval_call(
        &mut self,
        callee: &Expr,
        args: &[Expr],
        kwargs: &[(String, Expr)],
    ) -> EvalResult<Value> {
        let args = self.eval_all(args)?;
        let kwargs = kwargs
            .iter()
            .map(|(name, expr)| Ok((name.clone(), self.eval(expr)?)))
            .collect::<EvalResult<Vec<_>>>()?;
        // `xs.append(v)` mutates the list bound to `xs`.
        if let Expr::Attr(receiver, method) = callee {
            if let (Expr::Name(name), true) = (receiver.as_ref(), builtins::mutates_list(method)) {
                if let Some(Value::List(items)) = self.ns.env.lookup_mut(name) {
                    for arg in &args {
                        within_nesting(arg, MAX_NESTING - 1)?;
                    }
                    if let Some(result) = builtins::mutate_list(items, method, args) {
                        return result;
                    }
                    return Err(no_attribute("list", method));
                }
            }
        }
        let callee = self.eval(callee)?;
        self.call_value(callee, args, &kwargs)
    }

    fn call_value(
        &mut self,
        callee: Value,
        args: Vec<Value>,
        kwargs: &[(String, Value)],
    ) -> EvalResult<Value> {
        match callee {
            Value::Builtin(builtin) => builtin.call(args, kwargs, &mut self.context()),
            Value::Method(receiver, name) => {
                builtins::call_method(&receiver, &name, args, kwargs, &mut self.context())
            }
            Value::Function(function) => self.call_function(&function, args, kwargs),
            Value::ExceptionType(kind) => Ok(Value::Exception {
                kind,
                message: args.first().map(Value::to_str).unwrap_or_default(),
            }),
            other => Err(not_callable(other.type_name())),
        }
    }

    fn call_function(
        &mut self,
        function: &Function,
        args: Vec<Value>,
        kwargs: &[(String, Value)],
    ) -> EvalResult<Value> {
        if self.depth >= self.recursion_limit {
            return Err(recursion_limit());
        }
        let def = &function.def;
        if args.len() > def.params.len() {
            return Err(wrong_arg_count(&def.name, def.params.len(), args.len()));
        }
        let mut bound: Vec<Option<Value>> = args.into_iter().map(Some).collect();
        bound.resize(def.params.len(), None);
        for (name, value) in kwargs {
            let Some(slot) = def.params.iter().position(|p| p == name) else {
                return Err(type_error(format!(
                    "{}() got an unexpected keyword argument '{name}'",
                    def.name
                )));
            };
            if bound[slot].is_some() {
                return Err(type_error(format!(
                    "{}() got multiple values for argument '{name}'",
                    def.name
                )));
            }
            bound[slot] = Some(value.clone());
        }
        let mut locals = Vec::with_capacity(bound.len());
        for ((param, value), default) in def.params.iter().zip(bound).zip(&function.defaults) {
            match value.or_else(|| default.clone()) {
                Some(value) => locals.push((param.clone(), value)),
                None => {
                    return Err(type_error(format!(
                        "{}() missing 1 required positional argument: '{param}'",
                        def.name
                    )))
                }
            }
        }

        self.ns.env.push_frame();
        for (param, value) in locals {
            self.ns.env.define(param, value);
        }
        let echo = std::mem::replace(&mut self.echo, false);
        self.depth += 1;
        let flow = self.exec_block(&def.body);
        self.depth -= 1;
        self.echo = echo;
        self.ns.env.pop_frame();

        match flow? {
            Flow::Return(value) => Ok(value),
            _ => Ok(Value::None),
        }
    }
}

enum ItemOp {
    Set(Value),
    Delete,
}

impl ItemOp {
    fn apply(self, container: &mut Value, subscript: Subscript) -> EvalResult<()> {
        match self {
            ItemOp::Set(value) => {
                within_nesting(&value, MAX_NESTING - 1)?;
                set_item(container, subscript, value)
            }
            ItemOp::Delete => delete_item(container, subscript),
        }
    }
}

/// Values nested past `limit` are refused before they are bound.
fn within_nesting(value: &Value, limit: usize) -> EvalResult<()> {
    if value.nests_deeper_than(limit) {
        Err(nesting_too_deep())
    } else {
        Ok(())
    }
}

fn is_exception_name(name: &str) -> bool {
    name == "Exception"
        || name.ends_with("Error")
        || name.ends_with("Warning")
        || name.ends_with("Exception")
}

/// The expression reading the current value of an assignment target.
fn target_expr(target: &Target) -> EvalResult<Expr> {
    match target {
        Target::Name(name) => Ok(Expr::Name(name.clone())),
        Target::Index(container, index) => Ok(Expr::Index(
            Box::new(container.clone()),
            Box::new(index.clone()),
        )),
        Target::Unpack(_) => Err(syntax_error(
            "illegal expression for augmented assignment",
        )),
    }
}

fn target_names(target: &Target, names: &mut Vec<String>) {
    match target {
        Target::Name(name) => names.push(name.clone()),
        Target::Index(..) => {}
        Target::Unpack(targets) => {
            for t in targets {
                target_names(t, names);
            }
        }
    }
}

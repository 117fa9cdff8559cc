//! Variable scoping for the evaluator.
//!
//! Module-level bindings live in `globals`, which persist across every
//! example of a doctest. A function call pushes a local frame; lookups try
//! the innermost frame and then the globals.

use rustc_hash::FxHashMap;

use crate::value::Value;

#[derive(Debug, Default)]
pub struct Environment {
    globals: FxHashMap<String, Value>,
    frames: Vec<FxHashMap<String, Value>>,
}

impl Environment {
    pub fn new() -> Self {
        Environment::default()
    }

    pub fn lookup(&self, name: &str) -> Option<&Value> {
        self.frames
            .last()
            .and_then(|frame| frame.get(name))
            .or_else(|| self.globals.get(name))
    }

    /// Bind `name` in the innermost scope.
    pub fn define(&mut self, name: impl Into<String>, value: Value) {
        let scope = self.frames.last_mut().unwrap_or(&mut self.globals);
        scope.insert(name.into(), value);
    }

    /// Mutable access to a binding in the innermost scope that has it.
    pub fn lookup_mut(&mut self, name: &str) -> Option<&mut Value> {
        if let Some(frame) = self.frames.last_mut() {
            if frame.contains_key(name) {
                return frame.get_mut(name);
            }
        }
        self.globals.get_mut(name)
    }

    pub fn remove(&mut self, name: &str) -> Option<Value> {
        let scope = self.frames.last_mut().unwrap_or(&mut self.globals);
        scope.remove(name)
    }

    pub fn push_frame(&mut self) {
        self.frames.push(FxHashMap::default());
    }

    pub fn pop_frame(&mut self) {
        self.frames.pop();
    }

    /// Number of active call frames.
    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    /// Names bound at module level, sorted.
    pub fn global_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.globals.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

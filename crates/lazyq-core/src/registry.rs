//! Named functions that textual lambdas and plain function-name callables
//! resolve against.

use std::collections::HashMap;
use std::fmt;

use crate::invocable::Invocable;

#[derive(Clone, Default)]
pub struct FunctionRegistry {
    functions: HashMap<String, Invocable>,
    statics: HashMap<String, Invocable>,
}

impl FunctionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry preloaded with the string, math and type helpers.
    pub fn with_builtins() -> Self {
        let mut reg = Self::new();
        crate::builtins::install(&mut reg);
        reg
    }

    /// Names are case-insensitive. Re-registering replaces the old entry.
    pub fn register(&mut self, name: &str, f: Invocable) {
        self.functions.insert(name.to_ascii_lowercase(), f);
    }

    pub fn register_static(&mut self, class: &str, method: &str, f: Invocable) {
        self.statics.insert(static_key(class, method), f);
    }

    pub fn get(&self, name: &str) -> Option<&Invocable> {
        self.functions.get(&name.to_ascii_lowercase())
    }

    pub fn get_static(&self, class: &str, method: &str) -> Option<&Invocable> {
        self.statics.get(&static_key(class, method))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn has_class(&self, class: &str) -> bool {
        let prefix = format!("{}::", class.to_ascii_lowercase());
        self.statics.keys().any(|k| k.starts_with(&prefix))
    }

    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.functions.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

fn static_key(class: &str, method: &str) -> String {
    format!("{}::{}", class, method).to_ascii_lowercase()
}

impl fmt::Debug for FunctionRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FunctionRegistry")
            .field("functions", &self.functions.len())
            .field("statics", &self.statics.len())
            .finish()
    }
}

use std::collections::HashMap;
use std::io::Write;
use std::rc::Rc;

use crate::{impls::class::Class, syntax::value::Value};

/// Flat name→value table for one execution scope.
///
/// Lexical nesting is realized by constructing a fresh `Closure` per call
/// frame, and every instance keeps its fields in a `Closure` of its own.
/// There is no parent link to search.
#[derive(Debug, Default)]
pub struct Closure {
    values: HashMap<String, Value>,
}

impl Closure {
    pub fn new() -> Self {
        Self {
            values: HashMap::new(),
        }
    }

    pub fn define(&mut self, name: impl Into<String>, value: Value) {
        self.values.insert(name.into(), value);
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }
}

/// Per-run capability bundle: the output stream that `print` and `str`
/// render into, plus the classes the program has defined so far, looked up
/// by name when an instance is created.
///
/// The stream is borrowed from the caller and never closed.
pub struct Context<'a> {
    output: &'a mut dyn Write,
    classes: HashMap<String, Rc<Class>>,
}

impl<'a> Context<'a> {
    pub fn new(output: &'a mut dyn Write) -> Self {
        Self {
            output,
            classes: HashMap::new(),
        }
    }

    pub fn output(&mut self) -> &mut dyn Write {
        &mut *self.output
    }

    pub fn register_class(&mut self, class: Rc<Class>) {
        self.classes.insert(class.name().to_string(), class);
    }

    pub fn get_class(&self, name: &str) -> Option<&Rc<Class>> {
        self.classes.get(name)
    }
}

use std::cell::RefCell;
use std::rc::Rc;

use crate::{
    environment::Context,
    impls::class::{Class, Instance},
    interpreter::Exception,
};

pub type InstanceRef = Rc<RefCell<Instance>>;

/// Represents every value the language can produce at runtime.
///
/// `None` doubles as the "empty" result of statements and of methods that
/// never return. Classes and instances are shared handles; cloning a `Value`
/// never deep-copies an object.
#[derive(Debug, Clone)]
pub enum Value {
    None,
    Number(i64),
    String(String),
    Bool(bool),
    Class(Rc<Class>),
    Instance(InstanceRef),
}

impl Value {
    /// Truthiness: non-zero numbers, the Bool `True` and non-empty strings.
    /// Everything else, classes and instances included, is false.
    pub fn is_true(&self) -> bool {
        match self {
            Value::Number(value) => *value != 0,
            Value::Bool(value) => *value,
            Value::String(value) => !value.is_empty(),
            _ => false,
        }
    }

    pub fn as_instance(&self) -> Option<&InstanceRef> {
        match self {
            Value::Instance(instance) => Some(instance),
            _ => None,
        }
    }

    /// The printable form of the value, as `print` shows it. Instances
    /// dispatch to their `__str__` method, which may run arbitrary code
    /// against the given context.
    pub fn render(&self, context: &mut Context) -> Result<String, Exception> {
        match self {
            Value::None => Ok("None".to_string()),
            Value::Number(value) => Ok(value.to_string()),
            Value::String(value) => Ok(value.clone()),
            Value::Bool(true) => Ok("True".to_string()),
            Value::Bool(false) => Ok("False".to_string()),
            Value::Class(class) => Ok(format!("Class {}", class.name())),
            Value::Instance(instance) => Instance::render(instance, context),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truthiness_table() {
        assert!(!Value::Number(0).is_true());
        assert!(Value::Number(7).is_true());
        assert!(Value::Number(-1).is_true());
        assert!(!Value::String(String::new()).is_true());
        assert!(Value::String("x".to_string()).is_true());
        assert!(Value::Bool(true).is_true());
        assert!(!Value::Bool(false).is_true());
        assert!(!Value::None.is_true());

        let class = Rc::new(Class::new("C".to_string(), vec![], None));
        assert!(!Value::Class(Rc::clone(&class)).is_true());
        assert!(!Value::Instance(Instance::new(class)).is_true());
    }

    #[test]
    fn primitive_rendering() {
        let mut output = Vec::new();
        let mut context = Context::new(&mut output);
        assert_eq!(Value::None.render(&mut context).unwrap(), "None");
        assert_eq!(Value::Number(-3).render(&mut context).unwrap(), "-3");
        assert_eq!(Value::Bool(true).render(&mut context).unwrap(), "True");
        assert_eq!(Value::Bool(false).render(&mut context).unwrap(), "False");
        assert_eq!(
            Value::String("hi".to_string()).render(&mut context).unwrap(),
            "hi"
        );

        let class = Rc::new(Class::new("C".to_string(), vec![], None));
        assert_eq!(
            Value::Class(class).render(&mut context).unwrap(),
            "Class C"
        );
    }
}

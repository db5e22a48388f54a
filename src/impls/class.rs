use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::{
    environment::{Closure, Context},
    error::RuntimeError,
    interpreter::{Exception, Execute},
    syntax::{
        stmt::Stmt,
        value::{InstanceRef, Value},
    },
    utils::id_factory::{new_uid, Id},
};

type Result<T> = std::result::Result<T, Exception>;

const STR_METHOD: &str = "__str__";

/// A method attached to a class: its name, the formal parameter list exactly
/// as written in the source (a leading `self` included), and the shared body.
#[derive(Debug, Clone)]
pub struct Method {
    pub name: String,
    pub formal_params: Vec<String>,
    pub body: Rc<Stmt>,
}

impl Method {
    /// Declared parameter count minus the leading `self`, if any.
    pub fn effective_arity(&self) -> usize {
        self.formal_params.len() - usize::from(self.takes_self())
    }

    fn takes_self(&self) -> bool {
        self.formal_params.first().map(String::as_str) == Some("self")
    }

    fn bound_params(&self) -> &[String] {
        if self.takes_self() {
            &self.formal_params[1..]
        } else {
            &self.formal_params
        }
    }
}

/// A class: an ordered method list and an optional parent. Parent links are
/// shared handles and always point at an already-built class, so the graph
/// stays acyclic.
#[derive(Debug)]
pub struct Class {
    name: String,
    methods: Vec<Method>,
    parent: Option<Rc<Class>>,
}

impl Class {
    pub fn new(name: String, methods: Vec<Method>, parent: Option<Rc<Class>>) -> Self {
        Self {
            name,
            methods,
            parent,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// First method up the parent chain whose name matches and whose
    /// effective arity equals `argument_count`.
    pub fn get_method(&self, name: &str, argument_count: usize) -> Option<&Method> {
        let mut class = Some(self);
        while let Some(current) = class {
            for method in &current.methods {
                if method.name == name && method.effective_arity() == argument_count {
                    return Some(method);
                }
            }
            class = current.parent.as_deref();
        }
        None
    }

    /// First method up the parent chain matching `name` regardless of arity.
    /// Used for the `__str__` lookup when rendering.
    pub fn method_named(&self, name: &str) -> Option<&Method> {
        let mut class = Some(self);
        while let Some(current) = class {
            for method in &current.methods {
                if method.name == name {
                    return Some(method);
                }
            }
            class = current.parent.as_deref();
        }
        None
    }

    pub fn has_method(&self, name: &str, argument_count: usize) -> bool {
        self.get_method(name, argument_count).is_some()
    }
}

/// A single object: its class, a field table, and a unique id that the
/// default rendering shows.
pub struct Instance {
    class: Rc<Class>,
    fields: Closure,
    id: Id,
}

impl Instance {
    pub fn new(class: Rc<Class>) -> InstanceRef {
        Rc::new(RefCell::new(Self {
            class,
            fields: Closure::new(),
            id: new_uid(),
        }))
    }

    pub fn class(&self) -> &Rc<Class> {
        &self.class
    }

    pub fn fields(&self) -> &Closure {
        &self.fields
    }

    pub fn fields_mut(&mut self) -> &mut Closure {
        &mut self.fields
    }

    pub fn has_method(&self, name: &str, argument_count: usize) -> bool {
        self.class.has_method(name, argument_count)
    }

    /// Calls `name` on the instance. A fresh closure binds the actuals to
    /// the non-`self` formals, then `self` is seeded with a shared handle to
    /// the receiver unless the method already bound that name.
    pub fn call(
        this: &InstanceRef,
        name: &str,
        actual_args: Vec<Value>,
        context: &mut Context,
    ) -> Result<Value> {
        let class = Rc::clone(this.borrow().class());
        let method = match class.get_method(name, actual_args.len()) {
            Some(method) => method,
            None => {
                return Err(RuntimeError::MethodNotFound {
                    name: name.to_string(),
                    args: actual_args.len(),
                }
                .into())
            }
        };

        let mut closure = Closure::new();
        for (formal, actual) in method.bound_params().iter().zip(actual_args) {
            closure.define(formal.clone(), actual);
        }
        if !closure.contains("self") {
            closure.define("self", Value::Instance(Rc::clone(this)));
        }

        method.body.execute(&mut closure, context)
    }

    /// The printable form: `__str__` when the class hierarchy provides one,
    /// executed against the instance's own field table, else an
    /// address-like tag.
    ///
    /// Running the body against the fields means `__str__` may refer to
    /// fields by bare name; an empty result renders as the empty string.
    pub fn render(this: &InstanceRef, context: &mut Context) -> Result<String> {
        let class = Rc::clone(this.borrow().class());
        match class.method_named(STR_METHOD) {
            Some(method) => {
                let body = Rc::clone(&method.body);
                let result = {
                    let mut instance = this.borrow_mut();
                    body.execute(instance.fields_mut(), context)?
                };
                match result {
                    Value::None => Ok(String::new()),
                    value => value.render(context),
                }
            }
            None => {
                let instance = this.borrow();
                Ok(format!(
                    "<{} object #{}>",
                    instance.class.name(),
                    instance.id.get()
                ))
            }
        }
    }
}

impl fmt::Debug for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Instance")
            .field("class", &self.class.name())
            .field("id", &self.id.get())
            .finish()
    }
}

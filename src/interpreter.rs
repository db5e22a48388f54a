use std::rc::Rc;

use crate::{
    environment::{Closure, Context},
    error::RuntimeError,
    impls::{class::Instance, ops},
    syntax::{
        expr::{Expr, Literal},
        stmt::Stmt,
        value::{InstanceRef, Value},
    },
};

type Result<T> = std::result::Result<T, Exception>;

const INIT_METHOD: &str = "__init__";

/// In-band signal threaded through every `execute`.
///
/// `Return` unwinds to the nearest `MethodBody`; `RuntimeError` unwinds all
/// the way out to the caller.
#[derive(Debug)]
pub enum Exception {
    RuntimeError(RuntimeError),
    Return(Value),
}

impl From<RuntimeError> for Exception {
    fn from(error: RuntimeError) -> Self {
        Exception::RuntimeError(error)
    }
}

impl From<std::io::Error> for Exception {
    fn from(error: std::io::Error) -> Self {
        Exception::RuntimeError(RuntimeError::Io(error))
    }
}

/// Tree-walking evaluation: every node reads and writes its frame's closure
/// and emits through the context.
pub trait Execute {
    fn execute(&self, closure: &mut Closure, context: &mut Context) -> Result<Value>;
}

/// Runs a program root. A return signal that escapes every method body is a
/// runtime error here.
pub fn interpret(
    program: &Stmt,
    closure: &mut Closure,
    context: &mut Context,
) -> std::result::Result<Value, RuntimeError> {
    match program.execute(closure, context) {
        Ok(value) => Ok(value),
        Err(Exception::RuntimeError(error)) => Err(error),
        Err(Exception::Return(_)) => Err(RuntimeError::ReturnOutsideMethod),
    }
}

impl Execute for Expr {
    fn execute(&self, closure: &mut Closure, context: &mut Context) -> Result<Value> {
        match self {
            Expr::Literal { value } => Ok(match value {
                Literal::Number(number) => Value::Number(*number),
                Literal::String(string) => Value::String(string.clone()),
                Literal::Bool(boolean) => Value::Bool(*boolean),
                Literal::None => Value::None,
            }),
            Expr::Variable { ids } => resolve_variable(ids, closure),
            Expr::Stringify { value } => {
                let value = value.execute(closure, context)?;
                Ok(Value::String(value.render(context)?))
            }
            Expr::Add { left, right } => {
                let lhs = left.execute(closure, context)?;
                let rhs = right.execute(closure, context)?;
                ops::add(&lhs, &rhs, context)
            }
            Expr::Sub { left, right } => {
                let lhs = left.execute(closure, context)?;
                let rhs = right.execute(closure, context)?;
                ops::sub(&lhs, &rhs)
            }
            Expr::Mult { left, right } => {
                let lhs = left.execute(closure, context)?;
                let rhs = right.execute(closure, context)?;
                ops::mult(&lhs, &rhs)
            }
            Expr::Div { left, right } => {
                let lhs = left.execute(closure, context)?;
                let rhs = right.execute(closure, context)?;
                ops::div(&lhs, &rhs)
            }
            Expr::Or { left, right } => {
                let lhs = left.execute(closure, context)?;
                let rhs = right.execute(closure, context)?;
                Ok(Value::Bool(is_true_bool(&lhs) || is_true_bool(&rhs)))
            }
            Expr::And { left, right } => {
                let lhs = left.execute(closure, context)?;
                let rhs = right.execute(closure, context)?;
                Ok(Value::Bool(is_true_bool(&lhs) && is_true_bool(&rhs)))
            }
            Expr::Not { value } => match value.execute(closure, context)? {
                Value::Bool(boolean) => Ok(Value::Bool(!boolean)),
                _ => Err(RuntimeError::NotExpectsBool.into()),
            },
            Expr::Comparison { cmp, left, right } => {
                let lhs = left.execute(closure, context)?;
                let rhs = right.execute(closure, context)?;
                Ok(Value::Bool(cmp.apply(&lhs, &rhs, context)?))
            }
            Expr::MethodCall {
                object,
                method,
                args,
            } => {
                let receiver = object.execute(closure, context)?;
                if let Value::Instance(instance) = &receiver {
                    if instance.borrow().has_method(method, args.len()) {
                        let actuals = evaluate_args(args, closure, context)?;
                        return Instance::call(instance, method, actuals, context);
                    }
                }
                Ok(Value::None)
            }
            Expr::NewInstance { class_name, args } => {
                let class = match context.get_class(class_name) {
                    Some(class) => Rc::clone(class),
                    None => return Err(RuntimeError::UnknownClass(class_name.clone()).into()),
                };
                let instance = Instance::new(Rc::clone(&class));
                if class.has_method(INIT_METHOD, args.len()) {
                    let actuals = evaluate_args(args, closure, context)?;
                    Instance::call(&instance, INIT_METHOD, actuals, context)?;
                }
                Ok(Value::Instance(instance))
            }
        }
    }
}

impl Execute for Stmt {
    fn execute(&self, closure: &mut Closure, context: &mut Context) -> Result<Value> {
        match self {
            Stmt::Expression(expr) => expr.execute(closure, context),
            Stmt::Assignment { name, value } => {
                let value = value.execute(closure, context)?;
                closure.define(name.clone(), value.clone());
                Ok(value)
            }
            Stmt::FieldAssignment {
                object,
                field,
                value,
            } => {
                let object = object.execute(closure, context)?;
                let instance = match object.as_instance() {
                    Some(instance) => Rc::clone(instance),
                    None => return Err(RuntimeError::FieldsOnNonInstance.into()),
                };
                let value = value.execute(closure, context)?;
                instance
                    .borrow_mut()
                    .fields_mut()
                    .define(field.clone(), value.clone());
                Ok(value)
            }
            Stmt::Print { args } => {
                for (index, arg) in args.iter().enumerate() {
                    let value = arg.execute(closure, context)?;
                    let text = value.render(context)?;
                    if index > 0 {
                        write!(context.output(), " ")?;
                    }
                    write!(context.output(), "{text}")?;
                }
                writeln!(context.output())?;
                Ok(Value::None)
            }
            Stmt::Return { value } => Err(Exception::Return(value.execute(closure, context)?)),
            Stmt::ClassDefinition { class } => {
                context.register_class(Rc::clone(class));
                let value = Value::Class(Rc::clone(class));
                closure.define(class.name().to_string(), value.clone());
                Ok(value)
            }
            Stmt::If {
                condition,
                then_branch,
                else_branch,
            } => {
                let condition = condition.execute(closure, context)?;
                if condition.is_true() {
                    then_branch.execute(closure, context)
                } else if let Some(else_branch) = else_branch {
                    else_branch.execute(closure, context)
                } else {
                    Ok(Value::None)
                }
            }
            Stmt::Compound { statements } => {
                for statement in statements {
                    statement.execute(closure, context)?;
                }
                Ok(Value::None)
            }
            Stmt::MethodBody { body } => match body.execute(closure, context) {
                Ok(_) => Ok(Value::None),
                Err(Exception::Return(value)) => Ok(value),
                Err(error) => Err(error),
            },
        }
    }
}

// Only the Bool `True` counts for `and`/`or`.
fn is_true_bool(value: &Value) -> bool {
    matches!(value, Value::Bool(true))
}

fn evaluate_args(args: &[Expr], closure: &mut Closure, context: &mut Context) -> Result<Vec<Value>> {
    let mut actuals = Vec::with_capacity(args.len());
    for arg in args {
        actuals.push(arg.execute(closure, context)?);
    }
    Ok(actuals)
}

/// Walks a dotted name left to right. Intermediate segments step into
/// instance field tables; a `self` segment missing from the current scope is
/// skipped, so bodies running directly against a field table still resolve
/// `self.x`.
fn resolve_variable(ids: &[String], closure: &Closure) -> Result<Value> {
    let mut scope: Option<InstanceRef> = None;

    let last = ids.len() - 1;
    for id in &ids[..last] {
        let value = match lookup(closure, &scope, id) {
            Some(value) => value,
            None if id == "self" => continue,
            None => return Err(RuntimeError::UnknownVariable(id.clone()).into()),
        };
        match value {
            Value::Instance(instance) => scope = Some(instance),
            _ => return Err(RuntimeError::NotAnInstance(id.clone()).into()),
        }
    }

    match lookup(closure, &scope, &ids[last]) {
        Some(value) => Ok(value),
        None => Err(RuntimeError::UnknownVariable(ids[last].clone()).into()),
    }
}

fn lookup(closure: &Closure, scope: &Option<InstanceRef>, name: &str) -> Option<Value> {
    match scope {
        Some(instance) => instance.borrow().fields().get(name).cloned(),
        None => closure.get(name).cloned(),
    }
}

use crate::{
    environment::Context,
    error::RuntimeError,
    impls::class::Instance,
    interpreter::Exception,
    syntax::value::{InstanceRef, Value},
};

type Result<T> = std::result::Result<T, Exception>;

const EQ_METHOD: &str = "__eq__";
const LT_METHOD: &str = "__lt__";
const ADD_METHOD: &str = "__add__";

/// Comparison operator selected at parse time and applied by
/// `Expr::Comparison`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparator {
    Equal,
    NotEqual,
    Less,
    Greater,
    LessOrEqual,
    GreaterOrEqual,
}

impl Comparator {
    pub fn apply(self, lhs: &Value, rhs: &Value, context: &mut Context) -> Result<bool> {
        match self {
            Comparator::Equal => equal(lhs, rhs, context),
            Comparator::NotEqual => not_equal(lhs, rhs, context),
            Comparator::Less => less(lhs, rhs, context),
            Comparator::Greater => greater(lhs, rhs, context),
            Comparator::LessOrEqual => less_or_equal(lhs, rhs, context),
            Comparator::GreaterOrEqual => greater_or_equal(lhs, rhs, context),
        }
    }
}

/// Value equality. `None` only equals `None`, primitives compare within the
/// same variant, and an instance on the left delegates to its `__eq__`.
/// Every other pairing is an error.
pub fn equal(lhs: &Value, rhs: &Value, context: &mut Context) -> Result<bool> {
    match (lhs, rhs) {
        (Value::None, Value::None) => Ok(true),
        (Value::Number(left), Value::Number(right)) => Ok(left == right),
        (Value::String(left), Value::String(right)) => Ok(left == right),
        (Value::Bool(left), Value::Bool(right)) => Ok(left == right),
        (Value::Instance(instance), _) if instance.borrow().has_method(EQ_METHOD, 1) => {
            dunder_bool(instance, EQ_METHOD, rhs, context)
        }
        _ => Err(RuntimeError::IncomparableEquality.into()),
    }
}

/// Natural order for same-variant primitives; an instance on the left
/// delegates to its `__lt__`.
pub fn less(lhs: &Value, rhs: &Value, context: &mut Context) -> Result<bool> {
    match (lhs, rhs) {
        (Value::Number(left), Value::Number(right)) => Ok(left < right),
        (Value::String(left), Value::String(right)) => Ok(left < right),
        (Value::Bool(left), Value::Bool(right)) => Ok(left < right),
        (Value::Instance(instance), _) if instance.borrow().has_method(LT_METHOD, 1) => {
            dunder_bool(instance, LT_METHOD, rhs, context)
        }
        _ => Err(RuntimeError::IncomparableOrdering.into()),
    }
}

pub fn not_equal(lhs: &Value, rhs: &Value, context: &mut Context) -> Result<bool> {
    Ok(!equal(lhs, rhs, context)?)
}

pub fn greater(lhs: &Value, rhs: &Value, context: &mut Context) -> Result<bool> {
    Ok(!less(lhs, rhs, context)? && !equal(lhs, rhs, context)?)
}

pub fn less_or_equal(lhs: &Value, rhs: &Value, context: &mut Context) -> Result<bool> {
    Ok(less(lhs, rhs, context)? || equal(lhs, rhs, context)?)
}

pub fn greater_or_equal(lhs: &Value, rhs: &Value, context: &mut Context) -> Result<bool> {
    Ok(!less(lhs, rhs, context)?)
}

fn dunder_bool(
    instance: &InstanceRef,
    name: &'static str,
    rhs: &Value,
    context: &mut Context,
) -> Result<bool> {
    match Instance::call(instance, name, vec![rhs.clone()], context)? {
        Value::Bool(value) => Ok(value),
        _ => Err(RuntimeError::DunderMustReturnBool(name).into()),
    }
}

/// `+`: numbers add, strings concatenate, an instance on the left delegates
/// to its `__add__`.
pub fn add(lhs: &Value, rhs: &Value, context: &mut Context) -> Result<Value> {
    match (lhs, rhs) {
        (Value::Number(left), Value::Number(right)) => Ok(Value::Number(left + right)),
        (Value::String(left), Value::String(right)) => Ok(Value::String(format!("{left}{right}"))),
        (Value::Instance(instance), _) if instance.borrow().has_method(ADD_METHOD, 1) => {
            Instance::call(instance, ADD_METHOD, vec![rhs.clone()], context)
        }
        _ => Err(RuntimeError::UnsupportedOperands('+').into()),
    }
}

pub fn sub(lhs: &Value, rhs: &Value) -> Result<Value> {
    match (lhs, rhs) {
        (Value::Number(left), Value::Number(right)) => Ok(Value::Number(left - right)),
        _ => Err(RuntimeError::UnsupportedOperands('-').into()),
    }
}

pub fn mult(lhs: &Value, rhs: &Value) -> Result<Value> {
    match (lhs, rhs) {
        (Value::Number(left), Value::Number(right)) => Ok(Value::Number(left * right)),
        _ => Err(RuntimeError::UnsupportedOperands('*').into()),
    }
}

/// Integer division, truncating toward zero. A zero divisor is an error.
pub fn div(lhs: &Value, rhs: &Value) -> Result<Value> {
    match (lhs, rhs) {
        (Value::Number(_), Value::Number(0)) => Err(RuntimeError::DivisionByZero.into()),
        (Value::Number(left), Value::Number(right)) => Ok(Value::Number(left / right)),
        _ => Err(RuntimeError::UnsupportedOperands('/').into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_context<T>(f: impl FnOnce(&mut Context) -> T) -> T {
        let mut output = Vec::new();
        let mut context = Context::new(&mut output);
        f(&mut context)
    }

    #[test]
    fn none_equals_only_none() {
        with_context(|ctx| {
            assert!(equal(&Value::None, &Value::None, ctx).unwrap());
            assert!(equal(&Value::None, &Value::Number(0), ctx).is_err());
        });
    }

    #[test]
    fn primitives_compare_within_their_variant() {
        with_context(|ctx| {
            assert!(equal(&Value::Number(3), &Value::Number(3), ctx).unwrap());
            assert!(!equal(&Value::Number(3), &Value::Number(4), ctx).unwrap());
            assert!(equal(
                &Value::String("a".to_string()),
                &Value::String("a".to_string()),
                ctx
            )
            .unwrap());
            assert!(less(&Value::Number(1), &Value::Number(2), ctx).unwrap());
            assert!(less(
                &Value::String("abc".to_string()),
                &Value::String("abd".to_string()),
                ctx
            )
            .unwrap());
            assert!(less(&Value::Bool(false), &Value::Bool(true), ctx).unwrap());
            // Mixed variants never coerce.
            assert!(equal(&Value::Number(1), &Value::String("1".to_string()), ctx).is_err());
            assert!(less(&Value::Number(1), &Value::Bool(true), ctx).is_err());
        });
    }

    #[test]
    fn derived_comparators_match_their_definitions() {
        with_context(|ctx| {
            let pairs = [
                (Value::Number(1), Value::Number(2)),
                (Value::Number(2), Value::Number(2)),
                (Value::Number(3), Value::Number(2)),
                (Value::String("a".to_string()), Value::String("b".to_string())),
                (Value::Bool(false), Value::Bool(false)),
            ];
            for (a, b) in &pairs {
                let eq = equal(a, b, ctx).unwrap();
                let lt = less(a, b, ctx).unwrap();
                assert_eq!(not_equal(a, b, ctx).unwrap(), !eq);
                assert_eq!(greater(a, b, ctx).unwrap(), !lt && !eq);
                assert_eq!(less_or_equal(a, b, ctx).unwrap(), lt || eq);
                assert_eq!(greater_or_equal(a, b, ctx).unwrap(), !lt);
            }
        });
    }

    #[test]
    fn add_concatenates_strings_and_sums_numbers() {
        with_context(|ctx| {
            let sum = add(&Value::Number(2), &Value::Number(3), ctx).unwrap();
            assert!(matches!(sum, Value::Number(5)));

            let joined = add(
                &Value::String("he".to_string()),
                &Value::String("llo".to_string()),
                ctx,
            )
            .unwrap();
            assert!(matches!(joined, Value::String(s) if s == "hello"));

            assert!(add(&Value::String("a".to_string()), &Value::Number(1), ctx).is_err());
        });
    }

    #[test]
    fn arithmetic_is_numbers_only() {
        let a = Value::String("a".to_string());
        let b = Value::String("b".to_string());
        assert!(sub(&a, &b).is_err());
        assert!(mult(&a, &b).is_err());
        assert!(div(&a, &b).is_err());
    }

    #[test]
    fn division_truncates_toward_zero_and_rejects_zero() {
        assert!(matches!(
            div(&Value::Number(7), &Value::Number(2)),
            Ok(Value::Number(3))
        ));
        assert!(matches!(
            div(&Value::Number(-7), &Value::Number(2)),
            Ok(Value::Number(-3))
        ));
        assert!(matches!(
            div(&Value::Number(1), &Value::Number(0)),
            Err(Exception::RuntimeError(RuntimeError::DivisionByZero))
        ));
    }
}

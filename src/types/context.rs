use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use super::error::EvalError;
use super::value::Value;

type NativeFn = fn(&[Value]) -> Result<Value, EvalError>;
type SharedFn = Arc<dyn Fn(&[Value]) -> Result<Value, EvalError> + Send + Sync>;

/// A function callable from conditions, with a fixed arity.
///
/// The evaluator checks the argument count against [`arity()`](Self::arity)
/// before evaluating any argument.
#[derive(Clone)]
pub struct Function {
    arity: usize,
    body: Body,
}

#[derive(Clone)]
enum Body {
    Native(NativeFn),
    Shared(SharedFn),
}

impl Function {
    /// Wrap a closure as a condition function.
    pub fn new(
        arity: usize,
        body: impl Fn(&[Value]) -> Result<Value, EvalError> + Send + Sync + 'static,
    ) -> Self {
        Self {
            arity,
            body: Body::Shared(Arc::new(body)),
        }
    }

    pub(crate) const fn native(arity: usize, body: NativeFn) -> Self {
        Self {
            arity,
            body: Body::Native(body),
        }
    }

    #[must_use]
    pub fn arity(&self) -> usize {
        self.arity
    }

    /// Invoke the function with already-evaluated arguments.
    ///
    /// # Errors
    ///
    /// Whatever the function body reports, typically
    /// [`EvalError::TypeMismatch`] for arguments of the wrong kind.
    pub fn call(&self, args: &[Value]) -> Result<Value, EvalError> {
        match &self.body {
            Body::Native(f) => f(args),
            Body::Shared(f) => f(args),
        }
    }
}

impl fmt::Debug for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Function")
            .field("arity", &self.arity)
            .finish_non_exhaustive()
    }
}

/// Source of variables and functions for condition evaluation.
///
/// Variables are looked up by their full dotted path. Implementations must
/// not fall back to a default for unknown paths; returning `None` makes the
/// evaluator report [`EvalError::UnknownVariable`].
pub trait Resolver {
    fn variable(&self, path: &str) -> Option<&Value>;

    /// Look up a function by name. Defaults to the builtin set.
    fn function(&self, name: &str) -> Option<&Function> {
        crate::builtins::lookup(name)
    }
}

/// Read-only evaluation context keyed by full dotted paths such as
/// `"order.total"`.
///
/// Built fresh by the host for each evaluation. Builtin functions
/// (`contains`, `length`, `starts_with`, `ends_with`) are always available;
/// extra functions can be registered with [`with_function`](Self::with_function)
/// and shadow builtins of the same name.
#[derive(Debug, Clone, Default)]
pub struct Context {
    values: HashMap<String, Value>,
    functions: HashMap<String, Function>,
}

impl Context {
    /// Create an empty context.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the value at a dotted path.
    #[must_use]
    pub fn set(mut self, path: &str, value: impl Into<Value>) -> Self {
        self.insert(path, value);
        self
    }

    /// Set the value at a dotted path (mutable reference version).
    pub fn insert(&mut self, path: &str, value: impl Into<Value>) {
        self.values.insert(path.to_owned(), value.into());
    }

    /// Look up a value by its full dotted path.
    #[must_use]
    pub fn get(&self, path: &str) -> Option<&Value> {
        self.values.get(path)
    }

    /// Register a function callable from conditions.
    #[must_use]
    pub fn with_function(mut self, name: &str, function: Function) -> Self {
        self.functions.insert(name.to_owned(), function);
        self
    }
}

impl Resolver for Context {
    fn variable(&self, path: &str) -> Option<&Value> {
        self.values.get(path)
    }

    fn function(&self, name: &str) -> Option<&Function> {
        self.functions
            .get(name)
            .or_else(|| crate::builtins::lookup(name))
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use super::*;

    #[test]
    fn set_and_get_dotted_path() {
        let ctx = Context::new().set("order.total", 300_i64);
        assert_eq!(ctx.get("order.total"), Some(&Value::Number(Decimal::from(300))));
    }

    #[test]
    fn prefix_of_a_path_is_not_a_value() {
        let ctx = Context::new().set("user.is_vip", true);
        assert_eq!(ctx.get("user"), None);
        assert_eq!(ctx.variable("user.is_vi"), None);
    }

    #[test]
    fn overwrite_value() {
        let ctx = Context::new().set("score", 10_i64).set("score", 20_i64);
        assert_eq!(ctx.get("score"), Some(&Value::from(20_i64)));
    }

    #[test]
    fn insert_mutable_ref() {
        let mut ctx = Context::new();
        ctx.insert("user.is_new", true);
        assert_eq!(ctx.get("user.is_new"), Some(&Value::Bool(true)));
    }

    #[test]
    fn builtins_resolve_by_default() {
        let ctx = Context::new();
        assert_eq!(ctx.function("contains").map(Function::arity), Some(2));
        assert_eq!(ctx.function("length").map(Function::arity), Some(1));
        assert!(ctx.function("nope").is_none());
    }

    #[test]
    fn registered_function_shadows_builtin() {
        let ctx = Context::new().with_function(
            "length",
            Function::new(1, |_args| Ok(Value::from(99_i64))),
        );
        let length = ctx.function("length").unwrap();
        assert_eq!(length.call(&[Value::from("ab")]), Ok(Value::from(99_i64)));
    }
}

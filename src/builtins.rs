use rust_decimal::Decimal;

use crate::{EvalError, Function, Value};

static BUILTINS: [(&str, Function); 4] = [
    ("contains", Function::native(2, contains)),
    ("length", Function::native(1, length)),
    ("starts_with", Function::native(2, starts_with)),
    ("ends_with", Function::native(2, ends_with)),
];

pub(crate) fn lookup(name: &str) -> Option<&'static Function> {
    BUILTINS
        .iter()
        .find(|(builtin, _)| *builtin == name)
        .map(|(_, function)| function)
}

fn arg_count(function: &str, expected: usize, args: &[Value]) -> EvalError {
    EvalError::WrongArgCount {
        function: function.to_owned(),
        expected,
        found: args.len(),
    }
}

fn mismatch(function: &str, expected: &str, found: &Value) -> EvalError {
    EvalError::TypeMismatch {
        operation: function.to_owned(),
        expected: expected.to_owned(),
        found: found.kind().to_owned(),
    }
}

/// `contains(list, item)` or `contains(string, substring)`.
fn contains(args: &[Value]) -> Result<Value, EvalError> {
    let [haystack, needle] = args else {
        return Err(arg_count("contains", 2, args));
    };
    match (haystack, needle) {
        (Value::List(items), needle) => Ok(Value::Bool(items.contains(needle))),
        (Value::String(haystack), Value::String(needle)) => {
            Ok(Value::Bool(haystack.contains(needle.as_str())))
        }
        (Value::String(_), other) => Err(mismatch("contains", "string", other)),
        (other, _) => Err(mismatch("contains", "list or string", other)),
    }
}

/// Element count of a list, or character count of a string.
fn length(args: &[Value]) -> Result<Value, EvalError> {
    let [value] = args else {
        return Err(arg_count("length", 1, args));
    };
    match value {
        Value::List(items) => Ok(Value::Number(Decimal::from(items.len()))),
        Value::String(s) => Ok(Value::Number(Decimal::from(s.chars().count()))),
        other => Err(mismatch("length", "list or string", other)),
    }
}

fn starts_with(args: &[Value]) -> Result<Value, EvalError> {
    let (s, prefix) = two_strings("starts_with", args)?;
    Ok(Value::Bool(s.starts_with(prefix)))
}

fn ends_with(args: &[Value]) -> Result<Value, EvalError> {
    let (s, suffix) = two_strings("ends_with", args)?;
    Ok(Value::Bool(s.ends_with(suffix)))
}

fn two_strings<'a>(function: &str, args: &'a [Value]) -> Result<(&'a str, &'a str), EvalError> {
    let [first, second] = args else {
        return Err(arg_count(function, 2, args));
    };
    match (first, second) {
        (Value::String(a), Value::String(b)) => Ok((a, b)),
        (Value::String(_), other) | (other, _) => Err(mismatch(function, "string", other)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn call(name: &str, args: &[Value]) -> Result<Value, EvalError> {
        lookup(name).unwrap().call(args)
    }

    #[test]
    fn contains_list() {
        let tags = Value::from(vec!["vip", "beta"]);
        assert_eq!(
            call("contains", &[tags.clone(), Value::from("vip")]),
            Ok(Value::Bool(true))
        );
        assert_eq!(
            call("contains", &[tags, Value::from(1_i64)]),
            Ok(Value::Bool(false))
        );
    }

    #[test]
    fn contains_substring() {
        assert_eq!(
            call("contains", &[Value::from("spring-sale"), Value::from("sale")]),
            Ok(Value::Bool(true))
        );
    }

    #[test]
    fn contains_rejects_numbers() {
        assert!(matches!(
            call("contains", &[Value::from(5_i64), Value::from(5_i64)]),
            Err(EvalError::TypeMismatch { found, .. }) if found == "number"
        ));
    }

    #[test]
    fn length_of_list_and_string() {
        assert_eq!(
            call("length", &[Value::from(vec![1_i64, 2, 3])]),
            Ok(Value::from(3_i64))
        );
        assert_eq!(call("length", &[Value::from("héllo")]), Ok(Value::from(5_i64)));
        assert!(call("length", &[Value::Bool(true)]).is_err());
    }

    #[test]
    fn prefix_and_suffix() {
        let code = Value::from("SPRING24");
        assert_eq!(
            call("starts_with", &[code.clone(), Value::from("SPRING")]),
            Ok(Value::Bool(true))
        );
        assert_eq!(
            call("ends_with", &[code, Value::from("23")]),
            Ok(Value::Bool(false))
        );
    }

    #[test]
    fn direct_call_with_wrong_count_is_an_error() {
        assert_eq!(
            call("contains", &[Value::from("x")]),
            Err(EvalError::WrongArgCount {
                function: "contains".into(),
                expected: 2,
                found: 1,
            })
        );
    }

    #[test]
    fn builtin_arities() {
        assert_eq!(lookup("contains").map(Function::arity), Some(2));
        assert_eq!(lookup("ends_with").map(Function::arity), Some(2));
        assert!(lookup("sum").is_none());
    }
}

use std::collections::HashMap;
use std::rc::Rc;

use crate::object::{BuiltinFn, EvaluationError, Object};

pub type ExitHandler = Rc<dyn Fn(i32)>;

/// The fixed table of host-provided functions. It is built once, owned by the
/// evaluator and consulted only after the whole environment chain misses, so
/// user bindings shadow builtin names.
pub struct Builtins {
    table: HashMap<&'static str, Rc<Object>>,
}

impl Builtins {
    /// The production table: `exit` terminates the process.
    pub fn new() -> Self {
        Self::with_exit_handler(Rc::new(|code| std::process::exit(code)))
    }

    /// Builds the table with a replaceable `exit` capability. When the handler
    /// returns instead of terminating, the builtin evaluates to `null`.
    pub fn with_exit_handler(handler: ExitHandler) -> Self {
        let mut table = HashMap::new();

        let plain: [(&'static str, fn(Vec<Rc<Object>>) -> Result<Rc<Object>, EvaluationError>);
            5] = [
            ("len", builtin_len),
            ("first", builtin_first),
            ("last", builtin_last),
            ("rest", builtin_rest),
            ("push", builtin_push),
        ];
        for (name, func) in plain {
            table.insert(name, Object::builtin(name, Rc::new(func) as BuiltinFn));
        }

        let exit = move |args: Vec<Rc<Object>>| builtin_exit(&handler, args);
        table.insert("exit", Object::builtin("exit", Rc::new(exit)));

        Builtins { table }
    }

    pub fn lookup(&self, name: &str) -> Option<Rc<Object>> {
        self.table.get(name).cloned()
    }
}

impl Default for Builtins {
    fn default() -> Self {
        Self::new()
    }
}

fn expect_array<'a>(
    builtin: &'static str,
    args: &'a [Rc<Object>],
) -> Result<&'a Vec<Rc<Object>>, EvaluationError> {
    if args.len() != 1 {
        return Err(EvaluationError::WrongArgumentCount {
            got: args.len(),
            want: 1,
        });
    }
    match args[0].as_ref() {
        Object::Array(array) => Ok(array),
        other => Err(EvaluationError::ExpectedArrayArgument {
            builtin,
            got: other.type_name(),
        }),
    }
}

fn builtin_len(args: Vec<Rc<Object>>) -> Result<Rc<Object>, EvaluationError> {
    if args.len() != 1 {
        return Err(EvaluationError::WrongArgumentCount {
            got: args.len(),
            want: 1,
        });
    }
    match args[0].as_ref() {
        Object::String(value) => Ok(Object::integer(value.chars().count() as i64)),
        Object::Array(array) => Ok(Object::integer(array.len() as i64)),
        other => Err(EvaluationError::UnsupportedArgumentType {
            builtin: "len",
            got: other.type_name(),
        }),
    }
}

fn builtin_first(args: Vec<Rc<Object>>) -> Result<Rc<Object>, EvaluationError> {
    let array = expect_array("first", &args)?;
    Ok(array.first().cloned().unwrap_or_else(Object::null))
}

fn builtin_last(args: Vec<Rc<Object>>) -> Result<Rc<Object>, EvaluationError> {
    let array = expect_array("last", &args)?;
    Ok(array.last().cloned().unwrap_or_else(Object::null))
}

fn builtin_rest(args: Vec<Rc<Object>>) -> Result<Rc<Object>, EvaluationError> {
    let array = expect_array("rest", &args)?;
    if array.is_empty() {
        return Ok(Object::null());
    }
    Ok(Object::array(array[1..].to_vec()))
}

fn builtin_push(args: Vec<Rc<Object>>) -> Result<Rc<Object>, EvaluationError> {
    if args.len() != 2 {
        return Err(EvaluationError::WrongArgumentCount {
            got: args.len(),
            want: 2,
        });
    }
    match args[0].as_ref() {
        Object::Array(array) => {
            let mut new_array = array.clone();
            new_array.push(args[1].clone());
            Ok(Object::array(new_array))
        }
        other => Err(EvaluationError::ExpectedArrayArgument {
            builtin: "push",
            got: other.type_name(),
        }),
    }
}

fn builtin_exit(
    handler: &ExitHandler,
    args: Vec<Rc<Object>>,
) -> Result<Rc<Object>, EvaluationError> {
    match args.as_slice() {
        [] => {
            handler(0);
            Ok(Object::null())
        }
        [arg] => match arg.as_ref() {
            Object::Integer(code) => {
                handler(*code as i32);
                Ok(Object::null())
            }
            other => Err(EvaluationError::UnsupportedArgumentType {
                builtin: "exit",
                got: other.type_name(),
            }),
        },
        _ => Err(EvaluationError::WrongExitArgumentCount(args.len())),
    }
}

use std::fmt::Display;
use std::rc::Rc;

use fern_core::ast;
use thiserror::Error;

use crate::environment::Environment;

#[derive(Debug, PartialEq, Clone)]
pub enum Object {
    Integer(i64),
    Boolean(bool),
    String(String),
    Array(Vec<Rc<Object>>),
    Function(Function),
    Builtin(Builtin),
    Null,
}

thread_local! {
    static NULL: Rc<Object> = Rc::new(Object::Null);
    static TRUE: Rc<Object> = Rc::new(Object::Boolean(true));
    static FALSE: Rc<Object> = Rc::new(Object::Boolean(false));
}

impl Object {
    pub fn null() -> Rc<Object> {
        NULL.with(|x| x.clone())
    }

    pub fn boolean(value: bool) -> Rc<Object> {
        if value {
            TRUE.with(|x| x.clone())
        } else {
            FALSE.with(|x| x.clone())
        }
    }

    pub fn integer(value: i64) -> Rc<Object> {
        Rc::new(Object::Integer(value))
    }

    pub fn string(value: String) -> Rc<Object> {
        Rc::new(Object::String(value))
    }

    pub fn array(array: Vec<Rc<Object>>) -> Rc<Object> {
        Rc::new(Object::Array(array))
    }

    pub fn function(
        parameters: Vec<ast::Identifier>,
        body: ast::BlockStatement,
        env: Environment,
    ) -> Rc<Object> {
        Rc::new(Object::Function(Function {
            parameters,
            body,
            env,
        }))
    }

    pub fn builtin(name: &'static str, func: BuiltinFn) -> Rc<Object> {
        Rc::new(Object::Builtin(Builtin { name, func }))
    }

    /// The type tag used in error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Object::Integer(_) => "INTEGER",
            Object::Boolean(_) => "BOOLEAN",
            Object::String(_) => "STRING",
            Object::Array(_) => "ARRAY",
            Object::Function(_) => "FUNCTION",
            Object::Builtin(_) => "BUILTIN",
            Object::Null => "NULL",
        }
    }

    /// Everything except `false` and `null` is truthy, including `0`, `""`
    /// and `[]`.
    pub fn is_truthy(&self) -> bool {
        !matches!(self, Object::Boolean(false) | Object::Null)
    }
}

impl Display for Object {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Object::Integer(value) => write!(f, "{}", value),
            Object::Boolean(value) => write!(f, "{}", value),
            Object::String(value) => write!(f, "{}", value),
            Object::Array(array) => {
                write!(f, "[")?;
                for (i, element) in array.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", element)?;
                }
                write!(f, "]")
            }
            Object::Function(_) => write!(f, "<fn>"),
            Object::Builtin(builtin) => write!(f, "<builtin fn {}>", builtin.name),
            Object::Null => write!(f, "null"),
        }
    }
}

/// A user function: the body plus a strong handle to the environment it was
/// defined in. The handle keeps the whole defining chain alive for as long as
/// the closure itself lives.
#[derive(Clone)]
pub struct Function {
    pub parameters: Vec<ast::Identifier>,
    pub body: ast::BlockStatement,
    pub env: Environment,
}

impl PartialEq for Function {
    fn eq(&self, other: &Self) -> bool {
        self.parameters == other.parameters
            && self.body == other.body
            && self.env.ptr_eq(&other.env)
    }
}

impl std::fmt::Debug for Function {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Function")
            .field("ptr", &(self as *const Function as usize))
            .finish()
    }
}

pub type BuiltinFn = Rc<dyn Fn(Vec<Rc<Object>>) -> Result<Rc<Object>, EvaluationError>>;

#[derive(Clone)]
pub struct Builtin {
    pub name: &'static str,
    pub func: BuiltinFn,
}

impl PartialEq for Builtin {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl std::fmt::Debug for Builtin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Builtin").field("name", &self.name).finish()
    }
}

/// The non-local results of evaluating a statement: a `return` travelling up
/// to its function-call boundary, or an error short-circuiting everything.
/// Carrying both on the `Err` channel means `?` at every recursive call site
/// is the whole propagation mechanism, and a return wrapper can never end up
/// inside a composite value.
#[derive(Debug, PartialEq)]
pub enum Unwind {
    Return(Rc<Object>),
    Error(EvaluationError),
}

impl From<EvaluationError> for Unwind {
    fn from(error: EvaluationError) -> Self {
        Unwind::Error(error)
    }
}

#[derive(Debug, PartialEq, Error)]
pub enum EvaluationError {
    #[error("type mismatch: {left} {operator} {right}")]
    TypeMismatch {
        left: &'static str,
        operator: &'static str,
        right: &'static str,
    },
    #[error("unknown operator: {left} {operator} {right}")]
    UnknownInfixOperator {
        left: &'static str,
        operator: &'static str,
        right: &'static str,
    },
    #[error("unknown operator: {operator}{right}")]
    UnknownPrefixOperator {
        operator: &'static str,
        right: &'static str,
    },
    #[error("identifier not found: {0}")]
    IdentifierNotFound(Rc<str>),
    #[error("not a function: {0}")]
    NotAFunction(&'static str),
    #[error("index operator not supported: {0}")]
    IndexNotSupported(&'static str),
    #[error("division by zero")]
    DivisionByZero,
    #[error("wrong number of arguments. got={got}, want={want}")]
    WrongArgumentCount { got: usize, want: usize },
    #[error("wrong number of arguments. got={0}, want 0 or 1")]
    WrongExitArgumentCount(usize),
    #[error("`{builtin}` builtin function doesn't support argument of type {got}")]
    UnsupportedArgumentType {
        builtin: &'static str,
        got: &'static str,
    },
    #[error("argument to `{builtin}` must be ARRAY, got {got}")]
    ExpectedArrayArgument {
        builtin: &'static str,
        got: &'static str,
    },
}

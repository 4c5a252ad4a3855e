use std::rc::Rc;

use fern_core::ast;
use fern_core::ast::Expression;

use crate::builtins::Builtins;
use crate::environment::Environment;
use crate::object::{EvaluationError, Function, Object, Unwind};

pub struct Evaluator {
    builtins: Builtins,
}

impl Evaluator {
    pub fn new() -> Self {
        Evaluator {
            builtins: Builtins::new(),
        }
    }

    /// An evaluator over a custom builtin table, typically one with the
    /// `exit` capability replaced by a test double.
    pub fn with_builtins(builtins: Builtins) -> Self {
        Evaluator { builtins }
    }

    /// Evaluates a whole program against a caller-supplied root environment.
    /// A `return` at the top level yields its value; an error becomes the
    /// program's result.
    pub fn eval_program(
        &self,
        program: &ast::Program,
        environment: &mut Environment,
    ) -> Result<Rc<Object>, EvaluationError> {
        let mut output = Object::null();
        for statement in &program.statements {
            match self.eval_statement(statement, environment) {
                Ok(object) => output = object,
                Err(Unwind::Return(value)) => return Ok(value),
                Err(Unwind::Error(error)) => return Err(error),
            }
        }
        Ok(output)
    }

    fn eval_statement(
        &self,
        statement: &ast::Statement,
        environment: &mut Environment,
    ) -> Result<Rc<Object>, Unwind> {
        match statement {
            ast::Statement::Expression(expression) => self.eval_expression(expression, environment),
            ast::Statement::Return(statement) => {
                let value = self.eval_expression(&statement.value, environment)?;
                Err(Unwind::Return(value))
            }
            ast::Statement::Let(statement) => {
                let value = self.eval_expression(&statement.value, environment)?;
                environment.set(statement.identifier.name.clone(), value.clone());
                // The statement's own value is the bound value, so `let` can
                // be the tail of a block.
                Ok(value)
            }
        }
    }

    fn eval_block_statement(
        &self,
        block: &ast::BlockStatement,
        environment: &mut Environment,
    ) -> Result<Rc<Object>, Unwind> {
        let mut result = Object::null();
        for statement in &block.statements {
            result = self.eval_statement(statement, environment)?;
        }
        Ok(result)
    }

    fn eval_expression(
        &self,
        expression: &Expression,
        environment: &mut Environment,
    ) -> Result<Rc<Object>, Unwind> {
        match expression {
            Expression::IntegerLiteral(value) => Ok(Object::integer(*value)),
            Expression::BooleanLiteral(value) => Ok(Object::boolean(*value)),
            Expression::StringLiteral(value) => Ok(Object::string(value.clone())),
            Expression::ArrayLiteral(array) => Ok(Object::array(
                array
                    .iter()
                    .map(|expression| self.eval_expression(expression, environment))
                    .collect::<Result<Vec<_>, _>>()?,
            )),
            Expression::Identifier(identifier) => environment
                .get(&identifier.name)
                .or_else(|| self.builtins.lookup(&identifier.name))
                .ok_or_else(|| {
                    Unwind::Error(EvaluationError::IdentifierNotFound(identifier.name.clone()))
                }),
            Expression::PrefixOperation(kind, expression) => {
                let right = self.eval_expression(expression, environment)?;
                eval_prefix_operation(kind, right)
            }
            Expression::InfixOperation(kind, left, right) => {
                let left = self.eval_expression(left, environment)?;
                let right = self.eval_expression(right, environment)?;
                eval_infix_operation(kind, left, right)
            }
            Expression::IfExpression {
                condition,
                consequence,
                alternative,
            } => {
                let condition = self.eval_expression(condition, environment)?;
                if condition.is_truthy() {
                    self.eval_block_statement(consequence, environment)
                } else if let Some(alternative) = alternative {
                    self.eval_block_statement(alternative, environment)
                } else {
                    Ok(Object::null())
                }
            }
            Expression::FunctionLiteral { parameters, body } => Ok(Object::function(
                parameters.clone(),
                body.clone(),
                environment.clone(),
            )),
            Expression::CallExpression {
                function,
                arguments,
            } => {
                let callee = self.eval_expression(function, environment)?;
                let arguments = self.eval_expressions(arguments, environment)?;
                match callee.as_ref() {
                    Object::Function(function) => self.apply_function(function, arguments),
                    Object::Builtin(builtin) => {
                        (builtin.func)(arguments).map_err(Unwind::Error)
                    }
                    _ => Err(Unwind::Error(EvaluationError::NotAFunction(
                        callee.type_name(),
                    ))),
                }
            }
            Expression::IndexExpression { left, index } => {
                let left = self.eval_expression(left, environment)?;
                let index = self.eval_expression(index, environment)?;
                eval_index_expression(left, index)
            }
        }
    }

    fn eval_expressions(
        &self,
        expressions: &[Expression],
        environment: &mut Environment,
    ) -> Result<Vec<Rc<Object>>, Unwind> {
        let mut result = Vec::with_capacity(expressions.len());
        for expression in expressions {
            result.push(self.eval_expression(expression, environment)?);
        }
        Ok(result)
    }

    fn apply_function(
        &self,
        function: &Function,
        arguments: Vec<Rc<Object>>,
    ) -> Result<Rc<Object>, Unwind> {
        let mut environment = Environment::new_enclosed(function.env.clone());
        // Arity is deliberately unchecked: extra arguments are dropped and
        // missing parameters stay unbound.
        for (parameter, argument) in function.parameters.iter().zip(arguments) {
            environment.set(parameter.name.clone(), argument);
        }
        match self.eval_block_statement(&function.body, &mut environment) {
            Err(Unwind::Return(value)) => Ok(value),
            other => other,
        }
    }
}

impl Default for Evaluator {
    fn default() -> Self {
        Self::new()
    }
}

fn eval_prefix_operation(
    kind: &ast::PrefixOperationKind,
    right: Rc<Object>,
) -> Result<Rc<Object>, Unwind> {
    match kind {
        ast::PrefixOperationKind::Bang => Ok(Object::boolean(!right.is_truthy())),
        ast::PrefixOperationKind::Minus => match right.as_ref() {
            Object::Integer(value) => Ok(Object::integer(-value)),
            _ => Err(Unwind::Error(EvaluationError::UnknownPrefixOperator {
                operator: kind.to_str(),
                right: right.type_name(),
            })),
        },
    }
}

fn eval_infix_operation(
    kind: &ast::InfixOperationKind,
    left: Rc<Object>,
    right: Rc<Object>,
) -> Result<Rc<Object>, Unwind> {
    use ast::InfixOperationKind::*;

    match (left.as_ref(), right.as_ref()) {
        (Object::Integer(left), Object::Integer(right)) => {
            eval_integer_infix_operation(kind, *left, *right)
        }
        (Object::Boolean(left), Object::Boolean(right)) => match kind {
            Equal => Ok(Object::boolean(left == right)),
            NotEqual => Ok(Object::boolean(left != right)),
            _ => Err(unknown_infix_operator(kind, "BOOLEAN", "BOOLEAN")),
        },
        (Object::String(left), Object::String(right)) => match kind {
            Plus => Ok(Object::string(format!("{}{}", left, right))),
            Equal => Ok(Object::boolean(left == right)),
            NotEqual => Ok(Object::boolean(left != right)),
            _ => Err(unknown_infix_operator(kind, "STRING", "STRING")),
        },
        _ if left.type_name() != right.type_name() => {
            Err(Unwind::Error(EvaluationError::TypeMismatch {
                left: left.type_name(),
                operator: kind.to_str(),
                right: right.type_name(),
            }))
        }
        _ => Err(unknown_infix_operator(
            kind,
            left.type_name(),
            right.type_name(),
        )),
    }
}

fn unknown_infix_operator(
    kind: &ast::InfixOperationKind,
    left: &'static str,
    right: &'static str,
) -> Unwind {
    Unwind::Error(EvaluationError::UnknownInfixOperator {
        left,
        operator: kind.to_str(),
        right,
    })
}

fn eval_integer_infix_operation(
    kind: &ast::InfixOperationKind,
    left: i64,
    right: i64,
) -> Result<Rc<Object>, Unwind> {
    use ast::InfixOperationKind::*;

    match kind {
        Plus => Ok(Object::integer(left + right)),
        Minus => Ok(Object::integer(left - right)),
        Multiply => Ok(Object::integer(left * right)),
        Divide => {
            if right == 0 {
                Err(Unwind::Error(EvaluationError::DivisionByZero))
            } else {
                Ok(Object::integer(left / right))
            }
        }
        LessThan => Ok(Object::boolean(left < right)),
        GreaterThan => Ok(Object::boolean(left > right)),
        Equal => Ok(Object::boolean(left == right)),
        NotEqual => Ok(Object::boolean(left != right)),
    }
}

fn eval_index_expression(left: Rc<Object>, index: Rc<Object>) -> Result<Rc<Object>, Unwind> {
    match (left.as_ref(), index.as_ref()) {
        (Object::Array(array), Object::Integer(index)) => {
            let length = array.len() as i64;
            // A negative index counts back from the end; anything still out
            // of range is null rather than an error.
            let index = if *index < 0 { length + index } else { *index };
            if index < 0 || index >= length {
                Ok(Object::null())
            } else {
                Ok(array[index as usize].clone())
            }
        }
        _ => Err(Unwind::Error(EvaluationError::IndexNotSupported(
            left.type_name(),
        ))),
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::Evaluator;
    use crate::builtins::Builtins;
    use crate::environment::Environment;
    use crate::object::{EvaluationError, Object};

    fn eval_input(input: &str) -> Result<Rc<Object>, EvaluationError> {
        let (program, errors) = fern_core::parse(input);
        assert!(errors.is_empty(), "parse errors for {:?}: {:?}", input, errors);
        Evaluator::new().eval_program(&program, &mut Environment::new())
    }

    fn test_evaluation(inputs: Vec<(&str, Result<Rc<Object>, EvaluationError>)>) {
        for (input, expected) in inputs {
            assert_eq!(eval_input(input), expected, "input: {:?}", input);
        }
    }

    fn test_error_messages(inputs: Vec<(&str, &str)>) {
        for (input, expected) in inputs {
            let error = eval_input(input).expect_err(input);
            assert_eq!(error.to_string(), expected, "input: {:?}", input);
        }
    }

    #[test]
    fn test_literals() {
        let inputs = vec![
            ("5;", Ok(Object::integer(5))),
            ("true;", Ok(Object::boolean(true))),
            ("false;", Ok(Object::boolean(false))),
            ("\"hello\";", Ok(Object::string("hello".to_owned()))),
        ];

        test_evaluation(inputs);
    }

    #[test]
    fn test_integer_arithmetic() {
        let inputs = vec![
            ("-10;", Ok(Object::integer(-10))),
            ("--5;", Ok(Object::integer(5))),
            ("5 + 5 + 5 + 5 - 10;", Ok(Object::integer(10))),
            ("2 * 2 * 2 * 2 * 2;", Ok(Object::integer(32))),
            ("50 / 2 * 2 + 10;", Ok(Object::integer(60))),
            ("(5 + 5) * 2;", Ok(Object::integer(30))),
            ("3 * (3 * 3) + 10;", Ok(Object::integer(37))),
            ("7 / 2;", Ok(Object::integer(3))),
            ("5 / 0;", Err(EvaluationError::DivisionByZero)),
        ];

        test_evaluation(inputs);
    }

    #[test]
    fn test_comparisons() {
        let inputs = vec![
            ("1 < 2;", Ok(Object::boolean(true))),
            ("1 > 2;", Ok(Object::boolean(false))),
            ("1 == 1;", Ok(Object::boolean(true))),
            ("1 != 1;", Ok(Object::boolean(false))),
            ("true == true;", Ok(Object::boolean(true))),
            ("true != false;", Ok(Object::boolean(true))),
            ("(1 < 2) == true;", Ok(Object::boolean(true))),
            ("\"a\" == \"a\";", Ok(Object::boolean(true))),
            ("\"a\" != \"b\";", Ok(Object::boolean(true))),
        ];

        test_evaluation(inputs);
    }

    #[test]
    fn test_bang_truthiness() {
        let inputs = vec![
            ("!true;", Ok(Object::boolean(false))),
            ("!false;", Ok(Object::boolean(true))),
            ("!5;", Ok(Object::boolean(false))),
            ("!!5;", Ok(Object::boolean(true))),
            ("!0;", Ok(Object::boolean(false))),
            ("!\"\";", Ok(Object::boolean(false))),
            ("![];", Ok(Object::boolean(false))),
            ("!!true;", Ok(Object::boolean(true))),
        ];

        test_evaluation(inputs);
    }

    #[test]
    fn test_if_expressions() {
        let inputs = vec![
            ("if (true) { 10 };", Ok(Object::integer(10))),
            ("if (false) { 10 };", Ok(Object::null())),
            ("if (1) { 10 };", Ok(Object::integer(10))),
            ("if (1 < 2) { 10 };", Ok(Object::integer(10))),
            ("if (1 > 2) { 10 } else { 20 };", Ok(Object::integer(20))),
            ("if (1 < 2) { 10 } else { 20 };", Ok(Object::integer(10))),
        ];

        test_evaluation(inputs);
    }

    #[test]
    fn test_return_statements() {
        let inputs = vec![
            ("return 10;", Ok(Object::integer(10))),
            ("return 10; 9;", Ok(Object::integer(10))),
            ("return 2 * 5; 9;", Ok(Object::integer(10))),
            ("9; return 2 * 5; 9;", Ok(Object::integer(10))),
            (
                "if (10 > 1) { if (10 > 1) { return 10; } return 1; };",
                Ok(Object::integer(10)),
            ),
        ];

        test_evaluation(inputs);
    }

    #[test]
    fn test_let_statements() {
        let inputs = vec![
            ("let a = 5; a;", Ok(Object::integer(5))),
            ("let a = 5 * 5; a;", Ok(Object::integer(25))),
            ("let a = 5; let b = a; b;", Ok(Object::integer(5))),
            (
                "let a = 5; let b = a; let c = a + b + 5; c;",
                Ok(Object::integer(15)),
            ),
            // A let statement evaluates to its bound value.
            ("let a = 5 * 5;", Ok(Object::integer(25))),
        ];

        test_evaluation(inputs);
    }

    #[test]
    fn test_error_wordings() {
        let inputs = vec![
            ("5 + true;", "type mismatch: INTEGER + BOOLEAN"),
            ("5 + true; 5;", "type mismatch: INTEGER + BOOLEAN"),
            ("-true;", "unknown operator: -BOOLEAN"),
            ("true + false;", "unknown operator: BOOLEAN + BOOLEAN"),
            ("5; true + false; 5;", "unknown operator: BOOLEAN + BOOLEAN"),
            (
                "if (10 > 1) { true + false; };",
                "unknown operator: BOOLEAN + BOOLEAN",
            ),
            ("foobar;", "identifier not found: foobar"),
            ("\"Hello\" - \"World\";", "unknown operator: STRING - STRING"),
            ("true < false;", "unknown operator: BOOLEAN < BOOLEAN"),
            ("\"a\" + 1;", "type mismatch: STRING + INTEGER"),
            ("let x = 5; x(1);", "not a function: INTEGER"),
            ("5[0];", "index operator not supported: INTEGER"),
            ("[1][true];", "index operator not supported: ARRAY"),
        ];

        test_error_messages(inputs);
    }

    #[test]
    fn test_errors_short_circuit_composites() {
        let inputs = vec![
            ("[1, 2 + true, 3];", "type mismatch: INTEGER + BOOLEAN"),
            ("len(1 + true);", "type mismatch: INTEGER + BOOLEAN"),
            ("(fn(x) { x })(nope);", "identifier not found: nope"),
            ("let a = 1 + true; a;", "type mismatch: INTEGER + BOOLEAN"),
            ("return 1 + true;", "type mismatch: INTEGER + BOOLEAN"),
        ];

        test_error_messages(inputs);
    }

    #[test]
    fn test_string_concatenation() {
        let inputs = vec![
            (
                "\"Hello\" + \" \" + \"World!\";",
                Ok(Object::string("Hello World!".to_owned())),
            ),
            ("\"\" + \"\";", Ok(Object::string("".to_owned()))),
        ];

        test_evaluation(inputs);
    }

    #[test]
    fn test_function_application() {
        let inputs = vec![
            (
                "let identity = fn(x) { x; }; identity(5);",
                Ok(Object::integer(5)),
            ),
            (
                "let identity = fn(x) { return x; }; identity(5);",
                Ok(Object::integer(5)),
            ),
            (
                "let double = fn(x) { x * 2; }; double(5);",
                Ok(Object::integer(10)),
            ),
            (
                "let add = fn(x, y) { x + y; }; add(5, 5);",
                Ok(Object::integer(10)),
            ),
            (
                "let add = fn(x, y) { x + y; }; add(5 + 5, add(5, 5));",
                Ok(Object::integer(20)),
            ),
            ("fn(x) { x; }(5);", Ok(Object::integer(5))),
            (
                "let factorial = fn(n) {
                    if (n < 2) { 1 } else { factorial(n - 1) * n }
                };
                factorial(5);",
                Ok(Object::integer(120)),
            ),
        ];

        test_evaluation(inputs);
    }

    #[test]
    fn test_unchecked_arity() {
        let inputs = vec![
            // Extra arguments are dropped.
            ("let f = fn(x) { x; }; f(1, 2);", Ok(Object::integer(1))),
            // A missing parameter is simply unbound.
            (
                "let f = fn(x, y) { y; }; f(1);",
                Err(EvaluationError::IdentifierNotFound("y".into())),
            ),
        ];

        test_evaluation(inputs);
    }

    #[test]
    fn test_closures() {
        let inputs = vec![
            (
                "let newAdder = fn(x) { fn(y) { x + y }; };
                let addTwo = newAdder(2);
                addTwo(3);",
                Ok(Object::integer(5)),
            ),
            (
                "let func = fn(a) { fn(b) { a + b } };
                func(5)(10);",
                Ok(Object::integer(15)),
            ),
            (
                "let fa = fn() {
                    let x = 5;
                    let fb = fn() { x };
                    fb
                };
                let temp = fa();
                temp();",
                Ok(Object::integer(5)),
            ),
        ];

        test_evaluation(inputs);
    }

    #[test]
    fn test_closures_share_their_defining_scope() {
        // Both closures observe the rebinding of `x` that happens after they
        // are created but before either is called.
        let input = "
            let pair = fn() {
                let x = 1;
                let get = fn() { x };
                let also = fn() { x };
                let x = 99;
                get() + also()
            };
            pair();";

        assert_eq!(eval_input(input), Ok(Object::integer(198)));
    }

    #[test]
    fn test_shadowing_does_not_leak_out_of_a_call() {
        let input = "
            let x = 1;
            let shadow = fn() { let x = 2; x };
            shadow();
            x;";

        assert_eq!(eval_input(input), Ok(Object::integer(1)));
    }

    #[test]
    fn test_array_literals() {
        let inputs = vec![
            (
                "[1, 2 * 2, 3 + 3];",
                Ok(Object::array(vec![
                    Object::integer(1),
                    Object::integer(4),
                    Object::integer(6),
                ])),
            ),
            ("[];", Ok(Object::array(vec![]))),
        ];

        test_evaluation(inputs);
    }

    #[test]
    fn test_array_indexing() {
        let inputs = vec![
            ("[1, 2, 3][0];", Ok(Object::integer(1))),
            ("[1, 2, 3][1];", Ok(Object::integer(2))),
            ("[1, 2, 3][2];", Ok(Object::integer(3))),
            ("let i = 0; [1][i];", Ok(Object::integer(1))),
            ("[1, 2, 3][1 + 1];", Ok(Object::integer(3))),
            (
                "let arr = [1, 2, 3]; arr[0] + arr[1] + arr[2];",
                Ok(Object::integer(6)),
            ),
            // Negative indices count back from the end.
            ("[1, 2, 3][-1];", Ok(Object::integer(3))),
            ("[1, 2, 3][-3];", Ok(Object::integer(1))),
            // Out of range in either direction is null, not an error.
            ("[1, 2, 3][3];", Ok(Object::null())),
            ("[1, 2, 3][-4];", Ok(Object::null())),
            ("[][0];", Ok(Object::null())),
        ];

        test_evaluation(inputs);
    }

    #[test]
    fn test_builtins_through_the_evaluator() {
        let inputs = vec![
            ("len(\"\");", Ok(Object::integer(0))),
            ("len(\"four\");", Ok(Object::integer(4))),
            ("len(\"hello world\");", Ok(Object::integer(11))),
            ("len([1, 2]);", Ok(Object::integer(2))),
            ("first([1, 2]);", Ok(Object::integer(1))),
            ("first([]);", Ok(Object::null())),
            ("last([1, 2]);", Ok(Object::integer(2))),
            ("last([]);", Ok(Object::null())),
            (
                "rest([1, 2, 3]);",
                Ok(Object::array(vec![Object::integer(2), Object::integer(3)])),
            ),
            ("rest([]);", Ok(Object::null())),
            (
                "push([1, 2], 3);",
                Ok(Object::array(vec![
                    Object::integer(1),
                    Object::integer(2),
                    Object::integer(3),
                ])),
            ),
            (
                "push([], 1);",
                Ok(Object::array(vec![Object::integer(1)])),
            ),
            // push is persistent: the original array is unmodified.
            (
                "let a = [1, 2]; let b = push(a, 3); len(a);",
                Ok(Object::integer(2)),
            ),
            (
                "let a = [1, 2]; let b = push(a, 3); len(b);",
                Ok(Object::integer(3)),
            ),
            // User bindings shadow builtin names.
            ("let len = 5; len;", Ok(Object::integer(5))),
        ];

        test_evaluation(inputs);
    }

    #[test]
    fn test_builtin_error_wordings() {
        let inputs = vec![
            (
                "len(1);",
                "`len` builtin function doesn't support argument of type INTEGER",
            ),
            (
                "len(\"one\", \"two\");",
                "wrong number of arguments. got=2, want=1",
            ),
            ("first(1);", "argument to `first` must be ARRAY, got INTEGER"),
            ("last(\"a\");", "argument to `last` must be ARRAY, got STRING"),
            ("rest(true);", "argument to `rest` must be ARRAY, got BOOLEAN"),
            ("push(1, 1);", "argument to `push` must be ARRAY, got INTEGER"),
            ("push([1]);", "wrong number of arguments. got=1, want=2"),
            (
                "exit(0, 1);",
                "wrong number of arguments. got=2, want 0 or 1",
            ),
            (
                "exit(\"1\");",
                "`exit` builtin function doesn't support argument of type STRING",
            ),
        ];

        test_error_messages(inputs);
    }

    #[test]
    fn test_exit_with_a_test_double() {
        let recorded = Rc::new(RefCell::new(Vec::new()));
        let sink = recorded.clone();
        let evaluator = Evaluator::with_builtins(Builtins::with_exit_handler(Rc::new(
            move |code| sink.borrow_mut().push(code),
        )));

        let (program, errors) = fern_core::parse("exit(3); 7;");
        assert!(errors.is_empty());
        let result = evaluator.eval_program(&program, &mut Environment::new());

        assert_eq!(result, Ok(Object::integer(7)));
        assert_eq!(*recorded.borrow(), vec![3]);
    }

    #[test]
    fn test_recursion_with_builtins() {
        let input = "
            let map = fn(arr, f) {
                if (len(arr) == 0) { [] } else { push(map(rest(arr), f), f(first(arr))) }
            };
            let double = fn(x) { x * 2 };
            map([3, 2, 1], double);";

        // The recursive build appends after the recursive call, reversing
        // order while doubling.
        assert_eq!(
            eval_input(input),
            Ok(Object::array(vec![
                Object::integer(2),
                Object::integer(4),
                Object::integer(6),
            ]))
        );
    }

    #[test]
    fn test_pre_seeded_root_environment() {
        let mut env = Environment::new();
        env.set("seeded".into(), Object::integer(41));

        let (program, errors) = fern_core::parse("seeded + 1;");
        assert!(errors.is_empty());
        let result = Evaluator::new().eval_program(&program, &mut env);

        assert_eq!(result, Ok(Object::integer(42)));
    }
}

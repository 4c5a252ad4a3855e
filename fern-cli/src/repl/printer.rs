use std::rc::Rc;

use fern_interpreter::object::{EvaluationError, Object};

pub struct Printer {}

impl Printer {
    /// Prints an evaluation result, or the error message verbatim.
    pub fn print(&self, result: Result<Rc<Object>, EvaluationError>) {
        match result {
            Ok(value) => println!("{}", value),
            Err(error) => println!("{}", error),
        }
    }
}

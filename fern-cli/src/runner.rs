use std::path::Path;
use std::process::ExitCode;

use fern_interpreter::environment::Environment;
use fern_interpreter::evaluator::Evaluator;
use fern_interpreter::object::Object;

pub fn execute_file(path: &Path) -> ExitCode {
    let source = match std::fs::read_to_string(path) {
        Ok(source) => source,
        Err(err) => {
            eprintln!("could not read {}: {}", path.display(), err);
            return ExitCode::FAILURE;
        }
    };
    execute(&source)
}

/// Runs a whole script. A program with parse errors is never evaluated; the
/// full error list is reported instead.
pub fn execute(source: &str) -> ExitCode {
    let (program, errors) = fern_core::parse(source);
    if !errors.is_empty() {
        eprintln!("parser errors:");
        for error in &errors {
            eprintln!("\t{}", error);
        }
        return ExitCode::FAILURE;
    }

    let mut environment = Environment::new();
    match Evaluator::new().eval_program(&program, &mut environment) {
        Ok(value) => {
            if !matches!(value.as_ref(), Object::Null) {
                println!("{}", value);
            }
            ExitCode::SUCCESS
        }
        Err(error) => {
            eprintln!("{}", error);
            ExitCode::FAILURE
        }
    }
}

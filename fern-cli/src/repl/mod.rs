mod printer;
mod reader;

use fern_interpreter::environment::Environment;
use fern_interpreter::evaluator::Evaluator;
use rustyline::DefaultEditor;

use printer::Printer;
use reader::{ReadOutput, Reader};

/// Line-at-a-time read-eval-print loop. The environment persists across
/// lines, so bindings from earlier inputs stay visible.
pub fn start() -> rustyline::Result<()> {
    let rl = DefaultEditor::new()?;
    let mut reader = Reader::new(rl);
    let printer = Printer {};
    let evaluator = Evaluator::new();
    let mut environment = Environment::new();

    loop {
        match reader.read() {
            ReadOutput::Exit => return Ok(()),
            ReadOutput::Clear => continue,
            ReadOutput::Value(program) => {
                let result = evaluator.eval_program(&program, &mut environment);
                printer.print(result);
            }
        }
    }
}

use fern_core::ast::Program;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;

const PROMPT: &str = ">> ";

pub enum ReadOutput {
    Exit,
    Clear,
    Value(Program),
}

pub struct Reader {
    rl: DefaultEditor,
}

impl Reader {
    pub fn new(rl: DefaultEditor) -> Self {
        Self { rl }
    }

    /// Reads and parses one line. A line with parse errors prints them all
    /// and is not handed to the evaluator.
    pub fn read(&mut self) -> ReadOutput {
        let line = match self.rl.readline(PROMPT) {
            Err(ReadlineError::Interrupted) => {
                println!("CTRL-C");
                return ReadOutput::Clear;
            }
            Err(ReadlineError::Eof) => {
                println!("CTRL-D");
                return ReadOutput::Exit;
            }
            Err(err) => {
                println!("Error: {:?}", err);
                return ReadOutput::Exit;
            }
            Ok(line) => {
                let _ = self.rl.add_history_entry(&line);
                line
            }
        };

        let (program, errors) = fern_core::parse(&line);
        if errors.is_empty() {
            ReadOutput::Value(program)
        } else {
            println!("parser errors:");
            for error in errors {
                println!("\t{}", error);
            }
            ReadOutput::Clear
        }
    }
}

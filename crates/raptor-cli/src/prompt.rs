// Interactive prompts on the terminal

use crate::output::{self, OutputStyle};
use raptor_rollback::{OperatorPrompt, RollbackError, RollbackResult};
use std::io::{self, BufRead, Write};
use std::sync::Mutex;

/// [`OperatorPrompt`] reading answers line by line
///
/// End of input backs out of a selection and declines a confirmation.
pub struct TerminalPrompt {
    input: Mutex<Box<dyn BufRead + Send>>,
    style: OutputStyle,
}

impl TerminalPrompt {
    /// Prompt on stdin
    pub fn stdin() -> Self {
        Self::with_input(Box::new(io::BufReader::new(io::stdin())))
    }

    pub fn with_input(input: Box<dyn BufRead + Send>) -> Self {
        Self {
            input: Mutex::new(input),
            style: OutputStyle::default(),
        }
    }

    /// Ask a question; `None` at end of input
    fn ask(&self, question: &str) -> RollbackResult<Option<String>> {
        print!("{}", self.style.prompt(question));
        io::stdout()
            .flush()
            .map_err(|e| RollbackError::collaborator("write prompt", e))?;

        let mut input = self
            .input
            .lock()
            .map_err(|_| RollbackError::collaborator("read answer", "input lock poisoned"))?;
        let mut line = String::new();
        let read = input
            .read_line(&mut line)
            .map_err(|e| RollbackError::collaborator("read answer", e))?;
        if read == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim().to_string()))
    }
}

/// Interpret a menu answer: `Some(None)` backs out, `None` is unusable
pub fn parse_choice(answer: &str, count: usize) -> Option<Option<usize>> {
    match answer.trim().to_lowercase().as_str() {
        "" | "q" | "quit" => Some(None),
        other => match other.parse::<usize>() {
            Ok(n) if (1..=count).contains(&n) => Some(Some(n - 1)),
            _ => None,
        },
    }
}

pub fn parse_yes_no(answer: &str) -> Option<bool> {
    match answer.trim().to_lowercase().as_str() {
        "y" | "yes" => Some(true),
        "n" | "no" => Some(false),
        _ => None,
    }
}

impl OperatorPrompt for TerminalPrompt {
    fn select(&self, message: &str, choices: &[String]) -> RollbackResult<Option<usize>> {
        println!("{}", self.style.section(message));
        for choice in choices {
            println!("{}", self.style.numbered_item(choice));
        }
        loop {
            let Some(answer) = self.ask("Enter a number (empty to cancel):")? else {
                return Ok(None);
            };
            match parse_choice(&answer, choices.len()) {
                Some(choice) => return Ok(choice),
                None => println!("Please enter a number between 1 and {}", choices.len()),
            }
        }
    }

    fn confirm(&self, message: &str) -> RollbackResult<bool> {
        loop {
            let Some(answer) = self.ask(&format!("{} (y/n):", message))? else {
                return Ok(false);
            };
            match parse_yes_no(&answer) {
                Some(yes) => return Ok(yes),
                None => println!("Please enter 'y' or 'n'"),
            }
        }
    }

    fn info(&self, message: &str) {
        output::print_info(message);
    }

    fn success(&self, message: &str) {
        output::print_success(message);
    }

    fn warning(&self, message: &str) {
        output::print_warning(message);
    }

    fn error(&self, message: &str) {
        output::print_error(message);
    }
}

//! Line-oriented prompting
//!
//! The wizard talks to the user through a [`Prompter`] so it can be driven
//! by stdin/stdout or by a scripted reader in tests.

use std::io::{self, BufRead, Stdin, StdinLock, Stdout, Write};

use crate::error::{ClawError, ClawResult};

/// Asks questions and shows messages
pub trait Prompter {
    /// Show `question` and return the trimmed answer; end of input is `""`
    fn ask(&mut self, question: &str) -> ClawResult<String>;

    /// Show an informational line
    fn say(&mut self, line: &str) -> ClawResult<()>;

    /// Show a warning line
    fn warn(&mut self, line: &str) -> ClawResult<()>;
}

/// A [`Prompter`] over any reader and writer
pub struct ConsolePrompter<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> ConsolePrompter<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    /// Everything written so far
    pub fn into_output(self) -> W {
        self.output
    }
}

impl ConsolePrompter<StdinLock<'static>, Stdout> {
    /// Prompt on the process's stdin/stdout
    pub fn stdio() -> Self {
        let stdin: Stdin = io::stdin();
        Self::new(stdin.lock(), io::stdout())
    }
}

impl<R: BufRead, W: Write> Prompter for ConsolePrompter<R, W> {
    fn ask(&mut self, question: &str) -> ClawResult<String> {
        write!(self.output, "{}", question)?;
        self.output.flush()?;

        let mut answer = String::new();
        self.input
            .read_line(&mut answer)
            .map_err(|e| ClawError::Io(format!("Failed to read input: {}", e)))?;
        Ok(answer.trim().to_string())
    }

    fn say(&mut self, line: &str) -> ClawResult<()> {
        writeln!(self.output, "{}", line)?;
        Ok(())
    }

    fn warn(&mut self, line: &str) -> ClawResult<()> {
        tracing::debug!(warning = line, "setup warning");
        writeln!(self.output, "{}", line)?;
        Ok(())
    }
}

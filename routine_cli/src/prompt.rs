//! Console implementation of the operator decision contract.

use routine_core::{Decider, Error, Question, Result};
use std::io::{BufRead, Write};

/// Prints numbered lists and reads answers line by line
pub struct ConsoleDecider<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> ConsoleDecider<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }
}

impl<R: BufRead, W: Write> Decider for ConsoleDecider<R, W> {
    fn ask(&mut self, question: &Question) -> Result<String> {
        writeln!(self.output)?;
        writeln!(self.output, "{}:", question.title)?;
        for (i, option) in question.options.iter().enumerate() {
            writeln!(self.output, "  {}: {}", i, option)?;
        }
        if let Some(sentinel) = question.create_sentinel {
            writeln!(self.output, "  {}: create new from source definition", sentinel)?;
        }
        write!(self.output, "{}: ", question.prompt)?;
        self.output.flush()?;

        // Raw bytes: undecodable input is an invalid answer, not an I/O failure
        let mut line = Vec::new();
        if self.input.read_until(b'\n', &mut line)? == 0 {
            return Err(Error::Selection("input closed before a choice was made".into()));
        }
        Ok(String::from_utf8_lossy(&line).trim().to_string())
    }

    fn reject(&mut self, message: &str) {
        let _ = writeln!(self.output, "{}", message);
    }
}

//! Console user interface
//!
//! Menu-driven prompts over any buffered reader and writer, so the menus run
//! against stdin/stdout in the binary and against in-memory buffers in tests.

mod converter_menu;
pub mod format;
mod probe_menu;
mod rates_view;

pub use converter_menu::run_converter_menu;
pub use probe_menu::run_probe_menu;
pub use rates_view::{render_currency_list, render_rates, run_rates_prompt};

use crossterm::style::Stylize;
use std::fmt::Display;
use std::io::{self, BufRead, Stdin, StdinLock, Stdout, Write};

/// Width of header rules
pub const SCREEN_WIDTH: usize = 80;

/// Words that leave a prompt loop
const EXIT_COMMANDS: [&str; 4] = ["exit", "quit", "q", "0"];

/// Line-oriented console over an input and an output stream
pub struct Console<R, W> {
    input: R,
    output: W,
}

/// Console bound to the process's stdin and stdout
pub type StdConsole = Console<StdinLock<'static>, Stdout>;

/// Creates a console on stdin/stdout
pub fn stdio() -> StdConsole {
    let stdin: Stdin = io::stdin();
    Console::new(stdin.lock(), io::stdout())
}

impl<R: BufRead, W: Write> Console<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    /// Prints `message` and reads one trimmed line
    ///
    /// Returns `None` at end of input.
    pub fn prompt(&mut self, message: &str) -> io::Result<Option<String>> {
        write!(self.output, "{}", message.yellow())?;
        self.output.flush()?;

        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            writeln!(self.output)?;
            return Ok(None);
        }
        Ok(Some(line.trim().to_string()))
    }

    /// Writes one line
    pub fn line(&mut self, text: impl Display) -> io::Result<()> {
        writeln!(self.output, "{text}")
    }

    /// Writes an empty line
    pub fn blank(&mut self) -> io::Result<()> {
        writeln!(self.output)
    }

    /// Writes a centered title between two rules
    pub fn header(&mut self, title: &str) -> io::Result<()> {
        let rule = "=".repeat(SCREEN_WIDTH);
        writeln!(self.output)?;
        writeln!(self.output, "{}", rule.as_str().cyan())?;
        writeln!(
            self.output,
            "{}",
            format!("{title:^width$}", width = SCREEN_WIDTH).cyan().bold()
        )?;
        writeln!(self.output, "{}", rule.as_str().cyan())?;
        writeln!(self.output)
    }

    /// Writes a thin separator followed by a section title
    pub fn section(&mut self, title: &str) -> io::Result<()> {
        writeln!(self.output)?;
        writeln!(self.output, "{}", "─".repeat(SCREEN_WIDTH).cyan())?;
        writeln!(self.output, "{}", title.yellow().bold())?;
        writeln!(self.output)
    }

    /// Writes an error message
    pub fn error(&mut self, message: impl Display) -> io::Result<()> {
        writeln!(self.output, "{} {}", "Error:".red().bold(), message)?;
        writeln!(self.output)
    }

    /// Returns the output stream, consuming the console
    pub fn into_output(self) -> W {
        self.output
    }
}

/// Whether a prompt answer asks to leave the current loop
pub fn is_exit_command(input: &str) -> bool {
    let input = input.trim().to_lowercase();
    EXIT_COMMANDS.contains(&input.as_str())
}

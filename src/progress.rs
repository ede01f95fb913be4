//! Live, line-stable progress display.
//!
//! The [`ProgressRenderer`] owns one line per job and rewrites a single line
//! in place when that job changes state. Where the lines end up is decided by
//! a [`ProgressSink`]: a real terminal, a plain log stream, or memory.
//!
//! The renderer is not internally synchronized. Callers that share it between
//! tasks must serialize access themselves.

use std::io::{self, Write};
use std::sync::{Arc, Mutex, PoisonError};

use console::{Style, Term};

use crate::job::JobOutcome;

/// Line-addressable output.
pub trait ProgressSink {
    /// Appends a line below everything printed so far.
    fn print_line(&mut self, line: &str) -> io::Result<()>;

    /// Overwrites the line `offset` lines above the cursor, which rests just
    /// below the last printed line. `offset` is at least 1.
    fn redraw_line(&mut self, offset: usize, line: &str) -> io::Result<()>;
}

impl<S: ProgressSink + ?Sized> ProgressSink for Box<S> {
    fn print_line(&mut self, line: &str) -> io::Result<()> {
        (**self).print_line(line)
    }

    fn redraw_line(&mut self, offset: usize, line: &str) -> io::Result<()> {
        (**self).redraw_line(offset, line)
    }
}

/// Cursor-addressed output on an interactive terminal.
pub struct TerminalSink {
    term: Term,
}

impl TerminalSink {
    pub fn stdout() -> Self {
        Self { term: Term::stdout() }
    }

    pub fn is_attended(&self) -> bool {
        self.term.is_term()
    }
}

impl ProgressSink for TerminalSink {
    fn print_line(&mut self, line: &str) -> io::Result<()> {
        self.term.write_line(line)
    }

    fn redraw_line(&mut self, offset: usize, line: &str) -> io::Result<()> {
        self.term.move_cursor_up(offset)?;
        self.term.clear_line()?;
        // write_line leaves the cursor one row below the rewritten line.
        self.term.write_line(line)?;
        if offset > 1 {
            self.term.move_cursor_down(offset - 1)?;
        }
        self.term.flush()
    }
}

/// Output to a stream that cannot move its cursor, such as a CI log.
/// A redraw becomes a fresh line carrying the new status.
pub struct PlainSink<W: Write> {
    out: W,
}

impl<W: Write> PlainSink<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }
}

impl<W: Write> ProgressSink for PlainSink<W> {
    fn print_line(&mut self, line: &str) -> io::Result<()> {
        writeln!(self.out, "{line}")?;
        self.out.flush()
    }

    fn redraw_line(&mut self, _offset: usize, line: &str) -> io::Result<()> {
        self.print_line(line)
    }
}

/// In-memory display. Clones share the same lines, so a test can hand one
/// clone to the orchestrator and inspect the other afterwards.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    lines: Arc<Mutex<Vec<String>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current display contents with color codes stripped.
    pub fn lines(&self) -> Vec<String> {
        self.lines
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|line| console::strip_ansi_codes(line).into_owned())
            .collect()
    }
}

impl ProgressSink for MemorySink {
    fn print_line(&mut self, line: &str) -> io::Result<()> {
        self.lines
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(line.to_string());
        Ok(())
    }

    fn redraw_line(&mut self, offset: usize, line: &str) -> io::Result<()> {
        let mut lines = self.lines.lock().unwrap_or_else(PoisonError::into_inner);
        let index = lines
            .len()
            .checked_sub(offset)
            .filter(|_| offset > 0)
            .ok_or_else(|| {
                io::Error::new(
                    io::ErrorKind::InvalidInput,
                    format!("no line {offset} rows above the cursor"),
                )
            })?;
        lines[index] = line.to_string();
        Ok(())
    }
}

/// Renders one status line per job, aligned to a common column.
pub struct ProgressRenderer<S> {
    labels: Vec<String>,
    width: usize,
    sink: S,
    green: Style,
    red: Style,
    yellow: Style,
    cyan: Style,
    white: Style,
}

impl<S: ProgressSink> ProgressRenderer<S> {
    /// Prepares labels for `names`, in order. Nothing is printed yet.
    pub fn new(names: &[String], sink: S) -> Self {
        let total = names.len();
        let labels: Vec<String> = names
            .iter()
            .enumerate()
            .map(|(i, name)| format!("[{}/{total}] Building SDK lib for {name}", i + 1))
            .collect();
        let width = labels.iter().map(|label| label.chars().count()).max().unwrap_or(0);

        Self {
            labels,
            width,
            sink,
            green: Style::new().green(),
            red: Style::new().red(),
            yellow: Style::new().yellow(),
            cyan: Style::new().cyan(),
            white: Style::new().white(),
        }
    }

    /// Prints every job as pending. The cursor ends below the block.
    pub fn render_pending(&mut self) -> io::Result<()> {
        for index in 0..self.labels.len() {
            let line = self.line(index, &JobOutcome::Pending);
            self.sink.print_line(&line)?;
        }
        Ok(())
    }

    /// Rewrites the line for job `index` to show `outcome`.
    pub fn update(&mut self, index: usize, outcome: &JobOutcome) -> io::Result<()> {
        if index >= self.labels.len() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("no progress line for job {index}"),
            ));
        }
        let offset = self.labels.len() - index;
        let line = self.line(index, outcome);
        self.sink.redraw_line(offset, &line)
    }

    fn line(&self, index: usize, outcome: &JobOutcome) -> String {
        let label = &self.labels[index];
        let padding = " ".repeat(self.width - label.chars().count() + 3);
        format!(
            "{}{padding} {}",
            self.white.apply_to(label),
            self.status(outcome)
        )
    }

    fn status(&self, outcome: &JobOutcome) -> String {
        match outcome {
            JobOutcome::Pending => self.yellow.apply_to("Pending").to_string(),
            JobOutcome::Running => self.cyan.apply_to("Building...").to_string(),
            JobOutcome::Succeeded => self.green.apply_to("✓ Success").to_string(),
            JobOutcome::Failed(_) => self.red.apply_to("✗ Failed").to_string(),
        }
    }
}

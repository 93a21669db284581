//! Console report emitter.
//!
//! Renders the session's decisions onto one output stream: check lines are
//! dot-padded so their result tokens align, section headers render bold,
//! and a transient spinner line tracks the section in flight. A write
//! failure (say, a broken pipe on the display) disables this sink for the
//! rest of the run; other sinks keep going.

use std::io::Write;

use wvrun_proto::{
    tally_line, CheckLine, Line, ReportSink, SectionRecord, TestingLine, RESULT_FAILED, RESULT_OK,
};

use crate::theme::Style;

/// Space reserved at the right edge for the result token.
const RESULT_RESERVE: usize = 8;

/// Narrower terminals than this get the minimum layout, not a panic.
const MIN_WIDTH: usize = 20;

const SPINNER: [char; 4] = ['-', '\\', '|', '/'];

/// Dot count so the result token starts at the result column, folding the
/// text's display position back into the terminal width when the text is
/// long enough to wrap.
fn dot_fill(head_len: usize, width: usize) -> usize {
    let width = width.max(MIN_WIDTH);
    let column = width - RESULT_RESERVE;
    let cursor = head_len % width;
    if cursor < column {
        column - cursor
    } else {
        width - cursor + column
    }
}

/// Render a check line: `text ...... result`, result colored by outcome.
pub(crate) fn format_check(check: &CheckLine, style: &Style) -> String {
    let head = format!("{}{} ", check.prefix, check.text);
    let color = if check.passed() { style.pass } else { style.fail };
    format!(
        "{}{} {}{}{}",
        head,
        ".".repeat(dot_fill(head.len(), style.width)),
        color,
        check.result,
        style.reset
    )
}

/// Render any line the way the console (and the per-test logs) shows it.
pub(crate) fn render_line(line: &Line, style: &Style) -> String {
    match line {
        Line::Testing(testing) => format!("{}{}{}", style.bold, testing, style.reset),
        Line::Check(check) => format_check(check, style),
        Line::Plain(_) | Line::Tag(_) => line.to_string(),
    }
}

/// The interactive report stream.
pub struct ConsoleSink<'a> {
    out: &'a mut dyn Write,
    style: Style,
    spinner: usize,
    progress_visible: bool,
    dead: bool,
}

impl<'a> ConsoleSink<'a> {
    #[must_use]
    pub fn new(out: &'a mut dyn Write, style: Style) -> Self {
        Self {
            out,
            style,
            spinner: 0,
            progress_visible: false,
            dead: false,
        }
    }

    fn clear_progress(&mut self) {
        if !self.progress_visible {
            return;
        }
        self.progress_visible = false;
        if self.out.write_all(b"\r\x1b[K").is_err() {
            self.dead = true;
        }
    }

    fn write_line(&mut self, text: &str) {
        if self.dead {
            return;
        }
        self.clear_progress();
        if writeln!(self.out, "{text}").is_err() {
            self.dead = true;
        }
    }
}

impl ReportSink for ConsoleSink<'_> {
    fn echo_line(&mut self, line: &Line) {
        self.write_line(&render_line(line, &self.style));
    }

    fn progress(&mut self, header: &TestingLine, failures: u64) {
        if self.dead || !self.style.progress {
            return;
        }
        let result = if failures > 0 { RESULT_FAILED } else { RESULT_OK };
        let pending = format_check(
            &header.outcome(result),
            &Style::plain(self.style.width),
        );
        let glyph = SPINNER[self.spinner % SPINNER.len()];
        self.spinner += 1;
        let mut shown: String = pending
            .chars()
            .take(self.style.width.saturating_sub(2))
            .collect();
        if shown.len() < pending.len() {
            shown.push('>');
        }
        if write!(self.out, "\r{glyph} {shown}\x1b[K").is_err() || self.out.flush().is_err() {
            self.dead = true;
            return;
        }
        self.progress_visible = true;
    }

    fn outcome(&mut self, check: &CheckLine) {
        self.write_line(&format_check(check, &self.style));
    }

    fn transcript(&mut self, lines: &[Line]) {
        for line in lines {
            self.write_line(&render_line(line, &self.style));
        }
    }

    fn section_closed(&mut self, record: &SectionRecord) {
        let _ = record;
        self.clear_progress();
    }

    fn tally(&mut self, tests: u64, failures: u64) {
        self.write_line(&tally_line(tests, failures));
    }
}

//! Report sink contract and the end-of-run tally.
//!
//! The session owns the pass/fail bookkeeping and *decides* what gets
//! reported; sinks only render. Several sinks usually listen at once (the
//! console, a report document, per-test logs), so [`MultiSink`] fans the
//! calls out in order.

use crate::line::{CheckLine, Line, TestingLine};
use crate::session::SectionRecord;

/// How much of the stream reaches the report output.
///
/// Ordered from least to most output: `Summary < Normal < Verbose`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Verbosity {
    /// One outcome line per section, nothing else.
    Summary,
    /// Outcome lines for passing sections, full transcripts for failures.
    Normal,
    /// Every line echoed as it arrives.
    Verbose,
}

/// Receiver for the session's reporting decisions.
///
/// The session calls these in stream order from a single thread. Hooks a
/// sink does not care about have no-op defaults.
pub trait ReportSink {
    /// A new section just opened.
    fn section_opened(&mut self, header: &TestingLine) {
        let _ = header;
    }

    /// A line arrived while a section was open, regardless of verbosity.
    /// Per-test log collaborators consume this; the console does not.
    fn section_line(&mut self, line: &Line) {
        let _ = line;
    }

    /// Echo one line immediately (verbose mode).
    fn echo_line(&mut self, line: &Line);

    /// The open section is still in flight; a transient progress indicator
    /// may be drawn. `failures` is the section's failure count so far.
    fn progress(&mut self, header: &TestingLine, failures: u64) {
        let _ = (header, failures);
    }

    /// A synthesized one-line outcome for a closed section.
    fn outcome(&mut self, check: &CheckLine);

    /// The full buffered transcript of a failed section.
    fn transcript(&mut self, lines: &[Line]);

    /// A section closed; records arrive in closing order, exactly once per
    /// section.
    fn section_closed(&mut self, record: &SectionRecord) {
        let _ = record;
    }

    /// End of run.
    fn tally(&mut self, tests: u64, failures: u64);
}

/// The exact end-of-run tally line. The `s` is omitted only when the count
/// is exactly 1.
#[must_use]
pub fn tally_line(tests: u64, failures: u64) -> String {
    format!(
        "WvTest: {} test{}, {} failure{}.",
        tests,
        plural(tests),
        failures,
        plural(failures)
    )
}

fn plural(count: u64) -> &'static str {
    if count == 1 {
        ""
    } else {
        "s"
    }
}

/// Fans every sink call out to a list of sinks, in order.
#[derive(Default)]
pub struct MultiSink<'a> {
    sinks: Vec<Box<dyn ReportSink + 'a>>,
}

impl<'a> MultiSink<'a> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, sink: Box<dyn ReportSink + 'a>) {
        self.sinks.push(sink);
    }
}

impl ReportSink for MultiSink<'_> {
    fn section_opened(&mut self, header: &TestingLine) {
        for sink in &mut self.sinks {
            sink.section_opened(header);
        }
    }

    fn section_line(&mut self, line: &Line) {
        for sink in &mut self.sinks {
            sink.section_line(line);
        }
    }

    fn echo_line(&mut self, line: &Line) {
        for sink in &mut self.sinks {
            sink.echo_line(line);
        }
    }

    fn progress(&mut self, header: &TestingLine, failures: u64) {
        for sink in &mut self.sinks {
            sink.progress(header, failures);
        }
    }

    fn outcome(&mut self, check: &CheckLine) {
        for sink in &mut self.sinks {
            sink.outcome(check);
        }
    }

    fn transcript(&mut self, lines: &[Line]) {
        for sink in &mut self.sinks {
            sink.transcript(lines);
        }
    }

    fn section_closed(&mut self, record: &SectionRecord) {
        for sink in &mut self.sinks {
            sink.section_closed(record);
        }
    }

    fn tally(&mut self, tests: u64, failures: u64) {
        for sink in &mut self.sinks {
            sink.tally(tests, failures);
        }
    }
}

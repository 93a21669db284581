//! Test-session state machine.
//!
//! A session is the ordered log of one run: it tracks the currently open
//! section, aggregates check and section failures, and drives the report
//! sink as lines arrive and sections close. Created once per run, mutated
//! only through [`Session::append`], finalized exactly once by
//! [`Session::done`].

use std::time::Instant;

use serde::Serialize;

use crate::line::{Line, TestingLine, RESULT_FAILED, RESULT_OK};
use crate::report::{ReportSink, Verbosity};

/// One closed section, as handed to report collaborators.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SectionRecord {
    pub location: String,
    pub title: String,
    /// Wall-clock seconds between the section opening and closing.
    pub seconds: f64,
    pub passed: bool,
    /// The rendered transcript, present only for failed sections.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub failure_detail: Vec<String>,
}

struct OpenSection {
    header: TestingLine,
    failures: u64,
    buffer: Vec<Line>,
    started: Instant,
}

impl OpenSection {
    fn new(header: TestingLine) -> Self {
        Self {
            header,
            failures: 0,
            buffer: Vec::new(),
            started: Instant::now(),
        }
    }
}

/// Aggregate state for one run of the protocol processor.
pub struct Session<'a> {
    verbosity: Verbosity,
    sink: Box<dyn ReportSink + 'a>,
    total_tests: u64,
    total_test_failures: u64,
    total_checks: u64,
    total_check_failures: u64,
    current: Option<OpenSection>,
    implicit_title: Option<TestingLine>,
}

impl<'a> Session<'a> {
    #[must_use]
    pub fn new(verbosity: Verbosity, sink: Box<dyn ReportSink + 'a>) -> Self {
        Self {
            verbosity,
            sink,
            total_tests: 0,
            total_test_failures: 0,
            total_checks: 0,
            total_check_failures: 0,
            current: None,
            implicit_title: None,
        }
    }

    /// Install a pending section title used when the stream starts without
    /// an explicit `Testing` line. The title is promoted to a real section
    /// start by the first non-blank line, and discarded if the stream opens
    /// with its own `Testing` line.
    pub fn set_implicit_title(&mut self, header: TestingLine) {
        self.implicit_title = Some(header);
    }

    /// Append one classified line. This is the only mutating entry point.
    pub fn append(&mut self, line: Line) {
        if let Some(pending) = self.implicit_title.take() {
            if line.is_blank() {
                // Blank lines neither promote nor discard the pending title.
                self.implicit_title = Some(pending);
            } else if !matches!(line, Line::Testing(_)) {
                // Promote: behave as if the pending header had been read
                // right before this line. An explicit header wins instead.
                self.append_line(Line::Testing(pending));
            }
        }
        self.append_line(line);
    }

    fn append_line(&mut self, line: Line) {
        if let Line::Testing(header) = &line {
            self.close_section();
            self.total_tests += 1;
            self.current = Some(OpenSection::new(header.clone()));
            self.sink.section_opened(header);
        }

        if let Line::Check(check) = &line {
            self.total_checks += 1;
            if !check.passed() {
                self.total_check_failures += 1;
                if let Some(open) = self.current.as_mut() {
                    open.failures += 1;
                }
            }
        }

        if let Some(open) = self.current.as_mut() {
            open.buffer.push(line.clone());
            self.sink.section_line(&line);
        }

        if self.verbosity >= Verbosity::Verbose {
            self.sink.echo_line(&line);
        } else if let Some(open) = self.current.as_ref() {
            self.sink.progress(&open.header, open.failures);
        }
    }

    fn close_section(&mut self) {
        let Some(open) = self.current.take() else {
            return;
        };
        let failed = open.failures > 0;

        if failed {
            self.total_test_failures += 1;
            match self.verbosity {
                // Verbose already streamed every line live.
                Verbosity::Verbose => {}
                Verbosity::Normal => self.sink.transcript(&open.buffer),
                Verbosity::Summary => self.sink.outcome(&open.header.outcome(RESULT_FAILED)),
            }
        } else if self.verbosity <= Verbosity::Normal {
            self.sink.outcome(&open.header.outcome(RESULT_OK));
        }

        let record = SectionRecord {
            location: open.header.location.clone(),
            title: open.header.title.clone(),
            seconds: open.started.elapsed().as_secs_f64(),
            passed: !failed,
            failure_detail: if failed {
                open.buffer.iter().map(ToString::to_string).collect()
            } else {
                Vec::new()
            },
        };
        self.sink.section_closed(&record);
    }

    /// Finalize the run: close any open section and emit the tally line.
    pub fn done(&mut self) {
        self.close_section();
        // A title that never saw a non-blank line is dropped, not promoted.
        self.implicit_title = None;
        self.sink.tally(self.total_tests, self.total_test_failures);
    }

    #[must_use]
    pub fn total_tests(&self) -> u64 {
        self.total_tests
    }

    #[must_use]
    pub fn total_test_failures(&self) -> u64 {
        self.total_test_failures
    }

    #[must_use]
    pub fn total_checks(&self) -> u64 {
        self.total_checks
    }

    #[must_use]
    pub fn total_check_failures(&self) -> u64 {
        self.total_check_failures
    }

    /// Run failure is defined purely by section failures.
    #[must_use]
    pub fn failed(&self) -> bool {
        self.total_test_failures > 0
    }
}

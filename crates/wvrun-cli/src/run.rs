//! `wvrun run`: supervise one command.

use std::io::Write;
use std::time::Duration;

use wvrun_proto::{Classifier, MultiSink, ReportSink, Session};
use wvrun_runner::{InterruptFlags, Supervisor};

use crate::args::{self, Options, Parsed};
use crate::console::ConsoleSink;
use crate::report_doc::ReportDocSink;
use crate::testlog::TestLogSink;
use crate::theme::{resolve_style, TermHints};

const HELP_TEXT: &str = "\
Supervise a command and summarize its WvTest output

Usage:
  wvrun run [flags] -- <command> [args...]

Flags:
      --color string    color output: auto, always, never (default auto)
  -h, --help            help for run
      --logdir string   write one log file per test section into this directory
      --prefix string   regex tolerated before structured lines
      --report string   write a JSON report document to this file
  -s, --summary         one line per test section
      --timeout int     watchdog timeout in seconds, 0 disables (default 100)
  -v, --verbose         echo every line as it arrives";

pub fn run_command(argv: &[String], stdout: &mut dyn Write, stderr: &mut dyn Write) -> i32 {
    let options = match args::parse(argv) {
        Ok(Parsed::Help) => {
            let _ = writeln!(stdout, "{HELP_TEXT}");
            return 0;
        }
        Ok(Parsed::Options(options)) => options,
        Err(message) => {
            let _ = writeln!(stderr, "Error: {message}");
            return 2;
        }
    };
    if options.rest.is_empty() {
        let _ = writeln!(stderr, "Error: command is required after --");
        return 2;
    }

    match execute(&options, stdout) {
        Ok(code) => code,
        Err(message) => {
            let _ = writeln!(stderr, "{message}");
            1
        }
    }
}

fn execute(options: &Options, stdout: &mut dyn Write) -> Result<i32, String> {
    let classifier = Classifier::with_prefix(&options.prefix).map_err(|err| err.to_string())?;
    let sink = build_sink(options, stdout)?;
    let mut session = Session::new(options.verbosity, sink);

    let mut supervisor = Supervisor::new(Duration::from_secs(options.timeout_seconds));
    // Without handlers the run still works; signals just stop forwarding.
    if let Ok(flags) = InterruptFlags::register() {
        supervisor = supervisor.with_interrupts(flags);
    }
    supervisor
        .run(&options.rest, &classifier, &mut session)
        .map_err(|err| err.to_string())?;

    session.done();
    Ok(exit_code(&session))
}

/// Console plus the optional file collaborators, fanned out in order.
pub(crate) fn build_sink<'a>(
    options: &Options,
    stdout: &'a mut dyn Write,
) -> Result<Box<dyn ReportSink + 'a>, String> {
    let style = resolve_style(options.color, &TermHints::detect());
    let mut multi = MultiSink::new();
    multi.push(Box::new(ConsoleSink::new(stdout, style)));
    if let Some(dir) = &options.logdir {
        multi.push(Box::new(TestLogSink::create(dir)?));
    }
    if let Some(path) = &options.report {
        multi.push(Box::new(ReportDocSink::new(path)));
    }
    Ok(Box::new(multi))
}

/// Non-zero exactly when at least one test section failed.
pub(crate) fn exit_code(session: &Session<'_>) -> i32 {
    if session.failed() {
        1
    } else {
        0
    }
}

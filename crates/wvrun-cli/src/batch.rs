//! `wvrun batch`: supervise a list of shell commands sequentially.
//!
//! Each non-empty, non-`#` line of the script runs through `sh -c` under
//! its own supervision pass; all passes share one session, so the tally
//! covers the whole batch.

use std::io::Write;
use std::time::Duration;

use wvrun_proto::{Classifier, Session};
use wvrun_runner::{InterruptFlags, Supervisor};

use crate::args::{self, Options, Parsed};
use crate::run::{build_sink, exit_code};

const HELP_TEXT: &str = "\
Supervise each command listed in a script file

Every non-empty line that does not start with '#' runs via 'sh -c',
sequentially, against one shared tally.

Usage:
  wvrun batch [flags] <script>

Flags:
      --color string    color output: auto, always, never (default auto)
  -h, --help            help for batch
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
    if options.rest.len() != 1 {
        let _ = writeln!(stderr, "Error: batch takes exactly one script file");
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
    let script = &options.rest[0];
    let content =
        std::fs::read_to_string(script).map_err(|err| format!("read {script}: {err}"))?;

    let classifier = Classifier::with_prefix(&options.prefix).map_err(|err| err.to_string())?;
    let sink = build_sink(options, stdout)?;
    let mut session = Session::new(options.verbosity, sink);

    let mut supervisor = Supervisor::new(Duration::from_secs(options.timeout_seconds));
    if let Ok(flags) = InterruptFlags::register() {
        supervisor = supervisor.with_interrupts(flags);
    }

    for line in content.lines() {
        let command_line = line.trim();
        if command_line.is_empty() || command_line.starts_with('#') {
            continue;
        }
        let command = vec![
            "sh".to_string(),
            "-c".to_string(),
            command_line.to_string(),
        ];
        supervisor
            .run_named(&command, command_line, &classifier, &mut session)
            .map_err(|err| err.to_string())?;
    }

    session.done();
    Ok(exit_code(&session))
}

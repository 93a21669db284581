//! `wvrun format`: reclassify pre-recorded WvTest logs.
//!
//! No supervisor and no watchdog: the files (or stdin) stream straight
//! through the classifier and the session, so a verbose capture can be
//! condensed to a summary after the fact.

use std::io::{BufRead, BufReader, Write};

use wvrun_proto::{Classifier, Session};

use crate::args::{self, Options, Parsed};
use crate::run::{build_sink, exit_code};

const HELP_TEXT: &str = "\
Reformat pre-recorded WvTest logs

Reads the given files (stdin when none) and renders them at the requested
verbosity, with the same tally and exit code a live run would produce.

Usage:
  wvrun format [flags] [file...]

Flags:
      --color string    color output: auto, always, never (default auto)
  -h, --help            help for format
      --logdir string   write one log file per test section into this directory
      --prefix string   regex tolerated before structured lines
      --report string   write a JSON report document to this file
  -s, --summary         one line per test section
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

    if options.rest.is_empty() {
        let stdin = std::io::stdin();
        feed(&mut session, &classifier, stdin.lock(), "stdin")?;
    } else {
        for path in &options.rest {
            let file =
                std::fs::File::open(path).map_err(|err| format!("open {path}: {err}"))?;
            feed(&mut session, &classifier, BufReader::new(file), path)?;
        }
    }

    session.done();
    Ok(exit_code(&session))
}

fn feed<R: BufRead>(
    session: &mut Session<'_>,
    classifier: &Classifier,
    reader: R,
    name: &str,
) -> Result<(), String> {
    for line in reader.lines() {
        let line = line.map_err(|err| format!("read {name}: {err}"))?;
        session.append(classifier.classify(&line));
    }
    Ok(())
}

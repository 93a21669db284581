//! Scenario tests for the subprocess supervisor.
//!
//! Each test launches a real shell command and asserts on the session's
//! tallies and on the synthetic check lines the supervisor folds in.

use std::cell::RefCell;
use std::io::Write;
use std::rc::Rc;
use std::time::{Duration, Instant};

use wvrun_proto::{CheckLine, Classifier, Line, ReportSink, Session, Verbosity};
use wvrun_runner::Supervisor;

/// Collects every line that reached an open section.
#[derive(Default, Clone)]
struct CollectSink {
    lines: Rc<RefCell<Vec<Line>>>,
}

impl CollectSink {
    fn checks(&self) -> Vec<CheckLine> {
        self.lines
            .borrow()
            .iter()
            .filter_map(|line| match line {
                Line::Check(check) => Some(check.clone()),
                _ => None,
            })
            .collect()
    }
}

impl ReportSink for CollectSink {
    fn section_line(&mut self, line: &Line) {
        self.lines.borrow_mut().push(line.clone());
    }

    fn echo_line(&mut self, _line: &Line) {}

    fn outcome(&mut self, _check: &CheckLine) {}

    fn transcript(&mut self, _lines: &[Line]) {}

    fn tally(&mut self, _tests: u64, _failures: u64) {}
}

fn supervise(timeout: Duration, script: &str) -> (u64, u64, u64, u64, Vec<CheckLine>) {
    let sink = CollectSink::default();
    let collected = sink.clone();
    let mut session = Session::new(Verbosity::Summary, Box::new(sink));
    let classifier = Classifier::new();
    let supervisor = Supervisor::new(timeout);
    let command = vec!["sh".to_string(), "-c".to_string(), script.to_string()];
    if let Err(err) = supervisor.run(&command, &classifier, &mut session) {
        panic!("supervise {script:?}: {err}");
    }
    session.done();
    (
        session.total_tests(),
        session.total_test_failures(),
        session.total_checks(),
        session.total_check_failures(),
        collected.checks(),
    )
}

#[test]
fn passing_command_counts_its_section() {
    let (tests, test_failures, checks, check_failures, _) = supervise(
        Duration::ZERO,
        "echo 'Testing \"cases\" in t/cases.t:'; echo '! one ok'; echo '! two ok'",
    );
    assert_eq!(tests, 1);
    assert_eq!(test_failures, 0);
    assert_eq!(checks, 2);
    assert_eq!(check_failures, 0);
}

#[test]
fn implicit_title_opens_a_section_for_bare_checks() {
    let (tests, test_failures, checks, _, _) =
        supervise(Duration::ZERO, "echo '! solo check ok'");
    assert_eq!(tests, 1);
    assert_eq!(test_failures, 0);
    assert_eq!(checks, 1);
}

#[test]
fn nonzero_exit_becomes_a_failing_check() {
    let (tests, test_failures, _, check_failures, checks) =
        supervise(Duration::ZERO, "exit 7");
    assert_eq!(tests, 1, "the synthetic check must open the implicit section");
    assert_eq!(test_failures, 1);
    assert_eq!(check_failures, 1);
    let exit_checks: Vec<&CheckLine> = checks
        .iter()
        .filter(|check| check.text.contains("exit code 7"))
        .collect();
    assert_eq!(exit_checks.len(), 1);
    assert!(!exit_checks[0].passed());
}

#[test]
fn exit_failure_lands_in_the_open_section() {
    let (tests, test_failures, _, _, _) = supervise(
        Duration::ZERO,
        "echo 'Testing \"good\" in t:'; echo '! fine ok'; exit 7",
    );
    // The synthetic check joins the section that is still open.
    assert_eq!(tests, 1);
    assert_eq!(test_failures, 1);
}

#[test]
fn exit_failure_does_not_disturb_closed_sections() {
    let (tests, test_failures, _, _, _) = supervise(
        Duration::ZERO,
        "echo 'Testing \"good\" in t:'; echo '! fine ok'; \
         echo 'Testing \"last\" in t:'; exit 7",
    );
    // "good" closed as passing before the exit failure arrived; only the
    // still-open "last" section absorbs the synthetic check.
    assert_eq!(tests, 2);
    assert_eq!(test_failures, 1);
}

#[test]
fn signal_death_becomes_a_failing_check() {
    let (_, test_failures, _, _, checks) =
        supervise(Duration::ZERO, "kill -TERM $$");
    assert_eq!(test_failures, 1);
    assert!(
        checks
            .iter()
            .any(|check| check.text.contains("killed by signal 15")),
        "got checks: {checks:?}"
    );
}

#[test]
fn watchdog_reports_silence_and_terminates_the_child() {
    let started = Instant::now();
    let (_, test_failures, _, _, checks) = supervise(
        Duration::from_secs(1),
        "echo '! warmup ok'; sleep 30",
    );
    assert!(
        started.elapsed() < Duration::from_secs(10),
        "watchdog must cut the run short"
    );
    assert_eq!(test_failures, 1);
    let alarms: Vec<&CheckLine> = checks
        .iter()
        .filter(|check| check.text.contains("Alarm timed out"))
        .collect();
    assert_eq!(alarms.len(), 1, "exactly one timeout report per silence");
    assert!(!alarms[0].passed());
}

#[test]
fn stderr_is_merged_into_the_stream() {
    let (tests, _, checks, check_failures, _) = supervise(
        Duration::ZERO,
        "echo 'Testing \"merged\" in t:'; echo '! from stderr ok' >&2",
    );
    assert_eq!(tests, 1);
    assert_eq!(checks, 1);
    assert_eq!(check_failures, 0);
}

#[test]
fn prerecorded_file_streams_through_the_child() {
    let dir = match tempfile::tempdir() {
        Ok(dir) => dir,
        Err(err) => panic!("tempdir: {err}"),
    };
    let path = dir.path().join("session.log");
    let mut file = match std::fs::File::create(&path) {
        Ok(file) => file,
        Err(err) => panic!("create {}: {err}", path.display()),
    };
    if let Err(err) = writeln!(
        file,
        "Testing \"replay\" in t/replay.t:\n! replayed check FAILED"
    ) {
        panic!("write fixture: {err}");
    }
    drop(file);

    let (tests, test_failures, checks, check_failures, _) = supervise(
        Duration::ZERO,
        &format!("cat {}; exit 0", path.display()),
    );
    assert_eq!(tests, 1);
    assert_eq!(test_failures, 1);
    assert_eq!(checks, 1);
    assert_eq!(check_failures, 1);
}

#[test]
fn empty_command_is_rejected() {
    let sink = CollectSink::default();
    let mut session = Session::new(Verbosity::Summary, Box::new(sink));
    let classifier = Classifier::new();
    let supervisor = Supervisor::new(Duration::ZERO);
    assert!(supervisor.run(&[], &classifier, &mut session).is_err());
}

#[test]
fn batch_of_commands_shares_one_session() {
    let sink = CollectSink::default();
    let mut session = Session::new(Verbosity::Summary, Box::new(sink));
    let classifier = Classifier::new();
    let supervisor = Supervisor::new(Duration::ZERO);
    for script in [
        "echo 'Testing \"first\" in t:'; echo '! a ok'",
        "echo 'Testing \"second\" in t:'; echo '! b FAILED'",
    ] {
        let command = vec!["sh".to_string(), "-c".to_string(), script.to_string()];
        if let Err(err) = supervisor.run_named(&command, script, &classifier, &mut session) {
            panic!("supervise {script:?}: {err}");
        }
    }
    session.done();
    assert_eq!(session.total_tests(), 2);
    assert_eq!(session.total_test_failures(), 1);
}

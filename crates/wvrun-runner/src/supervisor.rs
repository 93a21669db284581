//! Subprocess supervision.
//!
//! One supervised command runs at a time: the child is spawned into a fresh
//! process group with stdout and stderr piped, two reader threads merge the
//! chunks through a channel, and the supervising thread alone classifies
//! lines and mutates the session. Abnormal exits, signal deaths, and
//! watchdog timeouts all fold into the session as synthetic failing checks;
//! none of them abort the run.

use std::io::Read;
use std::process::{Command, ExitStatus, Stdio};
use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::thread;
use std::time::{Duration, Instant};

use thiserror::Error;
use wvrun_proto::{CheckLine, Classifier, Line, Session, TestingLine, RESULT_FAILED};

use crate::signals::{signal_process_group, InterruptFlags, SIGTERM};
use crate::watchdog::Watchdog;

/// Default inactivity timeout, in seconds.
pub const DEFAULT_TIMEOUT_SECONDS: u64 = 100;

/// Location stamped on sections synthesized by the supervisor itself.
const IMPLICIT_LOCATION: &str = "wvrun";

/// How often the read loop wakes to poll signals and the watchdog.
const POLL_INTERVAL: Duration = Duration::from_millis(100);

#[derive(Debug, Error)]
pub enum SuperviseError {
    #[error("empty command")]
    EmptyCommand,
    #[error("spawn {command}: {source}")]
    Spawn {
        command: String,
        source: std::io::Error,
    },
    #[error("wait {command}: {source}")]
    Wait {
        command: String,
        source: std::io::Error,
    },
    #[error("child stdout pipe unavailable")]
    StdoutUnavailable,
    #[error("child stderr pipe unavailable")]
    StderrUnavailable,
}

/// Runs commands under watchdog supervision against a shared session.
///
/// One instance may supervise several commands sequentially; each run
/// repeats the whole state machine, only the session carries over.
pub struct Supervisor {
    timeout: Duration,
    interrupts: Option<InterruptFlags>,
}

impl Supervisor {
    /// A zero `timeout` disables the watchdog.
    #[must_use]
    pub fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            interrupts: None,
        }
    }

    /// Attach interrupt/terminate flags to forward to the child's group.
    #[must_use]
    pub fn with_interrupts(mut self, flags: InterruptFlags) -> Self {
        self.interrupts = Some(flags);
        self
    }

    /// Supervise `command`, using its own words as the display name.
    pub fn run(
        &self,
        command: &[String],
        classifier: &Classifier,
        session: &mut Session<'_>,
    ) -> Result<(), SuperviseError> {
        let display = command.join(" ");
        self.run_named(command, &display, classifier, session)
    }

    /// Supervise `command` under an explicit display name. The name seeds
    /// the implicit section title and the synthetic failure lines.
    pub fn run_named(
        &self,
        command: &[String],
        display: &str,
        classifier: &Classifier,
        session: &mut Session<'_>,
    ) -> Result<(), SuperviseError> {
        let program = command.first().ok_or(SuperviseError::EmptyCommand)?;
        session.set_implicit_title(TestingLine::new(display, IMPLICIT_LOCATION));

        let mut cmd = Command::new(program);
        cmd.args(&command[1..]);
        cmd.stdin(Stdio::null());
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());
        #[cfg(unix)]
        {
            use std::os::unix::process::CommandExt;
            // New group: forwarded signals reach the child and its
            // descendants without touching the supervisor itself.
            cmd.process_group(0);
        }

        let mut child = cmd.spawn().map_err(|source| SuperviseError::Spawn {
            command: display.to_string(),
            source,
        })?;
        let pgid = child.id() as i32;

        let stdout = child
            .stdout
            .take()
            .ok_or(SuperviseError::StdoutUnavailable)?;
        let stderr = child
            .stderr
            .take()
            .ok_or(SuperviseError::StderrUnavailable)?;

        let (tx, rx) = mpsc::channel::<Vec<u8>>();
        let stdout_reader = thread::spawn({
            let tx = tx.clone();
            move || read_stream_chunks(stdout, tx)
        });
        let stderr_reader = thread::spawn({
            let tx = tx.clone();
            move || read_stream_chunks(stderr, tx)
        });
        drop(tx);

        let mut watchdog = Watchdog::new(self.timeout);
        watchdog.arm(Instant::now());
        let mut pending: Vec<u8> = Vec::new();

        loop {
            if let Some(signal) = self.interrupts.as_ref().and_then(InterruptFlags::take) {
                let _ = signal_process_group(pgid, signal);
            }
            match rx.recv_timeout(POLL_INTERVAL) {
                Ok(chunk) => {
                    watchdog.arm(Instant::now());
                    pending.extend_from_slice(&chunk);
                    let (lines, rest) = split_lines(&pending);
                    pending = rest;
                    for line in lines {
                        session.append(classifier.classify(&line));
                    }
                }
                Err(RecvTimeoutError::Timeout) => {
                    if watchdog.expired(Instant::now()) {
                        session.append(Line::Check(CheckLine::new(
                            &format!(
                                "Alarm timed out!  No test output for {} seconds.",
                                self.timeout.as_secs()
                            ),
                            RESULT_FAILED,
                        )));
                        let _ = signal_process_group(pgid, SIGTERM);
                    }
                }
                Err(RecvTimeoutError::Disconnected) => break,
            }
        }
        watchdog.disarm();

        if !pending.is_empty() {
            let tail = String::from_utf8_lossy(&pending).into_owned();
            session.append(classifier.classify(&tail));
        }

        let _ = stdout_reader.join();
        let _ = stderr_reader.join();

        let status = child.wait().map_err(|source| SuperviseError::Wait {
            command: display.to_string(),
            source,
        })?;
        if let Some(text) = exit_failure_text(display, &status) {
            session.append(Line::Check(CheckLine::new(&text, RESULT_FAILED)));
        }
        Ok(())
    }
}

fn read_stream_chunks<R: Read>(mut reader: R, tx: Sender<Vec<u8>>) -> Option<String> {
    let mut buf = [0u8; 8192];
    loop {
        match reader.read(&mut buf) {
            Ok(0) => return None,
            Ok(n) => {
                if tx.send(buf[..n].to_vec()).is_err() {
                    return None;
                }
            }
            Err(err) => return Some(err.to_string()),
        }
    }
}

/// Split complete lines off `buffer`, returning the undelimited remainder.
fn split_lines(buffer: &[u8]) -> (Vec<String>, Vec<u8>) {
    if buffer.is_empty() {
        return (Vec::new(), Vec::new());
    }
    let mut lines = Vec::new();
    let mut start = 0usize;
    for (idx, &b) in buffer.iter().enumerate() {
        if b == b'\n' {
            let part = &buffer[start..idx];
            let line = String::from_utf8_lossy(part)
                .trim_end_matches('\r')
                .to_string();
            lines.push(line);
            start = idx + 1;
        }
    }
    if start < buffer.len() {
        return (lines, buffer[start..].to_vec());
    }
    (lines, Vec::new())
}

fn exit_failure_text(display: &str, status: &ExitStatus) -> Option<String> {
    if status.success() {
        return None;
    }

    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return Some(format!("{display} killed by signal {signal}"));
        }
    }

    let code = status.code().unwrap_or(-1);
    Some(format!("{display} returned exit code {code}"))
}

#[cfg(test)]
mod tests {
    use super::split_lines;

    #[test]
    fn split_lines_returns_remainder_when_no_trailing_newline() {
        let (lines, rest) = split_lines(b"a\nb");
        assert_eq!(lines, vec!["a".to_string()]);
        assert_eq!(rest, b"b".to_vec());
    }

    #[test]
    fn split_lines_strips_carriage_returns() {
        let (lines, rest) = split_lines(b"one\r\ntwo\n");
        assert_eq!(lines, vec!["one".to_string(), "two".to_string()]);
        assert!(rest.is_empty());
    }

    #[test]
    fn split_lines_handles_empty_input() {
        let (lines, rest) = split_lines(b"");
        assert!(lines.is_empty());
        assert!(rest.is_empty());
    }
}

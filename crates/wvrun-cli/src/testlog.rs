//! Per-test log files.
//!
//! When `--logdir` is set, each section gets its own file: opened as the
//! section opens, fed every line belonging to the section, finished with
//! the section's outcome line, and closed on every exit path. Files use the
//! fixed 80-column non-colored rendering regardless of the terminal.
//! Logging is best-effort; an unwritable file silently skips that section.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use wvrun_proto::{
    CheckLine, Line, ReportSink, SectionRecord, TestingLine, RESULT_FAILED, RESULT_OK,
};

use crate::console::{format_check, render_line};
use crate::theme::Style;

/// Log files always use the fixed 80-column rendering.
const LOG_WIDTH: usize = 80;

pub struct TestLogSink {
    dir: PathBuf,
    style: Style,
    current: Option<BufWriter<File>>,
}

impl TestLogSink {
    pub fn create(dir: &Path) -> Result<Self, String> {
        std::fs::create_dir_all(dir)
            .map_err(|err| format!("create log directory {}: {err}", dir.display()))?;
        Ok(Self {
            dir: dir.to_path_buf(),
            style: Style::plain(LOG_WIDTH),
            current: None,
        })
    }

    /// `{location}-{title}.log`, title lowercased with spaces replaced by
    /// underscores. Locations may carry path separators; those become
    /// underscores too so every log lands directly in the directory.
    fn log_path(&self, location: &str, title: &str) -> PathBuf {
        let location = location.replace(['/', '\\'], "_");
        let title = title.to_lowercase().replace(' ', "_");
        self.dir.join(format!("{location}-{title}.log"))
    }
}

impl ReportSink for TestLogSink {
    fn section_opened(&mut self, header: &TestingLine) {
        let path = self.log_path(&header.location, &header.title);
        self.current = File::create(path).ok().map(BufWriter::new);
    }

    fn section_line(&mut self, line: &Line) {
        if let Some(writer) = self.current.as_mut() {
            let _ = writeln!(writer, "{}", render_line(line, &self.style));
        }
    }

    fn echo_line(&mut self, _line: &Line) {}

    fn outcome(&mut self, _check: &CheckLine) {}

    fn transcript(&mut self, _lines: &[Line]) {}

    fn section_closed(&mut self, record: &SectionRecord) {
        let Some(mut writer) = self.current.take() else {
            return;
        };
        let result = if record.passed { RESULT_OK } else { RESULT_FAILED };
        let outcome = CheckLine::new(&format!("{}  {}", record.location, record.title), result);
        let _ = writeln!(writer, "{}", format_check(&outcome, &self.style));
        let _ = writer.flush();
    }

    fn tally(&mut self, _tests: u64, _failures: u64) {}
}

#[cfg(test)]
mod tests {
    use wvrun_proto::{Classifier, ReportSink, SectionRecord, TestingLine};

    use super::TestLogSink;

    fn record(location: &str, title: &str, passed: bool) -> SectionRecord {
        SectionRecord {
            location: location.to_string(),
            title: title.to_string(),
            seconds: 0.0,
            passed,
            failure_detail: Vec::new(),
        }
    }

    #[test]
    fn writes_one_file_per_section() {
        let dir = match tempfile::tempdir() {
            Ok(dir) => dir,
            Err(err) => panic!("tempdir: {err}"),
        };
        let mut sink = match TestLogSink::create(dir.path()) {
            Ok(sink) => sink,
            Err(err) => panic!("create sink: {err}"),
        };
        let classifier = Classifier::new();

        let header = TestingLine::new("String Utils", "t_utils");
        sink.section_opened(&header);
        sink.section_line(&classifier.classify("Testing \"String Utils\" in t_utils:"));
        sink.section_line(&classifier.classify("! trims whitespace ok"));
        sink.section_closed(&record("t_utils", "String Utils", true));

        let path = dir.path().join("t_utils-string_utils.log");
        let content = match std::fs::read_to_string(&path) {
            Ok(content) => content,
            Err(err) => panic!("read {}: {err}", path.display()),
        };
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "Testing \"String Utils\" in t_utils:");
        assert!(lines[1].starts_with("trims whitespace ."));
        assert!(lines[1].ends_with(" ok"));
        assert!(lines[2].starts_with("t_utils  String Utils ."));
        assert!(lines[2].ends_with(" ok"));
    }

    #[test]
    fn failed_sections_get_a_failed_outcome() {
        let dir = match tempfile::tempdir() {
            Ok(dir) => dir,
            Err(err) => panic!("tempdir: {err}"),
        };
        let mut sink = match TestLogSink::create(dir.path()) {
            Ok(sink) => sink,
            Err(err) => panic!("create sink: {err}"),
        };
        let header = TestingLine::new("bad", "loc");
        sink.section_opened(&header);
        sink.section_closed(&record("loc", "bad", false));

        let content = match std::fs::read_to_string(dir.path().join("loc-bad.log")) {
            Ok(content) => content,
            Err(err) => panic!("read log: {err}"),
        };
        assert!(content.trim_end().ends_with(" FAILED"));
    }

    #[test]
    fn path_separators_in_locations_are_flattened() {
        let dir = match tempfile::tempdir() {
            Ok(dir) => dir,
            Err(err) => panic!("tempdir: {err}"),
        };
        let sink = match TestLogSink::create(dir.path()) {
            Ok(sink) => sink,
            Err(err) => panic!("create sink: {err}"),
        };
        let path = sink.log_path("t/deep/case.t", "My Test");
        assert_eq!(
            path.file_name().and_then(|name| name.to_str()),
            Some("t_deep_case.t-my_test.log")
        );
    }
}

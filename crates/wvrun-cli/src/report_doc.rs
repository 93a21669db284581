//! Structured report document.
//!
//! Collects one record per closed section and writes a single JSON
//! document at end of run: per-section location, title, elapsed seconds,
//! outcome, failure transcript, plus the aggregate totals.

use std::fs::File;
use std::path::{Path, PathBuf};

use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use wvrun_proto::{CheckLine, Line, ReportSink, SectionRecord};

#[derive(Debug, Serialize)]
struct ReportDocument<'a> {
    generated_at: String,
    total_tests: u64,
    total_failures: u64,
    tests: &'a [SectionRecord],
}

pub struct ReportDocSink {
    path: PathBuf,
    records: Vec<SectionRecord>,
}

impl ReportDocSink {
    #[must_use]
    pub fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
            records: Vec::new(),
        }
    }
}

impl ReportSink for ReportDocSink {
    fn echo_line(&mut self, _line: &Line) {}

    fn outcome(&mut self, _check: &CheckLine) {}

    fn transcript(&mut self, _lines: &[Line]) {}

    fn section_closed(&mut self, record: &SectionRecord) {
        self.records.push(record.clone());
    }

    fn tally(&mut self, tests: u64, failures: u64) {
        let document = ReportDocument {
            generated_at: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
            total_tests: tests,
            total_failures: failures,
            tests: &self.records,
        };
        let result = File::create(&self.path)
            .map_err(|err| err.to_string())
            .and_then(|file| {
                serde_json::to_writer_pretty(file, &document).map_err(|err| err.to_string())
            });
        if let Err(err) = result {
            eprintln!("wvrun: write report {}: {err}", self.path.display());
        }
    }
}

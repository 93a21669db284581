//! wvrun-proto: the WvTest line protocol.
//!
//! A WvTest stream is newline-delimited text where some lines carry
//! structured meaning: `Testing "<title>" in <location>:` opens a test
//! section, `! <text> <result>` reports a single check, and
//! `wvtest: <tag>` carries an out-of-band annotation. Everything else is
//! plain program output.
//!
//! This crate holds the protocol model: the classified-line sum type and
//! its grammar ([`line`]), the per-run aggregation state machine
//! ([`session`]), and the sink contract the session reports through
//! ([`report`]).

pub mod line;
pub mod report;
pub mod session;

pub use line::{
    CheckLine, Classifier, Line, PrefixPatternError, TagLine, TestingLine, RESULT_FAILED,
    RESULT_OK,
};
pub use report::{tally_line, MultiSink, ReportSink, Verbosity};
pub use session::{SectionRecord, Session};

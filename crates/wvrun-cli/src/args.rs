//! Shared flag parsing for the wvrun subcommands.
//!
//! Go-style rules: `--flag value` and `--flag=value` both work, `--` ends
//! flag parsing, and the first non-flag token also ends it (everything from
//! there on is the command or the file list).

use std::path::PathBuf;

use wvrun_proto::Verbosity;
use wvrun_runner::DEFAULT_TIMEOUT_SECONDS;

use crate::theme::ColorMode;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Options {
    pub verbosity: Verbosity,
    pub timeout_seconds: u64,
    pub color: ColorMode,
    pub report: Option<PathBuf>,
    pub logdir: Option<PathBuf>,
    pub prefix: String,
    /// Positional remainder: the command words, or the file list.
    pub rest: Vec<String>,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            verbosity: Verbosity::Normal,
            timeout_seconds: DEFAULT_TIMEOUT_SECONDS,
            color: ColorMode::Auto,
            report: None,
            logdir: None,
            prefix: String::new(),
            rest: Vec::new(),
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
pub enum Parsed {
    Options(Options),
    Help,
}

pub fn parse(argv: &[String]) -> Result<Parsed, String> {
    let mut out = Options::default();
    let mut verbose = false;
    let mut summary = false;
    let mut idx = 0usize;

    while idx < argv.len() {
        let token = &argv[idx];
        if token == "--" {
            out.rest = argv[idx + 1..].to_vec();
            break;
        }
        if !token.starts_with('-') {
            out.rest = argv[idx..].to_vec();
            break;
        }

        let (key, inline) = if let Some((k, v)) = token.split_once('=') {
            (k.to_string(), Some(v.to_string()))
        } else {
            (token.to_string(), None)
        };

        match key.as_str() {
            "-v" | "--verbose" => {
                verbose = true;
            }
            "-s" | "--summary" => {
                summary = true;
            }
            "--timeout" => {
                let raw = take_value(argv, &mut idx, inline, "--timeout")?;
                out.timeout_seconds = raw
                    .trim()
                    .parse::<u64>()
                    .map_err(|_| format!("invalid --timeout: {raw:?}"))?;
            }
            "--color" => {
                let raw = take_value(argv, &mut idx, inline, "--color")?;
                out.color = ColorMode::from_slug(&raw)
                    .ok_or_else(|| format!("invalid --color: {raw:?} (auto, always, never)"))?;
            }
            "--report" => {
                out.report = Some(PathBuf::from(take_value(argv, &mut idx, inline, "--report")?));
            }
            "--logdir" => {
                out.logdir = Some(PathBuf::from(take_value(argv, &mut idx, inline, "--logdir")?));
            }
            "--prefix" => {
                out.prefix = take_value(argv, &mut idx, inline, "--prefix")?;
            }
            "-h" | "--help" => return Ok(Parsed::Help),
            other => return Err(format!("unknown flag: {other}")),
        }
        idx += 1;
    }

    if verbose && summary {
        return Err("--verbose and --summary cannot be used together".to_string());
    }
    out.verbosity = if verbose {
        Verbosity::Verbose
    } else if summary {
        Verbosity::Summary
    } else {
        Verbosity::Normal
    };

    Ok(Parsed::Options(out))
}

fn take_value(
    argv: &[String],
    idx: &mut usize,
    inline: Option<String>,
    flag: &str,
) -> Result<String, String> {
    if let Some(value) = inline {
        return Ok(value);
    }
    *idx += 1;
    argv.get(*idx)
        .cloned()
        .ok_or_else(|| format!("missing value for {flag}"))
}

//! wvrun-cli: command-line surface for the WvTest protocol processor.

use std::io::Write;

pub mod args;
pub mod batch;
pub mod console;
pub mod format;
pub mod report_doc;
pub mod run;
pub mod testlog;
pub mod theme;

/// Captured output of one CLI invocation, for tests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: i32,
}

fn help_text() -> String {
    "\
wvrun supervises test programs and summarizes their WvTest output.

Usage:
  wvrun [command]

Available Commands:
  batch       Supervise each command listed in a script file
  format      Reformat pre-recorded WvTest logs
  help        Help about any command
  run         Supervise a command and summarize its WvTest output

Flags:
  -h, --help   help for wvrun

Use \"wvrun [command] --help\" for more information about a command.\n"
        .to_string()
}

pub fn run_from_env() -> i32 {
    let argv: Vec<String> = std::env::args().skip(1).collect();
    let mut stdout = std::io::stdout();
    let mut stderr = std::io::stderr();
    run_with_io(&argv, &mut stdout, &mut stderr)
}

pub fn run_with_io(argv: &[String], stdout: &mut dyn Write, stderr: &mut dyn Write) -> i32 {
    let Some((command, rest)) = argv.split_first() else {
        let _ = write!(stdout, "{}", help_text());
        return 0;
    };

    match command.as_str() {
        "-h" | "--help" | "help" => {
            let _ = write!(stdout, "{}", help_text());
            0
        }
        "run" => run::run_command(rest, stdout, stderr),
        "batch" => batch::run_command(rest, stdout, stderr),
        "format" => format::run_command(rest, stdout, stderr),
        other => {
            let _ = writeln!(stderr, "Error: unknown command \"{other}\" for \"wvrun\"");
            2
        }
    }
}

pub fn run_for_test(argv: &[&str]) -> CommandOutput {
    let owned: Vec<String> = argv.iter().map(|arg| (*arg).to_string()).collect();
    let mut stdout = Vec::new();
    let mut stderr = Vec::new();
    let exit_code = run_with_io(&owned, &mut stdout, &mut stderr);
    CommandOutput {
        stdout: String::from_utf8_lossy(&stdout).into_owned(),
        stderr: String::from_utf8_lossy(&stderr).into_owned(),
        exit_code,
    }
}

fn main() {
    let code = wvrun_cli::run_from_env();
    std::process::exit(code);
}

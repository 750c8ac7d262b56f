use std::process::ExitCode;

fn main() -> ExitCode {
    verse_cli::run()
}

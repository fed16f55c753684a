use clap::Parser;
use etfsig::cli::{run, Cli};

fn main() -> std::process::ExitCode {
    run(Cli::parse())
}

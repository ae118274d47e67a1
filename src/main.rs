use clap::Parser;
use tradebench::cli::{Cli, run};

fn main() -> std::process::ExitCode {
    run(Cli::parse())
}

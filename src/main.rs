mod cli;
mod execute;

use std::process::ExitCode;
use clap::{CommandFactory, Parser};
use colored::Colorize;
use crate::cli::CLI;

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    if std::env::args_os().len() <= 1 {
        if let Err(e) = CLI::command().print_help() {
            eprintln!("{} {}", "*".red(), e);
            return ExitCode::FAILURE;
        }
        return ExitCode::SUCCESS;
    }

    let cli = CLI::parse();
    match execute::execute(cli) {
        Ok(code) => code,
        Err(e) => {
            for line in describe(&e).lines() {
                eprintln!("{} {}", "*".red(), line);
            }
            ExitCode::FAILURE
        }
    }
}

/// The error followed by any causes its own message does not already repeat.
fn describe(error: &anyhow::Error) -> String {
    let mut message = error.to_string();
    for cause in error.chain().skip(1) {
        let cause = cause.to_string();
        if !message.contains(&cause) {
            message.push_str("\nCaused by: ");
            message.push_str(&cause);
        }
    }
    message
}

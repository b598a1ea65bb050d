#![allow(clippy::print_stderr)]

use clap::Parser;
use std::io::IsTerminal;

use unchain_cli::args::CliArgs;
use unchain_cli::driver::{self, EXIT_FAILURE};
use unchain_cli::reporter::Reporter;

fn main() {
    // Zero cost unless UNCHAIN_LOG or RUST_LOG is set.
    unchain_cli::tracing_config::init_tracing();

    let args = CliArgs::parse();
    let outcome = match driver::run(&args) {
        Ok(outcome) => outcome,
        Err(err) => {
            eprintln!("error: {err:#}");
            std::process::exit(EXIT_FAILURE);
        }
    };

    let reporter = Reporter::new(std::io::stdout().is_terminal());
    match reporter.render(&outcome, args.format, args.report) {
        Ok(text) => print!("{text}"),
        Err(err) => {
            eprintln!("error: failed to render output: {err}");
            std::process::exit(EXIT_FAILURE);
        }
    }
    if args.format == unchain_cli::args::OutputFormat::Text {
        let stderr_reporter = Reporter::new(std::io::stderr().is_terminal());
        eprint!("{}", stderr_reporter.render_diagnostics(&outcome.report.diagnostics));
    }
    std::process::exit(outcome.exit_code());
}

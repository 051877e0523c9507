use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use std::env;
use std::io;
use std::path::PathBuf;
use std::process::ExitCode;

use tlogcheck::{exit_status, logging, write_report, Conventions, Detector, FATAL_STATUS};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Check that the MSBuild builds of changed files succeeded and are newer than the files",
    long_about = None
)]
struct Args {
    /// Changed files to check (as passed by pre-commit)
    filenames: Vec<PathBuf>,

    /// Changed files given as an option, for hooks that pass them after a flag
    #[arg(long = "filenames", num_args = 1.., hide = true)]
    flagged_filenames: Vec<PathBuf>,

    /// Build type to check; repeat or separate with commas (default: Release)
    #[arg(long = "buildtype", short = 'b', value_name = "TYPE", value_delimiter = ',')]
    build_types: Vec<String>,

    /// TOML file merged over the built-in MSBuild conventions
    #[arg(long, short, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Print diagnostics to stderr
    #[arg(long, short)]
    verbose: bool,
}

/// Run the check and return the number of unique problems
fn run(args: &Args) -> Result<usize> {
    let conventions = Conventions::load(args.config.as_deref())?;

    let build_types = if args.build_types.is_empty() {
        conventions.check.build_types.clone()
    } else {
        args.build_types.clone()
    };

    let files: Vec<PathBuf> = args
        .filenames
        .iter()
        .chain(&args.flagged_filenames)
        .cloned()
        .collect();

    let base_dir = env::current_dir().context("Failed to determine the current directory")?;
    let detector = Detector::new(&conventions, &base_dir);
    let problems = detector.check_files(&files, &build_types)?;

    write_report(&problems, &mut io::stdout().lock())
}

fn main() -> ExitCode {
    // Usage errors must not look like a problem count
    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(err) => {
            let _ = err.print();
            return if err.use_stderr() {
                ExitCode::from(FATAL_STATUS)
            } else {
                ExitCode::SUCCESS
            };
        }
    };
    logging::init(args.verbose);

    match run(&args) {
        Ok(count) => ExitCode::from(exit_status(count)),
        Err(err) => {
            eprintln!("{} {:#}", "Error:".red().bold(), err);
            ExitCode::from(FATAL_STATUS)
        }
    }
}

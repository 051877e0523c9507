//! Printing detected problems and turning them into an exit status.

use crate::detector::DetectedProblem;

use anyhow::{Context, Result};
use colored::Colorize;
use std::collections::BTreeSet;
use std::io::Write;

/// Highest exit status used for a problem count
pub const MAX_PROBLEM_STATUS: u8 = 254;

/// Exit status for runs that could not complete
pub const FATAL_STATUS: u8 = 255;

/// Write one line per problem message and return the number of unique problems
pub fn write_report<W: Write>(
    problems: &BTreeSet<DetectedProblem>,
    out: &mut W,
) -> Result<usize> {
    for problem in problems {
        for message in problem.messages() {
            let line = if problem.build {
                message.yellow()
            } else {
                message.red()
            };
            writeln!(out, "{}", line).context("Failed to write report")?;
        }
    }
    out.flush().context("Failed to write report")?;

    Ok(problems.len())
}

/// The problem count as an exit status, kept clear of the fatal status
pub fn exit_status(count: usize) -> u8 {
    u8::try_from(count)
        .unwrap_or(MAX_PROBLEM_STATUS)
        .min(MAX_PROBLEM_STATUS)
}

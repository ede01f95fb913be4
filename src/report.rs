//! What the command line prints and returns once a run is over.

use std::io::{self, Write};

use console::Style;

use crate::orchestrator::RunReport;

pub const EXIT_SUCCESS: u8 = 0;
pub const EXIT_BUILD_FAILED: u8 = 1;
/// Bad configuration, wrong directory, or a broken display.
pub const EXIT_ENVIRONMENT: u8 = 2;

pub fn exit_status(report: &RunReport) -> u8 {
    if report.result.is_success() {
        EXIT_SUCCESS
    } else {
        EXIT_BUILD_FAILED
    }
}

/// Prints the failing job's log once, then a one-line summary naming it.
/// A successful run prints nothing; its status lines already say it all.
pub fn report_failure(out: &mut impl Write, report: &RunReport) -> io::Result<()> {
    let Some(failure) = report.result.failure() else {
        return Ok(());
    };

    let red = Style::new().red().for_stderr();
    writeln!(out)?;
    writeln!(
        out,
        "{}",
        red.clone()
            .bold()
            .apply_to(format!("===== Build Error in {}:", failure.job))
    )?;
    writeln!(out, "{}", red.apply_to(failure.detail.trim_end()))?;

    let skipped: Vec<&str> = report.not_run().collect();
    if skipped.is_empty() {
        writeln!(out, "build failed for {}", failure.job)
    } else {
        writeln!(
            out,
            "build failed for {} (not run: {})",
            failure.job,
            skipped.join(", ")
        )
    }
}

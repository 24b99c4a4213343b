//! Report row and track_id counts for both inputs, their rejoin and the
//! persisted tracks table. Read-only: nothing is written.
//!
//! Usage: check-duplicates

use anyhow::Result;
use clap::Parser;
use std::process::ExitCode;
use track_consolidator::audit::run_audit;
use track_consolidator::config::DataPaths;
use track_consolidator::error::missing_input;
use track_consolidator::pipeline::missing_input_line;

#[derive(Parser)]
#[command(name = "check-duplicates")]
#[command(about = "Check track_id uniqueness in the input CSVs, after the merge and in app_data.db")]
struct Args {}

fn main() -> Result<ExitCode> {
    let _args = Args::parse();
    let paths = DataPaths::beside_executable()?;

    let report = match run_audit(&paths) {
        Ok(report) => report,
        Err(err) => {
            if let Some(missing) = missing_input(&err) {
                println!("{}", missing_input_line(missing));
                return Ok(ExitCode::FAILURE);
            }
            return Err(err);
        }
    };

    for line in report.lines() {
        println!("{}", line);
    }

    Ok(ExitCode::SUCCESS)
}

use anyhow::Result;
use clap::Parser;
use std::process::ExitCode;
use std::time::Instant;
use track_consolidator::config::DataPaths;
use track_consolidator::error::missing_input;
use track_consolidator::pipeline::{missing_input_line, run_consolidation};
use track_consolidator::progress::{format_duration, set_log_only};

#[derive(Parser)]
#[command(name = "track-consolidator")]
#[command(about = "Merge track features with popularity, dedupe by track_id and write app_data.db")]
struct Args {
    /// Hide progress bars and print plain status lines
    #[arg(long)]
    log_only: bool,
}

fn main() -> Result<ExitCode> {
    let args = Args::parse();
    set_log_only(args.log_only);

    let start = Instant::now();
    let paths = DataPaths::beside_executable()?;

    let result = match run_consolidation(&paths) {
        Ok(result) => result,
        Err(err) => {
            if let Some(missing) = missing_input(&err) {
                println!("{}", missing_input_line(missing));
                return Ok(ExitCode::FAILURE);
            }
            return Err(err);
        }
    };

    let file_size = std::fs::metadata(&paths.store)?.len();

    println!("\n{:=<60}", "");
    println!("Consolidation complete!");
    println!("  Joined rows: {}", result.joined_rows);
    println!("  Duplicates removed: {}", result.duplicates_removed);
    println!("  Tracks: {}", result.table.len());
    println!("  Output size: {:.2} MB", file_size as f64 / 1_048_576.0);
    println!("  Elapsed: {}", format_duration(start.elapsed()));
    println!("{:=<60}", "");

    Ok(ExitCode::SUCCESS)
}

//! Console progress for the consolidation steps.
//!
//! Each step runs under a spinner (or a bar while rows are written) and
//! leaves one status line behind. In log-only mode nothing is drawn and the
//! status lines are printed plainly, so the output stays readable when
//! redirected to a file.

use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

const BAR_TEMPLATE: &str = "{msg} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} rows ({per_sec})";
const SPINNER_TEMPLATE: &str = "{msg} {spinner} [{elapsed_precise}]";

/// Set from `--log-only` before any step starts.
pub static LOG_ONLY: AtomicBool = AtomicBool::new(false);

/// Switch log-only mode on or off for the whole process.
pub fn set_log_only(value: bool) {
    LOG_ONLY.store(value, Ordering::Relaxed);
}

/// Whether bars and spinners are suppressed.
pub fn is_log_only() -> bool {
    LOG_ONLY.load(Ordering::Relaxed)
}

/// Elapsed time for the run summary: milliseconds under a second, seconds
/// under a minute, minutes beyond.
pub fn format_duration(d: Duration) -> String {
    let secs = d.as_secs_f64();
    if secs < 1.0 {
        format!("{}ms", d.as_millis())
    } else if secs < 60.0 {
        format!("{:.1}s", secs)
    } else {
        format!("{:.1}m", secs / 60.0)
    }
}

fn styled(pb: ProgressBar, style: impl FnOnce() -> ProgressStyle) -> ProgressBar {
    if is_log_only() {
        pb.set_draw_target(ProgressDrawTarget::hidden());
    } else {
        pb.set_style(style());
    }
    pb
}

/// Bar for the row-insert phase; hidden in log-only mode.
pub fn create_progress_bar(len: u64, msg: &str) -> ProgressBar {
    let pb = styled(ProgressBar::new(len), || {
        ProgressStyle::with_template(BAR_TEMPLATE)
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=> ")
    });
    pb.set_message(msg.to_string());
    pb
}

/// In log-only mode, print `[phase] current/total` every `interval` rows and
/// on the last one. Silent otherwise, since the bar shows the same thing.
pub fn log_progress(phase: &str, current: u64, total: u64, interval: u64) {
    if !is_log_only() || total == 0 {
        return;
    }
    if current % interval == 0 || current == total {
        let pct = 100.0 * current as f64 / total as f64;
        eprintln!("[{}] {}/{} ({:.1}%)", phase, current, total, pct);
    }
}

/// Spinner for a step of unknown length, such as loading a CSV.
pub fn create_spinner(msg: &str) -> ProgressBar {
    let pb = styled(ProgressBar::new_spinner(), || {
        ProgressStyle::with_template(SPINNER_TEMPLATE).unwrap_or_else(|_| ProgressStyle::default_spinner())
    });
    if !is_log_only() {
        pb.enable_steady_tick(Duration::from_millis(100));
    }
    pb.set_message(msg.to_string());
    pb
}

/// Replace a spinner with its final status line.
pub fn finish_step(pb: &ProgressBar, line: impl Into<String>) {
    let line = line.into();
    if is_log_only() {
        pb.finish_and_clear();
        println!("{}", line);
    } else {
        pb.set_style(ProgressStyle::with_template("{msg}").unwrap_or_else(|_| ProgressStyle::default_spinner()));
        pb.finish_with_message(line);
    }
}

/// Clear a spinner without leaving a line, for steps that fail.
pub fn abandon_step(pb: &ProgressBar) {
    pb.finish_and_clear();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(Duration::from_millis(250)), "250ms");
        assert_eq!(format_duration(Duration::from_millis(1500)), "1.5s");
        assert_eq!(format_duration(Duration::from_secs(90)), "1.5m");
    }

    #[test]
    fn test_hidden_bar_still_counts() {
        let pb = ProgressBar::hidden();
        pb.set_length(3);
        pb.inc(2);
        assert_eq!(pb.position(), 2);
        finish_step(&pb, "done");
        assert!(pb.is_finished());
    }

    #[test]
    fn test_bar_tracks_length() {
        let pb = create_progress_bar(5, "Writing rows");
        assert_eq!(pb.length(), Some(5));
        abandon_step(&pb);
        assert!(pb.is_finished());
    }
}

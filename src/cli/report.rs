//! Timing and call-count report printed after an update.

use std::time::{Duration, Instant};

use crate::github::QueryCounts;

/// Collects how long each step of a run took.
#[derive(Debug, Default)]
pub struct Timings {
    steps: Vec<(String, Duration)>,
}

impl Timings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `f`, returning its result and elapsed time.
    pub fn measure<T>(f: impl FnOnce() -> T) -> (T, Duration) {
        let start = Instant::now();
        let value = f();
        (value, start.elapsed())
    }

    /// Record and print one step.
    pub fn record(&mut self, label: &str, elapsed: Duration) {
        println!("{}", timing_line(label, elapsed));
        self.steps.push((label.to_string(), elapsed));
    }

    pub fn total(&self) -> Duration {
        self.steps.iter().map(|(_, elapsed)| *elapsed).sum()
    }
}

/// Seconds above one second, milliseconds below, right-aligned in 12 columns.
pub fn format_elapsed(elapsed: Duration) -> String {
    let secs = elapsed.as_secs_f64();
    let text = if secs > 1.0 {
        format!("{:.4} s ", secs)
    } else {
        format!("{:.4} ms", secs * 1000.0)
    };
    format!("{:>12}", text)
}

pub fn timing_line(label: &str, elapsed: Duration) -> String {
    format!("{:<23}{}", format!("   {}:", label), format_elapsed(elapsed))
}

/// Print the total time and the per-operation remote call counts.
pub fn print_summary(timings: &Timings, counts: &QueryCounts) {
    println!(
        "{:<21}{:>11} s",
        "Total function time:",
        format!("{:.4}", timings.total().as_secs_f64())
    );
    println!("Total GitHub GraphQL API calls: {:>3}", counts.total());
    for (op, count) in counts.iter() {
        println!("{:<28} {:>6}", format!("   {}:", op), count);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_elapsed_milliseconds() {
        assert_eq!(format_elapsed(Duration::from_micros(12_345)), "  12.3450 ms");
    }

    #[test]
    fn test_format_elapsed_seconds() {
        assert_eq!(format_elapsed(Duration::from_millis(2_500)), "   2.5000 s ");
    }

    #[test]
    fn test_timing_line_pads_label() {
        let line = timing_line("account data", Duration::from_millis(5));
        assert!(line.starts_with("   account data:        "));
        assert_eq!(line.len(), 23 + 12);
    }

    #[test]
    fn test_total_sums_steps() {
        let mut timings = Timings::new();
        timings.record("a", Duration::from_millis(5));
        timings.record("b", Duration::from_millis(7));
        assert_eq!(timings.total(), Duration::from_millis(12));
    }
}

//! Timing helpers for case and suite durations

use std::time::{Duration, Instant};

/// Measures one case, or one bounded HAL call
#[derive(Debug)]
pub struct Timer {
    started: Instant,
    label: String,
}

impl Timer {
    pub fn start(label: impl Into<String>) -> Self {
        Self {
            started: Instant::now(),
            label: label.into(),
        }
    }

    pub fn elapsed_ms(&self) -> u64 {
        self.started.elapsed().as_millis() as u64
    }

    /// Whether more than `limit` has passed since the start
    pub fn exceeded(&self, limit: Duration) -> bool {
        self.started.elapsed() > limit
    }

    /// Consume the timer, returning milliseconds
    pub fn stop(self) -> u64 {
        let ms = self.elapsed_ms();
        tracing::trace!(label = %self.label, ms, "timer stopped");
        ms
    }
}

/// Per-suite durations of one run
#[derive(Debug)]
pub struct Stopwatch {
    started: Instant,
    last_lap: Instant,
    laps: Vec<(String, Duration)>,
}

impl Stopwatch {
    pub fn new() -> Self {
        let now = Instant::now();
        Self {
            started: now,
            last_lap: now,
            laps: Vec::new(),
        }
    }

    /// Close the current lap and return its length
    pub fn lap(&mut self, label: impl Into<String>) -> Duration {
        let now = Instant::now();
        let lap = now - self.last_lap;
        self.last_lap = now;
        self.laps.push((label.into(), lap));
        lap
    }

    pub fn total(&self) -> Duration {
        self.started.elapsed()
    }

    pub fn laps(&self) -> &[(String, Duration)] {
        &self.laps
    }

    /// One aligned line per lap plus the total
    pub fn format(&self) -> String {
        let width = self.laps.iter().map(|(label, _)| label.len()).max().unwrap_or(0).max(5);
        let mut lines: Vec<String> = self
            .laps
            .iter()
            .map(|(label, lap)| format!("  {label:<width$}  {:>7}ms", lap.as_millis()))
            .collect();
        lines.push(format!("  {:<width$}  {:>7}ms", "total", self.total().as_millis()));
        lines.join("\n")
    }
}

impl Default for Stopwatch {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread::sleep;

    #[test]
    fn test_timer_limit() {
        let timer = Timer::start("wifi_waitForScanResults");
        sleep(Duration::from_millis(10));
        assert!(timer.elapsed_ms() >= 10);
        assert!(timer.exceeded(Duration::from_millis(5)));
        assert!(!timer.exceeded(Duration::from_secs(60)));
        assert!(timer.stop() >= 10);
    }

    #[test]
    fn test_laps_are_not_cumulative() {
        let mut sw = Stopwatch::new();
        sleep(Duration::from_millis(20));
        let first = sw.lap("L1 wifi-hal noinit");
        let second = sw.lap("L1 wifi-hal init");

        assert!(first >= Duration::from_millis(20));
        assert!(second < first);
        assert_eq!(sw.laps().len(), 2);
        assert!(sw.total() >= first + second);

        let report = sw.format();
        assert_eq!(report.lines().count(), 3);
        assert!(report.lines().last().unwrap().trim_start().starts_with("total"));
    }
}

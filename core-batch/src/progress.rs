//! # Progress & ETA
//!
//! Whole-run moving average: `per_item = elapsed / processed` and
//! `eta = per_item * remaining`. Noisy for the first few items, stable later.

use chrono::{DateTime, Utc};
use std::time::Duration;

/// Counters of one batch run.
#[derive(Debug, Clone)]
pub struct ProgressState {
    processed: usize,
    total: usize,
    started_at: DateTime<Utc>,
}

/// Point-in-time view of a run's progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressSnapshot {
    pub processed: usize,
    pub total: usize,
    pub elapsed: Duration,
    /// `None` until the first item completes
    pub eta: Option<Duration>,
}

impl ProgressSnapshot {
    pub fn remaining(&self) -> usize {
        self.total.saturating_sub(self.processed)
    }

    /// Progress percentage (0-100)
    pub fn percent(&self) -> u8 {
        if self.total == 0 {
            return 100;
        }
        ((self.processed.min(self.total) * 100) / self.total) as u8
    }
}

impl ProgressState {
    pub fn start(total: usize, now: DateTime<Utc>) -> Self {
        Self {
            processed: 0,
            total,
            started_at: now,
        }
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// Count one finished item and return the refreshed snapshot.
    pub fn record_completion(&mut self, now: DateTime<Utc>) -> ProgressSnapshot {
        self.processed = (self.processed + 1).min(self.total);
        self.snapshot(now)
    }

    pub fn snapshot(&self, now: DateTime<Utc>) -> ProgressSnapshot {
        let elapsed = (now - self.started_at).to_std().unwrap_or_default();
        let remaining = self.total.saturating_sub(self.processed);

        let eta = if self.processed == 0 {
            None
        } else {
            let per_item = elapsed / self.processed as u32;
            Some(per_item * remaining as u32)
        };

        ProgressSnapshot {
            processed: self.processed,
            total: self.total,
            elapsed,
            eta,
        }
    }
}

/// Render a duration as its two most significant non-zero units.
///
/// ```
/// use core_batch::progress::format_duration;
/// use std::time::Duration;
///
/// assert_eq!(format_duration(Duration::from_secs(93_784)), "1 day, 2 hours");
/// assert_eq!(format_duration(Duration::from_secs(61)), "1 minute, 1 second");
/// assert_eq!(format_duration(Duration::ZERO), "0 seconds");
/// ```
pub fn format_duration(duration: Duration) -> String {
    let total = duration.as_secs();
    let units = [
        (total / 86_400, "day"),
        ((total % 86_400) / 3_600, "hour"),
        ((total % 3_600) / 60, "minute"),
        (total % 60, "second"),
    ];

    let Some(first) = units.iter().position(|(value, _)| *value > 0) else {
        return "0 seconds".to_string();
    };

    units[first..]
        .iter()
        .take(2)
        .filter(|(value, _)| *value > 0)
        .map(|(value, unit)| plural(*value, unit))
        .collect::<Vec<_>>()
        .join(", ")
}

fn plural(value: u64, unit: &str) -> String {
    if value == 1 {
        format!("{} {}", value, unit)
    } else {
        format!("{} {}s", value, unit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
    }

    #[test]
    fn test_eta_is_whole_run_average() {
        let mut progress = ProgressState::start(10, at(0));
        assert_eq!(progress.snapshot(at(0)).eta, None);

        let first = progress.record_completion(at(4));
        assert_eq!(first.processed, 1);
        assert_eq!(first.elapsed, Duration::from_secs(4));
        assert_eq!(first.eta, Some(Duration::from_secs(36)));

        progress.record_completion(at(5));
        let third = progress.record_completion(at(6));
        // 6s over 3 items, 7 left
        assert_eq!(third.eta, Some(Duration::from_secs(14)));
        assert_eq!(third.percent(), 30);
        assert_eq!(third.remaining(), 7);
    }

    #[test]
    fn test_completion_never_exceeds_total() {
        let mut progress = ProgressState::start(1, at(0));
        progress.record_completion(at(1));
        let snapshot = progress.record_completion(at(2));
        assert_eq!(snapshot.processed, 1);
        assert_eq!(snapshot.eta, Some(Duration::ZERO));
        assert_eq!(snapshot.percent(), 100);
    }

    #[test]
    fn test_clock_going_backwards_clamps_elapsed() {
        let progress = ProgressState::start(3, at(10));
        assert_eq!(progress.snapshot(at(5)).elapsed, Duration::ZERO);
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(Duration::ZERO), "0 seconds");
        assert_eq!(format_duration(Duration::from_millis(900)), "0 seconds");
        assert_eq!(format_duration(Duration::from_secs(1)), "1 second");
        assert_eq!(format_duration(Duration::from_secs(45)), "45 seconds");
        assert_eq!(format_duration(Duration::from_secs(181)), "3 minutes, 1 second");
        assert_eq!(format_duration(Duration::from_secs(3_600)), "1 hour");
        assert_eq!(format_duration(Duration::from_secs(3_605)), "1 hour");
        assert_eq!(format_duration(Duration::from_secs(7_320)), "2 hours, 2 minutes");
        assert_eq!(format_duration(Duration::from_secs(2 * 86_400 + 59)), "2 days");
        assert_eq!(format_duration(Duration::from_secs(86_400 + 3_600)), "1 day, 1 hour");
    }
}

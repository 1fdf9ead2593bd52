//! Throughput and ETA arithmetic
//!
//! All rates use post-dedup counts: an item counts once, when it is first
//! added to the dedup index.

use crate::checkpoint::Checkpoint;
use crate::state::CrawlPlan;
use std::fmt;

/// Completion fraction, throughput and time remaining
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProgressEstimate {
    pub fraction_done: f64,
    pub items_per_second: f64,
    /// Zero when the rate is unknown
    pub eta_seconds: f64,
}

/// Estimates progress toward `target` after `elapsed_secs` seconds
///
/// A zero elapsed time gives a zero rate; a zero rate gives a zero ETA
/// rather than an infinite one.
pub fn estimate(total_items: u64, target: u64, elapsed_secs: f64) -> ProgressEstimate {
    let fraction_done = if target == 0 {
        1.0
    } else {
        (total_items as f64 / target as f64).min(1.0)
    };

    let items_per_second = if elapsed_secs > 0.0 {
        total_items as f64 / elapsed_secs
    } else {
        0.0
    };

    let eta_seconds = if items_per_second > 0.0 {
        target.saturating_sub(total_items) as f64 / items_per_second
    } else {
        0.0
    };

    ProgressEstimate {
        fraction_done,
        items_per_second,
        eta_seconds,
    }
}

/// Derived run statistics, recomputed from checkpoint fields
#[derive(Debug, Clone, PartialEq)]
pub struct RunStats {
    pub total_items: u64,
    pub target_items: u64,
    pub pages_processed: u64,
    pub elapsed_secs: f64,
    pub estimate: ProgressEstimate,
    /// Fraction of the keyword × page plan covered by the saved cursor
    pub page_fraction: f64,
}

impl RunStats {
    pub fn compute(checkpoint: &Checkpoint, plan: &CrawlPlan, target: u64, now: f64) -> Self {
        let elapsed_secs = checkpoint.elapsed(now);
        let page_fraction = checkpoint
            .cursor()
            .map(|cell| plan.page_fraction(cell))
            .unwrap_or(0.0);

        Self {
            total_items: checkpoint.total_items,
            target_items: target,
            pages_processed: checkpoint.jobs_per_page.len() as u64,
            elapsed_secs,
            estimate: estimate(checkpoint.total_items, target, elapsed_secs),
            page_fraction,
        }
    }

    pub fn target_reached(&self) -> bool {
        self.total_items >= self.target_items
    }
}

impl fmt::Display for RunStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{} items ({:.1}%), pages {:.1}%, {:.2} items/s, elapsed {}, ETA {}",
            self.total_items,
            self.target_items,
            self.estimate.fraction_done * 100.0,
            self.page_fraction * 100.0,
            self.estimate.items_per_second,
            format_duration(self.elapsed_secs),
            format_duration(self.estimate.eta_seconds),
        )
    }
}

/// Formats seconds as `1h 02m 03s`
pub fn format_duration(seconds: f64) -> String {
    let total = if seconds.is_finite() && seconds > 0.0 {
        seconds.round() as u64
    } else {
        0
    };
    let (h, m, s) = (total / 3600, (total % 3600) / 60, total % 60);
    if h > 0 {
        format!("{}h {:02}m {:02}s", h, m, s)
    } else if m > 0 {
        format!("{}m {:02}s", m, s)
    } else {
        format!("{}s", s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_estimate_rate_and_eta() {
        let est = estimate(300, 3000, 600.0);
        assert!((est.items_per_second - 0.5).abs() < 1e-9);
        assert!((est.eta_seconds - 5400.0).abs() < 1e-9);
        assert!((est.fraction_done - 0.1).abs() < 1e-9);
    }

    #[test]
    fn test_zero_elapsed_reports_zero() {
        let est = estimate(10, 100, 0.0);
        assert_eq!(est.items_per_second, 0.0);
        assert_eq!(est.eta_seconds, 0.0);
    }

    #[test]
    fn test_zero_items_reports_zero_eta() {
        let est = estimate(0, 100, 120.0);
        assert_eq!(est.items_per_second, 0.0);
        assert_eq!(est.eta_seconds, 0.0);
        assert_eq!(est.fraction_done, 0.0);
    }

    #[test]
    fn test_past_target_is_capped() {
        let est = estimate(120, 100, 10.0);
        assert_eq!(est.fraction_done, 1.0);
        assert_eq!(est.eta_seconds, 0.0);
    }

    #[test]
    fn test_run_stats_from_checkpoint() {
        let plan = CrawlPlan::new(vec!["a".to_string(), "b".to_string()], 50);
        let mut checkpoint = Checkpoint::fresh(1000.0);
        checkpoint.total_items = 40;
        checkpoint.current_keyword = 2;
        checkpoint.current_page = 25;
        checkpoint.jobs_per_page = vec![1; 75];

        let stats = RunStats::compute(&checkpoint, &plan, 80, 1080.0);
        assert_eq!(stats.elapsed_secs, 80.0);
        assert_eq!(stats.pages_processed, 75);
        assert!((stats.page_fraction - 0.75).abs() < 1e-9);
        assert!((stats.estimate.eta_seconds - 80.0).abs() < 1e-9);
        assert!(!stats.target_reached());
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(0.0), "0s");
        assert_eq!(format_duration(65.4), "1m 05s");
        assert_eq!(format_duration(3723.0), "1h 02m 03s");
        assert_eq!(format_duration(f64::NAN), "0s");
    }
}

//! Statistics from the checkpoint and the listing database
//!
//! This module provides the checkpoint status report and the summary of
//! collected listings.

use crate::checkpoint::Checkpoint;
use crate::crawler::progress::{format_duration, RunStats};
use crate::crawler::NOT_AVAILABLE;
use crate::state::CrawlPlan;
use crate::storage::ItemRecord;
use std::collections::HashMap;

/// Number of entries in each ranking of the summary
const TOP_N: usize = 10;

/// Prints the saved crawl progress
pub fn print_status(checkpoint: &Checkpoint, plan: &CrawlPlan, target: u64, now: f64) {
    let stats = RunStats::compute(checkpoint, plan, target, now);

    println!("=== Checkpoint Status ===\n");
    println!(
        "  Items collected: {}/{} ({:.1}%)",
        checkpoint.total_items,
        target,
        stats.estimate.fraction_done * 100.0
    );
    println!(
        "  Keywords completed: {}/{}",
        checkpoint.keywords_completed,
        plan.keyword_count()
    );

    match checkpoint.cursor() {
        Some(cell) => println!(
            "  Last page: '{}' page {} (keyword {}/{})",
            plan.keyword(cell.keyword_index).unwrap_or("?"),
            cell.page,
            cell.keyword_index,
            plan.keyword_count()
        ),
        None => println!("  Last page: none processed yet"),
    }

    println!("  Plan covered: {:.1}%", stats.page_fraction * 100.0);
    println!("  Pages processed: {}", stats.pages_processed);
    println!("  Average new items per page: {:.1}", checkpoint.average_yield());
    println!("  Elapsed time: {}", format_duration(stats.elapsed_secs));
    println!(
        "  Rate: {:.2} items/s, ETA {}",
        stats.estimate.items_per_second,
        format_duration(stats.estimate.eta_seconds)
    );
}

/// Compensation figures parsed from listing text
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CompensationStats {
    pub count: usize,
    pub min: f64,
    pub avg: f64,
    pub max: f64,
}

/// Summary of collected listings
#[derive(Debug, Clone)]
pub struct ListingSummary {
    pub total: usize,
    /// Listings per job board
    pub by_source: Vec<(String, usize)>,
    pub top_localities: Vec<(String, usize)>,
    pub top_organizations: Vec<(String, usize)>,
    pub top_titles: Vec<(String, usize)>,
    pub work_modes: Vec<(String, usize)>,
    pub compensation: Option<CompensationStats>,
}

/// Builds the listing summary
pub fn summarize(items: &[ItemRecord]) -> ListingSummary {
    let compensations: Vec<f64> = items
        .iter()
        .filter_map(|item| parse_compensation(&item.compensation))
        .collect();

    let compensation = if compensations.is_empty() {
        None
    } else {
        let min = compensations.iter().copied().fold(f64::INFINITY, f64::min);
        let max = compensations.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let avg = compensations.iter().sum::<f64>() / compensations.len() as f64;
        Some(CompensationStats {
            count: compensations.len(),
            min,
            avg,
            max,
        })
    };

    ListingSummary {
        total: items.len(),
        by_source: ranked(items.iter().map(|i| i.source.as_str()), None),
        top_localities: ranked(items.iter().map(|i| i.locality.as_str()), Some(TOP_N)),
        top_organizations: ranked(items.iter().map(|i| i.organization.as_str()), Some(TOP_N)),
        top_titles: ranked(items.iter().map(|i| i.title.as_str()), Some(TOP_N)),
        work_modes: ranked(items.iter().map(|i| i.work_mode.as_str()), None),
        compensation,
    }
}

/// Prints the listing summary to stdout
pub fn print_summary(summary: &ListingSummary) {
    println!("=== Listing Summary ===\n");
    println!("Total listings: {}", summary.total);

    println!("\nBy Source:");
    for (source, count) in &summary.by_source {
        println!("  • {}: {}", source, count);
    }

    print_ranking("Top Localities", &summary.top_localities);
    print_ranking("Top Organizations", &summary.top_organizations);
    print_ranking("Top Titles", &summary.top_titles);

    println!("\nWork Mode:");
    for (mode, count) in &summary.work_modes {
        println!("  • {}: {}", mode, count);
    }

    println!("\nCompensation:");
    match &summary.compensation {
        Some(stats) => {
            println!("  Listings with compensation: {}", stats.count);
            println!("  Average: ${:.2}", stats.avg);
            println!("  Minimum: ${:.2}", stats.min);
            println!("  Maximum: ${:.2}", stats.max);
        }
        None => println!("  No compensation information available"),
    }
}

fn print_ranking(heading: &str, entries: &[(String, usize)]) {
    println!("\n{}:", heading);
    for (i, (name, count)) in entries.iter().enumerate() {
        println!("  {:2}. {}: {}", i + 1, name, count);
    }
}

/// Counts values, most frequent first, ties by name
fn ranked<'a, I>(values: I, limit: Option<usize>) -> Vec<(String, usize)>
where
    I: Iterator<Item = &'a str>,
{
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for value in values {
        *counts.entry(value).or_insert(0) += 1;
    }

    let mut entries: Vec<(String, usize)> = counts
        .into_iter()
        .map(|(value, count)| (value.to_string(), count))
        .collect();
    entries.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));

    if let Some(limit) = limit {
        entries.truncate(limit);
    }
    entries
}

/// First number in compensation text, e.g. "$ 8,400.00 (Mensual)" -> 8400.0
pub fn parse_compensation(text: &str) -> Option<f64> {
    if text == NOT_AVAILABLE {
        return None;
    }

    let start = text.find(|c: char| c.is_ascii_digit())?;
    let number: String = text[start..]
        .chars()
        .take_while(|c| c.is_ascii_digit() || *c == ',' || *c == '.')
        .filter(|c| *c != ',')
        .collect();

    number.trim_end_matches('.').parse().ok()
}

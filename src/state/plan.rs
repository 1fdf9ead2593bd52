//! Crawl plan and cursor definitions
//!
//! The traversal space is a finite keyword × page grid. Keywords form the
//! outer loop and pages the inner loop, both 1-based.

use crate::config::CrawlerConfig;
use std::fmt;
use thiserror::Error;

/// Signals that every cell of the plan has been yielded
///
/// This is the normal completion signal of a crawl, not a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("crawl plan exhausted")]
pub struct PlanExhausted;

/// The ordered keyword list and per-keyword page limit of a crawl
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlPlan {
    keywords: Vec<String>,
    pages_per_keyword: u32,
}

impl CrawlPlan {
    pub fn new(keywords: Vec<String>, pages_per_keyword: u32) -> Self {
        Self {
            keywords,
            pages_per_keyword: pages_per_keyword.max(1),
        }
    }

    pub fn from_config(config: &CrawlerConfig) -> Self {
        Self::new(config.keywords.clone(), config.pages_per_keyword)
    }

    /// Returns the keyword at a 1-based index
    pub fn keyword(&self, keyword_index: usize) -> Option<&str> {
        keyword_index
            .checked_sub(1)
            .and_then(|i| self.keywords.get(i))
            .map(String::as_str)
    }

    pub fn keywords(&self) -> &[String] {
        &self.keywords
    }

    pub fn keyword_count(&self) -> usize {
        self.keywords.len()
    }

    pub fn pages_per_keyword(&self) -> u32 {
        self.pages_per_keyword
    }

    /// Total number of cells in the plan
    pub fn total_cells(&self) -> u64 {
        self.keywords.len() as u64 * u64::from(self.pages_per_keyword)
    }

    /// 1-based position of a cell in the plan's total order
    pub fn ordinal(&self, cell: CrawlCell) -> u64 {
        (cell.keyword_index as u64).saturating_sub(1) * u64::from(self.pages_per_keyword)
            + u64::from(cell.page)
    }

    /// Fraction of the plan covered once `cell` has been processed
    pub fn page_fraction(&self, cell: CrawlCell) -> f64 {
        let total = self.total_cells();
        if total == 0 {
            return 0.0;
        }
        (self.ordinal(cell) as f64 / total as f64).min(1.0)
    }
}

/// One unit of crawl work: a (keyword, page) pair, both 1-based
///
/// The derived ordering compares keyword first, then page, which is the
/// total order the cursor walks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CrawlCell {
    pub keyword_index: usize,
    pub page: u32,
}

impl CrawlCell {
    pub fn new(keyword_index: usize, page: u32) -> Self {
        Self {
            keyword_index,
            page,
        }
    }
}

impl fmt::Display for CrawlCell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.keyword_index, self.page)
    }
}

/// Walks a plan's cells in strictly increasing order
///
/// A cursor may be scoped to a contiguous keyword range so that a keyword
/// worker only ever yields cells of its own keyword.
#[derive(Debug, Clone)]
pub struct CrawlCursor {
    pages_per_keyword: u32,
    first_keyword: usize,
    last_keyword: usize,
    next: CrawlCell,
    last_yielded: Option<CrawlCell>,
}

impl CrawlCursor {
    /// Creates a cursor over the whole plan, positioned at (1, 1)
    pub fn new(plan: &CrawlPlan) -> Self {
        Self {
            pages_per_keyword: plan.pages_per_keyword(),
            first_keyword: 1,
            last_keyword: plan.keyword_count(),
            next: CrawlCell::new(1, 1),
            last_yielded: None,
        }
    }

    /// Creates a cursor that only yields pages of one keyword
    pub fn for_keyword(plan: &CrawlPlan, keyword_index: usize) -> Self {
        Self {
            pages_per_keyword: plan.pages_per_keyword(),
            first_keyword: keyword_index,
            last_keyword: keyword_index.min(plan.keyword_count()),
            next: CrawlCell::new(keyword_index, 1),
            last_yielded: None,
        }
    }

    /// Yields the next cell, or `PlanExhausted` once every cell has been yielded
    pub fn next(&mut self) -> Result<CrawlCell, PlanExhausted> {
        if self.next.keyword_index > self.last_keyword || self.next.keyword_index < self.first_keyword
        {
            return Err(PlanExhausted);
        }

        let cell = self.next;
        self.last_yielded = Some(cell);
        self.next = self.successor(cell);
        Ok(cell)
    }

    /// Reseeds the position so that `(keyword_index, page)` is the next cell
    ///
    /// A page past the per-keyword limit rolls over to the next keyword at
    /// page 1. Index or page 0 is treated as 1. The cursor never moves
    /// backwards over cells it has already yielded.
    pub fn resume_from(&mut self, keyword_index: usize, page: u32) {
        let mut cell = CrawlCell::new(keyword_index.max(1), page.max(1));
        if cell.page > self.pages_per_keyword {
            cell = CrawlCell::new(cell.keyword_index.saturating_add(1), 1);
        }

        if let Some(last) = self.last_yielded {
            if cell <= last {
                return;
            }
        }

        self.next = cell;
    }

    /// Skips the remaining pages of the keyword most recently yielded
    pub fn close_keyword(&mut self) {
        if let Some(last) = self.last_yielded {
            let following = CrawlCell::new(last.keyword_index.saturating_add(1), 1);
            if following > self.next {
                self.next = following;
            }
        }
    }

    /// The cell that `next()` would yield, if any remains
    pub fn peek(&self) -> Option<CrawlCell> {
        if self.next.keyword_index > self.last_keyword {
            None
        } else {
            Some(self.next)
        }
    }

    pub fn last_yielded(&self) -> Option<CrawlCell> {
        self.last_yielded
    }

    fn successor(&self, cell: CrawlCell) -> CrawlCell {
        if cell.page >= self.pages_per_keyword {
            CrawlCell::new(cell.keyword_index.saturating_add(1), 1)
        } else {
            CrawlCell::new(cell.keyword_index, cell.page + 1)
        }
    }
}

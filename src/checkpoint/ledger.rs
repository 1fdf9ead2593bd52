use super::{now_epoch, Checkpoint, CheckpointError, CheckpointStore};
use crate::state::{CrawlCell, CrawlPlan, DedupIndex};
use tracing::debug;

#[derive(Debug, Clone, Copy, Default)]
struct KeywordProgress {
    last_page: u32,
    closed: bool,
}

/// Folds processed cells into the checkpoint and persists it
///
/// Workers finish keywords out of order, so the saved cursor is the highest
/// cell for which every earlier cell of the plan has been processed. A
/// keyword closed early (no more results) counts as fully processed and is
/// saved as its last page so that a resume rolls over to the next keyword.
///
/// The ledger keeps its own committed copy of the seen keys: only keys of
/// recorded cells reach the checkpoint, so `seenLinks` never lags behind
/// `totalItems`.
pub struct CheckpointLedger {
    checkpoint: Checkpoint,
    plan: CrawlPlan,
    progress: Vec<KeywordProgress>,
    store: Box<dyn CheckpointStore>,
}

impl CheckpointLedger {
    /// Seeds the ledger from a loaded checkpoint (or a fresh one)
    ///
    /// Every keyword before the checkpoint's cursor is treated as done; the
    /// cursor keyword is done up to its saved page.
    pub fn new(checkpoint: Checkpoint, plan: CrawlPlan, store: Box<dyn CheckpointStore>) -> Self {
        let pages = plan.pages_per_keyword();
        let mut progress = vec![KeywordProgress::default(); plan.keyword_count()];

        if let Some(cursor) = checkpoint.cursor() {
            for (i, entry) in progress.iter_mut().enumerate() {
                let keyword_index = i + 1;
                if keyword_index < cursor.keyword_index {
                    *entry = KeywordProgress {
                        last_page: pages,
                        closed: true,
                    };
                } else if keyword_index == cursor.keyword_index {
                    *entry = KeywordProgress {
                        last_page: cursor.page.min(pages),
                        closed: cursor.page >= pages,
                    };
                }
            }
        }

        let mut ledger = Self {
            checkpoint,
            plan,
            progress,
            store,
        };
        ledger.refresh_cursor();
        ledger
    }

    pub fn checkpoint(&self) -> &Checkpoint {
        &self.checkpoint
    }

    pub fn plan(&self) -> &CrawlPlan {
        &self.plan
    }

    pub fn total_items(&self) -> u64 {
        self.checkpoint.total_items
    }

    pub fn start_time(&self) -> f64 {
        self.checkpoint.start_time
    }

    /// Dedup index rebuilt from the committed seen keys
    pub fn dedup_index(&self) -> DedupIndex {
        DedupIndex::restore(self.checkpoint.seen_links.iter().cloned())
    }

    /// The next page to crawl for a keyword, or `None` if it is done
    pub fn resume_page(&self, keyword_index: usize) -> Option<u32> {
        let entry = self.progress.get(keyword_index.checked_sub(1)?)?;
        if entry.closed || entry.last_page >= self.plan.pages_per_keyword() {
            None
        } else {
            Some(entry.last_page + 1)
        }
    }

    /// Records one processed cell and saves the checkpoint
    ///
    /// `new_keys` are the identity keys this cell added; `closed` marks the
    /// keyword as having no further results. In-memory state is updated even
    /// when the save fails.
    pub fn record_cell(
        &mut self,
        cell: CrawlCell,
        new_keys: Vec<String>,
        closed: bool,
    ) -> Result<(), CheckpointError> {
        let pages = self.plan.pages_per_keyword();
        if let Some(entry) = cell
            .keyword_index
            .checked_sub(1)
            .and_then(|i| self.progress.get_mut(i))
        {
            entry.last_page = entry.last_page.max(cell.page);
            entry.closed = entry.closed || closed || cell.page >= pages;
        }

        let added = new_keys.len() as u64;
        self.checkpoint.seen_links.extend(new_keys);
        self.checkpoint.total_items += added;
        self.checkpoint.jobs_per_page.push(added);
        self.refresh_cursor();

        debug!(
            "Recorded cell {}: +{} items, cursor ({}, {})",
            cell, added, self.checkpoint.current_keyword, self.checkpoint.current_page
        );

        self.save()
    }

    /// Stamps the save time and writes the checkpoint
    pub fn save(&mut self) -> Result<(), CheckpointError> {
        self.checkpoint.last_save_time = now_epoch();
        self.store.save(&self.checkpoint)
    }

    fn refresh_cursor(&mut self) {
        let pages = self.plan.pages_per_keyword();
        let mut cursor = self.checkpoint.cursor();

        for (i, entry) in self.progress.iter().enumerate() {
            let keyword_index = i + 1;
            if entry.closed {
                cursor = Some(CrawlCell::new(keyword_index, pages));
                continue;
            }
            if entry.last_page > 0 {
                cursor = Some(CrawlCell::new(keyword_index, entry.last_page));
            }
            break;
        }

        // The saved cursor never moves backwards
        if let Some(cell) = cursor {
            let current = self.checkpoint.cursor();
            if current.map_or(true, |c| cell > c) {
                self.checkpoint.current_keyword = cell.keyword_index;
                self.checkpoint.current_page = cell.page;
            }
        }

        self.checkpoint.keywords_completed =
            self.progress.iter().filter(|entry| entry.closed).count() as u64;
    }
}

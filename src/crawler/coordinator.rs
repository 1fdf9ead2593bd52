//! Crawl orchestrator - main crawl loop
//!
//! This module drives the keyword × page plan:
//! - Loading the checkpoint and seeding the cursor and dedup index
//! - Fetching, extracting, filtering and deduplicating each cell
//! - Saving the checkpoint after every cell and flushing the sink
//! - Stopping on target reached, plan exhausted or cancellation
//!
//! With one worker the plan is walked strictly in order. With more, each
//! keyword runs in its own task, at most `workers` at a time, and all tasks
//! share the dedup index, the checkpoint ledger and the sink.

use crate::checkpoint::{
    now_epoch, Checkpoint, CheckpointLedger, CheckpointStore, JsonCheckpointStore,
};
use crate::config::Config;
use crate::crawler::fetcher::PageFetcher;
use crate::crawler::parser::{build_extractor, Extractor};
use crate::crawler::progress::RunStats;
use crate::crawler::relevance::{KeywordRelevance, RelevancePredicate};
use crate::crawler::transport::ReqwestTransport;
use crate::state::{CrawlCell, CrawlCursor, CrawlPlan, RunState, SharedDedupIndex};
use crate::storage::{Sink, SqliteSink};
use crate::url::{identity_key, SiteUrls};
use crate::HarvestError;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::{mpsc, Semaphore};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

/// Why a completed run stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    TargetReached,
    PlanExhausted,
    Cancelled,
}

/// Result of a finished run
#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub state: RunState,
    pub stop_reason: StopReason,
    pub stats: RunStats,
    /// Cells processed by this process, not counting earlier runs
    pub cells_processed: u64,
}

/// What one processed cell produced
#[derive(Debug, Clone, Copy)]
struct CellReport {
    new_items: u64,
    closed: bool,
    total_items: u64,
}

/// Main crawl orchestrator
pub struct Orchestrator {
    plan: CrawlPlan,
    target: u64,
    workers: usize,
    fetch_details: bool,
    flush_every: u64,
    fresh: bool,
    fetcher: PageFetcher,
    extractor: Arc<dyn Extractor>,
    relevance: Arc<dyn RelevancePredicate>,
    sink: Arc<Mutex<Box<dyn Sink>>>,
    store: Option<Box<dyn CheckpointStore>>,
    state: RunState,
}

impl Orchestrator {
    /// Creates an orchestrator from explicit collaborators
    ///
    /// No I/O happens here; the checkpoint is loaded when the run starts.
    pub fn new(
        config: &Config,
        fetcher: PageFetcher,
        extractor: Arc<dyn Extractor>,
        relevance: Arc<dyn RelevancePredicate>,
        sink: Box<dyn Sink>,
        store: Box<dyn CheckpointStore>,
    ) -> Self {
        Self {
            plan: CrawlPlan::from_config(&config.crawler),
            target: config.crawler.target_items,
            workers: config.crawler.workers.max(1) as usize,
            fetch_details: config.crawler.fetch_details,
            flush_every: u64::from(config.crawler.flush_every.max(1)),
            fresh: false,
            fetcher,
            extractor,
            relevance,
            sink: Arc::new(Mutex::new(sink)),
            store: Some(store),
            state: RunState::Idle,
        }
    }

    /// Creates an orchestrator from the configuration, using the HTTP
    /// transport, the site's extractor and the SQLite sink with a JSON checkpoint
    ///
    /// # Errors
    ///
    /// Returns `HarvestError::SetupFatal` if the HTTP client, the extractor
    /// or the database cannot be created.
    pub fn from_config(config: &Config) -> Result<Self, HarvestError> {
        let transport = ReqwestTransport::from_config(
            &config.user_agent,
            Duration::from_secs(config.fetch.request_timeout),
        )
        .map_err(|e| HarvestError::SetupFatal(format!("cannot build HTTP client: {}", e)))?;

        let urls = SiteUrls::new(&config.site);
        let fetcher = PageFetcher::new(Arc::new(transport), urls, &config.fetch);
        let extractor = build_extractor(&config.site)
            .map_err(|e| HarvestError::SetupFatal(format!("cannot build extractor: {}", e)))?;
        let relevance = KeywordRelevance::from_config(&config.filter);

        let sink = SqliteSink::new(Path::new(&config.output.database_path)).map_err(|e| {
            HarvestError::SetupFatal(format!(
                "cannot open database {}: {}",
                config.output.database_path, e
            ))
        })?;
        let store = JsonCheckpointStore::new(&config.output.checkpoint_path);

        Ok(Self::new(
            config,
            fetcher,
            extractor,
            Arc::new(relevance),
            Box::new(sink),
            Box::new(store),
        ))
    }

    /// Ignores any saved checkpoint and starts from the first cell
    pub fn fresh(mut self, fresh: bool) -> Self {
        self.fresh = fresh;
        self
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    pub fn plan(&self) -> &CrawlPlan {
        &self.plan
    }

    /// Shared handle to the sink, for exports after the run
    pub fn sink(&self) -> Arc<Mutex<Box<dyn Sink>>> {
        Arc::clone(&self.sink)
    }

    /// Runs the crawl until the target is reached, the plan is exhausted or
    /// `token` is cancelled
    ///
    /// Cancellation is only observed between cells, so the checkpoint on disk
    /// always ends at a page boundary.
    ///
    /// # Errors
    ///
    /// * `HarvestError::SetupFatal` - the checkpoint location is unusable; the
    ///   orchestrator is left `Aborted` and no page is fetched
    /// * `HarvestError::InvalidTransition` - the orchestrator already ran
    pub async fn run(&mut self, token: CancellationToken) -> Result<RunOutcome, HarvestError> {
        if self.state != RunState::Idle {
            return Err(HarvestError::InvalidTransition {
                from: self.state,
                to: RunState::Running,
            });
        }

        let ledger = match self.setup() {
            Ok(ledger) => ledger,
            Err(e) => {
                tracing::error!("Setup failed: {}", e);
                self.transition(RunState::Aborted)?;
                return Err(e);
            }
        };
        self.transition(RunState::Running)?;

        let dedup = SharedDedupIndex::new(ledger.dedup_index());
        let ledger = Arc::new(Mutex::new(ledger));
        let worker = CellWorker {
            plan: Arc::new(self.plan.clone()),
            target: self.target,
            fetch_details: self.fetch_details,
            flush_every: self.flush_every,
            fetcher: self.fetcher.clone(),
            extractor: Arc::clone(&self.extractor),
            relevance: Arc::clone(&self.relevance),
            sink: Arc::clone(&self.sink),
            dedup,
            ledger: Arc::clone(&ledger),
            pages_done: Arc::new(AtomicU64::new(0)),
        };

        let (stop_reason, cells_processed) = if self.workers <= 1 {
            self.run_sequential(&worker, &token).await
        } else {
            self.run_pooled(&worker, &token).await
        };

        if let Err(e) = lock(&self.sink).flush() {
            tracing::warn!("Final sink flush failed: {}", e);
        }

        let stats = {
            let mut ledger = lock(&ledger);
            if let Err(e) = ledger.save() {
                tracing::warn!("Final checkpoint save failed: {}", e);
            }
            RunStats::compute(ledger.checkpoint(), &self.plan, self.target, now_epoch())
        };

        self.transition(RunState::Completed)?;
        tracing::info!(
            "Run stopped ({:?}) after {} cells: {}",
            stop_reason,
            cells_processed,
            stats
        );

        Ok(RunOutcome {
            state: self.state,
            stop_reason,
            stats,
            cells_processed,
        })
    }

    /// Loads (or creates) the checkpoint and proves the location is writable
    fn setup(&mut self) -> Result<CheckpointLedger, HarvestError> {
        let store = self
            .store
            .take()
            .ok_or_else(|| HarvestError::SetupFatal("checkpoint store already used".to_string()))?;

        let loaded = if self.fresh { None } else { store.load() };
        let loaded = loaded.filter(|checkpoint| match checkpoint.validate() {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!("Ignoring unusable checkpoint: {}", e);
                false
            }
        });
        let checkpoint = match loaded {
            Some(checkpoint) => {
                tracing::info!(
                    "Resuming from checkpoint: {} items, cursor ({}, {}), {} seen links",
                    checkpoint.total_items,
                    checkpoint.current_keyword,
                    checkpoint.current_page,
                    checkpoint.seen_links.len()
                );
                checkpoint
            }
            None => {
                tracing::info!("Starting fresh crawl");
                Checkpoint::fresh(now_epoch())
            }
        };

        let mut ledger = CheckpointLedger::new(checkpoint, self.plan.clone(), store);
        ledger.save().map_err(|e| {
            HarvestError::SetupFatal(format!("checkpoint location is not writable: {}", e))
        })?;

        Ok(ledger)
    }

    fn transition(&mut self, next: RunState) -> Result<(), HarvestError> {
        if !self.state.can_transition_to(next) {
            return Err(HarvestError::InvalidTransition {
                from: self.state,
                to: next,
            });
        }
        tracing::debug!("Run state {} -> {}", self.state, next);
        self.state = next;
        Ok(())
    }

    /// Walks the plan one cell at a time
    async fn run_sequential(
        &self,
        worker: &CellWorker,
        token: &CancellationToken,
    ) -> (StopReason, u64) {
        let mut cursor = CrawlCursor::new(&self.plan);
        let mut total = {
            let ledger = lock(&worker.ledger);
            if let Some(cell) = ledger.checkpoint().cursor() {
                cursor.resume_from(cell.keyword_index, cell.page.saturating_add(1));
            }
            ledger.total_items()
        };
        let mut cells = 0;

        loop {
            if total >= self.target {
                return (StopReason::TargetReached, cells);
            }
            if token.is_cancelled() {
                tracing::info!("Stop requested, leaving at a page boundary");
                return (StopReason::Cancelled, cells);
            }

            let cell = match cursor.next() {
                Ok(cell) => cell,
                Err(_) => return (StopReason::PlanExhausted, cells),
            };

            let report = worker.process_cell(cell).await;
            cells += 1;
            total = report.total_items;

            if report.closed {
                cursor.close_keyword();
            }
        }
    }

    /// Runs one task per keyword, at most `workers` at a time
    async fn run_pooled(&self, worker: &CellWorker, token: &CancellationToken) -> (StopReason, u64) {
        let (start_total, resume_pages) = {
            let ledger = lock(&worker.ledger);
            let pages: Vec<(usize, u32)> = (1..=self.plan.keyword_count())
                .filter_map(|k| ledger.resume_page(k).map(|page| (k, page)))
                .collect();
            (ledger.total_items(), pages)
        };

        if start_total >= self.target {
            return (StopReason::TargetReached, 0);
        }

        tracing::info!(
            "Crawling {} keywords with {} workers",
            resume_pages.len(),
            self.workers
        );

        let stop = token.child_token();
        let semaphore = Arc::new(Semaphore::new(self.workers));
        let (tx, mut rx) = mpsc::unbounded_channel::<CellReport>();
        let mut tasks = JoinSet::new();

        for (keyword_index, start_page) in resume_pages {
            let worker = worker.clone();
            let semaphore = Arc::clone(&semaphore);
            let stop = stop.clone();
            let tx = tx.clone();

            tasks.spawn(async move {
                let _permit = tokio::select! {
                    permit = semaphore.acquire_owned() => match permit {
                        Ok(permit) => permit,
                        Err(_) => return,
                    },
                    _ = stop.cancelled() => return,
                };

                let mut cursor = CrawlCursor::for_keyword(&worker.plan, keyword_index);
                cursor.resume_from(keyword_index, start_page);

                while !stop.is_cancelled() {
                    let cell = match cursor.next() {
                        Ok(cell) => cell,
                        Err(_) => break,
                    };

                    let report = worker.process_cell(cell).await;
                    if report.total_items >= worker.target {
                        stop.cancel();
                    }
                    if report.closed {
                        cursor.close_keyword();
                    }
                    if tx.send(report).is_err() {
                        break;
                    }
                }
            });
        }
        drop(tx);

        let mut cells = 0;
        let mut total = start_total;
        while let Some(report) = rx.recv().await {
            cells += 1;
            total = total.max(report.total_items);
            tracing::trace!("Worker reported +{} items", report.new_items);
        }

        while let Some(joined) = tasks.join_next().await {
            if let Err(e) = joined {
                tracing::error!("Keyword worker failed: {}", e);
            }
        }

        let reason = if total >= self.target {
            StopReason::TargetReached
        } else if token.is_cancelled() {
            StopReason::Cancelled
        } else {
            StopReason::PlanExhausted
        };
        (reason, cells)
    }
}

/// Everything needed to process one cell, shared by keyword workers
///
/// Each clone carries its own fetcher, so every worker paces its own
/// requests.
#[derive(Clone)]
struct CellWorker {
    plan: Arc<CrawlPlan>,
    target: u64,
    fetch_details: bool,
    flush_every: u64,
    fetcher: PageFetcher,
    extractor: Arc<dyn Extractor>,
    relevance: Arc<dyn RelevancePredicate>,
    sink: Arc<Mutex<Box<dyn Sink>>>,
    dedup: SharedDedupIndex,
    ledger: Arc<Mutex<CheckpointLedger>>,
    pages_done: Arc<AtomicU64>,
}

impl CellWorker {
    /// Fetches, extracts, filters and records one cell
    ///
    /// Every failure here is page-level: it is logged and the cell is
    /// recorded with whatever it yielded.
    async fn process_cell(&self, cell: CrawlCell) -> CellReport {
        let keyword = self.plan.keyword(cell.keyword_index).unwrap_or_default().to_string();

        let listing = match self.fetcher.fetch(&keyword, cell.page).await {
            Ok(raw) => match self.extractor.parse_listing(&raw) {
                Ok(listing) => Some(listing),
                Err(e) => {
                    tracing::warn!("Extraction failed for '{}' page {}: {}", keyword, cell.page, e);
                    None
                }
            },
            Err(e) => {
                tracing::warn!("Skipping page: {}", e);
                None
            }
        };

        let closed = listing.as_ref().map_or(false, |listing| !listing.has_more);
        let candidates = listing.map(|listing| listing.items).unwrap_or_default();
        let found = candidates.len();
        let mut new_keys = Vec::new();

        for mut item in candidates {
            let key = match identity_key(&item.identity_key) {
                Ok(key) => key,
                Err(e) => {
                    tracing::debug!("Dropping listing '{}': {}", item.title, e);
                    continue;
                }
            };

            if self.dedup.contains(&key) {
                tracing::trace!("Duplicate listing {}", key);
                continue;
            }

            item.identity_key = key;
            item.keyword = keyword.clone();

            if self.fetch_details {
                self.enrich(&mut item).await;
            }

            if !self
                .relevance
                .is_relevant(&item.title, &item.description, &item.locality)
            {
                tracing::debug!("Not relevant: '{}' in {}", item.title, item.locality);
                continue;
            }

            if !self.dedup.check_and_insert(&item.identity_key) {
                continue;
            }

            let stored = lock(&self.sink).upsert(&item);
            match stored {
                Ok(()) => new_keys.push(item.identity_key),
                Err(e) => tracing::warn!("Failed to store {}: {}", item.identity_key, e),
            }
        }

        let new_items = new_keys.len() as u64;
        let (total_items, stats) = {
            let mut ledger = lock(&self.ledger);
            if let Err(e) = ledger.record_cell(cell, new_keys, closed) {
                tracing::warn!("Checkpoint save failed after cell {}: {}", cell, e);
            }
            let stats = RunStats::compute(ledger.checkpoint(), &self.plan, self.target, now_epoch());
            (ledger.total_items(), stats)
        };

        let pages_done = self.pages_done.fetch_add(1, Ordering::SeqCst) + 1;
        if pages_done % self.flush_every == 0 {
            if let Err(e) = lock(&self.sink).flush() {
                tracing::warn!("Sink flush failed: {}", e);
            }
        }

        tracing::info!(
            "'{}' page {}/{}: {} cards, {} new | {}",
            keyword,
            cell.page,
            self.plan.pages_per_keyword(),
            found,
            new_items,
            stats
        );
        if closed {
            tracing::info!("No more results for '{}' after page {}", keyword, cell.page);
        }

        CellReport {
            new_items,
            closed,
            total_items,
        }
    }

    /// Replaces the card description with the detail page text, if any
    async fn enrich(&self, item: &mut crate::storage::ItemRecord) {
        match self.fetcher.fetch_detail(&item.identity_key).await {
            Ok(raw) => {
                if let Some(description) = self.extractor.parse_detail(&raw) {
                    item.description = description;
                }
            }
            Err(e) => tracing::warn!("Detail page for {} unavailable: {}", item.identity_key, e),
        }
    }
}

fn lock<T: ?Sized>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

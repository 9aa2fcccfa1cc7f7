//! Crawl controller - the pagination state machine
//!
//! The controller drives one crawl target through
//! `Idle -> Fetching -> Extracting -> Writing -> Resolving -> Fetching ...`
//! until the chain ends, a budget is used up, or a step fails. Progress is
//! checkpointed after every page and on every terminal transition, so a
//! later run with the same target picks up where this one stopped.

use crate::crawler::fetcher::{FetchError, PageFetcher, RetryPolicy};
use crate::crawler::page::PageResult;
use crate::crawler::resolver::PaginationResolver;
use crate::crawler::target::CrawlTarget;
use crate::extract::{FieldExtractor, FieldMap, SelectorExtractor};
use crate::output::{RecordSink, RecordWriter};
use crate::state::{CrawlPhase, CrawlState};
use crate::storage::{Checkpoint, CheckpointStatus, CheckpointStore};
use crate::{ConfigError, TrawlError};
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use url::Url;

/// Why a crawl ended in `Failed`
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FailureReason {
    #[error("fetch failed after {attempts} attempts: {last_error}")]
    FetchExhausted { attempts: u32, last_error: FetchError },

    #[error("record write failed: {0}")]
    Write(String),

    #[error("crawl was cancelled")]
    Cancelled,
}

/// Outcome of one `Controller::run`
#[derive(Debug, Clone, PartialEq)]
pub struct CrawlReport {
    /// Terminal phase: `Done` or `Failed`
    pub phase: CrawlPhase,
    pub pages_fetched: u32,
    pub records_written: u64,
    /// Page a resumed run would start from
    pub pending_url: Option<Url>,
    /// Page the crawl failed on
    pub failed_url: Option<String>,
    pub failure: Option<FailureReason>,
}

impl CrawlReport {
    pub fn is_success(&self) -> bool {
        self.phase.is_success()
    }
}

enum Restored {
    Completed(CrawlReport),
    Resumed,
    Fresh,
}

enum PageOutcome {
    Continue,
    BudgetExhausted,
    Cancelled,
    WriteFailed(FailureReason),
}

/// Drives a crawl target to `Done` or `Failed`
///
/// # Example
///
/// ```no_run
/// use review_trawl::crawler::{Controller, CrawlTarget, HttpFetcher};
/// use review_trawl::output::{MemorySink, RecordWriter};
/// use review_trawl::storage::MemoryCheckpointStore;
/// use review_trawl::{Config, FieldMap};
///
/// # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
/// let config = Config::default();
/// let target = CrawlTarget::new(vec!["https://example.com/reviews".parse()?], 10, 0)?;
/// let controller = Controller::new(
///     target,
///     HttpFetcher::from_config(&config)?,
///     RecordWriter::new(MemorySink::new()),
///     MemoryCheckpointStore::new(),
///     FieldMap::default(),
/// )?;
/// let report = controller.run().await?;
/// println!("{} records", report.records_written);
/// # Ok(())
/// # }
/// ```
pub struct Controller<F: PageFetcher, S: RecordSink, C: CheckpointStore> {
    target: CrawlTarget,
    key: String,
    fetcher: F,
    extractor: Box<dyn FieldExtractor + Send + Sync>,
    fields: FieldMap,
    resolver: PaginationResolver,
    writer: RecordWriter<S>,
    checkpoints: C,
    retry: RetryPolicy,
    cancel: CancellationToken,
    fresh: bool,
    phase: CrawlPhase,
    state: CrawlState,
}

impl<F: PageFetcher, S: RecordSink, C: CheckpointStore> Controller<F, S, C> {
    /// Creates a controller in the `Idle` phase
    ///
    /// Fails if the field map holds a selector that does not parse.
    pub fn new(
        target: CrawlTarget,
        fetcher: F,
        writer: RecordWriter<S>,
        checkpoints: C,
        fields: FieldMap,
    ) -> Result<Self, TrawlError> {
        fields.validate()?;
        let resolver = PaginationResolver::new(&fields)
            .map_err(|e| ConfigError::Validation(e.to_string()))?;

        Ok(Self {
            key: target.identity(),
            target,
            fetcher,
            extractor: Box::new(SelectorExtractor::new()),
            fields,
            resolver,
            writer,
            checkpoints,
            retry: RetryPolicy::default(),
            cancel: CancellationToken::new(),
            fresh: false,
            phase: CrawlPhase::Idle,
            state: CrawlState::new(),
        })
    }

    /// Replaces the selector-based extractor
    pub fn with_extractor(mut self, extractor: Box<dyn FieldExtractor + Send + Sync>) -> Self {
        self.extractor = extractor;
        self
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Stops the crawl between steps (or during a fetch) once `token` is cancelled
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// Discards any existing checkpoint for the target before running
    pub fn with_fresh_start(mut self, fresh: bool) -> Self {
        self.fresh = fresh;
        self
    }

    /// Current phase of the state machine
    pub fn phase(&self) -> CrawlPhase {
        self.phase
    }

    /// Checkpoint key of the target
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Runs the crawl to a terminal phase
    ///
    /// Step failures (exhausted retries, write errors, cancellation) end in a
    /// `Failed` report. An `Err` is returned only when the checkpoint store
    /// cannot be read or written.
    pub async fn run(mut self) -> Result<CrawlReport, TrawlError> {
        let prepared = match self.restore()? {
            Restored::Completed(report) => return Ok(report),
            Restored::Resumed => self
                .writer
                .rewind_to(self.state.output_baseline + self.state.records_written)
                .map(|_| ()),
            Restored::Fresh => self.writer.settle().map(|lines| {
                if lines > 0 {
                    tracing::info!(lines, "Appending after existing output");
                }
                self.state.output_baseline = lines;
            }),
        };

        if let Err(e) = prepared {
            tracing::error!(error = %e, "Failed to prepare output");
            let url = self.state.pending_url.clone();
            return self.fail(url, FailureReason::Write(e.to_string()));
        }

        // Pins the output baseline before any record is appended
        self.save_checkpoint(CheckpointStatus::Incomplete, None)?;

        tracing::info!(
            target_key = %self.key,
            seeds = self.target.seeds.len(),
            max_pages = self.target.max_pages,
            max_records = self.target.max_records,
            "Starting crawl"
        );

        loop {
            if self.cancel.is_cancelled() {
                let url = self.state.pending_url.clone();
                return self.fail(url, FailureReason::Cancelled);
            }

            let Some(url) = self.next_url() else {
                return self.finish();
            };

            self.transition(CrawlPhase::Fetching)?;
            self.state.pending_url = Some(url.clone());

            let fetched = self.fetch_with_retry(&url).await;
            let page = match fetched {
                Ok(page) => page,
                Err(reason) => return self.fail(Some(url), reason),
            };

            match self.process_page(&url, page)? {
                PageOutcome::Continue => {}
                PageOutcome::BudgetExhausted => return self.finish(),
                PageOutcome::Cancelled => return self.fail(Some(url), FailureReason::Cancelled),
                PageOutcome::WriteFailed(reason) => return self.fail(Some(url), reason),
            }

            self.save_checkpoint(CheckpointStatus::Incomplete, None)?;
        }
    }

    /// Loads the checkpoint for the target
    fn restore(&mut self) -> Result<Restored, TrawlError> {
        if self.fresh && self.checkpoints.clear(&self.key)? {
            tracing::info!(target_key = %self.key, "Discarded previous checkpoint");
        }

        match self.checkpoints.load(&self.key)? {
            Some(checkpoint) if checkpoint.is_completed() => {
                tracing::info!(
                    target_key = %self.key,
                    records = checkpoint.state.records_written,
                    "Crawl already completed, nothing to do"
                );
                self.state = checkpoint.state;
                self.transition(CrawlPhase::Done)?;
                return Ok(Restored::Completed(self.report(None, None)));
            }
            Some(checkpoint) => {
                tracing::info!(
                    target_key = %self.key,
                    pages = checkpoint.state.pages_fetched,
                    records = checkpoint.state.records_written,
                    pending = ?checkpoint.state.pending_url.as_ref().map(Url::as_str),
                    "Resuming crawl from checkpoint"
                );
                self.state = checkpoint.state;
                Ok(Restored::Resumed)
            }
            None => {
                self.state = CrawlState::new();
                Ok(Restored::Fresh)
            }
        }
    }

    /// The pending page, or else the next seed not yet visited
    fn next_url(&mut self) -> Option<Url> {
        if let Some(url) = &self.state.pending_url {
            return Some(url.clone());
        }

        while let Some(seed) = self.target.seeds.get(self.state.seed_index) {
            self.state.seed_index += 1;
            if self.state.visited.contains(seed) {
                tracing::debug!(seed = %seed, "Seed already visited, skipping");
                continue;
            }
            return Some(seed.clone());
        }

        None
    }

    async fn fetch_with_retry(&self, url: &Url) -> Result<PageResult, FailureReason> {
        let attempts = self.retry.attempts;
        let mut last_error = FetchError::Network("no attempt made".to_string());

        for attempt in 1..=attempts {
            let result = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => return Err(FailureReason::Cancelled),
                result = self.fetcher.fetch(url) => result,
            };

            match result {
                Ok(page) => {
                    tracing::debug!(url = %url, attempt, status = ?page.status, "Fetched page");
                    return Ok(page);
                }
                Err(e) => {
                    tracing::warn!(url = %url, attempt, attempts, error = %e, "Fetch failed");
                    last_error = e;
                }
            }

            if attempt < attempts && !self.retry.delay.is_zero() {
                tokio::select! {
                    biased;
                    _ = self.cancel.cancelled() => return Err(FailureReason::Cancelled),
                    _ = tokio::time::sleep(self.retry.delay) => {}
                }
            }
        }

        Err(FailureReason::FetchExhausted {
            attempts,
            last_error,
        })
    }

    /// Extracts, writes and resolves one fetched page
    ///
    /// Kept synchronous so the parsed document never lives across an await.
    fn process_page(&mut self, url: &Url, page: PageResult) -> Result<PageOutcome, TrawlError> {
        self.transition(CrawlPhase::Extracting)?;
        let parsed = page.parse();

        // A redirect onto a page already processed would repeat its records
        let revisit = page.url != *url && self.state.visited.contains(&page.url);

        let records = if revisit {
            tracing::info!(
                url = %url,
                final_url = %page.url,
                "Redirected to a visited page, ending chain"
            );
            Vec::new()
        } else if !page.is_usable() {
            tracing::warn!(url = %page.url, "Page cannot be processed, ending chain");
            Vec::new()
        } else {
            match self.extractor.extract(&parsed, &self.fields) {
                Ok(records) => records,
                Err(e) => {
                    tracing::warn!(url = %page.url, error = %e, "Extraction failed");
                    Vec::new()
                }
            }
        };

        if self.cancel.is_cancelled() {
            return Ok(PageOutcome::Cancelled);
        }

        self.transition(CrawlPhase::Writing)?;

        let already_written = self.state.pending_page_written as usize;
        if already_written > 0 {
            tracing::debug!(
                url = %url,
                skipped = already_written,
                "Skipping records written before the last interruption"
            );
        }

        let mut written = 0usize;
        for record in records.iter().skip(already_written) {
            if self.state.records_exhausted(self.target.max_records) {
                self.complete_page(url, &page);
                tracing::info!(max_records = self.target.max_records, "Record budget reached");
                return Ok(PageOutcome::BudgetExhausted);
            }

            if let Err(e) = self.writer.write(record) {
                tracing::error!(url = %url, error = %e, "Failed to write record");
                return Ok(PageOutcome::WriteFailed(FailureReason::Write(e.to_string())));
            }
            self.state.record_written();
            written += 1;
        }

        if self.cancel.is_cancelled() {
            return Ok(PageOutcome::Cancelled);
        }

        self.transition(CrawlPhase::Resolving)?;
        self.complete_page(url, &page);

        tracing::info!(
            url = %page.url,
            records = written,
            total_records = self.state.records_written,
            pages = self.state.pages_fetched,
            "Processed page"
        );

        if self.state.records_exhausted(self.target.max_records) {
            tracing::info!(max_records = self.target.max_records, "Record budget reached");
            return Ok(PageOutcome::BudgetExhausted);
        }

        if self.state.pages_exhausted(self.target.max_pages) {
            tracing::info!(max_pages = self.target.max_pages, "Page budget reached");
            return Ok(PageOutcome::BudgetExhausted);
        }

        let next = if page.is_usable() && !revisit {
            self.resolver.resolve_next(&parsed, &self.state.visited)
        } else {
            None
        };

        match &next {
            Some(next) => tracing::debug!(next = %next, "Following next page"),
            None => tracing::info!(url = %page.url, "Pagination chain ended"),
        }

        self.state.advance(next);
        Ok(PageOutcome::Continue)
    }

    fn complete_page(&mut self, url: &Url, page: &PageResult) {
        self.state.mark_visited(url, &page.url);
        self.state.pages_fetched += 1;
    }

    fn transition(&mut self, next: CrawlPhase) -> Result<(), TrawlError> {
        if !self.phase.can_transition_to(next) {
            return Err(TrawlError::InvalidTransition {
                from: self.phase,
                to: next,
            });
        }

        tracing::trace!(from = %self.phase, to = %next, "Phase transition");
        self.phase = next;
        Ok(())
    }

    fn save_checkpoint(
        &mut self,
        status: CheckpointStatus,
        failed_url: Option<String>,
    ) -> Result<(), TrawlError> {
        let checkpoint = Checkpoint::new(
            self.target.seed_strings(),
            self.state.clone(),
            status,
            failed_url,
        );
        self.checkpoints.save(&self.key, &checkpoint)?;
        Ok(())
    }

    fn finish(mut self) -> Result<CrawlReport, TrawlError> {
        self.transition(CrawlPhase::Done)?;
        self.state.advance(None);
        self.save_checkpoint(CheckpointStatus::Completed, None)?;

        tracing::info!(
            pages = self.state.pages_fetched,
            records = self.state.records_written,
            "Crawl complete"
        );

        Ok(self.report(None, None))
    }

    fn fail(mut self, url: Option<Url>, reason: FailureReason) -> Result<CrawlReport, TrawlError> {
        self.transition(CrawlPhase::Failed)?;
        let failed_url = url.map(|u| u.to_string());
        self.save_checkpoint(CheckpointStatus::Incomplete, failed_url.clone())?;

        tracing::error!(
            url = ?failed_url,
            reason = %reason,
            pages = self.state.pages_fetched,
            records = self.state.records_written,
            "Crawl failed, progress saved for resume"
        );

        Ok(self.report(failed_url, Some(reason)))
    }

    fn report(&self, failed_url: Option<String>, failure: Option<FailureReason>) -> CrawlReport {
        CrawlReport {
            phase: self.phase,
            pages_fetched: self.state.pages_fetched,
            records_written: self.state.records_written,
            pending_url: self.state.pending_url.clone(),
            failed_url,
            failure,
        }
    }
}

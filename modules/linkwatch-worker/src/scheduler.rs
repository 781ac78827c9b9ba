use std::fmt;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use rand::Rng;
use tracing::{debug, info, warn};
use uuid::Uuid;

use linkwatch_engine::{identify_platform, LinkClassifier, LinkRecord, Verdict};

use crate::layout::{SheetLayout, FIRST_DATA_ROW};
use crate::store::{CellUpdate, RowStore};

const SHEET_DATE_FORMAT: &str = "%m/%d/%Y";

pub fn format_sheet_date(date: NaiveDate) -> String {
    date.format(SHEET_DATE_FORMAT).to_string()
}

pub fn parse_sheet_date(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), SHEET_DATE_FORMAT).ok()
}

// ---------------------------------------------------------------------------
// Shard
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ShardError {
    #[error("total shards must be at least 1")]
    NoShards,
    #[error("shard index {index} out of range for {total} shards")]
    IndexOutOfRange { index: u32, total: u32 },
}

/// This worker's slice of the row ordinals.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Shard {
    index: u32,
    total: u32,
}

impl Shard {
    pub fn new(index: u32, total: u32) -> std::result::Result<Self, ShardError> {
        if total == 0 {
            return Err(ShardError::NoShards);
        }
        if index >= total {
            return Err(ShardError::IndexOutOfRange { index, total });
        }
        Ok(Self { index, total })
    }

    pub fn single() -> Self {
        Self { index: 0, total: 1 }
    }

    pub fn index(&self) -> u32 {
        self.index
    }

    pub fn total(&self) -> u32 {
        self.total
    }

    /// Ordinal is the 0-based position in the store's rows, header included.
    pub fn owns(&self, ordinal: usize) -> bool {
        ordinal % self.total as usize == self.index as usize
    }
}

// ---------------------------------------------------------------------------
// Skip policy
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    EmptyUrl,
    AlreadyRemoved,
    CheckedRecently(NaiveDate),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SkipPolicy {
    /// Rows checked fewer than this many days ago are skipped. Zero disables.
    pub recent_days: u32,
}

impl SkipPolicy {
    pub fn new(recent_days: u32) -> Self {
        Self { recent_days }
    }

    pub fn check(&self, record: &LinkRecord, today: NaiveDate) -> Option<SkipReason> {
        if record.url.is_empty() {
            return Some(SkipReason::EmptyUrl);
        }
        if record.last_status == Some(Verdict::Removed) {
            return Some(SkipReason::AlreadyRemoved);
        }
        if self.recent_days > 0 {
            if let Some(checked) = record.last_checked_at {
                if (today - checked).num_days() < i64::from(self.recent_days) {
                    return Some(SkipReason::CheckedRecently(checked));
                }
            }
        }
        None
    }
}

// ---------------------------------------------------------------------------
// Pacing
// ---------------------------------------------------------------------------

/// Uniform random delay after every classification.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pacing {
    pub min: Duration,
    pub max: Duration,
}

impl Pacing {
    pub fn new(min: Duration, max: Duration) -> Self {
        Self { min, max }
    }

    pub fn none() -> Self {
        Self {
            min: Duration::ZERO,
            max: Duration::ZERO,
        }
    }

    pub fn next_delay(&self) -> Duration {
        if self.max <= self.min {
            return self.min;
        }
        let secs = rand::rng().random_range(self.min.as_secs_f64()..=self.max.as_secs_f64());
        Duration::from_secs_f64(secs)
    }
}

impl Default for Pacing {
    fn default() -> Self {
        Self::new(Duration::from_secs(4), Duration::from_secs(7))
    }
}

// ---------------------------------------------------------------------------
// Run stats
// ---------------------------------------------------------------------------

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RunStats {
    pub rows_seen: u32,
    pub owned: u32,
    pub skipped_removed: u32,
    pub skipped_recent: u32,
    pub skipped_empty: u32,
    pub checked: u32,
    pub active: u32,
    pub removed: u32,
    pub unknown: u32,
    pub login_required: u32,
    pub flushes: u32,
}

impl RunStats {
    fn record(&mut self, verdict: Verdict) {
        self.checked += 1;
        match verdict {
            Verdict::Active => self.active += 1,
            Verdict::Removed => self.removed += 1,
            Verdict::Unknown => self.unknown += 1,
            Verdict::LoginRequired => self.login_required += 1,
        }
    }

    fn record_skip(&mut self, reason: &SkipReason) {
        match reason {
            SkipReason::EmptyUrl => self.skipped_empty += 1,
            SkipReason::AlreadyRemoved => self.skipped_removed += 1,
            SkipReason::CheckedRecently(_) => self.skipped_recent += 1,
        }
    }
}

impl fmt::Display for RunStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "rows={} owned={} checked={} (active={} removed={} unknown={} login_required={}) \
             skipped (removed={} recent={} empty={}) flushes={}",
            self.rows_seen,
            self.owned,
            self.checked,
            self.active,
            self.removed,
            self.unknown,
            self.login_required,
            self.skipped_removed,
            self.skipped_recent,
            self.skipped_empty,
            self.flushes,
        )
    }
}

// ---------------------------------------------------------------------------
// Scheduler
// ---------------------------------------------------------------------------

/// Walks this shard's rows, classifies each and writes verdicts back in batches.
pub struct Scheduler<S, C> {
    store: S,
    classifier: C,
    layout: SheetLayout,
    shard: Shard,
    skip: SkipPolicy,
    flush_every: usize,
    pacing: Pacing,
}

impl<S: RowStore, C: LinkClassifier> Scheduler<S, C> {
    pub fn new(store: S, classifier: C, layout: SheetLayout, shard: Shard) -> Self {
        Self {
            store,
            classifier,
            layout,
            shard,
            skip: SkipPolicy::default(),
            flush_every: 250,
            pacing: Pacing::default(),
        }
    }

    pub fn with_skip_policy(mut self, skip: SkipPolicy) -> Self {
        self.skip = skip;
        self
    }

    pub fn with_flush_every(mut self, n: usize) -> Self {
        self.flush_every = n.max(1);
        self
    }

    pub fn with_pacing(mut self, pacing: Pacing) -> Self {
        self.pacing = pacing;
        self
    }

    /// Give the classifier back, e.g. to shut down its browser.
    pub fn into_classifier(self) -> C {
        self.classifier
    }

    /// One pass over the store. `today` stamps checked and removal dates.
    pub async fn run(&mut self, today: NaiveDate) -> Result<RunStats> {
        let run_id = Uuid::new_v4();
        let mut stats = RunStats::default();

        let rows = self
            .store
            .read_all_rows()
            .await
            .context("Failed to read rows")?;

        info!(
            %run_id,
            sheet = self.layout.key,
            tab = self.layout.tab.as_str(),
            rows = rows.len(),
            shard = self.shard.index(),
            total_shards = self.shard.total(),
            "Starting run"
        );

        let first_data = (FIRST_DATA_ROW - 1) as usize;
        let mut pending: Vec<CellUpdate> = Vec::new();

        for (ordinal, row) in rows.iter().enumerate().skip(first_data) {
            stats.rows_seen += 1;
            if !self.shard.owns(ordinal) {
                continue;
            }
            stats.owned += 1;

            let sheet_row = ordinal as u32 + 1;
            let record = self.record(row);

            if let Some(reason) = self.skip.check(&record, today) {
                debug!(%run_id, row = sheet_row, url = record.url.as_str(), ?reason, "Skipping row");
                stats.record_skip(&reason);
                continue;
            }

            let result = self.classifier.classify(&record.url).await;
            stats.record(result.verdict);
            info!(
                %run_id,
                row = sheet_row,
                url = record.url.as_str(),
                platform = %record.platform,
                verdict = %result.verdict,
                detail = result.detail.as_str(),
                "Row checked"
            );

            pending.push(self.update_for(sheet_row, result.verdict, today));
            if pending.len() >= self.flush_every {
                self.flush(&mut pending, &mut stats, run_id).await?;
            }

            let delay = self.pacing.next_delay();
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
        }

        self.flush(&mut pending, &mut stats, run_id).await?;

        info!(%run_id, "Run complete: {stats}");
        Ok(stats)
    }

    fn record(&self, row: &[String]) -> LinkRecord {
        let url = self.layout.url(row).to_string();
        LinkRecord {
            platform: identify_platform(&url),
            last_status: Verdict::from_label(self.layout.status(row)),
            last_checked_at: parse_sheet_date(self.layout.last_checked(row)),
            url,
        }
    }

    fn update_for(&self, sheet_row: u32, verdict: Verdict, today: NaiveDate) -> CellUpdate {
        let checked = format_sheet_date(today);
        let removal = if verdict == Verdict::Removed {
            checked.clone()
        } else {
            String::new()
        };
        CellUpdate {
            range: self.layout.result_range(sheet_row),
            values: vec![vec![verdict.label().to_string(), removal, checked]],
        }
    }

    async fn flush(
        &self,
        pending: &mut Vec<CellUpdate>,
        stats: &mut RunStats,
        run_id: Uuid,
    ) -> Result<()> {
        if pending.is_empty() {
            return Ok(());
        }
        let count = pending.len();
        if let Err(e) = self.store.batch_write(pending).await {
            warn!(%run_id, updates = count, error = %e, "Flush failed");
            return Err(e.context(format!("Failed to flush {count} updates")));
        }
        pending.clear();
        stats.flushes += 1;
        info!(%run_id, updates = count, "Flushed updates");
        Ok(())
    }
}

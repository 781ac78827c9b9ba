// Test mocks for the worker.
//
// - MemoryRowStore (RowStore): rows in memory, records every batch written
// - ScriptedClassifier (LinkClassifier): URL → verdict, records calls

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use anyhow::{bail, Result};
use async_trait::async_trait;
use linkwatch_engine::{ClassificationResult, LinkClassifier, Verdict};

use crate::store::{CellUpdate, RowStore};

#[derive(Default)]
struct StoreState {
    rows: Vec<Vec<String>>,
    batches: Vec<Vec<CellUpdate>>,
}

/// In-memory sheet. Clones share state so a test can inspect writes after
/// handing the store to a scheduler.
#[derive(Clone, Default)]
pub struct MemoryRowStore {
    state: Arc<Mutex<StoreState>>,
    fail_writes: bool,
}

impl MemoryRowStore {
    pub fn new(rows: Vec<Vec<String>>) -> Self {
        Self {
            state: Arc::new(Mutex::new(StoreState {
                rows,
                batches: Vec::new(),
            })),
            fail_writes: false,
        }
    }

    pub fn failing_writes(mut self) -> Self {
        self.fail_writes = true;
        self
    }

    pub fn batches(&self) -> Vec<Vec<CellUpdate>> {
        self.state.lock().unwrap().batches.clone()
    }

    pub fn updates(&self) -> Vec<CellUpdate> {
        self.batches().into_iter().flatten().collect()
    }

    /// First row written to `range`, if any.
    pub fn update_for(&self, range: &str) -> Option<Vec<String>> {
        self.updates()
            .into_iter()
            .find(|u| u.range == range)
            .and_then(|u| u.values.into_iter().next())
    }
}

#[async_trait]
impl RowStore for MemoryRowStore {
    async fn read_all_rows(&self) -> Result<Vec<Vec<String>>> {
        Ok(self.state.lock().unwrap().rows.clone())
    }

    async fn batch_write(&self, updates: &[CellUpdate]) -> Result<()> {
        if self.fail_writes {
            bail!("sheet quota exceeded");
        }
        self.state.lock().unwrap().batches.push(updates.to_vec());
        Ok(())
    }
}

/// Classifier that answers from a URL → verdict table. Unscripted URLs are Unknown.
#[derive(Clone, Default)]
pub struct ScriptedClassifier {
    verdicts: HashMap<String, Verdict>,
    calls: Arc<Mutex<Vec<String>>>,
}

impl ScriptedClassifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on(mut self, url: &str, verdict: Verdict) -> Self {
        self.verdicts.insert(url.to_string(), verdict);
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl LinkClassifier for ScriptedClassifier {
    async fn classify(&mut self, url: &str) -> ClassificationResult {
        self.calls.lock().unwrap().push(url.to_string());
        match self.verdicts.get(url) {
            Some(v) => ClassificationResult::new(*v, "scripted"),
            None => ClassificationResult::unknown("unscripted"),
        }
    }
}

/// A row of `width` empty cells with `cells` placed at 1-based columns.
pub fn row(width: usize, cells: &[(u32, &str)]) -> Vec<String> {
    let mut row = vec![String::new(); width];
    for (col, value) in cells {
        row[*col as usize - 1] = value.to_string();
    }
    row
}

use anyhow::{Context, Result};
use async_trait::async_trait;
use sheets_client::{SheetsClient, ValueRange};

use crate::layout::SheetLayout;

/// Values written to an A1 range, row-major.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CellUpdate {
    pub range: String,
    pub values: Vec<Vec<String>>,
}

/// Tabular storage holding the tracked links.
#[async_trait]
pub trait RowStore: Send + Sync {
    /// Every row of the tab, header included. Rows may be ragged.
    async fn read_all_rows(&self) -> Result<Vec<Vec<String>>>;

    /// Apply all updates in a single round trip.
    async fn batch_write(&self, updates: &[CellUpdate]) -> Result<()>;
}

pub struct SheetsRowStore {
    client: SheetsClient,
    spreadsheet_id: String,
    tab: String,
}

impl SheetsRowStore {
    pub fn new(client: SheetsClient, layout: &SheetLayout) -> Self {
        Self {
            client,
            spreadsheet_id: layout.spreadsheet_id.clone(),
            tab: layout.tab.clone(),
        }
    }
}

#[async_trait]
impl RowStore for SheetsRowStore {
    async fn read_all_rows(&self) -> Result<Vec<Vec<String>>> {
        self.client
            .get_values(&self.spreadsheet_id, &self.tab)
            .await
            .with_context(|| format!("reading tab '{}'", self.tab))
    }

    async fn batch_write(&self, updates: &[CellUpdate]) -> Result<()> {
        let data: Vec<ValueRange> = updates
            .iter()
            .map(|u| ValueRange {
                range: u.range.clone(),
                values: u.values.clone(),
            })
            .collect();

        self.client
            .batch_update_values(&self.spreadsheet_id, &data)
            .await
            .with_context(|| format!("writing {} ranges to '{}'", data.len(), self.tab))?;
        Ok(())
    }
}

// Where things live in each tracked sheet. Column numbers are 1-based.

use sheets_client::row_range;

/// First sheet row holding data; row 1 is the header.
pub const FIRST_DATA_ROW: u32 = 2;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetLayout {
    pub key: &'static str,
    pub spreadsheet_id: String,
    pub tab: String,
    pub url_col: u32,
    /// Status, removal date and last-checked must be adjacent, in that order.
    pub status_col: u32,
    pub removal_date_col: u32,
    pub last_checked_col: u32,
}

impl SheetLayout {
    pub fn primary() -> Self {
        Self {
            key: "primary",
            spreadsheet_id: "1sPsWqoEqd1YmD752fuz7j1K3VSGggpzlkc_Tp7Pr4jQ".to_string(),
            tab: "Logs".to_string(),
            url_col: 6,
            status_col: 13,
            removal_date_col: 14,
            last_checked_col: 15,
        }
    }

    pub fn facebook_archive() -> Self {
        Self {
            key: "fb_rm",
            spreadsheet_id: "1P698PUG-i578PdPm13MfrGo9svzK97sHw012isxisUY".to_string(),
            tab: "Facebook RM Archives".to_string(),
            url_col: 10,
            status_col: 15,
            removal_date_col: 16,
            last_checked_col: 17,
        }
    }

    pub fn instagram_archive() -> Self {
        Self {
            key: "ig_rm",
            tab: "Instagram RM Archives".to_string(),
            ..Self::facebook_archive()
        }
    }

    /// Preset by name; unknown names fall back to `primary`.
    pub fn preset(name: &str) -> Self {
        match name.trim().to_lowercase().as_str() {
            "fb_rm" => Self::facebook_archive(),
            "ig_rm" => Self::instagram_archive(),
            "primary" => Self::primary(),
            other => {
                tracing::warn!(sheet = other, "Unknown sheet preset, using primary");
                Self::primary()
            }
        }
    }

    pub fn with_spreadsheet_id(mut self, id: &str) -> Self {
        self.spreadsheet_id = id.to_string();
        self
    }

    pub fn columns_are_adjacent(&self) -> bool {
        self.removal_date_col == self.status_col + 1
            && self.last_checked_col == self.removal_date_col + 1
    }

    /// Range receiving `[status, removal date, last checked]` for a 1-based sheet row.
    pub fn result_range(&self, sheet_row: u32) -> String {
        row_range(&self.tab, self.status_col, self.last_checked_col, sheet_row)
    }

    pub fn url<'a>(&self, row: &'a [String]) -> &'a str {
        cell(row, self.url_col)
    }

    pub fn status<'a>(&self, row: &'a [String]) -> &'a str {
        cell(row, self.status_col)
    }

    pub fn last_checked<'a>(&self, row: &'a [String]) -> &'a str {
        cell(row, self.last_checked_col)
    }
}

/// Trimmed cell content; missing trailing cells read as empty.
fn cell(row: &[String], col: u32) -> &str {
    col.checked_sub(1)
        .and_then(|i| row.get(i as usize))
        .map(|s| s.trim())
        .unwrap_or("")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn presets_by_name() {
        assert_eq!(SheetLayout::preset("fb_rm").tab, "Facebook RM Archives");
        assert_eq!(SheetLayout::preset(" IG_RM ").tab, "Instagram RM Archives");
        assert_eq!(SheetLayout::preset("primary").url_col, 6);
        assert_eq!(SheetLayout::preset("nope").key, "primary");
    }

    #[test]
    fn presets_write_adjacent_columns() {
        for layout in [
            SheetLayout::primary(),
            SheetLayout::facebook_archive(),
            SheetLayout::instagram_archive(),
        ] {
            assert!(layout.columns_are_adjacent(), "{}", layout.key);
        }
    }

    #[test]
    fn result_range_in_a1() {
        assert_eq!(SheetLayout::primary().result_range(7), "'Logs'!M7:O7");
        assert_eq!(
            SheetLayout::instagram_archive().result_range(2),
            "'Instagram RM Archives'!O2:Q2"
        );
    }

    #[test]
    fn ragged_rows_read_as_empty() {
        let layout = SheetLayout::primary();
        let row: Vec<String> = vec!["a".into(), "b".into()];
        assert_eq!(layout.url(&row), "");
        assert_eq!(layout.status(&row), "");

        let mut full = vec![String::new(); 15];
        full[5] = "  https://x.test/ ".into();
        full[12] = "Removed".into();
        assert_eq!(layout.url(&full), "https://x.test/");
        assert_eq!(layout.status(&full), "Removed");
    }
}

use serde::{Deserialize, Serialize};

/// A block of cell values addressed by an A1 range, e.g. `Logs!M5:O5`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValueRange {
    pub range: String,
    #[serde(default)]
    pub values: Vec<Vec<String>>,
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct BatchUpdateRequest<'a> {
    #[serde(rename = "valueInputOption")]
    pub value_input_option: &'static str,
    pub data: &'a [ValueRange],
}

#[derive(Debug, Clone, Deserialize)]
pub struct BatchUpdateResponse {
    #[serde(rename = "totalUpdatedRows", default)]
    pub total_updated_rows: u64,
    #[serde(rename = "totalUpdatedCells", default)]
    pub total_updated_cells: u64,
}

/// Raw values payload. Cells may come back as numbers or booleans when the
/// sheet is read with `UNFORMATTED_VALUE`, so they are kept as JSON here.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct RawValueRange {
    #[serde(default)]
    pub values: Vec<Vec<serde_json::Value>>,
}

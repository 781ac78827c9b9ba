pub mod a1;
pub mod error;
pub mod types;

pub use a1::{column_letter, row_range};
pub use error::{Result, SheetsError};
pub use types::{BatchUpdateResponse, ValueRange};

use std::time::Duration;

use types::{BatchUpdateRequest, RawValueRange};

const BASE_URL: &str = "https://sheets.googleapis.com/v4/spreadsheets";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

pub struct SheetsClient {
    client: reqwest::Client,
    token: String,
    base_url: String,
}

impl SheetsClient {
    /// `token` is an OAuth2 bearer access token with the spreadsheets scope.
    pub fn new(token: String) -> Self {
        Self {
            client: build_client(REQUEST_TIMEOUT),
            token,
            base_url: BASE_URL.to_string(),
        }
    }

    /// Bound every request, connect through body, by `timeout`.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.client = build_client(timeout);
        self
    }

    /// Point the client at a different API root (used against local fakes).
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    fn values_url(&self, spreadsheet_id: &str, tail: &str) -> Result<reqwest::Url> {
        let mut url = reqwest::Url::parse(&self.base_url)
            .map_err(|e| SheetsError::InvalidRequest(format!("bad base url: {e}")))?;
        url.path_segments_mut()
            .map_err(|_| SheetsError::InvalidRequest("base url cannot hold a path".into()))?
            .push(spreadsheet_id)
            .push(tail);
        Ok(url)
    }

    /// Read every populated cell of `range` (a tab name reads the whole tab)
    /// as formatted strings. Rows keep sheet order; trailing empty cells are
    /// omitted by the API, so rows may be ragged.
    pub async fn get_values(&self, spreadsheet_id: &str, range: &str) -> Result<Vec<Vec<String>>> {
        let mut url = self.values_url(spreadsheet_id, "values")?;
        url.path_segments_mut()
            .map_err(|_| SheetsError::InvalidRequest("base url cannot hold a path".into()))?
            .push(range);

        let resp = self
            .client
            .get(url)
            .bearer_auth(&self.token)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(SheetsError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        let raw: RawValueRange = resp.json().await?;
        let rows = raw
            .values
            .into_iter()
            .map(|row| row.into_iter().map(cell_to_string).collect())
            .collect::<Vec<Vec<String>>>();

        tracing::debug!(spreadsheet_id, range, rows = rows.len(), "Read sheet values");
        Ok(rows)
    }

    /// Write several ranges in one request. Values are interpreted as if typed
    /// by a user, so `MM/DD/YYYY` strings become dates.
    pub async fn batch_update_values(
        &self,
        spreadsheet_id: &str,
        data: &[ValueRange],
    ) -> Result<BatchUpdateResponse> {
        if data.is_empty() {
            return Ok(BatchUpdateResponse {
                total_updated_rows: 0,
                total_updated_cells: 0,
            });
        }

        let url = self.values_url(spreadsheet_id, "values:batchUpdate")?;
        let body = BatchUpdateRequest {
            value_input_option: "USER_ENTERED",
            data,
        };

        let resp = self
            .client
            .post(url)
            .bearer_auth(&self.token)
            .json(&body)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(SheetsError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        let updated: BatchUpdateResponse = resp.json().await?;
        tracing::info!(
            spreadsheet_id,
            ranges = data.len(),
            cells = updated.total_updated_cells,
            "Batch update applied"
        );
        Ok(updated)
    }
}

fn build_client(timeout: Duration) -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .expect("Failed to build HTTP client")
}

fn cell_to_string(value: serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s,
        serde_json::Value::Null => String::new(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn values_url_encodes_tab_names() {
        let client = SheetsClient::new("t".into());
        let mut url = client.values_url("abc123", "values").unwrap();
        url.path_segments_mut().unwrap().push("Facebook RM Archives");
        assert_eq!(
            url.as_str(),
            "https://sheets.googleapis.com/v4/spreadsheets/abc123/values/Facebook%20RM%20Archives"
        );
    }

    #[test]
    fn batch_update_url_keeps_colon_method() {
        let client = SheetsClient::new("t".into()).with_base_url("http://localhost:9000/v4/spreadsheets/");
        let url = client.values_url("abc", "values:batchUpdate").unwrap();
        assert_eq!(
            url.as_str(),
            "http://localhost:9000/v4/spreadsheets/abc/values:batchUpdate"
        );
    }

    #[tokio::test]
    async fn stalled_server_times_out() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        // Accept and hold the connection without ever answering.
        let server = tokio::spawn(async move {
            let (socket, _) = listener.accept().await.unwrap();
            tokio::time::sleep(Duration::from_secs(30)).await;
            drop(socket);
        });

        let client = SheetsClient::new("t".into())
            .with_base_url(&format!("http://{addr}/v4/spreadsheets"))
            .with_timeout(Duration::from_millis(200));

        let started = std::time::Instant::now();
        let err = client.get_values("abc", "Logs").await.unwrap_err();
        assert!(matches!(err, SheetsError::Network(_)));
        assert!(started.elapsed() < Duration::from_secs(10));
        server.abort();
    }

    #[test]
    fn non_string_cells_are_stringified() {
        assert_eq!(cell_to_string(serde_json::json!("Active")), "Active");
        assert_eq!(cell_to_string(serde_json::json!(42)), "42");
        assert_eq!(cell_to_string(serde_json::Value::Null), "");
    }
}

pub mod error;
pub mod types;

pub use error::{BrowserlessError, Result};
pub use types::{Engine, RenderOptions, RenderedPage, WaitUntil};

use std::time::Duration;

use types::{ContentRequest, GotoOptions};

/// Extra time granted to the HTTP request beyond the in-browser navigation timeout.
const REQUEST_MARGIN: Duration = Duration::from_secs(10);

pub struct BrowserlessClient {
    client: reqwest::Client,
    base_url: String,
    token: Option<String>,
    engine: Engine,
}

impl BrowserlessClient {
    pub fn new(base_url: &str, token: Option<&str>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .expect("Failed to build HTTP client");

        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.map(String::from),
            engine: Engine::Chromium,
        }
    }

    /// Route render requests to a different browser engine.
    pub fn with_engine(mut self, engine: Engine) -> Self {
        self.engine = engine;
        self
    }

    pub fn engine(&self) -> Engine {
        self.engine
    }

    fn endpoint(&self) -> String {
        let mut endpoint = format!("{}{}", self.base_url, self.engine.content_path());
        if let Some(ref token) = self.token {
            endpoint.push_str(&format!("?token={token}"));
        }
        endpoint
    }

    /// Render a URL and report the HTML together with the upstream status and final URL.
    ///
    /// A 408 from the service means the in-browser navigation hit `options.timeout`
    /// and is surfaced as [`BrowserlessError::Timeout`] so callers can retry with a
    /// looser wait condition.
    pub async fn render(&self, url: &str, options: &RenderOptions) -> Result<RenderedPage> {
        let body = ContentRequest {
            url,
            goto_options: GotoOptions {
                wait_until: options.wait_until.as_str(),
                timeout: options.timeout.as_millis() as u64,
            },
            user_agent: options.user_agent.as_deref(),
            best_attempt: options.best_attempt,
        };

        tracing::debug!(
            url,
            engine = self.engine.as_str(),
            wait_until = options.wait_until.as_str(),
            "Browserless render"
        );

        let resp = self
            .client
            .post(self.endpoint())
            .header("Content-Type", "application/json")
            .timeout(options.timeout + REQUEST_MARGIN)
            .json(&body)
            .send()
            .await?;

        let status = resp.status();
        if status.as_u16() == 408 {
            return Err(BrowserlessError::Timeout(format!(
                "{url} did not reach {} within {}ms",
                options.wait_until.as_str(),
                options.timeout.as_millis()
            )));
        }
        if !status.is_success() {
            let message = resp.text().await.unwrap_or_default();
            return Err(BrowserlessError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let headers = resp.headers();
        let upstream_status = headers
            .get("x-response-code")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse::<u16>().ok());
        let final_url = headers
            .get("x-response-url")
            .and_then(|v| v.to_str().ok())
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty());

        let html = resp.text().await?;

        Ok(RenderedPage {
            html,
            status: upstream_status,
            final_url,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_follows_engine_route() {
        let client = BrowserlessClient::new("http://localhost:3000/", Some("abc"));
        assert_eq!(client.endpoint(), "http://localhost:3000/content?token=abc");

        let webkit = BrowserlessClient::new("http://localhost:3000", None).with_engine(Engine::Webkit);
        assert_eq!(webkit.endpoint(), "http://localhost:3000/webkit/content");
    }

    #[test]
    fn request_body_uses_service_field_names() {
        let body = ContentRequest {
            url: "https://example.com",
            goto_options: GotoOptions {
                wait_until: WaitUntil::NetworkIdle.as_str(),
                timeout: 15_000,
            },
            user_agent: Some("UA"),
            best_attempt: true,
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["gotoOptions"]["waitUntil"], "networkidle0");
        assert_eq!(json["gotoOptions"]["timeout"], 15_000);
        assert_eq!(json["userAgent"], "UA");
        assert_eq!(json["bestAttempt"], true);
    }

    #[test]
    fn user_agent_omitted_when_unset() {
        let body = ContentRequest {
            url: "https://example.com",
            goto_options: GotoOptions {
                wait_until: WaitUntil::DomContentLoaded.as_str(),
                timeout: 1,
            },
            user_agent: None,
            best_attempt: false,
        };
        let json = serde_json::to_value(&body).unwrap();
        assert!(json.get("userAgent").is_none());
    }
}

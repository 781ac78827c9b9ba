use std::time::Duration;

use serde::Serialize;

/// Browser engine the service should render with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Engine {
    Chromium,
    Webkit,
}

impl Engine {
    pub fn as_str(&self) -> &'static str {
        match self {
            Engine::Chromium => "chromium",
            Engine::Webkit => "webkit",
        }
    }

    pub(crate) fn content_path(&self) -> &'static str {
        match self {
            Engine::Chromium => "/content",
            Engine::Webkit => "/webkit/content",
        }
    }
}

/// Page lifecycle event that ends navigation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitUntil {
    DomContentLoaded,
    NetworkIdle,
}

impl WaitUntil {
    pub fn as_str(&self) -> &'static str {
        match self {
            WaitUntil::DomContentLoaded => "domcontentloaded",
            WaitUntil::NetworkIdle => "networkidle0",
        }
    }
}

#[derive(Debug, Clone)]
pub struct RenderOptions {
    pub wait_until: WaitUntil,
    pub timeout: Duration,
    pub user_agent: Option<String>,
    /// Return whatever rendered so far instead of failing on wait-condition errors.
    pub best_attempt: bool,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            wait_until: WaitUntil::DomContentLoaded,
            timeout: Duration::from_secs(15),
            user_agent: None,
            best_attempt: false,
        }
    }
}

/// Result of one render: the serialized DOM plus what the browser saw upstream.
#[derive(Debug, Clone)]
pub struct RenderedPage {
    pub html: String,
    /// HTTP status of the main document, when the service reports it.
    pub status: Option<u16>,
    /// URL after redirects, when the service reports it.
    pub final_url: Option<String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct ContentRequest<'a> {
    pub url: &'a str,
    #[serde(rename = "gotoOptions")]
    pub goto_options: GotoOptions,
    #[serde(rename = "userAgent", skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<&'a str>,
    #[serde(rename = "bestAttempt")]
    pub best_attempt: bool,
}

#[derive(Debug, Serialize)]
pub(crate) struct GotoOptions {
    #[serde(rename = "waitUntil")]
    pub wait_until: &'static str,
    pub timeout: u64,
}

// Local headless Chrome driven over the DevTools protocol. Each launch starts a
// browser on a throwaway profile and holds one tab on it until closed.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::network::{
    EnableParams, EventResponseReceived, ResourceType,
};
use chromiumoxide::Page;
use futures::StreamExt;
use rand::Rng;
use serde::Deserialize;
use tempfile::TempDir;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::{BrowserEngine, BrowserLauncher, BrowserPage, DriverError, WaitCondition};

/// Max attempts for transient process failures (fork limits and the like).
const CHROME_MAX_ATTEMPTS: u32 = 3;
/// Base backoff for retries. Actual delay is base * 3^attempt + jitter.
const CHROME_RETRY_BASE: Duration = Duration::from_secs(3);

/// How long the resource count must hold still to call the network idle.
const IDLE_QUIET: Duration = Duration::from_millis(500);
const IDLE_POLL: Duration = Duration::from_millis(100);
/// Grace for the main document's response event after navigation returns.
const STATUS_GRACE: Duration = Duration::from_secs(2);

const LOAD_STATE_JS: &str = "({ readyState: document.readyState, \
resources: performance.getEntriesByType('resource').length })";

pub struct ChromeLauncher {
    chrome_bin: String,
}

impl ChromeLauncher {
    pub fn new(chrome_bin: &str) -> Self {
        info!(chrome_bin, "ChromeLauncher initialized");
        Self {
            chrome_bin: chrome_bin.to_string(),
        }
    }
}

#[async_trait]
impl BrowserLauncher for ChromeLauncher {
    async fn launch(
        &self,
        engine: BrowserEngine,
        user_agent: &str,
    ) -> Result<Box<dyn BrowserPage>, DriverError> {
        if engine != BrowserEngine::Chromium {
            return Err(DriverError::Launch(format!(
                "{engine} is not available with a local Chrome binary"
            )));
        }

        for attempt in 0..CHROME_MAX_ATTEMPTS {
            match ChromePage::launch(&self.chrome_bin, user_agent).await {
                Ok(page) => return Ok(Box::new(page)),
                Err(e) if is_transient_error(&e.to_string()) && attempt + 1 < CHROME_MAX_ATTEMPTS => {
                    warn!(attempt = attempt + 1, error = %e, "Chrome launch hit a transient error, retrying");
                    retry_with_backoff(attempt).await;
                }
                Err(e) => return Err(e),
            }
        }

        Err(DriverError::Launch(format!(
            "Chrome failed to start after {CHROME_MAX_ATTEMPTS} attempts"
        )))
    }
}

pub struct ChromePage {
    browser: Option<Browser>,
    page: Option<Page>,
    handler: JoinHandle<()>,
    current_url: String,
    // Dropped last so the browser has released the profile.
    _profile: TempDir,
}

impl ChromePage {
    async fn launch(chrome_bin: &str, user_agent: &str) -> Result<Self, DriverError> {
        let profile = tempfile::tempdir()
            .map_err(|e| DriverError::Launch(format!("temp profile dir: {e}")))?;

        let config = BrowserConfig::builder()
            .chrome_executable(chrome_bin)
            .no_sandbox()
            .user_data_dir(profile.path())
            .arg("--disable-gpu")
            .arg("--disable-dev-shm-usage")
            .arg(format!("--user-agent={user_agent}"))
            .build()
            .map_err(DriverError::Launch)?;

        let (mut browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| DriverError::Launch(format!("Failed to start {chrome_bin}: {e}")))?;

        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    debug!(error = %e, "Chrome handler stopped");
                    break;
                }
            }
        });

        let page = match browser.new_page("about:blank").await {
            Ok(page) => page,
            Err(e) => {
                let _ = browser.close().await;
                handler.abort();
                return Err(DriverError::Launch(format!("Failed to open tab: {e}")));
            }
        };
        if let Err(e) = page.execute(EnableParams::default()).await {
            warn!(error = %e, "Failed to enable network events, statuses will be missing");
        }

        Ok(Self {
            browser: Some(browser),
            page: Some(page),
            handler,
            current_url: String::new(),
            _profile: profile,
        })
    }

    fn tab(&self) -> Result<&Page, DriverError> {
        self.page
            .as_ref()
            .ok_or_else(|| DriverError::Navigation("tab already closed".into()))
    }

    async fn load_state(&self) -> Result<LoadState, DriverError> {
        self.tab()?
            .evaluate(LOAD_STATE_JS)
            .await
            .map_err(|e| DriverError::Navigation(e.to_string()))?
            .into_value::<LoadState>()
            .map_err(|e| DriverError::Navigation(e.to_string()))
    }
}

#[async_trait]
impl BrowserPage for ChromePage {
    /// Waits for the load event; `NetworkIdle` additionally waits for the
    /// resource count to settle within what is left of `timeout`.
    async fn goto(
        &mut self,
        url: &str,
        wait: WaitCondition,
        timeout: Duration,
    ) -> Result<Option<u16>, DriverError> {
        check_scheme(url)?;
        let started = Instant::now();
        let tab = self.tab()?;

        let mut responses = tab
            .event_listener::<EventResponseReceived>()
            .await
            .map_err(|e| DriverError::Navigation(e.to_string()))?;

        match tokio::time::timeout(timeout, tab.goto(url)).await {
            Ok(Ok(_)) => {}
            Ok(Err(e)) => return Err(DriverError::Navigation(format!("{url}: {e}"))),
            Err(_) => {
                return Err(DriverError::Timeout(format!(
                    "{url} did not load within {}ms",
                    timeout.as_millis()
                )))
            }
        }

        // First document response is the main frame's, after any redirects.
        let status = tokio::time::timeout(STATUS_GRACE, async {
            while let Some(event) = responses.next().await {
                if event.r#type == ResourceType::Document {
                    return u16::try_from(event.response.status).ok();
                }
            }
            None
        })
        .await
        .unwrap_or(None);

        let landed = match tab.url().await {
            Ok(Some(current)) => current,
            _ => url.to_string(),
        };
        self.current_url = landed;

        if wait == WaitCondition::NetworkIdle {
            let left = timeout.saturating_sub(started.elapsed());
            self.wait_for_network_idle(left).await?;
        }
        Ok(status)
    }

    async fn wait_for_network_idle(&mut self, timeout: Duration) -> Result<(), DriverError> {
        let deadline = Instant::now() + timeout;
        let mut tracker = IdleTracker::new(IDLE_QUIET);
        loop {
            let state = self.load_state().await?;
            if tracker.observe(&state, Instant::now()) {
                return Ok(());
            }
            if Instant::now() + IDLE_POLL > deadline {
                return Err(DriverError::Timeout(format!(
                    "network not idle within {}ms",
                    timeout.as_millis()
                )));
            }
            tokio::time::sleep(IDLE_POLL).await;
        }
    }

    fn url(&self) -> String {
        self.current_url.clone()
    }

    async fn content(&mut self) -> Result<String, DriverError> {
        self.tab()?
            .content()
            .await
            .map_err(|e| DriverError::Navigation(e.to_string()))
    }

    async fn close(&mut self) -> Result<(), DriverError> {
        if let Some(page) = self.page.take() {
            if let Err(e) = page.close().await {
                debug!(error = %e, "Failed to close tab");
            }
        }
        if let Some(mut browser) = self.browser.take() {
            if let Err(e) = browser.close().await {
                warn!(error = %e, "Failed to close Chrome");
            }
            let _ = browser.wait().await;
        }
        self.handler.abort();
        self.current_url.clear();
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LoadState {
    ready_state: String,
    resources: u64,
}

/// Network counts as idle once the document is complete and no new
/// resource entries have appeared for `quiet`.
struct IdleTracker {
    quiet: Duration,
    last: Option<(u64, Instant)>,
}

impl IdleTracker {
    fn new(quiet: Duration) -> Self {
        Self { quiet, last: None }
    }

    fn observe(&mut self, state: &LoadState, now: Instant) -> bool {
        if state.ready_state != "complete" {
            self.last = None;
            return false;
        }
        match self.last {
            Some((count, since)) if count == state.resources => now.duration_since(since) >= self.quiet,
            _ => {
                self.last = Some((state.resources, now));
                false
            }
        }
    }
}

fn check_scheme(url: &str) -> Result<(), DriverError> {
    let parsed = url::Url::parse(url).map_err(|e| DriverError::Navigation(e.to_string()))?;
    match parsed.scheme() {
        "http" | "https" => Ok(()),
        other => Err(DriverError::Navigation(format!(
            "Only http/https URLs allowed, got: {other}"
        ))),
    }
}

fn is_transient_error(msg: &str) -> bool {
    msg.contains("Cannot fork") || msg.contains("Resource temporarily unavailable")
}

async fn retry_with_backoff(attempt: u32) {
    let backoff = CHROME_RETRY_BASE * 3u32.pow(attempt);
    let jitter = Duration::from_millis(rand::rng().random_range(0..1000));
    tokio::time::sleep(backoff + jitter).await;
}

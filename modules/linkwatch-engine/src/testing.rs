// Test mocks for the engine.
//
// - ObservationBuilder: synthetic PageObservation from head/body fragments
// - MockPage (BrowserPage): URL → scripted navigation outcome, with a shared log
// - MockLauncher (BrowserLauncher): hands out MockPages, records engine + identity
// - FixedSecondary (SecondaryProbe): canned second observation, records calls

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use crate::driver::{BrowserEngine, BrowserLauncher, BrowserPage, DriverError, WaitCondition};
use crate::observation::PageObservation;
use crate::secondary::SecondaryProbe;

// ---------------------------------------------------------------------------
// ObservationBuilder
// ---------------------------------------------------------------------------

pub struct ObservationBuilder {
    url: String,
    status: Option<u16>,
    head: String,
    body: String,
}

impl ObservationBuilder {
    pub fn new(final_url: &str) -> Self {
        Self {
            url: final_url.to_string(),
            status: None,
            head: String::new(),
            body: String::new(),
        }
    }

    pub fn status(mut self, code: u16) -> Self {
        self.status = Some(code);
        self
    }

    pub fn body(mut self, html: &str) -> Self {
        self.body.push_str(html);
        self
    }

    pub fn head(mut self, html: &str) -> Self {
        self.head.push_str(html);
        self
    }

    pub fn meta(self, property: &str, content: &str) -> Self {
        let tag = format!(r#"<meta property="{property}" content="{content}">"#);
        self.head(&tag)
    }

    pub fn json_ld(self, json: &str) -> Self {
        let tag = format!(r#"<script type="application/ld+json">{json}</script>"#);
        self.head(&tag)
    }

    pub fn html(&self) -> String {
        format!(
            "<html><head>{}</head><body>{}</body></html>",
            self.head, self.body
        )
    }

    pub fn build(self) -> PageObservation {
        let html = self.html();
        PageObservation::new(&self.url, self.status, html)
    }
}

// ---------------------------------------------------------------------------
// MockPage
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScriptOutcome {
    Ok,
    Fail,
    Timeout,
}

/// What a MockPage does when navigated to a URL.
#[derive(Debug, Clone)]
pub struct PageScript {
    outcome: ScriptOutcome,
    status: Option<u16>,
    final_url: String,
    html: String,
    dom_content_timeout: bool,
    idle_fails: bool,
    delay: Duration,
}

impl PageScript {
    pub fn ok(status: u16, final_url: &str, html: &str) -> Self {
        Self {
            outcome: ScriptOutcome::Ok,
            status: Some(status),
            final_url: final_url.to_string(),
            html: html.to_string(),
            dom_content_timeout: false,
            idle_fails: false,
            delay: Duration::ZERO,
        }
    }

    /// Loads, but the driver cannot report a status (e.g. local Chrome).
    pub fn ok_without_status(final_url: &str, html: &str) -> Self {
        Self {
            status: None,
            ..Self::ok(0, final_url, html)
        }
    }

    pub fn fail() -> Self {
        Self {
            outcome: ScriptOutcome::Fail,
            ..Self::ok(0, "", "")
        }
    }

    pub fn timeout() -> Self {
        Self {
            outcome: ScriptOutcome::Timeout,
            ..Self::ok(0, "", "")
        }
    }

    pub fn timing_out_on_dom_content_loaded(mut self) -> Self {
        self.dom_content_timeout = true;
        self
    }

    pub fn failing_idle_wait(mut self) -> Self {
        self.idle_fails = true;
        self
    }

    pub fn delayed(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

#[derive(Debug, Default)]
struct PageLog {
    visited: Vec<String>,
    waits: Vec<WaitCondition>,
    idle_waits: usize,
    closed: usize,
}

/// Scripted page. Clones share one log, so a test can keep a handle after
/// moving the page into an orchestrator.
#[derive(Debug, Clone)]
pub struct MockPage {
    scripts: HashMap<String, PageScript>,
    log: Arc<Mutex<PageLog>>,
    current: Option<PageScript>,
}

impl MockPage {
    pub fn new() -> Self {
        Self {
            scripts: HashMap::new(),
            log: Arc::new(Mutex::new(PageLog::default())),
            current: None,
        }
    }

    pub fn on(mut self, url: &str, script: PageScript) -> Self {
        self.scripts.insert(url.to_string(), script);
        self
    }

    pub fn visited(&self) -> Vec<String> {
        self.log.lock().unwrap().visited.clone()
    }

    pub fn waits(&self) -> Vec<WaitCondition> {
        self.log.lock().unwrap().waits.clone()
    }

    pub fn idle_waits(&self) -> usize {
        self.log.lock().unwrap().idle_waits
    }

    pub fn closed(&self) -> usize {
        self.log.lock().unwrap().closed
    }
}

impl Default for MockPage {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BrowserPage for MockPage {
    async fn goto(
        &mut self,
        url: &str,
        wait: WaitCondition,
        _timeout: Duration,
    ) -> Result<Option<u16>, DriverError> {
        {
            let mut log = self.log.lock().unwrap();
            log.visited.push(url.to_string());
            log.waits.push(wait);
        }

        let Some(script) = self.scripts.get(url).cloned() else {
            return Err(DriverError::Navigation(format!("no script for {url}")));
        };
        if !script.delay.is_zero() {
            tokio::time::sleep(script.delay).await;
        }

        match script.outcome {
            ScriptOutcome::Fail => Err(DriverError::Navigation("net::ERR_CONNECTION_RESET".into())),
            ScriptOutcome::Timeout => Err(DriverError::Timeout(url.to_string())),
            ScriptOutcome::Ok if script.dom_content_timeout && wait == WaitCondition::DomContentLoaded => {
                Err(DriverError::Timeout(url.to_string()))
            }
            ScriptOutcome::Ok => {
                let status = script.status;
                self.current = Some(script);
                Ok(status)
            }
        }
    }

    async fn wait_for_network_idle(&mut self, _timeout: Duration) -> Result<(), DriverError> {
        self.log.lock().unwrap().idle_waits += 1;
        match self.current {
            Some(ref s) if s.idle_fails => Err(DriverError::Timeout("network idle".into())),
            _ => Ok(()),
        }
    }

    fn url(&self) -> String {
        self.current
            .as_ref()
            .map(|s| s.final_url.clone())
            .unwrap_or_default()
    }

    async fn content(&mut self) -> Result<String, DriverError> {
        Ok(self
            .current
            .as_ref()
            .map(|s| s.html.clone())
            .unwrap_or_default())
    }

    async fn close(&mut self) -> Result<(), DriverError> {
        self.log.lock().unwrap().closed += 1;
        self.current = None;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// MockLauncher
// ---------------------------------------------------------------------------

pub struct MockLauncher {
    page: MockPage,
    launched: Mutex<Vec<(BrowserEngine, String)>>,
    fail_launch: bool,
    unavailable: Vec<BrowserEngine>,
}

impl MockLauncher {
    pub fn new() -> Self {
        Self {
            page: MockPage::new(),
            launched: Mutex::new(Vec::new()),
            fail_launch: false,
            unavailable: Vec::new(),
        }
    }

    pub fn on(mut self, url: &str, script: PageScript) -> Self {
        self.page = self.page.on(url, script);
        self
    }

    pub fn failing_launch(mut self) -> Self {
        self.fail_launch = true;
        self
    }

    /// Launches of `engine` fail; other engines still launch.
    pub fn without_engine(mut self, engine: BrowserEngine) -> Self {
        self.unavailable.push(engine);
        self
    }

    pub fn launched(&self) -> Vec<(BrowserEngine, String)> {
        self.launched.lock().unwrap().clone()
    }

    /// Total closes across every page this launcher handed out.
    pub fn closed(&self) -> usize {
        self.page.closed()
    }
}

impl Default for MockLauncher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BrowserLauncher for MockLauncher {
    async fn launch(
        &self,
        engine: BrowserEngine,
        user_agent: &str,
    ) -> Result<Box<dyn BrowserPage>, DriverError> {
        if self.fail_launch || self.unavailable.contains(&engine) {
            return Err(DriverError::Launch(format!("{engine} not installed")));
        }
        self.launched
            .lock()
            .unwrap()
            .push((engine, user_agent.to_string()));
        Ok(Box::new(self.page.clone()))
    }
}

// ---------------------------------------------------------------------------
// FixedSecondary
// ---------------------------------------------------------------------------

pub struct FixedSecondary {
    result: Option<PageObservation>,
    calls: Mutex<Vec<String>>,
}

impl FixedSecondary {
    pub fn returning(result: Option<PageObservation>) -> Self {
        Self {
            result,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl SecondaryProbe for FixedSecondary {
    async fn observe(&self, url: &str) -> Option<PageObservation> {
        self.calls.lock().unwrap().push(url.to_string());
        self.result.clone()
    }
}

// Headless browser capability: the only surface the engine needs from a driver.

mod browserless;
mod chrome;

pub use browserless::{BrowserlessLauncher, BrowserlessPage};
pub use chrome::{ChromeLauncher, ChromePage};

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;

/// Lifecycle event that ends a navigation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitCondition {
    /// HTML parsed; subresources may still be loading.
    DomContentLoaded,
    /// No network activity for a short window.
    NetworkIdle,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BrowserEngine {
    Chromium,
    Webkit,
}

impl BrowserEngine {
    pub fn as_str(&self) -> &'static str {
        match self {
            BrowserEngine::Chromium => "chromium",
            BrowserEngine::Webkit => "webkit",
        }
    }
}

impl fmt::Display for BrowserEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum DriverError {
    #[error("Navigation timed out: {0}")]
    Timeout(String),

    #[error("Navigation failed: {0}")]
    Navigation(String),

    #[error("Browser launch failed: {0}")]
    Launch(String),
}

/// One browser tab. Implementations must honour every timeout they are given.
#[async_trait]
pub trait BrowserPage: Send {
    /// Navigate and return the main document's HTTP status when known.
    async fn goto(
        &mut self,
        url: &str,
        wait: WaitCondition,
        timeout: Duration,
    ) -> Result<Option<u16>, DriverError>;

    async fn wait_for_network_idle(&mut self, timeout: Duration) -> Result<(), DriverError>;

    /// URL after redirects of the last navigation.
    fn url(&self) -> String;

    /// Serialized DOM of the current page.
    async fn content(&mut self) -> Result<String, DriverError>;

    /// Release the tab and anything launched for it.
    async fn close(&mut self) -> Result<(), DriverError>;
}

/// Opens independent pages on a chosen engine with a chosen identity.
#[async_trait]
pub trait BrowserLauncher: Send + Sync {
    async fn launch(
        &self,
        engine: BrowserEngine,
        user_agent: &str,
    ) -> Result<Box<dyn BrowserPage>, DriverError>;
}

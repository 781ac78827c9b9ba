// Navigation Probe: drive one page to a URL under bounded waits and snapshot it.

use std::time::Duration;

use tracing::{debug, warn};

use crate::driver::{BrowserPage, DriverError, WaitCondition};
use crate::observation::PageObservation;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProbeTimings {
    pub navigation_timeout: Duration,
    pub network_idle_timeout: Duration,
    pub settle: Duration,
}

impl Default for ProbeTimings {
    fn default() -> Self {
        Self {
            navigation_timeout: Duration::from_millis(15_000),
            network_idle_timeout: Duration::from_millis(7_000),
            settle: Duration::from_millis(2_000),
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NavigationProbe {
    timings: ProbeTimings,
}

impl NavigationProbe {
    pub fn new(timings: ProbeTimings) -> Self {
        Self { timings }
    }

    pub fn timings(&self) -> ProbeTimings {
        self.timings
    }

    /// Navigate and snapshot. `None` means navigation itself failed.
    ///
    /// Tries "content parsed" first and retries once with "network quiesced"
    /// if that timed out. With `settle`, also waits (best-effort) for network
    /// quiescence and then the fixed settle interval so late banners render.
    pub async fn observe(
        &self,
        page: &mut dyn BrowserPage,
        url: &str,
        settle: bool,
    ) -> Option<PageObservation> {
        let status = match self.navigate(page, url).await {
            Ok(status) => status,
            Err(e) => {
                warn!(url, error = %e, "Navigation failed");
                return None;
            }
        };

        if settle {
            if let Err(e) = page
                .wait_for_network_idle(self.timings.network_idle_timeout)
                .await
            {
                debug!(url, error = %e, "Network never went idle, continuing");
            }
            if !self.timings.settle.is_zero() {
                tokio::time::sleep(self.timings.settle).await;
            }
        }

        let html = match page.content().await {
            Ok(html) => html,
            Err(e) => {
                debug!(url, error = %e, "Could not read page content");
                String::new()
            }
        };

        Some(PageObservation::new(&page.url(), status, html))
    }

    async fn navigate(
        &self,
        page: &mut dyn BrowserPage,
        url: &str,
    ) -> Result<Option<u16>, DriverError> {
        match page
            .goto(url, WaitCondition::DomContentLoaded, self.timings.navigation_timeout)
            .await
        {
            Err(DriverError::Timeout(msg)) => {
                debug!(url, reason = msg.as_str(), "Primary wait timed out, retrying with network idle");
                page.goto(url, WaitCondition::NetworkIdle, self.timings.navigation_timeout)
                    .await
            }
            other => other,
        }
    }
}

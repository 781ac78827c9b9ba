// Classification Orchestrator: URL → platform → navigation → classifier, with a
// post-hoc per-item budget. Owns the worker's long-lived primary page.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use tracing::{info, warn};

use crate::classifier::Classifier;
use crate::driver::BrowserPage;
use crate::platform::identify_platform;
use crate::probe::NavigationProbe;
use crate::types::ClassificationResult;

/// Anything that can turn a URL into a result. The scheduler depends on this
/// rather than on a browser so it can be exercised without one.
#[async_trait]
pub trait LinkClassifier: Send {
    async fn classify(&mut self, url: &str) -> ClassificationResult;
}

pub struct Orchestrator {
    page: Box<dyn BrowserPage>,
    probe: NavigationProbe,
    classifier: Classifier,
    item_budget: Duration,
}

impl Orchestrator {
    pub fn new(
        page: Box<dyn BrowserPage>,
        probe: NavigationProbe,
        classifier: Classifier,
        item_budget: Duration,
    ) -> Self {
        Self {
            page,
            probe,
            classifier,
            item_budget,
        }
    }

    /// Close the primary page. Call once the worker is done.
    pub async fn shutdown(mut self) {
        if let Err(e) = self.page.close().await {
            warn!(error = %e, "Failed to close primary page");
        }
    }
}

#[async_trait]
impl LinkClassifier for Orchestrator {
    async fn classify(&mut self, url: &str) -> ClassificationResult {
        let url = url.trim();
        let started = Instant::now();

        let platform = identify_platform(url);
        let settle = self.classifier.profile(platform).settle;

        let observation = self.probe.observe(self.page.as_mut(), url, settle).await;
        let result = self
            .classifier
            .classify(platform, url, observation.as_ref())
            .await;

        let elapsed = started.elapsed();
        if elapsed > self.item_budget {
            warn!(
                url,
                %platform,
                elapsed_ms = elapsed.as_millis() as u64,
                discarded = %result.verdict,
                "Item budget exceeded, forcing unknown"
            );
            return ClassificationResult::unknown(format!(
                "budget exceeded after {}ms",
                elapsed.as_millis()
            ));
        }

        info!(
            url,
            %platform,
            verdict = %result.verdict,
            detail = result.detail.as_str(),
            elapsed_ms = elapsed.as_millis() as u64,
            "Classified"
        );
        result
    }
}

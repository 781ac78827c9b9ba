// Secondary Engine Probe: re-observe a URL in a fresh page on an independent
// engine and identity. Used when a login interstitial may be hiding (or
// imitating) a removal banner.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{info, warn};
use url::Url;

use crate::driver::{BrowserEngine, BrowserLauncher, BrowserPage};
use crate::observation::PageObservation;
use crate::probe::NavigationProbe;

const CHROME_WINDOWS_UA: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36";
const CHROME_MAC_UA: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) \
AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36";
const SAFARI_MAC_UA: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) \
AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.4 Safari/605.1.15";

/// User agents for the primary page and each secondary engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identities {
    pub primary: String,
    pub chromium: String,
    pub webkit: String,
}

impl Default for Identities {
    fn default() -> Self {
        Self {
            primary: CHROME_WINDOWS_UA.to_string(),
            chromium: CHROME_MAC_UA.to_string(),
            webkit: SAFARI_MAC_UA.to_string(),
        }
    }
}

impl Identities {
    pub fn for_engine(&self, engine: BrowserEngine) -> &str {
        match engine {
            BrowserEngine::Chromium => &self.chromium,
            BrowserEngine::Webkit => &self.webkit,
        }
    }
}

#[async_trait]
pub trait SecondaryProbe: Send + Sync {
    /// `None` when the engine could not be launched or navigation failed.
    async fn observe(&self, url: &str) -> Option<PageObservation>;
}

/// Launches a dedicated page per call and always closes it before returning.
pub struct EngineFallbackProbe {
    launcher: Arc<dyn BrowserLauncher>,
    probe: NavigationProbe,
    identities: Identities,
}

impl EngineFallbackProbe {
    pub fn new(launcher: Arc<dyn BrowserLauncher>, probe: NavigationProbe, identities: Identities) -> Self {
        Self {
            launcher,
            probe,
            identities,
        }
    }
}

/// Watch pages go to Chromium, everything else to WebKit.
pub fn engine_for(url: &str) -> BrowserEngine {
    let is_watch = Url::parse(url)
        .map(|u| u.path().to_lowercase().starts_with("/watch"))
        .unwrap_or(false);
    if is_watch {
        BrowserEngine::Chromium
    } else {
        BrowserEngine::Webkit
    }
}

impl EngineFallbackProbe {
    /// The engine chosen for `url`, or Chromium with its own identity when that
    /// engine cannot be launched here.
    async fn launch_for(&self, url: &str) -> Option<(BrowserEngine, Box<dyn BrowserPage>)> {
        let engine = engine_for(url);
        let err = match self
            .launcher
            .launch(engine, self.identities.for_engine(engine))
            .await
        {
            Ok(page) => return Some((engine, page)),
            Err(e) => e,
        };
        if engine == BrowserEngine::Chromium {
            warn!(url, %engine, error = %err, "Secondary engine unavailable");
            return None;
        }

        warn!(url, %engine, error = %err, "Secondary engine unavailable, falling back to chromium");
        let fallback = BrowserEngine::Chromium;
        match self
            .launcher
            .launch(fallback, self.identities.for_engine(fallback))
            .await
        {
            Ok(page) => Some((fallback, page)),
            Err(e) => {
                warn!(url, engine = %fallback, error = %e, "Fallback engine unavailable");
                None
            }
        }
    }
}

#[async_trait]
impl SecondaryProbe for EngineFallbackProbe {
    async fn observe(&self, url: &str) -> Option<PageObservation> {
        let (engine, mut page) = self.launch_for(url).await?;
        info!(url, %engine, "Secondary engine probe");

        let observation = self.probe.observe(page.as_mut(), url, true).await;

        if let Err(e) = page.close().await {
            warn!(url, %engine, error = %e, "Failed to close secondary page");
        }
        observation
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::probe::ProbeTimings;
    use crate::testing::{MockLauncher, PageScript};

    fn probe_with(launcher: Arc<MockLauncher>) -> EngineFallbackProbe {
        EngineFallbackProbe::new(
            launcher,
            NavigationProbe::new(ProbeTimings {
                settle: std::time::Duration::ZERO,
                ..ProbeTimings::default()
            }),
            Identities::default(),
        )
    }

    #[test]
    fn engine_chosen_by_path() {
        assert_eq!(engine_for("https://www.facebook.com/watch/?v=1"), BrowserEngine::Chromium);
        assert_eq!(engine_for("https://www.facebook.com/watch"), BrowserEngine::Chromium);
        assert_eq!(engine_for("https://www.facebook.com/reel/1"), BrowserEngine::Webkit);
        assert_eq!(engine_for("https://fb.watch/abc"), BrowserEngine::Webkit);
        assert_eq!(engine_for("garbage"), BrowserEngine::Webkit);
    }

    #[tokio::test]
    async fn page_closed_after_observation() {
        let url = "https://www.facebook.com/reel/1";
        let launcher = Arc::new(MockLauncher::new().on(url, PageScript::ok(200, url, "<p>hi</p>")));
        let obs = probe_with(launcher.clone()).observe(url).await;

        assert!(obs.is_some());
        assert_eq!(launcher.launched(), vec![(BrowserEngine::Webkit, SAFARI_MAC_UA.to_string())]);
        assert_eq!(launcher.closed(), 1);
    }

    #[tokio::test]
    async fn page_closed_after_failed_navigation() {
        let url = "https://www.facebook.com/watch/?v=1";
        let launcher = Arc::new(MockLauncher::new().on(url, PageScript::fail()));
        let obs = probe_with(launcher.clone()).observe(url).await;

        assert!(obs.is_none());
        assert_eq!(launcher.launched()[0].0, BrowserEngine::Chromium);
        assert_eq!(launcher.closed(), 1);
    }

    #[tokio::test]
    async fn webkit_unavailable_falls_back_to_chromium() {
        let url = "https://www.facebook.com/reel/1";
        let launcher = Arc::new(
            MockLauncher::new()
                .without_engine(BrowserEngine::Webkit)
                .on(url, PageScript::ok(200, url, "<p>hi</p>")),
        );
        let obs = probe_with(launcher.clone()).observe(url).await;

        assert_eq!(obs.unwrap().http_status, Some(200));
        assert_eq!(
            launcher.launched(),
            vec![(BrowserEngine::Chromium, CHROME_MAC_UA.to_string())]
        );
        assert_eq!(launcher.closed(), 1);
    }

    #[tokio::test]
    async fn launch_failure_yields_none() {
        let launcher = Arc::new(MockLauncher::new().failing_launch());
        let obs = probe_with(launcher.clone()).observe("https://www.facebook.com/x").await;
        assert!(obs.is_none());
        assert_eq!(launcher.closed(), 0);
    }
}

// Browserless-backed pages. The service renders statelessly: every `goto` is a
// single render request that returns once its wait condition is met, so the
// page only remembers the last render.

use std::time::Duration;

use async_trait::async_trait;
use browserless_client::{BrowserlessClient, BrowserlessError, Engine, RenderOptions, WaitUntil};
use tracing::{debug, info};

use super::{BrowserEngine, BrowserLauncher, BrowserPage, DriverError, WaitCondition};

pub struct BrowserlessLauncher {
    base_url: String,
    token: Option<String>,
}

impl BrowserlessLauncher {
    pub fn new(base_url: &str, token: Option<&str>) -> Self {
        info!(base_url, "BrowserlessLauncher initialized");
        Self {
            base_url: base_url.to_string(),
            token: token.map(String::from),
        }
    }
}

#[async_trait]
impl BrowserLauncher for BrowserlessLauncher {
    async fn launch(
        &self,
        engine: BrowserEngine,
        user_agent: &str,
    ) -> Result<Box<dyn BrowserPage>, DriverError> {
        let client = BrowserlessClient::new(&self.base_url, self.token.as_deref())
            .with_engine(engine_route(engine));
        Ok(Box::new(BrowserlessPage::new(client, user_agent)))
    }
}

pub struct BrowserlessPage {
    client: BrowserlessClient,
    user_agent: String,
    current_url: String,
    html: String,
}

impl BrowserlessPage {
    pub fn new(client: BrowserlessClient, user_agent: &str) -> Self {
        Self {
            client,
            user_agent: user_agent.to_string(),
            current_url: String::new(),
            html: String::new(),
        }
    }
}

#[async_trait]
impl BrowserPage for BrowserlessPage {
    async fn goto(
        &mut self,
        url: &str,
        wait: WaitCondition,
        timeout: Duration,
    ) -> Result<Option<u16>, DriverError> {
        let options = RenderOptions {
            wait_until: match wait {
                WaitCondition::DomContentLoaded => WaitUntil::DomContentLoaded,
                WaitCondition::NetworkIdle => WaitUntil::NetworkIdle,
            },
            timeout,
            user_agent: Some(self.user_agent.clone()),
            best_attempt: false,
        };

        let rendered = self.client.render(url, &options).await.map_err(|e| match e {
            BrowserlessError::Timeout(msg) => DriverError::Timeout(msg),
            other => DriverError::Navigation(other.to_string()),
        })?;

        self.current_url = rendered.final_url.unwrap_or_else(|| url.to_string());
        self.html = rendered.html;
        Ok(rendered.status)
    }

    async fn wait_for_network_idle(&mut self, _timeout: Duration) -> Result<(), DriverError> {
        // The render already completed server-side.
        Ok(())
    }

    fn url(&self) -> String {
        self.current_url.clone()
    }

    async fn content(&mut self) -> Result<String, DriverError> {
        Ok(self.html.clone())
    }

    async fn close(&mut self) -> Result<(), DriverError> {
        debug!(engine = self.client.engine().as_str(), "Closing browserless page");
        self.html.clear();
        self.current_url.clear();
        Ok(())
    }
}

fn engine_route(engine: BrowserEngine) -> Engine {
    match engine {
        BrowserEngine::Chromium => Engine::Chromium,
        BrowserEngine::Webkit => Engine::Webkit,
    }
}

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use linkwatch_engine::driver::{BrowserlessLauncher, ChromeLauncher};
use linkwatch_engine::{
    BrowserEngine, BrowserLauncher, Classifier, EngineFallbackProbe, NavigationProbe, Orchestrator,
    Profiles,
};
use linkwatch_worker::config::Overrides;
use linkwatch_worker::{Config, PageBackend, Scheduler, SheetsRowStore};
use sheets_client::SheetsClient;

/// Re-check tracked post links and write their availability back to the sheet.
#[derive(Parser, Debug)]
#[command(name = "linkwatch")]
struct Cli {
    /// Sheet preset: primary, fb_rm or ig_rm
    #[arg(long)]
    sheet: Option<String>,

    #[arg(long)]
    shard_index: Option<u32>,

    #[arg(long)]
    total_shards: Option<u32>,

    /// Skip rows checked within this many days (0 disables)
    #[arg(long)]
    skip_recent_days: Option<u32>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("linkwatch=info".parse()?))
        .init();

    let cli = Cli::parse();
    let overrides = Overrides {
        sheet: cli.sheet,
        shard_index: cli.shard_index,
        total_shards: cli.total_shards,
        skip_recent_days: cli.skip_recent_days,
    };

    let config = Config::from_env(&overrides)?;
    config.log_redacted();

    let launcher: Arc<dyn BrowserLauncher> = match &config.backend {
        PageBackend::Browserless { base_url, token } => {
            Arc::new(BrowserlessLauncher::new(base_url, token.as_deref()))
        }
        PageBackend::Chrome { chrome_bin } => Arc::new(ChromeLauncher::new(chrome_bin)),
    };

    let page = launcher
        .launch(BrowserEngine::Chromium, &config.identities.primary)
        .await
        .context("Failed to launch primary browser")?;

    let probe = NavigationProbe::new(config.timings);
    let mut classifier = Classifier::new(Profiles::standard()?, config.login_wall);
    if config.secondary_probe {
        classifier = classifier.with_secondary_probe(Arc::new(EngineFallbackProbe::new(
            launcher.clone(),
            probe,
            config.identities.clone(),
        )));
    }
    let orchestrator = Orchestrator::new(page, probe, classifier, config.item_budget);

    let store = SheetsRowStore::new(
        SheetsClient::new(config.google_access_token.clone()),
        &config.layout,
    );

    let mut scheduler = Scheduler::new(store, orchestrator, config.layout.clone(), config.shard)
        .with_skip_policy(config.skip)
        .with_flush_every(config.flush_every)
        .with_pacing(config.pacing);

    let today = chrono::Local::now().date_naive();
    let outcome = scheduler.run(today).await;
    scheduler.into_classifier().shutdown().await;

    let stats = outcome?;
    info!("Linkwatch finished: {stats}");
    Ok(())
}

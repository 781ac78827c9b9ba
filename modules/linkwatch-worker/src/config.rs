use std::str::FromStr;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use linkwatch_engine::{Identities, LoginWallPolicy, ProbeTimings};

use crate::layout::SheetLayout;
use crate::scheduler::{Pacing, Shard, SkipPolicy};

/// Where pages get rendered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageBackend {
    Browserless { base_url: String, token: Option<String> },
    Chrome { chrome_bin: String },
}

/// Worker configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    // Row store
    pub google_access_token: String,
    pub layout: SheetLayout,

    // Sharding and pacing
    pub shard: Shard,
    pub skip: SkipPolicy,
    pub pacing: Pacing,
    pub flush_every: usize,

    // Browser
    pub backend: PageBackend,
    pub timings: ProbeTimings,
    pub item_budget: Duration,
    pub identities: Identities,
    pub secondary_probe: bool,

    // Verdicts
    pub login_wall: LoginWallPolicy,
}

/// Command-line values that take precedence over the environment.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub sheet: Option<String>,
    pub shard_index: Option<u32>,
    pub total_shards: Option<u32>,
    pub skip_recent_days: Option<u32>,
}

impl Config {
    pub fn from_env(overrides: &Overrides) -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok(), overrides)
    }

    /// Build from any key → value source. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F, overrides: &Overrides) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let google_access_token = get("GOOGLE_ACCESS_TOKEN")
            .ok_or_else(|| anyhow!("GOOGLE_ACCESS_TOKEN environment variable is required"))?;

        let sheet = overrides
            .sheet
            .clone()
            .or_else(|| get("SHEET_TO_RUN"))
            .unwrap_or_else(|| "primary".to_string());
        let mut layout = SheetLayout::preset(&sheet);
        if let Some(id) = get("SPREADSHEET_ID") {
            layout = layout.with_spreadsheet_id(&id);
        }

        let shard_index = match overrides.shard_index {
            Some(v) => v,
            None => parse_or(&get, "SHARD_INDEX", 0)?,
        };
        let total_shards = match overrides.total_shards {
            Some(v) => v,
            None => parse_or(&get, "TOTAL_SHARDS", 1)?,
        };
        let shard = Shard::new(shard_index, total_shards)?;

        let recent_days = match overrides.skip_recent_days {
            Some(v) => v,
            None => parse_or(&get, "SKIP_RECENT_DAYS", 0)?,
        };

        let pacing = Pacing::new(
            secs_or(&get, "DELAY_MIN_SECS", 4.0)?,
            secs_or(&get, "DELAY_MAX_SECS", 7.0)?,
        );

        let backend = match get("BROWSERLESS_URL") {
            Some(base_url) => PageBackend::Browserless {
                base_url,
                token: get("BROWSERLESS_TOKEN"),
            },
            None => PageBackend::Chrome {
                chrome_bin: get("CHROME_BIN").unwrap_or_else(|| "chromium".to_string()),
            },
        };

        let defaults = ProbeTimings::default();
        let timings = ProbeTimings {
            navigation_timeout: millis_or(&get, "NAV_TIMEOUT_MS", defaults.navigation_timeout)?,
            network_idle_timeout: millis_or(&get, "NETWORK_IDLE_MS", defaults.network_idle_timeout)?,
            settle: millis_or(&get, "SETTLE_MS", defaults.settle)?,
        };

        let mut identities = Identities::default();
        if let Some(ua) = get("PRIMARY_USER_AGENT") {
            identities.primary = ua;
        }

        let login_wall = match get("LOGIN_WALL_VERDICT").as_deref().map(str::trim) {
            None | Some("active") => LoginWallPolicy::FoldIntoActive,
            Some("login_required") => LoginWallPolicy::Distinct,
            Some(other) => {
                return Err(anyhow!(
                    "LOGIN_WALL_VERDICT must be 'active' or 'login_required', got '{other}'"
                ))
            }
        };

        Ok(Self {
            google_access_token,
            layout,
            shard,
            skip: SkipPolicy::new(recent_days),
            pacing,
            flush_every: parse_or(&get, "FLUSH_EVERY", 250usize)?.max(1),
            backend,
            timings,
            item_budget: Duration::from_secs(parse_or(&get, "ITEM_BUDGET_SECS", 90)?),
            identities,
            secondary_probe: parse_or(&get, "SECONDARY_PROBE", true)?,
            login_wall,
        })
    }

    pub fn log_redacted(&self) {
        fn preview(val: &str) -> String {
            let n = val.len().min(5);
            format!("{}...({} chars)", &val[..n], val.len())
        }
        fn preview_opt(val: &Option<String>) -> String {
            match val {
                Some(v) if !v.is_empty() => preview(v),
                _ => "<not set>".to_string(),
            }
        }

        tracing::info!("Config loaded:");
        tracing::info!("  GOOGLE_ACCESS_TOKEN: {}", preview(&self.google_access_token));
        tracing::info!(
            "  SHEET: {} ({} / '{}')",
            self.layout.key,
            self.layout.spreadsheet_id,
            self.layout.tab
        );
        tracing::info!("  SHARD: {}/{}", self.shard.index(), self.shard.total());
        match &self.backend {
            PageBackend::Browserless { base_url, token } => {
                tracing::info!("  BROWSERLESS_URL: {base_url}");
                tracing::info!("  BROWSERLESS_TOKEN: {}", preview_opt(token));
            }
            PageBackend::Chrome { chrome_bin } => {
                tracing::info!("  CHROME_BIN: {chrome_bin}");
            }
        }
        tracing::info!("  SKIP_RECENT_DAYS: {}", self.skip.recent_days);
        tracing::info!("  LOGIN_WALL_VERDICT: {:?}", self.login_wall);
    }
}

fn parse_or<G, T>(get: &G, key: &str, default: T) -> Result<T>
where
    G: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match get(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("{key} has an invalid value '{raw}'")),
        None => Ok(default),
    }
}

fn millis_or<G>(get: &G, key: &str, default: Duration) -> Result<Duration>
where
    G: Fn(&str) -> Option<String>,
{
    let ms: u64 = parse_or(get, key, default.as_millis() as u64)?;
    Ok(Duration::from_millis(ms))
}

/// Fractional seconds. Negative, infinite and out-of-range values are rejected.
fn secs_or<G>(get: &G, key: &str, default: f64) -> Result<Duration>
where
    G: Fn(&str) -> Option<String>,
{
    let secs: f64 = parse_or(get, key, default)?;
    Duration::try_from_secs_f64(secs).with_context(|| format!("{key} is out of range: {secs}"))
}

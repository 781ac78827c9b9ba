use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Content platform a link points at, decided from its host alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Instagram,
    Youtube,
    Tiktok,
    Facebook,
    Threads,
    Generic,
}

impl Platform {
    pub const ALL: [Platform; 6] = [
        Platform::Instagram,
        Platform::Youtube,
        Platform::Tiktok,
        Platform::Facebook,
        Platform::Threads,
        Platform::Generic,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Instagram => "instagram",
            Platform::Youtube => "youtube",
            Platform::Tiktok => "tiktok",
            Platform::Facebook => "facebook",
            Platform::Threads => "threads",
            Platform::Generic => "generic",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Liveness verdict for one link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    Active,
    Removed,
    Unknown,
    /// Only produced under [`LoginWallPolicy::Distinct`].
    LoginRequired,
}

impl Verdict {
    /// Label written back to the row store.
    pub fn label(&self) -> &'static str {
        match self {
            Verdict::Active => "Active",
            Verdict::Removed => "Removed",
            Verdict::Unknown => "Unknown",
            Verdict::LoginRequired => "Login Required",
        }
    }

    /// Parse a stored label, case- and whitespace-insensitively.
    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim().to_lowercase().as_str() {
            "active" => Some(Verdict::Active),
            "removed" => Some(Verdict::Removed),
            "unknown" => Some(Verdict::Unknown),
            "login required" | "login_required" => Some(Verdict::LoginRequired),
            _ => None,
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// How a login wall with no removal signal is reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoginWallPolicy {
    /// A login redirect implies the post exists behind authentication.
    #[default]
    FoldIntoActive,
    Distinct,
}

impl LoginWallPolicy {
    pub fn verdict(&self) -> Verdict {
        match self {
            LoginWallPolicy::FoldIntoActive => Verdict::Active,
            LoginWallPolicy::Distinct => Verdict::LoginRequired,
        }
    }
}

/// One tracked link as the row store sees it.
#[derive(Debug, Clone, PartialEq)]
pub struct LinkRecord {
    pub url: String,
    pub platform: Platform,
    pub last_status: Option<Verdict>,
    pub last_checked_at: Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassificationResult {
    pub verdict: Verdict,
    pub checked_at: DateTime<Utc>,
    /// Short audit string (status code, matched phrase, timeout). Not for control flow.
    pub detail: String,
}

impl ClassificationResult {
    pub fn new(verdict: Verdict, detail: impl Into<String>) -> Self {
        Self {
            verdict,
            checked_at: Utc::now(),
            detail: detail.into(),
        }
    }

    pub fn unknown(detail: impl Into<String>) -> Self {
        Self::new(Verdict::Unknown, detail)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_round_trip_through_store_format() {
        for v in [
            Verdict::Active,
            Verdict::Removed,
            Verdict::Unknown,
            Verdict::LoginRequired,
        ] {
            assert_eq!(Verdict::from_label(v.label()), Some(v));
        }
        assert_eq!(Verdict::from_label("  REMOVED "), Some(Verdict::Removed));
        assert_eq!(Verdict::from_label(""), None);
    }

    #[test]
    fn login_policy_defaults_to_active() {
        assert_eq!(LoginWallPolicy::default().verdict(), Verdict::Active);
        assert_eq!(LoginWallPolicy::Distinct.verdict(), Verdict::LoginRequired);
    }
}

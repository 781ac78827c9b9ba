// Per-platform configuration: phrase sets, whether to wait for the page to
// settle, and the ordered rule list that turns signals into a verdict.

use std::collections::HashMap;

use crate::error::Result;
use crate::rules::{Outcome, Rule, RuleSet};
use crate::signals::Signal;
use crate::types::{Platform, Verdict};

use crate::rules::Condition::{Is, Not};

const INSTAGRAM_REMOVAL: &[&str] = &[
    "sorry, this page isn't available",
    "the link you followed may be broken",
    "page not found",
];
const YOUTUBE_REMOVAL: &[&str] = &["video unavailable", "this video isn't available anymore"];
const TIKTOK_REMOVAL: &[&str] = &["video currently unavailable"];
const FACEBOOK_REMOVAL: &[&str] = &[
    "this content isn't available right now",
    "this video isn't available anymore",
];
const THREADS_REMOVAL: &[&str] = &["post unavailable"];

const LOGIN_CUES: &[&str] = &[
    "log in",
    "sign up",
    "/accounts/login",
    "login.facebook",
    "log in to facebook",
];
const LOGIN_PATH_FRAGMENTS: &[&str] = &["/login", "/accounts/login"];

#[derive(Debug, Clone)]
pub struct PlatformProfile {
    pub platform: Platform,
    pub removal_phrases: Vec<String>,
    pub login_cues: Vec<String>,
    pub login_path_fragments: Vec<String>,
    /// Wait for network quiescence and the settle interval before reading the page.
    pub settle: bool,
    pub rules: RuleSet,
}

impl PlatformProfile {
    fn new(platform: Platform, removal: &[&str], settle: bool, rules: Vec<Rule>) -> Result<Self> {
        Ok(Self {
            platform,
            removal_phrases: to_strings(removal),
            login_cues: to_strings(LOGIN_CUES),
            login_path_fragments: to_strings(LOGIN_PATH_FRAGMENTS),
            settle,
            rules: RuleSet::new(rules)?,
        })
    }

    pub fn instagram() -> Result<Self> {
        Self::new(
            Platform::Instagram,
            INSTAGRAM_REMOVAL,
            true,
            vec![
                removal_phrase_rule("removal phrase"),
                Rule::new("login wall", vec![Is(Signal::LoginWall)], Outcome::LoginWall),
                Rule::new(
                    "post markup present",
                    vec![Is(Signal::ActiveContent)],
                    Outcome::Verdict(Verdict::Active),
                ),
            ],
        )
    }

    pub fn youtube() -> Result<Self> {
        Self::new(
            Platform::Youtube,
            YOUTUBE_REMOVAL,
            false,
            vec![removal_phrase_rule("removal phrase"), success_rule()],
        )
    }

    pub fn tiktok() -> Result<Self> {
        Self::new(
            Platform::Tiktok,
            TIKTOK_REMOVAL,
            false,
            vec![removal_phrase_rule("removal phrase"), success_rule()],
        )
    }

    pub fn threads() -> Result<Self> {
        Self::new(
            Platform::Threads,
            THREADS_REMOVAL,
            true,
            vec![
                Rule::new(
                    "invalid_post redirect",
                    vec![Is(Signal::InvalidPostParam)],
                    Outcome::Verdict(Verdict::Removed),
                ),
                removal_phrase_rule("unavailable badge"),
                success_rule(),
            ],
        )
    }

    pub fn facebook() -> Result<Self> {
        Self::new(
            Platform::Facebook,
            FACEBOOK_REMOVAL,
            true,
            vec![
                Rule::new(
                    "removal banner without media",
                    vec![Is(Signal::RemovalPhrase), Not(Signal::VideoIndicator)],
                    Outcome::Verdict(Verdict::Removed),
                ),
                Rule::new(
                    "url lost its media id",
                    vec![Is(Signal::MissingMediaId)],
                    Outcome::Verdict(Verdict::Removed),
                ),
                Rule::new(
                    "canonical lost its media id",
                    vec![Is(Signal::CanonicalNoMedia), Not(Signal::VideoIndicator)],
                    Outcome::Verdict(Verdict::Removed),
                ),
                Rule::new(
                    "login wall",
                    vec![Is(Signal::LoginWall)],
                    Outcome::SecondaryProbe,
                ),
                Rule::new(
                    "video metadata present",
                    vec![Is(Signal::VideoIndicator)],
                    Outcome::Verdict(Verdict::Active),
                ),
                Rule::new(
                    "media id in url",
                    vec![Is(Signal::MediaMarkerInUrl)],
                    Outcome::Verdict(Verdict::Active),
                ),
                Rule::new(
                    "login wall without media",
                    vec![Is(Signal::LoginWall)],
                    Outcome::DistinctLoginWall,
                ),
                success_rule(),
            ],
        )
    }

    pub fn generic() -> Result<Self> {
        Self::new(Platform::Generic, &[], false, vec![success_rule()])
    }
}

/// One profile per platform.
#[derive(Debug, Clone)]
pub struct Profiles {
    by_platform: HashMap<Platform, PlatformProfile>,
    generic: PlatformProfile,
}

impl Profiles {
    pub fn standard() -> Result<Self> {
        let mut by_platform = HashMap::new();
        for profile in [
            PlatformProfile::instagram()?,
            PlatformProfile::youtube()?,
            PlatformProfile::tiktok()?,
            PlatformProfile::facebook()?,
            PlatformProfile::threads()?,
        ] {
            by_platform.insert(profile.platform, profile);
        }
        Ok(Self {
            by_platform,
            generic: PlatformProfile::generic()?,
        })
    }

    /// Replace a platform's profile, e.g. to extend its phrase list.
    pub fn with_profile(mut self, profile: PlatformProfile) -> Self {
        if profile.platform == Platform::Generic {
            self.generic = profile;
        } else {
            self.by_platform.insert(profile.platform, profile);
        }
        self
    }

    pub fn get(&self, platform: Platform) -> &PlatformProfile {
        self.by_platform.get(&platform).unwrap_or(&self.generic)
    }
}

fn removal_phrase_rule(name: &'static str) -> Rule {
    Rule::new(
        name,
        vec![Is(Signal::RemovalPhrase)],
        Outcome::Verdict(Verdict::Removed),
    )
}

fn success_rule() -> Rule {
    Rule::new(
        "http success",
        vec![Is(Signal::SuccessStatus)],
        Outcome::Verdict(Verdict::Active),
    )
}

fn to_strings(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_platform_has_a_profile() {
        let profiles = Profiles::standard().unwrap();
        for platform in Platform::ALL {
            assert_eq!(profiles.get(platform).platform, platform);
        }
    }

    #[test]
    fn settle_only_for_render_heavy_platforms() {
        let profiles = Profiles::standard().unwrap();
        assert!(profiles.get(Platform::Instagram).settle);
        assert!(profiles.get(Platform::Facebook).settle);
        assert!(profiles.get(Platform::Threads).settle);
        assert!(!profiles.get(Platform::Youtube).settle);
        assert!(!profiles.get(Platform::Tiktok).settle);
        assert!(!profiles.get(Platform::Generic).settle);
    }

    #[test]
    fn generic_never_inspects_content() {
        let generic = PlatformProfile::generic().unwrap();
        assert!(generic.removal_phrases.is_empty());
        assert_eq!(generic.rules.iter().count(), 1);
    }

    #[test]
    fn replacing_a_profile() {
        let mut youtube = PlatformProfile::youtube().unwrap();
        youtube.removal_phrases.push("this video has been removed".into());
        let profiles = Profiles::standard().unwrap().with_profile(youtube);
        assert_eq!(profiles.get(Platform::Youtube).removal_phrases.len(), 3);
    }
}

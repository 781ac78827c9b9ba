// Platform classifiers: walk the platform's rule list over one observation.

use std::sync::Arc;

use tracing::{debug, info};

use crate::observation::PageObservation;
use crate::profiles::{PlatformProfile, Profiles};
use crate::rules::Outcome;
use crate::secondary::SecondaryProbe;
use crate::signals::SignalSet;
use crate::types::{ClassificationResult, LoginWallPolicy, Platform, Verdict};

pub struct Classifier {
    profiles: Profiles,
    policy: LoginWallPolicy,
    secondary: Option<Arc<dyn SecondaryProbe>>,
}

impl Classifier {
    pub fn new(profiles: Profiles, policy: LoginWallPolicy) -> Self {
        Self {
            profiles,
            policy,
            secondary: None,
        }
    }

    pub fn with_secondary_probe(mut self, probe: Arc<dyn SecondaryProbe>) -> Self {
        self.secondary = Some(probe);
        self
    }

    pub fn profile(&self, platform: Platform) -> &PlatformProfile {
        self.profiles.get(platform)
    }

    /// Verdict for `url` given what the primary navigation saw.
    ///
    /// No observation always means `Unknown`. Otherwise the first matching rule
    /// decides; with no match the result is `Unknown`.
    pub async fn classify(
        &self,
        platform: Platform,
        url: &str,
        observation: Option<&PageObservation>,
    ) -> ClassificationResult {
        let Some(obs) = observation else {
            return ClassificationResult::unknown("navigation failed");
        };

        let profile = self.profiles.get(platform);
        let signals = SignalSet::evaluate(obs, profile);
        debug!(url, %platform, ?signals, "Signals evaluated");

        for (index, rule) in profile.rules.iter().enumerate() {
            if !rule.matches(&signals) {
                continue;
            }
            match rule.then {
                Outcome::Verdict(verdict) => {
                    return ClassificationResult::new(verdict, rule.describe(&signals));
                }
                Outcome::LoginWall => {
                    return ClassificationResult::new(self.policy.verdict(), rule.describe(&signals));
                }
                Outcome::SecondaryProbe => {
                    if let Some(result) = self.secondary_check(url, profile, index).await {
                        return result;
                    }
                }
                Outcome::DistinctLoginWall => {
                    if self.policy == LoginWallPolicy::Distinct {
                        return ClassificationResult::new(
                            Verdict::LoginRequired,
                            rule.describe(&signals),
                        );
                    }
                }
            }
        }

        let detail = match signals.http_status {
            Some(code) => format!("no rule matched (http {code})"),
            None => "no rule matched".to_string(),
        };
        ClassificationResult::unknown(detail)
    }

    /// Re-run the removal rules that precede `index` against a second engine's view.
    async fn secondary_check(
        &self,
        url: &str,
        profile: &PlatformProfile,
        index: usize,
    ) -> Option<ClassificationResult> {
        let probe = self.secondary.as_ref()?;
        let second = probe.observe(url).await?;
        let signals = SignalSet::evaluate(&second, profile);

        let rule = profile
            .rules
            .removal_rules_before(index)
            .find(|r| r.matches(&signals))?;

        info!(url, rule = rule.name, "Secondary engine confirmed removal");
        Some(ClassificationResult::new(
            Verdict::Removed,
            format!("secondary engine: {}", rule.describe(&signals)),
        ))
    }
}

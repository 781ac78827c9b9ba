// Ordered rule lists. Each rule is a conjunction of signal tests with an outcome;
// the first rule whose conditions all hold decides.

use crate::error::{EngineError, Result};
use crate::signals::{Signal, SignalSet};
use crate::types::Verdict;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Condition {
    Is(Signal),
    Not(Signal),
}

impl Condition {
    fn holds(&self, signals: &SignalSet) -> bool {
        match self {
            Condition::Is(s) => signals.is(*s),
            Condition::Not(s) => !signals.is(*s),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Verdict(Verdict),
    /// Resolved through the configured login-wall policy.
    LoginWall,
    /// `LoginRequired` under the distinct login-wall policy; falls through otherwise.
    DistinctLoginWall,
    /// Re-observe with an independent engine and re-run the removal rules
    /// that precede this one. Falls through when nothing matches.
    SecondaryProbe,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rule {
    pub name: &'static str,
    pub when: Vec<Condition>,
    pub then: Outcome,
}

impl Rule {
    pub fn new(name: &'static str, when: Vec<Condition>, then: Outcome) -> Self {
        Self { name, when, then }
    }

    pub fn matches(&self, signals: &SignalSet) -> bool {
        self.when.iter().all(|c| c.holds(signals))
    }

    fn has_positive_condition(&self) -> bool {
        self.when.iter().any(|c| matches!(c, Condition::Is(_)))
    }

    fn is_removal(&self) -> bool {
        self.then == Outcome::Verdict(Verdict::Removed)
    }

    /// Audit string: rule name, the matched phrase when the rule used one, and the status.
    pub fn describe(&self, signals: &SignalSet) -> String {
        let mut detail = self.name.to_string();
        if self.when.contains(&Condition::Is(Signal::RemovalPhrase)) {
            if let Some(ref phrase) = signals.removal_phrase {
                detail.push_str(&format!(": \"{phrase}\""));
            }
        }
        if let Some(code) = signals.http_status {
            detail.push_str(&format!(" (http {code})"));
        }
        detail
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleSet {
    rules: Vec<Rule>,
}

impl RuleSet {
    /// Rejects rules that could fire on absence alone: every rule needs at least
    /// one condition, and every `Removed` rule needs at least one positive one.
    pub fn new(rules: Vec<Rule>) -> Result<Self> {
        for rule in &rules {
            if rule.when.is_empty() {
                return Err(EngineError::InvalidRule {
                    rule: rule.name.to_string(),
                    reason: "rule has no conditions".into(),
                });
            }
            let gated = rule.is_removal()
                || matches!(rule.then, Outcome::SecondaryProbe | Outcome::DistinctLoginWall);
            if gated && !rule.has_positive_condition() {
                return Err(EngineError::InvalidRule {
                    rule: rule.name.to_string(),
                    reason: "removal requires at least one positive signal".into(),
                });
            }
        }
        Ok(Self { rules })
    }

    pub fn iter(&self) -> impl Iterator<Item = &Rule> {
        self.rules.iter()
    }

    /// `Removed` rules that come before the rule at `index`, in order.
    pub fn removal_rules_before(&self, index: usize) -> impl Iterator<Item = &Rule> {
        self.rules.iter().take(index).filter(|r| r.is_removal())
    }
}

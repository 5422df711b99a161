use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use super::backoff::backoff_delay;
use super::classify::ClassifiedFailure;

/// Decision returned by the retry policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// Do not retry; propagate the failure.
    NoRetry(StopReason),
    /// Retry after the given delay.
    RetryAfter(Duration),
}

/// Why the policy stopped retrying.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    Disabled,
    Fatal,
    Exhausted,
}

/// Exponential backoff policy with jitter and caps.
///
/// Plain value: build it once when a client is constructed and share it
/// freely between concurrent calls.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    /// Retries allowed after the initial try.
    pub max_attempts: u32,
    /// Base delay before the first retry.
    pub initial_delay: Duration,
    /// Upper bound on any computed delay.
    pub max_delay: Duration,
    /// When false every call runs exactly once.
    pub enabled: bool,
    /// Jitter is drawn from `[0, jitter_ratio] * exponential`.
    pub jitter_ratio: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::default_preset()
    }
}

impl RetryPolicy {
    pub const DEFAULT_JITTER_RATIO: f64 = 0.2;

    /// 3 retries, 1s initial delay, 30s cap.
    pub const fn default_preset() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
            enabled: true,
            jitter_ratio: Self::DEFAULT_JITTER_RATIO,
        }
    }

    /// Retries disabled.
    pub const fn none() -> Self {
        Self {
            max_attempts: 0,
            enabled: false,
            ..Self::default_preset()
        }
    }

    /// 5 retries, 500ms initial delay, 10s cap.
    pub const fn aggressive() -> Self {
        Self {
            max_attempts: 5,
            initial_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(10),
            enabled: true,
            jitter_ratio: Self::DEFAULT_JITTER_RATIO,
        }
    }

    pub const fn from_preset(preset: RetryPreset) -> Self {
        match preset {
            RetryPreset::Default => Self::default_preset(),
            RetryPreset::None => Self::none(),
            RetryPreset::Aggressive => Self::aggressive(),
        }
    }

    /// An absent policy means no retries.
    pub fn or_none(policy: Option<&RetryPolicy>) -> RetryPolicy {
        policy.copied().unwrap_or_else(Self::none)
    }

    /// Decide what to do after try number `attempt` (1-based) failed.
    pub fn decide(&self, attempt: u32, failure: &ClassifiedFailure) -> RetryDecision {
        if !self.enabled {
            return RetryDecision::NoRetry(StopReason::Disabled);
        }
        if !failure.is_transient {
            return RetryDecision::NoRetry(StopReason::Fatal);
        }
        // The attempt counter cannot go past u32::MAX.
        if attempt > self.max_attempts || attempt == u32::MAX {
            return RetryDecision::NoRetry(StopReason::Exhausted);
        }
        RetryDecision::RetryAfter(backoff_delay(attempt, self))
    }
}

/// Named policy presets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RetryPreset {
    #[default]
    Default,
    None,
    Aggressive,
}

impl RetryPreset {
    pub fn as_str(self) -> &'static str {
        match self {
            RetryPreset::Default => "default",
            RetryPreset::None => "none",
            RetryPreset::Aggressive => "aggressive",
        }
    }
}

impl fmt::Display for RetryPreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RetryPreset {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "default" => Ok(RetryPreset::Default),
            "none" => Ok(RetryPreset::None),
            "aggressive" => Ok(RetryPreset::Aggressive),
            other => Err(format!(
                "unknown retry preset '{other}' (expected default, none or aggressive)"
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::retry::classify::FailureKind;

    fn transient() -> ClassifiedFailure {
        ClassifiedFailure {
            kind: FailureKind::TransientStatus(503),
            is_transient: true,
            status_code: Some(503),
            error_code: None,
        }
    }

    fn fatal() -> ClassifiedFailure {
        ClassifiedFailure {
            kind: FailureKind::Fatal,
            is_transient: false,
            status_code: Some(404),
            error_code: Some("BlobNotFound".to_string()),
        }
    }

    #[test]
    fn presets_match_documented_values() {
        let d = RetryPolicy::default();
        assert_eq!(d.max_attempts, 3);
        assert_eq!(d.initial_delay, Duration::from_secs(1));
        assert_eq!(d.max_delay, Duration::from_secs(30));
        assert!(d.enabled);

        assert!(!RetryPolicy::none().enabled);

        let a = RetryPolicy::aggressive();
        assert_eq!(a.max_attempts, 5);
        assert_eq!(a.initial_delay, Duration::from_millis(500));
        assert_eq!(a.max_delay, Duration::from_secs(10));
        assert!(a.enabled);
    }

    #[test]
    fn no_retry_for_fatal() {
        let p = RetryPolicy::default();
        assert_eq!(p.decide(1, &fatal()), RetryDecision::NoRetry(StopReason::Fatal));
    }

    #[test]
    fn disabled_policy_never_retries() {
        let p = RetryPolicy::none();
        assert_eq!(
            p.decide(1, &transient()),
            RetryDecision::NoRetry(StopReason::Disabled)
        );
    }

    #[test]
    fn respects_max_attempts() {
        let p = RetryPolicy {
            max_attempts: 2,
            ..RetryPolicy::default()
        };
        assert!(matches!(p.decide(1, &transient()), RetryDecision::RetryAfter(_)));
        assert!(matches!(p.decide(2, &transient()), RetryDecision::RetryAfter(_)));
        assert_eq!(
            p.decide(3, &transient()),
            RetryDecision::NoRetry(StopReason::Exhausted)
        );
    }

    #[test]
    fn zero_attempts_stops_after_first_try() {
        let p = RetryPolicy {
            max_attempts: 0,
            ..RetryPolicy::default()
        };
        assert_eq!(
            p.decide(1, &transient()),
            RetryDecision::NoRetry(StopReason::Exhausted)
        );
    }

    #[test]
    fn unbounded_budget_stops_at_counter_limit() {
        let p = RetryPolicy {
            max_attempts: u32::MAX,
            ..RetryPolicy::default()
        };
        assert!(matches!(
            p.decide(u32::MAX - 1, &transient()),
            RetryDecision::RetryAfter(_)
        ));
        assert_eq!(
            p.decide(u32::MAX, &transient()),
            RetryDecision::NoRetry(StopReason::Exhausted)
        );
    }

    #[test]
    fn absent_policy_is_none() {
        assert_eq!(RetryPolicy::or_none(None), RetryPolicy::none());
        let a = RetryPolicy::aggressive();
        assert_eq!(RetryPolicy::or_none(Some(&a)), a);
    }

    #[test]
    fn preset_parses_case_insensitively() {
        assert_eq!("Aggressive".parse::<RetryPreset>(), Ok(RetryPreset::Aggressive));
        assert_eq!("none".parse::<RetryPreset>(), Ok(RetryPreset::None));
        assert!("sometimes".parse::<RetryPreset>().is_err());
        assert_eq!(
            RetryPolicy::from_preset(RetryPreset::Default),
            RetryPolicy::default_preset()
        );
    }
}

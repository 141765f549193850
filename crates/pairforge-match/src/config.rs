//! Coordinator configuration.

use std::num::NonZeroU32;
use std::time::Duration;

use pairforge_protocol::MATCHMAKING_TOPIC;

/// How allocation failures are retried.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Fixed wait between a failed attempt and the next one.
    pub backoff: Duration,

    /// Give up after this many attempts. `None` retries until the
    /// coordinator shuts down.
    pub max_attempts: Option<NonZeroU32>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            backoff: Duration::from_secs(5),
            max_attempts: None,
        }
    }
}

impl RetryPolicy {
    /// Unbounded retries with the given backoff.
    pub fn fixed(backoff: Duration) -> Self {
        Self {
            backoff,
            max_attempts: None,
        }
    }

    /// Caps the number of attempts.
    pub fn with_max_attempts(mut self, max_attempts: NonZeroU32) -> Self {
        self.max_attempts = Some(max_attempts);
        self
    }
}

/// Configuration for a [`Coordinator`](crate::Coordinator).
#[derive(Debug, Clone)]
pub struct MatchConfig {
    /// Topic pairing requests are consumed from.
    pub request_topic: String,

    /// Allocation retry behaviour.
    pub retry: RetryPolicy,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            request_topic: MATCHMAKING_TOPIC.to_string(),
            retry: RetryPolicy::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_retry_policy_is_unbounded_five_seconds() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.backoff, Duration::from_secs(5));
        assert_eq!(policy.max_attempts, None);
    }

    #[test]
    fn test_with_max_attempts_sets_cap() {
        let policy = RetryPolicy::fixed(Duration::from_millis(10))
            .with_max_attempts(NonZeroU32::new(3).unwrap());
        assert_eq!(policy.backoff, Duration::from_millis(10));
        assert_eq!(policy.max_attempts.map(NonZeroU32::get), Some(3));
    }

    #[test]
    fn test_default_match_config_uses_matchmaking_topic() {
        let config = MatchConfig::default();
        assert_eq!(config.request_topic, "matchmaking");
        assert_eq!(config.retry, RetryPolicy::default());
    }
}

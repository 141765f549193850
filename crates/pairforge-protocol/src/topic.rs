//! Topic naming shared by the coordinator and the rendezvous clients.

use crate::PlayerId;

/// Topic every pairing request is published to.
pub const MATCHMAKING_TOPIC: &str = "matchmaking";

/// Prefix of the per-player result topics.
pub const RESULT_TOPIC_PREFIX: &str = "match_results_";

/// Returns the topic a player's [`MatchResult`](crate::MatchResult) is
/// published to.
///
/// Pure: the same id always yields the same name, which is what lets a
/// client subscribe before its request is even published.
pub fn result_topic(player: &PlayerId) -> String {
    format!("{RESULT_TOPIC_PREFIX}{player}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_result_topic_format() {
        let p1 = PlayerId::parse("p1").unwrap();
        assert_eq!(result_topic(&p1), "match_results_p1");
    }

    #[test]
    fn test_result_topic_is_deterministic() {
        let id = PlayerId::generate();
        assert_eq!(result_topic(&id), result_topic(&id.clone()));
    }

    #[test]
    fn test_result_topic_distinct_per_player() {
        let a = PlayerId::parse("a").unwrap();
        let b = PlayerId::parse("b").unwrap();
        assert_ne!(result_topic(&a), result_topic(&b));
        assert_ne!(result_topic(&a), MATCHMAKING_TOPIC);
    }
}

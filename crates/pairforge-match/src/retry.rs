//! Allocation with a fixed-backoff retry loop.
//!
//! A pair is formed before any server exists for it, and allocation can
//! fail for a while (no capacity, no free ports). The loop keeps both
//! players paired and calls the [`Allocator`] again after
//! [`RetryPolicy::backoff`]. Each failure is logged with its attempt
//! number.
//!
//! Only two things end the loop early. The [`CancellationToken`] passed in
//! is checked during every attempt and every wait, so shutdown never waits
//! out a full backoff. An optional [`RetryPolicy::max_attempts`] caps the
//! attempts; without it the loop never gives up by itself.

use tokio_util::sync::CancellationToken;

use crate::{Allocator, MatchError, RetryPolicy};

/// A successful allocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Allocation {
    /// The endpoint returned by the allocator.
    pub endpoint: String,
    /// How many attempts it took, including the successful one.
    pub attempts: u32,
}

/// Calls `allocator` until it succeeds, waiting `policy.backoff` after each
/// failure.
///
/// Every failure is logged at warn level. With no `max_attempts` the loop
/// only ends on success or cancellation.
///
/// # Errors
///
/// - [`MatchError::Cancelled`] if `cancel` fires during an attempt or a
///   backoff wait.
/// - [`MatchError::AllocationExhausted`] once `max_attempts` is reached.
pub async fn allocate_with_retry<A: Allocator>(
    allocator: &A,
    policy: &RetryPolicy,
    cancel: &CancellationToken,
) -> Result<Allocation, MatchError> {
    let mut attempt: u32 = 0;
    loop {
        attempt = attempt.saturating_add(1);
        tracing::debug!(attempt, "allocating session server");

        let outcome = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(MatchError::Cancelled),
            outcome = allocator.allocate() => outcome,
        };

        let error = match outcome {
            Ok(endpoint) => {
                tracing::info!(attempt, %endpoint, "session server allocated");
                return Ok(Allocation {
                    endpoint,
                    attempts: attempt,
                });
            }
            Err(error) => error,
        };

        tracing::warn!(
            attempt,
            error = %error,
            backoff_ms = policy.backoff.as_millis() as u64,
            "allocation attempt failed"
        );

        if policy.max_attempts.is_some_and(|max| attempt >= max.get()) {
            return Err(MatchError::AllocationExhausted {
                attempts: attempt,
                source: error,
            });
        }

        tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(MatchError::Cancelled),
            _ = tokio::time::sleep(policy.backoff) => {}
        }
    }
}

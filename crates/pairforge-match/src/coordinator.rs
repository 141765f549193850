//! The matchmaking coordinator.
//!
//! Consumes pairing requests from the bus, pairs players through the
//! [`PairingSlot`], allocates a session server for each pair and delivers
//! the result to both players. Each request is handled in its own task so
//! a pair stuck in allocation retry never blocks later arrivals.

use std::sync::Arc;

use pairforge_bus::{Bus, BusError, Message, Subscription};
use pairforge_protocol::{Codec, JsonCodec, MatchResult, PairingRequest, PlayerId};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

use crate::{allocate_with_retry, deliver, Allocator, MatchConfig, MatchError, Offer, Pair, PairingSlot};

/// What handling one pairing request did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HandleOutcome {
    /// The player now waits in the slot.
    Enqueued(PlayerId),
    /// The player was already waiting; nothing changed.
    AlreadyWaiting(PlayerId),
    /// The player was paired and both players were sent the result.
    Matched {
        pair: Pair,
        result: MatchResult,
        attempts: u32,
    },
}

struct Shared<B, A, C> {
    bus: B,
    allocator: A,
    codec: C,
    slot: PairingSlot,
    config: MatchConfig,
}

/// Pairs players and hands them a session endpoint.
///
/// Cheap to clone; clones share the same slot and bus.
pub struct Coordinator<B, A, C = JsonCodec> {
    shared: Arc<Shared<B, A, C>>,
}

impl<B, A, C> Clone for Coordinator<B, A, C> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<B: Bus, A: Allocator> Coordinator<B, A, JsonCodec> {
    /// Creates a coordinator speaking JSON on the bus.
    pub fn new(bus: B, allocator: A, config: MatchConfig) -> Self {
        Self::with_codec(bus, allocator, JsonCodec, config)
    }
}

impl<B: Bus, A: Allocator, C: Codec> Coordinator<B, A, C> {
    pub fn with_codec(bus: B, allocator: A, codec: C, config: MatchConfig) -> Self {
        Self {
            shared: Arc::new(Shared {
                bus,
                allocator,
                codec,
                slot: PairingSlot::new(),
                config,
            }),
        }
    }

    pub fn config(&self) -> &MatchConfig {
        &self.shared.config
    }

    /// The player currently waiting for an opponent, if any.
    pub fn waiting(&self) -> Option<PlayerId> {
        self.shared.slot.waiting()
    }

    /// Removes `player` from the slot if they are still waiting.
    ///
    /// Used when a waiting player disconnects before being paired. A player
    /// who has already been paired is unaffected.
    pub fn withdraw(&self, player: &PlayerId) -> bool {
        let withdrawn = self.shared.slot.withdraw(player);
        if withdrawn {
            tracing::info!(%player, "waiting player withdrawn");
        }
        withdrawn
    }

    /// Subscribes to the request topic and consumes pairing requests until
    /// `shutdown` is cancelled.
    ///
    /// # Errors
    ///
    /// - Subscribing to the request topic fails.
    /// - The request subscription ends without `shutdown` being cancelled
    ///   ([`BusError::Closed`]).
    pub async fn run(&self, shutdown: CancellationToken) -> Result<(), MatchError> {
        let requests = self
            .shared
            .bus
            .subscribe(&self.shared.config.request_topic)
            .await?;
        self.serve(requests, shutdown).await
    }

    /// Consumes pairing requests from an existing subscription.
    ///
    /// Each message is handled on its own task and acknowledged once
    /// handled, or negatively acknowledged when
    /// [`MatchError::is_retryable`] says the bus should redeliver it. On
    /// shutdown, in-flight handlers are cancelled and awaited before
    /// returning.
    ///
    /// # Errors
    ///
    /// [`BusError::Closed`] if the subscription ends without `shutdown`
    /// being cancelled.
    pub async fn serve(
        &self,
        mut requests: Subscription,
        shutdown: CancellationToken,
    ) -> Result<(), MatchError> {
        let topic = requests.topic().to_string();
        tracing::info!(%topic, "coordinator started");

        let handlers_cancel = shutdown.child_token();
        let mut handlers = JoinSet::new();

        let result = loop {
            while handlers.try_join_next().is_some() {}

            let message = tokio::select! {
                biased;
                _ = shutdown.cancelled() => break Ok(()),
                message = requests.next() => message,
            };

            let Some(message) = message else {
                if shutdown.is_cancelled() {
                    break Ok(());
                }
                tracing::error!(%topic, "request subscription closed unexpectedly");
                break Err(MatchError::Bus(BusError::Closed));
            };

            let coordinator = self.clone();
            let cancel = handlers_cancel.clone();
            handlers.spawn(async move { coordinator.process(message, &cancel).await });
        };

        handlers_cancel.cancel();
        if !handlers.is_empty() {
            tracing::debug!(in_flight = handlers.len(), "waiting for in-flight requests");
        }
        while handlers.join_next().await.is_some() {}

        tracing::info!(%topic, "coordinator stopped");
        result
    }

    /// Closes the bus. A running [`run`](Self::run) loop observes this as
    /// its subscription ending.
    pub async fn shutdown(&self) -> Result<(), MatchError> {
        self.shared.bus.close().await?;
        Ok(())
    }

    /// Handles one pairing request payload.
    ///
    /// If the request completes a pair, this does not return until a
    /// session server has been allocated and both results published, or
    /// `cancel` fires.
    ///
    /// # Errors
    ///
    /// - [`MatchError::Protocol`] if the payload is not a valid request.
    ///   The slot is left untouched.
    /// - [`MatchError::Cancelled`] or [`MatchError::AllocationExhausted`]
    ///   from the allocation retry loop. The pair is dropped.
    /// - [`MatchError::Delivery`] if either publish failed.
    pub async fn handle(
        &self,
        payload: &[u8],
        cancel: &CancellationToken,
    ) -> Result<HandleOutcome, MatchError> {
        let request: PairingRequest = self
            .shared
            .codec
            .decode(payload)
            .inspect_err(|error| tracing::warn!(error = %error, "malformed pairing request rejected"))?;
        let player = request.player;
        tracing::debug!(%player, "pairing request received");

        let waiting = match self.shared.slot.offer(player.clone()) {
            Offer::Waiting => {
                tracing::info!(%player, "player waiting for an opponent");
                return Ok(HandleOutcome::Enqueued(player));
            }
            Offer::AlreadyWaiting => {
                tracing::debug!(%player, "duplicate request from waiting player");
                return Ok(HandleOutcome::AlreadyWaiting(player));
            }
            Offer::Paired(waiting) => waiting,
        };

        let pair = Pair {
            waiting,
            arriving: player,
        };
        tracing::info!(waiting = %pair.waiting, arriving = %pair.arriving, "players paired");

        let allocation = allocate_with_retry(&self.shared.allocator, &self.shared.config.retry, cancel)
            .await
            .inspect_err(|error| {
                tracing::warn!(
                    waiting = %pair.waiting,
                    arriving = %pair.arriving,
                    error = %error,
                    "pair dropped before allocation"
                );
            })?;

        let result = MatchResult {
            endpoint: allocation.endpoint,
        };
        deliver(&self.shared.bus, &self.shared.codec, &pair, &result).await?;

        tracing::info!(
            waiting = %pair.waiting,
            arriving = %pair.arriving,
            endpoint = %result.endpoint,
            attempts = allocation.attempts,
            "match delivered"
        );
        Ok(HandleOutcome::Matched {
            pair,
            result,
            attempts: allocation.attempts,
        })
    }

    async fn process(&self, message: Message, cancel: &CancellationToken) {
        let id = message.id();
        match self.handle(message.payload(), cancel).await {
            Ok(_) => message.ack(),
            Err(error) if error.is_retryable() => {
                tracing::warn!(%id, attempt = message.attempt(), error = %error, "pairing request will be redelivered");
                message.nack();
            }
            Err(error) => {
                tracing::debug!(%id, error = %error, "pairing request acknowledged without a match");
                message.ack();
            }
        }
    }
}

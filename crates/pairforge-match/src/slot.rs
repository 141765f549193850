//! The single-waiter pairing slot.
//!
//! At most one player waits at a time. The next distinct player to arrive
//! takes them out of the slot and the two form a [`Pair`]. The whole
//! check-and-update happens under one lock, so concurrent arrivals never
//! both observe the same waiting player.

use std::sync::{Mutex, MutexGuard, PoisonError};

use pairforge_protocol::PlayerId;

/// Outcome of offering a player to the slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Offer {
    /// The slot was empty; the player now waits in it.
    Waiting,
    /// The player was already the one waiting. The slot is unchanged.
    AlreadyWaiting,
    /// The slot held another player, who is returned. The slot is now empty.
    Paired(PlayerId),
}

impl Offer {
    /// The partner, if the offer formed a pair.
    pub fn partner(self) -> Option<PlayerId> {
        match self {
            Self::Paired(partner) => Some(partner),
            Self::Waiting | Self::AlreadyWaiting => None,
        }
    }
}

/// Two players matched together.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pair {
    /// The player that was waiting in the slot.
    pub waiting: PlayerId,
    /// The player whose request completed the pair.
    pub arriving: PlayerId,
}

impl Pair {
    pub fn players(&self) -> [&PlayerId; 2] {
        [&self.waiting, &self.arriving]
    }
}

/// Holds at most one waiting player.
#[derive(Debug, Default)]
pub struct PairingSlot {
    waiting: Mutex<Option<PlayerId>>,
}

impl PairingSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Offers `candidate` to the slot.
    ///
    /// A candidate equal to the waiting player never pairs with itself;
    /// this makes a redelivered request for the waiting player harmless.
    pub fn offer(&self, candidate: PlayerId) -> Offer {
        let mut waiting = self.lock();
        match waiting.take() {
            None => {
                *waiting = Some(candidate);
                Offer::Waiting
            }
            Some(current) if current == candidate => {
                *waiting = Some(current);
                Offer::AlreadyWaiting
            }
            Some(current) => Offer::Paired(current),
        }
    }

    /// Returns the partner for `candidate` if one was waiting, otherwise
    /// leaves `candidate` waiting and returns `None`.
    pub fn try_pair(&self, candidate: PlayerId) -> Option<PlayerId> {
        self.offer(candidate).partner()
    }

    /// The player currently waiting, if any.
    pub fn waiting(&self) -> Option<PlayerId> {
        self.lock().clone()
    }

    /// Removes `player` from the slot if it is the one waiting.
    ///
    /// Returns `false` if the slot is empty or holds someone else, in which
    /// case nothing changes.
    pub fn withdraw(&self, player: &PlayerId) -> bool {
        let mut waiting = self.lock();
        if waiting.as_ref() == Some(player) {
            *waiting = None;
            true
        } else {
            false
        }
    }

    fn lock(&self) -> MutexGuard<'_, Option<PlayerId>> {
        // The critical sections cannot panic midway, so a poisoned lock
        // still holds a consistent value.
        self.waiting.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

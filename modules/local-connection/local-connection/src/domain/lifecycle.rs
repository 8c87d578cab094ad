//! Connection lifecycle state machine.

use std::sync::atomic::{AtomicU8, Ordering};

/// Lifecycle state of a connection.
///
/// Transitions only move forward:
/// `New -> Authenticating -> Active -> ShuttingDown -> Closed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[repr(u8)]
pub enum ConnectionState {
    New = 0,
    Authenticating = 1,
    Active = 2,
    ShuttingDown = 3,
    Closed = 4,
}

impl ConnectionState {
    fn from_u8(raw: u8) -> Self {
        match raw {
            0 => Self::New,
            1 => Self::Authenticating,
            2 => Self::Active,
            3 => Self::ShuttingDown,
            _ => Self::Closed,
        }
    }
}

/// Atomic holder of a [`ConnectionState`].
#[derive(Debug)]
pub(crate) struct Lifecycle {
    state: AtomicU8,
}

impl Lifecycle {
    pub(crate) fn new() -> Self {
        Self {
            state: AtomicU8::new(ConnectionState::New as u8),
        }
    }

    pub(crate) fn state(&self) -> ConnectionState {
        ConnectionState::from_u8(self.state.load(Ordering::Acquire))
    }

    /// Closed is terminal; once observed it is observed forever.
    pub(crate) fn is_closed(&self) -> bool {
        self.state() == ConnectionState::Closed
    }

    /// Advance to `next` if that moves forward and stays below shutdown.
    pub(crate) fn advance(&self, next: ConnectionState) -> bool {
        debug_assert!(next < ConnectionState::ShuttingDown);
        self.state
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |raw| {
                (raw < next as u8).then_some(next as u8)
            })
            .is_ok()
    }

    /// Claim the shutdown. Only the first caller gets `true`.
    pub(crate) fn begin_shutdown(&self) -> bool {
        self.state
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |raw| {
                (raw < ConnectionState::ShuttingDown as u8)
                    .then_some(ConnectionState::ShuttingDown as u8)
            })
            .is_ok()
    }

    pub(crate) fn finish_shutdown(&self) {
        self.state
            .store(ConnectionState::Closed as u8, Ordering::Release);
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn advances_forward_only() {
        let lifecycle = Lifecycle::new();

        assert!(lifecycle.advance(ConnectionState::Authenticating));
        assert!(lifecycle.advance(ConnectionState::Active));
        assert!(!lifecycle.advance(ConnectionState::Authenticating));
        assert_eq!(lifecycle.state(), ConnectionState::Active);
    }

    #[test]
    fn shutdown_is_claimed_once() {
        let lifecycle = Lifecycle::new();
        lifecycle.advance(ConnectionState::Active);

        assert!(lifecycle.begin_shutdown());
        assert!(!lifecycle.begin_shutdown());
        assert!(!lifecycle.is_closed());

        lifecycle.finish_shutdown();
        assert!(lifecycle.is_closed());
        assert!(!lifecycle.begin_shutdown());
        assert!(!lifecycle.advance(ConnectionState::Active));
    }
}

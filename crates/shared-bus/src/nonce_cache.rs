//! # Recent Nonce Window
//!
//! The storage-event transport writes every envelope with a fresh nonce so
//! that two identical sends still change the stored value. Receivers keep a
//! bounded window of nonces they have already delivered.
//!
//! ## Design
//!
//! - The window is bounded by count, not time: contexts may be hidden and
//!   throttled for arbitrary periods, so a clock gives no useful bound.
//! - A nonce evicted from the window and seen again is delivered again.
//!   Receivers are idempotent, so that is harmless.

use std::collections::{HashSet, VecDeque};
use thiserror::Error;

/// Errors from nonce window operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum NonceError {
    /// The nonce is still in the window.
    #[error("Nonce {nonce} already delivered")]
    AlreadySeen { nonce: String },
}

/// Bounded FIFO set of recently delivered nonces.
#[derive(Debug)]
pub struct RecentNonces {
    order: VecDeque<String>,
    seen: HashSet<String>,
    capacity: usize,
}

impl RecentNonces {
    /// Default window size.
    pub const DEFAULT_CAPACITY: usize = 256;

    /// Window with the default capacity.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(Self::DEFAULT_CAPACITY)
    }

    /// Window holding at most `capacity` nonces.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            order: VecDeque::with_capacity(capacity),
            seen: HashSet::with_capacity(capacity),
            capacity,
        }
    }

    /// Record `nonce`, evicting the oldest entry when full.
    ///
    /// # Errors
    ///
    /// `NonceError::AlreadySeen` if the nonce is still in the window.
    pub fn check_and_insert(&mut self, nonce: &str) -> Result<(), NonceError> {
        if self.seen.contains(nonce) {
            return Err(NonceError::AlreadySeen {
                nonce: nonce.to_string(),
            });
        }

        if self.order.len() == self.capacity {
            if let Some(oldest) = self.order.pop_front() {
                self.seen.remove(&oldest);
            }
        }
        self.order.push_back(nonce.to_string());
        self.seen.insert(nonce.to_string());
        Ok(())
    }

    /// Nonces currently held.
    #[must_use]
    pub fn len(&self) -> usize {
        self.order.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

impl Default for RecentNonces {
    fn default() -> Self {
        Self::new()
    }
}

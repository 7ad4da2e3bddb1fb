//! # lt-02-ownership
//!
//! Which context type may write which part of the shared document.
//!
//! The store does whole-document read-modify-write with no lock, so two
//! contexts writing the same path at the same time can lose one write.
//! The partition keeps that rare by giving every path exactly one owning
//! context type, except a small shared-writable set whose values are all
//! monotonic (append-only lists, `max`-merged counters, sticky booleans).
//!
//! ## Table
//!
//! | path                    | owner    |
//! |-------------------------|----------|
//! | `tabs.<n>.*`            | tab `n`  |
//! | `player.hasFlashlight`  | tab 2    |
//! | `player.codeFragments`  | tab 4    |
//! | `player.mindFragments`  | tab 5    |
//! | `narrative.shown`       | shared   |
//! | `meta.*`                | shared   |
//!
//! The system writer (reset) may write anything.
//!
//! ## Validation
//!
//! [`OwnershipPolicy`] plugs into the store as a `WritePolicy`. It diffs
//! each write at field granularity and, depending on [`OwnershipMode`],
//! ignores, logs, or refuses writes that touch paths the writer does not
//! own.

pub mod domain;
pub mod policy;

pub use domain::*;
pub use policy::{OwnershipMode, OwnershipPolicy};

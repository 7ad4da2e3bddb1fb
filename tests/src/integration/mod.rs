//! Integration scenarios. Every module is test-only.

#[cfg(test)]
mod fixtures;

pub mod bus;
pub mod ownership;
pub mod playthrough;
pub mod store;
pub mod triggers;

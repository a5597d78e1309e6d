//! Core of the subscriber milestone tracker: domain model, ports and the
//! check and discovery services. Concrete stores and API clients live in
//! the adapter crates and are injected through the traits in [`ports`].

pub mod announcement;
pub mod application;
pub mod discovery;
pub mod domain;
pub mod error;
pub mod milestone;
pub mod ports;

#[cfg(test)]
mod fakes;

pub use error::TrackerError;

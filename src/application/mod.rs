//! Application layer orchestrating the booking domain.
//!
//! `BookingService` loads, transitions and persists one aggregate per
//! command. `BookingEngine` puts it behind a set of `tokio` shard workers so
//! all commands for a booking are serialized.

pub mod engine;
pub mod service;

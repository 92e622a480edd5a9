//! Domain layer: the booking aggregate, its state machines and the pure
//! pricing and cancellation rules they rely on. Nothing here performs I/O.

pub mod booking;
pub mod cancellation;
pub mod command;
pub mod lifecycle;
pub mod money;
pub mod notification;
pub mod ports;
pub mod pricing;
pub mod travel;

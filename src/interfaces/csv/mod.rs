//! CSV adapters: a command stream in, a booking summary out.

pub mod booking_writer;
pub mod command_reader;

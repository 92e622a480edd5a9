use crate::domain::booking::BookingId;
use crate::domain::travel::TravelStatus;
use chrono::{DateTime, NaiveDate, Utc};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BookingError {
    #[error("Invalid transition: {0}")]
    InvalidTransition(String),
    #[error("Accept window closed at {deadline}")]
    WindowExpired { deadline: DateTime<Utc> },
    #[error("Cannot complete a booking scheduled for {event_date} before that day")]
    PrematureCompletion { event_date: NaiveDate },
    #[error("Invalid pricing input: {0}")]
    InvalidPricingInput(String),
    #[error("Travel cannot move from {from} to {to}")]
    TravelSequenceViolation { from: TravelStatus, to: TravelStatus },
    #[error("Concurrent write detected for booking {0}")]
    Conflict(BookingId),
    #[error("Booking {0} not found")]
    NotFound(BookingId),
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Internal error: {0}")]
    Internal(Box<dyn std::error::Error + Send + Sync>),
}

impl BookingError {
    pub(crate) fn transition(reason: impl Into<String>) -> Self {
        Self::InvalidTransition(reason.into())
    }

    pub(crate) fn pricing(reason: impl Into<String>) -> Self {
        Self::InvalidPricingInput(reason.into())
    }

    /// Only a lost optimistic-concurrency race is worth reloading and reapplying.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Conflict(_))
    }
}

#[cfg(feature = "storage-rocksdb")]
impl From<rocksdb::Error> for BookingError {
    fn from(e: rocksdb::Error) -> Self {
        Self::Internal(Box::new(e))
    }
}

pub type Result<T> = std::result::Result<T, BookingError>;

use super::booking::BookingId;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Recipient {
    Customer,
    Pandit,
    Admin,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EventKind {
    BookingOffered,
    BookingConfirmed,
    BookingExpired,
    TravelStatusChanged,
    PanditEnRoute,
    BookingCompleted,
    BookingCancelled,
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EventKind::BookingOffered => "booking-offered",
            EventKind::BookingConfirmed => "booking-confirmed",
            EventKind::BookingExpired => "booking-expired",
            EventKind::TravelStatusChanged => "travel-status-changed",
            EventKind::PanditEnRoute => "pandit-en-route",
            EventKind::BookingCompleted => "booking-completed",
            EventKind::BookingCancelled => "booking-cancelled",
        };
        f.write_str(name)
    }
}

/// A side effect computed by a transition, handed to the notification port
/// only after the new state has been saved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub recipient: Recipient,
    pub booking_id: BookingId,
    pub kind: EventKind,
    pub payload: serde_json::Value,
}

impl Notification {
    pub fn new(
        recipient: Recipient,
        booking_id: BookingId,
        kind: EventKind,
        payload: serde_json::Value,
    ) -> Self {
        Self {
            recipient,
            booking_id,
            kind,
            payload,
        }
    }
}

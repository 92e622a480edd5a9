use super::booking::{Actor, BookingId, CustomerId, PanditId, ServiceSelection};
use super::pricing::{TravelInputs, TravelMode};
use super::travel::TravelStatus;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

/// A customer's finalized service selection.
#[derive(Debug, Clone, PartialEq)]
pub struct NewBooking {
    pub id: BookingId,
    pub customer: CustomerId,
    pub pandit: PanditId,
    pub event_type: String,
    pub muhurat: Option<String>,
    pub event_at: DateTime<Utc>,
    pub venue: String,
    pub pandit_base: String,
    pub selection: ServiceSelection,
    /// Distance from the pandit's base to the venue, plus preferred mode and nights.
    pub travel: TravelInputs,
    pub paid: bool,
    pub at: DateTime<Utc>,
}

/// Every command carries the wall-clock instant it is evaluated against.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Create(NewBooking),
    Accept {
        booking: BookingId,
        actor: Actor,
        at: DateTime<Utc>,
    },
    Reject {
        booking: BookingId,
        actor: Actor,
        at: DateTime<Utc>,
    },
    Expire {
        booking: BookingId,
        actor: Actor,
        at: DateTime<Utc>,
    },
    UpdateTravelStatus {
        booking: BookingId,
        actor: Actor,
        status: TravelStatus,
        reference: Option<String>,
        notes: Option<String>,
        at: DateTime<Utc>,
    },
    UpdateTravelInputs {
        booking: BookingId,
        actor: Actor,
        mode: TravelMode,
        distance_km: Decimal,
        nights: i32,
        food_selected: bool,
        stay_selected: bool,
        at: DateTime<Utc>,
    },
    StartService {
        booking: BookingId,
        actor: Actor,
        at: DateTime<Utc>,
    },
    MarkCompleted {
        booking: BookingId,
        actor: Actor,
        at: DateTime<Utc>,
    },
    RequestCancellation {
        booking: BookingId,
        actor: Actor,
        at: DateTime<Utc>,
    },
}

impl Command {
    pub fn booking_id(&self) -> BookingId {
        match self {
            Command::Create(new) => new.id,
            Command::Accept { booking, .. }
            | Command::Reject { booking, .. }
            | Command::Expire { booking, .. }
            | Command::UpdateTravelStatus { booking, .. }
            | Command::UpdateTravelInputs { booking, .. }
            | Command::StartService { booking, .. }
            | Command::MarkCompleted { booking, .. }
            | Command::RequestCancellation { booking, .. } => *booking,
        }
    }

    /// The instant every guard of this command is evaluated against.
    pub fn at(&self) -> DateTime<Utc> {
        match self {
            Command::Create(new) => new.at,
            Command::Accept { at, .. }
            | Command::Reject { at, .. }
            | Command::Expire { at, .. }
            | Command::UpdateTravelStatus { at, .. }
            | Command::UpdateTravelInputs { at, .. }
            | Command::StartService { at, .. }
            | Command::MarkCompleted { at, .. }
            | Command::RequestCancellation { at, .. } => *at,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Command::Create(_) => "create",
            Command::Accept { .. } => "accept",
            Command::Reject { .. } => "reject",
            Command::Expire { .. } => "expire",
            Command::UpdateTravelStatus { .. } => "travel_status",
            Command::UpdateTravelInputs { .. } => "travel_inputs",
            Command::StartService { .. } => "start_service",
            Command::MarkCompleted { .. } => "complete",
            Command::RequestCancellation { .. } => "cancel",
        }
    }
}

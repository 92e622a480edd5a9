use super::cancellation::CancellationRecord;
use super::money::Money;
use super::pricing::{PayoutBreakdown, PricingBreakdown, PricingInput, TravelInputs};
use super::travel::{Itinerary, TravelPlan, TravelStatus};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BookingId(pub u64);

impl fmt::Display for BookingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CustomerId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PanditId(pub u32);

/// Who issued a command. Role gating is checked against this.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Actor {
    Customer(CustomerId),
    Pandit(PanditId),
    Admin,
    /// The external timer that expires unanswered offers.
    Scheduler,
}

impl fmt::Display for Actor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Actor::Customer(id) => write!(f, "customer {}", id.0),
            Actor::Pandit(id) => write!(f, "pandit {}", id.0),
            Actor::Admin => f.write_str("admin"),
            Actor::Scheduler => f.write_str("scheduler"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BookingStatus {
    Created,
    Confirmed,
    PanditEnRoute,
    Completed,
    Cancelled,
    Expired,
}

impl BookingStatus {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            BookingStatus::Completed | BookingStatus::Cancelled | BookingStatus::Expired
        )
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BookingStatus::Created => "CREATED",
            BookingStatus::Confirmed => "CONFIRMED",
            BookingStatus::PanditEnRoute => "PANDIT_EN_ROUTE",
            BookingStatus::Completed => "COMPLETED",
            BookingStatus::Cancelled => "CANCELLED",
            BookingStatus::Expired => "EXPIRED",
        };
        f.write_str(name)
    }
}

/// Booking status as shown to people: a confirmed booking whose travel is
/// still being arranged reads as `TRAVEL_ARRANGING`. Derived, never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Status(BookingStatus),
    TravelArranging,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Status(status) => write!(f, "{status}"),
            Stage::TravelArranging => f.write_str("TRAVEL_ARRANGING"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    Pending,
    Paid,
    RefundDue,
    Retained,
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PaymentStatus::Pending => "PENDING",
            PaymentStatus::Paid => "PAID",
            PaymentStatus::RefundDue => "REFUND_DUE",
            PaymentStatus::Retained => "RETAINED",
        };
        f.write_str(name)
    }
}

/// The customer's service selection. Dakshina is fixed here and never derived.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceSelection {
    pub dakshina: Decimal,
    pub samagri_cost: Decimal,
    pub food_selected: bool,
    pub stay_selected: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Booking {
    pub id: BookingId,
    /// Human-readable number shown on receipts, e.g. `RB-20261110-000042`.
    pub number: String,
    pub customer: CustomerId,
    /// The pandit this booking is offered to.
    pub offered_pandit: PanditId,
    /// Set when the offered pandit accepts.
    pub pandit: Option<PanditId>,
    pub event_type: String,
    pub muhurat: Option<String>,
    pub event_at: DateTime<Utc>,
    pub venue: String,
    pub pandit_base: String,
    pub status: BookingStatus,
    /// Decided once at creation; `false` means travel is `NotRequired` for good.
    pub travel_required: bool,
    /// Travel inputs as requested at creation; seeds the plan on confirmation.
    pub requested_travel: TravelInputs,
    pub selection: ServiceSelection,
    pub grand_total: Money,
    pub payment_status: PaymentStatus,
    pub cancellation: Option<CancellationRecord>,
    /// Snapshot taken when the ritual is marked performed.
    pub settled_payout: Option<PayoutBreakdown>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Optimistic concurrency token, bumped by every successful save.
    pub version: u64,
}

impl Booking {
    /// Padded to six digits; larger ids keep every digit so numbers stay unique.
    pub fn number_for(id: BookingId, event_at: DateTime<Utc>) -> String {
        format!("RB-{}-{:06}", event_at.format("%Y%m%d"), id.0)
    }
}

/// A booking together with the records it owns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookingAggregate {
    pub booking: Booking,
    pub travel: Option<TravelPlan>,
    pub pricing: PricingBreakdown,
}

impl BookingAggregate {
    pub fn id(&self) -> BookingId {
        self.booking.id
    }

    /// `None` only for a booking that needs travel but is not confirmed yet.
    pub fn travel_status(&self) -> Option<TravelStatus> {
        if !self.booking.travel_required {
            return Some(TravelStatus::NotRequired);
        }
        self.travel.as_ref().map(|plan| plan.status)
    }

    pub fn stage(&self) -> Stage {
        let status = self.booking.status;
        let arranging = status == BookingStatus::Confirmed
            && self.booking.travel_required
            && self.travel_status() != Some(TravelStatus::Arrived);
        if arranging {
            Stage::TravelArranging
        } else {
            Stage::Status(status)
        }
    }

    /// Pricing inputs as they currently stand: the live plan once one exists,
    /// otherwise the inputs requested at creation.
    pub fn pricing_input(&self) -> PricingInput {
        let booking = &self.booking;
        let travel = if booking.travel_required {
            Some(
                self.travel
                    .as_ref()
                    .map(TravelPlan::inputs)
                    .unwrap_or(booking.requested_travel),
            )
        } else {
            None
        };
        PricingInput {
            dakshina: booking.selection.dakshina,
            samagri_cost: booking.selection.samagri_cost,
            travel,
            food_selected: booking.selection.food_selected,
            stay_selected: booking.selection.stay_selected,
        }
    }

    pub fn payout(&self) -> PayoutBreakdown {
        self.pricing.payout()
    }

    pub fn itinerary(&self) -> Option<Itinerary> {
        self.travel
            .as_ref()
            .map(|plan| plan.itinerary(&self.booking))
    }
}

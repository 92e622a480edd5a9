//! The pandit's travel sub-workflow.
//!
//! A plan only exists when travel is required. It moves strictly forward,
//! `Pending -> Booked -> InTransit -> Arrived`, and keeps its cached cost in
//! step with its inputs while still `Pending`.

use super::booking::Booking;
use super::money::Money;
use super::pricing::{PricingEngine, TravelInputs, TravelMode};
use crate::error::{BookingError, Result};
use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TravelStatus {
    NotRequired,
    Pending,
    Booked,
    InTransit,
    Arrived,
}

impl TravelStatus {
    /// The only status this one may advance to.
    pub fn next(self) -> Option<Self> {
        match self {
            TravelStatus::Pending => Some(TravelStatus::Booked),
            TravelStatus::Booked => Some(TravelStatus::InTransit),
            TravelStatus::InTransit => Some(TravelStatus::Arrived),
            TravelStatus::NotRequired | TravelStatus::Arrived => None,
        }
    }

    pub fn is_terminal(self) -> bool {
        self.next().is_none()
    }
}

impl fmt::Display for TravelStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TravelStatus::NotRequired => "not_required",
            TravelStatus::Pending => "pending",
            TravelStatus::Booked => "booked",
            TravelStatus::InTransit => "in_transit",
            TravelStatus::Arrived => "arrived",
        };
        f.write_str(name)
    }
}

/// One recorded travel transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TravelUpdate {
    pub status: TravelStatus,
    pub at: DateTime<Utc>,
    pub reference: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TravelPlan {
    pub mode: TravelMode,
    pub distance_km: Decimal,
    pub nights: i32,
    pub status: TravelStatus,
    /// PNR, cab number or similar.
    pub booking_reference: Option<String>,
    pub notes: Option<String>,
    /// Cached `travel_cost(mode, distance_km)`.
    pub cost: Money,
    /// Set when the owning booking is cancelled; a closed plan is immutable.
    pub closed: bool,
    pub history: Vec<TravelUpdate>,
}

impl TravelPlan {
    /// Opens a plan in `Pending` with its cost computed from `inputs`.
    pub fn start(inputs: TravelInputs, pricing: &PricingEngine, at: DateTime<Utc>) -> Result<Self> {
        let cost = pricing.travel_cost(inputs.mode, inputs.distance_km)?;
        Ok(Self {
            mode: inputs.mode,
            distance_km: inputs.distance_km,
            nights: inputs.nights,
            status: TravelStatus::Pending,
            booking_reference: None,
            notes: None,
            cost,
            closed: false,
            history: vec![TravelUpdate {
                status: TravelStatus::Pending,
                at,
                reference: None,
                notes: None,
            }],
        })
    }

    pub fn inputs(&self) -> TravelInputs {
        TravelInputs {
            mode: self.mode,
            distance_km: self.distance_km,
            nights: self.nights,
        }
    }

    fn ensure_open(&self) -> Result<()> {
        if self.closed {
            return Err(BookingError::transition("travel plan is closed"));
        }
        Ok(())
    }

    /// Moves to `to`, which must be the immediate successor of the current status.
    pub fn advance(
        &mut self,
        to: TravelStatus,
        reference: Option<String>,
        notes: Option<String>,
        at: DateTime<Utc>,
    ) -> Result<()> {
        self.ensure_open()?;
        if self.status.next() != Some(to) {
            return Err(BookingError::TravelSequenceViolation {
                from: self.status,
                to,
            });
        }

        self.status = to;
        if reference.is_some() {
            self.booking_reference.clone_from(&reference);
        }
        if notes.is_some() {
            self.notes.clone_from(&notes);
        }
        self.history.push(TravelUpdate {
            status: to,
            at,
            reference,
            notes,
        });
        Ok(())
    }

    /// Replaces mode, distance and nights, recomputing the cached cost.
    ///
    /// Only allowed while `Pending`; once tickets are booked the inputs are fixed.
    pub fn update_inputs(&mut self, inputs: TravelInputs, pricing: &PricingEngine) -> Result<()> {
        self.ensure_open()?;
        if self.status != TravelStatus::Pending {
            return Err(BookingError::transition(format!(
                "travel inputs are fixed once travel is {}",
                self.status
            )));
        }
        if inputs.nights < 0 {
            return Err(BookingError::pricing(format!(
                "nights must not be negative, got {}",
                inputs.nights
            )));
        }
        let cost = pricing.travel_cost(inputs.mode, inputs.distance_km)?;
        self.mode = inputs.mode;
        self.distance_km = inputs.distance_km;
        self.nights = inputs.nights;
        self.cost = cost;
        Ok(())
    }

    pub fn close(&mut self) {
        self.closed = true;
    }

    /// Outbound leg, plus a return leg unless the booking is single-day.
    pub fn itinerary(&self, booking: &Booking) -> Itinerary {
        let mut legs = vec![TravelLeg {
            direction: LegDirection::Outbound,
            from: booking.pandit_base.clone(),
            to: booking.venue.clone(),
            mode: self.mode,
            departs_at: None,
            arrives_by: Some(booking.event_at),
        }];
        if self.nights > 0 {
            legs.push(TravelLeg {
                direction: LegDirection::Return,
                from: booking.venue.clone(),
                to: booking.pandit_base.clone(),
                mode: self.mode,
                departs_at: Some(booking.event_at + Duration::days(i64::from(self.nights))),
                arrives_by: None,
            });
        }
        Itinerary {
            booking_number: booking.number.clone(),
            status: self.status,
            booking_reference: self.booking_reference.clone(),
            legs,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LegDirection {
    Outbound,
    Return,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TravelLeg {
    pub direction: LegDirection,
    pub from: String,
    pub to: String,
    pub mode: TravelMode,
    pub departs_at: Option<DateTime<Utc>>,
    pub arrives_by: Option<DateTime<Utc>>,
}

/// Read-only projection of a plan; never stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Itinerary {
    pub booking_number: String,
    pub status: TravelStatus,
    pub booking_reference: Option<String>,
    pub legs: Vec<TravelLeg>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 11, 1, 10, 0, 0).unwrap()
    }

    fn plan() -> TravelPlan {
        let inputs = TravelInputs {
            mode: TravelMode::Train,
            distance_km: dec!(280),
            nights: 1,
        };
        TravelPlan::start(inputs, &PricingEngine::default(), now()).unwrap()
    }

    #[test]
    fn test_start_caches_cost() {
        let plan = plan();
        assert_eq!(plan.status, TravelStatus::Pending);
        assert_eq!(plan.cost.value(), dec!(980));
        assert_eq!(plan.history.len(), 1);
    }

    #[test]
    fn test_sequential_advance() {
        let mut plan = plan();
        plan.advance(TravelStatus::Booked, Some("PNR4521".into()), None, now())
            .unwrap();
        plan.advance(TravelStatus::InTransit, None, Some("boarded".into()), now())
            .unwrap();
        plan.advance(TravelStatus::Arrived, None, None, now()).unwrap();

        assert_eq!(plan.status, TravelStatus::Arrived);
        assert_eq!(plan.booking_reference.as_deref(), Some("PNR4521"));
        assert_eq!(plan.notes.as_deref(), Some("boarded"));
        assert_eq!(plan.history.len(), 4);
        assert!(plan.status.is_terminal());
    }

    #[test]
    fn test_skip_rejected_without_change() {
        let mut plan = plan();
        let before = plan.clone();
        let err = plan
            .advance(TravelStatus::Arrived, None, None, now())
            .unwrap_err();
        assert!(matches!(
            err,
            BookingError::TravelSequenceViolation {
                from: TravelStatus::Pending,
                to: TravelStatus::Arrived
            }
        ));
        assert_eq!(plan, before);

        assert!(matches!(
            plan.advance(TravelStatus::InTransit, None, None, now()),
            Err(BookingError::TravelSequenceViolation { .. })
        ));
        assert!(matches!(
            plan.advance(TravelStatus::Pending, None, None, now()),
            Err(BookingError::TravelSequenceViolation { .. })
        ));
    }

    #[test]
    fn test_update_inputs_recomputes_cost() {
        let mut plan = plan();
        let pricing = PricingEngine::default();
        plan.update_inputs(
            TravelInputs {
                mode: TravelMode::Flight,
                distance_km: dec!(280),
                nights: 2,
            },
            &pricing,
        )
        .unwrap();
        assert_eq!(plan.cost.value(), dec!(2240));
        assert_eq!(
            plan.cost,
            pricing.travel_cost(plan.mode, plan.distance_km).unwrap()
        );
        assert_eq!(plan.nights, 2);
    }

    #[test]
    fn test_update_inputs_after_booked_rejected() {
        let mut plan = plan();
        plan.advance(TravelStatus::Booked, None, None, now()).unwrap();
        let result = plan.update_inputs(
            TravelInputs {
                mode: TravelMode::Car,
                distance_km: dec!(10),
                nights: 0,
            },
            &PricingEngine::default(),
        );
        assert!(matches!(result, Err(BookingError::InvalidTransition(_))));
        assert_eq!(plan.cost.value(), dec!(980));
    }

    #[test]
    fn test_invalid_inputs_leave_cost_unchanged() {
        let mut plan = plan();
        let result = plan.update_inputs(
            TravelInputs {
                mode: TravelMode::Car,
                distance_km: dec!(-3),
                nights: 0,
            },
            &PricingEngine::default(),
        );
        assert!(matches!(result, Err(BookingError::InvalidPricingInput(_))));
        assert_eq!(plan.mode, TravelMode::Train);
        assert_eq!(plan.cost.value(), dec!(980));
    }

    #[test]
    fn test_closed_plan_is_immutable() {
        let mut plan = plan();
        plan.close();
        assert!(matches!(
            plan.advance(TravelStatus::Booked, None, None, now()),
            Err(BookingError::InvalidTransition(_))
        ));
    }
}

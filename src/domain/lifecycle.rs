//! The booking state machine.
//!
//! Transitions are pure: each one validates against a copy of the aggregate
//! and returns the new aggregate with the notifications it implies. A failed
//! guard returns an error and the caller's aggregate is untouched.

use super::booking::{
    Actor, Booking, BookingAggregate, BookingStatus, PanditId, PaymentStatus,
};
use super::cancellation;
use super::command::{Command, NewBooking};
use super::money::Money;
use super::notification::{EventKind, Notification, Recipient};
use super::pricing::{PricingEngine, PricingInput, TravelInputs};
use super::travel::{TravelPlan, TravelStatus};
use crate::config::{EngineConfig, MAX_ACCEPT_WINDOW_SECS};
use crate::error::{BookingError, Result};
use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use serde_json::json;

/// Result of a successful command.
#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    pub aggregate: BookingAggregate,
    pub notifications: Vec<Notification>,
}

#[derive(Debug, Clone)]
pub struct BookingLifecycle {
    pricing: PricingEngine,
    accept_window: Duration,
    travel_threshold_km: Decimal,
}

impl BookingLifecycle {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            pricing: PricingEngine::new(config.pricing.clone()),
            // Unvalidated configs are clamped rather than allowed to overflow.
            accept_window: Duration::seconds(
                config.accept_window_secs.clamp(0, MAX_ACCEPT_WINDOW_SECS),
            ),
            travel_threshold_km: config.travel_threshold_km,
        }
    }

    pub fn pricing(&self) -> &PricingEngine {
        &self.pricing
    }

    /// Last instant at which the offered pandit may still answer.
    pub fn accept_deadline(&self, booking: &Booking) -> DateTime<Utc> {
        booking.created_at + self.accept_window
    }

    /// Builds a `Created` booking and its initial price.
    pub fn create(&self, new: NewBooking) -> Result<Transition> {
        if new.travel.distance_km < Decimal::ZERO {
            return Err(BookingError::pricing(format!(
                "distance must not be negative, got {}",
                new.travel.distance_km
            )));
        }
        if new.travel.nights < 0 {
            return Err(BookingError::pricing(format!(
                "nights must not be negative, got {}",
                new.travel.nights
            )));
        }
        let travel_required = new.travel.distance_km > self.travel_threshold_km;
        let pricing = self.pricing.quote(&PricingInput {
            dakshina: new.selection.dakshina,
            samagri_cost: new.selection.samagri_cost,
            travel: travel_required.then_some(new.travel),
            food_selected: new.selection.food_selected,
            stay_selected: new.selection.stay_selected,
        })?;

        let booking = Booking {
            id: new.id,
            number: Booking::number_for(new.id, new.event_at),
            customer: new.customer,
            offered_pandit: new.pandit,
            pandit: None,
            event_type: new.event_type,
            muhurat: new.muhurat,
            event_at: new.event_at,
            venue: new.venue,
            pandit_base: new.pandit_base,
            status: BookingStatus::Created,
            travel_required,
            requested_travel: new.travel,
            selection: new.selection,
            grand_total: pricing.grand_total,
            payment_status: if new.paid {
                PaymentStatus::Paid
            } else {
                PaymentStatus::Pending
            },
            cancellation: None,
            settled_payout: None,
            created_at: new.at,
            updated_at: new.at,
            version: 0,
        };
        let aggregate = BookingAggregate {
            booking,
            travel: None,
            pricing,
        };

        let deadline = self.accept_deadline(&aggregate.booking);
        let notifications = vec![Notification::new(
            Recipient::Pandit,
            aggregate.id(),
            EventKind::BookingOffered,
            json!({
                "number": aggregate.booking.number,
                "pandit": new.pandit.0,
                "respond_by": deadline,
                "travel_required": travel_required,
            }),
        )];
        Ok(Transition {
            aggregate,
            notifications,
        })
    }

    /// Applies a command to an existing booking.
    pub fn apply(&self, current: &BookingAggregate, command: &Command) -> Result<Transition> {
        let mut next = current.clone();
        let notifications = match command {
            Command::Create(_) => {
                return Err(BookingError::transition(format!(
                    "booking {} already exists",
                    current.id()
                )));
            }
            Command::Accept { actor, at, .. } => self.accept(&mut next, *actor, *at)?,
            Command::Reject { actor, at, .. } => self.reject(&mut next, *actor, *at)?,
            Command::Expire { actor, at, .. } => self.expire(&mut next, *actor, *at)?,
            Command::UpdateTravelStatus {
                actor,
                status,
                reference,
                notes,
                at,
                ..
            } => self.update_travel_status(
                &mut next,
                *actor,
                *status,
                reference.clone(),
                notes.clone(),
                *at,
            )?,
            Command::UpdateTravelInputs {
                actor,
                mode,
                distance_km,
                nights,
                food_selected,
                stay_selected,
                ..
            } => self.update_travel_inputs(
                &mut next,
                *actor,
                TravelInputs {
                    mode: *mode,
                    distance_km: *distance_km,
                    nights: *nights,
                },
                *food_selected,
                *stay_selected,
            )?,
            Command::StartService { actor, at, .. } => self.start_service(&mut next, *actor, *at)?,
            Command::MarkCompleted { actor, at, .. } => self.mark_completed(&mut next, *actor, *at)?,
            Command::RequestCancellation { actor, at, .. } => {
                self.request_cancellation(&mut next, *actor, *at)?
            }
        };

        next.booking.updated_at = command.at();
        Ok(Transition {
            aggregate: next,
            notifications,
        })
    }

    fn accept(
        &self,
        agg: &mut BookingAggregate,
        actor: Actor,
        at: DateTime<Utc>,
    ) -> Result<Vec<Notification>> {
        expect_status(agg, &[BookingStatus::Created], "accept")?;
        let pandit = offered_pandit(agg, actor)?;
        let deadline = self.accept_deadline(&agg.booking);
        if at > deadline {
            return Err(BookingError::WindowExpired { deadline });
        }

        agg.booking.status = BookingStatus::Confirmed;
        agg.booking.pandit = Some(pandit);

        let mut notifications = vec![Notification::new(
            Recipient::Customer,
            agg.id(),
            EventKind::BookingConfirmed,
            json!({ "number": agg.booking.number, "pandit": pandit.0 }),
        )];

        if agg.booking.travel_required {
            let plan = TravelPlan::start(agg.booking.requested_travel, &self.pricing, at)?;
            notifications.push(travel_notification(agg, Recipient::Admin, &plan));
            agg.travel = Some(plan);
            self.reprice(agg)?;
        }
        Ok(notifications)
    }

    fn reject(
        &self,
        agg: &mut BookingAggregate,
        actor: Actor,
        at: DateTime<Utc>,
    ) -> Result<Vec<Notification>> {
        expect_status(agg, &[BookingStatus::Created], "reject")?;
        offered_pandit(agg, actor)?;
        let deadline = self.accept_deadline(&agg.booking);
        if at > deadline {
            return Err(BookingError::WindowExpired { deadline });
        }
        agg.booking.status = BookingStatus::Expired;
        Ok(vec![expired_notification(agg, "rejected")])
    }

    fn expire(
        &self,
        agg: &mut BookingAggregate,
        actor: Actor,
        at: DateTime<Utc>,
    ) -> Result<Vec<Notification>> {
        expect_status(agg, &[BookingStatus::Created], "expire")?;
        if !matches!(actor, Actor::Scheduler | Actor::Admin) {
            return Err(BookingError::transition(format!(
                "{actor} may not expire bookings"
            )));
        }
        let deadline = self.accept_deadline(&agg.booking);
        if at <= deadline {
            return Err(BookingError::transition(format!(
                "accept window is open until {deadline}"
            )));
        }
        agg.booking.status = BookingStatus::Expired;
        Ok(vec![expired_notification(agg, "no_response")])
    }

    fn update_travel_status(
        &self,
        agg: &mut BookingAggregate,
        actor: Actor,
        status: TravelStatus,
        reference: Option<String>,
        notes: Option<String>,
        at: DateTime<Utc>,
    ) -> Result<Vec<Notification>> {
        expect_status(agg, &[BookingStatus::Confirmed], "update travel for")?;
        travel_operator(agg, actor)?;
        let plan = agg
            .travel
            .as_mut()
            .ok_or_else(|| BookingError::transition("travel is not required for this booking"))?;
        plan.advance(status, reference, notes, at)?;
        let plan = plan.clone();

        let mut notifications = vec![travel_notification(agg, Recipient::Customer, &plan)];
        if status == TravelStatus::Arrived {
            agg.booking.status = BookingStatus::PanditEnRoute;
            notifications.push(en_route_notification(agg));
        }
        Ok(notifications)
    }

    fn update_travel_inputs(
        &self,
        agg: &mut BookingAggregate,
        actor: Actor,
        inputs: TravelInputs,
        food_selected: bool,
        stay_selected: bool,
    ) -> Result<Vec<Notification>> {
        expect_status(agg, &[BookingStatus::Confirmed], "update travel for")?;
        travel_operator(agg, actor)?;
        let plan = agg
            .travel
            .as_mut()
            .ok_or_else(|| BookingError::transition("travel is not required for this booking"))?;
        plan.update_inputs(inputs, &self.pricing)?;
        agg.booking.selection.food_selected = food_selected;
        agg.booking.selection.stay_selected = stay_selected;
        self.reprice(agg)?;
        Ok(Vec::new())
    }

    fn start_service(
        &self,
        agg: &mut BookingAggregate,
        actor: Actor,
        at: DateTime<Utc>,
    ) -> Result<Vec<Notification>> {
        expect_status(agg, &[BookingStatus::Confirmed], "start service for")?;
        assigned_pandit(agg, actor)?;
        match agg.travel_status() {
            Some(TravelStatus::NotRequired) => {
                if at.date_naive() < agg.booking.event_at.date_naive() {
                    return Err(BookingError::transition(format!(
                        "service cannot start before {}",
                        agg.booking.event_at.date_naive()
                    )));
                }
            }
            Some(TravelStatus::Arrived) => {}
            other => {
                return Err(BookingError::transition(format!(
                    "travel must be arrived or not required, is {}",
                    other.map_or_else(|| "unplanned".to_string(), |s| s.to_string())
                )));
            }
        }
        agg.booking.status = BookingStatus::PanditEnRoute;
        Ok(vec![en_route_notification(agg)])
    }

    fn mark_completed(
        &self,
        agg: &mut BookingAggregate,
        actor: Actor,
        at: DateTime<Utc>,
    ) -> Result<Vec<Notification>> {
        expect_status(agg, &[BookingStatus::PanditEnRoute], "complete")?;
        let pandit = assigned_pandit(agg, actor)?;
        let event_date = agg.booking.event_at.date_naive();
        if event_date > at.date_naive() {
            return Err(BookingError::PrematureCompletion { event_date });
        }

        let payout = agg.pricing.payout();
        agg.booking.status = BookingStatus::Completed;
        agg.booking.settled_payout = Some(payout.clone());
        Ok(vec![
            Notification::new(
                Recipient::Customer,
                agg.id(),
                EventKind::BookingCompleted,
                json!({ "number": agg.booking.number, "review_requested": true }),
            ),
            Notification::new(
                Recipient::Pandit,
                agg.id(),
                EventKind::BookingCompleted,
                json!({ "pandit": pandit.0, "payout": payout }),
            ),
        ])
    }

    fn request_cancellation(
        &self,
        agg: &mut BookingAggregate,
        actor: Actor,
        at: DateTime<Utc>,
    ) -> Result<Vec<Notification>> {
        expect_status(
            agg,
            &[
                BookingStatus::Created,
                BookingStatus::Confirmed,
                BookingStatus::PanditEnRoute,
            ],
            "cancel",
        )?;
        if actor != Actor::Customer(agg.booking.customer) {
            return Err(BookingError::transition(format!(
                "{actor} may not cancel this booking"
            )));
        }

        let mut record = cancellation::evaluate(agg.booking.grand_total, agg.booking.event_at, at);
        agg.booking.status = BookingStatus::Cancelled;
        // Nothing was collected, so there is nothing to refund or retain.
        if agg.booking.payment_status == PaymentStatus::Paid {
            agg.booking.payment_status = if record.refund_amount.is_positive() {
                PaymentStatus::RefundDue
            } else {
                PaymentStatus::Retained
            };
        } else {
            record.refund_amount = Money::ZERO;
        }
        if let Some(plan) = agg.travel.as_mut() {
            plan.close();
        }

        let payload = json!({
            "number": agg.booking.number,
            "refund_percentage": record.refund_percentage,
            "refund_amount": record.refund_amount,
        });
        agg.booking.cancellation = Some(record);
        Ok(vec![
            Notification::new(
                Recipient::Customer,
                agg.id(),
                EventKind::BookingCancelled,
                payload.clone(),
            ),
            Notification::new(
                Recipient::Pandit,
                agg.id(),
                EventKind::BookingCancelled,
                payload,
            ),
        ])
    }

    /// Replaces the breakdown with a fresh quote from the current inputs.
    fn reprice(&self, agg: &mut BookingAggregate) -> Result<()> {
        let pricing = self.pricing.quote(&agg.pricing_input())?;
        agg.booking.grand_total = pricing.grand_total;
        agg.pricing = pricing;
        Ok(())
    }
}

fn expect_status(agg: &BookingAggregate, allowed: &[BookingStatus], action: &str) -> Result<()> {
    let status = agg.booking.status;
    if allowed.contains(&status) {
        Ok(())
    } else {
        Err(BookingError::transition(format!(
            "cannot {action} booking {} in status {status}",
            agg.id()
        )))
    }
}

fn offered_pandit(agg: &BookingAggregate, actor: Actor) -> Result<PanditId> {
    match actor {
        Actor::Pandit(id) if id == agg.booking.offered_pandit => Ok(id),
        other => Err(BookingError::transition(format!(
            "{other} is not the pandit this booking was offered to"
        ))),
    }
}

fn assigned_pandit(agg: &BookingAggregate, actor: Actor) -> Result<PanditId> {
    match actor {
        Actor::Pandit(id) if Some(id) == agg.booking.pandit => Ok(id),
        other => Err(BookingError::transition(format!(
            "{other} is not the pandit assigned to this booking"
        ))),
    }
}

fn travel_operator(agg: &BookingAggregate, actor: Actor) -> Result<()> {
    if actor == Actor::Admin {
        return Ok(());
    }
    assigned_pandit(agg, actor).map(|_| ())
}

fn travel_notification(agg: &BookingAggregate, recipient: Recipient, plan: &TravelPlan) -> Notification {
    Notification::new(
        recipient,
        agg.id(),
        EventKind::TravelStatusChanged,
        json!({
            "number": agg.booking.number,
            "status": plan.status,
            "mode": plan.mode,
            "reference": plan.booking_reference,
        }),
    )
}

fn expired_notification(agg: &BookingAggregate, reason: &str) -> Notification {
    Notification::new(
        Recipient::Customer,
        agg.id(),
        EventKind::BookingExpired,
        json!({ "number": agg.booking.number, "reason": reason }),
    )
}

fn en_route_notification(agg: &BookingAggregate) -> Notification {
    Notification::new(
        Recipient::Customer,
        agg.id(),
        EventKind::PanditEnRoute,
        json!({ "number": agg.booking.number }),
    )
}

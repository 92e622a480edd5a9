use crate::config::EngineConfig;
use crate::domain::booking::{BookingAggregate, BookingId};
use crate::domain::command::{Command, NewBooking};
use crate::domain::lifecycle::{BookingLifecycle, Transition};
use crate::domain::ports::Ports;
use crate::domain::pricing::{PayoutBreakdown, PricingBreakdown};
use crate::domain::travel::Itinerary;
use crate::error::{BookingError, Result};

/// Loads an aggregate, runs a transition and persists the outcome.
///
/// `BookingService` assumes it is the only writer for a given booking at a
/// time; the sharded `BookingEngine` provides that. A `Conflict` raised by
/// the store (another process wrote first) is answered by reloading and
/// reapplying the command, up to `max_conflict_retries` times.
pub struct BookingService {
    ports: Ports,
    lifecycle: BookingLifecycle,
    max_conflict_retries: u32,
}

impl BookingService {
    pub fn new(ports: Ports, config: &EngineConfig) -> Self {
        Self {
            ports,
            lifecycle: BookingLifecycle::new(config),
            max_conflict_retries: config.max_conflict_retries,
        }
    }

    pub fn lifecycle(&self) -> &BookingLifecycle {
        &self.lifecycle
    }

    /// Runs one command to completion. On error nothing has been written.
    pub async fn execute(&self, command: Command) -> Result<BookingAggregate> {
        let booking = command.booking_id();
        let name = command.name();
        let result = match command {
            Command::Create(new) => self.create(new).await,
            command => self.apply(command).await,
        };
        match &result {
            Ok(aggregate) => tracing::info!(
                %booking,
                command = name,
                status = %aggregate.booking.status,
                stage = %aggregate.stage(),
                "command applied"
            ),
            Err(e) => tracing::warn!(%booking, command = name, error = %e, "command rejected"),
        }
        result
    }

    async fn create(&self, new: NewBooking) -> Result<BookingAggregate> {
        match self.ports.store.load_booking(new.id).await {
            Ok(_) => {
                return Err(BookingError::transition(format!(
                    "booking {} already exists",
                    new.id
                )));
            }
            Err(BookingError::NotFound(_)) => {}
            Err(e) => return Err(e),
        }
        let transition = self.lifecycle.create(new)?;
        self.commit(transition).await
    }

    async fn apply(&self, command: Command) -> Result<BookingAggregate> {
        let mut attempt = 0;
        loop {
            let current = self.load(command.booking_id()).await?;
            let transition = self.lifecycle.apply(&current, &command)?;
            match self.commit(transition).await {
                Err(e) if e.is_retryable() && attempt < self.max_conflict_retries => {
                    attempt += 1;
                    tracing::warn!(
                        booking = %command.booking_id(),
                        attempt,
                        "write conflict, reloading"
                    );
                }
                result => return result,
            }
        }
    }

    /// Persists booking, plan and pricing in one atomic write, then notifies.
    async fn commit(&self, transition: Transition) -> Result<BookingAggregate> {
        let Transition {
            mut aggregate,
            notifications,
        } = transition;

        aggregate.booking.version = self.ports.store.save_aggregate(&aggregate).await?;

        for notification in notifications {
            self.ports.notifier.notify(notification);
        }
        Ok(aggregate)
    }

    pub async fn load(&self, id: BookingId) -> Result<BookingAggregate> {
        self.ports.store.load_aggregate(id).await
    }

    pub async fn pricing_breakdown(&self, id: BookingId) -> Result<PricingBreakdown> {
        self.ports.store.load_pricing(id).await
    }

    pub async fn payout_breakdown(&self, id: BookingId) -> Result<PayoutBreakdown> {
        Ok(self.pricing_breakdown(id).await?.payout())
    }

    /// `None` when the booking needs no travel or has not been confirmed yet.
    pub async fn itinerary(&self, id: BookingId) -> Result<Option<Itinerary>> {
        Ok(self.load(id).await?.itinerary())
    }

    pub async fn all(&self) -> Result<Vec<BookingAggregate>> {
        let bookings = self.ports.store.all_bookings().await?;
        let mut aggregates = Vec::with_capacity(bookings.len());
        for booking in bookings {
            aggregates.push(self.load(booking.id).await?);
        }
        Ok(aggregates)
    }
}

use crate::domain::booking::{Booking, BookingAggregate, BookingId};
use crate::domain::ports::{BookingStore, NotificationPortBox, Ports};
use crate::domain::pricing::PricingBreakdown;
use crate::domain::travel::TravelPlan;
use crate::error::{BookingError, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Default)]
struct Tables {
    bookings: HashMap<BookingId, Booking>,
    plans: HashMap<BookingId, TravelPlan>,
    pricing: HashMap<BookingId, PricingBreakdown>,
}

impl Tables {
    fn check_version(&self, booking: &Booking) -> Result<()> {
        let stored_version = self.bookings.get(&booking.id).map_or(0, |b| b.version);
        if stored_version != booking.version {
            tracing::debug!(
                booking = %booking.id,
                stored_version,
                attempted = booking.version,
                "stale booking write"
            );
            return Err(BookingError::Conflict(booking.id));
        }
        Ok(())
    }
}

/// A thread-safe in-memory store for bookings, travel plans and pricing.
///
/// All three tables sit behind one `Arc<RwLock<..>>`, so clones share the
/// same data and an aggregate is always read and written as a unit.
#[derive(Default, Clone)]
pub struct InMemoryBookingStore {
    tables: Arc<RwLock<Tables>>,
}

impl InMemoryBookingStore {
    /// Creates a new, empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl BookingStore for InMemoryBookingStore {
    async fn load_booking(&self, id: BookingId) -> Result<Booking> {
        let tables = self.tables.read().await;
        tables.bookings.get(&id).cloned().ok_or(BookingError::NotFound(id))
    }

    async fn save_booking(&self, mut booking: Booking) -> Result<u64> {
        let mut tables = self.tables.write().await;
        tables.check_version(&booking)?;
        booking.version += 1;
        let version = booking.version;
        tables.bookings.insert(booking.id, booking);
        Ok(version)
    }

    async fn load_travel_plan(&self, id: BookingId) -> Result<Option<TravelPlan>> {
        let tables = self.tables.read().await;
        Ok(tables.plans.get(&id).cloned())
    }

    async fn save_travel_plan(&self, id: BookingId, plan: TravelPlan) -> Result<()> {
        let mut tables = self.tables.write().await;
        tables.plans.insert(id, plan);
        Ok(())
    }

    async fn load_pricing(&self, id: BookingId) -> Result<PricingBreakdown> {
        let tables = self.tables.read().await;
        tables.pricing.get(&id).cloned().ok_or(BookingError::NotFound(id))
    }

    async fn save_pricing(&self, id: BookingId, pricing: PricingBreakdown) -> Result<()> {
        let mut tables = self.tables.write().await;
        tables.pricing.insert(id, pricing);
        Ok(())
    }

    async fn load_aggregate(&self, id: BookingId) -> Result<BookingAggregate> {
        let tables = self.tables.read().await;
        let booking = tables.bookings.get(&id).cloned().ok_or(BookingError::NotFound(id))?;
        let pricing = tables.pricing.get(&id).cloned().ok_or(BookingError::NotFound(id))?;
        Ok(BookingAggregate {
            booking,
            travel: tables.plans.get(&id).cloned(),
            pricing,
        })
    }

    async fn save_aggregate(&self, aggregate: &BookingAggregate) -> Result<u64> {
        let mut tables = self.tables.write().await;
        tables.check_version(&aggregate.booking)?;

        let id = aggregate.id();
        let mut booking = aggregate.booking.clone();
        booking.version += 1;
        let version = booking.version;
        tables.bookings.insert(id, booking);
        match &aggregate.travel {
            Some(plan) => tables.plans.insert(id, plan.clone()),
            None => tables.plans.remove(&id),
        };
        tables.pricing.insert(id, aggregate.pricing.clone());
        Ok(version)
    }

    async fn all_bookings(&self) -> Result<Vec<Booking>> {
        let tables = self.tables.read().await;
        let mut all: Vec<Booking> = tables.bookings.values().cloned().collect();
        all.sort_by_key(|b| b.id);
        Ok(all)
    }
}

/// Wires a fresh in-memory store to `notifier`.
pub fn in_memory_ports(notifier: NotificationPortBox) -> Ports {
    Ports {
        store: Box::new(InMemoryBookingStore::new()),
        notifier,
    }
}

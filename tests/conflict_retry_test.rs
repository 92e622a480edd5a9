use async_trait::async_trait;
use chrono::Duration;
use ritualbook::application::engine::BookingEngine;
use ritualbook::config::EngineConfig;
use ritualbook::domain::booking::{Booking, BookingAggregate, BookingId, BookingStatus};
use ritualbook::domain::ports::{BookingStore, Ports};
use ritualbook::domain::pricing::{PricingBreakdown, TravelMode};
use ritualbook::domain::command::Command;
use ritualbook::domain::travel::TravelPlan;
use ritualbook::error::{BookingError, Result};
use ritualbook::infrastructure::in_memory::InMemoryBookingStore;
use ritualbook::infrastructure::notifier::RecordingNotifier;
use rust_decimal_macros::dec;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

mod common;

/// Loses the next `pending` optimistic races, as if another process wrote first.
#[derive(Clone)]
struct ContendedBookingStore {
    inner: InMemoryBookingStore,
    pending: Arc<AtomicU32>,
    saves: Arc<AtomicU32>,
}

#[async_trait]
impl BookingStore for ContendedBookingStore {
    async fn load_booking(&self, id: BookingId) -> Result<Booking> {
        self.inner.load_booking(id).await
    }

    async fn save_booking(&self, booking: Booking) -> Result<u64> {
        self.inner.save_booking(booking).await
    }

    async fn load_travel_plan(&self, id: BookingId) -> Result<Option<TravelPlan>> {
        self.inner.load_travel_plan(id).await
    }

    async fn save_travel_plan(&self, id: BookingId, plan: TravelPlan) -> Result<()> {
        self.inner.save_travel_plan(id, plan).await
    }

    async fn load_pricing(&self, id: BookingId) -> Result<PricingBreakdown> {
        self.inner.load_pricing(id).await
    }

    async fn save_pricing(&self, id: BookingId, pricing: PricingBreakdown) -> Result<()> {
        self.inner.save_pricing(id, pricing).await
    }

    async fn load_aggregate(&self, id: BookingId) -> Result<BookingAggregate> {
        self.inner.load_aggregate(id).await
    }

    async fn save_aggregate(&self, aggregate: &BookingAggregate) -> Result<u64> {
        self.saves.fetch_add(1, Ordering::SeqCst);
        let lose = self
            .pending
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if lose {
            return Err(BookingError::Conflict(aggregate.id()));
        }
        self.inner.save_aggregate(aggregate).await
    }

    async fn all_bookings(&self) -> Result<Vec<Booking>> {
        self.inner.all_bookings().await
    }
}

async fn setup() -> (BookingEngine, ContendedBookingStore, RecordingNotifier) {
    let store = ContendedBookingStore {
        inner: InMemoryBookingStore::new(),
        pending: Arc::new(AtomicU32::new(0)),
        saves: Arc::new(AtomicU32::new(0)),
    };
    let notifier = RecordingNotifier::new();
    let ports = Ports {
        store: Box::new(store.clone()),
        notifier: Box::new(notifier.clone()),
    };
    let engine = BookingEngine::new(
        ports,
        &EngineConfig {
            max_conflict_retries: 3,
            ..EngineConfig::default()
        },
    );
    engine
        .execute(Command::Create(common::new_booking(
            1,
            TravelMode::Train,
            dec!(280),
            1,
        )))
        .await
        .unwrap();
    (engine, store, notifier)
}

#[tokio::test]
async fn test_conflicts_are_retried() {
    let (engine, store, notifier) = setup().await;
    store.pending.store(2, Ordering::SeqCst);
    store.saves.store(0, Ordering::SeqCst);

    let confirmed = engine
        .execute(common::accept(1, Duration::minutes(1)))
        .await
        .unwrap();
    assert_eq!(confirmed.booking.status, BookingStatus::Confirmed);
    assert_eq!(store.saves.load(Ordering::SeqCst), 3);
    // Offer plus one confirmation and one travel notice: nothing from the lost attempts.
    assert_eq!(notifier.sent().len(), 3);
}

#[tokio::test]
async fn test_retries_are_bounded() {
    let (engine, store, notifier) = setup().await;
    store.pending.store(10, Ordering::SeqCst);
    store.saves.store(0, Ordering::SeqCst);

    let result = engine.execute(common::accept(1, Duration::minutes(1))).await;
    assert!(matches!(result, Err(BookingError::Conflict(BookingId(1)))));
    // first attempt plus three retries
    assert_eq!(store.saves.load(Ordering::SeqCst), 4);

    let stored = engine.booking(BookingId(1)).await.unwrap();
    assert_eq!(stored.booking.status, BookingStatus::Created);
    assert!(stored.travel.is_none());
    assert_eq!(notifier.sent().len(), 1);
}

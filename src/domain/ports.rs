use super::booking::{Booking, BookingAggregate, BookingId};
use super::notification::Notification;
use super::pricing::PricingBreakdown;
use super::travel::TravelPlan;
use crate::error::Result;
use async_trait::async_trait;

/// Persistence for bookings and the records they own, keyed by booking id.
///
/// The engine reads and writes whole aggregates through `load_aggregate` and
/// `save_aggregate`; the per-record pairs exist for tooling and migrations.
#[async_trait]
pub trait BookingStore: Send + Sync {
    /// Fails with `NotFound` for an unknown id.
    async fn load_booking(&self, id: BookingId) -> Result<Booking>;
    /// Saves `booking` if the stored version still equals `booking.version`,
    /// returning the new version. A stale version fails with `Conflict`.
    async fn save_booking(&self, booking: Booking) -> Result<u64>;

    async fn load_travel_plan(&self, id: BookingId) -> Result<Option<TravelPlan>>;
    async fn save_travel_plan(&self, id: BookingId, plan: TravelPlan) -> Result<()>;

    /// Fails with `NotFound` for an unknown id.
    async fn load_pricing(&self, id: BookingId) -> Result<PricingBreakdown>;
    /// Replaces any previous breakdown.
    async fn save_pricing(&self, id: BookingId, pricing: PricingBreakdown) -> Result<()>;

    /// Booking, plan and pricing as of a single committed write.
    /// Fails with `NotFound` for an unknown id.
    async fn load_aggregate(&self, id: BookingId) -> Result<BookingAggregate>;
    /// Writes booking, plan and pricing together or not at all, under the
    /// same version check as `save_booking`. Returns the new version.
    async fn save_aggregate(&self, aggregate: &BookingAggregate) -> Result<u64>;

    /// Every stored booking, ordered by id.
    async fn all_bookings(&self) -> Result<Vec<Booking>>;
}

/// Fire-and-forget delivery of side effects. Retries and delivery guarantees
/// belong to the implementation.
pub trait NotificationPort: Send + Sync {
    fn notify(&self, notification: Notification);
}

pub type BookingStoreBox = Box<dyn BookingStore>;
pub type NotificationPortBox = Box<dyn NotificationPort>;

/// The collaborators the engine is wired to.
pub struct Ports {
    pub store: BookingStoreBox,
    pub notifier: NotificationPortBox,
}

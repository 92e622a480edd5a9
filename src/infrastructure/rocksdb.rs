use crate::domain::booking::{Booking, BookingAggregate, BookingId};
use crate::domain::ports::BookingStore;
use crate::domain::pricing::PricingBreakdown;
use crate::domain::travel::TravelPlan;
use crate::error::{BookingError, Result};
use async_trait::async_trait;
use rocksdb::{ColumnFamily, ColumnFamilyDescriptor, DB, Options, WriteBatch};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Column Family for booking records.
pub const CF_BOOKINGS: &str = "bookings";
/// Column Family for travel plans.
pub const CF_TRAVEL_PLANS: &str = "travel_plans";
/// Column Family for pricing snapshots.
pub const CF_PRICING: &str = "pricing";

/// A persistent store implementation using RocksDB.
///
/// Bookings, travel plans and pricing snapshots live in separate Column
/// Families, keyed by the big-endian booking id and stored as JSON. An
/// aggregate is written with a single `WriteBatch` spanning all three.
///
/// This struct is thread-safe (`Clone` shares the underlying `Arc<DB>`).
#[derive(Clone)]
pub struct RocksDBStore {
    db: Arc<DB>,
    // Serialises the read-compare-write of versioned saves.
    booking_writes: Arc<Mutex<()>>,
}

fn storage_error(message: String) -> BookingError {
    BookingError::Internal(Box::new(std::io::Error::other(message)))
}

fn encode<T: Serialize>(family: &str, value: &T) -> Result<Vec<u8>> {
    serde_json::to_vec(value)
        .map_err(|e| storage_error(format!("serialization error in {family}: {e}")))
}

impl RocksDBStore {
    /// Opens or creates a RocksDB instance at the specified path.
    ///
    /// Ensures that the required column families exist.
    ///
    /// # Arguments
    ///
    /// * `path` - The filesystem path where the database will be stored.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let families = [CF_BOOKINGS, CF_TRAVEL_PLANS, CF_PRICING]
            .into_iter()
            .map(|name| ColumnFamilyDescriptor::new(name, Options::default()));
        let db = DB::open_cf_descriptors(&opts, path, families)?;

        Ok(Self {
            db: Arc::new(db),
            booking_writes: Arc::new(Mutex::new(())),
        })
    }

    fn family(&self, name: &str) -> Result<&ColumnFamily> {
        self.db
            .cf_handle(name)
            .ok_or_else(|| storage_error(format!("{name} column family not found")))
    }

    fn get<T: DeserializeOwned>(&self, family: &str, id: BookingId) -> Result<Option<T>> {
        let cf = self.family(family)?;
        match self.db.get_pinned_cf(cf, id.0.to_be_bytes())? {
            Some(bytes) => serde_json::from_slice(&bytes)
                .map(Some)
                .map_err(|e| storage_error(format!("deserialization error in {family}: {e}"))),
            None => Ok(None),
        }
    }

    fn put<T: Serialize>(&self, family: &str, id: BookingId, value: &T) -> Result<()> {
        let cf = self.family(family)?;
        self.db.put_cf(cf, id.0.to_be_bytes(), encode(family, value)?)?;
        Ok(())
    }

    /// Fails with `Conflict` unless the stored version equals `booking.version`.
    fn check_version(&self, booking: &Booking) -> Result<()> {
        let stored: Option<Booking> = self.get(CF_BOOKINGS, booking.id)?;
        let stored_version = stored.map_or(0, |b| b.version);
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

#[async_trait]
impl BookingStore for RocksDBStore {
    async fn load_booking(&self, id: BookingId) -> Result<Booking> {
        self.get(CF_BOOKINGS, id)?.ok_or(BookingError::NotFound(id))
    }

    async fn save_booking(&self, mut booking: Booking) -> Result<u64> {
        let _guard = self.booking_writes.lock().await;
        self.check_version(&booking)?;
        booking.version += 1;
        self.put(CF_BOOKINGS, booking.id, &booking)?;
        Ok(booking.version)
    }

    async fn load_travel_plan(&self, id: BookingId) -> Result<Option<TravelPlan>> {
        self.get(CF_TRAVEL_PLANS, id)
    }

    async fn save_travel_plan(&self, id: BookingId, plan: TravelPlan) -> Result<()> {
        self.put(CF_TRAVEL_PLANS, id, &plan)
    }

    async fn load_pricing(&self, id: BookingId) -> Result<PricingBreakdown> {
        self.get(CF_PRICING, id)?.ok_or(BookingError::NotFound(id))
    }

    async fn save_pricing(&self, id: BookingId, pricing: PricingBreakdown) -> Result<()> {
        self.put(CF_PRICING, id, &pricing)
    }

    async fn load_aggregate(&self, id: BookingId) -> Result<BookingAggregate> {
        // Holding the write lock keeps a concurrent batch from landing between reads.
        let _guard = self.booking_writes.lock().await;
        let booking = self.get(CF_BOOKINGS, id)?.ok_or(BookingError::NotFound(id))?;
        let pricing = self.get(CF_PRICING, id)?.ok_or(BookingError::NotFound(id))?;
        Ok(BookingAggregate {
            booking,
            travel: self.get(CF_TRAVEL_PLANS, id)?,
            pricing,
        })
    }

    async fn save_aggregate(&self, aggregate: &BookingAggregate) -> Result<u64> {
        let _guard = self.booking_writes.lock().await;
        self.check_version(&aggregate.booking)?;

        let mut booking = aggregate.booking.clone();
        booking.version += 1;
        let key = booking.id.0.to_be_bytes();

        let mut batch = WriteBatch::default();
        batch.put_cf(self.family(CF_BOOKINGS)?, key, encode(CF_BOOKINGS, &booking)?);
        let plans = self.family(CF_TRAVEL_PLANS)?;
        match &aggregate.travel {
            Some(plan) => batch.put_cf(plans, key, encode(CF_TRAVEL_PLANS, plan)?),
            None => batch.delete_cf(plans, key),
        }
        batch.put_cf(
            self.family(CF_PRICING)?,
            key,
            encode(CF_PRICING, &aggregate.pricing)?,
        );
        self.db.write(batch)?;
        Ok(booking.version)
    }

    async fn all_bookings(&self) -> Result<Vec<Booking>> {
        let handle = self.family(CF_BOOKINGS)?;

        // Big-endian keys iterate in id order.
        let mut bookings = Vec::new();
        for item in self.db.iterator_cf(handle, rocksdb::IteratorMode::Start) {
            let (_key, value) =
                item.map_err(|e| storage_error(format!("RocksDB iteration error: {e}")))?;
            let booking: Booking = serde_json::from_slice(&value)
                .map_err(|e| storage_error(format!("failed to deserialize booking: {e}")))?;
            bookings.push(booking);
        }
        Ok(bookings)
    }
}

use super::service::BookingService;
use crate::config::EngineConfig;
use crate::domain::booking::{BookingAggregate, BookingId};
use crate::domain::command::Command;
use crate::domain::ports::Ports;
use crate::domain::pricing::{PayoutBreakdown, PricingBreakdown};
use crate::domain::travel::Itinerary;
use crate::error::{BookingError, Result};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

const SHARD_QUEUE_DEPTH: usize = 64;

struct Envelope {
    command: Command,
    reply: oneshot::Sender<Result<BookingAggregate>>,
}

/// The main entry point for booking commands.
///
/// Commands are routed to one of N shard workers by `booking_id % N`. Each
/// worker drains its queue one command at a time, so every booking has a
/// single writer while different bookings proceed in parallel. Queries are
/// pure reads and bypass the shards.
///
/// Must be created inside a tokio runtime.
pub struct BookingEngine {
    service: Arc<BookingService>,
    shards: Vec<mpsc::Sender<Envelope>>,
    workers: Vec<JoinHandle<()>>,
}

impl BookingEngine {
    /// Creates a new `BookingEngine` and spawns `config.shards` workers.
    ///
    /// # Arguments
    ///
    /// * `ports` - Persistence stores and the notification sink.
    /// * `config` - Pricing, timing and sharding settings.
    pub fn new(ports: Ports, config: &EngineConfig) -> Self {
        let service = Arc::new(BookingService::new(ports, config));
        let shard_count = config.shards.max(1);
        let mut shards = Vec::with_capacity(shard_count);
        let mut workers = Vec::with_capacity(shard_count);
        for index in 0..shard_count {
            let (tx, rx) = mpsc::channel(SHARD_QUEUE_DEPTH);
            shards.push(tx);
            workers.push(tokio::spawn(run_shard(index, Arc::clone(&service), rx)));
        }
        Self {
            service,
            shards,
            workers,
        }
    }

    /// Submits a command and waits for its outcome.
    pub async fn execute(&self, command: Command) -> Result<BookingAggregate> {
        let shard = (command.booking_id().0 % self.shards.len() as u64) as usize;
        let (reply, outcome) = oneshot::channel();
        self.shards[shard]
            .send(Envelope { command, reply })
            .await
            .map_err(|_| internal("shard worker stopped"))?;
        outcome
            .await
            .map_err(|_| internal("shard worker dropped the reply"))?
    }

    pub async fn booking(&self, id: BookingId) -> Result<BookingAggregate> {
        self.service.load(id).await
    }

    pub async fn pricing_breakdown(&self, id: BookingId) -> Result<PricingBreakdown> {
        self.service.pricing_breakdown(id).await
    }

    pub async fn payout_breakdown(&self, id: BookingId) -> Result<PayoutBreakdown> {
        self.service.payout_breakdown(id).await
    }

    pub async fn itinerary(&self, id: BookingId) -> Result<Option<Itinerary>> {
        self.service.itinerary(id).await
    }

    /// Stops accepting commands, waits for queued ones to finish and returns
    /// every stored booking.
    pub async fn shutdown(self) -> Result<Vec<BookingAggregate>> {
        drop(self.shards);
        for worker in self.workers {
            worker
                .await
                .map_err(|e| BookingError::Internal(Box::new(e)))?;
        }
        self.service.all().await
    }
}

async fn run_shard(index: usize, service: Arc<BookingService>, mut inbox: mpsc::Receiver<Envelope>) {
    tracing::debug!(shard = index, "shard started");
    while let Some(Envelope { command, reply }) = inbox.recv().await {
        let outcome = service.execute(command).await;
        // The caller may have stopped waiting; the command has still been applied.
        let _ = reply.send(outcome);
    }
    tracing::debug!(shard = index, "shard stopped");
}

fn internal(message: &str) -> BookingError {
    BookingError::Internal(Box::new(std::io::Error::other(message.to_string())))
}

use crate::domain::booking::BookingAggregate;
use crate::error::Result;
use serde::Serialize;
use std::io::Write;

/// One output row: where a booking ended up and what it is worth.
#[derive(Debug, Serialize, PartialEq)]
pub struct BookingSummary {
    pub booking: u64,
    pub number: String,
    pub status: String,
    pub stage: String,
    pub travel_status: String,
    pub grand_total: String,
    pub net_payout: String,
    pub refund_amount: Option<String>,
    pub payment_status: String,
}

impl From<&BookingAggregate> for BookingSummary {
    fn from(aggregate: &BookingAggregate) -> Self {
        let booking = &aggregate.booking;
        Self {
            booking: booking.id.0,
            number: booking.number.clone(),
            status: booking.status.to_string(),
            stage: aggregate.stage().to_string(),
            travel_status: aggregate
                .travel_status()
                .map(|status| status.to_string())
                .unwrap_or_default(),
            grand_total: aggregate.pricing.grand_total.to_string(),
            net_payout: aggregate.pricing.net_payout.to_string(),
            refund_amount: booking
                .cancellation
                .as_ref()
                .map(|record| record.refund_amount.to_string()),
            payment_status: booking.payment_status.to_string(),
        }
    }
}

/// Writes booking summaries to a CSV sink.
pub struct BookingWriter<W: Write> {
    writer: csv::Writer<W>,
}

impl<W: Write> BookingWriter<W> {
    pub fn new(sink: W) -> Self {
        Self {
            writer: csv::Writer::from_writer(sink),
        }
    }

    /// Writes one row per aggregate, in the order given, then flushes.
    pub fn write_bookings<I>(&mut self, aggregates: I) -> Result<()>
    where
        I: IntoIterator<Item = BookingAggregate>,
    {
        let mut wrote_any = false;
        for aggregate in aggregates {
            self.writer.serialize(BookingSummary::from(&aggregate))?;
            wrote_any = true;
        }
        if !wrote_any {
            // serde only emits the header alongside the first record.
            self.writer.write_record([
                "booking",
                "number",
                "status",
                "stage",
                "travel_status",
                "grand_total",
                "net_payout",
                "refund_amount",
                "payment_status",
            ])?;
        }
        self.writer.flush()?;
        Ok(())
    }
}

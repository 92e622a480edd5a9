#![allow(dead_code)]

use chrono::{DateTime, Duration, TimeZone, Utc};
use ritualbook::application::engine::BookingEngine;
use ritualbook::config::EngineConfig;
use ritualbook::domain::booking::{Actor, BookingId, CustomerId, PanditId, ServiceSelection};
use ritualbook::domain::command::{Command, NewBooking};
use ritualbook::domain::pricing::{TravelInputs, TravelMode};
use ritualbook::infrastructure::in_memory::in_memory_ports;
use ritualbook::infrastructure::notifier::RecordingNotifier;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::fs::File;
use std::io::Error;
use std::path::Path;

pub const CUSTOMER: Actor = Actor::Customer(CustomerId(21));
pub const PANDIT: Actor = Actor::Pandit(PanditId(8));

pub const HEADER: [&str; 22] = [
    "command",
    "booking",
    "role",
    "actor",
    "at",
    "event_type",
    "muhurat",
    "event_at",
    "venue",
    "pandit_base",
    "pandit",
    "dakshina",
    "samagri",
    "mode",
    "distance",
    "nights",
    "food",
    "stay",
    "paid",
    "travel_status",
    "reference",
    "notes",
];

/// Booking creation time used throughout the tests.
pub fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 11, 1, 10, 0, 0).unwrap()
}

/// Ten days after `t0`, early morning.
pub fn event_at() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 11, 11, 6, 0, 0).unwrap()
}

pub fn engine() -> (BookingEngine, RecordingNotifier) {
    engine_with(EngineConfig::default())
}

pub fn engine_with(config: EngineConfig) -> (BookingEngine, RecordingNotifier) {
    let notifier = RecordingNotifier::new();
    let engine = BookingEngine::new(in_memory_ports(Box::new(notifier.clone())), &config);
    (engine, notifier)
}

/// A paid booking; travel is required when `distance_km` exceeds 25.
pub fn new_booking(id: u64, mode: TravelMode, distance_km: Decimal, nights: i32) -> NewBooking {
    NewBooking {
        id: BookingId(id),
        customer: CustomerId(21),
        pandit: PanditId(8),
        event_type: "Griha Pravesh".to_string(),
        muhurat: Some("06:15-07:45".to_string()),
        event_at: event_at(),
        venue: "Pune".to_string(),
        pandit_base: "Nagpur".to_string(),
        selection: ServiceSelection {
            dakshina: dec!(21000),
            samagri_cost: dec!(4000),
            food_selected: true,
            stay_selected: true,
        },
        travel: TravelInputs {
            mode,
            distance_km,
            nights,
        },
        paid: true,
        at: t0(),
    }
}

pub fn accept(id: u64, after: Duration) -> Command {
    Command::Accept {
        booking: BookingId(id),
        actor: PANDIT,
        at: t0() + after,
    }
}

pub fn cancel(id: u64, at: DateTime<Utc>) -> Command {
    Command::RequestCancellation {
        booking: BookingId(id),
        actor: CUSTOMER,
        at,
    }
}

/// Writes `count` local bookings, each created and then accepted.
pub fn generate_commands_csv(path: &Path, count: u64) -> Result<(), Error> {
    let file = File::create(path)?;
    let mut wtr = csv::WriterBuilder::new().flexible(true).from_writer(file);
    wtr.write_record(HEADER)?;

    for id in 1..=count {
        let id = id.to_string();
        wtr.write_record([
            "create",
            &id,
            "customer",
            "21",
            "2026-11-01T10:00:00Z",
            "Satyanarayan Katha",
            "",
            "2026-11-11T06:00:00Z",
            "Pune",
            "Pune",
            "8",
            "5100",
            "900",
            "car",
            "6",
            "0",
            "false",
            "false",
            "true",
            "",
            "",
            "",
        ])?;
        wtr.write_record(["accept", &id, "pandit", "8", "2026-11-01T10:02:00Z"])?;
    }

    wtr.flush()?;
    Ok(())
}

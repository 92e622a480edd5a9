use crate::domain::booking::{Actor, BookingId, CustomerId, PanditId, ServiceSelection};
use crate::domain::command::{Command, NewBooking};
use crate::domain::pricing::{TravelInputs, TravelMode};
use crate::domain::travel::TravelStatus;
use crate::error::{BookingError, Result};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::io::Read;

#[derive(Debug, Deserialize, PartialEq, Clone, Copy)]
#[serde(rename_all = "snake_case")]
pub enum CommandKind {
    Create,
    Accept,
    Reject,
    Expire,
    TravelStatus,
    TravelInputs,
    StartService,
    Complete,
    Cancel,
}

#[derive(Debug, Deserialize, PartialEq, Clone, Copy)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Customer,
    Pandit,
    Admin,
    Scheduler,
}

/// One row of the command stream. Which columns are required depends on
/// `command`; everything else may be left empty.
#[derive(Debug, Deserialize, PartialEq, Clone)]
pub struct CommandRecord {
    pub command: CommandKind,
    pub booking: u64,
    pub role: Role,
    pub actor: Option<u32>,
    pub at: DateTime<Utc>,
    pub event_type: Option<String>,
    pub muhurat: Option<String>,
    pub event_at: Option<DateTime<Utc>>,
    pub venue: Option<String>,
    pub pandit_base: Option<String>,
    pub pandit: Option<u32>,
    pub dakshina: Option<Decimal>,
    pub samagri: Option<Decimal>,
    pub mode: Option<TravelMode>,
    pub distance: Option<Decimal>,
    pub nights: Option<i32>,
    pub food: Option<bool>,
    pub stay: Option<bool>,
    pub paid: Option<bool>,
    pub travel_status: Option<TravelStatus>,
    pub reference: Option<String>,
    pub notes: Option<String>,
}

fn required<T>(value: Option<T>, column: &str, command: CommandKind) -> Result<T> {
    value.ok_or_else(|| {
        BookingError::transition(format!("column `{column}` is required for {command:?}"))
    })
}

fn required_price<T>(value: Option<T>, column: &str) -> Result<T> {
    value.ok_or_else(|| BookingError::pricing(format!("column `{column}` is required")))
}

impl CommandRecord {
    fn actor(&self) -> Result<Actor> {
        match self.role {
            Role::Customer => Ok(Actor::Customer(CustomerId(required(
                self.actor,
                "actor",
                self.command,
            )?))),
            Role::Pandit => Ok(Actor::Pandit(PanditId(required(
                self.actor,
                "actor",
                self.command,
            )?))),
            Role::Admin => Ok(Actor::Admin),
            Role::Scheduler => Ok(Actor::Scheduler),
        }
    }
}

impl TryFrom<CommandRecord> for Command {
    type Error = BookingError;

    /// Missing columns fail fast. Only the `food` and `stay` flags have a
    /// default: empty reads as "not selected".
    fn try_from(record: CommandRecord) -> Result<Self> {
        let booking = BookingId(record.booking);
        let actor = record.actor()?;
        let at = record.at;
        let kind = record.command;

        let command = match kind {
            CommandKind::Create => {
                let Actor::Customer(customer) = actor else {
                    return Err(BookingError::transition("only customers create bookings"));
                };
                Command::Create(NewBooking {
                    id: booking,
                    customer,
                    pandit: PanditId(required(record.pandit, "pandit", kind)?),
                    event_type: required(record.event_type, "event_type", kind)?,
                    muhurat: record.muhurat,
                    event_at: required(record.event_at, "event_at", kind)?,
                    venue: required(record.venue, "venue", kind)?,
                    pandit_base: required(record.pandit_base, "pandit_base", kind)?,
                    selection: ServiceSelection {
                        dakshina: required_price(record.dakshina, "dakshina")?,
                        samagri_cost: required_price(record.samagri, "samagri")?,
                        food_selected: record.food.unwrap_or(false),
                        stay_selected: record.stay.unwrap_or(false),
                    },
                    travel: TravelInputs {
                        mode: required_price(record.mode, "mode")?,
                        distance_km: required_price(record.distance, "distance")?,
                        nights: required_price(record.nights, "nights")?,
                    },
                    paid: required(record.paid, "paid", kind)?,
                    at,
                })
            }
            CommandKind::Accept => Command::Accept { booking, actor, at },
            CommandKind::Reject => Command::Reject { booking, actor, at },
            CommandKind::Expire => Command::Expire { booking, actor, at },
            CommandKind::TravelStatus => Command::UpdateTravelStatus {
                booking,
                actor,
                status: required(record.travel_status, "travel_status", kind)?,
                reference: record.reference,
                notes: record.notes,
                at,
            },
            CommandKind::TravelInputs => Command::UpdateTravelInputs {
                booking,
                actor,
                mode: required_price(record.mode, "mode")?,
                distance_km: required_price(record.distance, "distance")?,
                nights: required_price(record.nights, "nights")?,
                food_selected: record.food.unwrap_or(false),
                stay_selected: record.stay.unwrap_or(false),
                at,
            },
            CommandKind::StartService => Command::StartService { booking, actor, at },
            CommandKind::Complete => Command::MarkCompleted { booking, actor, at },
            CommandKind::Cancel => Command::RequestCancellation { booking, actor, at },
        };
        Ok(command)
    }
}

/// Reads commands from a CSV source.
///
/// This reader wraps `csv::Reader` and provides an iterator over `Result<Command>`.
/// It handles whitespace trimming and flexible record lengths automatically.
pub struct CommandReader<R: Read> {
    reader: csv::Reader<R>,
}

impl<R: Read> CommandReader<R> {
    /// Creates a new `CommandReader` from any `Read` source (e.g., File, Stdin).
    pub fn new(source: R) -> Self {
        let reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(source);
        Self { reader }
    }

    /// Lazily reads, deserializes and validates commands, one per row.
    pub fn commands(self) -> impl Iterator<Item = Result<Command>> {
        self.reader.into_deserialize().map(|result| {
            let record: CommandRecord = result.map_err(BookingError::from)?;
            Command::try_from(record)
        })
    }
}

use chrono::Duration;
use ritualbook::domain::booking::{Actor, BookingId, BookingStatus, PanditId};
use ritualbook::domain::command::Command;
use ritualbook::domain::money::Money;
use ritualbook::domain::pricing::TravelMode;
use ritualbook::domain::travel::TravelStatus;
use ritualbook::error::BookingError;
use rust_decimal_macros::dec;

mod common;

async fn created_engine(id: u64) -> ritualbook::application::engine::BookingEngine {
    let (engine, _) = common::engine();
    engine
        .execute(Command::Create(common::new_booking(
            id,
            TravelMode::Train,
            dec!(280),
            1,
        )))
        .await
        .unwrap();
    engine
}

#[tokio::test]
async fn test_accept_at_four_fifty_nine() {
    let engine = created_engine(1).await;
    let confirmed = engine
        .execute(common::accept(1, Duration::seconds(299)))
        .await
        .unwrap();
    assert_eq!(confirmed.booking.status, BookingStatus::Confirmed);
}

#[tokio::test]
async fn test_accept_at_exactly_five_minutes() {
    let engine = created_engine(1).await;
    assert!(engine
        .execute(common::accept(1, Duration::seconds(300)))
        .await
        .is_ok());
}

#[tokio::test]
async fn test_accept_at_five_oh_one_expires() {
    let engine = created_engine(1).await;
    let result = engine.execute(common::accept(1, Duration::seconds(301))).await;
    assert!(matches!(
        result,
        Err(BookingError::WindowExpired { deadline }) if deadline == common::t0() + Duration::minutes(5)
    ));
    assert_eq!(
        engine.booking(BookingId(1)).await.unwrap().booking.status,
        BookingStatus::Created
    );
}

#[tokio::test]
async fn test_scheduler_expiry_only_after_window() {
    let engine = created_engine(1).await;
    let early = Command::Expire {
        booking: BookingId(1),
        actor: Actor::Scheduler,
        at: common::t0() + Duration::seconds(300),
    };
    assert!(matches!(
        engine.execute(early).await,
        Err(BookingError::InvalidTransition(_))
    ));

    let expired = engine
        .execute(Command::Expire {
            booking: BookingId(1),
            actor: Actor::Scheduler,
            at: common::t0() + Duration::seconds(301),
        })
        .await
        .unwrap();
    assert_eq!(expired.booking.status, BookingStatus::Expired);
}

#[tokio::test]
async fn test_only_offered_pandit_may_accept() {
    let engine = created_engine(1).await;
    let stranger = Command::Accept {
        booking: BookingId(1),
        actor: Actor::Pandit(PanditId(99)),
        at: common::t0() + Duration::minutes(1),
    };
    assert!(matches!(
        engine.execute(stranger).await,
        Err(BookingError::InvalidTransition(_))
    ));
}

#[tokio::test]
async fn test_travel_cannot_skip_steps() {
    let engine = created_engine(1).await;
    engine.execute(common::accept(1, Duration::minutes(1))).await.unwrap();

    let skip = Command::UpdateTravelStatus {
        booking: BookingId(1),
        actor: Actor::Admin,
        status: TravelStatus::Arrived,
        reference: None,
        notes: None,
        at: common::t0() + Duration::hours(1),
    };
    assert!(matches!(
        engine.execute(skip).await,
        Err(BookingError::TravelSequenceViolation {
            from: TravelStatus::Pending,
            to: TravelStatus::Arrived
        })
    ));
    let plan = engine.booking(BookingId(1)).await.unwrap().travel.unwrap();
    assert_eq!(plan.status, TravelStatus::Pending);
    assert_eq!(plan.history.len(), 1);
}

#[tokio::test]
async fn test_refund_tiers_at_their_edges() {
    // grand total 33016 for this booking.
    let cases = [
        (Duration::hours(72) + Duration::seconds(1), dec!(100), dec!(33016)),
        (Duration::hours(72), dec!(90), dec!(29714)),
        (Duration::hours(48), dec!(90), dec!(29714)),
        (Duration::hours(48) - Duration::seconds(1), dec!(75), dec!(24762)),
        (Duration::hours(24), dec!(75), dec!(24762)),
        (Duration::hours(24) - Duration::seconds(1), dec!(0), dec!(0)),
    ];
    for (id, (before_event, percentage, amount)) in (1..).zip(cases) {
        let engine = created_engine(id).await;
        let cancelled = engine
            .execute(common::cancel(id, common::event_at() - before_event))
            .await
            .unwrap();
        let record = cancelled.booking.cancellation.unwrap();
        assert_eq!(record.refund_percentage, percentage, "case {id}");
        assert_eq!(record.refund_amount, Money::round(amount), "case {id}");
    }
}

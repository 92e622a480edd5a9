use super::money::Money;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

/// Written once, when a customer cancels. Never recomputed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CancellationRecord {
    pub cancelled_at: DateTime<Utc>,
    pub hours_before_event: Decimal,
    /// Whole percent, e.g. `90` for 90%.
    pub refund_percentage: Decimal,
    pub refund_amount: Money,
}

/// Refund schedule keyed on hours remaining before the event.
///
/// | hours before event | refund |
/// |---|---|
/// | more than 72 | 100% |
/// | 48 to 72 | 90% |
/// | 24 up to 48 | 75% |
/// | under 24 | 0% |
///
/// Exactly 72 hours out falls in the 90% tier.
pub fn refund_percentage(hours_before_event: Decimal) -> Decimal {
    if hours_before_event > dec!(72) {
        dec!(100)
    } else if hours_before_event >= dec!(48) {
        dec!(90)
    } else if hours_before_event >= dec!(24) {
        dec!(75)
    } else {
        Decimal::ZERO
    }
}

/// Fractional hours between `at` and `event_at`; negative once the event has started.
pub fn hours_before(event_at: DateTime<Utc>, at: DateTime<Utc>) -> Decimal {
    let seconds = (event_at - at).num_seconds();
    Decimal::from(seconds) / dec!(3600)
}

/// Evaluates the policy at the instant of cancellation.
pub fn evaluate(grand_total: Money, event_at: DateTime<Utc>, at: DateTime<Utc>) -> CancellationRecord {
    let hours_before_event = hours_before(event_at, at);
    let refund_percentage = refund_percentage(hours_before_event);
    CancellationRecord {
        cancelled_at: at,
        hours_before_event,
        refund_percentage,
        refund_amount: grand_total.apply_rate(refund_percentage / dec!(100)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    #[test]
    fn test_tier_boundaries() {
        assert_eq!(refund_percentage(dec!(96)), dec!(100));
        assert_eq!(refund_percentage(dec!(72.01)), dec!(100));
        assert_eq!(refund_percentage(dec!(72)), dec!(90));
        assert_eq!(refund_percentage(dec!(71.9)), dec!(90));
        assert_eq!(refund_percentage(dec!(48)), dec!(90));
        assert_eq!(refund_percentage(dec!(47.9)), dec!(75));
        assert_eq!(refund_percentage(dec!(24)), dec!(75));
        assert_eq!(refund_percentage(dec!(23.9)), dec!(0));
        assert_eq!(refund_percentage(dec!(-5)), dec!(0));
    }

    #[test]
    fn test_hours_before_is_fractional() {
        let event = Utc.with_ymd_and_hms(2026, 11, 10, 9, 0, 0).unwrap();
        let at = event - Duration::minutes(90);
        assert_eq!(hours_before(event, at), dec!(1.5));
    }

    #[test]
    fn test_evaluate_rounds_refund() {
        let event = Utc.with_ymd_and_hms(2026, 11, 10, 9, 0, 0).unwrap();
        let at = event - Duration::hours(30);
        let record = evaluate(Money::round(dec!(68441)), event, at);
        assert_eq!(record.refund_percentage, dec!(75));
        // 68441 * 0.75 = 51330.75
        assert_eq!(record.refund_amount.value(), dec!(51331));
        assert_eq!(record.hours_before_event, dec!(30));
        assert_eq!(record.cancelled_at, at);
    }
}

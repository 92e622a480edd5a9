//! Deterministic cost and payout formulas.
//!
//! Every intermediate figure is rounded to a whole unit as soon as it is
//! produced, so a breakdown can be re-added line by line and always matches
//! its totals.

use super::money::Money;
use crate::config::PricingConfig;
use crate::error::{BookingError, Result};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TravelMode {
    Car,
    Train,
    Bus,
    Flight,
}

impl fmt::Display for TravelMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TravelMode::Car => "car",
            TravelMode::Train => "train",
            TravelMode::Bus => "bus",
            TravelMode::Flight => "flight",
        };
        f.write_str(name)
    }
}

/// The travel-dependent part of a quote.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TravelInputs {
    pub mode: TravelMode,
    pub distance_km: Decimal,
    pub nights: i32,
}

/// Everything needed to price a booking.
///
/// `travel` is `None` when the pandit is local; no travel cost or
/// accommodation is charged in that case.
#[derive(Debug, Clone, PartialEq)]
pub struct PricingInput {
    pub dakshina: Decimal,
    pub samagri_cost: Decimal,
    pub travel: Option<TravelInputs>,
    pub food_selected: bool,
    pub stay_selected: bool,
}

/// Customer-facing cost breakdown, including the pandit's net payout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricingBreakdown {
    pub dakshina: Money,
    pub travel_cost: Money,
    pub food_allowance: Money,
    pub accommodation_cost: Money,
    pub samagri_cost: Money,
    pub subtotal: Money,
    pub tax: Money,
    pub grand_total: Money,
    pub platform_fee: Money,
    pub net_payout: Money,
}

impl PricingBreakdown {
    /// Pass-through components paid to the pandit in full.
    fn reimbursements(&self) -> Money {
        self.travel_cost + self.food_allowance + self.accommodation_cost + self.samagri_cost
    }

    /// The pandit-facing view of this breakdown.
    pub fn payout(&self) -> PayoutBreakdown {
        PayoutBreakdown {
            dakshina: self.dakshina,
            platform_fee: self.platform_fee,
            net_dakshina: self.dakshina - self.platform_fee,
            travel_cost: self.travel_cost,
            food_allowance: self.food_allowance,
            accommodation_cost: self.accommodation_cost,
            samagri_cost: self.samagri_cost,
            net_payout: self.net_payout,
        }
    }
}

/// What the pandit receives, line by line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayoutBreakdown {
    pub dakshina: Money,
    pub platform_fee: Money,
    pub net_dakshina: Money,
    pub travel_cost: Money,
    pub food_allowance: Money,
    pub accommodation_cost: Money,
    pub samagri_cost: Money,
    pub net_payout: Money,
}

/// Stateless calculator over a [`PricingConfig`].
#[derive(Debug, Clone, Default)]
pub struct PricingEngine {
    config: PricingConfig,
}

impl PricingEngine {
    pub fn new(config: PricingConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PricingConfig {
        &self.config
    }

    /// `round(distance * rate[mode])`. Nights never multiply travel cost.
    pub fn travel_cost(&self, mode: TravelMode, distance_km: Decimal) -> Result<Money> {
        if distance_km.is_sign_negative() && !distance_km.is_zero() {
            return Err(BookingError::pricing(format!(
                "distance must not be negative, got {distance_km}"
            )));
        }
        let rate = self
            .config
            .rates
            .get(&mode)
            .ok_or_else(|| BookingError::pricing(format!("no per-km rate for mode {mode}")))?;
        Ok(Money::round(distance_km * rate))
    }

    /// Validates the input and produces a full breakdown. Nothing is clamped:
    /// any negative figure is rejected.
    pub fn quote(&self, input: &PricingInput) -> Result<PricingBreakdown> {
        for (name, value) in [("dakshina", input.dakshina), ("samagri cost", input.samagri_cost)] {
            if value.is_sign_negative() && !value.is_zero() {
                return Err(BookingError::pricing(format!(
                    "{name} must not be negative, got {value}"
                )));
            }
        }

        let (travel_cost, nights) = match &input.travel {
            Some(travel) => {
                if travel.nights < 0 {
                    return Err(BookingError::pricing(format!(
                        "nights must not be negative, got {}",
                        travel.nights
                    )));
                }
                (self.travel_cost(travel.mode, travel.distance_km)?, travel.nights)
            }
            None => (Money::ZERO, 0),
        };

        let dakshina = Money::round(input.dakshina);
        let samagri_cost = Money::round(input.samagri_cost);
        let food_allowance = if input.food_selected {
            Money::round(self.config.food_daily_rate)
        } else {
            Money::ZERO
        };
        let accommodation_cost = if input.stay_selected {
            Money::round(Decimal::from(nights) * self.config.nightly_rate)
        } else {
            Money::ZERO
        };

        let subtotal = dakshina + travel_cost + food_allowance + accommodation_cost + samagri_cost;
        let tax = subtotal.apply_rate(self.config.tax_rate);
        let platform_fee = dakshina.apply_rate(self.config.platform_fee_rate);

        let mut breakdown = PricingBreakdown {
            dakshina,
            travel_cost,
            food_allowance,
            accommodation_cost,
            samagri_cost,
            subtotal,
            tax,
            grand_total: subtotal + tax,
            platform_fee,
            net_payout: Money::ZERO,
        };
        breakdown.net_payout = (dakshina - platform_fee) + breakdown.reimbursements();
        Ok(breakdown)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn input(travel: Option<TravelInputs>) -> PricingInput {
        PricingInput {
            dakshina: dec!(11000),
            samagri_cost: dec!(2500),
            travel,
            food_selected: true,
            stay_selected: true,
        }
    }

    #[test]
    fn test_per_km_rates() {
        let engine = PricingEngine::default();
        let flight = engine.travel_cost(TravelMode::Flight, dec!(280)).unwrap();
        let train = engine.travel_cost(TravelMode::Train, dec!(280)).unwrap();
        assert_eq!(flight.value(), dec!(2240));
        assert_eq!(train.value(), dec!(980));
    }

    #[test]
    fn test_reconciliation_scenario() {
        let config = PricingConfig {
            food_daily_rate: dec!(3000),
            ..PricingConfig::default()
        };
        let engine = PricingEngine::new(config);
        let breakdown = engine
            .quote(&PricingInput {
                dakshina: dec!(35000),
                samagri_cost: dec!(8000),
                travel: Some(TravelInputs {
                    mode: TravelMode::Car,
                    distance_km: dec!(1000),
                    nights: 0,
                }),
                food_selected: true,
                stay_selected: false,
            })
            .unwrap();

        assert_eq!(breakdown.travel_cost.value(), dec!(12000));
        assert_eq!(breakdown.platform_fee.value(), dec!(5250));
        assert_eq!(breakdown.net_payout.value(), dec!(52750));
        assert_eq!(breakdown.subtotal.value(), dec!(58000));
        assert_eq!(breakdown.tax.value(), dec!(10440));
        assert_eq!(breakdown.grand_total.value(), dec!(68440));
    }

    #[test]
    fn test_totals_sum_exactly() {
        let engine = PricingEngine::default();
        let b = engine
            .quote(&input(Some(TravelInputs {
                mode: TravelMode::Train,
                distance_km: dec!(333.3),
                nights: 2,
            })))
            .unwrap();

        assert_eq!(
            b.grand_total,
            b.dakshina + b.travel_cost + b.food_allowance + b.accommodation_cost + b.samagri_cost + b.tax
        );
        assert_eq!(b.net_payout, b.grand_total - b.tax - b.platform_fee);
        assert_eq!(b.accommodation_cost.value(), dec!(3000));
        // 333.3 * 3.5 = 1166.55
        assert_eq!(b.travel_cost.value(), dec!(1167));
    }

    #[test]
    fn test_nights_only_affect_accommodation() {
        let engine = PricingEngine::default();
        let one = engine
            .quote(&input(Some(TravelInputs {
                mode: TravelMode::Bus,
                distance_km: dec!(100),
                nights: 1,
            })))
            .unwrap();
        let three = engine
            .quote(&input(Some(TravelInputs {
                mode: TravelMode::Bus,
                distance_km: dec!(100),
                nights: 3,
            })))
            .unwrap();
        assert_eq!(one.travel_cost, three.travel_cost);
        assert_eq!(three.accommodation_cost.value(), dec!(4500));
    }

    #[test]
    fn test_local_booking_has_no_travel_or_stay() {
        let engine = PricingEngine::default();
        let b = engine.quote(&input(None)).unwrap();
        assert_eq!(b.travel_cost, Money::ZERO);
        assert_eq!(b.accommodation_cost, Money::ZERO);
        assert_eq!(b.food_allowance.value(), dec!(500));
    }

    #[test]
    fn test_negative_inputs_rejected() {
        let engine = PricingEngine::default();
        let negative_distance = input(Some(TravelInputs {
            mode: TravelMode::Car,
            distance_km: dec!(-1),
            nights: 0,
        }));
        assert!(matches!(
            engine.quote(&negative_distance),
            Err(BookingError::InvalidPricingInput(_))
        ));

        let negative_nights = input(Some(TravelInputs {
            mode: TravelMode::Car,
            distance_km: dec!(10),
            nights: -2,
        }));
        assert!(matches!(
            engine.quote(&negative_nights),
            Err(BookingError::InvalidPricingInput(_))
        ));

        let mut negative_dakshina = input(None);
        negative_dakshina.dakshina = dec!(-100);
        assert!(matches!(
            engine.quote(&negative_dakshina),
            Err(BookingError::InvalidPricingInput(_))
        ));
    }

    #[test]
    fn test_mode_missing_from_rate_table() {
        let mut config = PricingConfig::default();
        config.rates.remove(&TravelMode::Flight);
        let engine = PricingEngine::new(config);
        assert!(matches!(
            engine.travel_cost(TravelMode::Flight, dec!(10)),
            Err(BookingError::InvalidPricingInput(_))
        ));
    }

    #[test]
    fn test_payout_view() {
        let engine = PricingEngine::default();
        let b = engine.quote(&input(None)).unwrap();
        let payout = b.payout();
        assert_eq!(payout.platform_fee.value(), dec!(1650));
        assert_eq!(payout.net_dakshina.value(), dec!(9350));
        assert_eq!(payout.net_payout, b.net_payout);
        assert_eq!(payout.net_payout.value(), dec!(9350) + dec!(500) + dec!(2500));
    }
}

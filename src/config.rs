//! Engine configuration.
//!
//! Every field has a default, so an empty JSON object (or no config file at
//! all) yields the canonical rate card and timing rules.

use crate::domain::pricing::TravelMode;
use crate::error::{BookingError, Result};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Rates and fees used by the pricing engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PricingConfig {
    /// Currency units per kilometre, per travel mode.
    pub rates: BTreeMap<TravelMode, Decimal>,
    pub food_daily_rate: Decimal,
    pub nightly_rate: Decimal,
    /// Fraction of dakshina retained by the platform.
    pub platform_fee_rate: Decimal,
    pub tax_rate: Decimal,
}

impl Default for PricingConfig {
    fn default() -> Self {
        Self {
            rates: BTreeMap::from([
                (TravelMode::Car, dec!(12)),
                (TravelMode::Train, dec!(3.5)),
                (TravelMode::Bus, dec!(2)),
                (TravelMode::Flight, dec!(8)),
            ]),
            food_daily_rate: dec!(500),
            nightly_rate: dec!(1500),
            platform_fee_rate: dec!(0.15),
            tax_rate: dec!(0.18),
        }
    }
}

/// Longest accept window a configuration may ask for: one day.
pub const MAX_ACCEPT_WINDOW_SECS: i64 = 86_400;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub pricing: PricingConfig,
    /// How long a pandit has to accept or reject a new booking.
    pub accept_window_secs: i64,
    /// Distances above this many km between pandit base and venue require travel.
    pub travel_threshold_km: Decimal,
    pub shards: usize,
    pub max_conflict_retries: u32,
    pub log_level: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            pricing: PricingConfig::default(),
            accept_window_secs: 300,
            travel_threshold_km: dec!(25),
            shards: 8,
            max_conflict_retries: 3,
            log_level: "info".to_string(),
        }
    }
}

impl EngineConfig {
    /// Loads a JSON config file and validates it.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        let config: Self =
            serde_json::from_str(&raw).map_err(|e| BookingError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let pricing = &self.pricing;
        if let Some((mode, rate)) = pricing.rates.iter().find(|(_, r)| r.is_sign_negative()) {
            return Err(BookingError::Config(format!(
                "rate for {mode} must not be negative, got {rate}"
            )));
        }
        if pricing.food_daily_rate.is_sign_negative() || pricing.nightly_rate.is_sign_negative() {
            return Err(BookingError::Config(
                "food and accommodation rates must not be negative".to_string(),
            ));
        }
        for (name, rate) in [
            ("platform_fee_rate", pricing.platform_fee_rate),
            ("tax_rate", pricing.tax_rate),
        ] {
            if rate.is_sign_negative() || rate >= Decimal::ONE {
                return Err(BookingError::Config(format!(
                    "{name} must be in [0, 1), got {rate}"
                )));
            }
        }
        if self.accept_window_secs <= 0 || self.accept_window_secs > MAX_ACCEPT_WINDOW_SECS {
            return Err(BookingError::Config(format!(
                "accept_window_secs must be between 1 and {MAX_ACCEPT_WINDOW_SECS}, got {}",
                self.accept_window_secs
            )));
        }
        if self.shards == 0 {
            return Err(BookingError::Config("shards must be at least 1".to_string()));
        }
        if self.travel_threshold_km.is_sign_negative() {
            return Err(BookingError::Config(
                "travel_threshold_km must not be negative".to_string(),
            ));
        }
        Ok(())
    }
}

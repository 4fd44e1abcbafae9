//! Tariff model
//!
//! A tariff is the active pricing rule for one vehicle class. The fee
//! algorithm lives here as a pure function of elapsed time so it can be
//! tested exhaustively without any store.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::models::stay::VehicleClass;

/// Tariff entity
///
/// Exactly one active tariff per vehicle class is expected; resolution
/// fails loudly when zero or more than one is active for a class.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tariff {
    /// Unique identifier
    pub id: i32,

    /// Human-readable description (e.g. "Car - standard")
    pub description: Option<String>,

    /// Vehicle class this tariff applies to
    pub vehicle_class: VehicleClass,

    /// Charge per whole hour
    pub hourly_rate: Decimal,

    /// Charge per started sub-hour fraction
    pub fraction_rate: Decimal,

    /// Size of a sub-hour billing fraction in minutes
    pub fraction_minutes: i32,

    /// Maximum fee regardless of elapsed time; zero means uncapped
    pub daily_cap: Decimal,

    /// Minutes after entry during which no fee accrues (inclusive bound)
    pub grace_period_minutes: i32,

    /// Whether this tariff is currently in force
    pub is_active: bool,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,

    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

impl Tariff {
    /// Calculate the fee owed for an elapsed duration
    ///
    /// The algorithm:
    /// 1. elapsed within the grace period (inclusive) owes nothing;
    /// 2. whole hours are charged at `hourly_rate`;
    /// 3. a non-zero remainder is split into started fractions of
    ///    `fraction_minutes`, rounded up, each charged at `fraction_rate`;
    /// 4. a positive `daily_cap` bounds the total.
    ///
    /// Negative elapsed values owe nothing.
    pub fn fee_for_minutes(&self, elapsed_minutes: i64) -> Decimal {
        let elapsed = elapsed_minutes.max(0);
        if elapsed <= i64::from(self.grace_period_minutes) {
            return Decimal::ZERO;
        }

        let hours = elapsed / 60;
        let remainder = elapsed % 60;

        let mut total = Decimal::from(hours) * self.hourly_rate;
        if remainder > 0 {
            let fraction_size = i64::from(self.fraction_minutes.max(1));
            let fractions = (remainder + fraction_size - 1) / fraction_size;
            total += Decimal::from(fractions) * self.fraction_rate;
        }

        if self.daily_cap > Decimal::ZERO && total > self.daily_cap {
            total = self.daily_cap;
        }

        total
    }
}

impl Default for Tariff {
    fn default() -> Self {
        Self {
            id: 0,
            description: None,
            vehicle_class: VehicleClass::Car,
            hourly_rate: Decimal::ZERO,
            fraction_rate: Decimal::ZERO,
            fraction_minutes: 15,
            daily_cap: Decimal::ZERO,
            grace_period_minutes: 0,
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }
}

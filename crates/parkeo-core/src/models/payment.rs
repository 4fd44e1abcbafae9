//! Payment model
//!
//! One settlement event tied to a stay. A payment row exists only when the
//! exit charged a positive amount; zero-fee exits leave no trace here.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Payment entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Payment {
    /// Unique identifier, assigned by the store on save
    pub id: i64,

    /// The stay this payment settles
    pub stay_id: i32,

    /// Amount charged
    pub amount: Decimal,

    /// When the payment was taken
    pub paid_at: DateTime<Utc>,

    /// Free-form method tag (e.g. "cash", "card")
    pub method: String,

    /// Operator who took the payment
    pub operator_id: i32,
}

impl Payment {
    /// Create a new payment record for a stay
    ///
    /// The id is zero until the store assigns one.
    pub fn new(stay_id: i32, amount: Decimal, method: impl Into<String>, operator_id: i32) -> Self {
        Self {
            id: 0,
            stay_id,
            amount,
            paid_at: Utc::now(),
            method: method.into(),
            operator_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_new_payment() {
        let payment = Payment::new(42, dec!(3500), "cash", 7);

        assert_eq!(payment.id, 0);
        assert_eq!(payment.stay_id, 42);
        assert_eq!(payment.amount, dec!(3500));
        assert_eq!(payment.method, "cash");
        assert_eq!(payment.operator_id, 7);
    }
}

//! Payment repository implementation
//!
//! The insert itself is shared with the stay repository so that exit
//! finalization can run it inside its own transaction.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parkeo_core::{
    models::Payment,
    traits::PaymentRepository,
    AppError, AppResult,
};
use rust_decimal::Decimal;
use sqlx::{PgExecutor, PgPool};
use tracing::{debug, error, instrument};

/// Insert a payment row on any executor (pool or open transaction)
pub(crate) async fn insert_payment<'e, E>(executor: E, payment: &Payment) -> AppResult<Payment>
where
    E: PgExecutor<'e>,
{
    let row = sqlx::query_as::<sqlx::Postgres, PaymentRow>(
        r#"
        INSERT INTO payments (stay_id, amount, paid_at, method, operator_id)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING id, stay_id, amount, paid_at, method, operator_id
        "#,
    )
    .bind(payment.stay_id)
    .bind(payment.amount)
    .bind(payment.paid_at)
    .bind(&payment.method)
    .bind(payment.operator_id)
    .fetch_one(executor)
    .await
    .map_err(|e| {
        error!("Database error saving payment: {}", e);
        AppError::Database(format!("Failed to save payment: {}", e))
    })?;

    Ok(row.into())
}

/// PostgreSQL implementation of PaymentRepository
pub struct PgPaymentRepository {
    pool: PgPool,
}

impl PgPaymentRepository {
    /// Create a new payment repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PaymentRepository for PgPaymentRepository {
    #[instrument(skip(self, payment))]
    async fn save(&self, payment: &Payment) -> AppResult<Payment> {
        debug!("Saving payment for stay: {}", payment.stay_id);
        insert_payment(&self.pool, payment).await
    }

    #[instrument(skip(self))]
    async fn find_by_stay(&self, stay_id: i32) -> AppResult<Option<Payment>> {
        let row = sqlx::query_as::<sqlx::Postgres, PaymentRow>(
            r#"
            SELECT id, stay_id, amount, paid_at, method, operator_id
            FROM payments
            WHERE stay_id = $1
            "#,
        )
        .bind(stay_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            error!("Database error finding payment for stay {}: {}", stay_id, e);
            AppError::Database(format!("Failed to find payment: {}", e))
        })?;

        Ok(row.map(Into::into))
    }
}

/// Row mapping for the payments table
#[derive(Debug, sqlx::FromRow)]
struct PaymentRow {
    id: i64,
    stay_id: i32,
    amount: Decimal,
    paid_at: DateTime<Utc>,
    method: String,
    operator_id: i32,
}

impl From<PaymentRow> for Payment {
    fn from(row: PaymentRow) -> Self {
        Self {
            id: row.id,
            stay_id: row.stay_id,
            amount: row.amount,
            paid_at: row.paid_at,
            method: row.method,
            operator_id: row.operator_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_row_mapping() {
        let row = PaymentRow {
            id: 9,
            stay_id: 42,
            amount: dec!(3500),
            paid_at: Utc::now(),
            method: "card".to_string(),
            operator_id: 3,
        };

        let payment: Payment = row.into();
        assert_eq!(payment.id, 9);
        assert_eq!(payment.amount, dec!(3500));
        assert_eq!(payment.method, "card");
    }
}

//! Stay repository implementation
//!
//! PostgreSQL-backed storage for stays. The two concurrency guarantees the
//! engine relies on live here: entry uniqueness is enforced by the partial
//! unique index on `(plate) WHERE status = 'inside'`, and exit finalization
//! runs the conditional state transition and the payment insert in one
//! transaction.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parkeo_core::{
    models::{Payment, Stay, StayKind, StayStatus, VehicleClass},
    traits::{ExitStamp, StayRepository},
    AppError, AppResult,
};
use sqlx::PgPool;
use tracing::{debug, error, instrument};

use super::payment_repo::insert_payment;

const STAY_COLUMNS: &str = "id, plate, vehicle_class, kind, status, entered_at, exited_at, \
     entry_operator_id, exit_operator_id";

/// PostgreSQL implementation of StayRepository
pub struct PgStayRepository {
    pool: PgPool,
}

impl PgStayRepository {
    /// Create a new stay repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl StayRepository for PgStayRepository {
    #[instrument(skip(self, stay))]
    async fn save(&self, stay: &Stay) -> AppResult<Stay> {
        debug!("Saving stay for plate: {}", stay.plate);

        let row = sqlx::query_as::<sqlx::Postgres, StayRow>(&format!(
            r#"
            INSERT INTO stays (plate, vehicle_class, kind, status, entered_at, entry_operator_id)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {STAY_COLUMNS}
            "#
        ))
        .bind(&stay.plate)
        .bind(stay.vehicle_class.to_string())
        .bind(stay.kind.to_string())
        .bind(stay.status.to_string())
        .bind(stay.entered_at)
        .bind(stay.entry_operator_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            // The partial unique index turns a lost entry race into a
            // unique violation rather than a second Inside row.
            if let sqlx::Error::Database(db) = &e {
                if db.is_unique_violation() {
                    return AppError::AlreadyInside(stay.plate.clone());
                }
            }
            error!("Database error saving stay: {}", e);
            AppError::Database(format!("Failed to save stay: {}", e))
        })?;

        row.try_into()
    }

    #[instrument(skip(self))]
    async fn find_active_by_plate(&self, plate: &str) -> AppResult<Option<Stay>> {
        let row = sqlx::query_as::<sqlx::Postgres, StayRow>(&format!(
            r#"
            SELECT {STAY_COLUMNS}
            FROM stays
            WHERE plate = $1 AND status = 'inside'
            "#
        ))
        .bind(plate)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            error!("Database error finding active stay for {}: {}", plate, e);
            AppError::Database(format!("Failed to find active stay: {}", e))
        })?;

        row.map(TryInto::try_into).transpose()
    }

    #[instrument(skip(self))]
    async fn find_all_active(&self) -> AppResult<Vec<Stay>> {
        let rows = sqlx::query_as::<sqlx::Postgres, StayRow>(&format!(
            r#"
            SELECT {STAY_COLUMNS}
            FROM stays
            WHERE status = 'inside'
            ORDER BY entered_at ASC
            "#
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            error!("Database error listing active stays: {}", e);
            AppError::Database(format!("Failed to list active stays: {}", e))
        })?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    #[instrument(skip(self))]
    async fn find_by_id(&self, id: i32) -> AppResult<Option<Stay>> {
        let row = sqlx::query_as::<sqlx::Postgres, StayRow>(&format!(
            r#"
            SELECT {STAY_COLUMNS}
            FROM stays
            WHERE id = $1
            "#
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            error!("Database error finding stay {}: {}", id, e);
            AppError::Database(format!("Failed to find stay: {}", e))
        })?;

        row.map(TryInto::try_into).transpose()
    }

    #[instrument(skip(self, exit, payment))]
    async fn finalize_exit(
        &self,
        stay_id: i32,
        exit: &ExitStamp,
        payment: Option<&Payment>,
    ) -> AppResult<Stay> {
        debug!("Finalizing exit for stay: {}", stay_id);

        let mut tx = self.pool.begin().await.map_err(|e| {
            error!("Failed to start transaction: {}", e);
            AppError::Transaction(format!("Failed to start transaction: {}", e))
        })?;

        // The WHERE clause re-checks occupancy at commit time: a stay
        // already finalized by a concurrent caller matches zero rows.
        let updated = sqlx::query_as::<sqlx::Postgres, StayRow>(&format!(
            r#"
            UPDATE stays
            SET status = 'outside',
                exited_at = $2,
                exit_operator_id = $3
            WHERE id = $1 AND status = 'inside'
            RETURNING {STAY_COLUMNS}
            "#
        ))
        .bind(stay_id)
        .bind(exit.exited_at)
        .bind(exit.operator_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| {
            error!("Database error finalizing stay {}: {}", stay_id, e);
            AppError::Database(format!("Failed to finalize stay: {}", e))
        })?;

        let row = match updated {
            Some(row) => row,
            None => {
                let known: Option<(String,)> =
                    sqlx::query_as("SELECT status FROM stays WHERE id = $1")
                        .bind(stay_id)
                        .fetch_optional(&mut *tx)
                        .await
                        .map_err(|e| AppError::Database(e.to_string()))?;

                return match known {
                    Some(_) => Err(AppError::AlreadyFinalized(stay_id)),
                    None => Err(AppError::NotFound(format!("stay {}", stay_id))),
                };
            }
        };

        if let Some(payment) = payment {
            insert_payment(&mut *tx, payment).await?;
        }

        tx.commit().await.map_err(|e| {
            error!("Failed to commit transaction: {}", e);
            AppError::Transaction(format!("Failed to commit transaction: {}", e))
        })?;

        row.try_into()
    }
}

/// Row mapping for the stays table
#[derive(Debug, sqlx::FromRow)]
struct StayRow {
    id: i32,
    plate: String,
    vehicle_class: String,
    kind: String,
    status: String,
    entered_at: DateTime<Utc>,
    exited_at: Option<DateTime<Utc>>,
    entry_operator_id: i32,
    exit_operator_id: Option<i32>,
}

impl TryFrom<StayRow> for Stay {
    type Error = AppError;

    fn try_from(row: StayRow) -> Result<Self, Self::Error> {
        let vehicle_class = VehicleClass::from_str(&row.vehicle_class).ok_or_else(|| {
            AppError::Database(format!("Unknown vehicle class in stays row: {}", row.vehicle_class))
        })?;
        let kind = StayKind::from_str(&row.kind)
            .ok_or_else(|| AppError::Database(format!("Unknown stay kind in stays row: {}", row.kind)))?;
        let status = StayStatus::from_str(&row.status).ok_or_else(|| {
            AppError::Database(format!("Unknown stay status in stays row: {}", row.status))
        })?;

        Ok(Stay {
            id: row.id,
            plate: row.plate,
            vehicle_class,
            kind,
            status,
            entered_at: row.entered_at,
            exited_at: row.exited_at,
            entry_operator_id: row.entry_operator_id,
            exit_operator_id: row.exit_operator_id,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_row() -> StayRow {
        StayRow {
            id: 1,
            plate: "ABC123".to_string(),
            vehicle_class: "car".to_string(),
            kind: "guest".to_string(),
            status: "inside".to_string(),
            entered_at: Utc::now(),
            exited_at: None,
            entry_operator_id: 1,
            exit_operator_id: None,
        }
    }

    #[test]
    fn test_row_mapping() {
        let stay: Stay = sample_row().try_into().unwrap();

        assert_eq!(stay.vehicle_class, VehicleClass::Car);
        assert_eq!(stay.kind, StayKind::Guest);
        assert_eq!(stay.status, StayStatus::Inside);
    }

    #[test]
    fn test_row_mapping_rejects_unknown_status() {
        let row = StayRow {
            status: "parked".to_string(),
            ..sample_row()
        };

        let result: Result<Stay, _> = row.try_into();
        assert!(matches!(result, Err(AppError::Database(_))));
    }
}

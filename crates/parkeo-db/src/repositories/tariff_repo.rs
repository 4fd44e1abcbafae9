//! Tariff repository implementation
//!
//! Resolution is strict: zero active tariffs for a class is `None`, more
//! than one is a `TariffConflict`. The engine never picks silently.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parkeo_core::{
    models::{Tariff, VehicleClass},
    traits::TariffRepository,
    AppError, AppResult,
};
use rust_decimal::Decimal;
use sqlx::PgPool;
use tracing::{debug, error, instrument, warn};

/// PostgreSQL implementation of TariffRepository
pub struct PgTariffRepository {
    pool: PgPool,
}

impl PgTariffRepository {
    /// Create a new tariff repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TariffRepository for PgTariffRepository {
    #[instrument(skip(self))]
    async fn find_active_by_vehicle_class(
        &self,
        vehicle_class: VehicleClass,
    ) -> AppResult<Option<Tariff>> {
        debug!("Finding active tariff for class: {}", vehicle_class);

        // LIMIT 2 is enough to detect ambiguity without scanning further
        let rows = sqlx::query_as::<sqlx::Postgres, TariffRow>(
            r#"
            SELECT id, description, vehicle_class, hourly_rate, fraction_rate,
                   fraction_minutes, daily_cap, grace_period_minutes, is_active,
                   created_at, updated_at
            FROM tariffs
            WHERE vehicle_class = $1 AND is_active = TRUE
            LIMIT 2
            "#,
        )
        .bind(vehicle_class.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            error!("Database error finding tariff for {}: {}", vehicle_class, e);
            AppError::Database(format!("Failed to find tariff: {}", e))
        })?;

        let mut rows = rows.into_iter();
        match (rows.next(), rows.next()) {
            (None, _) => Ok(None),
            (Some(row), None) => Ok(Some(row.try_into()?)),
            (Some(_), Some(_)) => {
                warn!("Multiple active tariffs configured for {}", vehicle_class);
                Err(AppError::TariffConflict(vehicle_class.to_string()))
            }
        }
    }
}

/// Row mapping for the tariffs table
#[derive(Debug, sqlx::FromRow)]
struct TariffRow {
    id: i32,
    description: Option<String>,
    vehicle_class: String,
    hourly_rate: Decimal,
    fraction_rate: Decimal,
    fraction_minutes: i32,
    daily_cap: Decimal,
    grace_period_minutes: i32,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<TariffRow> for Tariff {
    type Error = AppError;

    fn try_from(row: TariffRow) -> Result<Self, Self::Error> {
        let vehicle_class = VehicleClass::from_str(&row.vehicle_class).ok_or_else(|| {
            AppError::Database(format!(
                "Unknown vehicle class in tariffs row: {}",
                row.vehicle_class
            ))
        })?;

        Ok(Tariff {
            id: row.id,
            description: row.description,
            vehicle_class,
            hourly_rate: row.hourly_rate,
            fraction_rate: row.fraction_rate,
            fraction_minutes: row.fraction_minutes,
            daily_cap: row.daily_cap,
            grace_period_minutes: row.grace_period_minutes,
            is_active: row.is_active,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

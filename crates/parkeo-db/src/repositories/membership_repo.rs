//! Membership coverage lookup
//!
//! Memberships are maintained by an external back-office process; the
//! engine only asks whether a plate is covered today. A missing row means
//! no coverage.

use async_trait::async_trait;
use parkeo_core::{traits::MembershipRepository, AppError, AppResult};
use sqlx::PgPool;
use tracing::{debug, error, instrument};

/// PostgreSQL implementation of MembershipRepository
pub struct PgMembershipRepository {
    pool: PgPool,
}

impl PgMembershipRepository {
    /// Create a new membership repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MembershipRepository for PgMembershipRepository {
    #[instrument(skip(self))]
    async fn is_currently_active(&self, plate: &str) -> AppResult<bool> {
        debug!("Checking membership coverage for plate: {}", plate);

        let covered: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM memberships
                WHERE plate = $1 AND CURRENT_DATE BETWEEN starts_on AND ends_on
            )
            "#,
        )
        .bind(plate)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            error!("Database error checking membership for {}: {}", plate, e);
            AppError::Database(format!("Failed to check membership: {}", e))
        })?;

        Ok(covered)
    }
}

//! Operator repository implementation

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parkeo_core::{
    models::Operator,
    traits::OperatorRepository,
    AppError, AppResult,
};
use sqlx::PgPool;
use tracing::{debug, error, instrument};

const OPERATOR_COLUMNS: &str =
    "id, username, password_hash, full_name, email, is_active, created_at";

/// PostgreSQL implementation of OperatorRepository
pub struct PgOperatorRepository {
    pool: PgPool,
}

impl PgOperatorRepository {
    /// Create a new operator repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl OperatorRepository for PgOperatorRepository {
    #[instrument(skip(self))]
    async fn find_by_username(&self, username: &str) -> AppResult<Option<Operator>> {
        debug!("Finding operator by username: {}", username);

        let row = sqlx::query_as::<sqlx::Postgres, OperatorRow>(&format!(
            r#"
            SELECT {OPERATOR_COLUMNS}
            FROM operators
            WHERE username = $1
            "#
        ))
        .bind(username)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            error!("Database error finding operator {}: {}", username, e);
            AppError::Database(format!("Failed to find operator: {}", e))
        })?;

        Ok(row.map(Into::into))
    }

    #[instrument(skip(self))]
    async fn find_by_id(&self, id: i32) -> AppResult<Option<Operator>> {
        let row = sqlx::query_as::<sqlx::Postgres, OperatorRow>(&format!(
            r#"
            SELECT {OPERATOR_COLUMNS}
            FROM operators
            WHERE id = $1
            "#
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            error!("Database error finding operator {}: {}", id, e);
            AppError::Database(format!("Failed to find operator: {}", e))
        })?;

        Ok(row.map(Into::into))
    }
}

/// Row mapping for the operators table
#[derive(Debug, sqlx::FromRow)]
struct OperatorRow {
    id: i32,
    username: String,
    password_hash: String,
    full_name: String,
    email: Option<String>,
    is_active: bool,
    created_at: DateTime<Utc>,
}

impl From<OperatorRow> for Operator {
    fn from(row: OperatorRow) -> Self {
        Self {
            id: row.id,
            username: row.username,
            password_hash: row.password_hash,
            full_name: row.full_name,
            email: row.email,
            is_active: row.is_active,
            created_at: row.created_at,
        }
    }
}

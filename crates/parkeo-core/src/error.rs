//! Unified error handling for Parkeo
//!
//! Business-rule violations are first-class variants so callers are forced
//! to match on each outcome; infrastructure failures (database, cache)
//! propagate as opaque variants and are never swallowed.

use thiserror::Error;

/// Main application error type
///
/// All errors in the application should be converted to this type.
#[derive(Error, Debug)]
pub enum AppError {
    // ==================== Database Errors ====================
    #[error("Database error: {0}")]
    Database(String),

    #[error("Database pool error: {0}")]
    Pool(String),

    #[error("Transaction failed: {0}")]
    Transaction(String),

    // ==================== Cache Errors ====================
    #[error("Cache error: {0}")]
    Cache(String),

    #[error("Cache connection failed: {0}")]
    CacheConnection(String),

    // ==================== Authentication Errors ====================
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Password hashing failed: {0}")]
    PasswordHash(String),

    // ==================== Business Rule Errors ====================
    #[error("Vehicle with plate {0} is already inside the facility")]
    AlreadyInside(String),

    #[error("No vehicle with plate {0} is currently inside the facility")]
    NotInside(String),

    #[error("No active tariff configured for vehicle class: {0}")]
    NoActiveTariff(String),

    #[error("More than one active tariff configured for vehicle class: {0}")]
    TariffConflict(String),

    #[error("Stay {0} has already been finalized")]
    AlreadyFinalized(i32),

    // ==================== Validation Errors ====================
    #[error("Validation error: {0}")]
    Validation(String),

    // ==================== Resource Errors ====================
    #[error("Not found: {0}")]
    NotFound(String),

    // ==================== Internal Errors ====================
    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl AppError {
    /// Returns the error code for logs and API responses
    pub fn error_code(&self) -> &'static str {
        match self {
            AppError::Database(_) => "database_error",
            AppError::Pool(_) => "pool_error",
            AppError::Transaction(_) => "transaction_error",
            AppError::Cache(_) => "cache_error",
            AppError::CacheConnection(_) => "cache_connection_error",
            AppError::InvalidCredentials => "invalid_credentials",
            AppError::PasswordHash(_) => "password_error",
            AppError::AlreadyInside(_) => "already_inside",
            AppError::NotInside(_) => "not_inside",
            AppError::NoActiveTariff(_) => "no_active_tariff",
            AppError::TariffConflict(_) => "tariff_conflict",
            AppError::AlreadyFinalized(_) => "already_finalized",
            AppError::Validation(_) => "validation_error",
            AppError::NotFound(_) => "not_found",
            AppError::Internal(_) => "internal_error",
            AppError::Config(_) => "config_error",
            AppError::Serialization(_) => "serialization_error",
        }
    }

    /// Whether this is a business-rule outcome the caller can recover from,
    /// as opposed to an infrastructure failure.
    pub fn is_business_rule(&self) -> bool {
        matches!(
            self,
            AppError::AlreadyInside(_)
                | AppError::NotInside(_)
                | AppError::NoActiveTariff(_)
                | AppError::TariffConflict(_)
                | AppError::AlreadyFinalized(_)
        )
    }
}

// ==================== From implementations ====================

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Internal(err.to_string())
    }
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        AppError::Config(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(
            AppError::AlreadyInside("ABC123".to_string()).error_code(),
            "already_inside"
        );
        assert_eq!(AppError::AlreadyFinalized(7).error_code(), "already_finalized");
        assert_eq!(AppError::InvalidCredentials.error_code(), "invalid_credentials");
    }

    #[test]
    fn test_business_rule_classification() {
        assert!(AppError::NotInside("XYZ789".to_string()).is_business_rule());
        assert!(AppError::NoActiveTariff("car".to_string()).is_business_rule());
        assert!(!AppError::Database("connection reset".to_string()).is_business_rule());
        assert!(!AppError::Validation("empty plate".to_string()).is_business_rule());
    }

    #[test]
    fn test_display_includes_context() {
        let err = AppError::AlreadyInside("ABC123".to_string());
        assert!(err.to_string().contains("ABC123"));

        let err = AppError::NoActiveTariff("motorcycle".to_string());
        assert!(err.to_string().contains("motorcycle"));
    }
}

//! Contracts between the lifecycle engine and its collaborators
//!
//! The engine issues commands through these traits and never holds locks
//! across calls; the transactional guarantees (atomic check-and-insert on
//! entry, atomic payment+update on finalize) are owed by the
//! implementations. Every trait has an in-memory double in the test suites.

use crate::error::AppError;
use crate::models::{Operator, Payment, Stay, Tariff, VehicleClass};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Serialize};

/// Exit metadata applied when a stay is finalized
#[derive(Debug, Clone, Copy)]
pub struct ExitStamp {
    /// Exit timestamp
    pub exited_at: DateTime<Utc>,

    /// Operator who finalized the exit
    pub operator_id: i32,
}

/// Durable store of stays
#[async_trait]
pub trait StayRepository: Send + Sync {
    /// Persist a new stay and assign its identity
    ///
    /// Implementations must enforce at-most-one-Inside-stay-per-plate
    /// atomically with the insert and surface a concurrent duplicate as
    /// `AppError::AlreadyInside`.
    async fn save(&self, stay: &Stay) -> Result<Stay, AppError>;

    /// Find the Inside stay for a plate, if any
    async fn find_active_by_plate(&self, plate: &str) -> Result<Option<Stay>, AppError>;

    /// All Inside stays, ordered by entry time ascending
    async fn find_all_active(&self) -> Result<Vec<Stay>, AppError>;

    /// Find a stay by id regardless of state
    async fn find_by_id(&self, id: i32) -> Result<Option<Stay>, AppError>;

    /// Atomically transition a stay to Outside and record its payment
    ///
    /// The state update and the payment insert (when `payment` is `Some`)
    /// commit or roll back together. The transition applies only if the
    /// stay is still Inside at commit time; a stay already finalized by a
    /// concurrent caller yields `AppError::AlreadyFinalized`.
    async fn finalize_exit(
        &self,
        stay_id: i32,
        exit: &ExitStamp,
        payment: Option<&Payment>,
    ) -> Result<Stay, AppError>;
}

/// Durable store of tariffs
#[async_trait]
pub trait TariffRepository: Send + Sync {
    /// Find the single active tariff for a vehicle class
    ///
    /// Returns `Ok(None)` when no tariff is active and
    /// `AppError::TariffConflict` when more than one is; implementations
    /// must never pick silently among ambiguous rows.
    async fn find_active_by_vehicle_class(
        &self,
        vehicle_class: VehicleClass,
    ) -> Result<Option<Tariff>, AppError>;
}

/// Active-tariff resolution as seen by the lifecycle service
///
/// Implemented over `TariffRepository` with a cache in front; the seam
/// exists so lifecycle tests can substitute a fixed table.
#[async_trait]
pub trait TariffResolver: Send + Sync {
    /// Resolve the active tariff for a vehicle class
    async fn resolve(&self, vehicle_class: VehicleClass) -> Result<Option<Tariff>, AppError>;
}

/// Membership coverage lookup
///
/// Memberships are owned elsewhere; the engine only asks whether a plate
/// is covered right now. Absence of evidence is `false`.
#[async_trait]
pub trait MembershipRepository: Send + Sync {
    /// Whether the plate has active membership coverage at this instant
    async fn is_currently_active(&self, plate: &str) -> Result<bool, AppError>;
}

/// Durable record of completed payments
#[async_trait]
pub trait PaymentRepository: Send + Sync {
    /// Persist a payment and assign its identity
    async fn save(&self, payment: &Payment) -> Result<Payment, AppError>;

    /// The payment settling a stay, if one was charged
    async fn find_by_stay(&self, stay_id: i32) -> Result<Option<Payment>, AppError>;
}

/// Durable store of operators
#[async_trait]
pub trait OperatorRepository: Send + Sync {
    /// Find an operator by login name
    async fn find_by_username(&self, username: &str) -> Result<Option<Operator>, AppError>;

    /// Find an operator by id
    async fn find_by_id(&self, id: i32) -> Result<Option<Operator>, AppError>;
}

/// Cache service trait
#[async_trait]
pub trait CacheService: Send + Sync {
    /// Get value from cache
    async fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, AppError>;

    /// Set value in cache with TTL
    async fn set<T: Serialize + Send + Sync>(
        &self,
        key: &str,
        value: &T,
        ttl_secs: u64,
    ) -> Result<(), AppError>;

    /// Delete value from cache
    async fn delete(&self, key: &str) -> Result<bool, AppError>;

    /// Check if key exists
    async fn exists(&self, key: &str) -> Result<bool, AppError>;
}

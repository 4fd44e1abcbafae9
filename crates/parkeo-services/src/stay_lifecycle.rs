//! Stay lifecycle service
//!
//! Orchestrates the occupancy lifecycle of a vehicle:
//! - register entry (uniqueness check, membership classification)
//! - quote the exit fee (transient, recomputed on every call)
//! - finalize the exit (payment + state transition, atomic in the store)
//!
//! The service holds no locks and keeps no state of its own; the
//! concurrency guarantees live behind the `StayRepository` contract.
//!
//! # Example
//!
//! ```no_run
//! use parkeo_cache::RedisCache;
//! use parkeo_core::{models::VehicleClass, AppConfig};
//! use parkeo_db::{create_pool, PgMembershipRepository, PgStayRepository, PgTariffRepository};
//! use parkeo_services::{CachingTariffResolver, StayLifecycleService};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = AppConfig::load()?;
//!     let pool = create_pool(&config.database.url, None).await?;
//!     let cache = Arc::new(RedisCache::new(&config.redis.url).await?);
//!
//!     let tariffs = Arc::new(
//!         CachingTariffResolver::new(Arc::new(PgTariffRepository::new(pool.clone())), cache)
//!             .with_ttl(config.parking.tariff_cache_ttl_secs),
//!     );
//!     let service = StayLifecycleService::new(
//!         Arc::new(PgStayRepository::new(pool.clone())),
//!         Arc::new(PgMembershipRepository::new(pool)),
//!         tariffs,
//!     );
//!
//!     let stay = service.register_entry("ABC123", VehicleClass::Car, 1).await?;
//!     println!("stay {} registered", stay.id);
//!     Ok(())
//! }
//! ```

use chrono::{DateTime, Utc};
use parkeo_core::{
    models::{Payment, Stay, StayKind, VehicleClass},
    traits::{ExitStamp, MembershipRepository, StayRepository, TariffResolver},
    AppError, AppResult,
};
use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

use crate::constants::MAX_PLATE_LENGTH;

/// A priced exit, valid only for the instant it was computed
///
/// The amount is never persisted; elapsed time keeps advancing, so a
/// fresh quote may differ from an earlier one for the same stay.
#[derive(Debug, Clone)]
pub struct ExitQuote {
    /// The stay being priced
    pub stay: Stay,

    /// Amount owed at `quoted_at`
    pub amount_due: Decimal,

    /// Elapsed whole minutes at `quoted_at`
    pub elapsed_minutes: i64,

    /// When this quote was computed
    pub quoted_at: DateTime<Utc>,
}

/// Stay lifecycle service
pub struct StayLifecycleService<S, M, T>
where
    S: StayRepository,
    M: MembershipRepository,
    T: TariffResolver,
{
    stay_repo: Arc<S>,
    memberships: Arc<M>,
    tariffs: Arc<T>,
    max_plate_length: usize,
}

impl<S, M, T> StayLifecycleService<S, M, T>
where
    S: StayRepository,
    M: MembershipRepository,
    T: TariffResolver,
{
    /// Create a new lifecycle service
    pub fn new(stay_repo: Arc<S>, memberships: Arc<M>, tariffs: Arc<T>) -> Self {
        Self {
            stay_repo,
            memberships,
            tariffs,
            max_plate_length: MAX_PLATE_LENGTH,
        }
    }

    /// Override the plate length bound (normally fed from `ParkingConfig`)
    pub fn with_max_plate_length(mut self, max_plate_length: usize) -> Self {
        self.max_plate_length = max_plate_length;
        self
    }

    /// Normalize and validate a raw plate
    fn check_plate(&self, raw: &str) -> AppResult<String> {
        let plate = Stay::normalize_plate(raw);
        if plate.is_empty() {
            return Err(AppError::Validation(
                "plate must contain at least one alphanumeric character".to_string(),
            ));
        }
        if plate.len() > self.max_plate_length {
            return Err(AppError::Validation(format!(
                "plate {} exceeds {} characters",
                plate, self.max_plate_length
            )));
        }
        Ok(plate)
    }

    /// Register a vehicle entry
    ///
    /// Classifies the stay as member or guest from membership coverage at
    /// this instant; the classification is never re-evaluated. Fails with
    /// `AlreadyInside` when the plate already has an Inside stay, whether
    /// detected by the pre-check or by the store's atomic insert guard.
    #[instrument(skip(self))]
    pub async fn register_entry(
        &self,
        plate: &str,
        vehicle_class: VehicleClass,
        operator_id: i32,
    ) -> AppResult<Stay> {
        let plate = self.check_plate(plate)?;

        if self.stay_repo.find_active_by_plate(&plate).await?.is_some() {
            warn!("Entry rejected, plate {} is already inside", plate);
            return Err(AppError::AlreadyInside(plate));
        }

        let covered = self.memberships.is_currently_active(&plate).await?;
        let kind = if covered { StayKind::Member } else { StayKind::Guest };

        let stay = Stay::enter(plate, vehicle_class, kind, operator_id);
        let saved = self.stay_repo.save(&stay).await?;

        info!(
            "Registered {} entry for plate {} as stay {}",
            kind, saved.plate, saved.id
        );

        Ok(saved)
    }

    /// All vehicles currently inside, ordered by entry time
    pub async fn active_stays(&self) -> AppResult<Vec<Stay>> {
        self.stay_repo.find_all_active().await
    }

    /// Price the exit for a plate without touching any state
    ///
    /// Member stays owe zero and skip tariff resolution entirely. For
    /// guests the active tariff of the stay's vehicle class prices the
    /// elapsed time; a missing tariff is a loud `NoActiveTariff`.
    #[instrument(skip(self))]
    pub async fn calculate_exit_details(&self, plate: &str) -> AppResult<ExitQuote> {
        let plate = self.check_plate(plate)?;

        let stay = self
            .stay_repo
            .find_active_by_plate(&plate)
            .await?
            .ok_or_else(|| AppError::NotInside(plate.clone()))?;

        let now = Utc::now();
        let elapsed_minutes = stay.elapsed_minutes(now);

        if stay.is_member() {
            debug!("Member stay {} owes nothing", stay.id);
            return Ok(ExitQuote {
                stay,
                amount_due: Decimal::ZERO,
                elapsed_minutes,
                quoted_at: now,
            });
        }

        let tariff = self
            .tariffs
            .resolve(stay.vehicle_class)
            .await?
            .ok_or_else(|| AppError::NoActiveTariff(stay.vehicle_class.to_string()))?;

        let amount_due = tariff.fee_for_minutes(elapsed_minutes);
        debug!(
            "Stay {} owes {} after {} minutes",
            stay.id, amount_due, elapsed_minutes
        );

        Ok(ExitQuote {
            stay,
            amount_due,
            elapsed_minutes,
            quoted_at: now,
        })
    }

    /// Finalize an exit, recording the payment when one was charged
    ///
    /// The store applies the payment insert and the state transition as
    /// one atomic unit, re-checking that the stay is still Inside; a
    /// concurrent finalize surfaces as `AlreadyFinalized` instead of a
    /// double charge.
    #[instrument(skip(self, stay))]
    pub async fn finalize_exit(
        &self,
        stay: &Stay,
        operator_id: i32,
        amount_paid: Decimal,
        method: &str,
    ) -> AppResult<Stay> {
        if amount_paid < Decimal::ZERO {
            return Err(AppError::Validation(
                "amount paid cannot be negative".to_string(),
            ));
        }

        let exit = ExitStamp {
            exited_at: Utc::now(),
            operator_id,
        };
        let payment = if amount_paid > Decimal::ZERO {
            Some(Payment::new(stay.id, amount_paid, method, operator_id))
        } else {
            None
        };

        let closed = self
            .stay_repo
            .finalize_exit(stay.id, &exit, payment.as_ref())
            .await?;

        info!(
            "Finalized exit for stay {} (plate {}), charged {}",
            closed.id, closed.plate, amount_paid
        );

        Ok(closed)
    }
}

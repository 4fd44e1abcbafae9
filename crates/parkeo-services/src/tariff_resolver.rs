//! Caching tariff resolver
//!
//! Puts a cache in front of the tariff store. Tariffs change rarely but
//! are read on every guest exit quote; a short TTL keeps edits visible
//! within minutes. Cache failures degrade to the database rather than
//! failing the quote.

use async_trait::async_trait;
use parkeo_cache::keys;
use parkeo_core::{
    models::{Tariff, VehicleClass},
    traits::{CacheService, TariffRepository, TariffResolver},
    AppResult,
};
use std::sync::Arc;
use tracing::{debug, instrument, warn};

use crate::constants::TARIFF_CACHE_TTL;

/// Tariff resolver with cache-aside lookup
pub struct CachingTariffResolver<R: TariffRepository, C: CacheService> {
    tariff_repo: Arc<R>,
    cache: Arc<C>,
    ttl_secs: u64,
}

impl<R: TariffRepository, C: CacheService> CachingTariffResolver<R, C> {
    /// Create a new resolver with the default cache TTL
    pub fn new(tariff_repo: Arc<R>, cache: Arc<C>) -> Self {
        Self {
            tariff_repo,
            cache,
            ttl_secs: TARIFF_CACHE_TTL,
        }
    }

    /// Override the cache TTL (normally fed from `ParkingConfig`)
    pub fn with_ttl(mut self, ttl_secs: u64) -> Self {
        self.ttl_secs = ttl_secs;
        self
    }

    /// Try to get the tariff from cache; cache errors read as a miss
    async fn get_from_cache(&self, vehicle_class: VehicleClass) -> Option<Tariff> {
        let key = keys::tariff_key(vehicle_class);

        match self.cache.get::<Tariff>(&key).await {
            Ok(tariff) => {
                if tariff.is_some() {
                    debug!("Tariff cache HIT for class: {}", vehicle_class);
                }
                tariff
            }
            Err(e) => {
                warn!("Cache error for class {}: {}", vehicle_class, e);
                None
            }
        }
    }

    /// Store the tariff in cache; failures are logged and ignored
    async fn store_in_cache(&self, vehicle_class: VehicleClass, tariff: &Tariff) {
        let key = keys::tariff_key(vehicle_class);

        if let Err(e) = self.cache.set(&key, tariff, self.ttl_secs).await {
            warn!("Failed to cache tariff for {}: {}", vehicle_class, e);
        }
    }
}

#[async_trait]
impl<R: TariffRepository, C: CacheService> TariffResolver for CachingTariffResolver<R, C> {
    #[instrument(skip(self))]
    async fn resolve(&self, vehicle_class: VehicleClass) -> AppResult<Option<Tariff>> {
        if let Some(tariff) = self.get_from_cache(vehicle_class).await {
            return Ok(Some(tariff));
        }

        debug!("Tariff cache MISS for class: {}", vehicle_class);
        let tariff = self
            .tariff_repo
            .find_active_by_vehicle_class(vehicle_class)
            .await?;

        if let Some(ref t) = tariff {
            self.store_in_cache(vehicle_class, t).await;
        }

        Ok(tariff)
    }
}

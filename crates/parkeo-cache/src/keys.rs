//! Cache key constants and builders for Parkeo
//!
//! Standardized key naming so callers cannot collide with each other.
//!
//! # Key Patterns
//!
//! - `tariff:{vehicle_class}` - Cached active tariff per vehicle class

use parkeo_core::models::VehicleClass;

/// Prefix for cached active tariffs
///
/// Format: `tariff:{vehicle_class}`
pub const TARIFF_KEY_PREFIX: &str = "tariff";

/// Default TTL for cached tariffs (5 minutes)
///
/// Tariffs change rarely; a short TTL keeps a manual tariff edit from
/// lingering in quotes for long.
pub const TARIFF_TTL_SECS: u64 = 300;

/// Build a cache key for the active tariff of a vehicle class
///
/// # Example
///
/// ```
/// use parkeo_cache::keys::tariff_key;
/// use parkeo_core::models::VehicleClass;
///
/// let key = tariff_key(VehicleClass::Car);
/// assert_eq!(key, "tariff:car");
/// ```
pub fn tariff_key(vehicle_class: VehicleClass) -> String {
    format!("{}:{}", TARIFF_KEY_PREFIX, vehicle_class)
}

/// Build a pattern for matching all keys with a given prefix
///
/// # Warning
///
/// Scanning keys can be expensive on large datasets; intended for
/// operational tooling, not request paths.
pub fn pattern(prefix: &str) -> String {
    format!("{}:*", prefix)
}

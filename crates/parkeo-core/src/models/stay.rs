//! Stay model
//!
//! A stay is one vehicle's occupancy record, from the moment an operator
//! registers its entry until its exit is finalized.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Supported vehicle classes
///
/// Each class has its own active tariff; pricing fails loudly when a class
/// has no tariff configured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VehicleClass {
    Car,
    Motorcycle,
    Truck,
}

impl fmt::Display for VehicleClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VehicleClass::Car => write!(f, "car"),
            VehicleClass::Motorcycle => write!(f, "motorcycle"),
            VehicleClass::Truck => write!(f, "truck"),
        }
    }
}

impl VehicleClass {
    /// Parse from the string stored in the database
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "car" => Some(VehicleClass::Car),
            "motorcycle" => Some(VehicleClass::Motorcycle),
            "truck" => Some(VehicleClass::Truck),
            _ => None,
        }
    }
}

/// Stay kind, decided once at entry from membership coverage
///
/// A `Member` stay is exempt from per-visit fees for its whole duration,
/// even if the membership lapses while the vehicle is inside.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StayKind {
    Member,
    Guest,
}

impl fmt::Display for StayKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StayKind::Member => write!(f, "member"),
            StayKind::Guest => write!(f, "guest"),
        }
    }
}

impl StayKind {
    /// Parse from the string stored in the database
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "member" => Some(StayKind::Member),
            "guest" => Some(StayKind::Guest),
            _ => None,
        }
    }
}

/// Occupancy state of a stay
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StayStatus {
    /// Vehicle is in the facility
    Inside,
    /// Exit has been finalized
    Outside,
}

impl fmt::Display for StayStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StayStatus::Inside => write!(f, "inside"),
            StayStatus::Outside => write!(f, "outside"),
        }
    }
}

impl StayStatus {
    /// Parse from the string stored in the database
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "inside" => Some(StayStatus::Inside),
            "outside" => Some(StayStatus::Outside),
            _ => None,
        }
    }
}

/// Stay entity
///
/// Invariants upheld by the lifecycle service and the store:
/// - at most one `Inside` stay per plate at any time
/// - `exited_at`/`exit_operator_id` are set exactly once, at finalize,
///   together with the transition to `Outside`
/// - `kind` is fixed at creation and never re-evaluated
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Stay {
    /// Unique identifier, assigned by the store on save
    pub id: i32,

    /// Normalized plate (uppercase alphanumeric)
    pub plate: String,

    /// Vehicle class, used for tariff resolution at exit
    pub vehicle_class: VehicleClass,

    /// Member or guest, classified at entry
    pub kind: StayKind,

    /// Current occupancy state
    pub status: StayStatus,

    /// Entry timestamp, immutable after creation
    pub entered_at: DateTime<Utc>,

    /// Exit timestamp, set at finalize
    pub exited_at: Option<DateTime<Utc>>,

    /// Operator who registered the entry
    pub entry_operator_id: i32,

    /// Operator who finalized the exit
    pub exit_operator_id: Option<i32>,
}

impl Stay {
    /// Create a new stay at the moment of entry
    ///
    /// The id is zero until the store assigns one.
    pub fn enter(
        plate: String,
        vehicle_class: VehicleClass,
        kind: StayKind,
        entry_operator_id: i32,
    ) -> Self {
        Self {
            id: 0,
            plate,
            vehicle_class,
            kind,
            status: StayStatus::Inside,
            entered_at: Utc::now(),
            exited_at: None,
            entry_operator_id,
            exit_operator_id: None,
        }
    }

    /// Whether the vehicle is still inside
    #[inline]
    pub fn is_inside(&self) -> bool {
        self.status == StayStatus::Inside
    }

    /// Whether this stay is covered by a membership
    #[inline]
    pub fn is_member(&self) -> bool {
        self.kind == StayKind::Member
    }

    /// Elapsed whole minutes between entry and `now`
    ///
    /// Clock skew that would make the elapsed time negative is clamped to
    /// zero so a skewed wall clock can never produce a negative charge.
    pub fn elapsed_minutes(&self, now: DateTime<Utc>) -> i64 {
        (now - self.entered_at).num_minutes().max(0)
    }

    /// Normalize a raw plate for storage and lookup
    ///
    /// Keeps alphanumeric characters only and uppercases them, so
    /// "abc-123" and "ABC 123" address the same vehicle.
    pub fn normalize_plate(raw: &str) -> String {
        raw.chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .map(|c| c.to_ascii_uppercase())
            .collect()
    }
}

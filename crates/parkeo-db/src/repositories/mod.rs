//! Repository implementations for Parkeo

pub mod membership_repo;
pub mod operator_repo;
pub mod payment_repo;
pub mod stay_repo;
pub mod tariff_repo;

pub use membership_repo::PgMembershipRepository;
pub use operator_repo::PgOperatorRepository;
pub use payment_repo::PgPaymentRepository;
pub use stay_repo::PgStayRepository;
pub use tariff_repo::PgTariffRepository;

//! Operator authentication for Parkeo
//!
//! The engine treats authentication as "give me a verified operator
//! identity"; this crate is that collaborator. It provides Argon2
//! password hashing and the login service over the operator store.
//!
//! # Example
//!
//! ```no_run
//! use parkeo_auth::PasswordService;
//!
//! let passwords = PasswordService::new();
//! let hash = passwords.hash_password("secure_password")?;
//! assert!(passwords.verify_password("secure_password", &hash)?);
//! # Ok::<(), parkeo_core::error::AppError>(())
//! ```

pub mod password;
pub mod service;

pub use password::PasswordService;
pub use service::AuthService;

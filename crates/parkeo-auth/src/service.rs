//! Operator login service
//!
//! Turns a username/password pair into a verified `Operator` identity.
//! Unknown username, inactive operator and wrong password all collapse to
//! the same `InvalidCredentials` outcome so the login form leaks nothing.

use parkeo_core::{models::Operator, traits::OperatorRepository, AppError, AppResult};
use std::sync::Arc;
use tracing::{info, instrument, warn};

use crate::password::PasswordService;

/// Authentication service over an operator store
pub struct AuthService<O: OperatorRepository> {
    operator_repo: Arc<O>,
    passwords: PasswordService,
}

impl<O: OperatorRepository> AuthService<O> {
    /// Create a new authentication service
    pub fn new(operator_repo: Arc<O>) -> Self {
        Self {
            operator_repo,
            passwords: PasswordService::new(),
        }
    }

    /// Verify credentials and return the operator identity
    #[instrument(skip(self, password))]
    pub async fn login(&self, username: &str, password: &str) -> AppResult<Operator> {
        let operator = match self.operator_repo.find_by_username(username).await? {
            Some(operator) => operator,
            None => {
                warn!("Login attempt for unknown operator: {}", username);
                return Err(AppError::InvalidCredentials);
            }
        };

        if !operator.is_active {
            warn!("Login attempt for inactive operator: {}", username);
            return Err(AppError::InvalidCredentials);
        }

        if !self
            .passwords
            .verify_password(password, &operator.password_hash)?
        {
            warn!("Failed password verification for operator: {}", username);
            return Err(AppError::InvalidCredentials);
        }

        info!("Operator {} logged in", operator.username);
        Ok(operator)
    }
}

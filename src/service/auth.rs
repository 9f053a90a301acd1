use crate::config::AdminConfig;
use crate::error::app_error::AppError;
use argon2::Argon2;
use password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use rand::rngs::OsRng;
use std::fmt;

/// The single administrative principal's password, as an Argon2 PHC string.
#[derive(Clone)]
pub struct AdminCredentials {
    password_hash: String,
}

impl fmt::Debug for AdminCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdminCredentials").finish_non_exhaustive()
    }
}

impl AdminCredentials {
    /// Rejects a missing or unparseable hash up front so a misconfigured deployment fails at startup.
    pub fn new(config: &AdminConfig) -> Result<Self, AppError> {
        if config.password_hash.is_empty() {
            return Err(AppError::configuration("Admin password hash is not configured"));
        }
        PasswordHash::new(&config.password_hash).map_err(|e| AppError::password_hash("Failed to parse admin password hash", e))?;

        Ok(Self {
            password_hash: config.password_hash.clone(),
        })
    }

    pub fn verify_password(&self, password: &str) -> Result<(), AppError> {
        let password_hash = PasswordHash::new(&self.password_hash).map_err(|e| AppError::password_hash("Failed to parse admin password hash", e))?;
        Argon2::default()
            .verify_password(password.as_bytes(), &password_hash)
            .map_err(|_| AppError::InvalidCredentials)?;

        Ok(())
    }
}

/// Produces a PHC string suitable for `admin.password_hash`.
pub fn hash_password(password: &str) -> Result<String, AppError> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AppError::password_hash("Password hashing failed", e))?;

    Ok(hash.to_string())
}

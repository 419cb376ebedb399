//! Operator credential handling.
//!
//! Passwords are stored as Argon2id PHC strings. Legacy plaintext values are
//! compared in constant time to mitigate timing attacks.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use subtle::ConstantTimeEq;

use crate::errors::AppError;

/// PHC identifier prefix of hashes produced by [`hash_password`].
const PHC_PREFIX: &str = "$argon2";

/// Symbols accepted by the password policy.
pub const PASSWORD_SYMBOLS: &str = "!@#$%^&*(),.?\":{}|<>_-+=[]\\/;'`~";

/// Minimum password length.
pub const MIN_PASSWORD_LEN: usize = 8;

/// A password policy rule that was not satisfied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolicyFailure {
    TooShort,
    MissingUppercase,
    MissingLowercase,
    MissingDigit,
    MissingSymbol,
}

impl PolicyFailure {
    pub fn as_str(&self) -> &'static str {
        match self {
            PolicyFailure::TooShort => "shorter than 8 characters",
            PolicyFailure::MissingUppercase => "no uppercase letter",
            PolicyFailure::MissingLowercase => "no lowercase letter",
            PolicyFailure::MissingDigit => "no digit",
            PolicyFailure::MissingSymbol => "no symbol",
        }
    }
}

/// Check a new password against the policy, collecting every failed rule.
pub fn check_password_policy(password: &str) -> Result<(), Vec<PolicyFailure>> {
    let mut failures = Vec::new();

    if password.chars().count() < MIN_PASSWORD_LEN {
        failures.push(PolicyFailure::TooShort);
    }
    if !password.chars().any(|c| c.is_ascii_uppercase()) {
        failures.push(PolicyFailure::MissingUppercase);
    }
    if !password.chars().any(|c| c.is_ascii_lowercase()) {
        failures.push(PolicyFailure::MissingLowercase);
    }
    if !password.chars().any(|c| c.is_ascii_digit()) {
        failures.push(PolicyFailure::MissingDigit);
    }
    if !password.chars().any(|c| PASSWORD_SYMBOLS.contains(c)) {
        failures.push(PolicyFailure::MissingSymbol);
    }

    if failures.is_empty() {
        Ok(())
    } else {
        Err(failures)
    }
}

/// Hash a password using Argon2id with a fresh random salt.
pub fn hash_password(password: &str) -> Result<String, AppError> {
    let salt = SaltString::generate(&mut OsRng);

    let password_hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AppError::Internal(format!("Password hashing failed: {}", e)))?;

    Ok(password_hash.to_string())
}

/// Verify a password against a stored value.
///
/// Values that are not Argon2 PHC strings are legacy plaintext records.
pub fn verify_password(password: &str, stored: &str) -> bool {
    if !stored.starts_with(PHC_PREFIX) {
        return constant_time_compare(password, stored);
    }

    match PasswordHash::new(stored) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(e) => {
            tracing::error!("Stored password hash is malformed: {}", e);
            false
        }
    }
}

/// Perform constant-time string comparison.
fn constant_time_compare(a: &str, b: &str) -> bool {
    a.as_bytes().ct_eq(b.as_bytes()).into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compliant_password_passes() {
        assert!(check_password_policy("Valid123!").is_ok());
    }

    #[test]
    fn test_short_password_reports_every_failure() {
        let failures = check_password_policy("short").unwrap_err();
        assert_eq!(
            failures,
            vec![
                PolicyFailure::TooShort,
                PolicyFailure::MissingUppercase,
                PolicyFailure::MissingDigit,
                PolicyFailure::MissingSymbol,
            ]
        );
    }

    #[test]
    fn test_missing_symbol() {
        assert_eq!(
            check_password_policy("Valid1234").unwrap_err(),
            vec![PolicyFailure::MissingSymbol]
        );
    }

    #[test]
    fn test_hash_roundtrip_and_salting() {
        let first = hash_password("Valid123!").unwrap();
        let second = hash_password("Valid123!").unwrap();

        assert!(first.starts_with("$argon2id$"));
        assert_ne!(first, second);
        assert!(verify_password("Valid123!", &first));
        assert!(verify_password("Valid123!", &second));
        assert!(!verify_password("Valid123?", &first));
    }

    #[test]
    fn test_malformed_hash_never_verifies() {
        assert!(!verify_password("Valid123!", "$argon2id$not-a-phc-string"));
    }

    #[test]
    fn test_legacy_plaintext_value() {
        assert!(verify_password("Legacy#2024", "Legacy#2024"));
        assert!(!verify_password("legacy#2024", "Legacy#2024"));
    }

    #[test]
    fn test_constant_time_compare_different_lengths() {
        assert!(!constant_time_compare("short", "much-longer-key"));
        assert!(constant_time_compare("", ""));
    }
}

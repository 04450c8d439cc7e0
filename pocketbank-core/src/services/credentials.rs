//! Credential store - password hashing and verification
//!
//! Passwords are hashed with Argon2id into PHC strings
//! (`$argon2id$v=19$m=...,t=...,p=...$salt$hash`). The cost parameters travel
//! with each hash, so verification keeps working after the configured cost is
//! raised. Plaintext passwords are never stored or logged.

use std::sync::Arc;

use argon2::password_hash::{self, PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::{Algorithm, Argon2, Params, Version};
use rand::rngs::OsRng;
use tracing::error;

use crate::domain::result::{Error, InfrastructureError, Result};
use crate::domain::{Argon2Params, User};
use crate::ports::Repository;

/// Verified against when the username does not exist, so that an unknown
/// username costs the same time as a wrong password.
const DUMMY_PASSWORD: &str = "pocketbank-timing-equalizer";

pub struct CredentialStore {
    repository: Arc<dyn Repository>,
    argon2: Argon2<'static>,
    dummy_hash: String,
}

impl CredentialStore {
    pub fn new(repository: Arc<dyn Repository>, params: Argon2Params) -> Result<Self> {
        let argon2_params = Params::new(params.memory_cost, params.time_cost, params.parallelism, None)
            .map_err(|e| hash_failure(format!("invalid argon2 parameters: {}", e)))?;
        let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, argon2_params);

        // Built up front so the first unknown-username login costs the same
        // as every later one
        let dummy_hash = hash_with(&argon2, DUMMY_PASSWORD)?;

        Ok(Self {
            repository,
            argon2,
            dummy_hash,
        })
    }

    /// Prepare a new user: normalize the username, reject it if taken and
    /// hash the password.
    ///
    /// The returned user is not persisted; `AuthGateway::register` stores it
    /// together with its account.
    pub fn enroll(&self, username: &str, password: &str) -> Result<User> {
        let username = User::normalize_username(username)?;
        User::validate_password(password)?;

        if self.repository.find_user_by_username(&username)?.is_some() {
            return Err(Error::DuplicateUsername(username));
        }

        let password_hash = self.hash_password(password)?;
        Ok(User::new(username, password_hash))
    }

    /// Check a username/password pair
    pub fn verify(&self, username: &str, password: &str) -> Result<User> {
        let username = User::normalize_username(username)?;

        match self.repository.find_user_by_username(&username)? {
            Some(user) => {
                if self.password_matches(password, &user.password_hash)? {
                    Ok(user)
                } else {
                    Err(Error::InvalidCredentials)
                }
            }
            None => {
                let _ = self.password_matches(password, &self.dummy_hash);
                Err(Error::AccountNotFound)
            }
        }
    }

    fn hash_password(&self, password: &str) -> Result<String> {
        hash_with(&self.argon2, password)
    }

    fn password_matches(&self, password: &str, stored_hash: &str) -> Result<bool> {
        let parsed = PasswordHash::new(stored_hash)
            .map_err(|e| hash_failure(format!("stored hash is unreadable: {}", e)))?;

        match self.argon2.verify_password(password.as_bytes(), &parsed) {
            Ok(()) => Ok(true),
            Err(password_hash::Error::Password) => Ok(false),
            Err(e) => Err(hash_failure(e.to_string())),
        }
    }
}

fn hash_with(argon2: &Argon2<'_>, password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| hash_failure(e.to_string()))?;
    Ok(hash.to_string())
}

fn hash_failure(detail: String) -> Error {
    error!(error = %detail, "password hashing failure");
    InfrastructureError::PasswordHash(detail).into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::duckdb::DuckDbRepository;
    use crate::domain::Account;
    use crate::ports::CreateOutcome;
    use crate::services::DateRandomGenerator;
    use crate::ports::AccountNumberGenerator;

    fn setup() -> (Arc<DuckDbRepository>, CredentialStore) {
        let repo = Arc::new(DuckDbRepository::open_in_memory().unwrap());
        repo.ensure_schema().unwrap();
        let store = CredentialStore::new(repo.clone(), Argon2Params::insecure_fast()).unwrap();
        (repo, store)
    }

    fn persist(repo: &DuckDbRepository, user: &User) {
        let number = DateRandomGenerator::new().generate().unwrap();
        let account = Account::open(user.id, number);
        assert_eq!(
            repo.create_user_with_account(user, &account).unwrap(),
            CreateOutcome::Created
        );
    }

    #[test]
    fn test_enroll_hashes_password() {
        let (_repo, store) = setup();
        let user = store.enroll("  Alice ", "Secr3t!").unwrap();

        assert_eq!(user.username, "alice");
        assert!(user.password_hash.starts_with("$argon2id$"));
        assert!(!user.password_hash.contains("Secr3t!"));
    }

    #[test]
    fn test_same_password_gets_different_salts() {
        let (_repo, store) = setup();
        let a = store.enroll("alice", "same").unwrap();
        let b = store.enroll("bob", "same").unwrap();
        assert_ne!(a.password_hash, b.password_hash);
    }

    #[test]
    fn test_enroll_rejects_taken_username_case_insensitively() {
        let (repo, store) = setup();
        let user = store.enroll("alice", "Secr3t!").unwrap();
        persist(&repo, &user);

        let err = store.enroll("ALICE", "other").unwrap_err();
        assert!(matches!(err, Error::DuplicateUsername(name) if name == "alice"));
    }

    #[test]
    fn test_enroll_validates_input() {
        let (_repo, store) = setup();
        assert!(matches!(store.enroll("", "pw"), Err(Error::InvalidInput(_))));
        assert!(matches!(store.enroll("alice", ""), Err(Error::InvalidInput(_))));
    }

    #[test]
    fn test_verify() {
        let (repo, store) = setup();
        let user = store.enroll("alice", "Secr3t!").unwrap();
        persist(&repo, &user);

        let verified = store.verify("Alice", "Secr3t!").unwrap();
        assert_eq!(verified.id, user.id);

        assert!(matches!(
            store.verify("alice", "wrong"),
            Err(Error::InvalidCredentials)
        ));
        assert!(matches!(
            store.verify("mallory", "Secr3t!"),
            Err(Error::AccountNotFound)
        ));
    }

    #[test]
    fn test_hashes_from_other_cost_settings_still_verify() {
        let (repo, store) = setup();
        let stronger = CredentialStore::new(
            repo.clone(),
            Argon2Params {
                memory_cost: 64,
                time_cost: 2,
                parallelism: 1,
            },
        )
        .unwrap();
        let user = stronger.enroll("alice", "Secr3t!").unwrap();
        persist(&repo, &user);

        assert!(store.verify("alice", "Secr3t!").is_ok());
    }

    #[test]
    fn test_invalid_params_rejected() {
        let repo = Arc::new(DuckDbRepository::open_in_memory().unwrap());
        let params = Argon2Params {
            memory_cost: 1,
            time_cost: 1,
            parallelism: 1,
        };
        assert!(CredentialStore::new(repo, params).is_err());
    }

    #[test]
    fn test_dummy_hash_is_ready_before_first_login() {
        let (_repo, store) = setup();
        assert!(store.dummy_hash.starts_with("$argon2id$"));
        assert!(PasswordHash::new(&store.dummy_hash).is_ok());
    }

    #[test]
    fn test_unreadable_stored_hash_is_an_infrastructure_error() {
        let (repo, store) = setup();
        persist(&repo, &User::new("eve", "not-a-phc-string"));

        let err = store.verify("eve", "anything").unwrap_err();
        assert!(matches!(
            err,
            Error::Infrastructure(InfrastructureError::PasswordHash(_))
        ));
        assert!(!err.is_retryable());
    }
}

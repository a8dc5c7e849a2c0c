//! Account layer: local registration/login against a credential directory,
//! delegated login through an identity provider, and the persisted session
//! snapshot.

use crate::credentials::{hash_password, verify_password, CredentialDirectory, CredentialRecord};
use crate::error::{AuthError, ProviderError, ValidationError};
use crate::provider::{IdentityProvider, PendingSignIn};
use crate::session::{Identity, SessionStore};

pub const MIN_PASSWORD_LEN: usize = 6;

/// Checks shared by login and registration, in form order
pub fn validate_login(email: &str, password: &str) -> Result<(), ValidationError> {
    if email.is_empty() || password.is_empty() {
        return Err(ValidationError::MissingField);
    }
    if !email.contains('@') {
        return Err(ValidationError::MalformedEmail);
    }
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(ValidationError::PasswordTooShort);
    }
    Ok(())
}

pub fn validate_registration(
    email: &str,
    password: &str,
    confirm: &str,
) -> Result<(), ValidationError> {
    validate_login(email, password)?;
    if confirm.is_empty() {
        return Err(ValidationError::MissingConfirmation);
    }
    if password != confirm {
        return Err(ValidationError::PasswordMismatch);
    }
    Ok(())
}

pub struct AccountStore {
    directory: Box<dyn CredentialDirectory>,
    sessions: Box<dyn SessionStore>,
    provider: Box<dyn IdentityProvider>,
}

impl AccountStore {
    pub fn new(
        directory: Box<dyn CredentialDirectory>,
        sessions: Box<dyn SessionStore>,
        provider: Box<dyn IdentityProvider>,
    ) -> Self {
        Self {
            directory,
            sessions,
            provider,
        }
    }

    pub fn register(
        &mut self,
        email: &str,
        password: &str,
        confirm: &str,
    ) -> Result<Identity, AuthError> {
        validate_registration(email, password, confirm)?;
        if self.directory.lookup(email)?.is_some() {
            return Err(AuthError::AlreadyRegistered);
        }

        let identity = Identity::from_email(email);
        self.directory.insert(
            email,
            &CredentialRecord {
                name: identity.name.clone(),
                password_hash: hash_password(password)?,
            },
        )?;
        log::info!("registered {}", email);

        self.persist(&identity)?;
        Ok(identity)
    }

    /// Form checks (`validate_login`) are the caller's job; anything that
    /// does not match a stored account is `InvalidCredentials`.
    pub fn authenticate(&mut self, email: &str, password: &str) -> Result<Identity, AuthError> {
        let record = self
            .directory
            .lookup(email)?
            .ok_or(AuthError::InvalidCredentials)?;
        if !verify_password(password, &record.password_hash) {
            log::info!("rejected password for {}", email);
            return Err(AuthError::InvalidCredentials);
        }

        let identity = Identity::new(email, record.name);
        self.persist(&identity)?;
        Ok(identity)
    }

    /// Blocking form of `begin_federated` + `complete_federated`
    pub fn federated_authenticate(&mut self) -> Result<Identity, AuthError> {
        let outcome = self.begin_federated().wait();
        self.complete_federated(outcome)
    }

    /// Starts the provider's consent flow; the UI keeps running meanwhile
    pub fn begin_federated(&mut self) -> PendingSignIn {
        self.provider.begin()
    }

    /// Persists the session once the provider has answered
    pub fn complete_federated(
        &mut self,
        outcome: Result<Identity, ProviderError>,
    ) -> Result<Identity, AuthError> {
        let identity = outcome?;
        log::info!("federated sign-in as {}", identity.email);
        self.persist(&identity)?;
        Ok(identity)
    }

    pub fn current_session(&self) -> Option<Identity> {
        self.sessions.load()
    }

    /// Drops the snapshot and signs out of the provider. Provider failures
    /// are logged only.
    pub fn clear_session(&mut self) -> Result<(), AuthError> {
        if let Err(e) = self.provider.sign_out() {
            log::debug!("provider sign-out failed: {}", e);
        }
        self.sessions.clear()?;
        Ok(())
    }

    fn persist(&self, identity: &Identity) -> Result<(), AuthError> {
        self.sessions.save(identity)?;
        Ok(())
    }
}

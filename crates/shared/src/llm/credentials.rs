use std::fmt;

use rand::Rng;
use rand::seq::SliceRandom;
use thiserror::Error;

/// An upstream API key. `Debug` never prints the secret.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    pub fn new(secret: impl Into<String>) -> Self {
        Self(secret.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(<redacted>)")
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CredentialError {
    #[error("no credentials available")]
    NoCredentials,
}

/// Keys loaded once at startup. Blank values never make it into the pool.
#[derive(Debug, Clone, Default)]
pub struct CredentialPool {
    credentials: Vec<Credential>,
}

impl CredentialPool {
    pub fn from_values<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let credentials = values
            .into_iter()
            .filter_map(|value| {
                let trimmed = value.as_ref().trim();
                if trimmed.is_empty() {
                    None
                } else {
                    Some(Credential::new(trimmed))
                }
            })
            .collect();

        Self { credentials }
    }

    pub fn len(&self) -> usize {
        self.credentials.len()
    }

    pub fn is_empty(&self) -> bool {
        self.credentials.is_empty()
    }

    pub fn contains(&self, credential: &Credential) -> bool {
        self.credentials.contains(credential)
    }

    /// Uniform choice using the caller's RNG.
    pub fn select_with<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
    ) -> Result<&Credential, CredentialError> {
        self.credentials
            .choose(rng)
            .ok_or(CredentialError::NoCredentials)
    }
}

/// Picks one credential uniformly at random. Stateless across calls.
pub fn select_credential(pool: &CredentialPool) -> Result<&Credential, CredentialError> {
    pool.select_with(&mut rand::thread_rng())
}

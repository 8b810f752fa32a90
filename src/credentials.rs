//! Credential lookup boundary for personal knowledge sources.
//!
//! Kenning never runs OAuth flows or persists tokens. A [`TokenStore`]
//! owned by the host application hands over a per-user [`Credential`]
//! when one exists.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;

use crate::error::{KenningError, Result};

/// An opaque bearer credential. `Debug` never prints the secret.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    /// Wrap a secret value.
    pub fn new(secret: impl Into<String>) -> Self {
        Self(secret.into())
    }

    /// The secret, for building an `Authorization` header.
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Credential(<redacted>)")
    }
}

/// Source of per-user credentials.
#[async_trait]
pub trait TokenStore: Send + Sync {
    /// The credential for `user_id`, or `None` if the user has not connected.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing store cannot be read.
    async fn get_token(&self, user_id: &str) -> Result<Option<Credential>>;
}

/// A process-local store, for tests and embedding.
#[derive(Debug, Default)]
pub struct InMemoryTokenStore {
    tokens: RwLock<HashMap<String, Credential>>,
}

impl InMemoryTokenStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the credential for `user_id`, replacing any previous one.
    pub fn insert(&self, user_id: impl Into<String>, credential: Credential) {
        if let Ok(mut tokens) = self.tokens.write() {
            tokens.insert(user_id.into(), credential);
        }
    }

    /// Forget the credential for `user_id`.
    pub fn remove(&self, user_id: &str) -> Option<Credential> {
        self.tokens.write().ok()?.remove(user_id)
    }
}

#[async_trait]
impl TokenStore for InMemoryTokenStore {
    async fn get_token(&self, user_id: &str) -> Result<Option<Credential>> {
        let tokens = self
            .tokens
            .read()
            .map_err(|_| KenningError::PersonalSourceUnavailable("token store poisoned".into()))?;
        Ok(tokens.get(user_id).cloned())
    }
}

/// Hands the same credential to every user. Used by the CLI.
#[derive(Debug, Clone, Default)]
pub struct StaticTokenStore(Option<Credential>);

impl StaticTokenStore {
    /// A store that returns `credential` for every user.
    pub fn new(credential: Option<Credential>) -> Self {
        Self(credential)
    }
}

#[async_trait]
impl TokenStore for StaticTokenStore {
    async fn get_token(&self, _user_id: &str) -> Result<Option<Credential>> {
        Ok(self.0.clone())
    }
}

//! Resolution of the webhook signing secret.
//!
//! The secret can live in more than one place. A [`SecretChain`] holds an ordered list of [`SecretSource`]s and
//! returns the first non-blank value it finds. The default chain used by the server is
//! 1. the `secrets` table in the order store ([`StoreSecretSource`]), then
//! 2. an environment variable with the same name ([`EnvSecretSource`]).
//!
//! A source that errors (e.g. the database is unreachable) is logged and skipped, so the next source gets a chance.
use std::{env, fmt::Debug};

use feg_common::Secret;
use futures_util::{future::LocalBoxFuture, FutureExt};
use log::*;
use thiserror::Error;

use crate::traits::SecretStore;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SecretResolutionError {
    #[error("Webhook secret '{0}' is not configured in any secret source")]
    NotFound(String),
    #[error("Could not read from secret source '{0}': {1}")]
    SourceUnavailable(&'static str, String),
}

/// Resolves a named secret.
#[allow(async_fn_in_trait)]
pub trait SecretResolver {
    async fn resolve(&self, name: &str) -> Result<Secret<String>, SecretResolutionError>;
}

/// A single place a secret may be stored.
pub trait SecretSource: Send + Sync {
    fn source_name(&self) -> &'static str;

    fn lookup<'a>(&'a self, name: &'a str) -> LocalBoxFuture<'a, Result<Option<Secret<String>>, SecretResolutionError>>;
}

//--------------------------------------      SecretChain      ---------------------------------------------------------
#[derive(Default)]
pub struct SecretChain {
    sources: Vec<Box<dyn SecretSource>>,
}

impl Debug for SecretChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names = self.sources.iter().map(|s| s.source_name()).collect::<Vec<_>>();
        write!(f, "SecretChain({})", names.join(" -> "))
    }
}

impl SecretChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_source<S: SecretSource + 'static>(mut self, source: S) -> Self {
        self.sources.push(Box::new(source));
        self
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }
}

impl SecretResolver for SecretChain {
    async fn resolve(&self, name: &str) -> Result<Secret<String>, SecretResolutionError> {
        for source in &self.sources {
            match source.lookup(name).await {
                Ok(Some(secret)) if !secret.is_blank() => {
                    trace!("🔑️ Secret '{name}' resolved from {}", source.source_name());
                    return Ok(secret);
                },
                Ok(_) => trace!("🔑️ Secret '{name}' is not set in {}", source.source_name()),
                Err(e) => warn!("🔑️ {e}. Trying the next secret source."),
            }
        }
        error!("🔑️ Secret '{name}' could not be resolved from any of {} sources", self.sources.len());
        Err(SecretResolutionError::NotFound(name.to_string()))
    }
}

impl<T: SecretResolver> SecretResolver for std::sync::Arc<T> {
    async fn resolve(&self, name: &str) -> Result<Secret<String>, SecretResolutionError> {
        self.as_ref().resolve(name).await
    }
}

//--------------------------------------   StoreSecretSource   ---------------------------------------------------------
/// Reads secrets from the backend's `secrets` table.
#[derive(Clone)]
pub struct StoreSecretSource<B> {
    store: B,
}

impl<B> StoreSecretSource<B> {
    pub fn new(store: B) -> Self {
        Self { store }
    }
}

impl<B: SecretStore + Send + Sync> SecretSource for StoreSecretSource<B> {
    fn source_name(&self) -> &'static str {
        "secret store"
    }

    fn lookup<'a>(&'a self, name: &'a str) -> LocalBoxFuture<'a, Result<Option<Secret<String>>, SecretResolutionError>> {
        async move {
            self.store
                .fetch_secret(name)
                .await
                .map_err(|e| SecretResolutionError::SourceUnavailable(self.source_name(), e.to_string()))
        }
        .boxed_local()
    }
}

//--------------------------------------    EnvSecretSource    ---------------------------------------------------------
#[derive(Debug, Clone, Copy, Default)]
pub struct EnvSecretSource;

impl SecretSource for EnvSecretSource {
    fn source_name(&self) -> &'static str {
        "environment"
    }

    fn lookup<'a>(&'a self, name: &'a str) -> LocalBoxFuture<'a, Result<Option<Secret<String>>, SecretResolutionError>> {
        let value = env::var(name).ok().map(Secret::new);
        async move { Ok(value) }.boxed_local()
    }
}

//--------------------------------------  StaticSecretSource   ---------------------------------------------------------
/// A fixed secret, regardless of the name requested. Handy for tests and local tooling.
#[derive(Debug, Clone)]
pub struct StaticSecretSource(Secret<String>);

impl StaticSecretSource {
    pub fn new<S: Into<String>>(secret: S) -> Self {
        Self(Secret::new(secret.into()))
    }
}

impl SecretSource for StaticSecretSource {
    fn source_name(&self) -> &'static str {
        "static"
    }

    fn lookup<'a>(&'a self, _name: &'a str) -> LocalBoxFuture<'a, Result<Option<Secret<String>>, SecretResolutionError>> {
        let value = Some(self.0.clone());
        async move { Ok(value) }.boxed_local()
    }
}

use chrono::{Duration, Utc};
use log::*;
use thiserror::Error;

use crate::checkout::{
    event::{PayloadError, WebhookEvent},
    secrets::{SecretResolutionError, SecretResolver},
    signature::{verify_signature, SignatureError, SignatureHeader, DEFAULT_TOLERANCE_SECONDS},
};

pub const DEFAULT_SECRET_NAME: &str = "STRIPE_WEBHOOK_SECRET";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VerificationError {
    #[error("{0}")]
    Signature(#[from] SignatureError),
    #[error("{0}")]
    SecretUnavailable(#[from] SecretResolutionError),
    #[error("{0}")]
    MalformedPayload(#[from] PayloadError),
}

/// Authenticates raw webhook deliveries and turns them into typed [`WebhookEvent`]s.
///
/// The order of checks is fixed: header structure, secret resolution, HMAC comparison, timestamp tolerance, and only
/// then is the body parsed.
#[derive(Debug, Clone)]
pub struct WebhookVerifier<R> {
    resolver: R,
    secret_name: String,
    tolerance: Option<Duration>,
}

impl<R> WebhookVerifier<R> {
    pub fn new(resolver: R) -> Self {
        Self {
            resolver,
            secret_name: DEFAULT_SECRET_NAME.to_string(),
            tolerance: Some(Duration::seconds(DEFAULT_TOLERANCE_SECONDS)),
        }
    }

    pub fn with_secret_name<S: Into<String>>(mut self, name: S) -> Self {
        self.secret_name = name.into();
        self
    }

    /// Sets the maximum signature age. `None` disables the check.
    pub fn with_tolerance(mut self, tolerance: Option<Duration>) -> Self {
        self.tolerance = tolerance;
        self
    }

    pub fn secret_name(&self) -> &str {
        &self.secret_name
    }

    pub fn resolver(&self) -> &R {
        &self.resolver
    }
}

impl<R: SecretResolver> WebhookVerifier<R> {
    pub async fn verify(&self, body: &[u8], signature_header: Option<&str>) -> Result<WebhookEvent, VerificationError> {
        let header = SignatureHeader::parse(signature_header)?;
        let secret = self.resolver.resolve(&self.secret_name).await?;
        let timestamp = verify_signature(body, &header, &secret, self.tolerance, Utc::now())?;
        let event = WebhookEvent::from_slice(body)?;
        debug!("🔏️ Verified {} event signed at {timestamp}", event.event_type());
        Ok(event)
    }
}

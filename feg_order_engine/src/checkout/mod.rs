//! # Checkout webhook intake
//!
//! Everything needed to go from a raw provider webhook delivery to a [`NormalizedCheckout`]:
//! * [`signature`]: the timestamped HMAC signature scheme.
//! * [`secrets`]: resolution of the signing secret from an ordered chain of sources.
//! * [`WebhookVerifier`]: authenticates a delivery and only then parses it into a [`WebhookEvent`].
//! * [`normalizer`]: projects the loosely-typed session object onto validated, typed fields.
pub mod event;
pub mod normalizer;
pub mod secrets;
pub mod signature;
mod verifier;

pub use event::{PayloadError, WebhookEvent};
pub use normalizer::{normalize_checkout, normalize_payment_failure, FailedPayment, LineItem, NormalizedCheckout};
pub use secrets::{
    EnvSecretSource,
    SecretChain,
    SecretResolutionError,
    SecretResolver,
    SecretSource,
    StaticSecretSource,
    StoreSecretSource,
};
pub use signature::{compute_signature, SignatureError, SignatureHeader, SIGNATURE_HEADER};
pub use verifier::{VerificationError, WebhookVerifier, DEFAULT_SECRET_NAME};

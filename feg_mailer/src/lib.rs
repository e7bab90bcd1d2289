//! A small client for sending transactional email.
//!
//! Two transports are supported. `console` writes the message to the log instead of sending it, which is what you
//! want during development. `resend` posts the message to the [Resend](https://resend.com) HTTP API.
mod api;
mod config;
mod error;

pub use api::{Email, MailApi};
pub use config::{MailProvider, MailerConfig, DEFAULT_MAIL_FROM, RESEND_API_URL};
pub use error::MailerError;

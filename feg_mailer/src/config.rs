use std::{fmt::Display, str::FromStr};

use feg_common::Secret;
use log::*;

use crate::MailerError;

pub const DEFAULT_MAIL_FROM: &str = "Fibre Elite Glow <orders@fibreeliteglow.com>";
pub const RESEND_API_URL: &str = "https://api.resend.com/emails";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MailProvider {
    /// Log the message rather than sending it
    #[default]
    Console,
    Resend,
}

impl FromStr for MailProvider {
    type Err = MailerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "console" | "log" => Ok(Self::Console),
            "resend" => Ok(Self::Resend),
            other => Err(MailerError::UnknownProvider(other.to_string())),
        }
    }
}

impl Display for MailProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Console => write!(f, "console"),
            Self::Resend => write!(f, "resend"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct MailerConfig {
    pub provider: MailProvider,
    pub api_key: Secret<String>,
    pub from: String,
    pub api_url: String,
}

impl Default for MailerConfig {
    fn default() -> Self {
        Self {
            provider: MailProvider::Console,
            api_key: Secret::default(),
            from: DEFAULT_MAIL_FROM.to_string(),
            api_url: RESEND_API_URL.to_string(),
        }
    }
}

impl MailerConfig {
    pub fn new_from_env_or_default() -> Self {
        let provider = std::env::var("FEG_MAIL_PROVIDER")
            .ok()
            .map(|s| {
                s.parse::<MailProvider>().unwrap_or_else(|e| {
                    warn!("📧️ {e}. Emails will be written to the log instead.");
                    MailProvider::Console
                })
            })
            .unwrap_or_default();
        let api_key = Secret::new(std::env::var("FEG_RESEND_API_KEY").unwrap_or_default());
        if provider == MailProvider::Resend && api_key.is_blank() {
            warn!("📧️ FEG_RESEND_API_KEY is not set. The mail provider will reject every message.");
        }
        let from = std::env::var("FEG_MAIL_FROM").unwrap_or_else(|_| {
            info!("📧️ FEG_MAIL_FROM not set, using {DEFAULT_MAIL_FROM}");
            DEFAULT_MAIL_FROM.to_string()
        });
        let api_url = std::env::var("FEG_RESEND_API_URL").unwrap_or_else(|_| RESEND_API_URL.to_string());
        Self { provider, api_key, from, api_url }
    }
}

use std::{env, net::IpAddr};

use chrono::Duration;
use feg_common::parse_boolean_flag;
use feg_mailer::MailerConfig;
use feg_order_engine::{checkout::DEFAULT_SECRET_NAME, sqlite_db::db_url};
use log::*;

const DEFAULT_FEG_HOST: &str = "127.0.0.1";
const DEFAULT_FEG_PORT: u16 = 8370;
const DEFAULT_SIGNATURE_TOLERANCE: i64 = 300;
const DEFAULT_ADMIN_EMAIL: &str = "admin@fibreeliteglow.com";
const DEFAULT_SUPPORT_EMAIL: &str = "support@lbve.ca";
const DEFAULT_NOTIFICATION_BUFFER: usize = 25;

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    /// If true, the X-Forwarded-For header will be used to determine the client's IP address, rather than the
    /// connection's remote address.
    pub use_x_forwarded_for: bool,
    /// If true, the Forwarded header will be used to determine the client's IP address, rather than the
    /// connection's remote address.
    pub use_forwarded: bool,
    pub webhook: WebhookConfig,
    pub notifications: NotificationConfig,
    pub mailer: MailerConfig,
}

#[derive(Clone, Debug)]
pub struct WebhookConfig {
    /// The name under which the signing secret is stored, in the `secrets` table or the environment
    pub secret_name: String,
    /// The maximum age of a signature. `None` disables the timestamp check.
    pub tolerance: Option<Duration>,
    /// If supplied, requests against /webhooks endpoints will be checked against this list of IP addresses.
    pub whitelist: Option<Vec<IpAddr>>,
}

#[derive(Clone, Debug)]
pub struct NotificationConfig {
    pub admin_email: String,
    pub support_email: String,
    /// The capacity of each event hook queue
    pub buffer_size: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_FEG_HOST.to_string(),
            port: DEFAULT_FEG_PORT,
            database_url: String::default(),
            use_x_forwarded_for: false,
            use_forwarded: false,
            webhook: WebhookConfig::default(),
            notifications: NotificationConfig::default(),
            mailer: MailerConfig::default(),
        }
    }
}

impl Default for WebhookConfig {
    fn default() -> Self {
        Self {
            secret_name: DEFAULT_SECRET_NAME.to_string(),
            tolerance: Some(Duration::seconds(DEFAULT_SIGNATURE_TOLERANCE)),
            whitelist: None,
        }
    }
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            admin_email: DEFAULT_ADMIN_EMAIL.to_string(),
            support_email: DEFAULT_SUPPORT_EMAIL.to_string(),
            buffer_size: DEFAULT_NOTIFICATION_BUFFER,
        }
    }
}

impl ServerConfig {
    pub fn new(host: &str, port: u16) -> Self {
        Self { host: host.to_string(), port, ..Default::default() }
    }

    pub fn from_env_or_default() -> Self {
        let host = env::var("FEG_HOST").ok().unwrap_or_else(|| DEFAULT_FEG_HOST.into());
        let port = env::var("FEG_PORT")
            .map(|s| {
                s.parse::<u16>().unwrap_or_else(|e| {
                    error!(
                        "🪛️ {s} is not a valid port for FEG_PORT. {e} Using the default, {DEFAULT_FEG_PORT}, instead."
                    );
                    DEFAULT_FEG_PORT
                })
            })
            .ok()
            .unwrap_or(DEFAULT_FEG_PORT);
        let database_url = db_url();
        let use_x_forwarded_for = parse_boolean_flag(env::var("FEG_USE_X_FORWARDED_FOR").ok(), false);
        let use_forwarded = parse_boolean_flag(env::var("FEG_USE_FORWARDED").ok(), false);
        Self {
            host,
            port,
            database_url,
            use_x_forwarded_for,
            use_forwarded,
            webhook: WebhookConfig::from_env_or_default(),
            notifications: NotificationConfig::from_env_or_default(),
            mailer: MailerConfig::new_from_env_or_default(),
        }
    }
}

impl WebhookConfig {
    pub fn from_env_or_default() -> Self {
        let secret_name = env::var("FEG_WEBHOOK_SECRET_NAME").ok().filter(|s| !s.trim().is_empty()).unwrap_or_else(|| {
            info!("🪛️ FEG_WEBHOOK_SECRET_NAME is not set. Using {DEFAULT_SECRET_NAME}.");
            DEFAULT_SECRET_NAME.to_string()
        });
        let tolerance = parse_tolerance(env::var("FEG_SIGNATURE_TOLERANCE").ok());
        match tolerance {
            Some(t) => info!("🪛️ Webhook signatures older than {}s will be rejected", t.num_seconds()),
            None => warn!("🚨️ Webhook signature timestamp checks are disabled. Replayed deliveries will be accepted."),
        }
        let whitelist = env::var("FEG_STRIPE_IP_WHITELIST").ok().and_then(|s| parse_ip_whitelist(&s));
        match &whitelist {
            Some(whitelist) if whitelist.is_empty() => {
                warn!(
                    "🚨️ The webhook IP whitelist was configured, but is empty.  The server will run, but won't \
                     authorise any incoming webhook requests."
                );
            },
            None => {
                info!("🪛️ No webhook IP whitelist is set. Only signature validation will be used.");
            },
            Some(v) => {
                let addrs = v.iter().map(|a| a.to_string()).collect::<Vec<_>>().join(", ");
                info!("🪛️ Webhook IP whitelist: {addrs}");
            },
        }
        Self { secret_name, tolerance, whitelist }
    }
}

impl NotificationConfig {
    pub fn from_env_or_default() -> Self {
        let admin_email = env::var("FEG_ADMIN_EMAIL").ok().unwrap_or_else(|| {
            info!("🪛️ FEG_ADMIN_EMAIL is not set. Admin alerts will go to {DEFAULT_ADMIN_EMAIL}");
            DEFAULT_ADMIN_EMAIL.to_string()
        });
        let support_email = env::var("FEG_SUPPORT_EMAIL").ok().unwrap_or_else(|| DEFAULT_SUPPORT_EMAIL.to_string());
        let buffer_size = env::var("FEG_NOTIFICATION_BUFFER")
            .ok()
            .and_then(|s| {
                s.parse::<usize>()
                    .map_err(|e| warn!("🪛️ Invalid configuration value for FEG_NOTIFICATION_BUFFER. {e}"))
                    .ok()
            })
            .unwrap_or(DEFAULT_NOTIFICATION_BUFFER);
        Self { admin_email, support_email, buffer_size }
    }
}

/// Parses the signature tolerance in seconds. Zero disables the check; anything unreadable falls back to the default.
pub fn parse_tolerance(value: Option<String>) -> Option<Duration> {
    let secs = match value {
        None => DEFAULT_SIGNATURE_TOLERANCE,
        Some(s) => s.trim().parse::<i64>().unwrap_or_else(|e| {
            warn!("🪛️ Invalid configuration value for FEG_SIGNATURE_TOLERANCE ({s}). {e}");
            DEFAULT_SIGNATURE_TOLERANCE
        }),
    };
    (secs > 0).then(|| Duration::seconds(secs))
}

/// Parses a comma-separated list of IP addresses. "none", "false" and "0" explicitly disable the whitelist.
/// Invalid entries are skipped.
pub fn parse_ip_whitelist(value: &str) -> Option<Vec<IpAddr>> {
    if ["none", "false", "0", ""].contains(&value.trim().to_lowercase().as_str()) {
        return None;
    }
    let ip_addrs = value
        .split(',')
        .map(str::trim)
        .filter_map(|s| {
            s.parse::<IpAddr>()
                .map_err(|e| warn!("🪛️ Ignoring invalid IP address ({s}) in FEG_STRIPE_IP_WHITELIST: {e}"))
                .ok()
        })
        .collect::<Vec<IpAddr>>();
    Some(ip_addrs)
}

//-------------------------------------------------  ServerOptions  ----------------------------------------------------
/// A subset of the server configuration that route handlers may need. Keep secrets out of it.
#[derive(Clone, Copy, Debug, Default)]
pub struct ServerOptions {
    pub use_x_forwarded_for: bool,
    pub use_forwarded: bool,
}

impl ServerOptions {
    pub fn from_config(config: &ServerConfig) -> Self {
        Self { use_x_forwarded_for: config.use_x_forwarded_for, use_forwarded: config.use_forwarded }
    }
}

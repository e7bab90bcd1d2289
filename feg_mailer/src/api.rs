use std::sync::Arc;

use log::*;
use reqwest::{
    header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE},
    Client,
};
use serde::{Deserialize, Serialize};

use crate::{MailProvider, MailerConfig, MailerError};

/// A single outbound message. `text` is the plain-text alternative to `html`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Email {
    pub to: String,
    pub subject: String,
    pub html: String,
    pub text: String,
}

impl Email {
    pub fn new<T: Into<String>, S: Into<String>>(to: T, subject: S) -> Self {
        Self { to: to.into(), subject: subject.into(), ..Default::default() }
    }

    pub fn with_html<S: Into<String>>(mut self, html: S) -> Self {
        self.html = html.into();
        self
    }

    pub fn with_text<S: Into<String>>(mut self, text: S) -> Self {
        self.text = text.into();
        self
    }
}

#[derive(Serialize)]
struct ResendRequest<'a> {
    from: &'a str,
    to: [&'a str; 1],
    subject: &'a str,
    html: &'a str,
    text: &'a str,
}

#[derive(Deserialize)]
struct ResendResponse {
    id: String,
}

#[derive(Clone)]
pub struct MailApi {
    config: MailerConfig,
    client: Arc<Client>,
}

impl MailApi {
    pub fn new(config: MailerConfig) -> Result<Self, MailerError> {
        let mut headers = HeaderMap::with_capacity(2);
        if config.provider == MailProvider::Resend {
            let auth = format!("Bearer {}", config.api_key.reveal());
            let mut val = HeaderValue::from_str(&auth).map_err(|e| MailerError::Initialization(e.to_string()))?;
            val.set_sensitive(true);
            headers.insert(AUTHORIZATION, val);
        }
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        let client = Client::builder()
            .default_headers(headers)
            .build()
            .map_err(|e| MailerError::Initialization(e.to_string()))?;
        Ok(Self { config, client: Arc::new(client) })
    }

    pub fn provider(&self) -> MailProvider {
        self.config.provider
    }

    pub fn sender(&self) -> &str {
        &self.config.from
    }

    /// Sends the message and returns the provider's message id. In console mode the id is `console`.
    pub async fn send_email(&self, email: &Email) -> Result<String, MailerError> {
        if email.to.trim().is_empty() {
            return Err(MailerError::InvalidEmail("The message has no recipient".into()));
        }
        match self.config.provider {
            MailProvider::Console => {
                info!("📧️ [console] To: {} | From: {} | Subject: {}", email.to, self.config.from, email.subject);
                debug!("📧️ [console] Body:\n{}", email.text);
                Ok("console".to_string())
            },
            MailProvider::Resend => self.send_with_resend(email).await,
        }
    }

    async fn send_with_resend(&self, email: &Email) -> Result<String, MailerError> {
        let body = ResendRequest {
            from: &self.config.from,
            to: [&email.to],
            subject: &email.subject,
            html: &email.html,
            text: &email.text,
        };
        trace!("📧️ Posting message for {} to {}", email.to, self.config.api_url);
        let response = self
            .client
            .post(&self.config.api_url)
            .json(&body)
            .send()
            .await
            .map_err(|e| MailerError::RequestError(e.to_string()))?;
        if response.status().is_success() {
            let result =
                response.json::<ResendResponse>().await.map_err(|e| MailerError::RequestError(e.to_string()))?;
            debug!("📧️ Message {} accepted for {}", result.id, email.to);
            Ok(result.id)
        } else {
            let status = response.status().as_u16();
            let message = response.text().await.map_err(|e| MailerError::RequestError(e.to_string()))?;
            Err(MailerError::Rejected { status, message })
        }
    }
}

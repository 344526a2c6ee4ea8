use async_trait::async_trait;
use serde::Serialize;
use std::sync::Arc;

use crate::config::{Config, MailConfig};

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct EmailMessage {
    pub from: String,
    pub to: String,
    pub subject: String,
    pub text: String,
    pub html: String,
}

/// Outbound email transport
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, message: &EmailMessage) -> Result<(), String>;
}

/// Posts each message as JSON to a transactional mail relay
pub struct HttpMailer {
    client: reqwest::Client,
    url: String,
    api_key: Option<String>,
}

impl HttpMailer {
    pub fn new(url: &str, api_key: Option<String>) -> Result<Self, String> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(10))
            .build()
            .map_err(|e| format!("Failed to build HTTP client: {}", e))?;

        Ok(Self {
            client,
            url: url.to_string(),
            api_key,
        })
    }
}

#[async_trait]
impl Mailer for HttpMailer {
    async fn send(&self, message: &EmailMessage) -> Result<(), String> {
        let mut request = self.client.post(&self.url).json(message);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| format!("Mail relay request failed: {}", e))?;

        if !response.status().is_success() {
            return Err(format!("Mail relay returned {}", response.status()));
        }
        Ok(())
    }
}

/// Development transport: writes the message to the log instead of sending it
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, message: &EmailMessage) -> Result<(), String> {
        log::info!("📧 [mail] to={} subject={:?}\n{}", message.to, message.subject, message.text);
        Ok(())
    }
}

pub fn build_mailer(config: &MailConfig) -> Result<Arc<dyn Mailer>, String> {
    match &config.api_url {
        Some(url) => {
            log::info!("📧 Mail relay: {}", url);
            Ok(Arc::new(HttpMailer::new(url, config.api_key.clone())?))
        }
        None => {
            log::warn!("⚠️  MAIL_API_URL not set: emails will only be logged");
            Ok(Arc::new(LogMailer))
        }
    }
}

fn escape_html(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

pub struct Recipient<'a> {
    pub email: &'a str,
    pub name: &'a str,
}

pub fn confirmation_email(config: &Config, to: &Recipient<'_>, token: &str) -> EmailMessage {
    let link = format!("{}/auth/confirm-account", config.frontend_url);
    EmailMessage {
        from: config.mail.from.clone(),
        to: to.email.to_string(),
        subject: "UpTask - Confirm your account".to_string(),
        text: format!(
            "Hi {}, you created an UpTask account.\nYour confirmation code is: {}\nConfirm it at {}\nThis code expires in {} minutes.",
            to.name, token, link, config.token_ttl_minutes
        ),
        html: format!(
            "<h1>Hi {}, you created an UpTask account</h1>\
             <p>Your confirmation code is: <strong>{}</strong></p>\
             <p>Follow the link below to confirm your account</p>\
             <a href=\"{}\">Confirm account</a>\
             <p>This code expires in {} minutes</p>",
            escape_html(to.name),
            token,
            link,
            config.token_ttl_minutes
        ),
    }
}

pub fn password_reset_email(config: &Config, to: &Recipient<'_>, token: &str) -> EmailMessage {
    let link = format!("{}/auth/new-password", config.frontend_url);
    EmailMessage {
        from: config.mail.from.clone(),
        to: to.email.to_string(),
        subject: "UpTask - Reset your password".to_string(),
        text: format!(
            "Hi {}, you asked to reset your UpTask password.\nYour code is: {}\nSet a new password at {}\nThis code expires in {} minutes.",
            to.name, token, link, config.token_ttl_minutes
        ),
        html: format!(
            "<h1>Hi {}, you asked to reset your password</h1>\
             <p>Your code is: <strong>{}</strong></p>\
             <p>Follow the link below to set a new password</p>\
             <a href=\"{}\">Reset password</a>\
             <p>This code expires in {} minutes</p>",
            escape_html(to.name),
            token,
            link,
            config.token_ttl_minutes
        ),
    }
}

/// Sends without failing the request: the user can always ask for a new code.
pub async fn deliver(mailer: &dyn Mailer, message: EmailMessage) {
    match mailer.send(&message).await {
        Ok(()) => log::info!("📧 Email sent to {}: {}", message.to, message.subject),
        Err(e) => log::error!("❌ Failed to send email to {}: {}", message.to, e),
    }
}

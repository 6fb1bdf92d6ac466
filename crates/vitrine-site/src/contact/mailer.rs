//! Outbound email dispatch through the EmailJS REST API.

use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;

use super::form::ContactMessage;

/// EmailJS send endpoint.
pub const EMAILJS_ENDPOINT: &str = "https://api.emailjs.com/api/v1.0/email/send";

/// Request timeout for the email provider.
const SEND_TIMEOUT: Duration = Duration::from_secs(10);

/// Email provider identifiers. All three must be non-empty to send.
#[derive(Debug, Clone, Default)]
pub struct EmailConfig {
    pub service_id: String,
    pub template_id: String,
    pub public_key: String,
}

impl EmailConfig {
    /// Names of the environment variables whose values are empty.
    pub fn missing(&self) -> Vec<&'static str> {
        [
            ("EMAILJS_SERVICE_ID", &self.service_id),
            ("EMAILJS_TEMPLATE_ID", &self.template_id),
            ("EMAILJS_PUBLIC_KEY", &self.public_key),
        ]
        .into_iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(name, _)| name)
        .collect()
    }

    pub fn is_complete(&self) -> bool {
        self.missing().is_empty()
    }
}

/// Delivery failures.
#[derive(Debug, thiserror::Error)]
pub enum MailError {
    #[error("email request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("email provider rejected the message ({status}): {body}")]
    Rejected { status: u16, body: String },
}

/// Sends a validated contact message.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, config: &EmailConfig, message: &ContactMessage) -> Result<(), MailError>;
}

/// EmailJS API request body.
#[derive(Debug, Serialize)]
struct SendRequest<'a> {
    service_id: &'a str,
    template_id: &'a str,
    user_id: &'a str,
    template_params: TemplateParams<'a>,
}

#[derive(Debug, Serialize)]
struct TemplateParams<'a> {
    from_name: &'a str,
    from_email: &'a str,
    reply_to: &'a str,
    subject: &'a str,
    message: &'a str,
}

/// [`Mailer`] backed by EmailJS.
#[derive(Debug, Clone)]
pub struct EmailJsMailer {
    client: reqwest::Client,
    endpoint: String,
}

impl EmailJsMailer {
    pub fn new() -> Result<Self, MailError> {
        Self::with_endpoint(EMAILJS_ENDPOINT)
    }

    pub fn with_endpoint(endpoint: impl Into<String>) -> Result<Self, MailError> {
        let client = reqwest::Client::builder().timeout(SEND_TIMEOUT).build()?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }

    fn request(&self, config: &EmailConfig, message: &ContactMessage) -> reqwest::RequestBuilder {
        let body = SendRequest {
            service_id: &config.service_id,
            template_id: &config.template_id,
            user_id: &config.public_key,
            template_params: TemplateParams {
                from_name: &message.name,
                from_email: &message.email,
                reply_to: &message.email,
                subject: message.subject.as_deref().unwrap_or("Contact form"),
                message: &message.message,
            },
        };

        self.client.post(&self.endpoint).json(&body)
    }
}

#[async_trait]
impl Mailer for EmailJsMailer {
    async fn send(&self, config: &EmailConfig, message: &ContactMessage) -> Result<(), MailError> {
        let resp = self.request(config, message).send().await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(MailError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        tracing::info!(status = status.as_u16(), "contact email accepted by provider");
        Ok(())
    }
}

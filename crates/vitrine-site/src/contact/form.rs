//! Contact form payload and field validation.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Basic `local@domain.tld` shape check.
static EMAIL_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email regex should compile"));

/// Contact form as posted by the frontend.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ContactForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub subject: String,
    #[serde(default)]
    pub message: String,
    /// Honeypot. Hidden from people, so only bots fill it in.
    #[serde(default)]
    pub website: String,
}

/// A validated message, ready to hand to the mailer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContactMessage {
    pub name: String,
    pub email: String,
    pub subject: Option<String>,
    pub message: String,
}

/// User-facing validation failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("please fill in the required fields: {}", .0.join(", "))]
    MissingFields(Vec<&'static str>),

    #[error("please enter a valid email address")]
    InvalidEmail,
}

impl ContactForm {
    /// Whether the honeypot field was filled in. Whitespace counts.
    pub fn is_spam(&self) -> bool {
        !self.website.is_empty()
    }

    /// Check required fields and the email shape.
    pub fn validate(&self) -> Result<ContactMessage, ValidationError> {
        let name = self.name.trim();
        let email = self.email.trim();
        let message = self.message.trim();

        let missing: Vec<&'static str> = [("name", name), ("email", email), ("message", message)]
            .into_iter()
            .filter(|(_, value)| value.is_empty())
            .map(|(field, _)| field)
            .collect();

        if !missing.is_empty() {
            return Err(ValidationError::MissingFields(missing));
        }

        if !EMAIL_REGEX.is_match(email) {
            return Err(ValidationError::InvalidEmail);
        }

        let subject = Some(self.subject.trim())
            .filter(|s| !s.is_empty())
            .map(str::to_string);

        Ok(ContactMessage {
            name: name.to_string(),
            email: email.to_string(),
            subject,
            message: message.to_string(),
        })
    }
}

//! Contact form submission pipeline.
//!
//! A submission goes through, in order:
//! 1. Honeypot: a filled-in hidden field drops the submission silently
//! 2. Field validation
//! 3. Per-client daily rate limit
//! 4. Email configuration check
//! 5. Delivery through the [`Mailer`]
//! 6. Rate limit update, only after delivery succeeded
//!
//! Any failure before step 6 leaves the usage counter untouched.

pub mod form;
pub mod mailer;
pub mod rate_limit;

use std::sync::Arc;

use chrono::NaiveDate;

pub use self::form::{ContactForm, ContactMessage, ValidationError};
pub use self::mailer::{EmailConfig, EmailJsMailer, MailError, Mailer};
pub use self::rate_limit::{
    DAILY_LIMIT, JsonFileUsageStore, MemoryUsageStore, RateLimitCheck, RateLimitRecord,
    StoreError, UsageStore, check_rate_limit, update_rate_limit, usage_key,
};

/// Result of an accepted submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Delivered; `remaining` submissions are left today.
    Sent { remaining: u32 },
    /// Honeypot tripped; nothing was sent or counted.
    Dropped,
}

/// Submission failures.
#[derive(Debug, thiserror::Error)]
pub enum ContactError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("daily submission limit reached")]
    RateLimited,

    /// Email provider settings are missing.
    #[error("email is not configured: missing {}", .0.join(", "))]
    Configuration(Vec<&'static str>),

    #[error("delivery failed: {0}")]
    Delivery(#[from] MailError),
}

/// Runs contact submissions against a usage store and mailer.
pub struct ContactService {
    store: Arc<dyn UsageStore>,
    mailer: Arc<dyn Mailer>,
    email: EmailConfig,
}

impl ContactService {
    pub fn new(store: Arc<dyn UsageStore>, mailer: Arc<dyn Mailer>, email: EmailConfig) -> Self {
        Self {
            store,
            mailer,
            email,
        }
    }

    /// Usage left today for `client`, without changing anything.
    pub fn remaining(&self, client: &str, today: NaiveDate) -> u32 {
        match check_rate_limit(self.store.as_ref(), &usage_key(client), today) {
            RateLimitCheck::Allowed(usage) => usage.remaining(),
            RateLimitCheck::Blocked => 0,
        }
    }

    /// Process one submission from `client` on `today`.
    pub async fn submit(
        &self,
        form: &ContactForm,
        client: &str,
        today: NaiveDate,
    ) -> Result<SubmitOutcome, ContactError> {
        if form.is_spam() {
            tracing::info!(client = %client, "honeypot filled, dropping submission");
            return Ok(SubmitOutcome::Dropped);
        }

        let message = form.validate()?;

        let key = usage_key(client);
        let usage = match check_rate_limit(self.store.as_ref(), &key, today) {
            RateLimitCheck::Allowed(usage) => usage,
            RateLimitCheck::Blocked => {
                tracing::info!(client = %client, "contact rate limit reached");
                return Err(ContactError::RateLimited);
            }
        };

        let missing = self.email.missing();
        if !missing.is_empty() {
            return Err(ContactError::Configuration(missing));
        }

        self.mailer.send(&self.email, &message).await?;

        let store = Arc::clone(&self.store);
        let persisted =
            tokio::task::spawn_blocking(move || update_rate_limit(store.as_ref(), &key, usage))
                .await
                .unwrap_or_else(|e| Err(StoreError::Io(std::io::Error::other(e))));

        let remaining = match persisted {
            Ok(updated) => updated.remaining(),
            Err(e) => {
                // The message is already out; report success and keep going.
                tracing::warn!(client = %client, error = %e, "failed to persist contact usage");
                usage.remaining().saturating_sub(1)
            }
        };

        tracing::info!(client = %client, remaining, "contact message sent");
        Ok(SubmitOutcome::Sent { remaining })
    }
}


#[cfg(test)]
mod tests {
    use super::testing::{RecordingMailer, email_config};
    use super::*;

    const CLIENT: &str = "203.0.113.7";

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()
    }

    fn valid_form() -> ContactForm {
        ContactForm {
            name: "Ana".to_string(),
            email: "ana@example.com".to_string(),
            subject: "Hello".to_string(),
            message: "Is this thing on?".to_string(),
            website: String::new(),
        }
    }

    fn service(mailer: Arc<RecordingMailer>, email: EmailConfig) -> (ContactService, Arc<MemoryUsageStore>) {
        let store = Arc::new(MemoryUsageStore::new());
        (ContactService::new(store.clone(), mailer, email), store)
    }

    #[tokio::test]
    async fn test_successful_submission_counts() {
        let mailer = Arc::new(RecordingMailer::default());
        let (svc, store) = service(mailer.clone(), email_config());

        let outcome = svc.submit(&valid_form(), CLIENT, today()).await.unwrap();

        assert_eq!(outcome, SubmitOutcome::Sent { remaining: DAILY_LIMIT - 1 });
        assert_eq!(mailer.sent_count(), 1);
        assert_eq!(store.load(&usage_key(CLIENT)).unwrap().count, 1);
    }

    #[tokio::test]
    async fn test_honeypot_never_sends_or_counts() {
        let forms = [
            valid_form(),
            ContactForm {
                email: "nope".to_string(),
                ..valid_form()
            },
            ContactForm::default(),
        ];

        for (form, website) in forms.into_iter().zip(["filled by a bot", " ", "\t"]) {
            let mailer = Arc::new(RecordingMailer::default());
            let (svc, store) = service(mailer.clone(), email_config());
            let form = ContactForm {
                website: website.to_string(),
                ..form
            };

            let outcome = svc.submit(&form, CLIENT, today()).await.unwrap();

            assert_eq!(outcome, SubmitOutcome::Dropped);
            assert_eq!(mailer.sent_count(), 0);
            assert!(store.load(&usage_key(CLIENT)).is_none());
        }
    }

    #[tokio::test]
    async fn test_whitespace_honeypot_is_dropped() {
        let mailer = Arc::new(RecordingMailer::default());
        let (svc, store) = service(mailer.clone(), email_config());
        let form = ContactForm {
            website: " ".to_string(),
            ..valid_form()
        };

        let outcome = svc.submit(&form, CLIENT, today()).await.unwrap();

        assert_eq!(outcome, SubmitOutcome::Dropped);
        assert_eq!(mailer.sent_count(), 0);
        assert!(store.load(&usage_key(CLIENT)).is_none());
    }

    #[tokio::test]
    async fn test_validation_error_mutates_nothing() {
        let mailer = Arc::new(RecordingMailer::default());
        let (svc, store) = service(mailer.clone(), email_config());
        let form = ContactForm {
            email: "not-an-email".to_string(),
            ..valid_form()
        };

        let err = svc.submit(&form, CLIENT, today()).await.unwrap_err();

        assert!(matches!(err, ContactError::Validation(ValidationError::InvalidEmail)));
        assert_eq!(mailer.sent_count(), 0);
        assert!(store.load(&usage_key(CLIENT)).is_none());
    }

    #[tokio::test]
    async fn test_rate_limit_blocks_before_sending() {
        let mailer = Arc::new(RecordingMailer::default());
        let (svc, _store) = service(mailer.clone(), email_config());

        for _ in 0..DAILY_LIMIT {
            svc.submit(&valid_form(), CLIENT, today()).await.unwrap();
        }
        let err = svc.submit(&valid_form(), CLIENT, today()).await.unwrap_err();

        assert!(matches!(err, ContactError::RateLimited));
        assert_eq!(mailer.sent_count(), DAILY_LIMIT as usize);
        assert_eq!(svc.remaining(CLIENT, today()), 0);

        let tomorrow = today().succ_opt().unwrap();
        let outcome = svc.submit(&valid_form(), CLIENT, tomorrow).await.unwrap();
        assert_eq!(outcome, SubmitOutcome::Sent { remaining: DAILY_LIMIT - 1 });
    }

    #[tokio::test]
    async fn test_missing_configuration_fails_fast() {
        let mailer = Arc::new(RecordingMailer::default());
        let email = EmailConfig {
            public_key: String::new(),
            ..email_config()
        };
        let (svc, store) = service(mailer.clone(), email);

        let err = svc.submit(&valid_form(), CLIENT, today()).await.unwrap_err();

        assert!(matches!(err, ContactError::Configuration(ref m) if m == &vec!["EMAILJS_PUBLIC_KEY"]));
        assert_eq!(mailer.sent_count(), 0);
        assert!(store.load(&usage_key(CLIENT)).is_none());
    }

    #[tokio::test]
    async fn test_delivery_failure_does_not_count() {
        let mailer = Arc::new(RecordingMailer::failing());
        let (svc, store) = service(mailer.clone(), email_config());

        let err = svc.submit(&valid_form(), CLIENT, today()).await.unwrap_err();

        assert!(matches!(err, ContactError::Delivery(_)));
        assert!(store.load(&usage_key(CLIENT)).is_none());
        assert_eq!(svc.remaining(CLIENT, today()), DAILY_LIMIT);
    }

    #[tokio::test]
    async fn test_clients_counted_separately() {
        let mailer = Arc::new(RecordingMailer::default());
        let (svc, _store) = service(mailer, email_config());

        for _ in 0..DAILY_LIMIT {
            svc.submit(&valid_form(), "a", today()).await.unwrap();
        }
        assert!(svc.submit(&valid_form(), "a", today()).await.is_err());
        assert!(svc.submit(&valid_form(), "b", today()).await.is_ok());
    }

    #[test]
    fn test_configuration_error_display() {
        let err = ContactError::Configuration(vec!["EMAILJS_SERVICE_ID", "EMAILJS_PUBLIC_KEY"]);
        assert_eq!(
            err.to_string(),
            "email is not configured: missing EMAILJS_SERVICE_ID, EMAILJS_PUBLIC_KEY"
        );
    }
}

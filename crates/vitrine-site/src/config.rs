//! Application configuration loaded from environment variables.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;

use crate::cache::{DEFAULT_TTL, SweepPolicy};
use crate::contact::EmailConfig;

/// Application configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Server bind address (e.g., "0.0.0.0:8080").
    pub bind_addr: String,

    /// Build output directory of the single-page app.
    pub dist_dir: PathBuf,

    /// Site name shown in rendered page titles.
    pub site_name: String,

    /// Supabase project URL. Empty disables page reads.
    pub supabase_url: String,

    /// Supabase anonymous API key.
    pub supabase_anon_key: String,

    /// Outbound email identifiers. Checked at submit time, not here.
    pub email: EmailConfig,

    /// Default cache TTL and sweep interval.
    pub cache_ttl: Duration,

    /// Age limit the cache sweep applies.
    pub sweep_policy: SweepPolicy,

    /// JSON file for contact usage records. `None` keeps them in memory.
    pub usage_path: Option<PathBuf>,

    /// Bearer token for cache administration. `None` disables those routes.
    pub admin_token: Option<String>,

    /// Take the client address from `X-Forwarded-For` / `X-Real-IP`.
    /// Only safe behind a proxy that overwrites those headers.
    pub trust_proxy: bool,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Required:
    /// - None (all have defaults for local development)
    ///
    /// Optional:
    /// - `SITE_BIND_ADDR`: Server bind address (default: "0.0.0.0:8080")
    /// - `SITE_DIST_DIR`: SPA build output (default: "dist")
    /// - `SITE_NAME`: Site name (default: "Vitrine")
    /// - `SUPABASE_URL`, `SUPABASE_ANON_KEY`: Content service (default: empty)
    /// - `EMAILJS_SERVICE_ID`, `EMAILJS_TEMPLATE_ID`, `EMAILJS_PUBLIC_KEY`: Email (default: empty)
    /// - `CACHE_TTL_SECS`: Default cache TTL in seconds (default: 300)
    /// - `CACHE_SWEEP_POLICY`: "default-ttl" or "entry-ttl" (default: "default-ttl")
    /// - `CONTACT_USAGE_PATH`: JSON file for contact usage records
    /// - `SITE_ADMIN_TOKEN`: Bearer token for cache administration
    /// - `SITE_TRUST_PROXY`: Trust proxy client-address headers (default: false)
    pub fn from_env() -> anyhow::Result<Self> {
        let bind_addr = env_or("SITE_BIND_ADDR", "0.0.0.0:8080");
        let dist_dir = PathBuf::from(env_or("SITE_DIST_DIR", "dist"));
        let site_name = env_or("SITE_NAME", "Vitrine");

        let supabase_url = env_or("SUPABASE_URL", "")
            .trim_end_matches('/')
            .to_string();
        let supabase_anon_key = env_or("SUPABASE_ANON_KEY", "");

        let email = EmailConfig {
            service_id: env_or("EMAILJS_SERVICE_ID", ""),
            template_id: env_or("EMAILJS_TEMPLATE_ID", ""),
            public_key: env_or("EMAILJS_PUBLIC_KEY", ""),
        };

        let cache_ttl = match std::env::var("CACHE_TTL_SECS") {
            Ok(raw) => {
                let secs: u64 = raw
                    .trim()
                    .parse()
                    .with_context(|| format!("CACHE_TTL_SECS is not a number: {raw:?}"))?;
                if secs == 0 {
                    anyhow::bail!("CACHE_TTL_SECS must be greater than zero");
                }
                Duration::from_secs(secs)
            }
            Err(_) => DEFAULT_TTL,
        };

        let sweep_policy = match std::env::var("CACHE_SWEEP_POLICY") {
            Ok(raw) => raw.parse().map_err(|e: String| anyhow::anyhow!(e))?,
            Err(_) => SweepPolicy::default(),
        };

        let usage_path = non_empty("CONTACT_USAGE_PATH").map(PathBuf::from);
        let admin_token = non_empty("SITE_ADMIN_TOKEN");
        let trust_proxy = env_flag("SITE_TRUST_PROXY")?;

        tracing::info!(
            bind_addr = %bind_addr,
            dist_dir = %dist_dir.display(),
            site_name = %site_name,
            content_configured = !supabase_url.is_empty() && !supabase_anon_key.is_empty(),
            email_configured = email.is_complete(),
            cache_ttl_secs = cache_ttl.as_secs(),
            sweep_policy = ?sweep_policy,
            usage_path = ?usage_path,
            admin_enabled = admin_token.is_some(),
            trust_proxy,
            "site configuration loaded"
        );

        Ok(Self {
            bind_addr,
            dist_dir,
            site_name,
            supabase_url,
            supabase_anon_key,
            email,
            cache_ttl,
            sweep_policy,
            usage_path,
            admin_token,
            trust_proxy,
        })
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key)
        .map(|v| v.trim().to_string())
        .unwrap_or_else(|_| default.to_string())
}

fn env_flag(key: &str) -> anyhow::Result<bool> {
    match non_empty(key).map(|v| v.to_ascii_lowercase()).as_deref() {
        None | Some("false" | "0" | "no") => Ok(false),
        Some("true" | "1" | "yes") => Ok(true),
        Some(other) => anyhow::bail!("{key} must be true or false, got {other:?}"),
    }
}

fn non_empty(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

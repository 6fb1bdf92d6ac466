//! Vitrine Site - HTTP server for a block-based content site.
//!
//! Hosts the single-page app build and the server-side pieces it relies on.
//!
//! # Architecture
//!
//! - **Content**: Page rows read from Supabase through [`content::ContentSource`]
//! - **Cache**: [`cache::FetchCache`] in front of every content read, swept periodically
//! - **Render**: Block arrays turned into HTML by `vitrine-core`
//! - **Contact**: Honeypot, validation, per-client daily limit and EmailJS delivery
//!
//! # Security
//!
//! - All block text is HTML-escaped by maud; only http(s) URLs reach attributes
//! - Preview pages carry a strict Content-Security-Policy with scripts disabled
//! - Cache administration requires a bearer token and is off without one

pub mod auth;
pub mod cache;
pub mod config;
pub mod contact;
pub mod content;
pub mod error;
pub mod routes;
pub mod state;

pub use config::Config;
pub use error::SiteError;
pub use routes::router;
pub use state::AppState;

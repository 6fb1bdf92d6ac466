//! Route definitions for the site server.
//!
//! ## Routes
//!
//! - `GET /health` - Health check (JSON)
//! - `POST /api/render` - Render a block array to HTML (`?title=` for a full document)
//! - `GET /api/pages` - Page index (JSON)
//! - `GET /api/pages/{slug}` - One page with raw blocks (JSON)
//! - `POST /api/contact` - Contact form submission
//! - `POST /api/cache/invalidate` - Drop one cache key or everything (admin token)
//! - `GET /preview/{slug}` - Server-rendered page (HTML)
//! - anything else - Static files from the SPA build, falling back to `index.html`

mod cache;
mod contact;
mod health;
mod pages;
mod render;

pub use contact::client_key;
pub use pages::{INDEX_KEY, page_key};

use axum::Router;
use axum::middleware;
use axum::routing::{get, post};
use tower_http::services::{ServeDir, ServeFile};

use crate::auth::require_admin;
use crate::state::AppState;

/// Build the complete site router.
pub fn router(state: AppState) -> Router {
    let dist = state.config.dist_dir.clone();
    let spa = ServeDir::new(&dist).fallback(ServeFile::new(dist.join("index.html")));

    let admin = Router::new()
        .route("/cache/invalidate", post(cache::invalidate))
        .layer(middleware::from_fn_with_state(state.clone(), require_admin));

    let api = Router::new()
        .route("/render", post(render::render_handler))
        .route("/pages", get(pages::list_pages))
        .route("/pages/{slug}", get(pages::get_page))
        .route("/contact", post(contact::submit_contact))
        .merge(admin);

    Router::new()
        .route("/health", get(health::health_check))
        .route("/preview/{slug}", get(pages::preview_page))
        .nest("/api", api)
        .fallback_service(spa)
        .with_state(state)
}

//! Content block model and HTML renderer for the Vitrine site.
//!
//! This crate provides:
//! - Typed content blocks validated from the content service's `{type, data}` JSON
//! - Platform video id extraction for embed blocks
//! - A pure, order-preserving block renderer built on maud
//! - A standalone document shell for exported previews
//!
//! Nothing here performs I/O.

pub mod block;
mod error;
pub mod render;
pub mod video;

pub use block::{BlockKind, ContentBlock, RawBlock, is_safe_href, is_safe_url};
pub use error::{Error, Result};
pub use render::components::render_document;
pub use render::{FALLBACK_HTML, render, render_block, render_blocks};
pub use video::extract_video_id;

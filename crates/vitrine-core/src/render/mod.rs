//! HTML rendering for content blocks.
//!
//! Each block type maps to a fixed template. Rendering is pure and total:
//! an element that does not validate into a [`ContentBlock`] renders as
//! nothing, and the rest of the sequence is still emitted in order.
//!
//! All rendering uses [maud](https://maud.lambda.xyz/), so every
//! interpolated value is HTML-escaped. The one exception is ad code, which
//! is ad-network markup and is emitted verbatim.

pub mod components;

use maud::{Markup, PreEscaped, html};
use serde_json::Value;

use self::components::multiline;
use crate::block::{Ad, Button, Capa, ContentBlock, FullImage, ImageText, Text, Video};
use crate::video::embed_url;

/// Fragment returned when there is no block sequence to render.
pub const FALLBACK_HTML: &str = r#"<p class="no-content">No content available.</p>"#;

/// Render a stored block array to an HTML string.
///
/// `null` or any non-array input yields [`FALLBACK_HTML`]. Elements that are
/// malformed, of an unknown type, or missing required fields are skipped.
pub fn render_blocks(input: &Value) -> String {
    let Some(elements) = input.as_array() else {
        return FALLBACK_HTML.to_string();
    };

    let blocks: Vec<ContentBlock> = elements
        .iter()
        .enumerate()
        .filter_map(|(index, element)| match ContentBlock::from_value(element) {
            Ok(block) => Some(block),
            Err(e) => {
                tracing::debug!(index, error = %e, "skipping content block");
                None
            }
        })
        .collect();

    render(&blocks).into_string()
}

/// Render validated blocks top-to-bottom.
pub fn render(blocks: &[ContentBlock]) -> Markup {
    html! {
        @for block in blocks {
            (render_block(block))
        }
    }
}

/// Render a single block with its type's template.
pub fn render_block(block: &ContentBlock) -> Markup {
    match block {
        ContentBlock::Capa(capa) => render_capa(capa),
        ContentBlock::ImageText(it) => render_image_text(it),
        ContentBlock::FullImage(image) => render_full_image(image),
        ContentBlock::Video(video) => render_video(video),
        ContentBlock::Text(text) => render_text(text),
        ContentBlock::Button(button) => render_button(button),
        ContentBlock::Ad(ad) => render_ad(ad),
    }
}

fn render_capa(capa: &Capa) -> Markup {
    let show_body = !capa.hide_text && (capa.title.is_some() || capa.subtitle.is_some());

    html! {
        section class="block block-capa" {
            img class="capa-image" src=(capa.image_url) alt=(capa.title.as_deref().unwrap_or(""));
            @if show_body {
                div class="capa-body" {
                    @if let Some(title) = &capa.title {
                        h1 { (title) }
                    }
                    @if let Some(subtitle) = &capa.subtitle {
                        p { (multiline(subtitle)) }
                    }
                }
            }
        }
    }
}

fn render_image_text(it: &ImageText) -> Markup {
    let class = format!("block block-image-text image-{}", it.image_position.as_str());

    html! {
        section class=(class) {
            @if let Some(src) = &it.image_url {
                div class="image-text-media" {
                    img src=(src) alt=(it.title.as_deref().unwrap_or("")) loading="lazy";
                }
            }
            @if it.title.is_some() || it.text.is_some() {
                div class="image-text-body" {
                    @if let Some(title) = &it.title {
                        h2 { (title) }
                    }
                    @if let Some(text) = &it.text {
                        p { (multiline(text)) }
                    }
                }
            }
        }
    }
}

fn render_full_image(image: &FullImage) -> Markup {
    let alt = image
        .alt
        .as_deref()
        .or(image.caption.as_deref())
        .unwrap_or("");

    html! {
        figure class="block block-full-image" {
            img src=(image.image_url) alt=(alt) loading="lazy";
            @if let Some(caption) = &image.caption {
                figcaption { (caption) }
            }
        }
    }
}

fn render_video(video: &Video) -> Markup {
    let frame_title = video.title.as_deref().unwrap_or("Video");

    html! {
        div class="block block-video" {
            @if let Some(title) = &video.title {
                h2 { (title) }
            }
            div class="video-frame" {
                iframe src=(embed_url(&video.video_id))
                    title=(frame_title)
                    loading="lazy"
                    allow="accelerometer; clipboard-write; encrypted-media; gyroscope; picture-in-picture"
                    allowfullscreen {}
            }
        }
    }
}

fn render_text(text: &Text) -> Markup {
    html! {
        section class="block block-text" {
            @if let Some(title) = &text.title {
                h2 { (title) }
            }
            p { (multiline(&text.content)) }
        }
    }
}

fn render_button(button: &Button) -> Markup {
    let class = format!("button button-{}", button.style.as_str());
    let target = button.new_tab.then_some("_blank");
    let rel = button.new_tab.then_some("noopener noreferrer");

    html! {
        div class="block block-button" {
            a class=(class) href=(button.url) target=[target] rel=[rel] {
                (button.text)
            }
        }
    }
}

fn render_ad(ad: &Ad) -> Markup {
    html! {
        aside class="block block-ad" {
            @if let Some(label) = &ad.label {
                span class="ad-label" { (label) }
            }
            (PreEscaped(&ad.code))
        }
    }
}

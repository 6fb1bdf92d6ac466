//! Typed content blocks.
//!
//! Blocks arrive from the content service as `{ "type": "...", "data": {...} }`
//! objects whose `data` values are strings or booleans. Each block type is
//! validated into its own variant here, so rendering never has to re-check
//! for missing fields.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Error, Result};
use crate::video::extract_video_id;

/// A block exactly as stored by the content service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawBlock {
    /// Block type tag (`capa`, `imageText`, `fullImage`, `video`, `text`, `button`, `ad`).
    #[serde(rename = "type")]
    pub kind: String,
    /// Field values. Anything other than an object behaves as empty.
    #[serde(default)]
    pub data: Value,
}

/// The closed set of block kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockKind {
    Capa,
    ImageText,
    FullImage,
    Video,
    Text,
    Button,
    Ad,
}

impl BlockKind {
    /// Parse a `type` tag.
    pub fn parse(tag: &str) -> Option<Self> {
        match tag {
            "capa" => Some(Self::Capa),
            "imageText" => Some(Self::ImageText),
            "fullImage" => Some(Self::FullImage),
            "video" => Some(Self::Video),
            "text" => Some(Self::Text),
            "button" => Some(Self::Button),
            "ad" => Some(Self::Ad),
            _ => None,
        }
    }

    /// The `type` tag for this kind.
    pub fn tag(self) -> &'static str {
        match self {
            Self::Capa => "capa",
            Self::ImageText => "imageText",
            Self::FullImage => "fullImage",
            Self::Video => "video",
            Self::Text => "text",
            Self::Button => "button",
            Self::Ad => "ad",
        }
    }
}

/// Cover block: a hero image with optional overlaid heading.
#[derive(Debug, Clone, PartialEq)]
pub struct Capa {
    pub image_url: String,
    pub title: Option<String>,
    pub subtitle: Option<String>,
    /// Suppress the heading body even though an image is present.
    pub hide_text: bool,
}

/// Which side of an image/text block the image sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ImagePosition {
    #[default]
    Left,
    Right,
}

impl ImagePosition {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Left => "left",
            Self::Right => "right",
        }
    }
}

/// Image beside text. At least one of `image_url` or `text` is present.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageText {
    pub image_url: Option<String>,
    pub title: Option<String>,
    pub text: Option<String>,
    pub image_position: ImagePosition,
}

/// Edge-to-edge image with optional caption.
#[derive(Debug, Clone, PartialEq)]
pub struct FullImage {
    pub image_url: String,
    pub alt: Option<String>,
    pub caption: Option<String>,
}

/// Embedded platform video.
#[derive(Debug, Clone, PartialEq)]
pub struct Video {
    pub video_id: String,
    pub title: Option<String>,
}

/// Free-text paragraph with optional heading.
#[derive(Debug, Clone, PartialEq)]
pub struct Text {
    pub title: Option<String>,
    pub content: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ButtonStyle {
    #[default]
    Primary,
    Secondary,
}

impl ButtonStyle {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Primary => "primary",
            Self::Secondary => "secondary",
        }
    }
}

/// Call-to-action link.
#[derive(Debug, Clone, PartialEq)]
pub struct Button {
    pub text: String,
    pub url: String,
    pub style: ButtonStyle,
    pub new_tab: bool,
}

/// Ad-network snippet. `code` is trusted markup and is emitted verbatim.
#[derive(Debug, Clone, PartialEq)]
pub struct Ad {
    pub code: String,
    pub label: Option<String>,
}

/// One validated unit of page content.
#[derive(Debug, Clone, PartialEq)]
pub enum ContentBlock {
    Capa(Capa),
    ImageText(ImageText),
    FullImage(FullImage),
    Video(Video),
    Text(Text),
    Button(Button),
    Ad(Ad),
}

impl ContentBlock {
    pub fn kind(&self) -> BlockKind {
        match self {
            Self::Capa(_) => BlockKind::Capa,
            Self::ImageText(_) => BlockKind::ImageText,
            Self::FullImage(_) => BlockKind::FullImage,
            Self::Video(_) => BlockKind::Video,
            Self::Text(_) => BlockKind::Text,
            Self::Button(_) => BlockKind::Button,
            Self::Ad(_) => BlockKind::Ad,
        }
    }

    /// Validated construction. `None` when the block cannot be built.
    pub fn from_raw(raw: &RawBlock) -> Option<Self> {
        Self::try_from(raw).ok()
    }

    /// Build a block from one element of a stored block array.
    pub fn from_value(value: &Value) -> Result<Self> {
        let raw = RawBlock::deserialize(value)?;
        Self::try_from(&raw)
    }
}

impl TryFrom<&RawBlock> for ContentBlock {
    type Error = Error;

    fn try_from(raw: &RawBlock) -> Result<Self> {
        let kind = BlockKind::parse(&raw.kind).ok_or_else(|| Error::UnknownType(raw.kind.clone()))?;
        let fields = Fields {
            kind,
            data: &raw.data,
        };

        let block = match kind {
            BlockKind::Capa => Self::Capa(Capa {
                image_url: fields.required_url("imageUrl")?,
                title: fields.text("title"),
                subtitle: fields.text("subtitle"),
                hide_text: fields.flag("hideText"),
            }),
            BlockKind::ImageText => {
                let image_url = fields.url("imageUrl");
                let text = fields.text("text");
                if image_url.is_none() && text.is_none() {
                    return Err(fields.missing("imageUrl"));
                }
                Self::ImageText(ImageText {
                    image_url,
                    title: fields.text("title"),
                    text,
                    image_position: match fields.text("imagePosition").as_deref() {
                        Some("right") => ImagePosition::Right,
                        _ => ImagePosition::Left,
                    },
                })
            }
            BlockKind::FullImage => Self::FullImage(FullImage {
                image_url: fields.required_url("imageUrl")?,
                alt: fields.text("alt"),
                caption: fields.text("caption"),
            }),
            BlockKind::Video => {
                let url = fields.required_text("url")?;
                let video_id =
                    extract_video_id(&url).ok_or(Error::UnrecognizedVideoUrl(url))?;
                Self::Video(Video {
                    video_id,
                    title: fields.text("title"),
                })
            }
            BlockKind::Text => Self::Text(Text {
                title: fields.text("title"),
                content: fields.required_text("content")?,
            }),
            BlockKind::Button => {
                let text = fields.required_text("text")?;
                let url = fields
                    .text("url")
                    .filter(|u| is_safe_href(u))
                    .ok_or_else(|| fields.missing("url"))?;
                Self::Button(Button {
                    text,
                    url,
                    style: match fields.text("style").as_deref() {
                        Some("secondary") => ButtonStyle::Secondary,
                        _ => ButtonStyle::Primary,
                    },
                    new_tab: fields.flag("newTab"),
                })
            }
            BlockKind::Ad => Self::Ad(Ad {
                code: fields.required_text("code")?,
                label: fields.text("label"),
            }),
        };

        Ok(block)
    }
}

/// Accessor over a block's `data` map.
struct Fields<'a> {
    kind: BlockKind,
    data: &'a Value,
}

impl Fields<'_> {
    /// Trimmed, non-empty string value.
    fn text(&self, key: &str) -> Option<String> {
        self.data
            .get(key)
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    }

    fn required_text(&self, key: &'static str) -> Result<String> {
        self.text(key).ok_or_else(|| self.missing(key))
    }

    /// String value usable as an image source.
    fn url(&self, key: &str) -> Option<String> {
        self.text(key).filter(|u| is_safe_url(u))
    }

    fn required_url(&self, key: &'static str) -> Result<String> {
        self.url(key).ok_or_else(|| self.missing(key))
    }

    /// Boolean flag. Accepts JSON booleans and the strings "true"/"false".
    fn flag(&self, key: &str) -> bool {
        match self.data.get(key) {
            Some(Value::Bool(b)) => *b,
            Some(Value::String(s)) => s.trim().eq_ignore_ascii_case("true"),
            _ => false,
        }
    }

    fn missing(&self, field: &'static str) -> Error {
        Error::MissingField {
            block: self.kind.tag(),
            field,
        }
    }
}

/// Check if a URL is safe to use in a `src` attribute.
pub fn is_safe_url(url: &str) -> bool {
    url.starts_with("https://") || url.starts_with("http://")
}

/// Check if a URL is safe to use as a link target.
///
/// Allows absolute http(s) URLs, root-relative paths, fragments and `mailto:`.
pub fn is_safe_href(url: &str) -> bool {
    is_safe_url(url)
        || (url.starts_with('/') && !url.starts_with("//"))
        || url.starts_with('#')
        || url.starts_with("mailto:")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn build(value: Value) -> Result<ContentBlock> {
        ContentBlock::from_value(&value)
    }

    #[test]
    fn test_kind_tags_roundtrip() {
        for tag in [
            "capa",
            "imageText",
            "fullImage",
            "video",
            "text",
            "button",
            "ad",
        ] {
            assert_eq!(BlockKind::parse(tag).map(BlockKind::tag), Some(tag));
        }
        assert_eq!(BlockKind::parse("Text"), None);
    }

    #[test]
    fn test_capa_requires_image() {
        let err = build(json!({"type": "capa", "data": {}})).unwrap_err();
        assert!(matches!(
            err,
            Error::MissingField {
                block: "capa",
                field: "imageUrl"
            }
        ));
    }

    #[test]
    fn test_capa_hide_text_from_string() {
        let block = build(json!({
            "type": "capa",
            "data": {"imageUrl": "https://cdn.example.com/a.jpg", "title": "Hi", "hideText": "true"}
        }))
        .unwrap();
        let ContentBlock::Capa(capa) = block else {
            panic!("expected capa");
        };
        assert!(capa.hide_text);
        assert_eq!(capa.title.as_deref(), Some("Hi"));
    }

    #[test]
    fn test_image_text_needs_image_or_text() {
        assert!(build(json!({"type": "imageText", "data": {"title": "only a title"}})).is_err());
        assert!(build(json!({"type": "imageText", "data": {"text": "words"}})).is_ok());
        assert!(
            build(json!({"type": "imageText", "data": {"imageUrl": "https://x.io/a.png"}})).is_ok()
        );
    }

    #[test]
    fn test_image_text_position() {
        let block = build(json!({
            "type": "imageText",
            "data": {"text": "a", "imagePosition": "right"}
        }))
        .unwrap();
        let ContentBlock::ImageText(it) = block else {
            panic!("expected imageText");
        };
        assert_eq!(it.image_position, ImagePosition::Right);
    }

    #[test]
    fn test_unsafe_image_url_counts_as_missing() {
        let err = build(json!({
            "type": "fullImage",
            "data": {"imageUrl": "javascript:alert(1)"}
        }))
        .unwrap_err();
        assert!(matches!(err, Error::MissingField { field: "imageUrl", .. }));
    }

    #[test]
    fn test_video_unrecognized_url() {
        let err = build(json!({"type": "video", "data": {"url": "https://vimeo.com/1"}}))
            .unwrap_err();
        assert!(matches!(err, Error::UnrecognizedVideoUrl(_)));
    }

    #[test]
    fn test_video_extracts_id() {
        let block = build(json!({
            "type": "video",
            "data": {"url": "https://youtu.be/abc123"}
        }))
        .unwrap();
        assert_eq!(
            block,
            ContentBlock::Video(Video {
                video_id: "abc123".to_string(),
                title: None
            })
        );
    }

    #[test]
    fn test_button_requires_text_and_url() {
        assert!(build(json!({"type": "button", "data": {"text": "Go"}})).is_err());
        assert!(build(json!({"type": "button", "data": {"url": "/contact"}})).is_err());
        let block = build(json!({
            "type": "button",
            "data": {"text": "Go", "url": "/contact", "newTab": true, "style": "secondary"}
        }))
        .unwrap();
        let ContentBlock::Button(button) = block else {
            panic!("expected button");
        };
        assert!(button.new_tab);
        assert_eq!(button.style, ButtonStyle::Secondary);
    }

    #[test]
    fn test_whitespace_only_counts_as_missing() {
        assert!(build(json!({"type": "text", "data": {"content": "   \n "}})).is_err());
        assert!(build(json!({"type": "ad", "data": {"code": ""}})).is_err());
    }

    #[test]
    fn test_from_raw() {
        let raw = RawBlock {
            kind: "ad".to_string(),
            data: json!({"code": "<ins class=\"adsbygoogle\"></ins>", "label": "Sponsored"}),
        };
        let Some(ContentBlock::Ad(ad)) = ContentBlock::from_raw(&raw) else {
            panic!("expected ad");
        };
        assert_eq!(ad.label.as_deref(), Some("Sponsored"));

        let raw = RawBlock {
            kind: "ad".to_string(),
            data: json!({}),
        };
        assert_eq!(ContentBlock::from_raw(&raw), None);
    }

    #[test]
    fn test_unknown_type() {
        let err = build(json!({"type": "carousel", "data": {}})).unwrap_err();
        assert!(matches!(err, Error::UnknownType(t) if t == "carousel"));
    }

    #[test]
    fn test_non_object_element_is_malformed() {
        assert!(matches!(build(json!("text")), Err(Error::Malformed(_))));
        assert!(matches!(build(json!(42)), Err(Error::Malformed(_))));
    }

    #[test]
    fn test_missing_data_behaves_as_empty() {
        let err = build(json!({"type": "text"})).unwrap_err();
        assert!(matches!(err, Error::MissingField { field: "content", .. }));
        let err = build(json!({"type": "text", "data": null})).unwrap_err();
        assert!(matches!(err, Error::MissingField { field: "content", .. }));
    }

    #[test]
    fn test_is_safe_href() {
        assert!(is_safe_href("https://example.com"));
        assert!(is_safe_href("/contact"));
        assert!(is_safe_href("#form"));
        assert!(is_safe_href("mailto:hello@example.com"));
        assert!(!is_safe_href("//evil.example.com"));
        assert!(!is_safe_href("javascript:alert(1)"));
        assert!(!is_safe_href("data:text/html,hi"));
    }

    #[test]
    fn test_is_safe_url() {
        assert!(is_safe_url("https://example.com/a.png"));
        assert!(is_safe_url("http://example.com/a.png"));
        assert!(!is_safe_url("/a.png"));
        assert!(!is_safe_url("HTTPS://example.com"));
    }
}

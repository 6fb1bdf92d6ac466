//! Shared HTML fragments and the standalone page shell.

use maud::{DOCTYPE, Markup, PreEscaped, html};

/// Inline CSS for exported block documents.
pub const BLOCK_CSS: &str = r#"
*{margin:0;padding:0;box-sizing:border-box}
:root{--bg:#fafafa;--fg:#111;--fg2:#555;--accent:#0b6e4f;--border:rgba(0,0,0,.1)}
body{font-family:Inter,-apple-system,BlinkMacSystemFont,"Segoe UI",Roboto,sans-serif;line-height:1.6;color:var(--fg);background:var(--bg)}
main{max-width:960px;margin:0 auto;padding:1.5rem 1rem}
img{max-width:100%;height:auto;display:block}
.block{margin:0 0 2rem}
.block-capa{position:relative;border-radius:10px;overflow:hidden}
.block-capa .capa-image{width:100%;max-height:480px;object-fit:cover}
.capa-body{position:absolute;inset:auto 0 0 0;padding:1.5rem;background:linear-gradient(transparent,rgba(0,0,0,.65));color:#fff}
.capa-body h1{font-size:2.25rem;letter-spacing:-.02em}
.block-image-text{display:flex;gap:1.5rem;align-items:center}
.block-image-text.image-right{flex-direction:row-reverse}
.image-text-media,.image-text-body{flex:1}
.image-text-media img{border-radius:8px}
.block-full-image img{width:100%;border-radius:8px}
.block-full-image figcaption{font-size:.9rem;color:var(--fg2);margin-top:.5rem;text-align:center}
.video-frame{position:relative;aspect-ratio:16/9}
.video-frame iframe{position:absolute;inset:0;width:100%;height:100%;border:0;border-radius:8px}
.block-text p{font-size:1.05rem;line-height:1.75}
.block h2{font-size:1.4rem;margin-bottom:.75rem}
.block-button{text-align:center}
.button{display:inline-block;padding:.7rem 1.6rem;border-radius:6px;font-weight:600;text-decoration:none}
.button-primary{background:var(--accent);color:#fff}
.button-secondary{border:2px solid var(--accent);color:var(--accent)}
.block-ad{text-align:center}
.ad-label{display:block;font-size:.7rem;text-transform:uppercase;color:var(--fg2);margin-bottom:.25rem}
.no-content{color:var(--fg2);text-align:center}
@media(max-width:640px){.block-image-text,.block-image-text.image-right{flex-direction:column}}
"#;

/// Render free text, turning each newline into a `<br>`.
pub fn multiline(text: &str) -> Markup {
    html! {
        @for (i, line) in text.lines().enumerate() {
            @if i > 0 {
                br;
            }
            (line)
        }
    }
}

/// Wrap rendered block HTML in a complete, self-contained page.
///
/// `body_html` must already be rendered block output.
pub fn render_document(title: &str, site_name: &str, body_html: &str) -> Markup {
    html! {
        (DOCTYPE)
        html lang="en" {
            head {
                meta charset="utf-8";
                meta name="viewport" content="width=device-width, initial-scale=1";
                title { (title) " | " (site_name) }
                meta property="og:title" content=(title);
                meta property="og:site_name" content=(site_name);
                meta property="og:type" content="website";
                style { (PreEscaped(BLOCK_CSS)) }
            }
            body {
                main {
                    (PreEscaped(body_html))
                }
            }
        }
    }
}

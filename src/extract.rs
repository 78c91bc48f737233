//! Anchor and image extraction from fetched HTML
//!
//! All hrefs are resolved with standard URL semantics against the page
//! they appear on, never against the site root.

use scraper::{Html, Selector};
use thiserror::Error;
use tracing::warn;
use url::Url;

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("invalid selector '{selector}': {message}")]
    Selector { selector: String, message: String },
}

/// One anchor: trimmed visible text plus the href resolved to an
/// absolute URL. Text may be empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Link {
    pub text: String,
    pub href: Url,
}

fn selector(css: &str) -> Result<Selector, ExtractError> {
    Selector::parse(css).map_err(|e| ExtractError::Selector {
        selector: css.to_string(),
        message: e.to_string(),
    })
}

/// Collect every `<a>` in document order, skipping anchors with an
/// empty or missing href. When `prefix` is given, only links whose
/// resolved URL starts with it are retained.
pub fn extract_links(
    html: &str,
    base: &Url,
    prefix: Option<&str>,
) -> Result<Vec<Link>, ExtractError> {
    let document = Html::parse_document(html);
    let anchors = selector("a")?;

    let mut links = Vec::new();
    for element in document.select(&anchors) {
        let Some(href) = element.value().attr("href") else {
            continue;
        };
        if href.is_empty() {
            continue;
        }
        let resolved = match base.join(href) {
            Ok(url) => url,
            Err(error) => {
                warn!(href, %error, "skipping unresolvable href");
                continue;
            }
        };
        if let Some(prefix) = prefix {
            if !resolved.as_str().starts_with(prefix) {
                continue;
            }
        }
        let text = element.text().collect::<String>().trim().to_string();
        links.push(Link {
            text,
            href: resolved,
        });
    }

    Ok(links)
}

/// Collect `<img src>` URLs in document order, resolved against the
/// page URL and filtered by allowed extension.
pub fn extract_image_urls(
    html: &str,
    base: &Url,
    allowed_extensions: &[String],
) -> Result<Vec<Url>, ExtractError> {
    let document = Html::parse_document(html);
    let images = selector("img")?;

    let mut urls = Vec::new();
    for element in document.select(&images) {
        let Some(src) = element.value().attr("src") else {
            continue;
        };
        if src.is_empty() {
            continue;
        }
        let resolved = match base.join(src) {
            Ok(url) => url,
            Err(error) => {
                warn!(src, %error, "skipping unresolvable image src");
                continue;
            }
        };
        if has_allowed_extension(&resolved, allowed_extensions) {
            urls.push(resolved);
        }
    }

    Ok(urls)
}

fn has_allowed_extension(url: &Url, allowed: &[String]) -> bool {
    let path = url.path().to_ascii_lowercase();
    allowed.iter().any(|ext| path.ends_with(&format!(".{ext}")))
}

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;
use scraper::{Html, Selector};
use url::Url;

static RE_CSS_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"url\(\s*['"]?([^'")]+?)['"]?\s*\)"#).expect("invalid regex: css url")
});

/// Attributes lazy-loading scripts park the real image URL in before the
/// element scrolls into view.
const LAZY_SRC_ATTRS: [&str; 4] = ["src", "data-src", "data-lazy", "data-original"];

/// Collects every candidate image URL on the page: `img` sources (including
/// lazy-load data attributes and `srcset` entries) plus CSS
/// `background-image` URLs from inline styles and `<style>` blocks.
///
/// Data URIs are dropped, relative URLs are resolved against `page_url`,
/// and duplicates are removed while preserving first-seen order.
pub(crate) fn extract_image_urls(html: &str, page_url: &Url) -> Vec<Url> {
    let document = Html::parse_document(html);
    let mut seen = HashSet::new();
    let mut urls = Vec::new();

    let img_selector = Selector::parse("img").unwrap();
    for img in document.select(&img_selector) {
        for attr in LAZY_SRC_ATTRS {
            if let Some(value) = img.value().attr(attr) {
                push_candidate(value, page_url, &mut seen, &mut urls);
            }
        }
        if let Some(srcset) = img.value().attr("srcset") {
            for candidate in srcset.split(',') {
                // each srcset entry is "<url> <descriptor>"
                if let Some(url) = candidate.split_whitespace().next() {
                    push_candidate(url, page_url, &mut seen, &mut urls);
                }
            }
        }
    }

    let styled_selector = Selector::parse("[style]").unwrap();
    for element in document.select(&styled_selector) {
        let style = element.value().attr("style").unwrap_or("");
        if !style.contains("background") {
            continue;
        }
        for caps in RE_CSS_URL.captures_iter(style) {
            push_candidate(&caps[1], page_url, &mut seen, &mut urls);
        }
    }

    let style_block_selector = Selector::parse("style").unwrap();
    for block in document.select(&style_block_selector) {
        let css = block.text().collect::<String>();
        for caps in RE_CSS_URL.captures_iter(&css) {
            push_candidate(&caps[1], page_url, &mut seen, &mut urls);
        }
    }

    urls
}

fn push_candidate(raw: &str, page_url: &Url, seen: &mut HashSet<String>, out: &mut Vec<Url>) {
    let raw = raw.trim();
    if raw.is_empty() || raw.starts_with("data:") {
        return;
    }
    match page_url.join(raw) {
        Ok(url) if url.scheme() == "http" || url.scheme() == "https" => {
            if seen.insert(url.as_str().to_string()) {
                out.push(url);
            }
        }
        Ok(url) => log::debug!("Skipping non-http image URL: {}", url),
        Err(e) => log::warn!("Skipping unresolvable image URL '{}': {}", raw, e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page_url() -> Url {
        Url::parse("https://showhouse.example.com/0726/?ad=2801").unwrap()
    }

    fn extract(html: &str) -> Vec<String> {
        extract_image_urls(html, &page_url())
            .into_iter()
            .map(|u| u.to_string())
            .collect()
    }

    #[test]
    fn collects_img_src() {
        let urls = extract(r#"<img src="https://cdn.example.com/a.jpg">"#);
        assert_eq!(urls, vec!["https://cdn.example.com/a.jpg"]);
    }

    #[test]
    fn collects_lazy_load_attributes() {
        let html = r#"
            <img class="lazy-image" data-src="/img/tower.jpg">
            <img data-lazy="/img/garden.png" src="data:image/gif;base64,R0lGOD">
            <img data-original="/img/lobby.webp">
        "#;
        let urls = extract(html);
        assert_eq!(
            urls,
            vec![
                "https://showhouse.example.com/img/tower.jpg",
                "https://showhouse.example.com/img/garden.png",
                "https://showhouse.example.com/img/lobby.webp",
            ]
        );
    }

    #[test]
    fn collects_srcset_entries() {
        let html = r#"<img srcset="/img/hero-480.jpg 480w, /img/hero-1080.jpg 1080w">"#;
        let urls = extract(html);
        assert_eq!(
            urls,
            vec![
                "https://showhouse.example.com/img/hero-480.jpg",
                "https://showhouse.example.com/img/hero-1080.jpg",
            ]
        );
    }

    #[test]
    fn collects_inline_background_images() {
        let html = r#"
            <div style="background-image: url('/img/bg.jpg'); color: red"></div>
            <div style="background: #fff url(&quot;/img/pattern.png&quot;) repeat"></div>
        "#;
        let urls = extract(html);
        assert!(urls.contains(&"https://showhouse.example.com/img/bg.jpg".to_string()));
        // scraper decodes the &quot; entities before we see the attribute
        assert!(urls.contains(&"https://showhouse.example.com/img/pattern.png".to_string()));
    }

    #[test]
    fn collects_style_block_backgrounds() {
        let html = r#"
            <style>
                .hero { background-image: url("/img/aerial.jpg"); }
                .footer { background: url(/img/footer.png) no-repeat; }
            </style>
        "#;
        let urls = extract(html);
        assert_eq!(
            urls,
            vec![
                "https://showhouse.example.com/img/aerial.jpg",
                "https://showhouse.example.com/img/footer.png",
            ]
        );
    }

    #[test]
    fn excludes_data_uris() {
        let html = r#"
            <img src="data:image/png;base64,iVBOR">
            <div style="background-image: url(data:image/gif;base64,R0lGOD)"></div>
        "#;
        assert!(extract(html).is_empty());
    }

    #[test]
    fn deduplicates_preserving_first_seen_order() {
        let html = r#"
            <img src="/img/a.jpg">
            <img src="/img/b.jpg">
            <img data-src="/img/a.jpg">
            <div style="background-image: url(/img/b.jpg)"></div>
        "#;
        let urls = extract(html);
        assert_eq!(
            urls,
            vec![
                "https://showhouse.example.com/img/a.jpg",
                "https://showhouse.example.com/img/b.jpg",
            ]
        );
    }

    #[test]
    fn resolves_relative_urls_against_the_page() {
        let urls = extract(r#"<img src="gallery/unit-84a.jpg">"#);
        assert_eq!(
            urls,
            vec!["https://showhouse.example.com/0726/gallery/unit-84a.jpg"]
        );
    }

    #[test]
    fn skips_unresolvable_and_non_http_candidates() {
        let html = r#"
            <img src="javascript:void(0)">
            <img src="https://cdn.example.com/ok.jpg">
        "#;
        let urls = extract(html);
        assert_eq!(urls, vec!["https://cdn.example.com/ok.jpg"]);
    }
}

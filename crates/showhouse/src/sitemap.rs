use std::fs;
use std::path::Path;

use crate::blog::escape_markup;

const SITEMAP_SKELETON: &str = "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<urlset xmlns=\"http://www.sitemaps.org/schemas/sitemap/0.9\">\n</urlset>\n";
const CLOSING_TAG: &str = "</urlset>";

#[derive(Debug, thiserror::Error)]
pub enum SitemapError {
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Sitemap at '{0}' has no closing </urlset> tag")]
    MissingClosingTag(String),
}

/// Appends a `<url>` entry by splicing it in front of the closing
/// `</urlset>` tag. Creates a skeleton sitemap on first use.
pub fn append_url(path: &Path, loc: &str, lastmod: &str) -> Result<(), SitemapError> {
    let current = if path.exists() {
        fs::read_to_string(path)?
    } else {
        SITEMAP_SKELETON.to_string()
    };

    if !current.contains(CLOSING_TAG) {
        return Err(SitemapError::MissingClosingTag(path.display().to_string()));
    }

    let entry = format!(
        "    <url>\n        <loc>{}</loc>\n        <lastmod>{}</lastmod>\n        <changefreq>weekly</changefreq>\n        <priority>0.8</priority>\n    </url>\n{}",
        escape_markup(loc),
        escape_markup(lastmod),
        CLOSING_TAG,
    );

    let updated = current.replacen(CLOSING_TAG, &entry, 1);
    fs::write(path, updated)?;
    log::info!("Sitemap entry added for {}", loc);
    Ok(())
}

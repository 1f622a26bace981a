use std::fs;
use std::path::Path;
use std::sync::LazyLock;
use std::time::SystemTime;

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};

static RE_TITLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<title>(.*?)</title>").expect("invalid regex: title"));
static RE_TEMPLATE_TOKEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{(title|description|keywords|category|site_name|canonical_url|published|json_ld|content)\}")
        .expect("invalid regex: template token")
});

const POST_TEMPLATE: &str = include_str!("blog_template.html");
const DEFAULT_CATEGORY: &str = "일반";

#[derive(Debug, thiserror::Error)]
pub enum BlogError {
    #[error("Missing required field: {0}")]
    MissingField(&'static str),
    #[error("File name '{0}' contains no usable characters")]
    EmptyFileName(String),
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Raw post fields as they arrive over the API. Presence is checked by
/// `validate`, not by the deserializer, so a missing field yields a 400
/// instead of a deserialization rejection.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPost {
    pub title: Option<String>,
    pub description: Option<String>,
    pub keywords: Option<String>,
    pub category: Option<String>,
    pub content: Option<String>,
    pub file_name: Option<String>,
}

/// A validated post ready to render: required fields present, file name
/// sanitized.
#[derive(Debug, Clone)]
pub struct PostDraft {
    pub title: String,
    pub description: String,
    pub keywords: String,
    pub category: String,
    pub content: String,
    pub file_name: String,
}

impl NewPost {
    pub fn validate(self) -> Result<PostDraft, BlogError> {
        let title = required(self.title, "title")?;
        let description = required(self.description, "description")?;
        let content = required(self.content, "content")?;
        let raw_file_name = required(self.file_name, "fileName")?;

        let file_name = sanitize_file_name(&raw_file_name);
        if file_name.is_empty() {
            return Err(BlogError::EmptyFileName(raw_file_name));
        }

        Ok(PostDraft {
            title,
            description,
            keywords: self.keywords.unwrap_or_default(),
            category: self
                .category
                .filter(|c| !c.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_CATEGORY.to_string()),
            content,
            file_name,
        })
    }
}

fn required(value: Option<String>, field: &'static str) -> Result<String, BlogError> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(BlogError::MissingField(field)),
    }
}

/// Lowercases and keeps only `[a-z0-9가-힣-]`, the characters allowed in a
/// post file name.
pub fn sanitize_file_name(raw: &str) -> String {
    raw.to_lowercase()
        .chars()
        .filter(|c| {
            c.is_ascii_lowercase() || c.is_ascii_digit() || *c == '-' || ('가'..='힣').contains(c)
        })
        .collect()
}

pub(crate) fn escape_markup(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn unescape_markup(escaped: &str) -> String {
    escaped
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
}

/// Renders the post HTML. Metadata fields are escaped at every
/// interpolation site; `content` is the authored HTML body and goes in
/// verbatim.
pub fn render_post(
    draft: &PostDraft,
    site_name: &str,
    site_base_url: &str,
    published: &str,
) -> String {
    let canonical_url = format!(
        "{}/blog/{}.html",
        site_base_url.trim_end_matches('/'),
        draft.file_name
    );

    let json_ld = serde_json::json!({
        "@context": "https://schema.org",
        "@type": "Article",
        "headline": draft.title,
        "description": draft.description,
        "author": {
            "@type": "Organization",
            "name": site_name,
        },
        "publisher": {
            "@type": "Organization",
            "name": site_name,
        },
        "datePublished": published,
        "dateModified": published,
    });

    // single pass so substituted user text is never re-scanned for tokens
    RE_TEMPLATE_TOKEN
        .replace_all(POST_TEMPLATE, |caps: &regex::Captures| match &caps[1] {
            "title" => escape_markup(&draft.title),
            "description" => escape_markup(&draft.description),
            "keywords" => escape_markup(&draft.keywords),
            "category" => escape_markup(&draft.category),
            "site_name" => escape_markup(site_name),
            "canonical_url" => escape_markup(&canonical_url),
            "published" => escape_markup(published),
            "json_ld" => json_ld.to_string(),
            "content" => draft.content.clone(),
            _ => unreachable!(),
        })
        .into_owned()
}

#[derive(Debug, Clone)]
pub struct StoredPost {
    /// File name including the `.html` suffix.
    pub file_name: String,
    /// Site-relative URL, e.g. `/blog/testpost.html`.
    pub url: String,
    /// Publication date, `YYYY-MM-DD`.
    pub published: String,
}

pub fn write_post(
    blog_dir: &Path,
    draft: &PostDraft,
    site_name: &str,
    site_base_url: &str,
) -> Result<StoredPost, BlogError> {
    let published = Utc::now().format("%Y-%m-%d").to_string();
    let html = render_post(draft, site_name, site_base_url, &published);

    fs::create_dir_all(blog_dir)?;
    let file_name = format!("{}.html", draft.file_name);
    fs::write(blog_dir.join(&file_name), html)?;
    log::info!("Blog post written: {}", file_name);

    Ok(StoredPost {
        url: format!("/blog/{}", file_name),
        file_name,
        published,
    })
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostSummary {
    pub file_name: String,
    pub title: String,
    pub created: String,
    pub modified: String,
}

/// Enumerates generated posts from disk. The `<title>` tag is recovered
/// from each file, falling back to the file stem.
pub fn list_posts(blog_dir: &Path) -> Result<Vec<PostSummary>, BlogError> {
    if !blog_dir.exists() {
        return Ok(Vec::new());
    }

    let mut posts = Vec::new();
    for entry in fs::read_dir(blog_dir)? {
        let entry = entry?;
        let path = entry.path();
        if path.extension().is_none_or(|ext| ext != "html") {
            continue;
        }

        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();

        let html = fs::read_to_string(&path)?;
        let title = RE_TITLE
            .captures(&html)
            .map(|caps| unescape_markup(&caps[1]))
            .unwrap_or_else(|| stem.clone());

        let metadata = entry.metadata()?;
        let modified = date_string(metadata.modified().ok());
        let created = date_string(metadata.created().or(metadata.modified()).ok());

        posts.push(PostSummary {
            file_name: stem,
            title,
            created,
            modified,
        });
    }

    posts.sort_by(|a, b| a.file_name.cmp(&b.file_name));
    Ok(posts)
}

fn date_string(time: Option<SystemTime>) -> String {
    time.map(|t| DateTime::<Utc>::from(t).format("%Y-%m-%d").to_string())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn draft() -> PostDraft {
        NewPost {
            title: Some("Test".to_string()),
            description: Some("D".to_string()),
            keywords: None,
            category: None,
            content: Some("<p>c</p>".to_string()),
            file_name: Some("Test Post!".to_string()),
        }
        .validate()
        .unwrap()
    }

    fn temp_dir() -> PathBuf {
        std::env::temp_dir().join(format!("showhouse-blog-{}", uuid::Uuid::new_v4().simple()))
    }

    #[test]
    fn sanitizes_spaces_and_punctuation() {
        assert_eq!(sanitize_file_name("Test Post!"), "testpost");
    }

    #[test]
    fn sanitizer_keeps_korean_digits_and_hyphens() {
        assert_eq!(sanitize_file_name("용인-분양 소식 2025"), "용인-분양소식2025");
    }

    #[test]
    fn validate_rejects_each_missing_required_field() {
        let full = || NewPost {
            title: Some("t".into()),
            description: Some("d".into()),
            keywords: Some("k".into()),
            category: Some("c".into()),
            content: Some("<p>x</p>".into()),
            file_name: Some("post".into()),
        };

        for field in ["title", "description", "content", "fileName"] {
            let mut post = full();
            match field {
                "title" => post.title = None,
                "description" => post.description = Some("   ".into()),
                "content" => post.content = None,
                "fileName" => post.file_name = None,
                _ => unreachable!(),
            }
            let err = post.validate().unwrap_err();
            assert!(matches!(err, BlogError::MissingField(f) if f == field));
        }
    }

    #[test]
    fn validate_rejects_file_name_with_no_usable_characters() {
        let post = NewPost {
            title: Some("t".into()),
            description: Some("d".into()),
            content: Some("c".into()),
            file_name: Some("!!! ???".into()),
            ..Default::default()
        };
        assert!(matches!(
            post.validate().unwrap_err(),
            BlogError::EmptyFileName(_)
        ));
    }

    #[test]
    fn validate_defaults_category_and_keywords() {
        let d = draft();
        assert_eq!(d.category, DEFAULT_CATEGORY);
        assert_eq!(d.keywords, "");
        assert_eq!(d.file_name, "testpost");
    }

    #[test]
    fn render_escapes_metadata_but_not_content() {
        let mut d = draft();
        d.title = "A <b>\"bold\"</b> & title".to_string();
        let html = render_post(&d, "단지명", "https://example.com", "2025-09-21");

        assert!(html.contains("<title>A &lt;b&gt;&quot;bold&quot;&lt;/b&gt; &amp; title</title>"));
        assert!(!html.contains("<title>A <b>"));
        assert!(html.contains("<p>c</p>"));
    }

    #[test]
    fn render_builds_canonical_url_from_sanitized_name() {
        let html = render_post(&draft(), "단지명", "https://example.com/", "2025-09-21");
        assert!(html.contains(r#"<link rel="canonical" href="https://example.com/blog/testpost.html">"#));
    }

    #[test]
    fn render_embeds_structured_data() {
        let html = render_post(&draft(), "단지명", "https://example.com", "2025-09-21");
        assert!(html.contains(r#""@type":"Article""#));
        assert!(html.contains(r#""headline":"Test""#));
        assert!(html.contains(r#""datePublished":"2025-09-21""#));
    }

    #[test]
    fn write_then_list_round_trips_title_and_name() {
        let dir = temp_dir();
        let stored = write_post(&dir, &draft(), "단지명", "https://example.com").unwrap();
        assert_eq!(stored.file_name, "testpost.html");
        assert_eq!(stored.url, "/blog/testpost.html");

        let posts = list_posts(&dir).unwrap();
        assert_eq!(posts.len(), 1);
        assert_eq!(posts[0].file_name, "testpost");
        assert_eq!(posts[0].title, "Test");
        assert_eq!(posts[0].created.len(), 10);

        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn list_posts_on_missing_dir_is_empty() {
        assert!(list_posts(&temp_dir()).unwrap().is_empty());
    }

    #[test]
    fn list_posts_ignores_non_html_files() {
        let dir = temp_dir();
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("notes.txt"), "x").unwrap();
        assert!(list_posts(&dir).unwrap().is_empty());
        fs::remove_dir_all(&dir).ok();
    }
}

use std::path::{Path, PathBuf};
use std::time::Duration;

use futures::StreamExt;
use reqwest::Client;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use url::Url;
use uuid::Uuid;

use crate::extract::extract_image_urls;
use crate::types::{CrawlReport, ImageRecord};

#[derive(Debug, thiserror::Error)]
pub enum CrawlerError {
    #[error("HTTP request failed: {0}")]
    RequestError(#[from] reqwest::Error),
    #[error("Invalid target URL '{url}': {source}")]
    InvalidUrl {
        url: String,
        source: url::ParseError,
    },
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Failed to serialize manifest: {0}")]
    ManifestError(#[from] serde_json::Error),
}

/// Downloads every image referenced by a page into `output_dir` and writes
/// an `image-info.json` manifest next to them.
#[derive(Debug, Clone)]
pub struct ImageCrawler {
    client: Client,
    output_dir: PathBuf,
}

impl ImageCrawler {
    pub fn new(output_dir: impl Into<PathBuf>) -> Result<Self, CrawlerError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(60))
            .user_agent(format!(
                "{}/{}",
                env!("CARGO_PKG_NAME"),
                env!("CARGO_PKG_VERSION")
            ))
            .build()?;

        Ok(Self {
            client,
            output_dir: output_dir.into(),
        })
    }

    /// Runs the whole pipeline: fetch the page, collect candidate URLs,
    /// download them one at a time, write the manifest.
    ///
    /// A failed page fetch aborts the run; a failed image download only
    /// skips that image.
    pub async fn crawl(&self, target: &str) -> Result<CrawlReport, CrawlerError> {
        let page_url = Url::parse(target).map_err(|e| CrawlerError::InvalidUrl {
            url: target.to_string(),
            source: e,
        })?;

        log::info!("Fetching {}...", page_url);
        let html = self
            .client
            .get(page_url.clone())
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;

        let candidates = extract_image_urls(&html, &page_url);
        let attempted = candidates.len();
        log::info!("Found {} unique image URLs", attempted);

        fs::create_dir_all(&self.output_dir).await?;

        let mut records = Vec::new();
        let mut failed = 0;
        for (i, url) in candidates.iter().enumerate() {
            let file_name = unique_file_name(url);
            let local_path = self.output_dir.join(&file_name);
            log::info!("[{}/{}] Downloading {}", i + 1, attempted, file_name);

            match self.download(url, &local_path).await {
                Ok(()) => records.push(ImageRecord {
                    original_url: url.to_string(),
                    file_name,
                    local_path: local_path.display().to_string(),
                }),
                Err(e) => {
                    failed += 1;
                    log::warn!("Failed to download {}: {}", url, e);
                    remove_partial_file(&local_path).await;
                }
            }
        }

        self.write_manifest(&records).await?;

        Ok(CrawlReport {
            records,
            attempted,
            failed,
        })
    }

    async fn download(&self, url: &Url, path: &Path) -> Result<(), CrawlerError> {
        let response = self
            .client
            .get(url.clone())
            .send()
            .await?
            .error_for_status()?;

        let mut file = fs::File::create(path).await?;
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            file.write_all(&chunk?).await?;
        }
        file.flush().await?;
        Ok(())
    }

    async fn write_manifest(&self, records: &[ImageRecord]) -> Result<(), CrawlerError> {
        let path = self.output_dir.join(crate::MANIFEST_FILE);
        let json = serde_json::to_vec_pretty(records)?;
        fs::write(&path, json).await?;
        log::info!("Manifest written to {}", path.display());
        Ok(())
    }
}

async fn remove_partial_file(path: &Path) {
    if let Err(e) = fs::remove_file(path).await
        && e.kind() != std::io::ErrorKind::NotFound
    {
        log::warn!("Could not remove partial file {}: {}", path.display(), e);
    }
}

/// Derives a local file name from the URL path basename, suffixed with a
/// UUID so two downloads of the same basename never collide.
fn unique_file_name(url: &Url) -> String {
    let base = url
        .path_segments()
        .and_then(|mut segments| segments.next_back())
        .unwrap_or("")
        .trim();

    let token = Uuid::new_v4().simple().to_string();

    let (stem, ext) = match base.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() && !ext.is_empty() && ext.len() <= 5 => {
            (stem, Some(ext))
        }
        _ => (base, None),
    };

    match (stem.is_empty(), ext) {
        (true, _) => format!("image-{token}.jpg"),
        (false, Some(ext)) => format!("{stem}-{token}.{ext}"),
        (false, None) => format!("{stem}-{token}"),
    }
}

use std::fmt::Display;

use serde::{Deserialize, Serialize};

/// One successfully downloaded image, as recorded in `image-info.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageRecord {
    pub original_url: String,
    pub file_name: String,
    pub local_path: String,
}

impl Display for ImageRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.file_name, self.original_url)
    }
}

#[derive(Debug)]
pub struct CrawlReport {
    pub records: Vec<ImageRecord>,
    pub attempted: usize,
    pub failed: usize,
}

impl CrawlReport {
    pub fn downloaded(&self) -> usize {
        self.records.len()
    }
}

impl Display for CrawlReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "\nStatistics:")?;
        writeln!(f, "  Candidate images: {}", self.attempted)?;
        writeln!(f, "  Downloaded:       {}", self.downloaded())?;
        writeln!(f, "  Failed:           {}", self.failed)
    }
}

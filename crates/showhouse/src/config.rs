use std::env;
use std::path::PathBuf;

pub const DEFAULT_BIND_ADDRESS: &str = "127.0.0.1:8001";

const DEFAULT_SENDER_NUMBER: &str = "1668-5257";
const DEFAULT_ADMIN_PHONE: &str = "010-7781-9297";
const DEFAULT_SMS_API_BASE: &str = "https://api.solapi.com";
const DEFAULT_SITE_NAME: &str = "클러스터용인 경남아너스빌";
const DEFAULT_SITE_BASE_URL: &str = "http://localhost:8001";

#[derive(Debug, Clone)]
pub struct SmsSettings {
    pub api_key: Option<String>,
    pub api_secret: Option<String>,
    pub api_base: String,
    pub sender: String,
    pub admin_phone: String,
}

impl SmsSettings {
    /// Both credentials, or `None` when either is missing. Requests must be
    /// rejected without a send attempt in that case.
    pub fn credentials(&self) -> Option<(&str, &str)> {
        Some((self.api_key.as_deref()?, self.api_secret.as_deref()?))
    }
}

/// Process-wide configuration, read from the environment exactly once at
/// startup and passed explicitly to every consumer.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub sms: SmsSettings,
    pub bind_address: String,
    pub site_name: String,
    pub site_base_url: String,
    pub site_dir: PathBuf,
    pub blog_dir: PathBuf,
    pub images_dir: PathBuf,
    pub sitemap_path: PathBuf,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self {
            sms: SmsSettings {
                api_key: env_opt("SMS_API_KEY"),
                api_secret: env_opt("SMS_API_SECRET"),
                api_base: env_or("SMS_API_BASE", DEFAULT_SMS_API_BASE),
                sender: env_or("SMS_SENDER_NUMBER", DEFAULT_SENDER_NUMBER),
                admin_phone: env_or("ADMIN_PHONE", DEFAULT_ADMIN_PHONE),
            },
            bind_address: env_or("BIND_ADDRESS", DEFAULT_BIND_ADDRESS),
            site_name: env_or("SITE_NAME", DEFAULT_SITE_NAME),
            site_base_url: env_or("SITE_BASE_URL", DEFAULT_SITE_BASE_URL),
            site_dir: env_or("SITE_DIR", "site").into(),
            blog_dir: env_or("BLOG_DIR", "blog").into(),
            images_dir: env_or("IMAGES_DIR", "crawled-images").into(),
            sitemap_path: env_or("SITEMAP_PATH", "sitemap.xml").into(),
        }
    }
}

fn env_opt(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn env_or(name: &str, default: &str) -> String {
    env_opt(name).unwrap_or_else(|| default.to_string())
}

use std::sync::LazyLock;
use std::time::Duration;

use chrono::{FixedOffset, Utc};
use reqwest::Client;
use serde::Serialize;
use serde_json::Value;

use crate::config::AppConfig;

static KST: LazyLock<FixedOffset> =
    LazyLock::new(|| FixedOffset::east_opt(9 * 3600).expect("invalid KST offset"));

#[derive(Debug, thiserror::Error)]
pub enum SmsError {
    #[error("SMS credentials are not configured")]
    MissingCredentials,
    #[error("HTTP request failed: {0}")]
    RequestError(#[from] reqwest::Error),
    #[error("SMS provider rejected the message: {0}")]
    ProviderError(String),
}

/// One text message, built per request and discarded after the send.
#[derive(Debug, Clone, Serialize)]
pub struct SmsMessage {
    pub to: String,
    pub from: String,
    pub text: String,
}

/// Provider responses for the two messages a lead submission triggers.
#[derive(Debug, Serialize)]
pub struct LeadRelayResult {
    pub admin: Value,
    pub customer: Value,
}

/// Thin client for the message-sending gateway. Key/secret go out as
/// headers on every call; the provider's JSON response is passed through
/// untouched.
#[derive(Debug, Clone)]
pub struct SmsClient {
    client: Client,
    api_base: String,
    api_key: String,
    api_secret: String,
    sender: String,
    admin_phone: String,
    site_name: String,
}

impl SmsClient {
    pub fn from_config(config: &AppConfig) -> Result<Self, SmsError> {
        let (api_key, api_secret) = config
            .sms
            .credentials()
            .ok_or(SmsError::MissingCredentials)?;

        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent(format!(
                "{}/{}",
                env!("CARGO_PKG_NAME"),
                env!("CARGO_PKG_VERSION")
            ))
            .build()?;

        Ok(Self {
            client,
            api_base: config.sms.api_base.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            api_secret: api_secret.to_string(),
            sender: config.sms.sender.clone(),
            admin_phone: config.sms.admin_phone.clone(),
            site_name: config.site_name.clone(),
        })
    }

    /// Sends the admin notification, then the customer confirmation.
    /// Sequential on purpose: if the admin send fails the customer is never
    /// texted.
    pub async fn relay_lead(&self, name: &str, phone: &str) -> Result<LeadRelayResult, SmsError> {
        let registered_at = kst_now_string();

        let admin = self
            .send_one(&SmsMessage {
                to: self.admin_phone.clone(),
                from: self.sender.clone(),
                text: admin_notice_text(&self.site_name, name, phone, &registered_at),
            })
            .await?;
        log::info!("Admin SMS sent for lead '{}'", name);

        let customer = self
            .send_one(&SmsMessage {
                to: phone.to_string(),
                from: self.sender.clone(),
                text: customer_confirm_text(&self.site_name, name, &self.sender),
            })
            .await?;
        log::info!("Customer SMS sent to {}", phone);

        Ok(LeadRelayResult { admin, customer })
    }

    pub async fn send_one(&self, message: &SmsMessage) -> Result<Value, SmsError> {
        let url = format!("{}/messages/v4/send", self.api_base);
        let response = self
            .client
            .post(&url)
            .header("x-api-key", &self.api_key)
            .header("x-api-secret", &self.api_secret)
            .json(&serde_json::json!({ "message": message }))
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            Ok(response.json().await?)
        } else {
            let body: Value = response.json().await.unwrap_or_default();
            let message = body
                .get("message")
                .and_then(Value::as_str)
                .map(str::to_string)
                .unwrap_or_else(|| format!("SMS provider returned HTTP {}", status.as_u16()));
            Err(SmsError::ProviderError(message))
        }
    }
}

fn kst_now_string() -> String {
    Utc::now().with_timezone(&*KST).format("%Y-%m-%d %H:%M").to_string()
}

fn admin_notice_text(site_name: &str, name: &str, phone: &str, registered_at: &str) -> String {
    format!(
        "[{site_name}]\n새 관심고객 등록!\n\n성함: {name}\n연락처: {phone}\n등록시간: {registered_at}\n\n즉시 연락 요망"
    )
}

fn customer_confirm_text(site_name: &str, name: &str, callback: &str) -> String {
    format!(
        "[{site_name}]\n{name}님, 관심고객 등록이 완료되었습니다.\n\n빠른 시일 내에 전문 상담원이 연락드리겠습니다.\n\n문의: {callback}"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn admin_notice_embeds_lead_details() {
        let text = admin_notice_text("테스트단지", "홍길동", "010-1234-5678", "2025-09-21 14:02");
        assert!(text.starts_with("[테스트단지]"));
        assert!(text.contains("성함: 홍길동"));
        assert!(text.contains("연락처: 010-1234-5678"));
        assert!(text.contains("등록시간: 2025-09-21 14:02"));
    }

    #[test]
    fn customer_confirmation_addresses_the_lead_by_name() {
        let text = customer_confirm_text("테스트단지", "홍길동", "1668-5257");
        assert!(text.contains("홍길동님"));
        assert!(text.contains("문의: 1668-5257"));
    }

    #[test]
    fn kst_timestamp_has_minute_precision() {
        let stamp = kst_now_string();
        // e.g. "2025-09-21 14:02"
        assert_eq!(stamp.len(), 16);
        assert_eq!(&stamp[4..5], "-");
        assert_eq!(&stamp[10..11], " ");
    }

    #[test]
    fn message_serializes_with_plain_keys() {
        let message = SmsMessage {
            to: "010-1234-5678".to_string(),
            from: "1668-5257".to_string(),
            text: "hello".to_string(),
        };
        let json = serde_json::to_value(&message).unwrap();
        assert_eq!(json["to"], "010-1234-5678");
        assert_eq!(json["from"], "1668-5257");
        assert_eq!(json["text"], "hello");
    }
}

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::json;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;

use showhouse::blog::{self, BlogError, NewPost};
use showhouse::config::AppConfig;
use showhouse::sitemap;
use showhouse::sms::{SmsClient, SmsError};

const MSG_MISSING_CREDENTIALS: &str = "서버 설정 오류: API 키가 누락되었습니다.";
const MSG_MISSING_FIELDS: &str = "필수 필드가 누락되었습니다.";
const MSG_POST_WRITE_FAILED: &str = "포스트 생성 중 오류가 발생했습니다.";
const MSG_POST_LIST_FAILED: &str = "포스트 목록 조회 중 오류가 발생했습니다.";

pub struct AppState {
    pub config: AppConfig,
    pub sms: Option<SmsClient>,
}

/// Builds the shared state. The SMS client is only constructed when both
/// credentials are present; otherwise `/api/send-sms` rejects every request
/// with a 500 and no send is ever attempted.
pub fn build_state(config: AppConfig) -> AppState {
    let sms = match SmsClient::from_config(&config) {
        Ok(client) => Some(client),
        Err(SmsError::MissingCredentials) => {
            log::warn!("SMS credentials not configured; /api/send-sms will reject requests");
            None
        }
        Err(e) => {
            log::error!("Failed to initialize SMS client: {}", e);
            None
        }
    };

    AppState { config, sms }
}

pub fn build_router(state: Arc<AppState>) -> Router {
    let images_dir = state.config.images_dir.clone();
    let site_dir = state.config.site_dir.clone();

    let api = Router::new()
        .route("/api/send-sms", post(send_sms))
        .route("/api/create-post", post(create_post))
        .route("/api/posts", get(list_posts))
        .layer(CorsLayer::permissive())
        .with_state(state);

    Router::new()
        .merge(api)
        .nest_service("/crawled-images", ServeDir::new(images_dir))
        .fallback_service(ServeDir::new(site_dir))
}

#[derive(Debug, Deserialize)]
struct LeadForm {
    name: Option<String>,
    phone: Option<String>,
}

async fn send_sms(State(state): State<Arc<AppState>>, Json(form): Json<LeadForm>) -> Response {
    let name = form.name.as_deref().map(str::trim).unwrap_or_default();
    let phone = form.phone.as_deref().map(str::trim).unwrap_or_default();

    if name.is_empty() || phone.is_empty() {
        return sms_error(StatusCode::BAD_REQUEST, "이름과 연락처를 모두 입력해 주세요.");
    }

    let Some(sms) = &state.sms else {
        log::error!("SMS credentials are not configured");
        return sms_error(StatusCode::INTERNAL_SERVER_ERROR, MSG_MISSING_CREDENTIALS);
    };

    match sms.relay_lead(name, phone).await {
        Ok(results) => (
            StatusCode::OK,
            Json(json!({
                "success": true,
                "message": "SMS 발송 완료",
                "results": results,
            })),
        )
            .into_response(),
        Err(e) => {
            log::error!("Failed to relay lead SMS: {}", e);
            let message = match e {
                SmsError::ProviderError(message) => message,
                other => other.to_string(),
            };
            sms_error(StatusCode::INTERNAL_SERVER_ERROR, &message)
        }
    }
}

fn sms_error(status: StatusCode, error: &str) -> Response {
    (status, Json(json!({ "success": false, "error": error }))).into_response()
}

async fn create_post(State(state): State<Arc<AppState>>, Json(post): Json<NewPost>) -> Response {
    let draft = match post.validate() {
        Ok(draft) => draft,
        Err(e) => {
            let message = match e {
                BlogError::MissingField(_) => MSG_MISSING_FIELDS.to_string(),
                other => other.to_string(),
            };
            return post_error(StatusCode::BAD_REQUEST, &message);
        }
    };

    let config = &state.config;
    let stored = match blog::write_post(
        &config.blog_dir,
        &draft,
        &config.site_name,
        &config.site_base_url,
    ) {
        Ok(stored) => stored,
        Err(e) => {
            log::error!("Failed to write blog post: {}", e);
            return post_error(StatusCode::INTERNAL_SERVER_ERROR, MSG_POST_WRITE_FAILED);
        }
    };

    // a sitemap failure is logged but never fails the request: the post
    // itself is already on disk
    let loc = format!(
        "{}{}",
        config.site_base_url.trim_end_matches('/'),
        stored.url
    );
    if let Err(e) = sitemap::append_url(&config.sitemap_path, &loc, &stored.published) {
        log::error!("Failed to update sitemap: {}", e);
    }

    (
        StatusCode::OK,
        Json(json!({
            "success": true,
            "message": "포스트가 성공적으로 생성되었습니다!",
            "fileName": stored.file_name,
            "url": stored.url,
        })),
    )
        .into_response()
}

fn post_error(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "success": false, "message": message }))).into_response()
}

async fn list_posts(State(state): State<Arc<AppState>>) -> Response {
    match blog::list_posts(&state.config.blog_dir) {
        Ok(posts) => Json(posts).into_response(),
        Err(e) => {
            log::error!("Failed to list blog posts: {}", e);
            post_error(StatusCode::INTERNAL_SERVER_ERROR, MSG_POST_LIST_FAILED)
        }
    }
}

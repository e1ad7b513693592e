//! HTTP API for the Mini App: direct writes that bypass `sendData`

use axum::{
    extract::{rejection::JsonRejection, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use std::sync::Arc;
use teloxide::types::ChatId;
use tower_http::cors::{Any, CorsLayer};

use crate::conversation::flows::{kind_icon, with_warning};
use crate::core::error::AppError;
use crate::core::types::TxKind;
use crate::core::utils::{esc, money};
use crate::finance::ledger::{self, Recorded};
use crate::finance::miniapp::{flexible_amount, flexible_id};
use crate::storage::{get_connection, DbPool};
use crate::telegram::markdown::send_message_markdown_v2;
use crate::telegram::menu_button::refresh_menu_button;
use crate::telegram::{webapp_auth, Bot};

/// Header carrying `Telegram.WebApp.initData`
pub const INIT_DATA_HEADER: &str = "X-Telegram-Init-Data";

/// Body of `POST /api/save`
#[derive(Debug, Clone, Deserialize)]
pub struct SaveRequest {
    #[serde(deserialize_with = "flexible_id")]
    pub user_id: i64,
    #[serde(deserialize_with = "flexible_amount")]
    pub amount: f64,
    pub category: String,
    #[serde(rename = "type")]
    pub kind: TxKind,
    #[serde(default)]
    pub description: Option<String>,
}

/// Shared state for all endpoints
#[derive(Clone)]
pub struct ApiState {
    pub db_pool: Arc<DbPool>,
    /// Used to confirm API writes in chat; `None` disables notifications
    pub bot: Option<Bot>,
    pub bot_token: String,
    pub require_init_data: bool,
    pub webapp_url: String,
}

#[derive(Debug)]
pub enum ApiError {
    Unauthorized(String),
    Forbidden(String),
    BadRequest(String),
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg),
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        let body = Json(serde_json::json!({
            "status": "error",
            "message": message
        }));

        (status, body).into_response()
    }
}

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        match err {
            AppError::Validation(msg) | AppError::Payload(msg) => ApiError::BadRequest(msg),
            other => {
                log::error!("API request failed: {}", other);
                ApiError::Internal("internal error".to_string())
            }
        }
    }
}

/// User id from a signed init data header
fn extract_user_id(headers: &HeaderMap, bot_token: &str) -> Result<i64, ApiError> {
    let init_data = headers
        .get(INIT_DATA_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| ApiError::Unauthorized("Missing Telegram init data".to_string()))?;

    webapp_auth::validate_telegram_webapp_data(init_data, bot_token)
        .map_err(|e| ApiError::Unauthorized(format!("Invalid init data: {}", e)))
}

/// Chat confirmation for a transaction written through the API
pub fn api_confirmation(request: &SaveRequest, recorded: &Recorded) -> String {
    with_warning(
        format!(
            "✅ *Запись через API\\!*\n{} {} р\\. \\({}\\)",
            kind_icon(request.kind),
            money(request.amount),
            esc(request.category.trim())
        ),
        recorded,
    )
}

/// Creates the API router
pub fn create_api_router(state: ApiState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/health", get(health_check))
        .route("/api/save", post(handle_save))
        .layer(cors)
        .with_state(Arc::new(state))
}

/// Binds `addr` and serves the API until the process stops
pub async fn run_api_server(addr: &str, state: ApiState) -> anyhow::Result<()> {
    let app = create_api_router(state);

    log::info!("🌐 Starting API server on http://{}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Health check endpoint
async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "service": "fingoal-api"
    }))
}

/// POST /api/save - записать транзакцию
async fn handle_save(
    State(state): State<Arc<ApiState>>,
    headers: HeaderMap,
    payload: Result<Json<SaveRequest>, JsonRejection>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let Json(request) = payload.map_err(|e| ApiError::BadRequest(e.body_text()))?;

    if state.require_init_data {
        let authenticated_user_id = extract_user_id(&headers, &state.bot_token)?;
        if authenticated_user_id != request.user_id {
            return Err(ApiError::Forbidden("Access denied".to_string()));
        }
    }

    let recorded = {
        let conn = get_connection(&state.db_pool).map_err(AppError::from)?;
        ledger::record_transaction(
            &conn,
            request.user_id,
            request.amount,
            &request.category,
            request.kind,
            request.description.as_deref(),
            chrono::Local::now().naive_local(),
        )?
    };

    if !recorded.is_saved() {
        log::info!("Duplicate API transaction from user {} dropped", request.user_id);
        return Ok(Json(serde_json::json!({"status": "ok"})));
    }
    log::info!(
        "API saved {} {} ({}) for user {}",
        request.kind,
        request.amount,
        request.category,
        request.user_id
    );

    if let Some(bot) = &state.bot {
        let text = api_confirmation(&request, &recorded);
        if let Err(e) = send_message_markdown_v2(bot, ChatId(request.user_id), text, None).await {
            log::warn!("Failed to notify user {} about API write: {}", request.user_id, e);
        }
        refresh_menu_button(bot, &state.db_pool, &state.webapp_url, request.user_id).await;
    }

    Ok(Json(serde_json::json!({"status": "ok"})))
}

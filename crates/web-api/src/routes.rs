//! 路由定义
//!
//! WebSocket 入口与补充的 REST 端点。REST 端点的操作者身份取自
//! `x-user-id` 请求头，由外部网关在反向代理时注入。

use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    routing::{delete, get, post},
    Json, Router,
};
use serde::Deserialize;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use uuid::Uuid;

use application::DeleteMode;
use domain::{ChatId, ChatWithMembers, Message, MessageId, UserId};

use crate::error::ApiError;
use crate::state::AppState;
use crate::websocket::ws_handler;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/ws", get(ws_handler))
        .nest("/api", api_routes())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/chats", post(create_chat))
        .route("/chats/group", post(create_group_chat))
        .route("/chats/{chat_id}/messages", get(list_messages))
        .route("/chats/{chat_id}/members", post(add_member))
        .route("/chats/{chat_id}/members/{user_id}", delete(remove_member))
        .route("/messages/{message_id}", delete(delete_message))
}

async fn health() -> &'static str {
    "ok"
}

/// 从请求头解析操作者身份。
fn actor_id(headers: &HeaderMap) -> Result<UserId, ApiError> {
    let value = headers
        .get("x-user-id")
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| ApiError::unauthorized("missing x-user-id header"))?;

    let id = Uuid::parse_str(value)
        .map_err(|_| ApiError::unauthorized("invalid x-user-id header"))?;
    Ok(UserId::new(id))
}

async fn list_messages(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(chat_id): Path<Uuid>,
) -> Result<Json<Vec<Message>>, ApiError> {
    let actor = actor_id(&headers)?;
    let messages = state
        .coordinator
        .list_messages(ChatId::new(chat_id), actor)
        .await?;
    Ok(Json(messages))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateChatPayload {
    other_user_id: UserId,
}

/// 查找或创建 1:1 会话。复用已有会话时返回 200，新建返回 201。
async fn create_chat(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<CreateChatPayload>,
) -> Result<(StatusCode, Json<ChatWithMembers>), ApiError> {
    let actor = actor_id(&headers)?;
    let (chat, created) = state
        .coordinator
        .create_direct_chat(actor, payload.other_user_id)
        .await?;
    let status = if created {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    Ok((status, Json(chat)))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateGroupChatPayload {
    chat_name: String,
    members: Vec<UserId>,
}

async fn create_group_chat(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<CreateGroupChatPayload>,
) -> Result<(StatusCode, Json<ChatWithMembers>), ApiError> {
    let actor = actor_id(&headers)?;
    let chat = state
        .coordinator
        .create_group_chat(actor, &payload.chat_name, payload.members)
        .await?;
    Ok((StatusCode::CREATED, Json(chat)))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AddMemberPayload {
    user_id: UserId,
}

async fn add_member(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(chat_id): Path<Uuid>,
    Json(payload): Json<AddMemberPayload>,
) -> Result<(StatusCode, Json<ChatWithMembers>), ApiError> {
    let actor = actor_id(&headers)?;
    let chat = state
        .coordinator
        .add_member(actor, ChatId::new(chat_id), payload.user_id)
        .await?;
    Ok((StatusCode::OK, Json(chat)))
}

async fn remove_member(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path((chat_id, user_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<ChatWithMembers>, ApiError> {
    let actor = actor_id(&headers)?;
    let chat = state
        .coordinator
        .remove_member(actor, ChatId::new(chat_id), UserId::new(user_id))
        .await?;
    Ok(Json(chat))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DeleteMessagePayload {
    delete_type: DeleteType,
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "lowercase")]
enum DeleteType {
    Everyone,
    Me,
}

impl From<DeleteType> for DeleteMode {
    fn from(value: DeleteType) -> Self {
        match value {
            DeleteType::Everyone => DeleteMode::Everyone,
            DeleteType::Me => DeleteMode::Me,
        }
    }
}

async fn delete_message(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(message_id): Path<Uuid>,
    Json(payload): Json<DeleteMessagePayload>,
) -> Result<StatusCode, ApiError> {
    let actor = actor_id(&headers)?;
    state
        .coordinator
        .delete_message(actor, MessageId::new(message_id), payload.delete_type.into())
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

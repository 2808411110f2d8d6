//! HTTP API endpoint handlers.

use std::sync::Arc;

use axum::{
    Json,
    extract::{FromRequestParts, Path, Query, State},
    http::{StatusCode, header, request::Parts},
    response::{IntoResponse, Response},
};

use crate::{
    domain::{Identity, RoomId, UserId, VerifyError},
    infrastructure::dto::http::{
        AddMembersRequest, AuthResponseDto, ChangePasswordRequest, ChatMessageDto,
        CreateGroupRequest, DirectChatSummaryDto, HistoryQuery, LoginRequest, LogoutRequest,
        MessageDto, OnlineUsersDto, RefreshRequest, RegisterRequest, RemoveMemberRequest, RoomDto,
        SendDirectMessageRequest, SendGroupMessageRequest, TokenPairDto, UserDto,
    },
    ui::state::AppState,
    usecase::{AuthError, ChatError},
};

// ========================================
// エラー表現と Bearer 認証
// ========================================

/// HTTP 境界のエラー表現
///
/// ステータスコードと `{"error": "<message>"}` ボディの組。UseCase 層の
/// エラーからの変換でステータスを決める（検証 400 / 認証 401 / 認可 403 /
/// 不在 404 / ストア障害 500）。
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, message)
    }

    /// ストア障害など内部起因の 500。詳細はログにのみ残す
    fn internal() -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "internal server error")
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(serde_json::json!({ "error": self.message }));
        (self.status, body).into_response()
    }
}

impl From<AuthError> for ApiError {
    fn from(e: AuthError) -> Self {
        match &e {
            AuthError::Validation(_)
            | AuthError::UsernameTaken
            | AuthError::EmailTaken
            | AuthError::WrongPassword => Self::new(StatusCode::BAD_REQUEST, e.to_string()),
            AuthError::InvalidCredentials
            | AuthError::AccountInactive
            | AuthError::InvalidRefreshToken
            | AuthError::RefreshTokenExpired => Self::unauthorized(e.to_string()),
            AuthError::Hash(_) | AuthError::Token(_) | AuthError::Store(_) => {
                tracing::error!("Auth operation failed: {}", e);
                Self::internal()
            }
        }
    }
}

impl From<ChatError> for ApiError {
    fn from(e: ChatError) -> Self {
        match &e {
            ChatError::Content(_)
            | ChatError::Validation(_)
            | ChatError::SelfMessage
            | ChatError::NotAGroup => Self::new(StatusCode::BAD_REQUEST, e.to_string()),
            ChatError::NotAMember | ChatError::NotCreator | ChatError::RemovalNotAllowed => {
                Self::new(StatusCode::FORBIDDEN, e.to_string())
            }
            ChatError::RecipientNotFound
            | ChatError::UserNotFound
            | ChatError::MemberNotFound(_)
            | ChatError::GroupNotFound
            | ChatError::MemberNotInGroup => Self::new(StatusCode::NOT_FOUND, e.to_string()),
            ChatError::Store(_) => {
                tracing::error!("Chat operation failed: {}", e);
                Self::internal()
            }
        }
    }
}

impl From<VerifyError> for ApiError {
    fn from(e: VerifyError) -> Self {
        match &e {
            VerifyError::Store(_) => {
                tracing::error!("Identity verification failed: {}", e);
                Self::internal()
            }
            _ => Self::unauthorized(e.to_string()),
        }
    }
}

/// `Authorization: Bearer <access token>` を検証済みの [`Identity`] に
/// 解決する extractor
///
/// 保護ルートはこの extractor を引数に取るだけで認証される。検証は
/// `AppState` の IdentityVerifier に委譲する。
pub struct AuthUser(pub Identity);

impl FromRequestParts<Arc<AppState>> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| ApiError::unauthorized("missing authorization header"))?;
        let token = header
            .strip_prefix("Bearer ")
            .ok_or_else(|| ApiError::unauthorized("authorization header must be a bearer token"))?;

        let identity = state.verifier.verify(token).await?;
        Ok(Self(identity))
    }
}

// ========================================
// 認証エンドポイント
// ========================================

/// Register a new account
pub async fn register(
    State(state): State<Arc<AppState>>,
    Json(body): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<AuthResponseDto>), ApiError> {
    let (user, pair) = state
        .auth_usecase
        .register(body.username, body.email, body.password, body.full_name)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(AuthResponseDto {
            user: user.into(),
            tokens: pair.into(),
        }),
    ))
}

/// Log in with username or email
pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(body): Json<LoginRequest>,
) -> Result<Json<AuthResponseDto>, ApiError> {
    let (user, pair) = state
        .auth_usecase
        .login(&body.username, &body.password)
        .await?;

    Ok(Json(AuthResponseDto {
        user: user.into(),
        tokens: pair.into(),
    }))
}

/// Rotate a refresh token into a fresh pair
pub async fn refresh(
    State(state): State<Arc<AppState>>,
    Json(body): Json<RefreshRequest>,
) -> Result<Json<TokenPairDto>, ApiError> {
    let pair = state.auth_usecase.refresh(&body.refresh_token).await?;
    Ok(Json(pair.into()))
}

/// Revoke one refresh token (unknown tokens are a no-op)
pub async fn logout(
    State(state): State<Arc<AppState>>,
    Json(body): Json<LogoutRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    state.auth_usecase.logout(&body.refresh_token).await?;
    Ok(Json(serde_json::json!({"message": "logged out"})))
}

/// Revoke every refresh token of the current user
pub async fn logout_all(
    State(state): State<Arc<AppState>>,
    AuthUser(identity): AuthUser,
) -> Result<Json<serde_json::Value>, ApiError> {
    let revoked = state.auth_usecase.logout_all(identity.user_id).await?;
    Ok(Json(serde_json::json!({
        "message": "logged out from all devices",
        "revoked": revoked,
    })))
}

/// Change the current user's password and revoke their sessions
pub async fn change_password(
    State(state): State<Arc<AppState>>,
    AuthUser(identity): AuthUser,
    Json(body): Json<ChangePasswordRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    state
        .auth_usecase
        .change_password(identity.user_id, &body.old_password, &body.new_password)
        .await?;
    Ok(Json(serde_json::json!({"message": "password changed"})))
}

/// Current user's profile
pub async fn me(
    State(state): State<Arc<AppState>>,
    AuthUser(identity): AuthUser,
) -> Result<Json<UserDto>, ApiError> {
    let user = state.auth_usecase.profile(identity.user_id).await?;
    Ok(Json(user.into()))
}

// ========================================
// ダイレクトメッセージエンドポイント
// ========================================

/// Send a direct message (the pair's room is created on first contact)
pub async fn send_direct_message(
    State(state): State<Arc<AppState>>,
    AuthUser(identity): AuthUser,
    Json(body): Json<SendDirectMessageRequest>,
) -> Result<(StatusCode, Json<MessageDto>), ApiError> {
    let record = state
        .chat_usecase
        .send_direct_message(identity.user_id, body.recipient_id, body.content)
        .await?;
    Ok((StatusCode::CREATED, Json(record.into())))
}

/// Direct-chat history with one other user, oldest-first page
pub async fn direct_history(
    State(state): State<Arc<AppState>>,
    AuthUser(identity): AuthUser,
    Path(other_user_id): Path<i64>,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<Vec<ChatMessageDto>>, ApiError> {
    let page = state
        .chat_usecase
        .direct_history(
            identity.user_id,
            UserId(other_user_id),
            query.limit,
            query.offset,
        )
        .await?;
    Ok(Json(page.into_iter().map(Into::into).collect()))
}

/// Direct-chat overview: peer, last message, unread count per room
pub async fn list_direct_chats(
    State(state): State<Arc<AppState>>,
    AuthUser(identity): AuthUser,
) -> Result<Json<Vec<DirectChatSummaryDto>>, ApiError> {
    let summaries = state.chat_usecase.list_direct_chats(identity.user_id).await?;
    Ok(Json(summaries.into_iter().map(Into::into).collect()))
}

// ========================================
// グループチャットエンドポイント
// ========================================

/// Create a group room; the creator always becomes a member
pub async fn create_group(
    State(state): State<Arc<AppState>>,
    AuthUser(identity): AuthUser,
    Json(body): Json<CreateGroupRequest>,
) -> Result<(StatusCode, Json<RoomDto>), ApiError> {
    let room = state
        .chat_usecase
        .create_group(identity.user_id, body.name, body.member_ids)
        .await?;
    Ok((StatusCode::CREATED, Json(room.into())))
}

/// Send a message to a group the current user belongs to
pub async fn send_group_message(
    State(state): State<Arc<AppState>>,
    AuthUser(identity): AuthUser,
    Json(body): Json<SendGroupMessageRequest>,
) -> Result<(StatusCode, Json<MessageDto>), ApiError> {
    let record = state
        .chat_usecase
        .send_group_message(identity.user_id, body.group_id, body.content)
        .await?;
    Ok((StatusCode::CREATED, Json(record.into())))
}

/// Group history, oldest-first page (members only)
pub async fn group_history(
    State(state): State<Arc<AppState>>,
    AuthUser(identity): AuthUser,
    Path(group_id): Path<i64>,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<Vec<ChatMessageDto>>, ApiError> {
    let page = state
        .chat_usecase
        .group_history(identity.user_id, RoomId(group_id), query.limit, query.offset)
        .await?;
    Ok(Json(page.into_iter().map(Into::into).collect()))
}

/// Add members to a group (creator only)
pub async fn add_group_members(
    State(state): State<Arc<AppState>>,
    AuthUser(identity): AuthUser,
    Path(group_id): Path<i64>,
    Json(body): Json<AddMembersRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let added = state
        .chat_usecase
        .add_group_members(identity.user_id, RoomId(group_id), body.member_ids)
        .await?;
    Ok(Json(serde_json::json!({"added": added})))
}

/// Remove a member (the creator removes anyone, members remove themselves)
pub async fn remove_group_member(
    State(state): State<Arc<AppState>>,
    AuthUser(identity): AuthUser,
    Path(group_id): Path<i64>,
    Json(body): Json<RemoveMemberRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    state
        .chat_usecase
        .remove_group_member(identity.user_id, RoomId(group_id), body.user_id)
        .await?;
    Ok(Json(serde_json::json!({"message": "member removed"})))
}

/// Groups the current user belongs to
pub async fn my_groups(
    State(state): State<Arc<AppState>>,
    AuthUser(identity): AuthUser,
) -> Result<Json<Vec<RoomDto>>, ApiError> {
    let rooms = state.chat_usecase.list_groups(identity.user_id).await?;
    Ok(Json(rooms.into_iter().map(Into::into).collect()))
}

// ========================================
// プレゼンス・ヘルスチェック
// ========================================

/// Snapshot of currently connected users
pub async fn online_users(State(state): State<Arc<AppState>>) -> Json<OnlineUsersDto> {
    let online_users = state.registry.list_online().await;
    let count = online_users.len();
    Json(OnlineUsersDto {
        online_users,
        count,
    })
}

/// Health check endpoint
pub async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({"status": "ok"}))
}

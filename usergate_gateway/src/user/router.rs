//! One route per RPC of the user service.

use ::axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use ::bytes::Bytes;
use ::serde::de::DeserializeOwned;
use ::tokio_stream::iter;
use ::tracing::info;
use ::usergate_common::{
    error::UsergateError,
    user_grpc::{FetchAll, StatusReply, UserCreate, UserDetails},
};

use super::chat::chat;
use crate::{error::GatewayError, state::AppState};

type Result<T> = std::result::Result<T, GatewayError>;

/// Bind the request body as JSON whatever its `Content-Type` is.
/// The size of the body is still capped by axum's default body limit.
fn bind_json<T: DeserializeOwned>(body: &Bytes) -> Result<T> {
    serde_json::from_slice(body).map_err(|err| UsergateError::illegal_argument(err).into())
}

/// Forward a sign up to the unary `UserSignup` call.
async fn user_signup(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<StatusReply>> {
    let user: UserCreate = bind_json(&body)?;
    info!("Signing up user {}", user.username);
    let reply = state.get_client().user_signup(user).await?;
    Ok(Json(reply.into_inner()))
}

/// Collect the whole `ListUsers` stream before answering,
/// so a failure in the middle of the stream never returns a partial list.
async fn list_users(State(state): State<AppState>) -> Result<Json<Vec<UserDetails>>> {
    let mut stream = state
        .get_client()
        .list_users(FetchAll {})
        .await?
        .into_inner();
    let mut users = vec![];
    while let Some(user) = stream.message().await? {
        users.push(user);
    }
    info!("Listed {} users", users.len());
    Ok(Json(users))
}

/// Send the uploaded users one by one over the `UploadUsers` stream,
/// then close it and return the acknowledgement.
async fn upload_users(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<StatusReply>> {
    let users: Vec<UserCreate> = bind_json(&body)?;
    info!("Uploading {} users", users.len());
    let reply = state.get_client().upload_users(iter(users)).await?;
    Ok(Json(reply.into_inner()))
}

pub(crate) fn get_user_router() -> Router<AppState> {
    Router::new()
        .route("/usersignup", post(user_signup))
        .route("/users", get(list_users))
        .route("/uploadusers", post(upload_users))
        .route("/chat", post(chat))
}

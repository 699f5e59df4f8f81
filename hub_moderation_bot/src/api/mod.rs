//! The HTTP endpoints the Mini App calls.

use std::sync::Arc;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use hub_bot_commons::messenger::Messenger;
use serde_json::json;
use tower_http::cors::CorsLayer;

use crate::{error::ModerationError, hub::Hub};

pub mod init_data;
mod routes;

pub use init_data::{verify_init_data, InitDataError, WebAppUser};

/// What the endpoints share.
pub struct ApiState<M> {
    pub hub: Arc<Hub<M>>,
    /// initData is signed with the token of the bot that opened the app.
    pub user_bot_token: String,
}

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0} is required")]
    MissingField(&'static str),
    #[error("{0} is invalid")]
    InvalidField(&'static str),
    #[error("invalid Telegram initData: {0}")]
    InvalidInitData(#[from] InitDataError),
    #[error("profile not found")]
    ProfileNotFound,
    #[error("article not found")]
    ArticleNotFound,
    #[error("only the author can edit an article")]
    NotAuthor,
    #[error(transparent)]
    Moderation(#[from] ModerationError),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl ApiError {
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::MissingField(_) | ApiError::InvalidField(_) => StatusCode::BAD_REQUEST,
            ApiError::InvalidInitData(_) => StatusCode::UNAUTHORIZED,
            ApiError::ProfileNotFound | ApiError::ArticleNotFound => StatusCode::NOT_FOUND,
            ApiError::NotAuthor => StatusCode::FORBIDDEN,
            ApiError::Moderation(e) => match e {
                ModerationError::ArticleNotFound(_) | ModerationError::UnknownShortId(_) => {
                    StatusCode::NOT_FOUND
                }
                ModerationError::NoPendingEdit(_) => StatusCode::BAD_REQUEST,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            },
            ApiError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match status {
            StatusCode::INTERNAL_SERVER_ERROR => {
                log::error!("API request failed: {self}");
                "Internal server error".to_string()
            }
            _ => {
                log::debug!("API request refused: {self}");
                self.to_string()
            }
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}

/// All the endpoints, with CORS open to anyone, since the Mini App is
/// served from elsewhere.
pub fn router<M: Messenger + 'static>(state: Arc<ApiState<M>>) -> Router {
    Router::new()
        .route("/tg-sync-profile", post(routes::sync_profile::<M>))
        .route("/tg-create-article", post(routes::create_article::<M>))
        .route("/tg-edit-article", post(routes::edit_article::<M>))
        .route("/send-moderation", post(routes::send_moderation::<M>))
        .route(
            "/send-edit-moderation",
            post(routes::send_edit_moderation::<M>),
        )
        .layer(CorsLayer::permissive())
        .with_state(state)
}

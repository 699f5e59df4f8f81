use std::sync::Arc;

use axum::{extract::State, Json};
use hub_bot_commons::messenger::Messenger;
use serde::Deserialize;
use serde_json::{json, Value};

use super::{verify_init_data, ApiError, ApiState, WebAppUser};
use crate::{
    database::{NewArticle, Profile, ProfileUpsert},
    moderation::{send_edit_moderation_request, send_moderation_request},
    types::{derive_preview, ArticleId, EditPayload, MediaType},
};

type ApiResult = Result<Json<Value>, ApiError>;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncProfileBody {
    init_data: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ArticleInput {
    title: Option<String>,
    body: Option<String>,
    preview: Option<String>,
    category_id: Option<String>,
    media_url: Option<String>,
    media_type: Option<MediaType>,
    #[serde(default)]
    is_anonymous: bool,
    allow_comments: Option<bool>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateArticleBody {
    init_data: Option<String>,
    article: Option<ArticleInput>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditArticleBody {
    init_data: Option<String>,
    article_id: Option<String>,
    edit: Option<EditPayload>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArticleIdBody {
    article_id: Option<String>,
}

fn required<T>(value: Option<T>, name: &'static str) -> Result<T, ApiError> {
    value.ok_or(ApiError::MissingField(name))
}

/// Like [`required`], but an empty string counts as missing too.
fn required_text(value: Option<String>, name: &'static str) -> Result<String, ApiError> {
    required(value.filter(|x| !x.trim().is_empty()), name)
}

fn article_id(value: Option<String>) -> Result<ArticleId, ApiError> {
    required(value, "articleId")?
        .parse()
        .map_err(|_| ApiError::InvalidField("articleId"))
}

fn session<M>(state: &ApiState<M>, init_data: Option<String>) -> Result<WebAppUser, ApiError> {
    let init_data = required_text(init_data, "initData")?;
    Ok(verify_init_data(&init_data, &state.user_bot_token)?)
}

async fn session_profile<M: Messenger>(
    state: &ApiState<M>,
    init_data: Option<String>,
) -> Result<Profile, ApiError> {
    let user = session(state, init_data)?;
    state
        .hub
        .db
        .get_profile_by_telegram_id(user.telegram_id())
        .await?
        .ok_or(ApiError::ProfileNotFound)
}

/// `tg-sync-profile`: create or refresh the profile of whoever opened the
/// app.
pub async fn sync_profile<M: Messenger + 'static>(
    State(state): State<Arc<ApiState<M>>>,
    Json(body): Json<SyncProfileBody>,
) -> ApiResult {
    let user = session(&state, body.init_data)?;
    let db = &state.hub.db;

    let profile = db
        .upsert_profile(&ProfileUpsert {
            telegram_id: user.telegram_id(),
            username: user.username.filter(|x| !x.is_empty()),
            first_name: match user.first_name.is_empty() {
                true => "User".to_string(),
                false => user.first_name,
            },
            last_name: user.last_name.filter(|x| !x.is_empty()),
            avatar_url: user.photo_url,
        })
        .await?;
    let articles_count = db.count_articles_by_author(profile.id).await?;

    Ok(Json(json!({
        "profile": profile,
        "articlesCount": articles_count,
    })))
}

/// `tg-create-article`: store a new pending article and put it in front of
/// the moderators.
pub async fn create_article<M: Messenger + 'static>(
    State(state): State<Arc<ApiState<M>>>,
    Json(body): Json<CreateArticleBody>,
) -> ApiResult {
    let article = required(body.article, "article")?;
    let title = required_text(article.title, "article.title")?;
    let text = required_text(article.body, "article.body")?;
    let profile = session_profile(&state, body.init_data).await?;
    let hub = &state.hub;

    let media_url = article.media_url.filter(|x| !x.trim().is_empty());
    let media_type = article
        .media_type
        .or_else(|| media_url.as_deref().map(MediaType::infer));

    let created = hub
        .db
        .insert_article(&NewArticle {
            author_id: profile.id,
            category_id: article.category_id.filter(|x| !x.is_empty()),
            preview: derive_preview(article.preview.as_deref(), &text),
            title,
            body: text,
            media_url,
            media_type,
            is_anonymous: article.is_anonymous,
            allow_comments: article.allow_comments.unwrap_or(true),
        })
        .await?;
    log::info!("Article {} submitted by {}", created.id, profile.telegram_id);

    // The article is in either way; `send-moderation` can try again.
    if let Err(e) = send_moderation_request(hub, hub.admin_chat, created.id).await {
        log::warn!("Failed to send article {} for moderation: {e}", created.id);
    }

    Ok(Json(json!({ "article": created })))
}

/// `tg-edit-article`: store an edit next to the live article and ask the
/// moderators about it.
pub async fn edit_article<M: Messenger + 'static>(
    State(state): State<Arc<ApiState<M>>>,
    Json(body): Json<EditArticleBody>,
) -> ApiResult {
    let id = article_id(body.article_id)?;
    let edit = required(body.edit, "edit")?;
    if edit.title.trim().is_empty() {
        return Err(ApiError::MissingField("edit.title"));
    }
    if edit.body.trim().is_empty() {
        return Err(ApiError::MissingField("edit.body"));
    }
    let profile = session_profile(&state, body.init_data).await?;
    let hub = &state.hub;

    let article = hub
        .db
        .get_article(id)
        .await?
        .ok_or(ApiError::ArticleNotFound)?;
    if article.author_id != profile.id {
        return Err(ApiError::NotAuthor);
    }

    if !hub.db.set_pending_edit(id, &edit).await? {
        return Err(ApiError::ArticleNotFound);
    }
    log::info!("Edit of article {id} submitted by {}", profile.telegram_id);

    if let Err(e) = send_edit_moderation_request(hub, hub.admin_chat, id).await {
        log::warn!("Failed to send the edit of article {id} for moderation: {e}");
    }

    Ok(Json(json!({ "ok": true })))
}

/// `send-moderation`: (re)send the moderation request of an article.
pub async fn send_moderation<M: Messenger + 'static>(
    State(state): State<Arc<ApiState<M>>>,
    Json(body): Json<ArticleIdBody>,
) -> ApiResult {
    let id = article_id(body.article_id)?;
    let hub = &state.hub;
    let message = send_moderation_request(hub, hub.admin_chat, id).await?;
    Ok(Json(json!({ "ok": true, "messageId": message.0 })))
}

/// `send-edit-moderation`: (re)send the request for a pending edit.
pub async fn send_edit_moderation<M: Messenger + 'static>(
    State(state): State<Arc<ApiState<M>>>,
    Json(body): Json<ArticleIdBody>,
) -> ApiResult {
    let id = article_id(body.article_id)?;
    let hub = &state.hub;
    let message = send_edit_moderation_request(hub, hub.admin_chat, id).await?;
    Ok(Json(json!({ "ok": true, "messageId": message.0 })))
}

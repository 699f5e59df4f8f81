//! Checking that a Mini App session really comes from Telegram.
//!
//! See <https://core.telegram.org/bots/webapps#validating-data-received-via-the-mini-app>

use hmac::{Hmac, Mac};
use serde::Deserialize;
use sha2::{Digest, Sha256};
use teloxide::types::UserId;

type HmacSha256 = Hmac<Sha256>;

/// The user a Mini App session belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct WebAppUser {
    pub id: u64,
    #[serde(default)]
    pub first_name: String,
    pub last_name: Option<String>,
    pub username: Option<String>,
    pub photo_url: Option<String>,
}

impl WebAppUser {
    #[must_use]
    pub fn telegram_id(&self) -> UserId {
        UserId(self.id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InitDataError {
    #[error("initData has no hash")]
    MissingHash,
    #[error("initData hash does not match")]
    BadSignature,
    #[error("initData has no user")]
    MissingUser,
    #[error("initData user is malformed: {0}")]
    BadUser(String),
}

/// The string the hash is computed over: every `key=value` pair but the
/// hash itself, sorted and joined with newlines.
fn data_check_string(pairs: &[(String, String)]) -> String {
    let mut lines: Vec<String> = pairs
        .iter()
        .filter(|(key, _)| key != "hash")
        .map(|(key, value)| format!("{key}={value}"))
        .collect();
    lines.sort();
    lines.join("\n")
}

fn mac_for(bot_token: &str) -> HmacSha256 {
    let secret = Sha256::digest(bot_token.as_bytes());
    HmacSha256::new_from_slice(&secret).expect("HMAC accepts any key length")
}

/// Check the signature of `init_data` against the token of the bot that
/// opened the Mini App, and get the user out of it.
pub fn verify_init_data(init_data: &str, bot_token: &str) -> Result<WebAppUser, InitDataError> {
    let pairs: Vec<(String, String)> = url::form_urlencoded::parse(init_data.as_bytes())
        .into_owned()
        .collect();

    let hash = pairs
        .iter()
        .find(|(key, _)| key == "hash")
        .map(|(_, value)| value.as_str())
        .ok_or(InitDataError::MissingHash)?;
    let hash = hex::decode(hash).map_err(|_| InitDataError::BadSignature)?;

    let mut mac = mac_for(bot_token);
    mac.update(data_check_string(&pairs).as_bytes());
    mac.verify_slice(&hash)
        .map_err(|_| InitDataError::BadSignature)?;

    let user = pairs
        .iter()
        .find(|(key, _)| key == "user")
        .map(|(_, value)| value.as_str())
        .ok_or(InitDataError::MissingUser)?;
    serde_json::from_str(user).map_err(|e| InitDataError::BadUser(e.to_string()))
}

use std::{fs, net::SocketAddr};

use teloxide::types::{ChatId, UserId};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("no {var} in the environment and no readable {file} file")]
    MissingToken { var: &'static str, file: &'static str },
    #[error("{0} is not set")]
    Missing(&'static str),
    #[error("{var} is not valid: {value:?}")]
    Invalid { var: &'static str, value: String },
}

/// Everything the bots need to know to start.
#[derive(Debug, Clone)]
pub struct Config {
    pub admin_bot_token: String,
    pub user_bot_token: String,
    /// The only user allowed to moderate.
    pub admin: UserId,
    /// Where moderation requests and admin notifications go.
    pub admin_chat: ChatId,
    pub database_url: String,
    pub http_listen: SocketAddr,
}

impl Config {
    /// Read the configuration from the environment. `.env` is expected to
    /// be loaded already.
    pub fn from_env() -> Result<Config, ConfigError> {
        Config::from_lookup(|var| std::env::var(var).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Config, ConfigError> {
        let get = |var: &str| lookup(var).filter(|x| !x.trim().is_empty());

        let admin_bot_token = token(
            get("ADMIN_BOT_TOKEN"),
            "ADMIN_BOT_TOKEN",
            match cfg!(debug_assertions) {
                true => "admin_key_debug",
                false => "admin_key",
            },
        )?;
        let user_bot_token = token(
            get("TELEGRAM_BOT_TOKEN"),
            "TELEGRAM_BOT_TOKEN",
            match cfg!(debug_assertions) {
                true => "user_key_debug",
                false => "user_key",
            },
        )?;

        let admin = get("TELEGRAM_ADMIN_ID").ok_or(ConfigError::Missing("TELEGRAM_ADMIN_ID"))?;
        let admin = UserId(admin.trim().parse().map_err(|_| ConfigError::Invalid {
            var: "TELEGRAM_ADMIN_ID",
            value: admin.clone(),
        })?);

        // Private chat with a user has the same ID as the user.
        #[allow(clippy::cast_possible_wrap)]
        let admin_chat = match get("TELEGRAM_ADMIN_CHAT_ID") {
            Some(chat) => ChatId(chat.trim().parse().map_err(|_| ConfigError::Invalid {
                var: "TELEGRAM_ADMIN_CHAT_ID",
                value: chat.clone(),
            })?),
            None => ChatId(admin.0 as i64),
        };

        let database_url = get("DATABASE_URL").unwrap_or_else(|| "sqlite:hub.sqlite".to_string());

        let http_listen = get("HTTP_LISTEN").unwrap_or_else(|| "0.0.0.0:8080".to_string());
        let http_listen = http_listen
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid {
                var: "HTTP_LISTEN",
                value: http_listen.clone(),
            })?;

        Ok(Config {
            admin_bot_token,
            user_bot_token,
            admin,
            admin_chat,
            database_url,
            http_listen,
        })
    }
}

/// Take the token from the environment, or from the key file next to the
/// binary like the older bots do.
fn token(
    from_env: Option<String>,
    var: &'static str,
    file: &'static str,
) -> Result<String, ConfigError> {
    if let Some(token) = from_env {
        return Ok(token.trim().to_string());
    }
    fs::read_to_string(file)
        .ok()
        .map(|x| x.trim().to_string())
        .filter(|x| !x.is_empty())
        .ok_or(ConfigError::MissingToken { var, file })
}

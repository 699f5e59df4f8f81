use std::{fmt::Display, str::FromStr};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Maximum length of an article preview, in characters.
pub const PREVIEW_LEN: usize = 200;

/// ID of an article.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ArticleId(pub Uuid);

impl ArticleId {
    #[must_use]
    pub fn new_random() -> Self {
        Self(Uuid::new_v4())
    }
}

impl FromStr for ArticleId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

impl Display for ArticleId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        Display::fmt(&self.0.hyphenated(), f)
    }
}

/// A short token standing in for an article inside callback payloads.
///
/// Telegram only allows 64 bytes of callback data, which a full UUID plus
/// the verb would eat most of. Case-sensitive.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ShortId(String);

impl ShortId {
    /// Length of freshly minted tokens.
    pub const LEN: usize = 8;
    /// Longest token accepted from a callback payload.
    pub const MAX_LEN: usize = 32;

    /// Make a new random token. Uniqueness is up to the registry.
    #[must_use]
    pub fn mint() -> Self {
        let mut token = Uuid::new_v4().simple().to_string();
        token.truncate(Self::LEN);
        Self(token)
    }

    /// The token used when the registry can't be reached: a plain prefix of
    /// the article ID. Nothing maps it back to the article.
    #[must_use]
    pub fn degraded(article: ArticleId) -> Self {
        let mut token = article.to_string();
        token.truncate(Self::LEN);
        Self(token)
    }

    /// Accept a token that came from outside, like a callback payload or the
    /// database. Returns [`None`] if it can't possibly be a token.
    #[must_use]
    pub fn parse(token: &str) -> Option<Self> {
        let valid = !token.is_empty()
            && token.len() <= Self::MAX_LEN
            && token
                .bytes()
                .all(|x| x.is_ascii_alphanumeric() || x == b'-' || x == b'_');
        valid.then(|| Self(token.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for ShortId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        Display::fmt(&self.0, f)
    }
}

/// Error for parsing the text enums below out of the database.
#[derive(Debug, thiserror::Error)]
#[error("unknown {kind} value: {value:?}")]
pub struct UnknownVariant {
    kind: &'static str,
    value: String,
}

/// Implements `as_str`, [`Display`] and [`FromStr`] for a plain enum
/// stored as text.
macro_rules! text_enum {
    ($name:ident, $kind:literal, { $($variant:ident => $text:literal),+ $(,)? }) => {
        impl $name {
            #[must_use]
            pub fn as_str(self) -> &'static str {
                match self {
                    $($name::$variant => $text,)+
                }
            }
        }

        impl Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = UnknownVariant;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok($name::$variant),)+
                    _ => Err(UnknownVariant {
                        kind: $kind,
                        value: s.to_string(),
                    }),
                }
            }
        }
    };
}

/// Moderation status of an article.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArticleStatus {
    /// Submitted and waiting for a moderator. The only state an article can
    /// be created in.
    Pending,
    Approved,
    Rejected,
}

text_enum!(ArticleStatus, "article status", {
    Pending => "pending",
    Approved => "approved",
    Rejected => "rejected",
});

/// Status of a support question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuestionStatus {
    Pending,
    Answered,
}

text_enum!(QuestionStatus, "question status", {
    Pending => "pending",
    Answered => "answered",
});

/// What a moderator did, as written into the moderation log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModerationAction {
    Approved,
    Rejected,
}

text_enum!(ModerationAction, "moderation action", {
    Approved => "approved",
    Rejected => "rejected",
});

/// What a moderation log entry is about: the article itself or an edit
/// proposed for it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModerationTarget {
    Article,
    Edit,
}

text_enum!(ModerationTarget, "moderation target", {
    Article => "article",
    Edit => "edit",
});

/// Kind of media attached to an article.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    Image,
    Youtube,
}

text_enum!(MediaType, "media type", {
    Image => "image",
    Youtube => "youtube",
});

impl MediaType {
    /// Guess the media type from its URL. Anything that isn't YouTube is
    /// assumed to be an image.
    #[must_use]
    pub fn infer(media_url: &str) -> Self {
        if media_url.contains("youtube.com") || media_url.contains("youtu.be") {
            MediaType::Youtube
        } else {
            MediaType::Image
        }
    }
}

/// Shadow copy of an article's editable fields, waiting for approval.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditPayload {
    pub title: String,
    pub body: String,
    #[serde(default)]
    pub is_anonymous: bool,
}

/// Make a preview for an article: the explicit preview if there is one,
/// otherwise the body, cut to [`PREVIEW_LEN`] characters.
#[must_use]
pub fn derive_preview(preview: Option<&str>, body: &str) -> String {
    let source = preview.filter(|x| !x.trim().is_empty()).unwrap_or(body);
    truncate_chars(source, PREVIEW_LEN).to_string()
}

/// Cut a string to at most `max` characters, never splitting one.
#[must_use]
pub fn truncate_chars(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((byte, _)) => &text[..byte],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    #[test]
    fn short_ids() {
        let minted = ShortId::mint();
        assert_eq!(minted.as_str().len(), ShortId::LEN);
        assert_eq!(ShortId::parse(minted.as_str()), Some(minted));

        assert!(ShortId::parse("").is_none());
        assert!(ShortId::parse("abc:def").is_none());
        assert!(ShortId::parse("кириллица").is_none());
        assert!(ShortId::parse(&"a".repeat(ShortId::MAX_LEN + 1)).is_none());

        let article: ArticleId = "0b7e4c1a-9f3e-4c55-8f07-2b1a3c4d5e6f".parse().unwrap();
        assert_eq!(ShortId::degraded(article).as_str(), "0b7e4c1a");
    }

    #[test]
    fn statuses_parse_back() {
        for status in [
            ArticleStatus::Pending,
            ArticleStatus::Approved,
            ArticleStatus::Rejected,
        ] {
            assert_eq!(status.as_str().parse::<ArticleStatus>().unwrap(), status);
        }
        assert!("published".parse::<ArticleStatus>().is_err());
    }

    #[test]
    fn previews() {
        assert_eq!(derive_preview(Some("short"), "long body"), "short");
        assert_eq!(derive_preview(Some("   "), "body"), "body");
        assert_eq!(derive_preview(None, "body"), "body");

        let body = "ж".repeat(300);
        let preview = derive_preview(None, &body);
        assert_eq!(preview.chars().count(), PREVIEW_LEN);
    }

    #[test]
    fn media_types() {
        assert_eq!(
            MediaType::infer("https://www.youtube.com/watch?v=dQw4w9WgXcQ"),
            MediaType::Youtube
        );
        assert_eq!(MediaType::infer("https://youtu.be/dQw4w9WgXcQ"), MediaType::Youtube);
        assert_eq!(MediaType::infer("data:image/png;base64,AAAA"), MediaType::Image);
    }
}

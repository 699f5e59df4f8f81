//! Inline button payloads and the keyboards made of them.
//!
//! Telegram allows at most 64 bytes of callback data per button. A payload
//! here is `verb:argument`, split on the first colon.

use std::{fmt::Display, str::FromStr};

use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup, UserId};

use crate::{database::SupportQuestion, types::ShortId};

/// Longest callback payload Telegram accepts, in bytes.
pub const MAX_PAYLOAD_LEN: usize = 64;

/// Longest question ID prefix accepted from a button. A full hyphenated
/// UUID is 36 characters.
const MAX_QUESTION_PREFIX_LEN: usize = 36;

/// What pressing an inline button asks for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallbackAction {
    Approve(ShortId),
    Reject(ShortId),
    EditApprove(ShortId),
    EditReject(ShortId),
    /// Show a page of the user list.
    Users {
        page: u32,
    },
    PremiumGrant(UserId),
    PremiumRevoke(UserId),
    PremiumExtend(UserId),
    /// Show a support question, found by a prefix of its ID.
    Question(String),
    /// A verb this version doesn't know. Acknowledged and otherwise ignored,
    /// so buttons from newer versions don't break anything.
    Unknown,
}

/// A known verb came with an argument that can't be right.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("malformed argument for {verb:?}: {argument:?}")]
pub struct MalformedPayload {
    pub verb: &'static str,
    pub argument: String,
}

impl FromStr for CallbackAction {
    type Err = MalformedPayload;

    fn from_str(payload: &str) -> Result<Self, Self::Err> {
        let (verb, argument) = payload.split_once(':').unwrap_or((payload, ""));

        macro_rules! parse_arg {
            ($verb:literal, $parser:expr) => {
                ($parser)(argument).ok_or_else(|| MalformedPayload {
                    verb: $verb,
                    argument: argument.to_string(),
                })?
            };
        }

        let short_id = |x: &str| ShortId::parse(x);
        let user_id = |x: &str| x.parse::<u64>().ok().map(UserId);

        Ok(match verb {
            "approve" => CallbackAction::Approve(parse_arg!("approve", short_id)),
            "reject" => CallbackAction::Reject(parse_arg!("reject", short_id)),
            "edit_approve" => CallbackAction::EditApprove(parse_arg!("edit_approve", short_id)),
            "edit_reject" => CallbackAction::EditReject(parse_arg!("edit_reject", short_id)),
            "users" => CallbackAction::Users {
                page: parse_arg!("users", |x: &str| x.parse::<u32>().ok()),
            },
            "premium_grant" => CallbackAction::PremiumGrant(parse_arg!("premium_grant", user_id)),
            "premium_revoke" => {
                CallbackAction::PremiumRevoke(parse_arg!("premium_revoke", user_id))
            }
            "premium_extend" => {
                CallbackAction::PremiumExtend(parse_arg!("premium_extend", user_id))
            }
            "question" => CallbackAction::Question(parse_arg!("question", |x: &str| {
                let valid = !x.is_empty()
                    && x.len() <= MAX_QUESTION_PREFIX_LEN
                    && x.bytes().all(|b| b.is_ascii_hexdigit() || b == b'-');
                valid.then(|| x.to_string())
            })),
            _ => CallbackAction::Unknown,
        })
    }
}

impl Display for CallbackAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CallbackAction::Approve(token) => write!(f, "approve:{token}"),
            CallbackAction::Reject(token) => write!(f, "reject:{token}"),
            CallbackAction::EditApprove(token) => write!(f, "edit_approve:{token}"),
            CallbackAction::EditReject(token) => write!(f, "edit_reject:{token}"),
            CallbackAction::Users { page } => write!(f, "users:{page}"),
            CallbackAction::PremiumGrant(user) => write!(f, "premium_grant:{user}"),
            CallbackAction::PremiumRevoke(user) => write!(f, "premium_revoke:{user}"),
            CallbackAction::PremiumExtend(user) => write!(f, "premium_extend:{user}"),
            CallbackAction::Question(prefix) => write!(f, "question:{prefix}"),
            CallbackAction::Unknown => f.write_str("unknown"),
        }
    }
}

/// How to answer a callback query once it's handled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Ack {
    /// Just stop the spinner.
    Silent,
    /// Stop the spinner and show this.
    Toast(String),
}

impl Ack {
    pub fn toast(text: impl Into<String>) -> Self {
        Ack::Toast(text.into())
    }

    #[must_use]
    pub fn text(&self) -> Option<&str> {
        match self {
            Ack::Silent => None,
            Ack::Toast(text) => Some(text),
        }
    }
}

fn button(text: &str, action: &CallbackAction) -> InlineKeyboardButton {
    InlineKeyboardButton::callback(text.to_string(), action.to_string())
}

/// Approve and reject buttons under a moderation request.
#[must_use]
pub fn moderation_keyboard(token: &ShortId) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![vec![
        button("✅ Approve", &CallbackAction::Approve(token.clone())),
        button("❌ Reject", &CallbackAction::Reject(token.clone())),
    ]])
}

/// Approve and reject buttons under an edit moderation request.
#[must_use]
pub fn edit_moderation_keyboard(token: &ShortId) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![vec![
        button("✅ Approve edit", &CallbackAction::EditApprove(token.clone())),
        button("❌ Reject edit", &CallbackAction::EditReject(token.clone())),
    ]])
}

/// Premium management buttons under a user card.
#[must_use]
pub fn premium_keyboard(user: UserId, is_premium: bool) -> InlineKeyboardMarkup {
    let toggle = match is_premium {
        true => button("❌ Revoke Premium", &CallbackAction::PremiumRevoke(user)),
        false => button("👑 Grant Premium", &CallbackAction::PremiumGrant(user)),
    };
    InlineKeyboardMarkup::new(vec![
        vec![toggle],
        vec![button(
            "📅 Extend by 30 days",
            &CallbackAction::PremiumExtend(user),
        )],
    ])
}

/// Paging buttons under the user list.
#[must_use]
pub fn users_keyboard(page: u32, has_next: bool) -> InlineKeyboardMarkup {
    let mut row = Vec::new();
    if page > 0 {
        row.push(button("⬅️ Back", &CallbackAction::Users { page: page - 1 }));
    }
    if let Some(next) = page.checked_add(1).filter(|_| has_next) {
        row.push(button("Next ➡️", &CallbackAction::Users { page: next }));
    }
    match row.is_empty() {
        true => InlineKeyboardMarkup::default(),
        false => InlineKeyboardMarkup::new(vec![row]),
    }
}

/// The button under statistics that opens the user list.
#[must_use]
pub fn stats_keyboard() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![vec![button(
        "👥 Open user list",
        &CallbackAction::Users { page: 0 },
    )]])
}

/// One button per question.
#[must_use]
pub fn questions_keyboard(questions: &[SupportQuestion]) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(questions.iter().map(|question| {
        let label = crate::types::truncate_chars(&question.question, 40);
        let label = match label.len() < question.question.len() {
            true => format!("❓ {label}..."),
            false => format!("❓ {label}"),
        };
        vec![button(&label, &CallbackAction::Question(question.short_id()))]
    }))
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    fn every_verb() -> Vec<CallbackAction> {
        let token = ShortId::parse(&"x".repeat(ShortId::MAX_LEN)).unwrap();
        let user = UserId(u64::MAX);
        vec![
            CallbackAction::Approve(token.clone()),
            CallbackAction::Reject(token.clone()),
            CallbackAction::EditApprove(token.clone()),
            CallbackAction::EditReject(token),
            CallbackAction::Users { page: u32::MAX },
            CallbackAction::PremiumGrant(user),
            CallbackAction::PremiumRevoke(user),
            CallbackAction::PremiumExtend(user),
            CallbackAction::Question("f".repeat(MAX_QUESTION_PREFIX_LEN)),
        ]
    }

    #[test]
    fn payloads_parse_back() {
        for action in every_verb() {
            let payload = action.to_string();
            assert_eq!(payload.parse::<CallbackAction>().unwrap(), action);
        }
    }

    #[test]
    fn payloads_fit() {
        // The longest arguments each verb can carry.
        for action in every_verb() {
            let payload = action.to_string();
            assert!(payload.is_ascii());
            assert!(payload.len() <= MAX_PAYLOAD_LEN, "{payload} is too long");
        }
    }

    #[test]
    fn unknown_verbs() {
        for payload in ["", "frobnicate:abc", "APPROVE:abcd1234", "unknown", "approve"] {
            let parsed = payload.parse::<CallbackAction>();
            if payload == "approve" {
                assert!(parsed.is_err());
            } else {
                assert_eq!(parsed.unwrap(), CallbackAction::Unknown);
            }
        }
    }

    #[test]
    fn malformed_arguments() {
        for payload in [
            "approve:",
            "reject:abc:def",
            "users:-1",
            "users:many",
            "premium_grant:@user",
            "question:",
            "question:xyz",
        ] {
            let error = payload.parse::<CallbackAction>().unwrap_err();
            assert!(payload.starts_with(error.verb));
        }
    }

    #[test]
    fn paging_buttons() {
        let pages = |keyboard: InlineKeyboardMarkup| -> Vec<String> {
            keyboard
                .inline_keyboard
                .into_iter()
                .flatten()
                .map(|x| x.text)
                .collect()
        };
        assert!(pages(users_keyboard(0, false)).is_empty());
        assert_eq!(pages(users_keyboard(0, true)), ["Next ➡️"]);
        assert_eq!(pages(users_keyboard(3, true)), ["⬅️ Back", "Next ➡️"]);
        // There is no page after the last one a payload can name.
        assert_eq!(pages(users_keyboard(u32::MAX, true)), ["⬅️ Back"]);
    }

    #[test]
    fn first_colon_splits() {
        assert_eq!(
            "approve:abcd1234".parse::<CallbackAction>().unwrap(),
            CallbackAction::Approve(ShortId::parse("abcd1234").unwrap())
        );
        assert_eq!(
            "users:3".parse::<CallbackAction>().unwrap(),
            CallbackAction::Users { page: 3 }
        );
    }

    #[test]
    fn paging() {
        assert!(users_keyboard(0, false).inline_keyboard.is_empty());
        let keyboard = users_keyboard(0, true);
        assert_eq!(keyboard.inline_keyboard[0].len(), 1);
        let keyboard = users_keyboard(2, false);
        assert_eq!(keyboard.inline_keyboard[0].len(), 1);
        let keyboard = users_keyboard(2, true);
        assert_eq!(keyboard.inline_keyboard[0].len(), 2);
    }
}

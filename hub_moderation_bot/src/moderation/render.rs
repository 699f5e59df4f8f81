//! Texts of moderation messages. Everything user-provided gets HTML-escaped.

use std::fmt::Write;

use html_escape::encode_text;

use crate::{
    database::{Article, Profile},
    types::{truncate_chars, EditPayload},
};

/// How much of a body to show when comparing edits.
const DIFF_PREVIEW_LEN: usize = 100;

fn author_line(article: &Article, author: Option<&Profile>) -> String {
    match (article.is_anonymous, author) {
        (true, _) => "Anonymous".to_string(),
        (false, Some(author)) => encode_text(&author.display_name()).into_owned(),
        (false, None) => "unknown author".to_string(),
    }
}

/// A new article waiting for a decision.
#[must_use]
pub fn moderation_request(article: &Article, author: Option<&Profile>) -> String {
    let mut text = format!(
        "📝 <b>New article for moderation</b>\n\n<b>{}</b>\n👤 {}\n",
        encode_text(&article.title),
        author_line(article, author),
    );
    if let Some(category) = &article.category_id {
        let _ = writeln!(text, "📂 {}", encode_text(category));
    }
    let _ = write!(text, "\n{}", encode_text(&article.preview));

    // Inline images are sent as the photo itself.
    if let Some(media) = article.media_url.as_deref().filter(|x| !x.starts_with("data:")) {
        let media_type = article.media_type.map_or("media", |x| x.as_str());
        let _ = write!(text, "\n\n🎞 {media_type}: {}", encode_text(media));
    }
    text
}

fn preview_of(body: &str) -> String {
    let cut = truncate_chars(body, DIFF_PREVIEW_LEN);
    match cut.len() < body.len() {
        true => format!("{}...", encode_text(cut)),
        false => encode_text(cut).into_owned(),
    }
}

fn yes_no(x: bool) -> &'static str {
    match x {
        true => "yes",
        false => "no",
    }
}

/// An edit waiting for a decision, next to what it would replace.
#[must_use]
pub fn edit_request(article: &Article, edit: &EditPayload, author: Option<&Profile>) -> String {
    let mut text = format!(
        "✏️ <b>Article edit for moderation</b>\n👤 {}\n",
        author_line(article, author)
    );

    if edit.title == article.title {
        let _ = write!(text, "\n<b>Title:</b> {} (unchanged)", encode_text(&edit.title));
    } else {
        let _ = write!(
            text,
            "\n<b>Title:</b>\n<s>{}</s>\n{}",
            encode_text(&article.title),
            encode_text(&edit.title)
        );
    }

    if edit.body == article.body {
        let _ = write!(text, "\n\n<b>Text:</b> unchanged");
    } else {
        let _ = write!(
            text,
            "\n\n<b>Text was:</b>\n{}\n\n<b>Text now:</b>\n{}",
            preview_of(&article.body),
            preview_of(&edit.body)
        );
    }

    if edit.is_anonymous != article.is_anonymous {
        let _ = write!(
            text,
            "\n\n<b>Anonymous:</b> {} → {}",
            yes_no(article.is_anonymous),
            yes_no(edit.is_anonymous)
        );
    }
    text
}

#[must_use]
pub fn approved_for_author(title: &str) -> String {
    format!(
        "✅ <b>Your article was approved!</b>\n\n📝 \"{}\"\n\nIt is now published and visible to everyone.",
        encode_text(title)
    )
}

#[must_use]
pub fn rejected_for_author(title: &str, reason: &str) -> String {
    format!(
        "❌ <b>Your article was rejected</b>\n\n📝 \"{}\"\n\n<b>Reason:</b> {}\n\nYou can fix it and send it for moderation again.",
        encode_text(title),
        encode_text(reason)
    )
}

#[must_use]
pub fn edit_approved_for_author(title: &str) -> String {
    format!(
        "✅ <b>Your edit was approved!</b>\n\n📝 \"{}\" now shows the new version.",
        encode_text(title)
    )
}

#[must_use]
pub fn edit_rejected_for_author(title: &str) -> String {
    format!(
        "❌ <b>Your edit was rejected</b>\n\n📝 \"{}\" stays as it was.",
        encode_text(title)
    )
}

#[must_use]
pub fn approved_for_admin(title: &str) -> String {
    format!("✅ Article \"{}\" approved.", encode_text(title))
}

#[must_use]
pub fn rejected_for_admin(title: &str, reason: &str) -> String {
    format!(
        "❌ Article \"{}\" rejected.\n\n<b>Reason:</b> {}",
        encode_text(title),
        encode_text(reason)
    )
}

#[must_use]
pub fn reason_prompt(title: &str) -> String {
    format!(
        "📝 Write the reason for rejecting \"{}\" as your next message.",
        encode_text(title)
    )
}

#[must_use]
pub fn edit_approved_for_admin(title: &str) -> String {
    format!("✅ Edit of \"{}\" approved.", encode_text(title))
}

#[must_use]
pub fn edit_rejected_for_admin(title: &str) -> String {
    format!("❌ Edit of \"{}\" rejected.", encode_text(title))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escapes_user_text() {
        let text = rejected_for_author("<b>Bold</b> & co", "too <short>");
        assert!(text.contains("&lt;b&gt;Bold&lt;/b&gt; &amp; co"));
        assert!(text.contains("too &lt;short&gt;"));
    }

    #[test]
    fn long_bodies_are_cut() {
        let long = "a".repeat(DIFF_PREVIEW_LEN + 1);
        assert_eq!(preview_of(&long), format!("{}...", "a".repeat(DIFF_PREVIEW_LEN)));
        assert_eq!(preview_of("short"), "short");
    }
}

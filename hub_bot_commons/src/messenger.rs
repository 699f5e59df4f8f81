use std::future::Future;

use teloxide::{
    payloads::{
        AnswerCallbackQuerySetters, EditMessageReplyMarkupSetters, EditMessageTextSetters,
        SendMessageSetters, SendPhotoSetters,
    },
    requests::Requester,
    sugar::request::RequestLinkPreviewExt,
    types::{CallbackQueryId, ChatId, InlineKeyboardMarkup, InputFile, MessageId, ParseMode},
    Bot, RequestError,
};

/// Everything the hub bots ever ask of Telegram.
///
/// Every text is sent as HTML. Every call is a single attempt; whoever needs
/// retries or best-effort semantics layers them on top.
pub trait Messenger: Send + Sync {
    /// Send a text message, optionally with an inline keyboard under it.
    fn send_text(
        &self,
        chat: ChatId,
        text: &str,
        keyboard: Option<InlineKeyboardMarkup>,
    ) -> impl Future<Output = Result<MessageId, RequestError>> + Send;

    /// Send a photo from raw bytes with an HTML caption.
    fn send_photo(
        &self,
        chat: ChatId,
        photo: Vec<u8>,
        caption: &str,
        keyboard: Option<InlineKeyboardMarkup>,
    ) -> impl Future<Output = Result<MessageId, RequestError>> + Send;

    /// Replace text (and keyboard) of an existing message.
    fn edit_text(
        &self,
        chat: ChatId,
        message: MessageId,
        text: &str,
        keyboard: Option<InlineKeyboardMarkup>,
    ) -> impl Future<Output = Result<(), RequestError>> + Send;

    /// Remove the inline keyboard from a message.
    fn clear_keyboard(
        &self,
        chat: ChatId,
        message: MessageId,
    ) -> impl Future<Output = Result<(), RequestError>> + Send;

    /// Acknowledge a callback query, clearing the loading spinner on the
    /// client and optionally showing a toast.
    fn answer_callback(
        &self,
        query: CallbackQueryId,
        toast: Option<&str>,
    ) -> impl Future<Output = Result<(), RequestError>> + Send;
}

impl Messenger for Bot {
    async fn send_text(
        &self,
        chat: ChatId,
        text: &str,
        keyboard: Option<InlineKeyboardMarkup>,
    ) -> Result<MessageId, RequestError> {
        let mut request = self
            .send_message(chat, text)
            .parse_mode(ParseMode::Html)
            .disable_link_preview(true);
        if let Some(keyboard) = keyboard {
            request = request.reply_markup(keyboard);
        }
        Ok(request.await?.id)
    }

    async fn send_photo(
        &self,
        chat: ChatId,
        photo: Vec<u8>,
        caption: &str,
        keyboard: Option<InlineKeyboardMarkup>,
    ) -> Result<MessageId, RequestError> {
        let mut request = Requester::send_photo(
            self,
            chat,
            InputFile::memory(photo).file_name("photo.jpg"),
        )
        .caption(caption)
        .parse_mode(ParseMode::Html);
        if let Some(keyboard) = keyboard {
            request = request.reply_markup(keyboard);
        }
        Ok(request.await?.id)
    }

    async fn edit_text(
        &self,
        chat: ChatId,
        message: MessageId,
        text: &str,
        keyboard: Option<InlineKeyboardMarkup>,
    ) -> Result<(), RequestError> {
        let mut request = self
            .edit_message_text(chat, message, text)
            .parse_mode(ParseMode::Html)
            .disable_link_preview(true);
        if let Some(keyboard) = keyboard {
            request = request.reply_markup(keyboard);
        }
        request.await?;
        Ok(())
    }

    async fn clear_keyboard(&self, chat: ChatId, message: MessageId) -> Result<(), RequestError> {
        self.edit_message_reply_markup(chat, message)
            .reply_markup(InlineKeyboardMarkup {
                inline_keyboard: Vec::new(),
            })
            .await?;
        Ok(())
    }

    async fn answer_callback(
        &self,
        query: CallbackQueryId,
        toast: Option<&str>,
    ) -> Result<(), RequestError> {
        let mut request = self.answer_callback_query(query);
        if let Some(toast) = toast {
            request = request.text(toast);
        }
        request.await?;
        Ok(())
    }
}

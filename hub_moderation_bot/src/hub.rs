use hub_bot_commons::messenger::Messenger;
use teloxide::{
    types::{ChatId, UserId},
    Bot,
};

use crate::database::Database;

/// Everything a handler needs: the store and both bots.
///
/// Holds no state of its own between events. Whatever one event leaves for
/// a later one goes through the database.
pub struct Hub<M = Bot> {
    pub db: Database,
    /// The bot moderators talk to.
    pub admin_bot: M,
    /// The bot article authors and support askers talk to.
    pub user_bot: M,
    pub admin: UserId,
    pub admin_chat: ChatId,
}

impl<M: Messenger> Hub<M> {
    pub fn new(db: Database, admin_bot: M, user_bot: M, admin: UserId, admin_chat: ChatId) -> Self {
        Hub {
            db,
            admin_bot,
            user_bot,
            admin,
            admin_chat,
        }
    }

    #[must_use]
    pub fn is_admin(&self, user: UserId) -> bool {
        user == self.admin
    }
}

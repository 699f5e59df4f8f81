use std::sync::Arc;

use teloxide::{dptree::deps, prelude::*};

use crate::{
    api::{self, ApiState},
    config::Config,
    database::Database,
    handlers::{self, commands::Command, user_bot},
    hub::Hub,
};

/// # Panics
///
/// Panics if the database can't be opened or the HTTP port can't be bound.
pub async fn entry() {
    log::info!("ASYNC WOOOO");

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            log::error!("Can't start: {e}");
            return;
        }
    };

    let database = Database::new(&config.database_url)
        .await
        .expect("Failed to create database!");

    let admin_bot = Bot::new(&config.admin_bot_token);
    let user_bot = Bot::new(&config.user_bot_token);

    if let Err(e) = admin_bot
        .set_my_commands(Command::generate_bot_commands())
        .await
    {
        log::warn!("Failed to set admin bot commands: {e}");
    }
    if let Err(e) = user_bot
        .set_my_commands(user_bot::generate_bot_commands())
        .await
    {
        log::warn!("Failed to set user bot commands: {e}");
    }

    let hub = Arc::new(Hub::new(
        database,
        admin_bot.clone(),
        user_bot.clone(),
        config.admin,
        config.admin_chat,
    ));

    let app = api::router(Arc::new(ApiState {
        hub: hub.clone(),
        user_bot_token: config.user_bot_token.clone(),
    }));
    let listener = tokio::net::TcpListener::bind(config.http_listen)
        .await
        .expect("Failed to bind the HTTP listener!");
    log::info!("Serving the Mini App API on {}", config.http_listen);
    let server = async move {
        if let Err(e) = axum::serve(listener, app).await {
            log::error!("HTTP server died: {e}");
        }
    };

    log::info!("Creating the handlers...");

    let admin_handler = dptree::entry()
        .branch(Update::filter_message().endpoint(handlers::handle_admin_message))
        .branch(Update::filter_callback_query().endpoint(handlers::handle_callback_query));

    let user_handler =
        dptree::entry().branch(Update::filter_message().endpoint(handlers::handle_user_message));

    let mut admin_dispatcher = Dispatcher::builder(admin_bot, admin_handler)
        .default_handler(|_| async {})
        .dependencies(deps![hub.clone()])
        .enable_ctrlc_handler()
        .build();
    let mut user_dispatcher = Dispatcher::builder(user_bot, user_handler)
        .default_handler(|_| async {})
        .dependencies(deps![hub])
        .enable_ctrlc_handler()
        .build();

    log::info!("Dispatching the dispatchers!");

    // Whichever stops first takes the rest down with it.
    tokio::select! {
        () = admin_dispatcher.dispatch() => {}
        () = user_dispatcher.dispatch() => {}
        () = server => {}
    }

    log::info!("it appears we have been bonked.");
}

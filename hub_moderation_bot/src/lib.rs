//! Moderation hub for a Telegram Mini App: an admin bot that decides on
//! submitted articles, a user bot that tells authors about it, and the HTTP
//! API the Mini App submits through.

/// Types shared by everything else.
pub mod types;

/// The database.
pub mod database;

/// Errors of moderation and admin actions.
pub mod error;

/// Configuration from the environment.
pub mod config;

/// The store and both bots, bundled.
pub mod hub;

/// Short tokens standing in for article IDs on buttons.
pub mod short_id;

/// Button payloads and keyboards.
pub mod callback;

/// Best-effort messages to authors and admins.
pub mod notify;

/// The article moderation workflow.
pub mod moderation;

/// Support questions and their answers.
pub mod support;

/// Premium management.
pub mod premium;

/// What admin commands do.
pub mod admin;

/// Functions that handle events from Telegram.
pub mod handlers;

/// The Mini App HTTP API.
pub mod api;

#[cfg(test)]
mod testing;

/// Entry function that starts the bots and the API.
mod entry;
pub use entry::*;

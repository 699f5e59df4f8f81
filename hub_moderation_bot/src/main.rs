use hub_bot_commons::*;

fn main() {
    if std::env::var_os("RUST_LOG").is_none() {
        std::env::set_var("RUST_LOG", "WARN,hub_moderation_bot=debug");
    }
    start_everything(hub_moderation_bot::entry());
}

pub mod commands;
pub mod dispatcher;
pub mod handle_message;

pub use commands::{handle_command, Command};
pub use dispatcher::{message_handler, run_dispatcher, BotPipeline};
pub use handle_message::handle_message;

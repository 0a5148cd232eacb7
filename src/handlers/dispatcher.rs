use crate::challenge::RedisChallengeProvider;
use crate::handlers::{handle_command, handle_message, Command};
use crate::ledger::RedisLedger;
use crate::pipeline::ScoringPipeline;
use std::sync::Arc;
use teloxide::dispatching::{Dispatcher, UpdateFilterExt};
use teloxide::dptree;
use teloxide::prelude::{Message, ResponseResult, Update};
use teloxide::utils::command::BotCommands;
use teloxide::Bot;

/// Production pipeline wiring: Redis ledger behind the scoring core.
pub type BotPipeline = ScoringPipeline<RedisLedger>;

/// Dispatch one incoming message: a recognized command runs its handler,
/// anything else goes through the scoring pipeline.
pub async fn message_handler(
    bot: Bot,
    msg: Message,
    pipeline: Arc<BotPipeline>,
    challenges: Arc<RedisChallengeProvider>,
) -> ResponseResult<()> {
    if let Some(text) = msg.text() {
        if let Ok(cmd) = Command::parse(text, "CinegramPuntumBot") {
            handle_command(bot, msg, cmd, pipeline, challenges).await?;
        } else {
            handle_message(bot, msg, pipeline, challenges).await?;
        }
    }
    Ok(())
}

/// Build and run the dispatcher over message updates.
pub async fn run_dispatcher(
    bot: Bot,
    pipeline: Arc<BotPipeline>,
    challenges: Arc<RedisChallengeProvider>,
) {
    let handler = dptree::entry().branch(Update::filter_message().endpoint(message_handler));

    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![pipeline, challenges])
        .build()
        .dispatch()
        .await;
}

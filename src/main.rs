use cinegram_puntum_bot::catalog::HashtagCatalog;
use cinegram_puntum_bot::challenge::RedisChallengeProvider;
use cinegram_puntum_bot::handlers::run_dispatcher;
use cinegram_puntum_bot::ledger::RedisLedger;
use cinegram_puntum_bot::pipeline::ScoringPipeline;
use dotenv::dotenv;
use std::env;
use std::sync::Arc;
use teloxide::prelude::*;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    pretty_env_logger::init();
    dotenv().ok();
    log::info!("Starting Cinegram Puntum bot...");

    let bot_token = env::var("BOT_TOKEN").expect("BOT_TOKEN must be set in .env file");
    let redis_url = env::var("REDIS_URL").unwrap_or_else(|_| "redis://127.0.0.1/".to_string());

    let bot = Bot::new(bot_token);
    let ledger = RedisLedger::new(&redis_url)?;
    let challenges = Arc::new(RedisChallengeProvider::new(&redis_url)?);
    let pipeline = Arc::new(ScoringPipeline::new(HashtagCatalog::default_table(), ledger));

    // Keeps the spam window map bounded on long uptimes.
    tokio::spawn({
        let pipeline = pipeline.clone();
        async move { pipeline.guard().start_eviction_sweep().await }
    });

    run_dispatcher(bot, pipeline, challenges).await;
    Ok(())
}

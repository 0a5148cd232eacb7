use crate::challenge::ChallengeProvider;
use crate::config::{bonus, SPAM_WATCHWORDS};
use crate::ledger::PointsLedger;
use crate::pipeline::{InboundMessage, ScoringEvent, ScoringPipeline};
use chrono::Utc;
use std::sync::Arc;
use teloxide::prelude::*;

/// Handle one plain text message: run the scoring pipeline exactly once and
/// reply with the outcome. Storage failures get a generic apology; partial
/// totals are never reported as success.
pub async fn handle_message<L, P>(
    bot: Bot,
    message: Message,
    pipeline: Arc<ScoringPipeline<L>>,
    challenges: Arc<P>,
) -> ResponseResult<()>
where
    L: PointsLedger + Send + Sync + 'static,
    P: ChallengeProvider + Send + Sync + 'static,
{
    let Some(text) = message.text().map(ToOwned::to_owned) else {
        return Ok(());
    };
    let Some(from) = message.from.clone() else {
        return Ok(());
    };

    let inbound = InboundMessage {
        user_id: from.id.0,
        username: from.username.clone().unwrap_or_else(|| from.first_name.clone()),
        chat_id: message.chat.id.0,
        message_id: message.id.0,
        text,
        timestamp: Utc::now(),
    };

    let daily = challenges.active_daily();
    let weekly = challenges.active_weekly();
    match pipeline.score_message(&inbound, daily.as_ref(), weekly.as_ref()) {
        Ok(event) => {
            if let Some(reply) = render_event(&event) {
                bot.send_message(message.chat.id, reply).await?;
            }
        }
        Err(err) => {
            log::error!(
                "could not record points for user {}: {}",
                inbound.user_id,
                err
            );
            bot.send_message(
                message.chat.id,
                "No se pudieron registrar tus puntos, inténtalo de nuevo.",
            )
            .await?;
        }
    }

    if let Some(reminder) = watchword_reminder(&inbound.text) {
        bot.send_message(message.chat.id, reminder).await?;
    }
    Ok(())
}

/// Render a scoring event into reply text. A no-op event yields no reply.
fn render_event(event: &ScoringEvent) -> Option<String> {
    if event.is_noop() {
        return None;
    }

    let mut lines = Vec::new();
    if event.total_points > 0 {
        let scored: Vec<String> = event
            .matched
            .iter()
            .filter(|award| !award.suppressed && award.points > 0)
            .map(|award| format!("#{} (+{})", award.keyword, award.points))
            .collect();
        let mut line = format!("+{} puntos", event.total_points);
        if !scored.is_empty() {
            line.push_str(&format!(" por: {}", scored.join(", ")));
        }
        if event.length_bonus > 0 {
            line.push_str(&format!(" (+{} bonus detalle)", event.length_bonus));
        }
        lines.push(line);
        for fired in &event.challenge_bonuses {
            let kind = if fired.label == bonus::DAILY_CHALLENGE_LABEL {
                "Reto diario"
            } else {
                "Reto semanal"
            };
            lines.push(format!("¡{} completado! Bonus: +{} puntos", kind, fired.points));
        }
    }
    for warning in event.warnings() {
        lines.push(warning.to_string());
    }
    Some(lines.join("\n"))
}

/// Friendly reminder when promo phrases show up; independent of scoring.
fn watchword_reminder(text: &str) -> Option<&'static str> {
    let lowered = text.to_lowercase();
    if SPAM_WATCHWORDS.iter().any(|word| lowered.contains(word)) {
        Some("¡Cuidado con el spam! Esto es un grupo de cine, no de ofertas.")
    } else {
        None
    }
}

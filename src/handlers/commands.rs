use crate::catalog::HashtagCatalog;
use crate::challenge::{ChallengeProvider, ChallengeSpec};
use crate::config::bonus;
use crate::ledger::PointsLedger;
use crate::levels;
use crate::pipeline::ScoringPipeline;
use std::sync::Arc;
use teloxide::prelude::*;
use teloxide::utils::command::BotCommands;

#[derive(BotCommands, Clone)]
#[command(rename_rule = "lowercase", description = "Comandos de Cinegram Puntum:")]
pub enum Command {
    #[command(description = "iniciar el bot.")]
    Start,
    #[command(description = "mostrar las reglas de puntos.")]
    Help,
    #[command(description = "ver el top 10 de cinéfilos.")]
    Ranking,
    #[command(description = "ver tu perfil de puntos.")]
    Miperfil,
    #[command(description = "ver los retos activos.")]
    Reto,
}

pub async fn handle_command<L, P>(
    bot: Bot,
    msg: Message,
    cmd: Command,
    pipeline: Arc<ScoringPipeline<L>>,
    challenges: Arc<P>,
) -> ResponseResult<()>
where
    L: PointsLedger + Send + Sync + 'static,
    P: ChallengeProvider + Send + Sync + 'static,
{
    let chat_id = msg.chat.id;
    match cmd {
        Command::Start => {
            bot.send_message(
                chat_id,
                "¡Bienvenido a Cinegram Puntum Bot! Publica con hashtags cinéfilos para ganar puntos. Usa /help para ver las reglas.",
            )
            .await?;
        }
        Command::Help => {
            bot.send_message(chat_id, render_help(pipeline.catalog())).await?;
        }
        Command::Ranking => match pipeline.ledger().top_users(10) {
            Ok(top) if !top.is_empty() => {
                let mut lines = vec!["Top 10 cinéfilos:".to_string()];
                for (position, user) in top.iter().enumerate() {
                    lines.push(format!(
                        "{}. {} - {} puntos ({})",
                        position + 1,
                        user.username,
                        user.points,
                        levels::tier_for(user.points).name
                    ));
                }
                bot.send_message(chat_id, lines.join("\n")).await?;
            }
            Ok(_) => {
                bot.send_message(chat_id, "Todavía no hay puntos registrados.").await?;
            }
            Err(err) => {
                log::error!("ranking query failed: {}", err);
                bot.send_message(chat_id, "No se pudo consultar el ranking, inténtalo de nuevo.")
                    .await?;
            }
        },
        Command::Miperfil => {
            let Some(from) = msg.from.clone() else {
                return Ok(());
            };
            match pipeline.ledger().user_stats(from.id.0) {
                Ok(Some(stats)) => {
                    let mut text = format!(
                        "Perfil de {}\nPuntos: {}\nNivel: {} - {}",
                        stats.username,
                        stats.points,
                        stats.level,
                        levels::tier_for(stats.points).name
                    );
                    if let Some(missing) = levels::points_to_next(stats.points) {
                        text.push_str(&format!(
                            "\nTe faltan {} puntos para subir de nivel",
                            missing
                        ));
                    }
                    if let Ok(counts) = pipeline.ledger().hashtag_counts(from.id.0) {
                        if !counts.is_empty() {
                            let favorites: Vec<String> = counts
                                .iter()
                                .take(3)
                                .map(|(label, uses)| format!("{} ({})", label, uses))
                                .collect();
                            text.push_str(&format!("\nTus hashtags: {}", favorites.join(", ")));
                        }
                    }
                    bot.send_message(chat_id, text).await?;
                }
                Ok(None) => {
                    bot.send_message(
                        chat_id,
                        "Todavía no tienes puntos. ¡Comparte tu pasión por el cine!",
                    )
                    .await?;
                }
                Err(err) => {
                    log::error!("profile query failed for user {}: {}", from.id, err);
                    bot.send_message(chat_id, "No se pudo consultar tu perfil, inténtalo de nuevo.")
                        .await?;
                }
            }
        }
        Command::Reto => {
            let mut lines = Vec::new();
            if let Some(daily) = challenges.active_daily() {
                lines.push(render_challenge("Reto diario", &daily));
            }
            if let Some(weekly) = challenges.active_weekly() {
                lines.push(render_challenge("Reto semanal", &weekly));
            }
            let text = if lines.is_empty() {
                "No hay retos activos en este momento.".to_string()
            } else {
                lines.join("\n")
            };
            bot.send_message(chat_id, text).await?;
        }
    }
    Ok(())
}

fn render_help(catalog: &HashtagCatalog) -> String {
    let mut lines = vec!["Gana puntos publicando con estos hashtags:".to_string()];
    for rule in catalog.rules_by_value() {
        let mut line = format!("#{} (+{})", rule.keyword, rule.base_points);
        if let Some(min_words) = rule.min_words {
            line.push_str(&format!(", mínimo {} palabras", min_words));
        }
        if let Some(pattern_rule) = &rule.required_pattern {
            line.push_str(&format!(", formato '{}'", pattern_rule.hint));
        }
        lines.push(line);
    }
    lines.push(format!(
        "Mensajes de más de {} caracteres suman +{} de bonus.",
        bonus::LENGTH_THRESHOLD_CHARS,
        bonus::LENGTH_BONUS_POINTS
    ));
    lines.join("\n")
}

fn render_challenge(kind: &str, spec: &ChallengeSpec) -> String {
    let mut conditions = Vec::new();
    if let Some(tag) = spec.hashtag.as_deref().filter(|t| !t.is_empty()) {
        conditions.push(format!("usa {}", tag));
    }
    if let Some(keywords) = spec.keywords.as_ref().filter(|k| !k.is_empty()) {
        conditions.push(format!("menciona {}", keywords.join(" o ")));
    }
    if let Some(min_words) = spec.min_words {
        conditions.push(format!("mínimo {} palabras", min_words));
    }
    format!(
        "{}: {} (bonus +{} puntos)",
        kind,
        conditions.join(", "),
        spec.bonus_points
    )
}

use chrono::{DateTime, TimeZone, Utc};
use cinegram_puntum_bot::catalog::HashtagCatalog;
use cinegram_puntum_bot::challenge::ChallengeSpec;
use cinegram_puntum_bot::ledger::{MemoryLedger, PointsAward, PointsLedger, RankedUser, StorageError, UserStats};
use cinegram_puntum_bot::pipeline::{InboundMessage, ScoringPipeline};

fn at(secs: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
}

fn message(user_id: u64, text: &str, secs: i64) -> InboundMessage {
    InboundMessage {
        user_id,
        username: format!("user{}", user_id),
        chat_id: -1001,
        message_id: 1,
        text: text.to_string(),
        timestamp: at(secs),
    }
}

fn words(n: usize) -> String {
    (0..n)
        .map(|i| format!("palabra{}", i))
        .collect::<Vec<_>>()
        .join(" ")
}

fn pipeline() -> ScoringPipeline<MemoryLedger> {
    ScoringPipeline::new(HashtagCatalog::default_table(), MemoryLedger::new())
}

fn keyword_challenge(keyword: &str, bonus: i64) -> ChallengeSpec {
    ChallengeSpec {
        hashtag: None,
        keywords: Some(vec![keyword.to_string()]),
        min_words: None,
        bonus_points: bonus,
    }
}

fn hashtag_challenge(tag: &str, bonus: i64) -> ChallengeSpec {
    ChallengeSpec {
        hashtag: Some(tag.to_string()),
        keywords: None,
        min_words: None,
        bonus_points: bonus,
    }
}

#[test]
fn no_hashtag_no_effect() {
    let pipeline = pipeline();
    let event = pipeline
        .score_message(&message(1, "una charla normal sobre cine", 0), None, None)
        .unwrap();
    assert_eq!(event.total_points, 0);
    assert!(event.is_noop());
    assert!(pipeline.ledger().awards().is_empty());
}

#[test]
fn unknown_hashtags_are_ignored_even_on_long_messages() {
    let pipeline = pipeline();
    let long_body = format!("#inventado {}", "a".repeat(180));
    let event = pipeline.score_message(&message(1, &long_body, 0), None, None).unwrap();
    assert_eq!(event.total_points, 0);
    assert!(event.matched.is_empty());
    assert!(pipeline.ledger().awards().is_empty());
}

#[test]
fn multiple_hashtags_merge_into_one_write() {
    let pipeline = pipeline();
    let event = pipeline
        .score_message(&message(1, "#aporte y #debate sobre el neorrealismo", 0), None, None)
        .unwrap();
    assert_eq!(event.base_points, 3 + 4);
    assert_eq!(event.total_points, 7);

    let awards = pipeline.ledger().awards();
    assert_eq!(awards.len(), 1);
    assert_eq!(awards[0].points, 7);
    assert_eq!(awards[0].label, "#aporte");
    assert!(!awards[0].is_challenge_bonus);
}

#[test]
fn quality_gate_is_monotonic_in_word_count() {
    let pipeline = pipeline();
    let at_minimum = pipeline
        .score_message(&message(1, &format!("#resena {}", words(50)), 0), None, None)
        .unwrap();
    let below_minimum = pipeline
        .score_message(&message(2, &format!("#resena {}", words(49)), 0), None, None)
        .unwrap();
    // both bodies are long enough for the detail bonus, so it cancels out
    assert_eq!(at_minimum.base_points, 7);
    assert_eq!(below_minimum.base_points, 3);
    assert_eq!(at_minimum.length_bonus, below_minimum.length_bonus);
    assert!(at_minimum.total_points >= below_minimum.total_points);
    assert!(below_minimum.matched[0].quality_penalized);
    assert!(!at_minimum.matched[0].quality_penalized);
}

#[test]
fn length_bonus_applies_strictly_above_threshold() {
    let pipeline = pipeline();
    let body_at_threshold = format!("#aporte {}", "a".repeat(142));
    assert_eq!(body_at_threshold.chars().count(), 150);
    let event = pipeline.score_message(&message(1, &body_at_threshold, 0), None, None).unwrap();
    assert_eq!(event.length_bonus, 0);
    assert_eq!(event.total_points, 3);

    let body_over_threshold = format!("#aporte {}", "a".repeat(143));
    assert_eq!(body_over_threshold.chars().count(), 151);
    let event = pipeline.score_message(&message(2, &body_over_threshold, 0), None, None).unwrap();
    assert_eq!(event.length_bonus, 2);
    assert_eq!(event.total_points, 5);
}

#[test]
fn daily_and_weekly_bonuses_sum_independently() {
    let pipeline = pipeline();
    let daily = keyword_challenge("kurosawa", 5);
    let weekly = hashtag_challenge("#debate", 10);

    let event = pipeline
        .score_message(
            &message(1, "#debate hablemos de kurosawa", 0),
            Some(&daily),
            Some(&weekly),
        )
        .unwrap();
    assert_eq!(event.base_points, 4);
    assert_eq!(event.challenge_bonuses.len(), 2);
    assert_eq!(event.total_points, 4 + 5 + 10);

    let awards = pipeline.ledger().awards();
    assert_eq!(awards.len(), 3);
    assert_eq!(awards[0].points, 4);
    assert!(!awards[0].is_challenge_bonus);
    assert_eq!(awards[1].label, "(reto_diario)");
    assert_eq!(awards[1].points, 5);
    assert!(awards[1].is_challenge_bonus);
    assert_eq!(awards[2].label, "(reto_semanal)");
    assert_eq!(awards[2].points, 10);
}

#[test]
fn unmatched_challenge_condition_earns_no_bonus() {
    let pipeline = pipeline();
    let daily = keyword_challenge("kurosawa", 5);
    let weekly = hashtag_challenge("#debate", 10);

    // only the weekly condition is satisfied
    let event = pipeline
        .score_message(
            &message(1, "#debate sobre otro director", 0),
            Some(&daily),
            Some(&weekly),
        )
        .unwrap();
    assert_eq!(event.challenge_bonuses.len(), 1);
    assert_eq!(event.challenge_bonuses[0].label, "(reto_semanal)");
    assert_eq!(event.total_points, 4 + 10);
}

#[test]
fn challenge_min_words_vetoes_thin_matches() {
    let pipeline = pipeline();
    let daily = ChallengeSpec {
        min_words: Some(10),
        ..keyword_challenge("kurosawa", 5)
    };
    let event = pipeline
        .score_message(&message(1, "#aporte kurosawa", 0), Some(&daily), None)
        .unwrap();
    assert!(event.challenge_bonuses.is_empty());
    assert_eq!(event.total_points, 3);
}

#[test]
fn keyword_challenge_fires_without_any_hashtag() {
    let pipeline = pipeline();
    let daily = keyword_challenge("kurosawa", 5);
    let event = pipeline
        .score_message(
            &message(1, "anoche vi una de kurosawa y me encantó", 0),
            Some(&daily),
            None,
        )
        .unwrap();
    assert_eq!(event.base_points, 0);
    assert_eq!(event.total_points, 5);

    // only the challenge row is written, no zero-point base row
    let awards = pipeline.ledger().awards();
    assert_eq!(awards.len(), 1);
    assert_eq!(awards[0].label, "(reto_diario)");
    assert!(awards[0].is_challenge_bonus);
}

// Scenario: short review earns half points with a warning.
#[test]
fn short_review_earns_halved_points() {
    let pipeline = pipeline();
    let event = pipeline
        .score_message(&message(1, &format!("#reseña {}", words(10)), 0), None, None)
        .unwrap();
    assert_eq!(event.base_points, 3);
    assert_eq!(event.length_bonus, 0);
    assert_eq!(event.total_points, 3);
    assert!(event.has_warnings());

    let awards = pipeline.ledger().awards();
    assert_eq!(awards.len(), 1);
    assert_eq!(awards[0].points, 3);
}

// Scenario: a detailed contribution picks up the length bonus.
#[test]
fn detailed_contribution_earns_length_bonus() {
    let pipeline = pipeline();
    let body = format!("#aporte {}", "cine ".repeat(40));
    assert!(body.chars().count() > 150);
    let event = pipeline.score_message(&message(1, &body, 0), None, None).unwrap();
    assert_eq!(event.base_points, 3);
    assert_eq!(event.length_bonus, 2);
    assert_eq!(event.total_points, 5);

    let awards = pipeline.ledger().awards();
    assert_eq!(awards.len(), 1);
    assert_eq!(awards[0].points, 5);
}

// Scenario: the fourth rapid repeat of a tag is suppressed with a warning.
#[test]
fn rapid_hashtag_repeats_get_suppressed() {
    let pipeline = pipeline();
    for i in 0..3 {
        let event = pipeline
            .score_message(&message(1, "#debate sobre el cine de autor", i * 60), None, None)
            .unwrap();
        assert_eq!(event.total_points, 4);
    }
    let fourth = pipeline
        .score_message(&message(1, "#debate sobre el cine de autor", 230), None, None)
        .unwrap();
    assert_eq!(fourth.total_points, 0);
    assert!(fourth.matched[0].suppressed);
    assert!(fourth.has_warnings());

    let awards = pipeline.ledger().awards();
    assert_eq!(awards.len(), 3);
    assert!(awards.iter().all(|award| award.points == 4));
    assert_eq!(pipeline.ledger().total_for(1), 12);
}

#[test]
fn suppression_expires_with_the_window() {
    let pipeline = pipeline();
    for i in 0..4 {
        pipeline
            .score_message(&message(1, "#debate de nuevo", i * 60), None, None)
            .unwrap();
    }
    let after_window = pipeline
        .score_message(&message(1, "#debate de nuevo", 301), None, None)
        .unwrap();
    assert_eq!(after_window.total_points, 4);
}

struct FailingLedger;

impl PointsLedger for FailingLedger {
    fn add_points(&self, _award: &PointsAward) -> Result<i64, StorageError> {
        Err(StorageError::Unavailable(redis::RedisError::from(
            std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "redis down"),
        )))
    }

    fn user_stats(&self, _user_id: u64) -> Result<Option<UserStats>, StorageError> {
        Ok(None)
    }

    fn top_users(&self, _limit: usize) -> Result<Vec<RankedUser>, StorageError> {
        Ok(Vec::new())
    }

    fn hashtag_counts(&self, _user_id: u64) -> Result<Vec<(String, u64)>, StorageError> {
        Ok(Vec::new())
    }
}

#[test]
fn ledger_failure_surfaces_as_storage_error() {
    let pipeline = ScoringPipeline::new(HashtagCatalog::default_table(), FailingLedger);
    let result = pipeline.score_message(&message(1, "#aporte joya escondida", 0), None, None);
    assert!(matches!(result, Err(StorageError::Unavailable(_))));
}

#[test]
fn storage_is_untouched_when_nothing_scores() {
    // a failing ledger proves the zero path never calls add_points
    let pipeline = ScoringPipeline::new(HashtagCatalog::default_table(), FailingLedger);
    let event = pipeline
        .score_message(&message(1, "sin hashtags aquí", 0), None, None)
        .unwrap();
    assert!(event.is_noop());
}

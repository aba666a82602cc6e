//! The `leitbox review` command — drive a review session non-interactively.
//!
//! Starts (or resumes) the user's session and commits the given answers in
//! queue order. Supplying fewer answers than due cards leaves the session
//! active and resumable.

use std::path::PathBuf;

use anyhow::Result;

use leitbox_core::error::EngineError;
use leitbox_core::session::SessionManager;

pub async fn execute(user: i64, answers: String, config_path: Option<PathBuf>) -> Result<()> {
    let answers = parse_answers(&answers)?;
    anyhow::ensure!(!answers.is_empty(), "no answers given");

    let (config, store) = super::open(config_path.as_deref())?;
    let manager = SessionManager::new(store, config.session_config());
    let now = chrono::Utc::now();

    let session = match manager.start_session(user, now).await {
        Ok(session) => session,
        Err(EngineError::NoCardsDue(_)) => {
            println!("No words due right now for user {user} — all caught up.");
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    };
    println!(
        "Session {} — {} cards to review.",
        session.id,
        session.remaining()
    );

    let mut position = session.position;
    for was_correct in answers {
        let outcome = match manager
            .submit_answer(user, session.id, position, was_correct, chrono::Utc::now())
            .await
        {
            Ok(outcome) => outcome,
            Err(EngineError::SessionAlreadyComplete(_)) => {
                println!("Session already complete; extra answers ignored.");
                break;
            }
            Err(e) => return Err(e.into()),
        };
        println!(
            "  {} \"{}\" -> box {} (due {})",
            if outcome.was_correct { "OK  " } else { "MISS" },
            outcome.card.word,
            outcome.card.box_level,
            outcome.card.due_at.format("%Y-%m-%d %H:%M"),
        );
        position = outcome.position;

        if let Some(summary) = outcome.summary {
            println!(
                "\nSession complete: {}/{} correct.",
                summary.correct, summary.reviewed
            );
            return Ok(());
        }
    }

    println!("\nSession paused with answers remaining; run review again to continue.");
    Ok(())
}

/// Parse comma-separated answers; also accepts compact forms like "cwc".
fn parse_answers(input: &str) -> Result<Vec<bool>> {
    let trimmed = input.trim();
    if trimmed.contains(',') {
        return trimmed
            .split(',')
            .map(|s| s.trim().to_lowercase())
            .filter(|t| !t.is_empty())
            .map(|t| parse_token(&t))
            .collect();
    }

    // A bare word like "correct" is one answer, not per-character shorthand.
    let whole = trimmed.to_lowercase();
    if let Ok(answer) = parse_token(&whole) {
        return Ok(vec![answer]);
    }
    whole.chars().map(|c| parse_token(&c.to_string())).collect()
}

fn parse_token(token: &str) -> Result<bool> {
    match token {
        "correct" | "c" | "yes" | "y" | "1" => Ok(true),
        "wrong" | "incorrect" | "w" | "no" | "n" | "0" => Ok(false),
        other => anyhow::bail!("invalid answer: '{other}' (use correct/wrong)"),
    }
}

//! The `leitbox assign` command — apply a staged assignment to users.

use std::path::PathBuf;

use anyhow::Result;
use uuid::Uuid;

use leitbox_core::assignment::BulkCoordinator;
use leitbox_core::error::EngineError;
use leitbox_extractor::MockExtractor;

pub async fn execute(
    assignment: Uuid,
    users: String,
    config_path: Option<PathBuf>,
) -> Result<()> {
    let users = super::parse_users(&users)?;
    anyhow::ensure!(!users.is_empty(), "no users given");

    let (config, store) = super::open(config_path.as_deref())?;
    // The assign phase never calls the extractor; any backend satisfies the
    // constructor.
    let coordinator = BulkCoordinator::new(
        store,
        std::sync::Arc::new(MockExtractor::new()),
        config.coordinator_config(),
    );

    match coordinator.assign(assignment, &users, chrono::Utc::now()).await {
        Ok(outcome) => {
            println!(
                "Assignment {} applied: {} cards created, {} already present.",
                assignment, outcome.created, outcome.skipped
            );
            Ok(())
        }
        // A retried admin click must not look like a failure.
        Err(EngineError::AssignmentAlreadyConsumed(id)) => {
            println!("Assignment {id} was already applied; nothing to do.");
            Ok(())
        }
        Err(EngineError::AssignmentNotFound(id)) => {
            println!("Assignment {id} not found or expired; no cards created.");
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}
